//! Form validation shared by the public and staff handlers.

use std::sync::OnceLock;

use bigdecimal::{BigDecimal, Zero};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use regex::Regex;

use crate::availability::TimeRange;
use crate::errors::ServiceError;
use crate::models::{BookingForm, CategoryForm, ContactForm, HallForm, HallStatus, NewCategory, NewContact, NewHall};

pub const MIN_PASSWORD_LENGTH: usize = 8;

const NAIVE_FORMATS: [&str; 6] = [
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

fn email_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email pattern"))
}

fn phone_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\+?[0-9][0-9 \-]{4,18}[0-9]$").expect("phone pattern"))
}

fn username_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z0-9@.+\-_]{1,150}$").expect("username pattern"))
}

/// Parses RFC 3339 (converted to UTC), ISO-like local timestamps, or a bare
/// date (taken as midnight).
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_utc());
    }
    for fmt in NAIVE_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

pub fn parse_date(raw: &str) -> Result<NaiveDate, ServiceError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| ServiceError::validation("date must be formatted as YYYY-MM-DD"))
}

pub fn is_valid_email(email: &str) -> bool {
    email.len() <= 254 && email_re().is_match(email)
}

pub fn is_valid_phone(phone: &str) -> bool {
    phone_re().is_match(phone)
}

pub fn is_valid_username(username: &str) -> bool {
    username_re().is_match(username)
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn required(label: &str, value: &str, max_len: usize) -> Result<String, ServiceError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ServiceError::validation(format!("{} is required", label)));
    }
    if value.chars().count() > max_len {
        return Err(ServiceError::validation(format!(
            "{} must be at most {} characters",
            label, max_len
        )));
    }
    Ok(value.to_string())
}

fn email_field(label: &str, value: &str) -> Result<String, ServiceError> {
    let email = normalize_email(&required(label, value, 254)?);
    if !is_valid_email(&email) {
        return Err(ServiceError::validation(format!("{} is not a valid email address", label)));
    }
    Ok(email)
}

fn phone_field(value: &str) -> Result<String, ServiceError> {
    let phone = required("Phone number", value, 20)?;
    if !is_valid_phone(&phone) {
        return Err(ServiceError::validation("Phone number is not valid"));
    }
    Ok(phone)
}

#[derive(Debug, Clone)]
pub struct ValidatedBooking {
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    pub event_title: String,
    pub event_description: String,
    pub range: TimeRange,
    pub attendees_count: i32,
}

/// Validates a booking submission. Staff entries may be back-dated; public
/// ones may not start before `now`.
pub fn validate_booking(
    form: &BookingForm,
    now: NaiveDateTime,
    allow_past: bool,
) -> Result<ValidatedBooking, ServiceError> {
    let customer_name = required("Customer name", &form.customer_name, 200)?;
    let customer_email = email_field("Email", &form.customer_email)?;
    let customer_phone = phone_field(&form.customer_phone)?;
    let event_title = required("Event title", &form.event_title, 200)?;
    let event_description = required("Event description", &form.event_description, 10_000)?;

    if form.attendees_count <= 0 {
        return Err(ServiceError::validation("Attendees count must be greater than zero"));
    }

    let start = parse_timestamp(&form.start_datetime)
        .ok_or_else(|| ServiceError::validation("start datetime not in a recognised format"))?;
    let end = parse_timestamp(&form.end_datetime)
        .ok_or_else(|| ServiceError::validation("end datetime not in a recognised format"))?;

    let range = TimeRange::new(start, end)
        .ok_or_else(|| ServiceError::validation("End date must be after the start date"))?;

    if !allow_past && start < now {
        return Err(ServiceError::validation("Cannot book a date in the past"));
    }

    Ok(ValidatedBooking {
        customer_name,
        customer_email,
        customer_phone,
        event_title,
        event_description,
        range,
        attendees_count: form.attendees_count,
    })
}

/// Trims features and drops blank entries.
pub fn clean_features(features: &[String]) -> Vec<String> {
    features
        .iter()
        .map(|f| f.trim())
        .filter(|f| !f.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn validate_hall(form: &HallForm) -> Result<NewHall, ServiceError> {
    let name = required("Hall name", &form.name, 200)?;

    if form.capacity <= 0 {
        return Err(ServiceError::validation("Capacity must be greater than zero"));
    }
    if form.price_per_hour <= BigDecimal::zero() {
        return Err(ServiceError::validation("Price must be greater than zero"));
    }
    if form.price_per_hour >= BigDecimal::from(crate::pricing::PRICE_LIMIT) {
        return Err(ServiceError::validation("Price is too large"));
    }

    let image = form
        .image
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string);
    if image.as_ref().is_some_and(|s| s.len() > 255) {
        return Err(ServiceError::validation("Image path must be at most 255 characters"));
    }

    Ok(NewHall {
        category_id: form.category_id,
        name,
        description: form.description.trim().to_string(),
        capacity: form.capacity,
        price_per_hour: form.price_per_hour.with_scale_round(
            crate::pricing::PRICE_SCALE,
            bigdecimal::RoundingMode::HalfUp,
        ),
        image,
        status: form.status.unwrap_or(HallStatus::Available),
        features: clean_features(&form.features),
    })
}

pub fn validate_category(form: &CategoryForm) -> Result<NewCategory, ServiceError> {
    let name = required("Category name", &form.name, 100)?;
    let icon = match form.icon.as_deref().map(str::trim) {
        Some(icon) if !icon.is_empty() => Some(required("Icon", icon, 50)?),
        _ => None,
    };
    Ok(NewCategory {
        name,
        description: form.description.trim().to_string(),
        icon,
    })
}

pub fn validate_contact(form: &ContactForm) -> Result<NewContact, ServiceError> {
    Ok(NewContact {
        name: required("Name", &form.name, 200)?,
        email: email_field("Email", &form.email)?,
        phone: phone_field(&form.phone)?,
        subject: required("Subject", &form.subject, 200)?,
        message: required("Message", &form.message, 10_000)?,
    })
}

/// Both entries present, equal, and long enough.
pub fn validate_new_password(password1: &str, password2: &str) -> Result<(), ServiceError> {
    if password1.is_empty() || password2.is_empty() {
        return Err(ServiceError::validation("Please enter the password twice"));
    }
    if password1 != password2 {
        return Err(ServiceError::validation("Passwords do not match"));
    }
    if password1.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(ServiceError::validation(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LENGTH
        )));
    }
    Ok(())
}

pub fn validate_username(username: &str) -> Result<String, ServiceError> {
    let username = username.trim();
    if !is_valid_username(username) {
        return Err(ServiceError::validation(
            "Username may contain letters, digits and @/./+/-/_ only (max 150)",
        ));
    }
    Ok(username.to_string())
}

pub fn validate_profile_name(label: &str, value: &str) -> Result<String, ServiceError> {
    let value = value.trim();
    if value.chars().count() > 150 {
        return Err(ServiceError::validation(format!("{} must be at most 150 characters", label)));
    }
    Ok(value.to_string())
}

pub fn validate_optional_email(value: &str) -> Result<String, ServiceError> {
    if value.trim().is_empty() {
        Ok(String::new())
    } else {
        email_field("Email", value)
    }
}

pub fn validate_required_profile(label: &str, value: &str) -> Result<String, ServiceError> {
    required(label, value, 150)
}

pub fn validate_required_email(value: &str) -> Result<String, ServiceError> {
    email_field("Email", value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn now() -> NaiveDateTime {
        parse_timestamp("2030-01-01T00:00:00").unwrap()
    }

    fn booking_form(start: &str, end: &str) -> BookingForm {
        BookingForm {
            customer_name: " Layla Hassan ".into(),
            customer_email: "Layla@Example.com".into(),
            customer_phone: "+20 100 123 4567".into(),
            event_title: "Graduation party".into(),
            event_description: "Evening reception".into(),
            start_datetime: start.into(),
            end_datetime: end.into(),
            attendees_count: 80,
        }
    }

    #[test]
    fn timestamps_in_common_shapes_parse() {
        let expected = NaiveDate::from_ymd_opt(2030, 6, 1).unwrap().and_hms_opt(10, 30, 0).unwrap();
        assert_eq!(parse_timestamp("2030-06-01T10:30:00"), Some(expected));
        assert_eq!(parse_timestamp("2030-06-01T10:30"), Some(expected));
        assert_eq!(parse_timestamp("2030-06-01 10:30:00"), Some(expected));
        assert_eq!(parse_timestamp("2030-06-01T10:30:00Z"), Some(expected));
        assert_eq!(parse_timestamp("2030-06-01T12:30:00+02:00"), Some(expected));
        assert_eq!(
            parse_timestamp("2030-06-01"),
            NaiveDate::from_ymd_opt(2030, 6, 1).unwrap().and_hms_opt(0, 0, 0)
        );
        assert_eq!(parse_timestamp("01/06/2030"), None);
        assert_eq!(parse_timestamp(""), None);
    }

    #[test]
    fn valid_booking_is_normalized() {
        let form = booking_form("2030-06-01T10:00", "2030-06-01T14:00");
        let booking = validate_booking(&form, now(), false).unwrap();
        assert_eq!(booking.customer_name, "Layla Hassan");
        assert_eq!(booking.customer_email, "layla@example.com");
        assert_eq!(booking.attendees_count, 80);
    }

    #[test]
    fn end_before_start_is_rejected() {
        let form = booking_form("2030-06-01T14:00", "2030-06-01T10:00");
        let err = validate_booking(&form, now(), false).unwrap_err();
        assert_eq!(err.to_string(), "End date must be after the start date");
    }

    #[test]
    fn past_dates_rejected_for_public_only() {
        let form = booking_form("2029-06-01T10:00", "2029-06-01T14:00");
        let err = validate_booking(&form, now(), false).unwrap_err();
        assert_eq!(err.to_string(), "Cannot book a date in the past");
        assert!(validate_booking(&form, now(), true).is_ok());
    }

    #[test]
    fn missing_fields_are_named() {
        let mut form = booking_form("2030-06-01T10:00", "2030-06-01T14:00");
        form.event_title = "   ".into();
        let err = validate_booking(&form, now(), false).unwrap_err();
        assert_eq!(err.to_string(), "Event title is required");

        let mut form = booking_form("2030-06-01T10:00", "2030-06-01T14:00");
        form.attendees_count = 0;
        assert!(validate_booking(&form, now(), false).is_err());
    }

    #[test]
    fn bad_contact_details_are_rejected() {
        let mut form = booking_form("2030-06-01T10:00", "2030-06-01T14:00");
        form.customer_email = "not-an-email".into();
        assert!(validate_booking(&form, now(), false).is_err());

        let mut form = booking_form("2030-06-01T10:00", "2030-06-01T14:00");
        form.customer_phone = "call me".into();
        assert!(validate_booking(&form, now(), false).is_err());
    }

    fn hall_form() -> HallForm {
        HallForm {
            name: "Grand Ballroom".into(),
            category_id: 1,
            description: "Chandeliers".into(),
            capacity: 300,
            price_per_hour: BigDecimal::from_str("250.5").unwrap(),
            image: Some("  ".into()),
            status: None,
            features: vec![" Stage ".into(), "".into(), "Parking".into(), "  ".into()],
        }
    }

    #[test]
    fn hall_defaults_and_cleanup() {
        let hall = validate_hall(&hall_form()).unwrap();
        assert_eq!(hall.status, HallStatus::Available);
        assert_eq!(hall.features, vec!["Stage".to_string(), "Parking".to_string()]);
        assert_eq!(hall.image, None);
        assert_eq!(hall.price_per_hour.to_string(), "250.50");
    }

    #[test]
    fn hall_price_and_capacity_must_be_positive() {
        let mut form = hall_form();
        form.capacity = 0;
        assert_eq!(validate_hall(&form).unwrap_err().to_string(), "Capacity must be greater than zero");

        let mut form = hall_form();
        form.price_per_hour = BigDecimal::zero();
        assert_eq!(validate_hall(&form).unwrap_err().to_string(), "Price must be greater than zero");
    }

    #[test]
    fn password_rules() {
        assert!(validate_new_password("longenough", "longenough").is_ok());
        assert_eq!(
            validate_new_password("longenough", "different1").unwrap_err().to_string(),
            "Passwords do not match"
        );
        assert!(validate_new_password("short", "short").is_err());
        assert!(validate_new_password("", "").is_err());
    }

    #[test]
    fn usernames_follow_account_rules() {
        assert_eq!(validate_username("  omar.k ").unwrap(), "omar.k");
        assert!(validate_username("has space").is_err());
        assert!(validate_username("").is_err());
    }

    #[test]
    fn contact_form_requires_everything() {
        let form = ContactForm {
            name: "Sara".into(),
            email: "sara@example.com".into(),
            phone: "0123456789".into(),
            subject: "Wedding".into(),
            message: "".into(),
        };
        assert_eq!(validate_contact(&form).unwrap_err().to_string(), "Message is required");
    }

    #[test]
    fn category_icon_falls_back_to_default() {
        let form = CategoryForm {
            name: "Weddings".into(),
            description: String::new(),
            icon: Some("  ".into()),
        };
        assert_eq!(validate_category(&form).unwrap().icon, None);
    }
}
