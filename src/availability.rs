//! Hall availability: does a candidate time range collide with a booking
//! that still holds the hall?

use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::errors::ServiceError;
use crate::models::{AvailabilityRequest, AvailabilityResponse, BookingStatus};
use crate::validation::parse_timestamp;

/// Exclusion constraint guarding overlapping pending/approved bookings.
pub const OVERLAP_CONSTRAINT: &str = "bookings_no_overlap";

pub const AVAILABLE_MESSAGE: &str = "The hall is available";
pub const UNAVAILABLE_MESSAGE: &str = "The hall is not available at this time";
pub const CHECK_FAILED_MESSAGE: &str = "An error occurred while checking availability";

/// Half-open `[start, end)` range with `start < end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    start: NaiveDateTime,
    end: NaiveDateTime,
}

impl TimeRange {
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Option<Self> {
        (start < end).then_some(Self { start, end })
    }

    pub fn start(&self) -> NaiveDateTime {
        self.start
    }

    pub fn end(&self) -> NaiveDateTime {
        self.end
    }

    #[cfg(test)]
    pub fn overlaps(&self, other: &TimeRange) -> bool {
        self.start < other.end && self.end > other.start
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Availability {
    Available,
    Unavailable,
    /// The request could not be evaluated (bad hall id, bad timestamps, lookup failure).
    Unknown,
}

impl Availability {
    pub fn is_available(&self) -> bool {
        matches!(self, Availability::Available)
    }

    pub fn message(&self) -> &'static str {
        match self {
            Availability::Available => AVAILABLE_MESSAGE,
            Availability::Unavailable => UNAVAILABLE_MESSAGE,
            Availability::Unknown => CHECK_FAILED_MESSAGE,
        }
    }

    pub fn to_response(self) -> AvailabilityResponse {
        AvailabilityResponse {
            available: self.is_available(),
            message: self.message().to_string(),
        }
    }
}

pub fn parse_hall_id(value: &serde_json::Value) -> Option<i32> {
    match value {
        serde_json::Value::Number(n) => n.as_i64().and_then(|id| i32::try_from(id).ok()),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Extracts the hall id and range, or `None` when any part is malformed.
pub fn resolve_request(req: &AvailabilityRequest) -> Option<(i32, TimeRange)> {
    let hall_id = req.hall_id.as_ref().and_then(parse_hall_id)?;
    let start = parse_timestamp(req.start_datetime.as_deref()?)?;
    let end = parse_timestamp(req.end_datetime.as_deref()?)?;
    Some((hall_id, TimeRange::new(start, end)?))
}

/// Whether any pending/approved booking of `hall` overlaps `range`.
pub fn has_conflict(conn: &mut PgConnection, hall: i32, range: &TimeRange) -> Result<bool, ServiceError> {
    use crate::schema::bookings::dsl::{bookings, end_datetime, hall_id, id, start_datetime, status};

    let conflicting: Option<i32> = bookings
        .filter(hall_id.eq(hall))
        .filter(status.eq(BookingStatus::Pending).or(status.eq(BookingStatus::Approved)))
        .filter(
            // Check for overlap: (start1 < end2) AND (end1 > start2)
            start_datetime.lt(range.end()).and(end_datetime.gt(range.start())),
        )
        .select(id)
        .first(conn)
        .optional()?;

    Ok(conflicting.is_some())
}

pub fn check(conn: &mut PgConnection, hall: i32, range: &TimeRange) -> Result<Availability, ServiceError> {
    use crate::schema::halls::dsl::{halls, id};

    halls
        .filter(id.eq(hall))
        .select(id)
        .first::<i32>(conn)
        .optional()?
        .ok_or(ServiceError::NotFound("Hall"))?;

    if has_conflict(conn, hall, range)? {
        Ok(Availability::Unavailable)
    } else {
        Ok(Availability::Available)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2030, 6, 1)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    fn range(start: u32, end: u32) -> TimeRange {
        TimeRange::new(at(start), at(end)).unwrap()
    }

    fn conflicts_with<I>(candidate: &TimeRange, existing: I) -> bool
    where
        I: IntoIterator<Item = (TimeRange, BookingStatus)>,
    {
        existing
            .into_iter()
            .any(|(range, status)| status.blocks_calendar() && range.overlaps(candidate))
    }

    #[test]
    fn overlapping_candidate_is_unavailable() {
        let existing = [(range(9, 11), BookingStatus::Approved)];
        assert!(conflicts_with(&range(10, 12), existing));
    }

    #[test]
    fn back_to_back_candidate_is_available() {
        let existing = [(range(9, 11), BookingStatus::Approved)];
        assert!(!conflicts_with(&range(11, 13), existing));
        assert!(!conflicts_with(&range(7, 9), existing));
    }

    #[test]
    fn pending_bookings_also_block() {
        let existing = [(range(9, 11), BookingStatus::Pending)];
        assert!(conflicts_with(&range(8, 10), existing));
    }

    #[test]
    fn closed_bookings_never_block() {
        for status in [
            BookingStatus::Rejected,
            BookingStatus::Cancelled,
            BookingStatus::Completed,
        ] {
            let existing = [(range(9, 17), status)];
            assert!(!conflicts_with(&range(10, 12), existing), "{} blocked", status);
            assert!(!conflicts_with(&range(8, 18), existing), "{} blocked", status);
        }
    }

    #[test]
    fn containment_counts_as_overlap() {
        assert!(range(8, 18).overlaps(&range(10, 11)));
        assert!(range(10, 11).overlaps(&range(8, 18)));
    }

    #[test]
    fn non_overlapping_ranges_are_disjoint() {
        for a_start in 0..12 {
            for a_end in (a_start + 1)..13 {
                for b_start in 0..12 {
                    for b_end in (b_start + 1)..13 {
                        let a = range(a_start, a_end);
                        let b = range(b_start, b_end);
                        assert_eq!(a.overlaps(&b), b.overlaps(&a));
                        if !a.overlaps(&b) {
                            assert!(a.end() <= b.start() || b.end() <= a.start());
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn empty_or_reversed_range_is_rejected() {
        assert!(TimeRange::new(at(10), at(10)).is_none());
        assert!(TimeRange::new(at(11), at(10)).is_none());
    }

    #[test]
    fn hall_id_accepts_numbers_and_numeric_strings() {
        assert_eq!(parse_hall_id(&serde_json::json!(7)), Some(7));
        assert_eq!(parse_hall_id(&serde_json::json!("12")), Some(12));
        assert_eq!(parse_hall_id(&serde_json::json!("twelve")), None);
        assert_eq!(parse_hall_id(&serde_json::json!(1.5)), None);
        assert_eq!(parse_hall_id(&serde_json::json!(null)), None);
    }

    #[test]
    fn malformed_requests_do_not_resolve() {
        let req = AvailabilityRequest {
            hall_id: Some(serde_json::json!(1)),
            start_datetime: Some("not a date".into()),
            end_datetime: Some("2030-06-01T12:00:00".into()),
        };
        assert!(resolve_request(&req).is_none());

        let req = AvailabilityRequest {
            hall_id: Some(serde_json::json!(1)),
            start_datetime: Some("2030-06-01T12:00:00".into()),
            end_datetime: Some("2030-06-01T10:00:00".into()),
        };
        assert!(resolve_request(&req).is_none());

        assert!(resolve_request(&AvailabilityRequest::default()).is_none());
    }

    #[test]
    fn well_formed_request_resolves() {
        let req = AvailabilityRequest {
            hall_id: Some(serde_json::json!(3)),
            start_datetime: Some("2030-06-01T10:00:00Z".into()),
            end_datetime: Some("2030-06-01T12:00:00Z".into()),
        };
        let (hall, window) = resolve_request(&req).unwrap();
        assert_eq!(hall, 3);
        assert_eq!(window, range(10, 12));
    }

    #[test]
    fn unknown_outcome_reports_unavailable() {
        let resp = Availability::Unknown.to_response();
        assert!(!resp.available);
        assert_eq!(resp.message, CHECK_FAILED_MESSAGE);
        assert!(Availability::Available.to_response().available);
    }

    mod stored {
        use std::str::FromStr;

        use bigdecimal::BigDecimal;
        use uuid::Uuid;

        use super::*;
        use crate::actions::{bookings, halls, test_pool};
        use crate::models::{HallStatus, NewCategory, NewHall};
        use crate::validation::ValidatedBooking;

        fn booking(start: u32, end: u32) -> ValidatedBooking {
            ValidatedBooking {
                customer_name: "Omar Fathy".into(),
                customer_email: "omar@example.com".into(),
                customer_phone: "+20 100 555 0000".into(),
                event_title: "Workshop".into(),
                event_description: "Morning session".into(),
                range: range(start, end),
                attendees_count: 20,
            }
        }

        /// Hall with one booking at 09:00-11:00 moved to `status`; returns
        /// (category_id, hall_id).
        fn hall_booked_at_nine(conn: &mut PgConnection, status: BookingStatus) -> (i32, i32) {
            let category = halls::create_category(
                conn,
                &NewCategory {
                    name: format!("availability-{}", Uuid::new_v4()),
                    description: String::new(),
                    icon: None,
                },
            )
            .unwrap();
            let hall = halls::create_hall(
                conn,
                &NewHall {
                    category_id: category.id,
                    name: "Garden Room".into(),
                    description: String::new(),
                    capacity: 40,
                    price_per_hour: BigDecimal::from_str("80.00").unwrap(),
                    image: None,
                    status: HallStatus::Available,
                    features: vec![],
                },
            )
            .unwrap();

            let initial = if status == BookingStatus::Completed {
                BookingStatus::Approved
            } else {
                BookingStatus::Pending
            };
            let created = bookings::create_booking_atomic(conn, hall.id, &booking(9, 11), initial).unwrap();
            if status != initial {
                bookings::update_booking_status(conn, created.id, status, None).unwrap();
            }
            (category.id, hall.id)
        }

        #[test]
        fn approved_booking_blocks_only_overlapping_ranges() {
            let Some(pool) = test_pool() else { return };
            let mut conn = pool.get().unwrap();
            let (category_id, hall_id) = hall_booked_at_nine(&mut conn, BookingStatus::Approved);

            assert_eq!(check(&mut conn, hall_id, &range(10, 12)).unwrap(), Availability::Unavailable);
            assert_eq!(check(&mut conn, hall_id, &range(8, 18)).unwrap(), Availability::Unavailable);
            assert_eq!(check(&mut conn, hall_id, &range(11, 13)).unwrap(), Availability::Available);
            assert_eq!(check(&mut conn, hall_id, &range(7, 9)).unwrap(), Availability::Available);

            halls::delete_category(&mut conn, category_id).unwrap();
        }

        #[test]
        fn pending_booking_blocks_the_hall() {
            let Some(pool) = test_pool() else { return };
            let mut conn = pool.get().unwrap();
            let (category_id, hall_id) = hall_booked_at_nine(&mut conn, BookingStatus::Pending);

            assert_eq!(check(&mut conn, hall_id, &range(10, 12)).unwrap(), Availability::Unavailable);

            halls::delete_category(&mut conn, category_id).unwrap();
        }

        #[test]
        fn closed_bookings_leave_the_hall_free() {
            let Some(pool) = test_pool() else { return };
            let mut conn = pool.get().unwrap();

            for status in [
                BookingStatus::Rejected,
                BookingStatus::Cancelled,
                BookingStatus::Completed,
            ] {
                let (category_id, hall_id) = hall_booked_at_nine(&mut conn, status);
                assert_eq!(
                    check(&mut conn, hall_id, &range(10, 12)).unwrap(),
                    Availability::Available,
                    "{} booking blocked the hall",
                    status
                );
                halls::delete_category(&mut conn, category_id).unwrap();
            }
        }

        #[test]
        fn unknown_hall_is_not_found() {
            let Some(pool) = test_pool() else { return };
            let mut conn = pool.get().unwrap();

            assert!(matches!(
                check(&mut conn, -5, &range(10, 12)),
                Err(ServiceError::NotFound("Hall"))
            ));
        }
    }
}
