use std::fmt;
use std::str::FromStr;

use bigdecimal::BigDecimal;
use chrono::NaiveDateTime;
use diesel::{
    deserialize::{self, FromSql},
    pg::{Pg, PgValue},
    serialize::{self, Output, ToSql},
    sql_types::Text,
    AsChangeset, Insertable, Selectable,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::schema::{auth_flows, bookings, categories, contacts, halls, user_sessions, users};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, AsExpression, FromSqlRow)]
#[diesel(sql_type = crate::schema::sql_types::HallStatus)]
#[serde(rename_all = "lowercase")]
pub enum HallStatus {
    Available,
    Maintenance,
    Booked,
}

impl HallStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            HallStatus::Available => "available",
            HallStatus::Maintenance => "maintenance",
            HallStatus::Booked => "booked",
        }
    }
}

impl FromStr for HallStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "available" => Ok(HallStatus::Available),
            "maintenance" => Ok(HallStatus::Maintenance),
            "booked" => Ok(HallStatus::Booked),
            other => Err(format!("Unrecognized hall status: {}", other)),
        }
    }
}

impl ToSql<crate::schema::sql_types::HallStatus, Pg> for HallStatus {
    fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Pg>) -> serialize::Result {
        <str as ToSql<Text, Pg>>::to_sql(self.as_str(), out)
    }
}

impl FromSql<crate::schema::sql_types::HallStatus, Pg> for HallStatus {
    fn from_sql(bytes: PgValue) -> deserialize::Result<Self> {
        let raw = <String as FromSql<Text, Pg>>::from_sql(bytes)?;
        raw.parse::<HallStatus>().map_err(Into::into)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, AsExpression, FromSqlRow)]
#[diesel(sql_type = crate::schema::sql_types::BookingStatus)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
    Cancelled,
    Completed,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Approved => "approved",
            BookingStatus::Rejected => "rejected",
            BookingStatus::Cancelled => "cancelled",
            BookingStatus::Completed => "completed",
        }
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(BookingStatus::Pending),
            "approved" => Ok(BookingStatus::Approved),
            "rejected" => Ok(BookingStatus::Rejected),
            "cancelled" => Ok(BookingStatus::Cancelled),
            "completed" => Ok(BookingStatus::Completed),
            other => Err(format!("Unrecognized booking status: {}", other)),
        }
    }
}

impl ToSql<crate::schema::sql_types::BookingStatus, Pg> for BookingStatus {
    fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Pg>) -> serialize::Result {
        <str as ToSql<Text, Pg>>::to_sql(self.as_str(), out)
    }
}

impl FromSql<crate::schema::sql_types::BookingStatus, Pg> for BookingStatus {
    fn from_sql(bytes: PgValue) -> deserialize::Result<Self> {
        let raw = <String as FromSql<Text, Pg>>::from_sql(bytes)?;
        raw.parse::<BookingStatus>().map_err(Into::into)
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Serialize)]
#[diesel(table_name = categories)]
pub struct Category {
    pub id: i32,
    pub name: String,
    pub description: String,
    pub icon: String,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = categories)]
pub struct NewCategory {
    pub name: String,
    pub description: String,
    /// `None` falls back to the column default icon.
    pub icon: Option<String>,
}

#[derive(Debug, Clone, Queryable, Selectable, Serialize)]
#[diesel(table_name = halls)]
pub struct Hall {
    pub id: i32,
    pub category_id: i32,
    pub name: String,
    pub description: String,
    pub capacity: i32,
    pub price_per_hour: BigDecimal,
    pub image: Option<String>,
    pub status: HallStatus,
    pub features: Vec<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = halls)]
pub struct NewHall {
    pub category_id: i32,
    pub name: String,
    pub description: String,
    pub capacity: i32,
    pub price_per_hour: BigDecimal,
    pub image: Option<String>,
    pub status: HallStatus,
    pub features: Vec<String>,
}

/// Full replacement of a hall's editable fields.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = halls, treat_none_as_null = true)]
pub struct HallChanges {
    pub category_id: i32,
    pub name: String,
    pub description: String,
    pub capacity: i32,
    pub price_per_hour: BigDecimal,
    pub image: Option<String>,
    pub status: HallStatus,
    pub features: Vec<String>,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Queryable, Selectable, Serialize)]
#[diesel(table_name = bookings)]
pub struct Booking {
    pub id: i32,
    pub booking_ref: Uuid,
    pub hall_id: i32,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    pub event_title: String,
    pub event_description: String,
    pub start_datetime: NaiveDateTime,
    pub end_datetime: NaiveDateTime,
    pub attendees_count: i32,
    pub total_price: BigDecimal,
    pub status: BookingStatus,
    pub admin_notes: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = bookings)]
pub struct NewBooking {
    pub booking_ref: Uuid,
    pub hall_id: i32,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    pub event_title: String,
    pub event_description: String,
    pub start_datetime: NaiveDateTime,
    pub end_datetime: NaiveDateTime,
    pub attendees_count: i32,
    pub total_price: BigDecimal,
    pub status: BookingStatus,
}

#[derive(Debug, Clone, Queryable, Selectable, Serialize)]
#[diesel(table_name = contacts)]
pub struct Contact {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub subject: String,
    pub message: String,
    pub created_at: NaiveDateTime,
    pub is_read: bool,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = contacts)]
pub struct NewContact {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub subject: String,
    pub message: String,
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = users)]
pub struct User {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password_hash: String,
    pub is_staff: bool,
    pub is_superuser: bool,
    pub is_active: bool,
    pub date_joined: NaiveDateTime,
    pub last_login: Option<NaiveDateTime>,
}

impl User {
    pub fn display_name(&self) -> String {
        let full = format!("{} {}", self.first_name, self.last_name);
        let full = full.trim();
        if full.is_empty() {
            self.username.clone()
        } else {
            full.to_string()
        }
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = users)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password_hash: String,
    pub is_staff: bool,
    pub is_superuser: bool,
    pub is_active: bool,
}

/// Partial account update; `None` leaves the column untouched.
#[derive(Debug, Clone, Default, AsChangeset)]
#[diesel(table_name = users)]
pub struct UserChanges {
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub is_staff: Option<bool>,
    pub is_superuser: Option<bool>,
    pub is_active: Option<bool>,
}

impl UserChanges {
    pub fn is_empty(&self) -> bool {
        self.email.is_none()
            && self.first_name.is_none()
            && self.last_name.is_none()
            && self.is_staff.is_none()
            && self.is_superuser.is_none()
            && self.is_active.is_none()
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = user_sessions)]
pub struct UserSession {
    pub token: Uuid,
    pub user_id: i32,
    pub created_at: NaiveDateTime,
    pub expires_at: NaiveDateTime,
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = auth_flows)]
pub struct AuthFlow {
    pub token: Uuid,
    pub kind: String,
    pub payload: serde_json::Value,
    pub created_at: NaiveDateTime,
    pub expires_at: NaiveDateTime,
}

// Request/Response models for API
#[derive(Debug, Serialize)]
pub struct ApiResponse {
    pub message: String,
}

impl ApiResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CategoryForm {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub icon: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HallQuery {
    pub category: Option<i32>,
    pub search: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HallDateQuery {
    pub date: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HallForm {
    pub name: String,
    pub category_id: i32,
    #[serde(default)]
    pub description: String,
    pub capacity: i32,
    pub price_per_hour: BigDecimal,
    pub image: Option<String>,
    pub status: Option<HallStatus>,
    #[serde(default)]
    pub features: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct BookingWindow {
    pub start_datetime: NaiveDateTime,
    pub end_datetime: NaiveDateTime,
    pub status: BookingStatus,
}

#[derive(Debug, Serialize)]
pub struct HallDetailResponse {
    pub hall: Hall,
    pub category: Category,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected_date: Option<chrono::NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bookings: Option<Vec<BookingWindow>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BookingForm {
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    pub event_title: String,
    pub event_description: String,
    pub start_datetime: String,
    pub end_datetime: String,
    pub attendees_count: i32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StaffBookingForm {
    pub hall_id: i32,
    #[serde(flatten)]
    pub booking: BookingForm,
    pub status: Option<BookingStatus>,
}

#[derive(Debug, Serialize)]
pub struct BookingSubmittedResponse {
    pub booking_ref: Uuid,
    pub status: BookingStatus,
    pub total_price: BigDecimal,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct BookingStatusResponse {
    pub booking_ref: Uuid,
    pub hall_name: String,
    pub event_title: String,
    pub start_datetime: NaiveDateTime,
    pub end_datetime: NaiveDateTime,
    pub attendees_count: i32,
    pub total_price: BigDecimal,
    pub status: BookingStatus,
}

#[derive(Debug, Serialize)]
pub struct BookingDetailResponse {
    pub booking: Booking,
    pub hall_name: String,
    pub allowed_transitions: &'static [BookingStatus],
}

#[derive(Debug, Deserialize)]
pub struct StatusUpdateRequest {
    pub status: BookingStatus,
    pub admin_notes: Option<String>,
}

/// Lenient on purpose: any malformed field answers "unavailable" instead of a 400.
#[derive(Debug, Default, Deserialize)]
pub struct AvailabilityRequest {
    #[serde(default)]
    pub hall_id: Option<serde_json::Value>,
    #[serde(default)]
    pub start_datetime: Option<String>,
    #[serde(default)]
    pub end_datetime: Option<String>,
}

#[derive(Debug, PartialEq, Eq, Serialize)]
pub struct AvailabilityResponse {
    pub available: bool,
    pub message: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ContactForm {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub subject: String,
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct ContactReadUpdate {
    pub is_read: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct UserView {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub is_staff: bool,
    pub is_superuser: bool,
    pub is_active: bool,
    pub date_joined: NaiveDateTime,
    pub last_login: Option<NaiveDateTime>,
}

impl From<&User> for UserView {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            is_staff: user.is_staff,
            is_superuser: user.is_superuser,
            is_active: user.is_active,
            date_joined: user.date_joined,
            last_login: user.last_login,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginIdentifierRequest {
    pub login_identifier: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginPasswordRequest {
    pub flow_token: Uuid,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RegisterProfileRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(default)]
    pub username: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RegisterPasswordRequest {
    pub flow_token: Uuid,
    pub password1: String,
    pub password2: String,
}

#[derive(Debug, Deserialize)]
pub struct FlowTokenRequest {
    pub flow_token: Uuid,
}

#[derive(Debug, Serialize)]
pub struct FlowResponse {
    pub flow_token: Uuid,
    pub next_step: &'static str,
    pub expires_at: NaiveDateTime,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub token: Uuid,
    pub expires_at: NaiveDateTime,
    pub user: UserView,
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct ProfileUpdateRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password1: String,
    pub new_password2: String,
}

#[derive(Debug, Deserialize)]
pub struct AdminUserCreateRequest {
    pub username: String,
    pub password1: String,
    pub password2: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub is_staff: bool,
    #[serde(default)]
    pub is_superuser: bool,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize)]
pub struct AdminUserUpdateRequest {
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub is_staff: Option<bool>,
    pub is_superuser: Option<bool>,
    pub is_active: Option<bool>,
}
