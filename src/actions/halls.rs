use chrono::{Duration, NaiveDate, Utc};
use diesel::prelude::*;

use super::escape_like;
use crate::errors::ServiceError;
use crate::models::{BookingStatus, BookingWindow, Category, Hall, HallChanges, HallStatus, NewCategory, NewHall};
use crate::schema::{bookings, categories, halls};

pub fn list_categories(conn: &mut PgConnection) -> Result<Vec<Category>, ServiceError> {
    let all = categories::table
        .order(categories::name.asc())
        .select(Category::as_select())
        .load(conn)?;
    Ok(all)
}

pub fn create_category(conn: &mut PgConnection, new_category: &NewCategory) -> Result<Category, ServiceError> {
    let category = diesel::insert_into(categories::table)
        .values(new_category)
        .returning(Category::as_returning())
        .get_result(conn)?;
    Ok(category)
}

/// Deleting a category also deletes its halls and their bookings.
pub fn delete_category(conn: &mut PgConnection, category_id: i32) -> Result<(), ServiceError> {
    let deleted = diesel::delete(categories::table.find(category_id)).execute(conn)?;
    if deleted == 0 {
        return Err(ServiceError::NotFound("Category"));
    }
    Ok(())
}

fn ensure_category(conn: &mut PgConnection, category_id: i32) -> Result<(), ServiceError> {
    let found: Option<i32> = categories::table
        .find(category_id)
        .select(categories::id)
        .first(conn)
        .optional()?;
    match found {
        Some(_) => Ok(()),
        None => Err(ServiceError::validation("Selected category does not exist")),
    }
}

/// Public listing: available halls only, optionally narrowed by category and
/// a case-insensitive search over hall name, description and category name.
pub fn list_available_halls(
    conn: &mut PgConnection,
    category: Option<i32>,
    search: Option<&str>,
) -> Result<Vec<Hall>, ServiceError> {
    let mut query = halls::table
        .inner_join(categories::table)
        .filter(halls::status.eq(HallStatus::Available))
        .order(halls::name.asc())
        .select(Hall::as_select())
        .into_boxed();

    if let Some(category_id) = category {
        query = query.filter(halls::category_id.eq(category_id));
    }

    if let Some(term) = search.map(str::trim).filter(|s| !s.is_empty()) {
        let pattern = format!("%{}%", escape_like(term));
        query = query.filter(
            halls::name
                .ilike(pattern.clone())
                .or(halls::description.ilike(pattern.clone()))
                .or(categories::name.ilike(pattern)),
        );
    }

    let found = query.load(conn)?;
    Ok(found)
}

pub fn list_all_halls(conn: &mut PgConnection) -> Result<Vec<Hall>, ServiceError> {
    let all = halls::table
        .order(halls::name.asc())
        .select(Hall::as_select())
        .load(conn)?;
    Ok(all)
}

pub fn get_hall(conn: &mut PgConnection, hall_id: i32) -> Result<Hall, ServiceError> {
    halls::table
        .find(hall_id)
        .select(Hall::as_select())
        .first(conn)
        .optional()?
        .ok_or(ServiceError::NotFound("Hall"))
}

pub fn get_hall_with_category(conn: &mut PgConnection, hall_id: i32) -> Result<(Hall, Category), ServiceError> {
    halls::table
        .inner_join(categories::table)
        .filter(halls::id.eq(hall_id))
        .select((Hall::as_select(), Category::as_select()))
        .first(conn)
        .optional()?
        .ok_or(ServiceError::NotFound("Hall"))
}

pub fn create_hall(conn: &mut PgConnection, new_hall: &NewHall) -> Result<Hall, ServiceError> {
    ensure_category(conn, new_hall.category_id)?;
    let hall = diesel::insert_into(halls::table)
        .values(new_hall)
        .returning(Hall::as_returning())
        .get_result(conn)?;
    Ok(hall)
}

pub fn update_hall(conn: &mut PgConnection, hall_id: i32, form: NewHall) -> Result<Hall, ServiceError> {
    ensure_category(conn, form.category_id)?;
    let changes = HallChanges {
        category_id: form.category_id,
        name: form.name,
        description: form.description,
        capacity: form.capacity,
        price_per_hour: form.price_per_hour,
        image: form.image,
        status: form.status,
        features: form.features,
        updated_at: Utc::now().naive_utc(),
    };
    diesel::update(halls::table.find(hall_id))
        .set(&changes)
        .returning(Hall::as_returning())
        .get_result(conn)
        .optional()?
        .ok_or(ServiceError::NotFound("Hall"))
}

/// Deleting a hall also deletes its bookings.
pub fn delete_hall(conn: &mut PgConnection, hall_id: i32) -> Result<(), ServiceError> {
    let deleted = diesel::delete(halls::table.find(hall_id)).execute(conn)?;
    if deleted == 0 {
        return Err(ServiceError::NotFound("Hall"));
    }
    Ok(())
}

/// Pending and approved bookings of `hall_id` that start on `date`.
pub fn booking_windows_on(
    conn: &mut PgConnection,
    hall_id: i32,
    date: NaiveDate,
) -> Result<Vec<BookingWindow>, ServiceError> {
    let day_start = date.and_hms_opt(0, 0, 0).ok_or_else(|| ServiceError::validation("Invalid date"))?;
    let day_end = day_start + Duration::days(1);

    let rows: Vec<(chrono::NaiveDateTime, chrono::NaiveDateTime, BookingStatus)> = bookings::table
        .filter(bookings::hall_id.eq(hall_id))
        .filter(
            bookings::status
                .eq(BookingStatus::Pending)
                .or(bookings::status.eq(BookingStatus::Approved)),
        )
        .filter(bookings::start_datetime.ge(day_start))
        .filter(bookings::start_datetime.lt(day_end))
        .order(bookings::start_datetime.asc())
        .select((bookings::start_datetime, bookings::end_datetime, bookings::status))
        .load(conn)?;

    Ok(rows
        .into_iter()
        .map(|(start_datetime, end_datetime, status)| BookingWindow {
            start_datetime,
            end_datetime,
            status,
        })
        .collect())
}
