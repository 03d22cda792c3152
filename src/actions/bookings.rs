use chrono::Utc;
use diesel::prelude::*;
use uuid::Uuid;

use crate::availability::{has_conflict, UNAVAILABLE_MESSAGE};
use crate::errors::ServiceError;
use crate::lifecycle::initial_status_allowed;
use crate::models::{Booking, BookingStatus, Hall, NewBooking};
use crate::pricing;
use crate::schema::{bookings, halls};
use crate::validation::ValidatedBooking;

/// Checks availability, prices and inserts a booking in one transaction.
/// The hall row is locked so concurrent submissions for the same hall queue
/// behind each other; each re-runs the overlap query once the previous
/// holder has committed. `bookings_no_overlap` backs this up in storage.
pub fn create_booking_atomic(
    conn: &mut PgConnection,
    hall_id: i32,
    booking: &ValidatedBooking,
    status: BookingStatus,
) -> Result<Booking, ServiceError> {
    if !initial_status_allowed(status) {
        return Err(ServiceError::validation("New bookings must be pending or approved"));
    }

    conn.transaction(|conn| {
        let hall: Hall = halls::table
            .find(hall_id)
            .select(Hall::as_select())
            .for_update()
            .first(conn)
            .optional()?
            .ok_or(ServiceError::NotFound("Hall"))?;

        if has_conflict(conn, hall.id, &booking.range)? {
            return Err(ServiceError::Conflict(UNAVAILABLE_MESSAGE.to_string()));
        }

        if booking.attendees_count > hall.capacity {
            log::warn!(
                "Booking for hall {} expects {} attendees, capacity is {}",
                hall.id,
                booking.attendees_count,
                hall.capacity
            );
        }

        let total_price = pricing::total_price(&hall.price_per_hour, booking.range.start(), booking.range.end());
        if !pricing::fits_storage(&total_price) {
            return Err(ServiceError::validation(
                "The booking total is too large; please choose a shorter time range",
            ));
        }

        let new_booking = NewBooking {
            booking_ref: Uuid::new_v4(),
            hall_id: hall.id,
            customer_name: booking.customer_name.clone(),
            customer_email: booking.customer_email.clone(),
            customer_phone: booking.customer_phone.clone(),
            event_title: booking.event_title.clone(),
            event_description: booking.event_description.clone(),
            start_datetime: booking.range.start(),
            end_datetime: booking.range.end(),
            attendees_count: booking.attendees_count,
            total_price,
            status,
        };

        let created = diesel::insert_into(bookings::table)
            .values(&new_booking)
            .returning(Booking::as_returning())
            .get_result(conn)?;

        Ok(created)
    })
}

pub fn get_booking_with_hall_name(conn: &mut PgConnection, booking_id: i32) -> Result<(Booking, String), ServiceError> {
    bookings::table
        .inner_join(halls::table)
        .filter(bookings::id.eq(booking_id))
        .select((Booking::as_select(), halls::name))
        .first(conn)
        .optional()?
        .ok_or(ServiceError::NotFound("Booking"))
}

pub fn get_booking_by_ref(conn: &mut PgConnection, booking_ref: Uuid) -> Result<(Booking, String), ServiceError> {
    bookings::table
        .inner_join(halls::table)
        .filter(bookings::booking_ref.eq(booking_ref))
        .select((Booking::as_select(), halls::name))
        .first(conn)
        .optional()?
        .ok_or(ServiceError::NotFound("Booking"))
}

/// All bookings, newest first, each with its hall name.
pub fn list_bookings(conn: &mut PgConnection) -> Result<Vec<(Booking, String)>, ServiceError> {
    let rows = bookings::table
        .inner_join(halls::table)
        .order((bookings::created_at.desc(), bookings::id.desc()))
        .select((Booking::as_select(), halls::name))
        .load(conn)?;
    Ok(rows)
}

/// Moves a booking along the status table. `admin_notes` replaces the stored
/// notes when given; an empty string clears them.
pub fn update_booking_status(
    conn: &mut PgConnection,
    booking_id: i32,
    next: BookingStatus,
    admin_notes: Option<String>,
) -> Result<Booking, ServiceError> {
    conn.transaction(|conn| {
        let current: BookingStatus = bookings::table
            .find(booking_id)
            .select(bookings::status)
            .for_update()
            .first(conn)
            .optional()?
            .ok_or(ServiceError::NotFound("Booking"))?;

        let next = current.transition(next)?;
        let now = Utc::now().naive_utc();
        let target = diesel::update(bookings::table.find(booking_id));

        let updated = match admin_notes {
            Some(notes) => {
                let notes = Some(notes.trim().to_string()).filter(|n| !n.is_empty());
                target
                    .set((
                        bookings::status.eq(next),
                        bookings::admin_notes.eq(notes),
                        bookings::updated_at.eq(now),
                    ))
                    .returning(Booking::as_returning())
                    .get_result(conn)?
            }
            None => target
                .set((bookings::status.eq(next), bookings::updated_at.eq(now)))
                .returning(Booking::as_returning())
                .get_result(conn)?,
        };

        log::info!("Booking {} moved from {} to {}", booking_id, current, next);
        Ok(updated)
    })
}

pub fn delete_booking(conn: &mut PgConnection, booking_id: i32) -> Result<(), ServiceError> {
    let deleted = diesel::delete(bookings::table.find(booking_id)).execute(conn)?;
    if deleted == 0 {
        return Err(ServiceError::NotFound("Booking"));
    }
    Ok(())
}
