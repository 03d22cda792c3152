//! Endpoints open to anonymous visitors.

use actix_web::{get, post, web, HttpResponse, Responder};
use chrono::Utc;
use uuid::Uuid;

use crate::actions;
use crate::availability::{self, Availability};
use crate::db::DbPool;
use crate::errors::ServiceError;
use crate::models::{
    ApiResponse, AvailabilityRequest, BookingForm, BookingStatus, BookingStatusResponse, BookingSubmittedResponse,
    ContactForm, HallDateQuery, HallDetailResponse, HallQuery,
};
use crate::validation;

#[get("/categories")]
pub async fn list_categories(pool: web::Data<DbPool>) -> actix_web::Result<impl Responder> {
    let categories = web::block(move || {
        let mut conn = pool.get()?;
        actions::halls::list_categories(&mut conn)
    })
    .await??;

    Ok(HttpResponse::Ok().json(categories))
}

#[get("/halls")]
pub async fn list_halls(pool: web::Data<DbPool>, query: web::Query<HallQuery>) -> actix_web::Result<impl Responder> {
    let HallQuery { category, search } = query.into_inner();

    let halls = web::block(move || {
        let mut conn = pool.get()?;
        actions::halls::list_available_halls(&mut conn, category, search.as_deref())
    })
    .await??;

    Ok(HttpResponse::Ok().json(halls))
}

#[get("/halls/{hall_id}")]
pub async fn hall_detail(
    pool: web::Data<DbPool>,
    path: web::Path<i32>,
    query: web::Query<HallDateQuery>,
) -> actix_web::Result<impl Responder> {
    let hall_id = path.into_inner();
    let selected_date = query
        .date
        .as_deref()
        .filter(|d| !d.trim().is_empty())
        .map(validation::parse_date)
        .transpose()?;

    let detail = web::block(move || {
        let mut conn = pool.get()?;
        let (hall, category) = actions::halls::get_hall_with_category(&mut conn, hall_id)?;
        let bookings = match selected_date {
            Some(date) => Some(actions::halls::booking_windows_on(&mut conn, hall_id, date)?),
            None => None,
        };
        Ok::<_, ServiceError>(HallDetailResponse {
            hall,
            category,
            selected_date,
            bookings,
        })
    })
    .await??;

    Ok(HttpResponse::Ok().json(detail))
}

#[post("/halls/{hall_id}/bookings")]
pub async fn submit_booking(
    pool: web::Data<DbPool>,
    path: web::Path<i32>,
    form: web::Json<BookingForm>,
) -> actix_web::Result<impl Responder> {
    let hall_id = path.into_inner();
    let booking = validation::validate_booking(&form, Utc::now().naive_utc(), false)?;

    let created = web::block(move || {
        let mut conn = pool.get()?;
        actions::bookings::create_booking_atomic(&mut conn, hall_id, &booking, BookingStatus::Pending)
    })
    .await?
    .map_err(|e| {
        log::warn!("Booking for hall {} refused: {}", hall_id, e);
        e
    })?;

    log::info!("Booking {} submitted for hall {}", created.booking_ref, hall_id);

    Ok(HttpResponse::Created().json(BookingSubmittedResponse {
        booking_ref: created.booking_ref,
        status: created.status,
        total_price: created.total_price,
        message: "Your booking request was sent successfully, we will contact you soon".to_string(),
    }))
}

#[get("/bookings/{booking_ref}")]
pub async fn booking_status(pool: web::Data<DbPool>, path: web::Path<Uuid>) -> actix_web::Result<impl Responder> {
    let booking_ref = path.into_inner();

    let (booking, hall_name) = web::block(move || {
        let mut conn = pool.get()?;
        actions::bookings::get_booking_by_ref(&mut conn, booking_ref)
    })
    .await??;

    Ok(HttpResponse::Ok().json(BookingStatusResponse {
        booking_ref: booking.booking_ref,
        hall_name,
        event_title: booking.event_title,
        start_datetime: booking.start_datetime,
        end_datetime: booking.end_datetime,
        attendees_count: booking.attendees_count,
        total_price: booking.total_price,
        status: booking.status,
    }))
}

/// Always answers `200 {available, message}`; anything that goes wrong is
/// reported as unavailable.
#[post("/api/check-availability")]
pub async fn check_availability(pool: web::Data<DbPool>, body: web::Bytes) -> impl Responder {
    let request: AvailabilityRequest = serde_json::from_slice(&body).unwrap_or_default();

    let Some((hall_id, range)) = availability::resolve_request(&request) else {
        return HttpResponse::Ok().json(Availability::Unknown.to_response());
    };

    let outcome = web::block(move || {
        let mut conn = pool.get()?;
        availability::check(&mut conn, hall_id, &range)
    })
    .await;

    let answer = match outcome {
        Ok(Ok(answer)) => answer,
        Ok(Err(e)) => {
            log::warn!("Availability check for hall {} failed: {}", hall_id, e);
            Availability::Unknown
        }
        Err(e) => {
            log::error!("Availability check for hall {} failed: {}", hall_id, e);
            Availability::Unknown
        }
    };

    HttpResponse::Ok().json(answer.to_response())
}

#[post("/contact")]
pub async fn submit_contact(pool: web::Data<DbPool>, form: web::Json<ContactForm>) -> actix_web::Result<impl Responder> {
    let new_contact = validation::validate_contact(&form)?;

    let contact = web::block(move || {
        let mut conn = pool.get()?;
        actions::contacts::create_contact(&mut conn, &new_contact)
    })
    .await??;

    log::info!("Contact message {} received", contact.id);

    Ok(HttpResponse::Created().json(ApiResponse::new(
        "Your message was sent successfully, we will contact you soon",
    )))
}
