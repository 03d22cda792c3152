//! Staff back office: halls, categories, bookings and contact messages.
//! Mounted under `/dashboard` behind the staff gate.

use actix_web::{delete, get, post, put, web, HttpResponse, Responder};
use chrono::Utc;

use crate::actions;
use crate::db::DbPool;
use crate::errors::ServiceError;
use crate::models::{
    ApiResponse, Booking, BookingDetailResponse, CategoryForm, ContactReadUpdate, HallForm, StaffBookingForm,
    StatusUpdateRequest,
};
use crate::policy::Identity;
use crate::validation;

fn booking_detail(booking: Booking, hall_name: String) -> BookingDetailResponse {
    BookingDetailResponse {
        allowed_transitions: booking.status.allowed_transitions(),
        booking,
        hall_name,
    }
}

#[get("/halls")]
pub async fn list_halls(pool: web::Data<DbPool>) -> actix_web::Result<impl Responder> {
    let halls = web::block(move || {
        let mut conn = pool.get()?;
        actions::halls::list_all_halls(&mut conn)
    })
    .await??;

    Ok(HttpResponse::Ok().json(halls))
}

#[post("/halls")]
pub async fn create_hall(
    pool: web::Data<DbPool>,
    identity: web::ReqData<Identity>,
    form: web::Json<HallForm>,
) -> actix_web::Result<impl Responder> {
    let new_hall = validation::validate_hall(&form)?;

    let hall = web::block(move || {
        let mut conn = pool.get()?;
        actions::halls::create_hall(&mut conn, &new_hall)
    })
    .await??;

    log::info!("Hall {} created by {}", hall.id, identity.username);
    Ok(HttpResponse::Created().json(hall))
}

#[get("/halls/{hall_id}")]
pub async fn get_hall(pool: web::Data<DbPool>, path: web::Path<i32>) -> actix_web::Result<impl Responder> {
    let hall_id = path.into_inner();

    let hall = web::block(move || {
        let mut conn = pool.get()?;
        actions::halls::get_hall(&mut conn, hall_id)
    })
    .await??;

    Ok(HttpResponse::Ok().json(hall))
}

#[put("/halls/{hall_id}")]
pub async fn update_hall(
    pool: web::Data<DbPool>,
    identity: web::ReqData<Identity>,
    path: web::Path<i32>,
    form: web::Json<HallForm>,
) -> actix_web::Result<impl Responder> {
    let hall_id = path.into_inner();
    let changes = validation::validate_hall(&form)?;

    let hall = web::block(move || {
        let mut conn = pool.get()?;
        actions::halls::update_hall(&mut conn, hall_id, changes)
    })
    .await??;

    log::info!("Hall {} updated by {}", hall.id, identity.username);
    Ok(HttpResponse::Ok().json(hall))
}

#[delete("/halls/{hall_id}")]
pub async fn delete_hall(
    pool: web::Data<DbPool>,
    identity: web::ReqData<Identity>,
    path: web::Path<i32>,
) -> actix_web::Result<impl Responder> {
    let hall_id = path.into_inner();

    web::block(move || {
        let mut conn = pool.get()?;
        actions::halls::delete_hall(&mut conn, hall_id)
    })
    .await??;

    log::info!("Hall {} deleted by {}", hall_id, identity.username);
    Ok(HttpResponse::Ok().json(ApiResponse::new("Hall deleted successfully")))
}

#[get("/categories")]
pub async fn list_categories(pool: web::Data<DbPool>) -> actix_web::Result<impl Responder> {
    let categories = web::block(move || {
        let mut conn = pool.get()?;
        actions::halls::list_categories(&mut conn)
    })
    .await??;

    Ok(HttpResponse::Ok().json(categories))
}

#[post("/categories")]
pub async fn create_category(pool: web::Data<DbPool>, form: web::Json<CategoryForm>) -> actix_web::Result<impl Responder> {
    let new_category = validation::validate_category(&form)?;

    let category = web::block(move || {
        let mut conn = pool.get()?;
        actions::halls::create_category(&mut conn, &new_category)
    })
    .await??;

    Ok(HttpResponse::Created().json(category))
}

#[delete("/categories/{category_id}")]
pub async fn delete_category(
    pool: web::Data<DbPool>,
    identity: web::ReqData<Identity>,
    path: web::Path<i32>,
) -> actix_web::Result<impl Responder> {
    let category_id = path.into_inner();

    web::block(move || {
        let mut conn = pool.get()?;
        actions::halls::delete_category(&mut conn, category_id)
    })
    .await??;

    log::info!("Category {} deleted by {}", category_id, identity.username);
    Ok(HttpResponse::Ok().json(ApiResponse::new("Category deleted successfully")))
}

#[get("/bookings")]
pub async fn list_bookings(pool: web::Data<DbPool>) -> actix_web::Result<impl Responder> {
    let rows = web::block(move || {
        let mut conn = pool.get()?;
        actions::bookings::list_bookings(&mut conn)
    })
    .await??;

    let bookings: Vec<BookingDetailResponse> = rows
        .into_iter()
        .map(|(booking, hall_name)| booking_detail(booking, hall_name))
        .collect();
    Ok(HttpResponse::Ok().json(bookings))
}

/// Books on behalf of a customer. Past dates are accepted and the booking
/// may start out approved.
#[post("/bookings")]
pub async fn create_booking(
    pool: web::Data<DbPool>,
    identity: web::ReqData<Identity>,
    form: web::Json<StaffBookingForm>,
) -> actix_web::Result<impl Responder> {
    let StaffBookingForm {
        hall_id,
        booking,
        status,
    } = form.into_inner();
    let booking = validation::validate_booking(&booking, Utc::now().naive_utc(), true)?;
    let status = status.unwrap_or_default();

    let (created, hall_name) = web::block(move || {
        let mut conn = pool.get()?;
        let created = actions::bookings::create_booking_atomic(&mut conn, hall_id, &booking, status)?;
        let hall_name = actions::halls::get_hall(&mut conn, hall_id)?.name;
        Ok::<_, ServiceError>((created, hall_name))
    })
    .await??;

    log::info!(
        "Booking {} created as {} by {}",
        created.booking_ref,
        created.status,
        identity.username
    );
    Ok(HttpResponse::Created().json(booking_detail(created, hall_name)))
}

#[get("/bookings/{booking_id}")]
pub async fn get_booking(pool: web::Data<DbPool>, path: web::Path<i32>) -> actix_web::Result<impl Responder> {
    let booking_id = path.into_inner();

    let (booking, hall_name) = web::block(move || {
        let mut conn = pool.get()?;
        actions::bookings::get_booking_with_hall_name(&mut conn, booking_id)
    })
    .await??;

    Ok(HttpResponse::Ok().json(booking_detail(booking, hall_name)))
}

#[put("/bookings/{booking_id}/status")]
pub async fn update_booking_status(
    pool: web::Data<DbPool>,
    identity: web::ReqData<Identity>,
    path: web::Path<i32>,
    form: web::Json<StatusUpdateRequest>,
) -> actix_web::Result<impl Responder> {
    let booking_id = path.into_inner();
    let StatusUpdateRequest { status, admin_notes } = form.into_inner();

    let (booking, hall_name) = web::block(move || {
        let mut conn = pool.get()?;
        actions::bookings::update_booking_status(&mut conn, booking_id, status, admin_notes)?;
        actions::bookings::get_booking_with_hall_name(&mut conn, booking_id)
    })
    .await??;

    log::info!("Booking {} set to {} by {}", booking_id, booking.status, identity.username);
    Ok(HttpResponse::Ok().json(booking_detail(booking, hall_name)))
}

#[delete("/bookings/{booking_id}")]
pub async fn delete_booking(
    pool: web::Data<DbPool>,
    identity: web::ReqData<Identity>,
    path: web::Path<i32>,
) -> actix_web::Result<impl Responder> {
    let booking_id = path.into_inner();

    web::block(move || {
        let mut conn = pool.get()?;
        actions::bookings::delete_booking(&mut conn, booking_id)
    })
    .await??;

    log::info!("Booking {} deleted by {}", booking_id, identity.username);
    Ok(HttpResponse::Ok().json(ApiResponse::new("Booking deleted successfully")))
}

#[get("/contacts")]
pub async fn list_contacts(pool: web::Data<DbPool>) -> actix_web::Result<impl Responder> {
    let contacts = web::block(move || {
        let mut conn = pool.get()?;
        actions::contacts::list_contacts(&mut conn)
    })
    .await??;

    Ok(HttpResponse::Ok().json(contacts))
}

#[get("/contacts/{contact_id}")]
pub async fn get_contact(pool: web::Data<DbPool>, path: web::Path<i32>) -> actix_web::Result<impl Responder> {
    let contact_id = path.into_inner();

    let contact = web::block(move || {
        let mut conn = pool.get()?;
        actions::contacts::get_contact(&mut conn, contact_id)
    })
    .await??;

    Ok(HttpResponse::Ok().json(contact))
}

#[put("/contacts/{contact_id}/read")]
pub async fn set_contact_read(
    pool: web::Data<DbPool>,
    path: web::Path<i32>,
    form: web::Json<ContactReadUpdate>,
) -> actix_web::Result<impl Responder> {
    let contact_id = path.into_inner();
    let is_read = form.is_read;

    let contact = web::block(move || {
        let mut conn = pool.get()?;
        actions::contacts::set_read(&mut conn, contact_id, is_read)
    })
    .await??;

    Ok(HttpResponse::Ok().json(contact))
}

#[delete("/contacts/{contact_id}")]
pub async fn delete_contact(
    pool: web::Data<DbPool>,
    identity: web::ReqData<Identity>,
    path: web::Path<i32>,
) -> actix_web::Result<impl Responder> {
    let contact_id = path.into_inner();

    web::block(move || {
        let mut conn = pool.get()?;
        actions::contacts::delete_contact(&mut conn, contact_id)
    })
    .await??;

    log::info!("Contact message {} deleted by {}", contact_id, identity.username);
    Ok(HttpResponse::Ok().json(ApiResponse::new("Message deleted successfully")))
}
