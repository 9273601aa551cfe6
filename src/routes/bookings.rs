use actix_web::{middleware::from_fn, web, HttpResponse};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use serde_json::json;

use crate::{
    auth::{new_id, require_user, AuthUser},
    error::ApiError,
    models::{
        BookingRow, BookingView, BOOKING_CANCELLED, BOOKING_COMPLETED,
        BOOKING_TYPE_HOTEL_ROOM, BOOKING_TYPE_WEDDING_HALL,
    },
    state::AppState,
};

#[derive(Deserialize)]
struct CreateBookingPayload {
    booking_type: Option<String>,
    wedding_hall_id: Option<String>,
    hotel_room_id: Option<String>,
    check_in_date: Option<String>,
    check_out_date: Option<String>,
    guests: Option<i64>,
    special_requests: Option<String>,
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/bookings")
            .wrap(from_fn(require_user))
            .service(
                web::resource("")
                    .route(web::post().to(create_booking))
                    .route(web::get().to(list_bookings)),
            )
            .service(web::resource("/{id}").route(web::get().to(get_booking)))
            .service(web::resource("/{id}/cancel").route(web::post().to(cancel_booking))),
    );
}

fn parse_date(value: Option<&str>) -> Result<NaiveDate, ApiError> {
    let value = value.ok_or_else(|| ApiError::validation("Missing check-in or check-out date"))?;
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| ApiError::validation("Invalid date format, expected YYYY-MM-DD"))
}

/// Whole-day difference; deliberately no minimum-stay or same-day check.
fn stay_days(check_in: NaiveDate, check_out: NaiveDate) -> i64 {
    (check_out - check_in).num_days()
}

async fn create_booking(
    state: web::Data<AppState>,
    auth: web::ReqData<AuthUser>,
    payload: web::Json<CreateBookingPayload>,
) -> Result<HttpResponse, ApiError> {
    let payload = payload.into_inner();
    let booking_type = payload
        .booking_type
        .ok_or_else(|| ApiError::validation("Missing booking type"))?;

    let check_in = parse_date(payload.check_in_date.as_deref())?;
    let check_out = parse_date(payload.check_out_date.as_deref())?;
    let days = stay_days(check_in, check_out);

    let (hall_id, room_id, rate) = match booking_type.as_str() {
        BOOKING_TYPE_WEDDING_HALL => {
            let hall_id = payload
                .wedding_hall_id
                .ok_or_else(|| ApiError::validation("Missing wedding_hall_id"))?;
            let rate = sqlx::query_scalar::<_, f64>(
                "SELECT price_per_day FROM wedding_halls WHERE id = ?",
            )
            .bind(&hall_id)
            .fetch_optional(&state.db)
            .await?
            .ok_or(ApiError::NotFound("Hall not found"))?;
            (Some(hall_id), None, rate)
        }
        BOOKING_TYPE_HOTEL_ROOM => {
            let room_id = payload
                .hotel_room_id
                .ok_or_else(|| ApiError::validation("Missing hotel_room_id"))?;
            let rate = sqlx::query_scalar::<_, f64>(
                "SELECT price_per_night FROM hotel_rooms WHERE id = ?",
            )
            .bind(&room_id)
            .fetch_optional(&state.db)
            .await?
            .ok_or(ApiError::NotFound("Room not found"))?;
            (None, Some(room_id), rate)
        }
        _ => return Err(ApiError::validation("Invalid booking type")),
    };

    let total_price = rate * days as f64;
    let id = new_id();
    let now = Utc::now().to_rfc3339();

    sqlx::query(
        r#"INSERT INTO bookings
           (id, user_id, booking_type, wedding_hall_id, hotel_room_id, check_in_date,
            check_out_date, total_price, guests, special_requests, created_at, updated_at)
           VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
    )
    .bind(&id)
    .bind(&auth.id)
    .bind(&booking_type)
    .bind(&hall_id)
    .bind(&room_id)
    .bind(check_in.to_string())
    .bind(check_out.to_string())
    .bind(total_price)
    .bind(payload.guests.unwrap_or(1))
    .bind(&payload.special_requests)
    .bind(&now)
    .bind(&now)
    .execute(&state.db)
    .await?;

    let row = fetch_booking(&state, &id)
        .await?
        .ok_or(ApiError::NotFound("Booking not found"))?;

    Ok(HttpResponse::Created().json(json!({
        "message": "Booking created",
        "booking": BookingView::from(row),
    })))
}

async fn list_bookings(
    state: web::Data<AppState>,
    auth: web::ReqData<AuthUser>,
) -> Result<HttpResponse, ApiError> {
    let rows = sqlx::query_as::<_, BookingRow>(
        "SELECT * FROM bookings WHERE user_id = ? ORDER BY created_at DESC",
    )
    .bind(&auth.id)
    .fetch_all(&state.db)
    .await?;
    let bookings: Vec<BookingView> = rows.into_iter().map(Into::into).collect();
    Ok(HttpResponse::Ok().json(bookings))
}

async fn get_booking(
    state: web::Data<AppState>,
    auth: web::ReqData<AuthUser>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let row = fetch_booking(&state, &path.into_inner())
        .await?
        .ok_or(ApiError::NotFound("Booking not found"))?;

    if row.user_id != auth.id && !auth.is_admin {
        return Err(ApiError::Forbidden("Unauthorized"));
    }

    Ok(HttpResponse::Ok().json(BookingView::from(row)))
}

async fn cancel_booking(
    state: web::Data<AppState>,
    auth: web::ReqData<AuthUser>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let id = path.into_inner();
    let row = fetch_booking(&state, &id)
        .await?
        .ok_or(ApiError::NotFound("Booking not found"))?;

    if row.user_id != auth.id {
        return Err(ApiError::Forbidden("Unauthorized"));
    }

    // completed and cancelled are terminal
    if row.status == BOOKING_COMPLETED || row.status == BOOKING_CANCELLED {
        return Err(ApiError::validation("Cannot cancel this booking"));
    }

    sqlx::query("UPDATE bookings SET status = ?, updated_at = ? WHERE id = ?")
        .bind(BOOKING_CANCELLED)
        .bind(Utc::now().to_rfc3339())
        .bind(&id)
        .execute(&state.db)
        .await?;

    let row = fetch_booking(&state, &id)
        .await?
        .ok_or(ApiError::NotFound("Booking not found"))?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Booking cancelled",
        "booking": BookingView::from(row),
    })))
}

async fn fetch_booking(
    state: &web::Data<AppState>,
    id: &str,
) -> Result<Option<BookingRow>, sqlx::Error> {
    sqlx::query_as::<_, BookingRow>("SELECT * FROM bookings WHERE id = ? LIMIT 1")
        .bind(id)
        .fetch_optional(&state.db)
        .await
}
