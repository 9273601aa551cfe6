use actix_web::{middleware::from_fn, web, HttpResponse};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::SqlitePool;

use crate::{
    auth::require_admin,
    error::ApiError,
    models::{
        BookingRow, BookingView, ComplaintRow, ContactRow, UserRow, UserView,
        BOOKING_STATUSES, COMPLAINT_RESOLVED, COMPLAINT_STATUSES, CONTACT_RESOLVED,
        PAYMENT_STATUSES, PRIORITIES,
    },
    state::AppState,
};

#[derive(Debug, Clone, Serialize)]
struct ContactView {
    id: String,
    name: String,
    email: String,
    phone: Option<String>,
    message: String,
    status: String,
    created_at: String,
}

impl From<ContactRow> for ContactView {
    fn from(row: ContactRow) -> Self {
        ContactView {
            id: row.id,
            name: row.name,
            email: row.email,
            phone: row.phone,
            message: row.message,
            status: row.status,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
struct ComplaintView {
    id: String,
    user_id: String,
    complaint_type: String,
    subject: String,
    description: String,
    status: String,
    priority: String,
    admin_notes: Option<String>,
    resolved_at: Option<String>,
    created_at: String,
}

impl From<ComplaintRow> for ComplaintView {
    fn from(row: ComplaintRow) -> Self {
        ComplaintView {
            id: row.id,
            user_id: row.user_id,
            complaint_type: row.complaint_type,
            subject: row.subject,
            description: row.description,
            status: row.status,
            priority: row.priority,
            admin_notes: row.admin_notes,
            resolved_at: row.resolved_at,
            created_at: row.created_at,
        }
    }
}

#[derive(Deserialize)]
struct ComplaintUpdatePayload {
    status: Option<String>,
    priority: Option<String>,
    admin_notes: Option<String>,
}

#[derive(Deserialize)]
struct BookingUpdatePayload {
    status: Option<String>,
    payment_status: Option<String>,
    payment_id: Option<String>,
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/admin")
            .wrap(from_fn(require_admin))
            .service(web::resource("/dashboard").route(web::get().to(dashboard)))
            .service(web::resource("/users").route(web::get().to(list_users)))
            .service(web::resource("/bookings").route(web::get().to(list_bookings)))
            .service(
                web::resource("/bookings/{id}/update").route(web::post().to(update_booking)),
            )
            .service(web::resource("/contacts").route(web::get().to(list_contacts)))
            .service(
                web::resource("/contacts/{id}/resolve").route(web::post().to(resolve_contact)),
            )
            .service(web::resource("/complaints").route(web::get().to(list_complaints)))
            .service(
                web::resource("/complaints/{id}/update").route(web::post().to(update_complaint)),
            ),
    );
}

async fn count(pool: &SqlitePool, query: &str) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(query).fetch_one(pool).await
}

async fn dashboard(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let total_users = count(&state.db, "SELECT COUNT(*) FROM users").await?;
    let total_bookings = count(&state.db, "SELECT COUNT(*) FROM bookings").await?;
    let total_contacts = count(&state.db, "SELECT COUNT(*) FROM contacts").await?;
    let total_complaints = count(&state.db, "SELECT COUNT(*) FROM complaints").await?;
    let pending_complaints = count(
        &state.db,
        "SELECT COUNT(*) FROM complaints WHERE status = 'open'",
    )
    .await?;
    let unread_contacts = count(
        &state.db,
        "SELECT COUNT(*) FROM contacts WHERE status = 'unread'",
    )
    .await?;

    let total_revenue = sqlx::query_scalar::<_, f64>(
        r#"SELECT COALESCE(SUM(total_price), 0.0) FROM bookings
           WHERE status = 'completed' AND payment_status = 'paid'"#,
    )
    .fetch_one(&state.db)
    .await?;

    Ok(HttpResponse::Ok().json(json!({
        "total_users": total_users,
        "total_bookings": total_bookings,
        "total_contacts": total_contacts,
        "total_complaints": total_complaints,
        "pending_complaints": pending_complaints,
        "unread_contacts": unread_contacts,
        "total_revenue": total_revenue,
    })))
}

async fn list_users(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let rows = sqlx::query_as::<_, UserRow>("SELECT * FROM users ORDER BY created_at")
        .fetch_all(&state.db)
        .await?;
    let users: Vec<UserView> = rows.into_iter().map(Into::into).collect();
    Ok(HttpResponse::Ok().json(users))
}

async fn list_bookings(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let rows = sqlx::query_as::<_, BookingRow>("SELECT * FROM bookings ORDER BY created_at DESC")
        .fetch_all(&state.db)
        .await?;
    let bookings: Vec<BookingView> = rows.into_iter().map(Into::into).collect();
    Ok(HttpResponse::Ok().json(bookings))
}

/// Moves a booking through its lifecycle (confirmed, completed) and records
/// payment fields. The public API only ever creates pending bookings and
/// cancels them; everything else is an admin edit.
async fn update_booking(
    state: web::Data<AppState>,
    path: web::Path<String>,
    payload: web::Json<BookingUpdatePayload>,
) -> Result<HttpResponse, ApiError> {
    let id = path.into_inner();
    let payload = payload.into_inner();

    let booking = sqlx::query_as::<_, BookingRow>("SELECT * FROM bookings WHERE id = ?")
        .bind(&id)
        .fetch_optional(&state.db)
        .await?
        .ok_or(ApiError::NotFound("Booking not found"))?;

    let status = match payload.status {
        Some(status) if BOOKING_STATUSES.contains(&status.as_str()) => status,
        Some(_) => return Err(ApiError::validation("Invalid status")),
        None => booking.status,
    };
    let payment_status = match payload.payment_status {
        Some(value) if PAYMENT_STATUSES.contains(&value.as_str()) => value,
        Some(_) => return Err(ApiError::validation("Invalid payment status")),
        None => booking.payment_status,
    };
    let payment_id = payload.payment_id.or(booking.payment_id);

    sqlx::query(
        "UPDATE bookings SET status = ?, payment_status = ?, payment_id = ?, updated_at = ? WHERE id = ?",
    )
    .bind(&status)
    .bind(&payment_status)
    .bind(&payment_id)
    .bind(Utc::now().to_rfc3339())
    .bind(&id)
    .execute(&state.db)
    .await?;

    let row = sqlx::query_as::<_, BookingRow>("SELECT * FROM bookings WHERE id = ?")
        .bind(&id)
        .fetch_one(&state.db)
        .await?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Booking updated",
        "booking": BookingView::from(row),
    })))
}

async fn list_contacts(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let rows = sqlx::query_as::<_, ContactRow>("SELECT * FROM contacts ORDER BY created_at DESC")
        .fetch_all(&state.db)
        .await?;
    let contacts: Vec<ContactView> = rows.into_iter().map(Into::into).collect();
    Ok(HttpResponse::Ok().json(contacts))
}

async fn resolve_contact(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let id = path.into_inner();
    let result = sqlx::query("UPDATE contacts SET status = ? WHERE id = ?")
        .bind(CONTACT_RESOLVED)
        .bind(&id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound("Contact not found"));
    }

    Ok(HttpResponse::Ok().json(json!({ "message": "Contact marked as resolved" })))
}

async fn list_complaints(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let rows =
        sqlx::query_as::<_, ComplaintRow>("SELECT * FROM complaints ORDER BY created_at DESC")
            .fetch_all(&state.db)
            .await?;
    let complaints: Vec<ComplaintView> = rows.into_iter().map(Into::into).collect();
    Ok(HttpResponse::Ok().json(complaints))
}

async fn update_complaint(
    state: web::Data<AppState>,
    path: web::Path<String>,
    payload: web::Json<ComplaintUpdatePayload>,
) -> Result<HttpResponse, ApiError> {
    let id = path.into_inner();
    let payload = payload.into_inner();

    let complaint = sqlx::query_as::<_, ComplaintRow>("SELECT * FROM complaints WHERE id = ?")
        .bind(&id)
        .fetch_optional(&state.db)
        .await?
        .ok_or(ApiError::NotFound("Complaint not found"))?;

    let status = match payload.status {
        Some(status) if COMPLAINT_STATUSES.contains(&status.as_str()) => status,
        Some(_) => return Err(ApiError::validation("Invalid status")),
        None => complaint.status.clone(),
    };
    let priority = match payload.priority {
        Some(priority) if PRIORITIES.contains(&priority.as_str()) => priority,
        Some(_) => return Err(ApiError::validation("Invalid priority")),
        None => complaint.priority,
    };
    let admin_notes = payload.admin_notes.or(complaint.admin_notes);

    // Stamp resolved_at on the transition into resolved.
    let resolved_at = if status == COMPLAINT_RESOLVED && complaint.status != COMPLAINT_RESOLVED {
        Some(Utc::now().to_rfc3339())
    } else {
        complaint.resolved_at
    };

    sqlx::query(
        "UPDATE complaints SET status = ?, priority = ?, admin_notes = ?, resolved_at = ? WHERE id = ?",
    )
    .bind(&status)
    .bind(&priority)
    .bind(&admin_notes)
    .bind(&resolved_at)
    .bind(&id)
    .execute(&state.db)
    .await?;

    Ok(HttpResponse::Ok().json(json!({ "message": "Complaint updated" })))
}

#[cfg(test)]
mod tests {
    use actix_web::{http::StatusCode, test};
    use serde_json::{json, Value};

    use crate::testing::{login, signup, test_app, test_state};

    #[actix_web::test]
    async fn admin_scope_is_guarded() {
        let state = test_state().await;
        let app = test_app!(state);

        let req = test::TestRequest::get().uri("/api/admin/dashboard").to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

        let cookie = signup!(&app, "mortal");
        let req = test::TestRequest::get()
            .uri("/api/admin/dashboard")
            .cookie(cookie)
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::FORBIDDEN);
    }

    #[actix_web::test]
    async fn revenue_counts_only_completed_paid_bookings() {
        let state = test_state().await;
        let app = test_app!(state);
        let admin = login!(&app, "admin", "admin123");

        let req = test::TestRequest::get()
            .uri("/api/admin/dashboard")
            .cookie(admin.clone())
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::OK);
        let body: Value = test::read_body_json(res).await;
        assert_eq!(body["total_revenue"], 0.0);
        assert_eq!(body["total_users"], 1);

        let guest = signup!(&app, "guest");
        let room_id: String = sqlx::query_scalar("SELECT id FROM hotel_rooms LIMIT 1")
            .fetch_one(&state.db)
            .await
            .unwrap();
        let req = test::TestRequest::post()
            .uri("/api/bookings")
            .cookie(guest)
            .set_json(json!({
                "booking_type": "hotel_room",
                "hotel_room_id": room_id,
                "check_in_date": "2024-01-01",
                "check_out_date": "2024-01-03",
            }))
            .to_request();
        let res = test::call_service(&app, req).await;
        let body: Value = test::read_body_json(res).await;
        let booking_id = body["booking"]["id"].as_str().unwrap().to_string();

        // A pending booking contributes nothing.
        let req = test::TestRequest::get()
            .uri("/api/admin/dashboard")
            .cookie(admin.clone())
            .to_request();
        let res = test::call_service(&app, req).await;
        let body: Value = test::read_body_json(res).await;
        assert_eq!(body["total_revenue"], 0.0);
        assert_eq!(body["total_bookings"], 1);

        let req = test::TestRequest::post()
            .uri(&format!("/api/admin/bookings/{booking_id}/update"))
            .cookie(admin.clone())
            .set_json(json!({
                "status": "completed",
                "payment_status": "paid",
                "payment_id": "pay_abc123",
            }))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::OK);

        let req = test::TestRequest::get()
            .uri("/api/admin/dashboard")
            .cookie(admin)
            .to_request();
        let res = test::call_service(&app, req).await;
        let body: Value = test::read_body_json(res).await;
        assert_eq!(body["total_revenue"], 30000.0);
    }

    #[actix_web::test]
    async fn booking_update_unknown_booking_is_404() {
        let state = test_state().await;
        let app = test_app!(state);
        let admin = login!(&app, "admin", "admin123");

        let req = test::TestRequest::post()
            .uri("/api/admin/bookings/no-such-booking/update")
            .cookie(admin.clone())
            .set_json(json!({ "status": "completed" }))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn booking_update_rejects_unknown_status_values() {
        let state = test_state().await;
        let app = test_app!(state);
        let admin = login!(&app, "admin", "admin123");

        let guest = signup!(&app, "guest");
        let room_id: String = sqlx::query_scalar("SELECT id FROM hotel_rooms LIMIT 1")
            .fetch_one(&state.db)
            .await
            .unwrap();
        let req = test::TestRequest::post()
            .uri("/api/bookings")
            .cookie(guest)
            .set_json(json!({
                "booking_type": "hotel_room",
                "hotel_room_id": room_id,
                "check_in_date": "2024-01-01",
                "check_out_date": "2024-01-03",
            }))
            .to_request();
        let res = test::call_service(&app, req).await;
        let body: Value = test::read_body_json(res).await;
        let booking_id = body["booking"]["id"].as_str().unwrap().to_string();

        let req = test::TestRequest::post()
            .uri(&format!("/api/admin/bookings/{booking_id}/update"))
            .cookie(admin.clone())
            .set_json(json!({ "status": "teleported" }))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(res).await;
        assert_eq!(body["error"], "Invalid status");

        let req = test::TestRequest::post()
            .uri(&format!("/api/admin/bookings/{booking_id}/update"))
            .cookie(admin)
            .set_json(json!({ "payment_status": "iou" }))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(res).await;
        assert_eq!(body["error"], "Invalid payment status");

        // A rejected update leaves the row untouched.
        let (status, payment_status): (String, String) =
            sqlx::query_as("SELECT status, payment_status FROM bookings WHERE id = ?")
                .bind(&booking_id)
                .fetch_one(&state.db)
                .await
                .unwrap();
        assert_eq!(status, "pending");
        assert_eq!(payment_status, "pending");
    }

    #[actix_web::test]
    async fn contact_resolution_flow() {
        let state = test_state().await;
        let app = test_app!(state);
        let admin = login!(&app, "admin", "admin123");

        let req = test::TestRequest::post()
            .uri("/api/contact")
            .set_json(json!({
                "name": "Visitor",
                "email": "visitor@example.com",
                "message": "Opening hours?",
            }))
            .to_request();
        let res = test::call_service(&app, req).await;
        let body: Value = test::read_body_json(res).await;
        let contact_id = body["contact_id"].as_str().unwrap().to_string();

        let req = test::TestRequest::get()
            .uri("/api/admin/dashboard")
            .cookie(admin.clone())
            .to_request();
        let res = test::call_service(&app, req).await;
        let body: Value = test::read_body_json(res).await;
        assert_eq!(body["unread_contacts"], 1);

        let req = test::TestRequest::post()
            .uri(&format!("/api/admin/contacts/{contact_id}/resolve"))
            .cookie(admin.clone())
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::OK);

        let req = test::TestRequest::get()
            .uri("/api/admin/dashboard")
            .cookie(admin.clone())
            .to_request();
        let res = test::call_service(&app, req).await;
        let body: Value = test::read_body_json(res).await;
        assert_eq!(body["unread_contacts"], 0);

        let req = test::TestRequest::post()
            .uri("/api/admin/contacts/no-such-contact/resolve")
            .cookie(admin)
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn complaint_update_stamps_resolved_at() {
        let state = test_state().await;
        let app = test_app!(state);
        let admin = login!(&app, "admin", "admin123");
        let user = signup!(&app, "upset");

        let req = test::TestRequest::post()
            .uri("/api/complaints")
            .cookie(user)
            .set_json(json!({
                "complaint_type": "payment",
                "subject": "Refund pending",
                "description": "Refund has not arrived.",
            }))
            .to_request();
        let res = test::call_service(&app, req).await;
        let body: Value = test::read_body_json(res).await;
        let complaint_id = body["complaint"]["id"].as_str().unwrap().to_string();

        let req = test::TestRequest::post()
            .uri(&format!("/api/admin/complaints/{complaint_id}/update"))
            .cookie(admin.clone())
            .set_json(json!({ "status": "resolved", "admin_notes": "Refund issued." }))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::OK);

        let req = test::TestRequest::get()
            .uri("/api/admin/complaints")
            .cookie(admin.clone())
            .to_request();
        let res = test::call_service(&app, req).await;
        let body: Value = test::read_body_json(res).await;
        assert_eq!(body[0]["status"], "resolved");
        assert_eq!(body[0]["admin_notes"], "Refund issued.");
        assert!(body[0]["resolved_at"].is_string());

        let req = test::TestRequest::post()
            .uri(&format!("/api/admin/complaints/{complaint_id}/update"))
            .cookie(admin)
            .set_json(json!({ "status": "escalated" }))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn user_listing_hides_password_hashes() {
        let state = test_state().await;
        let app = test_app!(state);
        let admin = login!(&app, "admin", "admin123");
        signup!(&app, "someone");

        let req = test::TestRequest::get()
            .uri("/api/admin/users")
            .cookie(admin)
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::OK);
        let body: Value = test::read_body_json(res).await;
        let users = body.as_array().unwrap();
        assert_eq!(users.len(), 2);
        for user in users {
            assert!(user.get("password_hash").is_none());
        }
    }
}
