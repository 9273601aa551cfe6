use actix_web::{middleware::from_fn, web, HttpRequest, HttpResponse};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::{
    auth::{current_user, new_id, require_user, AuthUser},
    db::admin_user_id,
    error::ApiError,
    models::{ComplaintRow, PRIORITIES, PRIORITY_MEDIUM},
    routes::non_empty,
    state::AppState,
};

#[derive(Deserialize)]
struct ContactPayload {
    name: Option<String>,
    email: Option<String>,
    phone: Option<String>,
    message: Option<String>,
}

#[derive(Deserialize)]
struct ComplaintPayload {
    complaint_type: Option<String>,
    subject: Option<String>,
    description: Option<String>,
    priority: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
struct ComplaintSummary {
    id: String,
    complaint_type: String,
    subject: String,
    status: String,
    priority: String,
    created_at: String,
}

impl From<ComplaintRow> for ComplaintSummary {
    fn from(row: ComplaintRow) -> Self {
        ComplaintSummary {
            id: row.id,
            complaint_type: row.complaint_type,
            subject: row.subject,
            status: row.status,
            priority: row.priority,
            created_at: row.created_at,
        }
    }
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/api/contact").route(web::post().to(submit_contact)))
        .service(
            web::scope("/api/complaints")
                .wrap(from_fn(require_user))
                .service(
                    web::resource("")
                        .route(web::post().to(submit_complaint))
                        .route(web::get().to(list_complaints)),
                ),
        );
}

/// Contact form is open to anyone; messages without a session are attributed
/// to the seeded admin account.
async fn submit_contact(
    state: web::Data<AppState>,
    req: HttpRequest,
    payload: web::Json<ContactPayload>,
) -> Result<HttpResponse, ApiError> {
    let payload = payload.into_inner();
    let (Some(name), Some(email), Some(message)) = (
        non_empty(payload.name),
        non_empty(payload.email),
        non_empty(payload.message),
    ) else {
        return Err(ApiError::validation("Missing required fields"));
    };

    let user_id = match current_user(&req).await? {
        Some(user) => user.id,
        None => admin_user_id(&state.db)
            .await?
            .ok_or_else(|| ApiError::Internal("no admin account seeded".to_string()))?,
    };

    let id = new_id();
    sqlx::query(
        r#"INSERT INTO contacts (id, user_id, name, email, phone, message, created_at)
           VALUES (?, ?, ?, ?, ?, ?, ?)"#,
    )
    .bind(&id)
    .bind(&user_id)
    .bind(&name)
    .bind(&email)
    .bind(&payload.phone)
    .bind(&message)
    .bind(Utc::now().to_rfc3339())
    .execute(&state.db)
    .await?;

    Ok(HttpResponse::Created().json(json!({
        "message": "Contact message submitted successfully",
        "contact_id": id,
    })))
}

async fn submit_complaint(
    state: web::Data<AppState>,
    auth: web::ReqData<AuthUser>,
    payload: web::Json<ComplaintPayload>,
) -> Result<HttpResponse, ApiError> {
    let payload = payload.into_inner();
    let (Some(complaint_type), Some(subject), Some(description)) = (
        non_empty(payload.complaint_type),
        non_empty(payload.subject),
        non_empty(payload.description),
    ) else {
        return Err(ApiError::validation("Missing required fields"));
    };

    let priority = payload.priority.unwrap_or_else(|| PRIORITY_MEDIUM.to_string());
    if !PRIORITIES.contains(&priority.as_str()) {
        return Err(ApiError::validation("Invalid priority"));
    }

    let id = new_id();
    sqlx::query(
        r#"INSERT INTO complaints (id, user_id, complaint_type, subject, description, priority, created_at)
           VALUES (?, ?, ?, ?, ?, ?, ?)"#,
    )
    .bind(&id)
    .bind(&auth.id)
    .bind(&complaint_type)
    .bind(&subject)
    .bind(&description)
    .bind(&priority)
    .bind(Utc::now().to_rfc3339())
    .execute(&state.db)
    .await?;

    let status: String = sqlx::query_scalar("SELECT status FROM complaints WHERE id = ?")
        .bind(&id)
        .fetch_one(&state.db)
        .await?;

    Ok(HttpResponse::Created().json(json!({
        "message": "Complaint submitted",
        "complaint": { "id": id, "status": status },
    })))
}

async fn list_complaints(
    state: web::Data<AppState>,
    auth: web::ReqData<AuthUser>,
) -> Result<HttpResponse, ApiError> {
    let rows = sqlx::query_as::<_, ComplaintRow>(
        "SELECT * FROM complaints WHERE user_id = ? ORDER BY created_at DESC",
    )
    .bind(&auth.id)
    .fetch_all(&state.db)
    .await?;
    let complaints: Vec<ComplaintSummary> = rows.into_iter().map(Into::into).collect();
    Ok(HttpResponse::Ok().json(complaints))
}
