use std::{future::Future, pin::Pin};

use actix_web::{
    body::MessageBody,
    cookie::{time::Duration, Cookie, SameSite},
    dev::{Payload, ServiceRequest, ServiceResponse},
    middleware::Next,
    web, Error, FromRequest, HttpMessage, HttpRequest,
};
use argon2::{
    password_hash::{self, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::Utc;
use rand_core::OsRng;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::{error::ApiError, models::UserRow, state::AppState};

pub const SESSION_COOKIE: &str = "vb_session";

/// Resolved identity for the current request, inserted into request
/// extensions by the guard middleware and read back via `web::ReqData`.
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub id: String,
    pub username: String,
    pub full_name: String,
    pub is_admin: bool,
}

pub fn hash_password(password: &str) -> Result<String, password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default().hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

pub fn verify_password(password: &str, password_hash: &str) -> bool {
    match PasswordHash::new(password_hash) {
        Ok(hash) => Argon2::default()
            .verify_password(password.as_bytes(), &hash)
            .is_ok(),
        Err(_) => false,
    }
}

pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// Looks up a user by username and checks the password. `Ok(None)` covers
/// both unknown username and wrong password so callers can't tell them apart.
pub async fn verify_credentials(
    pool: &SqlitePool,
    username: &str,
    password: &str,
) -> Result<Option<UserRow>, sqlx::Error> {
    let user = sqlx::query_as::<_, UserRow>(
        "SELECT * FROM users WHERE username = ? LIMIT 1",
    )
    .bind(username)
    .fetch_optional(pool)
    .await?;

    let Some(user) = user else {
        return Ok(None);
    };

    if !verify_password(password, &user.password_hash) {
        return Ok(None);
    }

    Ok(Some(user))
}

pub async fn create_session(pool: &SqlitePool, user_id: &str) -> Result<String, sqlx::Error> {
    let token = new_id();
    sqlx::query("INSERT INTO sessions (id, user_id, created_at) VALUES (?, ?, ?)")
        .bind(&token)
        .bind(user_id)
        .bind(Utc::now().to_rfc3339())
        .execute(pool)
        .await?;
    Ok(token)
}

pub async fn destroy_session(pool: &SqlitePool, token: &str) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM sessions WHERE id = ?")
        .bind(token)
        .execute(pool)
        .await?;
    Ok(())
}

pub fn session_cookie(req: &HttpRequest, token: &str) -> Cookie<'static> {
    let mut builder = Cookie::build(SESSION_COOKIE, token.to_string())
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(Duration::days(7));
    if req.connection_info().scheme() == "https" {
        builder = builder.secure(true);
    }
    builder.finish()
}

pub fn clear_session_cookie(req: &HttpRequest) -> Cookie<'static> {
    let mut builder = Cookie::build(SESSION_COOKIE, "")
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(Duration::seconds(0));
    if req.connection_info().scheme() == "https" {
        builder = builder.secure(true);
    }
    builder.finish()
}

/// Resolves the session cookie against the session store and user table.
/// `Ok(None)` covers missing cookies and stale tokens; lookup failures stay
/// errors so guards can render them as 500 rather than 401.
pub async fn current_user(req: &HttpRequest) -> Result<Option<AuthUser>, sqlx::Error> {
    let Some(state) = req.app_data::<web::Data<AppState>>() else {
        return Ok(None);
    };
    let Some(token) = req.cookie(SESSION_COOKIE) else {
        return Ok(None);
    };

    let row = sqlx::query_as::<_, (String, String, String, i64)>(
        r#"SELECT u.id, u.username, u.full_name, u.is_admin
           FROM sessions s
           JOIN users u ON s.user_id = u.id
           WHERE s.id = ?
           LIMIT 1"#,
    )
    .bind(token.value())
    .fetch_optional(&state.db)
    .await?;

    Ok(row.map(|row| AuthUser {
        id: row.0,
        username: row.1,
        full_name: row.2,
        is_admin: row.3 != 0,
    }))
}

pub async fn require_user(
    req: ServiceRequest,
    next: Next<impl MessageBody>,
) -> Result<ServiceResponse<impl MessageBody>, Error> {
    let user = current_user(req.request())
        .await
        .map_err(ApiError::from)?
        .ok_or(ApiError::Unauthorized("Unauthorized"))?;
    req.extensions_mut().insert(user);
    next.call(req).await
}

pub async fn require_admin(
    req: ServiceRequest,
    next: Next<impl MessageBody>,
) -> Result<ServiceResponse<impl MessageBody>, Error> {
    let user = current_user(req.request())
        .await
        .map_err(ApiError::from)?
        .ok_or(ApiError::Unauthorized("Unauthorized"))?;
    if !user.is_admin {
        return Err(ApiError::Forbidden("Admin access required").into());
    }
    req.extensions_mut().insert(user);
    next.call(req).await
}

/// Extractor for admin-only handlers on otherwise public paths (catalog
/// creation), where scope-level middleware would also gate the open GETs.
pub struct AdminUser(pub AuthUser);

impl FromRequest for AdminUser {
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self, Self::Error>>>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let req = req.clone();
        Box::pin(async move {
            let user = current_user(&req)
                .await
                .map_err(ApiError::from)?
                .ok_or(ApiError::Unauthorized("Unauthorized"))?;
            if !user.is_admin {
                return Err(ApiError::Forbidden("Admin access required").into());
            }
            Ok(AdminUser(user))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_hash_verifies() {
        let hash = hash_password("hunter2").unwrap();
        assert!(verify_password("hunter2", &hash));
        assert!(!verify_password("hunter3", &hash));
    }

    #[test]
    fn garbage_hash_never_verifies() {
        assert!(!verify_password("hunter2", "not-a-phc-string"));
        assert!(!verify_password("hunter2", ""));
    }
}
