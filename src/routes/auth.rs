use actix_web::{middleware::from_fn, web, HttpRequest, HttpResponse};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;

use crate::{
    auth::{
        clear_session_cookie, create_session, destroy_session, hash_password, new_id,
        require_user, session_cookie, verify_credentials, AuthUser, SESSION_COOKIE,
    },
    error::ApiError,
    models::{UserRow, UserView},
    routes::non_empty,
    state::AppState,
};

#[derive(Deserialize)]
struct SignupPayload {
    username: Option<String>,
    email: Option<String>,
    password: Option<String>,
    full_name: Option<String>,
    phone: Option<String>,
}

#[derive(Deserialize)]
struct LoginPayload {
    username: Option<String>,
    password: Option<String>,
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/auth")
            .service(web::resource("/signup").route(web::post().to(signup)))
            .service(web::resource("/login").route(web::post().to(login)))
            .service(web::resource("/logout").route(web::post().to(logout)))
            .service(
                web::resource("/me")
                    .wrap(from_fn(require_user))
                    .route(web::get().to(me)),
            ),
    );
}

async fn signup(
    state: web::Data<AppState>,
    req: HttpRequest,
    payload: web::Json<SignupPayload>,
) -> Result<HttpResponse, ApiError> {
    let payload = payload.into_inner();
    let (Some(username), Some(email), Some(password), Some(full_name), Some(phone)) = (
        non_empty(payload.username),
        non_empty(payload.email),
        payload.password.filter(|value| !value.is_empty()),
        non_empty(payload.full_name),
        non_empty(payload.phone),
    ) else {
        return Err(ApiError::validation("Missing required fields"));
    };

    let mut tx = state.db.begin().await?;

    let username_taken =
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users WHERE username = ?")
            .bind(&username)
            .fetch_one(&mut *tx)
            .await?;
    if username_taken > 0 {
        return Err(ApiError::validation("Username already exists"));
    }

    let email_taken = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users WHERE email = ?")
        .bind(&email)
        .fetch_one(&mut *tx)
        .await?;
    if email_taken > 0 {
        return Err(ApiError::validation("Email already exists"));
    }

    let password_hash = hash_password(&password)
        .map_err(|err| ApiError::Internal(format!("password hash failed: {err}")))?;
    let user_id = new_id();
    let created_at = Utc::now().to_rfc3339();

    sqlx::query(
        r#"INSERT INTO users (id, username, email, password_hash, full_name, phone, is_admin, created_at)
           VALUES (?, ?, ?, ?, ?, ?, 0, ?)"#,
    )
    .bind(&user_id)
    .bind(&username)
    .bind(&email)
    .bind(&password_hash)
    .bind(&full_name)
    .bind(&phone)
    .bind(&created_at)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    let token = create_session(&state.db, &user_id).await?;
    log::info!("new signup: {username}");

    let user = UserView {
        id: user_id,
        username,
        email,
        full_name,
        phone,
        is_admin: false,
        created_at,
    };

    Ok(HttpResponse::Created()
        .cookie(session_cookie(&req, &token))
        .json(json!({
            "message": "Signup successful",
            "user": user,
        })))
}

async fn login(
    state: web::Data<AppState>,
    req: HttpRequest,
    payload: web::Json<LoginPayload>,
) -> Result<HttpResponse, ApiError> {
    let payload = payload.into_inner();
    let (Some(username), Some(password)) = (
        non_empty(payload.username),
        payload.password.filter(|value| !value.is_empty()),
    ) else {
        return Err(ApiError::validation("Missing credentials"));
    };

    let user = verify_credentials(&state.db, &username, &password)
        .await?
        .ok_or(ApiError::Unauthorized("Invalid credentials"))?;

    let token = create_session(&state.db, &user.id).await?;

    Ok(HttpResponse::Ok()
        .cookie(session_cookie(&req, &token))
        .json(json!({
            "message": "Login successful",
            "user": UserView::from(user),
        })))
}

async fn logout(state: web::Data<AppState>, req: HttpRequest) -> Result<HttpResponse, ApiError> {
    if let Some(cookie) = req.cookie(SESSION_COOKIE) {
        destroy_session(&state.db, cookie.value()).await?;
    }

    Ok(HttpResponse::Ok()
        .cookie(clear_session_cookie(&req))
        .json(json!({ "message": "Logged out successfully" })))
}

async fn me(
    state: web::Data<AppState>,
    auth: web::ReqData<AuthUser>,
) -> Result<HttpResponse, ApiError> {
    let user = sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE id = ?")
        .bind(&auth.id)
        .fetch_optional(&state.db)
        .await?
        .ok_or(ApiError::NotFound("User not found"))?;

    Ok(HttpResponse::Ok().json(UserView::from(user)))
}

#[cfg(test)]
mod tests {
    use actix_web::{http::StatusCode, test};
    use serde_json::{json, Value};

    use crate::testing::{login, signup, test_app, test_state};

    #[actix_web::test]
    async fn signup_rejects_duplicate_username_and_email() {
        let state = test_state().await;
        let app = test_app!(state);

        signup!(&app, "ravi");

        let req = test::TestRequest::post()
            .uri("/api/auth/signup")
            .set_json(json!({
                "username": "ravi",
                "email": "other@example.com",
                "password": "hunter2",
                "full_name": "Ravi Again",
                "phone": "1234567890",
            }))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(res).await;
        assert_eq!(body["error"], "Username already exists");

        let req = test::TestRequest::post()
            .uri("/api/auth/signup")
            .set_json(json!({
                "username": "ravi2",
                "email": "ravi@example.com",
                "password": "hunter2",
                "full_name": "Ravi Again",
                "phone": "1234567890",
            }))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(res).await;
        assert_eq!(body["error"], "Email already exists");
    }

    #[actix_web::test]
    async fn signup_requires_all_fields() {
        let state = test_state().await;
        let app = test_app!(state);

        let req = test::TestRequest::post()
            .uri("/api/auth/signup")
            .set_json(json!({ "username": "ravi", "password": "hunter2" }))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn login_rejects_bad_credentials() {
        let state = test_state().await;
        let app = test_app!(state);

        signup!(&app, "ravi");

        let req = test::TestRequest::post()
            .uri("/api/auth/login")
            .set_json(json!({ "username": "ravi", "password": "wrong" }))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

        let req = test::TestRequest::post()
            .uri("/api/auth/login")
            .set_json(json!({ "username": "nobody", "password": "hunter2" }))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn login_session_resolves_to_same_user() {
        let state = test_state().await;
        let app = test_app!(state);

        let req = test::TestRequest::post()
            .uri("/api/auth/signup")
            .set_json(json!({
                "username": "ravi",
                "email": "ravi@example.com",
                "password": "hunter2",
                "full_name": "Ravi Kumar",
                "phone": "1234567890",
            }))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::CREATED);
        let body: Value = test::read_body_json(res).await;
        let signup_id = body["user"]["id"].as_str().unwrap().to_string();

        let cookie = login!(&app, "ravi", "hunter2");
        let req = test::TestRequest::get()
            .uri("/api/auth/me")
            .cookie(cookie)
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::OK);
        let body: Value = test::read_body_json(res).await;
        assert_eq!(body["id"], signup_id.as_str());
        assert_eq!(body["is_admin"], false);
    }

    #[actix_web::test]
    async fn me_requires_a_session() {
        let state = test_state().await;
        let app = test_app!(state);

        let req = test::TestRequest::get().uri("/api/auth/me").to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn session_lookup_failure_is_a_server_error() {
        let state = test_state().await;
        let app = test_app!(state);
        let cookie = signup!(&app, "ravi");

        // With the pool closed, session resolution fails as a database error,
        // not as a missing session.
        state.db.close().await;

        let req = test::TestRequest::get()
            .uri("/api/auth/me")
            .cookie(cookie)
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[actix_web::test]
    async fn logout_invalidates_the_session() {
        let state = test_state().await;
        let app = test_app!(state);

        let cookie = signup!(&app, "ravi");

        let req = test::TestRequest::post()
            .uri("/api/auth/logout")
            .cookie(cookie.clone())
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::OK);

        let req = test::TestRequest::get()
            .uri("/api/auth/me")
            .cookie(cookie)
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }
}
