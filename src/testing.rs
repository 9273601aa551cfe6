//! Shared fixtures for the route tests: an in-memory database with the real
//! migrations and seed data, and macros that build the full app / drive the
//! auth endpoints to obtain a session cookie.

use std::str::FromStr;

use actix_web::{
    body::{BoxBody, MessageBody},
    cookie::Cookie,
    dev::{ServiceRequest, ServiceResponse},
    middleware::Next,
    Error, HttpResponse,
};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;

use crate::state::AppState;

pub async fn test_pool() -> SqlitePool {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")
        .unwrap()
        .foreign_keys(true);
    // A single connection keeps every query on the same in-memory database.
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .unwrap();
    crate::db::run_migrations(&pool).await.unwrap();
    crate::db::seed_defaults(&pool).await.unwrap();
    pool
}

pub async fn test_state() -> AppState {
    AppState {
        db: test_pool().await,
    }
}

pub fn session_cookie_from<B>(res: &ServiceResponse<B>) -> Cookie<'static> {
    res.response()
        .cookies()
        .find(|cookie| cookie.name() == crate::auth::SESSION_COOKIE)
        .expect("response should set a session cookie")
        .into_owned()
}

/// `HttpServer` renders middleware errors into responses in production, but
/// the bare test service surfaces them as `Err`, which `call_service` panics
/// on. This wrapper mirrors the server's behaviour for the test app.
pub async fn render_errors(
    req: ServiceRequest,
    next: Next<impl MessageBody + 'static>,
) -> Result<ServiceResponse<BoxBody>, Error> {
    match next.call(req).await {
        Ok(res) => Ok(res.map_into_boxed_body()),
        Err(err) => {
            // Routing panics if the real request is cloned across the call, so
            // the rendered error rides on a fresh dummy request; tests only
            // read the response side.
            let req = actix_web::test::TestRequest::default().to_http_request();
            Ok(ServiceResponse::new(req, HttpResponse::from_error(err)))
        }
    }
}

macro_rules! test_app {
    ($state:expr) => {
        actix_web::test::init_service(
            actix_web::App::new()
                .app_data(actix_web::web::Data::new($state.clone()))
                .app_data(crate::json_config())
                .wrap(actix_web::middleware::from_fn(crate::testing::render_errors))
                .configure(crate::routes::auth::configure)
                .configure(crate::routes::catalog::configure)
                .configure(crate::routes::bookings::configure)
                .configure(crate::routes::orders::configure)
                .configure(crate::routes::support::configure)
                .configure(crate::routes::admin::configure),
        )
        .await
    };
}

macro_rules! login {
    ($app:expr, $username:expr, $password:expr) => {{
        let req = actix_web::test::TestRequest::post()
            .uri("/api/auth/login")
            .set_json(serde_json::json!({
                "username": $username,
                "password": $password,
            }))
            .to_request();
        let res = actix_web::test::call_service($app, req).await;
        assert_eq!(res.status(), actix_web::http::StatusCode::OK);
        crate::testing::session_cookie_from(&res)
    }};
}

macro_rules! signup {
    ($app:expr, $username:expr) => {{
        let req = actix_web::test::TestRequest::post()
            .uri("/api/auth/signup")
            .set_json(serde_json::json!({
                "username": $username,
                "email": format!("{}@example.com", $username),
                "password": "hunter2",
                "full_name": "Test User",
                "phone": "1234567890",
            }))
            .to_request();
        let res = actix_web::test::call_service($app, req).await;
        assert_eq!(res.status(), actix_web::http::StatusCode::CREATED);
        crate::testing::session_cookie_from(&res)
    }};
}

pub(crate) use {login, signup, test_app};
