use actix_web::{middleware::from_fn, web, HttpResponse};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::{
    auth::{new_id, require_user, AuthUser},
    error::ApiError,
    models::OrderRow,
    state::AppState,
};

#[derive(Deserialize)]
struct CreateOrderPayload {
    item_id: Option<String>,
    quantity: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
struct OrderView {
    id: String,
    item_id: String,
    quantity: i64,
    total_price: f64,
    status: String,
    created_at: String,
}

impl From<OrderRow> for OrderView {
    fn from(row: OrderRow) -> Self {
        OrderView {
            id: row.id,
            item_id: row.item_id,
            quantity: row.quantity,
            total_price: row.total_price,
            status: row.status,
            created_at: row.created_at,
        }
    }
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/orders")
            .wrap(from_fn(require_user))
            .service(
                web::resource("")
                    .route(web::post().to(place_order))
                    .route(web::get().to(list_orders)),
            ),
    );
}

async fn place_order(
    state: web::Data<AppState>,
    auth: web::ReqData<AuthUser>,
    payload: web::Json<CreateOrderPayload>,
) -> Result<HttpResponse, ApiError> {
    let payload = payload.into_inner();
    let item_id = payload
        .item_id
        .ok_or_else(|| ApiError::validation("Missing item_id"))?;
    let quantity = payload.quantity.unwrap_or(0);
    if quantity < 1 {
        return Err(ApiError::validation("Quantity must be at least 1"));
    }

    let price = sqlx::query_scalar::<_, f64>("SELECT price FROM shopping_items WHERE id = ?")
        .bind(&item_id)
        .fetch_optional(&state.db)
        .await?
        .ok_or(ApiError::NotFound("Shopping item not found"))?;

    let id = new_id();
    sqlx::query(
        r#"INSERT INTO orders (id, user_id, item_id, quantity, total_price, created_at)
           VALUES (?, ?, ?, ?, ?, ?)"#,
    )
    .bind(&id)
    .bind(&auth.id)
    .bind(&item_id)
    .bind(quantity)
    .bind(price * quantity as f64)
    .bind(Utc::now().to_rfc3339())
    .execute(&state.db)
    .await?;

    let row = sqlx::query_as::<_, OrderRow>("SELECT * FROM orders WHERE id = ?")
        .bind(&id)
        .fetch_one(&state.db)
        .await?;

    Ok(HttpResponse::Created().json(json!({
        "message": "Order placed",
        "order": OrderView::from(row),
    })))
}

async fn list_orders(
    state: web::Data<AppState>,
    auth: web::ReqData<AuthUser>,
) -> Result<HttpResponse, ApiError> {
    let rows = sqlx::query_as::<_, OrderRow>(
        "SELECT * FROM orders WHERE user_id = ? ORDER BY created_at DESC",
    )
    .bind(&auth.id)
    .fetch_all(&state.db)
    .await?;
    let orders: Vec<OrderView> = rows.into_iter().map(Into::into).collect();
    Ok(HttpResponse::Ok().json(orders))
}
