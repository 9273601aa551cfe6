use actix_web::{web, HttpResponse};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::{
    auth::{new_id, AdminUser},
    error::ApiError,
    models::{split_amenities, HotelRoomRow, ShoppingItemRow, WeddingHallRow},
    routes::non_empty,
    state::AppState,
};

#[derive(Debug, Clone, Serialize)]
struct WeddingHallView {
    id: String,
    name: String,
    location: String,
    capacity: i64,
    price_per_day: f64,
    description: Option<String>,
    amenities: Vec<String>,
    rating: f64,
}

impl From<WeddingHallRow> for WeddingHallView {
    fn from(row: WeddingHallRow) -> Self {
        WeddingHallView {
            id: row.id,
            name: row.name,
            location: row.location,
            capacity: row.capacity,
            price_per_day: row.price_per_day,
            description: row.description,
            amenities: split_amenities(&row.amenities),
            rating: row.rating,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
struct HotelRoomView {
    id: String,
    name: String,
    hotel_name: String,
    room_type: String,
    capacity: i64,
    price_per_night: f64,
    amenities: Vec<String>,
    rating: f64,
    available: bool,
}

impl From<HotelRoomRow> for HotelRoomView {
    fn from(row: HotelRoomRow) -> Self {
        HotelRoomView {
            id: row.id,
            name: row.name,
            hotel_name: row.hotel_name,
            room_type: row.room_type,
            capacity: row.capacity,
            price_per_night: row.price_per_night,
            amenities: split_amenities(&row.amenities),
            rating: row.rating,
            available: row.available != 0,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
struct ShoppingItemView {
    id: String,
    name: String,
    category: String,
    price: f64,
    stock: i64,
    description: Option<String>,
    rating: f64,
    vendor: String,
}

impl From<ShoppingItemRow> for ShoppingItemView {
    fn from(row: ShoppingItemRow) -> Self {
        ShoppingItemView {
            id: row.id,
            name: row.name,
            category: row.category,
            price: row.price,
            stock: row.stock,
            description: row.description,
            rating: row.rating,
            vendor: row.vendor,
        }
    }
}

#[derive(Deserialize)]
struct CreateHallPayload {
    name: Option<String>,
    location: Option<String>,
    capacity: Option<i64>,
    price_per_day: Option<f64>,
    description: Option<String>,
    #[serde(default)]
    amenities: Vec<String>,
}

#[derive(Deserialize)]
struct CreateRoomPayload {
    name: Option<String>,
    hotel_name: Option<String>,
    room_type: Option<String>,
    capacity: Option<i64>,
    price_per_night: Option<f64>,
    #[serde(default)]
    amenities: Vec<String>,
}

#[derive(Deserialize)]
struct CreateItemPayload {
    name: Option<String>,
    category: Option<String>,
    price: Option<f64>,
    vendor: Option<String>,
    stock: Option<i64>,
    description: Option<String>,
}

#[derive(Deserialize)]
struct CatalogFilter {
    category: Option<String>,
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/wedding-halls")
            .service(
                web::resource("")
                    .route(web::get().to(list_halls))
                    .route(web::post().to(create_hall)),
            )
            .service(web::resource("/{id}").route(web::get().to(get_hall))),
    )
    .service(
        web::scope("/api/hotel-rooms")
            .service(
                web::resource("")
                    .route(web::get().to(list_rooms))
                    .route(web::post().to(create_room)),
            )
            .service(web::resource("/{id}").route(web::get().to(get_room))),
    )
    .service(
        web::scope("/api/shopping-items")
            .service(
                web::resource("")
                    .route(web::get().to(list_items))
                    .route(web::post().to(create_item)),
            )
            .service(web::resource("/{id}").route(web::get().to(get_item))),
    );
}

async fn list_halls(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let rows = sqlx::query_as::<_, WeddingHallRow>("SELECT * FROM wedding_halls ORDER BY name")
        .fetch_all(&state.db)
        .await?;
    let halls: Vec<WeddingHallView> = rows.into_iter().map(Into::into).collect();
    Ok(HttpResponse::Ok().json(halls))
}

async fn get_hall(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let row = sqlx::query_as::<_, WeddingHallRow>("SELECT * FROM wedding_halls WHERE id = ?")
        .bind(path.into_inner())
        .fetch_optional(&state.db)
        .await?
        .ok_or(ApiError::NotFound("Wedding hall not found"))?;
    Ok(HttpResponse::Ok().json(WeddingHallView::from(row)))
}

async fn create_hall(
    state: web::Data<AppState>,
    _admin: AdminUser,
    payload: web::Json<CreateHallPayload>,
) -> Result<HttpResponse, ApiError> {
    let payload = payload.into_inner();
    let (Some(name), Some(location), Some(capacity), Some(price_per_day)) = (
        non_empty(payload.name),
        non_empty(payload.location),
        payload.capacity,
        payload.price_per_day,
    ) else {
        return Err(ApiError::validation("Missing required fields"));
    };

    let id = new_id();
    sqlx::query(
        r#"INSERT INTO wedding_halls (id, name, location, capacity, price_per_day, description, amenities, created_at)
           VALUES (?, ?, ?, ?, ?, ?, ?, ?)"#,
    )
    .bind(&id)
    .bind(&name)
    .bind(&location)
    .bind(capacity)
    .bind(price_per_day)
    .bind(&payload.description)
    .bind(crate::models::join_amenities(&payload.amenities))
    .bind(Utc::now().to_rfc3339())
    .execute(&state.db)
    .await?;

    let row = sqlx::query_as::<_, WeddingHallRow>("SELECT * FROM wedding_halls WHERE id = ?")
        .bind(&id)
        .fetch_one(&state.db)
        .await?;

    Ok(HttpResponse::Created().json(json!({
        "message": "Wedding hall created",
        "hall": WeddingHallView::from(row),
    })))
}

async fn list_rooms(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let rows = sqlx::query_as::<_, HotelRoomRow>("SELECT * FROM hotel_rooms ORDER BY name")
        .fetch_all(&state.db)
        .await?;
    let rooms: Vec<HotelRoomView> = rows.into_iter().map(Into::into).collect();
    Ok(HttpResponse::Ok().json(rooms))
}

async fn get_room(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let row = sqlx::query_as::<_, HotelRoomRow>("SELECT * FROM hotel_rooms WHERE id = ?")
        .bind(path.into_inner())
        .fetch_optional(&state.db)
        .await?
        .ok_or(ApiError::NotFound("Hotel room not found"))?;
    Ok(HttpResponse::Ok().json(HotelRoomView::from(row)))
}

async fn create_room(
    state: web::Data<AppState>,
    _admin: AdminUser,
    payload: web::Json<CreateRoomPayload>,
) -> Result<HttpResponse, ApiError> {
    let payload = payload.into_inner();
    let (Some(name), Some(hotel_name), Some(room_type), Some(capacity), Some(price_per_night)) = (
        non_empty(payload.name),
        non_empty(payload.hotel_name),
        non_empty(payload.room_type),
        payload.capacity,
        payload.price_per_night,
    ) else {
        return Err(ApiError::validation("Missing required fields"));
    };

    let id = new_id();
    sqlx::query(
        r#"INSERT INTO hotel_rooms (id, name, hotel_name, room_type, capacity, price_per_night, amenities, created_at)
           VALUES (?, ?, ?, ?, ?, ?, ?, ?)"#,
    )
    .bind(&id)
    .bind(&name)
    .bind(&hotel_name)
    .bind(&room_type)
    .bind(capacity)
    .bind(price_per_night)
    .bind(crate::models::join_amenities(&payload.amenities))
    .bind(Utc::now().to_rfc3339())
    .execute(&state.db)
    .await?;

    let row = sqlx::query_as::<_, HotelRoomRow>("SELECT * FROM hotel_rooms WHERE id = ?")
        .bind(&id)
        .fetch_one(&state.db)
        .await?;

    Ok(HttpResponse::Created().json(json!({
        "message": "Hotel room created",
        "room": HotelRoomView::from(row),
    })))
}

async fn list_items(
    state: web::Data<AppState>,
    query: web::Query<CatalogFilter>,
) -> Result<HttpResponse, ApiError> {
    let rows = match query.category.as_deref().filter(|c| !c.is_empty()) {
        Some(category) => {
            sqlx::query_as::<_, ShoppingItemRow>(
                "SELECT * FROM shopping_items WHERE category = ? ORDER BY name",
            )
            .bind(category)
            .fetch_all(&state.db)
            .await?
        }
        None => {
            sqlx::query_as::<_, ShoppingItemRow>("SELECT * FROM shopping_items ORDER BY name")
                .fetch_all(&state.db)
                .await?
        }
    };
    let items: Vec<ShoppingItemView> = rows.into_iter().map(Into::into).collect();
    Ok(HttpResponse::Ok().json(items))
}

async fn get_item(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let row = sqlx::query_as::<_, ShoppingItemRow>("SELECT * FROM shopping_items WHERE id = ?")
        .bind(path.into_inner())
        .fetch_optional(&state.db)
        .await?
        .ok_or(ApiError::NotFound("Shopping item not found"))?;
    Ok(HttpResponse::Ok().json(ShoppingItemView::from(row)))
}

async fn create_item(
    state: web::Data<AppState>,
    _admin: AdminUser,
    payload: web::Json<CreateItemPayload>,
) -> Result<HttpResponse, ApiError> {
    let payload = payload.into_inner();
    let (Some(name), Some(category), Some(price), Some(vendor)) = (
        non_empty(payload.name),
        non_empty(payload.category),
        payload.price,
        non_empty(payload.vendor),
    ) else {
        return Err(ApiError::validation("Missing required fields"));
    };

    let id = new_id();
    sqlx::query(
        r#"INSERT INTO shopping_items (id, name, category, price, stock, description, vendor, created_at)
           VALUES (?, ?, ?, ?, ?, ?, ?, ?)"#,
    )
    .bind(&id)
    .bind(&name)
    .bind(&category)
    .bind(price)
    .bind(payload.stock.unwrap_or(10))
    .bind(&payload.description)
    .bind(&vendor)
    .bind(Utc::now().to_rfc3339())
    .execute(&state.db)
    .await?;

    let row = sqlx::query_as::<_, ShoppingItemRow>("SELECT * FROM shopping_items WHERE id = ?")
        .bind(&id)
        .fetch_one(&state.db)
        .await?;

    Ok(HttpResponse::Created().json(json!({
        "message": "Shopping item created",
        "item": ShoppingItemView::from(row),
    })))
}
