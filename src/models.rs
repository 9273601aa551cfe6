use serde::Serialize;

pub const BOOKING_TYPE_WEDDING_HALL: &str = "wedding_hall";
pub const BOOKING_TYPE_HOTEL_ROOM: &str = "hotel_room";

pub const BOOKING_PENDING: &str = "pending";
pub const BOOKING_CONFIRMED: &str = "confirmed";
pub const BOOKING_COMPLETED: &str = "completed";
pub const BOOKING_CANCELLED: &str = "cancelled";
pub const BOOKING_STATUSES: [&str; 4] = [
    BOOKING_PENDING,
    BOOKING_CONFIRMED,
    BOOKING_COMPLETED,
    BOOKING_CANCELLED,
];

pub const PAYMENT_PENDING: &str = "pending";
pub const PAYMENT_PAID: &str = "paid";
pub const PAYMENT_FAILED: &str = "failed";
pub const PAYMENT_STATUSES: [&str; 3] = [PAYMENT_PENDING, PAYMENT_PAID, PAYMENT_FAILED];

pub const CONTACT_RESOLVED: &str = "resolved";

pub const COMPLAINT_RESOLVED: &str = "resolved";
pub const COMPLAINT_STATUSES: [&str; 4] = ["open", "in_progress", "resolved", "closed"];

pub const PRIORITY_MEDIUM: &str = "medium";
pub const PRIORITIES: [&str; 4] = ["low", "medium", "high", "urgent"];

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserRow {
    pub id: String,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub full_name: String,
    pub phone: String,
    pub is_admin: i64,
    pub created_at: String,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct WeddingHallRow {
    pub id: String,
    pub name: String,
    pub location: String,
    pub capacity: i64,
    pub price_per_day: f64,
    pub description: Option<String>,
    pub amenities: String,
    pub rating: f64,
    pub created_at: String,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct HotelRoomRow {
    pub id: String,
    pub name: String,
    pub hotel_name: String,
    pub room_type: String,
    pub capacity: i64,
    pub price_per_night: f64,
    pub amenities: String,
    pub rating: f64,
    pub available: i64,
    pub created_at: String,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ShoppingItemRow {
    pub id: String,
    pub name: String,
    pub category: String,
    pub price: f64,
    pub stock: i64,
    pub description: Option<String>,
    pub rating: f64,
    pub vendor: String,
    pub created_at: String,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct BookingRow {
    pub id: String,
    pub user_id: String,
    pub booking_type: String,
    pub wedding_hall_id: Option<String>,
    pub hotel_room_id: Option<String>,
    pub check_in_date: String,
    pub check_out_date: String,
    pub total_price: f64,
    pub guests: i64,
    pub special_requests: Option<String>,
    pub status: String,
    pub payment_status: String,
    pub payment_id: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct OrderRow {
    pub id: String,
    pub user_id: String,
    pub item_id: String,
    pub quantity: i64,
    pub total_price: f64,
    pub status: String,
    pub payment_id: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ContactRow {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub message: String,
    pub status: String,
    pub created_at: String,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ComplaintRow {
    pub id: String,
    pub user_id: String,
    pub complaint_type: String,
    pub subject: String,
    pub description: String,
    pub status: String,
    pub priority: String,
    pub admin_notes: Option<String>,
    pub created_at: String,
    pub resolved_at: Option<String>,
}

/// Public view of a user, shared by the auth and admin routes. Never carries
/// the password hash.
#[derive(Debug, Clone, Serialize)]
pub struct UserView {
    pub id: String,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub phone: String,
    pub is_admin: bool,
    pub created_at: String,
}

impl From<UserRow> for UserView {
    fn from(row: UserRow) -> Self {
        UserView {
            id: row.id,
            username: row.username,
            email: row.email,
            full_name: row.full_name,
            phone: row.phone,
            is_admin: row.is_admin != 0,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BookingView {
    pub id: String,
    pub user_id: String,
    pub booking_type: String,
    pub check_in_date: String,
    pub check_out_date: String,
    pub total_price: f64,
    pub guests: i64,
    pub special_requests: Option<String>,
    pub status: String,
    pub payment_status: String,
    pub created_at: String,
}

impl From<BookingRow> for BookingView {
    fn from(row: BookingRow) -> Self {
        BookingView {
            id: row.id,
            user_id: row.user_id,
            booking_type: row.booking_type,
            check_in_date: row.check_in_date,
            check_out_date: row.check_out_date,
            total_price: row.total_price,
            guests: row.guests,
            special_requests: row.special_requests,
            status: row.status,
            payment_status: row.payment_status,
            created_at: row.created_at,
        }
    }
}

/// Amenities are persisted as comma-delimited text and exposed to clients as a
/// list. These two functions are the only place that encoding is visible.
pub fn split_amenities(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn join_amenities(list: &[String]) -> String {
    list.iter()
        .map(|item| item.trim())
        .filter(|item| !item.is_empty())
        .collect::<Vec<_>>()
        .join(",")
}
