use std::{env, fs, path::Path};

use chrono::Utc;
use sqlx::SqlitePool;

use crate::auth::{hash_password, new_id};

pub async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}

pub fn ensure_sqlite_dir(db_url: &str) -> std::io::Result<()> {
    let path = if let Some(path) = db_url.strip_prefix("sqlite://") {
        Some(path)
    } else if let Some(path) = db_url.strip_prefix("sqlite:") {
        Some(path)
    } else {
        None
    };

    let Some(path) = path else {
        return Ok(());
    };

    let path = path.split('?').next().unwrap_or(path);
    if path == ":memory:" || path.is_empty() {
        return Ok(());
    }

    let path = path.strip_prefix("file:").unwrap_or(path);
    let db_path = Path::new(path);
    if let Some(parent) = db_path.parent() {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}

pub async fn seed_defaults(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    seed_admin(pool).await?;
    seed_inventory(pool).await?;
    Ok(())
}

/// Id of the seeded admin account. Anonymous contact submissions are
/// attributed to it.
pub async fn admin_user_id(pool: &SqlitePool) -> Result<Option<String>, sqlx::Error> {
    sqlx::query_scalar::<_, String>("SELECT id FROM users WHERE is_admin = 1 LIMIT 1")
        .fetch_optional(pool)
        .await
}

async fn seed_admin(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    if admin_user_id(pool).await?.is_some() {
        return Ok(());
    }

    let username = env::var("ADMIN_USER").unwrap_or_else(|_| "admin".to_string());
    let password = env::var("ADMIN_PASSWORD").unwrap_or_else(|_| "admin123".to_string());
    let email = env::var("ADMIN_EMAIL").unwrap_or_else(|_| "admin@venuebook.local".to_string());

    if password == "admin123" {
        log::warn!("ADMIN_PASSWORD not set. Using default password 'admin123'. Set ADMIN_PASSWORD in production.");
    }

    let password_hash = hash_password(&password)
        .map_err(|_| sqlx::Error::Protocol("password hash failed".into()))?;

    sqlx::query(
        r#"INSERT INTO users (id, username, email, password_hash, full_name, phone, is_admin, created_at)
           VALUES (?, ?, ?, ?, ?, ?, 1, ?)"#,
    )
    .bind(new_id())
    .bind(username)
    .bind(email)
    .bind(password_hash)
    .bind("Admin User")
    .bind("9999999999")
    .bind(Utc::now().to_rfc3339())
    .execute(pool)
    .await?;

    Ok(())
}

/// One sample row per inventory table, inserted only when the table is empty.
async fn seed_inventory(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    let now = Utc::now().to_rfc3339();

    let halls = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM wedding_halls")
        .fetch_one(pool)
        .await?;
    if halls == 0 {
        sqlx::query(
            r#"INSERT INTO wedding_halls (id, name, location, capacity, price_per_day, description, amenities, created_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(new_id())
        .bind("The Grand Palace")
        .bind("Mumbai")
        .bind(500_i64)
        .bind(50000.0_f64)
        .bind("Luxurious wedding hall with modern amenities")
        .bind("AC,Sound System,Parking,Catering")
        .bind(&now)
        .execute(pool)
        .await?;
    }

    let rooms = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM hotel_rooms")
        .fetch_one(pool)
        .await?;
    if rooms == 0 {
        sqlx::query(
            r#"INSERT INTO hotel_rooms (id, name, hotel_name, room_type, capacity, price_per_night, amenities, created_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(new_id())
        .bind("Deluxe Suite")
        .bind("Taj Hotels")
        .bind("Suite")
        .bind(2_i64)
        .bind(15000.0_f64)
        .bind("AC,WiFi,TV,Mini Bar")
        .bind(&now)
        .execute(pool)
        .await?;
    }

    let items = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM shopping_items")
        .fetch_one(pool)
        .await?;
    if items == 0 {
        sqlx::query(
            r#"INSERT INTO shopping_items (id, name, category, price, stock, description, vendor, created_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(new_id())
        .bind("Wedding Decoration Set")
        .bind("Decorations")
        .bind(5000.0_f64)
        .bind(20_i64)
        .bind("Complete decoration set for weddings")
        .bind("Decor Store")
        .bind(&now)
        .execute(pool)
        .await?;
    }

    Ok(())
}
