#![cfg(test)]

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

use crate::connection::LegacyDb;

pub const LEGACY_SCHEMA: &str = include_str!("../fixtures/legacy_schema.sql");
pub const CONTACT_FORM: &str = include_str!("../fixtures/contact_form.sql");

/// Empty in-memory legacy database with the legacy schema applied.
pub async fn legacy_db() -> LegacyDb {
    let options = SqliteConnectOptions::new().filename(":memory:");
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .unwrap();
    sqlx::raw_sql(LEGACY_SCHEMA).execute(&pool).await.unwrap();
    LegacyDb::from_pool(pool)
}

pub async fn seed_contact_form(db: &LegacyDb) {
    sqlx::raw_sql(CONTACT_FORM).execute(db.pool()).await.unwrap();
}
