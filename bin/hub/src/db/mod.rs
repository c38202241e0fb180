//! Postgres-backed stores for the client hub.
//!
//! This module provides data access for:
//! - Profile approval flags
//! - Support tickets and their attachment metadata

pub mod approval;
pub mod ticket;

pub use approval::PgApprovalStore;
pub use ticket::PgTicketStore;

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

/// Opens a connection pool and applies pending migrations.
///
/// # Errors
///
/// Returns an error if the database is unreachable or a migration fails.
pub async fn connect(database_url: &str) -> Result<PgPool, sqlx::Error> {
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await?;

    tracing::info!("Running database migrations...");
    sqlx::migrate!("./migrations").run(&pool).await?;

    Ok(pool)
}
