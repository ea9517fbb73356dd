//! Curator Storage
//!
//! `SQLite` implementation of the Curator repository traits.
//!
//! # Architecture
//!
//! - **Vertical Slicing**: Each table owns its own queries and row mapping
//! - **Tagged Errors**: Driver errors are folded into `StoreError` at the trait boundary
//! - **Embedded Migrations**: The schema ships inside the binary
//!
//! # Example
//!
//! ```rust,no_run
//! use curator_core::{Repositories, UserRepository};
//! use curator_storage::Database;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let db = Arc::new(Database::new("sqlite://curator.db").await?);
//! let repos = Repositories::from_store(db);
//!
//! let users = repos.users.get_all_users().await?;
//! # Ok(())
//! # }
//! ```

mod context;
mod error;

// Vertical slices
pub mod actions;
pub mod export_cursors;
pub mod playlist_refs;
pub mod users;

pub use context::Database;
pub use error::StorageError;

use sqlx::migrate::Migrator;
use sqlx::sqlite::SqlitePool;

// Embed migrations into binary
static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Run database migrations
///
/// This should be called once when the application starts to ensure
/// the database schema is up to date.
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::migrate::MigrateError> {
    MIGRATOR.run(pool).await
}

/// Create a new `SQLite` pool
///
/// # Arguments
///
/// * `database_url` - `SQLite` connection string (e.g., `<sqlite://curator.db>`)
pub async fn create_pool(database_url: &str) -> Result<SqlitePool, sqlx::Error> {
    use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
    use std::str::FromStr;

    tracing::debug!(database_url = %database_url, "Creating SQLite pool");

    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .foreign_keys(true)
        .busy_timeout(std::time::Duration::from_secs(30));

    SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await
}
