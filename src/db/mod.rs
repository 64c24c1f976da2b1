//! Database layer
//!
//! One pool (SQLite by default, MySQL when configured) backs the document
//! store, user accounts and login sessions.
//!
//! ```ignore
//! use cosmo_cms::config::DatabaseConfig;
//! use cosmo_cms::db::{create_pool, migrations};
//!
//! let pool = create_pool(&DatabaseConfig::default()).await?;
//! migrations::run_migrations(&pool).await?;
//! ```

pub mod migrations;
pub mod pool;
pub mod repositories;

pub use pool::{
    create_pool, create_test_pool, DatabasePool, DynDatabasePool, MysqlDatabase, SqliteDatabase,
};
