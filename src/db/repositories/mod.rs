//! Database repositories
//!
//! Each repository wraps the shared pool and dispatches to a SQLite or MySQL
//! implementation.

pub mod document;
pub mod session;
pub mod user;

pub use document::{DocumentRepository, SqlxDocumentRepository};
pub use session::{SessionRepository, SqlxSessionRepository};
pub use user::{SqlxUserRepository, UserRepository};
