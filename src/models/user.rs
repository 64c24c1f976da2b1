//! User model
//!
//! Staff accounts. There are no roles: any signed-in user may manage every
//! section.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A staff account able to sign in to the CMS.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    /// Email address (unique, stored lowercase)
    pub email: String,
    /// Password hash (argon2)
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub display_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Create a new User.
    ///
    /// The password must already be hashed with
    /// `services::password::hash_password()`.
    pub fn new(email: String, password_hash: String, display_name: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id: 0, // Will be set by the database
            email: email.trim().to_lowercase(),
            password_hash,
            display_name,
            created_at: now,
            updated_at: now,
        }
    }

    /// The password-free view handed to callers of the session context
    pub fn identity(&self) -> Identity {
        Identity {
            id: self.id,
            email: self.email.clone(),
            display_name: self
                .display_name
                .clone()
                .unwrap_or_else(|| self.email.clone()),
        }
    }
}

/// Signed-in identity as exposed by `SessionContext::current_user()`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: i64,
    pub email: String,
    pub display_name: String,
}
