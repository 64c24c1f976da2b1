//! User service
//!
//! The credential gate of the CMS: email/password login, opaque session
//! tokens with a fixed lifetime, logout, and the bootstrap admin account.
//! There are no roles; any valid session may manage every section.

use anyhow::Context;
use std::sync::Arc;
use thiserror::Error;

use crate::config::AuthConfig;
use crate::db::repositories::{SessionRepository, UserRepository};
use crate::models::{Session, User};
use crate::services::password::{hash_password, verify_password};
use crate::services::rate_limiter::LoginRateLimiter;

/// Shortest password the login form accepts
pub const MIN_PASSWORD_LEN: usize = 3;

const INVALID_CREDENTIALS: &str = "Invalid email or password";

#[derive(Debug, Error)]
pub enum UserServiceError {
    #[error("Authentication failed: {0}")]
    AuthenticationError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Too many failed login attempts, try again later")]
    RateLimited,

    #[error("Session expired")]
    SessionExpired,

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

pub struct UserService {
    user_repo: Arc<dyn UserRepository>,
    session_repo: Arc<dyn SessionRepository>,
    session_expiration_days: i64,
    limiter: LoginRateLimiter,
}

impl UserService {
    pub fn new(
        user_repo: Arc<dyn UserRepository>,
        session_repo: Arc<dyn SessionRepository>,
    ) -> Self {
        Self::with_session_expiration(user_repo, session_repo, AuthConfig::default().session_expiration_days)
    }

    pub fn with_session_expiration(
        user_repo: Arc<dyn UserRepository>,
        session_repo: Arc<dyn SessionRepository>,
        days: i64,
    ) -> Self {
        Self {
            user_repo,
            session_repo,
            session_expiration_days: days,
            limiter: LoginRateLimiter::new(),
        }
    }

    pub fn with_rate_limiter(mut self, limiter: LoginRateLimiter) -> Self {
        self.limiter = limiter;
        self
    }

    /// Check credentials and open a session.
    ///
    /// Unknown emails and wrong passwords produce the same error and both
    /// count towards the per-email rate limit.
    pub async fn login(&self, email: &str, password: &str) -> Result<Session, UserServiceError> {
        validate_login_input(email, password)?;

        if self.limiter.is_limited(email).await {
            tracing::warn!("Login rate limited for {}", email);
            return Err(UserServiceError::RateLimited);
        }

        let user = self
            .user_repo
            .get_by_email(email)
            .await
            .context("Failed to look up user")?;

        let verified = match &user {
            Some(user) => {
                verify_password(password, &user.password_hash).context("Failed to verify password")?
            }
            None => false,
        };
        let user = match user {
            Some(user) if verified => user,
            _ => {
                self.limiter.record_failure(email).await;
                tracing::info!("Failed login for {}", email);
                return Err(UserServiceError::AuthenticationError(
                    INVALID_CREDENTIALS.to_string(),
                ));
            }
        };

        self.limiter.clear(email).await;
        let session = Session::start(user.id, self.session_expiration_days);
        self.session_repo
            .create(&session)
            .await
            .context("Failed to create session")?;

        tracing::info!("User {} signed in", user.id);
        Ok(session)
    }

    /// Invalidate a session token
    pub async fn logout(&self, token: &str) -> Result<(), UserServiceError> {
        self.session_repo
            .delete(token)
            .await
            .context("Failed to delete session")?;
        Ok(())
    }

    /// Resolve a token to its user.
    ///
    /// Unknown tokens yield `Ok(None)`; expired ones are deleted and reported
    /// as [`UserServiceError::SessionExpired`].
    pub async fn validate_session(&self, token: &str) -> Result<Option<User>, UserServiceError> {
        let session = match self
            .session_repo
            .get_by_id(token)
            .await
            .context("Failed to get session")?
        {
            Some(session) => session,
            None => return Ok(None),
        };

        if session.is_expired() {
            if let Err(e) = self.session_repo.delete(token).await {
                tracing::warn!("Failed to remove expired session: {:#}", e);
            }
            return Err(UserServiceError::SessionExpired);
        }

        let user = self
            .user_repo
            .get_by_id(session.user_id)
            .await
            .context("Failed to get user")?;
        Ok(user)
    }

    /// Create an account (used for bootstrap and tests)
    pub async fn create_user(
        &self,
        email: &str,
        password: &str,
        display_name: Option<String>,
    ) -> Result<User, UserServiceError> {
        validate_login_input(email, password)?;
        if self
            .user_repo
            .get_by_email(email)
            .await
            .context("Failed to look up user")?
            .is_some()
        {
            return Err(UserServiceError::ValidationError(format!(
                "Email already registered: {}",
                email
            )));
        }

        let hash = hash_password(password)?;
        let user = self
            .user_repo
            .create(&User::new(email.to_string(), hash, display_name))
            .await
            .context("Failed to create user")?;
        Ok(user)
    }

    /// Create the configured admin account when no user exists yet.
    ///
    /// Returns whether an account was created.
    pub async fn ensure_admin(&self, config: &AuthConfig) -> Result<bool, UserServiceError> {
        let (email, password) = match (&config.admin_email, &config.admin_password) {
            (Some(email), Some(password)) => (email, password),
            _ => return Ok(false),
        };

        let count = self.user_repo.count().await.context("Failed to count users")?;
        if count > 0 {
            return Ok(false);
        }

        let user = self.create_user(email, password, None).await?;
        tracing::info!("Created bootstrap account {}", user.email);
        Ok(true)
    }

    pub async fn cleanup_expired_sessions(&self) -> Result<u64, UserServiceError> {
        let removed = self
            .session_repo
            .delete_expired()
            .await
            .context("Failed to delete expired sessions")?;
        self.limiter.cleanup().await;
        if removed > 0 {
            tracing::info!("Removed {} expired session(s)", removed);
        }
        Ok(removed)
    }
}

/// Login form rules: a valid email address and a password of at least
/// three characters.
pub fn validate_login_input(email: &str, password: &str) -> Result<(), UserServiceError> {
    if !is_valid_email(email) {
        return Err(UserServiceError::ValidationError(
            "Invalid email address".to_string(),
        ));
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(UserServiceError::ValidationError(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    Ok(())
}

pub fn is_valid_email(email: &str) -> bool {
    let email = email.trim();
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain.split('.').count() >= 2
        && domain.split('.').all(|label| !label.is_empty())
}
