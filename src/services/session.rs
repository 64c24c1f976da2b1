//! Session context
//!
//! The explicit authentication state handed to request handlers: who is
//! signed in, and a way to sign out. It is created by a successful login or
//! by resolving a presented token, and torn down by `sign_out`.

use std::sync::Arc;

use super::user::{UserService, UserServiceError};
use crate::models::Identity;

#[derive(Clone)]
pub struct SessionContext {
    users: Arc<UserService>,
    token: Option<String>,
    identity: Option<Identity>,
}

impl SessionContext {
    /// A context nobody is signed in to
    pub fn anonymous(users: Arc<UserService>) -> Self {
        Self {
            users,
            token: None,
            identity: None,
        }
    }

    /// Log in and return the signed-in context
    pub async fn sign_in(
        users: Arc<UserService>,
        email: &str,
        password: &str,
    ) -> Result<Self, UserServiceError> {
        let session = users.login(email, password).await?;
        Self::resume(users, &session.id)
            .await?
            .ok_or_else(|| UserServiceError::AuthenticationError("Session vanished".to_string()))
    }

    /// Rebuild the context from a presented token.
    ///
    /// `Ok(None)` for unknown tokens or tokens of deleted users.
    pub async fn resume(
        users: Arc<UserService>,
        token: &str,
    ) -> Result<Option<Self>, UserServiceError> {
        let user = match users.validate_session(token).await? {
            Some(user) => user,
            None => return Ok(None),
        };
        Ok(Some(Self {
            users,
            token: Some(token.to_string()),
            identity: Some(user.identity()),
        }))
    }

    pub fn current_user(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn is_signed_in(&self) -> bool {
        self.identity.is_some()
    }

    /// End the session. Signing out twice is a no-op.
    pub async fn sign_out(&mut self) -> Result<(), UserServiceError> {
        if let Some(token) = self.token.take() {
            self.users.logout(&token).await?;
        }
        self.identity = None;
        Ok(())
    }
}

impl std::fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionContext")
            .field("identity", &self.identity)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{SqlxSessionRepository, SqlxUserRepository};
    use crate::db::{create_test_pool, migrations};

    async fn users() -> Arc<UserService> {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        let service = UserService::new(
            SqlxUserRepository::boxed(pool.clone()),
            SqlxSessionRepository::boxed(pool),
        );
        service
            .create_user("staff@cosmo.example", "crayons", Some("Ms. Cosmo".to_string()))
            .await
            .unwrap();
        Arc::new(service)
    }

    #[tokio::test]
    async fn test_sign_in_then_out() {
        let users = users().await;
        let mut ctx = SessionContext::sign_in(users.clone(), "staff@cosmo.example", "crayons")
            .await
            .unwrap();

        assert_eq!(ctx.current_user().unwrap().display_name, "Ms. Cosmo");
        let token = ctx.token().unwrap().to_string();

        ctx.sign_out().await.unwrap();
        assert!(ctx.current_user().is_none());
        assert!(SessionContext::resume(users.clone(), &token)
            .await
            .unwrap()
            .is_none());

        ctx.sign_out().await.unwrap();
    }

    #[tokio::test]
    async fn test_resume_unknown_token() {
        let users = users().await;
        assert!(SessionContext::resume(users.clone(), "nope").await.unwrap().is_none());
        assert!(!SessionContext::anonymous(users).is_signed_in());
    }

    #[tokio::test]
    async fn test_failed_sign_in() {
        let users = users().await;
        assert!(matches!(
            SessionContext::sign_in(users, "staff@cosmo.example", "wrong").await,
            Err(UserServiceError::AuthenticationError(_))
        ));
    }
}
