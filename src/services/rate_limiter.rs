//! Rate limiter for login attempts
//!
//! Failed logins are counted per email address (case-insensitive) inside a
//! sliding window. Five failures within fifteen minutes lock the address
//! until the oldest failure ages out.

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;

pub const MAX_FAILED_ATTEMPTS: usize = 5;
pub const WINDOW_MINUTES: i64 = 15;

pub struct LoginRateLimiter {
    attempts: RwLock<HashMap<String, Vec<DateTime<Utc>>>>,
    max_attempts: usize,
    window: Duration,
}

impl LoginRateLimiter {
    pub fn new() -> Self {
        Self::with_limits(MAX_FAILED_ATTEMPTS, Duration::minutes(WINDOW_MINUTES))
    }

    pub fn with_limits(max_attempts: usize, window: Duration) -> Self {
        Self {
            attempts: RwLock::new(HashMap::new()),
            max_attempts,
            window,
        }
    }

    /// Whether `email` has used up its failed attempts
    pub async fn is_limited(&self, email: &str) -> bool {
        let cutoff = Utc::now() - self.window;
        let attempts = self.attempts.read().await;
        attempts
            .get(&normalize(email))
            .map(|times| times.iter().filter(|t| **t > cutoff).count() >= self.max_attempts)
            .unwrap_or(false)
    }

    pub async fn record_failure(&self, email: &str) {
        let cutoff = Utc::now() - self.window;
        let mut attempts = self.attempts.write().await;
        let times = attempts.entry(normalize(email)).or_default();
        times.retain(|t| *t > cutoff);
        times.push(Utc::now());
    }

    /// Forget failures after a successful login
    pub async fn clear(&self, email: &str) {
        self.attempts.write().await.remove(&normalize(email));
    }

    /// Drop entries whose failures have all aged out
    pub async fn cleanup(&self) {
        let cutoff = Utc::now() - self.window;
        let mut attempts = self.attempts.write().await;
        attempts.retain(|_, times| {
            times.retain(|t| *t > cutoff);
            !times.is_empty()
        });
    }

    #[cfg(test)]
    async fn tracked(&self) -> usize {
        self.attempts.read().await.len()
    }
}

impl Default for LoginRateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

fn normalize(email: &str) -> String {
    email.trim().to_lowercase()
}
