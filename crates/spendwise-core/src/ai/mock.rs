//! Mock backend for testing
//!
//! Useful for unit tests and development without network access.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::{Error, Result};

use super::CategoryOracle;

/// Mock oracle backend
///
/// By default it guesses a category from well-known merchant names. It can
/// be configured to always give one reply or to always fail, and it counts
/// how often it was asked.
#[derive(Clone, Default)]
pub struct MockBackend {
    /// Whether health_check should return true
    pub healthy: bool,
    reply: Option<String>,
    fail: bool,
    calls: Arc<AtomicUsize>,
}

impl MockBackend {
    /// Create a new mock backend (healthy by default)
    pub fn new() -> Self {
        Self {
            healthy: true,
            ..Default::default()
        }
    }

    /// Create an unhealthy mock backend
    pub fn unhealthy() -> Self {
        Self::default()
    }

    /// Always answer with `reply`, whatever the merchant
    pub fn with_reply(reply: &str) -> Self {
        Self {
            reply: Some(reply.to_string()),
            ..Self::new()
        }
    }

    /// Fail every request
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new()
        }
    }

    /// Number of `suggest_category` calls so far (shared between clones)
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

/// Guess a category id from well-known merchant names
pub(crate) fn guess_category(merchant: &str) -> &'static str {
    match merchant.to_uppercase().as_str() {
        m if m.contains("NETFLIX") || m.contains("SPOTIFY") || m.contains("HULU") => "cat-subs",
        m if m.contains("AMAZON") || m.contains("TARGET") || m.contains("COSTCO") => "cat-shop",
        m if m.contains("STARBUCKS") || m.contains("CAFE") || m.contains("PIZZA") => "cat-food",
        m if m.contains("UBER") || m.contains("LYFT") || m.contains("SHELL") => "cat-trans",
        m if m.contains("PHARMACY") || m.contains("CVS") || m.contains("GYM") => "cat-health",
        m if m.contains("AIRBNB") || m.contains("AIRLINES") || m.contains("HOTEL") => "cat-travel",
        m if m.contains("CINEMA") || m.contains("STEAM") => "cat-ent",
        _ => "cat-other",
    }
}

#[async_trait]
impl CategoryOracle for MockBackend {
    async fn suggest_category(&self, merchant: &str, _allowed: &[&str]) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if self.fail {
            return Err(Error::Oracle("Mock oracle failure".into()));
        }

        Ok(match self.reply {
            Some(ref reply) => reply.clone(),
            None => guess_category(merchant).to_string(),
        })
    }

    async fn health_check(&self) -> bool {
        self.healthy
    }

    fn model(&self) -> &str {
        "mock"
    }

    fn host(&self) -> &str {
        "mock://localhost"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_guesses_known_merchants() {
        let mock = MockBackend::new();
        assert_eq!(mock.suggest_category("Uber *Trip", &[]).await.unwrap(), "cat-trans");
        assert_eq!(mock.suggest_category("Blue Cafe", &[]).await.unwrap(), "cat-food");
        assert_eq!(mock.suggest_category("Zzz", &[]).await.unwrap(), "cat-other");
    }

    #[tokio::test]
    async fn test_call_count_is_shared_between_clones() {
        let mock = MockBackend::with_reply("cat-edu");
        let clone = mock.clone();
        clone.suggest_category("a", &[]).await.unwrap();
        clone.suggest_category("b", &[]).await.unwrap();
        assert_eq!(mock.call_count(), 2);
    }

    #[tokio::test]
    async fn test_failing_and_unhealthy() {
        assert!(MockBackend::failing().suggest_category("a", &[]).await.is_err());
        assert!(!MockBackend::unhealthy().health_check().await);
    }
}
