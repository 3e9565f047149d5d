//! Local user session
//!
//! There is no authentication. Logging in stores a single user record and
//! logging out removes it; expenses are never scoped to a user.

use std::sync::Arc;

use tracing::info;

use crate::error::{Error, Result};
use crate::models::User;
use crate::storage::Storage;

/// Fixed id of the local user
pub const LOCAL_USER_ID: &str = "user-1";

pub struct Session {
    storage: Arc<dyn Storage>,
}

impl Session {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    pub fn login(&self, email: &str, name: &str) -> Result<User> {
        let email = email.trim();
        if email.is_empty() {
            return Err(Error::Validation("Email cannot be empty".into()));
        }
        let name = match name.trim() {
            "" => email.split('@').next().unwrap_or(email).to_string(),
            n => n.to_string(),
        };

        let user = User {
            id: LOCAL_USER_ID.to_string(),
            email: email.to_string(),
            name,
        };
        self.storage.set_user(Some(&user))?;
        info!(email = %user.email, "Logged in");
        Ok(user)
    }

    pub fn logout(&self) -> Result<()> {
        self.storage.set_user(None)?;
        info!("Logged out");
        Ok(())
    }

    pub fn current_user(&self) -> Result<Option<User>> {
        self.storage.get_user()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;

    #[test]
    fn test_login_logout() {
        let session = Session::new(Arc::new(Database::in_memory().unwrap()));
        assert!(session.current_user().unwrap().is_none());

        let user = session.login("sam@example.com", "Sam").unwrap();
        assert_eq!(user.id, LOCAL_USER_ID);
        assert_eq!(session.current_user().unwrap(), Some(user));

        session.logout().unwrap();
        assert!(session.current_user().unwrap().is_none());
    }

    #[test]
    fn test_name_defaults_to_email_local_part() {
        let session = Session::new(Arc::new(Database::in_memory().unwrap()));
        let user = session.login("alex@example.com", " ").unwrap();
        assert_eq!(user.name, "alex");
    }

    #[test]
    fn test_blank_email_rejected() {
        let session = Session::new(Arc::new(Database::in_memory().unwrap()));
        assert!(matches!(session.login("", "x"), Err(Error::Validation(_))));
    }
}
