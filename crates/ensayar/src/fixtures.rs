//! Suite-scoped fixtures threaded between test cases.
//!
//! Fixtures are the one piece of mutable state shared across a suite: an
//! identity registered by one case, a resource title created by another.
//! Access is by name; a read of a name nothing produced is a loud,
//! setup-categorized failure — literal values are never silently coerced
//! into one another. Execution is strictly sequential, so the shared
//! handle only guards against torn access, not against races.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::result::{EnsayarError, EnsayarResult};

/// Registered user identity, produced once per suite run.
///
/// The email is randomized per run to avoid collisions on the server;
/// after registration the identity is read-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    /// Login email
    pub email: String,
    /// Password
    pub password: String,
    /// Password confirmation, equal to the password
    pub confirm_password: String,
}

impl UserIdentity {
    /// Create an identity; confirmation mirrors the password
    #[must_use]
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        let password = password.into();
        Self {
            email: email.into(),
            confirm_password: password.clone(),
            password,
        }
    }
}

/// Named, suite-scoped fixture store.
///
/// Cloning hands out another handle to the same store.
#[derive(Debug, Clone, Default)]
pub struct FixtureStore {
    values: Arc<Mutex<HashMap<String, serde_json::Value>>>,
}

impl FixtureStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Produce a fixture. Re-producing a name overwrites it — that is how
    /// an edit case renames the resource title later cases consume.
    pub fn put<T: Serialize>(&self, name: impl Into<String>, value: &T) -> EnsayarResult<()> {
        let name = name.into();
        let json = serde_json::to_value(value)?;
        tracing::debug!(fixture = %name, "fixture produced");
        self.values.lock().unwrap().insert(name, json);
        Ok(())
    }

    /// Consume a fixture; absence is a setup failure
    pub fn get<T: DeserializeOwned>(&self, name: &str) -> EnsayarResult<T> {
        let values = self.values.lock().unwrap();
        let json = values
            .get(name)
            .ok_or_else(|| EnsayarError::MissingFixture {
                name: name.to_string(),
            })?;
        Ok(serde_json::from_value(json.clone())?)
    }

    /// Consume a fixture if it exists
    #[must_use]
    pub fn try_get<T: DeserializeOwned>(&self, name: &str) -> Option<T> {
        let values = self.values.lock().unwrap();
        values
            .get(name)
            .and_then(|json| serde_json::from_value(json.clone()).ok())
    }

    /// Whether a fixture exists
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.values.lock().unwrap().contains_key(name)
    }

    /// Names of all produced fixtures, sorted
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.values.lock().unwrap().keys().cloned().collect();
        names.sort();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::result::ErrorCategory;

    #[test]
    fn test_put_get_roundtrip() {
        let store = FixtureStore::new();
        let user = UserIdentity::new("abv1234@abv.bg", "123456");
        store.put("user", &user).unwrap();
        let read: UserIdentity = store.get("user").unwrap();
        assert_eq!(read, user);
        assert_eq!(read.confirm_password, "123456");
    }

    #[test]
    fn test_missing_fixture_is_setup_failure() {
        let store = FixtureStore::new();
        let err = store.get::<String>("game_title").unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Setup);
        assert!(err.to_string().contains("game_title"));
    }

    #[test]
    fn test_reproduce_overwrites() {
        let store = FixtureStore::new();
        store.put("game_title", &"Random title").unwrap();
        store.put("game_title", &"Edited random title").unwrap();
        let title: String = store.get("game_title").unwrap();
        assert_eq!(title, "Edited random title");
    }

    #[test]
    fn test_clones_share_state() {
        let store = FixtureStore::new();
        let handle = store.clone();
        handle.put("user", &"someone").unwrap();
        assert!(store.contains("user"));
        assert_eq!(store.names(), vec!["user".to_string()]);
    }
}
