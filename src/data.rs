use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// One generated account. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

/// Produces collision-free `testuser<N>` identities for one run.
///
/// Seeded once from the wall clock at millisecond resolution so runs do not
/// collide with each other, then strictly monotonic via an atomic counter so
/// rapid successive calls within a run cannot collide either.
#[derive(Debug)]
pub struct CredentialFactory {
    next: AtomicU64,
}

impl CredentialFactory {
    pub fn new() -> Self {
        let millis = chrono::Utc::now().timestamp_millis().max(0) as u64;
        Self::from_seed(millis)
    }

    pub fn from_seed(seed: u64) -> Self {
        Self {
            next: AtomicU64::new(seed),
        }
    }

    /// Fresh `(username, email)` pair, distinct from every other pair
    /// generated by this factory.
    pub fn generate(&self) -> (String, String) {
        let counter = self.next.fetch_add(1, Ordering::Relaxed);
        let username = format!("testuser{}", counter);
        let email = format!("{}@example.com", username);
        (username, email)
    }

    pub fn credentials(&self, password: &str) -> Credentials {
        self.credentials_with(password, password)
    }

    pub fn credentials_with(&self, password: &str, confirm_password: &str) -> Credentials {
        let (username, email) = self.generate();
        Credentials {
            username,
            email,
            password: password.to_string(),
            confirm_password: confirm_password.to_string(),
        }
    }
}

impl Default for CredentialFactory {
    fn default() -> Self {
        Self::new()
    }
}
