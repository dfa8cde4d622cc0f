//! Test identity store — in-memory `IdentityStore` for tests.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use storyline_core::error::DomainError;
use storyline_core::identity::{IdentityStore, NewUser, User};
use storyline_core::story::UserId;

/// An identity store held in process memory, keyed by display name.
#[derive(Debug, Default)]
pub struct InMemoryIdentityStore {
    users: Mutex<HashMap<String, User>>,
}

impl InMemoryIdentityStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a user with placeholder profile fields and return its id.
    ///
    /// # Panics
    ///
    /// Panics if the name is already taken or the mutex is poisoned.
    pub fn add(&self, display_name: &str) -> UserId {
        let id = UserId::new_random();
        let previous = self.users.lock().unwrap().insert(
            display_name.to_owned(),
            User {
                id,
                display_name: display_name.to_owned(),
                external_id: format!("ext-{display_name}"),
                first_name: display_name.to_owned(),
                last_name: String::new(),
            },
        );
        assert!(previous.is_none(), "duplicate test user {display_name}");
        id
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, User>>, DomainError> {
        self.users
            .lock()
            .map_err(|e| DomainError::Infrastructure(format!("user map mutex poisoned: {e}")))
    }
}

#[async_trait]
impl IdentityStore for InMemoryIdentityStore {
    async fn resolve(&self, display_name: &str) -> Result<UserId, DomainError> {
        self.lock()?
            .get(display_name)
            .map(|user| user.id)
            .ok_or_else(|| DomainError::UserNotFound(display_name.to_owned()))
    }

    async fn register(&self, user: NewUser) -> Result<UserId, DomainError> {
        let mut users = self.lock()?;
        if users.contains_key(&user.display_name) {
            return Err(DomainError::UserExists(user.display_name));
        }
        let id = UserId::new_random();
        users.insert(
            user.display_name.clone(),
            User {
                id,
                display_name: user.display_name,
                external_id: user.external_id,
                first_name: user.first_name,
                last_name: user.last_name,
            },
        );
        Ok(id)
    }

    async fn find(&self, id: UserId) -> Result<Option<User>, DomainError> {
        Ok(self.lock()?.values().find(|user| user.id == id).cloned())
    }
}
