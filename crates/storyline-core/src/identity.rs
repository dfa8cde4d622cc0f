//! Identity store abstraction.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::story::UserId;

/// A registered writer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Stable identifier used for lock ownership and authorship.
    pub id: UserId,
    /// Unique, externally verified handle.
    pub display_name: String,
    /// Identifier from the upstream identity provider. Display only.
    pub external_id: String,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
}

/// Registration details for a new user.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewUser {
    /// Unique handle.
    pub display_name: String,
    /// Identifier from the upstream identity provider.
    pub external_id: String,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
}

/// Maps display names to stable user identifiers.
#[async_trait]
pub trait IdentityStore: Send + Sync {
    /// Resolve a display name to its user id.
    ///
    /// Returns `DomainError::UserNotFound` when nobody has that name.
    async fn resolve(&self, display_name: &str) -> Result<UserId, DomainError>;

    /// Register a new user.
    ///
    /// Returns `DomainError::UserExists` if the display name is taken.
    async fn register(&self, user: NewUser) -> Result<UserId, DomainError>;

    /// Look up a user by id.
    async fn find(&self, id: UserId) -> Result<Option<User>, DomainError>;
}
