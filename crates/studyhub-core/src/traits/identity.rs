//! Identity provider trait for authentication and session management.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::result::AppResult;
use crate::types::id::UserId;

/// The signed-in user as reported by the identity provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthUser {
    /// The user's account id.
    pub id: UserId,
    /// The user's email address.
    pub email: String,
    /// Provider-specific profile metadata.
    #[serde(default)]
    pub metadata: serde_json::Value,
}

/// External identity provider.
#[async_trait]
pub trait IdentityProvider: Send + Sync + std::fmt::Debug + 'static {
    /// The currently signed-in user, if any.
    async fn current_user(&self) -> AppResult<Option<AuthUser>>;

    /// Sign in with email and password.
    async fn sign_in(&self, email: &str, password: &str) -> AppResult<AuthUser>;

    /// Create an account and sign it in.
    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        metadata: serde_json::Value,
    ) -> AppResult<AuthUser>;

    /// End the current session.
    async fn sign_out(&self) -> AppResult<()>;
}
