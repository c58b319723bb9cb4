//! Session context carrying the signed-in user, and a static identity provider.

use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use studyhub_core::error::AppError;
use studyhub_core::result::AppResult;
use studyhub_core::traits::identity::{AuthUser, IdentityProvider};
use studyhub_core::types::UserId;

/// Context for the current browsing session.
///
/// Resolved once from the identity provider and passed into every service
/// so that each operation knows *who* is acting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionContext {
    /// The signed-in user's ID.
    pub user_id: UserId,
    /// The signed-in user's email.
    pub email: String,
    /// When the session was resolved.
    pub started_at: DateTime<Utc>,
}

impl SessionContext {
    /// Creates a session context for a known user.
    pub fn new(user_id: UserId, email: impl Into<String>) -> Self {
        Self {
            user_id,
            email: email.into(),
            started_at: Utc::now(),
        }
    }

    /// Resolves the session from the identity provider.
    ///
    /// Fails with an authentication error when nobody is signed in.
    pub async fn resolve(identity: &dyn IdentityProvider) -> AppResult<Self> {
        let user = identity
            .current_user()
            .await?
            .ok_or_else(|| AppError::authentication("Not signed in"))?;
        Ok(Self::new(user.id, user.email))
    }
}

/// An identity provider with a single local account.
///
/// Backs the local CLI, where there is no hosted auth service.
#[derive(Debug)]
pub struct StaticIdentity {
    account: AuthUser,
    password: Option<String>,
    signed_in: Mutex<bool>,
}

impl StaticIdentity {
    /// Creates a provider whose account is already signed in.
    pub fn signed_in(account: AuthUser) -> Self {
        Self {
            account,
            password: None,
            signed_in: Mutex::new(true),
        }
    }

    /// Creates a provider requiring `password` to sign in.
    pub fn with_password(account: AuthUser, password: impl Into<String>) -> Self {
        Self {
            account,
            password: Some(password.into()),
            signed_in: Mutex::new(false),
        }
    }

    fn set_signed_in(&self, value: bool) {
        *self.signed_in.lock().unwrap_or_else(PoisonError::into_inner) = value;
    }
}

#[async_trait]
impl IdentityProvider for StaticIdentity {
    async fn current_user(&self) -> AppResult<Option<AuthUser>> {
        let signed_in = *self.signed_in.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(signed_in.then(|| self.account.clone()))
    }

    async fn sign_in(&self, email: &str, password: &str) -> AppResult<AuthUser> {
        let password_ok = self.password.as_deref().is_none_or(|p| p == password);
        if !email.eq_ignore_ascii_case(&self.account.email) || !password_ok {
            return Err(AppError::authentication("Invalid email or password"));
        }
        self.set_signed_in(true);
        Ok(self.account.clone())
    }

    async fn sign_up(
        &self,
        email: &str,
        _password: &str,
        _metadata: serde_json::Value,
    ) -> AppResult<AuthUser> {
        Err(AppError::conflict(format!(
            "Cannot register {email}: this installation has a single local account"
        )))
    }

    async fn sign_out(&self) -> AppResult<()> {
        self.set_signed_in(false);
        Ok(())
    }
}
