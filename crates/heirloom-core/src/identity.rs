//! Identity provider contract.
//!
//! Authentication itself is delegated to the hosting platform's identity
//! service. The questionnaire only needs to ask "who is the current user,
//! if anyone" — a `None` answer short-circuits initialization and hands
//! control back to the external auth flow.

use std::future::Future;

use uuid::Uuid;

/// Resolves the currently authenticated user.
pub trait IdentityProvider: Send + Sync {
    /// Returns the current user's id, or `None` when unauthenticated.
    fn current_user(&self) -> impl Future<Output = Option<Uuid>> + Send;
}

/// Identity provider with a fixed answer, for tests and local runs.
#[derive(Debug, Clone, Default)]
pub struct StaticIdentityProvider {
    user: Option<Uuid>,
}

impl StaticIdentityProvider {
    /// Provider that reports the given user as signed in.
    pub fn signed_in(user: Uuid) -> Self {
        Self { user: Some(user) }
    }

    /// Provider that reports no authenticated user.
    pub fn signed_out() -> Self {
        Self { user: None }
    }
}

impl IdentityProvider for StaticIdentityProvider {
    async fn current_user(&self) -> Option<Uuid> {
        self.user
    }
}
