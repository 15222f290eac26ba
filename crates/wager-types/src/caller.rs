//! Request-scoped caller identity, supplied by the external auth collaborator.

use serde::{Deserialize, Serialize};

use crate::{Result, UserId, WagerError};

/// Who is invoking an engine operation. The engine never authenticates;
/// it trusts what the auth layer resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Caller(Option<UserId>);

impl Caller {
    #[must_use]
    pub fn user(id: UserId) -> Self {
        Self(Some(id))
    }

    #[must_use]
    pub fn anonymous() -> Self {
        Self(None)
    }

    /// The authenticated user id.
    ///
    /// # Errors
    /// Returns [`WagerError::NotAuthenticated`] for an anonymous caller.
    pub fn require(&self) -> Result<UserId> {
        self.0.ok_or(WagerError::NotAuthenticated)
    }
}

impl From<UserId> for Caller {
    fn from(id: UserId) -> Self {
        Self::user(id)
    }
}

impl From<Option<UserId>> for Caller {
    fn from(id: Option<UserId>) -> Self {
        Self(id)
    }
}
