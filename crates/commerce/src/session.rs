//! Explicit session context passed into every service call.
//!
//! The engine holds no global "current user" state; callers construct a
//! [`Session`] from whatever identity layer they use and pass it down.

use lapidary_core::UserId;

use crate::error::{CommerceError, Result};

/// The identity context for a single service call.
#[derive(Debug, Clone)]
pub struct Session {
    user_id: Option<UserId>,
}

impl Session {
    /// A session carrying an authenticated user.
    pub fn authenticated(user_id: impl Into<UserId>) -> Self {
        Self {
            user_id: Some(user_id.into()),
        }
    }

    /// A session with no authenticated user.
    ///
    /// Every cart, checkout, and order operation rejects this with
    /// [`CommerceError::Unauthenticated`].
    #[must_use]
    pub const fn anonymous() -> Self {
        Self { user_id: None }
    }

    /// The authenticated user, if any.
    #[must_use]
    pub const fn user_id(&self) -> Option<&UserId> {
        self.user_id.as_ref()
    }

    /// The authenticated user, or `Unauthenticated`.
    ///
    /// # Errors
    ///
    /// Returns [`CommerceError::Unauthenticated`] for anonymous sessions.
    pub fn require_user(&self) -> Result<&UserId> {
        self.user_id.as_ref().ok_or(CommerceError::Unauthenticated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anonymous_session_is_rejected() {
        let session = Session::anonymous();
        assert!(matches!(
            session.require_user(),
            Err(CommerceError::Unauthenticated)
        ));
    }

    #[test]
    fn authenticated_session_yields_user() {
        let session = Session::authenticated("CUST-7");
        let user = session.require_user().expect("authenticated");
        assert_eq!(user.as_str(), "CUST-7");
    }
}
