//! Session-related types.
//!
//! Types stored in the session for authentication state.

use serde::{Deserialize, Serialize};

use thryft_core::{Email, UserId};

/// Session-stored user identity.
///
/// Holds the backend access token so data calls run under the user's
/// row-level permissions.
#[derive(Clone, Serialize, Deserialize)]
pub struct CurrentUser {
    /// Auth user ID, also the seller and profile row ID.
    pub id: UserId,
    /// User's email address, when the provider shares one.
    pub email: Option<Email>,
    /// Display name.
    pub name: String,
    /// Avatar URL.
    pub avatar: Option<String>,
    /// Backend access token.
    pub access_token: String,
}

impl CurrentUser {
    /// First letter of the name, for the header avatar fallback.
    #[must_use]
    pub fn initial(&self) -> String {
        self.name
            .chars()
            .next()
            .map(|c| c.to_uppercase().to_string())
            .unwrap_or_default()
    }
}

impl std::fmt::Debug for CurrentUser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CurrentUser")
            .field("id", &self.id)
            .field("email", &self.email)
            .field("name", &self.name)
            .field("access_token", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

/// Session keys.
pub mod keys {
    /// Key for storing the current logged-in user.
    pub const CURRENT_USER: &str = "current_user";

    /// Key for the PKCE code verifier between login and callback.
    pub const PKCE_VERIFIER: &str = "pkce_verifier";

    /// Key for the page to return to after sign-in.
    pub const RETURN_TO: &str = "return_to";

    /// Key for the cart.
    pub const CART: &str = "cart";

    /// Key for the listing wizard.
    pub const LISTING_WIZARD: &str = "listing_wizard";

    /// Key for the visitor's location.
    pub const LOCATION: &str = "location";

    /// Key for a one-shot flash message.
    pub const FLASH: &str = "flash";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_redacts_token() {
        let user = CurrentUser {
            id: UserId::random(),
            email: None,
            name: "meera".to_string(),
            avatar: None,
            access_token: "eyJsecret".to_string(),
        };
        let debug = format!("{user:?}");
        assert!(!debug.contains("eyJsecret"));
        assert_eq!(user.initial(), "M");
    }
}
