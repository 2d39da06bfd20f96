//! OAuth 2.0 with PKCE against the hosted identity provider.
//!
//! # Flow
//!
//! 1. Generate a [`PkcePair`] and keep the verifier in the session
//! 2. Redirect to [`authorize_url`] with the S256 challenge
//! 3. The provider redirects back with `?code=...`
//! 4. Exchange the code plus verifier for an [`AuthSession`]

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thryft_core::UserId;

/// A PKCE code verifier and its S256 challenge.
#[derive(Debug, Clone)]
pub struct PkcePair {
    pub verifier: String,
    pub challenge: String,
}

impl PkcePair {
    /// Generate a fresh verifier from 32 random bytes.
    #[must_use]
    pub fn generate() -> Self {
        let mut bytes = [0u8; 32];
        rand::rng().fill_bytes(&mut bytes);
        Self::from_verifier(URL_SAFE_NO_PAD.encode(bytes))
    }

    /// Derive the challenge for a known verifier.
    #[must_use]
    pub fn from_verifier(verifier: String) -> Self {
        let digest = Sha256::digest(verifier.as_bytes());
        let challenge = URL_SAFE_NO_PAD.encode(digest);
        Self {
            verifier,
            challenge,
        }
    }
}

/// Build the provider authorization URL.
#[must_use]
pub fn authorize_url(backend_url: &str, provider: &str, redirect_to: &str, challenge: &str) -> String {
    format!(
        "{backend_url}/auth/v1/authorize?\
        provider={}&\
        redirect_to={}&\
        code_challenge={}&\
        code_challenge_method=s256",
        urlencoding::encode(provider),
        urlencoding::encode(redirect_to),
        urlencoding::encode(challenge),
    )
}

/// Body of the PKCE token exchange.
#[derive(Debug, Serialize)]
pub(super) struct PkceGrant<'a> {
    pub auth_code: &'a str,
    pub code_verifier: &'a str,
}

/// Session returned by the token endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthSession {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<i64>,
    pub user: AuthUser,
}

/// The authenticated user as the identity provider reports it.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthUser {
    pub id: UserId,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub user_metadata: UserMetadata,
}

/// Provider profile claims copied into `user_metadata`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserMetadata {
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub picture: Option<String>,
}

impl AuthUser {
    /// Display name, falling back to the email's local part.
    #[must_use]
    pub fn display_name(&self) -> String {
        self.user_metadata
            .full_name
            .clone()
            .or_else(|| self.user_metadata.name.clone())
            .or_else(|| {
                self.email
                    .as_deref()
                    .and_then(|e| e.split('@').next())
                    .map(str::to_string)
            })
            .unwrap_or_else(|| "Thryft user".to_string())
    }

    #[must_use]
    pub fn avatar(&self) -> Option<String> {
        self.user_metadata
            .avatar_url
            .clone()
            .or_else(|| self.user_metadata.picture.clone())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_pkce_rfc7636_vector() {
        // Appendix B of RFC 7636
        let pair = PkcePair::from_verifier("dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk".to_string());
        assert_eq!(pair.challenge, "E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM");
    }

    #[test]
    fn test_generated_verifier_length() {
        let pair = PkcePair::generate();
        assert_eq!(pair.verifier.len(), 43);
        assert_ne!(pair.verifier, PkcePair::generate().verifier);
    }

    #[test]
    fn test_authorize_url() {
        let url = authorize_url(
            "https://abc.supabase.co",
            "google",
            "http://localhost:3000/auth/callback",
            "abc",
        );
        assert!(url.starts_with("https://abc.supabase.co/auth/v1/authorize?provider=google&"));
        assert!(url.contains("redirect_to=http%3A%2F%2Flocalhost%3A3000%2Fauth%2Fcallback"));
        assert!(url.contains("code_challenge=abc&code_challenge_method=s256"));
    }

    #[test]
    fn test_display_name_fallbacks() {
        let user: AuthUser = serde_json::from_value(serde_json::json!({
            "id": "0b7e3c1a-1111-4f00-8000-000000000003",
            "email": "riya@example.com",
            "user_metadata": {}
        }))
        .unwrap();
        assert_eq!(user.display_name(), "riya");
        assert_eq!(user.avatar(), None);

        let user: AuthUser = serde_json::from_value(serde_json::json!({
            "id": "0b7e3c1a-1111-4f00-8000-000000000003",
            "user_metadata": { "full_name": "Riya S", "picture": "https://img/p.png" }
        }))
        .unwrap();
        assert_eq!(user.display_name(), "Riya S");
        assert_eq!(user.avatar().as_deref(), Some("https://img/p.png"));
    }
}
