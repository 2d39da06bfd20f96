//! Sign-in through the hosted identity provider.
//!
//! ```text
//! GET  /auth/login     - Sign-in page
//! GET  /auth/google    - Start OAuth with PKCE
//! GET  /auth/callback  - Exchange the code, store the user
//! POST /auth/logout    - Sign out
//! ```

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use thryft_core::Email;
use tower_sessions::Session;
use tracing::instrument;

use super::page::{PageContext, safe_return_path};
use crate::backend::PkcePair;
use crate::backend::rows::ProfileUpsert;
use crate::error::{add_breadcrumb, clear_sentry_user, set_sentry_user};
use crate::filters;
use crate::middleware::{OptionalAuth, set_current_user};
use crate::models::{CurrentUser, session_keys};
use crate::state::AppState;

/// OAuth provider configured on the backend.
const PROVIDER: &str = "google";

#[derive(Debug, Default, Deserialize)]
pub struct LoginQuery {
    pub return_to: Option<String>,
    pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub ctx: PageContext,
    pub return_to: String,
    pub error: Option<&'static str>,
}

/// Readable text for the error codes this module redirects with.
fn error_message(code: &str) -> &'static str {
    match code {
        "denied" => "Sign-in was cancelled.",
        "missing_code" | "missing_verifier" => "Sign-in expired. Please try again.",
        "exchange" => "We couldn't complete sign-in. Please try again.",
        _ => "Something went wrong while signing in.",
    }
}

fn login_error(code: &str) -> Response {
    Redirect::to(&format!("/auth/login?error={code}")).into_response()
}

/// Sign-in page. Signed-in visitors go straight back.
#[instrument(skip_all)]
pub async fn login_page(
    OptionalAuth(user): OptionalAuth,
    ctx: PageContext,
    Query(query): Query<LoginQuery>,
) -> Response {
    let return_to = safe_return_path(query.return_to.as_deref());
    if user.is_some() {
        return Redirect::to(&return_to).into_response();
    }

    LoginTemplate {
        ctx,
        return_to,
        error: query.error.as_deref().map(error_message),
    }
    .into_response()
}

/// Start the provider flow.
#[instrument(skip_all)]
pub async fn start(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<LoginQuery>,
) -> Response {
    let pkce = PkcePair::generate();
    let return_to = safe_return_path(query.return_to.as_deref());

    if let Err(e) = session.insert(session_keys::PKCE_VERIFIER, &pkce.verifier).await {
        tracing::error!(error = %e, "Failed to store PKCE verifier");
        return login_error("session");
    }
    if let Err(e) = session.insert(session_keys::RETURN_TO, &return_to).await {
        tracing::error!(error = %e, "Failed to store return path");
        return login_error("session");
    }

    let redirect_to = format!("{}/auth/callback", state.config().base_url);
    let url = state
        .backend()
        .authorize_url(PROVIDER, &redirect_to, &pkce.challenge);
    Redirect::to(&url).into_response()
}

/// Provider callback.
#[instrument(skip_all)]
pub async fn callback(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<CallbackQuery>,
) -> Response {
    if let Some(error) = query.error {
        tracing::warn!(
            error,
            description = query.error_description.unwrap_or_default(),
            "Provider denied sign-in"
        );
        return login_error("denied");
    }

    let Some(code) = query.code else {
        tracing::warn!("OAuth callback missing code");
        return login_error("missing_code");
    };

    // One-time use
    let verifier = session
        .remove::<String>(session_keys::PKCE_VERIFIER)
        .await
        .ok()
        .flatten();
    let Some(verifier) = verifier else {
        tracing::warn!("OAuth callback without a stored verifier");
        return login_error("missing_verifier");
    };
    let return_to: Option<String> = session
        .remove(session_keys::RETURN_TO)
        .await
        .ok()
        .flatten();

    let auth = match state.backend().exchange_code(&code, &verifier).await {
        Ok(auth) => auth,
        Err(e) => {
            tracing::error!(error = %e, "Code exchange failed");
            return login_error("exchange");
        }
    };

    let user = CurrentUser {
        id: auth.user.id,
        email: auth.user.email.as_deref().and_then(|e| Email::parse(e).ok()),
        name: auth.user.display_name(),
        avatar: auth.user.avatar(),
        access_token: auth.access_token,
    };

    // Rotate the session id on privilege change
    if let Err(e) = session.cycle_id().await {
        tracing::warn!(error = %e, "Failed to rotate session id");
    }
    if let Err(e) = set_current_user(&session, &user).await {
        tracing::error!(error = %e, "Failed to store user in session");
        return login_error("session");
    }

    let profile = ProfileUpsert {
        id: user.id,
        name: user.name.clone(),
        email: user.email.as_ref().map(|e| e.as_str().to_string()),
        avatar: user.avatar.clone(),
    };
    if let Err(e) = state
        .backend()
        .upsert_profile(&user.access_token, &profile)
        .await
    {
        tracing::warn!(error = %e, "Failed to upsert profile");
    }

    set_sentry_user(&user.id, user.email.as_ref().map(Email::as_str));
    add_breadcrumb("auth", "Signed in", None);
    tracing::info!(user_id = %user.id, "User signed in");

    Redirect::to(&safe_return_path(return_to.as_deref())).into_response()
}

/// Sign out and drop everything tied to the session.
#[instrument(skip_all)]
pub async fn logout(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    session: Session,
) -> Redirect {
    if let Some(user) = user {
        if let Err(e) = state.backend().logout(&user.access_token).await {
            tracing::warn!(error = %e, "Backend sign-out failed");
        }
        state.saved().forget(user.id).await;
        tracing::info!(user_id = %user.id, "User signed out");
    }

    if let Err(e) = session.flush().await {
        tracing::error!(error = %e, "Failed to flush session");
    }
    clear_sentry_user();

    Redirect::to("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(error_message("denied"), "Sign-in was cancelled.");
        assert_eq!(
            error_message("missing_verifier"),
            error_message("missing_code")
        );
        assert_eq!(
            error_message("<script>"),
            "Something went wrong while signing in."
        );
    }
}
