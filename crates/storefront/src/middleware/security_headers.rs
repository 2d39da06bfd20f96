//! Security headers and per-request CSP nonce.
//!
//! Every response gets a locked-down header set. The CSP is built per request:
//! inline scripts must carry the request's nonce, images may come from the
//! backend's object storage, and the payment widget's script and frame
//! origins are allowed.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{
        HeaderName, HeaderValue,
        header::{
            CACHE_CONTROL, CONTENT_SECURITY_POLICY, REFERRER_POLICY, X_CONTENT_TYPE_OPTIONS,
            X_FRAME_OPTIONS,
        },
        request::Parts,
    },
    middleware::Next,
    response::Response,
};
use base64::{Engine, engine::general_purpose::STANDARD};
use rand::RngCore;

use crate::state::AppState;

/// Script origin of the payment widget.
const PAYMENT_SCRIPT_ORIGIN: &str = "https://checkout.razorpay.com";
/// Frame and XHR origin of the payment widget.
const PAYMENT_API_ORIGIN: &str = "https://api.razorpay.com";

/// A CSP nonce for inline scripts (128-bit, base64).
#[derive(Clone, Debug)]
pub struct CspNonce(pub String);

impl CspNonce {
    #[must_use]
    pub fn generate() -> Self {
        let mut bytes = [0u8; 16];
        rand::rng().fill_bytes(&mut bytes);
        Self(STANDARD.encode(bytes))
    }

    #[must_use]
    pub fn value(&self) -> &str {
        &self.0
    }
}

impl<S> FromRequestParts<S> for CspNonce
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts.extensions.get::<Self>().cloned().unwrap_or_else(|| {
            tracing::warn!("CSP nonce missing from request extensions");
            Self(String::new())
        }))
    }
}

/// Build the Content-Security-Policy value.
#[must_use]
pub fn content_security_policy(storage_origin: &str, nonce: &str) -> String {
    format!(
        "default-src 'none'; \
         script-src 'self' 'nonce-{nonce}' {PAYMENT_SCRIPT_ORIGIN}; \
         style-src 'self'; \
         font-src 'self'; \
         img-src 'self' data: blob: {storage_origin}; \
         connect-src 'self' {PAYMENT_API_ORIGIN}; \
         frame-src {PAYMENT_API_ORIGIN} {PAYMENT_SCRIPT_ORIGIN}; \
         object-src 'none'; \
         base-uri 'self'; \
         form-action 'self'; \
         frame-ancestors 'none'"
    )
}

/// Add a per-request nonce and the security headers.
///
/// Headers applied:
/// - `X-Frame-Options: DENY`
/// - `X-Content-Type-Options: nosniff`
/// - `Referrer-Policy: strict-origin-when-cross-origin`
/// - `Content-Security-Policy` from [`content_security_policy`]
/// - `Permissions-Policy` allowing only geolocation (profile) and payment
/// - `Cache-Control: no-store` unless the handler set one
/// - `Cross-Origin-Opener-Policy: same-origin-allow-popups` (payment popups)
pub async fn security_headers_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let nonce = CspNonce::generate();
    request.extensions_mut().insert(nonce.clone());

    let mut response = next.run(request).await;
    let headers = response.headers_mut();

    headers.insert(X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));
    headers.insert(X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"));
    headers.insert(
        REFERRER_POLICY,
        HeaderValue::from_static("strict-origin-when-cross-origin"),
    );

    let csp = content_security_policy(state.backend().base_url(), nonce.value());
    match HeaderValue::from_str(&csp) {
        Ok(value) => {
            headers.insert(CONTENT_SECURITY_POLICY, value);
        }
        Err(e) => tracing::error!(error = %e, "Invalid CSP header value"),
    }

    headers.insert(
        HeaderName::from_static("permissions-policy"),
        HeaderValue::from_static(
            "camera=(), \
             microphone=(), \
             usb=(), \
             interest-cohort=(), \
             geolocation=(self), \
             payment=(self \"https://api.razorpay.com\")",
        ),
    );

    if !headers.contains_key(CACHE_CONTROL) {
        headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-store, max-age=0"));
    }

    headers.insert(
        HeaderName::from_static("cross-origin-opener-policy"),
        HeaderValue::from_static("same-origin-allow-popups"),
    );

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_csp_includes_storage_and_nonce() {
        let csp = content_security_policy("https://abc.supabase.co", "bm9uY2U=");
        assert!(csp.contains("img-src 'self' data: blob: https://abc.supabase.co;"));
        assert!(csp.contains("'nonce-bm9uY2U='"));
        assert!(csp.contains("script-src 'self' 'nonce-bm9uY2U=' https://checkout.razorpay.com"));
        assert!(csp.contains("frame-ancestors 'none'"));
    }

    #[test]
    fn test_nonce_is_random() {
        let a = CspNonce::generate();
        let b = CspNonce::generate();
        assert_ne!(a.value(), b.value());
        assert_eq!(a.value().len(), 24);
    }
}
