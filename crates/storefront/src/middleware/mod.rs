//! HTTP middleware stack for storefront.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (capture errors, transactions)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID (add unique ID to each request)
//! 4. Session layer (tower-sessions with in-memory store)
//! 5. Security headers (CSP nonce, CSP, frame and referrer policy)
//! 6. Rate limiting (governor), on mutating route groups only

pub mod auth;
pub mod rate_limit;
pub mod request_id;
pub mod security_headers;
pub mod session;

pub use auth::{OptionalAuth, RequireAdmin, RequireAuth, set_current_user};
pub use rate_limit::{relaxed_rate_limiter, strict_rate_limiter};
pub use request_id::request_id_middleware;
pub use security_headers::{CspNonce, security_headers_middleware};
pub use session::create_session_layer;
