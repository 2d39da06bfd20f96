//! Static content pages and the not-found fallback.

use askama::Template;
use askama_web::WebTemplate;
use axum::{http::StatusCode, response::IntoResponse};
use tracing::instrument;

use super::page::PageContext;
use crate::filters;
use crate::wizard::PLATFORM_FEE_PERCENT;

#[derive(Template, WebTemplate)]
#[template(path = "pages/about.html")]
pub struct AboutTemplate {
    pub ctx: PageContext,
}

#[derive(Template, WebTemplate)]
#[template(path = "pages/privacy.html")]
pub struct PrivacyTemplate {
    pub ctx: PageContext,
}

#[derive(Template, WebTemplate)]
#[template(path = "pages/terms.html")]
pub struct TermsTemplate {
    pub ctx: PageContext,
    pub platform_fee_percent: u32,
}

#[derive(Template, WebTemplate)]
#[template(path = "errors/not_found.html")]
pub struct NotFoundTemplate {
    pub ctx: PageContext,
}

#[instrument(skip_all)]
pub async fn about(ctx: PageContext) -> impl IntoResponse {
    AboutTemplate { ctx }
}

#[instrument(skip_all)]
pub async fn privacy(ctx: PageContext) -> impl IntoResponse {
    PrivacyTemplate { ctx }
}

#[instrument(skip_all)]
pub async fn terms(ctx: PageContext) -> impl IntoResponse {
    TermsTemplate {
        ctx,
        platform_fee_percent: PLATFORM_FEE_PERCENT,
    }
}

/// Fallback for unknown paths.
pub async fn not_found(ctx: PageContext) -> impl IntoResponse {
    (StatusCode::NOT_FOUND, NotFoundTemplate { ctx })
}
