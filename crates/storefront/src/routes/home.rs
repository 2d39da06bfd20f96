//! Home page route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::State, response::IntoResponse};
use tracing::instrument;

use super::page::{PageContext, ProductCard, cards, saved_for};
use crate::catalog::{CategoryCount, category_counts};
use crate::filters;
use crate::state::AppState;

/// Number of products in the "Just listed" feed.
const FEATURED_LIMIT: usize = 8;

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "home/index.html")]
pub struct HomeTemplate {
    pub ctx: PageContext,
    pub categories: Vec<CategoryCount>,
    pub featured: Vec<ProductCard>,
}

/// Display the home page.
#[instrument(skip_all)]
pub async fn home(State(state): State<AppState>, ctx: PageContext) -> impl IntoResponse {
    let products = state.catalog().products().await;
    let saved = saved_for(&state, ctx.user.as_ref()).await;

    HomeTemplate {
        categories: category_counts(&products),
        featured: cards(products.iter().take(FEATURED_LIMIT), &saved),
        ctx,
    }
}
