//! Category index.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::State,
    response::{IntoResponse, Redirect},
};
use thryft_core::Category;
use tracing::instrument;

use super::page::PageContext;
use crate::catalog::category_counts;
use crate::filters;
use crate::state::AppState;

/// One category tile.
#[derive(Debug, Clone)]
pub struct CategoryTile {
    pub name: &'static str,
    pub slug: &'static str,
    pub size_label: &'static str,
    pub count: usize,
}

#[derive(Template, WebTemplate)]
#[template(path = "categories/index.html")]
pub struct CategoriesTemplate {
    pub ctx: PageContext,
    pub total: usize,
    pub tiles: Vec<CategoryTile>,
}

#[instrument(skip_all)]
pub async fn index(State(state): State<AppState>, ctx: PageContext) -> impl IntoResponse {
    let products = state.catalog().products().await;
    let counts = category_counts(&products);

    let tiles = Category::ALL
        .into_iter()
        .map(|category| CategoryTile {
            name: category.name(),
            slug: category.slug(),
            size_label: category.schema().size_label,
            count: counts
                .iter()
                .find(|c| c.name == category.name())
                .map_or(0, |c| c.count),
        })
        .collect();

    CategoriesTemplate {
        ctx,
        total: products.len(),
        tiles,
    }
}

/// Old collections URL.
pub async fn collections_redirect() -> Redirect {
    Redirect::permanent("/categories")
}
