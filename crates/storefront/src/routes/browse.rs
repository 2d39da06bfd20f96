//! Browse and search route handler.
//!
//! Facets are plain links: each option links to the current query with that
//! value toggled, so list values stay comma-separated in a single parameter.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Query, State},
    response::IntoResponse,
};
use thryft_core::{Category, Condition};
use tracing::instrument;

use super::page::{PageContext, ProductCard, cards, saved_for};
use crate::catalog::{BrowseFilter, BrowseQuery, ERAS, PRICE_RANGES, category_counts};
use crate::filters;
use crate::state::AppState;

/// A facet link.
#[derive(Debug, Clone)]
pub struct FacetLink {
    pub label: String,
    pub href: String,
    pub active: bool,
}

/// A category tab with its product count.
#[derive(Debug, Clone)]
pub struct CategoryTab {
    pub name: String,
    pub count: usize,
    pub href: String,
    pub active: bool,
}

/// Browse page template.
#[derive(Template, WebTemplate)]
#[template(path = "browse/index.html")]
pub struct BrowseTemplate {
    pub ctx: PageContext,
    pub tabs: Vec<CategoryTab>,
    pub active_category: String,
    pub query: String,
    pub size_label: String,
    pub sizes: Vec<FacetLink>,
    pub conditions: Vec<FacetLink>,
    pub eras: Vec<FacetLink>,
    pub price_ranges: Vec<FacetLink>,
    pub clear_href: String,
    pub has_facets: bool,
    pub products: Vec<ProductCard>,
}

/// The current browse state as query parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct BrowseParams {
    category: Option<String>,
    q: Option<String>,
    sizes: Vec<String>,
    conditions: Vec<String>,
    eras: Vec<String>,
    min: Option<String>,
    max: Option<String>,
}

impl From<&BrowseFilter> for BrowseParams {
    fn from(filter: &BrowseFilter) -> Self {
        Self {
            category: filter.category.clone(),
            q: filter.query.clone(),
            sizes: filter.sizes.clone(),
            conditions: filter
                .conditions
                .iter()
                .map(|c| c.as_str().to_string())
                .collect(),
            eras: filter.eras.clone(),
            min: filter.min_price.map(|m| m.to_string()),
            max: filter.max_price.map(|m| m.to_string()),
        }
    }
}

fn toggle(list: &mut Vec<String>, value: &str) {
    if let Some(pos) = list.iter().position(|v| v.eq_ignore_ascii_case(value)) {
        list.remove(pos);
    } else {
        list.push(value.to_string());
    }
}

impl BrowseParams {
    fn href(&self) -> String {
        let mut pairs: Vec<(&str, String)> = Vec::new();
        if let Some(category) = &self.category {
            pairs.push(("category", category.clone()));
        }
        if let Some(q) = &self.q {
            pairs.push(("q", q.clone()));
        }
        for (key, list) in [
            ("sizes", &self.sizes),
            ("conditions", &self.conditions),
            ("eras", &self.eras),
        ] {
            if !list.is_empty() {
                pairs.push((key, list.join(",")));
            }
        }
        if let Some(min) = &self.min {
            pairs.push(("min", min.clone()));
        }
        if let Some(max) = &self.max {
            pairs.push(("max", max.clone()));
        }

        if pairs.is_empty() {
            return "/browse".to_string();
        }
        let query: Vec<String> = pairs
            .into_iter()
            .map(|(k, v)| format!("{k}={}", urlencoding::encode(&v)))
            .collect();
        format!("/browse?{}", query.join("&"))
    }

    fn toggled(&self, pick: fn(&mut Self) -> &mut Vec<String>, value: &str) -> String {
        let mut next = self.clone();
        toggle(pick(&mut next), value);
        next.href()
    }
}

fn list_facet<'a, I>(
    params: &BrowseParams,
    selected: &[String],
    pick: fn(&mut BrowseParams) -> &mut Vec<String>,
    options: I,
) -> Vec<FacetLink>
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    options
        .into_iter()
        .map(|(value, label)| FacetLink {
            label: label.to_string(),
            href: params.toggled(pick, value),
            active: selected.iter().any(|s| s.eq_ignore_ascii_case(value)),
        })
        .collect()
}

/// Size options for the active category, or the union across categories.
fn size_facet(category: Option<Category>) -> (&'static str, Vec<&'static str>) {
    match category {
        Some(category) => {
            let schema = category.schema();
            (schema.size_label, schema.size_options.to_vec())
        }
        None => {
            let mut sizes: Vec<&'static str> = Vec::new();
            for category in Category::ALL {
                for size in category.schema().size_options {
                    if !sizes.contains(size) {
                        sizes.push(size);
                    }
                }
            }
            ("Size", sizes)
        }
    }
}

fn price_facet(params: &BrowseParams) -> Vec<FacetLink> {
    PRICE_RANGES
        .iter()
        .map(|range| {
            let min = Some(range.min.to_string());
            let max = range.max.map(|m| m.to_string());
            let active = params.min == min && params.max == max;
            let mut next = params.clone();
            if active {
                next.min = None;
                next.max = None;
            } else {
                next.min = min;
                next.max = max;
            }
            FacetLink {
                label: range.label.to_string(),
                href: next.href(),
                active,
            }
        })
        .collect()
}

/// Display the browse page.
#[instrument(skip_all)]
pub async fn index(
    State(state): State<AppState>,
    ctx: PageContext,
    Query(query): Query<BrowseQuery>,
) -> impl IntoResponse {
    let filter = BrowseFilter::from(query);
    let params = BrowseParams::from(&filter);
    let products = state.catalog().products().await;
    let saved = saved_for(&state, ctx.user.as_ref()).await;

    let active_category = filter.category.clone().unwrap_or_else(|| "All".to_string());
    let tabs = category_counts(&products)
        .into_iter()
        .map(|count| {
            let category = (count.name != "All").then(|| count.slug.clone());
            let href = BrowseParams {
                category,
                q: params.q.clone(),
                ..Default::default()
            }
            .href();
            CategoryTab {
                active: count.name == active_category,
                name: count.name,
                count: count.count,
                href,
            }
        })
        .collect();

    let known = filter
        .category
        .as_deref()
        .and_then(|c| c.parse::<Category>().ok());
    let (size_label, size_values) = size_facet(known);
    let condition_options: Vec<(&str, &str)> = Condition::ALL
        .iter()
        .map(|c| (c.as_str(), c.label()))
        .collect();

    BrowseTemplate {
        tabs,
        query: params.q.clone().unwrap_or_default(),
        size_label: size_label.to_string(),
        sizes: list_facet(
            &params,
            &params.sizes,
            |p| &mut p.sizes,
            size_values.into_iter().map(|s| (s, s)),
        ),
        conditions: list_facet(
            &params,
            &params.conditions,
            |p| &mut p.conditions,
            condition_options,
        ),
        eras: list_facet(&params, &params.eras, |p| &mut p.eras, ERAS.iter().map(|e| (*e, *e))),
        price_ranges: price_facet(&params),
        clear_href: BrowseParams {
            category: params.category.clone(),
            ..Default::default()
        }
        .href(),
        has_facets: filter.has_facets(),
        products: cards(filter.apply(&products), &saved),
        active_category,
        ctx,
    }
}
