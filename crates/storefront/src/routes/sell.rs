//! Listing wizard route handlers.
//!
//! The wizard is session state. Each POST loads it, applies one action,
//! stores it and redirects back to `GET /sell`, which renders the current
//! step. Rejected actions come back as a flash message.
//!
//! ```text
//! GET  /sell                          - Current step
//! POST /sell/category                 - Pick category (auto-advances)
//! POST /sell/photos                   - Upload photos (multipart)
//! POST /sell/photos/{index}/remove    - Remove a photo
//! GET  /sell/photos/preview/{handle}  - Photo preview bytes
//! POST /sell/details                  - Save details
//! POST /sell/pricing                  - Save pricing
//! POST /sell/continue | /sell/back    - Move between steps
//! POST /sell/publish                  - Publish from Review
//! POST /sell/reset | /sell/another    - Start over
//! ```

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Multipart, Path, State},
    http::{StatusCode, header},
    response::{IntoResponse, Redirect, Response},
};
use rust_decimal::Decimal;
use thryft_core::{Category, Condition};
use tower_sessions::Session;
use tracing::instrument;

use super::page::{PageContext, load, set_flash, store};
use crate::error::{AppError, Result, add_breadcrumb};
use crate::filters;
use crate::middleware::RequireAuth;
use crate::models::session_keys;
use crate::state::AppState;
use crate::wizard::{
    DEFAULT_BRAND, LISTING_ERAS, ListingDetails, ListingPricing, ListingWizard,
    MAX_DESCRIPTION_CHARS, MAX_PHOTOS, MAX_TITLE_CHARS, MIN_PHOTOS, PLATFORM_FEE_PERCENT, PhotoRef,
    PreviewHandle, PreviewImage, WizardError, WizardStep, publish,
};

// =============================================================================
// View Models
// =============================================================================

/// One entry in the step indicator.
#[derive(Debug, Clone)]
pub struct StepView {
    pub number: usize,
    pub title: &'static str,
    pub current: bool,
    pub done: bool,
}

#[derive(Debug, Clone)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
    pub selected: bool,
}

impl SelectOption {
    fn list<'a, I>(values: I, current: &str) -> Vec<Self>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        values
            .into_iter()
            .map(|(value, label)| Self {
                selected: value == current,
                value: value.to_string(),
                label: label.to_string(),
            })
            .collect()
    }
}

#[derive(Debug, Clone)]
pub struct PhotoView {
    pub index: usize,
    pub handle: String,
    pub file_name: String,
}

/// A category-specific field on the Details step.
#[derive(Debug, Clone)]
pub struct ExtraFieldView {
    pub key: &'static str,
    pub label: &'static str,
    pub value: String,
    pub options: Vec<SelectOption>,
}

impl ExtraFieldView {
    #[must_use]
    pub fn is_free_text(&self) -> bool {
        self.options.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct FeeView {
    pub price: String,
    pub platform_fee: String,
    pub seller_earns: String,
}

/// Read-only summary on the Review step.
#[derive(Debug, Clone, Default)]
pub struct ReviewView {
    pub category: String,
    pub title: String,
    pub brand: String,
    pub size: String,
    pub condition: String,
    pub era: String,
    pub description: String,
    pub price: String,
    pub original_price: Option<String>,
    pub shipping: String,
    pub allow_offers: bool,
    pub local_pickup: bool,
    pub tags: Vec<String>,
}

fn money(amount: Decimal) -> String {
    thryft_core::Price::inr(amount).display()
}

fn opt_amount(amount: Option<Decimal>) -> String {
    amount.map(|a| a.normalize().to_string()).unwrap_or_default()
}

/// Wizard page template.
#[derive(Template, WebTemplate)]
#[template(path = "sell/wizard.html")]
pub struct WizardTemplate {
    pub ctx: PageContext,
    pub step: WizardStep,
    pub steps: Vec<StepView>,
    pub can_proceed: bool,
    pub can_go_back: bool,
    // Category
    pub categories: Vec<SelectOption>,
    // Photos
    pub photos: Vec<PhotoView>,
    pub photo_room: bool,
    pub min_photos: usize,
    pub max_photos: usize,
    // Details
    pub title: String,
    pub brand: String,
    pub brand_placeholder: &'static str,
    pub size_label: String,
    pub sizes: Vec<SelectOption>,
    pub conditions: Vec<SelectOption>,
    pub eras: Vec<SelectOption>,
    pub description: String,
    pub extras: Vec<ExtraFieldView>,
    pub max_title: usize,
    pub max_description: usize,
    // Pricing
    pub price: String,
    pub original_price: String,
    pub allow_offers: bool,
    pub shipping_included: bool,
    pub shipping_cost: String,
    pub local_pickup: bool,
    pub fee_percent: u32,
    pub fees: Option<FeeView>,
    // Review
    pub review: ReviewView,
}

impl WizardTemplate {
    #[must_use]
    pub fn is_step(&self, name: &str) -> bool {
        self.step.title().eq_ignore_ascii_case(name)
    }

    fn build(ctx: PageContext, wizard: &ListingWizard) -> Self {
        let step = wizard.step();
        let category = wizard.category();
        let details = wizard.details();
        let pricing = wizard.pricing();
        let schema = category.map(Category::schema);

        let steps = WizardStep::FLOW
            .into_iter()
            .map(|s| StepView {
                number: s.index() + 1,
                title: s.title(),
                current: s == step,
                done: s < step,
            })
            .collect();

        let condition = details.condition.map(Condition::as_str).unwrap_or_default();

        let extras = schema
            .map(|schema| {
                schema
                    .extra_fields
                    .iter()
                    .map(|field| {
                        let value = details.extras.get(field.key).cloned().unwrap_or_default();
                        ExtraFieldView {
                            key: field.key,
                            label: field.label,
                            options: SelectOption::list(
                                field.options.iter().map(|o| (*o, *o)),
                                &value,
                            ),
                            value,
                        }
                    })
                    .collect()
            })
            .unwrap_or_default();

        let review = match (category, step) {
            (Some(category), WizardStep::Review) => ReviewView {
                category: category.name().to_string(),
                title: details.title.clone(),
                brand: if details.brand.is_empty() {
                    DEFAULT_BRAND.to_string()
                } else {
                    details.brand.clone()
                },
                size: details.size.clone(),
                condition: details
                    .condition
                    .map(Condition::label)
                    .unwrap_or_default()
                    .to_string(),
                era: details.era.clone(),
                description: details.description.clone(),
                price: pricing.price.map(money).unwrap_or_default(),
                original_price: pricing
                    .original_price
                    .filter(|o| pricing.price.is_some_and(|p| *o > p))
                    .map(money),
                shipping: if pricing.shipping_cost > Decimal::ZERO {
                    money(pricing.shipping_cost)
                } else {
                    "Free".to_string()
                },
                allow_offers: pricing.allow_offers,
                local_pickup: pricing.local_pickup,
                tags: details.extra_tags(category),
            },
            _ => ReviewView::default(),
        };

        Self {
            step,
            steps,
            can_proceed: wizard.can_proceed(),
            can_go_back: !matches!(step, WizardStep::Category | WizardStep::Submitted),
            categories: SelectOption::list(
                Category::ALL.iter().map(|c| (c.name(), c.name())),
                category.map(Category::name).unwrap_or_default(),
            ),
            photos: wizard
                .photos()
                .iter()
                .enumerate()
                .map(|(index, photo)| PhotoView {
                    index,
                    handle: photo.handle.to_string(),
                    file_name: photo.file_name.clone(),
                })
                .collect(),
            photo_room: wizard.has_photo_room(),
            min_photos: MIN_PHOTOS,
            max_photos: MAX_PHOTOS,
            title: details.title.clone(),
            brand: details.brand.clone(),
            brand_placeholder: DEFAULT_BRAND,
            size_label: schema.map_or("Size", |s| s.size_label).to_string(),
            sizes: SelectOption::list(
                schema
                    .map(|s| s.size_options)
                    .unwrap_or_default()
                    .iter()
                    .map(|s| (*s, *s)),
                &details.size,
            ),
            conditions: SelectOption::list(
                Condition::ALL.iter().map(|c| (c.as_str(), c.label())),
                condition,
            ),
            eras: SelectOption::list(LISTING_ERAS.iter().map(|e| (*e, *e)), &details.era),
            description: details.description.clone(),
            extras,
            max_title: MAX_TITLE_CHARS,
            max_description: MAX_DESCRIPTION_CHARS,
            price: opt_amount(pricing.price),
            original_price: opt_amount(pricing.original_price),
            allow_offers: pricing.allow_offers,
            shipping_included: pricing.shipping_included,
            shipping_cost: opt_amount(Some(pricing.shipping_cost).filter(|c| !c.is_zero())),
            local_pickup: pricing.local_pickup,
            fee_percent: PLATFORM_FEE_PERCENT,
            fees: wizard.fees().map(|f| FeeView {
                price: f.price.display(),
                platform_fee: f.platform_fee.display(),
                seller_earns: f.seller_earns.display(),
            }),
            review,
            ctx,
        }
    }
}

// =============================================================================
// Form Parsing
// =============================================================================

/// Raw form pairs. Extra fields arrive as `extra_<key>`.
type Fields = Vec<(String, String)>;

fn field<'a>(fields: &'a Fields, name: &str) -> &'a str {
    fields
        .iter()
        .find(|(k, _)| k == name)
        .map_or("", |(_, v)| v.as_str())
}

fn checkbox(fields: &Fields, name: &str) -> bool {
    matches!(field(fields, name), "on" | "true" | "1")
}

fn wants_continue(fields: &Fields) -> bool {
    field(fields, "intent") == "continue"
}

fn parse_details(fields: &Fields) -> ListingDetails {
    ListingDetails {
        title: field(fields, "title").to_string(),
        brand: field(fields, "brand").to_string(),
        size: field(fields, "size").to_string(),
        condition: field(fields, "condition").parse().ok(),
        era: field(fields, "era").to_string(),
        description: field(fields, "description").to_string(),
        extras: fields
            .iter()
            .filter_map(|(k, v)| {
                k.strip_prefix("extra_")
                    .map(|key| (key.to_string(), v.clone()))
            })
            .collect(),
    }
}

/// Blank is `None`; anything else must be a decimal amount.
fn parse_amount(raw: &str) -> std::result::Result<Option<Decimal>, String> {
    let raw = raw.trim().replace(',', "");
    if raw.is_empty() {
        return Ok(None);
    }
    raw.parse::<Decimal>()
        .map(Some)
        .map_err(|_| format!("{raw} is not a valid amount"))
}

fn parse_pricing(fields: &Fields) -> std::result::Result<ListingPricing, String> {
    Ok(ListingPricing {
        price: parse_amount(field(fields, "price"))?,
        original_price: parse_amount(field(fields, "original_price"))?,
        allow_offers: checkbox(fields, "allow_offers"),
        shipping_included: checkbox(fields, "shipping_included"),
        shipping_cost: parse_amount(field(fields, "shipping_cost"))?.unwrap_or_default(),
        local_pickup: checkbox(fields, "local_pickup"),
    })
}

// =============================================================================
// Session Helpers
// =============================================================================

async fn load_wizard(session: &Session) -> ListingWizard {
    load(session, session_keys::LISTING_WIZARD).await
}

async fn save_wizard(session: &Session, wizard: &ListingWizard) -> Result<()> {
    store(session, session_keys::LISTING_WIZARD, wizard).await
}

/// Store the wizard, flash any rejection and go back to the wizard page.
async fn finish(
    session: &Session,
    wizard: &ListingWizard,
    outcome: std::result::Result<(), WizardError>,
) -> Result<Redirect> {
    if let Err(e) = outcome {
        set_flash(session, e.to_string()).await;
    }
    save_wizard(session, wizard).await?;
    Ok(Redirect::to("/sell"))
}

async fn release(state: &AppState, photos: Vec<PhotoRef>) {
    state
        .previews()
        .release_all(photos.into_iter().map(|p| p.handle))
        .await;
}

// =============================================================================
// Handlers
// =============================================================================

/// Render the current step.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn show(
    RequireAuth(user): RequireAuth,
    ctx: PageContext,
    session: Session,
) -> impl IntoResponse {
    let wizard = load_wizard(&session).await;
    WizardTemplate::build(ctx, &wizard)
}

#[derive(Debug, serde::Deserialize)]
pub struct CategoryForm {
    pub category: String,
}

#[instrument(skip_all, fields(category = %form.category))]
pub async fn category(
    RequireAuth(_user): RequireAuth,
    session: Session,
    Form(form): Form<CategoryForm>,
) -> Result<Redirect> {
    let mut wizard = load_wizard(&session).await;
    let outcome = match form.category.parse::<Category>() {
        Ok(category) => wizard.select_category(category),
        Err(_) => Err(WizardError::InvalidOption {
            field: "category".to_string(),
            value: form.category,
        }),
    };
    finish(&session, &wizard, outcome).await
}

/// Attach uploaded photos until the first rejection.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn upload_photos(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    session: Session,
    mut multipart: Multipart,
) -> Result<Redirect> {
    let mut wizard = load_wizard(&session).await;
    let mut outcome = Ok(());

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                tracing::warn!(error = %e, "Photo upload failed");
                set_flash(&session, "Upload failed. Try a smaller photo.").await;
                break;
            }
        };
        let Some(file_name) = field.file_name().map(str::to_string) else {
            continue;
        };
        if file_name.is_empty() {
            continue;
        }
        let content_type = field.content_type().unwrap_or_default().to_string();
        let bytes = match field.bytes().await {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(error = %e, "Photo upload failed");
                set_flash(&session, "Upload failed. Try a smaller photo.").await;
                break;
            }
        };

        if !wizard.has_photo_room() {
            outcome = Err(WizardError::PhotoLimit);
            break;
        }
        let image = match PreviewImage::new(bytes, &content_type) {
            Ok(image) => image,
            Err(e) => {
                outcome = Err(e);
                break;
            }
        };

        let handle = state.previews().acquire(image).await;
        let photo = PhotoRef { handle, file_name };
        if let Err(e) = wizard.attach_photo(photo) {
            state.previews().release(handle).await;
            outcome = Err(e);
            break;
        }
    }

    tracing::debug!(photos = wizard.photos().len(), "Photos attached");
    finish(&session, &wizard, outcome).await
}

#[instrument(skip_all, fields(index = index))]
pub async fn remove_photo(
    State(state): State<AppState>,
    RequireAuth(_user): RequireAuth,
    session: Session,
    Path(index): Path<usize>,
) -> Result<Redirect> {
    let mut wizard = load_wizard(&session).await;
    let outcome = match wizard.remove_photo(index) {
        Ok(photo) => {
            state.previews().release(photo.handle).await;
            Ok(())
        }
        Err(e) => Err(e),
    };
    finish(&session, &wizard, outcome).await
}

/// Serve a preview, only to the session that attached it.
#[instrument(skip(state, session))]
pub async fn preview(
    State(state): State<AppState>,
    session: Session,
    Path(handle): Path<String>,
) -> Result<Response> {
    let not_found = || AppError::NotFound("preview".to_string());
    let handle: PreviewHandle = handle.parse().map_err(|_| not_found())?;

    let wizard = load_wizard(&session).await;
    if !wizard.photos().iter().any(|p| p.handle == handle) {
        return Err(not_found());
    }

    let image = state.previews().get(handle).await.ok_or_else(not_found)?;
    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, image.content_type.clone()),
            (header::CACHE_CONTROL, "private, max-age=3600".to_string()),
        ],
        image.bytes,
    )
        .into_response())
}

#[instrument(skip_all)]
pub async fn details(
    RequireAuth(_user): RequireAuth,
    session: Session,
    Form(fields): Form<Fields>,
) -> Result<Redirect> {
    let mut wizard = load_wizard(&session).await;
    let mut outcome = wizard.update_details(parse_details(&fields));
    if outcome.is_ok() && wants_continue(&fields) && !wizard.advance() {
        outcome = Err(WizardError::Incomplete(WizardStep::Details));
    }
    finish(&session, &wizard, outcome).await
}

#[instrument(skip_all)]
pub async fn pricing(
    RequireAuth(_user): RequireAuth,
    session: Session,
    Form(fields): Form<Fields>,
) -> Result<Redirect> {
    let mut wizard = load_wizard(&session).await;
    let pricing = match parse_pricing(&fields) {
        Ok(pricing) => pricing,
        Err(message) => {
            set_flash(&session, message).await;
            return Ok(Redirect::to("/sell"));
        }
    };
    let mut outcome = wizard.update_pricing(pricing);
    if outcome.is_ok() && wants_continue(&fields) && !wizard.advance() {
        outcome = Err(WizardError::Incomplete(WizardStep::Pricing));
    }
    finish(&session, &wizard, outcome).await
}

/// Advance when the current step is satisfied; otherwise nothing happens.
#[instrument(skip_all)]
pub async fn advance(RequireAuth(_user): RequireAuth, session: Session) -> Result<Redirect> {
    let mut wizard = load_wizard(&session).await;
    wizard.advance();
    finish(&session, &wizard, Ok(())).await
}

#[instrument(skip_all)]
pub async fn back(RequireAuth(_user): RequireAuth, session: Session) -> Result<Redirect> {
    let mut wizard = load_wizard(&session).await;
    wizard.back();
    finish(&session, &wizard, Ok(())).await
}

/// Publish the reviewed listing.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn publish_listing(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    session: Session,
) -> Result<Redirect> {
    let mut wizard = load_wizard(&session).await;
    let draft = match wizard.draft() {
        Ok(draft) => draft,
        Err(e) => return finish(&session, &wizard, Err(e)).await,
    };

    let location: Option<String> = load(&session, session_keys::LOCATION).await;
    let product_id = match publish(state.backend(), state.previews(), &user, draft, location).await
    {
        Ok(id) => id,
        Err(e) => {
            let err = AppError::from(e);
            if err.status().is_server_error() {
                return Err(err);
            }
            set_flash(&session, err.public_message()).await;
            return Ok(Redirect::to("/sell"));
        }
    };

    let photos = wizard.complete()?;
    release(&state, photos).await;

    let product_id = product_id.to_string();
    add_breadcrumb("sell", "Listing published", Some(&[("product_id", &product_id)]));
    finish(&session, &wizard, Ok(())).await
}

/// Discard the wizard and its previews.
#[instrument(skip_all)]
pub async fn reset(
    State(state): State<AppState>,
    RequireAuth(_user): RequireAuth,
    session: Session,
) -> Result<Redirect> {
    let mut wizard = load_wizard(&session).await;
    let photos = wizard.reset();
    release(&state, photos).await;
    finish(&session, &wizard, Ok(())).await
}

/// Start a new listing after publishing.
#[instrument(skip_all)]
pub async fn another(RequireAuth(_user): RequireAuth, session: Session) -> Result<Redirect> {
    let mut wizard = load_wizard(&session).await;
    let outcome = wizard.list_another();
    finish(&session, &wizard, outcome).await
}
