//! Publishing a reviewed draft to the hosted backend.

use std::future::Future;

use thiserror::Error;
use thryft_core::{ProductId, SellerId};
use tracing::instrument;
use uuid::Uuid;

use super::{ListingDraft, PreviewStore};
use crate::backend::rows::{NewListing, SellerUpsert};
use crate::backend::{BackendClient, BackendError};
use crate::models::CurrentUser;

#[derive(Debug, Error)]
pub enum PublishError {
    #[error("Photo {0} expired, add it again")]
    PhotoExpired(String),

    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// Backend operations a publish needs.
pub trait ListingStore: Send + Sync {
    /// Upload one photo and return its public URL.
    fn upload_image(
        &self,
        access_token: &str,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> impl Future<Output = Result<String, BackendError>> + Send;

    fn delete_images(
        &self,
        access_token: &str,
        paths: &[String],
    ) -> impl Future<Output = Result<(), BackendError>> + Send;

    fn upsert_seller(
        &self,
        access_token: &str,
        seller: &SellerUpsert,
    ) -> impl Future<Output = Result<(), BackendError>> + Send;

    fn insert_listing(
        &self,
        access_token: &str,
        listing: &NewListing,
    ) -> impl Future<Output = Result<ProductId, BackendError>> + Send;
}

impl ListingStore for BackendClient {
    async fn upload_image(
        &self,
        access_token: &str,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, BackendError> {
        Self::upload_image(self, access_token, path, bytes, content_type).await
    }

    async fn delete_images(&self, access_token: &str, paths: &[String]) -> Result<(), BackendError> {
        Self::delete_images(self, access_token, paths).await
    }

    async fn upsert_seller(
        &self,
        access_token: &str,
        seller: &SellerUpsert,
    ) -> Result<(), BackendError> {
        Self::upsert_seller(self, access_token, seller).await
    }

    async fn insert_listing(
        &self,
        access_token: &str,
        listing: &NewListing,
    ) -> Result<ProductId, BackendError> {
        Self::insert_listing(self, access_token, listing).await
    }
}

/// Object path for an uploaded listing photo.
fn photo_path(user: &CurrentUser, extension: &str) -> String {
    format!("listings/{}/{}.{extension}", user.id, Uuid::new_v4())
}

/// Username derived from an email address, or from the display name.
fn username_for(user: &CurrentUser) -> String {
    user.email.as_ref().map_or_else(
        || user.name.to_lowercase().replace(' ', ""),
        |email| {
            email
                .as_str()
                .split('@')
                .next()
                .unwrap_or_default()
                .to_string()
        },
    )
}

/// Upload the draft's photos, ensure a seller row exists and insert the listing.
///
/// If any step fails, photos already uploaded are deleted again on a best
/// effort basis. Previews are not released here; the caller releases them
/// once the wizard has moved to Submitted.
#[instrument(skip_all, fields(user_id = %user.id, photos = draft.photos.len()))]
pub async fn publish<S: ListingStore>(
    store: &S,
    previews: &PreviewStore,
    user: &CurrentUser,
    draft: ListingDraft,
    location: Option<String>,
) -> Result<ProductId, PublishError> {
    let mut uploaded = Vec::with_capacity(draft.photos.len());
    let result = upload_and_insert(store, previews, user, draft, location, &mut uploaded).await;

    if result.is_err()
        && !uploaded.is_empty()
        && let Err(e) = store.delete_images(&user.access_token, &uploaded).await
    {
        tracing::warn!(error = %e, count = uploaded.len(), "Failed to remove orphaned listing photos");
    }
    result
}

/// Records each uploaded object path in `uploaded` as it goes.
async fn upload_and_insert<S: ListingStore>(
    store: &S,
    previews: &PreviewStore,
    user: &CurrentUser,
    draft: ListingDraft,
    location: Option<String>,
    uploaded: &mut Vec<String>,
) -> Result<ProductId, PublishError> {
    let mut image_urls = Vec::with_capacity(draft.photos.len());
    for photo in &draft.photos {
        let image = previews
            .get(photo.handle)
            .await
            .ok_or_else(|| PublishError::PhotoExpired(photo.file_name.clone()))?;
        let path = photo_path(user, image.extension());
        let url = store
            .upload_image(
                &user.access_token,
                &path,
                image.bytes.to_vec(),
                &image.content_type,
            )
            .await?;
        uploaded.push(path);
        image_urls.push(url);
    }

    store
        .upsert_seller(
            &user.access_token,
            &SellerUpsert {
                id: SellerId::from(user.id),
                name: user.name.clone(),
                username: username_for(user),
                avatar: user.avatar.clone(),
                location,
            },
        )
        .await?;

    let listing = draft.into_new_listing(user.id, image_urls);
    let id = store.insert_listing(&user.access_token, &listing).await?;

    tracing::info!(product_id = %id, "Listing published");
    Ok(id)
}
