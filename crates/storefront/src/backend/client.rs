//! Hosted backend client: REST data API, object storage and auth.
//!
//! Uses `reqwest` for HTTP. Product reads are cached with `moka` for the
//! configured TTL; every write through this client invalidates them.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use moka::future::Cache;
use reqwest::{Method, RequestBuilder, StatusCode};
use secrecy::ExposeSecret;
use serde::Serialize;
use serde::de::DeserializeOwned;
use thryft_core::{Product, ProductId, ProductStatus, Seller, SellerId, UserId, UserProfile};
use tracing::{debug, instrument};

use super::auth::{AuthSession, PkceGrant, authorize_url};
use super::cache::{CacheKey, CacheValue};
use super::rows::{
    HoldNotificationRow, IdRow, NewListing, ProductRow, ProfileUpsert, SavedRow, SellerRow,
    SellerUpsert, UserRow,
};
use super::BackendError;
use crate::config::BackendConfig;

/// Client for the hosted backend.
#[derive(Clone)]
pub struct BackendClient {
    inner: Arc<BackendClientInner>,
}

struct BackendClientInner {
    client: reqwest::Client,
    base_url: String,
    anon_key: String,
    bucket: String,
    cache: Cache<CacheKey, CacheValue>,
}

impl BackendClient {
    /// Create a new backend client.
    #[must_use]
    pub fn new(config: &BackendConfig) -> Self {
        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(config.cache_ttl)
            .build();

        Self {
            inner: Arc::new(BackendClientInner {
                client: reqwest::Client::new(),
                base_url: config.url.clone(),
                anon_key: config.anon_key.expose_secret().to_string(),
                bucket: config.storage_bucket.clone(),
                cache,
            }),
        }
    }

    /// Project base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    fn rest(&self, method: Method, path: &str, access_token: Option<&str>) -> RequestBuilder {
        let url = format!("{}/rest/v1/{path}", self.inner.base_url);
        self.authorized(self.inner.client.request(method, url), access_token)
    }

    fn authorized(&self, request: RequestBuilder, access_token: Option<&str>) -> RequestBuilder {
        let bearer = access_token.unwrap_or(&self.inner.anon_key);
        request
            .header("apikey", &self.inner.anon_key)
            .bearer_auth(bearer)
    }

    /// Send a request and return the body text of a successful response.
    async fn send(&self, request: RequestBuilder) -> Result<String, BackendError> {
        let response = request.send().await?;
        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return Err(BackendError::RateLimited(retry_after));
        }

        let body = response.text().await?;

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(BackendError::Unauthorized);
        }

        if !status.is_success() {
            tracing::error!(
                status = %status,
                body = %body.chars().take(500).collect::<String>(),
                "Backend returned non-success status"
            );
            return Err(BackendError::Status {
                status: status.as_u16(),
                message: body.chars().take(200).collect(),
            });
        }

        Ok(body)
    }

    async fn fetch<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, BackendError> {
        let body = self.send(request).await?;
        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %body.chars().take(500).collect::<String>(),
                "Failed to parse backend response"
            );
            BackendError::Parse(e)
        })
    }

    // =========================================================================
    // Product Methods
    // =========================================================================

    /// All products joined with their sellers, newest first.
    ///
    /// Products whose seller row is missing are dropped.
    #[instrument(skip(self))]
    pub async fn products(&self) -> Result<Vec<Product>, BackendError> {
        if let Some(CacheValue::Products(products)) = self.inner.cache.get(&CacheKey::Products).await {
            debug!("Cache hit for products");
            return Ok(products);
        }

        let rows: Vec<ProductRow> = self
            .fetch(self.rest(
                Method::GET,
                "products?select=*&order=created_at.desc",
                None,
            ))
            .await?;

        let products = if rows.is_empty() {
            Vec::new()
        } else {
            let seller_ids: BTreeSet<SellerId> = rows.iter().map(|r| r.seller_id).collect();
            let sellers = self.sellers_by_id(&seller_ids).await?;
            join_sellers(rows, &sellers)
        };

        self.inner
            .cache
            .insert(CacheKey::Products, CacheValue::Products(products.clone()))
            .await;

        Ok(products)
    }

    /// A single product joined with its seller.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn product(&self, id: ProductId) -> Result<Option<Product>, BackendError> {
        let key = CacheKey::Product(id);
        if let Some(CacheValue::Product(product)) = self.inner.cache.get(&key).await {
            debug!("Cache hit for product");
            return Ok(product.map(|p| *p));
        }

        let rows: Vec<ProductRow> = self
            .fetch(self.rest(
                Method::GET,
                &format!("products?select=*&id=eq.{id}&limit=1"),
                None,
            ))
            .await?;

        let product = match rows.into_iter().next() {
            Some(row) => {
                let sellers = self.sellers_by_id(&BTreeSet::from([row.seller_id])).await?;
                sellers
                    .get(&row.seller_id)
                    .cloned()
                    .map(|seller| row.into_product(seller))
            }
            None => None,
        };

        self.inner
            .cache
            .insert(key, CacheValue::Product(product.clone().map(Box::new)))
            .await;

        Ok(product)
    }

    async fn sellers_by_id(
        &self,
        ids: &BTreeSet<SellerId>,
    ) -> Result<HashMap<SellerId, Seller>, BackendError> {
        let list = ids
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(",");
        let rows: Vec<SellerRow> = self
            .fetch(self.rest(
                Method::GET,
                &format!("sellers?select=*&id=in.({list})"),
                None,
            ))
            .await?;

        Ok(rows
            .into_iter()
            .map(|row| (row.id, Seller::from(row)))
            .collect())
    }

    /// Insert a listing and return its id.
    #[instrument(skip(self, access_token, listing), fields(title = %listing.title))]
    pub async fn insert_listing(
        &self,
        access_token: &str,
        listing: &NewListing,
    ) -> Result<ProductId, BackendError> {
        let rows: Vec<IdRow> = self
            .fetch(
                self.rest(Method::POST, "products?select=id", Some(access_token))
                    .header("Prefer", "return=representation")
                    .json(listing),
            )
            .await?;
        self.invalidate_products().await;

        rows.into_iter()
            .next()
            .map(|row| row.id)
            .ok_or_else(|| BackendError::NotFound("inserted listing id".to_string()))
    }

    /// Set a product's status.
    #[instrument(skip(self, access_token))]
    pub async fn update_product_status(
        &self,
        access_token: &str,
        id: ProductId,
        status: ProductStatus,
    ) -> Result<(), BackendError> {
        #[derive(Serialize)]
        struct StatusPatch {
            status: ProductStatus,
        }

        self.send(
            self.rest(
                Method::PATCH,
                &format!("products?id=eq.{id}"),
                Some(access_token),
            )
            .json(&StatusPatch { status }),
        )
        .await?;
        self.invalidate_products().await;
        Ok(())
    }

    /// Drop all cached product reads.
    pub async fn invalidate_products(&self) {
        self.inner.cache.invalidate_all();
        self.inner.cache.run_pending_tasks().await;
    }

    // =========================================================================
    // Sellers & Users
    // =========================================================================

    /// Create or update the seller row for a user.
    #[instrument(skip(self, access_token, seller), fields(seller_id = %seller.id))]
    pub async fn upsert_seller(
        &self,
        access_token: &str,
        seller: &SellerUpsert,
    ) -> Result<(), BackendError> {
        self.send(
            self.rest(Method::POST, "sellers?on_conflict=id", Some(access_token))
                .header("Prefer", "resolution=merge-duplicates,return=minimal")
                .json(seller),
        )
        .await?;
        Ok(())
    }

    /// Create or update a profile row.
    #[instrument(skip(self, access_token, profile), fields(user_id = %profile.id))]
    pub async fn upsert_profile(
        &self,
        access_token: &str,
        profile: &ProfileUpsert,
    ) -> Result<(), BackendError> {
        self.send(
            self.rest(Method::POST, "users?on_conflict=id", Some(access_token))
                .header("Prefer", "resolution=merge-duplicates,return=minimal")
                .json(profile),
        )
        .await?;
        Ok(())
    }

    /// Store a user's location on their profile row.
    #[instrument(skip(self, access_token))]
    pub async fn update_location(
        &self,
        access_token: &str,
        user_id: UserId,
        location: &str,
    ) -> Result<(), BackendError> {
        self.send(
            self.rest(
                Method::PATCH,
                &format!("users?id=eq.{user_id}"),
                Some(access_token),
            )
            .json(&serde_json::json!({ "location": location })),
        )
        .await?;
        Ok(())
    }

    /// All profile rows visible to the caller, newest first.
    #[instrument(skip(self, access_token))]
    pub async fn users(&self, access_token: &str) -> Result<Vec<UserProfile>, BackendError> {
        let rows: Vec<UserRow> = self
            .fetch(self.rest(
                Method::GET,
                "users?select=*&order=created_at.desc",
                Some(access_token),
            ))
            .await?;
        Ok(rows.into_iter().map(UserProfile::from).collect())
    }

    // =========================================================================
    // Saved Products
    // =========================================================================

    /// Product ids a user has saved.
    #[instrument(skip(self, access_token))]
    pub async fn saved_product_ids(
        &self,
        access_token: &str,
        user_id: UserId,
    ) -> Result<Vec<ProductId>, BackendError> {
        let rows: Vec<SavedRow> = self
            .fetch(self.rest(
                Method::GET,
                &format!("saved_products?select=user_id,product_id&user_id=eq.{user_id}"),
                Some(access_token),
            ))
            .await?;
        Ok(rows.into_iter().map(|r| r.product_id).collect())
    }

    #[instrument(skip(self, access_token))]
    pub async fn insert_saved(
        &self,
        access_token: &str,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<(), BackendError> {
        self.send(
            self.rest(Method::POST, "saved_products", Some(access_token))
                .header("Prefer", "return=minimal")
                .json(&SavedRow {
                    user_id,
                    product_id,
                }),
        )
        .await?;
        Ok(())
    }

    #[instrument(skip(self, access_token))]
    pub async fn delete_saved(
        &self,
        access_token: &str,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<(), BackendError> {
        self.send(self.rest(
            Method::DELETE,
            &format!("saved_products?user_id=eq.{user_id}&product_id=eq.{product_id}"),
            Some(access_token),
        ))
        .await?;
        Ok(())
    }

    // =========================================================================
    // Hold Notifications
    // =========================================================================

    /// Record a request to be told when a held product frees up.
    #[instrument(skip(self, email))]
    pub async fn insert_hold_notification(
        &self,
        product_id: ProductId,
        email: &str,
    ) -> Result<(), BackendError> {
        self.send(
            self.rest(Method::POST, "hold_notifications", None)
                .header("Prefer", "return=minimal")
                .json(&HoldNotificationRow {
                    product_id,
                    email: email.to_string(),
                }),
        )
        .await?;
        Ok(())
    }

    // =========================================================================
    // Storage
    // =========================================================================

    /// Upload a listing photo and return its public URL.
    #[instrument(skip(self, access_token, bytes), fields(size = bytes.len()))]
    pub async fn upload_image(
        &self,
        access_token: &str,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, BackendError> {
        let url = format!(
            "{}/storage/v1/object/{}/{path}",
            self.inner.base_url, self.inner.bucket
        );
        self.send(
            self.authorized(self.inner.client.post(url), Some(access_token))
                .header("Content-Type", content_type)
                .header("x-upsert", "false")
                .body(bytes),
        )
        .await?;
        Ok(self.public_url(path))
    }

    /// Remove objects from the listing bucket.
    #[instrument(skip(self, access_token), fields(count = paths.len()))]
    pub async fn delete_images(
        &self,
        access_token: &str,
        paths: &[String],
    ) -> Result<(), BackendError> {
        let url = format!(
            "{}/storage/v1/object/{}",
            self.inner.base_url, self.inner.bucket
        );
        self.send(
            self.authorized(self.inner.client.delete(url), Some(access_token))
                .json(&serde_json::json!({ "prefixes": paths })),
        )
        .await?;
        Ok(())
    }

    /// Public URL of an object in the listing bucket.
    #[must_use]
    pub fn public_url(&self, path: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{}/{path}",
            self.inner.base_url, self.inner.bucket
        )
    }

    // =========================================================================
    // Auth
    // =========================================================================

    /// Authorization URL for an OAuth provider using a PKCE challenge.
    #[must_use]
    pub fn authorize_url(&self, provider: &str, redirect_to: &str, challenge: &str) -> String {
        authorize_url(&self.inner.base_url, provider, redirect_to, challenge)
    }

    /// Exchange an authorization code and PKCE verifier for a session.
    #[instrument(skip_all)]
    pub async fn exchange_code(
        &self,
        code: &str,
        verifier: &str,
    ) -> Result<AuthSession, BackendError> {
        let url = format!("{}/auth/v1/token?grant_type=pkce", self.inner.base_url);
        self.fetch(
            self.authorized(self.inner.client.post(url), None)
                .json(&PkceGrant {
                    auth_code: code,
                    code_verifier: verifier,
                }),
        )
        .await
    }

    /// Revoke the remote session behind an access token.
    #[instrument(skip_all)]
    pub async fn logout(&self, access_token: &str) -> Result<(), BackendError> {
        let url = format!("{}/auth/v1/logout", self.inner.base_url);
        self.send(self.authorized(self.inner.client.post(url), Some(access_token)))
            .await?;
        Ok(())
    }

    /// Whether the auth service answers its health check.
    pub async fn is_healthy(&self) -> bool {
        let url = format!("{}/auth/v1/health", self.inner.base_url);
        self.send(self.authorized(self.inner.client.get(url), None))
            .await
            .is_ok()
    }
}

/// Join product rows with their sellers, dropping rows with no seller.
fn join_sellers(rows: Vec<ProductRow>, sellers: &HashMap<SellerId, Seller>) -> Vec<Product> {
    rows.into_iter()
        .filter_map(|row| {
            let seller = sellers.get(&row.seller_id)?.clone();
            Some(row.into_product(seller))
        })
        .collect()
}
