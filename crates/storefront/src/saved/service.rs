//! Per-user saved-set cache with optimistic toggles.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use thryft_core::{ProductId, UserId};
use tokio::sync::Mutex;
use tracing::instrument;

use super::{SaveAction, SavedRemote, SavedSet, ToggleSave};
use crate::backend::BackendError;
use crate::models::CurrentUser;

/// How long a loaded set is trusted before it is reloaded from the remote.
pub const SAVED_TTL: Duration = Duration::from_secs(60);

type Entry = Arc<Mutex<SavedSet>>;

/// Saved products for all signed-in users.
///
/// The per-user lock guards only local mutation. It is released before the
/// remote call and taken again for rollback.
pub struct SavedProducts<R> {
    remote: R,
    cache: Cache<UserId, Entry>,
}

impl<R: SavedRemote> SavedProducts<R> {
    #[must_use]
    pub fn new(remote: R) -> Self {
        Self::with_ttl(remote, SAVED_TTL)
    }

    #[must_use]
    pub fn with_ttl(remote: R, ttl: Duration) -> Self {
        Self {
            remote,
            cache: Cache::builder()
                .max_capacity(10_000)
                .time_to_live(ttl)
                .build(),
        }
    }

    /// Cached entry for a user, loading it on a miss.
    ///
    /// A failed load yields an empty, uncached set.
    async fn entry(&self, user: &CurrentUser) -> Entry {
        if let Some(entry) = self.cache.get(&user.id).await {
            return entry;
        }

        match self.remote.list_saved(user).await {
            Ok(ids) => {
                let loaded: Entry = Arc::new(Mutex::new(ids.into_iter().collect()));
                self.cache.get_with(user.id, async { loaded }).await
            }
            Err(e) => {
                tracing::warn!(user_id = %user.id, error = %e, "Failed to load saved products");
                Arc::new(Mutex::new(SavedSet::default()))
            }
        }
    }

    /// Snapshot of a user's saved set.
    pub async fn saved(&self, user: &CurrentUser) -> SavedSet {
        self.entry(user).await.lock().await.clone()
    }

    /// Whether a user has saved a product.
    pub async fn is_saved(&self, user: &CurrentUser, product_id: ProductId) -> bool {
        self.entry(user).await.lock().await.contains(product_id)
    }

    /// Toggle a product for a user.
    ///
    /// The local set changes before the remote call; on failure it is rolled
    /// back and the error returned. Returns membership after the toggle.
    #[instrument(skip(self, user), fields(user_id = %user.id))]
    pub async fn toggle(
        &self,
        user: &CurrentUser,
        product_id: ProductId,
    ) -> Result<bool, BackendError> {
        let entry = self.entry(user).await;

        let toggle = {
            let mut set = entry.lock().await;
            let toggle = ToggleSave::plan(&set, product_id);
            toggle.apply(&mut set);
            toggle
        };

        let result = match toggle.action() {
            SaveAction::Add => self.remote.add_saved(user, product_id).await,
            SaveAction::Remove => self.remote.remove_saved(user, product_id).await,
        };

        if let Err(e) = result {
            toggle.rollback(&mut *entry.lock().await);
            tracing::warn!(error = %e, action = ?toggle.action(), "Saved toggle failed, rolled back");
            return Err(e);
        }

        Ok(toggle.is_saved_after())
    }

    /// Forget a user's cached set (sign-out).
    pub async fn forget(&self, user_id: UserId) {
        self.cache.invalidate(&user_id).await;
    }
}
