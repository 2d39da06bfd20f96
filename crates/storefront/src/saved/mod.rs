//! Saved products (favorites) with optimistic toggling.
//!
//! A toggle is a [`ToggleSave`] command. It is planned against the current
//! set, applied locally before the remote call, and rolled back if the call
//! fails. Applying then rolling back restores the exact prior set.

mod service;

pub use service::{SAVED_TTL, SavedProducts};

use std::collections::BTreeSet;
use std::future::Future;

use serde::Serialize;
use thryft_core::ProductId;

use crate::backend::{BackendClient, BackendError};
use crate::models::CurrentUser;

/// The set of products one user has saved.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SavedSet(BTreeSet<ProductId>);

impl SavedSet {
    #[must_use]
    pub fn contains(&self, id: ProductId) -> bool {
        self.0.contains(&id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = ProductId> + '_ {
        self.0.iter().copied()
    }
}

impl FromIterator<ProductId> for SavedSet {
    fn from_iter<I: IntoIterator<Item = ProductId>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Remote request a toggle issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SaveAction {
    Add,
    Remove,
}

/// An optimistic save/unsave of one product.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToggleSave {
    pub product_id: ProductId,
    /// Membership before the toggle.
    pub was_saved: bool,
}

impl ToggleSave {
    /// Plan a toggle against the current set.
    #[must_use]
    pub fn plan(set: &SavedSet, product_id: ProductId) -> Self {
        Self {
            product_id,
            was_saved: set.contains(product_id),
        }
    }

    #[must_use]
    pub const fn action(&self) -> SaveAction {
        if self.was_saved {
            SaveAction::Remove
        } else {
            SaveAction::Add
        }
    }

    /// Membership after the toggle.
    #[must_use]
    pub const fn is_saved_after(&self) -> bool {
        !self.was_saved
    }

    /// Apply the optimistic change.
    pub fn apply(&self, set: &mut SavedSet) {
        if self.was_saved {
            set.0.remove(&self.product_id);
        } else {
            set.0.insert(self.product_id);
        }
    }

    /// Restore membership to what it was before [`apply`](Self::apply).
    pub fn rollback(&self, set: &mut SavedSet) {
        if self.was_saved {
            set.0.insert(self.product_id);
        } else {
            set.0.remove(&self.product_id);
        }
    }
}

/// Remote persistence for saved products.
pub trait SavedRemote: Send + Sync {
    fn list_saved(
        &self,
        user: &CurrentUser,
    ) -> impl Future<Output = Result<Vec<ProductId>, BackendError>> + Send;

    fn add_saved(
        &self,
        user: &CurrentUser,
        product_id: ProductId,
    ) -> impl Future<Output = Result<(), BackendError>> + Send;

    fn remove_saved(
        &self,
        user: &CurrentUser,
        product_id: ProductId,
    ) -> impl Future<Output = Result<(), BackendError>> + Send;
}

impl SavedRemote for BackendClient {
    async fn list_saved(&self, user: &CurrentUser) -> Result<Vec<ProductId>, BackendError> {
        self.saved_product_ids(&user.access_token, user.id).await
    }

    async fn add_saved(&self, user: &CurrentUser, product_id: ProductId) -> Result<(), BackendError> {
        self.insert_saved(&user.access_token, user.id, product_id).await
    }

    async fn remove_saved(
        &self,
        user: &CurrentUser,
        product_id: ProductId,
    ) -> Result<(), BackendError> {
        self.delete_saved(&user.access_token, user.id, product_id)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plan_and_action() {
        let saved = ProductId::random();
        let set: SavedSet = [saved].into_iter().collect();

        assert_eq!(ToggleSave::plan(&set, saved).action(), SaveAction::Remove);
        assert_eq!(
            ToggleSave::plan(&set, ProductId::random()).action(),
            SaveAction::Add
        );
    }

    #[test]
    fn test_apply_then_rollback_restores() {
        let a = ProductId::random();
        let b = ProductId::random();
        let original: SavedSet = [a].into_iter().collect();

        for target in [a, b] {
            let mut set = original.clone();
            let toggle = ToggleSave::plan(&set, target);
            toggle.apply(&mut set);
            assert_eq!(set.contains(target), toggle.is_saved_after());
            toggle.rollback(&mut set);
            assert_eq!(set, original);
        }
    }
}
