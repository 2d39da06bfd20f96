//! Optimistic saved toggles against a scripted remote.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use thryft_core::ProductId;
use thryft_integration_tests::user;
use thryft_storefront::backend::BackendError;
use thryft_storefront::models::CurrentUser;
use thryft_storefront::saved::{SavedProducts, SavedRemote};

/// Scripted remote state: one saved product, writes fail on demand.
#[derive(Default)]
struct Script {
    initial: Vec<ProductId>,
    failing: AtomicBool,
    writes: AtomicUsize,
}

#[derive(Clone)]
struct Remote(Arc<Script>);

impl Remote {
    fn write(&self) -> Result<(), BackendError> {
        self.0.writes.fetch_add(1, Ordering::SeqCst);
        if self.0.failing.load(Ordering::SeqCst) {
            Err(BackendError::Status {
                status: 503,
                message: "unavailable".to_string(),
            })
        } else {
            Ok(())
        }
    }
}

impl SavedRemote for Remote {
    async fn list_saved(&self, _: &CurrentUser) -> Result<Vec<ProductId>, BackendError> {
        Ok(self.0.initial.clone())
    }

    async fn add_saved(&self, _: &CurrentUser, _: ProductId) -> Result<(), BackendError> {
        self.write()
    }

    async fn remove_saved(&self, _: &CurrentUser, _: ProductId) -> Result<(), BackendError> {
        self.write()
    }
}

fn setup() -> (Arc<Script>, SavedProducts<Remote>, ProductId) {
    let already_saved = ProductId::random();
    let script = Arc::new(Script {
        initial: vec![already_saved],
        ..Script::default()
    });
    (
        Arc::clone(&script),
        SavedProducts::new(Remote(script)),
        already_saved,
    )
}

#[tokio::test]
async fn test_toggle_flips_membership() {
    let (remote, saved, existing) = setup();
    let rohan = user();
    let fresh = ProductId::random();

    assert!(saved.toggle(&rohan, fresh).await.unwrap());
    assert!(!saved.toggle(&rohan, existing).await.unwrap());

    let set = saved.saved(&rohan).await;
    assert!(set.contains(fresh));
    assert!(!set.contains(existing));
    assert_eq!(remote.writes.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_failed_add_rolls_back() {
    let (remote, saved, existing) = setup();
    let rohan = user();
    let fresh = ProductId::random();
    remote.failing.store(true, Ordering::SeqCst);

    assert!(saved.toggle(&rohan, fresh).await.is_err());
    assert!(!saved.is_saved(&rohan, fresh).await);
    assert!(saved.is_saved(&rohan, existing).await);
}

#[tokio::test]
async fn test_failed_remove_rolls_back() {
    let (remote, saved, existing) = setup();
    let rohan = user();
    remote.failing.store(true, Ordering::SeqCst);

    let err = saved.toggle(&rohan, existing).await.unwrap_err();
    assert!(matches!(err, BackendError::Status { status: 503, .. }));
    assert!(saved.is_saved(&rohan, existing).await);
    assert_eq!(saved.saved(&rohan).await.len(), 1);
}

#[tokio::test]
async fn test_sets_are_per_user() {
    let (_remote, saved, _) = setup();
    let rohan = user();
    let priya = user();
    let fresh = ProductId::random();

    saved.toggle(&rohan, fresh).await.unwrap();
    assert!(saved.is_saved(&rohan, fresh).await);
    assert!(!saved.is_saved(&priya, fresh).await);
}

#[tokio::test]
async fn test_forget_reloads_from_remote() {
    let (_remote, saved, existing) = setup();
    let rohan = user();
    let fresh = ProductId::random();

    saved.toggle(&rohan, fresh).await.unwrap();
    saved.forget(rohan.id).await;

    // The scripted remote never persisted the add
    let set = saved.saved(&rohan).await;
    assert!(!set.contains(fresh));
    assert!(set.contains(existing));
}
