//! Listing wizard flow against a real preview store.

#![allow(clippy::unwrap_used)]

use axum::body::Bytes;
use rust_decimal::Decimal;
use thryft_core::{Category, Condition};
use thryft_storefront::wizard::{
    ListingDetails, ListingPricing, ListingWizard, MAX_PHOTOS, MAX_PRICE_RUPEES, PhotoRef, PreviewImage,
    PreviewStore, WizardError, WizardStep,
};

async fn attach(wizard: &mut ListingWizard, previews: &PreviewStore, n: usize) {
    for i in 0..n {
        let image = PreviewImage::new(Bytes::from_static(b"\xff\xd8\xff\xe0jpeg"), "image/jpeg")
            .unwrap();
        let handle = previews.acquire(image).await;
        wizard
            .attach_photo(PhotoRef {
                handle,
                file_name: format!("photo-{i}.jpg"),
            })
            .unwrap();
    }
}

fn details() -> ListingDetails {
    ListingDetails {
        title: "iPhone 14 Pro, Deep Purple".to_string(),
        size: "256GB".to_string(),
        condition: Some(Condition::LikeNew),
        ..ListingDetails::default()
    }
}

fn pricing(price: i64) -> ListingPricing {
    ListingPricing {
        price: Some(Decimal::from(price)),
        ..ListingPricing::default()
    }
}

/// Walk a wizard all the way to Review.
async fn filled(previews: &PreviewStore) -> ListingWizard {
    let mut wizard = ListingWizard::new();
    wizard.select_category(Category::IPhone).unwrap();
    attach(&mut wizard, previews, 3).await;
    assert!(wizard.advance());
    wizard.update_details(details()).unwrap();
    assert!(wizard.advance());
    wizard.update_pricing(pricing(64_000)).unwrap();
    assert!(wizard.advance());
    wizard
}

#[tokio::test]
async fn test_full_flow_reaches_review_and_publishes() {
    let previews = PreviewStore::default();
    let mut wizard = filled(&previews).await;
    assert_eq!(wizard.step(), WizardStep::Review);
    assert_eq!(previews.len().await, 3);

    let draft = wizard.draft().unwrap();
    assert_eq!(draft.category, Category::IPhone);
    assert_eq!(draft.photos.len(), 3);
    assert_eq!(draft.price, Decimal::from(64_000));

    let released = wizard.complete().unwrap();
    assert_eq!(released.len(), 3);
    assert_eq!(wizard.step(), WizardStep::Submitted);
    assert!(wizard.photos().is_empty());
    assert_eq!(wizard.category(), None);

    previews
        .release_all(released.into_iter().map(|p| p.handle))
        .await;
    assert_eq!(previews.len().await, 0);

    wizard.list_another().unwrap();
    assert_eq!(wizard.step(), WizardStep::Category);
}

#[tokio::test]
async fn test_photos_gate_needs_three() {
    let previews = PreviewStore::default();
    let mut wizard = ListingWizard::new();
    wizard.select_category(Category::MacBook).unwrap();

    attach(&mut wizard, &previews, 2).await;
    assert!(!wizard.can_proceed());
    assert!(!wizard.advance());
    assert_eq!(wizard.step(), WizardStep::Photos);

    attach(&mut wizard, &previews, 1).await;
    assert!(wizard.advance());
    assert_eq!(wizard.step(), WizardStep::Details);
}

#[tokio::test]
async fn test_photo_limit() {
    let previews = PreviewStore::default();
    let mut wizard = ListingWizard::new();
    wizard.select_category(Category::IPad).unwrap();
    attach(&mut wizard, &previews, MAX_PHOTOS).await;
    assert!(!wizard.has_photo_room());

    let image = PreviewImage::new(Bytes::from_static(b"png"), "image/png").unwrap();
    let handle = previews.acquire(image).await;
    let err = wizard
        .attach_photo(PhotoRef {
            handle,
            file_name: "one-too-many.png".to_string(),
        })
        .unwrap_err();
    assert_eq!(err, WizardError::PhotoLimit);
    assert_eq!(wizard.photos().len(), MAX_PHOTOS);
}

#[tokio::test]
async fn test_remove_photo_hands_back_handle() {
    let previews = PreviewStore::default();
    let mut wizard = ListingWizard::new();
    wizard.select_category(Category::Watch).unwrap();
    attach(&mut wizard, &previews, 3).await;

    let second = wizard.photos()[1].clone();
    let removed = wizard.remove_photo(1).unwrap();
    assert_eq!(removed, second);
    previews.release(removed.handle).await;

    assert_eq!(wizard.photos().len(), 2);
    assert!(previews.get(second.handle).await.is_none());
    assert_eq!(
        wizard.remove_photo(5).unwrap_err(),
        WizardError::NoSuchPhoto(5)
    );
}

#[tokio::test]
async fn test_back_keeps_fields_and_edits_only_on_owning_step() {
    let previews = PreviewStore::default();
    let mut wizard = filled(&previews).await;

    // Review owns no fields
    assert!(matches!(
        wizard.update_pricing(pricing(1)),
        Err(WizardError::WrongStep { .. })
    ));

    assert!(wizard.back());
    assert_eq!(wizard.step(), WizardStep::Pricing);
    assert_eq!(wizard.pricing().price, Some(Decimal::from(64_000)));
    assert_eq!(wizard.details().title, "iPhone 14 Pro, Deep Purple");
}

#[tokio::test]
async fn test_reset_returns_every_photo() {
    let previews = PreviewStore::default();
    let mut wizard = filled(&previews).await;

    let photos = wizard.reset();
    assert_eq!(photos.len(), 3);
    assert_eq!(wizard, ListingWizard::new());

    previews
        .release_all(photos.into_iter().map(|p| p.handle))
        .await;
    assert_eq!(previews.len().await, 0);
}

#[test]
fn test_unsupported_image_rejected() {
    let err = PreviewImage::new(Bytes::from_static(b"GIF89a"), "image/gif").unwrap_err();
    assert!(matches!(err, WizardError::UnsupportedImage(_)));
}

#[tokio::test]
async fn test_fee_breakdown_on_review() {
    let previews = PreviewStore::default();
    let wizard = filled(&previews).await;

    let fees = wizard.fees().unwrap();
    assert_eq!(fees.platform_fee.display(), "₹4480");
    assert_eq!(fees.seller_earns.display(), "₹59520");
}

#[tokio::test]
async fn test_out_of_range_price_stays_on_pricing() {
    let previews = PreviewStore::default();
    let mut wizard = filled(&previews).await;
    assert!(wizard.back());

    let err = wizard
        .update_pricing(pricing(MAX_PRICE_RUPEES + 1))
        .unwrap_err();
    assert_eq!(
        err,
        WizardError::AmountTooLarge {
            max: MAX_PRICE_RUPEES
        }
    );
    assert_eq!(wizard.pricing().price, Some(Decimal::from(64_000)));
}
