//! Seller listing wizard.
//!
//! A linear five-step form: Category → Photos → Details → Pricing → Review,
//! ending in Submitted once published. Each step has a predicate that gates
//! moving forward:
//!
//! | Step     | Satisfied when                          |
//! |----------|-----------------------------------------|
//! | Category | a category is selected                  |
//! | Photos   | at least [`MIN_PHOTOS`] are attached    |
//! | Details  | title, size and condition are filled in |
//! | Pricing  | price > 0                               |
//! | Review   | always                                  |
//!
//! Edits are accepted only on the step that owns the field, and advancing an
//! unsatisfied step does nothing. Together these keep the current step at or
//! before the first unsatisfied one.
//!
//! The wizard lives in the session. Photo bytes live in the shared
//! [`PreviewStore`]; the wizard only holds handles, and every path that drops
//! a photo hands its handle back for release.

mod form;
mod previews;
mod publish;

pub use form::{
    DEFAULT_BRAND, FeeBreakdown, LISTING_ERAS, ListingDetails, ListingDraft, ListingPricing,
    MAX_DESCRIPTION_CHARS, MAX_PRICE_RUPEES, MAX_TITLE_CHARS, PLATFORM_FEE_PERCENT,
};
pub use previews::{
    MAX_IMAGE_BYTES, PREVIEW_TTL, PreviewHandle, PreviewImage, PreviewStore,
};
pub use publish::{ListingStore, PublishError, publish};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use thryft_core::Category;

/// Most photos a listing can carry.
pub const MAX_PHOTOS: usize = 6;

/// Fewest photos needed to leave the Photos step.
pub const MIN_PHOTOS: usize = 3;

/// Wizard errors. None of these change wizard state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WizardError {
    #[error("That can't be changed on the {current} step")]
    WrongStep { current: WizardStep },

    #[error("You can add up to {MAX_PHOTOS} photos")]
    PhotoLimit,

    #[error("No photo at position {0}")]
    NoSuchPhoto(usize),

    #[error("Unsupported image type: {0}")]
    UnsupportedImage(String),

    #[error("Photo is empty")]
    EmptyImage,

    #[error("Photo is larger than {} MB", max_bytes / (1024 * 1024))]
    ImageTooLarge { max_bytes: usize },

    #[error("Title must be at most {max} characters")]
    TitleTooLong { max: usize },

    #[error("Description must be at most {max} characters")]
    DescriptionTooLong { max: usize },

    #[error("Unknown field: {0}")]
    UnknownExtraField(String),

    #[error("{value} is not a valid {field}")]
    InvalidOption { field: String, value: String },

    #[error("Amounts can't be negative")]
    NegativeAmount,

    #[error("Amounts can be at most ₹{max}")]
    AmountTooLarge { max: i64 },

    #[error("Finish the {0} step first")]
    Incomplete(WizardStep),

    #[error("This listing was already published")]
    AlreadySubmitted,
}

/// A wizard step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum WizardStep {
    #[default]
    Category,
    Photos,
    Details,
    Pricing,
    Review,
    Submitted,
}

impl WizardStep {
    /// The editable steps, in order.
    pub const FLOW: [Self; 5] = [
        Self::Category,
        Self::Photos,
        Self::Details,
        Self::Pricing,
        Self::Review,
    ];

    /// Zero-based position.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Category => 0,
            Self::Photos => 1,
            Self::Details => 2,
            Self::Pricing => 3,
            Self::Review => 4,
            Self::Submitted => 5,
        }
    }

    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::Category => "Category",
            Self::Photos => "Photos",
            Self::Details => "Details",
            Self::Pricing => "Pricing",
            Self::Review => "Review",
            Self::Submitted => "Submitted",
        }
    }

    const fn next(self) -> Option<Self> {
        match self {
            Self::Category => Some(Self::Photos),
            Self::Photos => Some(Self::Details),
            Self::Details => Some(Self::Pricing),
            Self::Pricing => Some(Self::Review),
            Self::Review | Self::Submitted => None,
        }
    }

    const fn prev(self) -> Option<Self> {
        match self {
            Self::Photos => Some(Self::Category),
            Self::Details => Some(Self::Photos),
            Self::Pricing => Some(Self::Details),
            Self::Review => Some(Self::Pricing),
            Self::Category | Self::Submitted => None,
        }
    }
}

impl std::fmt::Display for WizardStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.title())
    }
}

/// An attached photo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhotoRef {
    pub handle: PreviewHandle,
    pub file_name: String,
}

/// The listing wizard.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingWizard {
    step: WizardStep,
    category: Option<Category>,
    photos: Vec<PhotoRef>,
    details: ListingDetails,
    pricing: ListingPricing,
}

impl ListingWizard {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn step(&self) -> WizardStep {
        self.step
    }

    #[must_use]
    pub const fn category(&self) -> Option<Category> {
        self.category
    }

    #[must_use]
    pub fn photos(&self) -> &[PhotoRef] {
        &self.photos
    }

    #[must_use]
    pub const fn details(&self) -> &ListingDetails {
        &self.details
    }

    #[must_use]
    pub const fn pricing(&self) -> &ListingPricing {
        &self.pricing
    }

    fn require_step(&self, owner: WizardStep) -> Result<(), WizardError> {
        match self.step {
            WizardStep::Submitted => Err(WizardError::AlreadySubmitted),
            current if current == owner => Ok(()),
            current => Err(WizardError::WrongStep { current }),
        }
    }

    /// Pick a category and move to Photos.
    ///
    /// Switching to a different category clears the size and extras, which
    /// belong to the old category's schema.
    pub fn select_category(&mut self, category: Category) -> Result<(), WizardError> {
        self.require_step(WizardStep::Category)?;
        if self.category != Some(category) {
            self.details.size.clear();
            self.details.extras.clear();
        }
        self.category = Some(category);
        self.step = WizardStep::Photos;
        Ok(())
    }

    /// Attach a photo.
    pub fn attach_photo(&mut self, photo: PhotoRef) -> Result<(), WizardError> {
        self.require_step(WizardStep::Photos)?;
        if self.photos.len() >= MAX_PHOTOS {
            return Err(WizardError::PhotoLimit);
        }
        self.photos.push(photo);
        Ok(())
    }

    /// Whether another photo fits.
    #[must_use]
    pub fn has_photo_room(&self) -> bool {
        self.photos.len() < MAX_PHOTOS
    }

    /// Detach the photo at `index`. The caller releases its preview.
    pub fn remove_photo(&mut self, index: usize) -> Result<PhotoRef, WizardError> {
        self.require_step(WizardStep::Photos)?;
        if index >= self.photos.len() {
            return Err(WizardError::NoSuchPhoto(index));
        }
        Ok(self.photos.remove(index))
    }

    /// Replace the Details fields.
    pub fn update_details(&mut self, details: ListingDetails) -> Result<(), WizardError> {
        self.require_step(WizardStep::Details)?;
        self.details = details.validated(self.category)?;
        Ok(())
    }

    /// Replace the Pricing fields.
    pub fn update_pricing(&mut self, pricing: ListingPricing) -> Result<(), WizardError> {
        self.require_step(WizardStep::Pricing)?;
        self.pricing = pricing.validated()?;
        Ok(())
    }

    /// The gating predicate of a step.
    #[must_use]
    pub fn is_satisfied(&self, step: WizardStep) -> bool {
        match step {
            WizardStep::Category => self.category.is_some(),
            WizardStep::Photos => self.photos.len() >= MIN_PHOTOS,
            WizardStep::Details => self.details.is_complete(),
            WizardStep::Pricing => self.pricing.is_complete(),
            WizardStep::Review => true,
            WizardStep::Submitted => false,
        }
    }

    /// Whether the current step lets the user continue.
    #[must_use]
    pub fn can_proceed(&self) -> bool {
        self.step.next().is_some() && self.is_satisfied(self.step)
    }

    /// First step in the flow whose predicate fails, or Review.
    #[must_use]
    pub fn first_unsatisfied(&self) -> WizardStep {
        WizardStep::FLOW
            .into_iter()
            .find(|step| !self.is_satisfied(*step))
            .unwrap_or(WizardStep::Review)
    }

    /// Move forward if the current step is satisfied. Returns whether it moved.
    pub fn advance(&mut self) -> bool {
        if !self.can_proceed() {
            return false;
        }
        match self.step.next() {
            Some(next) => {
                self.step = next;
                true
            }
            None => false,
        }
    }

    /// Move back one step. Not possible from Category or Submitted.
    pub fn back(&mut self) -> bool {
        match self.step.prev() {
            Some(prev) => {
                self.step = prev;
                true
            }
            None => false,
        }
    }

    /// Fee split for the current price.
    #[must_use]
    pub fn fees(&self) -> Option<FeeBreakdown> {
        self.pricing.fees()
    }

    /// Validate everything and produce the draft to publish.
    pub fn draft(&self) -> Result<ListingDraft, WizardError> {
        self.require_step(WizardStep::Review)?;

        let first = self.first_unsatisfied();
        if first != WizardStep::Review {
            return Err(WizardError::Incomplete(first));
        }

        let (Some(category), Some(price)) = (self.category, self.pricing.price) else {
            return Err(WizardError::Incomplete(first));
        };

        Ok(ListingDraft {
            category,
            photos: self.photos.clone(),
            details: self.details.clone(),
            price,
            pricing: self.pricing.clone(),
        })
    }

    /// Mark as published: go to Submitted and clear every field.
    ///
    /// Returns the photos whose previews should be released.
    pub fn complete(&mut self) -> Result<Vec<PhotoRef>, WizardError> {
        self.require_step(WizardStep::Review)?;
        let photos = std::mem::take(self).photos;
        self.step = WizardStep::Submitted;
        Ok(photos)
    }

    /// Start over after publishing.
    pub fn list_another(&mut self) -> Result<(), WizardError> {
        if self.step != WizardStep::Submitted {
            return Err(WizardError::WrongStep { current: self.step });
        }
        *self = Self::new();
        Ok(())
    }

    /// Throw everything away. Returns the photos to release.
    pub fn reset(&mut self) -> Vec<PhotoRef> {
        std::mem::take(self).photos
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;
    use thryft_core::Condition;

    use super::*;

    fn photo(n: usize) -> PhotoRef {
        PhotoRef {
            handle: PreviewHandle::new(),
            file_name: format!("{n}.jpg"),
        }
    }

    fn details() -> ListingDetails {
        ListingDetails {
            title: "iPhone 13 Pro".to_string(),
            size: "256GB".to_string(),
            condition: Some(Condition::LikeNew),
            ..Default::default()
        }
    }

    fn pricing(price: i64) -> ListingPricing {
        ListingPricing {
            price: Some(Decimal::from(price)),
            ..Default::default()
        }
    }

    fn at_review() -> ListingWizard {
        let mut w = ListingWizard::new();
        w.select_category(Category::IPhone).unwrap();
        for n in 0..3 {
            w.attach_photo(photo(n)).unwrap();
        }
        assert!(w.advance());
        w.update_details(details()).unwrap();
        assert!(w.advance());
        w.update_pricing(pricing(42_000)).unwrap();
        assert!(w.advance());
        w
    }

    #[test]
    fn test_select_category_auto_advances() {
        let mut w = ListingWizard::new();
        assert!(!w.advance());
        w.select_category(Category::Watch).unwrap();
        assert_eq!(w.step(), WizardStep::Photos);
    }

    #[test]
    fn test_photos_gate() {
        let mut w = ListingWizard::new();
        w.select_category(Category::IPad).unwrap();
        w.attach_photo(photo(0)).unwrap();
        w.attach_photo(photo(1)).unwrap();
        assert!(!w.advance());
        assert_eq!(w.step(), WizardStep::Photos);
        w.attach_photo(photo(2)).unwrap();
        assert!(w.advance());
        assert_eq!(w.step(), WizardStep::Details);
    }

    #[test]
    fn test_photo_limit() {
        let mut w = ListingWizard::new();
        w.select_category(Category::IPad).unwrap();
        for n in 0..MAX_PHOTOS {
            w.attach_photo(photo(n)).unwrap();
        }
        assert!(!w.has_photo_room());
        assert_eq!(w.attach_photo(photo(9)), Err(WizardError::PhotoLimit));
        assert_eq!(w.photos().len(), MAX_PHOTOS);
    }

    #[test]
    fn test_remove_photo_bounds() {
        let mut w = ListingWizard::new();
        w.select_category(Category::IPad).unwrap();
        assert_eq!(w.remove_photo(0), Err(WizardError::NoSuchPhoto(0)));
        let first = photo(0);
        w.attach_photo(first.clone()).unwrap();
        assert_eq!(w.remove_photo(0).unwrap(), first);
        assert!(w.photos().is_empty());
    }

    #[test]
    fn test_edits_rejected_off_step() {
        let mut w = ListingWizard::new();
        assert_eq!(
            w.update_details(details()),
            Err(WizardError::WrongStep {
                current: WizardStep::Category
            })
        );
        assert_eq!(
            w.attach_photo(photo(0)),
            Err(WizardError::WrongStep {
                current: WizardStep::Category
            })
        );
        assert_eq!(w, ListingWizard::new());
    }

    #[test]
    fn test_back_is_unconditional_except_first() {
        let mut w = ListingWizard::new();
        assert!(!w.back());
        w.select_category(Category::MacBook).unwrap();
        assert!(w.back());
        assert_eq!(w.step(), WizardStep::Category);
    }

    #[test]
    fn test_changing_category_clears_size_and_extras() {
        let mut w = at_review();
        w.back();
        w.back();
        w.back();
        w.back();
        assert_eq!(w.step(), WizardStep::Category);

        w.select_category(Category::IPhone).unwrap();
        assert_eq!(w.details().size, "256GB");

        w.back();
        w.select_category(Category::Watch).unwrap();
        assert!(w.details().size.is_empty());
        assert_eq!(w.details().title, "iPhone 13 Pro");
        assert_eq!(w.photos().len(), 3);
    }

    #[test]
    fn test_full_run_submits_and_clears() {
        let mut w = at_review();
        assert_eq!(w.step(), WizardStep::Review);
        assert!(!w.advance());

        let draft = w.draft().unwrap();
        assert_eq!(draft.category, Category::IPhone);
        assert_eq!(draft.photos.len(), 3);

        let released = w.complete().unwrap();
        assert_eq!(released.len(), 3);
        assert_eq!(w.step(), WizardStep::Submitted);
        assert!(w.photos().is_empty());
        assert_eq!(w.category(), None);
        assert_eq!(w.update_pricing(pricing(1)), Err(WizardError::AlreadySubmitted));
        assert!(!w.back());

        w.list_another().unwrap();
        assert_eq!(w, ListingWizard::new());
    }

    #[test]
    fn test_draft_only_at_review() {
        let mut w = ListingWizard::new();
        w.select_category(Category::IPhone).unwrap();
        assert!(matches!(w.draft(), Err(WizardError::WrongStep { .. })));
        assert!(w.complete().is_err());
    }

    #[test]
    fn test_reset_returns_photos() {
        let mut w = ListingWizard::new();
        w.select_category(Category::Accessories).unwrap();
        w.attach_photo(photo(0)).unwrap();
        w.attach_photo(photo(1)).unwrap();
        assert_eq!(w.reset().len(), 2);
        assert_eq!(w, ListingWizard::new());
    }

    /// Small deterministic generator so the property test needs no extra crates.
    struct Lcg(u64);

    impl Lcg {
        fn next(&mut self) -> u64 {
            self.0 = self.0.wrapping_mul(6_364_136_223_846_793_005).wrapping_add(1);
            self.0 >> 33
        }
    }

    #[test]
    fn test_step_never_passes_first_unsatisfied() {
        for seed in 0..200 {
            let mut rng = Lcg(seed);
            let mut w = ListingWizard::new();
            for _ in 0..60 {
                let _ = match rng.next() % 9 {
                    0 => w
                        .select_category(Category::ALL[usize::try_from(rng.next() % 5).unwrap()])
                        .is_ok(),
                    1 | 2 => w.attach_photo(photo(0)).is_ok(),
                    3 => w.remove_photo(0).is_ok(),
                    4 => w.update_details(details()).is_ok(),
                    5 => w.update_pricing(pricing(i64::try_from(rng.next() % 3).unwrap())).is_ok(),
                    6 => w.back(),
                    7 => w.advance(),
                    _ => {
                        if w.draft().is_ok() {
                            w.complete().is_ok() && w.list_another().is_ok()
                        } else {
                            false
                        }
                    }
                };
                assert!(w.photos().len() <= MAX_PHOTOS);
                assert!(
                    w.step().index() <= w.first_unsatisfied().index(),
                    "seed {seed}: at {} but {} is unsatisfied",
                    w.step(),
                    w.first_unsatisfied()
                );
            }
        }
    }
}
