//! Ephemeral storage for listing photos between upload and publish.
//!
//! Attached photos live here, keyed by an opaque handle, until the wizard
//! publishes, removes the photo or resets. Entries also expire on their own,
//! so abandoned wizards don't hold memory forever.

use std::time::Duration;

use axum::body::Bytes;
use moka::future::Cache;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::WizardError;

/// Largest accepted photo.
pub const MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;

/// How long an unreleased preview survives.
pub const PREVIEW_TTL: Duration = Duration::from_secs(60 * 60);

/// Accepted photo types and the file extension used when uploading.
const IMAGE_TYPES: &[(&str, &str)] = &[
    ("image/jpeg", "jpg"),
    ("image/png", "png"),
    ("image/webp", "webp"),
    ("image/heic", "heic"),
];

/// Opaque handle to a stored preview.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PreviewHandle(Uuid);

impl PreviewHandle {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for PreviewHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for PreviewHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl std::str::FromStr for PreviewHandle {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// Photo bytes held for preview and later upload.
#[derive(Debug, Clone)]
pub struct PreviewImage {
    pub bytes: Bytes,
    pub content_type: String,
}

impl PreviewImage {
    /// Check type and size.
    pub fn new(bytes: Bytes, content_type: &str) -> Result<Self, WizardError> {
        let content_type = content_type.trim().to_ascii_lowercase();
        if extension_for(&content_type).is_none() {
            return Err(WizardError::UnsupportedImage(content_type));
        }
        if bytes.is_empty() {
            return Err(WizardError::EmptyImage);
        }
        if bytes.len() > MAX_IMAGE_BYTES {
            return Err(WizardError::ImageTooLarge {
                max_bytes: MAX_IMAGE_BYTES,
            });
        }
        Ok(Self {
            bytes,
            content_type,
        })
    }

    /// File extension for uploads.
    #[must_use]
    pub fn extension(&self) -> &'static str {
        extension_for(&self.content_type).unwrap_or("bin")
    }
}

fn extension_for(content_type: &str) -> Option<&'static str> {
    IMAGE_TYPES
        .iter()
        .find(|(ty, _)| *ty == content_type)
        .map(|(_, ext)| *ext)
}

/// Preview storage shared by all sessions.
#[derive(Clone)]
pub struct PreviewStore {
    cache: Cache<PreviewHandle, PreviewImage>,
}

impl Default for PreviewStore {
    fn default() -> Self {
        Self::new(PREVIEW_TTL)
    }
}

impl PreviewStore {
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            cache: Cache::builder()
                .max_capacity(512 * 1024 * 1024)
                .weigher(|_, image: &PreviewImage| {
                    u32::try_from(image.bytes.len()).unwrap_or(u32::MAX)
                })
                .time_to_live(ttl)
                .build(),
        }
    }

    /// Store an image and hand out its handle.
    pub async fn acquire(&self, image: PreviewImage) -> PreviewHandle {
        let handle = PreviewHandle::new();
        self.cache.insert(handle, image).await;
        handle
    }

    pub async fn get(&self, handle: PreviewHandle) -> Option<PreviewImage> {
        self.cache.get(&handle).await
    }

    /// Drop a preview. Releasing an unknown or expired handle is a no-op.
    pub async fn release(&self, handle: PreviewHandle) {
        self.cache.invalidate(&handle).await;
    }

    pub async fn release_all<I>(&self, handles: I)
    where
        I: IntoIterator<Item = PreviewHandle>,
    {
        for handle in handles {
            self.release(handle).await;
        }
    }

    /// Number of live previews.
    pub async fn len(&self) -> u64 {
        self.cache.run_pending_tasks().await;
        self.cache.entry_count()
    }
}
