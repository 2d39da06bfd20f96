//! Listing status and item condition enums.

use serde::{Deserialize, Serialize};

/// Availability of a listing.
///
/// Only `Live` listings can be added to a cart. `Hold` marks an item that is
/// temporarily reserved; visitors can sign up to be notified when it frees up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProductStatus {
    #[default]
    Live,
    Hold,
    Sold,
}

impl ProductStatus {
    pub const ALL: [Self; 3] = [Self::Live, Self::Hold, Self::Sold];

    /// Whether a buyer can put the item in a cart.
    #[must_use]
    pub const fn is_purchasable(self) -> bool {
        matches!(self, Self::Live)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Live => "live",
            Self::Hold => "hold",
            Self::Sold => "sold",
        }
    }

    /// Human-readable badge label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Live => "Available",
            Self::Hold => "On hold",
            Self::Sold => "Sold",
        }
    }
}

impl std::fmt::Display for ProductStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ProductStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "live" => Ok(Self::Live),
            "hold" => Ok(Self::Hold),
            "sold" => Ok(Self::Sold),
            other => Err(format!("invalid product status: {other}")),
        }
    }
}

/// Physical condition of a second-hand item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Condition {
    New,
    LikeNew,
    GentlyUsed,
    Worn,
}

impl Condition {
    pub const ALL: [Self; 4] = [Self::New, Self::LikeNew, Self::GentlyUsed, Self::Worn];

    /// Wire value stored in the `condition` column.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::New => "new",
            Self::LikeNew => "like-new",
            Self::GentlyUsed => "gently-used",
            Self::Worn => "worn",
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::New => "New",
            Self::LikeNew => "Like New",
            Self::GentlyUsed => "Gently Used",
            Self::Worn => "Worn",
        }
    }
}

impl std::fmt::Display for Condition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl std::str::FromStr for Condition {
    type Err = String;

    /// Accepts wire values (`like-new`) as well as labels (`Like new`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace([' ', '_'], "-");
        match normalized.as_str() {
            "new" | "new-with-tags" => Ok(Self::New),
            "like-new" => Ok(Self::LikeNew),
            "gently-used" => Ok(Self::GentlyUsed),
            "worn" => Ok(Self::Worn),
            _ => Err(format!("invalid condition: {s}")),
        }
    }
}
