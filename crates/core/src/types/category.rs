//! Marketplace categories and their listing schemas.
//!
//! Every category carries a [`CategorySchema`] describing what the listing
//! form asks for: the label and options of the size field plus any
//! category-specific extra fields. Adding a category means adding a schema;
//! the `match` in [`Category::schema`] will not compile otherwise.

use serde::{Deserialize, Serialize};

/// A top-level marketplace category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "iPhone")]
    IPhone,
    #[serde(rename = "MacBook")]
    MacBook,
    #[serde(rename = "iPad")]
    IPad,
    #[serde(rename = "Watch")]
    Watch,
    #[serde(rename = "Accessories")]
    Accessories,
}

/// An optional category-specific attribute on a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtraField {
    /// Form and storage key.
    pub key: &'static str,
    /// Label shown to sellers and buyers.
    pub label: &'static str,
    /// Allowed values. Empty means free text.
    pub options: &'static [&'static str],
}

impl ExtraField {
    /// Whether `value` is acceptable for this field.
    #[must_use]
    pub fn accepts(&self, value: &str) -> bool {
        self.options.is_empty() || self.options.contains(&value)
    }
}

/// What the listing form collects for a category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategorySchema {
    /// Label of the size field ("Storage", "Case size", ...).
    pub size_label: &'static str,
    /// Allowed size values.
    pub size_options: &'static [&'static str],
    /// Extra attributes, all optional.
    pub extra_fields: &'static [ExtraField],
}

impl CategorySchema {
    /// Look up an extra field by key.
    #[must_use]
    pub fn field(&self, key: &str) -> Option<&ExtraField> {
        self.extra_fields.iter().find(|f| f.key == key)
    }
}

const STORAGE_SIZES: &[&str] = &["64GB", "128GB", "256GB", "512GB", "1TB"];

const IPHONE_SCHEMA: CategorySchema = CategorySchema {
    size_label: "Storage",
    size_options: STORAGE_SIZES,
    extra_fields: &[
        ExtraField {
            key: "model",
            label: "Model",
            options: &[],
        },
        ExtraField {
            key: "battery_health",
            label: "Battery health",
            options: &["100%", "90-99%", "80-89%", "Below 80%"],
        },
        ExtraField {
            key: "color",
            label: "Colour",
            options: &[],
        },
    ],
};

const MACBOOK_SCHEMA: CategorySchema = CategorySchema {
    size_label: "Storage",
    size_options: &["256GB", "512GB", "1TB", "2TB"],
    extra_fields: &[
        ExtraField {
            key: "chip",
            label: "Chip",
            options: &["Intel", "M1", "M2", "M3", "M4"],
        },
        ExtraField {
            key: "ram",
            label: "Memory",
            options: &["8GB", "16GB", "24GB", "32GB", "64GB"],
        },
        ExtraField {
            key: "screen",
            label: "Screen size",
            options: &["13\"", "14\"", "15\"", "16\""],
        },
        ExtraField {
            key: "battery_cycles",
            label: "Battery cycle count",
            options: &[],
        },
    ],
};

const IPAD_SCHEMA: CategorySchema = CategorySchema {
    size_label: "Storage",
    size_options: STORAGE_SIZES,
    extra_fields: &[
        ExtraField {
            key: "connectivity",
            label: "Connectivity",
            options: &["Wi-Fi", "Wi-Fi + Cellular"],
        },
        ExtraField {
            key: "pencil",
            label: "Pencil included",
            options: &["Yes", "No"],
        },
    ],
};

const WATCH_SCHEMA: CategorySchema = CategorySchema {
    size_label: "Case size",
    size_options: &["38mm", "40mm", "41mm", "42mm", "44mm", "45mm", "46mm", "49mm"],
    extra_fields: &[
        ExtraField {
            key: "connectivity",
            label: "Connectivity",
            options: &["GPS", "GPS + Cellular"],
        },
        ExtraField {
            key: "band",
            label: "Band",
            options: &[],
        },
    ],
};

const ACCESSORIES_SCHEMA: CategorySchema = CategorySchema {
    size_label: "Size",
    size_options: &["One Size", "Small", "Medium", "Large"],
    extra_fields: &[ExtraField {
        key: "compatible_with",
        label: "Compatible with",
        options: &[],
    }],
};

impl Category {
    pub const ALL: [Self; 5] = [
        Self::IPhone,
        Self::MacBook,
        Self::IPad,
        Self::Watch,
        Self::Accessories,
    ];

    /// Display name, also the value stored in the `category` column.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::IPhone => "iPhone",
            Self::MacBook => "MacBook",
            Self::IPad => "iPad",
            Self::Watch => "Watch",
            Self::Accessories => "Accessories",
        }
    }

    /// URL-safe slug.
    #[must_use]
    pub const fn slug(self) -> &'static str {
        match self {
            Self::IPhone => "iphone",
            Self::MacBook => "macbook",
            Self::IPad => "ipad",
            Self::Watch => "watch",
            Self::Accessories => "accessories",
        }
    }

    /// Listing form schema for this category.
    #[must_use]
    pub const fn schema(self) -> &'static CategorySchema {
        match self {
            Self::IPhone => &IPHONE_SCHEMA,
            Self::MacBook => &MACBOOK_SCHEMA,
            Self::IPad => &IPAD_SCHEMA,
            Self::Watch => &WATCH_SCHEMA,
            Self::Accessories => &ACCESSORIES_SCHEMA,
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for Category {
    type Err = String;

    /// Accepts the display name or the slug, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|c| c.name().eq_ignore_ascii_case(s) || c.slug().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown category: {s}"))
    }
}
