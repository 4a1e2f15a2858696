//! Data types shared by the Amazon-backed exporters (Audible and Kindle).

pub mod markdown;

use serde::{Deserialize, Serialize};

/// A book with its remote metadata.
///
/// Authors are concatenated into a single comma-separated string for
/// simplicity; that is also how Kindle presents them.
///
/// Serialized whole as the item fingerprint: any metadata change (including
/// `last_opened_date`, which moves whenever the book is opened) marks the
/// book stale for the planner.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    /// Amazon Standard Identification Number; the stable item identity.
    pub asin: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub subtitle: Option<String>,
    pub author: String,

    /// Cover image URL. Amazon CDN links, not guaranteed to stay valid.
    pub image_url: String,

    /// URL for the accompanying PDF (Audible only). Accessing it typically
    /// requires session cookies, so it is recorded rather than downloaded.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub pdf_url: Option<String>,

    /// Publication date (Audible only).
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub publication_date: Option<String>,
    /// Purchase date (Audible only).
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub purchase_date: Option<String>,

    /// Last time the book was read (Kindle) or listened to (Audible).
    pub last_opened_date: String,
}

/// A chapter from an audiobook's table of contents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chapter {
    pub title: String,

    /// Clip offsets in milliseconds from the beginning of the audiobook.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub start_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub end_ms: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub subchapters: Option<Vec<Chapter>>,
}

/// A single annotation: a highlight, a note, or both (Kindle), or an audio
/// clip with an optional note (Audible).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotation {
    // Kindle
    pub highlight: Option<String>,
    pub highlight_color: Option<String>,

    // Kindle and Audible
    pub note: Option<String>,

    // Kindle. Location is always present there; page is not.
    pub location: Option<u32>,
    pub page: Option<u32>,

    // Audible clip offsets, milliseconds from the beginning.
    pub clip_start_ms: Option<u64>,
    pub clip_end_ms: Option<u64>,

    // Audible only
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}
