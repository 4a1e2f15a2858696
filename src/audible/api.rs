//! Typed client for the Audible REST API.
//!
//! Two endpoints matter here: the library listing plus per-book metadata on
//! `api.audible.<domain>/1.0`, and the annotation "sidecar" service on
//! `cde-ta-g7g.amazon.com`, which is the same backend the Audible apps use
//! for clips and notes.

use std::collections::HashMap;

use reqwest::StatusCode;
use reqwest::blocking::{Client, Response};
use serde::Deserialize;
use tracing::debug;

use crate::config::AmazonAuth;
use crate::model::{Annotation, Chapter};
use crate::sync::source::SourceError;
use crate::util::format_sidecar_date;

const SIDECAR_URL: &str = "https://cde-ta-g7g.amazon.com/FionaCDEServiceEngine/sidecar";

/// TLD of the Audible API host for a marketplace country code.
fn api_domain(country_code: &str) -> &'static str {
    match country_code {
        "ca" => "ca",
        "uk" => "co.uk",
        "au" => "com.au",
        "fr" => "fr",
        "de" => "de",
        "es" => "es",
        "jp" => "co.jp",
        "it" => "it",
        "in" => "in",
        _ => "com",
    }
}

// ── Response types ────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct LibraryResponse {
    items: Vec<LibraryItem>,
}

#[derive(Debug, Deserialize)]
pub struct LibraryItem {
    pub asin: String,
    pub title: String,
    #[serde(default)]
    pub subtitle: Option<String>,
    #[serde(default)]
    pub authors: Vec<Person>,
    #[serde(default)]
    pub product_images: HashMap<String, String>,
    #[serde(default)]
    pub pdf_url: Option<String>,
    #[serde(default)]
    pub publication_datetime: Option<String>,
    #[serde(default)]
    pub purchase_date: Option<String>,
}

impl LibraryItem {
    /// All authors joined into one comma-separated string.
    #[must_use]
    pub fn author_string(&self) -> String {
        self.authors
            .iter()
            .map(|a| a.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// The 500px cover image, the size the library listing always carries.
    #[must_use]
    pub fn cover_image(&self) -> String {
        self.product_images.get("500").cloned().unwrap_or_default()
    }
}

#[derive(Debug, Deserialize)]
pub struct Person {
    pub name: String,
}

#[derive(Debug, Deserialize)]
struct MetadataResponse {
    content_metadata: ContentMetadata,
}

#[derive(Debug, Default, Deserialize)]
struct ContentMetadata {
    #[serde(default)]
    last_position_heard: Option<LastPositionHeard>,
    #[serde(default)]
    chapter_info: Option<ChapterInfo>,
}

#[derive(Debug, Deserialize)]
struct LastPositionHeard {
    #[serde(default)]
    last_updated: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChapterInfo {
    chapters: Vec<ApiChapter>,
}

#[derive(Debug, Deserialize)]
struct ApiChapter {
    title: String,
    start_offset_ms: u64,
    length_ms: u64,
    #[serde(default)]
    chapters: Option<Vec<ApiChapter>>,
}

impl ApiChapter {
    fn into_chapter(self) -> Chapter {
        Chapter {
            title: self.title,
            start_ms: Some(self.start_offset_ms),
            end_ms: Some(self.start_offset_ms + self.length_ms),
            subchapters: self
                .chapters
                .map(|subs| subs.into_iter().map(Self::into_chapter).collect()),
        }
    }
}

#[derive(Debug, Deserialize)]
struct SidecarResponse {
    md5: String,
    payload: SidecarPayload,
}

#[derive(Debug, Default, Deserialize)]
struct SidecarPayload {
    #[serde(default)]
    records: Vec<SidecarRecord>,
}

#[derive(Debug, Deserialize)]
struct SidecarRecord {
    record_type: String,
    #[serde(default)]
    metadata: Option<SidecarMetadata>,
    creation_time: String,
    last_modification_time: String,
    start_position: MsOffset,
    end_position: MsOffset,
}

#[derive(Debug, Default, Deserialize)]
struct SidecarMetadata {
    #[serde(default)]
    note: Option<String>,
}

/// Millisecond offset that the sidecar service serves sometimes as a JSON
/// number and sometimes as a string.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum MsOffset {
    Number(u64),
    Text(String),
}

impl MsOffset {
    fn as_ms(&self) -> Option<u64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(s) => s.parse().ok(),
        }
    }
}

// ── Client ────────────────────────────────────────────────────

/// Blocking client authenticated with the device access token.
pub struct ApiClient {
    http: Client,
    base_url: String,
    access_token: String,
}

impl ApiClient {
    /// Build a client for the marketplace named by `country_code`.
    ///
    /// # Errors
    ///
    /// `SourceError::Fetch` if the underlying HTTP client cannot be built.
    pub fn new(auth: &AmazonAuth, country_code: &str) -> Result<Self, SourceError> {
        let http = Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| SourceError::Fetch(format!("cannot build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: format!("https://api.audible.{}/1.0", api_domain(country_code)),
            access_token: auth.access_token.clone(),
        })
    }

    fn get(&self, url: &str, params: &[(&str, &str)]) -> Result<Response, SourceError> {
        debug!(url, "audible api request");
        let response = self
            .http
            .get(url)
            .query(params)
            .header("Authorization", format!("Bearer {}", self.access_token))
            .header("client-id", "0")
            .send()
            .map_err(|e| SourceError::Fetch(format!("request to {url} failed: {e}")))?;

        match response.status() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(SourceError::Auth(format!(
                "audible api rejected the access token ({})",
                response.status()
            ))),
            status if !status.is_success() => Err(SourceError::Fetch(format!(
                "audible api returned {status} for {url}"
            ))),
            _ => Ok(response),
        }
    }

    /// Every book in the account's library.
    ///
    /// # Errors
    ///
    /// `SourceError` on HTTP or decode failure.
    pub fn library(&self) -> Result<Vec<LibraryItem>, SourceError> {
        let url = format!("{}/library", self.base_url);
        let response: LibraryResponse = self
            .get(
                &url,
                &[
                    ("num_results", "1000"),
                    ("response_groups", "media,product_attrs,product_desc,pdf_url"),
                ],
            )?
            .json()
            .map_err(|e| SourceError::Fetch(format!("cannot decode library response: {e}")))?;
        Ok(response.items)
    }

    /// When the book was last listened to, as an RFC 2822 date.
    ///
    /// The library listing does not carry this, so it costs one metadata
    /// call per book. Books never opened yield an empty string.
    ///
    /// # Errors
    ///
    /// `SourceError` on HTTP or decode failure.
    pub fn last_opened_date(&self, asin: &str) -> Result<String, SourceError> {
        let metadata = self.metadata(asin, "last_position_heard")?;
        Ok(metadata
            .last_position_heard
            .and_then(|p| p.last_updated)
            .map(|d| format_sidecar_date(&d))
            .unwrap_or_default())
    }

    /// The book's table of contents, empty if the API has none.
    ///
    /// # Errors
    ///
    /// `SourceError` on HTTP or decode failure.
    pub fn chapters(&self, asin: &str) -> Result<Vec<Chapter>, SourceError> {
        let metadata = self.metadata(asin, "chapter_info")?;
        Ok(metadata
            .chapter_info
            .map(|info| {
                info.chapters
                    .into_iter()
                    .map(ApiChapter::into_chapter)
                    .collect()
            })
            .unwrap_or_default())
    }

    fn metadata(&self, asin: &str, response_groups: &str) -> Result<ContentMetadata, SourceError> {
        let url = format!("{}/content/{asin}/metadata", self.base_url);
        let response: MetadataResponse = self
            .get(&url, &[("response_groups", response_groups)])?
            .json()
            .map_err(|e| SourceError::Fetch(format!("cannot decode metadata for {asin}: {e}")))?;
        Ok(response.content_metadata)
    }

    /// The book's clips and notes, plus the sidecar's own content version.
    ///
    /// The sidecar answers 404 for books that were never annotated; that is
    /// an empty result, not a failure.
    ///
    /// # Errors
    ///
    /// `SourceError` on HTTP or decode failure.
    pub fn annotations(&self, asin: &str) -> Result<(Option<String>, Vec<Annotation>), SourceError> {
        debug!(url = SIDECAR_URL, asin, "audible sidecar request");
        let response = self
            .http
            .get(SIDECAR_URL)
            .query(&[("type", "AUDI"), ("key", asin)])
            .header("Authorization", format!("Bearer {}", self.access_token))
            .header("client-id", "0")
            .send()
            .map_err(|e| SourceError::Fetch(format!("sidecar request for {asin} failed: {e}")))?;

        match response.status() {
            StatusCode::NOT_FOUND => return Ok((None, Vec::new())),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                return Err(SourceError::Auth(format!(
                    "sidecar service rejected the access token ({})",
                    response.status()
                )));
            }
            status if !status.is_success() => {
                return Err(SourceError::Fetch(format!(
                    "sidecar service returned {status} for {asin}"
                )));
            }
            _ => {}
        }

        let sidecar: SidecarResponse = response
            .json()
            .map_err(|e| SourceError::Fetch(format!("cannot decode sidecar for {asin}: {e}")))?;

        let annotations = sidecar
            .payload
            .records
            .into_iter()
            .filter(|record| record.record_type == "audible.clip")
            .map(|record| Annotation {
                note: record.metadata.and_then(|m| m.note),
                clip_start_ms: record.start_position.as_ms(),
                clip_end_ms: record.end_position.as_ms(),
                created_at: Some(format_sidecar_date(&record.creation_time)),
                updated_at: Some(format_sidecar_date(&record.last_modification_time)),
                ..Annotation::default()
            })
            .collect();

        Ok((Some(sidecar.md5), annotations))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_domain_per_marketplace() {
        assert_eq!(api_domain("us"), "com");
        assert_eq!(api_domain("uk"), "co.uk");
        assert_eq!(api_domain("jp"), "co.jp");
    }

    #[test]
    fn test_library_item_author_string() {
        let item: LibraryItem = serde_json::from_str(
            r#"{
                "asin": "B000000000",
                "title": "A Title",
                "authors": [{"name": "First Author"}, {"name": "Second Author"}],
                "product_images": {"500": "https://img.example/500.jpg"}
            }"#,
        )
        .unwrap();

        assert_eq!(item.author_string(), "First Author, Second Author");
        assert_eq!(item.cover_image(), "https://img.example/500.jpg");
    }

    #[test]
    fn test_sidecar_record_accepts_string_offsets() {
        let sidecar: SidecarResponse = serde_json::from_str(
            r#"{
                "md5": "abc123",
                "payload": {
                    "records": [{
                        "record_type": "audible.clip",
                        "creation_time": "2023-05-01 10:20:30.000",
                        "last_modification_time": "2023-05-01 10:20:30.000",
                        "start_position": "15000",
                        "end_position": 45000
                    }]
                }
            }"#,
        )
        .unwrap();

        let record = &sidecar.payload.records[0];
        assert_eq!(record.start_position.as_ms(), Some(15_000));
        assert_eq!(record.end_position.as_ms(), Some(45_000));
    }

    #[test]
    fn test_nested_chapters_flatten_offsets() {
        let chapter = ApiChapter {
            title: "Part 1".to_string(),
            start_offset_ms: 0,
            length_ms: 60_000,
            chapters: Some(vec![ApiChapter {
                title: "Chapter 1".to_string(),
                start_offset_ms: 1_000,
                length_ms: 59_000,
                chapters: None,
            }]),
        };

        let converted = chapter.into_chapter();
        assert_eq!(converted.end_ms, Some(60_000));
        let subs = converted.subchapters.unwrap();
        assert_eq!(subs[0].start_ms, Some(1_000));
        assert_eq!(subs[0].end_ms, Some(60_000));
    }
}
