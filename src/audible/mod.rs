//! Audible library exporter.
//!
//! Each library book becomes one Markdown file with its metadata, table of
//! contents, and any clips/notes made in the Audible apps. The change
//! fingerprint covers the book metadata record plus the annotation sidecar
//! version, so both re-listening to a book (which moves `last_opened_date`)
//! and editing a clip or note mark it for re-export.

pub mod api;

use std::collections::HashMap;

use tracing::{debug, info};

use crate::config::{AmazonAuth, Config};
use crate::error::{Error, Result};
use crate::model::markdown::{book_file_name, render_book};
use crate::model::{Annotation, Book};
use crate::sync::hash::content_hash;
use crate::sync::source::{ContentPayload, ContentSource, RemoteItem, SourceError};
use crate::util::extract_date;

/// One book from the last listing, with its annotation sidecar.
///
/// The sidecar is fetched during listing because its version participates
/// in the fingerprint; keeping the records avoids a second fetch when the
/// book is exported.
struct ListedBook {
    book: Book,
    annotation_version: Option<String>,
    annotations: Vec<Annotation>,
}

/// Content source backed by the Audible API.
pub struct AudibleSource {
    client: api::ApiClient,
    /// Books from the last listing, keyed by ASIN.
    books: HashMap<String, ListedBook>,
}

impl AudibleSource {
    /// Build a source from the configured auth file.
    ///
    /// # Errors
    ///
    /// `Error::Config` for a missing/unreadable auth file,
    /// `Error::AdapterAuth` for an expired token.
    pub fn new(config: &Config) -> Result<Self> {
        let auth_path = config.amazon_auth_path()?;
        let auth = AmazonAuth::load(&auth_path)?;
        if auth.is_expired() {
            return Err(Error::AdapterAuth(format!(
                "access token in {} has expired",
                auth_path.display()
            )));
        }

        let client = api::ApiClient::new(&auth, &config.amazon.country_code)?;
        Ok(Self {
            client,
            books: HashMap::new(),
        })
    }
}

/// Change-detection value for one book.
///
/// Hashes the whole metadata record together with the sidecar version, so
/// an annotation edited without touching the playback position still
/// changes the fingerprint.
fn fingerprint(book: &Book, annotation_version: Option<&str>) -> String {
    content_hash(&(book, annotation_version))
}

impl ContentSource for AudibleSource {
    fn label(&self) -> &'static str {
        "audible"
    }

    fn list_items(&mut self) -> std::result::Result<Vec<RemoteItem>, SourceError> {
        let library = self.client.library()?;
        info!(books = library.len(), "fetched audible library");

        let mut items = Vec::with_capacity(library.len());
        self.books.clear();

        for entry in library {
            // The listing has no last-opened time or annotation state; it
            // takes one metadata call and one sidecar call per book.
            let last_opened_date = self.client.last_opened_date(&entry.asin)?;
            let (annotation_version, annotations) = self.client.annotations(&entry.asin)?;

            let book = Book {
                asin: entry.asin.clone(),
                title: entry.title.clone(),
                subtitle: entry.subtitle.clone(),
                author: entry.author_string(),
                image_url: entry.cover_image(),
                pdf_url: entry.pdf_url.clone(),
                publication_date: entry
                    .publication_datetime
                    .as_deref()
                    .map(extract_date),
                purchase_date: entry.purchase_date.as_deref().map(extract_date),
                last_opened_date,
            };

            items.push(RemoteItem {
                id: book.asin.clone(),
                title: book.title.clone(),
                fingerprint: fingerprint(&book, annotation_version.as_deref()),
            });
            self.books.insert(
                book.asin.clone(),
                ListedBook {
                    book,
                    annotation_version,
                    annotations,
                },
            );
        }

        Ok(items)
    }

    fn fetch_content(
        &mut self,
        item: &RemoteItem,
    ) -> std::result::Result<ContentPayload, SourceError> {
        let listed = self.books.get(&item.id).ok_or_else(|| {
            SourceError::Fetch(format!("book {} missing from the listing", item.id))
        })?;

        let chapters = self.client.chapters(&item.id)?;
        debug!(
            asin = %item.id,
            chapters = chapters.len(),
            annotations = listed.annotations.len(),
            "fetched audible book content"
        );

        let content = render_book(
            &listed.book,
            if chapters.is_empty() {
                None
            } else {
                Some(chapters.as_slice())
            },
            &listed.annotations,
            listed.annotation_version.as_deref(),
        );

        Ok(ContentPayload {
            file_name: book_file_name(&listed.book),
            content,
        })
    }
}
