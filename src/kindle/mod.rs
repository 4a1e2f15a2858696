//! Kindle highlights exporter.
//!
//! Scrapes `read.amazon.com/notebook` with the browser cookies stored in the
//! auth file. Each book with annotations becomes one Markdown file; the book
//! metadata record is its change fingerprint, so a book re-opened on a later
//! day shows up stale and gets re-exported.

pub mod client;
pub mod notebook;

use std::collections::HashMap;

use tracing::{debug, info};

use crate::config::{AmazonAuth, Config};
use crate::error::Result;
use crate::model::Book;
use crate::model::markdown::{book_file_name, render_book};
use crate::sync::hash::content_hash;
use crate::sync::source::{ContentPayload, ContentSource, RemoteItem, SourceError};

/// Content source backed by the Kindle notebook website.
pub struct KindleSource {
    client: client::NotebookClient,
    /// Books from the last listing, keyed by ASIN.
    books: HashMap<String, Book>,
}

impl KindleSource {
    /// Build a source from the configured auth file.
    ///
    /// # Errors
    ///
    /// `Error::Config` for a missing/unreadable auth file,
    /// `Error::AdapterAuth` when it has no website cookies.
    pub fn new(config: &Config) -> Result<Self> {
        let auth_path = config.amazon_auth_path()?;
        let auth = AmazonAuth::load(&auth_path)?;
        let client = client::NotebookClient::new(&auth)?;

        Ok(Self {
            client,
            books: HashMap::new(),
        })
    }
}

impl ContentSource for KindleSource {
    fn label(&self) -> &'static str {
        "kindle"
    }

    fn list_items(&mut self) -> std::result::Result<Vec<RemoteItem>, SourceError> {
        let html = self.client.library_html()?;
        let books = notebook::parse_library(&html)?;
        info!(books = books.len(), "fetched kindle notebook library");

        self.books.clear();
        let items = books
            .into_iter()
            .map(|book| {
                let item = RemoteItem {
                    id: book.asin.clone(),
                    title: book.title.clone(),
                    fingerprint: content_hash(&book),
                };
                self.books.insert(book.asin.clone(), book);
                item
            })
            .collect();

        Ok(items)
    }

    fn fetch_content(
        &mut self,
        item: &RemoteItem,
    ) -> std::result::Result<ContentPayload, SourceError> {
        let book = self.books.get(&item.id).ok_or_else(|| {
            SourceError::Fetch(format!("book {} missing from the listing", item.id))
        })?;

        let annotations = self.client.annotations(&item.id)?;
        debug!(
            asin = %item.id,
            annotations = annotations.len(),
            "fetched kindle annotations"
        );

        Ok(ContentPayload {
            file_name: book_file_name(book),
            content: render_book(book, None, &annotations, None),
        })
    }
}
