//! Session client for the Kindle notebook website.

use reqwest::blocking::Client;
use tracing::debug;

use crate::config::AmazonAuth;
use crate::model::Annotation;
use crate::sync::source::SourceError;

use super::notebook;

const NOTEBOOK_URL: &str = "https://read.amazon.com/notebook";

/// Blocking client that replays the browser cookies from the auth file.
pub struct NotebookClient {
    http: Client,
    cookie_header: String,
}

impl NotebookClient {
    /// Build a client from the auth file's website cookies.
    ///
    /// # Errors
    ///
    /// `SourceError::Auth` if the auth file has no cookies,
    /// `SourceError::Fetch` if the HTTP client cannot be built.
    pub fn new(auth: &AmazonAuth) -> Result<Self, SourceError> {
        let cookie_header = auth
            .cookie_header()
            .map_err(|e| SourceError::Auth(e.to_string()))?;

        let http = Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| SourceError::Fetch(format!("cannot build HTTP client: {e}")))?;

        Ok(Self {
            http,
            cookie_header,
        })
    }

    fn get_page(&self, url: &str, params: &[(&str, &str)]) -> Result<String, SourceError> {
        debug!(url, "kindle notebook request");
        let response = self
            .http
            .get(url)
            .query(params)
            .header("Cookie", &self.cookie_header)
            .send()
            .map_err(|e| SourceError::Fetch(format!("request to {url} failed: {e}")))?;

        // An expired session redirects to the Amazon sign-in page instead of
        // answering with an error status.
        if response.url().path().contains("signin") || response.url().path().contains("/ap/") {
            return Err(SourceError::Auth(
                "kindle notebook redirected to sign-in; the session cookies have expired"
                    .to_string(),
            ));
        }

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Fetch(format!(
                "kindle notebook returned {status} for {url}"
            )));
        }

        response
            .text()
            .map_err(|e| SourceError::Fetch(format!("cannot read response from {url}: {e}")))
    }

    /// The library listing page.
    ///
    /// # Errors
    ///
    /// `SourceError` on HTTP failure or an expired session.
    pub fn library_html(&self) -> Result<String, SourceError> {
        self.get_page(NOTEBOOK_URL, &[])
    }

    /// All annotations of one book, following the pagination tokens until
    /// the listing is exhausted.
    ///
    /// # Errors
    ///
    /// `SourceError` on HTTP failure, expired session, or unexpected markup.
    pub fn annotations(&self, asin: &str) -> Result<Vec<Annotation>, SourceError> {
        let mut annotations = Vec::new();
        let mut cursor: Option<(String, String)> = None;
        let mut first_page = true;

        while first_page || cursor.is_some() {
            first_page = false;

            let html = match &cursor {
                None => self.get_page(NOTEBOOK_URL, &[("asin", asin)])?,
                Some((token, limit_state)) => self.get_page(
                    NOTEBOOK_URL,
                    &[
                        ("asin", asin),
                        ("token", token),
                        ("contentLimitState", limit_state),
                    ],
                )?,
            };

            let page = notebook::parse_annotations_page(&html)?;
            annotations.extend(page.annotations);

            cursor = page
                .next_page_token
                .map(|token| (token, page.content_limit_state.unwrap_or_default()));
        }

        Ok(annotations)
    }
}
