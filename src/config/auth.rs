//! Amazon device auth file.
//!
//! The auth file is the JSON produced by registering a virtual Audible
//! device (the format used by the `audible` ecosystem tools). Only the
//! fields this tool needs are deserialized; everything else in the file is
//! ignored.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use chrono::Utc;
use serde::Deserialize;

use crate::error::{Error, Result};

/// Credentials loaded from a device registration file.
#[derive(Debug, Clone, Deserialize)]
pub struct AmazonAuth {
    /// Bearer token for the Audible API.
    pub access_token: String,

    /// Browser cookies for the Amazon website, used by the Kindle notebook
    /// scraper.
    #[serde(default)]
    pub website_cookies: BTreeMap<String, String>,

    /// Access token expiry as a unix timestamp.
    #[serde(default)]
    pub expires: Option<f64>,

    /// Marketplace locale the device was registered in.
    #[serde(default)]
    pub locale_code: Option<String>,
}

impl AmazonAuth {
    /// Load the auth file.
    ///
    /// # Errors
    ///
    /// `Error::Config` if the file is missing or not valid JSON.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("cannot read auth file {}: {e}", path.display())))?;
        serde_json::from_str(&raw)
            .map_err(|e| Error::Config(format!("invalid auth file {}: {e}", path.display())))
    }

    /// Whether the access token has passed its recorded expiry.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn is_expired(&self) -> bool {
        self.expires
            .is_some_and(|expires| expires <= Utc::now().timestamp() as f64)
    }

    /// The cookies as a single `Cookie` header value.
    ///
    /// # Errors
    ///
    /// `Error::AdapterAuth` if the file carries no website cookies, which
    /// happens for registrations that skipped the browser login flow.
    pub fn cookie_header(&self) -> Result<String> {
        if self.website_cookies.is_empty() {
            return Err(Error::AdapterAuth(
                "auth file has no website cookies".to_string(),
            ));
        }

        Ok(self
            .website_cookies
            .iter()
            .map(|(name, value)| format!("{name}={}", value.replace('"', "")))
            .collect::<Vec<_>>()
            .join("; "))
    }
}
