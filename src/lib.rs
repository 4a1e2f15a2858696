//! ncli - export personal data services to Markdown
//!
//! This crate provides the core functionality for the `ncli` tool: it pulls
//! annotations and content out of walled-garden services and writes them as
//! plain Markdown files that can live in version control.
//!
//! # Architecture
//!
//! - [`cli`] - Command-line interface using clap
//! - [`sync`] - Incremental export pipeline (index, planner, writer)
//! - [`model`] - Book, chapter, and annotation types with Markdown rendering
//! - [`audible`] - Audible library adapter (REST API + annotation sidecar)
//! - [`kindle`] - Kindle notebook adapter (HTML scraping)
//! - [`notion`] - Notion workspace export restructuring
//! - [`youtube`] - YouTube transcript export and summarization
//! - [`config`] - Configuration and Amazon auth file handling
//! - [`error`] - Error types and exit codes

#![forbid(unsafe_code)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod audible;
pub mod cli;
pub mod config;
pub mod error;
pub mod kindle;
pub mod model;
pub mod notion;
pub mod sync;
pub mod util;
pub mod youtube;

pub use error::{Error, Result};
