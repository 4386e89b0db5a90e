#![forbid(unsafe_code)]
//! Client-side Texterify SDK for Rust.
//!
//! Downloads a project's translation export, decodes its JSON payload and
//! materializes it as an Apple-style resource bundle in the document
//! directory, so strings can then be looked up by key.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use std::path::Path;
//! use texterify::{BundleConfig, Downloader, Error, Manager};
//!
//! struct HttpDownloader;
//!
//! #[async_trait::async_trait]
//! impl Downloader for HttpDownloader {
//!     async fn download(&self, config: &BundleConfig, destination: &Path) -> Result<(), Error> {
//!         let _base = config.parsed_base_url()?;
//!         // Fetch the export and write its JSON to `destination`.
//!         # let _ = destination;
//!         Ok(())
//!     }
//! }
//!
//! # async fn run() -> Result<(), Error> {
//! let manager = Manager::new("https://app.texterify.com", "project-id", "export-config-id", HttpDownloader);
//! let table = manager.fetch_updated_strings().await?;
//! println!("{table}");
//!
//! let greeting = Manager::localized_string("hello", None, "Greeting on the start screen");
//! # let _ = greeting;
//! # Ok(())
//! # }
//! ```
//!
//! # On-disk layout
//!
//! ```text
//! <document dir>/TexterifyLocalization.bundle/<language>.lproj/Localizable.strings
//! ```
//!
//! Each table line has the form `"key"="value";`.

pub mod bundle;
pub mod error;
pub mod formats;
pub mod manager;
pub mod options;
pub mod traits;
pub mod types;

// Re-export most used types for easy consumption
pub use crate::{
    bundle::{BUNDLE_NAME, LocalizationBundle},
    error::Error,
    manager::Manager,
    options::{DocumentDirectory, ManagerOptions},
    traits::{Downloader, Parser},
    types::{BundleConfig, LocalizationPayload, Text},
};
pub use tokio_util::sync::CancellationToken;
