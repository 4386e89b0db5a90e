//! Options controlling where and how [`crate::Manager`] fetches.

use std::{path::PathBuf, time::Duration};

use crate::bundle::PAYLOAD_FILE_NAME;

/// Default upper bound for one fetch.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Where the bundle and the downloaded payload live.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DocumentDirectory {
    /// The platform's per-user documents directory.
    #[default]
    Platform,
    /// An explicit directory.
    At(PathBuf),
    /// No storage; every fetch fails with [`crate::Error::StorageUnavailable`].
    Unavailable,
}

impl DocumentDirectory {
    pub fn resolve(&self) -> Option<PathBuf> {
        match self {
            DocumentDirectory::Platform => dirs::document_dir(),
            DocumentDirectory::At(path) => Some(path.clone()),
            DocumentDirectory::Unavailable => None,
        }
    }
}

/// Fetch behavior options for [`crate::Manager`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagerOptions {
    pub document_dir: DocumentDirectory,
    /// `None` waits for the downloader indefinitely.
    pub timeout: Option<Duration>,
    pub payload_file_name: String,
    /// Language order for [`crate::Manager::localize`]. `None` follows the system locales.
    pub preferred_languages: Option<Vec<String>>,
}

impl Default for ManagerOptions {
    fn default() -> Self {
        ManagerOptions {
            document_dir: DocumentDirectory::Platform,
            timeout: Some(DEFAULT_TIMEOUT),
            payload_file_name: PAYLOAD_FILE_NAME.to_string(),
            preferred_languages: None,
        }
    }
}

impl ManagerOptions {
    /// Creates default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the document directory.
    pub fn with_document_dir(mut self, document_dir: DocumentDirectory) -> Self {
        self.document_dir = document_dir;
        self
    }

    /// Sets or clears the fetch timeout.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the payload file name.
    pub fn with_payload_file_name(mut self, name: impl Into<String>) -> Self {
        self.payload_file_name = name.into();
        self
    }

    /// Overrides the system locales for lookups through the manager.
    pub fn with_preferred_languages(mut self, languages: Option<Vec<String>>) -> Self {
        self.preferred_languages = languages;
        self
    }
}
