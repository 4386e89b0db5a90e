//! All error types for the texterify crate.
//!
//! Every failing fetch ends with exactly one of these, delivered either as the
//! `Err` of [`crate::Manager::fetch_updated_strings`] or as the error argument
//! of a completion callback.

use std::{path::PathBuf, time::Duration};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// The downloaded payload could not be read or decoded.
    #[error("decoding error: {message}")]
    Decoding {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("invalid URL `{url}`: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("error writing to file `{}`: {source}", .path.display())]
    WritingToFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// No document directory could be resolved on this platform.
    #[error("storage unavailable: no document directory")]
    StorageUnavailable,

    #[error("download failed: {0}")]
    Download(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("fetch timed out after {0:?}")]
    Timeout(Duration),

    #[error("fetch cancelled")]
    Cancelled,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Creates a new decoding error with optional source error
    pub fn decoding_error(
        message: impl Into<String>,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Error::Decoding {
            message: message.into(),
            source,
        }
    }

    /// Wraps a transport failure raised inside a [`crate::Downloader`].
    pub fn download(source: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Error::Download(source.into())
    }

    pub(crate) fn writing_to_file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::WritingToFile {
            path: path.into(),
            source,
        }
    }
}
