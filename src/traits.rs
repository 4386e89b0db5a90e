//! Traits at the seams of the SDK: table parsing and bundle downloading.

use std::{
    fs::File,
    io::{BufRead, Cursor, Read, Write},
    path::Path,
};

use async_trait::async_trait;

use crate::{error::Error, types::BundleConfig};

/// A trait for parsing and writing a localization table from/to one file.
///
/// # Example
///
/// ```rust,no_run
/// use texterify::traits::Parser;
/// let format = texterify::formats::strings::Format::read_from("en.lproj/Localizable.strings")?;
/// let mut out = Vec::new();
/// format.to_writer(&mut out)?;
/// Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub trait Parser {
    /// Parse from any reader.
    fn from_reader<R: BufRead>(reader: R) -> Result<Self, Error>
    where
        Self: Sized;

    /// Parse from file path.
    ///
    /// Input is decoded BOM-aware, so UTF-16 tables written by Xcode load the
    /// same as UTF-8 ones.
    fn read_from<P: AsRef<Path>>(path: P) -> Result<Self, Error>
    where
        Self: Sized,
    {
        let file = File::open(path)?;
        let mut decoder = encoding_rs_io::DecodeReaderBytesBuilder::new()
            .bom_override(true)
            .build(file);

        let mut decoded = String::new();
        decoder.read_to_string(&mut decoded)?;
        Self::from_str(&decoded)
    }

    /// Write to any writer (file, memory, etc.).
    fn to_writer<W: Write>(&self, writer: W) -> Result<(), Error>;

    /// Parse from a string.
    fn from_str(s: &str) -> Result<Self, Error>
    where
        Self: Sized,
    {
        Self::from_reader(Cursor::new(s))
    }
}

/// Fetches a translation bundle and stores its raw JSON payload.
///
/// The network transport lives outside this crate; hosts plug in their own
/// HTTP client by implementing this trait.
///
/// Implementations must have written the complete payload to `destination`
/// before returning `Ok(())`. Transport failures should be wrapped with
/// [`Error::download`]; a malformed base URL is reported through
/// [`BundleConfig::parsed_base_url`].
#[async_trait]
pub trait Downloader: Send + Sync {
    async fn download(&self, config: &BundleConfig, destination: &Path) -> Result<(), Error>;
}
