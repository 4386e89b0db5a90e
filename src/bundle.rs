//! On-disk localization bundle.
//!
//! ```text
//! <document dir>/TexterifyLocalization.bundle/
//!     <language>.lproj/
//!         Localizable.strings
//! ```
//!
//! Writing always replaces the whole table for a language; lookups re-read the
//! table and fall back to the key when no translation exists.

use std::{
    fs,
    path::{Path, PathBuf},
};

use tracing::{debug, trace};
use unic_langid::LanguageIdentifier;

use crate::{
    error::Error,
    formats::strings::Format,
    traits::Parser,
    types::LocalizationPayload,
};

/// Directory name of the bundle under the document directory.
pub const BUNDLE_NAME: &str = "TexterifyLocalization.bundle";
/// Suffix of the per-language directories inside the bundle.
pub const LPROJ_SUFFIX: &str = ".lproj";
/// Table consulted when no table name is given.
pub const DEFAULT_TABLE: &str = "Localizable";
pub const STRINGS_EXTENSION: &str = "strings";
/// File the downloader writes the raw payload to, inside the document directory.
pub const PAYLOAD_FILE_NAME: &str = "strings.json";

/// A `TexterifyLocalization.bundle` directory, present or not yet created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalizationBundle {
    path: PathBuf,
}

impl LocalizationBundle {
    /// Resolves the bundle location under `document_dir` without touching disk.
    pub fn in_document_dir<P: AsRef<Path>>(document_dir: P) -> Self {
        LocalizationBundle {
            path: document_dir.as_ref().join(BUNDLE_NAME),
        }
    }

    /// Opens an existing bundle directory. `None` if it is missing or not a directory.
    pub fn open<P: AsRef<Path>>(path: P) -> Option<Self> {
        let path = path.as_ref();
        if path.is_dir() {
            Some(LocalizationBundle {
                path: path.to_path_buf(),
            })
        } else {
            None
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_dir()
    }

    /// Directory holding the tables of one language.
    pub fn lproj_dir(&self, language: &str) -> PathBuf {
        self.path.join(format!("{}{}", language, LPROJ_SUFFIX))
    }

    /// Path of a table file, `Localizable.strings` when `table` is `None`.
    pub fn table_path(&self, language: &str, table: Option<&str>) -> PathBuf {
        let table = table.unwrap_or(DEFAULT_TABLE);
        self.lproj_dir(language)
            .join(format!("{}.{}", table, STRINGS_EXTENSION))
    }

    /// Replaces the `Localizable.strings` table for the payload's language.
    ///
    /// Missing directories are created first. The new content is written to a
    /// temporary sibling, the previous table is removed and the temporary file
    /// is renamed into place, so readers see either no table or a complete
    /// one. Returns the written content.
    pub fn write_payload(&self, payload: &LocalizationPayload) -> Result<String, Error> {
        self.write_payload_unless(payload, || false)
    }

    /// Like [`LocalizationBundle::write_payload`], but checks `abandoned` right
    /// before the previous table is touched. When it returns `true` the
    /// temporary file is discarded, the table is left as it was and
    /// [`Error::Cancelled`] is returned.
    pub fn write_payload_unless(
        &self,
        payload: &LocalizationPayload,
        abandoned: impl Fn() -> bool,
    ) -> Result<String, Error> {
        let lproj_dir = self.lproj_dir(&payload.language_code);
        let target = self.table_path(&payload.language_code, None);

        if !self.exists() {
            debug!(path = %self.path.display(), "Creating localization bundle");
            fs::create_dir_all(&self.path).map_err(|e| Error::writing_to_file(&self.path, e))?;
        }
        if !lproj_dir.is_dir() {
            fs::create_dir_all(&lproj_dir).map_err(|e| Error::writing_to_file(&lproj_dir, e))?;
        }

        let content = Format::from(payload).to_content();

        // Unique per process and thread so concurrent writers never share a temp file.
        let temp_path = lproj_dir.join(format!(
            ".{}.{}-{:?}.tmp",
            DEFAULT_TABLE,
            std::process::id(),
            std::thread::current().id()
        ));
        fs::write(&temp_path, content.as_bytes())
            .map_err(|e| Error::writing_to_file(&temp_path, e))?;

        if abandoned() {
            let _ = fs::remove_file(&temp_path);
            debug!(path = %target.display(), "Write abandoned, table left unchanged");
            return Err(Error::Cancelled);
        }
        if target.exists() {
            if let Err(e) = fs::remove_file(&target) {
                let _ = fs::remove_file(&temp_path);
                return Err(Error::writing_to_file(&target, e));
            }
        }
        if let Err(e) = fs::rename(&temp_path, &target) {
            let _ = fs::remove_file(&temp_path);
            return Err(Error::writing_to_file(&target, e));
        }

        debug!(
            language = %payload.language_code,
            entries = payload.len(),
            path = %target.display(),
            "Wrote localization table"
        );
        Ok(content)
    }

    /// Language codes with a `.lproj` directory in this bundle, sorted.
    pub fn languages(&self) -> Vec<String> {
        let Ok(entries) = fs::read_dir(&self.path) else {
            return Vec::new();
        };
        let mut languages: Vec<String> = entries
            .filter_map(Result::ok)
            .filter(|entry| entry.path().is_dir())
            .filter_map(|entry| {
                entry
                    .file_name()
                    .to_str()
                    .and_then(|name| name.strip_suffix(LPROJ_SUFFIX))
                    .map(str::to_string)
            })
            .collect();
        languages.sort();
        languages
    }

    /// Loads one table, `None` if it is missing or unreadable.
    pub fn table(&self, language: &str, table: Option<&str>) -> Option<Format> {
        let path = self.table_path(language, table);
        match Format::read_from(&path) {
            Ok(mut format) => {
                format.language = language.to_string();
                Some(format)
            }
            Err(e) => {
                trace!(path = %path.display(), error = %e, "Table not loadable");
                None
            }
        }
    }

    /// Languages in the order lookups consult them.
    ///
    /// Languages matching `preferred` come first, exact matches before
    /// matches on the language subtag alone (`en-US` falls back to `en`).
    /// The most recently written table follows, then the remaining
    /// languages in sorted order.
    pub fn resolution_order<S: AsRef<str>>(&self, preferred: &[S]) -> Vec<String> {
        let available = self.languages();
        let mut order: Vec<String> = Vec::with_capacity(available.len());
        let push = |language: &String, order: &mut Vec<String>| {
            if !order.contains(language) {
                order.push(language.clone());
            }
        };

        for wanted in preferred {
            let wanted = normalize_locale(wanted.as_ref());
            if let Some(exact) = available
                .iter()
                .find(|language| normalize_locale(language).eq_ignore_ascii_case(&wanted))
            {
                push(exact, &mut order);
            }
            let Ok(wanted_id) = wanted.parse::<LanguageIdentifier>() else {
                continue;
            };
            for language in &available {
                let same_language = normalize_locale(language)
                    .parse::<LanguageIdentifier>()
                    .is_ok_and(|id| id.language == wanted_id.language);
                if same_language {
                    push(language, &mut order);
                }
            }
        }

        if let Some(latest) = self.most_recently_written(&available) {
            push(&latest, &mut order);
        }
        for language in &available {
            push(language, &mut order);
        }
        order
    }

    fn most_recently_written(&self, languages: &[String]) -> Option<String> {
        languages
            .iter()
            .filter_map(|language| {
                let modified = fs::metadata(self.table_path(language, None))
                    .and_then(|meta| meta.modified())
                    .ok()?;
                Some((modified, language))
            })
            .max_by_key(|(modified, _)| *modified)
            .map(|(_, language)| language.clone())
    }

    /// Looks `key` up following the system's preferred languages.
    /// Returns `key` itself when nothing matches.
    pub fn localized_string(&self, key: &str, table: Option<&str>) -> String {
        self.localized_string_preferring(system_languages().as_slice(), key, table)
    }

    /// Looks `key` up in [`LocalizationBundle::resolution_order`] for
    /// `preferred`. Returns `key` itself when nothing matches.
    pub fn localized_string_preferring<S: AsRef<str>>(
        &self,
        preferred: &[S],
        key: &str,
        table: Option<&str>,
    ) -> String {
        self.resolution_order(preferred)
            .iter()
            .find_map(|language| self.lookup(language, key, table))
            .unwrap_or_else(|| {
                trace!(key, "No translation found");
                key.to_string()
            })
    }

    /// Looks `key` up in a single language. Returns `key` itself when nothing matches.
    pub fn localized_string_in(&self, language: &str, key: &str, table: Option<&str>) -> String {
        self.lookup(language, key, table)
            .unwrap_or_else(|| key.to_string())
    }

    fn lookup(&self, language: &str, key: &str, table: Option<&str>) -> Option<String> {
        self.table(language, table)?.get(key).map(str::to_string)
    }
}

/// The user's preferred languages as reported by the operating system.
pub fn system_languages() -> Vec<String> {
    sys_locale::get_locales().collect()
}

/// `en_US.UTF-8` style POSIX locales become `en-US`.
fn normalize_locale(locale: &str) -> String {
    locale
        .split(['.', '@'])
        .next()
        .unwrap_or_default()
        .replace('_', "-")
}
