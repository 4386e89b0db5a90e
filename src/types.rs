//! Core types: which bundle to fetch, and what a downloaded bundle decodes into.

use std::{fs, path::Path};

use serde::{Deserialize, Serialize};
use unic_langid::LanguageIdentifier;
use url::Url;

use crate::error::Error;

/// Identifies the remote translation bundle to fetch.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct BundleConfig {
    /// Base URL of the Texterify server (e.g. "https://app.texterify.com").
    pub base_url: String,
    pub project_id: String,
    /// Export configuration selecting the format/scope of the export.
    pub export_config_id: String,
}

impl BundleConfig {
    pub fn new(
        base_url: impl Into<String>,
        project_id: impl Into<String>,
        export_config_id: impl Into<String>,
    ) -> Self {
        BundleConfig {
            base_url: base_url.into(),
            project_id: project_id.into(),
            export_config_id: export_config_id.into(),
        }
    }

    /// Parses `base_url`, for downloaders building their request URL.
    pub fn parsed_base_url(&self) -> Result<Url, Error> {
        Url::parse(&self.base_url).map_err(|source| Error::InvalidUrl {
            url: self.base_url.clone(),
            source,
        })
    }
}

/// A decoded translation bundle for a single language.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct LocalizationPayload {
    /// Language code naming the `.lproj` directory (e.g. "en", "pt-BR").
    #[serde(alias = "languageCode")]
    pub language_code: String,

    /// Translations in export order.
    #[serde(default)]
    pub texts: Vec<Text>,
}

/// One translated key.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Text {
    pub key: String,
    pub value: String,
}

/// Wire envelope: the payload sits under a top-level `data` object.
#[derive(Debug, Deserialize)]
struct Envelope {
    data: LocalizationPayload,
}

impl LocalizationPayload {
    pub fn new(language_code: impl Into<String>, texts: Vec<Text>) -> Self {
        LocalizationPayload {
            language_code: language_code.into(),
            texts,
        }
    }

    /// Decodes the `{ "data": { ... } }` envelope and validates the language code.
    pub fn from_json_slice(bytes: &[u8]) -> Result<Self, Error> {
        let envelope: Envelope = serde_json::from_slice(bytes).map_err(|e| {
            Error::decoding_error("payload does not match the bundle schema", Some(Box::new(e)))
        })?;
        let payload = envelope.data;
        payload.validate_language_code()?;
        Ok(payload)
    }

    /// Reads and decodes a downloaded payload file.
    pub fn read_from<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|e| {
            Error::decoding_error(
                format!("cannot read payload `{}`", path.display()),
                Some(Box::new(e)),
            )
        })?;
        Self::from_json_slice(&bytes)
    }

    pub fn parse_language_identifier(&self) -> Option<LanguageIdentifier> {
        self.language_code.parse().ok()
    }

    /// The language code becomes a directory name, so it must be a real
    /// BCP 47 identifier and nothing that could escape the bundle.
    fn validate_language_code(&self) -> Result<(), Error> {
        let code = self.language_code.as_str();
        if code.trim().is_empty() {
            return Err(Error::decoding_error("empty language code", None));
        }
        match code.parse::<LanguageIdentifier>() {
            Ok(_) => Ok(()),
            Err(e) => Err(Error::decoding_error(
                format!("invalid language code `{}`: {}", code, e),
                None,
            )),
        }
    }

    pub fn len(&self) -> usize {
        self.texts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.texts.is_empty()
    }
}

impl Text {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Text {
            key: key.into(),
            value: value.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_snake_case_payload() {
        let json = r#"{"data":{"language_code":"en","texts":[
            {"key":"hello","value":"Hello"},
            {"key":"bye","value":"Bye"}
        ]}}"#;
        let payload = LocalizationPayload::from_json_slice(json.as_bytes()).unwrap();
        assert_eq!(payload.language_code, "en");
        assert_eq!(
            payload.texts,
            vec![Text::new("hello", "Hello"), Text::new("bye", "Bye")]
        );
    }

    #[test]
    fn test_decode_camel_case_alias() {
        let json = r#"{"data":{"languageCode":"de","texts":[{"key":"a","value":"b"}]}}"#;
        let payload = LocalizationPayload::from_json_slice(json.as_bytes()).unwrap();
        assert_eq!(payload.language_code, "de");
        assert_eq!(payload.len(), 1);
    }

    #[test]
    fn test_decode_ignores_unknown_fields_and_missing_texts() {
        let json = r#"{"data":{"language_code":"fr","project":"x"},"meta":{}}"#;
        let payload = LocalizationPayload::from_json_slice(json.as_bytes()).unwrap();
        assert!(payload.is_empty());
    }

    #[test]
    fn test_decode_rejects_missing_envelope() {
        let json = r#"{"language_code":"en","texts":[]}"#;
        let err = LocalizationPayload::from_json_slice(json.as_bytes()).unwrap_err();
        assert!(matches!(err, Error::Decoding { .. }));
    }

    #[test]
    fn test_decode_rejects_invalid_json() {
        let err = LocalizationPayload::from_json_slice(b"{ not json").unwrap_err();
        assert!(matches!(err, Error::Decoding { .. }));
    }

    #[test]
    fn test_decode_rejects_path_like_language_code() {
        for code in ["../evil", "", "en/fr"] {
            let json = format!(r#"{{"data":{{"language_code":"{}","texts":[]}}}}"#, code);
            let err = LocalizationPayload::from_json_slice(json.as_bytes()).unwrap_err();
            assert!(matches!(err, Error::Decoding { .. }), "accepted `{}`", code);
        }
    }

    #[test]
    fn test_decode_keeps_region_subtag_spelling() {
        let json = r#"{"data":{"language_code":"pt-BR","texts":[]}}"#;
        let payload = LocalizationPayload::from_json_slice(json.as_bytes()).unwrap();
        assert_eq!(payload.language_code, "pt-BR");
        let id = payload.parse_language_identifier().unwrap();
        assert_eq!(id.language.as_str(), "pt");
    }

    #[test]
    fn test_read_from_missing_file_is_decoding_error() {
        let err = LocalizationPayload::read_from("/definitely/not/here/strings.json").unwrap_err();
        assert!(matches!(err, Error::Decoding { .. }));
    }

    #[test]
    fn test_parsed_base_url() {
        let config = BundleConfig::new("https://app.texterify.com", "p1", "e1");
        assert_eq!(config.parsed_base_url().unwrap().host_str(), Some("app.texterify.com"));

        let bad = BundleConfig::new("::not a url", "p1", "e1");
        assert!(matches!(bad.parsed_base_url(), Err(Error::InvalidUrl { .. })));
    }
}
