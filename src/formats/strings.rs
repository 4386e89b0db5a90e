//! Support for Apple `.strings` localization tables.
//!
//! The writer emits one `"key"="value";` line per pair with no header or
//! comments. The parser also accepts hand-written and Xcode-generated tables:
//! whitespace around `=`, `//` and `/* */` comments, and the usual escapes.

use std::{borrow::Cow, iter::Peekable, str::Chars};

use crate::{error::Error, traits::Parser, types::LocalizationPayload};

/// Represents an Apple `.strings` table for one language.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Format {
    /// Language code of the enclosing `.lproj`, if known. Not stored in the file.
    pub language: String,
    /// All key-value pairs, in file order.
    pub pairs: Vec<Pair>,
}

/// A single key-value pair in a `.strings` table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pair {
    pub key: String,
    pub value: String,
}

impl Format {
    /// Serializes the table to its on-disk text.
    pub fn to_content(&self) -> String {
        let mut content = String::new();
        for pair in &self.pairs {
            content.push_str(&pair.to_string());
            content.push('\n');
        }
        content
    }

    /// Looks up a key. Later duplicates shadow earlier ones.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .rev()
            .find(|pair| pair.key == key)
            .map(|pair| pair.value.as_str())
    }
}

impl From<&LocalizationPayload> for Format {
    fn from(payload: &LocalizationPayload) -> Self {
        Format {
            language: payload.language_code.clone(),
            pairs: payload
                .texts
                .iter()
                .map(|text| Pair {
                    key: text.key.clone(),
                    value: text.value.clone(),
                })
                .collect(),
        }
    }
}

impl Parser for Format {
    fn from_reader<R: std::io::BufRead>(mut reader: R) -> Result<Self, Error> {
        let mut content = String::new();
        reader.read_to_string(&mut content)?;
        let content = content.strip_prefix('\u{feff}').unwrap_or(&content);

        let mut scanner = Scanner::new(content);
        let mut pairs = Vec::new();
        while let Some(entry) = scanner.next_entry() {
            if let Some(pair) = entry {
                pairs.push(pair);
            }
        }

        Ok(Format {
            language: String::new(),
            pairs,
        })
    }

    fn to_writer<W: std::io::Write>(&self, mut writer: W) -> Result<(), Error> {
        writer
            .write_all(self.to_content().as_bytes())
            .map_err(Error::Io)
    }
}

impl std::fmt::Display for Pair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "\"{}\"=\"{}\";", escape(&self.key), escape(&self.value))
    }
}

/// Escapes the characters that would otherwise end or break a quoted string.
/// Text without them is returned as-is.
pub fn escape(s: &str) -> Cow<'_, str> {
    if !s.contains(['\\', '"', '\n', '\r', '\t']) {
        return Cow::Borrowed(s);
    }
    let mut out = String::with_capacity(s.len() + 8);
    for c in s.chars() {
        match c {
            '\\' => out.push_str(r"\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str(r"\n"),
            '\r' => out.push_str(r"\r"),
            '\t' => out.push_str(r"\t"),
            other => out.push(other),
        }
    }
    Cow::Owned(out)
}

struct Scanner<'a> {
    chars: Peekable<Chars<'a>>,
    /// Characters consumed so far.
    pos: usize,
    /// Only whitespace consumed since the last newline.
    line_start: bool,
}

impl<'a> Scanner<'a> {
    fn new(content: &'a str) -> Self {
        Scanner {
            chars: content.chars().peekable(),
            pos: 0,
            line_start: true,
        }
    }

    /// `None` at end of input, `Some(None)` for a skipped malformed entry.
    fn next_entry(&mut self) -> Option<Option<Pair>> {
        self.skip_trivia();
        self.chars.peek()?;

        let start = self.pos;
        let pair = self.entry();
        // A failed entry that already ran onto a fresh line resumes there.
        if pair.is_none() && !(self.line_start && self.pos > start) {
            self.skip_line();
        }
        Some(pair)
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.chars.next()?;
        self.pos += 1;
        if c == '\n' {
            self.line_start = true;
        } else if !c.is_whitespace() {
            self.line_start = false;
        }
        Some(c)
    }

    fn entry(&mut self) -> Option<Pair> {
        let key = self.quoted()?;
        self.skip_trivia();
        self.expect('=')?;
        self.skip_trivia();
        let value = self.quoted()?;
        self.skip_trivia();
        self.expect(';')?;
        Some(Pair { key, value })
    }

    fn expect(&mut self, c: char) -> Option<()> {
        if self.chars.peek() == Some(&c) {
            self.bump();
            Some(())
        } else {
            None
        }
    }

    fn quoted(&mut self) -> Option<String> {
        self.expect('"')?;
        let mut out = String::new();
        loop {
            match self.bump()? {
                '"' => return Some(out),
                '\\' => match self.bump()? {
                    'n' => out.push('\n'),
                    'r' => out.push('\r'),
                    't' => out.push('\t'),
                    '0' => out.push('\0'),
                    'U' | 'u' => out.push(self.unicode_escape()?),
                    other => out.push(other),
                },
                c => out.push(c),
            }
        }
    }

    /// Decodes the four hex digits after `\U`. A high surrogate must be
    /// followed by a `\U` low surrogate; the pair forms one character.
    fn unicode_escape(&mut self) -> Option<char> {
        let high = self.hex4()?;
        if !(0xD800..=0xDBFF).contains(&high) {
            return char::from_u32(high);
        }
        self.expect('\\')?;
        if !matches!(self.bump()?, 'U' | 'u') {
            return None;
        }
        let low = self.hex4()?;
        if !(0xDC00..=0xDFFF).contains(&low) {
            return None;
        }
        char::from_u32(0x10000 + ((high - 0xD800) << 10) + (low - 0xDC00))
    }

    fn hex4(&mut self) -> Option<u32> {
        let mut code = 0u32;
        for _ in 0..4 {
            code = code * 16 + self.bump()?.to_digit(16)?;
        }
        Some(code)
    }

    fn skip_trivia(&mut self) {
        loop {
            match self.chars.peek() {
                Some(c) if c.is_whitespace() => {
                    self.bump();
                }
                Some('/') => {
                    let mut lookahead = self.chars.clone();
                    lookahead.next();
                    match lookahead.peek() {
                        Some('/') => self.skip_line(),
                        Some('*') => {
                            self.bump();
                            self.bump();
                            self.skip_block_comment();
                        }
                        _ => return,
                    }
                }
                _ => return,
            }
        }
    }

    fn skip_line(&mut self) {
        while let Some(c) = self.bump() {
            if c == '\n' {
                break;
            }
        }
    }

    fn skip_block_comment(&mut self) {
        let mut prev = '\0';
        while let Some(c) = self.bump() {
            if prev == '*' && c == '/' {
                break;
            }
            prev = c;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Text;
    use indoc::indoc;

    #[test]
    fn test_write_scenario_payload() {
        let payload = LocalizationPayload::new(
            "en",
            vec![Text::new("hello", "Hello"), Text::new("bye", "Bye")],
        );
        let format = Format::from(&payload);
        assert_eq!(format.to_content(), "\"hello\"=\"Hello\";\n\"bye\"=\"Bye\";\n");
        assert_eq!(format.language, "en");
    }

    #[test]
    fn test_write_empty_table() {
        let format = Format::default();
        assert_eq!(format.to_content(), "");
    }

    #[test]
    fn test_escape_special_characters() {
        let pair = Pair {
            key: "quote".to_string(),
            value: "Say \"hi\"\\\nnow".to_string(),
        };
        assert_eq!(pair.to_string(), r#""quote"="Say \"hi\"\\\nnow";"#);
        assert!(matches!(escape("plain text"), Cow::Borrowed(_)));
    }

    #[test]
    fn test_parse_own_output_with_escapes() {
        let format = Format {
            language: String::new(),
            pairs: vec![
                Pair {
                    key: "a=b".to_string(),
                    value: "x = y; \"z\"".to_string(),
                },
                Pair {
                    key: "tab".to_string(),
                    value: "one\ttwo\r\nthree".to_string(),
                },
            ],
        };
        let parsed = Format::from_str(&format.to_content()).unwrap();
        assert_eq!(parsed.pairs, format.pairs);
    }

    #[test]
    fn test_parse_xcode_style_table() {
        let content = indoc! {r#"
            /* Greeting for the user */
            "hello" = "Hello, world!";

            // Farewell
            "bye"   =   "Goodbye!" ;
            /* multi
               line comment */
            "unicode" = "caf\U00E9";
        "#};
        let parsed = Format::from_str(content).unwrap();
        assert_eq!(parsed.pairs.len(), 3);
        assert_eq!(parsed.get("hello"), Some("Hello, world!"));
        assert_eq!(parsed.get("bye"), Some("Goodbye!"));
        assert_eq!(parsed.get("unicode"), Some("café"));
    }

    #[test]
    fn test_parse_skips_malformed_lines() {
        let content = indoc! {r#"
            "good" = "yes";
            bad line without quotes
            "missing_semicolon" = "no"
            "another" = "ok";
        "#};
        let parsed = Format::from_str(content).unwrap();
        assert_eq!(parsed.get("good"), Some("yes"));
        assert_eq!(parsed.get("another"), Some("ok"));
        assert_eq!(parsed.get("missing_semicolon"), None);
    }

    #[test]
    fn test_parse_unterminated_value_stops_cleanly() {
        let parsed = Format::from_str("\"ok\"=\"fine\";\n\"broken\"=\"never closed").unwrap();
        assert_eq!(parsed.pairs.len(), 1);
        assert_eq!(parsed.get("ok"), Some("fine"));
    }

    #[test]
    fn test_parse_surrogate_pair_escape() {
        let parsed = Format::from_str(indoc! {r#"
            "smile" = "\UD83D\UDE00 hi";
            "lone" = "\UD83D oops";
            "after" = "still parsed";
        "#})
        .unwrap();
        assert_eq!(parsed.get("smile"), Some("\u{1F600} hi"));
        assert_eq!(parsed.get("lone"), None);
        assert_eq!(parsed.get("after"), Some("still parsed"));
    }

    #[test]
    fn test_parse_strips_bom() {
        let parsed = Format::from_str("\u{feff}\"k\"=\"v\";\n").unwrap();
        assert_eq!(parsed.get("k"), Some("v"));
    }

    #[test]
    fn test_duplicate_keys_last_wins() {
        let parsed = Format::from_str("\"k\"=\"first\";\n\"k\"=\"second\";\n").unwrap();
        assert_eq!(parsed.pairs.len(), 2);
        assert_eq!(parsed.get("k"), Some("second"));
    }

    #[test]
    fn test_to_writer_matches_content() {
        let parsed = Format::from_str("\"a\"=\"1\";\n").unwrap();
        let mut output = Vec::new();
        parsed.to_writer(&mut output).unwrap();
        assert_eq!(String::from_utf8(output).unwrap(), parsed.to_content());
    }
}
