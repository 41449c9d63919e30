//! Warning line extraction from raw log text.
//!
//! A line counts as a warning when the configured pattern matches somewhere
//! in it; the stored warning text starts at the match, so later lookups can
//! re-validate user input with the same anchored rule.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

// Volatile substrings stripped during normalization. Without this, the same
// warning fired at different times or in different processes counts as
// distinct lines.
static TIMESTAMP_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\d{4}-\d{2}-\d{2}[T ]\d{2}:\d{2}:\d{2}(?:\.\d+)?Z?").unwrap()
});
static HEX_ADDRESS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"0x[0-9a-fA-F]{4,}").unwrap());
static PID_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b[Pp][Ii][Dd][ =:]?\d+").unwrap());
static BRACKET_ID_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[\d+\]").unwrap());

/// Extracts and counts warning lines from raw log text.
#[derive(Debug, Clone)]
pub struct WarningParser {
    warning_re: Regex,
    normalize: bool,
}

impl WarningParser {
    /// Create a parser for the given acceptance pattern.
    pub fn new(pattern: &str, normalize: bool) -> Result<Self, regex::Error> {
        Ok(Self {
            warning_re: Regex::new(pattern)?,
            normalize,
        })
    }

    /// Parse raw log text into a warning-text to occurrence-count table.
    pub fn parse(&self, text: &str) -> HashMap<String, usize> {
        let mut warnings = HashMap::new();

        for line in text.lines() {
            // Log lines carry harness prefixes before the warning itself;
            // keep the text from the match onward so stored warnings satisfy
            // the pattern at position zero.
            let Some(m) = self.warning_re.find(line) else {
                continue;
            };

            let mut warning = line[m.start()..].trim_end().to_string();
            if self.normalize {
                warning = normalize_line(&warning);
            }

            *warnings.entry(warning).or_insert(0) += 1;
        }

        warnings
    }
}

/// Replace volatile substrings with stable placeholders.
pub fn normalize_line(line: &str) -> String {
    let line = TIMESTAMP_RE.replace_all(line, "<time>");
    let line = HEX_ADDRESS_RE.replace_all(&line, "0xNNNNNNNN");
    let line = PID_RE.replace_all(&line, "pid NNN");
    let line = BRACKET_ID_RE.replace_all(&line, "[NNN]");
    line.into_owned()
}

/// True when `text` satisfies `re` starting at the first character.
///
/// `Regex::find` returns the leftmost match, so a match that does not start
/// at zero means no match starts at zero.
pub fn matches_at_start(re: &Regex, text: &str) -> bool {
    re.find(text).is_some_and(|m| m.start() == 0)
}
