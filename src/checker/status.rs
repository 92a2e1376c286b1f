// src/checker/status.rs
// =============================================================================
// The status record every link check produces.
//
// A StatusRecord is the only thing the rest of the tool ever sees about a
// link: its classification, the numeric code behind it, a human message and
// the link as it was checked.
//
// Codes are real HTTP status codes, or one of two sentinels:
// - 0   no response (timeout, refused connection, ...)
// - 666 the URL was invalid or its host could not be resolved
// =============================================================================

use serde::{Deserialize, Serialize};
use std::fmt;

/// No response at all from the remote host.
pub const CODE_NO_RESPONSE: u16 = 0;
/// Internal sentinel for invalid or unresolvable URLs.
pub const CODE_INVALID_URL: u16 = 666;

// Classification of a checked link
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatusType {
    /// Link answered with a code outside the broken/warning sets
    #[serde(rename = "good")]
    Good,
    /// Link answered with a warning code (only while warnings are enabled)
    #[serde(rename = "warning")]
    Warning,
    /// Link answered with a broken code
    #[serde(rename = "broken")]
    Broken,
    /// Link is on the omission list
    #[serde(rename = "omitted")]
    Omitted,
    /// Nothing left to check (e.g. the source page is gone)
    #[serde(rename = "n/a")]
    NotApplicable,
}

impl StatusType {
    /// The lowercase label used in storage and output
    pub fn as_str(&self) -> &'static str {
        match self {
            StatusType::Good => "good",
            StatusType::Warning => "warning",
            StatusType::Broken => "broken",
            StatusType::Omitted => "omitted",
            StatusType::NotApplicable => "n/a",
        }
    }

    /// Parses a stored label. Unknown labels yield None.
    pub fn parse(label: &str) -> Option<Self> {
        match label {
            "good" => Some(StatusType::Good),
            "warning" => Some(StatusType::Warning),
            "broken" => Some(StatusType::Broken),
            "omitted" => Some(StatusType::Omitted),
            "n/a" => Some(StatusType::NotApplicable),
            _ => None,
        }
    }

    /// Broken and warning links are the ones reported to administrators.
    pub fn is_flagged(&self) -> bool {
        matches!(self, StatusType::Broken | StatusType::Warning)
    }
}

impl fmt::Display for StatusType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// The result of checking a single href
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusRecord {
    #[serde(rename = "type")]
    pub status_type: StatusType,
    pub code: u16,
    pub text: String,
    pub link: String,
}

impl StatusRecord {
    pub fn new(status_type: StatusType, code: u16, text: impl Into<String>, link: impl Into<String>) -> Self {
        Self {
            status_type,
            code,
            text: text.into(),
            link: link.into(),
        }
    }

    // Shorthand for the "good, 200" records produced by the policy skips
    pub fn skipped(text: impl Into<String>, link: impl Into<String>) -> Self {
        Self::new(StatusType::Good, 200, text, link)
    }

    pub fn is_good(&self) -> bool {
        self.status_type == StatusType::Good
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_type_labels() {
        for status_type in [
            StatusType::Good,
            StatusType::Warning,
            StatusType::Broken,
            StatusType::Omitted,
            StatusType::NotApplicable,
        ] {
            assert_eq!(StatusType::parse(status_type.as_str()), Some(status_type));
        }
        assert_eq!(StatusType::parse("unknown"), None);
    }

    #[test]
    fn test_status_record_json_shape() {
        let record = StatusRecord::new(StatusType::NotApplicable, 404, "Not Found", "https://a.example/");
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["type"], "n/a");
        assert_eq!(json["code"], 404);
        assert_eq!(json["text"], "Not Found");
        assert_eq!(json["link"], "https://a.example/");
    }

    #[test]
    fn test_only_broken_and_warning_are_flagged() {
        assert!(StatusType::Broken.is_flagged());
        assert!(StatusType::Warning.is_flagged());
        assert!(!StatusType::Good.is_flagged());
        assert!(!StatusType::Omitted.is_flagged());
        assert!(!StatusType::NotApplicable.is_flagged());
    }
}
