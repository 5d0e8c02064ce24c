//! Caption error types.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Errors returned by the caption entry points.
#[derive(Debug, thiserror::Error)]
pub enum CaptionsError {
    /// Failed to read caption file.
    #[error("Failed to read file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A diagnostic that ended the parse (strict mode or load failure).
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),
}

impl CaptionsError {
    /// Create a read error.
    pub fn read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::ReadError {
            path: path.into(),
            source,
        }
    }

    /// The parse diagnostic, if this error carries one.
    pub fn parse_error(&self) -> Option<&ParseError> {
        match self {
            Self::Parse(err) => Some(err),
            Self::ReadError { .. } => None,
        }
    }
}

/// Category of a parse diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParseErrorKind {
    /// Upstream read or decode failure.
    LoadFail,
    /// Missing or incorrect format header.
    BadSignature,
    /// Unparseable or non-increasing start/end pair.
    BadTimestamp,
    /// Recognized setting name with a malformed value.
    BadSettingValue,
    /// SSA/ASS line seen before its `Format:` declaration.
    BadFormat,
    /// Unrecognized cue or region setting name.
    UnknownSetting,
}

impl ParseErrorKind {
    /// Stable numeric code.
    pub fn code(&self) -> u8 {
        match self {
            ParseErrorKind::LoadFail => 0,
            ParseErrorKind::BadSignature => 1,
            ParseErrorKind::BadTimestamp => 2,
            ParseErrorKind::BadSettingValue => 3,
            ParseErrorKind::BadFormat => 4,
            ParseErrorKind::UnknownSetting => 5,
        }
    }
}

impl fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ParseErrorKind::LoadFail => "load fail",
            ParseErrorKind::BadSignature => "bad signature",
            ParseErrorKind::BadTimestamp => "bad timestamp",
            ParseErrorKind::BadSettingValue => "bad setting value",
            ParseErrorKind::BadFormat => "bad format",
            ParseErrorKind::UnknownSetting => "unknown setting",
        };
        f.write_str(name)
    }
}

/// A diagnostic produced while parsing captions.
///
/// `line` is 1-based and refers to the input line before trimming.
/// Load failures have no source line and use 0.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("{reason}")]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub reason: String,
    pub line: usize,
}

impl ParseError {
    /// Create an error of the given kind.
    pub fn new(kind: ParseErrorKind, reason: impl Into<String>, line: usize) -> Self {
        Self {
            kind,
            reason: reason.into(),
            line,
        }
    }

    /// Create a load failure.
    pub fn load_fail(reason: impl Into<String>) -> Self {
        Self::new(ParseErrorKind::LoadFail, reason, 0)
    }

    /// Create a missing signature error.
    pub fn bad_signature(signature: &str, line: usize) -> Self {
        Self::new(
            ParseErrorKind::BadSignature,
            format!("missing {} file header", signature),
            line,
        )
    }

    /// Create an invalid start timestamp error.
    pub fn bad_start_time(value: &str, line: usize) -> Self {
        Self::new(
            ParseErrorKind::BadTimestamp,
            format!("cue start timestamp `{}` is invalid on line {}", value, line),
            line,
        )
    }

    /// Create an invalid end timestamp error.
    pub fn bad_end_time(value: &str, line: usize) -> Self {
        Self::new(
            ParseErrorKind::BadTimestamp,
            format!("cue end timestamp `{}` is invalid on line {}", value, line),
            line,
        )
    }

    /// Create an end-not-after-start error.
    pub fn bad_time_range(start: &str, end: &str, line: usize) -> Self {
        Self::new(
            ParseErrorKind::BadTimestamp,
            format!(
                "cue end timestamp `{}` is not greater than start `{}` on line {}",
                end, start, line
            ),
            line,
        )
    }

    /// Create an invalid setting value error.
    pub fn bad_setting_value(scope: SettingScope, name: &str, value: &str, line: usize) -> Self {
        Self::new(
            ParseErrorKind::BadSettingValue,
            format!(
                "invalid value for {} setting `{}` on line {} (value: {})",
                scope, name, line, value
            ),
            line,
        )
    }

    /// Create an unknown setting error.
    pub fn unknown_setting(scope: SettingScope, name: &str, value: &str, line: usize) -> Self {
        Self::new(
            ParseErrorKind::UnknownSetting,
            format!(
                "unknown {} setting `{}` on line {} (value: {})",
                scope, name, line, value
            ),
            line,
        )
    }

    /// Create a missing SSA/ASS format error.
    pub fn missing_format(block: &str, line: usize) -> Self {
        Self::new(
            ParseErrorKind::BadFormat,
            format!("format missing for `{}` block on line {}", block, line),
            line,
        )
    }
}

/// Which settings grammar produced a settings diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingScope {
    Cue,
    Region,
}

impl fmt::Display for SettingScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingScope::Cue => f.write_str("cue"),
            SettingScope::Region => f.write_str("region"),
        }
    }
}
