//! Diagnostics for the scpi-toolkit.
//!
//! Provides [`ErrorCode`], [`ErrorReport`], [`Span`], and [`RegisterError`]
//! used to classify runtime parse failures and setup-time registration
//! failures. Runtime failures are never surfaced as Rust errors — the parser
//! records them in a bounded queue and callers drain them as
//! [`ErrorReport`] values, mirroring how an instrument answers `SYST:ERR?`.

#![warn(missing_docs)]

use serde::{Deserialize, Serialize};
use std::borrow::Cow;

// ── Span ────────────────────────────────────────────────────────────────

/// Byte span in one input message.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Span {
    /// Byte offset of the first character (0-based).
    pub start: usize,
    /// Byte offset one past the last character.
    pub end: usize,
}

impl Span {
    /// Create a span covering `[start, end)`.
    ///
    /// Panics if `end < start`.
    pub fn new(start: usize, end: usize) -> Self {
        assert!(end >= start, "Span end ({end}) < start ({start})");
        Self { start, end }
    }

    /// Create a zero-width span at the given position.
    pub fn empty(pos: usize) -> Self {
        Self {
            start: pos,
            end: pos,
        }
    }

    /// Length of the span in bytes.
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// Whether the span covers no bytes.
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

// ── ErrorCode ───────────────────────────────────────────────────────────

/// Terminal classification of one parse/execute attempt.
///
/// Exhaustive by design: every failed input cycle resolves to exactly one of
/// these, and `NoError` doubles as the sentinel returned when the error queue
/// is drained empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// Sentinel: the error queue was empty.
    NoError,
    /// The command header did not resolve to a registered command.
    UnknownCommand,
    /// Input collection exceeded the configured deadline before a terminator.
    Timeout,
    /// The message or token buffer capacity was exceeded.
    BufferOverflow,
}

impl ErrorCode {
    /// Short human-readable text for this code, in the `SYST:ERR?` register.
    pub fn message(self) -> &'static str {
        match self {
            ErrorCode::NoError => "No error",
            ErrorCode::UnknownCommand => "Undefined header",
            ErrorCode::Timeout => "Input message timeout",
            ErrorCode::BufferOverflow => "Input buffer overrun",
        }
    }

    /// SCPI-style numeric error code (negative for errors, 0 for none).
    ///
    /// Numbers follow the SCPI-1999 error classes where one exists:
    /// `-113 Undefined header`, `-363 Input buffer overrun`. The timeout
    /// code uses the device-dependent communication range.
    pub fn number(self) -> i16 {
        match self {
            ErrorCode::NoError => 0,
            ErrorCode::UnknownCommand => -113,
            ErrorCode::Timeout => -365,
            ErrorCode::BufferOverflow => -363,
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{},\"{}\"", self.number(), self.message())
    }
}

impl std::str::FromStr for ErrorCode {
    type Err = UnknownErrorCode;

    /// Accepts the variant name (`unknown_command`, case-insensitive) or the
    /// numeric form (`-113`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let all = [
            ErrorCode::NoError,
            ErrorCode::UnknownCommand,
            ErrorCode::Timeout,
            ErrorCode::BufferOverflow,
        ];
        if let Ok(n) = s.parse::<i16>() {
            if let Some(code) = all.iter().find(|c| c.number() == n) {
                return Ok(*code);
            }
        }
        let folded = s.trim().replace(['-', ' '], "_").to_ascii_lowercase();
        match folded.as_str() {
            "no_error" | "noerror" => Ok(ErrorCode::NoError),
            "unknown_command" | "unknowncommand" => Ok(ErrorCode::UnknownCommand),
            "timeout" => Ok(ErrorCode::Timeout),
            "buffer_overflow" | "bufferoverflow" => Ok(ErrorCode::BufferOverflow),
            _ => Err(UnknownErrorCode(s.to_string())),
        }
    }
}

/// Error returned when a string does not name any [`ErrorCode`].
#[derive(Debug, Clone, thiserror::Error)]
#[error("unknown error code: {0:?}")]
pub struct UnknownErrorCode(pub String);

// ── ErrorReport ─────────────────────────────────────────────────────────

/// One drained error-queue entry: a code paired with its readable text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorReport {
    /// The classification of the failure.
    pub code: ErrorCode,
    /// SCPI-style numeric code.
    pub number: i16,
    /// Human-readable message text.
    pub message: Cow<'static, str>,
}

impl ErrorReport {
    /// Build the report for a code using its canonical text.
    pub fn from_code(code: ErrorCode) -> Self {
        Self {
            code,
            number: code.number(),
            message: Cow::Borrowed(code.message()),
        }
    }

    /// The sentinel report meaning "queue empty".
    pub fn no_error() -> Self {
        Self::from_code(ErrorCode::NoError)
    }

    /// Whether this is the `NoError` sentinel.
    pub fn is_no_error(&self) -> bool {
        self.code == ErrorCode::NoError
    }
}

impl std::fmt::Display for ErrorReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{},\"{}\"", self.number, self.message)
    }
}

// ── RegisterError ───────────────────────────────────────────────────────

/// Setup-time failure while registering a command path.
///
/// Registration happens once, before any input is processed, so these are
/// ordinary Rust errors rather than queue entries.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegisterError {
    /// The command path was empty.
    #[error("empty command path")]
    EmptyPath,
    /// A colon-delimited segment of the path was empty (e.g. `MEAS::VOLT`).
    #[error("empty keyword in command path {path:?}")]
    EmptyKeyword {
        /// The offending path as supplied.
        path: String,
    },
    /// A keyword contained a character outside the SCPI mnemonic alphabet.
    #[error("invalid keyword {keyword:?} in command path")]
    InvalidKeyword {
        /// The offending keyword as supplied.
        keyword: String,
    },
    /// The path would exceed the maximum configured tree depth.
    #[error("command path depth {depth} exceeds maximum {max}")]
    DepthExceeded {
        /// Depth the registration would have reached.
        depth: usize,
        /// Maximum allowed depth.
        max: usize,
    },
    /// The path (including its query/event form) is already registered.
    #[error("command path {path:?} is already registered")]
    Duplicate {
        /// The canonical spelling of the duplicated path.
        path: String,
    },
    /// The handler table is full.
    #[error("command capacity {max} exceeded")]
    TooManyCommands {
        /// Maximum number of registrable commands.
        max: usize,
    },
}

// ── explain ─────────────────────────────────────────────────────────────

/// Returns the long-form explanation for an error code.
pub fn explain(code: ErrorCode) -> &'static str {
    match code {
        ErrorCode::NoError => {
            "Sentinel value: the error queue is empty. Returned by get_message \
             when every recorded error has already been drained."
        }
        ErrorCode::UnknownCommand => {
            "The header of a command unit did not match any registered command \
             path. Matching is case-insensitive and accepts either the short \
             form or the full long form of each keyword; no other \
             abbreviations are recognized. The associated handler is not \
             invoked and the rest of the message continues to be processed."
        }
        ErrorCode::Timeout => {
            "Bytes of a new message started to arrive but no line terminator \
             was seen before the configured deadline elapsed. The partial \
             buffer is discarded and collection restarts with the next byte."
        }
        ErrorCode::BufferOverflow => {
            "An input line exceeded the fixed message-buffer capacity, or a \
             message produced more tokens than the token buffer can hold. The \
             line is discarded up to its terminator; following lines are \
             processed normally."
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    // ── Span ────────────────────────────────────────────────────────────

    #[test]
    fn span_new_valid() {
        let s = Span::new(5, 10);
        assert_eq!(s.start, 5);
        assert_eq!(s.end, 10);
        assert_eq!(s.len(), 5);
        assert!(!s.is_empty());
    }

    #[test]
    fn span_empty() {
        let s = Span::empty(7);
        assert_eq!(s.start, 7);
        assert_eq!(s.end, 7);
        assert!(s.is_empty());
    }

    #[test]
    #[should_panic(expected = "Span end (3) < start (5)")]
    fn span_new_inverted_panics() {
        Span::new(5, 3);
    }

    // ── ErrorCode ───────────────────────────────────────────────────────

    #[test]
    fn error_code_messages() {
        assert_eq!(ErrorCode::NoError.message(), "No error");
        assert_eq!(ErrorCode::UnknownCommand.message(), "Undefined header");
        assert_eq!(ErrorCode::BufferOverflow.message(), "Input buffer overrun");
    }

    #[test]
    fn error_code_numbers_are_scpi_style() {
        assert_eq!(ErrorCode::NoError.number(), 0);
        assert_eq!(ErrorCode::UnknownCommand.number(), -113);
        assert_eq!(ErrorCode::BufferOverflow.number(), -363);
        assert!(ErrorCode::Timeout.number() < 0);
    }

    #[test]
    fn error_code_display_matches_syst_err_format() {
        assert_eq!(
            format!("{}", ErrorCode::UnknownCommand),
            "-113,\"Undefined header\""
        );
        assert_eq!(format!("{}", ErrorCode::NoError), "0,\"No error\"");
    }

    #[test]
    fn error_code_from_str_names_and_numbers() {
        assert_eq!(
            ErrorCode::from_str("unknown_command").unwrap(),
            ErrorCode::UnknownCommand
        );
        assert_eq!(
            ErrorCode::from_str("UnknownCommand").unwrap(),
            ErrorCode::UnknownCommand
        );
        assert_eq!(ErrorCode::from_str("-113").unwrap(), ErrorCode::UnknownCommand);
        assert_eq!(ErrorCode::from_str("0").unwrap(), ErrorCode::NoError);
        assert!(ErrorCode::from_str("bogus").is_err());
    }

    // ── ErrorReport ─────────────────────────────────────────────────────

    #[test]
    fn report_from_code() {
        let r = ErrorReport::from_code(ErrorCode::Timeout);
        assert_eq!(r.code, ErrorCode::Timeout);
        assert_eq!(r.number, ErrorCode::Timeout.number());
        assert_eq!(r.message, ErrorCode::Timeout.message());
        assert!(!r.is_no_error());
    }

    #[test]
    fn report_sentinel() {
        let r = ErrorReport::no_error();
        assert!(r.is_no_error());
        assert_eq!(format!("{r}"), "0,\"No error\"");
    }

    #[test]
    fn report_serde_roundtrip() {
        let r = ErrorReport::from_code(ErrorCode::BufferOverflow);
        let json = serde_json::to_string(&r).unwrap();
        let back: ErrorReport = serde_json::from_str(&json).unwrap();
        assert_eq!(r, back);
    }

    // ── explain ─────────────────────────────────────────────────────────

    #[test]
    fn all_codes_have_explanations() {
        for code in [
            ErrorCode::NoError,
            ErrorCode::UnknownCommand,
            ErrorCode::Timeout,
            ErrorCode::BufferOverflow,
        ] {
            assert!(!explain(code).is_empty());
        }
    }
}
