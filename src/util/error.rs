// HttpSleuth - util/error.rs
//
// Typed error hierarchy with context-preserving error chains.
// Only run-level failures live here: block-level problems degrade the
// record (empty fields, status 0) and are never turned into errors.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Top-level error type for all HttpSleuth operations.
/// Errors are categorised by the subsystem that produced them.
#[derive(Debug)]
pub enum HttpSleuthError {
    /// No known grammar matched the start of the log.
    Detect(DetectError),

    /// A structural failure that stops the run.
    Parse(ParseError),

    /// The wildcard filter could not be compiled.
    Filter(FilterError),

    /// Writing results failed.
    Output(OutputError),

    /// I/O error with path context.
    Io {
        path: PathBuf,
        operation: &'static str,
        source: io::Error,
    },
}

impl fmt::Display for HttpSleuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Detect(e) => write!(f, "Detection error: {e}"),
            Self::Parse(e) => write!(f, "Parse error: {e}"),
            Self::Filter(e) => write!(f, "Filter error: {e}"),
            Self::Output(e) => write!(f, "Output error: {e}"),
            Self::Io {
                path,
                operation,
                source,
            } => write!(
                f,
                "I/O error during {operation} on '{}': {source}",
                path.display()
            ),
        }
    }
}

impl std::error::Error for HttpSleuthError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Detect(e) => Some(e),
            Self::Parse(e) => Some(e),
            Self::Filter(e) => Some(e),
            Self::Output(e) => Some(e),
            Self::Io { source, .. } => Some(source),
        }
    }
}

// ---------------------------------------------------------------------------
// Detection errors
// ---------------------------------------------------------------------------

/// Errors related to grammar detection.
#[derive(Debug)]
pub enum DetectError {
    /// No sentinel matched. `first_line` is a truncated preview, `None` for
    /// an empty input.
    UnknownGrammar { first_line: Option<String> },
}

impl fmt::Display for DetectError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownGrammar { first_line: None } => {
                write!(f, "no suitable logs found (input is empty)")
            }
            Self::UnknownGrammar {
                first_line: Some(line),
            } => write!(f, "no suitable logs found (first line: '{line}')"),
        }
    }
}

impl std::error::Error for DetectError {}

impl From<DetectError> for HttpSleuthError {
    fn from(e: DetectError) -> Self {
        Self::Detect(e)
    }
}

// ---------------------------------------------------------------------------
// Parse errors
// ---------------------------------------------------------------------------

/// Run-level parse failures.
#[derive(Debug)]
pub enum ParseError {
    /// A composite info line is missing a mandatory separator.
    MalformedInfoLine {
        line_number: u64,
        reason: &'static str,
        line: String,
    },

    /// Reading the next line from the source failed.
    Read { line_number: u64, source: io::Error },
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MalformedInfoLine {
                line_number,
                reason,
                line,
            } => write!(f, "line {line_number}: malformed info line ({reason}): '{line}'"),
            Self::Read {
                line_number,
                source,
            } => write!(f, "line {line_number}: read failed: {source}"),
        }
    }
}

impl std::error::Error for ParseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Read { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<ParseError> for HttpSleuthError {
    fn from(e: ParseError) -> Self {
        Self::Parse(e)
    }
}

// ---------------------------------------------------------------------------
// Filter errors
// ---------------------------------------------------------------------------

/// Errors related to filter operations.
#[derive(Debug)]
pub enum FilterError {
    /// User-provided wildcard pattern is invalid.
    InvalidPattern {
        pattern: String,
        source: glob::PatternError,
    },
}

impl fmt::Display for FilterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidPattern { pattern, source } => {
                write!(f, "Invalid filter pattern '{pattern}': {source}")
            }
        }
    }
}

impl std::error::Error for FilterError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::InvalidPattern { source, .. } => Some(source),
        }
    }
}

impl From<FilterError> for HttpSleuthError {
    fn from(e: FilterError) -> Self {
        Self::Filter(e)
    }
}

// ---------------------------------------------------------------------------
// Output errors
// ---------------------------------------------------------------------------

/// Errors writing rendered or exported records.
#[derive(Debug)]
pub enum OutputError {
    /// I/O error writing to the output stream.
    Io { source: io::Error },

    /// JSON serialisation error.
    Json { source: serde_json::Error },
}

impl fmt::Display for OutputError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { source } => write!(f, "write failed: {source}"),
            Self::Json { source } => write!(f, "JSON serialisation failed: {source}"),
        }
    }
}

impl std::error::Error for OutputError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source } => Some(source),
            Self::Json { source } => Some(source),
        }
    }
}

impl From<OutputError> for HttpSleuthError {
    fn from(e: OutputError) -> Self {
        Self::Output(e)
    }
}

// ---------------------------------------------------------------------------
// Config errors
// ---------------------------------------------------------------------------

/// Errors related to configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    /// TOML parsing failed.
    TomlParse {
        path: PathBuf,
        source: toml::de::Error,
    },

    /// A config value is out of the allowed range.
    ValueOutOfRange {
        field: String,
        value: String,
        expected: String,
    },

    /// I/O error reading config file.
    Io { path: PathBuf, source: io::Error },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TomlParse { path, source } => {
                write!(f, "Config parse error '{}': {source}", path.display())
            }
            Self::ValueOutOfRange {
                field,
                value,
                expected,
            } => write!(
                f,
                "Config '{field}' = '{value}' is out of range. Expected: {expected}"
            ),
            Self::Io { path, source } => {
                write!(f, "Config I/O error '{}': {source}", path.display())
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::TomlParse { source, .. } => Some(source),
            Self::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Shorten `line` for inclusion in diagnostics.
pub fn preview(line: &str) -> String {
    let max = super::constants::DEBUG_MAX_LINE_PREVIEW;
    if line.len() <= max {
        return line.to_string();
    }
    let mut end = max;
    while !line.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &line[..end])
}
