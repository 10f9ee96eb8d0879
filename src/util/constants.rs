// HttpSleuth - util/constants.rs
//
// Single source of truth for all named constants, limits, and defaults.
// Marker strings for every log grammar live here so detection, segmentation
// and extraction never disagree about them.

// =============================================================================
// Application metadata
// =============================================================================

/// Application display name.
pub const APP_NAME: &str = "HttpSleuth";

/// Application identifier used for config/data directories.
pub const APP_ID: &str = "HttpSleuth";

/// Current application version (updated by release script).
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

// =============================================================================
// Detection
// =============================================================================

/// Default number of lines read from the start of a file before detection.
/// The sampled lines are replayed into the segmenter afterwards.
pub const DEFAULT_DETECTION_LINES: usize = 8;

/// Maximum number of logcat preamble lines skipped before the
/// Android debug sentinel must appear.
pub const PREAMBLE_LOOKAHEAD_LINES: usize = 4;

/// Minimum detection sample. Covers the first line, the full preamble
/// lookahead and the sentinel after it.
pub const MIN_DETECTION_LINES: usize = PREAMBLE_LOOKAHEAD_LINES + 2;

/// Maximum configurable detection sample.
pub const MAX_DETECTION_LINES: usize = 64;

/// Logcat buffer banner, e.g. `--------- beginning of main`.
pub const LOGCAT_PREAMBLE: &str = "--------- beginning of";

// =============================================================================
// Parsing limits
// =============================================================================

/// Maximum lines held for a single open block. Further lines are dropped
/// (markers are still honoured) so a runaway block cannot exhaust memory.
pub const DEFAULT_MAX_BLOCK_LINES: usize = 100_000;

/// Minimum configurable block line cap.
pub const MIN_MAX_BLOCK_LINES: usize = 16;

/// Maximum configurable block line cap.
pub const ABSOLUTE_MAX_BLOCK_LINES: usize = 1_000_000;

// =============================================================================
// Contiguous debug grammars (iOS / Android debug export)
// =============================================================================

/// Opens a transaction block.
pub const DEBUG_INFO_MARKER: &str = "## INFO";

/// Starts the request section of a block.
pub const DEBUG_REQUEST_MARKER: &str = "## REQUEST";

/// Starts the response section of a block.
pub const DEBUG_RESPONSE_MARKER: &str = "## RESPONSE";

/// Starts the header list of a section.
pub const DEBUG_HEADERS_MARKER: &str = "### Headers";

/// Starts the body of a section.
pub const DEBUG_BODY_MARKER: &str = "### Body";

/// Closes a block.
pub const DEBUG_SEPARATOR: &str = "------------------------------";

/// Bodies containing one of these mean "intentionally empty".
pub const DEBUG_EMPTY_BODY_SENTINELS: &[&str] = &["Request body is empty", "Response body is empty"];

/// Property keys looked up in the info section (as written by iOS).
pub const DEBUG_KEY_URL: &str = "URL";
pub const DEBUG_KEY_METHOD: &str = "Method";
pub const DEBUG_KEY_STATUS: &str = "Status";
pub const DEBUG_KEY_DATE: &str = "Request date";

// =============================================================================
// Composite info line grammar (OkHttp logging interceptor)
// =============================================================================

/// Substring of the composite info line that opens a block.
pub const OKHTTP_INFO_MARKER: &str = "Info: HTTP";

/// Marks the start of the request section; must follow the info line.
pub const OKHTTP_REQUEST_MARKER: &str = "===== Request =====";

/// Marks the start of the response section.
pub const OKHTTP_RESPONSE_MARKER: &str = "===== Response =====";

/// Closes a block.
pub const OKHTTP_END_MARKER: &str = "<-- END HTTP";

/// Number of `:`-separated fields the info line remainder must split into.
pub const OKHTTP_INFO_FIELDS: usize = 3;

// =============================================================================
// Split grammars
// =============================================================================

/// Android async request start, followed by `<id>] <METHOD> <url>`.
pub const ASYNC_REQUEST_MARKER: &str = "--> REQUEST [";

/// Android async response start, followed by `<id>] <code> <url>`.
pub const ASYNC_RESPONSE_MARKER: &str = "<-- RESPONSE [";

/// Android async end markers (line prefixes).
pub const ASYNC_END_MARKERS: &[&str] = &["--> END", "<-- END"];

/// Literal body meaning "intentionally empty" in the split grammars.
pub const SPLIT_EMPTY_BODY_SENTINEL: &str = "(empty body)";

/// iOS networking request start, followed by `<id>: curl ...`.
pub const CURL_REQUEST_MARKER: &str = "[Networking] REQUEST ";

/// iOS networking response start, followed by `<id>: <code>`.
pub const CURL_RESPONSE_MARKER: &str = "[Networking] RESPONSE ";

/// iOS networking end marker, followed by `<id>`.
pub const CURL_END_MARKER: &str = "[Networking] END ";

// =============================================================================
// Filtering
// =============================================================================

/// Status codes below this are "ok"; at or above are "not ok".
pub const STATUS_ERROR_THRESHOLD: u16 = 400;

// =============================================================================
// Logging
// =============================================================================

/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Maximum length of a log line included in debug output.
/// Prevents accidental exposure of sensitive data in long lines.
pub const DEBUG_MAX_LINE_PREVIEW: usize = 200;

// =============================================================================
// Configuration
// =============================================================================

/// Configuration file name.
pub const CONFIG_FILE_NAME: &str = "config.toml";
