// HttpSleuth - core/model.rs
//
// Core data model types. Pure data definitions with no I/O, no UI,
// no platform dependencies.
//
// These types are the shared vocabulary across all layers.

use serde::Serialize;
use std::collections::BTreeMap;

/// Header name to value. Last write wins on duplicate names; a sorted map
/// keeps the serialised form deterministic between runs.
pub type Headers = BTreeMap<String, String>;

// =============================================================================
// Block (output of segmentation)
// =============================================================================

/// What a block represents, decided by the marker that opened it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    /// Request and response in one block (contiguous grammars).
    Transaction,

    /// One half of a transaction (split grammars).
    Half(Role),
}

/// An ordered, contiguous run of raw lines belonging to one transaction
/// or one half of one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub kind: BlockKind,

    /// 1-based line number of the opening marker.
    pub start_line: u64,

    /// Raw lines, opening marker first. The closing marker is not included.
    pub lines: Vec<String>,

    /// Lines were dropped because the block hit the line cap.
    pub truncated: bool,
}

impl Block {
    pub fn new(kind: BlockKind, start_line: u64, first: String) -> Self {
        Self {
            kind,
            start_line,
            lines: vec![first],
            truncated: false,
        }
    }

    /// Line number of the last line held by the block.
    pub fn end_line(&self) -> u64 {
        self.start_line + self.lines.len().saturating_sub(1) as u64
    }
}

// =============================================================================
// Half record (split grammars)
// =============================================================================

/// Which side of an HTTP exchange a half record carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Request,
    Response,
}

/// Parsed form of one split-grammar block, awaiting correlation.
///
/// Request halves carry method/url/request data; response halves carry
/// status/response data. Fields a side does not log stay at their defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HalfRecord {
    pub role: Role,
    pub correlation_id: String,
    pub timestamp: String,
    pub method: String,
    pub url: String,
    /// `None` when the block carried no status.
    pub status: Option<u16>,
    pub headers: Headers,
    pub body: Option<String>,
}

impl HalfRecord {
    pub fn new(role: Role, correlation_id: impl Into<String>) -> Self {
        Self {
            role,
            correlation_id: correlation_id.into(),
            timestamp: String::new(),
            method: String::new(),
            url: String::new(),
            status: None,
            headers: Headers::new(),
            body: None,
        }
    }
}

// =============================================================================
// Transaction record (normalised output of the pipeline)
// =============================================================================

/// A fully resolved request + response, the unit everything downstream of
/// the pipeline operates on.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TransactionRecord {
    /// Grammar-defined format, not normalised across grammars.
    pub timestamp: String,

    /// Empty when the grammar could not locate it.
    pub method: String,

    /// Empty when the grammar could not locate it.
    pub url: String,

    /// HTTP status; `0` means "not observed".
    pub status: u16,

    pub request_headers: Headers,
    pub response_headers: Headers,

    /// `Some("")` is an explicitly empty body, `None` means the log had no
    /// body section at all.
    pub request_body: Option<String>,
    pub response_body: Option<String>,
}

impl TransactionRecord {
    /// Combine a request half and a response half sharing one correlation id.
    pub fn merge(request: HalfRecord, response: HalfRecord) -> Self {
        let timestamp = if request.timestamp.is_empty() {
            response.timestamp
        } else {
            request.timestamp
        };
        let url = if request.url.is_empty() {
            response.url
        } else {
            request.url
        };
        Self {
            timestamp,
            method: request.method,
            url,
            status: response.status.unwrap_or(0),
            request_headers: request.headers,
            response_headers: response.headers,
            request_body: request.body,
            response_body: response.body,
        }
    }

    /// Status below the error threshold (400).
    pub fn is_ok(&self) -> bool {
        self.status < crate::util::constants::STATUS_ERROR_THRESHOLD
    }

    /// One-line summary: `{timestamp}: {method}:{status} {url}`.
    pub fn summary_line(&self) -> String {
        format!(
            "{}: {}:{} {}",
            self.timestamp, self.method, self.status, self.url
        )
    }
}

// =============================================================================
// Run summary
// =============================================================================

/// Statistics for one completed run, logged at the end of processing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Lines pulled from the source.
    pub lines_read: u64,

    /// Blocks emitted by the segmenter.
    pub blocks: usize,

    /// Records produced by the pipeline.
    pub records: usize,

    /// Records that passed the filters and were written.
    pub records_written: usize,

    /// Pending requests replaced by a later request with the same id.
    pub superseded_requests: usize,

    /// Responses with no pending request.
    pub dropped_responses: usize,

    /// Requests still waiting for a response at end of input.
    pub unresolved_requests: usize,

    /// Blocks dropped because their terminator never arrived.
    pub discarded_blocks: usize,
}
