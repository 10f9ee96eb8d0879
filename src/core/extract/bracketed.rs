// HttpSleuth - core/extract/bracketed.rs
//
// Extraction for the contiguous debug grammars. A `[Key]` line is followed
// by its value line; `## REQUEST` / `## RESPONSE` split the block into
// info, request and response sections, and `### Headers` / `### Body`
// split each section.

use crate::core::extract::{join_body, parse_status};
use crate::core::model::{Block, Headers, TransactionRecord};
use crate::util::constants;

/// How property keys are stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyCase {
    /// Keys kept exactly as logged (iOS).
    Preserve,
    /// Keys lower-cased so mixed-case exports look up consistently (Android).
    Fold,
}

impl KeyCase {
    fn apply(self, key: &str) -> String {
        match self {
            KeyCase::Preserve => key.to_string(),
            KeyCase::Fold => key.to_lowercase(),
        }
    }
}

/// Collect `[Key]` / value pairs. A key on the last line has no value and
/// is ignored; value lines are never read as keys.
pub fn properties(lines: &[String], case: KeyCase) -> Headers {
    let mut props = Headers::new();
    let mut i = 0;
    while i < lines.len() {
        let line = lines[i].trim_end();
        if let Some(key) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
            if let Some(value) = lines.get(i + 1) {
                props.insert(case.apply(key), value.trim_end().to_string());
                i += 2;
                continue;
            }
        }
        i += 1;
    }
    props
}

/// Headers and body of one request or response section.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Section {
    pub headers: Headers,
    pub body: Option<String>,
}

/// Parse a section (the lines after its `## REQUEST`/`## RESPONSE` marker).
pub fn section(lines: &[String], case: KeyCase) -> Section {
    let headers_at = lines
        .iter()
        .position(|l| l.starts_with(constants::DEBUG_HEADERS_MARKER));
    let body_at = lines
        .iter()
        .position(|l| l.starts_with(constants::DEBUG_BODY_MARKER));

    let header_start = headers_at.map_or(0, |i| i + 1);
    let header_end = body_at.unwrap_or(lines.len()).max(header_start);
    let headers = properties(&lines[header_start..header_end], case);

    let body = body_at.map(|i| {
        let body = join_body(&lines[i + 1..]);
        if constants::DEBUG_EMPTY_BODY_SENTINELS
            .iter()
            .any(|sentinel| body.contains(sentinel))
        {
            String::new()
        } else {
            body
        }
    });

    Section { headers, body }
}

/// Turn one `## INFO` ... separator block into a record.
pub fn extract(block: &Block, case: KeyCase) -> TransactionRecord {
    let lines = &block.lines;
    let request_at = lines
        .iter()
        .position(|l| l.starts_with(constants::DEBUG_REQUEST_MARKER));
    let response_at = lines
        .iter()
        .position(|l| l.starts_with(constants::DEBUG_RESPONSE_MARKER));

    // Each section runs until the next section marker after it.
    let section_end = |start: usize| -> usize {
        [request_at, response_at]
            .into_iter()
            .flatten()
            .filter(|&i| i > start)
            .min()
            .unwrap_or(lines.len())
    };

    let info_end = [request_at, response_at]
        .into_iter()
        .flatten()
        .min()
        .unwrap_or(lines.len());
    let info = properties(&lines[..info_end], case);

    let request = request_at
        .map(|i| section(&lines[i + 1..section_end(i)], case))
        .unwrap_or_default();
    let response = response_at
        .map(|i| section(&lines[i + 1..section_end(i)], case))
        .unwrap_or_default();

    if request_at.is_none() {
        tracing::debug!(start_line = block.start_line, "Block has no request section");
    }

    let field = |key: &str| {
        info.get(&case.apply(key))
            .map(|v| v.trim().to_string())
            .unwrap_or_default()
    };

    let status = match info.get(&case.apply(constants::DEBUG_KEY_STATUS)) {
        Some(raw) => parse_status(raw).unwrap_or_else(|| {
            tracing::debug!(
                start_line = block.start_line,
                "Status field is not a 3-digit code; using 0"
            );
            0
        }),
        None => 0,
    };

    TransactionRecord {
        timestamp: field(constants::DEBUG_KEY_DATE),
        method: field(constants::DEBUG_KEY_METHOD),
        url: field(constants::DEBUG_KEY_URL),
        status,
        request_headers: request.headers,
        response_headers: response.headers,
        request_body: request.body,
        response_body: response.body,
    }
}
