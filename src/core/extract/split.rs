// HttpSleuth - core/extract/split.rs
//
// Extraction for the split grammars, where request and response are
// logged as separate blocks tied together by a correlation id.
//
// Android async logger:
//   <ts> D/HttpLogger: --> REQUEST [<id>] <METHOD> <url>
//   <ts> D/HttpLogger: <-- RESPONSE [<id>] <code> <url>
//
// iOS networking logger (request rendered as a curl command):
//   <ts> [Networking] REQUEST <id>: curl -X POST -H 'K: V' -d '...' 'https://...'
//   <ts> [Networking] RESPONSE <id>: <code>
//
// Lines after a start line are colon headers up to the first blank line,
// then the body.

use crate::core::extract::{colon_header, colon_headers, join_body, parse_status};
use crate::core::model::{Block, BlockKind, Headers, HalfRecord, Role};
use crate::util::constants;
use crate::util::error::preview;
use regex::{Captures, Regex};
use std::sync::OnceLock;

fn re(pattern: &str) -> Regex {
    Regex::new(pattern).expect("split: invalid regex")
}

/// Quoted shell word: single-quoted (with `'\''` escapes) or double-quoted.
const QUOTED: &str = r#"(?:'((?:[^']|'\\'')*)'|"((?:[^"\\]|\\.)*)")"#;

fn async_request_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        re(r"^(?P<prefix>.*?)--> REQUEST \[(?P<id>[^\]]+)\]\s*(?P<method>\S*)\s*(?P<url>\S*)")
    })
}

fn async_response_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        re(r"^(?P<prefix>.*?)<-- RESPONSE \[(?P<id>[^\]]+)\]\s*(?P<status>\d{3})?\s*(?P<url>\S*)")
    })
}

/// Leading date/time of a logcat or NSLog line.
fn leading_timestamp_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        re(r"^\s*(\d{2,4}-\d{2}(?:-\d{2})?[ T]\d{2}:\d{2}:\d{2}(?:[.,]\d+)?(?:[+-]\d{2}:?\d{2}|Z)?)")
    })
}

fn curl_request_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| re(r"^(?P<prefix>.*?)\[Networking\] REQUEST (?P<id>[^:\s]+):"))
}

fn curl_response_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        re(r"^(?P<prefix>.*?)\[Networking\] RESPONSE (?P<id>[^:\s]+):\s*(?P<status>\d{3})?")
    })
}

fn curl_method_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| re(r#"(?:^|\s)(?:-X|--request)\s+['"]?([A-Za-z]+)"#))
}

fn curl_header_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| re(&format!(r"(?:^|\s)(?:-H|--header)\s+{QUOTED}")))
}

fn curl_data_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        re(&format!(
            r"(?:^|\s)(?:-d|--data|--data-raw|--data-binary)\s+{QUOTED}"
        ))
    })
}

fn curl_url_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| re(r#"(?:^|\s)(?:'(https?://[^']*)'|"(https?://[^"]*)"|(https?://[^\s'"]+))"#))
}

/// Timestamp from the text in front of a start marker: a leading date/time
/// when there is one, otherwise the whole prefix minus trailing tag noise.
fn timestamp_from_prefix(prefix: &str) -> String {
    if let Some(caps) = leading_timestamp_re().captures(prefix) {
        return caps[1].to_string();
    }
    prefix.trim().trim_end_matches(':').trim().to_string()
}

/// Headers up to the first blank line, body after it.
fn headers_and_body(lines: &[String]) -> (Headers, Option<String>) {
    let blank = lines.iter().position(|l| l.trim().is_empty());
    let headers = colon_headers(&lines[..blank.unwrap_or(lines.len())]);
    let body = blank.map(|i| {
        let body = join_body(&lines[i + 1..]);
        if body.trim() == constants::SPLIT_EMPTY_BODY_SENTINEL {
            String::new()
        } else {
            body
        }
    });
    (headers, body)
}

fn role_of(block: &Block) -> Option<Role> {
    match block.kind {
        BlockKind::Half(role) => Some(role),
        BlockKind::Transaction => None,
    }
}

fn unattributed(block: &Block) -> Option<HalfRecord> {
    tracing::debug!(
        start_line = block.start_line,
        line = %preview(&block.lines[0]),
        "Start line carries no correlation id; block skipped"
    );
    None
}

// =============================================================================
// Android async logger
// =============================================================================

/// Parse one Android async block. `None` when the start line has no id.
pub fn extract_android_async(block: &Block) -> Option<HalfRecord> {
    let role = role_of(block)?;
    let start = &block.lines[0];
    let (headers, body) = headers_and_body(&block.lines[1..]);

    let caps = match role {
        Role::Request => async_request_re().captures(start),
        Role::Response => async_response_re().captures(start),
    };
    let Some(caps) = caps else {
        return unattributed(block);
    };

    let mut half = HalfRecord::new(role, caps["id"].trim());
    half.timestamp = timestamp_from_prefix(&caps["prefix"]);
    half.url = caps["url"].to_string();
    match role {
        Role::Request => half.method = caps["method"].to_string(),
        Role::Response => half.status = caps.name("status").and_then(|m| parse_status(m.as_str())),
    }
    half.headers = headers;
    half.body = body;
    Some(half)
}

// =============================================================================
// iOS networking logger (curl requests)
// =============================================================================

/// The quoted word captured by `QUOTED`, unescaped.
fn unquote(caps: &Captures<'_>, single: usize, double: usize) -> Option<String> {
    if let Some(m) = caps.get(single) {
        return Some(m.as_str().replace(r"'\''", "'"));
    }
    caps.get(double)
        .map(|m| m.as_str().replace(r#"\""#, "\"").replace(r"\\", r"\"))
}

/// Fields recovered from curl flags.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CurlRequest {
    pub method: String,
    pub url: String,
    pub headers: Headers,
    /// `None` without a data flag.
    pub body: Option<String>,
}

/// Recover request fields from curl flag syntax. Words that are not
/// recognised flags contribute nothing.
pub fn parse_curl(command: &str) -> CurlRequest {
    let mut request = CurlRequest::default();

    for caps in curl_header_re().captures_iter(command) {
        if let Some((name, value)) = unquote(&caps, 1, 2).as_deref().and_then(colon_header) {
            request.headers.insert(name, value);
        }
    }

    // Repeated data flags are concatenated by curl with '&'.
    let data: Vec<String> = curl_data_re()
        .captures_iter(command)
        .filter_map(|caps| unquote(&caps, 1, 2))
        .collect();
    if !data.is_empty() {
        request.body = Some(data.join("&"));
    }

    request.method = match curl_method_re().captures(command) {
        Some(caps) => caps[1].to_uppercase(),
        None if request.body.is_some() => "POST".to_string(),
        None => "GET".to_string(),
    };

    // Flag values may carry URLs of their own; the target is the first URL
    // word left once they are removed.
    let mut targets = command.to_string();
    for flag in [curl_header_re(), curl_data_re(), curl_method_re()] {
        targets = flag.replace_all(&targets, " ").into_owned();
    }
    request.url = curl_url_re()
        .captures(&targets)
        .and_then(|caps| caps.get(1).or_else(|| caps.get(2)).or_else(|| caps.get(3)))
        .map(|m| m.as_str().to_string())
        .unwrap_or_default();

    request
}

/// Parse one iOS networking block. `None` when the start line has no id.
pub fn extract_curl(block: &Block) -> Option<HalfRecord> {
    let role = role_of(block)?;
    let start = &block.lines[0];

    match role {
        Role::Request => {
            let Some(caps) = curl_request_re().captures(start) else {
                return unattributed(block);
            };
            let mut half = HalfRecord::new(Role::Request, &caps["id"]);
            half.timestamp = timestamp_from_prefix(&caps["prefix"]);

            // Multi-line commands continue with a trailing backslash.
            let command = block
                .lines
                .iter()
                .map(|l| l.trim_end().trim_end_matches('\\'))
                .collect::<Vec<_>>()
                .join(" ");
            let curl = parse_curl(&command);
            half.method = curl.method;
            half.url = curl.url;
            half.headers = curl.headers;
            half.body = curl.body;
            Some(half)
        }
        Role::Response => {
            let Some(caps) = curl_response_re().captures(start) else {
                return unattributed(block);
            };
            let mut half = HalfRecord::new(Role::Response, &caps["id"]);
            half.timestamp = timestamp_from_prefix(&caps["prefix"]);
            half.status = caps.name("status").and_then(|m| parse_status(m.as_str()));
            let (headers, body) = headers_and_body(&block.lines[1..]);
            half.headers = headers;
            half.body = body;
            Some(half)
        }
    }
}
