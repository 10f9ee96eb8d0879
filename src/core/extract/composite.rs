// HttpSleuth - core/extract/composite.rs
//
// Extraction for the OkHttp logging-interceptor grammar. The first line of
// a block packs timestamp, method, url and (sometimes) status together:
//
//   <timestamp>;<level>: HTTP: <METHOD> <url> - <code> - <code> <reason>
//
// Request and response regions have no header/body marker: the first line
// that opens a JSON object or a quoted string starts the body.

use crate::core::extract::{colon_header, join_body, parse_status};
use crate::core::model::{Block, Headers, TransactionRecord};
use crate::util::constants;
use crate::util::error::{preview, ParseError};
use regex::Regex;
use std::sync::OnceLock;

fn re(pattern: &str) -> Regex {
    Regex::new(pattern).expect("composite: invalid regex")
}

/// ` - 200` inside the info line.
fn info_status_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| re(r" - ([0-9]{3})"))
}

/// `<-- 200 OK ...` inside a region.
fn region_status_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| re(r"<-- ([0-9]{3})"))
}

/// First line of a body.
fn body_start_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| re(r#"^[{"]"#))
}

/// Fields decoded from the composite info line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InfoLine {
    pub timestamp: String,
    pub method: String,
    pub url: String,
    /// Only recorded when the line echoes the code more than once.
    pub status: Option<u16>,
}

/// Decode the composite info line.
///
/// Missing the `;` or the `:`-separated fields is fatal: the grammar
/// guarantees both on every info line.
pub fn parse_info_line(line: &str, line_number: u64) -> Result<InfoLine, ParseError> {
    let malformed = |reason: &'static str| ParseError::MalformedInfoLine {
        line_number,
        reason,
        line: preview(line),
    };

    let (timestamp, rest) = line
        .split_once(';')
        .ok_or_else(|| malformed("no ';' after timestamp"))?;

    let fields: Vec<&str> = rest.splitn(constants::OKHTTP_INFO_FIELDS, ':').collect();
    let tail = fields
        .get(constants::OKHTTP_INFO_FIELDS - 1)
        .ok_or_else(|| malformed("missing ':'-separated request field"))?
        .trim();

    let mut tokens = tail.split_whitespace();
    let method = tokens.next().unwrap_or_default().to_string();
    let url = tokens.next().unwrap_or_default().to_string();

    // The logger echoes the code twice for a completed call; a single echo
    // is not trusted and the response region's own status is used instead.
    let codes: Vec<&str> = info_status_re()
        .captures_iter(tail)
        .filter_map(|c| c.get(1).map(|m| m.as_str()))
        .collect();
    let status = if codes.len() > 1 {
        parse_status(codes[0])
    } else {
        None
    };

    Ok(InfoLine {
        timestamp: timestamp.trim().to_string(),
        method,
        url,
        status,
    })
}

/// Status, headers and body of one request or response region.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Region {
    /// `0` when no `<-- NNN` line precedes the body.
    pub status: u16,
    pub headers: Headers,
    pub body: Option<String>,
}

/// Scan a region: status lines and colon headers until the first body
/// line; everything from there on is the body.
pub fn region(lines: &[String]) -> Region {
    let mut status = 0;
    let mut headers = Headers::new();
    let mut body_at = None;

    for (i, line) in lines.iter().enumerate() {
        if body_start_re().is_match(line) {
            body_at = Some(i);
            break;
        }
        if let Some(code) = region_status_re()
            .captures(line)
            .and_then(|c| parse_status(&c[1]))
        {
            status = code;
            continue;
        }
        if let Some((name, value)) = colon_header(line) {
            headers.insert(name, value);
        }
    }

    Region {
        status,
        headers,
        body: body_at.map(|i| join_body(&lines[i..])),
    }
}

/// Turn one `Info: HTTP` block into a record.
pub fn extract(block: &Block) -> Result<TransactionRecord, ParseError> {
    let lines = &block.lines;
    let info = parse_info_line(&lines[0], block.start_line)?;

    let request_at = lines
        .iter()
        .position(|l| l.contains(constants::OKHTTP_REQUEST_MARKER));
    let response_at = lines
        .iter()
        .position(|l| l.contains(constants::OKHTTP_RESPONSE_MARKER));

    let request = request_at.map(|i| {
        let end = response_at.filter(|&r| r > i).unwrap_or(lines.len());
        region(&lines[i + 1..end])
    });
    let response = response_at.map(|i| region(&lines[i + 1..]));

    let status = info
        .status
        .or_else(|| response.as_ref().map(|r| r.status))
        .unwrap_or(0);

    let (request_headers, request_body) = request
        .map(|r| (r.headers, r.body))
        .unwrap_or_default();
    let (response_headers, response_body) = response
        .map(|r| (r.headers, r.body))
        .unwrap_or_default();

    Ok(TransactionRecord {
        timestamp: info.timestamp,
        method: info.method,
        url: info.url,
        status,
        request_headers,
        response_headers,
        request_body,
        response_body,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::BlockKind;

    fn block(text: &str) -> Block {
        let mut lines = text.lines().map(str::to_string);
        let mut block = Block::new(BlockKind::Transaction, 7, lines.next().unwrap());
        block.lines.extend(lines);
        block
    }

    #[test]
    fn test_info_line_with_double_echo_records_status() {
        let info = parse_info_line(
            "2024-05-01 10:00:00.000;Info: HTTP: POST https://api.example.com/login - 200 - 200 OK",
            1,
        )
        .unwrap();
        assert_eq!(info.timestamp, "2024-05-01 10:00:00.000");
        assert_eq!(info.method, "POST");
        assert_eq!(info.url, "https://api.example.com/login");
        assert_eq!(info.status, Some(200));
    }

    #[test]
    fn test_info_line_with_single_echo_leaves_status_unset() {
        let info = parse_info_line("t;Info: HTTP: GET https://a/b - 204", 1).unwrap();
        assert_eq!(info.status, None);
    }

    #[test]
    fn test_info_line_without_semicolon_is_fatal() {
        let err = parse_info_line("Info: HTTP: GET https://a/b", 4).unwrap_err();
        assert!(matches!(
            err,
            ParseError::MalformedInfoLine { line_number: 4, .. }
        ));
    }

    #[test]
    fn test_info_line_without_enough_colons_is_fatal() {
        let err = parse_info_line("t;Info HTTP GET", 1).unwrap_err();
        assert!(matches!(err, ParseError::MalformedInfoLine { .. }));
    }

    #[test]
    fn test_region_splits_headers_and_body_without_marker() {
        let lines: Vec<String> = [
            "<-- 201 Created https://a/b (12ms)",
            "Content-Type: application/json",
            "no colon here",
            "{\"id\": 1,",
            "\"x\": 2}",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();
        let region = region(&lines);
        assert_eq!(region.status, 201);
        assert_eq!(region.headers.len(), 1);
        assert_eq!(region.headers["Content-Type"], "application/json");
        assert_eq!(region.body.as_deref(), Some("{\"id\": 1,\n\"x\": 2}"));
    }

    #[test]
    fn test_region_without_body_start_has_absent_body() {
        let lines: Vec<String> = vec!["Accept: */*".to_string()];
        assert_eq!(region(&lines).body, None);
    }

    #[test]
    fn test_extract_amends_status_from_response() {
        let text = "\
t0;Info: HTTP: POST https://a/login - 503
Verbose: ===== Request =====
Content-Type: application/json
{\"user\":\"bob\"}
Verbose: ===== Response =====
<-- 503 Service Unavailable https://a/login (40ms)
Retry-After: 30
\"busy\"";
        let record = extract(&block(text)).unwrap();
        assert_eq!(record.status, 503);
        assert_eq!(record.method, "POST");
        assert_eq!(record.request_headers["Content-Type"], "application/json");
        assert_eq!(record.request_body.as_deref(), Some("{\"user\":\"bob\"}"));
        assert_eq!(record.response_headers["Retry-After"], "30");
        assert_eq!(record.response_body.as_deref(), Some("\"busy\""));
    }

    #[test]
    fn test_extract_single_line_block() {
        let record = extract(&block("t0;Info: HTTP: GET https://a/ping")).unwrap();
        assert_eq!(record.status, 0);
        assert_eq!(record.url, "https://a/ping");
        assert_eq!(record.request_body, None);
        assert_eq!(record.response_body, None);
    }

    #[test]
    fn test_extract_propagates_malformed_info_line() {
        let err = extract(&block("Info: HTTP without separator")).unwrap_err();
        assert!(matches!(
            err,
            ParseError::MalformedInfoLine { line_number: 7, .. }
        ));
    }
}
