// HttpSleuth - core/render.rs
//
// Output of matched records: the text rendering and JSON lines.
// Core layer: writes to any Write implementation.

use crate::core::model::TransactionRecord;
use crate::util::error::OutputError;
use std::io::Write;

const REQUEST_ARROW: &str = "->";
const RESPONSE_ARROW: &str = "<-";

/// Which optional body lines the text rendering includes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderOptions {
    pub request_body: bool,
    pub response_body: bool,
}

fn io_err(source: std::io::Error) -> OutputError {
    OutputError::Io { source }
}

/// Arrow line, then the body on its own line when there is one.
fn write_body<W: Write>(out: &mut W, arrow: &str, body: Option<&str>) -> Result<(), OutputError> {
    writeln!(out, "{arrow}").map_err(io_err)?;
    match body {
        Some(body) if !body.is_empty() => writeln!(out, "{body}").map_err(io_err),
        _ => Ok(()),
    }
}

/// Render one record as text:
///
/// ```text
/// {timestamp}: {method}:{status} {url}
/// ->
/// {request body}
/// <-
/// {response body}
/// ```
///
/// The arrow sections appear only when enabled in `options`.
pub fn render_text<W: Write>(
    out: &mut W,
    record: &TransactionRecord,
    options: RenderOptions,
) -> Result<(), OutputError> {
    writeln!(out, "{}", record.summary_line()).map_err(io_err)?;
    if options.request_body {
        write_body(out, REQUEST_ARROW, record.request_body.as_deref())?;
    }
    if options.response_body {
        write_body(out, RESPONSE_ARROW, record.response_body.as_deref())?;
    }
    Ok(())
}

/// Write one record as a single JSON line.
pub fn write_json_line<W: Write>(out: &mut W, record: &TransactionRecord) -> Result<(), OutputError> {
    serde_json::to_writer(&mut *out, record).map_err(|e| OutputError::Json { source: e })?;
    out.write_all(b"\n").map_err(io_err)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn login() -> TransactionRecord {
        TransactionRecord {
            timestamp: "2024-05-01 10:00:00".to_string(),
            method: "POST".to_string(),
            url: "/login".to_string(),
            status: 200,
            request_body: Some("{\"user\":\"bob\"}".to_string()),
            response_body: Some(String::new()),
            ..Default::default()
        }
    }

    fn text(record: &TransactionRecord, options: RenderOptions) -> String {
        let mut buf = Vec::new();
        render_text(&mut buf, record, options).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_summary_only_without_body_flags() {
        assert_eq!(
            text(&login(), RenderOptions::default()),
            "2024-05-01 10:00:00: POST:200 /login\n"
        );
    }

    #[test]
    fn test_body_sections() {
        let options = RenderOptions {
            request_body: true,
            response_body: true,
        };
        assert_eq!(
            text(&login(), options),
            "2024-05-01 10:00:00: POST:200 /login\n->\n{\"user\":\"bob\"}\n<-\n"
        );
    }

    #[test]
    fn test_absent_body_prints_bare_arrow() {
        let record = TransactionRecord {
            request_body: None,
            ..login()
        };
        let options = RenderOptions {
            request_body: true,
            response_body: false,
        };
        assert_eq!(
            text(&record, options),
            "2024-05-01 10:00:00: POST:200 /login\n->\n"
        );
    }

    #[test]
    fn test_json_line() {
        let mut buf = Vec::new();
        write_json_line(&mut buf, &login()).unwrap();
        let line = String::from_utf8(buf).unwrap();
        assert!(line.ends_with('\n'));
        assert_eq!(line.matches('\n').count(), 1);

        let value: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(value["status"], 200);
        assert_eq!(value["response_body"], "");
        assert!(value["request_headers"].as_object().unwrap().is_empty());
    }

    #[test]
    fn test_absent_body_serialises_as_null() {
        let record = TransactionRecord {
            response_body: None,
            ..login()
        };
        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("\"response_body\":null"));
    }
}
