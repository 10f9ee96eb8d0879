// HttpSleuth - app/scan.rs
//
// One run over one log: open, detect, stream, filter, render, summarise.
//
// The run is a single synchronous pass. The detection sample is read up
// front and replayed in front of the rest of the stream, so nothing is
// read twice and nothing beyond the sample is buffered.

use crate::core::filter::FilterState;
use crate::core::grammar;
use crate::core::model::RunSummary;
use crate::core::pipeline::TransactionStream;
use crate::core::render::{self, RenderOptions};
use crate::core::segment::SegmentConfig;
use crate::platform::fs;
use crate::util::constants;
use crate::util::error::{HttpSleuthError, OutputError, ParseError};
use std::io::{self, Write};
use std::path::Path;

/// Everything a run needs besides its input and output.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub render: RenderOptions,
    pub filter: FilterState,
    /// JSON lines instead of the text rendering.
    pub json: bool,
    /// Lines sampled for grammar detection.
    pub detection_lines: usize,
    pub segment: SegmentConfig,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            render: RenderOptions::default(),
            filter: FilterState::default(),
            json: false,
            detection_lines: constants::DEFAULT_DETECTION_LINES,
            segment: SegmentConfig::default(),
        }
    }
}

/// Process the log at `path`, writing matches to `out`.
pub fn run<W: Write>(
    path: &Path,
    options: &RunOptions,
    out: &mut W,
) -> Result<RunSummary, HttpSleuthError> {
    let lines = fs::open_lines(path).map_err(|e| HttpSleuthError::Io {
        path: path.to_path_buf(),
        operation: "open",
        source: e,
    })?;
    tracing::info!(path = %path.display(), "Processing log");
    run_lines(lines, options, out)
}

/// Process an already-open line source.
pub fn run_lines<I, W>(
    mut lines: I,
    options: &RunOptions,
    out: &mut W,
) -> Result<RunSummary, HttpSleuthError>
where
    I: Iterator<Item = io::Result<String>>,
    W: Write,
{
    let sample_len = options.detection_lines.max(constants::MIN_DETECTION_LINES);
    let mut sample = Vec::with_capacity(sample_len);
    for line_number in 1..=sample_len as u64 {
        match lines.next() {
            Some(Ok(line)) => sample.push(line),
            Some(Err(e)) => return Err(ParseError::Read { line_number, source: e }.into()),
            None => break,
        }
    }

    let grammar = grammar::detect(&sample)?;
    tracing::info!(grammar = %grammar, "Grammar detected");

    let replay = sample.into_iter().map(Ok).chain(lines);
    let mut stream = TransactionStream::new(grammar, replay, options.segment);

    let mut written = 0;
    for record in stream.by_ref() {
        let record = record?;
        if !options.filter.matches(&record) {
            continue;
        }
        if options.json {
            render::write_json_line(out, &record)?;
        } else {
            render::render_text(out, &record, options.render)?;
        }
        written += 1;
    }
    out.flush().map_err(|e| OutputError::Io { source: e })?;

    let summary = RunSummary {
        records_written: written,
        ..stream.summary()
    };

    tracing::info!(
        grammar = %grammar,
        lines = summary.lines_read,
        blocks = summary.blocks,
        records = summary.records,
        written = summary.records_written,
        "Run complete"
    );
    if grammar.is_split() {
        tracing::debug!(
            superseded = summary.superseded_requests,
            dropped = summary.dropped_responses,
            unresolved = summary.unresolved_requests,
            "Correlation summary"
        );
    }
    if summary.discarded_blocks > 0 {
        tracing::debug!(discarded = summary.discarded_blocks, "Unterminated blocks discarded");
    }

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::filter::StatusFilter;

    fn options() -> RunOptions {
        RunOptions::default()
    }

    fn run_text(text: &str, options: &RunOptions) -> Result<(String, RunSummary), HttpSleuthError> {
        let mut out = Vec::new();
        let summary = run_lines(text.lines().map(|l| Ok(l.to_string())), options, &mut out)?;
        Ok((String::from_utf8(out).unwrap(), summary))
    }

    const DEBUG_LOG: &str = "\
## INFO
[URL]
/login
[Method]
POST
[Status]
200
[Request date]
2024-05-01 10:00:00
## REQUEST
### Headers
[Content-Type]
application/json
### Body
{\"user\":\"bob\"}
## RESPONSE
### Headers
### Body
Response body is empty
------------------------------
";

    #[test]
    fn test_debug_log_renders_summary_line() {
        let (out, summary) = run_text(DEBUG_LOG, &options()).unwrap();
        assert_eq!(out, "2024-05-01 10:00:00: POST:200 /login\n");
        assert_eq!(summary.records_written, 1);
        // The sample lines are replayed, not lost.
        assert_eq!(summary.lines_read, DEBUG_LOG.lines().count() as u64);
    }

    #[test]
    fn test_status_filter_applied() {
        let mut opts = options();
        opts.filter.status = StatusFilter::NotOk;
        let (out, summary) = run_text(DEBUG_LOG, &opts).unwrap();
        assert!(out.is_empty());
        assert_eq!(summary.records, 1);
        assert_eq!(summary.records_written, 0);
    }

    #[test]
    fn test_json_output() {
        let mut opts = options();
        opts.json = true;
        let (out, _) = run_text(DEBUG_LOG, &opts).unwrap();
        let value: serde_json::Value = serde_json::from_str(out.trim_end()).unwrap();
        assert_eq!(value["method"], "POST");
        assert_eq!(value["response_body"], "");
    }

    #[test]
    fn test_unknown_grammar_is_detect_error() {
        let err = run_text("plain text\nnothing here\n", &options()).unwrap_err();
        assert!(matches!(err, HttpSleuthError::Detect(_)));
    }

    #[test]
    fn test_input_shorter_than_sample() {
        let mut opts = options();
        opts.detection_lines = 64;
        let (out, _) = run_text(DEBUG_LOG, &opts).unwrap();
        assert_eq!(out.lines().count(), 1);
    }

    #[test]
    fn test_small_sample_still_sees_past_logcat_preamble() {
        let text = format!(
            "--------- beginning of main\n--------- beginning of system\n{DEBUG_LOG}"
        );
        let mut opts = options();
        opts.detection_lines = 2;
        let (out, summary) = run_text(&text, &opts).unwrap();
        assert_eq!(out, "2024-05-01 10:00:00: POST:200 /login\n");
        assert_eq!(summary.records_written, 1);
    }

    #[test]
    fn test_read_error_in_sample_is_fatal() {
        let lines = vec![
            Ok("## INFO".to_string()),
            Err(io::Error::new(io::ErrorKind::Other, "disk gone")),
        ];
        let mut out = Vec::new();
        let err = run_lines(lines.into_iter(), &options(), &mut out).unwrap_err();
        assert!(matches!(
            err,
            HttpSleuthError::Parse(ParseError::Read { line_number: 2, .. })
        ));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut out = Vec::new();
        let err = run(&dir.path().join("missing.log"), &options(), &mut out).unwrap_err();
        assert!(matches!(err, HttpSleuthError::Io { operation: "open", .. }));
    }
}
