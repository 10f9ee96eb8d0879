// HttpSleuth - core/grammar.rs
//
// The fixed set of supported log grammars, sniff-based detection, and
// per-grammar dispatch to a segmentation strategy and an extractor.
// Detection is pure classification over the first lines of the input.

use crate::core::extract::bracketed::{self, KeyCase};
use crate::core::extract::{composite, split, Extracted};
use crate::core::model::Block;
use crate::core::segment::{
    android_async_marker, curl_marker, DebugSegmenter, OkHttpSegmenter, SegmentConfig,
    Segmenter, SplitSegmenter,
};
use crate::util::constants;
use crate::util::error::{preview, DetectError, ParseError};

/// One supported log source format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Grammar {
    /// iOS debug export: `## INFO` blocks, bracketed keys kept as written.
    IosDebug,
    /// Android debug export behind a logcat banner: bracketed keys folded.
    AndroidDebug,
    /// OkHttp logging interceptor: composite info line, markerless bodies.
    OkHttp,
    /// Android async logger: request/response blocks with `[id]`.
    AndroidAsync,
    /// iOS networking logger: curl-rendered requests, separate responses.
    IosCurl,
}

impl Grammar {
    /// All grammars in detection order.
    pub fn all() -> &'static [Grammar] {
        &[
            Grammar::IosDebug,
            Grammar::AndroidDebug,
            Grammar::OkHttp,
            Grammar::AndroidAsync,
            Grammar::IosCurl,
        ]
    }

    /// Stable identifier used in logs.
    pub fn label(&self) -> &'static str {
        match self {
            Grammar::IosDebug => "ios-debug",
            Grammar::AndroidDebug => "android-debug",
            Grammar::OkHttp => "okhttp",
            Grammar::AndroidAsync => "android-async",
            Grammar::IosCurl => "ios-curl",
        }
    }

    /// Request and response arrive as separate blocks.
    pub fn is_split(&self) -> bool {
        matches!(self, Grammar::AndroidAsync | Grammar::IosCurl)
    }

    /// Fresh segmentation strategy for one run.
    pub fn segmenter(&self, config: SegmentConfig) -> Box<dyn Segmenter> {
        match self {
            Grammar::IosDebug | Grammar::AndroidDebug => Box::new(DebugSegmenter::new(config)),
            Grammar::OkHttp => Box::new(OkHttpSegmenter::new(config)),
            Grammar::AndroidAsync => Box::new(SplitSegmenter::new(config, android_async_marker)),
            Grammar::IosCurl => Box::new(SplitSegmenter::new(config, curl_marker)),
        }
    }

    /// Extract one block produced by this grammar's segmenter.
    pub fn extract(&self, block: &Block) -> Result<Extracted, ParseError> {
        let extracted = match self {
            Grammar::IosDebug => Extracted::Record(bracketed::extract(block, KeyCase::Preserve)),
            Grammar::AndroidDebug => Extracted::Record(bracketed::extract(block, KeyCase::Fold)),
            Grammar::OkHttp => Extracted::Record(composite::extract(block)?),
            Grammar::AndroidAsync => split::extract_android_async(block)
                .map_or(Extracted::Skipped, Extracted::Half),
            Grammar::IosCurl => split::extract_curl(block).map_or(Extracted::Skipped, Extracted::Half),
        };
        Ok(extracted)
    }

    /// Does `first` (with `rest` as lookahead) carry this grammar's sentinel?
    fn sniff(&self, first: &str, rest: &[String]) -> bool {
        match self {
            Grammar::IosDebug => first.starts_with(constants::DEBUG_INFO_MARKER),
            Grammar::AndroidDebug => {
                if !first.starts_with(constants::LOGCAT_PREAMBLE) {
                    return false;
                }
                rest.iter()
                    .take(constants::PREAMBLE_LOOKAHEAD_LINES)
                    .find(|l| !l.starts_with(constants::LOGCAT_PREAMBLE))
                    .is_some_and(|l| l.starts_with(constants::DEBUG_INFO_MARKER))
            }
            Grammar::OkHttp => first.contains(constants::OKHTTP_INFO_MARKER),
            Grammar::AndroidAsync => {
                first.contains(constants::ASYNC_REQUEST_MARKER)
                    || first.contains(constants::ASYNC_RESPONSE_MARKER)
            }
            Grammar::IosCurl => {
                first.contains(constants::CURL_REQUEST_MARKER)
                    || first.contains(constants::CURL_RESPONSE_MARKER)
            }
        }
    }
}

impl std::fmt::Display for Grammar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Select the grammar of a log from its first lines.
///
/// Sentinels are checked in `Grammar::all()` order and the first match
/// wins. There is no fallback: an unmatched sample is an unsupported file.
pub fn detect(sample: &[String]) -> Result<Grammar, DetectError> {
    let Some((first, rest)) = sample.split_first() else {
        return Err(DetectError::UnknownGrammar { first_line: None });
    };

    let detected = Grammar::all()
        .iter()
        .copied()
        .find(|grammar| grammar.sniff(first, rest));

    tracing::debug!(result = ?detected, "Grammar detection complete");

    detected.ok_or_else(|| DetectError::UnknownGrammar {
        first_line: Some(preview(first)),
    })
}
