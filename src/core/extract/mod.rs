// HttpSleuth - core/extract/mod.rs
//
// Field extraction: raw block -> structured record.
// One submodule per lexical style; the helpers below are shared by all.
// Block-level problems never fail extraction, they degrade the record.
// The only error is a structural failure of a mandatory field.

pub mod bracketed;
pub mod composite;
pub mod split;

use crate::core::model::{Headers, HalfRecord, TransactionRecord};

/// Outcome of extracting one block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extracted {
    /// Contiguous grammars: the block was a whole transaction.
    Record(TransactionRecord),

    /// Split grammars: one side, to be correlated.
    Half(HalfRecord),

    /// The block's opening line could not be attributed (no id); dropped.
    Skipped,
}

/// Split a `Name: value` line once at the first `:`.
///
/// Lines without a `:` or with an empty name are not headers.
pub(crate) fn colon_header(line: &str) -> Option<(String, String)> {
    let (name, value) = line.split_once(':')?;
    let name = name.trim();
    if name.is_empty() {
        return None;
    }
    Some((name.to_string(), value.trim().to_string()))
}

/// Collect colon headers from `lines`, last write wins.
pub(crate) fn colon_headers<'a, I>(lines: I) -> Headers
where
    I: IntoIterator<Item = &'a String>,
{
    lines
        .into_iter()
        .filter_map(|line| colon_header(line))
        .collect()
}

/// Join body lines and trim surrounding blank lines.
pub(crate) fn join_body(lines: &[String]) -> String {
    lines.join("\n").trim_matches('\n').to_string()
}

/// Parse a status field. Anything that is not a 3-digit code is `None`.
pub(crate) fn parse_status(raw: &str) -> Option<u16> {
    raw.trim()
        .parse::<u16>()
        .ok()
        .filter(|code| (100..=999).contains(code))
}
