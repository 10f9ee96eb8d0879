// HttpSleuth - core/pipeline.rs
//
// The pull-based transformation from lines to transaction records:
// Blocks -> Extractor -> (Correlator, split grammars) -> records.
//
// Records come out in the order of their closing event: the separator or
// end marker for contiguous grammars, the resolving response for split
// grammars. All state, including the correlation cache, is owned by one
// `TransactionStream` and dies with it.

use crate::core::correlate::Correlator;
use crate::core::extract::Extracted;
use crate::core::grammar::Grammar;
use crate::core::model::{RunSummary, TransactionRecord};
use crate::core::segment::{Blocks, SegmentConfig};
use crate::util::error::ParseError;
use std::io;

/// Lazy iterator of transaction records over a line source.
///
/// A fatal error is yielded once and ends the stream.
pub struct TransactionStream<I> {
    grammar: Grammar,
    blocks: Blocks<I>,
    correlator: Correlator,
    block_count: usize,
    record_count: usize,
    failed: bool,
}

impl<I> TransactionStream<I>
where
    I: Iterator<Item = io::Result<String>>,
{
    pub fn new(grammar: Grammar, lines: I, config: SegmentConfig) -> Self {
        Self {
            grammar,
            blocks: Blocks::new(lines, grammar.segmenter(config)),
            correlator: Correlator::new(),
            block_count: 0,
            record_count: 0,
            failed: false,
        }
    }

    /// Statistics so far. `records_written` is left for the caller.
    pub fn summary(&self) -> RunSummary {
        RunSummary {
            lines_read: self.blocks.lines_read(),
            blocks: self.block_count,
            records: self.record_count,
            records_written: 0,
            superseded_requests: self.correlator.superseded(),
            dropped_responses: self.correlator.dropped(),
            unresolved_requests: self.correlator.pending(),
            discarded_blocks: self.blocks.discarded(),
        }
    }
}

impl<I> Iterator for TransactionStream<I>
where
    I: Iterator<Item = io::Result<String>>,
{
    type Item = Result<TransactionRecord, ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        loop {
            let block = match self.blocks.next()? {
                Ok(block) => block,
                Err(e) => {
                    self.failed = true;
                    return Some(Err(e));
                }
            };
            self.block_count += 1;

            let record = match self.grammar.extract(&block) {
                Ok(Extracted::Record(record)) => Some(record),
                Ok(Extracted::Half(half)) => self.correlator.accept(half),
                Ok(Extracted::Skipped) => None,
                Err(e) => {
                    self.failed = true;
                    return Some(Err(e));
                }
            };

            if let Some(record) = record {
                self.record_count += 1;
                return Some(Ok(record));
            }
        }
    }
}
