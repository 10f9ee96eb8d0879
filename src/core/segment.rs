// HttpSleuth - core/segment.rs
//
// Streaming segmentation of a line sequence into raw blocks.
// Core layer: pulls lines from any iterator, never touches the filesystem.
//
// Every strategy is push-based (`feed` one line, maybe get a closed block
// back) and holds only the lines of the currently open block. `Blocks`
// adapts a strategy into a lazy, forward-only iterator.

use crate::core::model::{Block, BlockKind, Role};
use crate::util::constants;
use crate::util::error::{preview, ParseError};
use std::io;

/// Limits applied while segmenting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentConfig {
    pub max_block_lines: usize,
}

impl Default for SegmentConfig {
    fn default() -> Self {
        Self {
            max_block_lines: constants::DEFAULT_MAX_BLOCK_LINES,
        }
    }
}

/// One segmentation strategy.
pub trait Segmenter {
    /// Consume the next line. Returns a block when this line closes one.
    fn feed(&mut self, line_number: u64, line: String) -> Option<Block>;

    /// End of input. Returns a block only if the strategy accepts an
    /// unterminated trailing block.
    fn finish(&mut self) -> Option<Block>;

    /// Blocks dropped because their terminator never arrived.
    fn discarded(&self) -> usize;
}

/// Append `line` unless the block is already at the cap.
fn push_capped(block: &mut Block, line: String, config: &SegmentConfig) {
    if block.lines.len() < config.max_block_lines {
        block.lines.push(line);
    } else if !block.truncated {
        block.truncated = true;
        tracing::warn!(
            start_line = block.start_line,
            max = config.max_block_lines,
            "Block exceeds line cap; further lines dropped"
        );
    }
}

fn discard(block: &Block, reason: &'static str, discarded: &mut usize) {
    *discarded += 1;
    tracing::debug!(
        start_line = block.start_line,
        end_line = block.end_line(),
        reason,
        "Discarding unterminated block"
    );
}

// =============================================================================
// Contiguous debug grammars
// =============================================================================

/// `## INFO` opens a block, a dash separator emits it.
///
/// A second `## INFO` before the separator, or end of input, discards the
/// open block: only separator-terminated blocks are complete.
#[derive(Debug, Default)]
pub struct DebugSegmenter {
    config: SegmentConfig,
    open: Option<Block>,
    discarded: usize,
}

impl DebugSegmenter {
    pub fn new(config: SegmentConfig) -> Self {
        Self {
            config,
            open: None,
            discarded: 0,
        }
    }
}

impl Segmenter for DebugSegmenter {
    fn feed(&mut self, line_number: u64, line: String) -> Option<Block> {
        if line.starts_with(constants::DEBUG_INFO_MARKER) {
            if let Some(stale) = self.open.take() {
                discard(&stale, "new info marker before separator", &mut self.discarded);
            }
            self.open = Some(Block::new(BlockKind::Transaction, line_number, line));
            return None;
        }
        if line.starts_with(constants::DEBUG_SEPARATOR) {
            return self.open.take();
        }
        if let Some(block) = self.open.as_mut() {
            push_capped(block, line, &self.config);
        }
        None
    }

    fn finish(&mut self) -> Option<Block> {
        if let Some(stale) = self.open.take() {
            discard(&stale, "end of input before separator", &mut self.discarded);
        }
        None
    }

    fn discarded(&self) -> usize {
        self.discarded
    }
}

// =============================================================================
// Composite info line grammar
// =============================================================================

/// `Info: HTTP` opens a block. A block whose second line is not the
/// request marker is a single-line block and closes immediately; otherwise
/// it runs until `<-- END HTTP` or the next info line.
#[derive(Debug, Default)]
pub struct OkHttpSegmenter {
    config: SegmentConfig,
    open: Option<Block>,
    /// The open block has seen its request marker.
    confirmed: bool,
    discarded: usize,
}

impl OkHttpSegmenter {
    pub fn new(config: SegmentConfig) -> Self {
        Self {
            config,
            open: None,
            confirmed: false,
            discarded: 0,
        }
    }

    fn start_if_info(&mut self, line_number: u64, line: String) {
        if line.contains(constants::OKHTTP_INFO_MARKER) {
            self.open = Some(Block::new(BlockKind::Transaction, line_number, line));
            self.confirmed = false;
        }
    }
}

impl Segmenter for OkHttpSegmenter {
    fn feed(&mut self, line_number: u64, line: String) -> Option<Block> {
        match self.open.take() {
            None => {
                self.start_if_info(line_number, line);
                None
            }
            Some(mut block) if !self.confirmed => {
                if line.contains(constants::OKHTTP_REQUEST_MARKER) {
                    push_capped(&mut block, line, &self.config);
                    self.confirmed = true;
                    self.open = Some(block);
                    None
                } else {
                    self.start_if_info(line_number, line);
                    Some(block)
                }
            }
            Some(mut block) => {
                if line.starts_with(constants::OKHTTP_END_MARKER) {
                    self.confirmed = false;
                    Some(block)
                } else if line.contains(constants::OKHTTP_INFO_MARKER) {
                    self.start_if_info(line_number, line);
                    Some(block)
                } else {
                    push_capped(&mut block, line, &self.config);
                    self.open = Some(block);
                    None
                }
            }
        }
    }

    fn finish(&mut self) -> Option<Block> {
        if let Some(stale) = self.open.take() {
            discard(&stale, "end of input before next line", &mut self.discarded);
        }
        None
    }

    fn discarded(&self) -> usize {
        self.discarded
    }
}

// =============================================================================
// Split grammars
// =============================================================================

/// Classification of one line by a split grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Marker {
    Start(Role),
    End,
    Content,
}

/// Marker rules of the Android async logger.
pub fn android_async_marker(line: &str) -> Marker {
    if line.contains(constants::ASYNC_REQUEST_MARKER) {
        Marker::Start(Role::Request)
    } else if line.contains(constants::ASYNC_RESPONSE_MARKER) {
        Marker::Start(Role::Response)
    } else if constants::ASYNC_END_MARKERS
        .iter()
        .any(|m| line.contains(m))
    {
        Marker::End
    } else {
        Marker::Content
    }
}

/// Marker rules of the iOS networking logger.
pub fn curl_marker(line: &str) -> Marker {
    if line.contains(constants::CURL_REQUEST_MARKER) {
        Marker::Start(Role::Request)
    } else if line.contains(constants::CURL_RESPONSE_MARKER) {
        Marker::Start(Role::Response)
    } else if line.contains(constants::CURL_END_MARKER) {
        Marker::End
    } else {
        Marker::Content
    }
}

/// A start marker opens a block of that role; the block runs until the
/// next start marker or an end marker.
pub struct SplitSegmenter {
    config: SegmentConfig,
    classify: fn(&str) -> Marker,
    open: Option<Block>,
    discarded: usize,
}

impl SplitSegmenter {
    pub fn new(config: SegmentConfig, classify: fn(&str) -> Marker) -> Self {
        Self {
            config,
            classify,
            open: None,
            discarded: 0,
        }
    }
}

impl Segmenter for SplitSegmenter {
    fn feed(&mut self, line_number: u64, line: String) -> Option<Block> {
        match (self.classify)(&line) {
            Marker::Start(role) => {
                let closed = self.open.take();
                self.open = Some(Block::new(BlockKind::Half(role), line_number, line));
                closed
            }
            Marker::End => self.open.take(),
            Marker::Content => {
                if let Some(block) = self.open.as_mut() {
                    push_capped(block, line, &self.config);
                } else if !line.trim().is_empty() {
                    tracing::trace!(line_number, line = %preview(&line), "Line outside any block");
                }
                None
            }
        }
    }

    fn finish(&mut self) -> Option<Block> {
        if let Some(stale) = self.open.take() {
            discard(&stale, "end of input before end marker", &mut self.discarded);
        }
        None
    }

    fn discarded(&self) -> usize {
        self.discarded
    }
}

// =============================================================================
// Lazy block iterator
// =============================================================================

/// Pulls lines on demand and yields blocks as they close.
///
/// A read error is yielded once and ends the iteration.
pub struct Blocks<I> {
    lines: I,
    segmenter: Box<dyn Segmenter>,
    line_number: u64,
    done: bool,
}

impl<I> Blocks<I>
where
    I: Iterator<Item = io::Result<String>>,
{
    pub fn new(lines: I, segmenter: Box<dyn Segmenter>) -> Self {
        Self {
            lines,
            segmenter,
            line_number: 0,
            done: false,
        }
    }

    /// Lines consumed so far.
    pub fn lines_read(&self) -> u64 {
        self.line_number
    }

    /// Blocks the segmenter dropped so far.
    pub fn discarded(&self) -> usize {
        self.segmenter.discarded()
    }
}

impl<I> Iterator for Blocks<I>
where
    I: Iterator<Item = io::Result<String>>,
{
    type Item = Result<Block, ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        loop {
            match self.lines.next() {
                Some(Ok(line)) => {
                    self.line_number += 1;
                    if let Some(block) = self.segmenter.feed(self.line_number, line) {
                        return Some(Ok(block));
                    }
                }
                Some(Err(source)) => {
                    self.done = true;
                    return Some(Err(ParseError::Read {
                        line_number: self.line_number + 1,
                        source,
                    }));
                }
                None => {
                    self.done = true;
                    return self.segmenter.finish().map(Ok);
                }
            }
        }
    }
}
