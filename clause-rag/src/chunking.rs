//! Document chunking strategies.
//!
//! This module provides the [`Chunker`] trait and two implementations:
//!
//! - [`FixedSizeChunker`] — splits by character count with optional overlap
//! - [`SentenceChunker`] — packs whole sentences and paragraphs into chunks
//!
//! All sizes and offsets are measured in characters (Unicode scalar values),
//! so a chunk boundary never falls inside a multi-byte character.

use serde::{Deserialize, Serialize};

use crate::document::Chunk;
use crate::error::{RagError, Result};

/// A strategy for splitting text into chunks.
pub trait Chunker: Send + Sync {
    /// Split text into chunks in document order.
    ///
    /// Returns an empty `Vec` for empty text.
    fn chunk(&self, text: &str) -> Vec<Chunk>;
}

/// Which [`Chunker`] the pipeline builds for a request.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ChunkingStrategy {
    /// Fixed character windows, see [`FixedSizeChunker`].
    #[default]
    Fixed,
    /// Sentence-aware packing, see [`SentenceChunker`].
    Sentence,
}

impl ChunkingStrategy {
    /// Build a chunker for this strategy.
    ///
    /// `chunk_overlap` only applies to [`ChunkingStrategy::Fixed`].
    pub fn chunker(self, chunk_size: usize, chunk_overlap: usize) -> Result<Box<dyn Chunker>> {
        Ok(match self {
            Self::Fixed => Box::new(FixedSizeChunker::new(chunk_size, chunk_overlap)?),
            Self::Sentence => Box::new(SentenceChunker::new(chunk_size)?),
        })
    }
}

/// Split `text` into consecutive, non-overlapping windows of `chunk_size`
/// characters. The last chunk may be shorter.
///
/// # Errors
///
/// Returns [`RagError::InvalidChunkSize`] if `chunk_size` is zero.
pub fn chunk_text(text: &str, chunk_size: usize) -> Result<Vec<Chunk>> {
    Ok(FixedSizeChunker::new(chunk_size, 0)?.chunk(text))
}

/// Byte offset of every character start, plus `text.len()` as a sentinel.
fn char_boundaries(text: &str) -> Vec<usize> {
    text.char_indices().map(|(i, _)| i).chain(std::iter::once(text.len())).collect()
}

/// Turn character ranges into chunks, numbering them in order.
fn chunks_from_ranges(text: &str, ranges: &[(usize, usize)]) -> Vec<Chunk> {
    let boundaries = char_boundaries(text);
    ranges
        .iter()
        .enumerate()
        .map(|(index, &(start, end))| Chunk {
            index,
            offset: start,
            text: text[boundaries[start]..boundaries[end]].to_string(),
        })
        .collect()
}

/// Splits text into fixed-size chunks by character count with configurable overlap.
///
/// With zero overlap the chunks partition the text exactly: concatenating
/// them in order reproduces the input.
///
/// # Example
///
/// ```rust
/// use clause_rag::{Chunker, FixedSizeChunker};
///
/// let chunker = FixedSizeChunker::new(20, 0).unwrap();
/// let chunks = chunker.chunk("Cataract surgery has a 2-year waiting period.");
/// assert_eq!(chunks.len(), 3);
/// ```
#[derive(Debug, Clone)]
pub struct FixedSizeChunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl FixedSizeChunker {
    /// Create a new `FixedSizeChunker`.
    ///
    /// # Arguments
    ///
    /// * `chunk_size` — maximum number of characters per chunk
    /// * `chunk_overlap` — number of characters shared by consecutive chunks
    ///
    /// # Errors
    ///
    /// Returns [`RagError::InvalidChunkSize`] if `chunk_size` is zero and
    /// [`RagError::ConfigError`] if `chunk_overlap >= chunk_size`.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(RagError::InvalidChunkSize);
        }
        if chunk_overlap >= chunk_size {
            return Err(RagError::ConfigError(format!(
                "chunk_overlap ({chunk_overlap}) must be less than chunk_size ({chunk_size})"
            )));
        }
        Ok(Self { chunk_size, chunk_overlap })
    }

    fn ranges(&self, char_count: usize) -> Vec<(usize, usize)> {
        let step = self.chunk_size - self.chunk_overlap;
        let mut ranges = Vec::new();
        let mut start = 0;

        while start < char_count {
            let end = (start + self.chunk_size).min(char_count);
            ranges.push((start, end));
            if end == char_count {
                break;
            }
            start += step;
        }

        ranges
    }
}

impl Chunker for FixedSizeChunker {
    fn chunk(&self, text: &str) -> Vec<Chunk> {
        if text.is_empty() {
            return Vec::new();
        }
        let ranges = self.ranges(text.chars().count());
        chunks_from_ranges(text, &ranges)
    }
}

/// Packs sentences into chunks of at most `chunk_size` characters.
///
/// Text is cut after line breaks and after whitespace that follows `.`,
/// `!` or `?`. Consecutive segments are merged while they fit; a segment
/// longer than `chunk_size` is split into fixed windows. The whitespace
/// that ends a sentence stays with it, so the chunks still partition the
/// text exactly.
#[derive(Debug, Clone)]
pub struct SentenceChunker {
    chunk_size: usize,
}

impl SentenceChunker {
    /// Create a new `SentenceChunker`.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::InvalidChunkSize`] if `chunk_size` is zero.
    pub fn new(chunk_size: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(RagError::InvalidChunkSize);
        }
        Ok(Self { chunk_size })
    }
}

/// Character ranges of sentence-like segments, covering the whole input.
fn sentence_segments(chars: &[char]) -> Vec<(usize, usize)> {
    let mut segments = Vec::new();
    let mut start = 0;

    for (i, c) in chars.iter().enumerate() {
        let after_terminator = i > 0 && matches!(chars[i - 1], '.' | '!' | '?');
        if *c == '\n' || (c.is_whitespace() && after_terminator) {
            segments.push((start, i + 1));
            start = i + 1;
        }
    }

    if start < chars.len() {
        segments.push((start, chars.len()));
    }

    segments
}

impl Chunker for SentenceChunker {
    fn chunk(&self, text: &str) -> Vec<Chunk> {
        if text.is_empty() {
            return Vec::new();
        }

        let chars: Vec<char> = text.chars().collect();
        let mut ranges = Vec::new();
        let mut current: Option<(usize, usize)> = None;

        for (start, end) in sentence_segments(&chars) {
            if end - start > self.chunk_size {
                ranges.extend(current.take());
                let mut window = start;
                while window < end {
                    let window_end = (window + self.chunk_size).min(end);
                    ranges.push((window, window_end));
                    window = window_end;
                }
                continue;
            }

            current = match current {
                None => Some((start, end)),
                Some((current_start, _)) if end - current_start <= self.chunk_size => {
                    Some((current_start, end))
                }
                Some(full) => {
                    ranges.push(full);
                    Some((start, end))
                }
            };
        }
        ranges.extend(current);

        chunks_from_ranges(text, &ranges)
    }
}
