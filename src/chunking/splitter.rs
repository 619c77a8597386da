//! Recursive boundary-preferring character splitter.

use super::Boundary;
use crate::config::ChunkingSettings;
use crate::error::{RecapError, Result};
use tracing::debug;

/// Splits text into chunks of at most `chunk_size` characters.
///
/// Every chunk after the first starts with the last `chunk_overlap` characters
/// of the chunk before it. Stripping that prefix from each later chunk and
/// concatenating gives back the input unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextSplitter {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl TextSplitter {
    /// Create a splitter. Requires `chunk_size > 0` and `chunk_overlap < chunk_size`.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(RecapError::Config(
                "chunk_size must be greater than zero".to_string(),
            ));
        }
        if chunk_overlap >= chunk_size {
            return Err(RecapError::Config(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                chunk_overlap, chunk_size
            )));
        }

        Ok(Self {
            chunk_size,
            chunk_overlap,
        })
    }

    /// Create a splitter from configuration.
    pub fn from_settings(settings: &ChunkingSettings) -> Result<Self> {
        Self::new(settings.chunk_size, settings.chunk_overlap)
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn chunk_overlap(&self) -> usize {
        self.chunk_overlap
    }

    /// Split `text` into overlapping chunks.
    pub fn split(&self, text: &str) -> Vec<String> {
        let chars: Vec<char> = text.chars().collect();
        let total = chars.len();

        if total == 0 {
            return Vec::new();
        }
        if total <= self.chunk_size {
            return vec![text.to_string()];
        }

        // Byte offset of every char position, plus the end of the string.
        let offsets: Vec<usize> = text
            .char_indices()
            .map(|(i, _)| i)
            .chain(std::iter::once(text.len()))
            .collect();

        let mut chunks = Vec::new();
        // Position where the new (non-overlapping) text of the next chunk begins.
        let mut start = 0;

        loop {
            let chunk_start = if start == 0 {
                0
            } else {
                start - self.chunk_overlap
            };
            let limit = chunk_start + self.chunk_size;

            if limit >= total {
                chunks.push(text[offsets[chunk_start]..].to_string());
                break;
            }

            // The first chunk must hold the whole overlap of the second.
            let min_end = if start == 0 {
                self.chunk_overlap.max(1)
            } else {
                start + 1
            };
            let end = find_break(&chars, min_end, limit);

            chunks.push(text[offsets[chunk_start]..offsets[end]].to_string());
            start = end;
        }

        debug!(
            "Split {} chars into {} chunks (size {}, overlap {})",
            total,
            chunks.len(),
            self.chunk_size,
            self.chunk_overlap
        );

        chunks
    }
}

/// Latest end position in `min_end..=limit` on the most preferred boundary kind,
/// or a hard cut at `limit`.
fn find_break(chars: &[char], min_end: usize, limit: usize) -> usize {
    Boundary::PREFERENCE
        .iter()
        .find_map(|boundary| (min_end..=limit).rev().find(|&pos| boundary.ends_at(chars, pos)))
        .unwrap_or(limit)
}
