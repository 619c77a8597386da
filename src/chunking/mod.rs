//! Transcript chunking for the summarize/refine reduction.
//!
//! Long transcripts are split into bounded, overlapping segments so that each
//! generation call sees at most `chunk_size` characters of source text.

mod splitter;

pub use splitter::TextSplitter;

use serde::{Deserialize, Serialize};

/// Natural boundary kinds, in order of preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Boundary {
    /// A blank line (`"\n\n"`).
    Paragraph,
    /// Sentence punctuation followed by whitespace.
    Sentence,
    /// Any whitespace.
    Word,
}

impl Boundary {
    /// All boundary kinds, most preferred first.
    pub const PREFERENCE: [Boundary; 3] = [Boundary::Paragraph, Boundary::Sentence, Boundary::Word];

    /// Whether a chunk ending right before `chars[pos]` ends on this boundary.
    pub fn ends_at(self, chars: &[char], pos: usize) -> bool {
        if pos == 0 || pos > chars.len() {
            return false;
        }
        let last = chars[pos - 1];
        match self {
            Boundary::Paragraph => pos >= 2 && last == '\n' && chars[pos - 2] == '\n',
            Boundary::Sentence => {
                pos >= 2 && last.is_whitespace() && matches!(chars[pos - 2], '.' | '!' | '?')
            }
            Boundary::Word => last.is_whitespace(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chars(s: &str) -> Vec<char> {
        s.chars().collect()
    }

    #[test]
    fn test_boundary_detection() {
        let text = chars("Done. Next\n\nPara");
        assert!(Boundary::Sentence.ends_at(&text, 6));
        assert!(Boundary::Word.ends_at(&text, 6));
        assert!(!Boundary::Sentence.ends_at(&text, 5));
        assert!(Boundary::Paragraph.ends_at(&text, 12));
        assert!(!Boundary::Paragraph.ends_at(&text, 11));
        assert!(!Boundary::Word.ends_at(&text, 0));
    }
}
