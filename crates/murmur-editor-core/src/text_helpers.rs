//! Word boundary helpers around a caret inside a single text run.
//!
//! Offsets are char offsets into the text node the caret sits in.

use std::ops::Range;

/// Whitespace as the selection scans see it.
pub fn is_word_break(c: char) -> bool {
    c.is_whitespace() || c == '\u{feff}'
}

/// Raw word scan around `caret`.
///
/// Start is the first non-whitespace index after the last whitespace at or
/// before `caret - 1`. End is found by scanning right from `caret - 1` to the
/// first whitespace. When the char right before the caret is whitespace the
/// end lands *before* the start; callers decide how to read that.
pub fn word_bounds(text: &str, caret: usize) -> (usize, usize) {
    let chars: Vec<char> = text.chars().collect();
    let caret = caret.min(chars.len());

    let mut start = caret;
    while start > 0 && !is_word_break(chars[start - 1]) {
        start -= 1;
    }

    let mut end = caret.saturating_sub(1);
    while end < chars.len() && !is_word_break(chars[end]) {
        end += 1;
    }

    (start, end)
}

/// The range a commit should replace: the word around the caret, or an
/// empty range at the scan end when the scan crossed over.
pub fn word_range(text: &str, caret: usize) -> Range<usize> {
    let (start, end) = word_bounds(text, caret);
    if end < start { end..end } else { start..end }
}

/// The contiguous run of non-whitespace around the caret.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentWord {
    pub text: String,
    pub start_offset: usize,
    pub end_offset: usize,
}

impl CurrentWord {
    /// Read the word around `caret`. `None` for empty text.
    ///
    /// A crossed-over scan reads the span between the two bounds, so a caret
    /// right after whitespace yields that whitespace char as the word.
    pub fn at(text: &str, caret: usize) -> Option<Self> {
        if text.is_empty() {
            return None;
        }
        let (start, end) = word_bounds(text, caret);
        let (lo, hi) = if end < start { (end, start) } else { (start, end) };
        let word: String = text.chars().skip(lo).take(hi - lo).collect();
        Some(Self {
            text: word,
            start_offset: lo,
            end_offset: hi,
        })
    }

    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }

    pub fn char_len(&self) -> usize {
        self.end_offset - self.start_offset
    }
}
