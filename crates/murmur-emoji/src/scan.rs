//! Finding emoji inside arbitrary text.
//!
//! Text is split into extended grapheme clusters and each cluster is looked
//! up in the `emojis` catalog, with and without variation selector and skin
//! modifiers. Pure-ASCII clusters never count, so digits, `#` and `*` stay
//! text unless they form a keycap sequence.

use std::ops::Range;

use unicode_segmentation::UnicodeSegmentation;

use crate::emoji::{Emoji, SKIN_MODIFIERS};

const VARIATION_SELECTOR: char = '\u{FE0F}';

/// Catalog entry for a single grapheme, if it is an emoji.
pub fn lookup_grapheme(g: &str) -> Option<&'static emojis::Emoji> {
    if g.is_ascii() || g.chars().any(char::is_whitespace) {
        return None;
    }
    if let Some(e) = emojis::get(g) {
        return Some(e);
    }
    let bare: String = g.chars().filter(|&c| c != VARIATION_SELECTOR).collect();
    if let Some(e) = emojis::get(&bare) {
        return Some(e);
    }
    if let Some(e) = emojis::get(&format!("{bare}{VARIATION_SELECTOR}")) {
        return Some(e);
    }
    let toneless: String = g.chars().filter(|c| !SKIN_MODIFIERS.contains(c)).collect();
    if toneless.len() != g.len() {
        return emojis::get(&toneless);
    }
    None
}

pub fn is_emoji_grapheme(g: &str) -> bool {
    lookup_grapheme(g).is_some()
}

/// True when `s` is non-empty and every grapheme is an emoji.
pub fn is_emoji(s: &str) -> bool {
    !s.is_empty() && s.graphemes(true).all(is_emoji_grapheme)
}

/// True when `s` holds at least one emoji and nothing else but whitespace.
pub fn is_only_emoji(s: &str) -> bool {
    let mut seen = false;
    for g in s.graphemes(true) {
        if g.chars().all(char::is_whitespace) {
            continue;
        }
        if !is_emoji_grapheme(g) {
            return false;
        }
        seen = true;
    }
    seen
}

/// One emoji occurrence in a string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmojiMatch<'a> {
    pub native: &'a str,
    pub byte_range: Range<usize>,
    pub char_range: Range<usize>,
}

/// Every emoji grapheme in `text`, in order.
pub fn find_emojis(text: &str) -> Vec<EmojiMatch<'_>> {
    let mut out = Vec::new();
    let mut chars = 0;
    for (byte, g) in text.grapheme_indices(true) {
        let len = g.chars().count();
        if is_emoji_grapheme(g) {
            out.push(EmojiMatch {
                native: g,
                byte_range: byte..byte + g.len(),
                char_range: chars..chars + len,
            });
        }
        chars += len;
    }
    out
}

/// Text or emoji piece of a tokenized string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token<'a> {
    Text(&'a str),
    Emoji(Emoji),
}

/// Split `text` into alternating text and emoji tokens. Empty text runs are
/// not emitted.
pub fn tokenize(text: &str) -> Vec<Token<'_>> {
    let mut out = Vec::new();
    let mut last = 0;
    for m in find_emojis(text) {
        if m.byte_range.start > last {
            out.push(Token::Text(&text[last..m.byte_range.start]));
        }
        match Emoji::new(m.native) {
            Ok(e) => out.push(Token::Emoji(e)),
            Err(_) => out.push(Token::Text(m.native)),
        }
        last = m.byte_range.end;
    }
    if last < text.len() {
        out.push(Token::Text(&text[last..]));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ascii_is_never_emoji() {
        for s in ["1", "#", "*", ":)", "a"] {
            assert!(!is_emoji(s), "{s}");
        }
    }

    #[test]
    fn test_common_emoji() {
        for s in ["🙂", "❤️", "❤", "👍🏽", "👨‍👩‍👧", "🇫🇷", "😄😄"] {
            assert!(is_emoji(s), "{s}");
        }
    }

    #[test]
    fn test_find_emojis_offsets() {
        let found = find_emojis("hi 🙂 there 👍🏽!");
        let ranges: Vec<_> = found.iter().map(|m| (m.native, m.char_range.clone())).collect();
        assert_eq!(ranges, vec![("🙂", 3..4), ("👍🏽", 11..13)]);
    }

    #[test]
    fn test_tokenize() {
        let tokens = tokenize("a🙂b");
        assert_eq!(tokens.len(), 3);
        assert_eq!(tokens[0], Token::Text("a"));
        assert!(matches!(&tokens[1], Token::Emoji(e) if e.native() == "🙂"));
        assert_eq!(tokens[2], Token::Text("b"));
    }

    #[test]
    fn test_only_emoji() {
        assert!(is_only_emoji("🙂 😄"));
        assert!(!is_only_emoji("🙂 ok"));
        assert!(!is_only_emoji("   "));
    }
}
