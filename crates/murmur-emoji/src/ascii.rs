//! ASCII emoticon table.
//!
//! Rules are tried in table order; the first rule found anywhere in the input
//! decides that the input is an emoticon candidate, and conversion then
//! applies every rule, in order, across the whole input.

use std::borrow::Cow;

use crate::emoji::Emoji;

/// Extra context a pattern needs around the literal text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Context {
    None,
    /// The match must be preceded by whitespace, which is replaced by a space.
    AfterWhitespace,
    /// The match must not be followed by `/` (keeps URLs like `http://` intact).
    NotBeforeSlash,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AsciiRule {
    pub pattern: &'static str,
    pub emoji: &'static str,
    pub context: Context,
}

const fn rule(pattern: &'static str, emoji: &'static str) -> AsciiRule {
    AsciiRule {
        pattern,
        emoji,
        context: Context::None,
    }
}

pub const ASCII_RULES: &[AsciiRule] = &[
    AsciiRule {
        pattern: "O:)",
        emoji: "\u{1F607}",
        context: Context::AfterWhitespace,
    },
    rule(":)", "\u{1F642}"),
    rule(":D", "\u{1F603}"),
    rule(":(", "\u{1F61F}"),
    rule(":p", "\u{1F61C}"),
    rule(":P", "\u{1F61C}"),
    rule(":|", "\u{1F610}"),
    rule("(y)", "\u{1F44D}"),
    rule("(Y)", "\u{1F44D}"),
    AsciiRule {
        pattern: ":/",
        emoji: "\u{1F612}",
        context: Context::NotBeforeSlash,
    },
    AsciiRule {
        pattern: ":\\",
        emoji: "\u{1F612}",
        context: Context::NotBeforeSlash,
    },
    rule(":]", "\u{1F60F}"),
    rule("xD", "\u{1F606}"),
    rule(":o", "\u{1F62E}"),
    rule(":O", "\u{1F631}"),
    rule(":'(", "\u{1F622}"),
    rule(">_>", "\u{1F612}"),
    rule("^_^", "\u{1F604}"),
    rule(";)", "\u{1F609}"),
    rule("<3", "\u{2764}\u{FE0F}"),
];

impl AsciiRule {
    /// Byte ranges of non-overlapping matches, left to right. For
    /// [`Context::AfterWhitespace`] the range includes the whitespace char.
    fn matches(&self, input: &str) -> Vec<(usize, usize)> {
        let mut out = Vec::new();
        let mut from = 0;
        while let Some(found) = input[from..].find(self.pattern) {
            let start = from + found;
            let end = start + self.pattern.len();
            let hit = match self.context {
                Context::None => Some(start),
                Context::NotBeforeSlash => (!input[end..].starts_with('/')).then_some(start),
                Context::AfterWhitespace => input[..start]
                    .chars()
                    .next_back()
                    .filter(|c| c.is_whitespace())
                    .map(|c| start - c.len_utf8()),
            };
            match hit {
                Some(hit_start) => {
                    out.push((hit_start, end));
                    from = end;
                }
                None => from = start + 1,
            }
        }
        out
    }

    fn replacement(&self) -> Cow<'static, str> {
        match self.context {
            Context::AfterWhitespace => Cow::Owned(format!(" {}", self.emoji)),
            _ => Cow::Borrowed(self.emoji),
        }
    }

    fn replace_all(&self, input: &str) -> String {
        let mut out = String::with_capacity(input.len());
        let mut last = 0;
        for (start, end) in self.matches(input) {
            out.push_str(&input[last..start]);
            out.push_str(&self.replacement());
            last = end;
        }
        out.push_str(&input[last..]);
        out
    }
}

/// First rule that occurs anywhere in `input`.
pub fn match_ascii_emoji(input: &str) -> Option<&'static AsciiRule> {
    ASCII_RULES.iter().find(|r| !r.matches(input).is_empty())
}

/// Apply every rule in table order.
pub fn convert_ascii_to_emoji(input: &str) -> String {
    ASCII_RULES
        .iter()
        .fold(input.to_string(), |acc, r| r.replace_all(&acc))
}

/// The emoji an emoticon word turns into, when the whole converted word is a
/// valid emoji. `hi:)` matches a rule but converts to `hi🙂`, so it yields
/// nothing.
pub fn ascii_emoji(word: &str) -> Option<Emoji> {
    match_ascii_emoji(word)?;
    Emoji::new(convert_ascii_to_emoji(word)).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_emoticons() {
        let cases = [
            (":)", "🙂"),
            (":D", "😃"),
            (":(", "😟"),
            (":P", "😜"),
            ("(y)", "👍"),
            (":/", "😒"),
            ("xD", "😆"),
            (":'(", "😢"),
            ("^_^", "😄"),
            (";)", "😉"),
            ("<3", "❤️"),
        ];
        for (ascii, native) in cases {
            let converted = ascii_emoji(ascii).map(|e| e.native().to_string());
            assert_eq!(converted.as_deref(), Some(native), "{ascii}");
        }
    }

    #[test]
    fn test_url_slash_not_converted() {
        assert_eq!(match_ascii_emoji("http://x"), None);
        assert_eq!(convert_ascii_to_emoji("http://x"), "http://x");
    }

    #[test]
    fn test_word_with_text_is_not_an_emoji() {
        assert!(match_ascii_emoji("hi:)").is_some());
        assert_eq!(ascii_emoji("hi:)"), None);
    }

    #[test]
    fn test_halo_needs_whitespace() {
        assert_eq!(convert_ascii_to_emoji("a O:)"), "a 😇");
        assert_eq!(convert_ascii_to_emoji("O:)"), "O🙂");
    }

    #[test]
    fn test_first_rule_wins() {
        let rule = match_ascii_emoji(":)").unwrap();
        assert_eq!(rule.pattern, ":)");
        assert_eq!(match_ascii_emoji("plain"), None);
    }
}
