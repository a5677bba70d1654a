use std::fmt;
use std::str::FromStr;

use crate::error::EmojiError;
use crate::scan::is_emoji;

/// Fitzpatrick skin-tone modifiers, lightest first.
pub const SKIN_MODIFIERS: [char; 5] = [
    '\u{1F3FB}', // skin type 1-2
    '\u{1F3FC}', // skin type 3
    '\u{1F3FD}', // skin type 4
    '\u{1F3FE}', // skin type 5
    '\u{1F3FF}', // skin type 6
];

/// A validated emoji string, one or more emoji graphemes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Emoji {
    native: String,
}

impl Emoji {
    /// Fails with [`EmojiError::InvalidEmoji`] unless `native` is emoji only.
    pub fn new(native: impl Into<String>) -> Result<Self, EmojiError> {
        let native = native.into();
        if !is_emoji(&native) {
            return Err(EmojiError::InvalidEmoji(native));
        }
        Ok(Self { native })
    }

    pub fn native(&self) -> &str {
        &self.native
    }

    /// Upper-case hex code points joined by `-`, e.g. `1F44D-1F3FD`.
    pub fn unified(&self) -> String {
        to_unified(self.native.chars())
    }

    /// [`unified`](Self::unified) with skin-tone modifiers removed.
    pub fn unified_without_skin(&self) -> String {
        to_unified(self.native.chars().filter(|c| !SKIN_MODIFIERS.contains(c)))
    }

    /// 1 for the default tone, 2..=6 for the modifier present.
    pub fn skin(&self) -> u8 {
        SKIN_MODIFIERS
            .iter()
            .position(|m| self.native.contains(*m))
            .map(|i| i as u8 + 2)
            .unwrap_or(1)
    }
}

/// Code points are padded to four hex digits, matching sprite table keys.
pub fn to_unified(chars: impl Iterator<Item = char>) -> String {
    chars
        .map(|c| format!("{:04X}", c as u32))
        .collect::<Vec<_>>()
        .join("-")
}

impl FromStr for Emoji {
    type Err = EmojiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl fmt::Display for Emoji {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.native)
    }
}

impl AsRef<str> for Emoji {
    fn as_ref(&self) -> &str {
        &self.native
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_plain_text() {
        assert!(matches!(Emoji::new("hi"), Err(EmojiError::InvalidEmoji(s)) if s == "hi"));
        assert!(Emoji::new("").is_err());
        assert!(Emoji::new("🙂 ").is_err());
        assert!(Emoji::new("a🙂").is_err());
    }

    #[test]
    fn test_unified() {
        let e = Emoji::new("🙂").unwrap();
        assert_eq!(e.unified(), "1F642");
        assert_eq!(e.skin(), 1);

        let heart = Emoji::new("❤️").unwrap();
        assert_eq!(heart.unified(), "2764-FE0F");
    }

    #[test]
    fn test_skin_tone() {
        let thumbs = Emoji::new("👍🏽").unwrap();
        assert_eq!(thumbs.unified(), "1F44D-1F3FD");
        assert_eq!(thumbs.unified_without_skin(), "1F44D");
        assert_eq!(thumbs.skin(), 4);
    }

    #[test]
    fn test_parse() {
        let e: Emoji = "😄".parse().unwrap();
        assert_eq!(e.to_string(), "😄");
    }
}
