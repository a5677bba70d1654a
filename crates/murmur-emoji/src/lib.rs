//! murmur-emoji: emoji recognition, ASCII emoticons and sprite-sheet lookup.
//!
//! - [`Emoji`] is a validated emoji string with code point helpers
//! - [`scan`] finds emoji graphemes inside text
//! - [`ascii`] holds the emoticon table used for live conversion
//! - [`EmojiData`] is the metadata port, implemented by [`EmojiCatalog`]

pub mod ascii;
pub mod data;
pub mod emoji;
pub mod error;
pub mod scan;
pub mod sprite;

pub use ascii::{ASCII_RULES, AsciiRule, ascii_emoji, convert_ascii_to_emoji, match_ascii_emoji};
pub use data::{EmojiCatalog, EmojiData, EmojiEntry, SpriteCoordinates, SpriteTable};
pub use emoji::{Emoji, SKIN_MODIFIERS, to_unified};
pub use error::EmojiError;
pub use scan::{EmojiMatch, Token, find_emojis, is_emoji, is_emoji_grapheme, is_only_emoji, tokenize};
pub use sprite::{SpriteSheet, SpriteStyle};
