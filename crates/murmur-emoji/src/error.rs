/// Errors from emoji parsing and emoji data sources.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum EmojiError {
    /// The string is not made of emoji graphemes only.
    #[error("invalid emoji: {0:?}")]
    InvalidEmoji(String),

    #[error("malformed sprite table: {0}")]
    SpriteTable(#[from] serde_json::Error),

    #[error("emoji lookup failed: {0}")]
    Lookup(String),
}
