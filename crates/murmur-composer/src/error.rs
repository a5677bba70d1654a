use murmur_editor_core::DocumentError;
use murmur_emoji::EmojiError;

/// Errors surfaced by composer operations.
///
/// Most composer failures are silent no-ops by contract; these are the cases
/// where a caller asked for something specific and it could not be done.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ComposerError {
    #[error(transparent)]
    Document(#[from] DocumentError),

    #[error(transparent)]
    Emoji(#[from] EmojiError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    /// No candidate at the requested index.
    #[error("no candidate at index {index} (list has {len})")]
    NoCandidate { index: usize, len: usize },
}

/// Configuration loading errors.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("invalid config file: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("invalid value {value:?} for {var}: {message}")]
    InvalidEnv {
        var: &'static str,
        value: String,
        message: String,
    },
}

/// Failure reported by a directory lookup.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum LookupError {
    #[error("directory unavailable: {0}")]
    Unavailable(String),

    #[error("lookup rejected: {0}")]
    Rejected(String),
}
