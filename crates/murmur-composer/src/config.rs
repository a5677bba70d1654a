//! Composer configuration.
//!
//! Every field has a default, so a config file only needs the values it
//! changes. Environment overrides use the `MURMUR_` prefix.

use std::time::Duration;

use murmur_emoji::SpriteSheet;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// When pasted HTML gets its emoji converted to images.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PasteStage {
    /// Rewrite the raw clipboard HTML.
    #[default]
    BeforeCleanup,
    /// Rewrite the sanitized HTML right before insertion.
    AfterCleanup,
}

impl std::str::FromStr for PasteStage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "before_cleanup" => Ok(Self::BeforeCleanup),
            "after_cleanup" => Ok(Self::AfterCleanup),
            other => Err(format!("expected before_cleanup or after_cleanup, got {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComposerConfig {
    /// Delay before re-reading the selection after a key-up.
    pub selection_settle_ms: u64,
    /// Batching window for emoji arriving through `input` events.
    pub input_debounce_ms: u64,
    /// Idle time after which typing is considered stopped.
    pub typing_idle_ms: u64,
    /// Wait after a submit before watching for the composer to clear.
    pub submit_window_ms: u64,
    /// Delay of the selection refresh that follows a commit.
    pub refresh_after_insert_ms: u64,
    /// Put `data-user-id` on inserted mention spans.
    pub mention_user_ids: bool,
    /// Shift+Enter inserts a line break instead of reaching the editor.
    pub alternate_newline: bool,
    /// Trim outer whitespace from serialized content.
    pub trim_whitespace: bool,
    pub paste_stage: PasteStage,
    pub emoji_sheet: SpriteSheet,
}

impl Default for ComposerConfig {
    fn default() -> Self {
        Self {
            selection_settle_ms: 10,
            input_debounce_ms: 10,
            typing_idle_ms: 2500,
            submit_window_ms: 5,
            refresh_after_insert_ms: 10,
            mention_user_ids: true,
            alternate_newline: false,
            trim_whitespace: true,
            paste_stage: PasteStage::default(),
            emoji_sheet: SpriteSheet::default(),
        }
    }
}

impl ComposerConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    /// Defaults overridden by `MURMUR_*` environment variables.
    ///
    /// Recognized variables:
    /// - `MURMUR_SELECTION_SETTLE_MS`, `MURMUR_INPUT_DEBOUNCE_MS`,
    ///   `MURMUR_TYPING_IDLE_MS`, `MURMUR_SUBMIT_WINDOW_MS`,
    ///   `MURMUR_REFRESH_AFTER_INSERT_MS`
    /// - `MURMUR_MENTION_USER_IDS`, `MURMUR_ALTERNATE_NEWLINE`,
    ///   `MURMUR_TRIM_WHITESPACE` (`true`/`false`)
    /// - `MURMUR_PASTE_STAGE` (`before_cleanup`/`after_cleanup`)
    /// - `MURMUR_EMOJI_SET`, `MURMUR_EMOJI_SHEET_SIZE`, `MURMUR_EMOJI_SHEET_URL`
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().with_overrides(|var| std::env::var(var).ok())
    }

    /// Apply overrides from any key/value source.
    pub fn with_overrides(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        override_parsed(&lookup, "MURMUR_SELECTION_SETTLE_MS", &mut self.selection_settle_ms)?;
        override_parsed(&lookup, "MURMUR_INPUT_DEBOUNCE_MS", &mut self.input_debounce_ms)?;
        override_parsed(&lookup, "MURMUR_TYPING_IDLE_MS", &mut self.typing_idle_ms)?;
        override_parsed(&lookup, "MURMUR_SUBMIT_WINDOW_MS", &mut self.submit_window_ms)?;
        override_parsed(
            &lookup,
            "MURMUR_REFRESH_AFTER_INSERT_MS",
            &mut self.refresh_after_insert_ms,
        )?;
        override_parsed(&lookup, "MURMUR_MENTION_USER_IDS", &mut self.mention_user_ids)?;
        override_parsed(&lookup, "MURMUR_ALTERNATE_NEWLINE", &mut self.alternate_newline)?;
        override_parsed(&lookup, "MURMUR_TRIM_WHITESPACE", &mut self.trim_whitespace)?;
        override_parsed(&lookup, "MURMUR_PASTE_STAGE", &mut self.paste_stage)?;
        override_parsed(&lookup, "MURMUR_EMOJI_SET", &mut self.emoji_sheet.set)?;
        override_parsed(&lookup, "MURMUR_EMOJI_SHEET_SIZE", &mut self.emoji_sheet.sheet_size)?;
        override_parsed(&lookup, "MURMUR_EMOJI_SHEET_URL", &mut self.emoji_sheet.url_template)?;
        Ok(self)
    }

    pub fn selection_settle(&self) -> Duration {
        Duration::from_millis(self.selection_settle_ms)
    }

    pub fn input_debounce(&self) -> Duration {
        Duration::from_millis(self.input_debounce_ms)
    }

    pub fn typing_idle(&self) -> Duration {
        Duration::from_millis(self.typing_idle_ms)
    }

    pub fn submit_window(&self) -> Duration {
        Duration::from_millis(self.submit_window_ms)
    }

    pub fn refresh_after_insert(&self) -> Duration {
        Duration::from_millis(self.refresh_after_insert_ms)
    }
}

fn override_parsed<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
    slot: &mut T,
) -> Result<(), ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let Some(value) = lookup(var) else {
        return Ok(());
    };
    *slot = value
        .trim()
        .parse()
        .map_err(|e: T::Err| ConfigError::InvalidEnv {
            var,
            message: e.to_string(),
            value: value.clone(),
        })?;
    Ok(())
}
