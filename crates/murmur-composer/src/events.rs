use murmur_emoji::EmojiEntry;
use serde::Serialize;

use crate::candidates::CandidateView;
use crate::directory::DirectoryEntry;
use crate::popup::PopupKind;

/// Output of a composition session, queued until the host drains it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum ComposerEvent {
    /// Serialized content changed since the last emission.
    ContentChanged(String),
    Submit,
    StartTyping,
    StopTyping,
    PopupOpened(PopupKind),
    PopupClosed(PopupKind),
    MentionList(CandidateView<DirectoryEntry>),
    EmojiList(CandidateView<EmojiEntry>),
}

impl ComposerEvent {
    /// Short name, handy for asserting on event sequences.
    pub fn name(&self) -> &'static str {
        match self {
            Self::ContentChanged(_) => "content_changed",
            Self::Submit => "submit",
            Self::StartTyping => "start_typing",
            Self::StopTyping => "stop_typing",
            Self::PopupOpened(_) => "popup_opened",
            Self::PopupClosed(_) => "popup_closed",
            Self::MentionList(_) => "mention_list",
            Self::EmojiList(_) => "emoji_list",
        }
    }
}
