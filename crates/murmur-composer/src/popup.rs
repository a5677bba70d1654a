//! Open/closed state of the suggestion popup.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PopupKind {
    Mention,
    Emoji,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PopupState {
    #[default]
    Closed,
    Open(PopupKind),
}

/// A lifecycle change the host should render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PopupTransition {
    Opened(PopupKind),
    Closed(PopupKind),
}

/// Owns the single popup view. Repeated requests for the current state are
/// ignored, so there is never more than one open view.
#[derive(Debug, Default)]
pub struct PopupController {
    state: PopupState,
}

impl PopupController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> PopupState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        matches!(self.state, PopupState::Open(_))
    }

    pub fn open_kind(&self) -> Option<PopupKind> {
        match self.state {
            PopupState::Open(kind) => Some(kind),
            PopupState::Closed => None,
        }
    }

    /// Move to the state implied by the should-show signal.
    pub fn show(&mut self, want: Option<PopupKind>) -> Vec<PopupTransition> {
        let mut out = Vec::new();
        if self.open_kind() == want {
            return out;
        }
        if let PopupState::Open(kind) = self.state {
            self.state = PopupState::Closed;
            tracing::debug!(?kind, "popup closed");
            out.push(PopupTransition::Closed(kind));
        }
        if let Some(kind) = want {
            self.state = PopupState::Open(kind);
            tracing::debug!(?kind, "popup opened");
            out.push(PopupTransition::Opened(kind));
        }
        out
    }

    pub fn close(&mut self) -> Vec<PopupTransition> {
        self.show(None)
    }
}
