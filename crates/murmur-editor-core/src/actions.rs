//! Platform-agnostic input events.
//!
//! Hosts convert native keyboard, input and clipboard events into these types
//! and feed them to whatever is listening on the surface. Handlers answer with
//! a [`KeyOutcome`] describing what the host should do with the native event.

use smol_str::SmolStr;

/// Key values for keyboard input.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Key {
    /// A character key.
    Character(SmolStr),

    /// Unknown/unidentified key.
    Unidentified,

    // === Whitespace / editing ===
    Backspace,
    Delete,
    Enter,
    Tab,
    Escape,

    // === Navigation ===
    ArrowLeft,
    ArrowRight,
    ArrowUp,
    ArrowDown,
    Home,
    End,

    // === Modifiers ===
    Alt,
    Control,
    Meta,
    Shift,
}

impl Key {
    /// Create a character key.
    pub fn character(s: impl Into<SmolStr>) -> Self {
        Self::Character(s.into())
    }

    /// Check if this is a navigation key.
    pub fn is_navigation(&self) -> bool {
        matches!(
            self,
            Self::ArrowLeft
                | Self::ArrowRight
                | Self::ArrowUp
                | Self::ArrowDown
                | Self::Home
                | Self::End
        )
    }

    /// Check if this is a modifier key.
    pub fn is_modifier(&self) -> bool {
        matches!(self, Self::Alt | Self::Control | Self::Meta | Self::Shift)
    }
}

/// Modifier key state for a key event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Modifiers {
    pub ctrl: bool,
    pub alt: bool,
    pub shift: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Self = Self {
        ctrl: false,
        alt: false,
        shift: false,
        meta: false,
    };

    pub const SHIFT: Self = Self {
        ctrl: false,
        alt: false,
        shift: true,
        meta: false,
    };
}

/// A key press with its modifier state.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyEvent {
    pub key: Key,
    pub modifiers: Modifiers,
}

impl KeyEvent {
    pub fn new(key: Key) -> Self {
        Self {
            key,
            modifiers: Modifiers::NONE,
        }
    }

    pub fn with_modifiers(key: Key, modifiers: Modifiers) -> Self {
        Self { key, modifiers }
    }

    pub fn shift(key: Key) -> Self {
        Self {
            key,
            modifiers: Modifiers::SHIFT,
        }
    }

    pub fn character(s: impl Into<SmolStr>) -> Self {
        Self::new(Key::character(s))
    }

    pub fn is(&self, key: &Key) -> bool {
        &self.key == key
    }
}

/// Discrete events emitted by an editable surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SurfaceEvent {
    KeyDown(KeyEvent),
    KeyUp(KeyEvent),
    /// Native `input` event; `data` is the inserted text when there is any.
    Input { data: Option<String> },
    Focus,
    Blur,
    ContentChanged,
    /// Raw clipboard HTML before the editor sanitizes it.
    PasteBeforeCleanup(String),
    /// Clipboard HTML after sanitizing, right before insertion.
    PasteAfterCleanup(String),
}

/// What the host should do with the native event after handling.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct KeyOutcome {
    /// Skip the browser/editor default effect.
    pub prevent_default: bool,
    /// Do not deliver the event to other listeners.
    pub stop_propagation: bool,
    /// Rewritten paste HTML to insert instead of the original.
    pub replacement_html: Option<String>,
}

impl KeyOutcome {
    pub const PASS: Self = Self {
        prevent_default: false,
        stop_propagation: false,
        replacement_html: None,
    };

    pub fn prevented() -> Self {
        Self {
            prevent_default: true,
            ..Self::default()
        }
    }

    /// Prevent the default and stop other listeners from seeing the event.
    pub fn consumed() -> Self {
        Self {
            prevent_default: true,
            stop_propagation: true,
            replacement_html: None,
        }
    }

    pub fn replace_with(html: String) -> Self {
        Self {
            replacement_html: Some(html),
            ..Self::default()
        }
    }

    /// Combine two outcomes from listeners on the same event.
    pub fn merge(self, other: Self) -> Self {
        Self {
            prevent_default: self.prevent_default || other.prevent_default,
            stop_propagation: self.stop_propagation || other.stop_propagation,
            replacement_html: other.replacement_html.or(self.replacement_html),
        }
    }
}
