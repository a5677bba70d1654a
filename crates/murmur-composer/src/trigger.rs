//! Classifying the caret word as an autocomplete trigger.

use murmur_editor_core::CurrentWord;

use crate::popup::PopupKind;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Trigger {
    #[default]
    None,
    /// `@` followed by at least one word char; holds the text after `@`.
    Mention(String),
    /// `:` followed by at least two non-space chars; holds the text after `:`.
    EmojiShortcode(String),
}

impl Trigger {
    pub fn classify(word: Option<&CurrentWord>) -> Self {
        let Some(word) = word else {
            return Self::None;
        };
        let text = word.text.as_str();
        if let Some(rest) = text.strip_prefix('@') {
            if rest.chars().next().is_some_and(is_word_char) {
                return Self::Mention(rest.to_string());
            }
            return Self::None;
        }
        if let Some(rest) = text.strip_prefix(':') {
            if rest.chars().take_while(|c| !c.is_whitespace()).count() >= 2 {
                return Self::EmojiShortcode(rest.to_string());
            }
        }
        Self::None
    }

    pub fn query(&self) -> Option<&str> {
        match self {
            Self::None => None,
            Self::Mention(q) | Self::EmojiShortcode(q) => Some(q),
        }
    }

    /// Which popup should be showing for this trigger.
    pub fn popup_kind(&self) -> Option<PopupKind> {
        match self {
            Self::None => None,
            Self::Mention(_) => Some(PopupKind::Mention),
            Self::EmojiShortcode(_) => Some(PopupKind::Emoji),
        }
    }
}

/// `\w` as regular expressions read it.
fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Emits a trigger only when the caret word's text changes.
#[derive(Debug, Default)]
pub struct TriggerDetector {
    last_word: Option<Option<String>>,
    current: Trigger,
}

impl TriggerDetector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe(&mut self, word: Option<&CurrentWord>) -> Option<&Trigger> {
        let text = word.map(|w| w.text.clone());
        if self.last_word.as_ref() == Some(&text) {
            return None;
        }
        self.last_word = Some(text);
        self.current = Trigger::classify(word);
        Some(&self.current)
    }

    pub fn current(&self) -> &Trigger {
        &self.current
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn word(text: &str) -> CurrentWord {
        CurrentWord {
            text: text.to_string(),
            start_offset: 0,
            end_offset: text.chars().count(),
        }
    }

    #[test]
    fn test_classify() {
        let cases = [
            ("@jo", Trigger::Mention("jo".into())),
            ("@", Trigger::None),
            ("@.x", Trigger::None),
            (":sma", Trigger::EmojiShortcode("sma".into())),
            (":s", Trigger::None),
            (":)", Trigger::None),
            ("hello", Trigger::None),
            (" ", Trigger::None),
        ];
        for (text, expected) in cases {
            assert_eq!(Trigger::classify(Some(&word(text))), expected, "{text}");
        }
        assert_eq!(Trigger::classify(None), Trigger::None);
    }

    #[test]
    fn test_emits_on_word_change_only() {
        let mut detector = TriggerDetector::new();
        let w = word("@jo");
        assert_eq!(detector.observe(Some(&w)), Some(&Trigger::Mention("jo".into())));
        assert_eq!(detector.observe(Some(&w)), None);
        assert_eq!(detector.observe(None), Some(&Trigger::None));
        assert_eq!(detector.observe(None), None);
    }

    #[test]
    fn test_popup_kind() {
        assert_eq!(Trigger::Mention("a".into()).popup_kind(), Some(PopupKind::Mention));
        assert_eq!(Trigger::EmojiShortcode("ab".into()).query(), Some("ab"));
        assert_eq!(Trigger::None.popup_kind(), None);
    }
}
