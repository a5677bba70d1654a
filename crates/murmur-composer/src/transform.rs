//! Emoji content transforms.
//!
//! Inside the editor emoji are `<img class="emoji-img" data-emoji="..">`
//! elements drawn from a sprite sheet; outside they are plain unicode text.
//! [`EmojiRenderer`] converts in both directions and [`AsciiConverter`]
//! tracks the live emoticon conversion and its one-step undo.

use std::rc::Rc;

use murmur_editor_core::{CurrentWord, Document, ElementData, NodeId, escape_attr};
use murmur_emoji::{Emoji, EmojiData, SpriteSheet, Token, ascii_emoji, tokenize};

pub const EMOJI_IMG_CLASS: &str = "emoji-img";
pub const EMOJI_DATA_ATTR: &str = "data-emoji";

/// Renders emoji to sprite images and back.
#[derive(Clone)]
pub struct EmojiRenderer {
    data: Rc<dyn EmojiData>,
    sheet: SpriteSheet,
}

impl std::fmt::Debug for EmojiRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmojiRenderer")
            .field("sheet", &self.sheet)
            .finish_non_exhaustive()
    }
}

impl EmojiRenderer {
    pub fn new(data: Rc<dyn EmojiData>, sheet: SpriteSheet) -> Self {
        Self { data, sheet }
    }

    pub fn data(&self) -> &dyn EmojiData {
        self.data.as_ref()
    }

    /// `style` value for `emoji`, or `None` when the sheet has no sprite for it.
    pub fn style(&self, emoji: &Emoji) -> Option<String> {
        let coords = self.data.sprite_coordinates(
            &emoji.unified_without_skin(),
            emoji.skin(),
            &self.sheet.set,
        )?;
        Some(self.sheet.style_for(&coords).to_css())
    }

    pub fn image_element(&self, emoji: &Emoji) -> Option<ElementData> {
        Some(
            ElementData::new("img")
                .with_attr("class", EMOJI_IMG_CLASS)
                .with_attr(EMOJI_DATA_ATTR, emoji.native())
                .with_attr("style", self.style(emoji)?),
        )
    }

    pub fn image_html(&self, emoji: &Emoji) -> Option<String> {
        let style = self.style(emoji)?;
        Some(format!(
            r#"<img class="{EMOJI_IMG_CLASS}" {EMOJI_DATA_ATTR}="{}" style="{}">"#,
            escape_attr(emoji.native()),
            escape_attr(&style)
        ))
    }

    /// Replace unicode emoji in every text node with images.
    ///
    /// Text nodes are collected up front and each one is replaced by the
    /// pieces of its original string, so replacements never disturb the
    /// traversal.
    pub fn render_inbound(&self, doc: &mut Document) {
        let texts: Vec<NodeId> = doc
            .descendants(doc.root())
            .into_iter()
            .filter(|&n| doc.is_text(n))
            .collect();
        for node in texts {
            let Some(text) = doc.text(node).map(str::to_string) else {
                continue;
            };
            let pieces = self.split_pieces(&text);
            if !pieces.iter().any(|p| matches!(p, Piece::Image(_))) {
                continue;
            }
            let nodes: Vec<NodeId> = pieces
                .into_iter()
                .map(|piece| match piece {
                    Piece::Text(t) => doc.create_text(t),
                    Piece::Image(el) => doc.create_element_with(el),
                })
                .collect();
            if let Err(e) = doc.replace_with(node, &nodes) {
                tracing::warn!(%node, error = %e, "emoji render skipped a text node");
            }
        }
    }

    fn split_pieces(&self, text: &str) -> Vec<Piece> {
        let mut pieces = Vec::new();
        let mut pending = String::new();
        for token in tokenize(text) {
            match token {
                Token::Text(t) => pending.push_str(t),
                Token::Emoji(emoji) => match self.image_element(&emoji) {
                    Some(el) => {
                        if !pending.is_empty() {
                            pieces.push(Piece::Text(std::mem::take(&mut pending)));
                        }
                        pieces.push(Piece::Image(el));
                    }
                    None => pending.push_str(emoji.native()),
                },
            }
        }
        if !pending.is_empty() {
            pieces.push(Piece::Text(pending));
        }
        pieces
    }

    /// Replace emoji images with their unicode text.
    pub fn render_outbound(&self, doc: &mut Document) {
        render_outbound(doc);
    }

    /// Run the inbound conversion over an HTML fragment.
    pub fn rewrite_html(&self, html: &str) -> String {
        let mut doc = Document::from_html(html);
        self.render_inbound(&mut doc);
        doc.to_html()
    }
}

enum Piece {
    Text(String),
    Image(ElementData),
}

/// Replace every `img[data-emoji]` holding a valid emoji with a text node.
pub fn render_outbound(doc: &mut Document) {
    let images: Vec<(NodeId, String)> = doc
        .descendants(doc.root())
        .into_iter()
        .filter_map(|n| {
            let el = doc.element(n)?;
            if !el.is("img") {
                return None;
            }
            let native = el.attr(EMOJI_DATA_ATTR)?;
            Emoji::new(native).ok().map(|e| (n, e.native().to_string()))
        })
        .collect();
    for (node, native) in images {
        let text = doc.create_text(native);
        if let Err(e) = doc.replace_with(node, &[text]) {
            tracing::warn!(%node, error = %e, "emoji image left in output");
        }
    }
}

/// The emoticon just converted, kept until the next key press.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArmedUndo {
    pub ascii: String,
    pub image: NodeId,
}

/// Live ASCII emoticon conversion.
///
/// Watches the caret word. When it grows by exactly one char and the grown
/// word is an emoticon, reports a conversion. After a conversion the
/// converter is armed until the next key press and reports nothing else.
#[derive(Debug, Default)]
pub struct AsciiConverter {
    last_word: Option<String>,
    armed: Option<ArmedUndo>,
}

impl AsciiConverter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed the current caret word. Returns the word and its emoji when the
    /// word should be converted.
    pub fn observe(&mut self, word: Option<&CurrentWord>) -> Option<(CurrentWord, Emoji)> {
        let current = word.map(|w| w.text.trim()).unwrap_or_default();
        let previous = self.last_word.as_deref().unwrap_or_default();
        if self.last_word.is_some() && previous == current {
            return None;
        }
        let grew = current.chars().count() == previous.chars().count() + 1;
        self.last_word = Some(current.to_string());
        if !grew || self.armed.is_some() {
            return None;
        }
        let word = word?;
        let emoji = ascii_emoji(&word.text)?;
        tracing::debug!(ascii = %word.text, emoji = %emoji, "ascii emoticon matched");
        Some((word.clone(), emoji))
    }

    pub fn arm(&mut self, undo: ArmedUndo) {
        self.armed = Some(undo);
    }

    /// Disarm on key press; returns what was armed.
    pub fn take_armed(&mut self) -> Option<ArmedUndo> {
        self.armed.take()
    }

    pub fn is_armed(&self) -> bool {
        self.armed.is_some()
    }
}

#[cfg(test)]
mod tests {
    use murmur_emoji::EmojiCatalog;

    use super::*;

    fn renderer() -> EmojiRenderer {
        EmojiRenderer::new(Rc::new(EmojiCatalog::default()), SpriteSheet::default())
    }

    fn strip_styles(html: &str) -> String {
        let mut doc = Document::from_html(html);
        for n in doc.descendants(doc.root()) {
            if let Some(el) = doc.element_mut(n) {
                el.remove_attr("style");
            }
        }
        doc.to_html()
    }

    fn word(text: &str) -> CurrentWord {
        CurrentWord {
            text: text.to_string(),
            start_offset: 0,
            end_offset: text.chars().count(),
        }
    }

    #[test]
    fn test_inbound_splits_text() {
        let mut doc = Document::from_html("<p>hi 🙂 there 👍🏽!</p>");
        renderer().render_inbound(&mut doc);
        insta::assert_snapshot!(
            strip_styles(&doc.to_html()),
            @r#"<p>hi <img class="emoji-img" data-emoji="🙂"> there <img class="emoji-img" data-emoji="👍🏽">!</p>"#
        );
    }

    #[test]
    fn test_adjacent_emoji() {
        let mut doc = Document::from_html("<p>😄😄</p>");
        renderer().render_inbound(&mut doc);
        let p = doc.first_child(doc.root()).unwrap();
        assert_eq!(doc.children(p).len(), 2);
        assert!(doc.children(p).iter().all(|&n| doc.is_element(n, "img")));
    }

    #[test]
    fn test_round_trip() {
        let r = renderer();
        for s in ["plain", "a🙂b", "🙂", "x 😄😄 y ❤️", "👍🏽 ok"] {
            let mut doc = Document::from_html(s);
            r.render_inbound(&mut doc);
            r.render_outbound(&mut doc);
            assert_eq!(doc.text_content(doc.root()), s);
        }
    }

    #[test]
    fn test_outbound_ignores_other_images() {
        let mut doc = Document::from_html(r#"<img src="cat.png"><img data-emoji="nope">"#);
        render_outbound(&mut doc);
        assert_eq!(doc.to_html(), r#"<img src="cat.png"><img data-emoji="nope">"#);
    }

    #[test]
    fn test_image_style_uses_sheet() {
        let emoji = Emoji::new("🙂").unwrap();
        let style = renderer().style(&emoji).unwrap();
        assert!(style.starts_with("background-image: url(https://unpkg.com/emoji-datasource-twitter"));
        assert!(style.contains("background-size: 5700% 5700%;"));
    }

    #[test]
    fn test_rewrite_paste() {
        let html = renderer().rewrite_html("<b>yay 🎉</b>");
        assert_eq!(
            strip_styles(&html),
            r#"<b>yay <img class="emoji-img" data-emoji="🎉"></b>"#
        );
    }

    #[test]
    fn test_ascii_needs_one_char_growth() {
        let mut conv = AsciiConverter::new();
        assert_eq!(conv.observe(Some(&word(":"))), None);
        let (w, emoji) = conv.observe(Some(&word(":)"))).unwrap();
        assert_eq!(w.text, ":)");
        assert_eq!(emoji.native(), "🙂");

        let mut pasted = AsciiConverter::new();
        pasted.observe(None);
        assert_eq!(pasted.observe(Some(&word("<3"))), None);
    }

    #[test]
    fn test_ascii_quiet_while_armed() {
        let mut conv = AsciiConverter::new();
        conv.observe(Some(&word(":")));
        conv.arm(ArmedUndo {
            ascii: ":)".into(),
            image: Document::new().root(),
        });
        assert_eq!(conv.observe(Some(&word(":D"))), None);
        assert!(conv.take_armed().is_some());
        assert!(!conv.is_armed());
    }
}
