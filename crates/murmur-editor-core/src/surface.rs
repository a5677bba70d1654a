//! The editable surface port and an in-memory implementation.
//!
//! A surface owns the live document and caret. Feature code reads and
//! mutates it only through [`EditableSurface`], so the same features run
//! against a browser binding or against [`PlainSurface`] in tests.

use tracing::trace;

use crate::actions::{Key, KeyEvent};
use crate::document::{Document, NodeData};
use crate::error::DocumentError;
use crate::transforms::{DocumentTransform, apply_all};
use crate::types::{DomPoint, DomRange, NodeId, SelectionSnapshot};
use crate::undo::{UndoHistory, UndoManager};

/// Markup installed when a surface is given an empty value.
pub const EMPTY_CONTENT: &str = "<p><br></p>";

/// Editable rich-text surface the composer attaches to.
///
/// Required methods cover the live state; provided methods are conveniences
/// built on top of them.
pub trait EditableSurface {
    /// Serialized content with outbound transforms applied. Empty content
    /// reads as `""`.
    fn content(&self) -> String;

    /// Replace the content. Inbound transforms run on the parsed value.
    fn set_content(&mut self, html: &str);

    /// Replace the selection (deleting a non-collapsed one) with `html` and
    /// put the caret after it.
    fn insert_at_caret(&mut self, html: &str) -> Result<DomPoint, DocumentError>;

    fn selection(&self) -> Option<SelectionSnapshot>;

    fn set_selection(&mut self, selection: Option<SelectionSnapshot>);

    /// Whether keyboard focus is inside the surface.
    fn is_focus_inside(&self) -> bool;

    fn document(&self) -> &Document;

    fn document_mut(&mut self) -> &mut Document;

    fn register_inbound_transform(&mut self, transform: Box<dyn DocumentTransform>);

    fn register_outbound_transform(&mut self, transform: Box<dyn DocumentTransform>);

    // === Provided methods ===

    /// Internal markup exactly as rendered, without outbound transforms.
    fn raw_html(&self) -> String {
        self.document().to_html()
    }

    fn is_empty(&self) -> bool {
        self.document().is_empty_content()
    }

    /// Select exactly `range`.
    fn set_range(&mut self, range: DomRange) {
        self.set_selection(Some(SelectionSnapshot::from_range(range)));
    }

    /// The selection as an ordered range.
    fn range(&self) -> Option<DomRange> {
        let sel = self.selection()?;
        let (anchor, focus) = (sel.anchor(), sel.focus());
        match self.document().compare_points(anchor, focus) {
            Ok(std::cmp::Ordering::Greater) => Some(DomRange::new(focus, anchor)),
            Ok(_) => Some(DomRange::new(anchor, focus)),
            Err(_) => None,
        }
    }
}

impl<T: EditableSurface + ?Sized> EditableSurface for &mut T {
    fn content(&self) -> String {
        (**self).content()
    }

    fn set_content(&mut self, html: &str) {
        (**self).set_content(html)
    }

    fn insert_at_caret(&mut self, html: &str) -> Result<DomPoint, DocumentError> {
        (**self).insert_at_caret(html)
    }

    fn selection(&self) -> Option<SelectionSnapshot> {
        (**self).selection()
    }

    fn set_selection(&mut self, selection: Option<SelectionSnapshot>) {
        (**self).set_selection(selection)
    }

    fn is_focus_inside(&self) -> bool {
        (**self).is_focus_inside()
    }

    fn document(&self) -> &Document {
        (**self).document()
    }

    fn document_mut(&mut self) -> &mut Document {
        (**self).document_mut()
    }

    fn register_inbound_transform(&mut self, transform: Box<dyn DocumentTransform>) {
        (**self).register_inbound_transform(transform)
    }

    fn register_outbound_transform(&mut self, transform: Box<dyn DocumentTransform>) {
        (**self).register_outbound_transform(transform)
    }
}

/// Replace `range` in `doc` with parsed `html`. Returns the caret after it.
pub fn replace_range_with_html(
    doc: &mut Document,
    range: DomRange,
    html: &str,
) -> Result<DomPoint, DocumentError> {
    let at = doc.delete_range(range)?;
    let nodes = doc.parse_fragment(html);
    doc.insert_nodes(at, &nodes)
}

type Snapshot = (Document, Option<SelectionSnapshot>);

/// In-memory surface with browser-like default key handling.
pub struct PlainSurface {
    doc: Document,
    selection: Option<SelectionSnapshot>,
    focused: bool,
    inbound: Vec<Box<dyn DocumentTransform>>,
    outbound: Vec<Box<dyn DocumentTransform>>,
    history: UndoHistory<Snapshot>,
}

impl Default for PlainSurface {
    fn default() -> Self {
        Self::new()
    }
}

impl PlainSurface {
    pub fn new() -> Self {
        Self {
            doc: Document::from_html(EMPTY_CONTENT),
            selection: None,
            focused: false,
            inbound: Vec::new(),
            outbound: Vec::new(),
            history: UndoHistory::new(100),
        }
    }

    pub fn with_max_undo_steps(mut self, max_steps: usize) -> Self {
        self.history = UndoHistory::new(max_steps);
        self
    }

    pub fn focus(&mut self) {
        self.focused = true;
        if self.selection.is_none() {
            self.selection = Some(SelectionSnapshot::caret(self.doc.end_point()));
        }
    }

    pub fn blur(&mut self) {
        self.focused = false;
    }

    /// Put a collapsed caret at a point.
    pub fn place_caret(&mut self, point: DomPoint) {
        self.selection = Some(SelectionSnapshot::caret(point));
    }

    pub fn place_caret_at_end(&mut self) {
        self.place_caret(self.doc.end_point());
    }

    /// Collapsed caret position, if the selection is collapsed.
    pub fn caret(&self) -> Option<DomPoint> {
        self.selection
            .filter(SelectionSnapshot::is_collapsed)
            .map(|s| s.focus())
    }

    fn snapshot(&self) -> Snapshot {
        (self.doc.clone(), self.selection)
    }

    fn record(&mut self) {
        let before = self.snapshot();
        self.history.record(before);
    }

    /// Caret to edit at, deleting a non-collapsed selection first.
    fn collapse_for_edit(&mut self) -> Result<DomPoint, DocumentError> {
        let range = match self.range() {
            Some(r) => r,
            None => return Ok(self.doc.end_point()),
        };
        if range.is_collapsed() {
            return Ok(range.start);
        }
        self.doc.delete_range(range)
    }

    /// Type text at the caret the way a browser does for printable keys.
    pub fn type_text(&mut self, text: &str) -> Result<DomPoint, DocumentError> {
        self.record();
        let at = self.collapse_for_edit()?;
        let caret = self.insert_text_at(at, text)?;
        self.place_caret(caret);
        Ok(caret)
    }

    fn insert_text_at(&mut self, at: DomPoint, text: &str) -> Result<DomPoint, DocumentError> {
        if let Some(existing) = self.doc.text(at.node) {
            let byte = crate::document::char_to_byte(existing, at.offset);
            let mut updated = existing.to_string();
            updated.insert_str(byte, text);
            self.doc.set_text(at.node, updated)?;
            return Ok(DomPoint::new(at.node, at.offset + text.chars().count()));
        }

        let children = self.doc.children(at.node);
        let before = at.offset.checked_sub(1).and_then(|i| children.get(i)).copied();
        let after = children.get(at.offset).copied();
        if let Some(prev) = before.filter(|&n| self.doc.is_text(n)) {
            let len = self.doc.node_len(prev);
            return self.insert_text_at(DomPoint::new(prev, len), text);
        }
        if let Some(next) = after.filter(|&n| self.doc.is_text(n)) {
            return self.insert_text_at(DomPoint::new(next, 0), text);
        }
        // Typing before a lone <br> placeholder replaces it.
        let node = self.doc.create_text(text);
        let placeholder = after.filter(|&n| self.doc.is_element(n, "br") && before.is_none());
        match placeholder {
            Some(br) => self.doc.replace_with(br, &[node])?,
            None => self.doc.insert_child(at.node, at.offset, node)?,
        }
        Ok(DomPoint::new(node, text.chars().count()))
    }

    /// Apply the default effect of a key press that nobody prevented.
    pub fn apply_default_key(&mut self, event: &KeyEvent) -> Result<(), DocumentError> {
        match &event.key {
            Key::Character(c) if !event.modifiers.ctrl && !event.modifiers.meta => {
                self.type_text(c)?;
            }
            Key::Backspace => self.delete_backward()?,
            Key::Enter => {
                self.insert_at_caret("<br>")?;
            }
            Key::ArrowLeft | Key::ArrowRight => self.move_caret(event.key == Key::ArrowRight),
            _ => {}
        }
        Ok(())
    }

    fn move_caret(&mut self, forward: bool) {
        let Some(caret) = self.caret() else {
            return;
        };
        let len = self.doc.node_len(caret.node);
        let offset = if forward {
            (caret.offset + 1).min(len)
        } else {
            caret.offset.saturating_sub(1)
        };
        self.place_caret(DomPoint::new(caret.node, offset));
    }

    /// Backspace. A caret right after a non-editable element deletes
    /// nothing, which is what browsers do with inline `contenteditable=false`.
    pub fn delete_backward(&mut self) -> Result<(), DocumentError> {
        let Some(range) = self.range() else {
            return Ok(());
        };
        if !range.is_collapsed() {
            self.record();
            let caret = self.doc.delete_range(range)?;
            self.place_caret(caret);
            return Ok(());
        }

        let caret = range.start;
        if self.doc.is_text(caret.node) {
            if caret.offset > 0 {
                self.record();
                return self.delete_char_before(caret);
            }
            let Some(parent) = self.doc.parent(caret.node) else {
                return Ok(());
            };
            let idx = self.doc.index_in_parent(caret.node).unwrap_or(0);
            return self.delete_before_child(parent, idx);
        }
        self.delete_before_child(caret.node, caret.offset)
    }

    fn delete_char_before(&mut self, caret: DomPoint) -> Result<(), DocumentError> {
        self.doc
            .delete_range(DomRange::within(caret.node, caret.offset - 1, caret.offset))?;
        if self.doc.node_len(caret.node) == 0 {
            // Browsers drop the emptied text node and park the caret in its parent.
            let parent = self.doc.parent(caret.node);
            let idx = self.doc.index_in_parent(caret.node);
            if let (Some(parent), Some(idx)) = (parent, idx) {
                self.doc.detach(caret.node)?;
                self.place_caret(DomPoint::new(parent, idx));
                return Ok(());
            }
        }
        self.place_caret(DomPoint::new(caret.node, caret.offset - 1));
        Ok(())
    }

    fn delete_before_child(&mut self, parent: NodeId, idx: usize) -> Result<(), DocumentError> {
        let prev = idx
            .checked_sub(1)
            .and_then(|i| self.doc.children(parent).get(i).copied());
        let Some(prev) = prev else {
            return Ok(());
        };
        match self.doc.data(prev) {
            Some(NodeData::Text(_)) => {
                let len = self.doc.node_len(prev);
                if len == 0 {
                    self.doc.detach(prev)?;
                    return self.delete_before_child(parent, idx - 1);
                }
                self.record();
                self.delete_char_before(DomPoint::new(prev, len))
            }
            Some(NodeData::Element(el)) if el.is_non_editable() => {
                trace!(node = %prev, "backspace after non-editable element");
                Ok(())
            }
            Some(NodeData::Element(el)) if el.is_void() => {
                self.record();
                self.doc.detach(prev)?;
                self.place_caret(DomPoint::new(parent, idx - 1));
                Ok(())
            }
            _ => Ok(()),
        }
    }

    /// Text of the caret's text node, for assertions.
    pub fn caret_text(&self) -> Option<&str> {
        self.doc.text(self.caret()?.node)
    }
}

impl EditableSurface for PlainSurface {
    fn content(&self) -> String {
        if self.doc.is_empty_content() {
            return String::new();
        }
        let mut out = self.doc.clone();
        apply_all(&self.outbound, &mut out);
        out.to_html()
    }

    fn set_content(&mut self, html: &str) {
        self.record();
        let html = if html.is_empty() { EMPTY_CONTENT } else { html };
        let mut doc = Document::from_html(html);
        apply_all(&self.inbound, &mut doc);
        self.doc = doc;
        self.selection = Some(SelectionSnapshot::caret(self.doc.end_point()));
    }

    fn insert_at_caret(&mut self, html: &str) -> Result<DomPoint, DocumentError> {
        self.record();
        let range = self
            .range()
            .unwrap_or_else(|| DomRange::caret(self.doc.end_point()));
        let caret = replace_range_with_html(&mut self.doc, range, html)?;
        self.place_caret(caret);
        Ok(caret)
    }

    fn selection(&self) -> Option<SelectionSnapshot> {
        self.selection
    }

    fn set_selection(&mut self, selection: Option<SelectionSnapshot>) {
        self.selection = selection;
    }

    fn is_focus_inside(&self) -> bool {
        self.focused && self.selection.is_some()
    }

    fn document(&self) -> &Document {
        &self.doc
    }

    fn document_mut(&mut self) -> &mut Document {
        &mut self.doc
    }

    fn register_inbound_transform(&mut self, transform: Box<dyn DocumentTransform>) {
        self.inbound.push(transform);
    }

    fn register_outbound_transform(&mut self, transform: Box<dyn DocumentTransform>) {
        self.outbound.push(transform);
    }
}

impl UndoManager for PlainSurface {
    fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    fn undo(&mut self) -> bool {
        let current = self.snapshot();
        match self.history.undo(current) {
            Some((doc, selection)) => {
                self.doc = doc;
                self.selection = selection;
                true
            }
            None => false,
        }
    }

    fn redo(&mut self) -> bool {
        let current = self.snapshot();
        match self.history.redo(current) {
            Some((doc, selection)) => {
                self.doc = doc;
                self.selection = selection;
                true
            }
            None => false,
        }
    }

    fn clear_history(&mut self) {
        self.history.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn typed(text: &str) -> PlainSurface {
        let mut surface = PlainSurface::new();
        surface.focus();
        surface.type_text(text).unwrap();
        surface
    }

    #[test]
    fn test_typing_replaces_placeholder() {
        let surface = typed("hello");
        assert_eq!(surface.raw_html(), "<p>hello</p>");
        assert_eq!(surface.caret_text(), Some("hello"));
        assert_eq!(surface.caret().unwrap().offset, 5);
    }

    #[test]
    fn test_empty_reads_as_empty_string() {
        let mut surface = PlainSurface::new();
        assert_eq!(surface.content(), "");
        surface.set_content("");
        assert_eq!(surface.raw_html(), EMPTY_CONTENT);
    }

    #[test]
    fn test_insert_at_caret_replaces_selection() {
        let mut surface = typed("hello @jo");
        let node = surface.caret().unwrap().node;
        surface.set_range(DomRange::within(node, 6, 9));
        let caret = surface
            .insert_at_caret(r#"<span contenteditable="false" class="tag">@John Doe</span> "#)
            .unwrap();
        insta::assert_snapshot!(
            surface.raw_html(),
            @r#"<p>hello <span contenteditable="false" class="tag">@John Doe</span> </p>"#
        );
        assert_eq!(surface.document().text(caret.node), Some(" "));
    }

    #[test]
    fn test_backspace_after_non_editable_is_noop() {
        let mut surface = PlainSurface::new();
        surface.set_content(r#"<p>a<span contenteditable="false" class="tag">@Bo</span> </p>"#);
        surface.focus();
        surface.delete_backward().unwrap();
        assert_eq!(
            surface.raw_html(),
            r#"<p>a<span contenteditable="false" class="tag">@Bo</span></p>"#
        );
        let before = surface.raw_html();
        surface.delete_backward().unwrap();
        assert_eq!(surface.raw_html(), before);
    }

    #[test]
    fn test_backspace_removes_image() {
        let mut surface = PlainSurface::new();
        surface.set_content(r#"<p>x<img class="emoji-img"></p>"#);
        surface.focus();
        let p = surface.document().first_child(surface.document().root()).unwrap();
        surface.place_caret(DomPoint::new(p, 2));
        surface.delete_backward().unwrap();
        assert_eq!(surface.raw_html(), "<p>x</p>");
    }

    #[test]
    fn test_transforms_apply_in_order() {
        let mut surface = PlainSurface::new();
        surface.register_inbound_transform(Box::new(|doc: &mut Document| {
            for node in doc.descendants(doc.root()) {
                if doc.text(node) == Some("in") {
                    let _ = doc.set_text(node, "rendered");
                }
            }
        }));
        surface.register_outbound_transform(Box::new(|doc: &mut Document| {
            for node in doc.descendants(doc.root()) {
                if doc.text(node) == Some("rendered") {
                    let _ = doc.set_text(node, "out");
                }
            }
        }));
        surface.set_content("<p>in</p>");
        assert_eq!(surface.raw_html(), "<p>rendered</p>");
        assert_eq!(surface.content(), "<p>out</p>");
    }

    #[test]
    fn test_undo_typing() {
        let mut surface = typed("a");
        surface.type_text("b").unwrap();
        assert_eq!(surface.raw_html(), "<p>ab</p>");
        assert!(surface.undo());
        assert_eq!(surface.raw_html(), "<p>a</p>");
        assert!(surface.redo());
        assert_eq!(surface.raw_html(), "<p>ab</p>");
    }

    #[test]
    fn test_focus_requires_selection() {
        let mut surface = PlainSurface::new();
        assert!(!surface.is_focus_inside());
        surface.focus();
        assert!(surface.is_focus_inside());
        surface.blur();
        assert!(!surface.is_focus_inside());
    }
}
