//! Selection tracking and caret-word extraction.

use murmur_editor_core::{CurrentWord, DomRange, EditableSurface, SelectionSnapshot};

/// Deduplicates selection reads into a stream of effective changes.
///
/// Snapshots compare structurally. A missing selection is reported only
/// after a present one, so repeated reads outside the editor stay quiet.
#[derive(Debug, Default)]
pub struct SelectionTracker {
    last: Option<Option<SelectionSnapshot>>,
    in_editor_range: Option<DomRange>,
}

impl SelectionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a fresh read. Returns the new effective selection when it changed.
    pub fn observe(&mut self, selection: Option<SelectionSnapshot>) -> Option<Option<SelectionSnapshot>> {
        let changed = match (self.last, selection) {
            (None, None) => false,
            (Some(None), None) => false,
            (Some(Some(prev)), Some(next)) => prev != next,
            _ => true,
        };
        if !changed {
            return None;
        }
        self.last = Some(selection);
        Some(selection)
    }

    /// Update the in-editor range from the surface's current state. While
    /// focus is inside, a read with no range keeps the previous one.
    pub fn sync_focus(&mut self, surface: &impl EditableSurface) {
        if !surface.is_focus_inside() {
            self.in_editor_range = None;
        } else if let Some(range) = surface.range() {
            self.in_editor_range = Some(range);
        }
    }

    /// Last range read while focus was inside the editor.
    pub fn in_editor_range(&self) -> Option<DomRange> {
        self.in_editor_range
    }
}

/// Word around a collapsed caret inside a text node.
pub fn caret_word(surface: &impl EditableSurface) -> Option<CurrentWord> {
    let selection = surface.selection()?;
    if !selection.is_collapsed() {
        return None;
    }
    let caret = selection.focus();
    let text = surface.document().text(caret.node)?;
    CurrentWord::at(text, caret.offset)
}
