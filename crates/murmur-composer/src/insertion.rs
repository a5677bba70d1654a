//! Committing candidates into the document.

use murmur_editor_core::{
    DomPoint, DomRange, EditableSurface, NodeData, NodeId, escape_text, word_range,
};

use crate::directory::DirectoryEntry;
use crate::error::ComposerError;

pub const MENTION_CLASS: &str = "tag";

/// Markup for a committed mention, trailing space included.
pub fn mention_html(entry: &DirectoryEntry, with_user_id: bool) -> String {
    let id_attr = if with_user_id {
        format!(r#" data-user-id="{}""#, entry.user_id)
    } else {
        String::new()
    };
    format!(
        r#"<span contenteditable="false"{id_attr} class="{MENTION_CLASS}">@{}</span> "#,
        escape_text(&entry.user_name_complete)
    )
}

/// Replace the trigger word around the caret with `html`.
///
/// `restore` is the range captured while focus was in the editor; it is
/// selected first so a commit from a popup click lands where the trigger
/// was typed. Returns `None`, leaving the document untouched, when the
/// caret is not a collapsed point inside a text node.
pub fn replace_trigger_word(
    surface: &mut impl EditableSurface,
    restore: Option<DomRange>,
    html: &str,
) -> Result<Option<DomPoint>, ComposerError> {
    if let Some(range) = restore {
        if surface.document().is_valid_range(range) {
            surface.set_range(range);
        }
    }
    let Some(caret) = surface.range().filter(DomRange::is_collapsed).map(|r| r.start) else {
        tracing::debug!("commit aborted: no collapsed caret");
        return Ok(None);
    };
    let Some(text) = surface.document().text(caret.node) else {
        tracing::debug!(node = %caret.node, "commit aborted: caret outside text");
        return Ok(None);
    };
    let span = word_range(text, caret.offset);
    surface.set_range(DomRange::within(caret.node, span.start, span.end));
    let after = surface.insert_at_caret(html)?;
    tracing::debug!(start = span.start, end = span.end, "trigger word replaced");
    Ok(Some(after))
}

/// Mention span sitting right before a collapsed caret.
pub fn mention_before_caret(surface: &impl EditableSurface) -> Option<NodeId> {
    let caret = surface.range().filter(DomRange::is_collapsed)?.start;
    let doc = surface.document();
    let prev = if doc.is_text(caret.node) {
        if caret.offset > 0 {
            return None;
        }
        doc.previous_sibling(caret.node)?
    } else {
        let idx = caret.offset.checked_sub(1)?;
        *doc.children(caret.node).get(idx)?
    };
    match doc.data(prev)? {
        NodeData::Element(el) if el.is("span") && el.has_class(MENTION_CLASS) => Some(prev),
        _ => None,
    }
}

/// Detects two Backspace presses with nothing changed in between.
#[derive(Debug, Default)]
pub struct BackspaceWatch {
    last: Option<(bool, String, Option<DomRange>)>,
}

impl BackspaceWatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a key-down. Returns true when this is a Backspace that
    /// directly follows another Backspace with identical content and range.
    pub fn on_keydown(&mut self, is_backspace: bool, surface: &impl EditableSurface) -> bool {
        let snapshot = (is_backspace, surface.raw_html(), surface.range());
        let repeated = is_backspace && self.last.as_ref() == Some(&snapshot);
        self.last = Some(snapshot);
        repeated
    }

    pub fn reset(&mut self) {
        self.last = None;
    }
}

/// Remove a whole node as one edit and leave the caret where it was.
pub fn remove_node(surface: &mut impl EditableSurface, node: NodeId) -> Result<bool, ComposerError> {
    let Some(range) = surface.document().select_node(node) else {
        return Ok(false);
    };
    surface.set_range(range);
    surface.insert_at_caret("")?;
    Ok(true)
}

/// Markup that restores an emoticon as typed text.
pub fn ascii_restore_html(ascii: &str) -> String {
    escape_text(&format!("{ascii} "))
}
