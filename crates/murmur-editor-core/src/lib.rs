//! murmur-editor-core: headless rich-text editing primitives.
//!
//! This crate provides:
//! - `Document` - arena-backed element/text tree with an HTML subset reader/writer
//! - `EditableSurface` - the port composer features attach to, plus `PlainSurface`
//! - Selection value types, input events and word scanning around a caret
//! - `DocumentTransform` hooks applied when content enters or leaves a surface

pub mod actions;
pub mod document;
pub mod error;
pub mod html;
pub mod surface;
pub mod text_helpers;
pub mod transforms;
pub mod types;
pub mod undo;

pub use actions::{Key, KeyEvent, KeyOutcome, Modifiers, SurfaceEvent};
pub use document::{Document, ElementData, NodeData, VOID_ELEMENTS, is_void_element};
pub use error::DocumentError;
pub use html::{escape_attr, escape_text};
pub use smol_str::SmolStr;
pub use surface::{EMPTY_CONTENT, EditableSurface, PlainSurface, replace_range_with_html};
pub use text_helpers::{CurrentWord, is_word_break, word_bounds, word_range};
pub use transforms::{DocumentTransform, TrimWhitespace, apply_all};
pub use types::{DomPoint, DomRange, NodeId, SelectionSnapshot};
pub use undo::{UndoHistory, UndoManager};
