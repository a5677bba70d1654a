//! Whole-document rewrites applied when content enters or leaves a surface.
//!
//! Transforms walk the tree with an explicit stack, so nodes replaced during
//! the walk are never revisited through a stale handle.

use crate::document::{Document, NodeData};
use crate::types::NodeId;

/// A rewrite of an owned document.
pub trait DocumentTransform {
    fn apply(&self, doc: &mut Document);
}

impl<F> DocumentTransform for F
where
    F: Fn(&mut Document),
{
    fn apply(&self, doc: &mut Document) {
        self(doc)
    }
}

/// Run transforms in registration order.
pub fn apply_all(transforms: &[Box<dyn DocumentTransform>], doc: &mut Document) {
    for t in transforms {
        t.apply(doc);
    }
}

/// Output cleanup for chat messages.
///
/// Only runs when the first child is a paragraph. Trims leading whitespace
/// down the first-child chain and trailing whitespace down the last-child
/// chain, drops empty attribute-less elements, and collapses an attribute-less
/// element whose only child is the same kind of element.
#[derive(Debug, Clone, Copy, Default)]
pub struct TrimWhitespace;

impl DocumentTransform for TrimWhitespace {
    fn apply(&self, doc: &mut Document) {
        let root = doc.root();
        let starts_with_paragraph = doc
            .first_child(root)
            .is_some_and(|first| doc.is_element(first, "p"));
        if !starts_with_paragraph {
            return;
        }

        trim_edge(doc, root, Edge::Leading);
        trim_edge(doc, root, Edge::Trailing);
        remove_empty_elements(doc, root);
        collapse_nested(doc, root);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Edge {
    Leading,
    Trailing,
}

fn edge_child(doc: &Document, id: NodeId, edge: Edge) -> Option<NodeId> {
    match edge {
        Edge::Leading => doc.first_child(id),
        Edge::Trailing => doc.last_child(id),
    }
}

/// Trim whitespace text at one edge, descending while the edge child is an
/// element and dropping text nodes that trim to nothing.
fn trim_edge(doc: &mut Document, root: NodeId, edge: Edge) {
    let mut current = root;
    while let Some(child) = edge_child(doc, current, edge) {
        match doc.data(child) {
            Some(NodeData::Text(t)) => {
                let trimmed = match edge {
                    Edge::Leading => t.trim_start(),
                    Edge::Trailing => t.trim_end(),
                };
                if trimmed.is_empty() {
                    let _ = doc.detach(child);
                    continue;
                }
                let trimmed = trimmed.to_string();
                let _ = doc.set_text(child, trimmed);
                return;
            }
            Some(NodeData::Element(el)) if el.is("br") => {
                let _ = doc.detach(child);
            }
            Some(NodeData::Element(el)) if el.is_void() => return,
            Some(NodeData::Element(_)) => current = child,
            None => return,
        }
    }
}

fn is_removable_empty(doc: &Document, id: NodeId) -> bool {
    match doc.element(id) {
        Some(el) => {
            el.attrs.is_empty()
                && !el.is_void()
                && doc
                    .children(id)
                    .iter()
                    .all(|&c| doc.text(c).is_some_and(str::is_empty))
        }
        None => false,
    }
}

fn remove_empty_elements(doc: &mut Document, root: NodeId) {
    // Post-order, so a parent emptied by removing its children goes too.
    let mut order = doc.descendants(root);
    order.reverse();
    for node in order {
        if is_removable_empty(doc, node) {
            let _ = doc.detach(node);
        }
    }
}

fn collapse_nested(doc: &mut Document, root: NodeId) {
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        loop {
            let children = doc.children(node);
            let [only] = children else { break };
            let only = *only;
            let same_plain = match (doc.element(node), doc.element(only)) {
                (Some(outer), Some(inner)) => {
                    node != root
                        && outer.attrs.is_empty()
                        && inner.attrs.is_empty()
                        && outer.tag == inner.tag
                }
                _ => false,
            };
            if !same_plain {
                break;
            }
            let grandchildren = doc.children(only).to_vec();
            let _ = doc.detach(only);
            for g in grandchildren {
                let _ = doc.append_child(node, g);
            }
        }
        stack.extend(doc.children(node).iter().rev().copied());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trim(html: &str) -> String {
        let mut doc = Document::from_html(html);
        TrimWhitespace.apply(&mut doc);
        doc.to_html()
    }

    #[test]
    fn test_trims_paragraph_edges() {
        insta::assert_snapshot!(trim("<p>  hello there  </p>"), @"<p>hello there</p>");
    }

    #[test]
    fn test_trims_across_paragraphs() {
        insta::assert_snapshot!(
            trim("<p> <br></p><p>  hi</p><p>bye <br></p>"),
            @"<p>  hi</p><p>bye</p>"
        );
    }

    #[test]
    fn test_drops_empty_and_collapses() {
        insta::assert_snapshot!(
            trim("<p><b><b>x</b></b><i></i></p>"),
            @"<p><b>x</b></p>"
        );
    }

    #[test]
    fn test_skips_non_paragraph_content() {
        assert_eq!(trim("  <b>x</b> "), "  <b>x</b> ");
    }

    #[test]
    fn test_closure_transform() {
        let upper = |doc: &mut Document| {
            for node in doc.descendants(doc.root()) {
                if let Some(t) = doc.text(node).map(str::to_uppercase) {
                    let _ = doc.set_text(node, t);
                }
            }
        };
        let transforms: Vec<Box<dyn DocumentTransform>> = vec![Box::new(upper), Box::new(TrimWhitespace)];
        let mut doc = Document::from_html("<p> shout </p>");
        apply_all(&transforms, &mut doc);
        assert_eq!(doc.to_html(), "<p>SHOUT</p>");
    }
}
