//! Owned document tree the composer edits.
//!
//! Nodes live in an arena and are addressed by [`NodeId`]. Detached nodes stay
//! in the arena until the document is dropped; a surface replaces the whole
//! document when its content is set, so the arena never grows unbounded over a
//! composition session.

use std::cmp::Ordering;
use std::collections::HashSet;

use smol_str::SmolStr;

use crate::error::DocumentError;
use crate::types::{DomPoint, DomRange, NodeId};

/// Elements that never have children or a closing tag.
pub const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

pub fn is_void_element(tag: &str) -> bool {
    VOID_ELEMENTS.iter().any(|v| v.eq_ignore_ascii_case(tag))
}

/// Tag name plus attributes, in source order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementData {
    pub tag: SmolStr,
    pub attrs: Vec<(SmolStr, String)>,
}

impl ElementData {
    pub fn new(tag: impl Into<SmolStr>) -> Self {
        Self {
            tag: tag.into(),
            attrs: Vec::new(),
        }
    }

    pub fn with_attr(mut self, name: impl Into<SmolStr>, value: impl Into<String>) -> Self {
        self.set_attr(name, value);
        self
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Set an attribute, keeping its position if it already exists.
    pub fn set_attr(&mut self, name: impl Into<SmolStr>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self
            .attrs
            .iter_mut()
            .find(|(n, _)| n.eq_ignore_ascii_case(&name))
        {
            Some((_, v)) => *v = value,
            None => self.attrs.push((name, value)),
        }
    }

    pub fn remove_attr(&mut self, name: &str) -> Option<String> {
        let pos = self
            .attrs
            .iter()
            .position(|(n, _)| n.eq_ignore_ascii_case(name))?;
        Some(self.attrs.remove(pos).1)
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.attr("class")
            .is_some_and(|c| c.split_ascii_whitespace().any(|c| c == class))
    }

    pub fn is(&self, tag: &str) -> bool {
        self.tag.eq_ignore_ascii_case(tag)
    }

    pub fn is_void(&self) -> bool {
        is_void_element(&self.tag)
    }

    /// Whether the element is marked `contenteditable="false"`.
    pub fn is_non_editable(&self) -> bool {
        self.attr("contenteditable")
            .is_some_and(|v| v.eq_ignore_ascii_case("false"))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeData {
    Element(ElementData),
    Text(String),
}

#[derive(Debug, Clone)]
struct Node {
    data: NodeData,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// Arena-backed element/text tree with a single root container.
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Node>,
    root: NodeId,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

/// Boundary anchored to a node that survives the deletion it delimits.
#[derive(Debug, Clone, Copy)]
enum Boundary {
    Before(NodeId),
    After(NodeId),
    StartOf(NodeId),
    EndOf(NodeId),
}

pub(crate) fn char_to_byte(s: &str, char_offset: usize) -> usize {
    s.char_indices()
        .nth(char_offset)
        .map(|(b, _)| b)
        .unwrap_or(s.len())
}

impl Document {
    pub fn new() -> Self {
        Self {
            nodes: vec![Node {
                data: NodeData::Element(ElementData::new("div")),
                parent: None,
                children: Vec::new(),
            }],
            root: NodeId(0),
        }
    }

    /// The container element holding the content.
    pub fn root(&self) -> NodeId {
        self.root
    }

    fn node(&self, id: NodeId) -> Result<&Node, DocumentError> {
        self.nodes
            .get(id.index())
            .ok_or(DocumentError::UnknownNode(id))
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut Node, DocumentError> {
        self.nodes
            .get_mut(id.index())
            .ok_or(DocumentError::UnknownNode(id))
    }

    fn push(&mut self, data: NodeData) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node {
            data,
            parent: None,
            children: Vec::new(),
        });
        id
    }

    // === Construction ===

    pub fn create_element(&mut self, tag: impl Into<SmolStr>) -> NodeId {
        self.push(NodeData::Element(ElementData::new(tag)))
    }

    pub fn create_element_with(&mut self, element: ElementData) -> NodeId {
        self.push(NodeData::Element(element))
    }

    pub fn create_text(&mut self, text: impl Into<String>) -> NodeId {
        self.push(NodeData::Text(text.into()))
    }

    // === Inspection ===

    pub fn data(&self, id: NodeId) -> Option<&NodeData> {
        self.nodes.get(id.index()).map(|n| &n.data)
    }

    pub fn element(&self, id: NodeId) -> Option<&ElementData> {
        match self.data(id)? {
            NodeData::Element(el) => Some(el),
            NodeData::Text(_) => None,
        }
    }

    pub fn element_mut(&mut self, id: NodeId) -> Option<&mut ElementData> {
        match &mut self.nodes.get_mut(id.index())?.data {
            NodeData::Element(el) => Some(el),
            NodeData::Text(_) => None,
        }
    }

    pub fn text(&self, id: NodeId) -> Option<&str> {
        match self.data(id)? {
            NodeData::Text(t) => Some(t.as_str()),
            NodeData::Element(_) => None,
        }
    }

    pub fn is_text(&self, id: NodeId) -> bool {
        self.text(id).is_some()
    }

    /// Whether `id` is an element with the given tag.
    pub fn is_element(&self, id: NodeId, tag: &str) -> bool {
        self.element(id).is_some_and(|el| el.is(tag))
    }

    pub fn set_text(&mut self, id: NodeId, text: impl Into<String>) -> Result<(), DocumentError> {
        match &mut self.node_mut(id)?.data {
            NodeData::Text(t) => {
                *t = text.into();
                Ok(())
            }
            NodeData::Element(_) => Err(DocumentError::WrongNodeKind {
                node: id,
                expected: "a text node",
            }),
        }
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id.index())?.parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes
            .get(id.index())
            .map(|n| n.children.as_slice())
            .unwrap_or(&[])
    }

    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.children(id).first().copied()
    }

    pub fn last_child(&self, id: NodeId) -> Option<NodeId> {
        self.children(id).last().copied()
    }

    pub fn index_in_parent(&self, id: NodeId) -> Option<usize> {
        let parent = self.parent(id)?;
        self.children(parent).iter().position(|&c| c == id)
    }

    pub fn previous_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let idx = self.index_in_parent(id)?;
        idx.checked_sub(1)
            .and_then(|i| self.children(parent).get(i).copied())
    }

    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let idx = self.index_in_parent(id)?;
        self.children(parent).get(idx + 1).copied()
    }

    /// Whether the node is reachable from the root.
    pub fn is_attached(&self, id: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(node) = current {
            if node == self.root {
                return true;
            }
            current = self.parent(node);
        }
        false
    }

    /// Length of a node in boundary-point units: chars for text, children for elements.
    pub fn node_len(&self, id: NodeId) -> usize {
        match self.data(id) {
            Some(NodeData::Text(t)) => t.chars().count(),
            Some(NodeData::Element(_)) => self.children(id).len(),
            None => 0,
        }
    }

    /// All nodes below `id` in document order, excluding `id` itself.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(node) = stack.pop() {
            out.push(node);
            stack.extend(self.children(node).iter().rev().copied());
        }
        out
    }

    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        if let Some(t) = self.text(id) {
            out.push_str(t);
        }
        for node in self.descendants(id) {
            if let Some(t) = self.text(node) {
                out.push_str(t);
            }
        }
        out
    }

    /// True when the content has no visible text and no embedded images.
    pub fn is_empty_content(&self) -> bool {
        let has_image = self
            .descendants(self.root)
            .into_iter()
            .any(|n| self.is_element(n, "img"));
        !has_image && self.text_content(self.root).trim().is_empty()
    }

    // === Mutation ===

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), DocumentError> {
        let len = self.node(parent)?.children.len();
        let len = if self.parent(child) == Some(parent) {
            len - 1
        } else {
            len
        };
        self.insert_child(parent, len, child)
    }

    /// Insert `child` at `index` among `parent`'s children, moving it if needed.
    pub fn insert_child(
        &mut self,
        parent: NodeId,
        index: usize,
        child: NodeId,
    ) -> Result<(), DocumentError> {
        if self.element(parent).is_none() {
            self.node(parent)?;
            return Err(DocumentError::WrongNodeKind {
                node: parent,
                expected: "an element",
            });
        }
        self.node(child)?;
        let mut ancestor = Some(parent);
        while let Some(a) = ancestor {
            if a == child {
                return Err(DocumentError::Cycle(child));
            }
            ancestor = self.parent(a);
        }

        self.detach(child)?;
        let len = self.node(parent)?.children.len();
        if index > len {
            return Err(DocumentError::OffsetOutOfBounds {
                node: parent,
                offset: index,
                len,
            });
        }
        self.node_mut(parent)?.children.insert(index, child);
        self.node_mut(child)?.parent = Some(parent);
        Ok(())
    }

    pub fn insert_before(&mut self, reference: NodeId, child: NodeId) -> Result<(), DocumentError> {
        let parent = self
            .parent(reference)
            .ok_or(DocumentError::Detached(reference))?;
        if self.parent(child) == Some(parent) {
            self.detach(child)?;
        }
        let idx = self
            .index_in_parent(reference)
            .ok_or(DocumentError::Detached(reference))?;
        self.insert_child(parent, idx, child)
    }

    pub fn insert_after(&mut self, reference: NodeId, child: NodeId) -> Result<(), DocumentError> {
        let parent = self
            .parent(reference)
            .ok_or(DocumentError::Detached(reference))?;
        if self.parent(child) == Some(parent) {
            self.detach(child)?;
        }
        let idx = self
            .index_in_parent(reference)
            .ok_or(DocumentError::Detached(reference))?;
        self.insert_child(parent, idx + 1, child)
    }

    /// Remove a node from its parent. The node and its subtree stay usable.
    pub fn detach(&mut self, id: NodeId) -> Result<(), DocumentError> {
        let Some(parent) = self.node(id)?.parent else {
            return Ok(());
        };
        self.node_mut(parent)?.children.retain(|&c| c != id);
        self.node_mut(id)?.parent = None;
        Ok(())
    }

    /// Put `replacements` where `id` was, in order, and detach `id`.
    pub fn replace_with(&mut self, id: NodeId, replacements: &[NodeId]) -> Result<(), DocumentError> {
        let parent = self.parent(id).ok_or(DocumentError::Detached(id))?;
        let idx = self
            .index_in_parent(id)
            .ok_or(DocumentError::Detached(id))?;
        self.detach(id)?;
        for (k, &node) in replacements.iter().enumerate() {
            self.insert_child(parent, idx + k, node)?;
        }
        Ok(())
    }

    /// Split a text node at a char offset. Returns the new right-hand node,
    /// which is inserted right after `id` when `id` has a parent.
    pub fn split_text(&mut self, id: NodeId, offset: usize) -> Result<NodeId, DocumentError> {
        let text = self.text(id).ok_or(DocumentError::WrongNodeKind {
            node: id,
            expected: "a text node",
        })?;
        let len = text.chars().count();
        if offset > len {
            return Err(DocumentError::OffsetOutOfBounds {
                node: id,
                offset,
                len,
            });
        }
        let split_at = char_to_byte(text, offset);
        let right = text[split_at..].to_string();
        let left = text[..split_at].to_string();
        self.set_text(id, left)?;
        let new = self.create_text(right);
        if self.parent(id).is_some() {
            self.insert_after(id, new)?;
        }
        Ok(new)
    }

    // === Points and ranges ===

    /// Check that a point names an attached node and an in-bounds offset.
    pub fn validate_point(&self, point: DomPoint) -> Result<(), DocumentError> {
        self.node(point.node)?;
        if !self.is_attached(point.node) {
            return Err(DocumentError::Detached(point.node));
        }
        let len = self.node_len(point.node);
        if point.offset > len {
            return Err(DocumentError::OffsetOutOfBounds {
                node: point.node,
                offset: point.offset,
                len,
            });
        }
        Ok(())
    }

    pub fn is_valid_range(&self, range: DomRange) -> bool {
        self.validate_point(range.start).is_ok() && self.validate_point(range.end).is_ok()
    }

    fn path_to(&self, point: DomPoint) -> Result<Vec<usize>, DocumentError> {
        self.validate_point(point)?;
        let mut path = vec![point.offset];
        let mut current = point.node;
        while current != self.root {
            let idx = self
                .index_in_parent(current)
                .ok_or(DocumentError::Detached(current))?;
            path.push(idx);
            current = self.parent(current).ok_or(DocumentError::Detached(current))?;
        }
        path.reverse();
        Ok(path)
    }

    /// Document-order comparison of two boundary points.
    pub fn compare_points(&self, a: DomPoint, b: DomPoint) -> Result<Ordering, DocumentError> {
        Ok(self.path_to(a)?.cmp(&self.path_to(b)?))
    }

    /// Range covering exactly one node, like `Range.selectNode`.
    pub fn select_node(&self, id: NodeId) -> Option<DomRange> {
        let parent = self.parent(id)?;
        let idx = self.index_in_parent(id)?;
        Some(DomRange::within(parent, idx, idx + 1))
    }

    /// Where a caret lands when placed at the end of the content.
    pub fn end_point(&self) -> DomPoint {
        let mut current = self.root;
        loop {
            let Some(last) = self.last_child(current) else {
                return DomPoint::new(current, 0);
            };
            let count = self.children(current).len();
            match self.data(last) {
                Some(NodeData::Text(t)) => return DomPoint::new(last, t.chars().count()),
                Some(NodeData::Element(el)) if el.is("br") => {
                    return DomPoint::new(current, count - 1);
                }
                Some(NodeData::Element(el)) if el.is_void() || el.is_non_editable() => {
                    return DomPoint::new(current, count);
                }
                Some(NodeData::Element(_)) => current = last,
                None => return DomPoint::new(current, count),
            }
        }
    }

    fn start_boundary(&mut self, point: DomPoint) -> Result<Boundary, DocumentError> {
        let node = point.node;
        if self.is_text(node) {
            let parent = self.parent(node).ok_or(DocumentError::Detached(node))?;
            if point.offset == 0 {
                return Ok(match self.previous_sibling(node) {
                    Some(prev) => Boundary::After(prev),
                    None => Boundary::StartOf(parent),
                });
            }
            if point.offset < self.node_len(node) {
                self.split_text(node, point.offset)?;
            }
            return Ok(Boundary::After(node));
        }
        Ok(match point.offset.checked_sub(1) {
            Some(prev) => Boundary::After(self.children(node)[prev]),
            None => Boundary::StartOf(node),
        })
    }

    fn end_boundary(&mut self, point: DomPoint) -> Result<Boundary, DocumentError> {
        let node = point.node;
        if self.is_text(node) {
            let parent = self.parent(node).ok_or(DocumentError::Detached(node))?;
            if point.offset == 0 {
                return Ok(Boundary::Before(node));
            }
            if point.offset >= self.node_len(node) {
                return Ok(match self.next_sibling(node) {
                    Some(next) => Boundary::Before(next),
                    None => Boundary::EndOf(parent),
                });
            }
            let right = self.split_text(node, point.offset)?;
            return Ok(Boundary::Before(right));
        }
        Ok(match self.children(node).get(point.offset) {
            Some(&next) => Boundary::Before(next),
            None => Boundary::EndOf(node),
        })
    }

    fn resolve(&self, boundary: Boundary) -> Result<DomPoint, DocumentError> {
        let sibling_point = |id: NodeId, shift: usize| {
            let parent = self.parent(id).ok_or(DocumentError::Detached(id))?;
            let idx = self
                .index_in_parent(id)
                .ok_or(DocumentError::Detached(id))?;
            Ok(DomPoint::new(parent, idx + shift))
        };
        match boundary {
            Boundary::Before(id) => sibling_point(id, 0),
            Boundary::After(id) => sibling_point(id, 1),
            Boundary::StartOf(id) => Ok(DomPoint::new(id, 0)),
            Boundary::EndOf(id) => Ok(DomPoint::new(id, self.node_len(id))),
        }
    }

    /// Remove everything inside `range`. Returns the collapsed point where
    /// the removed content used to start.
    pub fn delete_range(&mut self, range: DomRange) -> Result<DomPoint, DocumentError> {
        let (start, end) = match self.compare_points(range.start, range.end)? {
            Ordering::Greater => (range.end, range.start),
            _ => (range.start, range.end),
        };
        if start == end {
            return Ok(start);
        }

        if start.node == end.node {
            if let NodeData::Text(t) = &mut self.node_mut(start.node)?.data {
                let from = char_to_byte(t, start.offset);
                let to = char_to_byte(t, end.offset);
                t.replace_range(from..to, "");
            } else {
                let doomed = self.children(start.node)[start.offset..end.offset].to_vec();
                for node in doomed {
                    self.detach(node)?;
                }
            }
            return Ok(start);
        }

        let end_marker = self.end_boundary(end)?;
        let start_marker = self.start_boundary(start)?;
        let from = self.resolve(start_marker)?;
        let to = self.resolve(end_marker)?;

        let mut contained = Vec::new();
        for node in self.descendants(self.root) {
            let Some(span) = self.select_node(node) else {
                continue;
            };
            if self.compare_points(span.start, from)? != Ordering::Less
                && self.compare_points(span.end, to)? != Ordering::Greater
            {
                contained.push(node);
            }
        }
        let set: HashSet<NodeId> = contained.iter().copied().collect();
        for node in contained {
            let parent_removed = self.parent(node).is_some_and(|p| set.contains(&p));
            if !parent_removed {
                self.detach(node)?;
            }
        }

        if self.is_text(start.node) && start.offset > 0 {
            Ok(start)
        } else {
            self.resolve(start_marker)
        }
    }

    /// Insert detached nodes at a point, splitting a text node when needed.
    /// Returns the caret position right after the inserted content.
    pub fn insert_nodes(&mut self, at: DomPoint, nodes: &[NodeId]) -> Result<DomPoint, DocumentError> {
        self.validate_point(at)?;
        let Some(&last) = nodes.last() else {
            return Ok(at);
        };
        let (parent, index) = if self.is_text(at.node) {
            let parent = self.parent(at.node).ok_or(DocumentError::Detached(at.node))?;
            let idx = self
                .index_in_parent(at.node)
                .ok_or(DocumentError::Detached(at.node))?;
            if at.offset == 0 {
                (parent, idx)
            } else {
                if at.offset < self.node_len(at.node) {
                    self.split_text(at.node, at.offset)?;
                }
                (parent, idx + 1)
            }
        } else {
            (at.node, at.offset)
        };

        for (k, &node) in nodes.iter().enumerate() {
            self.insert_child(parent, index + k, node)?;
        }

        Ok(match self.text(last) {
            Some(t) => DomPoint::new(last, t.chars().count()),
            None => DomPoint::new(parent, index + nodes.len()),
        })
    }
}
