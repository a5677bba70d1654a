//! Value types for positions and selections inside a [`Document`](crate::Document).
//!
//! Everything here is a plain `Copy` value captured at an instant. Two
//! snapshots compare equal when they point at the same containers and
//! offsets, regardless of when they were taken.

use std::fmt;

/// Handle to a node in a [`Document`](crate::Document) arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}

/// A boundary point in the document.
///
/// Inside a text node `offset` counts chars. Inside an element it counts
/// child positions, so `offset == 2` sits between the second and third child.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DomPoint {
    pub node: NodeId,
    pub offset: usize,
}

impl DomPoint {
    pub fn new(node: NodeId, offset: usize) -> Self {
        Self { node, offset }
    }
}

/// An ordered pair of boundary points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DomRange {
    pub start: DomPoint,
    pub end: DomPoint,
}

impl DomRange {
    pub fn new(start: DomPoint, end: DomPoint) -> Self {
        Self { start, end }
    }

    /// A collapsed range at a single point.
    pub fn caret(point: DomPoint) -> Self {
        Self {
            start: point,
            end: point,
        }
    }

    /// Range covering `start..end` chars (or children) of one node.
    pub fn within(node: NodeId, start: usize, end: usize) -> Self {
        Self {
            start: DomPoint::new(node, start),
            end: DomPoint::new(node, end),
        }
    }

    pub fn is_collapsed(&self) -> bool {
        self.start == self.end
    }
}

/// Selection state captured at an instant.
///
/// Anchor is where the selection started, focus is where the caret is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SelectionSnapshot {
    pub anchor_node: NodeId,
    pub anchor_offset: usize,
    pub focus_node: NodeId,
    pub focus_offset: usize,
}

impl SelectionSnapshot {
    pub fn new(anchor: DomPoint, focus: DomPoint) -> Self {
        Self {
            anchor_node: anchor.node,
            anchor_offset: anchor.offset,
            focus_node: focus.node,
            focus_offset: focus.offset,
        }
    }

    pub fn caret(point: DomPoint) -> Self {
        Self::new(point, point)
    }

    /// Snapshot of a range, anchored at its start.
    pub fn from_range(range: DomRange) -> Self {
        Self::new(range.start, range.end)
    }

    pub fn anchor(&self) -> DomPoint {
        DomPoint::new(self.anchor_node, self.anchor_offset)
    }

    pub fn focus(&self) -> DomPoint {
        DomPoint::new(self.focus_node, self.focus_offset)
    }

    pub fn is_collapsed(&self) -> bool {
        self.anchor() == self.focus()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_structural_equality() {
        let a = SelectionSnapshot::caret(DomPoint::new(NodeId(3), 4));
        let b = SelectionSnapshot::new(DomPoint::new(NodeId(3), 4), DomPoint::new(NodeId(3), 4));
        assert_eq!(a, b);
        assert!(a.is_collapsed());
    }

    #[test]
    fn test_snapshot_direction() {
        let sel = SelectionSnapshot::new(DomPoint::new(NodeId(1), 5), DomPoint::new(NodeId(1), 2));
        assert!(!sel.is_collapsed());
        assert_eq!(sel.focus().offset, 2);
        assert_eq!(sel.anchor().offset, 5);
    }

    #[test]
    fn test_range_within() {
        let r = DomRange::within(NodeId(7), 1, 4);
        assert_eq!(r.start, DomPoint::new(NodeId(7), 1));
        assert!(!r.is_collapsed());
        assert!(DomRange::caret(r.end).is_collapsed());
    }
}
