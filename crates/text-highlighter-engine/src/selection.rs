//! Ranges and the active selection over a [`Document`].
//!
//! A boundary offset counts chars when the boundary node is text, and child
//! positions when it is an element. Ranges are expected to run forward in
//! document order.

use crate::dom::{Document, NodeId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Boundary {
    pub node: NodeId,
    pub offset: usize,
}

impl Boundary {
    pub fn new(node: NodeId, offset: usize) -> Self {
        Self { node, offset }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Range {
    pub start: Boundary,
    pub end: Boundary,
}

impl Range {
    pub fn new(start: Boundary, end: Boundary) -> Self {
        Self { start, end }
    }

    /// Range within a single node
    pub fn within(node: NodeId, start: usize, end: usize) -> Self {
        Self::new(Boundary::new(node, start), Boundary::new(node, end))
    }

    pub fn collapsed(&self) -> bool {
        self.start == self.end
    }

    /// Deepest node containing both boundaries
    pub fn common_ancestor(&self, doc: &Document) -> Option<NodeId> {
        let mut start_chain = Vec::new();
        let mut current = Some(self.start.node);
        while let Some(node) = current {
            start_chain.push(node);
            current = doc.parent(node);
        }

        let mut current = Some(self.end.node);
        while let Some(node) = current {
            if start_chain.contains(&node) {
                return Some(node);
            }
            current = doc.parent(node);
        }
        None
    }
}

/// The active selection: zero or more ranges
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    ranges: Vec<Range>,
}

impl Selection {
    pub fn ranges(&self) -> &[Range] {
        &self.ranges
    }

    pub fn range_count(&self) -> usize {
        self.ranges.len()
    }

    /// True when there is nothing selected
    pub fn is_collapsed(&self) -> bool {
        self.ranges.iter().all(Range::collapsed)
    }

    pub fn add_range(&mut self, range: Range) {
        self.ranges.push(range);
    }

    /// Replace the selection with a single range
    pub fn select(&mut self, range: Range) {
        self.ranges.clear();
        self.ranges.push(range);
    }

    /// Collapse the selection to a caret
    pub fn set_position(&mut self, node: NodeId, offset: usize) {
        let caret = Boundary::new(node, offset);
        self.select(Range::new(caret, caret));
    }

    /// Move the focus of the first range, keeping its anchor
    pub fn extend(&mut self, node: NodeId, offset: usize) {
        match self.ranges.first_mut() {
            Some(range) => range.end = Boundary::new(node, offset),
            None => self.set_position(node, offset),
        }
    }

    pub fn remove_all_ranges(&mut self) {
        self.ranges.clear();
    }
}
