//! # Document tree
//!
//! An arena-owned tree of text and element nodes. The [`Document`] owns every
//! node in a single `Vec`; parent, child and sibling links are [`NodeId`]
//! indices into that arena, so the tree never needs shared ownership or
//! reference cycles. Detached nodes stay in the arena but are unreachable from
//! the root.
//!
//! All traversal helpers are iterative so deep trees cannot exhaust the stack,
//! and every "next" step is computed from the live links, which keeps walks
//! correct while the highlight engine detaches and reinserts nodes.

pub mod markup;
pub mod selector;

pub use markup::MarkupError;
pub use selector::{Selector, SelectorError};

/// Tag of the document root. Traversal never climbs past it.
pub const ROOT_TAG: &str = "body";

/// Attribute that removes an element and its subtree from rendering
pub const HIDDEN_ATTR: &str = "hidden";

/// Index of a node in its [`Document`] arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    fn index(self) -> usize {
        self.0 as usize
    }
}

/// Markup namespace of an element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Namespace {
    #[default]
    Html,
    Svg,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ElementData {
    /// Lowercase tag name
    pub tag: String,
    pub namespace: Namespace,
    /// Attributes in insertion order
    pub attributes: Vec<(String, String)>,
}

impl ElementData {
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Text(String),
    Element(ElementData),
}

#[derive(Debug, Clone)]
struct NodeData {
    kind: NodeKind,
    parent: Option<NodeId>,
    first_child: Option<NodeId>,
    last_child: Option<NodeId>,
    prev_sibling: Option<NodeId>,
    next_sibling: Option<NodeId>,
}

impl NodeData {
    fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            parent: None,
            first_child: None,
            last_child: None,
            prev_sibling: None,
            next_sibling: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<NodeData>,
    root: NodeId,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Create an empty document containing only the root element
    pub fn new() -> Self {
        let root = NodeData::new(NodeKind::Element(ElementData {
            tag: ROOT_TAG.to_string(),
            namespace: Namespace::Html,
            attributes: Vec::new(),
        }));
        Self {
            nodes: vec![root],
            root: NodeId(0),
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    // ---- node creation ----

    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.create_element_ns(tag, Namespace::Html)
    }

    pub fn create_element_ns(&mut self, tag: &str, namespace: Namespace) -> NodeId {
        self.push(NodeKind::Element(ElementData {
            tag: tag.to_ascii_lowercase(),
            namespace,
            attributes: Vec::new(),
        }))
    }

    pub fn create_text(&mut self, data: impl Into<String>) -> NodeId {
        self.push(NodeKind::Text(data.into()))
    }

    fn push(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(NodeData::new(kind));
        id
    }

    // ---- node inspection ----

    pub fn kind(&self, node: NodeId) -> &NodeKind {
        &self.nodes[node.index()].kind
    }

    pub fn is_text(&self, node: NodeId) -> bool {
        matches!(self.kind(node), NodeKind::Text(_))
    }

    pub fn is_element(&self, node: NodeId) -> bool {
        matches!(self.kind(node), NodeKind::Element(_))
    }

    pub fn element(&self, node: NodeId) -> Option<&ElementData> {
        match self.kind(node) {
            NodeKind::Element(data) => Some(data),
            NodeKind::Text(_) => None,
        }
    }

    fn element_mut(&mut self, node: NodeId) -> Option<&mut ElementData> {
        match &mut self.nodes[node.index()].kind {
            NodeKind::Element(data) => Some(data),
            NodeKind::Text(_) => None,
        }
    }

    pub fn tag(&self, node: NodeId) -> Option<&str> {
        self.element(node).map(|e| e.tag.as_str())
    }

    pub fn namespace(&self, node: NodeId) -> Option<Namespace> {
        self.element(node).map(|e| e.namespace)
    }

    /// Data of a text node
    pub fn text(&self, node: NodeId) -> Option<&str> {
        match self.kind(node) {
            NodeKind::Text(data) => Some(data),
            NodeKind::Element(_) => None,
        }
    }

    /// Length of a text node in chars; 0 for elements
    pub fn text_len(&self, node: NodeId) -> usize {
        self.text(node).map_or(0, |t| t.chars().count())
    }

    pub fn set_text(&mut self, node: NodeId, data: impl Into<String>) {
        if let NodeKind::Text(text) = &mut self.nodes[node.index()].kind {
            *text = data.into();
        }
    }

    /// Concatenated text of the node and all of its descendants
    pub fn text_content(&self, node: NodeId) -> String {
        self.descendants(node)
            .filter_map(|n| self.text(n))
            .collect()
    }

    // ---- attributes ----

    pub fn attribute(&self, node: NodeId, name: &str) -> Option<&str> {
        self.element(node).and_then(|e| e.attribute(name))
    }

    pub fn has_attribute(&self, node: NodeId, name: &str) -> bool {
        self.attribute(node, name).is_some()
    }

    pub fn set_attribute(&mut self, node: NodeId, name: &str, value: impl Into<String>) {
        let value = value.into();
        if let Some(element) = self.element_mut(node) {
            match element.attributes.iter_mut().find(|(key, _)| key == name) {
                Some((_, existing)) => *existing = value,
                None => element.attributes.push((name.to_string(), value)),
            }
        }
    }

    pub fn remove_attribute(&mut self, node: NodeId, name: &str) {
        if let Some(element) = self.element_mut(node) {
            element.attributes.retain(|(key, _)| key != name);
        }
    }

    // ---- structure queries ----

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes[node.index()].parent
    }

    pub fn first_child(&self, node: NodeId) -> Option<NodeId> {
        self.nodes[node.index()].first_child
    }

    pub fn last_child(&self, node: NodeId) -> Option<NodeId> {
        self.nodes[node.index()].last_child
    }

    pub fn next_sibling(&self, node: NodeId) -> Option<NodeId> {
        self.nodes[node.index()].next_sibling
    }

    pub fn previous_sibling(&self, node: NodeId) -> Option<NodeId> {
        self.nodes[node.index()].prev_sibling
    }

    pub fn children(&self, node: NodeId) -> Children<'_> {
        Children {
            doc: self,
            next: self.first_child(node),
        }
    }

    pub fn child_at(&self, node: NodeId, index: usize) -> Option<NodeId> {
        self.children(node).nth(index)
    }

    /// Position of the node among its parent's children
    pub fn child_index(&self, node: NodeId) -> Option<usize> {
        let parent = self.parent(node)?;
        self.children(parent).position(|child| child == node)
    }

    /// Pre-order walk of `node` and its subtree
    pub fn descendants(&self, node: NodeId) -> Descendants<'_> {
        Descendants {
            doc: self,
            scope: node,
            next: Some(node),
        }
    }

    /// Whether `node` is `ancestor` or lies inside its subtree
    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(n) = current {
            if n == ancestor {
                return true;
            }
            current = self.parent(n);
        }
        false
    }

    /// Whether the node is reachable from the root
    pub fn is_attached(&self, node: NodeId) -> bool {
        self.contains(self.root, node)
    }

    /// Nearest ancestor-or-self element matching the predicate
    pub fn closest(
        &self,
        node: NodeId,
        mut predicate: impl FnMut(&Document, NodeId) -> bool,
    ) -> Option<NodeId> {
        let mut current = Some(node);
        while let Some(n) = current {
            if self.is_element(n) && predicate(self, n) {
                return Some(n);
            }
            current = self.parent(n);
        }
        None
    }

    /// An element is rendered unless it or an ancestor is hidden
    pub fn is_rendered(&self, node: NodeId) -> bool {
        self.closest(node, |doc, n| doc.has_attribute(n, HIDDEN_ATTR))
            .is_none()
    }

    /// Next node in document order that is not inside `node`: its next
    /// sibling, or the next sibling of its nearest ancestor that has one.
    /// Stops at the root.
    pub fn next_node(&self, node: NodeId) -> Option<NodeId> {
        let mut current = node;
        loop {
            if current == self.root {
                return None;
            }
            if let Some(next) = self.next_sibling(current) {
                return Some(next);
            }
            current = self.parent(current)?;
        }
    }

    /// First text node reached by following first children
    pub fn first_text_descendant(&self, node: NodeId) -> Option<NodeId> {
        let mut current = node;
        loop {
            if self.is_text(current) {
                return Some(current);
            }
            current = self.first_child(current)?;
        }
    }

    /// Every attached element with the given tag, in document order
    pub fn elements_by_tag(&self, tag: &str) -> Vec<NodeId> {
        self.descendants(self.root)
            .filter(|&n| self.tag(n).is_some_and(|t| t.eq_ignore_ascii_case(tag)))
            .collect()
    }

    /// Position of an element among all elements sharing its tag
    pub fn tag_ordinal(&self, node: NodeId) -> Option<usize> {
        let tag = self.tag(node)?;
        self.elements_by_tag(tag).iter().position(|&n| n == node)
    }

    /// Every attached element whose attribute `name` equals `value`
    pub fn elements_with_attribute(&self, name: &str, value: &str) -> Vec<NodeId> {
        self.descendants(self.root)
            .filter(|&n| self.attribute(n, name) == Some(value))
            .collect()
    }

    // ---- mutation ----

    /// Remove the node from its parent; its own subtree stays intact
    pub fn detach(&mut self, node: NodeId) {
        let data = &self.nodes[node.index()];
        let (parent, prev, next) = (data.parent, data.prev_sibling, data.next_sibling);

        match prev {
            Some(p) => self.nodes[p.index()].next_sibling = next,
            None => {
                if let Some(parent) = parent {
                    self.nodes[parent.index()].first_child = next;
                }
            }
        }
        match next {
            Some(n) => self.nodes[n.index()].prev_sibling = prev,
            None => {
                if let Some(parent) = parent {
                    self.nodes[parent.index()].last_child = prev;
                }
            }
        }

        let data = &mut self.nodes[node.index()];
        data.parent = None;
        data.prev_sibling = None;
        data.next_sibling = None;
    }

    /// Move `node` to sit immediately before `reference`
    pub fn insert_before(&mut self, reference: NodeId, node: NodeId) {
        if reference == node {
            return;
        }
        let Some(parent) = self.parent(reference) else {
            return;
        };
        if self.contains(node, parent) {
            return;
        }
        self.detach(node);

        let prev = self.previous_sibling(reference);
        {
            let data = &mut self.nodes[node.index()];
            data.parent = Some(parent);
            data.prev_sibling = prev;
            data.next_sibling = Some(reference);
        }
        self.nodes[reference.index()].prev_sibling = Some(node);
        match prev {
            Some(p) => self.nodes[p.index()].next_sibling = Some(node),
            None => self.nodes[parent.index()].first_child = Some(node),
        }
    }

    /// Move `node` to sit immediately after `reference`
    pub fn insert_after(&mut self, reference: NodeId, node: NodeId) {
        match self.next_sibling(reference) {
            Some(next) => self.insert_before(next, node),
            None => {
                if let Some(parent) = self.parent(reference) {
                    self.append_child(parent, node);
                }
            }
        }
    }

    pub fn append_child(&mut self, parent: NodeId, node: NodeId) {
        if self.contains(node, parent) {
            return;
        }
        self.detach(node);

        let last = self.last_child(parent);
        {
            let data = &mut self.nodes[node.index()];
            data.parent = Some(parent);
            data.prev_sibling = last;
            data.next_sibling = None;
        }
        match last {
            Some(l) => self.nodes[l.index()].next_sibling = Some(node),
            None => self.nodes[parent.index()].first_child = Some(node),
        }
        self.nodes[parent.index()].last_child = Some(node);
    }

    pub fn prepend_child(&mut self, parent: NodeId, node: NodeId) {
        match self.first_child(parent) {
            Some(first) => self.insert_before(first, node),
            None => self.append_child(parent, node),
        }
    }

    /// Split a text node at a char offset. The node keeps `[0, offset)`;
    /// the returned new sibling holds the rest.
    pub fn split_text(&mut self, node: NodeId, offset: usize) -> Option<NodeId> {
        let NodeKind::Text(data) = &mut self.nodes[node.index()].kind else {
            return None;
        };
        let at = byte_offset(data, offset);
        let rest = data.split_off(at);
        let tail = self.create_text(rest);
        if self.parent(node).is_some() {
            self.insert_after(node, tail);
        }
        Some(tail)
    }

    /// Replace an element with its own children. Returns the former parent.
    pub fn unwrap(&mut self, node: NodeId) -> Option<NodeId> {
        let parent = self.parent(node)?;
        while let Some(child) = self.first_child(node) {
            self.insert_before(node, child);
        }
        self.detach(node);
        self.coalesce_text(parent);
        Some(parent)
    }

    /// Merge runs of adjacent text children into their first node and drop
    /// empty text children.
    pub fn coalesce_text(&mut self, parent: NodeId) {
        let mut current = self.first_child(parent);
        while let Some(node) = current {
            let next = self.next_sibling(node);
            if !self.is_text(node) {
                current = next;
                continue;
            }
            if self.text_len(node) == 0 {
                self.detach(node);
                current = next;
                continue;
            }
            // absorb every following text sibling
            while let Some(sibling) = self.next_sibling(node)
                && self.is_text(sibling)
            {
                let tail = self.text(sibling).unwrap_or_default().to_string();
                if let NodeKind::Text(data) = &mut self.nodes[node.index()].kind {
                    data.push_str(&tail);
                }
                self.detach(sibling);
            }
            current = self.next_sibling(node);
        }
    }
}

/// Byte position of the char at `offset`, clamped to the string length
pub(crate) fn byte_offset(text: &str, offset: usize) -> usize {
    text.char_indices()
        .nth(offset)
        .map_or(text.len(), |(index, _)| index)
}

pub struct Children<'a> {
    doc: &'a Document,
    next: Option<NodeId>,
}

impl Iterator for Children<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = self.doc.next_sibling(current);
        Some(current)
    }
}

pub struct Descendants<'a> {
    doc: &'a Document,
    scope: NodeId,
    next: Option<NodeId>,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = match self.doc.first_child(current) {
            Some(child) => Some(child),
            None => {
                // climb until a sibling is found, without leaving the scope
                let mut node = current;
                loop {
                    if node == self.scope {
                        break None;
                    }
                    if let Some(sibling) = self.doc.next_sibling(node) {
                        break Some(sibling);
                    }
                    match self.doc.parent(node) {
                        Some(parent) => node = parent,
                        None => break None,
                    }
                }
            }
        };
        Some(current)
    }
}
