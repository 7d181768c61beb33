use crate::dom::{Document, NodeId};

/// First attached text node containing `needle`
pub fn text_node(doc: &Document, needle: &str) -> NodeId {
    doc.descendants(doc.root())
        .find(|&n| doc.text(n).is_some_and(|text| text.contains(needle)))
        .unwrap_or_else(|| panic!("no text node contains {needle:?}"))
}
