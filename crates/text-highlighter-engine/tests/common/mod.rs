#![allow(dead_code)]

use std::collections::HashMap;

use text_highlighter_engine::highlight::ID_ATTR;
use text_highlighter_engine::{
    Boundary, Document, Highlighter, MemoryStore, NodeId, Range, Store,
};

pub fn highlighter(markup: &str) -> Highlighter {
    Highlighter::new(Document::from_markup(markup).unwrap(), MemoryStore::new())
}

/// First attached text node containing `needle`
pub fn text_node(doc: &Document, needle: &str) -> NodeId {
    doc.descendants(doc.root())
        .find(|&n| doc.text(n).is_some_and(|text| text.contains(needle)))
        .unwrap_or_else(|| panic!("no text node contains {needle:?}"))
}

/// Select from char `start` of the leaf containing `from` to char `end` of
/// the leaf containing `to`
pub fn select<S: Store>(h: &mut Highlighter<S>, from: &str, start: usize, to: &str, end: usize) {
    let start_node = text_node(h.document(), from);
    let end_node = text_node(h.document(), to);
    h.selection_mut().select(Range::new(
        Boundary::new(start_node, start),
        Boundary::new(end_node, end),
    ));
}

/// Markup with every highlight id replaced by `h0`, `h1`, ... in order of
/// first appearance, so generated ids compare stably
pub fn labelled_markup(doc: &Document) -> String {
    let mut doc = doc.clone();
    let mut labels: HashMap<String, String> = HashMap::new();
    let tagged: Vec<NodeId> = doc
        .descendants(doc.root())
        .filter(|&n| doc.has_attribute(n, ID_ATTR))
        .collect();
    for node in tagged {
        let id = doc.attribute(node, ID_ATTR).unwrap().to_string();
        let next = format!("h{}", labels.len());
        let label = labels.entry(id).or_insert(next).clone();
        doc.set_attribute(node, ID_ATTR, label);
    }
    doc.to_markup()
}

/// Ids of every region in document order
pub fn region_ids<S: Store>(h: &Highlighter<S>) -> Vec<String> {
    h.regions()
        .into_iter()
        .map(|n| h.document().attribute(n, ID_ATTR).unwrap().to_string())
        .collect()
}

/// No element holds two adjacent text children or an empty one
pub fn assert_coalesced(doc: &Document) {
    for node in doc.descendants(doc.root()) {
        if doc.is_text(node) {
            assert!(doc.text_len(node) > 0, "empty text leaf");
            if let Some(next) = doc.next_sibling(node) {
                assert!(!doc.is_text(next), "adjacent text leaves");
            }
        }
    }
}

/// The regions of each id form one unbroken run in document order
pub fn assert_contiguous<S: Store>(h: &Highlighter<S>) {
    let ids = region_ids(h);
    for id in &ids {
        let first = ids.iter().position(|other| other == id).unwrap();
        let last = ids.iter().rposition(|other| other == id).unwrap();
        assert!(
            ids[first..=last].iter().all(|other| other == id),
            "highlight {id} is interrupted: {ids:?}"
        );
    }
}

/// No region sits anywhere inside another region
pub fn assert_flat<S: Store>(h: &Highlighter<S>) {
    let regions = h.regions();
    let doc = h.document();
    for &region in &regions {
        let enclosing = doc
            .parent(region)
            .and_then(|parent| doc.closest(parent, |_, n| regions.contains(&n)));
        assert_eq!(enclosing, None, "nested region in {}", doc.to_markup());
    }
}

pub fn assert_invariants<S: Store>(h: &Highlighter<S>) {
    assert_coalesced(h.document());
    assert_contiguous(h);
    assert_flat(h);
}

/// Text leaf holding the char at document position `pos`, with the
/// position at which that leaf starts
pub fn leaf_at(doc: &Document, pos: usize) -> (NodeId, usize) {
    let mut start = 0;
    for node in doc.descendants(doc.root()) {
        if !doc.is_text(node) {
            continue;
        }
        let len = doc.text_len(node);
        if pos < start + len {
            return (node, start);
        }
        start += len;
    }
    panic!("position {pos} is past the end of the document")
}
