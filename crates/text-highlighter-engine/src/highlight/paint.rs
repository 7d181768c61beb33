//! Region painting: wrapping text runs and merging into touching regions.

use std::collections::HashMap;

use crate::dom::{Document, NodeId};
use crate::highlight::decompose::TextRun;
use crate::highlight::region::{Brush, COLOR_ATTR, ID_ATTR, Paint, Wrapper};

/// Adopt the region enclosing `anchor` into the pending paint.
///
/// When the anchor sits in (or is) a region of the same wrapper and color,
/// every region sharing that region's id is relabeled to the paint's id so
/// the new highlight and the old one become one logical highlight.
pub(crate) fn pre_merge(doc: &mut Document, anchor: NodeId, paint: &Paint) {
    let element = if doc.is_element(anchor) {
        Some(anchor)
    } else {
        doc.parent(anchor)
    };
    let Some(element) = element else {
        return;
    };

    let Brush::Wrapper(wrapper) = paint.brush else {
        return;
    };
    if doc.tag(element).and_then(Wrapper::from_tag) != Some(wrapper) {
        return;
    }
    let color = doc.attribute(element, COLOR_ATTR).unwrap_or_default();
    if paint.color.as_deref().unwrap_or_default() != color {
        return;
    }
    let Some(old_id) = doc.attribute(element, ID_ATTR).map(str::to_string) else {
        return;
    };

    for node in doc.elements_with_attribute(ID_ATTR, &old_id) {
        doc.set_attribute(node, ID_ATTR, paint.id.clone());
    }
    doc.coalesce_text(element);
}

/// Surround one run with a new element of the paint's brush.
///
/// The leaf is split so the run becomes a whole text node, which then moves
/// into the new element. Returns `None` for an empty run.
pub(crate) fn wrap_run(doc: &mut Document, run: TextRun, paint: &Paint) -> Option<NodeId> {
    let len = doc.text_len(run.node);
    let end = run.end.min(len);
    if run.start >= end {
        return None;
    }

    if end < len {
        doc.split_text(run.node, end);
    }
    let target = if run.start > 0 {
        doc.split_text(run.node, run.start)?
    } else {
        run.node
    };

    let wrapper = doc.create_element(paint.brush.tag());
    doc.set_attribute(wrapper, ID_ATTR, paint.id.clone());
    if let Some(color) = paint.color.as_deref().filter(|color| !color.is_empty()) {
        doc.set_attribute(wrapper, COLOR_ATTR, color);
    }
    doc.insert_before(target, wrapper);
    doc.append_child(wrapper, target);
    Some(wrapper)
}

/// Wrap every run, returning the new elements in document order.
///
/// Selection ranges keep the order they were added in, so runs are first
/// sorted by leaf position and offset. They are then wrapped back to front:
/// splitting a leaf keeps its head in the original node, so offsets of
/// earlier runs on the same leaf stay valid.
pub(crate) fn paint_runs(doc: &mut Document, runs: &[TextRun], paint: &Paint) -> Vec<NodeId> {
    let position: HashMap<NodeId, usize> = doc
        .descendants(doc.root())
        .enumerate()
        .map(|(index, node)| (node, index))
        .collect();
    let mut ordered = runs.to_vec();
    ordered.sort_by_key(|run| {
        let at = position.get(&run.node).copied().unwrap_or(usize::MAX);
        (at, run.start)
    });

    let mut produced: Vec<NodeId> = ordered
        .into_iter()
        .rev()
        .filter_map(|run| wrap_run(doc, run, paint))
        .collect();
    produced.reverse();
    produced
}
