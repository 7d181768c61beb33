//! Overlap resolution.
//!
//! Painting inside an existing region nests one region in another. The
//! resolver hoists the outer region's children out of it so regions stay
//! flat, then repairs any logical highlight that the hoisting left split
//! around a foreign region.

use crate::dom::{Document, NodeId};
use crate::highlight::decompose::TextRun;
use crate::highlight::paint::wrap_run;
use crate::highlight::region::{ID_ATTR, Paint, is_region, new_id, region_config};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Neighbors {
    Previous,
    Both,
}

/// Flatten every produced region that has another region among its
/// ancestors, fork the ids that became discontiguous, and join produced
/// regions with their same-id neighbors.
pub(crate) fn resolve(doc: &mut Document, produced: &[NodeId]) {
    let mut split_ids: Vec<String> = Vec::new();
    for &node in produced {
        let Some(outer) = doc
            .parent(node)
            .and_then(|parent| doc.closest(parent, is_region))
        else {
            continue;
        };
        if let Some(id) = extract_overlapped(doc, outer)
            && !split_ids.contains(&id)
        {
            split_ids.push(id);
        }
    }

    for id in &split_ids {
        fork_discontiguous(doc, id);
    }

    for &node in produced {
        if doc.is_attached(node) {
            merge_adjacent_by_id(doc, node, Neighbors::Both);
        }
    }
}

/// Hoist every child of the region `outer` in front of it and remove it.
///
/// Text that belonged to the outer region, including text under plain
/// inline elements between it and a nested region, is re-wrapped with the
/// outer region's identity so the surrounding highlight survives. Returns
/// the outer id, or `None` when `outer` is not a region.
pub(crate) fn extract_overlapped(doc: &mut Document, outer: NodeId) -> Option<String> {
    let config = region_config(doc, outer)?;
    let paint = Paint::from(&config);

    let owned: Vec<NodeId> = doc
        .descendants(outer)
        .filter(|&n| doc.is_text(n) && owner(doc, n) == Some(outer))
        .collect();
    for text in owned {
        let run = TextRun {
            node: text,
            start: 0,
            end: doc.text_len(text),
        };
        if wrap_run(doc, run, &paint).is_none() {
            doc.detach(text);
        }
    }

    let mut last = None;
    while let Some(child) = doc.first_child(outer) {
        doc.insert_before(outer, child);
        merge_adjacent_by_id(doc, child, Neighbors::Previous);
        last = Some(child);
    }

    doc.detach(outer);
    if let Some(last) = last {
        merge_adjacent_by_id(doc, last, Neighbors::Both);
    }
    Some(config.id)
}

/// Nearest id-carrying element (region or eraser sentinel) above a text leaf
fn owner(doc: &Document, text: NodeId) -> Option<NodeId> {
    doc.parent(text)
        .and_then(|parent| doc.closest(parent, |doc, n| doc.has_attribute(n, ID_ATTR)))
}

/// Absorb same-id sibling regions into `node`.
///
/// The previous sibling is always considered; the next one only with
/// [`Neighbors::Both`]. Text inside `node` and around it is coalesced
/// afterwards.
pub(crate) fn merge_adjacent_by_id(doc: &mut Document, node: NodeId, neighbors: Neighbors) {
    if !is_region(doc, node) {
        return;
    }
    let Some(id) = doc.attribute(node, ID_ATTR).map(str::to_string) else {
        return;
    };
    let same_id = |doc: &Document, n: NodeId| {
        is_region(doc, n) && doc.attribute(n, ID_ATTR) == Some(id.as_str())
    };

    if neighbors == Neighbors::Both
        && let Some(next) = doc.next_sibling(node)
        && same_id(doc, next)
    {
        while let Some(child) = doc.first_child(next) {
            doc.append_child(node, child);
        }
        doc.detach(next);
    }

    if let Some(prev) = doc.previous_sibling(node)
        && same_id(doc, prev)
    {
        while let Some(child) = doc.last_child(prev) {
            doc.prepend_child(node, child);
        }
        doc.detach(prev);
    }

    doc.coalesce_text(node);
    if let Some(parent) = doc.parent(node) {
        doc.coalesce_text(parent);
    }
}

/// Keep every logical highlight contiguous in document order.
///
/// Walks the id-carrying elements (regions and eraser sentinels). If an
/// element with another id interrupts the run of `id`, every later region
/// carrying `id` gets a fresh id, and the fresh id is checked in turn.
pub(crate) fn fork_discontiguous(doc: &mut Document, id: &str) {
    let mut id = id.to_string();
    loop {
        let tagged: Vec<NodeId> = doc
            .descendants(doc.root())
            .filter(|&n| doc.has_attribute(n, ID_ATTR))
            .collect();
        let carries = |n: NodeId| doc.attribute(n, ID_ATTR) == Some(id.as_str());

        let Some(first) = tagged.iter().position(|&n| carries(n)) else {
            return;
        };
        let Some(gap) = tagged[first..]
            .iter()
            .position(|&n| !carries(n))
            .map(|offset| first + offset)
        else {
            return;
        };
        let tail: Vec<NodeId> = tagged[gap..]
            .iter()
            .copied()
            .filter(|&n| carries(n) && is_region(doc, n))
            .collect();
        if tail.is_empty() {
            return;
        }

        let fresh = new_id();
        log::debug!("Forking highlight {id} into {fresh}");
        for node in tail {
            doc.set_attribute(node, ID_ATTR, fresh.clone());
        }
        id = fresh;
    }
}
