//! Selection decomposition.
//!
//! Turns every non-collapsed range of a selection into text runs, each
//! confined to a single highlightable text leaf.

use crate::dom::{Document, Namespace, NodeId, Selector};
use crate::highlight::paint::pre_merge;
use crate::highlight::region::{HIGHLIGHTABLE_ATTR, Paint, UNHIGHLIGHTABLE_ATTR};
use crate::selection::{Range, Selection};

/// A char span `[start, end)` of one text leaf
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct TextRun {
    pub node: NodeId,
    pub start: usize,
    pub end: usize,
}

#[derive(Debug, Default)]
pub(crate) struct Decomposition {
    pub runs: Vec<TextRun>,
    /// Whether any highlightable leaf was touched
    pub highlighted: bool,
}

impl Decomposition {
    fn push(&mut self, node: NodeId, start: usize, end: usize) {
        if start < end {
            self.runs.push(TextRun { node, start, end });
        }
    }
}

pub(crate) fn decompose(
    doc: &mut Document,
    selection: &Selection,
    paint: &Paint,
    ignore: &[Selector],
) -> Decomposition {
    let mut out = Decomposition::default();

    for range in selection.ranges().iter().filter(|r| !r.collapsed()) {
        let start = range.start.node;
        let end = effective_end(doc, range);
        pre_merge(doc, start, paint);

        if doc.is_text(start) && end == Some(start) {
            if is_highlightable(doc, start, ignore) {
                out.highlighted = true;
                out.push(start, range.start.offset, range.end.offset);
            }
            continue;
        }

        if let Some(end) = end {
            pre_merge(doc, end, paint);
        }

        let mut current = if doc.is_text(start) {
            Some(start)
        } else if doc.namespace(start) == Some(Namespace::Html) {
            doc.child_at(start, range.start.offset)
                .and_then(|child| doc.first_text_descendant(child))
        } else {
            next_text_node(doc, start, end)
        };

        while let Some(node) = current {
            if Some(node) == end {
                break;
            }
            if doc.is_text(node) && is_highlightable(doc, node, ignore) {
                out.highlighted = true;
                let from = if node == start { range.start.offset } else { 0 };
                out.push(node, from, doc.text_len(node));
            }
            current = next_text_node(doc, node, end);
        }

        if let Some(end) = end
            && doc.is_text(end)
            && is_highlightable(doc, end, ignore)
        {
            out.highlighted = true;
            out.push(end, 0, range.end.offset);
        }
    }

    out
}

/// The node the forward walk stops at.
///
/// A range ending at an element boundary of its own common ancestor ends at
/// the child at that offset; past the last child it ends at whatever follows
/// the ancestor.
fn effective_end(doc: &Document, range: &Range) -> Option<NodeId> {
    let end = range.end.node;
    let common = range.common_ancestor(doc);
    if doc.is_text(end) || Some(end) != common {
        return Some(end);
    }
    doc.child_at(end, range.end.offset)
        .or_else(|| doc.next_node(end))
}

/// Next text leaf after `from` in document order, never reaching `end`.
///
/// Rendered HTML elements are descended into (except `from` itself); SVG
/// subtrees and hidden elements are stepped over. Whitespace-only leaves
/// containing a line break separate blocks and are skipped.
pub(crate) fn next_text_node(
    doc: &Document,
    from: NodeId,
    end: Option<NodeId>,
) -> Option<NodeId> {
    let mut node = from;
    loop {
        if Some(node) == end || node == doc.root() {
            return None;
        }

        let next = match doc.namespace(node) {
            Some(Namespace::Svg) => doc.next_node(node),
            Some(Namespace::Html) => {
                let skip = doc.next_node(node);
                if node != from && doc.is_rendered(node) {
                    doc.first_child(node).or(skip)
                } else {
                    skip
                }
            }
            None => {
                let text = doc.text(node).unwrap_or_default();
                let blank = text.trim().is_empty();
                if node != from && !(blank && text.contains('\n')) {
                    return Some(node);
                }
                doc.next_node(node)
            }
        };

        match next {
            Some(next) if Some(next) != end => node = next,
            _ => return None,
        }
    }
}

/// Whether a text leaf may be highlighted.
///
/// The leaf needs a `data-highlightable` ancestor and no
/// `data-unhighlightable` one, unless the highlightable marker sits strictly
/// inside the unhighlightable one. Any ancestor matching an ignore selector
/// rules the leaf out.
pub fn is_highlightable(doc: &Document, node: NodeId, ignore: &[Selector]) -> bool {
    let element = if doc.is_element(node) {
        Some(node)
    } else {
        doc.parent(node)
    };
    let Some(element) = element else {
        return false;
    };
    if doc.namespace(element) != Some(Namespace::Html) {
        return false;
    }

    if ignore
        .iter()
        .any(|selector| doc.closest(element, |d, n| selector.matches(d, n)).is_some())
    {
        return false;
    }

    let unhighlightable = doc.closest(element, |d, n| d.has_attribute(n, UNHIGHLIGHTABLE_ATTR));
    let highlightable = doc.closest(element, |d, n| d.has_attribute(n, HIGHLIGHTABLE_ATTR));
    match (unhighlightable, highlightable) {
        (Some(outer), Some(inner)) => outer != inner && doc.contains(outer, inner),
        (None, Some(_)) => true,
        _ => false,
    }
}
