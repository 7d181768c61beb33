//! Position-independent addressing of regions.
//!
//! A [`Source`] locates a region by its parent's tag and ordinal among all
//! elements with that tag, the child slot the region starts in, and a char
//! offset into that slot. Sources are encoded in document order and must be
//! decoded in the same order: each address assumes the regions before it
//! are already painted.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::dom::{Document, NodeId};
use crate::highlight::decompose::TextRun;
use crate::highlight::paint::wrap_run;
use crate::highlight::region::{Paint, RegionConfig, region_config};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParentAddress {
    pub tag: String,
    /// Index among every element with `tag`, in document order
    pub ordinal: usize,
}

/// Serializable projection of one region
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Source {
    pub text: String,
    pub config: RegionConfig,
    pub parent_address: ParentAddress,
    pub child_index: usize,
    pub char_offset: usize,
}

/// Sources grouped by style key, then by highlight id
pub type Collect = IndexMap<String, IndexMap<String, Vec<Source>>>;

pub fn encode(doc: &Document, region: NodeId) -> Option<Source> {
    let config = region_config(doc, region)?;
    let parent = doc.parent(region)?;
    let index = doc.child_index(region)?;

    // a preceding text leaf shares the slot the region was cut from
    let (child_index, char_offset) = match doc.previous_sibling(region) {
        Some(prev) if doc.is_text(prev) => (index - 1, doc.text_len(prev)),
        _ => (index, 0),
    };

    Some(Source {
        text: doc.text_content(region),
        config,
        parent_address: ParentAddress {
            tag: doc.tag(parent)?.to_string(),
            ordinal: doc.tag_ordinal(parent)?,
        },
        child_index,
        char_offset,
    })
}

/// Paint a source back into the document. Returns the new region, or
/// `None` when the address no longer resolves to enough text.
pub fn decode(doc: &mut Document, source: &Source) -> Option<NodeId> {
    let address = &source.parent_address;
    let parent = *doc.elements_by_tag(&address.tag).get(address.ordinal)?;
    let child = doc.child_at(parent, source.child_index)?;
    if !doc.is_text(child) {
        return None;
    }

    let len = source.text.chars().count();
    let end = source.char_offset + len;
    if len == 0 || doc.text_len(child) < end {
        return None;
    }

    let run = TextRun {
        node: child,
        start: source.char_offset,
        end,
    };
    wrap_run(doc, run, &Paint::from(&source.config))
}

/// `wrapper-color`, or just `wrapper` without a color
pub fn collect_key(config: &RegionConfig) -> String {
    match config.color.as_deref() {
        Some(color) if !color.is_empty() => format!("{}-{color}", config.wrapper),
        _ => config.wrapper.to_string(),
    }
}

pub fn collect(sources: impl IntoIterator<Item = Source>) -> Collect {
    let mut collected = Collect::new();
    for source in sources {
        collected
            .entry(collect_key(&source.config))
            .or_default()
            .entry(source.config.id.clone())
            .or_default()
            .push(source);
    }
    collected
}
