//! Region identity: wrappers, attribute names and region queries.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::dom::{Document, NodeId};

/// Attribute carrying a region's highlight id
pub const ID_ATTR: &str = "data-text-highlighter";
/// Attribute carrying a region's color tag
pub const COLOR_ATTR: &str = "data-color";
/// Marks a subtree whose text may be highlighted
pub const HIGHLIGHTABLE_ATTR: &str = "data-highlightable";
/// Marks a subtree whose text may not be highlighted
pub const UNHIGHLIGHTABLE_ATTR: &str = "data-unhighlightable";

/// Tag used by the eraser sentinel
pub(crate) const ERASER_TAG: &str = "span";
pub(crate) const ERASER_COLOR: &str = "text-highlight-to-remove";

/// How a highlight is rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Wrapper {
    #[default]
    Mark,
    Strike,
    Underline,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown wrapper {0:?}, expected mark, strike or underline")]
pub struct UnknownWrapper(pub String);

impl Wrapper {
    pub const ALL: [Wrapper; 3] = [Wrapper::Mark, Wrapper::Strike, Wrapper::Underline];

    pub fn as_str(self) -> &'static str {
        match self {
            Wrapper::Mark => "mark",
            Wrapper::Strike => "strike",
            Wrapper::Underline => "underline",
        }
    }

    pub fn tag(self) -> &'static str {
        match self {
            Wrapper::Mark => "mark",
            Wrapper::Strike => "s",
            Wrapper::Underline => "u",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|wrapper| wrapper.tag().eq_ignore_ascii_case(tag))
    }
}

impl FromStr for Wrapper {
    type Err = UnknownWrapper;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|wrapper| wrapper.as_str() == name)
            .ok_or_else(|| UnknownWrapper(name.to_string()))
    }
}

impl fmt::Display for Wrapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub fn wrapper_to_tag(wrapper: Wrapper) -> &'static str {
    wrapper.tag()
}

pub fn tag_to_wrapper(tag: &str) -> Option<Wrapper> {
    Wrapper::from_tag(tag)
}

/// Identity stamped on every region of a logical highlight
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RegionConfig {
    pub id: String,
    pub wrapper: Wrapper,
    pub color: Option<String>,
}

/// What a paint pass stamps: a real wrapper or the disposable eraser
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Brush {
    Wrapper(Wrapper),
    Eraser,
}

impl Brush {
    pub(crate) fn tag(self) -> &'static str {
        match self {
            Brush::Wrapper(wrapper) => wrapper.tag(),
            Brush::Eraser => ERASER_TAG,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Paint {
    pub id: String,
    pub brush: Brush,
    pub color: Option<String>,
}

impl From<&RegionConfig> for Paint {
    fn from(config: &RegionConfig) -> Self {
        Self {
            id: config.id.clone(),
            brush: Brush::Wrapper(config.wrapper),
            color: config.color.clone(),
        }
    }
}

pub(crate) fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// A region is a wrapper-tagged element carrying a highlight id
pub fn is_region(doc: &Document, node: NodeId) -> bool {
    doc.tag(node).is_some_and(|tag| Wrapper::from_tag(tag).is_some())
        && doc.has_attribute(node, ID_ATTR)
}

pub fn region_config(doc: &Document, node: NodeId) -> Option<RegionConfig> {
    if !is_region(doc, node) {
        return None;
    }
    Some(RegionConfig {
        id: doc.attribute(node, ID_ATTR)?.to_string(),
        wrapper: Wrapper::from_tag(doc.tag(node)?)?,
        color: doc.attribute(node, COLOR_ATTR).map(str::to_string),
    })
}

/// Every attached region in document order
pub fn regions(doc: &Document) -> Vec<NodeId> {
    doc.descendants(doc.root())
        .filter(|&node| is_region(doc, node))
        .collect()
}
