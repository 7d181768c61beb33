//! Text highlight engine.
//!
//! Marks spans of a document with highlight regions, keeps those regions
//! flat and non-overlapping, and persists them as position-based
//! [`Source`] records that can be painted back after a reload.
//!
//! ```
//! use text_highlighter_engine::{Document, HighlightOptions, Highlighter, MemoryStore, Range};
//!
//! let doc = Document::from_markup("<p data-highlightable>Hello world</p>").unwrap();
//! let mut highlighter = Highlighter::new(doc, MemoryStore::new());
//! let text = highlighter.document().first_text_descendant(highlighter.document().root()).unwrap();
//! highlighter.selection_mut().select(Range::within(text, 6, 11));
//!
//! assert!(highlighter.highlight(Some(HighlightOptions::new().with_id("h1"))));
//! assert_eq!(
//!     highlighter.document().to_markup(),
//!     r#"<p data-highlightable>Hello <mark data-text-highlighter="h1">world</mark></p>"#
//! );
//! ```

pub mod dom;
pub mod highlight;
pub mod selection;
pub mod store;

#[cfg(test)]
pub mod tests;

// Re-export commonly used types
pub use dom::{Document, MarkupError, Namespace, NodeId, Selector, SelectorError};
pub use highlight::{
    Collect, ConfigAttribute, HighlightError, HighlightOptions, Highlighter, HighlighterEvent,
    ParentAddress, RegionConfig, STORE_KEY, Source, UnknownWrapper, Wrapper, is_highlightable,
    tag_to_wrapper, wrapper_to_tag,
};
pub use selection::{Boundary, Range, Selection};
pub use store::{FileStore, MemoryStore, Store, StoreError};
pub use text_highlighter_config::{Config, ConfigError, Settings};
