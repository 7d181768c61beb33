//! # Highlight engine
//!
//! [`Highlighter`] owns a [`Document`] and the active [`Selection`] and keeps
//! the document's highlight regions flat: a region never contains another
//! region, touching regions of one highlight are merged, and every logical
//! highlight stays contiguous in document order.
//!
//! Painting a selection runs three passes:
//!
//! 1. **Decompose** the selection into text runs confined to single
//!    highlightable leaves, adopting touching same-style regions.
//! 2. **Paint** each run by surrounding it with a region element.
//! 3. **Resolve** overlaps by hoisting regions painted inside other regions,
//!    forking ids that became discontiguous and merging same-id neighbors.
//!
//! Regions can be projected to [`Source`] records, saved to a [`Store`] and
//! painted back after the document is rebuilt.

pub mod codec;
mod decompose;
pub mod events;
mod overlap;
mod paint;
pub mod region;

use std::fmt;

use text_highlighter_config::{Config, ConfigError, Settings};

use crate::dom::{Document, NodeId, Selector};
use crate::selection::Selection;
use crate::store::{FileStore, MemoryStore, Store, StoreError};

pub use codec::{Collect, ParentAddress, Source, collect_key};
pub use decompose::is_highlightable;
pub use events::{ConfigAttribute, HighlighterEvent};
pub use region::{
    COLOR_ATTR, HIGHLIGHTABLE_ATTR, ID_ATTR, RegionConfig, UNHIGHLIGHTABLE_ATTR, UnknownWrapper,
    Wrapper, is_region, region_config, tag_to_wrapper, wrapper_to_tag,
};

use region::{Brush, ERASER_COLOR, Paint, new_id};

/// Store key holding the JSON list of saved sources
pub const STORE_KEY: &str = "highlight-sources";

#[derive(Debug, thiserror::Error)]
pub enum HighlightError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
    #[error("Failed to serialize sources: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Wrapper(#[from] UnknownWrapper),
}

/// Per-call overrides for [`Highlighter::highlight`].
///
/// Unset fields fall back to the highlighter's configured color and wrapper;
/// a missing id is generated.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HighlightOptions {
    pub id: Option<String>,
    pub color: Option<String>,
    pub wrapper: Option<Wrapper>,
    /// Text under an element matching any of these is never highlighted
    pub ignore_selectors: Vec<Selector>,
}

impl HighlightOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    pub fn with_wrapper(mut self, wrapper: Wrapper) -> Self {
        self.wrapper = Some(wrapper);
        self
    }

    pub fn with_ignore_selectors(mut self, selectors: impl IntoIterator<Item = Selector>) -> Self {
        self.ignore_selectors.extend(selectors);
        self
    }
}

type Listener = Box<dyn FnMut(&HighlighterEvent)>;

pub struct Highlighter<S: Store = MemoryStore> {
    document: Document,
    selection: Selection,
    store: S,
    auto_highlight: bool,
    auto_save: bool,
    auto_load: bool,
    color: Option<String>,
    wrapper: Wrapper,
    listeners: Vec<Listener>,
}

impl<S: Store + fmt::Debug> fmt::Debug for Highlighter<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Highlighter")
            .field("document", &self.document)
            .field("selection", &self.selection)
            .field("store", &self.store)
            .field("auto_highlight", &self.auto_highlight)
            .field("auto_save", &self.auto_save)
            .field("auto_load", &self.auto_load)
            .field("color", &self.color)
            .field("wrapper", &self.wrapper)
            .finish_non_exhaustive()
    }
}

impl<S: Store> Highlighter<S> {
    /// A highlighter with every flag off, no color and the `mark` wrapper
    pub fn new(document: Document, store: S) -> Self {
        Self {
            document,
            selection: Selection::default(),
            store,
            auto_highlight: false,
            auto_save: false,
            auto_load: false,
            color: None,
            wrapper: Wrapper::default(),
            listeners: Vec::new(),
        }
    }

    pub fn from_settings(
        document: Document,
        store: S,
        settings: &Settings,
    ) -> Result<Self, HighlightError> {
        let wrapper = match settings.wrapper.as_deref() {
            Some(name) => name.parse()?,
            None => Wrapper::default(),
        };
        let mut highlighter = Self::new(document, store);
        highlighter.auto_highlight = settings.auto_highlight;
        highlighter.auto_save = settings.auto_save;
        highlighter.auto_load = settings.auto_load;
        highlighter.color = settings.color.clone().filter(|color| !color.is_empty());
        highlighter.wrapper = wrapper;
        Ok(highlighter)
    }

    pub fn from_config(
        document: Document,
        store: S,
        config: &Config,
    ) -> Result<Self, HighlightError> {
        Self::from_settings(document, store, &config.settings()?)
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.document
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn selection_mut(&mut self) -> &mut Selection {
        &mut self.selection
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    /// Register a listener for every [`HighlighterEvent`]
    pub fn subscribe(&mut self, listener: impl FnMut(&HighlighterEvent) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    fn emit(&mut self, event: HighlighterEvent) {
        for listener in &mut self.listeners {
            listener(&event);
        }
    }

    // ---- configuration ----

    pub fn auto_highlight(&self) -> bool {
        self.auto_highlight
    }

    pub fn set_auto_highlight(&mut self, value: bool) {
        log::info!("Changing {} to {value}", ConfigAttribute::AutoHighlight);
        self.auto_highlight = value;
        self.emit(HighlighterEvent::ConfigChanged(ConfigAttribute::AutoHighlight));
    }

    pub fn auto_save(&self) -> bool {
        self.auto_save
    }

    pub fn set_auto_save(&mut self, value: bool) {
        log::info!("Changing {} to {value}", ConfigAttribute::AutoSave);
        self.auto_save = value;
        self.emit(HighlighterEvent::ConfigChanged(ConfigAttribute::AutoSave));
    }

    pub fn auto_load(&self) -> bool {
        self.auto_load
    }

    pub fn set_auto_load(&mut self, value: bool) {
        log::info!("Changing {} to {value}", ConfigAttribute::AutoLoad);
        self.auto_load = value;
        self.emit(HighlighterEvent::ConfigChanged(ConfigAttribute::AutoLoad));
    }

    pub fn color(&self) -> Option<&str> {
        self.color.as_deref()
    }

    pub fn set_color(&mut self, value: Option<String>) {
        log::info!("Changing {} to {value:?}", ConfigAttribute::Color);
        self.color = value;
        self.emit(HighlighterEvent::ConfigChanged(ConfigAttribute::Color));
    }

    pub fn wrapper(&self) -> Wrapper {
        self.wrapper
    }

    pub fn set_wrapper(&mut self, value: Wrapper) {
        log::info!("Changing {} to {value}", ConfigAttribute::Wrapper);
        self.wrapper = value;
        self.emit(HighlighterEvent::ConfigChanged(ConfigAttribute::Wrapper));
    }

    /// Restore the default wrapper and color. Regions are left untouched.
    pub fn reset(&mut self) {
        log::info!("Resetting configuration");
        self.set_color(None);
        self.set_wrapper(Wrapper::default());
    }

    // ---- host hooks ----

    /// Call once the highlighter is attached to its host
    pub fn connect(&mut self) -> Result<(), HighlightError> {
        if self.auto_load {
            self.load()?;
        }
        Ok(())
    }

    /// Call when the pointer is released or a touch ends
    pub fn pointer_released(&mut self) -> bool {
        self.highlight(None)
    }

    // ---- painting ----

    /// Highlight the current selection.
    ///
    /// Without options this only acts when auto-highlight is on. Returns
    /// whether any highlightable text was selected; if so the selection is
    /// cleared afterwards.
    pub fn highlight(&mut self, options: Option<HighlightOptions>) -> bool {
        if options.is_none() && !self.auto_highlight {
            return false;
        }
        if self.selection.is_collapsed() {
            return false;
        }
        log::info!("Highlighting");

        let options = options.unwrap_or_default();
        let paint = Paint {
            id: options.id.unwrap_or_else(new_id),
            brush: Brush::Wrapper(options.wrapper.unwrap_or(self.wrapper)),
            color: options.color.or_else(|| self.color.clone()),
        };

        let highlighted = self.paint_selection(&paint, &options.ignore_selectors);
        if highlighted {
            self.selection.remove_all_ranges();
            self.save_if_enabled();
            self.emit(HighlighterEvent::HighlightChanged);
        }
        highlighted
    }

    fn paint_selection(&mut self, paint: &Paint, ignore: &[Selector]) -> bool {
        let decomposition =
            decompose::decompose(&mut self.document, &self.selection, paint, ignore);
        let produced = paint::paint_runs(&mut self.document, &decomposition.runs, paint);
        overlap::resolve(&mut self.document, &produced);
        decomposition.highlighted
    }

    /// Every live region in document order
    pub fn regions(&self) -> Vec<NodeId> {
        region::regions(&self.document)
    }

    pub fn sources(&self) -> Vec<Source> {
        self.regions()
            .into_iter()
            .filter_map(|node| codec::encode(&self.document, node))
            .collect()
    }

    pub fn collect(&self) -> Collect {
        let sources = self.sources();
        log::info!("Collecting {} sources", sources.len());
        codec::collect(sources)
    }

    /// Paint saved sources back, in order. Sources whose address no longer
    /// resolves are skipped. Returns how many were painted.
    pub fn restore(&mut self, sources: &[Source]) -> usize {
        log::info!("Restoring {} sources", sources.len());
        let mut restored = 0;
        for source in sources {
            match codec::decode(&mut self.document, source) {
                Some(_) => restored += 1,
                None => log::warn!(
                    "Skipping source {} at <{}> #{}: target not found",
                    source.config.id,
                    source.parent_address.tag,
                    source.parent_address.ordinal
                ),
            }
        }

        if !sources.is_empty() {
            self.selection.remove_all_ranges();
        }
        self.emit(HighlighterEvent::HighlightChanged);
        restored
    }

    // ---- removal ----

    /// Unwrap every element carrying `id`. Returns whether anything was removed.
    pub fn remove_by_id(&mut self, id: &str) -> bool {
        log::info!("Removing highlight: {id}");
        let removed = self.unwrap_id(id) > 0;
        self.save_if_enabled();
        if removed {
            self.emit(HighlighterEvent::HighlightChanged);
        }
        removed
    }

    fn unwrap_id(&mut self, id: &str) -> usize {
        let nodes = self.document.elements_with_attribute(region::ID_ATTR, id);
        for &node in &nodes {
            self.document.unwrap(node);
        }
        nodes.len()
    }

    /// Remove highlights: all of them when nothing is selected, otherwise
    /// only the selected parts.
    pub fn clear(&mut self) {
        log::info!("Clearing highlights");
        if self.selection.is_collapsed() {
            for node in self.regions() {
                self.document.unwrap(node);
            }
        } else {
            let eraser = Paint {
                id: new_id(),
                brush: Brush::Eraser,
                color: Some(ERASER_COLOR.to_string()),
            };
            if self.paint_selection(&eraser, &[]) {
                self.selection.remove_all_ranges();
            }
            self.unwrap_id(&eraser.id);
        }

        self.save_if_enabled();
        self.emit(HighlighterEvent::HighlightChanged);
    }

    // ---- persistence ----

    pub fn save(&mut self) -> Result<(), HighlightError> {
        log::info!("Saving sources to storage");
        let data = serde_json::to_string(&self.sources())?;
        self.store.set(STORE_KEY, data)?;
        Ok(())
    }

    /// Restore the sources saved in the store.
    ///
    /// A payload that fails to parse is logged and ignored.
    pub fn load(&mut self) -> Result<(), HighlightError> {
        log::info!("Loading sources from storage");
        let Some(data) = self.store.get(STORE_KEY)?.filter(|data| !data.is_empty()) else {
            return Ok(());
        };
        match serde_json::from_str::<Vec<Source>>(&data) {
            Ok(sources) => {
                self.restore(&sources);
            }
            Err(e) => log::warn!("Error loading sources: {e}"),
        }
        Ok(())
    }

    fn save_if_enabled(&mut self) {
        if self.auto_save
            && let Err(e) = self.save()
        {
            log::error!("Auto-save failed: {e}");
        }
    }
}

impl Highlighter<FileStore> {
    /// A highlighter saving into the store file the settings name
    pub fn with_file_store(document: Document, settings: &Settings) -> Result<Self, HighlightError> {
        let store = FileStore::new(settings.store_file());
        log::info!("Using highlight store {}", store.path().display());
        Self::from_settings(document, store, settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selection::{Boundary, Range};
    use crate::tests::text_node;
    use pretty_assertions::assert_eq;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn highlighter(markup: &str) -> Highlighter {
        Highlighter::new(Document::from_markup(markup).unwrap(), MemoryStore::new())
    }

    fn select(h: &mut Highlighter, needle: &str, start: usize, end: usize) {
        let leaf = text_node(h.document(), needle);
        h.selection_mut().select(Range::within(leaf, start, end));
    }

    fn recorded(h: &mut Highlighter) -> Rc<RefCell<Vec<HighlighterEvent>>> {
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&events);
        h.subscribe(move |event| sink.borrow_mut().push(*event));
        events
    }

    #[test]
    fn test_highlight_without_options_needs_auto_highlight() {
        let mut h = highlighter("<p data-highlightable>abc</p>");
        select(&mut h, "abc", 0, 2);

        assert!(!h.highlight(None));
        assert!(h.regions().is_empty());

        h.set_auto_highlight(true);
        assert!(h.pointer_released());
        assert_eq!(h.regions().len(), 1);
        assert!(h.selection().is_collapsed());
    }

    #[test]
    fn test_collapsed_selection_is_a_no_op() {
        let mut h = highlighter("<p data-highlightable>abc</p>");
        let events = recorded(&mut h);
        select(&mut h, "abc", 1, 1);

        assert!(!h.highlight(Some(HighlightOptions::new())));
        assert!(events.borrow().is_empty());
    }

    #[test]
    fn test_highlight_uses_configured_style_and_options() {
        let mut h = highlighter("<p data-highlightable>one two</p>");
        h.set_wrapper(Wrapper::Underline);
        h.set_color(Some("blue".to_string()));
        select(&mut h, "one", 0, 3);

        h.highlight(Some(HighlightOptions::new().with_id("first")));
        select(&mut h, "two", 1, 4);
        h.highlight(Some(
            HighlightOptions::new()
                .with_id("second")
                .with_wrapper(Wrapper::Strike)
                .with_color("red"),
        ));

        assert_eq!(
            h.document().to_markup(),
            r#"<p data-highlightable><u data-text-highlighter="first" data-color="blue">one</u> <s data-text-highlighter="second" data-color="red">two</s></p>"#
        );
    }

    #[test]
    fn test_unhighlightable_selection_keeps_selection() {
        let mut h = highlighter("<p>abc</p>");
        select(&mut h, "abc", 0, 3);

        assert!(!h.highlight(Some(HighlightOptions::new())));
        assert!(!h.selection().is_collapsed());
    }

    #[test]
    fn test_events_are_emitted() {
        let mut h = highlighter("<p data-highlightable>abc</p>");
        let events = recorded(&mut h);
        select(&mut h, "abc", 0, 1);

        h.highlight(Some(HighlightOptions::new().with_id("a")));
        h.set_auto_save(true);
        h.remove_by_id("missing");
        h.remove_by_id("a");
        h.reset();

        assert_eq!(
            *events.borrow(),
            vec![
                HighlighterEvent::HighlightChanged,
                HighlighterEvent::ConfigChanged(ConfigAttribute::AutoSave),
                HighlighterEvent::HighlightChanged,
                HighlighterEvent::ConfigChanged(ConfigAttribute::Color),
                HighlighterEvent::ConfigChanged(ConfigAttribute::Wrapper),
            ]
        );
    }

    #[test]
    fn test_clear_without_selection_removes_everything() {
        let mut h = highlighter(
            r#"<p data-highlightable><mark data-text-highlighter="a">one</mark> <u data-text-highlighter="b">two</u></p>"#,
        );

        h.clear();

        assert_eq!(h.document().to_markup(), "<p data-highlightable>one two</p>");
    }

    #[test]
    fn test_reset_keeps_regions() {
        let markup = r#"<p data-highlightable><s data-text-highlighter="a" data-color="red">x</s></p>"#;
        let mut h = highlighter(markup);
        h.set_wrapper(Wrapper::Strike);
        h.set_color(Some("red".to_string()));

        h.reset();

        assert_eq!(h.wrapper(), Wrapper::Mark);
        assert_eq!(h.color(), None);
        assert_eq!(h.document().to_markup(), markup);
    }

    #[test]
    fn test_from_settings() {
        let settings = Settings {
            auto_highlight: true,
            auto_save: true,
            auto_load: false,
            color: Some("green".to_string()),
            wrapper: Some("underline".to_string()),
            store_path: None,
        };

        let h = Highlighter::from_settings(Document::new(), MemoryStore::new(), &settings).unwrap();

        assert!(h.auto_highlight());
        assert!(h.auto_save());
        assert!(!h.auto_load());
        assert_eq!(h.color(), Some("green"));
        assert_eq!(h.wrapper(), Wrapper::Underline);
    }

    #[test]
    fn test_from_settings_rejects_unknown_wrapper() {
        let settings = Settings {
            wrapper: Some("bold".to_string()),
            ..Settings::default()
        };

        let err = Highlighter::from_settings(Document::new(), MemoryStore::new(), &settings)
            .unwrap_err();

        assert!(matches!(err, HighlightError::Wrapper(_)));
    }

    #[test]
    fn test_from_config_rejects_invalid_boolean() {
        let config = Config {
            autosave: Some("yes".to_string()),
            ..Config::default()
        };

        let err =
            Highlighter::from_config(Document::new(), MemoryStore::new(), &config).unwrap_err();

        assert!(matches!(err, HighlightError::Config(ConfigError::InvalidBoolean { .. })));
    }

    #[test]
    fn test_connect_loads_only_with_auto_load() {
        let mut store = MemoryStore::new();
        store
            .set(
                STORE_KEY,
                r#"[{"text":"b","config":{"id":"a","wrapper":"mark","color":null},"parentAddress":{"tag":"p","ordinal":0},"childIndex":0,"charOffset":1}]"#.to_string(),
            )
            .unwrap();
        let doc = Document::from_markup("<p data-highlightable>abc</p>").unwrap();
        let mut h = Highlighter::new(doc, store);

        h.connect().unwrap();
        assert!(h.regions().is_empty());

        h.set_auto_load(true);
        h.connect().unwrap();
        assert_eq!(
            h.document().to_markup(),
            r#"<p data-highlightable>a<mark data-text-highlighter="a">b</mark>c</p>"#
        );
    }

    #[test]
    fn test_selection_spanning_elements() {
        let mut h = highlighter("<div data-highlightable><p>one</p><p>two</p></div>");
        let first = text_node(h.document(), "one");
        let last = text_node(h.document(), "two");
        h.selection_mut()
            .select(Range::new(Boundary::new(first, 1), Boundary::new(last, 2)));

        h.highlight(Some(HighlightOptions::new().with_id("x")));

        assert_eq!(
            h.document().to_markup(),
            r#"<div data-highlightable><p>o<mark data-text-highlighter="x">ne</mark></p><p><mark data-text-highlighter="x">tw</mark>o</p></div>"#
        );
        assert_eq!(h.collect()["mark"]["x"].len(), 2);
    }
}
