use std::fmt;

use text_highlighter_config as config;

/// Configurable attribute of a [`Highlighter`](super::Highlighter)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigAttribute {
    AutoHighlight,
    AutoSave,
    AutoLoad,
    Color,
    Wrapper,
}

impl ConfigAttribute {
    /// Attribute name as written in configuration files
    pub fn name(self) -> &'static str {
        match self {
            ConfigAttribute::AutoHighlight => config::AUTO_HIGHLIGHT,
            ConfigAttribute::AutoSave => config::AUTO_SAVE,
            ConfigAttribute::AutoLoad => config::AUTO_LOAD,
            ConfigAttribute::Color => config::COLOR,
            ConfigAttribute::Wrapper => config::WRAPPER,
        }
    }
}

impl fmt::Display for ConfigAttribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Notification sent to subscribers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HighlighterEvent {
    /// The set of regions changed
    HighlightChanged,
    ConfigChanged(ConfigAttribute),
}

impl fmt::Display for HighlighterEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HighlighterEvent::HighlightChanged => f.write_str("highlight"),
            HighlighterEvent::ConfigChanged(attribute) => write!(f, "change:{attribute}"),
        }
    }
}
