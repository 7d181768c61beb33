//! Reading and writing a small HTML subset.
//!
//! Markup is tokenized with `quick-xml` in its lenient HTML mode: bare and
//! unquoted attributes are accepted, end names are checked here instead of by
//! the reader, and the common void tags need no closing tag. Text and
//! attribute values are decoded with the full HTML entity table. Elements
//! inside `<svg>` are placed in the SVG namespace. The markup describes the
//! children of the document root.

use html_escape::{decode_html_entities, encode_double_quoted_attribute, encode_text};
use quick_xml::Reader;
use quick_xml::encoding::Decoder;
use quick_xml::events::{BytesStart, Event};

use super::{Document, Namespace, NodeId, NodeKind};

const VOID_TAGS: &[&str] = &[
    "area", "br", "col", "hr", "img", "input", "link", "meta", "source", "wbr",
];

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MarkupError {
    #[error("Malformed markup at byte {at}: {message}")]
    Syntax { at: usize, message: String },
    #[error("Invalid tag name at byte {0}")]
    InvalidTagName(usize),
    #[error("Invalid attribute at byte {0}")]
    InvalidAttribute(usize),
    #[error("Closing tag </{found}> at byte {at} does not match <{expected}>")]
    MismatchedTag {
        expected: String,
        found: String,
        at: usize,
    },
    #[error("Closing tag </{found}> at byte {at} has no open element")]
    UnexpectedClosingTag { found: String, at: usize },
    #[error("Element <{0}> is never closed")]
    Unclosed(String),
}

fn is_void(tag: &str) -> bool {
    VOID_TAGS.contains(&tag)
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == ':'
}

fn position(reader: &Reader<&[u8]>) -> usize {
    usize::try_from(reader.buffer_position()).unwrap_or(usize::MAX)
}

fn syntax(at: usize, err: impl std::fmt::Display) -> MarkupError {
    MarkupError::Syntax {
        at,
        message: err.to_string(),
    }
}

fn decode(decoder: Decoder, bytes: &[u8], at: usize) -> Result<String, MarkupError> {
    decoder
        .decode(bytes)
        .map(|text| text.into_owned())
        .map_err(|err| syntax(at, err))
}

fn flush_text(doc: &mut Document, parent: NodeId, text: &mut String) {
    if !text.is_empty() {
        let node = doc.create_text(std::mem::take(text));
        doc.append_child(parent, node);
    }
}

/// Create the element for a start tag and append it to `parent`
fn open_element(
    doc: &mut Document,
    parent: NodeId,
    decoder: Decoder,
    start: &BytesStart<'_>,
    at: usize,
) -> Result<(NodeId, String), MarkupError> {
    let tag = decode(decoder, start.name().as_ref(), at)?.to_ascii_lowercase();
    if tag.is_empty() || !tag.chars().all(is_name_char) {
        return Err(MarkupError::InvalidTagName(at));
    }
    let namespace = if tag == "svg" || doc.namespace(parent) == Some(Namespace::Svg) {
        Namespace::Svg
    } else {
        Namespace::Html
    };

    let element = doc.create_element_ns(&tag, namespace);
    for attr in start.html_attributes() {
        let attr = attr.map_err(|_| MarkupError::InvalidAttribute(at))?;
        let name = decode(decoder, attr.key.as_ref(), at)?.to_ascii_lowercase();
        let value = decode(decoder, &attr.value, at)?;
        doc.set_attribute(element, &name, decode_html_entities(&value).into_owned());
    }
    doc.append_child(parent, element);
    Ok((element, tag))
}

impl Document {
    /// Build a document whose root holds the given markup
    pub fn from_markup(input: &str) -> Result<Self, MarkupError> {
        let mut reader = Reader::from_str(input);
        let config = reader.config_mut();
        config.check_end_names = false;
        config.allow_unmatched_ends = true;
        let decoder = reader.decoder();

        let mut doc = Document::new();
        let mut open = vec![doc.root()];
        let mut text = String::new();

        loop {
            let at = position(&reader);
            let event = reader
                .read_event()
                .map_err(|err| syntax(position(&reader), err))?;
            let parent = open[open.len() - 1];

            match event {
                Event::Text(e) => {
                    let raw = e.decode().map_err(|err| syntax(at, err))?;
                    text.push_str(&decode_html_entities(&raw));
                }
                Event::GeneralRef(e) => {
                    let name = e.decode().map_err(|err| syntax(at, err))?;
                    text.push_str(&decode_html_entities(&format!("&{name};")));
                }
                Event::CData(e) => text.push_str(&decode(decoder, &e, at)?),
                Event::Start(e) => {
                    flush_text(&mut doc, parent, &mut text);
                    let (element, tag) = open_element(&mut doc, parent, decoder, &e, at)?;
                    if !is_void(&tag) {
                        open.push(element);
                    }
                }
                Event::Empty(e) => {
                    flush_text(&mut doc, parent, &mut text);
                    open_element(&mut doc, parent, decoder, &e, at)?;
                }
                Event::End(e) => {
                    flush_text(&mut doc, parent, &mut text);
                    let found = decode(decoder, e.name().as_ref(), at)?.to_ascii_lowercase();
                    if open.len() == 1 {
                        return Err(MarkupError::UnexpectedClosingTag { found, at });
                    }
                    let expected = doc.tag(parent).unwrap_or_default().to_string();
                    if expected != found {
                        return Err(MarkupError::MismatchedTag {
                            expected,
                            found,
                            at,
                        });
                    }
                    open.pop();
                }
                Event::Eof => {
                    flush_text(&mut doc, parent, &mut text);
                    break;
                }
                // comments, declarations and processing instructions
                _ => {}
            }
        }

        if open.len() > 1 {
            let unclosed = open[open.len() - 1];
            return Err(MarkupError::Unclosed(
                doc.tag(unclosed).unwrap_or_default().to_string(),
            ));
        }

        Ok(doc)
    }

    /// Markup of the root's children
    pub fn to_markup(&self) -> String {
        self.inner_markup(self.root())
    }

    /// Markup of a node's children
    pub fn inner_markup(&self, node: NodeId) -> String {
        let mut out = String::new();
        for child in self.children(node) {
            self.write_markup(&mut out, child);
        }
        out
    }

    /// Markup of a node including its own tag
    pub fn outer_markup(&self, node: NodeId) -> String {
        let mut out = String::new();
        self.write_markup(&mut out, node);
        out
    }

    fn write_markup(&self, out: &mut String, node: NodeId) {
        enum Step {
            Open(NodeId),
            Close(NodeId),
        }

        let mut stack = vec![Step::Open(node)];
        while let Some(step) = stack.pop() {
            match step {
                Step::Open(n) => match self.kind(n) {
                    NodeKind::Text(text) => out.push_str(&encode_text(text)),
                    NodeKind::Element(element) => {
                        out.push('<');
                        out.push_str(&element.tag);
                        for (name, value) in &element.attributes {
                            out.push(' ');
                            out.push_str(name);
                            if !value.is_empty() {
                                out.push_str("=\"");
                                out.push_str(&encode_double_quoted_attribute(value));
                                out.push('"');
                            }
                        }
                        out.push('>');
                        if is_void(&element.tag) {
                            continue;
                        }
                        stack.push(Step::Close(n));
                        let children: Vec<NodeId> = self.children(n).collect();
                        stack.extend(children.into_iter().rev().map(Step::Open));
                    }
                },
                Step::Close(n) => {
                    out.push_str("</");
                    out.push_str(self.tag(n).unwrap_or_default());
                    out.push('>');
                }
            }
        }
    }
}
