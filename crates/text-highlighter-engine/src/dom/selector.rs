//! Simple CSS selectors matched against single elements, used to skip
//! subtrees when highlighting.

use std::fmt;
use std::str::FromStr;

use super::{Document, NodeId};

/// A compound simple selector: `tag`, `.class`, `#id`, `[attr]` and
/// `[attr=value]` parts, all of which must match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selector {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    attributes: Vec<(String, Option<String>)>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SelectorError {
    #[error("Empty selector")]
    Empty,
    #[error("Unexpected {found:?} at position {at} in selector {selector:?}")]
    Unexpected {
        selector: String,
        found: char,
        at: usize,
    },
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_'
}

impl Selector {
    pub fn matches(&self, doc: &Document, node: NodeId) -> bool {
        let Some(element) = doc.element(node) else {
            return false;
        };
        if let Some(tag) = &self.tag
            && !element.tag.eq_ignore_ascii_case(tag)
        {
            return false;
        }
        if let Some(id) = &self.id
            && element.attribute("id") != Some(id.as_str())
        {
            return false;
        }
        if !self.classes.is_empty() {
            let classes: Vec<&str> = element
                .attribute("class")
                .unwrap_or_default()
                .split_whitespace()
                .collect();
            if !self.classes.iter().all(|c| classes.contains(&c.as_str())) {
                return false;
            }
        }
        self.attributes
            .iter()
            .all(|(name, expected)| match (element.attribute(name), expected) {
                (Some(actual), Some(expected)) => actual == expected,
                (Some(_), None) => true,
                (None, _) => false,
            })
    }
}

impl FromStr for Selector {
    type Err = SelectorError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let input = input.trim();
        if input.is_empty() {
            return Err(SelectorError::Empty);
        }

        let unexpected = |found: char, at: usize| SelectorError::Unexpected {
            selector: input.to_string(),
            found,
            at,
        };
        let ident = |from: usize| -> (String, usize) {
            let rest = &input[from..];
            let len = rest.find(|c: char| !is_ident_char(c)).unwrap_or(rest.len());
            (rest[..len].to_string(), from + len)
        };

        let mut selector = Selector::default();
        let mut pos = 0;
        while let Some(c) = input[pos..].chars().next() {
            match c {
                '*' => pos += 1,
                '.' | '#' => {
                    let (name, next) = ident(pos + 1);
                    if name.is_empty() {
                        return Err(unexpected(c, pos));
                    }
                    if c == '.' {
                        selector.classes.push(name);
                    } else {
                        selector.id = Some(name);
                    }
                    pos = next;
                }
                '[' => {
                    let close = input[pos..]
                        .find(']')
                        .map(|index| pos + index)
                        .ok_or_else(|| unexpected(c, pos))?;
                    let body = &input[pos + 1..close];
                    let (name, value) = match body.split_once('=') {
                        Some((name, value)) => {
                            let value = value.trim().trim_matches(|q: char| q == '"' || q == '\'');
                            (name.trim(), Some(value.to_string()))
                        }
                        None => (body.trim(), None),
                    };
                    if name.is_empty() || !name.chars().all(is_ident_char) {
                        return Err(unexpected(c, pos));
                    }
                    selector.attributes.push((name.to_ascii_lowercase(), value));
                    pos = close + 1;
                }
                c if is_ident_char(c) && pos == 0 => {
                    let (name, next) = ident(pos);
                    selector.tag = Some(name.to_ascii_lowercase());
                    pos = next;
                }
                other => return Err(unexpected(other, pos)),
            }
        }

        Ok(selector)
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(tag) = &self.tag {
            write!(f, "{tag}")?;
        }
        if let Some(id) = &self.id {
            write!(f, "#{id}")?;
        }
        for class in &self.classes {
            write!(f, ".{class}")?;
        }
        for (name, value) in &self.attributes {
            match value {
                Some(value) => write!(f, "[{name}=\"{value}\"]")?,
                None => write!(f, "[{name}]")?,
            }
        }
        if self.tag.is_none()
            && self.id.is_none()
            && self.classes.is_empty()
            && self.attributes.is_empty()
        {
            write!(f, "*")?;
        }
        Ok(())
    }
}
