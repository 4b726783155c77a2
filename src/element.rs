//! The element tree handed to the renderer by a markup reader.

use crate::style::RawAttributes;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ShapeElement {
    pub tag: String,
    /// Attribute name/value pairs in document order.
    pub attributes: Vec<(String, String)>,
    pub children: Vec<ShapeElement>,
}

impl ShapeElement {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Self::default()
        }
    }

    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((name.into(), value.into()));
        self
    }

    pub fn child(mut self, child: ShapeElement) -> Self {
        self.children.push(child);
        self
    }

    /// Raw value of the first attribute called `name` (ASCII case-insensitive).
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Attributes as a map keyed by lower-cased name. Where a name repeats,
    /// the later value wins.
    pub fn raw_attributes(&self) -> RawAttributes {
        self.attributes
            .iter()
            .map(|(k, v)| (k.to_ascii_lowercase(), v.clone()))
            .collect()
    }
}
