//! Attribute and inline-style resolution.
//!
//! Raw element attributes are turned into [`StyleAttributes`]: property names
//! are lower-cased, `style="a: b; c: d"` declarations are split out, and
//! values that look like lengths become device-pixel numbers.

use std::collections::BTreeMap;

/// Attribute name to raw string value, as read from markup.
pub type RawAttributes = BTreeMap<String, String>;

/// Resolved value of a single property.
#[derive(Clone, Debug, PartialEq)]
pub enum StyleValue {
    /// A measurement already converted to device pixels.
    Number(f64),
    /// Anything that is not a measurement: colour names, hex colours, keywords, point lists.
    Text(String),
}

impl StyleValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            StyleValue::Number(n) => Some(*n),
            StyleValue::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            StyleValue::Number(_) => None,
            StyleValue::Text(s) => Some(s),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, StyleValue::Text(s) if s.is_empty())
    }

    /// String form that coerces back to the same value.
    pub fn to_raw(&self) -> String {
        match self {
            StyleValue::Number(n) => n.to_string(),
            StyleValue::Text(s) => s.clone(),
        }
    }
}

/// Which paint an opacity lookup is for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Channel {
    Fill,
    Stroke,
}

impl Channel {
    fn opacity_key(self) -> &'static str {
        match self {
            Channel::Fill => "fill-opacity",
            Channel::Stroke => "stroke-opacity",
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct StyleAttributes {
    values: BTreeMap<String, StyleValue>,
}

impl StyleAttributes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&StyleValue> {
        self.values.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: StyleValue) {
        self.values.insert(key.into(), value);
    }

    /// Present and not an empty string.
    pub fn is_set(&self, key: &str) -> bool {
        self.get(key).is_some_and(|v| !v.is_empty())
    }

    pub fn number(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(StyleValue::as_number)
    }

    pub fn text(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(StyleValue::as_text)
    }

    /// A usable paint colour for `key`. Empty values and `none` yield nothing.
    pub fn paint(&self, key: &str) -> Option<&str> {
        self.text(key)
            .filter(|c| !c.is_empty() && !c.eq_ignore_ascii_case("none"))
    }

    pub fn opacity(&self, channel: Channel) -> Option<f64> {
        get_opacity(self, channel)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &StyleValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Back to raw strings; `resolve(&attrs.to_raw_map()) == attrs`.
    pub fn to_raw_map(&self) -> RawAttributes {
        self.values
            .iter()
            .map(|(k, v)| (k.clone(), v.to_raw()))
            .collect()
    }
}

/// Resolves raw attributes, including any inline `style`, into typed values.
pub fn resolve(raw: &RawAttributes) -> StyleAttributes {
    let mut resolved = StyleAttributes::new();
    for (key, value) in expand_style(raw) {
        resolved.insert(key, coerce(&value));
    }
    resolved
}

/// Lower-cases attribute names and replaces `style` with its individual
/// declarations. Declarations override plain attributes of the same name and
/// later declarations override earlier ones. Fragments without a colon or
/// without a name are dropped.
pub fn expand_style(raw: &RawAttributes) -> RawAttributes {
    let mut plain = RawAttributes::new();
    let mut declarations = Vec::new();

    for (key, value) in raw {
        let key = key.trim().to_ascii_lowercase();
        if key == "style" {
            declarations.push(value.as_str());
        } else {
            plain.insert(key, value.clone());
        }
    }

    for style in declarations {
        for fragment in style.split(';') {
            let Some((name, value)) = fragment.split_once(':') else {
                continue;
            };
            let name = name.trim().to_ascii_lowercase();
            if name.is_empty() {
                continue;
            }
            plain.insert(name, value.trim().to_string());
        }
    }

    plain
}

/// Fills in keys the child does not define (or defines as empty) from the
/// inherited map. Neither input is modified.
pub fn inherit(own: &RawAttributes, inherited: &RawAttributes) -> RawAttributes {
    let mut merged = own.clone();
    for (key, value) in inherited {
        let missing = merged.get(key).is_none_or(|v| v.trim().is_empty());
        if missing && !value.trim().is_empty() {
            merged.insert(key.clone(), value.clone());
        }
    }
    merged
}

/// Numeric strings become numbers, `<number><unit>` strings become device
/// pixels, everything else is kept as trimmed text.
pub fn coerce(value: &str) -> StyleValue {
    let value = value.trim();
    match parse_length(value) {
        Some(n) => StyleValue::Number(n),
        None => StyleValue::Text(value.to_string()),
    }
}

/// Parses a plain number or a number with an absolute unit suffix into device pixels.
pub fn parse_length(value: &str) -> Option<f64> {
    let value = value.trim();
    if let Some(n) = parse_number(value) {
        return Some(n);
    }

    let split = value.len().checked_sub(2)?;
    if !value.is_char_boundary(split) {
        return None;
    }
    let (magnitude, unit) = value.split_at(split);
    if magnitude.is_empty() || !magnitude.chars().all(|c| c.is_ascii_digit() || c == '.') {
        return None;
    }
    let magnitude: f64 = magnitude.parse().ok()?;
    let scale = match unit {
        "px" => 1.0,
        "cm" => 37.795276,
        "mm" => 3.7795276,
        "in" => 96.0,
        "pt" => 1.333,
        "pc" => 12.0,
        _ => return None,
    };
    Some(magnitude * scale)
}

/// Strict decimal number: sign, digits, decimal point and exponent only.
fn parse_number(value: &str) -> Option<f64> {
    let plausible = value.chars().any(|c| c.is_ascii_digit())
        && value
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | '.' | 'e' | 'E'));
    if !plausible {
        return None;
    }
    value.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Opacity for a paint channel: the channel-specific property wins over the
/// generic `opacity`; `None` means unset (fully opaque), never zero.
pub fn get_opacity(attributes: &StyleAttributes, channel: Channel) -> Option<f64> {
    [channel.opacity_key(), "opacity"]
        .into_iter()
        .find_map(|key| attributes.number(key))
        .map(|o| o.clamp(0.0, 1.0))
}
