//! Reads SVG markup into a [`ShapeElement`] tree.

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use crate::element::ShapeElement;
use crate::error::{Result, StippleError};
use crate::style;

fn xml_error(message: impl Into<String>) -> StippleError {
    let message: String = message.into();
    StippleError::Xml(message.into())
}

fn element_from(e: &BytesStart<'_>, reader: &Reader<&[u8]>) -> Result<ShapeElement> {
    let tag = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
    let mut element = ShapeElement::new(tag);
    for attr in e.attributes() {
        let attr = attr.map_err(|err| StippleError::Xml(Box::new(err)))?;
        let name = String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned();
        let value = attr
            .decode_and_unescape_value(reader.decoder())
            .map_err(|err| StippleError::Xml(Box::new(err)))?;
        element.attributes.push((name, value.into_owned()));
    }
    Ok(element)
}

/// Parses `markup` and returns its root element. Text and comments are dropped.
pub fn parse(markup: &str) -> Result<ShapeElement> {
    let mut reader = Reader::from_str(markup);
    reader.config_mut().trim_text(true);

    let mut open: Vec<ShapeElement> = Vec::new();
    let mut root = None;
    let mut buf = Vec::new();

    loop {
        let finished = match reader.read_event_into(&mut buf)? {
            Event::Start(ref e) => {
                open.push(element_from(e, &reader)?);
                None
            }
            Event::Empty(ref e) => Some(element_from(e, &reader)?),
            Event::End(_) => Some(
                open.pop()
                    .ok_or_else(|| xml_error("closing tag without an open element"))?,
            ),
            Event::Eof => break,
            _ => None,
        };

        if let Some(element) = finished {
            match open.last_mut() {
                Some(parent) => parent.children.push(element),
                None if root.is_none() => root = Some(element),
                None => return Err(xml_error("more than one root element")),
            }
        }
        buf.clear();
    }

    if let Some(unclosed) = open.last() {
        return Err(xml_error(format!("<{}> is never closed", unclosed.tag)));
    }
    root.ok_or_else(|| xml_error("document has no root element"))
}

/// Pixel size of the drawing: `viewBox` origin plus extent when present,
/// otherwise `width` and `height`.
pub fn canvas_size(root: &ShapeElement) -> Option<(f64, f64)> {
    if let Some(view_box) = root.attribute("viewBox") {
        let numbers = view_box
            .split(|c: char| c == ',' || c.is_ascii_whitespace())
            .filter(|s| !s.is_empty())
            .map(|s| s.parse::<f64>().ok())
            .collect::<Option<Vec<_>>>();
        if let Some([min_x, min_y, width, height]) = numbers.as_deref() {
            return Some((min_x + width, min_y + height));
        }
    }

    let width = style::parse_length(root.attribute("width")?)?;
    let height = style::parse_length(root.attribute("height")?)?;
    Some((width, height))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::recording::{DrawOp, RecordingCanvas};

    const TRIANGLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<!-- a comment -->
<svg xmlns="http://www.w3.org/2000/svg" width="2in" height="200">
  <g stroke="blue" style="stroke-width: 2">
    <rect width="10" height="5"/>
    <path d="M150 0 L75 200 L225 200 Z" fill="none"></path>
  </g>
  <text x="1">ignored &amp; dropped</text>
</svg>"#;

    #[test]
    fn builds_the_tree() {
        let root = parse(TRIANGLE).unwrap();
        assert_eq!(root.tag, "svg");
        assert_eq!(root.children.len(), 2);

        let group = &root.children[0];
        assert_eq!(group.tag, "g");
        assert_eq!(
            group.attributes,
            vec![
                ("stroke".to_string(), "blue".to_string()),
                ("style".to_string(), "stroke-width: 2".to_string()),
            ]
        );
        assert_eq!(group.children[0].tag, "rect");
        assert_eq!(group.children[1].attribute("d"), Some("M150 0 L75 200 L225 200 Z"));
        assert!(root.children[1].children.is_empty());
    }

    #[test]
    fn unescapes_attribute_values() {
        let root = parse(r#"<svg><rect id="a&amp;b"/></svg>"#).unwrap();
        assert_eq!(root.children[0].attribute("id"), Some("a&b"));
    }

    #[test]
    fn rejects_broken_markup() {
        assert!(matches!(parse("<svg><g></svg>"), Err(StippleError::Xml(_))));
        assert!(matches!(parse("<svg>"), Err(StippleError::Xml(_))));
        assert!(matches!(parse(""), Err(StippleError::Xml(_))));
        assert!(matches!(parse("<a/><b/>"), Err(StippleError::Xml(_))));
    }

    #[test]
    fn sizes_from_view_box_or_dimensions() {
        let root = parse(TRIANGLE).unwrap();
        assert_eq!(canvas_size(&root), Some((192.0, 200.0)));

        let root = parse(r#"<svg width="10" height="10" viewBox="5 10 100 50"/>"#).unwrap();
        assert_eq!(canvas_size(&root), Some((105.0, 60.0)));

        let root = parse("<svg/>").unwrap();
        assert_eq!(canvas_size(&root), None);
    }

    #[test]
    fn parsed_document_renders() {
        let root = parse(TRIANGLE).unwrap();
        let mut canvas = RecordingCanvas::new();
        crate::render(&root, &mut canvas).unwrap();

        let ops = canvas.into_ops();
        assert_eq!(ops.len(), 2);
        assert!(matches!(ops[0], DrawOp::StrokeRect { .. }));
        match &ops[1] {
            DrawOp::StrokePolygon { points, stroke } => {
                assert_eq!(points.len(), 3);
                assert_eq!(stroke.color, "blue");
                assert_eq!(stroke.width, 2.0);
            }
            op => panic!("unexpected op {:?}", op),
        }
    }
}
