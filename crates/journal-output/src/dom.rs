//! Minimal element tree used for schema loading and document validation.
//!
//! Only elements, attributes and character data are kept. Element names are
//! stored without their namespace prefix; attribute names keep it.

use std::str;

use quick_xml::Reader;
use quick_xml::escape::unescape;
use quick_xml::events::{BytesStart, Event};

use crate::error::ParseError;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct XmlNode {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<XmlNode>,
    /// Character data directly inside this element, concatenated.
    pub text: String,
}

impl XmlNode {
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn has_text(&self) -> bool {
        !self.text.trim().is_empty()
    }
}

/// Parse a complete document and return its root element.
pub fn parse(document: &[u8]) -> Result<XmlNode, ParseError> {
    let mut reader = Reader::from_reader(document);
    let mut buf = Vec::new();
    let mut stack: Vec<XmlNode> = Vec::new();
    let mut root: Option<XmlNode> = None;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(start) => stack.push(open_element(&start)?),
            Event::Empty(start) => {
                let node = open_element(&start)?;
                attach(&mut stack, &mut root, node)?;
            }
            Event::End(_) => {
                let node = stack
                    .pop()
                    .ok_or_else(|| ParseError::Structure("unexpected end tag".to_string()))?;
                attach(&mut stack, &mut root, node)?;
            }
            Event::Text(text) => append_text(&mut stack, str::from_utf8(&text)?)?,
            Event::CData(data) => append_text(&mut stack, str::from_utf8(&data)?)?,
            Event::GeneralRef(reference) => {
                let name = str::from_utf8(&reference)?;
                let entity = format!("&{name};");
                let resolved = unescape(&entity)?;
                append_text(&mut stack, &resolved)?;
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    if let Some(open) = stack.last() {
        return Err(ParseError::Structure(format!(
            "element <{}> is never closed",
            open.name
        )));
    }
    root.ok_or_else(|| ParseError::Structure("document has no root element".to_string()))
}

fn open_element(start: &BytesStart<'_>) -> Result<XmlNode, ParseError> {
    let name = str::from_utf8(start.local_name().as_ref())?.to_string();
    let mut attributes = Vec::new();
    for attr in start.attributes() {
        let attr = attr?;
        let key = str::from_utf8(attr.key.as_ref())?.to_string();
        let value = unescape(str::from_utf8(&attr.value)?)?.into_owned();
        check_chars(&value)?;
        attributes.push((key, value));
    }
    Ok(XmlNode {
        name,
        attributes,
        ..XmlNode::default()
    })
}

fn attach(
    stack: &mut [XmlNode],
    root: &mut Option<XmlNode>,
    node: XmlNode,
) -> Result<(), ParseError> {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(node);
        return Ok(());
    }
    if root.is_some() {
        return Err(ParseError::Structure(format!(
            "second root element <{}>",
            node.name
        )));
    }
    *root = Some(node);
    Ok(())
}

/// Whether `c` may appear in an XML 1.0 document, literally or as a reference.
pub(crate) fn is_xml_char(c: char) -> bool {
    matches!(
        c,
        '\t' | '\n' | '\r'
            | '\u{20}'..='\u{D7FF}'
            | '\u{E000}'..='\u{FFFD}'
            | '\u{10000}'..='\u{10FFFF}'
    )
}

fn check_chars(text: &str) -> Result<(), ParseError> {
    match text.chars().find(|&c| !is_xml_char(c)) {
        Some(c) => Err(ParseError::IllegalChar(c)),
        None => Ok(()),
    }
}

fn append_text(stack: &mut [XmlNode], text: &str) -> Result<(), ParseError> {
    check_chars(text)?;
    match stack.last_mut() {
        Some(node) => {
            node.text.push_str(text);
            Ok(())
        }
        None if text.trim().is_empty() => Ok(()),
        None => Err(ParseError::Structure(
            "character data outside the root element".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_illegal_characters() {
        assert!(matches!(
            parse(b"<a>x\x01y</a>"),
            Err(ParseError::IllegalChar('\u{1}'))
        ));
        assert!(matches!(
            parse(b"<a>&#1;</a>"),
            Err(ParseError::IllegalChar('\u{1}')) | Err(ParseError::Escape(_))
        ));
        assert!(matches!(
            parse(b"<a t=\"\x02\"/>"),
            Err(ParseError::IllegalChar('\u{2}'))
        ));
    }

    #[test]
    fn test_carriage_return_reference() {
        let root = parse(b"<a>x&#13;y\tz</a>").unwrap();
        assert_eq!(root.text, "x\ry\tz");
    }

    #[test]
    fn test_xml_char_ranges() {
        assert!(is_xml_char('\t'));
        assert!(is_xml_char('\u{10FFFF}'));
        assert!(!is_xml_char('\u{0}'));
        assert!(!is_xml_char('\u{1F}'));
        assert!(!is_xml_char('\u{FFFE}'));
    }

    #[test]
    fn test_builds_tree() {
        let root = parse(
            br#"<?xml version="1.0"?>
<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
  <xs:element name="Journal"/>
</xs:schema>"#,
        )
        .unwrap();
        assert_eq!(root.name, "schema");
        assert_eq!(
            root.attribute("xmlns:xs"),
            Some("http://www.w3.org/2001/XMLSchema")
        );
        assert_eq!(root.children.len(), 1);
        assert_eq!(root.children[0].name, "element");
        assert_eq!(root.children[0].attribute("name"), Some("Journal"));
        assert!(!root.has_text());
    }

    #[test]
    fn test_entities_are_resolved() {
        let root = parse(b"<a t=\"x &amp; y\">Tom &amp; Jerry &lt;3 &#65;</a>").unwrap();
        assert_eq!(root.text, "Tom & Jerry <3 A");
        assert_eq!(root.attribute("t"), Some("x & y"));
    }

    #[test]
    fn test_cdata_is_text() {
        let root = parse(b"<a><![CDATA[1 < 2]]></a>").unwrap();
        assert_eq!(root.text, "1 < 2");
    }

    #[test]
    fn test_rejects_malformed_documents() {
        assert!(parse(b"").is_err());
        assert!(parse(b"<a><b></a>").is_err());
        assert!(parse(b"<a/><b/>").is_err());
        assert!(parse(b"<a>").is_err());
        assert!(parse(b"text<a/>").is_err());
    }
}
