//! Journal XML document writer.

use std::fs;
use std::io::Write;
use std::path::Path;

use journal_model::CanonicalRecord;
use quick_xml::Writer;
use quick_xml::escape::escape;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use tracing::{info, warn};

use crate::dom::is_xml_char;
use crate::error::{OutputError, Result};
use crate::schema::XmlSchema;

pub const XSI_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema-instance";

const ROOT_ELEMENT: &str = "Journal";
const ENTRY_ELEMENT: &str = "Entry";

/// Violations logged individually before the error is returned.
const MAX_LOGGED_VIOLATIONS: usize = 20;

/// Options for journal XML output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlOptions {
    /// Indent nested elements by two spaces.
    pub pretty_print: bool,
    /// Value for `xsi:noNamespaceSchemaLocation` on the root element.
    pub schema_location: Option<String>,
}

impl Default for XmlOptions {
    fn default() -> Self {
        Self {
            pretty_print: true,
            schema_location: None,
        }
    }
}

/// Write the journal document for `records` to `out`.
///
/// Each record becomes an `Entry` with `Date`, `Account` and `Amount`
/// children, plus `Description` when the description is not empty.
///
/// # Errors
///
/// Returns an error if writing to `out` fails.
pub fn write_journal_xml<W: Write>(
    out: &mut W,
    records: &[CanonicalRecord],
    options: &XmlOptions,
) -> Result<()> {
    if options.pretty_print {
        write_document(Writer::new_with_indent(&mut *out, b' ', 2), records, options)?;
    } else {
        write_document(Writer::new(&mut *out), records, options)?;
    }
    out.write_all(b"\n")?;
    Ok(())
}

/// Render the journal document into memory.
///
/// # Errors
///
/// Returns an error only if XML serialization fails.
pub fn render_journal_xml(records: &[CanonicalRecord], options: &XmlOptions) -> Result<Vec<u8>> {
    let mut document = Vec::new();
    write_journal_xml(&mut document, records, options)?;
    Ok(document)
}

/// Render, optionally validate, then write the journal document to `path`.
///
/// Validation happens in memory, so a document that fails the schema never
/// reaches the disk. Missing parent directories are created.
///
/// # Errors
///
/// Returns [`OutputError::Validation`] when the document does not match
/// `schema`, and [`OutputError::Write`] when the file cannot be written.
pub fn write_journal_file(
    path: &Path,
    records: &[CanonicalRecord],
    options: &XmlOptions,
    schema: Option<&XmlSchema>,
) -> Result<()> {
    let document = render_journal_xml(records, options)?;

    if let Some(schema) = schema {
        let violations = schema.validate(&document);
        if !violations.is_empty() {
            for violation in violations.iter().take(MAX_LOGGED_VIOLATIONS) {
                warn!(path = %violation.path, "{}", violation.message);
            }
            return Err(OutputError::Validation(violations));
        }
        info!("XML document matches schema");
    }

    ensure_parent_dir(path)?;
    fs::write(path, &document).map_err(|source| OutputError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    info!(
        path = %path.display(),
        entries = records.len(),
        bytes = document.len(),
        "wrote journal XML"
    );
    Ok(())
}

fn write_document<W: Write>(
    mut xml: Writer<W>,
    records: &[CanonicalRecord],
    options: &XmlOptions,
) -> Result<()> {
    xml.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

    let mut root = BytesStart::new(ROOT_ELEMENT);
    if let Some(location) = &options.schema_location {
        root.push_attribute(("xmlns:xsi", XSI_NAMESPACE));
        root.push_attribute(("xsi:noNamespaceSchemaLocation", location.as_str()));
    }
    if records.is_empty() {
        xml.write_event(Event::Empty(root))?;
        return Ok(());
    }
    xml.write_event(Event::Start(root))?;

    for record in records {
        xml.write_event(Event::Start(BytesStart::new(ENTRY_ELEMENT)))?;
        write_text_element(&mut xml, "Date", record.date())?;
        write_text_element(&mut xml, "Account", record.account())?;
        write_text_element(&mut xml, "Amount", record.amount())?;
        if record.has_description() {
            write_text_element(&mut xml, "Description", record.description())?;
        }
        xml.write_event(Event::End(BytesEnd::new(ENTRY_ELEMENT)))?;
    }

    xml.write_event(Event::End(BytesEnd::new(ROOT_ELEMENT)))?;
    Ok(())
}

/// Carriage returns are written as `&#13;` so parsers do not fold them into newlines.
fn write_text_element<W: Write>(xml: &mut Writer<W>, name: &str, text: &str) -> Result<()> {
    if let Some(character) = text.chars().find(|&c| !is_xml_char(c)) {
        return Err(OutputError::IllegalChar {
            element: name.to_string(),
            character,
        });
    }
    let escaped = escape(text).replace('\r', "&#13;");
    xml.write_event(Event::Start(BytesStart::new(name)))?;
    xml.write_event(Event::Text(BytesText::from_escaped(escaped)))?;
    xml.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}

fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(|source| OutputError::Write {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(description: &str) -> CanonicalRecord {
        CanonicalRecord::new(
            "2024-01-01".to_string(),
            "101".to_string(),
            "100.50".to_string(),
            description.to_string(),
        )
        .unwrap()
    }

    fn render(records: &[CanonicalRecord], options: &XmlOptions) -> String {
        String::from_utf8(render_journal_xml(records, options).unwrap()).unwrap()
    }

    #[test]
    fn test_pretty_document() {
        let xml = render(&[record("Opening balance")], &XmlOptions::default());
        let expected = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
<Journal>\n  <Entry>\n    <Date>2024-01-01</Date>\n    <Account>101</Account>\n    \
<Amount>100.50</Amount>\n    <Description>Opening balance</Description>\n  </Entry>\n</Journal>\n";
        assert_eq!(xml, expected);
    }

    #[test]
    fn test_compact_document_omits_empty_description() {
        let options = XmlOptions {
            pretty_print: false,
            schema_location: None,
        };
        let xml = render(&[record("")], &options);
        assert_eq!(
            xml,
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?><Journal><Entry><Date>2024-01-01</Date>\
<Account>101</Account><Amount>100.50</Amount></Entry></Journal>\n"
        );
    }

    #[test]
    fn test_schema_location_attributes() {
        let options = XmlOptions {
            pretty_print: false,
            schema_location: Some("schema.xsd".to_string()),
        };
        let xml = render(&[], &options);
        assert!(xml.contains(
            r#"<Journal xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" xsi:noNamespaceSchemaLocation="schema.xsd"/>"#
        ));
    }

    #[test]
    fn test_carriage_return_survives_parsing() {
        let xml = render(&[record("a\rb")], &XmlOptions::default());
        assert!(xml.contains("<Description>a&#13;b</Description>"));
        let root = crate::dom::parse(xml.as_bytes()).unwrap();
        assert_eq!(root.children[0].children[3].text, "a\rb");
    }

    #[test]
    fn test_illegal_character_is_an_error() {
        let error = render_journal_xml(&[record("a\u{1}b")], &XmlOptions::default()).unwrap_err();
        assert!(matches!(
            error,
            OutputError::IllegalChar { ref element, character: '\u{1}' } if element == "Description"
        ));
    }

    #[test]
    fn test_text_is_escaped() {
        let xml = render(&[record("Fees & <charges>")], &XmlOptions::default());
        assert!(xml.contains("<Description>Fees &amp; &lt;charges&gt;</Description>"));
    }
}
