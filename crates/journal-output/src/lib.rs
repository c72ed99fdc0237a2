//! Journal output generation.
//!
//! - **xml**: serializes canonical records into the `Journal` document
//! - **schema**: loads an XML Schema subset and validates documents against it

mod dom;
pub mod error;
pub mod schema;
pub mod xml;

pub use error::{OutputError, ParseError, SchemaError};
pub use schema::{Violation, XmlSchema};
pub use xml::{
    XSI_NAMESPACE, XmlOptions, render_journal_xml, write_journal_file, write_journal_xml,
};
