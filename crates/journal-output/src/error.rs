//! Error types for XML output and schema handling.

use std::path::PathBuf;

use thiserror::Error;

use crate::schema::Violation;

/// Errors raised while reading XML text into a tree.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("XML syntax error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("invalid entity or character reference: {0}")]
    Escape(#[from] quick_xml::escape::EscapeError),

    #[error("invalid attribute: {0}")]
    Attr(#[from] quick_xml::events::attributes::AttrError),

    #[error("document is not valid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    #[error("character {0:?} is not allowed in XML")]
    IllegalChar(char),

    /// Well-formedness problems the tokenizer does not report itself.
    #[error("{0}")]
    Structure(String),
}

/// Errors raised while loading a schema document.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("failed to read schema {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("schema is not well-formed XML: {0}")]
    Parse(#[from] ParseError),

    /// The schema uses a supported construct incorrectly.
    #[error("invalid schema: {0}")]
    Invalid(String),

    /// The schema uses a construct outside the supported subset.
    #[error("unsupported schema construct: {0}")]
    Unsupported(String),

    #[error("invalid pattern facet '{pattern}': {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

/// Errors that can occur while producing the output document.
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("<{element}> text contains {character:?}, which XML cannot represent")]
    IllegalChar { element: String, character: char },

    /// The rendered document did not match the schema; nothing was written.
    #[error("XML document does not match schema: {}", summarize(.0))]
    Validation(Vec<Violation>),
}

/// Result type alias for output operations.
pub type Result<T> = std::result::Result<T, OutputError>;

fn summarize(violations: &[Violation]) -> String {
    match violations {
        [] => "no violations reported".to_string(),
        [only] => only.to_string(),
        [first, rest @ ..] => format!("{first} (and {} more)", rest.len()),
    }
}
