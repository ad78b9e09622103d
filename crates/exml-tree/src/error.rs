//! Error types for tag-tree parsing.

use crate::position::Location;
use thiserror::Error;

/// Result type alias for exml-tree operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building a tag tree.
///
/// In lenient mode these are collected on the root's `errors` list instead of
/// being returned. `location` is `None` when the parse was asked to omit
/// positions from its errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// XML syntax error reported by the tokenizer.
    #[error("XML syntax error: {message}{}", at(.location))]
    XmlSyntax {
        message: String,
        location: Option<Location>,
    },

    /// A start tag was still open when the input ended.
    #[error("Unclosed tag <{name}>{}", at(.location))]
    UnclosedTag {
        name: String,
        location: Option<Location>,
    },

    /// A second top-level element was found.
    #[error("Invalid XML: multiple root elements{}", at(.location))]
    MultipleRoots { location: Option<Location> },

    /// Non-whitespace text before or after the root element.
    #[error("Text data outside of root node{}", at(.location))]
    TextOutsideRoot { location: Option<Location> },

    /// Empty document (no root element).
    #[error("Empty XML document: no root element found")]
    EmptyDocument,

    /// A tree mutation addressed a tag that does not exist.
    #[error("No tag at location {location:?}")]
    MissingNode { location: Vec<usize> },
}

fn at(location: &Option<Location>) -> String {
    location
        .as_ref()
        .map(|loc| format!(" at {}", loc))
        .unwrap_or_default()
}

impl Error {
    /// Source position of the error, if it was recorded.
    pub fn location(&self) -> Option<&Location> {
        match self {
            Error::XmlSyntax { location, .. }
            | Error::UnclosedTag { location, .. }
            | Error::MultipleRoots { location }
            | Error::TextOutsideRoot { location } => location.as_ref(),
            Error::EmptyDocument | Error::MissingNode { .. } => None,
        }
    }
}

impl From<quick_xml::Error> for Error {
    fn from(err: quick_xml::Error) -> Self {
        Error::XmlSyntax {
            message: err.to_string(),
            location: None,
        }
    }
}

impl From<quick_xml::events::attributes::AttrError> for Error {
    fn from(err: quick_xml::events::attributes::AttrError) -> Self {
        Error::XmlSyntax {
            message: format!("Attribute error: {}", err),
            location: None,
        }
    }
}
