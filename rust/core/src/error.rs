// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for document parsing and parameter injection.

use thiserror::Error;

/// Result type alias for StudioX core operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while loading, querying or mutating documents.
#[derive(Error, Debug)]
pub enum Error {
    /// The uploaded document contains no root element.
    #[error("Invalid XML document: root element is missing")]
    MissingRootElement,

    /// The uploaded document is not well-formed XML.
    #[error("Invalid XML document at byte {position}: {message}")]
    InvalidXml { position: usize, message: String },

    /// A path expression could not be parsed.
    #[error("Invalid path expression '{expr}': {message}")]
    InvalidPath { expr: String, message: String },

    /// A path expression uses a prefix with no namespace binding.
    #[error("Unbound namespace prefix '{0}'")]
    UnboundPrefix(String),

    /// The field catalog is inconsistent.
    #[error("Invalid field catalog: {0}")]
    InvalidCatalog(String),

    /// Serializing the document failed.
    #[error("XML serialization failed: {0}")]
    Serialize(String),

    /// Reading a catalog file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Catalog JSON could not be decoded.
    #[error("Catalog JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn invalid_path(expr: &str, message: impl Into<String>) -> Self {
        Error::InvalidPath {
            expr: expr.to_string(),
            message: message.into(),
        }
    }

    /// True for errors caused by the caller's document rather than the server.
    pub fn is_caller_error(&self) -> bool {
        matches!(self, Error::MissingRootElement | Error::InvalidXml { .. })
    }
}
