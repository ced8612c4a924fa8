//! Error types for the scanbind library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`ScanbindError`] is **fatal**: the run cannot proceed or its artifact
//!   cannot be produced (bad configuration, HTTP client setup, PDF
//!   serialisation, output write). Returned as `Err(ScanbindError)` from the
//!   top-level `assemble*` functions.
//!
//! * [`ItemError`] is **non-fatal**: a single identifier failed (network glitch,
//!   undecodable payload, page the builder rejected) but every other item is
//!   fine. Carried inside [`crate::output::FetchResult`] and collected into
//!   the failure manifest of [`crate::output::AssemblyReport`].

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the scanbind library.
///
/// Per-item failures use [`ItemError`] and never surface here.
#[derive(Debug, Error)]
pub enum ScanbindError {
    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Network setup ─────────────────────────────────────────────────────
    /// The HTTP client could not be constructed.
    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(String),

    // ── Output errors ─────────────────────────────────────────────────────
    /// The assembled document could not be serialised to PDF bytes.
    #[error("Failed to serialise PDF document: {0}")]
    DocumentSerialize(String),

    /// Could not create or write the output PDF file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal error for a single identifier.
///
/// The identifier is dropped from the output document; the run continues.
#[derive(Debug, Clone, PartialEq, Eq, Error, serde::Serialize, serde::Deserialize)]
pub enum ItemError {
    /// Transport failure or non-success HTTP status.
    #[error("Item {id}: download from '{url}' failed: {detail}")]
    Network { id: u32, url: String, detail: String },

    /// The payload is not a decodable image.
    #[error("Item {id}: image decode failed: {detail}")]
    Decode { id: u32, detail: String },

    /// The normalised bitmap could not be serialised for page embedding.
    #[error("Item {id}: image encode failed: {detail}")]
    Encode { id: u32, detail: String },

    /// The document builder rejected the page.
    #[error("Item {id}: page could not be added: {detail}")]
    Builder { id: u32, detail: String },
}

impl ItemError {
    /// The identifier this error belongs to.
    pub fn id(&self) -> u32 {
        match self {
            ItemError::Network { id, .. }
            | ItemError::Decode { id, .. }
            | ItemError::Encode { id, .. }
            | ItemError::Builder { id, .. } => *id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn network_error_display() {
        let e = ItemError::Network {
            id: 7,
            url: "https://example.com/7.png".into(),
            detail: "HTTP 404 Not Found".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("Item 7"), "got: {msg}");
        assert!(msg.contains("404"), "got: {msg}");
    }

    #[test]
    fn item_error_id_covers_every_variant() {
        let errors = [
            ItemError::Network {
                id: 1,
                url: String::new(),
                detail: String::new(),
            },
            ItemError::Decode {
                id: 2,
                detail: String::new(),
            },
            ItemError::Encode {
                id: 3,
                detail: String::new(),
            },
            ItemError::Builder {
                id: 4,
                detail: String::new(),
            },
        ];
        let ids: Vec<u32> = errors.iter().map(ItemError::id).collect();
        assert_eq!(ids, vec![1, 2, 3, 4]);
    }

    #[test]
    fn output_write_failed_display() {
        let e = ScanbindError::OutputWriteFailed {
            path: PathBuf::from("/nope/out.pdf"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        assert!(e.to_string().contains("/nope/out.pdf"));
    }
}
