//! Error types for document deserialization and error reconciliation.

use std::path::PathBuf;
use thiserror::Error;

use crate::pointer::PointerPath;

/// Errors while loading or deserializing an inbound JSON:API document.
#[derive(Debug, Error)]
pub enum DocumentError {
    // IO errors (exit code 3)
    #[error("file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("cannot read {path}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // Parse errors (exit code 2)
    #[error("invalid JSON: {source}")]
    InvalidJson {
        #[source]
        source: serde_json::Error,
    },

    /// Top-level shape does not match the negotiated single/bulk mode.
    /// `pointer` is empty when the document root itself is at fault.
    #[error("malformed document: {message}")]
    MalformedDocument { pointer: String, message: String },

    /// A resource object is missing required members or has the wrong shape.
    #[error("malformed resource at {pointer}: {message}")]
    MalformedResource {
        pointer: PointerPath,
        message: String,
    },

    #[error("invalid field mapping: {message}")]
    InvalidMapping { message: String },
}

impl DocumentError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            DocumentError::FileNotFound { .. } | DocumentError::ReadError { .. } => 3,
            _ => 2,
        }
    }

    pub(crate) fn malformed_resource(pointer: &PointerPath, message: impl Into<String>) -> Self {
        DocumentError::MalformedResource {
            pointer: pointer.clone(),
            message: message.into(),
        }
    }
}

/// Errors while reconciling field errors against recorded pointers.
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// Bulk error collections and reverse mappings differ in length.
    #[error("cannot align {errors} error collection(s) with {pointers} submitted resource(s)")]
    Alignment { errors: usize, pointers: usize },

    /// Recorded pointer state does not match the negotiated mode.
    #[error("{}", shape_mismatch_message(.bulk_active))]
    ShapeMismatch { bulk_active: bool },

    #[error("invalid error collection: {message}")]
    InvalidErrors { message: String },
}

fn shape_mismatch_message(bulk_active: &bool) -> &'static str {
    if *bulk_active {
        "bulk extension is active but pointers were recorded for a single resource"
    } else {
        "pointers were recorded for a bulk document but the bulk extension is not active"
    }
}

impl ReconcileError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            ReconcileError::InvalidErrors { .. } => 2,
            _ => 1,
        }
    }
}
