//! Loading documents and mapping specs from files and strings.

use std::path::Path;

use serde_json::Value;

use crate::error::DocumentError;
use crate::mapping::{FieldMapping, MappingSpec};

/// Load a JSON document from a file path.
///
/// # Errors
///
/// Returns `DocumentError::FileNotFound` if the file doesn't exist,
/// or `DocumentError::InvalidJson` if the file isn't valid JSON.
pub fn load_document(path: &Path) -> Result<Value, DocumentError> {
    if !path.exists() {
        return Err(DocumentError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    let content = std::fs::read_to_string(path).map_err(|source| DocumentError::ReadError {
        path: path.to_path_buf(),
        source,
    })?;

    load_document_str(&content)
}

/// Load a JSON document from a string.
///
/// # Errors
///
/// Returns `DocumentError::InvalidJson` if the string isn't valid JSON.
pub fn load_document_str(content: &str) -> Result<Value, DocumentError> {
    serde_json::from_str(content).map_err(|source| DocumentError::InvalidJson { source })
}

/// Load a declarative field mapping from a JSON file.
///
/// # Errors
///
/// Returns any loading error, `DocumentError::InvalidJson` if the file
/// doesn't describe a [`MappingSpec`], or `DocumentError::InvalidMapping`.
pub fn load_mapping(path: &Path) -> Result<FieldMapping, DocumentError> {
    let value = load_document(path)?;
    let spec: MappingSpec =
        serde_json::from_value(value).map_err(|source| DocumentError::InvalidJson { source })?;
    spec.into_mapping()
}
