//! Deployment configuration.
//!
//! Configuration is an explicit value passed to the coordinator and the
//! response path; nothing here is global. Sources are layered: defaults,
//! then an optional JSON file, then the `JSONAPI_EXTENSIONS` environment
//! variable.

use std::path::Path;

use serde::Deserialize;

use crate::error::DocumentError;
use crate::extensions::ExtensionSet;

/// Environment variable holding a comma-separated list of supported extensions.
pub const EXTENSIONS_ENV: &str = "JSONAPI_EXTENSIONS";

/// Process-wide settings, read-only during request handling.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Extensions this deployment recognises (e.g. `bulk`).
    #[serde(rename = "jsonapi_extensions")]
    pub supported_extensions: ExtensionSet,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the supported extensions.
    pub fn with_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.supported_extensions = extensions.into_iter().collect();
        self
    }

    /// Load configuration from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns `DocumentError::FileNotFound`, `DocumentError::ReadError`, or
    /// `DocumentError::InvalidJson` if the file can't be loaded.
    pub fn from_file(path: &Path) -> Result<Self, DocumentError> {
        let value = crate::loader::load_document(path)?;
        serde_json::from_value(value).map_err(|source| DocumentError::InvalidJson { source })
    }

    /// Override supported extensions from `JSONAPI_EXTENSIONS`, if set.
    pub fn merge_env(self) -> Self {
        match std::env::var(EXTENSIONS_ENV) {
            Ok(value) => self.merge_extensions_var(&value),
            Err(_) => self,
        }
    }

    fn merge_extensions_var(mut self, value: &str) -> Self {
        self.supported_extensions = value.parse().unwrap_or_default();
        self
    }
}
