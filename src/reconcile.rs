//! Reconciling field errors with the pointers recorded at deserialization.
//!
//! Validation frameworks report errors per field. The reverse mapping built
//! while deserializing tells us which member of the submitted document each
//! field came from, so each error can carry a `source.pointer`.

use serde::Serialize;
use serde_json::{json, Value};

use crate::error::ReconcileError;
use crate::pointer::PointerPath;
use crate::types::{json_type_name, Pointers, ReverseMapping};

/// Field errors for one resource, in the order they were reported.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors {
    entries: Vec<(String, Vec<String>)>,
}

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a message for `field`. Messages for the same field are grouped
    /// under the field's first occurrence.
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        let field = field.into();
        let message = message.into();
        match self.entries.iter_mut().find(|(f, _)| *f == field) {
            Some((_, messages)) => messages.push(message),
            None => self.entries.push((field, vec![message])),
        }
    }

    pub fn with(mut self, field: impl Into<String>, message: impl Into<String>) -> Self {
        self.add(field, message);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `(field, message)` pairs in report order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().flat_map(|(field, messages)| {
            messages.iter().map(move |m| (field.as_str(), m.as_str()))
        })
    }

    /// Parse `{ "field": "message" | ["message", ...] }`.
    ///
    /// # Errors
    ///
    /// Returns `ReconcileError::InvalidErrors` for any other shape.
    pub fn from_value(value: &Value) -> Result<Self, ReconcileError> {
        let Value::Object(map) = value else {
            return Err(ReconcileError::InvalidErrors {
                message: format!("expected object, got {}", json_type_name(value)),
            });
        };

        let mut errors = FieldErrors::new();
        for (field, messages) in map {
            match messages {
                Value::String(message) => errors.add(field.as_str(), message.as_str()),
                Value::Array(list) => {
                    for message in list {
                        let Some(message) = message.as_str() else {
                            return Err(ReconcileError::InvalidErrors {
                                message: format!(
                                    "messages for \"{}\" must be strings, got {}",
                                    field,
                                    json_type_name(message)
                                ),
                            });
                        };
                        errors.add(field.as_str(), message);
                    }
                }
                other => {
                    return Err(ReconcileError::InvalidErrors {
                        message: format!(
                            "messages for \"{}\" must be a string or array, got {}",
                            field,
                            json_type_name(other)
                        ),
                    })
                }
            }
        }
        Ok(errors)
    }
}

/// One field-error collection, or one per submitted resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorsInput {
    Single(FieldErrors),
    Bulk(Vec<FieldErrors>),
}

impl ErrorsInput {
    /// Parse an object (single) or an array of objects (bulk).
    ///
    /// # Errors
    ///
    /// Returns `ReconcileError::InvalidErrors` if any collection is malformed.
    pub fn from_value(value: &Value) -> Result<Self, ReconcileError> {
        match value {
            Value::Array(list) => list
                .iter()
                .map(FieldErrors::from_value)
                .collect::<Result<Vec<_>, _>>()
                .map(ErrorsInput::Bulk),
            other => FieldErrors::from_value(other).map(ErrorsInput::Single),
        }
    }

    fn collections(&self) -> &[FieldErrors] {
        match self {
            ErrorsInput::Single(errors) => std::slice::from_ref(errors),
            ErrorsInput::Bulk(list) => list,
        }
    }
}

impl From<FieldErrors> for ErrorsInput {
    fn from(errors: FieldErrors) -> Self {
        ErrorsInput::Single(errors)
    }
}

impl From<Vec<FieldErrors>> for ErrorsInput {
    fn from(list: Vec<FieldErrors>) -> Self {
        ErrorsInput::Bulk(list)
    }
}

/// A field error attributed to a document location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorTriple {
    pub field: String,
    pub message: String,
    pub pointer: Option<PointerPath>,
}

impl ErrorTriple {
    pub fn title(&self) -> String {
        format!("Invalid {}", self.field)
    }

    pub fn to_error_object(&self) -> ErrorObject {
        ErrorObject {
            detail: self.message.clone(),
            title: self.title(),
            source: self.pointer.clone().map(|pointer| ErrorSource { pointer }),
        }
    }
}

/// A JSON:API error object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorObject {
    pub detail: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<ErrorSource>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorSource {
    pub pointer: PointerPath,
}

/// Attribute each reported error to the pointer it was deserialized from.
///
/// With `bulk_active`, collection `i` is reconciled against `pointers[i]`
/// and both lists must have the same length; empty collections contribute
/// nothing. Otherwise every collection is reconciled against the single
/// reverse mapping. Without recorded pointers all triples have no pointer.
/// Output follows resource order, then report order.
///
/// # Errors
///
/// Returns `ReconcileError::Alignment` if bulk lengths differ, or
/// `ReconcileError::ShapeMismatch` if the recorded pointers don't match the
/// mode. No partial output is produced.
pub fn reconcile(
    errors: &ErrorsInput,
    pointers: Option<&Pointers>,
    bulk_active: bool,
) -> Result<Vec<ErrorTriple>, ReconcileError> {
    let collections = errors.collections();

    match (bulk_active, pointers) {
        (_, None) => Ok(collections
            .iter()
            .flat_map(|errors| attribute(errors, None))
            .collect()),
        (false, Some(Pointers::Single(mapping))) => Ok(collections
            .iter()
            .flat_map(|errors| attribute(errors, Some(mapping)))
            .collect()),
        (true, Some(Pointers::Bulk(mappings))) => {
            if mappings.len() != collections.len() {
                return Err(ReconcileError::Alignment {
                    errors: collections.len(),
                    pointers: mappings.len(),
                });
            }
            Ok(collections
                .iter()
                .zip(mappings)
                .flat_map(|(errors, mapping)| attribute(errors, Some(mapping)))
                .collect())
        }
        (bulk_active, Some(_)) => Err(ReconcileError::ShapeMismatch { bulk_active }),
    }
}

fn attribute<'a>(
    errors: &'a FieldErrors,
    mapping: Option<&'a ReverseMapping>,
) -> impl Iterator<Item = ErrorTriple> + 'a {
    errors.iter().map(move |(field, message)| ErrorTriple {
        field: field.to_string(),
        message: message.to_string(),
        pointer: mapping.and_then(|m| m.get(field)).cloned(),
    })
}

/// Render triples as JSON:API error objects.
pub fn error_objects(triples: &[ErrorTriple]) -> Vec<ErrorObject> {
    triples.iter().map(ErrorTriple::to_error_object).collect()
}

/// Render triples as a complete JSON:API error document.
pub fn error_document(triples: &[ErrorTriple]) -> Value {
    json!({
        "errors": error_objects(triples),
        "jsonapi": { "version": "1.0" }
    })
}
