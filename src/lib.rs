//! JSON:API params
//!
//! Turns inbound JSON:API documents into flat attribute maps while recording,
//! for every emitted key, the JSON Pointer of the member it came from. When
//! validation later fails, field errors are reconciled back to those
//! pointers so each error object carries an accurate `source.pointer`,
//! including for bulk documents.
//!
//! # Example
//!
//! ```
//! use jsonapi_params::{
//!     error_document, reconcile, Config, DocumentCoordinator, ErrorsInput, FieldErrors,
//!     FieldMapping, RequestScope,
//! };
//! use serde_json::json;
//!
//! let config = Config::new();
//! let coordinator = DocumentCoordinator::new("user", FieldMapping::new());
//!
//! let document = json!({
//!     "data": { "type": "users", "attributes": { "name": "" } }
//! });
//! let mut scope = RequestScope::new(Some("application/vnd.api+json"));
//! coordinator.deserialize_into(&mut scope, Some(&document), &config).unwrap();
//!
//! assert_eq!(scope.param("user").unwrap(), &json!({ "type": "users", "name": "" }));
//!
//! let errors = ErrorsInput::from(FieldErrors::new().with("name", "Name can't be blank"));
//! let bulk = scope.extension_request("bulk", &config);
//! let triples = reconcile(&errors, scope.jsonapi_pointers(), bulk).unwrap();
//!
//! assert_eq!(
//!     error_document(&triples)["errors"][0]["source"]["pointer"],
//!     json!("/data/attributes/name")
//! );
//! ```
//!
//! # Bulk documents
//!
//! When the client sends `Content-Type: application/vnd.api+json; ext="bulk"`
//! and the deployment supports `bulk`, `data` must be an array. Resource `i`
//! is deserialized with pointers rooted at `/data/{i}`, and error collection
//! `i` is reconciled against those pointers.
//!
//! | Condition | Outcome |
//! |-----------|---------|
//! | resource without `type` | `DocumentError::MalformedResource` |
//! | no payload | no-op, warning logged |
//! | single mode, `data` is an array | `DocumentError::MalformedDocument` |
//! | bulk mode, `data` is not an array | `DocumentError::MalformedDocument` |
//! | bulk error/pointer count mismatch | `ReconcileError::Alignment` |
//! | error for an unmapped field | error object without `source` |

mod config;
mod coordinator;
mod deserializer;
mod error;
mod extensions;
mod loader;
mod mapping;
mod observability;
mod pointer;
mod reconcile;
mod types;

pub use config::{Config, EXTENSIONS_ENV};
pub use coordinator::{
    deserialize_document, negotiate_mode, DeserializedDocument, DocumentCoordinator,
    RequestScope,
};
pub use deserializer::{deserialize, validate_resource};
pub use error::{DocumentError, ReconcileError};
pub use extensions::{
    active_extensions, is_extension_active, negotiate_response_extensions, parse_requested,
    response_content_type, ExtensionSet,
};
pub use loader::{load_document, load_document_str, load_mapping};
pub use mapping::{
    FieldKind, FieldMapping, KeyFormat, MappingSpec, ResolvedRule, TargetKeys, Transform,
};
pub use observability::{init_tracing, LogFormat, LOG_FORMAT_ENV};
pub use pointer::PointerPath;
pub use reconcile::{
    error_document, error_objects, reconcile, ErrorObject, ErrorSource, ErrorTriple, ErrorsInput,
    FieldErrors,
};
pub use types::{
    json_type_name, DeserializedResource, FlatParams, Mode, Params, Pointers, ReverseMapping,
    BULK_EXTENSION, MEDIA_TYPE,
};
