//! Document-level deserialization: single vs bulk, aggregation into
//! request-scoped state.

use serde_json::{Map, Value};

use crate::config::Config;
use crate::deserializer::deserialize;
use crate::error::DocumentError;
use crate::extensions::{active_extensions, is_extension_active, parse_requested, ExtensionSet};
use crate::mapping::FieldMapping;
use crate::pointer::PointerPath;
use crate::types::{json_type_name, Mode, Params, Pointers, BULK_EXTENSION};

/// Output of deserializing a whole document.
#[derive(Debug, Clone, PartialEq)]
pub struct DeserializedDocument {
    pub mode: Mode,
    pub params: Params,
    pub pointers: Pointers,
}

/// Pick single or bulk parsing for a request.
///
/// Requested extensions the deployment doesn't support are logged at debug
/// level and otherwise ignored.
pub fn negotiate_mode(requested: &ExtensionSet, supported: &ExtensionSet) -> Mode {
    if active_extensions(requested, supported).contains(BULK_EXTENSION) {
        Mode::Bulk
    } else {
        Mode::Single
    }
}

/// Deserialize a document's primary data in the given mode.
///
/// Returns `Ok(None)` when there is no payload: no document at all, or a
/// document without a top-level `data` member.
///
/// # Errors
///
/// Returns `DocumentError::MalformedDocument` if the top-level shape doesn't
/// match `mode`, or `DocumentError::MalformedResource` for the first
/// resource that fails validation.
pub fn deserialize_document(
    document: Option<&Value>,
    mapping: &FieldMapping,
    mode: Mode,
) -> Result<Option<DeserializedDocument>, DocumentError> {
    let Some(document) = document else {
        return Ok(None);
    };
    let Value::Object(root) = document else {
        return Err(DocumentError::MalformedDocument {
            pointer: String::new(),
            message: format!("document must be an object, got {}", json_type_name(document)),
        });
    };
    let Some(data) = root.get("data") else {
        return Ok(None);
    };

    let deserialized = match mode {
        Mode::Single => parse_single(data, mapping)?,
        Mode::Bulk => parse_bulk(data, mapping)?,
    };
    Ok(Some(deserialized))
}

fn parse_single(data: &Value, mapping: &FieldMapping) -> Result<DeserializedDocument, DocumentError> {
    if !data.is_object() {
        return Err(DocumentError::MalformedDocument {
            pointer: PointerPath::root().to_string(),
            message: format!(
                "primary data must be a resource object, got {}",
                json_type_name(data)
            ),
        });
    }

    let resource = deserialize(data, mapping, &PointerPath::root())?;
    Ok(DeserializedDocument {
        mode: Mode::Single,
        params: Params::Single(resource.params),
        pointers: Pointers::Single(resource.pointers),
    })
}

fn parse_bulk(data: &Value, mapping: &FieldMapping) -> Result<DeserializedDocument, DocumentError> {
    let Value::Array(resources) = data else {
        return Err(DocumentError::MalformedDocument {
            pointer: PointerPath::root().to_string(),
            message: format!(
                "bulk primary data must be an array, got {}",
                json_type_name(data)
            ),
        });
    };

    let mut params = Vec::with_capacity(resources.len());
    let mut pointers = Vec::with_capacity(resources.len());
    for (index, resource) in resources.iter().enumerate() {
        let root = PointerPath::root().with_index(index);
        let resource = deserialize(resource, mapping, &root)?;
        params.push(resource.params);
        pointers.push(resource.pointers);
    }

    Ok(DeserializedDocument {
        mode: Mode::Bulk,
        params: Params::Bulk(params),
        pointers: Pointers::Bulk(pointers),
    })
}

/// State owned by one request.
///
/// Holds the deserialized params slots and the pointer registry the error
/// path reads from. Dropped with the request.
#[derive(Debug, Clone, Default)]
pub struct RequestScope {
    requested: ExtensionSet,
    params: Map<String, Value>,
    pointers: Option<Pointers>,
}

impl RequestScope {
    /// Start a request with its `Content-Type` header.
    pub fn new(content_type: Option<&str>) -> Self {
        Self {
            requested: parse_requested(content_type),
            ..Self::default()
        }
    }

    pub fn requested_extensions(&self) -> &ExtensionSet {
        &self.requested
    }

    /// Whether `extension` is requested by the client and supported by `config`.
    pub fn extension_request(&self, extension: &str, config: &Config) -> bool {
        is_extension_active(extension, &self.requested, &config.supported_extensions)
    }

    /// Requested extensions that are supported by `config`.
    pub fn active_extensions(&self, config: &Config) -> ExtensionSet {
        active_extensions(&self.requested, &config.supported_extensions)
    }

    pub fn params(&self) -> &Map<String, Value> {
        &self.params
    }

    pub fn param(&self, key: &str) -> Option<&Value> {
        self.params.get(key)
    }

    /// Pointers recorded for the deserialized payload, if any.
    pub fn jsonapi_pointers(&self) -> Option<&Pointers> {
        self.pointers.as_ref()
    }

    pub fn take_pointers(&mut self) -> Option<Pointers> {
        self.pointers.take()
    }

    /// Split into the params slots and the pointer registry.
    pub fn into_parts(self) -> (Map<String, Value>, Option<Pointers>) {
        (self.params, self.pointers)
    }
}

/// A resource declared deserializable by an endpoint: the params slot it
/// fills and the mapping it uses.
#[derive(Debug, Clone)]
pub struct DocumentCoordinator {
    key: String,
    mapping: FieldMapping,
}

impl DocumentCoordinator {
    pub fn new(key: impl Into<String>, mapping: FieldMapping) -> Self {
        Self {
            key: key.into(),
            mapping,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn mapping(&self) -> &FieldMapping {
        &self.mapping
    }

    /// Deserialize `document` and store the result in `scope`.
    ///
    /// Params land in the scope's slot named by this coordinator's key and
    /// pointers in its registry. Returns the negotiated mode, or `None` when
    /// the request carried no payload, in which case the scope is untouched.
    ///
    /// # Errors
    ///
    /// Propagates shape errors from [`deserialize_document`]; the scope is
    /// left untouched on error.
    pub fn deserialize_into(
        &self,
        scope: &mut RequestScope,
        document: Option<&Value>,
        config: &Config,
    ) -> Result<Option<Mode>, DocumentError> {
        let mode = negotiate_mode(&scope.requested, &config.supported_extensions);
        let span = tracing::debug_span!("parse", key = %self.key, mode = ?mode);
        let _guard = span.enter();

        let Some(deserialized) = deserialize_document(document, &self.mapping, mode)? else {
            tracing::warn!(
                key = %self.key,
                "unable to deserialize {} because no JSON:API payload was found",
                self.key
            );
            return Ok(None);
        };

        scope
            .params
            .insert(self.key.clone(), deserialized.params.into_value());
        scope.pointers = Some(deserialized.pointers);
        Ok(Some(deserialized.mode))
    }
}
