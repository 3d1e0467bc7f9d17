//! Resource deserialization with reverse-pointer tracking.

use serde_json::{Map, Value};

use crate::error::DocumentError;
use crate::mapping::{FieldKind, FieldMapping};
use crate::pointer::PointerPath;
use crate::types::{json_type_name, DeserializedResource};

/// Deserialize one resource object into flat params.
///
/// Every emitted key is recorded in the reverse mapping with the pointer of
/// the member it was read from, rooted at `root` (`/data` for single
/// documents, `/data/{i}` for bulk). Keys fanned out from one member share
/// its pointer.
///
/// # Errors
///
/// Returns `DocumentError::MalformedResource` if the resource is not an
/// object, lacks a string `type`, has a member of the wrong shape, or two
/// rules emit the same key.
pub fn deserialize(
    resource: &Value,
    mapping: &FieldMapping,
    root: &PointerPath,
) -> Result<DeserializedResource, DocumentError> {
    let object = validate_resource(resource, root)?;
    let mut out = DeserializedResource::default();

    // validate_resource guarantees a type
    if let Some(value) = object.get("type") {
        let pairs = mapping.apply(FieldKind::Type, "type", value);
        record(&mut out, pairs, root.type_pointer())?;
    }

    if let Some(value) = object.get("id") {
        let pairs = mapping.apply(FieldKind::Id, "id", value);
        record(&mut out, pairs, root.id_pointer())?;
    }

    if let Some(Value::Object(attributes)) = object.get("attributes") {
        for (name, value) in attributes {
            let pairs = mapping.apply(FieldKind::Attribute, name, value);
            record(&mut out, pairs, root.attribute(name))?;
        }
    }

    if let Some(Value::Object(relationships)) = object.get("relationships") {
        for (name, value) in relationships {
            let pairs = mapping.apply(FieldKind::Relationship, name, value);
            record(&mut out, pairs, root.relationship_data(name))?;
        }
    }

    Ok(out)
}

fn record(
    out: &mut DeserializedResource,
    pairs: Vec<(String, Value)>,
    pointer: PointerPath,
) -> Result<(), DocumentError> {
    for (key, value) in pairs {
        if out.params.contains_key(&key) {
            return Err(DocumentError::malformed_resource(
                &pointer,
                format!("duplicate target key \"{}\"", key),
            ));
        }
        out.pointers.insert(key.clone(), pointer.clone());
        out.params.insert(key, value);
    }
    Ok(())
}

/// Check the minimal shape needed to walk a resource object.
///
/// # Errors
///
/// Returns `DocumentError::MalformedResource` pointing at the offending member.
pub fn validate_resource<'a>(
    resource: &'a Value,
    root: &PointerPath,
) -> Result<&'a Map<String, Value>, DocumentError> {
    let Value::Object(object) = resource else {
        return Err(DocumentError::malformed_resource(
            root,
            format!(
                "resource must be an object, got {}",
                json_type_name(resource)
            ),
        ));
    };

    match object.get("type") {
        Some(Value::String(_)) => {}
        Some(other) => {
            return Err(DocumentError::malformed_resource(
                &root.type_pointer(),
                format!("`type` must be a string, got {}", json_type_name(other)),
            ))
        }
        None => {
            return Err(DocumentError::malformed_resource(
                root,
                "resource is missing `type`",
            ))
        }
    }

    if let Some(id) = object.get("id") {
        if !id.is_string() {
            return Err(DocumentError::malformed_resource(
                &root.id_pointer(),
                format!("`id` must be a string, got {}", json_type_name(id)),
            ));
        }
    }

    for member in ["attributes", "relationships"] {
        if let Some(value) = object.get(member) {
            if !value.is_object() {
                return Err(DocumentError::MalformedResource {
                    pointer: root.child(member),
                    message: format!("`{}` must be an object, got {}", member, json_type_name(value)),
                });
            }
        }
    }

    if let Some(Value::Object(relationships)) = object.get("relationships") {
        for (name, relationship) in relationships {
            validate_relationship(name, relationship, root)?;
        }
    }

    Ok(object)
}

fn validate_relationship(
    name: &str,
    relationship: &Value,
    root: &PointerPath,
) -> Result<(), DocumentError> {
    let Some(members) = relationship.as_object() else {
        return Err(DocumentError::malformed_resource(
            &root.relationship(name),
            format!(
                "relationship must be an object, got {}",
                json_type_name(relationship)
            ),
        ));
    };
    if !["data", "links", "meta"].iter().any(|m| members.contains_key(*m)) {
        return Err(DocumentError::malformed_resource(
            &root.relationship(name),
            "relationship must have a `data`, `links`, or `meta` member",
        ));
    }
    // links/meta-only relationships carry no linkage to walk
    let Some(linkage) = members.get("data") else {
        return Ok(());
    };

    match linkage {
        Value::Null => Ok(()),
        Value::Array(items) => {
            for (index, item) in items.iter().enumerate() {
                validate_identifier(item, &root.relationship_data_at(name, index))?;
            }
            Ok(())
        }
        other => validate_identifier(other, &root.relationship_data(name)),
    }
}

fn validate_identifier(identifier: &Value, pointer: &PointerPath) -> Result<(), DocumentError> {
    let valid = identifier.get("type").map_or(false, Value::is_string)
        && identifier.get("id").map_or(false, Value::is_string);
    if valid {
        Ok(())
    } else {
        Err(DocumentError::malformed_resource(
            pointer,
            "resource identifier must have string `type` and `id`",
        ))
    }
}
