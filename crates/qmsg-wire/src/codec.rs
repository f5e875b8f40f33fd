//! Shared helpers for the two envelope codecs.
//!
//! Decode is deliberately lenient toward undeclared incoming fields
//! (dropped on closed schemas, absorbed on open ones) while direct
//! construction through `BoundRecord::set` stays strict; malformed values
//! for fields a codec does attempt to populate fail the whole decode.

use std::collections::BTreeMap;

use indexmap::IndexMap;
use qmsg_schema::{BoundRecord, FieldDescriptor, SchemaError, WireCategory};
use serde_json::Value;

use crate::error::WireError;
use crate::wire::WireAttribute;

/// Render a field value to its wire string form. Structured values are
/// JSON-encoded; scalars use their plain rendering.
pub(crate) fn wire_string(value: &Value) -> Result<String, WireError> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        other => serde_json::to_string(other).map_err(|err| WireError::Encode(err.to_string())),
    }
}

/// Render an attribute value; attributes carry scalars only, so a
/// structured value is a serialization error.
fn attribute_string(descriptor: &FieldDescriptor, value: &Value) -> Result<String, SchemaError> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        _ => Err(SchemaError::UnsupportedAttributeType {
            field: descriptor.name().to_string(),
            ty: descriptor.ty(),
        }),
    }
}

/// Serialize every non-absent attribute. With `typed_categories` the
/// entry's `DataType` follows the field's wire category (notification
/// convention); without, it is always `"String"` (work-queue convention).
pub(crate) fn encode_attributes(
    record: &BoundRecord,
    typed_categories: bool,
) -> Result<IndexMap<String, WireAttribute>, WireError> {
    let mut out = IndexMap::new();
    for (descriptor, value) in record.iter() {
        if value.is_null() {
            continue;
        }
        let rendered = attribute_string(descriptor, value)?;
        let category = if typed_categories {
            descriptor.wire_category(value)
        } else {
            WireCategory::String
        };
        out.insert(
            descriptor.name().to_string(),
            WireAttribute::string(category.as_str(), rendered),
        );
    }
    Ok(out)
}

/// Serialize a body record as a JSON object with sorted keys, omitting
/// absent fields. `map_value` transforms each field value first.
pub(crate) fn encode_body<F>(record: &BoundRecord, map_value: F) -> Result<String, WireError>
where
    F: Fn(&Value) -> Result<Value, WireError>,
{
    let mut object = BTreeMap::new();
    for (descriptor, value) in record.iter() {
        if value.is_null() {
            continue;
        }
        object.insert(descriptor.name().to_string(), map_value(value)?);
    }
    serde_json::to_string(&object).map_err(|err| WireError::Encode(err.to_string()))
}

/// Feed an incoming JSON object into a record: undeclared keys are
/// dropped on a closed schema, declared keys that fail coercion fail the
/// whole decode.
pub(crate) fn apply_object_lenient(
    record: &mut BoundRecord,
    object: serde_json::Map<String, Value>,
) -> Result<(), WireError> {
    for (name, value) in object {
        if record.contains(&name) || record.schema().is_open() {
            record.set(&name, value)?;
        }
    }
    Ok(())
}

/// Feed incoming `{DataType, StringValue|BinaryValue}` entries into a
/// record under the same lenient rule. `StringValue` wins over
/// `BinaryValue`; an entry carrying neither coerces to the absent value.
pub(crate) fn apply_attributes_lenient(
    record: &mut BoundRecord,
    attributes: &IndexMap<String, WireAttribute>,
) -> Result<(), WireError> {
    for (name, attribute) in attributes {
        if !(record.contains(name) || record.schema().is_open()) {
            continue;
        }
        let raw = attribute
            .value()
            .map(|v| Value::String(v.to_string()))
            .unwrap_or(Value::Null);
        record.set(name, raw)?;
    }
    Ok(())
}

/// Parse a wire body string as a JSON object.
pub(crate) fn parse_body_object(body: &str) -> Result<serde_json::Map<String, Value>, WireError> {
    let parsed: Value =
        serde_json::from_str(body).map_err(|err| WireError::MalformedBody(err.to_string()))?;
    match parsed {
        Value::Object(object) => Ok(object),
        other => Err(WireError::MalformedBody(format!(
            "expected a JSON object, got {other}"
        ))),
    }
}
