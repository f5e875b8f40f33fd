use serde_json::Value;
use thiserror::Error;

use crate::field::FieldType;

#[derive(Debug, Error, PartialEq)]
pub enum SchemaError {
    #[error("record has no field '{field}'")]
    UnknownField { field: String },

    #[error("cannot coerce {raw} to {expected} for field '{field}'")]
    Coercion {
        field: String,
        expected: FieldType,
        raw: Value,
    },

    #[error("field '{field}' of type {ty} cannot be serialized as a message attribute")]
    UnsupportedAttributeType { field: String, ty: FieldType },
}

impl SchemaError {
    /// The field the failure refers to.
    pub fn field(&self) -> &str {
        match self {
            SchemaError::UnknownField { field }
            | SchemaError::Coercion { field, .. }
            | SchemaError::UnsupportedAttributeType { field, .. } => field,
        }
    }
}
