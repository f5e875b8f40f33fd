use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::SchemaError;

/// Declared type of a single record field.
///
/// `Opaque` is the pass-through tag used for nested maps and sequences in
/// body payloads; opaque values are never coerced.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    Int,
    Float,
    Str,
    Bool,
    Opaque,
}

impl FieldType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::Int => "int",
            FieldType::Float => "float",
            FieldType::Str => "str",
            FieldType::Bool => "bool",
            FieldType::Opaque => "opaque",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Wire-level data type category of a serialized attribute.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WireCategory {
    Number,
    String,
}

impl WireCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            WireCategory::Number => "Number",
            WireCategory::String => "String",
        }
    }
}

impl fmt::Display for WireCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One named, typed field slot with an optional default.
///
/// Immutable once the owning schema is built; a `Null` default means the
/// field has no default (reads yield the absent value).
#[derive(Clone, Debug, PartialEq)]
pub struct FieldDescriptor {
    name: String,
    ty: FieldType,
    default: Value,
}

impl FieldDescriptor {
    pub fn new(name: impl Into<String>, ty: FieldType, default: Value) -> Self {
        Self {
            name: name.into(),
            ty,
            default,
        }
    }

    /// Descriptor synthesized for a field first written under an open
    /// schema: opaque type, no default.
    pub fn opaque(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Opaque, Value::Null)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ty(&self) -> FieldType {
        self.ty
    }

    pub fn default(&self) -> &Value {
        &self.default
    }

    /// Coerce a raw wire value into this field's typed form.
    ///
    /// `null` and the literal string `"None"` coerce to the absent value
    /// regardless of the declared type.
    pub fn coerce(&self, raw: &Value) -> Result<Value, SchemaError> {
        if raw.is_null() {
            return Ok(Value::Null);
        }
        if matches!(raw, Value::String(s) if s == "None") {
            return Ok(Value::Null);
        }
        match self.ty {
            FieldType::Opaque => Ok(raw.clone()),
            FieldType::Int => self.coerce_int(raw),
            FieldType::Float => self.coerce_float(raw),
            FieldType::Str => self.coerce_str(raw),
            FieldType::Bool => self.coerce_bool(raw),
        }
    }

    /// Wire data type category for the current value: `Number` iff the
    /// declared type is numeric and the value actually is.
    pub fn wire_category(&self, value: &Value) -> WireCategory {
        match self.ty {
            FieldType::Int | FieldType::Float if value.is_number() => WireCategory::Number,
            _ => WireCategory::String,
        }
    }

    fn coerce_int(&self, raw: &Value) -> Result<Value, SchemaError> {
        match raw {
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    return Ok(Value::from(i));
                }
                // A whole-numbered float in i64 range is producer
                // round-trip noise. `i64::MAX as f64` rounds up to 2^63,
                // so the upper bound is exclusive.
                match n.as_f64() {
                    Some(f)
                        if f.fract() == 0.0
                            && f >= i64::MIN as f64
                            && f < i64::MAX as f64 =>
                    {
                        Ok(Value::from(f as i64))
                    }
                    _ => Err(self.coercion_error(raw)),
                }
            }
            Value::String(s) => s
                .trim()
                .parse::<i64>()
                .map(Value::from)
                .map_err(|_| self.coercion_error(raw)),
            _ => Err(self.coercion_error(raw)),
        }
    }

    fn coerce_float(&self, raw: &Value) -> Result<Value, SchemaError> {
        match raw {
            Value::Number(n) => n
                .as_f64()
                .map(Value::from)
                .ok_or_else(|| self.coercion_error(raw)),
            Value::String(s) => s
                .trim()
                .parse::<f64>()
                .map(Value::from)
                .map_err(|_| self.coercion_error(raw)),
            _ => Err(self.coercion_error(raw)),
        }
    }

    fn coerce_str(&self, raw: &Value) -> Result<Value, SchemaError> {
        match raw {
            Value::String(_) => Ok(raw.clone()),
            Value::Number(n) => Ok(Value::String(n.to_string())),
            Value::Bool(b) => Ok(Value::String(b.to_string())),
            _ => Err(self.coercion_error(raw)),
        }
    }

    fn coerce_bool(&self, raw: &Value) -> Result<Value, SchemaError> {
        match raw {
            Value::Bool(_) => Ok(raw.clone()),
            Value::String(s) => match s.as_str() {
                "True" | "true" | "yes" | "y" | "1" => Ok(Value::Bool(true)),
                "False" | "false" | "no" | "n" | "0" => Ok(Value::Bool(false)),
                _ => Err(self.coercion_error(raw)),
            },
            _ => Err(self.coercion_error(raw)),
        }
    }

    fn coercion_error(&self, raw: &Value) -> SchemaError {
        SchemaError::Coercion {
            field: self.name.clone(),
            expected: self.ty,
            raw: raw.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn descriptor(ty: FieldType) -> FieldDescriptor {
        FieldDescriptor::new("f", ty, Value::Null)
    }

    #[test]
    fn null_and_none_literal_coerce_to_absent() {
        for ty in [
            FieldType::Int,
            FieldType::Float,
            FieldType::Str,
            FieldType::Bool,
            FieldType::Opaque,
        ] {
            let desc = descriptor(ty);
            assert_eq!(desc.coerce(&Value::Null).unwrap(), Value::Null);
            assert_eq!(desc.coerce(&json!("None")).unwrap(), Value::Null);
        }
    }

    #[test]
    fn int_coercion() {
        let desc = descriptor(FieldType::Int);
        assert_eq!(desc.coerce(&json!("123")).unwrap(), json!(123));
        assert_eq!(desc.coerce(&json!(55)).unwrap(), json!(55));
        assert_eq!(desc.coerce(&json!(5.0)).unwrap(), json!(5));
        let err = desc.coerce(&json!("not-a-number")).unwrap_err();
        assert!(matches!(err, SchemaError::Coercion { ref field, expected, .. }
            if field == "f" && expected == FieldType::Int));
        assert!(desc.coerce(&json!(5.9)).is_err());
    }

    #[test]
    fn int_coercion_rejects_floats_outside_i64_range() {
        let desc = descriptor(FieldType::Int);
        assert!(desc.coerce(&json!(1e30)).is_err());
        assert!(desc.coerce(&json!(-1e30)).is_err());
        // 2^63 is whole but one past i64::MAX.
        assert!(desc.coerce(&json!(9_223_372_036_854_775_808.0_f64)).is_err());
        assert_eq!(
            desc.coerce(&json!(-9_223_372_036_854_775_808.0_f64)).unwrap(),
            json!(i64::MIN)
        );
    }

    #[test]
    fn float_coercion() {
        let desc = descriptor(FieldType::Float);
        assert_eq!(desc.coerce(&json!("1.23")).unwrap(), json!(1.23));
        assert_eq!(desc.coerce(&json!(56)).unwrap(), json!(56.0));
    }

    #[test]
    fn str_coercion_renders_scalars() {
        let desc = descriptor(FieldType::Str);
        assert_eq!(desc.coerce(&json!("hi")).unwrap(), json!("hi"));
        assert_eq!(desc.coerce(&json!(123)).unwrap(), json!("123"));
        assert_eq!(desc.coerce(&json!(true)).unwrap(), json!("true"));
        assert!(desc.coerce(&json!({"nested": 1})).is_err());
    }

    #[test]
    fn bool_coercion_accepts_the_usual_spellings() {
        let desc = descriptor(FieldType::Bool);
        for truthy in ["True", "true", "yes", "y", "1"] {
            assert_eq!(desc.coerce(&json!(truthy)).unwrap(), json!(true));
        }
        for falsy in ["False", "false", "no", "n", "0"] {
            assert_eq!(desc.coerce(&json!(falsy)).unwrap(), json!(false));
        }
        assert_eq!(desc.coerce(&json!(true)).unwrap(), json!(true));
        assert!(desc.coerce(&json!("maybe")).is_err());
    }

    #[test]
    fn opaque_passes_structured_values_through() {
        let desc = descriptor(FieldType::Opaque);
        let raw = json!({"version": "JobRequest-1.0", "steps": [1, 2]});
        assert_eq!(desc.coerce(&raw).unwrap(), raw);
    }

    #[test]
    fn wire_category_is_number_only_for_numeric_values() {
        let int_desc = descriptor(FieldType::Int);
        assert_eq!(int_desc.wire_category(&json!(34)), WireCategory::Number);
        assert_eq!(int_desc.wire_category(&json!("34")), WireCategory::String);
        let str_desc = descriptor(FieldType::Str);
        assert_eq!(str_desc.wire_category(&json!(34)), WireCategory::String);
    }
}
