use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::Value;

use crate::error::SchemaError;
use crate::field::FieldDescriptor;
use crate::schema::RecordSchema;

/// Per-instance value store for one [`RecordSchema`].
///
/// Reading an unset field yields the schema default. Writing coerces the
/// raw value through the field's descriptor; under an open schema a write
/// to an undeclared name synthesizes an instance-local opaque descriptor
/// first. Dynamic descriptors never leak back into the shared schema.
#[derive(Debug, Clone)]
pub struct BoundRecord {
    schema: Arc<RecordSchema>,
    values: IndexMap<String, Value>,
    dynamic: IndexMap<String, FieldDescriptor>,
}

impl BoundRecord {
    pub fn new(schema: Arc<RecordSchema>) -> Self {
        Self {
            schema,
            values: IndexMap::new(),
            dynamic: IndexMap::new(),
        }
    }

    pub fn schema(&self) -> &Arc<RecordSchema> {
        &self.schema
    }

    /// Declared descriptor, or the instance-local one for a dynamic field.
    pub fn descriptor(&self, name: &str) -> Option<&FieldDescriptor> {
        self.schema.descriptor(name).or_else(|| self.dynamic.get(name))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.schema.contains(name) || self.dynamic.contains_key(name)
    }

    /// Declared fields plus dynamic ones, i.e. everything iteration sees.
    pub fn len(&self) -> usize {
        self.schema.len() + self.dynamic.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, name: &str) -> Result<&Value, SchemaError> {
        if let Some(value) = self.values.get(name) {
            return Ok(value);
        }
        if let Some(descriptor) = self.descriptor(name) {
            return Ok(descriptor.default());
        }
        Err(SchemaError::UnknownField { field: name.into() })
    }

    pub fn set(&mut self, name: &str, raw: Value) -> Result<(), SchemaError> {
        let coerced = if let Some(descriptor) = self.descriptor(name) {
            descriptor.coerce(&raw)?
        } else if self.schema.is_open() {
            let descriptor = FieldDescriptor::opaque(name);
            let coerced = descriptor.coerce(&raw)?;
            self.dynamic.insert(name.to_string(), descriptor);
            coerced
        } else {
            return Err(SchemaError::UnknownField { field: name.into() });
        };
        self.values.insert(name.to_string(), coerced);
        Ok(())
    }

    /// Apply [`set`](Self::set) per entry; the first failure aborts the
    /// whole update (the error names the failing key).
    pub fn update<K, I>(&mut self, entries: I) -> Result<(), SchemaError>
    where
        K: AsRef<str>,
        I: IntoIterator<Item = (K, Value)>,
    {
        for (name, raw) in entries {
            self.set(name.as_ref(), raw)?;
        }
        Ok(())
    }

    /// Clear all instance-local values and dynamic descriptors, reverting
    /// every field to its schema default.
    pub fn reset(&mut self) {
        self.values.clear();
        self.dynamic.clear();
    }

    /// Effective (set-or-default) values: declared fields in declaration
    /// order, then dynamic fields in first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = (&FieldDescriptor, &Value)> {
        self.schema
            .fields()
            .chain(self.dynamic.values())
            .map(|descriptor| {
                let value = self
                    .values
                    .get(descriptor.name())
                    .unwrap_or(descriptor.default());
                (descriptor, value)
            })
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.iter().map(|(descriptor, _)| descriptor.name())
    }

    /// Snapshot of every field's effective value (absent fields as `Null`).
    pub fn to_value_map(&self) -> IndexMap<String, Value> {
        self.iter()
            .map(|(descriptor, value)| (descriptor.name().to_string(), value.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::FieldType;
    use serde_json::json;

    fn closed_schema() -> Arc<RecordSchema> {
        RecordSchema::builder()
            .field_with_default("a", FieldType::Int, 2)
            .field_with_default("b", FieldType::Str, "BBB")
            .field("c", FieldType::Float)
            .build()
    }

    #[test]
    fn unset_fields_read_their_defaults() {
        let record = BoundRecord::new(closed_schema());
        assert_eq!(record.get("a").unwrap(), &json!(2));
        assert_eq!(record.get("b").unwrap(), &json!("BBB"));
        assert_eq!(record.get("c").unwrap(), &Value::Null);
    }

    #[test]
    fn set_stores_the_coerced_value() {
        let mut record = BoundRecord::new(closed_schema());
        record.set("a", json!("55")).unwrap();
        assert_eq!(record.get("a").unwrap(), &json!(55));
        record.set("a", json!("None")).unwrap();
        assert_eq!(record.get("a").unwrap(), &Value::Null);
    }

    #[test]
    fn closed_schema_rejects_undeclared_names() {
        let mut record = BoundRecord::new(closed_schema());
        let err = record.set("d", json!(23)).unwrap_err();
        assert_eq!(err, SchemaError::UnknownField { field: "d".into() });
        let err = record.get("d").unwrap_err();
        assert_eq!(err, SchemaError::UnknownField { field: "d".into() });
    }

    #[test]
    fn open_schema_synthesizes_instance_local_descriptors() {
        let schema = RecordSchema::open_empty();
        let mut record = BoundRecord::new(schema.clone());
        assert_eq!(record.field_names().count(), 0);

        record.set("x", json!(123)).unwrap();
        record.set("y", json!({"nested": true})).unwrap();
        assert_eq!(record.get("x").unwrap(), &json!(123));
        assert_eq!(record.get("y").unwrap(), &json!({"nested": true}));
        assert_eq!(record.descriptor("x").unwrap().ty(), FieldType::Opaque);

        // The other record on the same schema is untouched.
        let other = BoundRecord::new(schema);
        assert!(other.get("x").is_err());
    }

    #[test]
    fn update_aborts_on_the_first_failure() {
        let mut record = BoundRecord::new(closed_schema());
        let err = record
            .update([
                ("a", json!("1")),
                ("c", json!("not-a-float")),
                ("b", json!("never applied")),
            ])
            .unwrap_err();
        assert_eq!(err.field(), "c");
        assert_eq!(record.get("a").unwrap(), &json!(1));
        assert_eq!(record.get("b").unwrap(), &json!("BBB"));
    }

    #[test]
    fn reset_reverts_to_schema_defaults() {
        let mut record = BoundRecord::new(closed_schema());
        record
            .update([("a", json!("12")), ("b", json!("34")), ("c", json!("56"))])
            .unwrap();
        assert_eq!(
            record.to_value_map(),
            IndexMap::from([
                ("a".to_string(), json!(12)),
                ("b".to_string(), json!("34")),
                ("c".to_string(), json!(56.0)),
            ])
        );

        record.reset();
        assert_eq!(
            record.to_value_map(),
            IndexMap::from([
                ("a".to_string(), json!(2)),
                ("b".to_string(), json!("BBB")),
                ("c".to_string(), Value::Null),
            ])
        );
    }

    #[test]
    fn reset_drops_dynamic_fields() {
        let mut record = BoundRecord::new(RecordSchema::open_empty());
        record.set("x", json!(1)).unwrap();
        record.reset();
        assert!(record.get("x").is_err());
        assert_eq!(record.len(), 0);
    }

    #[test]
    fn iteration_lists_declared_then_dynamic_names() {
        let schema = RecordSchema::extending(&closed_schema()).open().build();
        let mut record = BoundRecord::new(schema);
        record.set("z", json!(9)).unwrap();
        record.set("d", json!(8)).unwrap();
        let names: Vec<&str> = record.field_names().collect();
        assert_eq!(names, ["a", "b", "c", "z", "d"]);
        assert_eq!(record.len(), 5);
        assert!(record.contains("z"));
        assert!(!record.contains("missing"));
    }

    #[test]
    fn instances_do_not_share_values() {
        let schema = closed_schema();
        let mut first = BoundRecord::new(schema.clone());
        let mut second = BoundRecord::new(schema);
        first.set("a", json!(15)).unwrap();
        second.set("a", json!(24)).unwrap();
        assert_eq!(first.get("a").unwrap(), &json!(15));
        assert_eq!(second.get("a").unwrap(), &json!(24));
    }
}
