use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::Value;

use crate::field::{FieldDescriptor, FieldType};

/// An ordered set of field descriptors for one attributes or body section.
///
/// Schemas are resolved once per declaring message type, wrapped in an
/// `Arc`, and never mutated afterwards; bound records only ever read them.
/// An open schema additionally accepts names it does not declare (those
/// get instance-local opaque descriptors on first write).
#[derive(Debug)]
pub struct RecordSchema {
    fields: IndexMap<String, FieldDescriptor>,
    open: bool,
}

impl RecordSchema {
    pub fn builder() -> SchemaBuilder {
        SchemaBuilder {
            fields: IndexMap::new(),
            open: false,
        }
    }

    /// Seed a builder with a parent schema's resolved fields. Newly
    /// declared fields overlay same-named inherited descriptors; all other
    /// inherited fields keep their original types and defaults. Openness
    /// is inherited unless overridden with [`SchemaBuilder::open`].
    pub fn extending(parent: &Arc<RecordSchema>) -> SchemaBuilder {
        SchemaBuilder {
            fields: parent.fields.clone(),
            open: parent.open,
        }
    }

    /// A closed schema with no fields. Each call yields a distinct
    /// instance: unrelated message types never share a schema, even a
    /// structurally identical one.
    pub fn empty() -> Arc<RecordSchema> {
        Self::builder().build()
    }

    /// An open schema with no predeclared fields ("accepts anything").
    pub fn open_empty() -> Arc<RecordSchema> {
        Self::builder().open().build()
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn descriptor(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Declared descriptors in declaration order.
    pub fn fields(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.fields.values()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Builder for [`RecordSchema`]; fields keep declaration order.
#[derive(Debug)]
pub struct SchemaBuilder {
    fields: IndexMap<String, FieldDescriptor>,
    open: bool,
}

impl SchemaBuilder {
    pub fn field(self, name: impl Into<String>, ty: FieldType) -> Self {
        self.field_with_default(name, ty, Value::Null)
    }

    pub fn field_with_default(
        mut self,
        name: impl Into<String>,
        ty: FieldType,
        default: impl Into<Value>,
    ) -> Self {
        let name = name.into();
        let descriptor = FieldDescriptor::new(name.clone(), ty, default.into());
        // A re-declared name replaces the inherited descriptor in place,
        // keeping the original position.
        self.fields.insert(name, descriptor);
        self
    }

    pub fn open(mut self) -> Self {
        self.open = true;
        self
    }

    pub fn build(self) -> Arc<RecordSchema> {
        Arc::new(RecordSchema {
            fields: self.fields,
            open: self.open,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn declaration_order_is_preserved() {
        let schema = RecordSchema::builder()
            .field("a", FieldType::Int)
            .field("b", FieldType::Str)
            .field("c", FieldType::Float)
            .build();
        let names: Vec<&str> = schema.fields().map(|f| f.name()).collect();
        assert_eq!(names, ["a", "b", "c"]);
        assert!(!schema.is_open());
    }

    #[test]
    fn extending_overlays_redeclared_fields_only() {
        let parent = RecordSchema::builder()
            .field_with_default("a", FieldType::Int, 2)
            .field("b", FieldType::Str)
            .build();
        let child = RecordSchema::extending(&parent)
            .field_with_default("d", FieldType::Int, 10)
            .build();

        assert_eq!(child.descriptor("a").unwrap().default(), &json!(2));
        assert_eq!(child.descriptor("b").unwrap().ty(), FieldType::Str);
        assert_eq!(child.descriptor("d").unwrap().default(), &json!(10));

        let redeclared = RecordSchema::extending(&parent)
            .field_with_default("a", FieldType::Str, "two")
            .build();
        assert_eq!(redeclared.descriptor("a").unwrap().ty(), FieldType::Str);
        assert_eq!(redeclared.descriptor("a").unwrap().default(), &json!("two"));
        // Position of the overridden field is unchanged.
        let names: Vec<&str> = redeclared.fields().map(|f| f.name()).collect();
        assert_eq!(names, ["a", "b"]);
    }

    #[test]
    fn openness_is_inherited() {
        let parent = RecordSchema::open_empty();
        let child = RecordSchema::extending(&parent)
            .field("message", FieldType::Str)
            .build();
        assert!(child.is_open());
    }

    #[test]
    fn empty_schemas_are_distinct_instances() {
        let a = RecordSchema::empty();
        let b = RecordSchema::empty();
        assert!(!Arc::ptr_eq(&a, &b));
    }
}
