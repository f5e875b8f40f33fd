//! Typed record schemas for queue and notification envelopes.
//!
//! A [`RecordSchema`] is an ordered, immutable set of named, typed fields
//! (closed, or open to undeclared names). A [`BoundRecord`] is the
//! per-instance value store for one schema: reads fall back to declared
//! defaults, writes coerce raw values through the field's declared type.

mod error;
mod field;
mod record;
mod schema;

pub use error::SchemaError;
pub use field::{FieldDescriptor, FieldType, WireCategory};
pub use record::BoundRecord;
pub use schema::{RecordSchema, SchemaBuilder};
