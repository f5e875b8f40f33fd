use std::sync::Arc;

use once_cell::sync::Lazy;
use qmsg_schema::{BoundRecord, FieldType, RecordSchema};
use serde_json::Value;

use crate::codec;
use crate::error::WireError;
use crate::wire::{OutboundQueueMessage, ReceivedQueueMessage, WireAttribute};

/// Wire attribute carrying the concrete message type name, used to pick
/// the decode target. Always injected on encode, after user attributes,
/// so user fields cannot shadow it.
pub const MESSAGE_TYPE_ATTRIBUTE: &str = "sqs_message_type";

static GENERIC: Lazy<Arc<MessageType>> = Lazy::new(|| {
    MessageType::builder("GenericQueueMessage")
        .open_attributes()
        .open_body()
        .build()
});

/// A concrete work-queue message kind: a name (the wire discriminator
/// value) plus resolved attribute and body schemas.
///
/// Built once per kind at process start and shared via `Arc`;
/// instantiation never re-resolves schemas.
#[derive(Debug)]
pub struct MessageType {
    name: String,
    attributes: Arc<RecordSchema>,
    body: Arc<RecordSchema>,
}

impl MessageType {
    pub fn builder(name: impl Into<String>) -> MessageTypeBuilder {
        MessageTypeBuilder {
            name: name.into(),
            parent: None,
            attributes: Vec::new(),
            body: Vec::new(),
            attributes_open: false,
            body_open: false,
        }
    }

    /// The open fallback kind: undeclared attributes and body fields are
    /// accepted as instance-local opaque fields.
    pub fn generic() -> Arc<MessageType> {
        GENERIC.clone()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn attributes(&self) -> &Arc<RecordSchema> {
        &self.attributes
    }

    pub fn body(&self) -> &Arc<RecordSchema> {
        &self.body
    }

    pub fn instantiate(self: &Arc<Self>) -> QueueMessage {
        QueueMessage {
            ty: self.clone(),
            attributes: BoundRecord::new(self.attributes.clone()),
            body: BoundRecord::new(self.body.clone()),
            message_id: None,
            receipt_handle: None,
            queue_url: None,
        }
    }

    /// Decode a received wire message against this kind.
    ///
    /// Undeclared incoming body keys and attributes are dropped on closed
    /// schemas and absorbed on open ones; malformed JSON or a declared
    /// field that fails coercion fails the whole decode.
    pub fn from_wire(self: &Arc<Self>, raw: &ReceivedQueueMessage) -> Result<QueueMessage, WireError> {
        let mut message = self.instantiate();
        if let Some(body) = raw.body.as_deref().filter(|body| !body.is_empty()) {
            let object = codec::parse_body_object(body)?;
            codec::apply_object_lenient(&mut message.body, object)?;
        }
        codec::apply_attributes_lenient(&mut message.attributes, &raw.message_attributes)?;
        message.message_id = raw.message_id.clone();
        message.receipt_handle = raw.receipt_handle.clone();
        Ok(message)
    }
}

/// Resolve one attributes/body section of a message or notification kind.
pub(crate) fn resolve_section(
    declared: Vec<(String, FieldType, Value)>,
    open: bool,
    parent: Option<&Arc<RecordSchema>>,
) -> Arc<RecordSchema> {
    if declared.is_empty() && !open {
        // Inheritance short-circuit: a kind that declares nothing of its
        // own reuses the parent schema by reference.
        return match parent {
            Some(schema) => schema.clone(),
            None => RecordSchema::empty(),
        };
    }
    let mut builder = match parent {
        Some(schema) => RecordSchema::extending(schema),
        None => RecordSchema::builder(),
    };
    if open {
        builder = builder.open();
    }
    for (name, ty, default) in declared {
        builder = builder.field_with_default(name, ty, default);
    }
    builder.build()
}

/// Builder for [`MessageType`]. Fields keep declaration order; with
/// [`extending`](Self::extending), declared fields overlay the parent's
/// per section and an undeclared section reuses the parent schema.
#[derive(Debug)]
pub struct MessageTypeBuilder {
    name: String,
    parent: Option<Arc<MessageType>>,
    attributes: Vec<(String, FieldType, Value)>,
    body: Vec<(String, FieldType, Value)>,
    attributes_open: bool,
    body_open: bool,
}

impl MessageTypeBuilder {
    pub fn extending(mut self, parent: &Arc<MessageType>) -> Self {
        self.parent = Some(parent.clone());
        self
    }

    pub fn attribute(self, name: impl Into<String>, ty: FieldType) -> Self {
        self.attribute_with_default(name, ty, Value::Null)
    }

    pub fn attribute_with_default(
        mut self,
        name: impl Into<String>,
        ty: FieldType,
        default: impl Into<Value>,
    ) -> Self {
        self.attributes.push((name.into(), ty, default.into()));
        self
    }

    pub fn body_field(self, name: impl Into<String>, ty: FieldType) -> Self {
        self.body_field_with_default(name, ty, Value::Null)
    }

    pub fn body_field_with_default(
        mut self,
        name: impl Into<String>,
        ty: FieldType,
        default: impl Into<Value>,
    ) -> Self {
        self.body.push((name.into(), ty, default.into()));
        self
    }

    pub fn open_attributes(mut self) -> Self {
        self.attributes_open = true;
        self
    }

    pub fn open_body(mut self) -> Self {
        self.body_open = true;
        self
    }

    pub fn build(self) -> Arc<MessageType> {
        let parent = self.parent.as_ref();
        let attributes = resolve_section(
            self.attributes,
            self.attributes_open,
            parent.map(|p| p.attributes()),
        );
        let body = resolve_section(self.body, self.body_open, parent.map(|p| p.body()));
        Arc::new(MessageType {
            name: self.name,
            attributes,
            body,
        })
    }
}

/// One received or about-to-be-sent work-queue message.
#[derive(Debug, Clone)]
pub struct QueueMessage {
    ty: Arc<MessageType>,
    pub attributes: BoundRecord,
    pub body: BoundRecord,
    pub message_id: Option<String>,
    pub receipt_handle: Option<String>,
    pub queue_url: Option<String>,
}

impl QueueMessage {
    pub fn message_type(&self) -> &Arc<MessageType> {
        &self.ty
    }

    /// The discriminator value: the concrete kind's name, present on
    /// every instance whether or not the caller ever set an attribute.
    pub fn type_name(&self) -> &str {
        self.ty.name()
    }

    /// Strictly apply initial attributes; an undeclared name on a closed
    /// schema is an error (unlike wire decode).
    pub fn with_attributes<K, I>(mut self, entries: I) -> Result<Self, WireError>
    where
        K: AsRef<str>,
        I: IntoIterator<Item = (K, Value)>,
    {
        self.attributes.update(entries)?;
        Ok(self)
    }

    /// Strictly apply initial body fields.
    pub fn with_body<K, I>(mut self, entries: I) -> Result<Self, WireError>
    where
        K: AsRef<str>,
        I: IntoIterator<Item = (K, Value)>,
    {
        self.body.update(entries)?;
        Ok(self)
    }

    pub fn with_queue_url(mut self, url: impl Into<String>) -> Self {
        self.queue_url = Some(url.into());
        self
    }

    /// Encode to the work-queue send shape.
    ///
    /// Every non-absent attribute serializes as `DataType: "String"`
    /// (this envelope's wire convention regardless of declared type); the
    /// discriminator goes last so user attributes cannot shadow it. The
    /// body becomes one JSON object with sorted keys.
    pub fn to_wire(&self) -> Result<OutboundQueueMessage, WireError> {
        let mut attributes = codec::encode_attributes(&self.attributes, false)?;
        attributes.shift_remove(MESSAGE_TYPE_ATTRIBUTE);
        attributes.insert(
            MESSAGE_TYPE_ATTRIBUTE.to_string(),
            WireAttribute::string("String", self.ty.name()),
        );
        Ok(OutboundQueueMessage {
            message_body: codec::encode_body(&self.body, |value| Ok(value.clone()))?,
            message_attributes: attributes,
        })
    }
}
