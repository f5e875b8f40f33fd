use std::sync::Arc;

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use qmsg_schema::{BoundRecord, FieldType, RecordSchema};
use serde_json::Value;

use crate::codec;
use crate::error::WireError;
use crate::queue::{QueueMessage, resolve_section};
use crate::wire::{MessageStructure, NotificationWire};

/// Body field marking an embedded notification payload (fan-out
/// convention).
const PAYLOAD_TYPE_FIELD: &str = "Type";
const NOTIFICATION_PAYLOAD: &str = "Notification";

static GENERIC: Lazy<Arc<NotificationType>> = Lazy::new(|| {
    NotificationType::builder("GenericNotification")
        .open_attributes()
        .open_body()
        .build()
});

/// A concrete notification kind: resolved attribute and body schemas.
/// Built once per kind and shared via `Arc`, like
/// [`MessageType`](crate::MessageType).
#[derive(Debug)]
pub struct NotificationType {
    name: String,
    attributes: Arc<RecordSchema>,
    body: Arc<RecordSchema>,
}

impl NotificationType {
    pub fn builder(name: impl Into<String>) -> NotificationTypeBuilder {
        NotificationTypeBuilder {
            name: name.into(),
            parent: None,
            attributes: Vec::new(),
            body: Vec::new(),
            attributes_open: false,
            body_open: false,
        }
    }

    /// The open catch-all kind: any body field or attribute is accepted.
    pub fn generic() -> Arc<NotificationType> {
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

    pub fn instantiate(self: &Arc<Self>) -> Notification {
        Notification {
            ty: self.clone(),
            attributes: BoundRecord::new(self.attributes.clone()),
            body: BoundRecord::new(self.body.clone()),
            topic_arn: None,
            subject: None,
            structure: None,
            plain_message: None,
        }
    }

    /// Decode a notification wire dict against this kind.
    ///
    /// With `"json"` structure the `Message` string is parsed and fed
    /// into the body under the lenient rule; without it the message lands
    /// in the plain-message slot and the body schema goes unused.
    pub fn from_wire(self: &Arc<Self>, raw: &NotificationWire) -> Result<Notification, WireError> {
        let mut notification = self.instantiate();
        notification.topic_arn = raw.topic_arn.clone();
        notification.subject = raw.subject.clone();
        notification.structure = raw.message_structure;
        match raw.message_structure {
            Some(MessageStructure::Json) => {
                if !raw.message.is_empty() {
                    let object = codec::parse_body_object(&raw.message)?;
                    codec::apply_object_lenient(&mut notification.body, object)?;
                }
            }
            None => {
                if !raw.message.is_empty() {
                    notification.plain_message = Some(raw.message.clone());
                }
            }
        }
        codec::apply_attributes_lenient(&mut notification.attributes, &raw.message_attributes)?;
        Ok(notification)
    }
}

/// Builder for [`NotificationType`]; same section semantics as
/// [`MessageTypeBuilder`](crate::MessageTypeBuilder).
#[derive(Debug)]
pub struct NotificationTypeBuilder {
    name: String,
    parent: Option<Arc<NotificationType>>,
    attributes: Vec<(String, FieldType, Value)>,
    body: Vec<(String, FieldType, Value)>,
    attributes_open: bool,
    body_open: bool,
}

impl NotificationTypeBuilder {
    pub fn extending(mut self, parent: &Arc<NotificationType>) -> Self {
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

    pub fn build(self) -> Arc<NotificationType> {
        Arc::new(NotificationType {
            name: self.name,
            attributes: resolve_section(
                self.attributes,
                self.attributes_open,
                self.parent.as_ref().map(|p| p.attributes()),
            ),
            body: resolve_section(
                self.body,
                self.body_open,
                self.parent.as_ref().map(|p| p.body()),
            ),
        })
    }
}

/// One notification, either structured (`structure == "json"`, body
/// fields addressable) or plain (a single opaque string, body unused).
#[derive(Debug, Clone)]
pub struct Notification {
    ty: Arc<NotificationType>,
    pub attributes: BoundRecord,
    body: BoundRecord,
    pub topic_arn: Option<String>,
    pub subject: Option<String>,
    structure: Option<MessageStructure>,
    plain_message: Option<String>,
}

impl Notification {
    pub fn notification_type(&self) -> &Arc<NotificationType> {
        &self.ty
    }

    pub fn type_name(&self) -> &str {
        self.ty.name()
    }

    pub fn structure(&self) -> Option<MessageStructure> {
        self.structure
    }

    pub fn plain_message(&self) -> Option<&str> {
        self.plain_message.as_deref()
    }

    /// Read-only view of the body record.
    pub fn body(&self) -> &BoundRecord {
        &self.body
    }

    pub fn with_topic_arn(mut self, topic_arn: impl Into<String>) -> Self {
        self.topic_arn = Some(topic_arn.into());
        self
    }

    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    pub fn with_plain_message(mut self, message: impl Into<String>) -> Self {
        self.plain_message = Some(message.into());
        self
    }

    /// Strictly apply initial attributes.
    pub fn with_attributes<K, I>(mut self, entries: I) -> Result<Self, WireError>
    where
        K: AsRef<str>,
        I: IntoIterator<Item = (K, Value)>,
    {
        self.attributes.update(entries)?;
        Ok(self)
    }

    /// Strictly apply initial body fields; this marks the notification as
    /// json-structured.
    pub fn with_body<K, I>(mut self, entries: I) -> Result<Self, WireError>
    where
        K: AsRef<str>,
        I: IntoIterator<Item = (K, Value)>,
    {
        self.update_body(entries)?;
        Ok(self)
    }

    /// Set one body field; this marks the notification as json-structured.
    pub fn set_body_field(&mut self, name: &str, value: Value) -> Result<(), WireError> {
        self.body.set(name, value)?;
        self.structure = Some(MessageStructure::Json);
        Ok(())
    }

    /// Bulk [`set_body_field`](Self::set_body_field); the first failure
    /// aborts the update.
    pub fn update_body<K, I>(&mut self, entries: I) -> Result<(), WireError>
    where
        K: AsRef<str>,
        I: IntoIterator<Item = (K, Value)>,
    {
        self.body.update(entries)?;
        self.structure = Some(MessageStructure::Json);
        Ok(())
    }

    /// The structured body view: every body field's effective value.
    /// Plain-string notifications have no addressable fields.
    pub fn extract_body(&self) -> Result<IndexMap<String, Value>, WireError> {
        if self.structure != Some(MessageStructure::Json) {
            return Err(WireError::InvalidStructure);
        }
        Ok(self.body.to_value_map())
    }

    /// Encode to the notification publish shape.
    ///
    /// With `"json"` structure the body becomes a JSON object with sorted
    /// keys whose values all cross the wire as strings (structured values
    /// JSON-encoded first); otherwise `Message` is the plain-message
    /// slot. Attributes are emitted only when at least one is non-absent,
    /// each with its wire category as `DataType`.
    pub fn to_wire(&self) -> Result<NotificationWire, WireError> {
        let message = match self.structure {
            Some(MessageStructure::Json) => codec::encode_body(&self.body, |value| {
                Ok(Value::String(codec::wire_string(value)?))
            })?,
            None => self.plain_message.clone().unwrap_or_default(),
        };
        Ok(NotificationWire {
            message,
            topic_arn: self.topic_arn.clone(),
            subject: self.subject.clone(),
            message_structure: self.structure,
            message_attributes: codec::encode_attributes(&self.attributes, true)?,
        })
    }
}

impl QueueMessage {
    /// Lift an embedded notification payload out of this message's body.
    ///
    /// Recognizes the fan-out convention (a body field `Type ==
    /// "Notification"`) and re-runs the notification decode against the
    /// body's value mapping. Returns `Ok(None)` when the body is not a
    /// notification payload. Never mutates this message's records.
    pub fn nested_notification(
        &self,
        ty: &Arc<NotificationType>,
    ) -> Result<Option<Notification>, WireError> {
        let snapshot = self.body.to_value_map();
        match snapshot.get(PAYLOAD_TYPE_FIELD) {
            Some(Value::String(kind)) if kind == NOTIFICATION_PAYLOAD => {}
            _ => return Ok(None),
        }
        let object: serde_json::Map<String, Value> = snapshot
            .into_iter()
            .filter(|(_, value)| !value.is_null())
            .collect();
        let wire: NotificationWire = serde_json::from_value(Value::Object(object))
            .map_err(|err| WireError::MalformedBody(err.to_string()))?;
        ty.from_wire(&wire).map(Some)
    }
}
