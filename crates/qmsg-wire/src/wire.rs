//! Serde models of the exact wire shapes this crate reads and writes.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A single `{DataType, StringValue|BinaryValue}` attribute entry.
///
/// Incoming `DataType` spellings are not validated (producers emit
/// `"String"`, `"string"`, `"Number"`, ...); outbound entries always use
/// the canonical capitalized forms.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireAttribute {
    #[serde(rename = "DataType")]
    pub data_type: String,
    #[serde(rename = "StringValue", skip_serializing_if = "Option::is_none")]
    pub string_value: Option<String>,
    #[serde(rename = "BinaryValue", skip_serializing_if = "Option::is_none")]
    pub binary_value: Option<String>,
}

impl WireAttribute {
    pub fn string(data_type: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            data_type: data_type.into(),
            string_value: Some(value.into()),
            binary_value: None,
        }
    }

    /// The carried value: `StringValue` when present, else `BinaryValue`.
    pub fn value(&self) -> Option<&str> {
        self.string_value
            .as_deref()
            .or(self.binary_value.as_deref())
    }
}

/// Work-queue receive shape. Extra envelope keys (`MD5OfBody`, ...) are
/// ignored on deserialization.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct ReceivedQueueMessage {
    #[serde(rename = "MessageId")]
    pub message_id: Option<String>,
    #[serde(rename = "ReceiptHandle")]
    pub receipt_handle: Option<String>,
    #[serde(rename = "Body")]
    pub body: Option<String>,
    #[serde(rename = "MessageAttributes", default)]
    pub message_attributes: IndexMap<String, WireAttribute>,
}

/// Work-queue send shape.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OutboundQueueMessage {
    #[serde(rename = "MessageBody")]
    pub message_body: String,
    #[serde(rename = "MessageAttributes")]
    pub message_attributes: IndexMap<String, WireAttribute>,
}

/// Body structure marker of a notification.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageStructure {
    Json,
}

/// Notification publish/receive shape.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct NotificationWire {
    #[serde(rename = "Message", default)]
    pub message: String,
    #[serde(rename = "TopicArn", skip_serializing_if = "Option::is_none")]
    pub topic_arn: Option<String>,
    #[serde(rename = "Subject", skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(rename = "MessageStructure", skip_serializing_if = "Option::is_none")]
    pub message_structure: Option<MessageStructure>,
    #[serde(
        rename = "MessageAttributes",
        default,
        skip_serializing_if = "IndexMap::is_empty"
    )]
    pub message_attributes: IndexMap<String, WireAttribute>,
}
