use std::sync::Arc;

use qmsg_schema::FieldType;
use serde_json::Value;

use crate::{MessageType, NotificationType, ReceivedQueueMessage};


pub(crate) fn job_message_type() -> Arc<MessageType> {
    MessageType::builder("JobMessage")
        .attribute("job_id", FieldType::Str)
        .body_field("uuid", FieldType::Str)
        .body_field("request", FieldType::Opaque)
        .build()
}

pub(crate) fn alert_notification_type() -> Arc<NotificationType> {
    NotificationType::builder("AlertNotification")
        .attribute("x", FieldType::Str)
        .attribute("y", FieldType::Int)
        .body_field("func", FieldType::Str)
        .build()
}

pub(crate) fn received(raw: Value) -> ReceivedQueueMessage {
    serde_json::from_value(raw).expect("fixture must deserialize")
}
