//! Envelope codecs for the two queueing/pub-sub wire formats, built on
//! [`qmsg_schema`]: work-queue messages (separate attribute and body
//! sections, polymorphic decode via a type-discriminator attribute) and
//! notifications (attributes plus a structured-or-plain body with routing
//! metadata), including the bridge that lifts a notification payload out
//! of a work-queue message body.

mod codec;
mod error;
mod notification;
mod queue;
mod registry;
mod wire;

pub use error::WireError;
pub use notification::{Notification, NotificationType, NotificationTypeBuilder};
pub use queue::{MESSAGE_TYPE_ATTRIBUTE, MessageType, MessageTypeBuilder, QueueMessage};
pub use registry::MessageRegistry;
pub use wire::{
    MessageStructure, NotificationWire, OutboundQueueMessage, ReceivedQueueMessage, WireAttribute,
};

#[cfg(test)]
mod tests;
