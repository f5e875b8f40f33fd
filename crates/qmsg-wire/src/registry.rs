use std::sync::Arc;

use indexmap::IndexMap;

use crate::error::WireError;
use crate::queue::{MESSAGE_TYPE_ATTRIBUTE, MessageType, QueueMessage};
use crate::wire::ReceivedQueueMessage;

/// Discriminator-driven decode dispatch: maps message type names to their
/// [`MessageType`] definitions, with a designated fallback for unknown or
/// absent discriminators.
///
/// Populated once at startup; decode never mutates it.
#[derive(Debug)]
pub struct MessageRegistry {
    types: IndexMap<String, Arc<MessageType>>,
    fallback: Arc<MessageType>,
}

impl MessageRegistry {
    /// Registry with [`MessageType::generic`] as the fallback.
    pub fn new() -> Self {
        Self::with_fallback(MessageType::generic())
    }

    pub fn with_fallback(fallback: Arc<MessageType>) -> Self {
        Self {
            types: IndexMap::new(),
            fallback,
        }
    }

    pub fn register(&mut self, ty: Arc<MessageType>) -> Result<(), WireError> {
        if self.types.contains_key(ty.name()) {
            return Err(WireError::DuplicateMessageType(ty.name().to_string()));
        }
        self.types.insert(ty.name().to_string(), ty);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Arc<MessageType>> {
        self.types.get(name)
    }

    pub fn fallback(&self) -> &Arc<MessageType> {
        &self.fallback
    }

    pub fn type_names(&self) -> impl Iterator<Item = &str> {
        self.types.keys().map(String::as_str)
    }

    /// Decode a received message against the kind its discriminator
    /// names, falling back to the registry's fallback kind when the
    /// discriminator is absent or unknown.
    pub fn decode(&self, raw: &ReceivedQueueMessage) -> Result<QueueMessage, WireError> {
        let discriminator = raw
            .message_attributes
            .get(MESSAGE_TYPE_ATTRIBUTE)
            .and_then(|attribute| attribute.value());
        let ty = match discriminator {
            Some(name) => self.types.get(name).unwrap_or_else(|| {
                log::warn!(
                    "unknown message type '{name}', decoding as {}",
                    self.fallback.name()
                );
                &self.fallback
            }),
            None => &self.fallback,
        };
        ty.from_wire(raw)
    }
}

impl Default for MessageRegistry {
    fn default() -> Self {
        Self::new()
    }
}
