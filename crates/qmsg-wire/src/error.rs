use qmsg_schema::SchemaError;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum WireError {
    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error("message body is not valid JSON: {0}")]
    MalformedBody(String),

    #[error("failed to encode message body: {0}")]
    Encode(String),

    #[error("notification has no structured body")]
    InvalidStructure,

    #[error("message type '{0}' is already registered")]
    DuplicateMessageType(String),
}
