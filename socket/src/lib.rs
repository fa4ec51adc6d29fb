//! Broadcast message model for the cross-client negotiation channel.
//!
//! Every session emits and listens on one event name. Payloads are small
//! JSON objects discriminated by `type`. `negotiationUpdate` carries no data:
//! receivers re-read the shared document from settings storage instead of
//! applying a diff.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Event name the module emits and listens on.
pub const DEFAULT_EVENT: &str = "module.draw-steel-plus";

const KNOWN_TYPES: [&str; 2] = ["negotiationVisibility", "negotiationUpdate"];

/// Error returned by [`decode`] and [`decode_text`].
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// The payload is not valid JSON, or a known type with the wrong fields.
    #[error("malformed socket payload: {0}")]
    Malformed(#[from] serde_json::Error),
    /// The payload has no `type` field.
    #[error("socket payload has no type")]
    MissingType,
    /// The `type` is not one this module understands.
    #[error("unknown socket message type: {0}")]
    UnknownType(String),
}

/// One broadcast on the module channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SocketMessage {
    /// Show or hide the negotiation tracker on every client.
    #[serde(rename = "negotiationVisibility")]
    NegotiationVisibility { visible: bool },
    /// The shared negotiation document changed; re-read and re-render.
    #[serde(rename = "negotiationUpdate")]
    NegotiationUpdate,
}

impl SocketMessage {
    /// The `type` discriminator, for logging.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NegotiationVisibility { .. } => "negotiationVisibility",
            Self::NegotiationUpdate => "negotiationUpdate",
        }
    }
}

/// Encode a message as the JSON value handed to the host socket.
#[must_use]
pub fn encode(message: &SocketMessage) -> Value {
    match message {
        SocketMessage::NegotiationVisibility { visible } => {
            serde_json::json!({ "type": "negotiationVisibility", "visible": visible })
        }
        SocketMessage::NegotiationUpdate => serde_json::json!({ "type": "negotiationUpdate" }),
    }
}

/// Decode a payload received from the host socket.
///
/// # Errors
///
/// Returns [`CodecError::MissingType`] or [`CodecError::UnknownType`] for
/// payloads that belong to nobody here (other code may share the event), and
/// [`CodecError::Malformed`] for known types with bad fields.
pub fn decode(value: &Value) -> Result<SocketMessage, CodecError> {
    let kind = value.get("type").and_then(Value::as_str).ok_or(CodecError::MissingType)?;
    if !KNOWN_TYPES.contains(&kind) {
        return Err(CodecError::UnknownType(kind.to_owned()));
    }
    Ok(SocketMessage::deserialize(value)?)
}

/// Decode JSON text.
///
/// # Errors
///
/// See [`decode`].
pub fn decode_text(text: &str) -> Result<SocketMessage, CodecError> {
    let value: Value = serde_json::from_str(text)?;
    decode(&value)
}
