use crate::error::ProtocolError;
use serde::de::DeserializeOwned;
use serde::Serialize;

pub fn encode<T: Serialize>(message: &T) -> Result<String, ProtocolError> {
    Ok(serde_json::to_string(message)?)
}

/// Decode a message, dropping anything malformed or of an unknown kind
pub fn decode<T: DeserializeOwned>(raw: &str) -> Option<T> {
    match serde_json::from_str(raw) {
        Ok(message) => Some(message),
        Err(err) => {
            tracing::debug!(%err, len = raw.len(), "ignoring unrecognized message");
            None
        }
    }
}
