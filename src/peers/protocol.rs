//! Peer-to-peer wire formats.
//!
//! A deployment picks one format for both the serving and the fetching side:
//! - [`WireFormat::Raw`]: the response body is the value itself
//! - [`WireFormat::Message`]: the body is a JSON [`FetchResponse`]

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::peers::TransportError;

pub const OCTET_STREAM: &str = "application/octet-stream";
pub const JSON: &str = "application/json";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WireFormat {
    #[default]
    Raw,
    Message,
}

/// A peer lookup; the transport places both fields in the request path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub group: String,
    pub key: String,
}

/// Structured response message carrying the value bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchResponse {
    pub value: Vec<u8>,
}

impl WireFormat {
    pub fn content_type(&self) -> &'static str {
        match self {
            WireFormat::Raw => OCTET_STREAM,
            WireFormat::Message => JSON,
        }
    }

    /// Encode a value into a response body.
    pub fn encode(&self, value: Bytes) -> Bytes {
        match self {
            WireFormat::Raw => value,
            WireFormat::Message => {
                let message = FetchResponse {
                    value: value.to_vec(),
                };
                // Serializing a struct of bytes into a Vec cannot fail.
                Bytes::from(serde_json::to_vec(&message).unwrap_or_default())
            }
        }
    }

    /// Decode a response body back into the value bytes.
    pub fn decode(&self, body: Bytes) -> Result<Bytes, TransportError> {
        match self {
            WireFormat::Raw => Ok(body),
            WireFormat::Message => serde_json::from_slice::<FetchResponse>(&body)
                .map(|message| Bytes::from(message.value))
                .map_err(|e| TransportError::Decode(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_passes_bytes_through() {
        let body = WireFormat::Raw.encode(Bytes::from_static(b"630"));
        assert_eq!(&body[..], b"630");
        assert_eq!(WireFormat::Raw.content_type(), OCTET_STREAM);
    }

    #[test]
    fn test_message_wraps_value() {
        let body = WireFormat::Message.encode(Bytes::from_static(b"630"));
        let message: FetchResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(message.value, b"630");
        assert_eq!(WireFormat::Message.decode(body).unwrap(), Bytes::from_static(b"630"));
    }

    #[test]
    fn test_message_rejects_garbage() {
        let err = WireFormat::Message
            .decode(Bytes::from_static(b"not json"))
            .unwrap_err();
        assert!(matches!(err, TransportError::Decode(_)));
    }

    #[test]
    fn test_wire_format_config_names() {
        let format: WireFormat = serde_json::from_str("\"message\"").unwrap();
        assert_eq!(format, WireFormat::Message);
        assert_eq!(WireFormat::default(), WireFormat::Raw);
    }
}
