//! Session payload serialization
//!
//! The session payload is stored as an opaque blob; the codec that produces
//! it is pluggable. JSON is the default and always available, MessagePack is
//! available behind the `messagepack` feature. Both backends run every
//! payload through the same configured format, so data written with one
//! format must be read with the same format.

use serde::{Deserialize, Serialize};
use thiserror::Error;

mod json;
pub use json::JsonSerializer;

#[cfg(feature = "messagepack")]
mod messagepack;
#[cfg(feature = "messagepack")]
pub use messagepack::MessagePackSerializer;

/// Serialization errors
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum SerializationError {
	/// JSON encode or decode error
	#[error("JSON error: {0}")]
	JsonError(#[from] serde_json::Error),

	/// MessagePack encode error
	#[cfg(feature = "messagepack")]
	#[error("MessagePack error: {0}")]
	MessagePackError(#[from] rmp_serde::encode::Error),

	/// MessagePack decode error
	#[cfg(feature = "messagepack")]
	#[error("MessagePack decode error: {0}")]
	MessagePackDecodeError(#[from] rmp_serde::decode::Error),
}

/// Codec turning session payloads into stored bytes and back
///
/// # Example
///
/// ```rust
/// use reinhardt_cassandra_sessions::serialization::{JsonSerializer, Serializer};
/// use std::collections::HashMap;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let mut payload = HashMap::new();
/// payload.insert("cat".to_string(), "dog".to_string());
///
/// let bytes = JsonSerializer.serialize(&payload)?;
/// let restored: HashMap<String, String> = JsonSerializer.deserialize(&bytes)?;
///
/// assert_eq!(restored["cat"], "dog");
/// # Ok(())
/// # }
/// # example().unwrap();
/// ```
pub trait Serializer: Send + Sync {
	/// Serialize a payload to bytes
	fn serialize<T: Serialize>(&self, data: &T) -> Result<Vec<u8>, SerializationError>;

	/// Deserialize a payload from bytes
	fn deserialize<T: for<'de> Deserialize<'de>>(
		&self,
		bytes: &[u8],
	) -> Result<T, SerializationError>;
}

/// Payload format configured on a backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SerializationFormat {
	/// JSON (always available)
	Json,
	/// MessagePack (requires the `messagepack` feature)
	#[cfg(feature = "messagepack")]
	MessagePack,
}

impl SerializationFormat {
	/// Format name as used in logs
	pub fn name(&self) -> &'static str {
		match self {
			SerializationFormat::Json => "json",
			#[cfg(feature = "messagepack")]
			SerializationFormat::MessagePack => "messagepack",
		}
	}

	/// Serialize a payload using this format
	pub fn serialize<T: Serialize>(&self, data: &T) -> Result<Vec<u8>, SerializationError> {
		match self {
			SerializationFormat::Json => JsonSerializer.serialize(data),
			#[cfg(feature = "messagepack")]
			SerializationFormat::MessagePack => MessagePackSerializer.serialize(data),
		}
	}

	/// Deserialize a payload using this format
	pub fn deserialize<T: for<'de> Deserialize<'de>>(
		&self,
		bytes: &[u8],
	) -> Result<T, SerializationError> {
		match self {
			SerializationFormat::Json => JsonSerializer.deserialize(bytes),
			#[cfg(feature = "messagepack")]
			SerializationFormat::MessagePack => MessagePackSerializer.deserialize(bytes),
		}
	}
}

impl Default for SerializationFormat {
	fn default() -> Self {
		Self::Json
	}
}
