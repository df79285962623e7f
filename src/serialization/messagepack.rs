//! MessagePack payload serializer

use serde::{Deserialize, Serialize};

use super::{SerializationError, Serializer};

/// MessagePack serializer (feature: `messagepack`)
///
/// Compact binary payloads. Struct fields are encoded with their names so
/// payloads survive field reordering, matching serde_json semantics.
#[derive(Debug, Clone, Copy, Default)]
pub struct MessagePackSerializer;

impl Serializer for MessagePackSerializer {
	fn serialize<T: Serialize>(&self, data: &T) -> Result<Vec<u8>, SerializationError> {
		Ok(rmp_serde::to_vec_named(data)?)
	}

	fn deserialize<T: for<'de> Deserialize<'de>>(
		&self,
		bytes: &[u8],
	) -> Result<T, SerializationError> {
		Ok(rmp_serde::from_slice(bytes)?)
	}
}
