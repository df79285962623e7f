//! JSON payload serializer

use serde::{Deserialize, Serialize};

use super::{SerializationError, Serializer};

/// JSON serializer (always available)
///
/// Human-readable payloads; the stored blob is plain UTF-8 JSON, which keeps
/// rows inspectable from `cqlsh`.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonSerializer;

impl Serializer for JsonSerializer {
	fn serialize<T: Serialize>(&self, data: &T) -> Result<Vec<u8>, SerializationError> {
		Ok(serde_json::to_vec(data)?)
	}

	fn deserialize<T: for<'de> Deserialize<'de>>(
		&self,
		bytes: &[u8],
	) -> Result<T, SerializationError> {
		Ok(serde_json::from_slice(bytes)?)
	}
}
