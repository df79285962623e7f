//! In-memory session backend
//!
//! Keeps sessions in a process-local map with the same TTL semantics as the
//! Cassandra backend. Sessions are lost on restart; intended for tests and
//! development.
//!
//! ## Example
//!
//! ```rust
//! use reinhardt_cassandra_sessions::backends::{InMemorySessionBackend, SessionBackend};
//! use serde_json::json;
//!
//! # tokio_test::block_on(async {
//! let backend = InMemorySessionBackend::new();
//!
//! let data = json!({"user_id": 42, "theme": "dark"});
//! backend.save("k3n9x0q2", &data, Some(3600)).await.unwrap();
//!
//! let loaded: Option<serde_json::Value> = backend.load("k3n9x0q2").await.unwrap();
//! assert_eq!(loaded.unwrap()["user_id"], 42);
//! # });
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tokio::sync::RwLock;

use crate::backends::SessionBackend;
use crate::error::SessionError;
use crate::serialization::SerializationFormat;

/// Stored payload with expiry
#[derive(Debug, Clone)]
struct StoredSession {
	data: Vec<u8>,
	expires_at: Option<SystemTime>,
}

impl StoredSession {
	fn new(data: Vec<u8>, ttl: Option<u64>) -> Self {
		// A zero TTL stores without expiry, like CQL `USING TTL 0`. A TTL too
		// large to represent as an expiry instant also stores without expiry.
		let expires_at = ttl
			.filter(|&seconds| seconds > 0)
			.and_then(|seconds| SystemTime::now().checked_add(Duration::from_secs(seconds)));
		Self { data, expires_at }
	}

	fn is_expired(&self) -> bool {
		match self.expires_at {
			Some(expires_at) => SystemTime::now() > expires_at,
			None => false,
		}
	}
}

/// In-memory session backend
///
/// Payloads go through the configured serialization format exactly as they
/// would on the way to Cassandra, so serialization problems surface in tests
/// too.
#[derive(Clone)]
pub struct InMemorySessionBackend {
	store: Arc<RwLock<HashMap<String, StoredSession>>>,
	format: SerializationFormat,
}

impl InMemorySessionBackend {
	/// Create an empty in-memory backend
	pub fn new() -> Self {
		Self {
			store: Arc::new(RwLock::new(HashMap::new())),
			format: SerializationFormat::default(),
		}
	}

	/// Set the payload serialization format
	pub fn with_format(mut self, format: SerializationFormat) -> Self {
		self.format = format;
		self
	}

	/// Drop entries whose TTL has elapsed
	///
	/// Expired entries already read as absent; this reclaims their memory.
	pub async fn purge_expired(&self) {
		let mut store = self.store.write().await;
		store.retain(|_, entry| !entry.is_expired());
	}

	/// Number of stored sessions, including expired ones not yet purged
	pub async fn session_count(&self) -> usize {
		let store = self.store.read().await;
		store.len()
	}
}

impl Default for InMemorySessionBackend {
	fn default() -> Self {
		Self::new()
	}
}

#[async_trait]
impl SessionBackend for InMemorySessionBackend {
	async fn load<T>(&self, session_key: &str) -> Result<Option<T>, SessionError>
	where
		T: for<'de> Deserialize<'de> + Send,
	{
		let store = self.store.read().await;

		match store.get(session_key) {
			Some(entry) if !entry.is_expired() => {
				let data = self.format.deserialize(&entry.data)?;
				Ok(Some(data))
			}
			_ => Ok(None),
		}
	}

	async fn save<T>(
		&self,
		session_key: &str,
		data: &T,
		ttl: Option<u64>,
	) -> Result<(), SessionError>
	where
		T: Serialize + Send + Sync,
	{
		let payload = self.format.serialize(data)?;
		let entry = StoredSession::new(payload, ttl);

		let mut store = self.store.write().await;
		store.insert(session_key.to_string(), entry);
		Ok(())
	}

	async fn delete(&self, session_key: &str) -> Result<(), SessionError> {
		let mut store = self.store.write().await;
		store.remove(session_key);
		Ok(())
	}

	async fn exists(&self, session_key: &str) -> Result<bool, SessionError> {
		let store = self.store.read().await;

		match store.get(session_key) {
			Some(entry) => Ok(!entry.is_expired()),
			None => Ok(false),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	#[tokio::test]
	async fn test_save_load_delete_roundtrip() {
		let backend = InMemorySessionBackend::new();
		let data = json!({"cat": "dog"});

		backend.save("key1", &data, None).await.unwrap();
		let loaded: Option<serde_json::Value> = backend.load("key1").await.unwrap();
		assert_eq!(loaded, Some(data));

		backend.delete("key1").await.unwrap();
		let loaded: Option<serde_json::Value> = backend.load("key1").await.unwrap();
		assert_eq!(loaded, None);
	}

	#[tokio::test]
	async fn test_load_missing_key_is_none() {
		let backend = InMemorySessionBackend::new();

		let loaded: Option<serde_json::Value> = backend.load("missing").await.unwrap();
		assert!(loaded.is_none());
		assert!(!backend.exists("missing").await.unwrap());
	}

	#[tokio::test]
	async fn test_delete_missing_key_is_ok() {
		let backend = InMemorySessionBackend::new();

		backend.delete("missing").await.unwrap();
	}

	#[tokio::test]
	async fn test_expired_entry_reads_as_absent() {
		let backend = InMemorySessionBackend::new();
		let data = json!({"cat": "dog"});

		backend.save("key1", &data, Some(1)).await.unwrap();
		tokio::time::sleep(Duration::from_millis(1100)).await;

		let loaded: Option<serde_json::Value> = backend.load("key1").await.unwrap();
		assert_eq!(loaded, None);
		assert!(!backend.exists("key1").await.unwrap());
	}

	#[tokio::test]
	async fn test_zero_ttl_stores_without_expiry() {
		let backend = InMemorySessionBackend::new();
		let data = json!({"cat": "dog"});

		backend.save("key1", &data, Some(0)).await.unwrap();
		tokio::time::sleep(Duration::from_millis(50)).await;

		assert!(backend.exists("key1").await.unwrap());
		let loaded: Option<serde_json::Value> = backend.load("key1").await.unwrap();
		assert_eq!(loaded, Some(data));
	}

	#[tokio::test]
	async fn test_huge_ttl_is_stored_without_expiry() {
		let backend = InMemorySessionBackend::new();
		let data = json!({"cat": "dog"});

		backend.save("key1", &data, Some(u64::MAX)).await.unwrap();

		assert!(backend.exists("key1").await.unwrap());
		let loaded: Option<serde_json::Value> = backend.load("key1").await.unwrap();
		assert_eq!(loaded, Some(data));
	}

	#[tokio::test]
	async fn test_entry_without_ttl_does_not_expire() {
		let backend = InMemorySessionBackend::new();
		let data = json!({"cat": "dog"});

		backend.save("key1", &data, None).await.unwrap();
		tokio::time::sleep(Duration::from_millis(50)).await;

		assert!(backend.exists("key1").await.unwrap());
	}

	#[tokio::test]
	async fn test_save_overwrites_existing_payload() {
		let backend = InMemorySessionBackend::new();

		backend.save("key1", &json!({"cat": "dog"}), None).await.unwrap();
		backend.save("key1", &json!({"cat": "mouse"}), None).await.unwrap();

		let loaded: Option<serde_json::Value> = backend.load("key1").await.unwrap();
		assert_eq!(loaded.unwrap()["cat"], "mouse");
	}

	#[tokio::test]
	async fn test_purge_expired_reclaims_entries() {
		let backend = InMemorySessionBackend::new();

		backend.save("stale", &json!({}), Some(1)).await.unwrap();
		backend.save("fresh", &json!({}), None).await.unwrap();
		tokio::time::sleep(Duration::from_millis(1100)).await;

		assert_eq!(backend.session_count().await, 2);
		backend.purge_expired().await;
		assert_eq!(backend.session_count().await, 1);
		assert!(backend.exists("fresh").await.unwrap());
	}

	#[tokio::test]
	async fn test_clones_share_storage() {
		let backend = InMemorySessionBackend::new();
		let clone = backend.clone();

		backend.save("shared", &json!({"a": 1}), None).await.unwrap();

		assert!(clone.exists("shared").await.unwrap());
	}
}
