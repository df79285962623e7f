//! Session storage backends
//!
//! A backend is the storage seam of the session store: it persists opaque
//! payloads under session keys with an optional TTL. The [`Session`]
//! object drives the session lifecycle on top of whichever backend it is
//! given.
//!
//! [`Session`]: crate::session::Session

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::SessionError;

#[cfg(feature = "cassandra")]
pub mod cassandra;
pub mod memory;

#[cfg(feature = "cassandra")]
pub use cassandra::CassandraSessionBackend;
pub use memory::InMemorySessionBackend;

/// Session storage backend
///
/// Implementations must treat an absent row and an expired row identically:
/// both read as `None` from [`load`](SessionBackend::load) and `false` from
/// [`exists`](SessionBackend::exists). Deleting an absent key is not an
/// error.
#[async_trait]
pub trait SessionBackend: Send + Sync + Clone {
	/// Load the payload stored under a session key
	async fn load<T>(&self, session_key: &str) -> Result<Option<T>, SessionError>
	where
		T: for<'de> Deserialize<'de> + Send;

	/// Store a payload under a session key with an optional TTL (in seconds)
	///
	/// `None` and `Some(0)` both store the row without expiry: a zero TTL
	/// follows CQL `USING TTL 0`, which writes a non-expiring row rather
	/// than an instantly expired one.
	async fn save<T>(
		&self,
		session_key: &str,
		data: &T,
		ttl: Option<u64>,
	) -> Result<(), SessionError>
	where
		T: Serialize + Send + Sync;

	/// Delete the row stored under a session key
	async fn delete(&self, session_key: &str) -> Result<(), SessionError>;

	/// Whether a row exists under a session key
	///
	/// A row with an empty or null payload still counts as existing.
	async fn exists(&self, session_key: &str) -> Result<bool, SessionError>;
}
