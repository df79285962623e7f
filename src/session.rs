//! Session object driving the storage lifecycle
//!
//! A [`Session`] pairs an in-memory key/value mapping with a storage
//! backend. Reads and writes against the mapping are synchronous and
//! tracked through the `accessed` and `modified` flags; talking to storage
//! is explicit through [`load`](Session::load), [`save`](Session::save),
//! [`cycle_key`](Session::cycle_key), and friends.
//!
//! The lifecycle follows the classic web-framework contract: loading an
//! unknown key lazily creates a fresh session, and creation retries with new
//! keys until it finds an unused one.
//!
//! ## Example
//!
//! ```rust
//! use reinhardt_cassandra_sessions::{InMemorySessionBackend, Session};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let backend = InMemorySessionBackend::new();
//! let mut session = Session::new(backend.clone());
//!
//! session.set("cat", "dog")?;
//! session.save(false).await?;
//!
//! // Resume the session from its key, as the next request would
//! let key = session.session_key().unwrap().to_string();
//! let mut resumed = Session::with_session_key(backend, key);
//! resumed.load().await?;
//! assert_eq!(resumed.get::<String>("cat")?, Some("dog".to_string()));
//! # Ok(())
//! # }
//! # tokio::runtime::Runtime::new().unwrap().block_on(example()).unwrap();
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

use crate::backends::SessionBackend;
use crate::error::SessionError;
use crate::key::{RandomKeyGenerator, SessionKeyGenerator, is_valid_session_key};
use crate::serialization::SerializationError;
use crate::settings::{CassandraSessionSettings, DEFAULT_COOKIE_AGE};

/// Session payload: string keys mapped to JSON values
pub type SessionMap = HashMap<String, Value>;

/// Attempts to allocate an unused session key before giving up
const CREATE_ATTEMPTS: u32 = 100;

/// A session bound to a storage backend
///
/// Generic over the backend, so the same lifecycle runs against Cassandra in
/// production and the in-memory backend in tests.
pub struct Session<B: SessionBackend> {
	backend: B,
	session_key: Option<String>,
	data: SessionMap,
	key_generator: Arc<dyn SessionKeyGenerator>,
	ttl: u64,
	accessed: bool,
	modified: bool,
}

impl<B: SessionBackend> Session<B> {
	/// Create a session with no key yet
	///
	/// A key is generated on first use and persisted on the first save.
	pub fn new(backend: B) -> Self {
		Self {
			backend,
			session_key: None,
			data: SessionMap::new(),
			key_generator: Arc::new(RandomKeyGenerator),
			ttl: DEFAULT_COOKIE_AGE,
			accessed: false,
			modified: false,
		}
	}

	/// Create a session bound to an existing key, typically from a cookie
	///
	/// Keys that do not look like session keys are discarded, so the session
	/// falls back to lazy creation instead of querying storage with garbage.
	pub fn with_session_key(backend: B, session_key: impl Into<String>) -> Self {
		let session_key = session_key.into();
		let mut session = Self::new(backend);
		if is_valid_session_key(&session_key) {
			session.session_key = Some(session_key);
		}
		session
	}

	/// Create a session configured from settings
	pub fn from_settings(backend: B, settings: &CassandraSessionSettings) -> Self {
		Self::new(backend).with_ttl(settings.cookie_age)
	}

	/// Set the session lifetime in seconds, applied as the TTL of every save
	pub fn with_ttl(mut self, ttl: u64) -> Self {
		self.ttl = ttl;
		self
	}

	/// Replace the session key generator
	pub fn with_key_generator(mut self, generator: Arc<dyn SessionKeyGenerator>) -> Self {
		self.key_generator = generator;
		self
	}

	/// Current session key, if one is bound
	pub fn session_key(&self) -> Option<&str> {
		self.session_key.as_deref()
	}

	/// Current session key, generating one if none is bound yet
	///
	/// Generating a key does not persist anything; the key reaches storage
	/// on the next save.
	pub fn get_or_create_key(&mut self) -> &str {
		let generator = &self.key_generator;
		self.session_key.get_or_insert_with(|| generator.generate())
	}

	/// Session lifetime in seconds
	pub fn ttl(&self) -> u64 {
		self.ttl
	}

	/// Whether the session data has been read or written
	pub fn accessed(&self) -> bool {
		self.accessed
	}

	/// Whether the session data has been changed
	pub fn modified(&self) -> bool {
		self.modified
	}

	/// Read a value from the session
	pub fn get<T>(&mut self, key: &str) -> Result<Option<T>, SessionError>
	where
		T: for<'de> Deserialize<'de>,
	{
		self.accessed = true;
		match self.data.get(key) {
			Some(value) => {
				let value =
					serde_json::from_value(value.clone()).map_err(SerializationError::from)?;
				Ok(Some(value))
			}
			None => Ok(None),
		}
	}

	/// Write a value into the session
	pub fn set<T: Serialize>(
		&mut self,
		key: impl Into<String>,
		value: T,
	) -> Result<(), SessionError> {
		let value = serde_json::to_value(value).map_err(SerializationError::from)?;
		self.data.insert(key.into(), value);
		self.accessed = true;
		self.modified = true;
		Ok(())
	}

	/// Remove a value from the session, returning it
	///
	/// Marks the session modified only if the key was present.
	pub fn remove<T>(&mut self, key: &str) -> Result<Option<T>, SessionError>
	where
		T: for<'de> Deserialize<'de>,
	{
		self.accessed = true;
		match self.data.remove(key) {
			Some(value) => {
				self.modified = true;
				let value = serde_json::from_value(value).map_err(SerializationError::from)?;
				Ok(Some(value))
			}
			None => Ok(None),
		}
	}

	/// Whether a key is present in the session data
	pub fn contains_key(&self, key: &str) -> bool {
		self.data.contains_key(key)
	}

	/// Keys currently present in the session data
	pub fn keys(&self) -> Vec<&str> {
		self.data.keys().map(String::as_str).collect()
	}

	/// The session data as a map
	pub fn data(&self) -> &SessionMap {
		&self.data
	}

	/// Number of entries in the session data
	pub fn len(&self) -> usize {
		self.data.len()
	}

	/// Whether the session data is empty
	pub fn is_empty(&self) -> bool {
		self.data.is_empty()
	}

	/// Remove all session data without touching storage
	pub fn clear(&mut self) {
		self.data.clear();
		self.accessed = true;
		self.modified = true;
	}

	/// Load the session data from storage
	///
	/// When no row exists under the session key, a fresh empty session is
	/// created instead (under a newly allocated key), so loading never fails
	/// just because a key is unknown. Returns the resulting data.
	pub async fn load(&mut self) -> Result<SessionMap, SessionError> {
		let key = self.get_or_create_key().to_string();
		let loaded: Option<SessionMap> = self.backend.load(&key).await?;
		self.accessed = true;

		match loaded {
			Some(data) => {
				self.data = data;
			}
			None => {
				// Unknown key: start over with a fresh empty session
				self.data.clear();
				self.create().await?;
			}
		}

		Ok(self.data.clone())
	}

	/// Persist the session under a freshly allocated, unused key
	///
	/// Generates candidate keys until one is not already taken, up to 100
	/// attempts. Running out of attempts means the keyspace is saturated or,
	/// far more likely, the backend is misbehaving; that is fatal.
	pub async fn create(&mut self) -> Result<(), SessionError> {
		for _ in 0..CREATE_ATTEMPTS {
			let key = self.key_generator.generate();
			match self.write(&key, true).await {
				Ok(()) => {
					self.session_key = Some(key);
					self.modified = true;
					return Ok(());
				}
				Err(SessionError::CreateConflict) => {
					tracing::debug!("session key collision, retrying with a new key");
					continue;
				}
				Err(e) => return Err(e),
			}
		}

		tracing::warn!(
			attempts = CREATE_ATTEMPTS,
			"exhausted attempts to allocate a session key"
		);
		Err(SessionError::CreateExhausted {
			attempts: CREATE_ATTEMPTS,
		})
	}

	/// Persist the session data under the current key
	///
	/// A session without a key yet is routed through [`create`](Self::create)
	/// instead, so its first write gets collision detection.
	///
	/// With `must_create`, the save fails with
	/// [`SessionError::CreateConflict`] when the key is already taken and
	/// leaves the existing row untouched. The existence check and the write
	/// are two separate round trips, not a compare-and-set.
	pub async fn save(&mut self, must_create: bool) -> Result<(), SessionError> {
		match self.session_key.clone() {
			Some(key) => self.write(&key, must_create).await,
			None => self.create().await,
		}
	}

	/// Write the session data under `key`, optionally refusing taken keys
	async fn write(&mut self, key: &str, must_create: bool) -> Result<(), SessionError> {
		if must_create && self.backend.exists(key).await? {
			return Err(SessionError::CreateConflict);
		}

		self.backend.save(key, &self.data, Some(self.ttl)).await
	}

	/// Whether a row exists under the given key
	pub async fn exists(&self, session_key: &str) -> Result<bool, SessionError> {
		self.backend.exists(session_key).await
	}

	/// Delete a session row
	///
	/// With `None`, deletes the current session's row; if no key is bound,
	/// this is a no-op. Deleting an absent key is not an error.
	pub async fn delete(&self, session_key: Option<&str>) -> Result<(), SessionError> {
		let key = match session_key {
			Some(key) => key,
			None => match self.session_key.as_deref() {
				Some(key) => key,
				None => return Ok(()),
			},
		};

		self.backend.delete(key).await
	}

	/// Move the session to a freshly allocated key, keeping its data
	///
	/// The data is re-saved under the new key and the old row is deleted.
	///
	/// # Example
	///
	/// ```rust
	/// use reinhardt_cassandra_sessions::{InMemorySessionBackend, Session};
	///
	/// # tokio_test::block_on(async {
	/// let mut session = Session::new(InMemorySessionBackend::new());
	/// session.set("user_id", 42).unwrap();
	/// let old_key = session.get_or_create_key().to_string();
	///
	/// session.cycle_key().await.unwrap();
	///
	/// assert_ne!(session.session_key(), Some(old_key.as_str()));
	/// assert_eq!(session.get::<i32>("user_id").unwrap(), Some(42));
	/// # });
	/// ```
	pub async fn cycle_key(&mut self) -> Result<(), SessionError> {
		let old_key = self.session_key.take();
		let data = std::mem::take(&mut self.data);

		self.create().await?;
		self.data = data;
		self.save(false).await?;

		if let Some(old_key) = old_key {
			self.backend.delete(&old_key).await?;
		}

		tracing::debug!("session key cycled");
		Ok(())
	}

	/// Delete the session row and reset to a blank, keyless session
	pub async fn flush(&mut self) -> Result<(), SessionError> {
		self.clear();
		self.delete(None).await?;
		self.session_key = None;
		Ok(())
	}

	/// Remove expired sessions from storage
	///
	/// Expiry is handled by the storage TTL applied on every write, so there
	/// is never anything to sweep. The method exists to satisfy the session
	/// engine contract and always succeeds.
	pub fn clear_expired() {}
}
