//! Cassandra-backed session storage
//!
//! Sessions live in a single table keyed by session key, with the serialized
//! payload in a blob column. All statements are prepared once and executed
//! at quorum consistency. Row expiry is delegated to Cassandra's per-write
//! TTL, so there is no cleanup job and nothing to sweep.
//!
//! Because the TTL is part of the insert statement text, each distinct TTL
//! value gets its own prepared insert, held in a small bounded cache.
//!
//! ## Example
//!
//! ```rust,no_run
//! use reinhardt_cassandra_sessions::backends::SessionBackend;
//! use reinhardt_cassandra_sessions::{CassandraSessionBackend, CassandraSessionSettings};
//! use serde_json::json;
//!
//! # async fn example() {
//! // Fails fast with the expected DDL if the table does not exist
//! let settings = CassandraSessionSettings::new();
//! let backend = CassandraSessionBackend::connect(settings).await.unwrap();
//!
//! let data = json!({"user_id": 42, "authenticated": true});
//! backend.save("k3n9x0q2w7f1m8p5", &data, Some(3600)).await.unwrap();
//!
//! let loaded: Option<serde_json::Value> = backend.load("k3n9x0q2w7f1m8p5").await.unwrap();
//! assert_eq!(loaded.unwrap()["user_id"], 42);
//! # }
//! # tokio::runtime::Runtime::new().unwrap().block_on(example());
//! ```

use async_trait::async_trait;
use scylla::client::session::Session as ScyllaSession;
use scylla::client::session_builder::SessionBuilder;
use scylla::statement::Consistency;
use scylla::statement::prepared::PreparedStatement;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::backends::SessionBackend;
use crate::error::SessionError;
use crate::serialization::SerializationFormat;
use crate::settings::CassandraSessionSettings;

/// Distinct TTL values kept as prepared inserts
const INSERT_CACHE_CAPACITY: usize = 8;

/// Bounded cache of prepared statements keyed by write TTL
///
/// TTLs come from configuration and take very few distinct values in
/// practice, so lookups are linear and eviction is oldest-first.
struct TtlStatementCache<S> {
	capacity: usize,
	entries: Vec<(Option<u64>, S)>,
}

impl<S: Clone> TtlStatementCache<S> {
	fn new(capacity: usize) -> Self {
		Self {
			capacity,
			entries: Vec::new(),
		}
	}

	fn get(&self, ttl: Option<u64>) -> Option<S> {
		self.entries
			.iter()
			.find(|(cached_ttl, _)| *cached_ttl == ttl)
			.map(|(_, statement)| statement.clone())
	}

	fn insert(&mut self, ttl: Option<u64>, statement: S) {
		if let Some(slot) = self
			.entries
			.iter_mut()
			.find(|(cached_ttl, _)| *cached_ttl == ttl)
		{
			slot.1 = statement;
			return;
		}

		if self.entries.len() == self.capacity {
			self.entries.remove(0);
		}
		self.entries.push((ttl, statement));
	}

	fn len(&self) -> usize {
		self.entries.len()
	}
}

fn load_cql(keyspace: &str, table: &str) -> String {
	format!(
		"SELECT session_data FROM {}.{} WHERE session_key = ?",
		keyspace, table
	)
}

fn delete_cql(keyspace: &str, table: &str) -> String {
	format!(
		"DELETE FROM {}.{} WHERE session_key = ?",
		keyspace, table
	)
}

fn insert_cql(keyspace: &str, table: &str, ttl: Option<u64>) -> String {
	match ttl {
		Some(seconds) => format!(
			"INSERT INTO {}.{} (session_key, session_data) VALUES (?, ?) USING TTL {}",
			keyspace, table, seconds
		),
		None => format!(
			"INSERT INTO {}.{} (session_key, session_data) VALUES (?, ?)",
			keyspace, table
		),
	}
}

/// Cassandra session backend
///
/// Holds a shared driver session (the process-wide connection pool) plus the
/// prepared load and delete statements. Cloning is cheap; clones share the
/// pool and the insert-statement cache.
///
/// Construction verifies the schema: if the load and delete statements
/// cannot be prepared, the table is missing and
/// [`SessionError::SchemaMissing`] reports the DDL to apply. A write TTL is
/// passed through to Cassandra as-is; `USING TTL 0` means no expiry.
#[derive(Clone)]
pub struct CassandraSessionBackend {
	session: Arc<ScyllaSession>,
	settings: CassandraSessionSettings,
	format: SerializationFormat,
	load_stmt: PreparedStatement,
	delete_stmt: PreparedStatement,
	insert_cache: Arc<Mutex<TtlStatementCache<PreparedStatement>>>,
}

// The driver session and prepared statements have no printable state;
// identify the backend by where it writes.
impl fmt::Debug for CassandraSessionBackend {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("CassandraSessionBackend")
			.field("keyspace", &self.settings.keyspace)
			.field("table", &self.settings.table)
			.field("format", &self.format)
			.finish_non_exhaustive()
	}
}

impl CassandraSessionBackend {
	/// Connect to the cluster and prepare the session statements
	///
	/// # Examples
	///
	/// ```rust,no_run
	/// use reinhardt_cassandra_sessions::{CassandraSessionBackend, CassandraSessionSettings};
	///
	/// # tokio_test::block_on(async {
	/// let settings = CassandraSessionSettings::new()
	///     .with_hosts(vec!["10.0.0.1".to_string()]);
	/// let backend = CassandraSessionBackend::connect(settings).await.unwrap();
	/// # });
	/// ```
	pub async fn connect(settings: CassandraSessionSettings) -> Result<Self, SessionError> {
		settings.validate()?;

		let session = SessionBuilder::new()
			.known_nodes(settings.contact_points())
			.build()
			.await
			.map_err(|e| SessionError::Backend(format!("Connection error: {}", e)))?;

		Self::from_session(Arc::new(session), settings).await
	}

	/// Create a backend from an existing driver session
	///
	/// Use this to share one driver session (and its connection pool) across
	/// several stores or with the rest of the application.
	///
	/// # Examples
	///
	/// ```rust,no_run
	/// use reinhardt_cassandra_sessions::{CassandraSessionBackend, CassandraSessionSettings};
	/// use scylla::client::session_builder::SessionBuilder;
	/// use std::sync::Arc;
	///
	/// # tokio_test::block_on(async {
	/// let session = SessionBuilder::new()
	///     .known_node("127.0.0.1:9042")
	///     .build()
	///     .await
	///     .unwrap();
	///
	/// let settings = CassandraSessionSettings::new();
	/// let backend = CassandraSessionBackend::from_session(Arc::new(session), settings)
	///     .await
	///     .unwrap();
	/// # });
	/// ```
	pub async fn from_session(
		session: Arc<ScyllaSession>,
		settings: CassandraSessionSettings,
	) -> Result<Self, SessionError> {
		settings.validate()?;

		let load_stmt = prepare_quorum(&session, load_cql(&settings.keyspace, &settings.table))
			.await
			.map_err(|reason| {
				SessionError::schema_missing(&settings.keyspace, &settings.table, reason)
			})?;

		let delete_stmt = prepare_quorum(&session, delete_cql(&settings.keyspace, &settings.table))
			.await
			.map_err(|reason| {
				SessionError::schema_missing(&settings.keyspace, &settings.table, reason)
			})?;

		tracing::info!(
			keyspace = %settings.keyspace,
			table = %settings.table,
			"session statements prepared at quorum"
		);

		Ok(Self {
			session,
			settings,
			format: SerializationFormat::default(),
			load_stmt,
			delete_stmt,
			insert_cache: Arc::new(Mutex::new(TtlStatementCache::new(INSERT_CACHE_CAPACITY))),
		})
	}

	/// Set the payload serialization format
	pub fn with_format(mut self, format: SerializationFormat) -> Self {
		self.format = format;
		self
	}

	/// Settings this backend was built with
	pub fn settings(&self) -> &CassandraSessionSettings {
		&self.settings
	}

	/// Prepared insert for the given TTL, from the cache or freshly prepared
	async fn insert_statement(&self, ttl: Option<u64>) -> Result<PreparedStatement, SessionError> {
		{
			let cache = self.insert_cache.lock().await;
			if let Some(statement) = cache.get(ttl) {
				return Ok(statement);
			}
		}

		// Prepare outside the lock; a concurrent miss for the same TTL just
		// prepares twice and both handles are valid.
		let cql = insert_cql(&self.settings.keyspace, &self.settings.table, ttl);
		let statement = prepare_quorum(&self.session, cql)
			.await
			.map_err(|reason| SessionError::Backend(format!("Failed to prepare insert: {}", reason)))?;

		let mut cache = self.insert_cache.lock().await;
		cache.insert(ttl, statement.clone());
		tracing::debug!(ttl = ?ttl, cached = cache.len(), "prepared session insert");
		Ok(statement)
	}

	/// Fetch the payload column for a key
	///
	/// Outer `None` means no row; inner `None` means the row exists but its
	/// payload column is null.
	async fn fetch_row(&self, session_key: &str) -> Result<Option<Option<Vec<u8>>>, SessionError> {
		let result = self
			.session
			.execute_unpaged(&self.load_stmt, (session_key,))
			.await
			.map_err(|e| SessionError::Backend(format!("Failed to load session: {}", e)))?;

		let rows = result
			.into_rows_result()
			.map_err(|e| SessionError::Backend(format!("Unexpected load result: {}", e)))?;

		let row = rows
			.maybe_first_row::<(Option<Vec<u8>>,)>()
			.map_err(|e| SessionError::Backend(format!("Malformed session row: {}", e)))?;

		Ok(row.map(|(payload,)| payload))
	}
}

async fn prepare_quorum(session: &ScyllaSession, cql: String) -> Result<PreparedStatement, String> {
	let mut statement = session.prepare(cql).await.map_err(|e| e.to_string())?;
	statement.set_consistency(Consistency::Quorum);
	Ok(statement)
}

#[async_trait]
impl SessionBackend for CassandraSessionBackend {
	async fn load<T>(&self, session_key: &str) -> Result<Option<T>, SessionError>
	where
		T: for<'de> Deserialize<'de> + Send,
	{
		match self.fetch_row(session_key).await? {
			Some(Some(payload)) => Ok(Some(self.format.deserialize(&payload)?)),
			Some(None) => {
				// A row with a null payload column reads as an empty mapping
				let empty = serde_json::from_slice(b"{}")
					.map_err(crate::serialization::SerializationError::from)?;
				Ok(Some(empty))
			}
			None => Ok(None),
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
		let statement = self.insert_statement(ttl).await?;

		self.session
			.execute_unpaged(&statement, (session_key, payload.as_slice()))
			.await
			.map_err(|e| SessionError::Backend(format!("Failed to save session: {}", e)))?;

		tracing::debug!(session_key = %session_key, ttl = ?ttl, "session saved");
		Ok(())
	}

	async fn delete(&self, session_key: &str) -> Result<(), SessionError> {
		self.session
			.execute_unpaged(&self.delete_stmt, (session_key,))
			.await
			.map_err(|e| SessionError::Backend(format!("Failed to delete session: {}", e)))?;

		tracing::debug!(session_key = %session_key, "session deleted");
		Ok(())
	}

	async fn exists(&self, session_key: &str) -> Result<bool, SessionError> {
		let row = self.fetch_row(session_key).await?;
		Ok(row.is_some())
	}
}
