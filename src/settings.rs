//! Configuration for Cassandra session storage
//!
//! Settings follow the framework convention: construct with defaults, adjust
//! through builders or public fields, or load from environment variables.
//! They are read once when a backend is constructed; there is no dynamic
//! reconfiguration.

use serde::{Deserialize, Serialize};

use crate::error::SessionError;

/// Default keyspace holding the session table
pub const DEFAULT_KEYSPACE: &str = "reinhardt_cassandra";

/// Default session table name
pub const DEFAULT_TABLE: &str = "sessions";

/// Default CQL native protocol port
pub const DEFAULT_PORT: u16 = 9042;

/// Default session lifetime in seconds (two weeks)
pub const DEFAULT_COOKIE_AGE: u64 = 1209600;

/// Cassandra session storage settings
///
/// # Example
///
/// ```rust
/// use reinhardt_cassandra_sessions::CassandraSessionSettings;
///
/// let settings = CassandraSessionSettings::new()
///     .with_hosts(vec!["10.0.0.1".to_string(), "10.0.0.2".to_string()])
///     .with_keyspace("myapp")
///     .with_cookie_age(3600);
///
/// assert_eq!(settings.table, "sessions");
/// assert_eq!(settings.contact_points(), vec!["10.0.0.1:9042", "10.0.0.2:9042"]);
/// ```
#[non_exhaustive]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CassandraSessionSettings {
	/// Cassandra contact points (host names or addresses, without port)
	pub hosts: Vec<String>,
	/// CQL native protocol port
	pub port: u16,
	/// Keyspace holding the session table
	pub keyspace: String,
	/// Session table name
	pub table: String,
	/// Session lifetime in seconds, applied as the TTL of every write
	pub cookie_age: u64,
}

impl Default for CassandraSessionSettings {
	fn default() -> Self {
		Self {
			hosts: vec!["127.0.0.1".to_string()],
			port: DEFAULT_PORT,
			keyspace: DEFAULT_KEYSPACE.to_string(),
			table: DEFAULT_TABLE.to_string(),
			cookie_age: DEFAULT_COOKIE_AGE,
		}
	}
}

impl CassandraSessionSettings {
	/// Create settings with defaults
	pub fn new() -> Self {
		Self::default()
	}

	/// Replace the contact point list
	pub fn with_hosts(mut self, hosts: Vec<String>) -> Self {
		self.hosts = hosts;
		self
	}

	/// Set the CQL native protocol port
	pub fn with_port(mut self, port: u16) -> Self {
		self.port = port;
		self
	}

	/// Set the keyspace holding the session table
	pub fn with_keyspace(mut self, keyspace: impl Into<String>) -> Self {
		self.keyspace = keyspace.into();
		self
	}

	/// Set the session table name
	pub fn with_table(mut self, table: impl Into<String>) -> Self {
		self.table = table.into();
		self
	}

	/// Set the session lifetime in seconds
	pub fn with_cookie_age(mut self, cookie_age: u64) -> Self {
		self.cookie_age = cookie_age;
		self
	}

	/// Contact points as `host:port` strings for the driver
	pub fn contact_points(&self) -> Vec<String> {
		self.hosts
			.iter()
			.map(|host| format!("{}:{}", host, self.port))
			.collect()
	}

	/// Validate settings
	///
	/// The keyspace and table names are spliced into CQL statement text, so
	/// they must be plain identifiers.
	pub fn validate(&self) -> Result<(), SessionError> {
		if self.hosts.is_empty() || self.hosts.iter().any(|host| host.trim().is_empty()) {
			return Err(SessionError::Configuration(
				"CASSANDRA_HOSTS must list at least one non-empty host".to_string(),
			));
		}

		if self.port == 0 {
			return Err(SessionError::Configuration(
				"CASSANDRA_PORT must be non-zero".to_string(),
			));
		}

		if !is_cql_identifier(&self.keyspace) {
			return Err(SessionError::Configuration(format!(
				"Keyspace {:?} is not a valid CQL identifier",
				self.keyspace
			)));
		}

		if !is_cql_identifier(&self.table) {
			return Err(SessionError::Configuration(format!(
				"Table {:?} is not a valid CQL identifier",
				self.table
			)));
		}

		Ok(())
	}

	/// Load settings from environment variables
	///
	/// Reads `CASSANDRA_HOSTS` (comma-separated), `CASSANDRA_PORT`,
	/// `CASSANDRA_SESSIONS_KEYSPACE`, `CASSANDRA_SESSIONS_TABLE`, and
	/// `SESSION_COOKIE_AGE`. Unset variables keep their defaults.
	pub fn from_env() -> Result<Self, SessionError> {
		let mut settings = Self::default();

		if let Ok(hosts) = std::env::var("CASSANDRA_HOSTS") {
			settings.hosts = hosts.split(',').map(|s| s.trim().to_string()).collect();
		}

		if let Ok(port) = std::env::var("CASSANDRA_PORT") {
			settings.port = port.parse().map_err(|_| {
				SessionError::Configuration(format!("CASSANDRA_PORT {:?} is not a valid port", port))
			})?;
		}

		if let Ok(keyspace) = std::env::var("CASSANDRA_SESSIONS_KEYSPACE") {
			settings.keyspace = keyspace;
		}

		if let Ok(table) = std::env::var("CASSANDRA_SESSIONS_TABLE") {
			settings.table = table;
		}

		if let Ok(age) = std::env::var("SESSION_COOKIE_AGE") {
			settings.cookie_age = age.parse().map_err(|_| {
				SessionError::Configuration(format!(
					"SESSION_COOKIE_AGE {:?} is not a valid number of seconds",
					age
				))
			})?;
		}

		settings.validate()?;
		Ok(settings)
	}
}

/// Whether `name` can be spliced into CQL text as an unquoted identifier
///
/// Unquoted CQL identifiers start with a letter; digits and underscores may
/// only follow one.
fn is_cql_identifier(name: &str) -> bool {
	let mut chars = name.chars();
	match chars.next() {
		Some(first) if first.is_ascii_alphabetic() => {}
		_ => return false,
	}
	chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
