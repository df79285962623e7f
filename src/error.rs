//! Session storage errors

use thiserror::Error;

use crate::schema;
use crate::serialization::SerializationError;

/// Errors raised by session storage
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum SessionError {
	/// The session table could not be used at startup
	///
	/// Raised when preparing the session statements fails, which almost
	/// always means the keyspace or table has not been created yet. The
	/// message carries the DDL the operator has to apply.
	#[error(
		"Session table {keyspace}.{table} is not usable: {reason}\nCreate the schema first:\n{ddl}"
	)]
	SchemaMissing {
		keyspace: String,
		table: String,
		reason: String,
		ddl: String,
	},

	/// A `must_create` save found the session key already taken
	#[error("Session key already exists")]
	CreateConflict,

	/// Ran out of attempts to allocate an unused session key
	#[error(
		"Unable to create a new session key after {attempts} attempts. It is likely that the backend is unavailable."
	)]
	CreateExhausted { attempts: u32 },

	/// Storage or driver failure
	#[error("Backend error: {0}")]
	Backend(String),

	/// Session payload could not be encoded or decoded
	#[error("Serialization error: {0}")]
	Serialization(#[from] SerializationError),

	/// Invalid settings
	#[error("Configuration error: {0}")]
	Configuration(String),
}

impl SessionError {
	/// Build the fatal startup error for a missing or unreadable schema
	pub fn schema_missing(keyspace: &str, table: &str, reason: impl Into<String>) -> Self {
		Self::SchemaMissing {
			keyspace: keyspace.to_string(),
			table: table.to_string(),
			reason: reason.into(),
			ddl: schema::expected_ddl(keyspace, table),
		}
	}
}
