//! Session table schema
//!
//! The backend never creates schema on its own: starting up against a
//! missing table is a fatal configuration error whose message embeds the
//! expected DDL. [`create_schema`] exists for tests and development setups;
//! production schema is operator-managed.

#[cfg(feature = "cassandra")]
use scylla::client::session::Session as ScyllaSession;

#[cfg(feature = "cassandra")]
use crate::error::SessionError;
#[cfg(feature = "cassandra")]
use crate::settings::CassandraSessionSettings;

/// CQL creating the session keyspace with development replication settings
pub fn create_keyspace_cql(keyspace: &str) -> String {
	format!(
		"CREATE KEYSPACE IF NOT EXISTS {} WITH replication = {{'class': 'SimpleStrategy', 'replication_factor': 1}}",
		keyspace
	)
}

/// CQL creating the session table
pub fn create_table_cql(keyspace: &str, table: &str) -> String {
	format!(
		"CREATE TABLE IF NOT EXISTS {}.{} (session_key text, session_data blob, PRIMARY KEY (session_key))",
		keyspace, table
	)
}

/// Render the DDL an operator must apply before the backend can start
///
/// # Example
///
/// ```rust
/// use reinhardt_cassandra_sessions::schema::expected_ddl;
///
/// let ddl = expected_ddl("reinhardt_cassandra", "sessions");
/// assert!(ddl.contains("CREATE TABLE reinhardt_cassandra.sessions"));
/// ```
pub fn expected_ddl(keyspace: &str, table: &str) -> String {
	let mut ddl = format!(
		"CREATE KEYSPACE {} WITH replication = {{'class': 'SimpleStrategy', 'replication_factor': 1}};\n",
		keyspace
	);
	ddl.push_str(&format!("CREATE TABLE {}.{} (\n", keyspace, table));
	ddl.push_str("    session_key text,\n");
	ddl.push_str("    session_data blob,\n");
	ddl.push_str("    PRIMARY KEY (session_key)\n");
	ddl.push_str(");");
	ddl
}

/// Create the session keyspace and table if they do not exist
///
/// Intended for tests and development. Uses `SimpleStrategy` with a
/// replication factor of 1, which is not suitable for production clusters.
#[cfg(feature = "cassandra")]
pub async fn create_schema(
	session: &ScyllaSession,
	settings: &CassandraSessionSettings,
) -> Result<(), SessionError> {
	settings.validate()?;

	session
		.query_unpaged(create_keyspace_cql(&settings.keyspace), ())
		.await
		.map_err(|e| SessionError::Backend(format!("Failed to create keyspace: {}", e)))?;

	session
		.query_unpaged(create_table_cql(&settings.keyspace, &settings.table), ())
		.await
		.map_err(|e| SessionError::Backend(format!("Failed to create table: {}", e)))?;

	Ok(())
}
