//! Integration tests for the Cassandra session backend
//!
//! This test file verifies the integration between:
//! - The Cassandra backend (prepared statements, TTL writes)
//! - Schema verification and DDL reporting
//! - Cassandra-native TTL expiry
//! - The Session lifecycle running against real storage
//!
//! ## Testing Strategy
//!
//! These tests need a reachable Cassandra (or ScyllaDB) node and are marked
//! `#[ignore]`, so the default test run stays self-contained. Point
//! `CASSANDRA_TEST_NODE` at a node (default `127.0.0.1:9042`) and run:
//!
//! ```text
//! cargo test --test cassandra_backend_integration -- --ignored
//! ```
//!
//! Every test works in the `reinhardt_sessions_test` keyspace and creates
//! its own uniquely named table, so runs do not interfere with each other
//! or with leftovers from earlier runs.

#![cfg(feature = "cassandra")]

use reinhardt_cassandra_sessions::{
	CassandraSessionBackend, CassandraSessionSettings, Session, SessionBackend, SessionError,
	SessionMap, schema,
};
#[cfg(feature = "messagepack")]
use reinhardt_cassandra_sessions::SerializationFormat;
use scylla::client::session::Session as ScyllaSession;
use scylla::client::session_builder::SessionBuilder;
use serde_json::json;
use serial_test::serial;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

// ========================================
// Test Helpers
// ========================================

fn node() -> String {
	std::env::var("CASSANDRA_TEST_NODE").unwrap_or_else(|_| "127.0.0.1:9042".to_string())
}

fn test_settings(table: &str) -> CassandraSessionSettings {
	let node = node();
	let (host, port) = node
		.rsplit_once(':')
		.expect("CASSANDRA_TEST_NODE must be host:port");

	CassandraSessionSettings::new()
		.with_hosts(vec![host.to_string()])
		.with_port(port.parse().expect("Invalid port in CASSANDRA_TEST_NODE"))
		.with_keyspace("reinhardt_sessions_test")
		.with_table(table)
}

fn unique_table() -> String {
	format!("sessions_{}", Uuid::new_v4().simple())
}

/// Connect, create the schema, and build a backend on a shared driver session
async fn prepared_backend(
	settings: &CassandraSessionSettings,
) -> (Arc<ScyllaSession>, CassandraSessionBackend) {
	let session = SessionBuilder::new()
		.known_nodes(settings.contact_points())
		.build()
		.await
		.expect("Failed to connect to Cassandra");
	let session = Arc::new(session);

	schema::create_schema(&session, settings)
		.await
		.expect("Failed to create schema");

	let backend = CassandraSessionBackend::from_session(session.clone(), settings.clone())
		.await
		.expect("Failed to build backend");

	(session, backend)
}

// ========================================
// Schema Verification
// ========================================

/// Test Intent: Verify connecting without the schema fails with the DDL to run
/// Integration Point: Statement preparation ↔ SessionError::SchemaMissing
#[tokio::test]
#[serial(cassandra_live)]
#[ignore = "requires a running Cassandra node"]
async fn test_connect_reports_missing_schema() {
	let missing_keyspace = format!("missing_{}", Uuid::new_v4().simple());
	let settings = test_settings("sessions").with_keyspace(missing_keyspace.clone());

	let err = CassandraSessionBackend::connect(settings)
		.await
		.expect_err("Connect should fail without the schema");

	match &err {
		SessionError::SchemaMissing { keyspace, ddl, .. } => {
			assert_eq!(keyspace, &missing_keyspace);
			assert!(ddl.contains("CREATE TABLE"));
			assert!(ddl.contains(&missing_keyspace));
		}
		other => panic!("Expected SchemaMissing, got {other:?}"),
	}
	assert!(err.to_string().contains("Create the schema first"));
}

// ========================================
// Backend Operations
// ========================================

/// Test Intent: Verify the save/load/exists/delete round trip against Cassandra
/// Integration Point: Prepared statements ↔ Cassandra storage ↔ JSON payloads
#[tokio::test]
#[serial(cassandra_live)]
#[ignore = "requires a running Cassandra node"]
async fn test_save_load_exists_delete_roundtrip() {
	let settings = test_settings(&unique_table());
	let (_session, backend) = prepared_backend(&settings).await;

	assert_eq!(backend.settings().keyspace, settings.keyspace);
	assert_eq!(backend.settings().table, settings.table);

	let mut data = SessionMap::new();
	data.insert("cat".to_string(), json!("dog"));

	backend
		.save("cassandrakey01", &data, None)
		.await
		.expect("Failed to save session");

	let loaded: Option<SessionMap> = backend
		.load("cassandrakey01")
		.await
		.expect("Failed to load session");
	assert_eq!(loaded, Some(data));
	assert!(
		backend
			.exists("cassandrakey01")
			.await
			.expect("Failed to check key")
	);

	backend
		.delete("cassandrakey01")
		.await
		.expect("Failed to delete session");

	let loaded: Option<SessionMap> = backend
		.load("cassandrakey01")
		.await
		.expect("Failed to load after delete");
	assert_eq!(loaded, None);
	assert!(
		!backend
			.exists("cassandrakey01")
			.await
			.expect("Failed to check deleted key")
	);
}

/// Test Intent: Verify a row with a null payload column reads as an empty mapping
/// Integration Point: Null column handling ↔ Payload deserialization
#[tokio::test]
#[serial(cassandra_live)]
#[ignore = "requires a running Cassandra node"]
async fn test_null_payload_reads_as_empty_mapping() {
	let settings = test_settings(&unique_table());
	let (session, backend) = prepared_backend(&settings).await;

	// Insert a row with no payload, leaving session_data null
	let cql = format!(
		"INSERT INTO {}.{} (session_key) VALUES (?)",
		settings.keyspace, settings.table
	);
	session
		.query_unpaged(cql, ("nullrow000001",))
		.await
		.expect("Failed to insert null-payload row");

	let loaded: Option<SessionMap> = backend
		.load("nullrow000001")
		.await
		.expect("Failed to load null-payload row");
	assert_eq!(loaded, Some(SessionMap::new()));
	assert!(
		backend
			.exists("nullrow000001")
			.await
			.expect("Failed to check null-payload row")
	);
}

/// Test Intent: Verify Cassandra expires rows written with a TTL
/// Integration Point: USING TTL writes ↔ Cassandra-native expiry
#[tokio::test]
#[serial(cassandra_live)]
#[ignore = "requires a running Cassandra node"]
async fn test_ttl_expires_rows() {
	let settings = test_settings(&unique_table());
	let (_session, backend) = prepared_backend(&settings).await;

	let mut data = SessionMap::new();
	data.insert("cat".to_string(), json!("dog"));

	backend
		.save("expiringkey01", &data, Some(1))
		.await
		.expect("Failed to save session with TTL");
	assert!(
		backend
			.exists("expiringkey01")
			.await
			.expect("Failed to check fresh key")
	);

	tokio::time::sleep(Duration::from_secs(2)).await;

	let loaded: Option<SessionMap> = backend
		.load("expiringkey01")
		.await
		.expect("Failed to load expired key");
	assert_eq!(loaded, None);
	assert!(
		!backend
			.exists("expiringkey01")
			.await
			.expect("Failed to check expired key")
	);
}

/// Test Intent: Verify MessagePack payloads persist and decode through the
/// blob column
/// Integration Point: CassandraSessionBackend ↔ SerializationFormat ↔ Blob storage
#[cfg(feature = "messagepack")]
#[tokio::test]
#[serial(cassandra_live)]
#[ignore = "requires a running Cassandra node"]
async fn test_messagepack_payloads_roundtrip() {
	let settings = test_settings(&unique_table());
	let (_session, backend) = prepared_backend(&settings).await;
	let backend = backend.with_format(SerializationFormat::MessagePack);

	let mut data = SessionMap::new();
	data.insert("cat".to_string(), json!("dog"));
	data.insert("count".to_string(), json!(3));

	backend
		.save("msgpackkey001", &data, None)
		.await
		.expect("Failed to save session");

	let loaded: Option<SessionMap> = backend
		.load("msgpackkey001")
		.await
		.expect("Failed to load session");
	assert_eq!(loaded, Some(data));
}

/// Test Intent: Verify writes under varied TTLs all land, exercising the
/// per-TTL insert statement cache
/// Integration Point: Insert statement cache ↔ USING TTL statement text
#[tokio::test]
#[serial(cassandra_live)]
#[ignore = "requires a running Cassandra node"]
async fn test_varied_ttls_share_one_backend() {
	let settings = test_settings(&unique_table());
	let (_session, backend) = prepared_backend(&settings).await;

	let mut data = SessionMap::new();
	data.insert("n".to_string(), json!(1));

	for ttl in [Some(60), Some(120), None, Some(60)] {
		backend
			.save("variedttlkey1", &data, ttl)
			.await
			.expect("Failed to save session");
	}

	let loaded: Option<SessionMap> = backend
		.load("variedttlkey1")
		.await
		.expect("Failed to load session");
	assert_eq!(loaded, Some(data));
}

// ========================================
// Session Lifecycle on Cassandra
// ========================================

/// Test Intent: Verify the full session lifecycle against real storage
/// Integration Point: Session ↔ CassandraSessionBackend ↔ Cassandra storage
#[tokio::test]
#[serial(cassandra_live)]
#[ignore = "requires a running Cassandra node"]
async fn test_session_lifecycle_roundtrip() {
	let settings = test_settings(&unique_table());
	let (_session, backend) = prepared_backend(&settings).await;

	let mut session = Session::from_settings(backend.clone(), &settings);
	session.set("user_id", 42).expect("Failed to set value");
	session.save(false).await.expect("Failed to save session");
	let key = session.session_key().expect("Session key missing").to_string();

	let mut resumed = Session::with_session_key(backend.clone(), key.clone());
	resumed.load().await.expect("Failed to load session");
	let value: Option<i64> = resumed.get("user_id").expect("Failed to get value");
	assert_eq!(value, Some(42));

	resumed.cycle_key().await.expect("Failed to cycle key");
	let new_key = resumed.session_key().expect("Session key missing").to_string();
	assert_ne!(new_key, key);
	assert!(
		!backend
			.exists(&key)
			.await
			.expect("Failed to check old key")
	);

	resumed.flush().await.expect("Failed to flush session");
	assert!(resumed.session_key().is_none());
	assert!(
		!backend
			.exists(&new_key)
			.await
			.expect("Failed to check flushed key")
	);
}
