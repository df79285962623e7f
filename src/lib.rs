//! # Reinhardt Cassandra Sessions
//!
//! Cassandra-backed session storage for Reinhardt applications.
//!
//! Sessions are stored as opaque blobs in a single Cassandra table keyed by
//! session key, with expiry delegated entirely to Cassandra's per-write TTL.
//! Expired sessions disappear on their own; no sweeper job is needed.
//!
//! ## Features
//!
//! - **Cassandra Backend**: Sessions persisted through prepared statements at
//!   `QUORUM` consistency, with a per-TTL insert statement cache
//! - **Native TTL Expiry**: Every write carries `USING TTL`, so Cassandra
//!   retires expired sessions without any cleanup task
//! - **Fail-Fast Schema Check**: Connecting against a missing keyspace or
//!   table fails immediately with the exact DDL to run
//! - **Session Lifecycle**: Lazy creation, collision-safe key allocation,
//!   key cycling, and flush, driven by a backend-agnostic [`Session`] object
//! - **In-Memory Backend**: Drop-in backend for tests and local development
//! - **Pluggable Serialization**: JSON by default, MessagePack behind the
//!   `messagepack` feature
//!
//! ## Quick Start
//!
//! ```rust
//! use reinhardt_cassandra_sessions::{InMemorySessionBackend, Session};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let backend = InMemorySessionBackend::new();
//!
//! let mut session = Session::new(backend.clone());
//! session.set("cat", "dog")?;
//! session.save(false).await?;
//!
//! let key = session.session_key().unwrap().to_string();
//! let mut resumed = Session::with_session_key(backend, key);
//! resumed.load().await?;
//! assert_eq!(resumed.get::<String>("cat")?, Some("dog".to_string()));
//! # Ok(())
//! # }
//! # tokio::runtime::Runtime::new().unwrap().block_on(example()).unwrap();
//! ```
//!
//! ## Connecting to Cassandra
//!
//! ```rust,no_run
//! # #[cfg(feature = "cassandra")]
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! use reinhardt_cassandra_sessions::{
//! 	CassandraSessionBackend, CassandraSessionSettings, Session,
//! };
//!
//! let settings = CassandraSessionSettings::new()
//! 	.with_hosts(vec!["127.0.0.1".to_string()])
//! 	.with_keyspace("myapp");
//!
//! // Fails with the schema DDL if the table does not exist yet
//! let backend = CassandraSessionBackend::connect(settings).await?;
//!
//! let mut session = Session::from_settings(backend.clone(), backend.settings());
//! session.set("user_id", 42)?;
//! session.save(false).await?;
//! # Ok(())
//! # }
//! # fn main() {}
//! ```
//!
//! ## Architecture
//!
//! Key modules in this crate:
//!
//! - [`session`]: The [`Session`] object and its lifecycle operations
//! - [`backends`]: The [`SessionBackend`] trait, the Cassandra backend, and
//!   the in-memory backend
//! - [`settings`]: Connection and table settings, with environment loading
//! - [`schema`]: Expected table DDL and schema creation helpers
//! - [`serialization`]: Pluggable payload codecs
//! - [`key`]: Session key generation and validation
//! - [`error`]: The crate-wide [`SessionError`] type
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cassandra` | enabled | Cassandra backend via the `scylla` driver |
//! | `messagepack` | disabled | MessagePack payload serialization |
//! | `full` | disabled | Everything above |

pub mod backends;
pub mod error;
pub mod key;
pub mod schema;
pub mod serialization;
pub mod session;
pub mod settings;

#[cfg(feature = "cassandra")]
pub use backends::CassandraSessionBackend;
pub use backends::{InMemorySessionBackend, SessionBackend};
pub use error::SessionError;
pub use key::{
	RandomKeyGenerator, SESSION_KEY_LEN, SessionKeyGenerator, UuidKeyGenerator,
	is_valid_session_key,
};
#[cfg(feature = "messagepack")]
pub use serialization::MessagePackSerializer;
pub use serialization::{JsonSerializer, SerializationError, SerializationFormat, Serializer};
pub use session::{Session, SessionMap};
pub use settings::CassandraSessionSettings;
