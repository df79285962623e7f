//! Session key generation
//!
//! Session keys are opaque identifiers minted by the store when a session is
//! first persisted. The generator is pluggable so host frameworks can keep
//! their own key format; both built-in generators produce 32-character
//! lowercase keys safe for cookies and CQL text columns.

use rand::Rng;
use uuid::Uuid;

/// Session key length produced by the built-in generators
pub const SESSION_KEY_LEN: usize = 32;

/// Alphabet for random session keys: lowercase letters and digits
const SESSION_KEY_CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Minimum length accepted for externally supplied session keys
const MIN_SESSION_KEY_LEN: usize = 8;

/// Pluggable session key generator
///
/// Implementations must return keys that are unique with overwhelming
/// probability; uniqueness against concurrent creation is enforced by the
/// store's creation retry loop, not here.
pub trait SessionKeyGenerator: Send + Sync {
	/// Produce a new candidate session key
	fn generate(&self) -> String;
}

/// Random alphanumeric session keys
///
/// Draws 32 characters from `a-z0-9`, the classic web-framework session key
/// format.
///
/// # Example
///
/// ```rust
/// use reinhardt_cassandra_sessions::key::{RandomKeyGenerator, SessionKeyGenerator};
///
/// let key = RandomKeyGenerator.generate();
/// assert_eq!(key.len(), 32);
/// assert!(key.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomKeyGenerator;

impl SessionKeyGenerator for RandomKeyGenerator {
	fn generate(&self) -> String {
		let mut rng = rand::rng();
		(0..SESSION_KEY_LEN)
			.map(|_| {
				let idx = rng.random_range(0..SESSION_KEY_CHARSET.len());
				SESSION_KEY_CHARSET[idx] as char
			})
			.collect()
	}
}

/// UUIDv4 session keys, rendered without hyphens
///
/// # Example
///
/// ```rust
/// use reinhardt_cassandra_sessions::key::{SessionKeyGenerator, UuidKeyGenerator};
///
/// let key = UuidKeyGenerator.generate();
/// assert_eq!(key.len(), 32);
/// assert!(!key.contains('-'));
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidKeyGenerator;

impl SessionKeyGenerator for UuidKeyGenerator {
	fn generate(&self) -> String {
		Uuid::new_v4().simple().to_string()
	}
}

/// Whether an externally supplied key (typically from a cookie) is usable
///
/// Keys that fail this check are discarded, which makes the session fall
/// back to lazy creation instead of querying storage with garbage.
pub fn is_valid_session_key(key: &str) -> bool {
	key.len() >= MIN_SESSION_KEY_LEN
		&& key
			.chars()
			.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
}
