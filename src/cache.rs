//! Thread-safe identity -> token map with time-relative stats.

// self
use crate::{
	_prelude::*,
	auth::{CachedToken, Identity, TokenSecret},
};

type TokenMap = Arc<RwLock<HashMap<Identity, CachedToken>>>;

/// Point-in-time view of the cache.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
	/// Number of stored entries, valid or not.
	pub total_tokens: usize,
	/// Entries that may still be served.
	pub valid_tokens: usize,
}

/// In-process token cache. Cloning yields another handle to the same map.
///
/// Entries are replaced wholesale; nothing mutates a stored [`CachedToken`] in place, so readers
/// only need the map's own lock.
#[derive(Clone, Debug, Default)]
pub struct TokenCache(TokenMap);
impl TokenCache {
	/// Returns the stored entry for `identity`, valid or not.
	pub fn get(&self, identity: &Identity) -> Option<CachedToken> {
		self.0.read().get(identity).cloned()
	}

	/// Returns the stored entry only if it may be served at `now`.
	pub fn get_valid(&self, identity: &Identity, now: OffsetDateTime) -> Option<CachedToken> {
		self.0.read().get(identity).filter(|token| token.is_valid_at(now)).cloned()
	}

	/// Stores `token` under its identity, replacing any previous entry.
	pub fn put(&self, token: CachedToken) -> Option<CachedToken> {
		self.0.write().insert(token.identity.clone(), token)
	}

	/// Removes the entry for `identity`; a no-op when absent.
	pub fn invalidate(&self, identity: &Identity) -> Option<CachedToken> {
		self.0.write().remove(identity)
	}

	/// Removes the entry only while it still holds `rejected`.
	///
	/// Returns `false` when the entry is gone or has already been replaced by a newer token.
	pub fn invalidate_if_matches(&self, identity: &Identity, rejected: &TokenSecret) -> bool {
		let mut guard = self.0.write();
		let matches = guard.get(identity).is_some_and(|current| current.access_token == *rejected);

		if matches {
			guard.remove(identity);
		}

		matches
	}

	/// Drops every entry.
	pub fn clear(&self) {
		self.0.write().clear();
	}

	/// Number of stored entries.
	pub fn len(&self) -> usize {
		self.0.read().len()
	}

	/// Returns `true` if nothing is cached.
	pub fn is_empty(&self) -> bool {
		self.0.read().is_empty()
	}

	/// Counts entries as of `now`. Validity is time-relative, so nothing here is memoized.
	pub fn stats_at(&self, now: OffsetDateTime) -> CacheStats {
		let guard = self.0.read();

		CacheStats {
			total_tokens: guard.len(),
			valid_tokens: guard.values().filter(|token| token.is_valid_at(now)).count(),
		}
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros;
	// self
	use super::*;

	const ISSUED: OffsetDateTime = macros::datetime!(2025-06-01 09:00 UTC);

	fn token(identity: &str, secret: &str, expires_in: i64) -> CachedToken {
		CachedToken::new(
			Identity::new(identity).expect("Identity fixture should be valid."),
			TokenSecret::new(secret),
			ISSUED,
			Duration::seconds(expires_in),
			Duration::seconds(300),
		)
		.expect("Token fixture should be in range.")
	}

	#[test]
	fn put_replaces_whole_entries() {
		let cache = TokenCache::default();
		let first = token("fleet-1", "old", 900);
		let identity = first.identity.clone();

		assert!(cache.put(first).is_none());

		let replaced =
			cache.put(token("fleet-1", "new", 900)).expect("Old entry should be returned.");

		assert_eq!(replaced.access_token.expose(), "old");
		assert_eq!(
			cache.get(&identity).expect("Entry should be present.").access_token.expose(),
			"new"
		);
		assert_eq!(cache.len(), 1);
	}

	#[test]
	fn invalidate_is_a_noop_for_unknown_identities() {
		let cache = TokenCache::default();
		let identity = Identity::new("ghost").expect("Identity fixture should be valid.");

		assert!(cache.invalidate(&identity).is_none());
		assert!(cache.is_empty());
	}

	#[test]
	fn conditional_invalidation_keeps_newer_tokens() {
		let cache = TokenCache::default();
		let stale = token("fleet-2", "stale", 900);
		let identity = stale.identity.clone();
		let rejected = stale.access_token.clone();

		cache.put(stale);
		cache.put(token("fleet-2", "fresh", 900));

		assert!(!cache.invalidate_if_matches(&identity, &rejected));
		assert!(cache.get(&identity).is_some());
		assert!(cache.invalidate_if_matches(&identity, &TokenSecret::new("fresh")));
		assert!(cache.get(&identity).is_none());
	}

	#[test]
	fn stats_are_computed_against_the_supplied_instant() {
		let cache = TokenCache::default();

		cache.put(token("fleet-1", "long", 3_600));
		cache.put(token("fleet-2", "short", 900));

		assert_eq!(cache.stats_at(ISSUED), CacheStats { total_tokens: 2, valid_tokens: 2 });
		assert_eq!(
			cache.stats_at(ISSUED + Duration::seconds(600)),
			CacheStats { total_tokens: 2, valid_tokens: 1 }
		);

		let fleet_2 = Identity::new("fleet-2").expect("Identity fixture should be valid.");

		assert!(cache.get_valid(&fleet_2, ISSUED + Duration::seconds(599)).is_some());
		assert!(cache.get_valid(&fleet_2, ISSUED + Duration::seconds(600)).is_none());

		cache.clear();

		assert_eq!(cache.stats_at(ISSUED), CacheStats::default());
	}

	#[test]
	fn stats_serialize_with_camel_case_keys() {
		let payload = serde_json::to_string(&CacheStats { total_tokens: 1, valid_tokens: 0 })
			.expect("Stats should serialize.");

		assert_eq!(payload, r#"{"totalTokens":1,"validTokens":0}"#);
	}
}
