//! Immutable cached token entries and their expiry bookkeeping.

// self
use crate::{
	_prelude::*,
	auth::{Identity, TokenSecret},
	error::AcquisitionError,
};

/// Token held by the cache. Entries are replaced wholesale and never mutated in place.
///
/// Only [`CachedToken::new`] builds entries, so `effective_expires_at <= raw_expires_at` always
/// holds.
#[derive(Clone, PartialEq, Eq)]
#[non_exhaustive]
pub struct CachedToken {
	/// Identity the token was issued for.
	pub identity: Identity,
	/// Bearer token; callers must avoid logging it.
	pub access_token: TokenSecret,
	/// Instant the token endpoint answered.
	pub issued_at: OffsetDateTime,
	/// `issued_at + expires_in` as reported upstream.
	pub raw_expires_at: OffsetDateTime,
	/// `raw_expires_at - buffer`; the token is served only before this instant.
	pub effective_expires_at: OffsetDateTime,
}
impl CachedToken {
	/// Builds an entry from an upstream lifetime and the configured safety buffer.
	///
	/// Negative buffers are treated as zero. Lifetimes whose deadline cannot be represented are
	/// rejected with [`AcquisitionError::ExpiryOutOfRange`].
	pub fn new(
		identity: Identity,
		access_token: TokenSecret,
		issued_at: OffsetDateTime,
		expires_in: Duration,
		buffer: Duration,
	) -> Result<Self, AcquisitionError> {
		let buffer = if buffer.is_negative() { Duration::ZERO } else { buffer };
		let out_of_range = || AcquisitionError::ExpiryOutOfRange { expires_in };
		let raw_expires_at = issued_at.checked_add(expires_in).ok_or_else(out_of_range)?;
		let effective_expires_at = raw_expires_at.checked_sub(buffer).ok_or_else(out_of_range)?;

		Ok(Self { identity, access_token, issued_at, raw_expires_at, effective_expires_at })
	}

	/// Returns `true` if the token may be served at `now` (`now < effective_expires_at`).
	pub fn is_valid_at(&self, now: OffsetDateTime) -> bool {
		now < self.effective_expires_at
	}

	/// Formats the `Authorization` header value.
	pub fn bearer(&self) -> String {
		self.access_token.bearer_header()
	}
}
impl Debug for CachedToken {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("CachedToken")
			.field("identity", &self.identity)
			.field("access_token", &"<redacted>")
			.field("issued_at", &self.issued_at)
			.field("raw_expires_at", &self.raw_expires_at)
			.field("effective_expires_at", &self.effective_expires_at)
			.finish()
	}
}

/// Flattened `get_token` outcome for callers that hand results across a JSON boundary.
///
/// `expires_at` carries the effective expiry so consumers never schedule work against the raw
/// upstream deadline.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenLookup {
	/// Bearer token, present on success.
	pub access_token: Option<String>,
	/// Effective expiry, present on success.
	#[serde(with = "time::serde::rfc3339::option")]
	pub expires_at: Option<OffsetDateTime>,
	/// Whether a token was obtained.
	pub success: bool,
	/// Failure message, present on error.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub error: Option<String>,
}
impl From<Result<CachedToken>> for TokenLookup {
	fn from(result: Result<CachedToken>) -> Self {
		match result {
			Ok(token) => Self {
				access_token: Some(token.access_token.expose().to_owned()),
				expires_at: Some(token.effective_expires_at),
				success: true,
				error: None,
			},
			Err(err) => Self {
				access_token: None,
				expires_at: None,
				success: false,
				error: Some(err.to_string()),
			},
		}
	}
}
impl Debug for TokenLookup {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenLookup")
			.field("access_token", &self.access_token.as_ref().map(|_| "<redacted>"))
			.field("expires_at", &self.expires_at)
			.field("success", &self.success)
			.field("error", &self.error)
			.finish()
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros;
	// self
	use super::*;

	const ISSUED: OffsetDateTime = macros::datetime!(2025-03-01 12:00 UTC);

	fn try_token(expires_in: Duration, buffer: Duration) -> Result<CachedToken, AcquisitionError> {
		CachedToken::new(
			Identity::new("fleet-7").expect("Identity fixture should be valid."),
			TokenSecret::new("bearer-1"),
			ISSUED,
			expires_in,
			buffer,
		)
	}

	fn token(expires_in: Duration, buffer: Duration) -> CachedToken {
		try_token(expires_in, buffer).expect("Token fixture should be in range.")
	}

	#[test]
	fn buffer_moves_the_serving_boundary() {
		let token = token(Duration::seconds(900), Duration::seconds(300));
		let issued = macros::datetime!(2025-03-01 12:00 UTC);

		assert_eq!(token.raw_expires_at, issued + Duration::seconds(900));
		assert_eq!(token.effective_expires_at, issued + Duration::seconds(600));
		assert!(token.is_valid_at(issued + Duration::seconds(599)));
		assert!(!token.is_valid_at(issued + Duration::seconds(600)));
	}

	#[test]
	fn unrepresentable_deadlines_are_rejected() {
		let err = try_token(Duration::seconds(1_000_000_000_000), Duration::seconds(300))
			.expect_err("A deadline past year 9999 must not be built.");

		assert!(matches!(
			err,
			AcquisitionError::ExpiryOutOfRange { expires_in }
				if expires_in == Duration::seconds(1_000_000_000_000)
		));
		assert!(!err.is_retryable());
		assert!(try_token(Duration::MAX, Duration::ZERO).is_err());
		assert!(try_token(Duration::seconds(60), Duration::MAX).is_err());
	}

	#[test]
	fn negative_buffer_never_extends_expiry() {
		let token = token(Duration::seconds(60), Duration::seconds(-30));

		assert_eq!(token.effective_expires_at, token.raw_expires_at);
	}

	#[test]
	fn debug_output_redacts_the_bearer() {
		let token = token(Duration::seconds(900), Duration::seconds(300));
		let rendered = format!("{token:?}");

		assert!(!rendered.contains("bearer-1"));
		assert_eq!(token.bearer(), "Bearer bearer-1");
	}

	#[test]
	fn lookup_serializes_success_and_failure() {
		let token = token(Duration::seconds(900), Duration::seconds(300));
		let ok = serde_json::to_value(TokenLookup::from(Ok(token)))
			.expect("Successful lookup should serialize.");

		assert_eq!(ok["accessToken"], "bearer-1");
		assert_eq!(ok["expiresAt"], "2025-03-01T12:10:00Z");
		assert_eq!(ok["success"], true);
		assert!(ok.get("error").is_none());

		let failed = serde_json::to_value(TokenLookup::from(Err(AcquisitionError::Timeout.into())))
			.expect("Failed lookup should serialize.");

		assert_eq!(failed["success"], false);
		assert!(failed["accessToken"].is_null());
		assert_eq!(failed["error"], "Request timed out while calling the token endpoint.");
	}
}
