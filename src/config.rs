//! Validated configuration for the cache and the token endpoint adapter.
//!
//! Both configs are assembled through builders that reject inconsistent values up front, and
//! both deserialize through those same builders so a host application's config file cannot
//! bypass validation. Durations are expressed in whole seconds on the wire.

// self
use crate::{_prelude::*, error::ConfigError};

/// Cache-wide expiry policy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "CacheConfigBuilder", into = "CacheConfigBuilder")]
pub struct CacheConfig {
	buffer: Duration,
	expected_ttl: Duration,
}
impl CacheConfig {
	/// Default safety margin subtracted from every upstream expiry.
	pub const DEFAULT_BUFFER: Duration = Duration::minutes(5);
	/// Default token lifetime the upstream is expected to grant.
	pub const DEFAULT_EXPECTED_TTL: Duration = Duration::minutes(15);

	/// Returns a builder seeded with the defaults.
	pub fn builder() -> CacheConfigBuilder {
		CacheConfigBuilder::default()
	}

	/// Safety margin subtracted from the upstream expiry.
	pub fn buffer(&self) -> Duration {
		self.buffer
	}

	/// Lifetime the upstream is expected to grant; only used for startup validation.
	pub fn expected_ttl(&self) -> Duration {
		self.expected_ttl
	}
}
impl Default for CacheConfig {
	fn default() -> Self {
		Self { buffer: Self::DEFAULT_BUFFER, expected_ttl: Self::DEFAULT_EXPECTED_TTL }
	}
}
impl TryFrom<CacheConfigBuilder> for CacheConfig {
	type Error = ConfigError;

	fn try_from(builder: CacheConfigBuilder) -> Result<Self, Self::Error> {
		builder.build()
	}
}
impl From<CacheConfig> for CacheConfigBuilder {
	fn from(config: CacheConfig) -> Self {
		Self { buffer: config.buffer, expected_ttl: config.expected_ttl }
	}
}

/// Builder for [`CacheConfig`].
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfigBuilder {
	/// Safety margin subtracted from every upstream expiry.
	#[serde(rename = "buffer_secs", with = "secs")]
	pub buffer: Duration,
	/// Lifetime the upstream is expected to grant.
	#[serde(rename = "expected_ttl_secs", with = "secs")]
	pub expected_ttl: Duration,
}
impl CacheConfigBuilder {
	/// Overrides the safety buffer.
	pub fn buffer(mut self, buffer: Duration) -> Self {
		self.buffer = buffer;

		self
	}

	/// Overrides the expected upstream lifetime.
	pub fn expected_ttl(mut self, ttl: Duration) -> Self {
		self.expected_ttl = ttl;

		self
	}

	/// Validates the policy. A buffer that covers the whole lifetime would make every token
	/// stale on arrival, so it is rejected here rather than discovered at runtime.
	pub fn build(self) -> Result<CacheConfig, ConfigError> {
		if self.buffer.is_negative() {
			return Err(ConfigError::NegativeBuffer);
		}
		if self.buffer >= self.expected_ttl {
			return Err(ConfigError::BufferExceedsTtl {
				buffer: self.buffer,
				ttl: self.expected_ttl,
			});
		}

		Ok(CacheConfig { buffer: self.buffer, expected_ttl: self.expected_ttl })
	}
}
impl Default for CacheConfigBuilder {
	fn default() -> Self {
		CacheConfig::default().into()
	}
}

/// Settings for the HTTP token endpoint adapter.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "AcquirerConfigBuilder", into = "AcquirerConfigBuilder")]
pub struct AcquirerConfig {
	token_endpoint: Url,
	request_timeout: Duration,
	user_agent: Option<String>,
}
impl AcquirerConfig {
	/// Default timeout applied to every token request.
	pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::seconds(10);

	/// Returns a builder for the provided endpoint.
	pub fn builder(token_endpoint: Url) -> AcquirerConfigBuilder {
		AcquirerConfigBuilder::new(token_endpoint)
	}

	/// Token endpoint URL.
	pub fn token_endpoint(&self) -> &Url {
		&self.token_endpoint
	}

	/// Per-request timeout; a timed-out acquisition fails every waiter attached to it.
	pub fn request_timeout(&self) -> Duration {
		self.request_timeout
	}

	/// Optional `User-Agent` header value.
	pub fn user_agent(&self) -> Option<&str> {
		self.user_agent.as_deref()
	}
}
impl TryFrom<AcquirerConfigBuilder> for AcquirerConfig {
	type Error = ConfigError;

	fn try_from(builder: AcquirerConfigBuilder) -> Result<Self, Self::Error> {
		builder.build()
	}
}
impl From<AcquirerConfig> for AcquirerConfigBuilder {
	fn from(config: AcquirerConfig) -> Self {
		Self {
			token_endpoint: config.token_endpoint,
			request_timeout: config.request_timeout,
			user_agent: config.user_agent,
			allow_insecure_endpoint: false,
		}
	}
}

/// Builder for [`AcquirerConfig`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AcquirerConfigBuilder {
	/// Token endpoint URL.
	pub token_endpoint: Url,
	/// Per-request timeout.
	#[serde(rename = "request_timeout_secs", with = "secs", default = "default_request_timeout")]
	pub request_timeout: Duration,
	/// Optional `User-Agent` header value.
	#[serde(default)]
	pub user_agent: Option<String>,
	/// Permits plain HTTP endpoints (local mocks only).
	#[serde(default, skip_serializing)]
	pub allow_insecure_endpoint: bool,
}
impl AcquirerConfigBuilder {
	/// Creates a builder seeded with defaults for the provided endpoint.
	pub fn new(token_endpoint: Url) -> Self {
		Self {
			token_endpoint,
			request_timeout: AcquirerConfig::DEFAULT_REQUEST_TIMEOUT,
			user_agent: None,
			allow_insecure_endpoint: false,
		}
	}

	/// Overrides the request timeout.
	pub fn request_timeout(mut self, timeout: Duration) -> Self {
		self.request_timeout = timeout;

		self
	}

	/// Sets the `User-Agent` header value.
	pub fn user_agent(mut self, value: impl Into<String>) -> Self {
		self.user_agent = Some(value.into());

		self
	}

	/// Allows plain HTTP token endpoints.
	pub fn allow_insecure_endpoint(mut self, allow: bool) -> Self {
		self.allow_insecure_endpoint = allow;

		self
	}

	/// Consumes the builder and validates the resulting config.
	pub fn build(self) -> Result<AcquirerConfig, ConfigError> {
		if !self.allow_insecure_endpoint && self.token_endpoint.scheme() != "https" {
			return Err(ConfigError::InsecureEndpoint { url: self.token_endpoint.to_string() });
		}
		if !self.request_timeout.is_positive() {
			return Err(ConfigError::NonPositiveTimeout);
		}

		Ok(AcquirerConfig {
			token_endpoint: self.token_endpoint,
			request_timeout: self.request_timeout,
			user_agent: self.user_agent,
		})
	}
}

fn default_request_timeout() -> Duration {
	AcquirerConfig::DEFAULT_REQUEST_TIMEOUT
}

mod secs {
	// crates.io
	use serde::{Deserialize, Deserializer, Serializer};
	use time::Duration;

	pub fn serialize<S>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		serializer.serialize_i64(value.whole_seconds())
	}

	pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
	where
		D: Deserializer<'de>,
	{
		i64::deserialize(deserializer).map(Duration::seconds)
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn defaults_match_documented_policy() {
		let config = CacheConfig::default();

		assert_eq!(config.buffer(), Duration::minutes(5));
		assert_eq!(config.expected_ttl(), Duration::minutes(15));
		assert_eq!(CacheConfig::builder().build().expect("Defaults should validate."), config);
	}

	#[test]
	fn buffer_covering_the_ttl_is_rejected() {
		let err = CacheConfig::builder()
			.buffer(Duration::minutes(15))
			.build()
			.expect_err("A buffer equal to the TTL must be rejected.");

		assert!(matches!(err, ConfigError::BufferExceedsTtl { .. }));

		let err = CacheConfig::builder()
			.buffer(Duration::seconds(-1))
			.build()
			.expect_err("Negative buffers must be rejected.");

		assert!(matches!(err, ConfigError::NegativeBuffer));
	}

	#[test]
	fn cache_config_deserializes_through_validation() {
		let config: CacheConfig =
			serde_json::from_str(r#"{"buffer_secs":60}"#).expect("Partial config should load.");

		assert_eq!(config.buffer(), Duration::seconds(60));
		assert_eq!(config.expected_ttl(), CacheConfig::DEFAULT_EXPECTED_TTL);
		assert!(
			serde_json::from_str::<CacheConfig>(r#"{"buffer_secs":900,"expected_ttl_secs":900}"#)
				.is_err()
		);
	}

	#[test]
	fn acquirer_config_requires_https_unless_allowed() {
		let plain = Url::parse("http://127.0.0.1:9000/token").expect("Fixture URL should parse.");
		let err = AcquirerConfig::builder(plain.clone())
			.build()
			.expect_err("Plain HTTP endpoints must be rejected by default.");

		assert!(matches!(err, ConfigError::InsecureEndpoint { .. }));

		let config = AcquirerConfig::builder(plain)
			.allow_insecure_endpoint(true)
			.user_agent("dealer-backoffice/1.0")
			.build()
			.expect("Insecure endpoints should be accepted when explicitly allowed.");

		assert_eq!(config.request_timeout(), AcquirerConfig::DEFAULT_REQUEST_TIMEOUT);
		assert_eq!(config.user_agent(), Some("dealer-backoffice/1.0"));
	}

	#[test]
	fn acquirer_config_rejects_zero_timeout() {
		let endpoint =
			Url::parse("https://auth.vehicle-data.test/token").expect("Fixture URL should parse.");
		let err = AcquirerConfig::builder(endpoint)
			.request_timeout(Duration::ZERO)
			.build()
			.expect_err("Zero timeouts must be rejected.");

		assert!(matches!(err, ConfigError::NonPositiveTimeout));
	}
}
