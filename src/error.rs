//! Crate-level error types shared across the acquirer, cache, and retry layers.
//!
//! Every variant is cheap to clone so a single failed acquisition can be handed to all callers
//! that were waiting on it.

// self
use crate::{_prelude::*, auth::Identity};

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type SharedError = Arc<dyn std::error::Error + Send + Sync>;

/// Canonical error exposed by public APIs.
#[derive(Clone, Debug, ThisError)]
pub enum Error {
	/// Local configuration or credential problem; fatal for the affected identity.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// The token endpoint could not produce a usable token; the caller may retry.
	#[error(transparent)]
	Acquisition(#[from] AcquisitionError),
	/// The downstream API failed for a reason other than token rejection.
	#[error(transparent)]
	Downstream(#[from] DownstreamError),

	/// The downstream API rejected a freshly acquired token as well.
	#[error("Downstream API rejected the token for `{identity}` even after a forced refresh.")]
	AuthRejected {
		/// Identity whose token was rejected twice.
		identity: Identity,
	},
}
impl Error {
	/// Returns `true` when repeating the operation later may succeed.
	pub fn is_retryable(&self) -> bool {
		match self {
			Self::Config(_) | Self::AuthRejected { .. } => false,
			Self::Acquisition(err) => err.is_retryable(),
			Self::Downstream(err) => err.is_retryable(),
		}
	}
}

/// Configuration and credential failures. These are never retried automatically.
#[derive(Clone, Debug, ThisError)]
pub enum ConfigError {
	/// The expiry buffer swallows the whole token lifetime.
	#[error("Expiry buffer of {buffer} must be shorter than the expected token lifetime of {ttl}.")]
	BufferExceedsTtl {
		/// Configured safety buffer.
		buffer: Duration,
		/// Configured expected upstream TTL.
		ttl: Duration,
	},
	/// The expiry buffer is negative.
	#[error("Expiry buffer must not be negative.")]
	NegativeBuffer,
	/// The request timeout is zero or negative.
	#[error("Token request timeout must be positive.")]
	NonPositiveTimeout,
	/// No credentials are registered for the identity.
	#[error("No API credentials are registered for `{identity}`.")]
	MissingCredentials {
		/// Identity without credentials.
		identity: Identity,
	},
	/// The token endpoint refused the identity's credentials.
	#[error("Token endpoint rejected the API credentials for `{identity}` with status {status}.")]
	InvalidCredentials {
		/// Identity whose credentials were rejected.
		identity: Identity,
		/// HTTP status returned by the token endpoint.
		status: u16,
	},
	/// An API key or secret is empty.
	#[error("The API {field} must not be empty.")]
	EmptyCredential {
		/// Which credential field was empty.
		field: &'static str,
	},
	/// Token endpoint must use HTTPS.
	#[error("The token endpoint must use HTTPS: {url}.")]
	InsecureEndpoint {
		/// Endpoint URL that failed validation.
		url: String,
	},
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: SharedError,
	},
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Arc::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Failures while exchanging credentials for a token (network, timeout, malformed response).
#[derive(Clone, Debug, ThisError)]
pub enum AcquisitionError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the token endpoint.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: SharedError,
	},
	/// The token request exceeded its timeout.
	#[error("Request timed out while calling the token endpoint.")]
	Timeout,
	/// Token endpoint returned an unexpected status.
	#[error("Token endpoint returned an unexpected response: {message}.")]
	TokenEndpoint {
		/// Summary of the failure.
		message: String,
		/// HTTP status code, when available.
		status: Option<u16>,
		/// Retry-After hint from upstream, if supplied.
		retry_after: Option<Duration>,
	},
	/// Token endpoint responded with JSON that could not be parsed.
	#[error("Token endpoint returned malformed JSON.")]
	TokenResponseParse {
		/// Structured parsing failure.
		#[source]
		source: Arc<serde_path_to_error::Error<serde_json::Error>>,
		/// HTTP status code, when available.
		status: Option<u16>,
	},
	/// Token endpoint returned an empty access token.
	#[error("Token endpoint returned an empty access token.")]
	EmptyAccessToken,
	/// Token endpoint returned a non-positive `expires_in`.
	#[error("The expires_in value must be positive.")]
	NonPositiveExpiresIn,
	/// The reported lifetime puts the deadline outside the representable time range.
	#[error("Token lifetime of {expires_in} does not yield a representable expiry.")]
	ExpiryOutOfRange {
		/// Lifetime reported by the token endpoint.
		expires_in: Duration,
	},
	/// The token would already be inside the expiry buffer when issued.
	#[error("Token lifetime of {expires_in} does not exceed the expiry buffer of {buffer}.")]
	ExpiresWithinBuffer {
		/// Lifetime reported by the token endpoint.
		expires_in: Duration,
		/// Configured safety buffer.
		buffer: Duration,
	},
}
impl AcquisitionError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Arc::new(src) }
	}

	/// Returns `true` for failures that may clear up on their own.
	pub fn is_retryable(&self) -> bool {
		match self {
			Self::Network { .. } | Self::Timeout => true,
			Self::TokenEndpoint { status, .. } =>
				status.is_none_or(|code| code == 408 || code == 429 || code >= 500),
			Self::TokenResponseParse { .. }
			| Self::EmptyAccessToken
			| Self::NonPositiveExpiresIn
			| Self::ExpiryOutOfRange { .. }
			| Self::ExpiresWithinBuffer { .. } => false,
		}
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for AcquisitionError {
	fn from(e: ReqwestError) -> Self {
		if e.is_timeout() { Self::Timeout } else { Self::network(e) }
	}
}

/// Failures reported by a downstream call made with a cached token.
#[derive(Clone, Debug, ThisError)]
pub enum DownstreamError {
	/// The downstream API rejected the bearer token (HTTP 401).
	#[error("Downstream API rejected the bearer token.")]
	Unauthorized,
	/// The downstream API answered with another non-success status.
	#[error("Downstream API returned status {status}.")]
	Status {
		/// HTTP status code.
		status: u16,
		/// Retry-After hint, if supplied.
		retry_after: Option<Duration>,
	},
	/// The downstream request failed before a response arrived.
	#[error("Transport error occurred while calling the downstream API.")]
	Transport {
		/// Transport-specific error.
		#[source]
		source: SharedError,
	},
}
impl DownstreamError {
	/// Returns `true` when the call may succeed if repeated later.
	pub fn is_retryable(&self) -> bool {
		match self {
			Self::Unauthorized => false,
			Self::Status { status, .. } => *status == 429 || *status >= 500,
			Self::Transport { .. } => true,
		}
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for DownstreamError {
	fn from(e: ReqwestError) -> Self {
		Self::Transport { source: Arc::new(e) }
	}
}
