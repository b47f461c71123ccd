//! API key/secret pairs and the per-identity registry the acquirer reads from.

// self
use crate::{
	_prelude::*,
	auth::{Identity, TokenSecret},
	error::ConfigError,
};

/// API key and secret exchanged for a bearer token.
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "RawCredentials")]
pub struct ApiCredentials {
	/// Public API key.
	pub api_key: String,
	/// API secret; redacted in debug output.
	pub api_secret: TokenSecret,
}
impl ApiCredentials {
	/// Validates and wraps a key/secret pair.
	pub fn new(
		api_key: impl Into<String>,
		api_secret: impl Into<String>,
	) -> Result<Self, ConfigError> {
		let api_key = api_key.into();
		let api_secret = TokenSecret::new(api_secret);

		if api_key.trim().is_empty() {
			return Err(ConfigError::EmptyCredential { field: "key" });
		}
		if api_secret.is_blank() {
			return Err(ConfigError::EmptyCredential { field: "secret" });
		}

		Ok(Self { api_key, api_secret })
	}
}
impl TryFrom<RawCredentials> for ApiCredentials {
	type Error = ConfigError;

	fn try_from(raw: RawCredentials) -> Result<Self, Self::Error> {
		Self::new(raw.api_key, raw.api_secret)
	}
}
impl Debug for ApiCredentials {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ApiCredentials")
			.field("api_key", &self.api_key)
			.field("api_secret", &self.api_secret)
			.finish()
	}
}

#[derive(Deserialize)]
struct RawCredentials {
	api_key: String,
	api_secret: String,
}

/// Identity-scoped credential lookup.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(transparent)]
pub struct CredentialRegistry(HashMap<Identity, ApiCredentials>);
impl CredentialRegistry {
	/// Registers or replaces credentials for `identity`.
	pub fn insert(&mut self, identity: Identity, credentials: ApiCredentials) -> &mut Self {
		self.0.insert(identity, credentials);

		self
	}

	/// Builder-style variant of [`insert`](Self::insert).
	pub fn with(mut self, identity: Identity, credentials: ApiCredentials) -> Self {
		self.0.insert(identity, credentials);

		self
	}

	/// Resolves credentials, failing fast when the identity is unknown.
	pub fn resolve(&self, identity: &Identity) -> Result<&ApiCredentials, ConfigError> {
		self.0
			.get(identity)
			.ok_or_else(|| ConfigError::MissingCredentials { identity: identity.clone() })
	}

	/// Number of registered identities.
	pub fn len(&self) -> usize {
		self.0.len()
	}

	/// Returns `true` if no identities are registered.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}
}
