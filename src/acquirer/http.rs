//! reqwest-backed [`TokenAcquirer`] for the vehicle-data token endpoint.
//!
//! The endpoint accepts `{"api_key", "api_secret"}` as JSON and answers with
//! `{"access_token", "expires_in"}`. Credential rejections (400/401/403) surface as
//! [`ConfigError::InvalidCredentials`] because retrying them cannot help; every other failure is
//! an [`AcquisitionError`] the caller may retry.

// crates.io
use reqwest::{
	StatusCode,
	header::{HeaderMap, HeaderValue, RETRY_AFTER, USER_AGENT},
	redirect::Policy,
};
use time::format_description::well_known::Rfc2822;
// self
use crate::{
	_prelude::*,
	acquirer::{AcquireFuture, RawToken, TokenAcquirer},
	auth::{CredentialRegistry, Identity, TokenSecret},
	config::AcquirerConfig,
	error::{AcquisitionError, ConfigError},
};

const BODY_PREVIEW_LEN: usize = 256;

#[derive(Serialize)]
struct TokenRequest<'a> {
	api_key: &'a str,
	api_secret: &'a str,
}

#[derive(Deserialize)]
struct TokenResponse {
	access_token: String,
	expires_in: i64,
}

/// Token acquirer that POSTs identity credentials to the configured endpoint.
///
/// Token endpoints should answer directly, so clients built by [`ReqwestTokenAcquirer::new`]
/// never follow redirects. Every request carries the configured timeout; when it elapses the
/// acquisition fails with [`AcquisitionError::Timeout`].
#[derive(Clone)]
pub struct ReqwestTokenAcquirer {
	client: ReqwestClient,
	config: AcquirerConfig,
	credentials: Arc<CredentialRegistry>,
}
impl ReqwestTokenAcquirer {
	/// Builds an acquirer with its own reqwest client.
	pub fn new(
		config: AcquirerConfig,
		credentials: CredentialRegistry,
	) -> Result<Self, ConfigError> {
		if let Some(agent) = config.user_agent() {
			HeaderValue::from_str(agent).map_err(ConfigError::http_client_build)?;
		}

		let client = ReqwestClient::builder().redirect(Policy::none()).build()?;

		Ok(Self::with_client(client, config, credentials))
	}

	/// Wraps an existing reqwest client. The config's timeout and user agent still apply per
	/// request.
	pub fn with_client(
		client: ReqwestClient,
		config: AcquirerConfig,
		credentials: CredentialRegistry,
	) -> Self {
		Self { client, config, credentials: Arc::new(credentials) }
	}

	/// Endpoint configuration in use.
	pub fn config(&self) -> &AcquirerConfig {
		&self.config
	}

	async fn exchange(&self, identity: &Identity) -> Result<RawToken> {
		let credentials = self.credentials.resolve(identity)?;
		let mut request = self
			.client
			.post(self.config.token_endpoint().clone())
			.timeout(self.config.request_timeout().unsigned_abs())
			.json(&TokenRequest {
				api_key: &credentials.api_key,
				api_secret: credentials.api_secret.expose(),
			});

		if let Some(agent) = self.config.user_agent() {
			request = request.header(USER_AGENT, agent);
		}

		let response = request.send().await.map_err(AcquisitionError::from)?;
		let status = response.status();
		let retry_after = parse_retry_after(response.headers());
		let body = response.bytes().await.map_err(AcquisitionError::from)?;

		if status.is_success() {
			return parse_token_response(status, &body);
		}
		if matches!(
			status,
			StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN
		) {
			return Err(ConfigError::InvalidCredentials {
				identity: identity.clone(),
				status: status.as_u16(),
			}
			.into());
		}

		Err(AcquisitionError::TokenEndpoint {
			message: format!("status {status}: {}", body_preview(&body)),
			status: Some(status.as_u16()),
			retry_after,
		}
		.into())
	}
}
impl TokenAcquirer for ReqwestTokenAcquirer {
	fn acquire<'a>(&'a self, identity: &'a Identity) -> AcquireFuture<'a> {
		Box::pin(self.exchange(identity))
	}
}
impl Debug for ReqwestTokenAcquirer {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ReqwestTokenAcquirer")
			.field("config", &self.config)
			.field("identities", &self.credentials.len())
			.finish()
	}
}

fn parse_token_response(status: StatusCode, body: &[u8]) -> Result<RawToken> {
	let mut deserializer = serde_json::Deserializer::from_slice(body);
	let response: TokenResponse = serde_path_to_error::deserialize(&mut deserializer).map_err(
		|source| AcquisitionError::TokenResponseParse {
			source: Arc::new(source),
			status: Some(status.as_u16()),
		},
	)?;

	let access_token = TokenSecret::new(response.access_token);

	if access_token.is_blank() {
		return Err(AcquisitionError::EmptyAccessToken.into());
	}
	if response.expires_in <= 0 {
		return Err(AcquisitionError::NonPositiveExpiresIn.into());
	}

	Ok(RawToken { access_token, expires_in: Duration::seconds(response.expires_in) })
}

fn body_preview(body: &[u8]) -> String {
	let text = String::from_utf8_lossy(body);
	let trimmed = text.trim();

	if trimmed.is_empty() {
		return "<empty body>".into();
	}

	trimmed.chars().take(BODY_PREVIEW_LEN).collect()
}

/// Reads a `Retry-After` header given either as delta-seconds or as an HTTP date.
pub(crate) fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
	let value = headers.get(RETRY_AFTER)?;
	let raw = value.to_str().ok()?.trim();

	if let Ok(secs) = raw.parse::<u32>() {
		return Some(Duration::seconds(secs.into()));
	}
	if let Ok(moment) = OffsetDateTime::parse(raw, &Rfc2822) {
		let delta = moment - OffsetDateTime::now_utc();

		if delta.is_positive() {
			return Some(delta);
		}
	}

	None
}
