//! Single-flight bearer token cache for rate-limited vehicle-data APIs.
//!
//! Tokens are served from memory until a safety buffer before their upstream expiry, concurrent
//! misses for one identity share a single acquisition, and downstream 401s trigger exactly one
//! forced refresh before the rejection is surfaced.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod acquirer;
pub mod auth;
pub mod cache;
pub mod clock;
pub mod config;
pub mod error;
pub mod obs;
pub mod retry;
pub mod service;
pub mod singleflight;
#[cfg(test)]
pub mod _preludet {
	//! Convenience re-exports and helpers for unit tests.

	pub use crate::_prelude::*;

	// std
	use std::sync::atomic::{AtomicUsize, Ordering};
	// self
	use crate::{
		acquirer::{AcquireFuture, RawToken, TokenAcquirer},
		auth::{Identity, TokenSecret},
		clock::ManualClock,
		config::CacheConfig,
		error::AcquisitionError,
		service::TokenService,
	};
	#[cfg(feature = "reqwest")]
	use crate::{
		acquirer::ReqwestTokenAcquirer,
		auth::{ApiCredentials, CredentialRegistry},
		config::AcquirerConfig,
	};

	/// Service type alias used by reqwest-backed tests.
	#[cfg(feature = "reqwest")]
	pub type ReqwestTestService = TokenService<ReqwestTokenAcquirer>;

	/// Builds a reqwest client that accepts the self-signed certificates produced by `httpmock`
	/// during tests.
	#[cfg(feature = "reqwest")]
	pub fn test_reqwest_client() -> ReqwestClient {
		ReqwestClient::builder()
			.danger_accept_invalid_certs(true)
			.danger_accept_invalid_hostnames(true)
			.timeout(std::time::Duration::from_secs(5))
			.build()
			.expect("Failed to build insecure Reqwest client for tests.")
	}

	/// Parses an identity fixture.
	pub fn identity(value: &str) -> Identity {
		Identity::new(value).expect("Identity fixture should be valid.")
	}

	/// Constructs a [`TokenService`] whose acquirer talks to `token_url` using the supplied
	/// credentials for `identity`.
	#[cfg(feature = "reqwest")]
	pub fn build_reqwest_test_service(
		token_url: &str,
		identity: &Identity,
		api_key: &str,
		api_secret: &str,
	) -> ReqwestTestService {
		let endpoint = Url::parse(token_url).expect("Mock token endpoint should parse.");
		let acquirer_config = AcquirerConfig::builder(endpoint)
			.allow_insecure_endpoint(true)
			.build()
			.expect("Acquirer config fixture should be valid.");
		let mut credentials = CredentialRegistry::default();

		credentials.insert(
			identity.clone(),
			ApiCredentials::new(api_key, api_secret).expect("Credential fixture should be valid."),
		);

		let acquirer =
			ReqwestTokenAcquirer::with_client(test_reqwest_client(), acquirer_config, credentials);

		TokenService::new(acquirer, CacheConfig::default())
	}

	/// Scripted response returned by [`StubAcquirer`].
	#[derive(Clone, Debug)]
	pub enum StubResponse {
		/// Issue `{prefix}-{n}` where `n` is the one-based call number.
		Sequential {
			/// Prefix for generated tokens.
			prefix: String,
			/// TTL reported for every token.
			expires_in: Duration,
		},
		/// Fail every call with a transient endpoint error.
		Failing {
			/// Status reported in the error.
			status: u16,
		},
	}

	/// In-process [`TokenAcquirer`] that counts calls and optionally yields before resolving so
	/// concurrent callers have a chance to pile up.
	#[derive(Debug)]
	pub struct StubAcquirer {
		response: Mutex<StubResponse>,
		calls: AtomicUsize,
		delay: Option<std::time::Duration>,
	}
	impl StubAcquirer {
		/// Stub that issues sequential tokens with the provided TTL.
		pub fn issuing(prefix: &str, expires_in: Duration) -> Self {
			Self {
				response: Mutex::new(StubResponse::Sequential {
					prefix: prefix.into(),
					expires_in,
				}),
				calls: AtomicUsize::new(0),
				delay: None,
			}
		}

		/// Stub that fails every call with the provided status.
		pub fn failing(status: u16) -> Self {
			Self {
				response: Mutex::new(StubResponse::Failing { status }),
				calls: AtomicUsize::new(0),
				delay: None,
			}
		}

		/// Sleeps for `delay` inside every acquisition.
		pub fn with_delay(mut self, delay: std::time::Duration) -> Self {
			self.delay = Some(delay);

			self
		}

		/// Swaps the scripted response for subsequent calls.
		pub fn respond_with(&self, response: StubResponse) {
			*self.response.lock() = response;
		}

		/// Number of acquisitions performed so far.
		pub fn calls(&self) -> usize {
			self.calls.load(Ordering::SeqCst)
		}
	}
	impl TokenAcquirer for StubAcquirer {
		fn acquire<'a>(&'a self, _identity: &'a Identity) -> AcquireFuture<'a> {
			Box::pin(async move {
				let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;

				if let Some(delay) = self.delay {
					tokio::time::sleep(delay).await;
				}

				let response = self.response.lock().clone();

				match response {
					StubResponse::Sequential { prefix, expires_in } => Ok(RawToken {
						access_token: TokenSecret::new(format!("{prefix}-{call}")),
						expires_in,
					}),
					StubResponse::Failing { status } => Err(AcquisitionError::TokenEndpoint {
						message: "Stub token endpoint is unavailable.".into(),
						status: Some(status),
						retry_after: None,
					}
					.into()),
				}
			})
		}
	}

	/// Builds a service around a shared [`StubAcquirer`] driven by a [`ManualClock`].
	pub fn build_stub_service(
		acquirer: Arc<StubAcquirer>,
		config: CacheConfig,
	) -> (TokenService<StubAcquirer>, Arc<ManualClock>) {
		let clock = Arc::new(ManualClock::default());
		let service = TokenService::new(acquirer, config).with_clock(clock.clone());

		(service, clock)
	}
}

mod _prelude {
	pub use std::{
		collections::HashMap,
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		hash::Hash,
		pin::Pin,
		str::FromStr,
		sync::Arc,
	};

	pub use async_lock::OnceCell;
	pub use parking_lot::{Mutex, RwLock};
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(test)] use color_eyre as _;
#[cfg(all(test, not(feature = "reqwest")))] use httpmock as _;
