#![allow(dead_code)]

// crates.io
use httpmock::prelude::*;
use time::Duration;
// self
use vehicle_token_cache::{
	acquirer::ReqwestTokenAcquirer,
	auth::{ApiCredentials, CredentialRegistry, Identity},
	config::{AcquirerConfig, CacheConfig},
	reqwest::Client,
	service::{ReqwestTokenService, TokenService},
	url::Url,
};

pub const API_KEY: &str = "dealer-key";
pub const API_SECRET: &str = "dealer-secret";
pub const USER_AGENT: &str = "dealer-backoffice/1.0";

pub fn identity(value: &str) -> Identity {
	Identity::new(value).expect("Identity fixture should be valid.")
}

/// Client that accepts the self-signed certificate `httpmock` serves.
pub fn test_client() -> Client {
	Client::builder()
		.danger_accept_invalid_certs(true)
		.danger_accept_invalid_hostnames(true)
		.build()
		.expect("Failed to build insecure Reqwest client for tests.")
}

pub fn build_service(server: &MockServer, identity: &Identity) -> ReqwestTokenService {
	build_service_with_timeout(server, identity, AcquirerConfig::DEFAULT_REQUEST_TIMEOUT)
}

pub fn build_service_with_timeout(
	server: &MockServer,
	identity: &Identity,
	timeout: Duration,
) -> ReqwestTokenService {
	let endpoint =
		Url::parse(&server.url("/token")).expect("Mock token endpoint should parse successfully.");
	let acquirer_config = AcquirerConfig::builder(endpoint)
		.allow_insecure_endpoint(true)
		.request_timeout(timeout)
		.user_agent(USER_AGENT)
		.build()
		.expect("Acquirer config fixture should be valid.");
	let credentials = CredentialRegistry::default().with(
		identity.clone(),
		ApiCredentials::new(API_KEY, API_SECRET).expect("Credential fixture should be valid."),
	);

	let acquirer = ReqwestTokenAcquirer::with_client(test_client(), acquirer_config, credentials);

	TokenService::new(acquirer, CacheConfig::default())
}

pub fn token_body(access_token: &str, expires_in: i64) -> String {
	format!("{{\"access_token\":\"{access_token}\",\"expires_in\":{expires_in}}}")
}
