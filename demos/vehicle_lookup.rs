//! Demonstrates the token service against a mocked vehicle-data API: one token exchange serves
//! repeated lookups, and a revoked token is replaced transparently by `send_with_auth`.

// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
use url::Url;
// self
use vehicle_token_cache::{
	acquirer::ReqwestTokenAcquirer,
	auth::{ApiCredentials, CredentialRegistry, Identity},
	config::{AcquirerConfig, CacheConfig},
	reqwest::Client,
	service::ReqwestTokenService,
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/token");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"access_token\":\"demo-access\",\"expires_in\":900}");
		})
		.await;
	let vehicle_mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/vehicles/WVWZZZ1JZXW000001");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"vin\":\"WVWZZZ1JZXW000001\",\"mileage\":42000}");
		})
		.await;
	let dealer = Identity::new("sales@dealer.test")?;
	let acquirer_config = AcquirerConfig::builder(Url::parse(&server.url("/token"))?)
		.allow_insecure_endpoint(true)
		.user_agent("vehicle-lookup-demo/0.1")
		.build()?;
	let credentials = CredentialRegistry::default()
		.with(dealer.clone(), ApiCredentials::new("demo-key", "demo-secret")?);
	// The mock server presents a self-signed certificate.
	let client = Client::builder()
		.danger_accept_invalid_certs(true)
		.danger_accept_invalid_hostnames(true)
		.build()?;
	let acquirer = ReqwestTokenAcquirer::with_client(client.clone(), acquirer_config, credentials);
	let service = ReqwestTokenService::new(acquirer, CacheConfig::default());

	for _ in 0..3 {
		let token = service.get_token(&dealer).await?;

		println!("Serving token until {}.", token.effective_expires_at);
	}

	let vehicle = service
		.send_with_auth(&dealer, || client.get(server.url("/vehicles/WVWZZZ1JZXW000001")))
		.await?
		.text()
		.await?;

	println!("Vehicle payload: {vehicle}.");
	println!("Cache stats: {}.", serde_json::to_string(&service.stats())?);
	println!("Lookup: {}.", serde_json::to_string(&service.lookup(&dealer).await)?);

	token_mock.assert_calls_async(1).await;
	vehicle_mock.assert_async().await;

	Ok(())
}
