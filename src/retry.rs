//! Authenticated downstream calls with one forced refresh on token rejection.
//!
//! A 401 from the vehicle-data API means the cached token was revoked or expired early. The
//! rejected token is evicted (only if no newer token replaced it meanwhile), a token is fetched
//! through the regular single-flight path, and the call is repeated once. A second rejection is
//! reported as [`Error::AuthRejected`] so a permanently invalid credential cannot loop.

// self
use crate::{
	_prelude::*,
	acquirer::TokenAcquirer,
	auth::{CachedToken, Identity},
	error::DownstreamError,
	obs::{self, OpKind, OpOutcome, OpSpan},
	service::TokenService,
};
#[cfg(feature = "reqwest")]
use reqwest::{RequestBuilder, Response, StatusCode};

impl<A> TokenService<A>
where
	A: ?Sized + TokenAcquirer,
{
	/// Runs `downstream` with a token for `identity`, re-acquiring and retrying exactly once if
	/// the downstream rejects the token.
	pub async fn call_with_auth<R, F, Fut>(&self, identity: &Identity, downstream: F) -> Result<R>
	where
		F: FnMut(CachedToken) -> Fut,
		Fut: Future<Output = Result<R, DownstreamError>>,
	{
		const KIND: OpKind = OpKind::CallWithAuth;

		let span = OpSpan::new(KIND, "call_with_auth", identity);

		obs::record_op_outcome(KIND, OpOutcome::Attempt);

		let result = span.instrument(self.call_with_auth_inner(identity, downstream)).await;

		match &result {
			Ok(_) => obs::record_op_outcome(KIND, OpOutcome::Success),
			Err(err) => {
				obs::record_op_outcome(KIND, OpOutcome::Failure);
				obs::warn_event("Authenticated downstream call failed.", err);
			},
		}

		result
	}

	async fn call_with_auth_inner<R, F, Fut>(
		&self,
		identity: &Identity,
		mut downstream: F,
	) -> Result<R>
	where
		F: FnMut(CachedToken) -> Fut,
		Fut: Future<Output = Result<R, DownstreamError>>,
	{
		let token = self.get_token(identity).await?;
		let rejected = token.access_token.clone();

		match downstream(token).await {
			Err(DownstreamError::Unauthorized) => {},
			other => return other.map_err(Error::from),
		}

		obs::record_op_outcome(OpKind::CallWithAuth, OpOutcome::Retried);
		obs::debug_event("Downstream rejected the cached token; forcing a refresh.");
		self.discard_rejected(identity, &rejected);

		let token = self.get_token(identity).await?;

		match downstream(token).await {
			Err(DownstreamError::Unauthorized) =>
				Err(Error::AuthRejected { identity: identity.clone() }),
			other => other.map_err(Error::from),
		}
	}

	#[cfg(feature = "reqwest")]
	/// Sends the request produced by `request` with a bearer token for `identity`, applying the
	/// same single forced refresh as [`call_with_auth`](Self::call_with_auth).
	///
	/// `request` is invoked once per attempt, since a [`RequestBuilder`] cannot be replayed.
	pub async fn send_with_auth<F>(&self, identity: &Identity, mut request: F) -> Result<Response>
	where
		F: FnMut() -> RequestBuilder,
	{
		self.call_with_auth(identity, |token| send_authorized(authorize(request(), &token))).await
	}
}

/// Attaches `Authorization: Bearer <token>` to a downstream request.
#[cfg(feature = "reqwest")]
pub fn authorize(request: RequestBuilder, token: &CachedToken) -> RequestBuilder {
	request.bearer_auth(token.access_token.expose())
}

/// Sends a downstream request and classifies non-success responses.
///
/// `401` maps to [`DownstreamError::Unauthorized`] so [`TokenService::call_with_auth`] can force
/// a refresh; every other non-success status is returned as [`DownstreamError::Status`].
#[cfg(feature = "reqwest")]
pub async fn send_authorized(request: RequestBuilder) -> Result<Response, DownstreamError> {
	let response = request.send().await?;
	let status = response.status();

	if status.is_success() {
		return Ok(response);
	}
	if status == StatusCode::UNAUTHORIZED {
		return Err(DownstreamError::Unauthorized);
	}

	Err(DownstreamError::Status {
		status: status.as_u16(),
		retry_after: crate::acquirer::http::parse_retry_after(response.headers()),
	})
}
