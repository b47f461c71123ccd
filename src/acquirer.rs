//! Adapters that exchange identity-scoped credentials for raw bearer tokens.
//!
//! An acquirer is a stateless translation layer: it performs one network exchange, maps
//! transport and parse failures into crate errors, and returns the token with the lifetime the
//! upstream granted. Caching and de-duplication live in
//! [`TokenService`](crate::service::TokenService), so tests can swap in any stub that implements
//! [`TokenAcquirer`].

#[cfg(feature = "reqwest")] pub mod http;

#[cfg(feature = "reqwest")] pub use http::ReqwestTokenAcquirer;

// self
use crate::{
	_prelude::*,
	auth::{Identity, TokenSecret},
};

/// Boxed future returned by [`TokenAcquirer::acquire`].
pub type AcquireFuture<'a> = Pin<Box<dyn Future<Output = Result<RawToken>> + 'a + Send>>;

/// Contract implemented by token endpoint adapters.
pub trait TokenAcquirer
where
	Self: Send + Sync,
{
	/// Exchanges the credentials registered for `identity` for a fresh token.
	fn acquire<'a>(&'a self, identity: &'a Identity) -> AcquireFuture<'a>;
}

/// Token material as returned by the upstream, before any cache bookkeeping.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawToken {
	/// Bearer token.
	pub access_token: TokenSecret,
	/// Lifetime granted by the upstream.
	pub expires_in: Duration,
}
