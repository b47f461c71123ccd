//! Identity keys, credential material, and cached token models.

pub mod credentials;
pub mod identity;
pub mod secret;
pub mod token;

pub use credentials::*;
pub use identity::*;
pub use secret::*;
pub use token::*;
