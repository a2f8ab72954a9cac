mod auth_service_impl;
mod jwt_signer;
mod password_hasher;
mod rotation;
mod token_issuer;

pub use auth_service_impl::*;
pub use jwt_signer::*;
pub use password_hasher::*;
pub use rotation::*;
pub use token_issuer::*;

#[cfg(test)]
pub(crate) mod testing;
