mod auth_service;
mod token_signer;

pub use auth_service::*;
pub use token_signer::*;
