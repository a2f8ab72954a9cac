mod ledger;
mod token;
mod user;

pub use ledger::*;
pub use token::*;
pub use user::*;
