mod refresh_ledger;
mod user_repo;

pub use refresh_ledger::*;
pub use user_repo::*;
