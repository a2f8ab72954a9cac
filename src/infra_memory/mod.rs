mod refresh_ledger_memory;
mod user_repo_memory;

pub use refresh_ledger_memory::*;
pub use user_repo_memory::*;
