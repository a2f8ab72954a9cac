mod refresh_ledger_mysql;
mod user_repo_mysql;

pub use refresh_ledger_mysql::*;
pub use user_repo_mysql::*;

mod util;

pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");
