//! Settings come from a TOML file, overridden by `GATEHOUSE__SECTION__KEY`
//! environment variables.

mod cli;
pub use clap::Parser;
pub use cli::*;

mod settings;
pub use settings::*;
