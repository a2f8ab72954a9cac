use super::Parser;

#[derive(Parser, Debug)]
#[command(name = "gatehouse", about = "Authentication backend issuing rotating token pairs")]
pub struct Cli {
    /// Path to a TOML settings file.
    #[arg(long)]
    pub settings: Option<String>,
}
