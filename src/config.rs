use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[command(name = "krishi-mitr")]
#[command(about = "Crop barter and resale marketplace API")]
pub struct Config {
    /// Interface to listen on
    #[arg(long, env = "KRISHI_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// HTTP port (the browser scripts call 5000)
    #[arg(short, long, env = "KRISHI_PORT", default_value = "5000")]
    pub port: u16,

    /// Path to the JSON database file
    #[arg(short, long, env = "KRISHI_DATABASE", default_value = "database.json")]
    pub database: PathBuf,

    /// Enable verbose debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Config {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn default_log_filter(&self) -> &'static str {
        if self.verbose { "debug" } else { "info" }
    }
}
