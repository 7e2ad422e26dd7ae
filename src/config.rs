//! Configuration and CLI argument handling

use std::{path::PathBuf, time::Duration};

use clap::Parser;

use crate::state::ClosePolicy;

/// CLI argument parsing structure
#[derive(Parser, Debug, Clone)]
#[command(name = "timers-dashboard")]
#[command(about = "A timers dashboard server with single-owner state and intent routing")]
#[command(version)]
pub struct Config {
    /// Port to bind the server to
    #[arg(short, long, default_value = "3000")]
    pub port: u16,

    /// Host address to bind to
    #[arg(long, default_value = "0.0.0.0")]
    pub host: String,

    /// Clock tick interval in milliseconds
    #[arg(long, default_value = "1000", value_parser = clap::value_parser!(u64).range(1..))]
    pub tick_ms: u64,

    /// When a submitted form closes: right away, or after the journal acknowledges
    #[arg(long, value_enum, default_value_t = ClosePolicy::Immediate)]
    pub close_policy: ClosePolicy,

    /// Append committed mutations to this JSON-lines file
    #[arg(long)]
    pub journal: Option<PathBuf>,

    /// Start with the two demo timers
    #[arg(long)]
    pub seed: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Config {
    /// Parse configuration from command line arguments
    pub fn parse() -> Self {
        Parser::parse()
    }

    /// Get the server address as a formatted string
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }

    /// Get the appropriate log level based on verbose flag
    pub fn log_level(&self) -> &'static str {
        if self.verbose { "debug" } else { "info" }
    }
}
