use std::path::PathBuf;

use clap::Parser;

#[derive(Debug, Parser)]
#[command(name = "plexus", about = "OpenAI/Anthropic-compatible LLM routing gateway")]
pub struct Cli {
    /// Path to the YAML routing configuration.
    #[arg(long, env = "PLEXUS_CONFIG_PATH", default_value = "plexus.yaml")]
    pub config: PathBuf,

    /// Overrides the `port` set in the config file.
    #[arg(long, env = "PLEXUS_PORT")]
    pub port: Option<u16>,

    /// Overrides the `logLevel` set in the config file.
    #[arg(long, env = "PLEXUS_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Optional durable JSONL usage log, appended to alongside the in-memory store.
    #[arg(long, env = "PLEXUS_USAGE_LOG")]
    pub usage_log: Option<PathBuf>,
}
