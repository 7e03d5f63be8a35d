use clap::Parser;
use std::path::PathBuf;

/// Hestia - conversational real-estate search service
#[derive(Parser, Debug, Clone)]
#[command(name = "hestia", version, about, long_about = None)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long, env = "HESTIA_CONFIG", default_value = "hestia.toml")]
    pub config: PathBuf,

    /// Server host address
    #[arg(long, env = "HESTIA_HOST")]
    pub host: Option<String>,

    /// Server port
    #[arg(long, env = "HESTIA_PORT")]
    pub port: Option<u16>,

    /// LLM model override
    #[arg(long, env = "HESTIA_LLM_MODEL")]
    pub llm_model: Option<String>,

    /// LLM base URL override (any OpenAI-compatible endpoint)
    #[arg(long, env = "HESTIA_LLM_BASE_URL")]
    pub llm_base_url: Option<String>,
}
