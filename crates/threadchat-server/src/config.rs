use std::path::PathBuf;

use clap::Parser;
use thiserror::Error;

use threadchat_checkpoint::StoreConfig;
use threadchat_graph::GraphConfig;
use threadchat_llm::providers::openai::{DEFAULT_MODEL, OPENROUTER_BASE_URL};

#[derive(Parser, Debug, Clone)]
#[command(name = "threadchat-server")]
#[command(about = "Chat server with checkpointed conversation threads")]
#[command(version)]
pub struct Cli {
    /// Enable debug mode
    #[arg(long, env = "DEBUG", default_value = "false")]
    pub debug: bool,

    /// Bind address
    #[arg(long, env = "HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Server port
    #[arg(long, env = "PORT", default_value = "8081")]
    pub port: u16,

    /// OpenAI-compatible API base URL
    #[arg(long, env = "LLM_BASE_URL", default_value = OPENROUTER_BASE_URL)]
    pub llm_base_url: String,

    /// Model name
    #[arg(long, env = "LLM_MODEL", default_value = DEFAULT_MODEL)]
    pub model: String,

    /// API key for the model endpoint
    #[arg(long, env = "LLM_API_KEY")]
    pub api_key: Option<String>,

    #[arg(long, env = "OPENROUTER_API_KEY", hide = true)]
    pub openrouter_api_key: Option<String>,

    /// Upper bound on tokens per model response
    #[arg(long, env = "LLM_MAX_TOKENS", default_value = "3000")]
    pub max_tokens: u32,

    /// Checkpoint backend
    #[arg(long = "store", env = "CHECKPOINT_STORE", value_enum, default_value = "sqlite")]
    pub store: StoreKind,

    /// SQLite database file
    #[arg(long, env = "SQLITE_PATH", default_value = "threadchat.db")]
    pub sqlite_path: PathBuf,

    /// Postgres connection URL, required with `--store postgres`
    #[arg(long, env = "POSTGRES_DB_URL")]
    pub postgres_url: Option<String>,

    #[arg(long, env = "POSTGRES_MAX_CONNECTIONS", default_value = "5")]
    pub postgres_max_connections: u32,

    /// Bind the built-in tools to the model
    #[arg(long, env = "ENABLE_TOOLS", default_value_t = true, action = clap::ArgAction::Set)]
    pub enable_tools: bool,

    /// Chat and tool steps allowed per turn
    #[arg(long, env = "MAX_STEPS", default_value = "25")]
    pub max_steps: usize,

    /// Prepended to every model request
    #[arg(long, env = "SYSTEM_PROMPT")]
    pub system_prompt: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum StoreKind {
    Sqlite,
    Postgres,
    Memory,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("POSTGRES_DB_URL must be set when the postgres store is selected")]
    MissingPostgresUrl,

    #[error("MAX_STEPS must be at least 1")]
    InvalidMaxSteps,
}

#[derive(Debug, Clone)]
pub struct LlmSettings {
    pub base_url: String,
    pub model: String,
    pub api_key: String,
}

/// Validated settings the server is started with.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub debug: bool,
    pub llm: LlmSettings,
    pub store: StoreConfig,
    pub graph: GraphConfig,
}

impl ServerConfig {
    pub fn from_cli(cli: Cli) -> Result<Self, ConfigError> {
        let store = match cli.store {
            StoreKind::Memory => StoreConfig::Memory,
            StoreKind::Sqlite => StoreConfig::Sqlite {
                path: cli.sqlite_path,
            },
            StoreKind::Postgres => {
                let url = cli
                    .postgres_url
                    .filter(|url| !url.trim().is_empty())
                    .ok_or(ConfigError::MissingPostgresUrl)?;
                StoreConfig::Postgres {
                    url,
                    max_connections: cli.postgres_max_connections,
                }
            }
        };

        if cli.max_steps == 0 {
            return Err(ConfigError::InvalidMaxSteps);
        }

        let api_key = cli
            .api_key
            .or(cli.openrouter_api_key)
            .unwrap_or_default();

        let system_prompt = cli
            .system_prompt
            .map(|prompt| prompt.trim().to_string())
            .filter(|prompt| !prompt.is_empty());

        Ok(Self {
            host: cli.host,
            port: cli.port,
            debug: cli.debug,
            llm: LlmSettings {
                base_url: cli.llm_base_url,
                model: cli.model,
                api_key,
            },
            store,
            graph: GraphConfig {
                max_steps: cli.max_steps,
                system_prompt,
                tools_enabled: cli.enable_tools,
                max_output_tokens: Some(cli.max_tokens),
            },
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
