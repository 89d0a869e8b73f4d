use anyhow::Context;
use clap::Parser;

use threadchat_server::logging::init_logging;
use threadchat_server::{run_server, AppState, Cli, ServerConfig};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    init_logging(cli.debug);

    let config = ServerConfig::from_cli(cli)?;

    log::info!("Starting threadchat server on {}", config.bind_address());
    log::info!("LLM Configuration:");
    log::info!("  Base URL: {}", config.llm.base_url);
    log::info!("  Model: {}", config.llm.model);

    let state = AppState::from_config(&config)
        .await
        .context("failed to open the checkpoint store")?;

    run_server(state, &config.bind_address()).await?;
    Ok(())
}
