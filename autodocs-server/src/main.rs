use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Use JSON logs in production (AUTODOCS_LOG_JSON=1), human-readable otherwise
    let json_logs = std::env::var("AUTODOCS_LOG_JSON").unwrap_or_default() == "1";
    let filter = EnvFilter::from_default_env()
        .add_directive("autodocs_server=info".parse()?)
        .add_directive("autodocs_agents=info".parse()?);
    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .init();
    }

    let config = autodocs_server::config::ServerConfig::parse();
    tracing::info!(
        addr = %config.bind_addr(),
        model = %config.model,
        "Starting autodocs server"
    );

    let server = autodocs_server::server::Server::new(config);
    server.run().await
}
