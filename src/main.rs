use std::net::SocketAddr;

use clap::Parser;

use highscores::cli::{init_logging, Cli};
use highscores::server::GameServer;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    let cli = Cli::parse();
    init_logging(&cli);

    let table = cli.table.build();
    let addr = SocketAddr::from(([0, 0, 0, 0], cli.port));
    let server = GameServer::new(addr, table);
    server.start().await?;

    tokio::signal::ctrl_c().await?;
    tracing::info!("interrupt received, shutting down");
    server.shutdown().await;

    Ok(())
}
