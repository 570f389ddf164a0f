use clap::Parser;
use tokio::net::TcpListener;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use mrwc_coordinator::args::Args;
use mrwc_coordinator::{serve, MRCoordinator};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    // Note: There are default values for EACH argument.
    let args = Args::parse();

    let coordinator = MRCoordinator::new(args.requirements(), args.call_timeout())?;

    let listener = TcpListener::bind(("0.0.0.0", args.port)).await?;
    info!("Coordinator listening on {}", listener.local_addr()?);
    info!(
        "Minimum requirements: {} mappers, {} reducers",
        args.min_mappers, args.min_reducers
    );
    info!("Waiting for workers to register...");

    let shutdown = CancellationToken::new();
    let server = tokio::spawn(serve(listener, coordinator, shutdown.clone()));

    match signal::ctrl_c().await {
        Ok(()) => info!("Coordinator shutting down..."),
        Err(err) => error!("Unable to listen for shutdown signal: {}", err),
    }

    shutdown.cancel();
    server.await??;

    Ok(())
}
