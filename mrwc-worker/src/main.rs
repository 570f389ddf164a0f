use anyhow::anyhow;
use clap::Parser;
use tokio::net::TcpListener;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use common::WorkerRegistration;
use mrwc_worker::args::Args;
use mrwc_worker::{serve, CoordinatorLink, MRWorker};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();

    let workload = workload::try_named(&args.workload)
        .ok_or_else(|| anyhow!("The workload `{}` is not a known workload", args.workload))?;
    let address = args.advertised_address();

    // Start server as background task.
    let listener = TcpListener::bind(("0.0.0.0", args.port)).await?;
    info!("{} worker listening on {}", args.kind, listener.local_addr()?);

    let shutdown = CancellationToken::new();
    let worker = MRWorker::new(args.kind, address.clone(), workload);
    let server = tokio::spawn(serve(listener, worker, shutdown.clone()));

    let link = CoordinatorLink::new(
        args.coordinator.clone(),
        WorkerRegistration {
            kind: args.kind,
            address,
        },
        args.request_timeout(),
    )?;
    let registering = {
        let link = link.clone();
        let retry = args.retry_interval();
        tokio::spawn(async move { link.register_with_retry(retry).await })
    };

    let result = match signal::ctrl_c().await {
        Ok(()) => {
            info!("Worker shutting down...");
            registering.abort();

            match link.unregister().await {
                Ok(()) => info!("Unregistered from coordinator"),
                Err(e) => error!("Failed to unregister: {:#}", e),
            }
            Ok(())
        }
        Err(err) => {
            error!("Fatal error encountered {}", err);
            // we also shut down in case of error
            Err(anyhow!("Unable to listen for shutdown signal: {}", err))
        }
    };

    shutdown.cancel();
    server.await??;

    result
}
