use clap::Parser;
use motostream_server::{
    MotorcycleService, MotorcycleStore,
    config::{CliArgs, ServerConfig},
    loader::{load_dataset_file, reference_dataset},
    service::serve,
    telemetry::{TelemetryProviders, init_telemetry},
};
use std::sync::Arc;
use tokio::{net::TcpListener, signal};

// Using mimalloc for better performance under contention, especially in musl
// environments.
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load from .env
    let _ = dotenvy::dotenv();
    let args = CliArgs::parse();
    let config = ServerConfig::try_from(args)?;

    let providers = init_telemetry()?;

    let dataset = match &config.data_file {
        Some(path) => load_dataset_file(path)?,
        None => reference_dataset(),
    };
    // The store is fully loaded before the listener is bound.
    let store = Arc::new(MotorcycleStore::with_records(dataset)?);
    let service = MotorcycleService::new(store, config.clone());

    let listener = TcpListener::bind(&config.server_addr).await?;
    log_startup_info(&config, service.store().len());

    serve(
        listener,
        service.clone(),
        shutdown_signal(service, providers),
    )
    .await?;

    tracing::info!("Service shut down successfully");
    Ok(())
}

fn log_startup_info(config: &ServerConfig, records: usize) {
    if cfg!(debug_assertions) {
        tracing::info!(
            "Starting motorcycle service on {} with {} records and full config: {:#?}",
            config.server_addr,
            records,
            config
        );
    } else {
        tracing::info!(
            "Starting motorcycle service on {} with {} records, {} ms delay",
            config.server_addr,
            records,
            config.delay.as_millis()
        );
    }
}

async fn shutdown_signal(service: MotorcycleService, providers: TelemetryProviders) {
    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received Ctrl+C signal");
        },
        () = terminate => {
            tracing::info!("Received SIGTERM signal");
        },
    }

    tracing::info!("Shutdown signal received, terminating gracefully...");

    if let Err(e) = service.shutdown().await {
        tracing::error!("Error during service shutdown: {e}");
    }

    providers.shutdown();
}
