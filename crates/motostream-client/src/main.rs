use clap::Parser;
use motostream_client::{
    Composer, MotorcycleClient,
    composer::{print_summary, run_all},
    config::{CliArgs, ClientConfig},
    telemetry::init_logging,
};

#[tokio::main(flavor = "multi_thread")]
async fn main() -> anyhow::Result<()> {
    // Load from .env
    let _ = dotenvy::dotenv();
    let config = ClientConfig::try_from(CliArgs::parse())?;
    init_logging()?;

    let client = MotorcycleClient::new(&config.server_url)?;
    let composer = Composer::new(client, config.count, config.take);

    tracing::info!(
        "Running {} strategies against {} ({} ids, stream take {})",
        config.strategies.len(),
        config.server_url,
        config.count,
        config.take
    );

    let reports = run_all(&composer, &config.strategies).await?;
    print_summary(&reports);

    Ok(())
}
