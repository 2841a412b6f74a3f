use futures::StreamExt;
use motostream_client::{Composer, Error, MotorcycleClient, Strategy};
use motostream_core::types::MotorcycleId;
use motostream_server::{
    MotorcycleService, MotorcycleStore, config::ServerConfig, loader::reference_dataset,
    service::serve,
};
use std::{
    sync::Arc,
    time::{Duration, Instant},
};
use tokio::net::TcpListener;

const DELAY: Duration = Duration::from_millis(300);

async fn start_server() -> (MotorcycleService, MotorcycleClient) {
    start_server_with(ServerConfig::with_delay(DELAY)).await
}

async fn start_server_with(config: ServerConfig) -> (MotorcycleService, MotorcycleClient) {
    let store = Arc::new(MotorcycleStore::with_records(reference_dataset()).unwrap());
    let service = MotorcycleService::new(store, config);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(serve(listener, service.clone(), std::future::pending()));

    let http = reqwest::Client::builder().no_proxy().build().unwrap();
    let client = MotorcycleClient::with_client(http, &format!("http://{addr}")).unwrap();
    (service, client)
}

#[tokio::test(flavor = "multi_thread")]
async fn reference_scenario() {
    let (_service, client) = start_server().await;

    let moto = client
        .fetch_motorcycle(&MotorcycleId::from("2"))
        .await
        .unwrap();
    assert_eq!(moto.make, "Suzuki");
    assert_eq!(moto.model, "V-Strom 650");

    let spec = client
        .fetch_specification(&MotorcycleId::from("2"))
        .await
        .unwrap();
    assert_eq!(spec, moto.specs);

    let err = client
        .fetch_motorcycle(&MotorcycleId::from("9"))
        .await
        .unwrap_err();
    assert!(err.is_not_found(), "got {err:?}");

    // The service is still healthy after a miss.
    let again = client
        .fetch_motorcycle(&MotorcycleId::from("2"))
        .await
        .unwrap();
    assert_eq!(again, moto);
}

#[tokio::test(flavor = "multi_thread")]
async fn sequential_pays_the_delay_per_request() {
    let (_service, client) = start_server().await;
    let composer = Composer::new(client, 4, 4);

    let start = Instant::now();
    let motos = composer.sequential().await.unwrap();
    let elapsed = start.elapsed();

    let ids: Vec<&str> = motos.iter().map(|m| m.id.as_str()).collect();
    assert_eq!(ids, ["1", "2", "3", "4"]);
    assert!(elapsed >= DELAY * 4, "sequential took {elapsed:?}");
}

#[tokio::test(flavor = "multi_thread")]
async fn concurrent_overlaps_requests() {
    let (_service, client) = start_server().await;
    let composer = Composer::new(client, 4, 4);

    let start = Instant::now();
    let motos = composer.concurrent().await.unwrap();
    let elapsed = start.elapsed();

    assert_eq!(motos.len(), 4);
    assert!(elapsed >= DELAY, "concurrent took {elapsed:?}");
    assert!(elapsed < DELAY * 3, "concurrent took {elapsed:?}");
}

#[tokio::test(flavor = "multi_thread")]
async fn nested_chains_overlap_across_ids() {
    let (_service, client) = start_server().await;
    let composer = Composer::new(client, 4, 4);

    let start = Instant::now();
    let pairs = composer.nested().await.unwrap();
    let elapsed = start.elapsed();

    assert_eq!(pairs.len(), 4);
    for (moto, spec) in &pairs {
        assert_eq!(&moto.specs, spec);
    }
    assert!(elapsed >= DELAY * 2, "nested took {elapsed:?}");
    assert!(elapsed < DELAY * 5, "nested took {elapsed:?}");
}

#[tokio::test(flavor = "multi_thread")]
async fn nested_sequential_runs_one_chain_at_a_time() {
    let (_service, client) = start_server().await;
    let composer = Composer::new(client, 2, 2);

    let start = Instant::now();
    let pairs = composer.nested_sequential().await.unwrap();
    let elapsed = start.elapsed();

    assert_eq!(pairs.len(), 2);
    assert!(elapsed >= DELAY * 4, "nested-sequential took {elapsed:?}");
}

#[tokio::test(flavor = "multi_thread")]
async fn bounded_stream_yields_items_in_order() {
    let (_service, client) = start_server().await;
    let composer = Composer::new(client, 4, 4);

    let start = Instant::now();
    let motos = composer.bounded_stream().await.unwrap();
    let elapsed = start.elapsed();

    let ids: Vec<&str> = motos.iter().map(|m| m.id.as_str()).collect();
    assert_eq!(ids, ["1", "2", "3", "4"]);
    assert!(elapsed >= DELAY * 4, "stream took {elapsed:?}");
}

#[tokio::test(flavor = "multi_thread")]
async fn detached_stream_keeps_emitting_until_next_push() {
    let (service, client) = start_server().await;
    let composer = Composer::new(client, 4, 1);

    let motos = composer.bounded_stream().await.unwrap();
    assert_eq!(motos.len(), 1);

    // The emission task is still waiting out the delay before item two.
    assert_eq!(service.streams_in_flight(), 1);

    let deadline = Instant::now() + DELAY * 4 + Duration::from_secs(2);
    while service.streams_in_flight() > 0 {
        assert!(Instant::now() < deadline, "emission task never exited");
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn run_reports_every_strategy() {
    let (_service, client) = start_server().await;
    let composer = Composer::new(client, 2, 2);

    for strategy in [Strategy::Concurrent, Strategy::Exchange, Strategy::Stream] {
        let report = composer.run(strategy).await.unwrap();
        assert_eq!(report.strategy, strategy);
        assert_eq!(report.received, report.requested);
        assert!(report.elapsed >= DELAY);
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn cancelled_stream_aborts_the_response_body() {
    let config = ServerConfig {
        shutdown_timeout: Duration::from_millis(100),
        ..ServerConfig::with_delay(DELAY)
    };
    let (service, client) = start_server_with(config).await;

    let mut stream = client.stream_motorcycles().await.unwrap();
    let first = stream.next().await.unwrap().unwrap();
    assert_eq!(first.id.as_str(), "1");

    service.shutdown().await.unwrap();

    let next = stream.next().await;
    assert!(matches!(next, Some(Err(Error::Http(_)))), "got {next:?}");
}
