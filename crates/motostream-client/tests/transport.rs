use futures::StreamExt;
use motostream_client::{Composer, Error, MotorcycleClient};
use motostream_core::{
    codec::encode_line,
    types::{Motorcycle, MotorcycleId, Specification},
};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn moto(id: &str) -> Motorcycle {
    Motorcycle::new(id, "Suzuki", "Bandit 650", Specification::new(2000, "red", 6500.0))
}

fn client(base_url: &str) -> MotorcycleClient {
    let http = reqwest::Client::builder().no_proxy().build().unwrap();
    MotorcycleClient::with_client(http, base_url).unwrap()
}

async fn mount_motorcycles(server: &MockServer, ids: &[&str]) {
    for id in ids {
        Mock::given(method("GET"))
            .and(path(format!("/motorcycle/{id}")))
            .respond_with(ResponseTemplate::new(200).set_body_json(moto(id)))
            .mount(server)
            .await;
    }
}

async fn mount_failure(server: &MockServer, id: &str, status: u16) {
    Mock::given(method("GET"))
        .and(path(format!("/motorcycle/{id}")))
        .respond_with(
            ResponseTemplate::new(status).set_body_json(serde_json::json!({ "error": "boom" })),
        )
        .mount(server)
        .await;
}

#[tokio::test]
async fn non_success_status_carries_server_message() {
    let server = MockServer::start().await;
    mount_failure(&server, "2", 500).await;

    let client = client(&server.uri());
    let err = client
        .fetch_motorcycle(&MotorcycleId::from("2"))
        .await
        .unwrap_err();

    match err {
        Error::Status {
            status, message, ..
        } => {
            assert_eq!(status.as_u16(), 500);
            assert_eq!(message.as_deref(), Some("boom"));
        }
        other => panic!("expected status error, got {other:?}"),
    }
}

#[tokio::test]
async fn failing_id_aborts_concurrent_batch() {
    let server = MockServer::start().await;
    mount_motorcycles(&server, &["1", "3", "4"]).await;
    mount_failure(&server, "2", 500).await;

    let client = client(&server.uri());
    let composer = Composer::new(client, 4, 4);

    let err = composer.concurrent().await.unwrap_err();
    assert_eq!(err.status().map(|s| s.as_u16()), Some(500));
}

#[tokio::test]
async fn exchange_skips_non_success_responses() {
    let server = MockServer::start().await;
    mount_motorcycles(&server, &["1", "3", "4"]).await;
    mount_failure(&server, "2", 404).await;

    let client = client(&server.uri());
    let composer = Composer::new(client, 4, 4);

    let motos = composer.exchange().await.unwrap();
    let ids: Vec<&str> = motos.iter().map(|m| m.id.as_str()).collect();
    assert_eq!(ids, ["1", "3", "4"]);
}

#[tokio::test]
async fn nested_uses_fetched_id_for_specification() {
    let server = MockServer::start().await;
    mount_motorcycles(&server, &["1"]).await;
    Mock::given(method("GET"))
        .and(path("/motorcycle/1/specification"))
        .respond_with(ResponseTemplate::new(200).set_body_json(moto("1").specs))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server.uri());
    let pairs = Composer::new(client, 1, 1).nested().await.unwrap();

    assert_eq!(pairs.len(), 1);
    assert_eq!(pairs[0].1, Specification::new(2000, "red", 6500.0));
}

#[tokio::test]
async fn connection_refused_is_a_transport_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = client(&format!("http://{addr}"));
    let err = client
        .fetch_motorcycle(&MotorcycleId::from("1"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Http(_)), "got {err:?}");
}

#[tokio::test]
async fn invalid_base_url_is_rejected() {
    let err = MotorcycleClient::new("not a url").unwrap_err();
    assert!(matches!(err, Error::UrlParse(_)));
}

#[tokio::test]
async fn stream_decodes_frames_and_tolerates_missing_final_newline() {
    let server = MockServer::start().await;
    let mut body = encode_line(&moto("1")).unwrap().to_vec();
    body.extend_from_slice(&serde_json::to_vec(&moto("2")).unwrap());

    Mock::given(method("GET"))
        .and(path("/motorcycles/stream"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "application/json+stream"))
        .mount(&server)
        .await;

    let client = client(&server.uri());
    let motos: Vec<Motorcycle> = client
        .stream_motorcycles()
        .await
        .unwrap()
        .map(|item| item.unwrap())
        .collect()
        .await;

    let ids: Vec<&str> = motos.iter().map(|m| m.id.as_str()).collect();
    assert_eq!(ids, ["1", "2"]);
}

#[tokio::test]
async fn malformed_stream_frame_is_a_codec_error() {
    let server = MockServer::start().await;
    let mut body = encode_line(&moto("1")).unwrap().to_vec();
    body.extend_from_slice(b"not json\n");

    Mock::given(method("GET"))
        .and(path("/motorcycles/stream"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "application/json+stream"))
        .mount(&server)
        .await;

    let client = client(&server.uri());
    let mut stream = client.stream_motorcycles().await.unwrap();

    assert_eq!(stream.next().await.unwrap().unwrap().id.as_str(), "1");
    assert!(matches!(stream.next().await, Some(Err(Error::Codec(_)))));
}
