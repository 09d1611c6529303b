//! HTTP invoker tests against an in-process node service

use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    routing::{get, post},
};
use serde_json::{Value as JsonValue, json};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tributary_client::{
    ClientConfig, InvokeErrorKind, NodeApi, NodeClient, RemoteInvoker, RetryPolicy, Verb,
};
use tributary_core::domain::event::{Event, EventStatus};
use tributary_core::domain::run::{CorrelationId, PipelineRun};

const PREFIX: &str = "/v1.0/invoke/nodeapp/method";

type Hits = Arc<AtomicUsize>;

async fn dataset_config(Query(params): Query<HashMap<String, String>>) -> Json<JsonValue> {
    let dataset = params.get("dataset").cloned().unwrap_or_default();
    Json(json!({
        "name": dataset,
        "source": "s3://raw",
        "destination": "s3://clean",
        "schema": ["id", "ts", "amt"],
        "partitions": ["dt"]
    }))
}

async fn record_event(Json(body): Json<JsonValue>) -> Json<JsonValue> {
    Json(json!({ "message": "Event recorded successfully", "event": body }))
}

async fn get_events(Query(params): Query<HashMap<String, String>>) -> (StatusCode, String) {
    if params.get("correlationId").map(String::as_str) == Some("corr-none") {
        return (StatusCode::OK, String::new());
    }
    let event = json!({
        "status": "start",
        "pipeline": "data_engineering_pipeline",
        "dataset": params.get("dataset"),
        "timestamp": "2024-05-01T10:00:00Z",
        "correlationId": params.get("correlationId"),
        "processStartTime": "2024-05-01T10:00:00Z",
        "details": {}
    });
    if params.get("correlationId").map(String::as_str) == Some("corr-single") {
        // A key holding one value is answered with the bare stored text
        return (StatusCode::OK, json!(event.to_string()).to_string());
    }
    // The state store hands back the JSON text each event was saved as
    (StatusCode::OK, json!([event.to_string()]).to_string())
}

async fn unavailable(State(hits): State<Hits>) -> (StatusCode, &'static str) {
    hits.fetch_add(1, Ordering::SeqCst);
    (StatusCode::SERVICE_UNAVAILABLE, "sidecar unavailable")
}

async fn slow() -> Json<JsonValue> {
    tokio::time::sleep(Duration::from_secs(2)).await;
    Json(json!({}))
}

async fn empty() -> StatusCode {
    StatusCode::OK
}

async fn spawn_node(hits: Hits) -> String {
    let app = Router::new()
        .route(&format!("{PREFIX}/datasetConfig"), get(dataset_config))
        .route(&format!("{PREFIX}/recordEvent"), post(record_event))
        .route(&format!("{PREFIX}/getEvents"), get(get_events))
        .route(&format!("{PREFIX}/unavailable"), get(unavailable).post(unavailable))
        .route(&format!("{PREFIX}/slow"), get(slow))
        .route(&format!("{PREFIX}/empty"), get(empty))
        .with_state(hits);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{}", addr)
}

fn client(base_url: &str) -> NodeClient {
    NodeClient::new(ClientConfig::new(base_url))
}

#[tokio::test]
async fn test_dataset_config_is_sent_as_query() {
    let base = spawn_node(Hits::default()).await;
    let api = NodeApi::new(Arc::new(client(&base)));

    let config = api.dataset_config("transactions_raw").await.unwrap();

    assert_eq!(config.name, "transactions_raw");
    assert_eq!(config.source, "s3://raw");
    assert_eq!(config.partitions, vec!["dt"]);
}

#[tokio::test]
async fn test_record_event_is_sent_as_json_body() {
    let base = spawn_node(Hits::default()).await;
    let api = NodeApi::new(Arc::new(client(&base)));

    let mut run = PipelineRun::new(
        CorrelationId::new("corr-9"),
        "transactions_raw",
        "data_engineering_pipeline",
    );
    let ts = run.next_timestamp();
    let event = Event::for_run(&run, EventStatus::Start, ts, Default::default());

    let ack = api.record_event(&event).await.unwrap();

    assert_eq!(ack["event"]["correlationId"], "corr-9");
    assert_eq!(ack["event"]["status"], "start");
}

#[tokio::test]
async fn test_get_events_decodes_stored_text() {
    let base = spawn_node(Hits::default()).await;
    let api = NodeApi::new(Arc::new(client(&base)));

    let events = api
        .get_events("transactions_raw", &CorrelationId::new("corr-3"))
        .await
        .unwrap();

    assert_eq!(events.len(), 1);
    assert_eq!(events[0].correlation_id.as_str(), "corr-3");

    let none = api
        .get_events("transactions_raw", &CorrelationId::new("corr-none"))
        .await
        .unwrap();
    assert!(none.is_empty());
}

#[tokio::test]
async fn test_get_events_accepts_single_stored_value() {
    let base = spawn_node(Hits::default()).await;
    let api = NodeApi::new(Arc::new(client(&base)));

    let events = api
        .get_events("transactions_raw", &CorrelationId::new("corr-single"))
        .await
        .unwrap();

    assert_eq!(events.len(), 1);
    assert_eq!(events[0].correlation_id.as_str(), "corr-single");
    assert_eq!(events[0].dataset, "transactions_raw");
}

#[tokio::test]
async fn test_empty_body_decodes_as_null() {
    let base = spawn_node(Hits::default()).await;

    let value = client(&base).invoke("empty", Verb::Get, None).await.unwrap();

    assert!(value.is_null());
}

#[tokio::test]
async fn test_server_error_is_protocol_error() {
    let hits = Hits::default();
    let base = spawn_node(hits.clone()).await;

    let err = client(&base)
        .invoke("unavailable", Verb::Get, None)
        .await
        .unwrap_err();

    assert_eq!(err.kind, InvokeErrorKind::Protocol);
    assert_eq!(err.status, Some(503));
    assert!(err.message.contains("sidecar unavailable"));
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_unknown_method_is_not_found() {
    let base = spawn_node(Hits::default()).await;

    let err = client(&base)
        .invoke("noSuchMethod", Verb::Get, None)
        .await
        .unwrap_err();

    assert!(err.is_not_found());
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn test_timeout_is_transport_error() {
    let base = spawn_node(Hits::default()).await;
    let client = NodeClient::new(
        ClientConfig::new(base.as_str()).with_timeout(Duration::from_millis(200)),
    );

    let err = client.invoke("slow", Verb::Get, None).await.unwrap_err();

    assert_eq!(err.kind, InvokeErrorKind::Transport);
    assert!(err.message.contains("timed out"));
}

#[tokio::test]
async fn test_connection_refused_is_transport_error() {
    // Grab a free port, then close it so nothing is listening
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = client(&format!("http://{}", addr))
        .invoke("config", Verb::Get, None)
        .await
        .unwrap_err();

    assert_eq!(err.kind, InvokeErrorKind::Transport);
}

#[tokio::test]
async fn test_get_is_retried_with_backoff() {
    let hits = Hits::default();
    let base = spawn_node(hits.clone()).await;
    let client = NodeClient::new(
        ClientConfig::new(base.as_str())
            .with_retry(RetryPolicy::exponential(3, Duration::from_millis(10))),
    );

    let err = client
        .invoke("unavailable", Verb::Get, None)
        .await
        .unwrap_err();

    assert_eq!(err.status, Some(503));
    assert_eq!(hits.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_post_is_not_retried_without_opt_in() {
    let hits = Hits::default();
    let base = spawn_node(hits.clone()).await;
    let client = NodeClient::new(
        ClientConfig::new(base.as_str())
            .with_retry(RetryPolicy::exponential(3, Duration::from_millis(10))),
    );

    let result = client
        .invoke("unavailable", Verb::Post, Some(json!({ "status": "start" })))
        .await;

    assert!(result.is_err());
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}
