//! Integration tests for the dispatch client against a mock sink.

use std::time::Duration;

use ormcast_core::{EnvelopeBuilder, EventEnvelope, NotificationKind, SignalArgs};
use ormcast_delivery::{ClientConfig, DeliveryError, DispatchClient, DispatchOutcome};
use ormcast_testing::{fake_source_descriptor, fake_source_instance, MockSink};
use serde_json::json;

fn post_save_envelope() -> EventEnvelope {
    EnvelopeBuilder::new("django-orm")
        .build(
            &fake_source_descriptor(),
            NotificationKind::PostSave,
            SignalArgs::new()
                .with_instance(fake_source_instance())
                .with_kwarg("created", true)
                .with_kwarg("using", "default"),
        )
        .unwrap()
}

#[tokio::test]
async fn successful_dispatch_returns_receipt() {
    let sink = MockSink::start().await;
    sink.respond_ok().await;

    let client = DispatchClient::with_defaults().unwrap();
    let outcome = client.dispatch(&post_save_envelope(), Some(&sink.url())).await.unwrap();

    match outcome {
        DispatchOutcome::Delivered(receipt) => assert_eq!(receipt.status_code, 200),
        DispatchOutcome::Skipped => panic!("dispatch should not be skipped with a sink"),
    }
    sink.assert_request_count(1).await;
}

#[tokio::test]
async fn event_metadata_travels_as_headers() {
    let sink = MockSink::start().await;
    let envelope = post_save_envelope();
    sink.respond_ok_expecting_headers(&[
        ("ce-specversion", "1.0"),
        ("ce-id", &envelope.id.to_string()),
        ("ce-type", "django.orm.post.save"),
        ("ce-source", "django-orm"),
        ("ce-subject", "DCE:app.fakesourcemodel/1"),
        ("ce-djangoapp", "app"),
        ("ce-djangomodel", "fakesourcemodel"),
        ("ce-originid", &envelope.id.to_string()),
        ("content-type", "application/json"),
    ])
    .await;

    let client = DispatchClient::with_defaults().unwrap();
    let outcome = client.dispatch(&envelope, Some(&sink.url())).await.unwrap();
    assert!(matches!(outcome, DispatchOutcome::Delivered(_)));
}

#[tokio::test]
async fn payload_travels_as_json_body() {
    let sink = MockSink::start().await;
    sink.respond_ok().await;

    let client = DispatchClient::with_defaults().unwrap();
    client.dispatch(&post_save_envelope(), Some(&sink.url())).await.unwrap();

    let requests = sink.received_requests().await;
    assert_eq!(requests.len(), 1);

    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(body["db_table"], json!("app_fakesourcemodel"));
    assert_eq!(body["signal_kwargs"], json!({"created": true, "using": "default"}));
    assert_eq!(body["data"], json!({"name": "fake_source", "enabled": "True"}));
}

#[tokio::test]
async fn server_error_propagates_as_delivery_error() {
    let sink = MockSink::start().await;
    sink.respond_with_status(500).await;

    let client = DispatchClient::with_defaults().unwrap();
    let err = client.dispatch(&post_save_envelope(), Some(&sink.url())).await.unwrap_err();

    assert!(matches!(err, DeliveryError::ServerError { status_code: 500, .. }));
    assert_eq!(err.status_code(), Some(500));
}

#[tokio::test]
async fn client_error_propagates_as_delivery_error() {
    let sink = MockSink::start().await;
    sink.respond_with_status(404).await;

    let client = DispatchClient::with_defaults().unwrap();
    let err = client.dispatch(&post_save_envelope(), Some(&sink.url())).await.unwrap_err();

    assert!(matches!(err, DeliveryError::ClientError { status_code: 404, .. }));
}

#[tokio::test]
async fn missing_sink_performs_zero_network_calls() {
    let sink = MockSink::start().await;
    sink.respond_ok().await;

    let client = DispatchClient::with_defaults().unwrap();
    let outcome = client.dispatch(&post_save_envelope(), None).await.unwrap();

    assert_eq!(outcome, DispatchOutcome::Skipped);
    sink.assert_request_count(0).await;
}

#[tokio::test]
async fn unreachable_sink_is_a_network_error() {
    let client = DispatchClient::with_defaults().unwrap();
    let err = client
        .dispatch(&post_save_envelope(), Some("http://127.0.0.1:1/events"))
        .await
        .unwrap_err();

    assert!(matches!(err, DeliveryError::Network { .. }));
}

#[tokio::test]
async fn slow_sink_times_out() {
    let sink = MockSink::start().await;
    sink.respond_delayed(200, Duration::from_secs(5)).await;

    let config = ClientConfig { timeout: Duration::from_millis(250), ..ClientConfig::default() };
    let client = DispatchClient::new(config).unwrap();
    let err = client.dispatch(&post_save_envelope(), Some(&sink.url())).await.unwrap_err();

    assert!(matches!(err, DeliveryError::Timeout { .. }));
}
