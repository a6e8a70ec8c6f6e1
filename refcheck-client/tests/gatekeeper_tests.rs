//! Gatekeeper behavior: credential attachment, failure classification,
//! notification policy, and dispatch serialization behind the exclusion
//! window.


use refcheck_client::transport::ApiRequest;
use refcheck_client::{RetryConfig, SyncError, CSRF_HEADER};
use refcheck_core::Severity;
use serde_json::json;
use std::sync::Arc;
use test_support::{
    build_client, build_client_with, settle, test_config, MockTransport, RecordingNotifier,
    Scripted,
};

#[tokio::test(start_paused = true)]
async fn success_attaches_csrf_token_and_raises_no_notice() {
    let transport = MockTransport::new();
    let notifier = RecordingNotifier::new();
    let client = build_client(Arc::clone(&transport), Arc::clone(&notifier));
    client.session().set_csrf_token("tok-1");
    transport.push_ok(200, json!({"ok": true}));

    let response = client
        .gatekeeper()
        .dispatch(&ApiRequest::get("/references"))
        .await
        .unwrap();

    assert_eq!(response.status, 200);
    assert_eq!(notifier.count(), 0);
    let requests = transport.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].header(CSRF_HEADER), Some("tok-1"));
}

#[tokio::test(start_paused = true)]
async fn generic_failure_notifies_once_with_status_and_body() {
    let transport = MockTransport::new();
    let notifier = RecordingNotifier::new();
    let client = build_client(Arc::clone(&transport), Arc::clone(&notifier));
    transport.push_ok(500, json!("database unavailable"));

    let err = client
        .gatekeeper()
        .dispatch(&ApiRequest::get("/references"))
        .await
        .unwrap_err();

    assert!(matches!(err, SyncError::Http { status: 500, .. }));
    let messages = notifier.messages();
    assert_eq!(messages.len(), 1);
    assert!(messages[0].0.contains("500"));
    assert!(messages[0].0.contains("database unavailable"));
}

#[tokio::test(start_paused = true)]
async fn network_failure_notifies_and_propagates() {
    let transport = MockTransport::new();
    let notifier = RecordingNotifier::new();
    let client = build_client(Arc::clone(&transport), Arc::clone(&notifier));
    transport.push(Scripted::network_error("connection refused"));

    let err = client
        .gatekeeper()
        .dispatch(&ApiRequest::get("/references"))
        .await
        .unwrap_err();

    assert!(matches!(err, SyncError::Network(_)));
    assert_eq!(notifier.count(), 1);
}

#[tokio::test(start_paused = true)]
async fn configured_retry_recovers_from_a_transient_transport_failure() {
    let transport = MockTransport::new();
    let notifier = RecordingNotifier::new();
    let mut config = test_config();
    config.retry = RetryConfig {
        max_attempts: 2,
        backoff_ms: 10,
    };
    let client = build_client_with(config, Arc::clone(&transport), Arc::clone(&notifier));
    transport.push(Scripted::network_error("connection reset"));
    transport.push_ok(200, json!({"ok": true}));

    let response = client
        .gatekeeper()
        .dispatch(&ApiRequest::get("/references"))
        .await
        .unwrap();

    assert_eq!(response.status, 200);
    assert_eq!(transport.request_count(), 2);
    // The recovered request raises no notice.
    assert_eq!(notifier.count(), 0);
}

#[tokio::test(start_paused = true)]
async fn forbidden_notifies_without_touching_session() {
    let transport = MockTransport::new();
    let notifier = RecordingNotifier::new();
    let client = build_client(Arc::clone(&transport), Arc::clone(&notifier));
    transport.push_ok(403, json!({"error": "not yours"}));

    let err = client
        .gatekeeper()
        .dispatch(&ApiRequest::get("/references"))
        .await
        .unwrap_err();

    assert!(matches!(err, SyncError::PermissionDenied));
    assert!(!client.session().is_expired());
    let messages = notifier.messages();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0], ("Insufficient permission".to_string(), Severity::Warning));
}

#[tokio::test(start_paused = true)]
async fn unauthorized_sets_expiry_flag_and_notifies_once_across_requests() {
    let transport = MockTransport::new();
    let notifier = RecordingNotifier::new();
    let client = build_client(Arc::clone(&transport), Arc::clone(&notifier));
    transport.set_handler(|_| Scripted::ok(401, json!({"error": "unauthorized"})));

    let mut handles = Vec::new();
    for _ in 0..3 {
        let gatekeeper = Arc::clone(client.gatekeeper());
        handles.push(tokio::spawn(async move {
            gatekeeper.dispatch(&ApiRequest::get("/references")).await
        }));
    }
    for handle in handles {
        let err = handle.await.unwrap().unwrap_err();
        assert!(matches!(err, SyncError::SessionExpired));
    }

    assert!(client.session().is_expired());
    // Three 401 responses, one expiry notice.
    assert_eq!(notifier.count(), 1);
    assert_eq!(notifier.messages()[0].1, Severity::Error);
}

#[tokio::test(start_paused = true)]
async fn dispatches_queue_behind_the_exclusion_window() {
    let transport = MockTransport::new();
    let notifier = RecordingNotifier::new();
    let client = build_client(Arc::clone(&transport), Arc::clone(&notifier));
    transport.set_handler(|_| Scripted::ok(200, json!({"ok": true})));
    client.session().set_csrf_token("stale");

    let window = client.gatekeeper().exclusion_window().await;

    let mut handles = Vec::new();
    for i in 0..4 {
        let gatekeeper = Arc::clone(client.gatekeeper());
        handles.push(tokio::spawn(async move {
            gatekeeper
                .dispatch(&ApiRequest::get(format!("/references/{i}")))
                .await
        }));
    }
    settle().await;
    assert_eq!(transport.request_count(), 0, "dispatch began while window held");

    // Rotate the token, then release the window.
    client.session().set_csrf_token("fresh");
    drop(window);
    settle().await;

    for handle in handles {
        assert!(handle.await.unwrap().is_ok());
    }
    let requests = transport.requests();
    assert_eq!(requests.len(), 4);
    for request in requests {
        assert_eq!(request.header(CSRF_HEADER), Some("fresh"));
    }
}
