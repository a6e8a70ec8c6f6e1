//! Cache store behavior: shared entries, tag-driven invalidation,
//! fetch supersession, and idle eviction.


use refcheck_client::query::{kinds, Tag};
use refcheck_client::EntryStatus;
use refcheck_core::{ListReferencesRequest, ReferenceStatus};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use test_support::{build_client, settle, MockTransport, RecordingNotifier, Scripted};

#[tokio::test(start_paused = true)]
async fn subscribe_fetches_once_and_serves_the_result() {
    let transport = MockTransport::new();
    let notifier = RecordingNotifier::new();
    let client = build_client(Arc::clone(&transport), Arc::clone(&notifier));
    transport.push_ok(200, json!({"references": [], "total": 0}));

    let spec = client.reference_list(&ListReferencesRequest::default());
    let snapshot = client.subscribe(&spec);
    assert_eq!(snapshot.status, EntryStatus::Fetching);
    assert!(snapshot.data.is_none());

    settle().await;
    let snapshot = client.store().peek(&spec.descriptor).unwrap();
    assert_eq!(snapshot.status, EntryStatus::Fresh);
    assert_eq!(snapshot.data, Some(json!({"references": [], "total": 0})));
    assert_eq!(transport.request_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn equivalent_descriptors_share_one_entry_and_one_fetch() {
    let transport = MockTransport::new();
    let notifier = RecordingNotifier::new();
    let client = build_client(Arc::clone(&transport), Arc::clone(&notifier));
    transport.set_handler(|_| Scripted::ok(200, json!({"references": [], "total": 0})));

    let filter_a = ListReferencesRequest {
        status: Some(ReferenceStatus::Sent),
        page: Some(1),
        ..Default::default()
    };
    let spec_a = client.reference_list(&filter_a);
    client.subscribe(&spec_a);
    settle().await;

    // Same filters: the entry is Fresh, so the second subscription must
    // not fetch again.
    let spec_b = client.reference_list(&filter_a.clone());
    let snapshot = client.subscribe(&spec_b);
    settle().await;

    assert_eq!(snapshot.status, EntryStatus::Fresh);
    assert_eq!(client.store().entry_count(), 1);
    assert_eq!(transport.request_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn tag_fanout_refetches_every_subscribed_entry_exactly_once() {
    let transport = MockTransport::new();
    let notifier = RecordingNotifier::new();
    let client = build_client(Arc::clone(&transport), Arc::clone(&notifier));
    let id = refcheck_core::new_entity_id();
    transport.set_handler(move |request| {
        if request.path == "/references" {
            Scripted::ok(200, json!({"references": [], "total": 0}))
        } else {
            Scripted::ok(200, test_support::reference_json(id, "Sent"))
        }
    });

    let list = client.reference_list(&ListReferencesRequest::default());
    let detail = client.reference_detail(id);
    client.subscribe(&list);
    client.subscribe(&detail);
    settle().await;
    assert_eq!(transport.request_count(), 2);

    // The identity tag is passed twice and the list tag maps to the other
    // entry: each entry still refetches exactly once.
    client.invalidate(&[
        Tag::id(kinds::REFERENCE, id),
        Tag::id(kinds::REFERENCE, id),
        Tag::list(kinds::REFERENCE),
    ]);
    settle().await;

    assert_eq!(transport.request_count(), 4);
    assert_eq!(transport.requests_to("/references"), 2);
    assert_eq!(transport.requests_to(&format!("/references/{id}")), 2);
}

#[tokio::test(start_paused = true)]
async fn invalidating_an_unsubscribed_entry_marks_stale_without_fetching() {
    let transport = MockTransport::new();
    let notifier = RecordingNotifier::new();
    let client = build_client(Arc::clone(&transport), Arc::clone(&notifier));
    transport.set_handler(|_| Scripted::ok(200, json!({"references": [], "total": 0})));

    let spec = client.reference_list(&ListReferencesRequest::default());
    client.subscribe(&spec);
    settle().await;
    client.unsubscribe(&spec.descriptor);

    client.invalidate(&[Tag::list(kinds::REFERENCE)]);
    settle().await;

    assert_eq!(transport.request_count(), 1);
    let snapshot = client.store().peek(&spec.descriptor).unwrap();
    assert_eq!(snapshot.status, EntryStatus::Stale);
    // The stale result is still served to a late reader.
    assert!(snapshot.data.is_some());
}

#[tokio::test(start_paused = true)]
async fn superseded_fetch_never_overwrites_newer_state() {
    let transport = MockTransport::new();
    let notifier = RecordingNotifier::new();
    let client = build_client(Arc::clone(&transport), Arc::clone(&notifier));
    // First response is slow and stale; the follow-up is fast and current.
    transport.push(Scripted::delayed(200, json!({"version": "old"}), 50));
    transport.push(Scripted::ok(200, json!({"version": "new"})));

    let spec = client.reference_list(&ListReferencesRequest::default());
    client.subscribe(&spec);
    // Let the first fetch start and park on its delay.
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }

    client.invalidate(&[Tag::list(kinds::REFERENCE)]);
    tokio::time::sleep(Duration::from_millis(100)).await;
    settle().await;

    let snapshot = client.store().peek(&spec.descriptor).unwrap();
    assert_eq!(snapshot.status, EntryStatus::Fresh);
    assert_eq!(snapshot.data, Some(json!({"version": "new"})));
    assert_eq!(transport.request_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn failed_fetch_records_the_error_and_notifies() {
    let transport = MockTransport::new();
    let notifier = RecordingNotifier::new();
    let client = build_client(Arc::clone(&transport), Arc::clone(&notifier));
    transport.push(Scripted::network_error("connection refused"));

    let spec = client.reference_list(&ListReferencesRequest::default());
    client.subscribe(&spec);
    settle().await;

    let snapshot = client.store().peek(&spec.descriptor).unwrap();
    assert_eq!(snapshot.status, EntryStatus::Error);
    assert!(snapshot.last_error.unwrap().contains("connection refused"));
    assert_eq!(notifier.count(), 1);
}

#[tokio::test(start_paused = true)]
async fn idle_entries_evict_after_the_grace_period() {
    let transport = MockTransport::new();
    let notifier = RecordingNotifier::new();
    let client = build_client(Arc::clone(&transport), Arc::clone(&notifier));
    transport.set_handler(|_| Scripted::ok(200, json!({"references": [], "total": 0})));

    let spec = client.reference_list(&ListReferencesRequest::default());
    client.subscribe(&spec);
    settle().await;
    assert_eq!(client.store().entry_count(), 1);

    client.unsubscribe(&spec.descriptor);
    // Still present within the grace period.
    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(client.store().entry_count(), 1);
    tokio::time::sleep(Duration::from_secs(61)).await;
    assert_eq!(client.store().entry_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn resubscribing_cancels_a_pending_eviction() {
    let transport = MockTransport::new();
    let notifier = RecordingNotifier::new();
    let client = build_client(Arc::clone(&transport), Arc::clone(&notifier));
    transport.set_handler(|_| Scripted::ok(200, json!({"references": [], "total": 0})));

    let spec = client.reference_list(&ListReferencesRequest::default());
    client.subscribe(&spec);
    settle().await;
    client.unsubscribe(&spec.descriptor);

    // Came back into use before the timer fired.
    client.subscribe(&spec);
    tokio::time::sleep(Duration::from_secs(200)).await;
    assert_eq!(client.store().entry_count(), 1);
}
