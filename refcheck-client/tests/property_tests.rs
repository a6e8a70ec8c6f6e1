//! Property tests for the deterministic pieces: canonical cache keys,
//! the forward-only transition relation, and the audit comparison.

use proptest::prelude::*;
use refcheck_client::QueryDescriptor;
use refcheck_core::{compare, ReferenceStatus, Transition};
use serde_json::json;

fn arb_status() -> impl Strategy<Value = ReferenceStatus> {
    prop_oneof![
        Just(ReferenceStatus::Pending),
        Just(ReferenceStatus::Sent),
        Just(ReferenceStatus::Received),
        Just(ReferenceStatus::Completed),
        Just(ReferenceStatus::Rejected),
    ]
}

fn arb_transition() -> impl Strategy<Value = Transition> {
    prop_oneof![
        Just(Transition::Send),
        Just(Transition::Receive),
        Just(Transition::Complete),
        Just(Transition::Reject),
    ]
}

proptest! {
    #[test]
    fn cache_keys_ignore_argument_order(
        args in proptest::collection::vec(("[a-z]{1,8}", "[a-zA-Z0-9]{0,8}"), 0..6)
    ) {
        let forward = args.iter().fold(
            QueryDescriptor::new("referenceList"),
            |descriptor, (key, value)| descriptor.arg(key.clone(), value),
        );
        let reversed = args.iter().rev().fold(
            QueryDescriptor::new("referenceList"),
            |descriptor, (key, value)| descriptor.arg(key.clone(), value),
        );
        prop_assert_eq!(forward.cache_key(), reversed.cache_key());
    }

    #[test]
    fn transition_sequences_never_move_backwards(
        transitions in proptest::collection::vec(arb_transition(), 0..12)
    ) {
        let mut status = ReferenceStatus::Pending;
        for transition in transitions {
            match status.apply(transition) {
                Some(next) => {
                    prop_assert!(next.rank() > status.rank());
                    status = next;
                }
                None => {
                    prop_assert!(status.apply(transition).is_none());
                }
            }
        }
    }

    #[test]
    fn reachable_statuses_follow_the_lifecycle_graph(
        transitions in proptest::collection::vec(arb_transition(), 0..12)
    ) {
        // From Pending, the only reachable statuses are those on the
        // documented graph, and terminal states absorb.
        let mut status = ReferenceStatus::Pending;
        for transition in transitions {
            if status.is_terminal() {
                prop_assert!(status.apply(transition).is_none());
            }
            if let Some(next) = status.apply(transition) {
                let legal = matches!(
                    (status, next),
                    (ReferenceStatus::Pending, ReferenceStatus::Sent)
                        | (ReferenceStatus::Sent, ReferenceStatus::Received)
                        | (ReferenceStatus::Sent, ReferenceStatus::Rejected)
                        | (ReferenceStatus::Received, ReferenceStatus::Completed)
                );
                prop_assert!(legal);
                status = next;
            }
        }
    }

    #[test]
    fn guards_are_consistent_with_apply(
        status in arb_status(),
        transition in arb_transition(),
    ) {
        prop_assert_eq!(
            status.can_apply(transition),
            status.apply(transition).is_some()
        );
    }

    #[test]
    fn compare_covers_exactly_the_requested_fields(
        fields in proptest::collection::hash_set("[a-z]{1,8}", 0..6)
    ) {
        let names: Vec<&str> = fields.iter().map(String::as_str).collect();
        let diff = compare(&names, &json!({}), &json!({}));
        prop_assert_eq!(diff.len(), fields.len());
        for field in &fields {
            prop_assert!(diff.contains_key(field));
        }
    }
}

#[test]
fn audit_scenario_from_the_reference_domain() {
    let diff = compare(
        &["startDate"],
        &json!({"startDate": "2024-01-01"}),
        &json!({"startDate": "2024-02-01"}),
    );
    assert_eq!(diff["startDate"].from_referee, json!("2024-01-01"));
    assert_eq!(diff["startDate"].from_reference, json!("2024-02-01"));
}
