#![allow(missing_docs)]

use std::thread;

use arbor::{
    command::{CommandError, OutcomeDetail},
    tree::Placement,
    types::ValueKind,
    CommandOutcome, NodeId, NodeRepository, Session, SharedSession, TreeError,
};
use serde_json::json;

fn session_with(lines: &[&str]) -> Session {
    let mut session = Session::default();
    for line in lines {
        let outcome = session.apply_json(line).unwrap();
        assert!(outcome.is_applied(), "{line} -> {outcome:?}");
    }
    session
}

#[test]
fn insert_with_explicit_null_parent_creates_root() {
    let session = session_with(&[
        r#"{"op":"insert","id":1,"parent":null,"title":"home"}"#,
        r#"{"op":"insert","id":2,"parent":1}"#,
    ]);
    let repo = session.repository();
    assert_eq!(repo.roots(), &[NodeId(1)]);
    assert_eq!(repo.get(NodeId(2)).unwrap().breadcrumbs, vec![NodeId(1)]);
    assert_eq!(
        repo.get(NodeId(1)).unwrap().attr("title").and_then(|v| v.as_str()),
        Some("home")
    );
}

#[test]
fn insert_without_id_or_parent_is_rejected() {
    let mut session = Session::default();
    let outcome = session.apply_json(r#"{"op":"insert","id":1}"#).unwrap();
    assert_eq!(outcome.error(), Some(&TreeError::MissingField("parent")));

    let outcome = session.apply_json(r#"{"op":"insert","parent":null}"#).unwrap();
    assert_eq!(outcome.error(), Some(&TreeError::MissingField("id")));
    assert!(session.repository().is_empty());
}

#[test]
fn insert_reports_orphan_placement() {
    let mut session = Session::default();
    let outcome = session
        .apply_json(r#"{"op":"insert","id":3,"parent":99}"#)
        .unwrap();
    match outcome.detail() {
        Some(OutcomeDetail::Inserted(report)) => {
            assert_eq!(report.placement, Placement::Orphaned)
        }
        other => panic!("unexpected detail {other:?}"),
    }
}

#[test]
fn update_with_one_bad_field_is_partially_applied() {
    let mut session = session_with(&[r#"{"op":"insert","id":1,"parent":null,"title":"a","count":1}"#]);
    let outcome = session
        .apply_json(r#"{"op":"update","id":1,"title":5,"count":2.5,"fresh":true}"#)
        .unwrap();

    let CommandOutcome::PartiallyApplied { rejected, .. } = &outcome else {
        panic!("expected partial outcome, got {outcome:?}");
    };
    assert_eq!(rejected.len(), 1);
    assert_eq!(rejected[0].field, "title");
    assert_eq!(rejected[0].current, Some(ValueKind::String));
    assert_eq!(rejected[0].incoming, Some(ValueKind::Number));

    let node = session.repository().get(NodeId(1)).unwrap();
    assert_eq!(node.attr("title").and_then(|v| v.as_str()), Some("a"));
    assert_eq!(node.attr("count"), Some(&2.5f64.into()));
    assert_eq!(node.attr("fresh"), Some(&true.into()));
}

#[test]
fn update_with_every_field_rejected_is_rejected() {
    let mut session = session_with(&[r#"{"op":"insert","id":1,"parent":null,"title":"a"}"#]);
    let outcome = session
        .apply_json(r#"{"op":"update","id":1,"title":[1,2]}"#)
        .unwrap();
    assert!(outcome.is_rejected());
    assert!(matches!(
        outcome.error(),
        Some(TreeError::TypeMismatch { field, .. }) if field == "title"
    ));

    let outcome = session
        .apply_json(r#"{"op":"update","id":1,"parent":7}"#)
        .unwrap();
    assert_eq!(
        outcome.error(),
        Some(&TreeError::ReservedField("parent".to_string()))
    );
}

#[test]
fn update_of_orphan_or_missing_node_is_unknown() {
    let mut session = session_with(&[r#"{"op":"insert","id":3,"parent":99}"#]);
    for raw in [
        r#"{"op":"update","id":3,"title":"x"}"#,
        r#"{"op":"set_visibility","id":3,"visible":false}"#,
        r#"{"op":"update_controls","id":3,"controls":{}}"#,
    ] {
        let outcome = session.apply_json(raw).unwrap();
        assert_eq!(outcome.error(), Some(&TreeError::UnknownId(NodeId(3))), "{raw}");
    }
    let outcome = session.apply_json(r#"{"op":"update","title":"x"}"#).unwrap();
    assert_eq!(outcome.error(), Some(&TreeError::MissingField("id")));
}

#[test]
fn update_controls_merges_and_checks_payload() {
    let mut session = session_with(&[
        r#"{"op":"insert","id":1,"parent":null,"controls":{"speed":1,"mode":"fast"}}"#,
    ]);
    let outcome = session
        .apply_json(r#"{"op":"update_controls","id":1,"controls":{"speed":"slow"}}"#)
        .unwrap();
    assert!(outcome.is_applied());
    let node = session.repository().get(NodeId(1)).unwrap();
    assert_eq!(node.control("speed").and_then(|v| v.as_str()), Some("slow"));
    assert_eq!(node.control("mode").and_then(|v| v.as_str()), Some("fast"));

    let outcome = session
        .apply_json(r#"{"op":"update_controls","id":1,"controls":[1]}"#)
        .unwrap();
    assert_eq!(
        outcome.error(),
        Some(&TreeError::InvalidControlsPayload(ValueKind::List))
    );
}

#[test]
fn insert_shown_defaults_to_visible_and_honours_flag() {
    let mut session = Session::default();
    session
        .apply_json(r#"{"op":"insert_shown","id":1,"parent":null}"#)
        .unwrap();
    session
        .apply_json(r#"{"op":"insert_shown","id":2,"parent":1,"visible":false}"#)
        .unwrap();
    let repo = session.repository();
    assert!(repo.get(NodeId(1)).unwrap().visible);
    assert!(!repo.get(NodeId(2)).unwrap().visible);
    assert_eq!(repo.visibility().unshown_ids(), vec![NodeId(2)]);
}

#[test]
fn bulk_visibility_touches_only_changed_nodes() {
    let mut session = session_with(&[
        r#"{"op":"insert","id":1,"parent":null}"#,
        r#"{"op":"insert","id":2,"parent":1,"visible":false}"#,
        r#"{"op":"insert","id":3,"parent":1}"#,
    ]);
    let outcome = session
        .apply_json(r#"{"op":"set_visibility_all","visible":true}"#)
        .unwrap();
    assert_eq!(
        outcome.detail(),
        Some(&OutcomeDetail::BulkVisibility {
            visible: true,
            nodes: vec![NodeId(2)],
        })
    );
    assert!(session.repository().visibility().all_shown());

    session
        .apply_json(r#"{"op":"set_visibility_all","visible":false}"#)
        .unwrap();
    assert!(session.repository().visibility().none_shown());
}

#[test]
fn cascade_commands_report_affected_nodes() {
    let mut session = session_with(&[
        r#"{"op":"insert","id":1,"parent":null}"#,
        r#"{"op":"insert","id":2,"parent":1}"#,
        r#"{"op":"insert","id":3,"parent":2}"#,
    ]);
    let outcome = session
        .apply_json(r#"{"op":"detach_subtree","id":2}"#)
        .unwrap();
    let json = serde_json::to_value(&outcome).unwrap();
    assert_eq!(
        json,
        json!({
            "status": "applied",
            "detail": {"kind": "detached", "root": 2, "affected": [3, 2]},
        })
    );

    let outcome = session
        .apply_json(r#"{"op":"delete_subtree","id":2}"#)
        .unwrap();
    assert!(outcome.is_applied());
    assert!(session.repository().is_orphan(NodeId(3)));
}

#[test]
fn rejected_outcome_serializes_error_text() {
    let mut session = Session::default();
    let outcome = session
        .apply_json(r#"{"op":"delete_subtree","id":8}"#)
        .unwrap();
    let json = serde_json::to_value(&outcome).unwrap();
    assert_eq!(json["status"], "rejected");
    assert!(json["error"].as_str().unwrap().contains('8'));
    assert!(json.get("rejected").is_none());
}

#[test]
fn undecodable_payloads_are_errors() {
    let mut session = Session::default();
    for raw in [
        "not json",
        r#"{"op":"rename","id":1}"#,
        r#"{"id":1,"parent":null}"#,
        r#"{"op":"insert","id":"one","parent":null}"#,
    ] {
        let err = session.apply_json(raw).unwrap_err();
        assert!(matches!(err, CommandError::Decode(_)), "{raw}");
    }
}

#[test]
fn shared_session_serializes_concurrent_writers() {
    let shared = SharedSession::new(NodeRepository::new());
    shared
        .apply_json(r#"{"op":"insert","id":0,"parent":null}"#)
        .unwrap();

    let handles: Vec<_> = (0..4u64)
        .map(|worker| {
            let shared = shared.clone();
            thread::spawn(move || {
                for n in 0..25u64 {
                    let id = 1 + worker * 100 + n;
                    let parent = if n == 0 { 0 } else { id - 1 };
                    let raw = format!(r#"{{"op":"insert","id":{id},"parent":{parent}}}"#);
                    let outcome = shared.apply_json(&raw).unwrap();
                    assert!(outcome.is_applied());
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    shared.with_repository(|repo| {
        assert_eq!(repo.len(), 101);
        assert_eq!(repo.orphan_count(), 0);
        assert_eq!(repo.get(NodeId(325)).unwrap().depth(), 25);
        assert!(repo.verify().success);
    });
}
