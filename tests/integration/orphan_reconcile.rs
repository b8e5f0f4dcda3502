#![allow(missing_docs)]

use arbor::{
    tree::{Placement, TreeSnapshot},
    NodeDraft, NodeId, NodeRepository, OrphanSweep, RepositoryOptions, TreeError,
};

fn ids(raw: &[u64]) -> Vec<NodeId> {
    raw.iter().copied().map(NodeId).collect()
}

fn shape(snapshot: &TreeSnapshot) -> Vec<(u64, Vec<u64>)> {
    snapshot
        .shape()
        .into_iter()
        .map(|(id, children)| (id.0, children.into_iter().map(|c| c.0).collect()))
        .collect()
}

#[test]
fn child_inserted_before_parent_attaches_when_parent_arrives() {
    let mut repo = NodeRepository::new();
    repo.insert(NodeDraft::root(1u64)).unwrap();
    repo.insert(NodeDraft::child(2u64, 1u64)).unwrap();

    let early = repo.insert(NodeDraft::child(3u64, 99u64)).unwrap();
    assert_eq!(early.placement, Placement::Orphaned);
    assert!(repo.is_orphan(NodeId(3)));
    assert!(repo.get(NodeId(3)).is_none());

    let late = repo.insert(NodeDraft::child(99u64, 1u64)).unwrap();
    assert_eq!(late.placement, Placement::Attached);
    assert_eq!(late.promoted, ids(&[3]));
    assert_eq!(repo.orphan_count(), 0);

    let three = repo.get(NodeId(3)).unwrap();
    assert_eq!(three.breadcrumbs, ids(&[1, 99]));
    assert_eq!(
        shape(&repo.snapshot()),
        vec![
            (1, vec![2, 99]),
            (2, vec![]),
            (99, vec![3]),
            (3, vec![]),
        ]
    );
    assert!(repo.verify().success);
}

#[test]
fn siblings_waiting_on_one_parent_attach_in_id_order() {
    let mut repo = NodeRepository::new();
    repo.insert(NodeDraft::child(7u64, 5u64)).unwrap();
    repo.insert(NodeDraft::child(6u64, 5u64)).unwrap();
    repo.insert(NodeDraft::child(8u64, 5u64)).unwrap();

    let report = repo.insert(NodeDraft::root(5u64)).unwrap();
    assert_eq!(report.promoted, ids(&[6, 7, 8]));
    assert_eq!(repo.children(NodeId(5)).unwrap(), ids(&[6, 7, 8]).as_slice());
}

#[test]
fn single_level_sweep_leaves_grandchildren_waiting() {
    let mut repo = NodeRepository::new();
    repo.insert(NodeDraft::child(30u64, 20u64)).unwrap();
    repo.insert(NodeDraft::child(20u64, 10u64)).unwrap();

    let report = repo.insert(NodeDraft::root(10u64)).unwrap();
    assert_eq!(report.promoted, ids(&[20]));
    assert!(repo.is_live(NodeId(20)));
    assert!(repo.is_orphan(NodeId(30)));
    assert!(repo.verify().success);
}

#[test]
fn transitive_sweep_attaches_whole_waiting_chain() {
    let opts = RepositoryOptions::new().orphan_sweep(OrphanSweep::Transitive);
    let mut repo = NodeRepository::with_options(opts);
    repo.insert(NodeDraft::child(40u64, 30u64)).unwrap();
    repo.insert(NodeDraft::child(30u64, 20u64)).unwrap();
    repo.insert(NodeDraft::child(20u64, 10u64)).unwrap();

    let report = repo.insert(NodeDraft::root(10u64)).unwrap();
    assert_eq!(report.promoted, ids(&[20, 30, 40]));
    assert_eq!(repo.orphan_count(), 0);
    assert_eq!(repo.get(NodeId(40)).unwrap().breadcrumbs, ids(&[10, 20, 30]));
    assert!(repo.verify().success);
}

#[test]
fn orphan_ids_count_as_taken() {
    let mut repo = NodeRepository::new();
    repo.insert(NodeDraft::child(3u64, 99u64)).unwrap();
    let err = repo.insert(NodeDraft::root(3u64)).unwrap_err();
    assert_eq!(err, TreeError::DuplicateId(NodeId(3)));
    assert_eq!(repo.orphan_count(), 1);
    assert!(repo.is_empty());
}

#[test]
fn orphan_keeps_payload_through_promotion() {
    let mut repo = NodeRepository::new();
    repo.insert(
        NodeDraft::child(2u64, 1u64)
            .attr("title", "late")
            .control("speed", 3i64)
            .visibility(false),
    )
    .unwrap();
    repo.insert(NodeDraft::root(1u64)).unwrap();

    let node = repo.get(NodeId(2)).unwrap();
    assert_eq!(node.attr("title").and_then(|v| v.as_str()), Some("late"));
    assert_eq!(node.control("speed"), Some(&3i64.into()));
    assert!(!node.visible);
}
