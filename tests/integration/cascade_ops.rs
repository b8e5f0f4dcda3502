#![allow(missing_docs)]

use arbor::{NodeDraft, NodeId, NodeRepository, TreeError};

fn ids(raw: &[u64]) -> Vec<NodeId> {
    raw.iter().copied().map(NodeId).collect()
}

/// 1 ── 2 ── 4
///  │    └── 5 ── 7
///  └── 3 ── 6
/// 10 (second root)
fn seeded() -> NodeRepository {
    let mut repo = NodeRepository::new();
    repo.insert(NodeDraft::root(1u64)).unwrap();
    repo.insert(NodeDraft::child(2u64, 1u64)).unwrap();
    repo.insert(NodeDraft::child(3u64, 1u64)).unwrap();
    repo.insert(NodeDraft::child(4u64, 2u64)).unwrap();
    repo.insert(NodeDraft::child(5u64, 2u64)).unwrap();
    repo.insert(NodeDraft::child(6u64, 3u64)).unwrap();
    repo.insert(NodeDraft::child(7u64, 5u64)).unwrap();
    repo.insert(NodeDraft::root(10u64)).unwrap();
    repo
}

fn assert_descendants_first(repo_before: &NodeRepository, affected: &[NodeId]) {
    for (pos, id) in affected.iter().enumerate() {
        let node = repo_before.get(*id).unwrap();
        for ancestor in &node.breadcrumbs {
            if let Some(ancestor_pos) = affected.iter().position(|a| a == ancestor) {
                assert!(
                    ancestor_pos > pos,
                    "{ancestor} processed before its descendant {id}"
                );
            }
        }
    }
}

#[test]
fn delete_subtree_removes_every_descendant_deepest_first() {
    let mut repo = seeded();
    let before = repo.clone();

    let report = repo.delete_subtree(NodeId(2)).unwrap();
    assert_eq!(report.root, NodeId(2));
    assert_eq!(report.affected, ids(&[7, 5, 4, 2]));
    assert_descendants_first(&before, &report.affected);

    for gone in [2, 4, 5, 7] {
        assert!(!repo.contains(NodeId(gone)));
    }
    assert_eq!(repo.children(NodeId(1)).unwrap(), ids(&[3]).as_slice());
    assert_eq!(repo.len(), 4);
    assert!(repo.verify().success);
}

#[test]
fn delete_root_subtree_leaves_other_roots() {
    let mut repo = seeded();
    let report = repo.delete_subtree(NodeId(1)).unwrap();
    assert_eq!(report.affected.len(), 7);
    assert_eq!(report.affected.last(), Some(&NodeId(1)));
    assert_eq!(repo.roots(), ids(&[10]).as_slice());
    assert!(repo.verify().success);
}

#[test]
fn detach_subtree_moves_nodes_into_orphan_set() {
    let mut repo = seeded();
    let report = repo.detach_subtree(NodeId(3)).unwrap();
    assert_eq!(report.affected, ids(&[6, 3]));

    for id in [3, 6] {
        let orphan = repo.get_orphan(NodeId(id)).unwrap();
        assert!(orphan.breadcrumbs.is_empty());
        assert!(orphan.children.is_empty());
    }
    assert_eq!(repo.get_orphan(NodeId(6)).unwrap().parent, Some(NodeId(3)));
    // The detached root still names its live former parent.
    assert_eq!(repo.get_orphan(NodeId(3)).unwrap().parent, Some(NodeId(1)));
    assert!(repo.is_live(NodeId(1)));
    assert_eq!(repo.children(NodeId(1)).unwrap(), ids(&[2]).as_slice());
    assert_eq!(repo.orphan_count(), 2);
    assert!(repo.verify().success);
}

#[test]
fn detached_ids_stay_reserved() {
    let mut repo = seeded();
    repo.detach_subtree(NodeId(5)).unwrap();
    let err = repo.insert(NodeDraft::child(7u64, 4u64)).unwrap_err();
    assert_eq!(err, TreeError::DuplicateId(NodeId(7)));
}

#[test]
fn deleting_an_orphan_leaves_its_waiting_children() {
    let mut repo = NodeRepository::new();
    repo.insert(NodeDraft::child(20u64, 10u64)).unwrap();
    repo.insert(NodeDraft::child(30u64, 20u64)).unwrap();

    let report = repo.delete_subtree(NodeId(20)).unwrap();
    assert_eq!(report.affected, ids(&[20]));
    assert!(repo.is_orphan(NodeId(30)));
    assert_eq!(repo.orphan_count(), 1);
}

#[test]
fn cascades_on_unknown_ids_are_rejected_without_changes() {
    let mut repo = seeded();
    assert_eq!(
        repo.delete_subtree(NodeId(404)).unwrap_err(),
        TreeError::UnknownId(NodeId(404))
    );
    assert_eq!(
        repo.detach_subtree(NodeId(404)).unwrap_err(),
        TreeError::UnknownId(NodeId(404))
    );
    assert_eq!(repo.len(), 8);

    repo.insert(NodeDraft::child(50u64, 49u64)).unwrap();
    assert_eq!(
        repo.detach_subtree(NodeId(50)).unwrap_err(),
        TreeError::UnknownId(NodeId(50))
    );
}

#[test]
fn deleted_parent_can_return_and_reclaim_orphans() {
    let mut repo = seeded();
    repo.detach_subtree(NodeId(5)).unwrap();
    repo.delete_subtree(NodeId(5)).unwrap();
    assert!(repo.is_orphan(NodeId(7)));

    let report = repo.insert(NodeDraft::child(5u64, 4u64)).unwrap();
    assert_eq!(report.promoted, ids(&[7]));
    assert_eq!(repo.get(NodeId(7)).unwrap().breadcrumbs, ids(&[1, 2, 4, 5]));
    assert!(repo.verify().success);
}
