use std::collections::HashSet;

use serde::Serialize;

use crate::types::NodeId;

use super::locate::locate;
use super::{Container, NodeRepository};

const MAX_FINDINGS: usize = 32;

/// Represents a single inconsistency discovered during verification.
#[derive(Clone, Debug, Serialize)]
pub struct VerifyFinding {
    /// Node the finding is about, when there is one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node: Option<NodeId>,
    /// Human-readable description of the issue.
    pub message: String,
}

/// Statistics collected while verifying.
#[derive(Clone, Debug, Default, Serialize)]
pub struct VerifyCounts {
    /// Live nodes in the index.
    pub live_nodes: u64,
    /// Nodes in the orphan set.
    pub orphans: u64,
    /// Root ids in the root container.
    pub roots: u64,
    /// Live nodes reached by walking down from the roots.
    pub reachable: u64,
    /// Largest breadcrumb length seen.
    pub max_depth: u64,
}

/// Complete report of a verification pass.
#[derive(Clone, Debug, Serialize)]
pub struct VerifyReport {
    /// Whether verification passed without findings.
    pub success: bool,
    /// Issues discovered, capped at 32 entries.
    pub findings: Vec<VerifyFinding>,
    /// Statistics about the structures examined.
    pub counts: VerifyCounts,
}

impl NodeRepository {
    /// Checks every structural invariant and reports what is broken.
    ///
    /// Covers the index/orphan partition, root shape, breadcrumb
    /// reachability, ancestor liveness, child-list agreement and orphan shape.
    /// Never mutates state.
    pub fn verify(&self) -> VerifyReport {
        let mut findings = Vec::new();
        let mut counts = VerifyCounts {
            live_nodes: self.index.len() as u64,
            orphans: self.orphans.len() as u64,
            roots: self.roots.len() as u64,
            ..VerifyCounts::default()
        };

        for id in self.orphans.keys() {
            if self.index.contains_key(id) {
                push(&mut findings, Some(*id), "id is both live and orphaned");
            }
        }

        let mut seen_roots = HashSet::new();
        for id in &self.roots {
            if !seen_roots.insert(*id) {
                push(&mut findings, Some(*id), "root listed more than once");
            }
            match self.index.get(id) {
                None => push(&mut findings, Some(*id), "root is not live"),
                Some(node) if node.parent.is_some() => {
                    push(&mut findings, Some(*id), "root declares a parent")
                }
                Some(_) => {}
            }
        }

        for (id, node) in &self.index {
            counts.max_depth = counts.max_depth.max(node.breadcrumbs.len() as u64);
            if node.breadcrumbs.last().copied() != node.parent {
                push(
                    &mut findings,
                    Some(*id),
                    format!(
                        "breadcrumbs {:?} do not end at parent {:?}",
                        node.breadcrumbs, node.parent
                    ),
                );
            }
            for ancestor in &node.breadcrumbs {
                if !self.index.contains_key(ancestor) {
                    push(
                        &mut findings,
                        Some(*id),
                        format!("ancestor {ancestor} is not live"),
                    );
                }
            }
            match locate(&self.roots, &self.index, &node.breadcrumbs) {
                Ok(container) => {
                    let holders = match container {
                        Container::Root => self.roots.as_slice(),
                        Container::Node(parent) => self
                            .index
                            .get(&parent)
                            .map(|p| p.children.as_slice())
                            .unwrap_or_default(),
                    };
                    let occurrences = holders.iter().filter(|child| *child == id).count();
                    if occurrences != 1 {
                        push(
                            &mut findings,
                            Some(*id),
                            format!("listed {occurrences} times under {container}"),
                        );
                    }
                }
                Err(err) => push(&mut findings, Some(*id), format!("unreachable: {err}")),
            }
            for child in &node.children {
                match self.index.get(child) {
                    Some(c) if c.parent == Some(*id) => {}
                    Some(_) => push(
                        &mut findings,
                        Some(*child),
                        format!("listed under {id} but declares another parent"),
                    ),
                    None => push(
                        &mut findings,
                        Some(*child),
                        format!("listed under {id} but not live"),
                    ),
                }
            }
        }

        for (id, orphan) in &self.orphans {
            if !orphan.breadcrumbs.is_empty() || !orphan.children.is_empty() {
                push(
                    &mut findings,
                    Some(*id),
                    "orphan carries breadcrumbs or children",
                );
            }
        }

        counts.reachable = self.count_reachable();
        if counts.reachable != counts.live_nodes {
            push(
                &mut findings,
                None,
                format!(
                    "{} live nodes but {} reachable from the roots",
                    counts.live_nodes, counts.reachable
                ),
            );
        }

        VerifyReport {
            success: findings.is_empty(),
            findings,
            counts,
        }
    }

    fn count_reachable(&self) -> u64 {
        let mut visited = HashSet::new();
        let mut stack: Vec<NodeId> = self.roots.clone();
        while let Some(id) = stack.pop() {
            if !visited.insert(id) {
                continue;
            }
            if let Some(node) = self.index.get(&id) {
                stack.extend(node.children.iter().copied());
            }
        }
        visited
            .iter()
            .filter(|id| self.index.contains_key(id))
            .count() as u64
    }
}

fn push(findings: &mut Vec<VerifyFinding>, node: Option<NodeId>, message: impl Into<String>) {
    if findings.len() < MAX_FINDINGS {
        findings.push(VerifyFinding {
            node,
            message: message.into(),
        });
    }
}
