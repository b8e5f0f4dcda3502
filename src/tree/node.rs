use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};

use crate::types::{FieldRejection, NodeId, Result, TreeError, Value, ValueKind};

/// Field names owned by the repository. Updates and insert attributes may not
/// use them.
pub const RESERVED_FIELDS: &[&str] = &["id", "parent", "breadcrumbs", "children", "child_nodes"];

/// A node held by the repository, live or orphaned.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Node {
    /// Caller-supplied identity.
    pub id: NodeId,
    /// Declared parent; `None` for roots.
    pub parent: Option<NodeId>,
    /// Ancestor ids root-first, excluding this node. Empty for roots and orphans.
    pub breadcrumbs: Vec<NodeId>,
    /// Child ids in attach order. Always empty for orphans.
    pub children: Vec<NodeId>,
    /// Free-form named control values.
    pub controls: BTreeMap<String, Value>,
    /// Whether the node is shown.
    pub visible: bool,
    /// Caller-defined attributes.
    pub attrs: BTreeMap<String, Value>,
}

impl Node {
    /// Depth below the root container; roots are at depth 0.
    pub fn depth(&self) -> usize {
        self.breadcrumbs.len()
    }

    /// Returns the attribute with the given name.
    pub fn attr(&self, name: &str) -> Option<&Value> {
        self.attrs.get(name)
    }

    /// Returns the control with the given name.
    pub fn control(&self, name: &str) -> Option<&Value> {
        self.controls.get(name)
    }

    pub(crate) fn apply_field(&mut self, field: &str, value: Value) -> Result<()> {
        if RESERVED_FIELDS.contains(&field) {
            return Err(TreeError::ReservedField(field.to_string()));
        }
        match field {
            "visible" => match value {
                Value::Bool(visible) => {
                    self.visible = visible;
                    Ok(())
                }
                other => Err(mismatch(field, ValueKind::Bool, &other)),
            },
            "controls" => match value {
                Value::Map(controls) => {
                    self.controls = controls;
                    Ok(())
                }
                other => Err(mismatch(field, ValueKind::Map, &other)),
            },
            _ => {
                if let Some(current) = self.attrs.get(field) {
                    if !current.kind().accepts(value.kind()) {
                        return Err(mismatch(field, current.kind(), &value));
                    }
                }
                self.attrs.insert(field.to_string(), value);
                Ok(())
            }
        }
    }
}

fn mismatch(field: &str, current: ValueKind, incoming: &Value) -> TreeError {
    TreeError::TypeMismatch {
        field: field.to_string(),
        current,
        incoming: incoming.kind(),
    }
}

/// Insert payload. `id` and `parent` are optional here so that an incomplete
/// payload is reported as [`TreeError::MissingField`] by the repository.
///
/// `parent` distinguishes an absent key (`None`) from an explicit root
/// (`Some(None)`).
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct NodeDraft {
    /// Node identity.
    #[serde(default)]
    pub id: Option<NodeId>,
    /// Declared parent, or `Some(None)` for a root.
    #[serde(default, deserialize_with = "present")]
    pub parent: Option<Option<NodeId>>,
    /// Initial controls.
    #[serde(default)]
    pub controls: BTreeMap<String, Value>,
    /// Initial visibility; shown when absent.
    #[serde(default)]
    pub visible: Option<bool>,
    /// Every other key of the payload.
    #[serde(flatten)]
    pub attrs: BTreeMap<String, Value>,
}

fn present<'de, D>(deserializer: D) -> std::result::Result<Option<Option<NodeId>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<NodeId>::deserialize(deserializer).map(Some)
}

impl NodeDraft {
    /// Draft for a root node.
    pub fn root(id: impl Into<NodeId>) -> Self {
        Self {
            id: Some(id.into()),
            parent: Some(None),
            ..Self::default()
        }
    }

    /// Draft for a node under `parent`.
    pub fn child(id: impl Into<NodeId>, parent: impl Into<NodeId>) -> Self {
        Self {
            id: Some(id.into()),
            parent: Some(Some(parent.into())),
            ..Self::default()
        }
    }

    /// Adds an attribute.
    pub fn attr(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attrs.insert(name.into(), value.into());
        self
    }

    /// Adds a control value.
    pub fn control(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.controls.insert(name.into(), value.into());
        self
    }

    /// Sets the initial visibility.
    pub fn visibility(mut self, visible: bool) -> Self {
        self.visible = Some(visible);
        self
    }

    pub(crate) fn into_node(self) -> Result<Node> {
        let id = self.id.ok_or(TreeError::MissingField("id"))?;
        let parent = self.parent.ok_or(TreeError::MissingField("parent"))?;
        if let Some(field) = self
            .attrs
            .keys()
            .find(|key| RESERVED_FIELDS.contains(&key.as_str()))
        {
            return Err(TreeError::ReservedField(field.clone()));
        }
        Ok(Node {
            id,
            parent,
            breadcrumbs: Vec::new(),
            children: Vec::new(),
            controls: self.controls,
            visible: self.visible.unwrap_or(true),
            attrs: self.attrs,
        })
    }
}

/// Where an inserted node ended up.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Placement {
    /// Attached to the tree.
    Attached,
    /// Held in the orphan set until its parent appears.
    Orphaned,
}

/// Result of a successful insert.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct InsertReport {
    /// Inserted id.
    pub id: NodeId,
    /// Where the node was placed.
    pub placement: Placement,
    /// Orphans attached by the sweep that followed, in promotion order.
    pub promoted: Vec<NodeId>,
}

/// Overall status of a best-effort update.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateStatus {
    /// Every field was written.
    Applied,
    /// Some fields were written and some rejected.
    PartiallyApplied,
    /// Every field was rejected.
    Rejected,
}

/// Per-field outcome of an update.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct UpdateReport {
    /// Updated id.
    pub id: NodeId,
    /// Fields written, in payload order.
    pub applied: Vec<String>,
    /// Fields skipped, in payload order.
    pub rejected: Vec<FieldRejection>,
}

impl UpdateReport {
    pub(crate) fn new(id: NodeId) -> Self {
        Self {
            id,
            applied: Vec::new(),
            rejected: Vec::new(),
        }
    }

    /// Summarises the per-field outcome. An empty update counts as applied.
    pub fn status(&self) -> UpdateStatus {
        match (self.applied.is_empty(), self.rejected.is_empty()) {
            (_, true) => UpdateStatus::Applied,
            (true, false) => UpdateStatus::Rejected,
            (false, false) => UpdateStatus::PartiallyApplied,
        }
    }
}

/// Result of a subtree detach or delete.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CascadeReport {
    /// Node the cascade started from.
    pub root: NodeId,
    /// Every node acted on, in processing order. Descendants precede their
    /// ancestors, so `root` comes last.
    pub affected: Vec<NodeId>,
}
