// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Dryad-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Dryad and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Mutation operations for the document forest.
//!
//! Operations are applied with optimistic concurrency (revision checks) and
//! produce a minimal delta that the UI uses to refresh derived state. A batch
//! either applies completely or leaves the forest untouched.

use std::collections::HashSet;
use std::fmt;

use crate::model::{
    Forest, NodeId, NodeKind, ReparentError, SetKindError, SetTagError, TagNameError,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Op {
    Create {
        tag: String,
        value: String,
        kind: NodeKind,
        parent_id: Option<NodeId>,
    },
    SetTag {
        node_id: NodeId,
        tag: String,
    },
    SetValue {
        node_id: NodeId,
        value: String,
    },
    SetKind {
        node_id: NodeId,
        kind: NodeKind,
    },
    Reparent {
        node_id: NodeId,
        new_parent_id: Option<NodeId>,
    },
    Remove {
        node_id: NodeId,
    },
    Clear,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplyResult {
    pub new_rev: u64,
    pub applied: usize,
    pub delta: Delta,
}

/// Minimal delta describing which nodes changed as the result of applying ops.
///
/// Intentionally coarse: added/removed/updated ids only, each list sorted and
/// deduplicated. Removing a subtree records every removed descendant.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Delta {
    pub added: Vec<NodeId>,
    pub removed: Vec<NodeId>,
    pub updated: Vec<NodeId>,
}

#[derive(Debug, Default)]
struct DeltaBuilder {
    added: HashSet<NodeId>,
    removed: HashSet<NodeId>,
    updated: HashSet<NodeId>,
}

impl DeltaBuilder {
    fn record_added(&mut self, node_id: NodeId) {
        self.removed.remove(&node_id);
        self.updated.remove(&node_id);
        self.added.insert(node_id);
    }

    fn record_removed(&mut self, node_id: NodeId) {
        self.added.remove(&node_id);
        self.updated.remove(&node_id);
        self.removed.insert(node_id);
    }

    fn record_updated(&mut self, node_id: NodeId) {
        if self.added.contains(&node_id) || self.removed.contains(&node_id) {
            return;
        }
        self.updated.insert(node_id);
    }

    fn finish(self) -> Delta {
        let mut added = self.added.into_iter().collect::<Vec<_>>();
        let mut removed = self.removed.into_iter().collect::<Vec<_>>();
        let mut updated = self.updated.into_iter().collect::<Vec<_>>();

        added.sort_unstable();
        removed.sort_unstable();
        updated.sort_unstable();

        Delta {
            added,
            removed,
            updated,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyError {
    Conflict {
        base_rev: u64,
        current_rev: u64,
    },
    NotFound {
        node_id: NodeId,
    },
    InvalidTagName {
        name: String,
        reason: TagNameError,
    },
    SectionHasChildren {
        node_id: NodeId,
    },
    ParentNotFound {
        node_id: NodeId,
    },
    ParentIsLeaf {
        node_id: NodeId,
    },
    WouldCycle {
        node_id: NodeId,
        parent_id: NodeId,
    },
}

impl fmt::Display for ApplyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Conflict {
                base_rev,
                current_rev,
            } => {
                write!(f, "stale base_rev (base_rev={base_rev}, current_rev={current_rev})")
            }
            Self::NotFound { node_id } => write!(f, "node not found (id={node_id})"),
            Self::InvalidTagName { name, reason } => {
                write!(f, "invalid tag name {name:?}: {reason}")
            }
            Self::SectionHasChildren { node_id } => {
                write!(f, "section {node_id} still has children and cannot become a leaf")
            }
            Self::ParentNotFound { node_id } => {
                write!(f, "target parent not found (id={node_id})")
            }
            Self::ParentIsLeaf { node_id } => write!(f, "target parent {node_id} is a leaf"),
            Self::WouldCycle { node_id, parent_id } => write!(
                f,
                "cannot move node {node_id} under {parent_id}: target is inside its own subtree"
            ),
        }
    }
}

impl std::error::Error for ApplyError {}

/// Applies a batch of ops against the forest at `base_rev`.
///
/// On success the forest's revision is bumped exactly once. On any error the
/// forest is left exactly as it was (ops stage against a clone).
pub fn apply_ops(
    forest: &mut Forest,
    base_rev: u64,
    ops: &[Op],
) -> Result<ApplyResult, ApplyError> {
    let current_rev = forest.rev();
    if base_rev != current_rev {
        return Err(ApplyError::Conflict {
            base_rev,
            current_rev,
        });
    }

    if ops.is_empty() {
        return Ok(ApplyResult {
            new_rev: current_rev,
            applied: 0,
            delta: Delta::default(),
        });
    }

    let mut staged = forest.clone();
    let mut delta = DeltaBuilder::default();

    for op in ops {
        apply_op(&mut staged, op, &mut delta)?;
    }

    staged.bump_rev();
    let new_rev = staged.rev();
    *forest = staged;

    Ok(ApplyResult {
        new_rev,
        applied: ops.len(),
        delta: delta.finish(),
    })
}

fn apply_op(forest: &mut Forest, op: &Op, delta: &mut DeltaBuilder) -> Result<(), ApplyError> {
    match op {
        Op::Create {
            tag,
            value,
            kind,
            parent_id,
        } => {
            let node_id = forest.create(tag.as_str(), value.clone(), *kind, *parent_id);
            delta.record_added(node_id);
        }
        Op::SetTag { node_id, tag } => {
            forest.set_tag(*node_id, tag).map_err(|err| match err {
                SetTagError::NotFound { id } => ApplyError::NotFound { node_id: id },
                SetTagError::InvalidName { name, reason } => {
                    ApplyError::InvalidTagName { name, reason }
                }
            })?;
            delta.record_updated(*node_id);
        }
        Op::SetValue { node_id, value } => {
            if !forest.set_value(*node_id, value.clone()) {
                return Err(ApplyError::NotFound { node_id: *node_id });
            }
            delta.record_updated(*node_id);
        }
        Op::SetKind { node_id, kind } => {
            forest.set_kind(*node_id, *kind).map_err(|err| match err {
                SetKindError::NotFound { id } => ApplyError::NotFound { node_id: id },
                SetKindError::SectionHasChildren { id } => {
                    ApplyError::SectionHasChildren { node_id: id }
                }
            })?;
            delta.record_updated(*node_id);
        }
        Op::Reparent {
            node_id,
            new_parent_id,
        } => {
            forest
                .reparent(*node_id, *new_parent_id)
                .map_err(|err| match err {
                    ReparentError::NotFound { id } => ApplyError::NotFound { node_id: id },
                    ReparentError::ParentNotFound { id } => {
                        ApplyError::ParentNotFound { node_id: id }
                    }
                    ReparentError::ParentIsLeaf { id } => ApplyError::ParentIsLeaf { node_id: id },
                    ReparentError::WouldCycle { id, parent_id } => ApplyError::WouldCycle {
                        node_id: id,
                        parent_id,
                    },
                })?;
            delta.record_updated(*node_id);
        }
        Op::Remove { node_id } => {
            let Some(node) = forest.find(*node_id) else {
                return Err(ApplyError::NotFound { node_id: *node_id });
            };
            record_subtree_removed(node, delta);
            forest.delete(*node_id);
        }
        Op::Clear => {
            for root in forest.roots() {
                record_subtree_removed(root, delta);
            }
            forest.clear();
        }
    }
    Ok(())
}

fn record_subtree_removed(node: &crate::model::Node, delta: &mut DeltaBuilder) {
    delta.record_removed(node.id());
    for child in node.children() {
        record_subtree_removed(child, delta);
    }
}

#[cfg(test)]
mod tests;
