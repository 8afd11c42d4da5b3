// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Dryad-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Dryad and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::fmt;

use smol_str::SmolStr;

use super::ids::{IdAllocator, NodeId};
use super::node::{Node, NodeKind};
use super::tag::{validate_tag_name, TagNameError};

/// The owned document store: an ordered sequence of top-level nodes plus the
/// id allocator and a revision counter.
///
/// There is no implicit common root; a synthetic wrapper exists only in
/// serializer output. The revision counter is the change-notification
/// surface: [`crate::ops::apply_ops`] checks it for conflicts and bumps it
/// once per successful batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Forest {
    roots: Vec<Node>,
    ids: IdAllocator,
    rev: u64,
}

impl Default for Forest {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SetTagError {
    NotFound { id: NodeId },
    InvalidName { name: String, reason: TagNameError },
}

impl fmt::Display for SetTagError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound { id } => write!(f, "node not found (id={id})"),
            Self::InvalidName { name, reason } => {
                write!(f, "invalid tag name {name:?}: {reason}")
            }
        }
    }
}

impl std::error::Error for SetTagError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetKindError {
    NotFound { id: NodeId },
    SectionHasChildren { id: NodeId },
}

impl fmt::Display for SetKindError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound { id } => write!(f, "node not found (id={id})"),
            Self::SectionHasChildren { id } => {
                write!(f, "section {id} still has children and cannot become a leaf")
            }
        }
    }
}

impl std::error::Error for SetKindError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReparentError {
    NotFound { id: NodeId },
    ParentNotFound { id: NodeId },
    ParentIsLeaf { id: NodeId },
    WouldCycle { id: NodeId, parent_id: NodeId },
}

impl fmt::Display for ReparentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound { id } => write!(f, "node not found (id={id})"),
            Self::ParentNotFound { id } => write!(f, "target parent not found (id={id})"),
            Self::ParentIsLeaf { id } => write!(f, "target parent {id} is a leaf"),
            Self::WouldCycle { id, parent_id } => {
                write!(f, "cannot move node {id} under {parent_id}: target is inside its own subtree")
            }
        }
    }
}

impl std::error::Error for ReparentError {}

impl Forest {
    pub fn new() -> Self {
        Self {
            roots: Vec::new(),
            ids: IdAllocator::new(),
            rev: 0,
        }
    }

    /// Rebuilds a forest from persisted parts (see the store module).
    pub(crate) fn from_parts(roots: Vec<Node>, next_id: u64) -> Self {
        let mut max_seen = 0;
        fn max_id(nodes: &[Node], max_seen: &mut u64) {
            for node in nodes {
                *max_seen = (*max_seen).max(node.id().get());
                max_id(node.children(), max_seen);
            }
        }
        max_id(&roots, &mut max_seen);

        Self {
            roots,
            // A snapshot whose counter lags behind its own nodes must not
            // hand out duplicate ids.
            ids: IdAllocator::resuming_at(next_id.max(max_seen.saturating_add(1))),
            rev: 0,
        }
    }

    pub fn roots(&self) -> &[Node] {
        &self.roots
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    pub fn node_count(&self) -> usize {
        fn count(nodes: &[Node]) -> usize {
            nodes.iter().map(|node| 1 + count(node.children())).sum()
        }
        count(&self.roots)
    }

    /// The id the next `create` call will assign.
    pub fn next_id(&self) -> u64 {
        self.ids.peek()
    }

    pub fn rev(&self) -> u64 {
        self.rev
    }

    pub fn set_rev(&mut self, rev: u64) {
        self.rev = rev;
    }

    pub fn bump_rev(&mut self) {
        self.rev = self.rev.saturating_add(1);
    }

    /// Creates a node and appends it as the last child of `parent_id`, or as
    /// the last top-level entry when `parent_id` is `None`.
    ///
    /// Never fails: an unresolvable `parent_id` (unknown id, or a leaf, which
    /// cannot own children) silently falls back to top-level insertion. The
    /// tag is not validated here; a transient default is permitted and the
    /// rename path enforces the pattern.
    pub fn create(
        &mut self,
        tag: impl Into<SmolStr>,
        value: impl Into<String>,
        kind: NodeKind,
        parent_id: Option<NodeId>,
    ) -> NodeId {
        let id = self.ids.allocate();

        let resolved_parent =
            parent_id.filter(|pid| self.find(*pid).is_some_and(|parent| parent.is_section()));

        match resolved_parent {
            Some(pid) => {
                let node = Node::new(id, tag, value, kind, Some(pid));
                self.find_mut(pid)
                    .and_then(|parent| parent.children_vec_mut())
                    .expect("verified section parent")
                    .push(node);
            }
            None => {
                self.roots.push(Node::new(id, tag, value, kind, None));
            }
        }

        id
    }

    /// Depth-first search in document order; first match wins (ids are unique
    /// so this is unambiguous).
    pub fn find(&self, id: NodeId) -> Option<&Node> {
        fn find_in(nodes: &[Node], id: NodeId) -> Option<&Node> {
            for node in nodes {
                if node.id() == id {
                    return Some(node);
                }
                if let Some(found) = find_in(node.children(), id) {
                    return Some(found);
                }
            }
            None
        }
        find_in(&self.roots, id)
    }

    pub fn find_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        fn find_in(nodes: &mut [Node], id: NodeId) -> Option<&mut Node> {
            for node in nodes.iter_mut() {
                if node.id() == id {
                    return Some(node);
                }
                if let Some(found) = find_in(node.children_slice_mut(), id) {
                    return Some(found);
                }
            }
            None
        }
        find_in(&mut self.roots, id)
    }

    /// Removes the node and its whole subtree from wherever it currently
    /// lives; identity is the only locator. Returns whether anything was
    /// removed.
    pub fn delete(&mut self, id: NodeId) -> bool {
        self.take(id).is_some()
    }

    /// Detaches and returns the subtree rooted at `id`.
    pub(crate) fn take(&mut self, id: NodeId) -> Option<Node> {
        fn take_from(nodes: &mut Vec<Node>, id: NodeId) -> Option<Node> {
            if let Some(index) = nodes.iter().position(|node| node.id() == id) {
                return Some(nodes.remove(index));
            }
            for node in nodes.iter_mut() {
                if let Some(children) = node.children_vec_mut() {
                    if let Some(taken) = take_from(children, id) {
                        return Some(taken);
                    }
                }
            }
            None
        }
        take_from(&mut self.roots, id)
    }

    /// Renames a node, enforcing the tag-name pattern. On failure the node is
    /// left unchanged and the caller decides on UI feedback.
    pub fn set_tag(&mut self, id: NodeId, new_tag: &str) -> Result<(), SetTagError> {
        validate_tag_name(new_tag).map_err(|reason| SetTagError::InvalidName {
            name: new_tag.to_owned(),
            reason,
        })?;
        let Some(node) = self.find_mut(id) else {
            return Err(SetTagError::NotFound { id });
        };
        node.set_tag_unchecked(new_tag);
        Ok(())
    }

    /// Unconditional value edit; any string, including empty, is legal.
    /// Returns whether the node exists.
    pub fn set_value(&mut self, id: NodeId, new_value: impl Into<String>) -> bool {
        match self.find_mut(id) {
            Some(node) => {
                node.set_value(new_value);
                true
            }
            None => false,
        }
    }

    /// The section/leaf toggle. Demoting a section that still owns children
    /// is rejected; a leaf never owns children.
    pub fn set_kind(&mut self, id: NodeId, kind: NodeKind) -> Result<(), SetKindError> {
        let Some(node) = self.find_mut(id) else {
            return Err(SetKindError::NotFound { id });
        };
        match (node.kind(), kind) {
            (NodeKind::Leaf, NodeKind::Section) => node.promote_to_section(),
            (NodeKind::Section, NodeKind::Leaf) => {
                if !node.children().is_empty() {
                    return Err(SetKindError::SectionHasChildren { id });
                }
                node.demote_to_leaf();
            }
            _ => {}
        }
        Ok(())
    }

    /// Moves a subtree to the end of the target sequence (top level for
    /// `None`). The target must be a section outside the moved subtree.
    pub fn reparent(
        &mut self,
        id: NodeId,
        new_parent_id: Option<NodeId>,
    ) -> Result<(), ReparentError> {
        let Some(node) = self.find(id) else {
            return Err(ReparentError::NotFound { id });
        };

        if let Some(parent_id) = new_parent_id {
            if parent_id == id || subtree_contains(node, parent_id) {
                return Err(ReparentError::WouldCycle { id, parent_id });
            }
            let Some(parent) = self.find(parent_id) else {
                return Err(ReparentError::ParentNotFound { id: parent_id });
            };
            if !parent.is_section() {
                return Err(ReparentError::ParentIsLeaf { id: parent_id });
            }
        }

        let Some(mut node) = self.take(id) else {
            return Err(ReparentError::NotFound { id });
        };
        node.set_parent_id(new_parent_id);

        match new_parent_id {
            None => self.roots.push(node),
            Some(parent_id) => {
                // The target was verified to be a section outside the detached
                // subtree, so it is still present.
                self.find_mut(parent_id)
                    .and_then(|parent| parent.children_vec_mut())
                    .expect("verified section parent")
                    .push(node);
            }
        }

        Ok(())
    }

    /// Empties the forest and resets the id counter to its initial value —
    /// the only case where id reuse is permitted.
    pub fn clear(&mut self) {
        self.roots.clear();
        self.ids.reset();
    }
}

fn subtree_contains(node: &Node, id: NodeId) -> bool {
    node.children()
        .iter()
        .any(|child| child.id() == id || subtree_contains(child, id))
}
