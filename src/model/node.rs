// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Dryad-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Dryad and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use smol_str::SmolStr;

use super::ids::NodeId;

/// Whether a node may own children.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Section,
    Leaf,
}

/// Structural body of a node.
///
/// A leaf has no child sequence at all, so "children of a leaf are always
/// empty" holds by construction rather than by bookkeeping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeBody {
    Leaf,
    Section { children: Vec<Node> },
}

impl NodeBody {
    pub fn kind(&self) -> NodeKind {
        match self {
            Self::Leaf => NodeKind::Leaf,
            Self::Section { .. } => NodeKind::Section,
        }
    }
}

/// A single tag/value node of the document tree.
///
/// For a leaf, `value` is the full text content. For a section, `value` is
/// optional metadata that the serializer demotes to an attribute once the
/// section has children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    id: NodeId,
    tag: SmolStr,
    value: String,
    body: NodeBody,
    parent_id: Option<NodeId>,
}

impl Node {
    pub(crate) fn new(
        id: NodeId,
        tag: impl Into<SmolStr>,
        value: impl Into<String>,
        kind: NodeKind,
        parent_id: Option<NodeId>,
    ) -> Self {
        let body = match kind {
            NodeKind::Leaf => NodeBody::Leaf,
            NodeKind::Section => NodeBody::Section {
                children: Vec::new(),
            },
        };
        Self {
            id,
            tag: tag.into(),
            value: value.into(),
            body,
            parent_id,
        }
    }

    /// Rebuilds a node from persisted parts. Children are only meaningful for
    /// sections; a leaf body drops them.
    pub(crate) fn from_parts(
        id: NodeId,
        tag: impl Into<SmolStr>,
        value: impl Into<String>,
        kind: NodeKind,
        parent_id: Option<NodeId>,
        children: Vec<Node>,
    ) -> Self {
        let body = match kind {
            NodeKind::Leaf => NodeBody::Leaf,
            NodeKind::Section => NodeBody::Section { children },
        };
        Self {
            id,
            tag: tag.into(),
            value: value.into(),
            body,
            parent_id,
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn kind(&self) -> NodeKind {
        self.body.kind()
    }

    pub fn is_section(&self) -> bool {
        matches!(self.body, NodeBody::Section { .. })
    }

    pub fn body(&self) -> &NodeBody {
        &self.body
    }

    pub fn parent_id(&self) -> Option<NodeId> {
        self.parent_id
    }

    /// Children in document order; empty slice for a leaf.
    pub fn children(&self) -> &[Node] {
        match &self.body {
            NodeBody::Leaf => &[],
            NodeBody::Section { children } => children,
        }
    }

    pub(crate) fn children_slice_mut(&mut self) -> &mut [Node] {
        match &mut self.body {
            NodeBody::Leaf => &mut [],
            NodeBody::Section { children } => children,
        }
    }

    /// The owned child sequence, present only on sections.
    pub(crate) fn children_vec_mut(&mut self) -> Option<&mut Vec<Node>> {
        match &mut self.body {
            NodeBody::Leaf => None,
            NodeBody::Section { children } => Some(children),
        }
    }

    pub(crate) fn set_tag_unchecked(&mut self, tag: impl Into<SmolStr>) {
        self.tag = tag.into();
    }

    pub(crate) fn set_value(&mut self, value: impl Into<String>) {
        self.value = value.into();
    }

    pub(crate) fn set_parent_id(&mut self, parent_id: Option<NodeId>) {
        self.parent_id = parent_id;
    }

    pub(crate) fn promote_to_section(&mut self) {
        if matches!(self.body, NodeBody::Leaf) {
            self.body = NodeBody::Section {
                children: Vec::new(),
            };
        }
    }

    /// Only legal once the section owns no children; the forest enforces that.
    pub(crate) fn demote_to_leaf(&mut self) {
        self.body = NodeBody::Leaf;
    }
}
