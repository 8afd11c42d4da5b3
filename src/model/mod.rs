// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Dryad-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Dryad and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Core data model: the node tree and its mutation contract.
//!
//! A [`Forest`] owns an ordered sequence of top-level nodes; every node is a
//! tag/value pair that is either a leaf or a section (only sections own
//! children).

pub(crate) mod fixtures;
pub mod forest;
pub mod ids;
pub mod node;
pub mod tag;

pub use forest::{Forest, ReparentError, SetKindError, SetTagError};
pub use ids::{IdAllocator, NodeId, INITIAL_NODE_ID};
pub use node::{Node, NodeBody, NodeKind};
pub use tag::{validate_tag_name, TagNameError, TAG_NAME_PATTERN};
