// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Dryad-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Dryad and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::fmt;
use std::fs;
use std::io;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::model::fixtures::bootstrap_forest;
use crate::model::{Forest, Node, NodeId, NodeKind};

const SNAPSHOT_FILENAME: &str = "dryad-document.json";
const EXPORT_FILENAME: &str = "generated.xml";

#[derive(Debug)]
pub enum StoreError {
    Io {
        path: PathBuf,
        source: io::Error,
    },
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, source } => write!(f, "io error at {path:?}: {source}"),
            Self::Json { path, source } => write!(f, "json error at {path:?}: {source}"),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Json { source, .. } => Some(source),
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum WriteDurability {
    /// Fast, best-effort persistence.
    ///
    /// - Writes a temp file and renames atomically into place.
    /// - Does not perform per-file fsync/sync.
    #[default]
    BestEffort,

    /// Slower, best-effort durability.
    ///
    /// Attempts to flush written file contents and rename operations to
    /// stable storage where possible. Exact guarantees are
    /// platform/filesystem-dependent.
    Durable,
}

/// Result of `load_or_init_forest`.
///
/// `recovered_from` carries the decode error when a corrupt snapshot was
/// replaced by the bootstrap document; the caller reports it (stderr, before
/// the TUI takes over the terminal) rather than surfacing it in the UI.
#[derive(Debug)]
pub struct LoadedForest {
    pub forest: Forest,
    pub recovered_from: Option<StoreError>,
}

/// The on-disk snapshot record: `{ "elements": [...], "nextId": n }`.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SnapshotJson {
    elements: Vec<NodeJson>,
    next_id: u64,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NodeJson {
    id: u64,
    tag: String,
    value: String,
    is_section: bool,
    #[serde(default)]
    children: Vec<NodeJson>,
    #[serde(default)]
    parent_id: Option<u64>,
}

fn node_to_json(node: &Node) -> NodeJson {
    NodeJson {
        id: node.id().get(),
        tag: node.tag().to_owned(),
        value: node.value().to_owned(),
        is_section: node.is_section(),
        children: node.children().iter().map(node_to_json).collect(),
        parent_id: node.parent_id().map(NodeId::get),
    }
}

/// Rebuilds a node from its record. The parent back-reference is re-derived
/// from nesting, not trusted from the file, so the containment invariant
/// holds even for hand-edited snapshots. A leaf record's children are
/// dropped.
fn node_from_json(json: NodeJson, parent_id: Option<NodeId>) -> Node {
    let id = NodeId::new(json.id);
    let kind = if json.is_section {
        NodeKind::Section
    } else {
        NodeKind::Leaf
    };
    let children = if json.is_section {
        json.children
            .into_iter()
            .map(|child| node_from_json(child, Some(id)))
            .collect()
    } else {
        Vec::new()
    };
    Node::from_parts(id, json.tag.as_str(), json.value, kind, parent_id, children)
}

/// Owns a workspace directory holding the snapshot record and export file.
#[derive(Debug, Clone)]
pub struct SnapshotFolder {
    root: PathBuf,
    durability: WriteDurability,
}

impl SnapshotFolder {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            durability: WriteDurability::default(),
        }
    }

    pub fn with_durability(mut self, durability: WriteDurability) -> Self {
        self.durability = durability;
        self
    }

    pub fn durability(&self) -> WriteDurability {
        self.durability
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn snapshot_path(&self) -> PathBuf {
        self.root.join(SNAPSHOT_FILENAME)
    }

    pub fn export_path(&self) -> PathBuf {
        self.root.join(EXPORT_FILENAME)
    }

    pub fn load_forest(&self) -> Result<Forest, StoreError> {
        let path = self.snapshot_path();
        let raw = fs::read_to_string(&path).map_err(|source| StoreError::Io {
            path: path.clone(),
            source,
        })?;
        let snapshot: SnapshotJson =
            serde_json::from_str(&raw).map_err(|source| StoreError::Json {
                path: path.clone(),
                source,
            })?;

        let roots = snapshot
            .elements
            .into_iter()
            .map(|element| node_from_json(element, None))
            .collect();
        Ok(Forest::from_parts(roots, snapshot.next_id))
    }

    /// Loads the snapshot, falling back to the bootstrap document when the
    /// record is missing (normal first run) or fails to decode (recovery;
    /// the decode error is handed back for logging). The fallback is saved
    /// immediately so the next run starts clean.
    pub fn load_or_init_forest(&self) -> Result<LoadedForest, StoreError> {
        match self.load_forest() {
            Ok(forest) => Ok(LoadedForest {
                forest,
                recovered_from: None,
            }),
            Err(StoreError::Io { path, source })
                if source.kind() == io::ErrorKind::NotFound && path == self.snapshot_path() =>
            {
                let forest = bootstrap_forest();
                self.save_forest(&forest)?;
                Ok(LoadedForest {
                    forest,
                    recovered_from: None,
                })
            }
            Err(err @ StoreError::Json { .. }) => {
                let forest = bootstrap_forest();
                self.save_forest(&forest)?;
                Ok(LoadedForest {
                    forest,
                    recovered_from: Some(err),
                })
            }
            Err(err) => Err(err),
        }
    }

    pub fn save_forest(&self, forest: &Forest) -> Result<(), StoreError> {
        let snapshot = SnapshotJson {
            elements: forest.roots().iter().map(node_to_json).collect(),
            next_id: forest.next_id(),
        };
        let path = self.snapshot_path();
        let raw = serde_json::to_string_pretty(&snapshot).map_err(|source| StoreError::Json {
            path: path.clone(),
            source,
        })?;

        write_atomic(&self.root, &path, format!("{raw}\n").as_bytes(), self.durability)
    }

    /// Writes the markup export file verbatim and returns its path.
    pub fn write_export(&self, markup: &str) -> Result<PathBuf, StoreError> {
        let path = self.export_path();
        write_atomic(&self.root, &path, markup.as_bytes(), self.durability)?;
        Ok(path)
    }
}

fn rename_overwrite(from: &Path, to: &Path) -> io::Result<()> {
    #[cfg(windows)]
    {
        match fs::rename(from, to) {
            Ok(()) => Ok(()),
            Err(err)
                if matches!(
                    err.kind(),
                    io::ErrorKind::AlreadyExists | io::ErrorKind::PermissionDenied
                ) =>
            {
                let _ = fs::remove_file(to);
                fs::rename(from, to)
            }
            Err(err) => Err(err),
        }
    }

    #[cfg(not(windows))]
    {
        fs::rename(from, to)
    }
}

fn write_atomic(
    root: &Path,
    path: &Path,
    contents: &[u8],
    durability: WriteDurability,
) -> Result<(), StoreError> {
    fs::create_dir_all(root).map_err(|source| StoreError::Io {
        path: root.to_path_buf(),
        source,
    })?;

    let Some(parent) = path.parent() else {
        return Err(StoreError::Io {
            path: path.to_path_buf(),
            source: io::Error::other("path has no parent"),
        });
    };
    let Some(file_name) = path.file_name() else {
        return Err(StoreError::Io {
            path: path.to_path_buf(),
            source: io::Error::other("path has no file name"),
        });
    };

    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let tmp_path = parent.join(format!(".dryad.tmp.{}.{}", file_name.to_string_lossy(), nanos));

    let mut file = fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&tmp_path)
        .map_err(|source| StoreError::Io {
            path: tmp_path.clone(),
            source,
        })?;

    file.write_all(contents).map_err(|source| StoreError::Io {
        path: tmp_path.clone(),
        source,
    })?;

    if durability == WriteDurability::Durable {
        file.sync_all().map_err(|source| StoreError::Io {
            path: tmp_path.clone(),
            source,
        })?;
    }
    drop(file);

    if let Err(source) = rename_overwrite(&tmp_path, path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(StoreError::Io {
            path: path.to_path_buf(),
            source,
        });
    }

    if durability == WriteDurability::Durable {
        #[cfg(unix)]
        {
            let dir = fs::File::open(parent).map_err(|source| StoreError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
            dir.sync_all().map_err(|source| StoreError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
    }

    Ok(())
}
