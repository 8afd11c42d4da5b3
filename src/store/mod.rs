// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Dryad-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Dryad and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Persistence for documents on disk.
//!
//! The store module reads/writes the single snapshot record the editor keeps
//! per workspace folder, plus the markup export file.

pub mod snapshot_folder;

pub use snapshot_folder::{LoadedForest, SnapshotFolder, StoreError, WriteDurability};
