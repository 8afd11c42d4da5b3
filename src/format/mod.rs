// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Dryad-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Dryad and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Markup serialization/parsing.
//!
//! The forest renders to XML deterministically; importing parses markup back
//! through a reconstruction heuristic (the richer section/leaf model makes a
//! lossless inverse impossible, see the xml module docs).

pub mod xml;
