// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Dryad-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Dryad and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! XML rendition of the document forest.
//!
//! Export and import are deliberately not bit-exact inverses: the forest's
//! section/leaf distinction and value-as-attribute folding carry more
//! information than generic markup, so the importer applies a documented
//! reconstruction heuristic instead of a lossless inverse (an exported empty
//! leaf reclassifies as a section on reimport, for example).

pub mod highlight;
pub mod import;
pub mod parse;
pub mod serialize;

pub use highlight::{highlight_line, HighlightKind, HighlightSpan};
pub use import::import_xml;
pub use parse::{parse_document, XmlContent, XmlElement, XmlParseError};
pub use serialize::{
    escape_text, export_xml, EMPTY_DOCUMENT_COMMENT, SYNTHETIC_ROOT_TAG, XML_DECLARATION,
};
