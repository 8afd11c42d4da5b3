// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Dryad-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Dryad and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;

/// Pattern a tag name must match once committed via a rename.
///
/// Node creation does not validate (a transient default like `element` is
/// permitted); only `set_tag` enforces this.
pub const TAG_NAME_PATTERN: &str = r"^[A-Za-z_][A-Za-z0-9_.\-]*$";

static TAG_NAME_REGEX: OnceLock<Regex> = OnceLock::new();

fn tag_name_regex() -> &'static Regex {
    TAG_NAME_REGEX
        .get_or_init(|| Regex::new(TAG_NAME_PATTERN).expect("hard-coded tag pattern is valid"))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagNameError {
    Empty,
    InvalidStart { ch: char },
    InvalidChar { ch: char },
}

impl fmt::Display for TagNameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => f.write_str("tag name must not be empty"),
            Self::InvalidStart { ch } => {
                write!(f, "tag name must start with a letter or '_', not '{ch}'")
            }
            Self::InvalidChar { ch } => write!(f, "tag name contains invalid character: '{ch}'"),
        }
    }
}

impl std::error::Error for TagNameError {}

pub fn validate_tag_name(name: &str) -> Result<(), TagNameError> {
    if tag_name_regex().is_match(name) {
        return Ok(());
    }

    // Pin down which rule failed so the editor can show an actionable message.
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return Err(TagNameError::Empty);
    };
    if !first.is_ascii_alphabetic() && first != '_' {
        return Err(TagNameError::InvalidStart { ch: first });
    }
    let offending = chars
        .find(|ch| !ch.is_ascii_alphanumeric() && !matches!(ch, '_' | '.' | '-'))
        .unwrap_or(first);
    Err(TagNameError::InvalidChar { ch: offending })
}
