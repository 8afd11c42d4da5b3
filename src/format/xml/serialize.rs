// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Dryad-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Dryad and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use crate::model::{Forest, Node, NodeBody};

/// Fixed first line of every export.
pub const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;

/// Wrapper element synthesized when the forest has more than one top-level
/// node. Never part of the stored forest.
pub const SYNTHETIC_ROOT_TAG: &str = "root";

/// Placeholder emitted for an empty forest so the preview pane shows
/// something; the importer strips comments, so this is inert on reimport.
pub const EMPTY_DOCUMENT_COMMENT: &str = "<!-- empty document -->";

const INDENT: &str = "  ";

/// Renders the forest as markup text.
///
/// Deterministic and pure: a fixed declaration line, then the single
/// top-level node at depth 0, or a synthetic wrapper around multiple
/// top-level nodes, or a placeholder comment for an empty forest.
/// Indentation is emitted depth-aware in this single pass; the invariant
/// that indentation always equals structural depth is covered by tests.
pub fn export_xml(forest: &Forest) -> String {
    let mut out = String::new();
    out.push_str(XML_DECLARATION);
    out.push('\n');

    match forest.roots() {
        [] => {
            out.push_str(EMPTY_DOCUMENT_COMMENT);
            out.push('\n');
        }
        [single] => write_node(&mut out, single, 0),
        roots => {
            out.push('<');
            out.push_str(SYNTHETIC_ROOT_TAG);
            out.push_str(">\n");
            for node in roots {
                write_node(&mut out, node, 1);
            }
            out.push_str("</");
            out.push_str(SYNTHETIC_ROOT_TAG);
            out.push_str(">\n");
        }
    }

    out
}

fn write_node(out: &mut String, node: &Node, depth: usize) {
    let indent = INDENT.repeat(depth);
    let tag = node.tag();

    match node.body() {
        NodeBody::Leaf => {
            // A leaf is always a one-liner, even when its value is empty.
            out.push_str(&format!("{indent}<{tag}>{}</{tag}>\n", escape_text(node.value())));
        }
        NodeBody::Section { children } => match (children.is_empty(), node.value().is_empty()) {
            (true, true) => out.push_str(&format!("{indent}<{tag} />\n")),
            (true, false) => {
                out.push_str(&format!("{indent}<{tag}>{}</{tag}>\n", escape_text(node.value())));
            }
            (false, has_no_value) => {
                if has_no_value {
                    out.push_str(&format!("{indent}<{tag}>\n"));
                } else {
                    // With children present the section's value is demoted to
                    // an attribute.
                    out.push_str(&format!(
                        "{indent}<{tag} value=\"{}\">\n",
                        escape_text(node.value())
                    ));
                }
                for child in children {
                    write_node(out, child, depth + 1);
                }
                out.push_str(&format!("{indent}</{tag}>\n"));
            }
        },
    }
}

/// Escapes text and attribute values.
///
/// Single pass, `&` handled like every other byte, so produced entities are
/// never re-escaped. Tag names are never escaped; the tag pattern constrains
/// them instead.
pub fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(ch),
        }
    }
    out
}
