// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Dryad-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Dryad and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use crate::model::{Forest, NodeId, NodeKind};

use super::parse::{parse_document, XmlContent, XmlElement, XmlParseError};

/// Parses markup and materializes it as a fresh forest (ids start at 1).
///
/// The caller swaps the returned forest in on success; on error nothing has
/// been mutated, so a failed import can never leave partial state behind.
///
/// Classification heuristic (deliberately non-bijective with export, see the
/// module docs): after dropping whitespace-only text chunks, an element is a
/// section if it carries attributes, has more than one child node, has a
/// single element child, or has no children at all; only a single text child
/// makes it a leaf, with the trimmed text as its value. Attributes become
/// synthetic `@name` leaf children ahead of the real children. Non-whitespace
/// text mixed between elements is dropped (mixed content is a non-goal).
pub fn import_xml(input: &str) -> Result<Forest, XmlParseError> {
    let root = parse_document(input)?;
    let mut forest = Forest::new();
    materialize(&mut forest, &root, None);
    Ok(forest)
}

fn significant_children(element: &XmlElement) -> Vec<&XmlContent> {
    element
        .children
        .iter()
        .filter(|child| match child {
            XmlContent::Element(_) => true,
            XmlContent::Text(text) => !text.trim().is_empty(),
        })
        .collect()
}

fn materialize(forest: &mut Forest, element: &XmlElement, parent_id: Option<NodeId>) {
    let children = significant_children(element);

    let is_leaf = element.attributes.is_empty()
        && matches!(children.as_slice(), [XmlContent::Text(_)]);

    if is_leaf {
        let [XmlContent::Text(text)] = children.as_slice() else {
            return;
        };
        forest.create(
            element.name.as_str(),
            text.trim(),
            NodeKind::Leaf,
            parent_id,
        );
        return;
    }

    let id = forest.create(element.name.as_str(), "", NodeKind::Section, parent_id);
    for (name, value) in &element.attributes {
        forest.create(format!("@{name}").as_str(), value.clone(), NodeKind::Leaf, Some(id));
    }
    for child in children {
        if let XmlContent::Element(child_element) = child {
            materialize(forest, child_element, Some(id));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::import_xml;
    use crate::format::xml::serialize::export_xml;
    use crate::model::{Forest, NodeKind, INITIAL_NODE_ID};

    #[test]
    fn single_text_child_becomes_a_leaf_with_trimmed_value() {
        let forest = import_xml("<title>\n  Dryad\n</title>").expect("import");
        assert_eq!(forest.roots().len(), 1);
        let title = &forest.roots()[0];
        assert_eq!(title.kind(), NodeKind::Leaf);
        assert_eq!(title.value(), "Dryad");
        assert_eq!(title.id().get(), INITIAL_NODE_ID);
    }

    #[test]
    fn element_children_force_a_section() {
        let forest = import_xml("<main><project>RTS</project></main>").expect("import");
        let main = &forest.roots()[0];
        assert!(main.is_section());
        assert_eq!(main.children().len(), 1);
        assert_eq!(main.children()[0].value(), "RTS");
        assert_eq!(main.children()[0].parent_id(), Some(main.id()));
    }

    #[test]
    fn empty_element_becomes_an_empty_section() {
        // This is the documented reclassification: an exported empty leaf
        // (`<note></note>`) comes back as a section.
        for input in ["<note></note>", "<note />"] {
            let forest = import_xml(input).expect("import");
            let note = &forest.roots()[0];
            assert!(note.is_section(), "{input} should import as a section");
            assert_eq!(note.value(), "");
        }
    }

    #[test]
    fn attributes_materialize_as_prefixed_leaves_before_children() {
        let forest =
            import_xml("<config value=\"v2\" mode=\"fast\"><debug>true</debug></config>")
                .expect("import");
        let config = &forest.roots()[0];
        assert!(config.is_section());

        let tags: Vec<&str> = config.children().iter().map(|n| n.tag()).collect();
        assert_eq!(tags, vec!["@value", "@mode", "debug"]);
        assert_eq!(config.children()[0].value(), "v2");
        assert_eq!(config.children()[0].kind(), NodeKind::Leaf);
    }

    #[test]
    fn mixed_text_between_elements_is_dropped() {
        let forest = import_xml("<a>stray<b>kept</b></a>").expect("import");
        let a = &forest.roots()[0];
        assert!(a.is_section());
        assert_eq!(a.children().len(), 1);
        assert_eq!(a.children()[0].tag(), "b");
    }

    #[test]
    fn failed_import_produces_nothing() {
        assert!(import_xml("<a><b></a>").is_err());
    }

    #[test]
    fn reimport_of_export_reclassifies_per_the_heuristic() {
        let mut forest = Forest::new();
        let main = forest.create("main", "", NodeKind::Section, None);
        forest.create("project", "RTS", NodeKind::Leaf, Some(main));
        forest.create("draft", "", NodeKind::Leaf, Some(main));
        let config = forest.create("config", "v2", NodeKind::Section, Some(main));
        forest.create("debug", "true", NodeKind::Leaf, Some(config));

        let markup = export_xml(&forest);
        let imported = import_xml(&markup).expect("reimport");
        let main = &imported.roots()[0];

        // Non-empty leaves survive as leaves.
        assert_eq!(main.children()[0].tag(), "project");
        assert_eq!(main.children()[0].kind(), NodeKind::Leaf);
        assert_eq!(main.children()[0].value(), "RTS");

        // The exported empty leaf reclassifies as a section.
        assert_eq!(main.children()[1].tag(), "draft");
        assert!(main.children()[1].is_section());

        // The demoted value attribute comes back as an `@value` leaf, not as
        // the section's own value.
        let config = &main.children()[2];
        assert!(config.is_section());
        assert_eq!(config.value(), "");
        assert_eq!(config.children()[0].tag(), "@value");
        assert_eq!(config.children()[0].value(), "v2");
        assert_eq!(config.children()[1].tag(), "debug");
    }

    #[test]
    fn imported_ids_are_densely_allocated_in_document_order() {
        let forest = import_xml("<a><b>x</b><c><d>y</d></c></a>").expect("import");
        let a = &forest.roots()[0];
        assert_eq!(a.id().get(), 1);
        assert_eq!(a.children()[0].id().get(), 2);
        assert_eq!(a.children()[1].id().get(), 3);
        assert_eq!(a.children()[1].children()[0].id().get(), 4);
        assert_eq!(forest.next_id(), 5);
    }
}
