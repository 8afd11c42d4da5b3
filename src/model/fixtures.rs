// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Dryad-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Dryad and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use super::forest::Forest;
use super::node::NodeKind;

/// The document seeded on first run and after snapshot corruption recovery.
pub(crate) fn bootstrap_forest() -> Forest {
    let mut forest = Forest::new();

    let main = forest.create("main", "", NodeKind::Section, None);
    forest.create("project", "RTS", NodeKind::Leaf, Some(main));
    let meta = forest.create("meta", "", NodeKind::Section, Some(main));
    forest.create("version", "1.0.0", NodeKind::Leaf, Some(meta));
    forest.create("author", "Ya", NodeKind::Leaf, Some(meta));

    forest
}

#[cfg(test)]
mod tests {
    use super::bootstrap_forest;

    #[test]
    fn bootstrap_has_the_expected_shape() {
        let forest = bootstrap_forest();
        assert_eq!(forest.roots().len(), 1);
        assert_eq!(forest.node_count(), 5);

        let main = &forest.roots()[0];
        assert_eq!(main.tag(), "main");
        assert!(main.is_section());

        let tags: Vec<&str> = main.children().iter().map(|n| n.tag()).collect();
        assert_eq!(tags, vec!["project", "meta"]);
    }
}
