// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Dryad-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Dryad and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use crate::model::{Forest, NodeId, NodeKind, TagNameError};

use super::{apply_ops, ApplyError, Op};

fn forest_with_section(tag: &str) -> (Forest, NodeId) {
    let mut forest = Forest::new();
    let ops = [Op::Create {
        tag: tag.to_owned(),
        value: String::new(),
        kind: NodeKind::Section,
        parent_id: None,
    }];
    let result = apply_ops(&mut forest, 0, &ops).expect("apply");
    let id = result.delta.added[0];
    (forest, id)
}

#[test]
fn apply_create_bumps_rev_and_records_added() {
    let mut forest = Forest::new();
    let ops = [Op::Create {
        tag: "main".to_owned(),
        value: String::new(),
        kind: NodeKind::Section,
        parent_id: None,
    }];

    let result = apply_ops(&mut forest, 0, &ops).expect("apply");
    assert_eq!(result.new_rev, 1);
    assert_eq!(forest.rev(), 1);
    assert_eq!(result.applied, 1);
    assert_eq!(result.delta.added.len(), 1);
    assert!(result.delta.removed.is_empty());
    assert!(result.delta.updated.is_empty());

    let id = result.delta.added[0];
    assert_eq!(forest.find(id).expect("created node").tag(), "main");
}

#[test]
fn apply_rejects_stale_base_rev() {
    let (mut forest, id) = forest_with_section("main");

    let err = apply_ops(
        &mut forest,
        0,
        &[Op::SetValue {
            node_id: id,
            value: "x".to_owned(),
        }],
    )
    .unwrap_err();

    assert_eq!(
        err,
        ApplyError::Conflict {
            base_rev: 0,
            current_rev: 1,
        }
    );
    assert_eq!(forest.find(id).expect("node").value(), "");
}

#[test]
fn apply_empty_batch_is_a_no_op() {
    let (mut forest, _) = forest_with_section("main");
    let result = apply_ops(&mut forest, 1, &[]).expect("apply");
    assert_eq!(result.new_rev, 1);
    assert_eq!(result.applied, 0);
    assert_eq!(forest.rev(), 1);
}

#[test]
fn apply_batch_is_all_or_nothing() {
    let (mut forest, id) = forest_with_section("main");

    let err = apply_ops(
        &mut forest,
        1,
        &[
            Op::SetValue {
                node_id: id,
                value: "kept?".to_owned(),
            },
            Op::SetTag {
                node_id: id,
                tag: "1bad".to_owned(),
            },
        ],
    )
    .unwrap_err();

    assert_eq!(
        err,
        ApplyError::InvalidTagName {
            name: "1bad".to_owned(),
            reason: TagNameError::InvalidStart { ch: '1' },
        }
    );
    // The first op of the failed batch must not have leaked through.
    assert_eq!(forest.find(id).expect("node").value(), "");
    assert_eq!(forest.rev(), 1);
}

#[test]
fn apply_remove_records_every_descendant() {
    let (mut forest, main) = forest_with_section("main");
    let result = apply_ops(
        &mut forest,
        1,
        &[
            Op::Create {
                tag: "meta".to_owned(),
                value: String::new(),
                kind: NodeKind::Section,
                parent_id: Some(main),
            },
            Op::Create {
                tag: "version".to_owned(),
                value: "1.0.0".to_owned(),
                kind: NodeKind::Leaf,
                parent_id: Some(main),
            },
        ],
    )
    .expect("apply");
    let mut expected_removed = result.delta.added.clone();
    expected_removed.push(main);
    expected_removed.sort_unstable();

    let result = apply_ops(&mut forest, 2, &[Op::Remove { node_id: main }]).expect("apply");
    assert_eq!(result.delta.removed, expected_removed);
    assert!(forest.is_empty());

    for node_id in expected_removed {
        assert!(forest.find(node_id).is_none());
    }
}

#[test]
fn apply_remove_unknown_node_fails() {
    let (mut forest, _) = forest_with_section("main");
    let missing = NodeId::new(99);
    let err = apply_ops(&mut forest, 1, &[Op::Remove { node_id: missing }]).unwrap_err();
    assert_eq!(err, ApplyError::NotFound { node_id: missing });
}

#[test]
fn create_then_update_in_one_batch_reports_only_added() {
    let mut forest = Forest::new();
    let result = apply_ops(
        &mut forest,
        0,
        &[Op::Create {
            tag: "draft".to_owned(),
            value: String::new(),
            kind: NodeKind::Leaf,
            parent_id: None,
        }],
    )
    .expect("apply");
    let id = result.delta.added[0];

    let result = apply_ops(
        &mut forest,
        1,
        &[
            Op::Create {
                tag: "note".to_owned(),
                value: String::new(),
                kind: NodeKind::Leaf,
                parent_id: None,
            },
            Op::SetValue {
                node_id: id,
                value: "hello".to_owned(),
            },
        ],
    )
    .expect("apply");

    assert_eq!(result.delta.added.len(), 1);
    assert_eq!(result.delta.updated, vec![id]);
}

#[test]
fn apply_clear_records_all_nodes_and_resets_ids() {
    let (mut forest, main) = forest_with_section("main");
    apply_ops(
        &mut forest,
        1,
        &[Op::Create {
            tag: "leaf".to_owned(),
            value: String::new(),
            kind: NodeKind::Leaf,
            parent_id: Some(main),
        }],
    )
    .expect("apply");

    let result = apply_ops(&mut forest, 2, &[Op::Clear]).expect("apply");
    assert_eq!(result.delta.removed.len(), 2);
    assert!(forest.is_empty());

    let result = apply_ops(
        &mut forest,
        3,
        &[Op::Create {
            tag: "fresh".to_owned(),
            value: String::new(),
            kind: NodeKind::Leaf,
            parent_id: None,
        }],
    )
    .expect("apply");
    // Clear is the one place id reuse is allowed.
    assert_eq!(result.delta.added, vec![main]);
}

#[test]
fn apply_reparent_moves_and_reports_updated() {
    let (mut forest, main) = forest_with_section("main");
    let result = apply_ops(
        &mut forest,
        1,
        &[Op::Create {
            tag: "item".to_owned(),
            value: String::new(),
            kind: NodeKind::Leaf,
            parent_id: None,
        }],
    )
    .expect("apply");
    let item = result.delta.added[0];

    let result = apply_ops(
        &mut forest,
        2,
        &[Op::Reparent {
            node_id: item,
            new_parent_id: Some(main),
        }],
    )
    .expect("apply");
    assert_eq!(result.delta.updated, vec![item]);
    assert_eq!(forest.find(item).expect("item").parent_id(), Some(main));
}
