//! End-to-end reduction tests

use test_case::test_case;
use treesum::tree::parent_index;
use treesum::{ReduceConfig, ReduceError, TreeReducer};

use test_helpers::*;

#[test]
fn test_single_node_tree() {
    // H=1: one leaf that is also the root, no padding.
    let outcome = reduce(1, &[2, 3, 4]);

    assert_eq!(outcome.sum, 9);
    assert_eq!(outcome.report.node_count(), 1);
    assert!(outcome.report.is_leaf());
    assert_eq!(outcome.report.value, 9);
}

#[test]
fn test_three_level_tree_with_padding() {
    // 5 values over 4 leaves: padded to 8, chunks [1,2] [3,4] [5,0] [0,0].
    let outcome = reduce(3, &[1, 2, 3, 4, 5]);
    assert_eq!(outcome.sum, 15);

    let root = &outcome.report;
    assert_eq!(root.node_count(), 7);
    assert_eq!(root.value, 15);

    let level_two: Vec<i64> = root.children.iter().map(|c| c.value).collect();
    assert_eq!(level_two, vec![10, 5]);

    let leaves = collect_leaves(root);
    let leaf_sums: Vec<i64> = leaves.iter().map(|l| l.value).collect();
    assert_eq!(leaf_sums, vec![3, 7, 5, 0]);
}

#[test_case(1; "single node")]
#[test_case(2; "two levels")]
#[test_case(3; "three levels")]
#[test_case(4; "four levels")]
#[test_case(5; "five levels")]
fn test_matches_sequential_sum(height: u32) {
    let values: Vec<i64> = (-10..=25).collect();
    let outcome = reduce(height, &values);
    assert_eq!(outcome.sum, sequential_sum(&values));
}

#[test_case(2; "two levels")]
#[test_case(4; "four levels")]
fn test_empty_input_sums_to_zero(height: u32) {
    let outcome = reduce(height, &[]);
    assert_eq!(outcome.sum, 0);

    let config = ReduceConfig::new(height).unwrap();
    assert_eq!(outcome.report.node_count(), config.total_nodes());
}

#[test]
fn test_negative_values() {
    let outcome = reduce(3, &[-7, -1, 4, -4, 8]);
    assert_eq!(outcome.sum, 0);
}

#[test]
fn test_report_indices_form_the_complete_tree() {
    let values: Vec<i64> = (1..=20).collect();
    let outcome = reduce(4, &values);
    let config = ReduceConfig::new(4).unwrap();

    let nodes = collect_nodes(&outcome.report);
    assert_eq!(nodes.len(), config.total_nodes());

    let mut indices: Vec<usize> = nodes.iter().map(|n| n.index).collect();
    indices.sort_unstable();
    indices.dedup();
    assert_eq!(indices.len(), config.total_nodes(), "indices must be unique");
    assert_eq!(indices, (0..config.total_nodes()).collect::<Vec<_>>());

    // Every parent-child edge in the report obeys the heap relation.
    outcome.report.walk(&mut |node| {
        for child in &node.children {
            assert_eq!(parent_index(child.index), Some(node.index));
            assert_eq!(child.level, node.level + 1);
        }
    });
}

#[test]
fn test_internal_values_sum_their_children() {
    let values: Vec<i64> = vec![3, 1, 4, 1, 5, 9, 2, 6, 5, 3];
    let outcome = reduce(4, &values);

    outcome.report.walk(&mut |node| {
        if !node.is_leaf() {
            let combined: i64 = node.children.iter().map(|c| c.value).sum();
            assert_eq!(node.value, combined);
        }
    });
}

#[test]
fn test_rejected_heights_build_nothing() {
    for height in [0, 13, 100] {
        let err = ReduceConfig::new(height).unwrap_err();
        assert!(matches!(err, ReduceError::InvalidHeight { .. }));
        assert!(err.to_string().contains("invalid tree height"));
    }
}

#[test]
fn test_reducer_is_reusable() {
    let reducer = TreeReducer::new(ReduceConfig::new(3).unwrap());
    assert_eq!(reducer.run(&[1, 1, 1]).unwrap().sum, 3);
    assert_eq!(reducer.run(&[5, 5]).unwrap().sum, 10);
}
