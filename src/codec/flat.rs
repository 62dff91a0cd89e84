//! Tree ↔ flat list codec using the shared group ordinal
//!
//! Groups are not emitted; conditions sharing a `group_order` form one
//! group. Rebuilding restores the root and one level of groups below it.
//! Deeper nesting collapses onto that level.
//!
//! The root's combinator travels only on root conditions. A root holding
//! nothing but groups leaves no trace of it, so the caller supplies it
//! through [`rebuild_with_root`].

use crate::codec::record::ConditionRecord;
use crate::tree::{Combinator, FilterNode, FilterTree, Group, GroupId, NodeKey};
use std::collections::BTreeMap;

/// Every condition of the tree in pre-order, inactive ones included
pub fn flatten(tree: &FilterTree) -> Vec<ConditionRecord> {
    tree.conditions()
        .into_iter()
        .map(ConditionRecord::from)
        .collect()
}

/// Conditions handed to the report executor: active ones only
pub fn flatten_for_execution(tree: &FilterTree) -> Vec<ConditionRecord> {
    tree.conditions()
        .into_iter()
        .filter(|condition| condition.is_active)
        .map(ConditionRecord::from)
        .collect()
}

/// Rebuild a tree from flat records, defaulting the root combinator to
/// `And` when no record sits on the root.
pub fn rebuild(records: &[ConditionRecord]) -> FilterTree {
    rebuild_with_root(records, Combinator::And)
}

/// Rebuild a tree from flat records.
///
/// Buckets are ordered by `group_order`; bucket `0` fills the root and every
/// other bucket becomes a group directly below it. A bucket's combinator is
/// its first record's `logic_group`, and `root_combinator` applies when
/// bucket `0` is absent. Ordinals are kept unless the highest one is
/// `u32::MAX`; the groups are then renumbered from 1 in the same order.
pub fn rebuild_with_root(records: &[ConditionRecord], root_combinator: Combinator) -> FilterTree {
    let mut buckets: BTreeMap<u32, Vec<&ConditionRecord>> = BTreeMap::new();
    for record in records {
        buckets.entry(record.group_order).or_default().push(record);
    }

    let root_combinator = buckets
        .get(&GroupId::ROOT.ordinal())
        .and_then(|bucket| bucket.first())
        .map_or(root_combinator, |record| record.logic_group);
    let mut root = Group::new(GroupId::ROOT, root_combinator, None);

    let renumber = buckets.keys().next_back() == Some(&u32::MAX);
    if renumber {
        tracing::warn!(groups = buckets.len(), "group ordinals exhausted, renumbering");
    }

    let mut next_key = 1u64;
    let mut to_nodes = |bucket: &[&ConditionRecord]| -> Vec<FilterNode> {
        bucket
            .iter()
            .map(|record| {
                let key = NodeKey(next_key);
                next_key += 1;
                FilterNode::Condition(record.to_condition(key))
            })
            .collect()
    };

    let mut dense = 0u32;
    for (order, bucket) in &buckets {
        if *order == GroupId::ROOT.ordinal() {
            root.children.extend(to_nodes(bucket.as_slice()));
            continue;
        }
        dense += 1;
        let id = if renumber { GroupId(dense) } else { GroupId(*order) };
        let combinator = bucket
            .first()
            .map_or(Combinator::And, |record| record.logic_group);
        let mut group = Group::new(id, combinator, Some(GroupId::ROOT));
        group.children = to_nodes(bucket.as_slice());
        root.children.push(FilterNode::Group(group));
    }

    FilterTree::from_root(root)
}
