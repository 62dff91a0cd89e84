//! Encoding with explicit group records
//!
//! Unlike the ordinal encoding in [`crate::codec::flatten`], groups are
//! persisted alongside the conditions with their parent and position, so
//! any nesting depth round-trips exactly.

use crate::codec::record::ConditionRecord;
use crate::error::{FilterError, Result};
use crate::tree::{Combinator, FilterNode, FilterTree, Group, GroupId, NodeKey};
use ahash::{AHashMap, AHashSet};
use serde::{Deserialize, Serialize};

/// A group as persisted next to its conditions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupRecord {
    pub id: GroupId,
    pub combinator: Combinator,
    #[serde(default)]
    pub parent_group: Option<GroupId>,
    /// Index among the parent's children
    #[serde(default)]
    pub position: u32,
}

/// Groups and conditions of one filter. Conditions point at their group
/// through `group_order`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FlatFilter {
    pub groups: Vec<GroupRecord>,
    pub conditions: Vec<ConditionRecord>,
}

pub fn encode_explicit(tree: &FilterTree) -> FlatFilter {
    let mut flat = FlatFilter::default();
    encode_group(tree.root(), 0, &mut flat);
    flat
}

fn encode_group(group: &Group, position: u32, flat: &mut FlatFilter) {
    flat.groups.push(GroupRecord {
        id: group.id,
        combinator: group.combinator,
        parent_group: group.parent,
        position,
    });

    for (index, child) in group.children.iter().enumerate() {
        match child {
            FilterNode::Condition(condition) => {
                flat.conditions.push(ConditionRecord::from(condition))
            }
            FilterNode::Group(nested) => encode_group(nested, index as u32, flat),
        }
    }
}

/// Decode an explicit encoding, validating every group reference
pub fn decode_explicit(flat: &FlatFilter) -> Result<FilterTree> {
    let mut by_id: AHashMap<GroupId, &GroupRecord> = AHashMap::with_capacity(flat.groups.len());
    for record in &flat.groups {
        if record.id.0 == u32::MAX {
            return Err(FilterError::MalformedEncoding(format!(
                "group {} leaves no ordinal for new groups",
                record.id
            )));
        }
        if by_id.insert(record.id, record).is_some() {
            return Err(FilterError::MalformedEncoding(format!(
                "duplicate group {}",
                record.id
            )));
        }
    }

    for record in &flat.groups {
        match record.parent_group {
            None if !record.id.is_root() => {
                return Err(FilterError::MalformedEncoding(format!(
                    "group {} has no parent",
                    record.id
                )))
            }
            Some(_) if record.id.is_root() => {
                return Err(FilterError::MalformedEncoding(
                    "root group has a parent".to_string(),
                ))
            }
            Some(parent) if !by_id.contains_key(&parent) => {
                return Err(FilterError::MalformedEncoding(format!(
                    "group {} references unknown parent {}",
                    record.id, parent
                )))
            }
            _ => {}
        }
    }
    check_acyclic(&by_id)?;

    let mut child_groups: AHashMap<GroupId, Vec<&GroupRecord>> = AHashMap::new();
    for record in &flat.groups {
        if let Some(parent) = record.parent_group {
            child_groups.entry(parent).or_default().push(record);
        }
    }
    for siblings in child_groups.values_mut() {
        siblings.sort_by_key(|record| record.position);
    }

    let mut conditions: AHashMap<GroupId, Vec<&ConditionRecord>> = AHashMap::new();
    for record in &flat.conditions {
        let group = GroupId(record.group_order);
        if !group.is_root() && !by_id.contains_key(&group) {
            return Err(FilterError::MalformedEncoding(format!(
                "condition on {} references unknown group {}",
                record.field_path, group
            )));
        }
        conditions.entry(group).or_default().push(record);
    }

    let root_combinator = by_id
        .get(&GroupId::ROOT)
        .map_or(Combinator::And, |record| record.combinator);
    let mut decoder = Decoder {
        child_groups: &child_groups,
        conditions: &conditions,
        next_key: 1,
    };
    let root = decoder.build(GroupId::ROOT, root_combinator, None);
    Ok(FilterTree::from_root(root))
}

fn check_acyclic(by_id: &AHashMap<GroupId, &GroupRecord>) -> Result<()> {
    for start in by_id.keys() {
        let mut seen = AHashSet::new();
        let mut current = Some(*start);
        while let Some(id) = current {
            if !seen.insert(id) {
                return Err(FilterError::MalformedEncoding(format!(
                    "group {} is its own ancestor",
                    start
                )));
            }
            current = by_id.get(&id).and_then(|record| record.parent_group);
        }
    }
    Ok(())
}

struct Decoder<'a> {
    child_groups: &'a AHashMap<GroupId, Vec<&'a GroupRecord>>,
    conditions: &'a AHashMap<GroupId, Vec<&'a ConditionRecord>>,
    next_key: u64,
}

impl Decoder<'_> {
    fn build(&mut self, id: GroupId, combinator: Combinator, parent: Option<GroupId>) -> Group {
        let mut group = Group::new(id, combinator, parent);
        let (child_groups, conditions) = (self.child_groups, self.conditions);

        let mut groups = child_groups
            .get(&id)
            .map(|records| records.as_slice())
            .unwrap_or_default()
            .iter()
            .peekable();
        let mut conditions = conditions
            .get(&id)
            .map(|records| records.as_slice())
            .unwrap_or_default()
            .iter();

        // Groups claim their recorded positions; conditions fill the gaps in order
        loop {
            let slot = group.children.len() as u32;
            let group_due = groups
                .peek()
                .map_or(false, |record| record.position <= slot);

            if !group_due {
                if let Some(record) = conditions.next() {
                    let key = NodeKey(self.next_key);
                    self.next_key += 1;
                    group
                        .children
                        .push(FilterNode::Condition(record.to_condition(key)));
                    continue;
                }
            }
            match groups.next() {
                Some(record) => {
                    let nested = self.build(record.id, record.combinator, Some(id));
                    group.children.push(FilterNode::Group(nested));
                }
                None => break,
            }
        }
        group
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::{DataSourceId, FieldReference, FieldType};

    fn push(tree: &mut FilterTree, group: GroupId, path: &str) {
        let condition = tree.new_condition(
            DataSourceId::new("orders"),
            &FieldReference::new(path, path, FieldType::Char),
        );
        tree.push_condition(group, condition).unwrap();
    }

    fn paths(group: &Group) -> Vec<String> {
        group
            .children
            .iter()
            .map(|child| match child {
                FilterNode::Condition(c) => c.field_path.clone(),
                FilterNode::Group(g) => g.id.to_string(),
            })
            .collect()
    }

    fn nested_tree() -> FilterTree {
        // root AND [a, g1 OR [b, g2 AND [c, g3 OR [d]]], e]
        let mut tree = FilterTree::default();
        push(&mut tree, GroupId::ROOT, "a");
        let g1 = tree.add_group(GroupId::ROOT, Combinator::Or).unwrap();
        push(&mut tree, GroupId::ROOT, "e");
        push(&mut tree, g1, "b");
        let g2 = tree.add_group(g1, Combinator::And).unwrap();
        push(&mut tree, g2, "c");
        let g3 = tree.add_group(g2, Combinator::Or).unwrap();
        push(&mut tree, g3, "d");
        tree
    }

    #[test]
    fn test_round_trip_preserves_deep_nesting() {
        let tree = nested_tree();
        let decoded = decode_explicit(&encode_explicit(&tree)).unwrap();

        assert_eq!(paths(decoded.root()), vec!["a", "g1", "e"]);
        assert_eq!(paths(decoded.group(GroupId(1)).unwrap()), vec!["b", "g2"]);
        assert_eq!(paths(decoded.group(GroupId(2)).unwrap()), vec!["c", "g3"]);
        assert_eq!(decoded.depth_of(GroupId(3)), Some(3));
        assert_eq!(decoded.group(GroupId(3)).unwrap().combinator, Combinator::Or);
        assert_eq!(encode_explicit(&decoded), encode_explicit(&tree));
    }

    #[test]
    fn test_serializes_as_json() {
        let flat = encode_explicit(&nested_tree());
        let json = serde_json::to_string(&flat).unwrap();
        let parsed: FlatFilter = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, flat);
    }

    #[test]
    fn test_duplicate_group_is_rejected() {
        let mut flat = encode_explicit(&nested_tree());
        let duplicate = flat.groups[1].clone();
        flat.groups.push(duplicate);
        assert!(matches!(
            decode_explicit(&flat),
            Err(FilterError::MalformedEncoding(_))
        ));
    }

    #[test]
    fn test_dangling_parent_is_rejected() {
        let mut flat = encode_explicit(&nested_tree());
        flat.groups[2].parent_group = Some(GroupId(77));
        assert!(decode_explicit(&flat).is_err());
    }

    #[test]
    fn test_cycle_is_rejected() {
        let mut flat = encode_explicit(&nested_tree());
        // g1 -> g2 -> g1
        let g1 = flat.groups.iter().position(|g| g.id == GroupId(1)).unwrap();
        flat.groups[g1].parent_group = Some(GroupId(2));
        assert!(matches!(
            decode_explicit(&flat),
            Err(FilterError::MalformedEncoding(_))
        ));
    }

    #[test]
    fn test_last_group_ordinal_is_rejected() {
        let mut flat = encode_explicit(&nested_tree());
        for record in flat.groups.iter_mut().filter(|g| g.id == GroupId(3)) {
            record.id = GroupId(u32::MAX);
        }
        for record in flat.conditions.iter_mut().filter(|c| c.group_order == 3) {
            record.group_order = u32::MAX;
        }
        assert!(matches!(
            decode_explicit(&flat),
            Err(FilterError::MalformedEncoding(_))
        ));
    }

    #[test]
    fn test_unknown_condition_group_is_rejected() {
        let mut flat = encode_explicit(&nested_tree());
        flat.conditions[0].group_order = 40;
        assert!(decode_explicit(&flat).is_err());
    }

    #[test]
    fn test_missing_root_record_defaults_to_and() {
        let flat = FlatFilter {
            groups: Vec::new(),
            conditions: encode_explicit(&nested_tree())
                .conditions
                .into_iter()
                .filter(|c| c.group_order == 0)
                .collect(),
        };
        let decoded = decode_explicit(&flat).unwrap();
        assert_eq!(decoded.root().combinator, Combinator::And);
        assert_eq!(decoded.condition_count(), 2);
    }
}
