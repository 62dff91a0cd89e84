//! The filter tree: one implicit root group and the id counters

use crate::error::{FilterError, Result};
use crate::field::{DataSourceId, FieldReference};
use crate::tree::node::{Combinator, Condition, FilterNode, Group, GroupId, NodeId, NodeKey};
use serde::Serialize;

/// Whole filter expression, rooted at one top-level group
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilterTree {
    root: Group,
    #[serde(skip)]
    next_key: u64,
    /// `None` once the ordinal space is used up
    #[serde(skip)]
    next_group: Option<u32>,
}

impl Default for FilterTree {
    fn default() -> Self {
        Self::new(Combinator::And)
    }
}

impl FilterTree {
    /// Empty tree whose root uses `combinator`
    pub fn new(combinator: Combinator) -> Self {
        Self {
            root: Group::new(GroupId::ROOT, combinator, None),
            next_key: 1,
            next_group: Some(1),
        }
    }

    /// Tree around an already assembled root; counters continue past the
    /// highest ids in use
    pub(crate) fn from_root(root: Group) -> Self {
        let mut conditions = Vec::new();
        root.collect_conditions(&mut conditions);
        let next_key = conditions.iter().map(|c| c.key.0).max().unwrap_or(0) + 1;
        let next_group = root.max_group_id().0.checked_add(1);

        let mut tree = Self {
            root,
            next_key,
            next_group,
        };
        tree.recompute_derived();
        tree
    }

    #[inline]
    pub fn root(&self) -> &Group {
        &self.root
    }

    /// Allocate a local identity for a new condition
    pub fn allocate_key(&mut self) -> NodeKey {
        let key = NodeKey(self.next_key);
        self.next_key += 1;
        key
    }

    fn allocate_group_id(&mut self) -> Result<GroupId> {
        let next = self.next_group.ok_or(FilterError::GroupLimit)?;
        self.next_group = next.checked_add(1);
        Ok(GroupId(next))
    }

    /// Build a detached condition on `field` with a fresh key
    pub fn new_condition(&mut self, data_source: DataSourceId, field: &FieldReference) -> Condition {
        let key = self.allocate_key();
        Condition::new(key, data_source, field)
    }

    pub fn group(&self, id: GroupId) -> Option<&Group> {
        self.root.find_group(id)
    }

    pub(crate) fn group_mut(&mut self, id: GroupId) -> Option<&mut Group> {
        self.root.find_group_mut(id)
    }

    pub fn condition(&self, key: NodeKey) -> Option<&Condition> {
        self.root.find_condition(key)
    }

    pub(crate) fn condition_mut(&mut self, key: NodeKey) -> Option<&mut Condition> {
        self.root.find_condition_mut(key)
    }

    pub fn contains(&self, node: NodeId) -> bool {
        match node {
            NodeId::Condition(key) => self.condition(key).is_some(),
            NodeId::Group(id) => self.group(id).is_some(),
        }
    }

    /// Owning group and index of a node; `None` for the root and unknown nodes
    pub fn parent_of(&self, node: NodeId) -> Option<(GroupId, usize)> {
        self.root.locate(node)
    }

    /// Nesting depth of a group, the root being depth 0
    pub fn depth_of(&self, id: GroupId) -> Option<usize> {
        let mut depth = 0;
        let mut current = self.group(id)?;
        while let Some(parent) = current.parent {
            current = self.group(parent)?;
            depth += 1;
        }
        Some(depth)
    }

    /// Whether `id` is `ancestor` or lies below it
    pub fn is_within(&self, id: GroupId, ancestor: GroupId) -> bool {
        self.group(ancestor)
            .and_then(|group| group.find_group(id))
            .is_some()
    }

    /// Create an empty group under `parent`.
    ///
    /// Empty groups are only expected while a tree is being assembled; the
    /// editor always gives a new group its first condition.
    pub fn add_group(&mut self, parent: GroupId, combinator: Combinator) -> Result<GroupId> {
        if self.group(parent).is_none() {
            return Err(FilterError::GroupNotFound(parent));
        }
        let id = self.allocate_group_id()?;
        self.insert(parent, None, FilterNode::Group(Group::new(id, combinator, Some(parent))))?;
        Ok(id)
    }

    /// Append a condition to a group
    pub fn push_condition(&mut self, group: GroupId, condition: Condition) -> Result<NodeKey> {
        let key = condition.key;
        self.insert(group, None, FilterNode::Condition(condition))?;
        Ok(key)
    }

    /// Insert a node under `parent` at `index` (clamped), appending when `None`
    pub fn insert(&mut self, parent: GroupId, index: Option<usize>, node: FilterNode) -> Result<()> {
        let group = self
            .group_mut(parent)
            .ok_or(FilterError::GroupNotFound(parent))?;
        let index = index
            .unwrap_or(group.children.len())
            .min(group.children.len());
        group.children.insert(index, node);
        self.recompute_derived();
        Ok(())
    }

    /// Take a node out of the tree
    pub fn detach(&mut self, node: NodeId) -> Result<FilterNode> {
        let (parent, index) = self.parent_of(node).ok_or_else(|| match node {
            NodeId::Group(id) if id.is_root() => {
                FilterError::InvalidMove("the root group cannot be removed".to_string())
            }
            NodeId::Group(id) => FilterError::GroupNotFound(id),
            NodeId::Condition(key) => FilterError::ConditionNotFound(key),
        })?;
        let group = self
            .group_mut(parent)
            .ok_or(FilterError::GroupNotFound(parent))?;
        let removed = group.children.remove(index);
        self.recompute_derived();
        Ok(removed)
    }

    /// All conditions in pre-order
    pub fn conditions(&self) -> Vec<&Condition> {
        let mut out = Vec::new();
        self.root.collect_conditions(&mut out);
        out
    }

    pub fn condition_count(&self) -> usize {
        self.conditions().len()
    }

    pub fn group_count(&self) -> usize {
        self.root.group_count()
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_empty()
    }

    /// Rewrite every derived field from the tree structure: each
    /// condition's `logic_group`, `group_order` and `parent_group`, and each
    /// group's `parent`.
    pub fn recompute_derived(&mut self) {
        self.root.parent = None;
        sync_group(&mut self.root);
    }
}

fn sync_group(group: &mut Group) {
    let combinator = group.combinator;
    let id = group.id;
    let parent_group = if group.parent.is_some() { Some(id) } else { None };

    for child in &mut group.children {
        match child {
            FilterNode::Condition(condition) => {
                condition.logic_group = combinator;
                condition.group_order = id.ordinal();
                condition.parent_group = parent_group;
            }
            FilterNode::Group(nested) => {
                nested.parent = Some(id);
                sync_group(nested);
            }
        }
    }
}
