//! Mutation engine: structural and value edits with their propagation rules

use crate::codec::{flatten, flatten_for_execution, rebuild_with_root, ConditionRecord};
use crate::config::EditorConfig;
use crate::editor::event::{ChangeAction, ChangeEvent, Notice};
use crate::error::{FilterError, Result};
use crate::field::{DataSourceId, FieldCache, FieldProvider};
use crate::operator::{Operator, OperatorCache, OperatorEntry};
use crate::store::{CommandLog, ConditionStore};
use crate::tree::{Combinator, Condition, FilterTree, GroupId, NodeId, NodeKey};
use crate::value::{dynamic_value, ValueKind, ValueSource};
use serde_json::Value;
use std::sync::Arc;

/// Editing session over one report's filter
pub struct FilterEditor {
    pub(crate) tree: FilterTree,
    pub(crate) fields: FieldCache,
    operators: OperatorCache,
    config: EditorConfig,
    data_sources: Vec<DataSourceId>,
    pub(crate) store: Arc<dyn ConditionStore>,
    pub(crate) provider: Option<Arc<dyn FieldProvider>>,
    pub(crate) log: CommandLog,
    events: Vec<ChangeEvent>,
    notices: Vec<Notice>,
}

impl FilterEditor {
    /// Empty filter
    pub fn new(config: EditorConfig, store: Arc<dyn ConditionStore>) -> Self {
        let tree = FilterTree::new(config.root_combinator);
        Self::with_tree(tree, config, store)
    }

    /// Open an existing filter from its persisted records
    pub fn from_records(
        records: &[ConditionRecord],
        config: EditorConfig,
        store: Arc<dyn ConditionStore>,
    ) -> Self {
        let tree = rebuild_with_root(records, config.root_combinator);
        let mut editor = Self::with_tree(tree, config, store);
        for record in records {
            editor.add_data_source(record.data_source.clone());
        }
        editor
    }

    fn with_tree(tree: FilterTree, config: EditorConfig, store: Arc<dyn ConditionStore>) -> Self {
        let mut data_sources = Vec::new();
        if let Some(primary) = &config.primary_data_source {
            data_sources.push(primary.clone());
        }
        Self {
            tree,
            fields: FieldCache::new(),
            operators: OperatorCache::new(),
            config,
            data_sources,
            store,
            provider: None,
            log: CommandLog::new(),
            events: Vec::new(),
            notices: Vec::new(),
        }
    }

    /// Resolve field metadata through `provider` in [`FilterEditor::load_fields`]
    pub fn with_provider(mut self, provider: Arc<dyn FieldProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Share an already populated field cache
    pub fn with_field_cache(mut self, fields: FieldCache) -> Self {
        self.fields = fields;
        self
    }

    pub fn with_data_sources(mut self, data_sources: impl IntoIterator<Item = DataSourceId>) -> Self {
        for data_source in data_sources {
            self.add_data_source(data_source);
        }
        self
    }

    /// Register a data source the report reads from
    pub fn add_data_source(&mut self, data_source: DataSourceId) {
        if !self.data_sources.contains(&data_source) {
            self.data_sources.push(data_source);
        }
    }

    #[inline]
    pub fn tree(&self) -> &FilterTree {
        &self.tree
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn field_cache(&self) -> &FieldCache {
        &self.fields
    }

    pub fn data_sources(&self) -> &[DataSourceId] {
        &self.data_sources
    }

    /// Commands not yet acknowledged by the store
    pub fn pending(&self) -> &CommandLog {
        &self.log
    }

    /// Data source new conditions fall back to
    pub fn primary_data_source(&self) -> Option<DataSourceId> {
        self.config
            .primary_data_source
            .clone()
            .or_else(|| self.data_sources.first().cloned())
    }

    /// Data source of the group's first direct condition, else the primary one
    pub fn group_data_source(&self, group: GroupId) -> Option<DataSourceId> {
        self.tree
            .group(group)
            .and_then(|g| g.conditions().next())
            .map(|condition| condition.data_source.clone())
            .or_else(|| self.primary_data_source())
    }

    /// Operators the user may pick for a condition
    pub fn operators_for(&self, key: NodeKey) -> Result<Arc<[OperatorEntry]>> {
        let condition = self.find(key)?;
        Ok(self.operators.get(&condition.field_type))
    }

    pub fn flatten(&self) -> Vec<ConditionRecord> {
        flatten(&self.tree)
    }

    pub fn flatten_for_execution(&self) -> Vec<ConditionRecord> {
        flatten_for_execution(&self.tree)
    }

    pub fn drain_events(&mut self) -> Vec<ChangeEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn drain_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    /// Append a condition on the group's default field.
    ///
    /// Returns `None` (with a notice) when no data source or no fields are
    /// available yet.
    pub fn add_condition(&mut self, group: GroupId) -> Result<Option<NodeKey>> {
        if self.tree.group(group).is_none() {
            return Err(FilterError::GroupNotFound(group));
        }
        let built = self.default_condition(group);
        let Some(condition) = self.recover(built)? else {
            return Ok(None);
        };

        let key = self.tree.push_condition(group, condition)?;
        self.queue_new(key);
        self.emit(ChangeAction::AddFilter, NodeId::Condition(key));
        Ok(Some(key))
    }

    /// Create a group under `parent` with the opposite combinator and one
    /// default condition
    pub fn add_group(&mut self, parent: GroupId) -> Result<Option<GroupId>> {
        let combinator = self
            .tree
            .group(parent)
            .ok_or(FilterError::GroupNotFound(parent))?
            .combinator
            .flipped();

        let depth = self.tree.depth_of(parent).unwrap_or_default();
        if !self.config.allows_group_below(depth) {
            let limit = self.config.max_group_depth.unwrap_or_default();
            self.notify(&FilterError::DepthLimit(limit));
            return Ok(None);
        }

        let built = self.default_condition(parent);
        let Some(condition) = self.recover(built)? else {
            return Ok(None);
        };

        let id = self.tree.add_group(parent, combinator)?;
        let key = self.tree.push_condition(id, condition)?;
        self.queue_new(key);
        self.emit(ChangeAction::AddGroup, NodeId::Group(id));
        Ok(Some(id))
    }

    /// Flip a group's combinator. Only its direct conditions follow; nested
    /// groups keep their own.
    pub fn toggle_combinator(&mut self, group: GroupId) -> Result<Combinator> {
        let target = self
            .tree
            .group_mut(group)
            .ok_or(FilterError::GroupNotFound(group))?;
        target.combinator = target.combinator.flipped();
        let combinator = target.combinator;
        let keys: Vec<NodeKey> = target.conditions().map(|c| c.key).collect();

        let before = self.snapshot(&keys);
        self.tree.recompute_derived();
        self.queue_changed(before);
        self.emit(ChangeAction::ToggleLogic, NodeId::Group(group));
        Ok(combinator)
    }

    /// Move a node to `index` within `target` (the position it occupies once
    /// the move is done; clamped to the end).
    ///
    /// Conditions moved across groups take the new group's combinator.
    pub fn move_node(&mut self, node: NodeId, target: GroupId, index: usize) -> Result<()> {
        if self.tree.group(target).is_none() {
            return Err(FilterError::GroupNotFound(target));
        }
        if let NodeId::Group(id) = node {
            if id.is_root() {
                return Err(FilterError::InvalidMove(
                    "the root group cannot be moved".to_string(),
                ));
            }
            if self.tree.is_within(target, id) {
                return Err(FilterError::InvalidMove(format!(
                    "group {} cannot be moved into itself or one of its descendants",
                    id
                )));
            }
        }

        let keys = self.subtree_keys(node)?;
        let before = self.snapshot(&keys);

        let detached = self.tree.detach(node)?;
        self.tree.insert(target, Some(index), detached)?;

        self.queue_changed(before);
        self.emit(ChangeAction::DragDrop, node);
        Ok(())
    }

    /// Point a condition at another field of its data source. Operator,
    /// value and value source are reset.
    ///
    /// Returns `false` (with a notice) when the path does not resolve.
    pub fn change_field(&mut self, key: NodeKey, path: &str) -> Result<bool> {
        let data_source = self.find(key)?.data_source.clone();
        let resolved = self
            .fields
            .field(&data_source, path)
            .ok_or_else(|| FilterError::FieldNotFound {
                data_source,
                path: path.to_string(),
            });
        let Some(field) = self.recover(resolved)? else {
            return Ok(false);
        };

        self.edit(key, ChangeAction::ChangeField, |condition| {
            condition.reset_for_field(&field);
            Ok(())
        })?;
        Ok(true)
    }

    /// Switch operator; only the value is recomputed
    pub fn change_operator(&mut self, key: NodeKey, operator: Operator) -> Result<()> {
        let condition = self.find(key)?;
        if condition.operator == operator {
            return Ok(());
        }
        let field_type = condition.field_type.clone();
        let allowed = self
            .operators
            .get(&field_type)
            .iter()
            .any(|entry| entry.operator == operator);
        if !allowed {
            return Err(FilterError::OperatorNotAllowed {
                operator,
                field_type,
            });
        }

        self.edit(key, ChangeAction::ChangeOperator, |condition| {
            condition.set_operator(operator);
            Ok(())
        })
    }

    /// Assign a value typed by the user.
    ///
    /// Static values must have the current shape. Other sources take a
    /// reference key; dynamic keys must be registered.
    pub fn change_value(&mut self, key: NodeKey, value: Value) -> Result<()> {
        self.edit(key, ChangeAction::ChangeValue, |condition| {
            check_value(condition, &value)?;
            condition.value = value;
            Ok(())
        })
    }

    pub fn change_value_source(&mut self, key: NodeKey, source: ValueSource) -> Result<()> {
        if self.find(key)?.value_source == source {
            return Ok(());
        }
        self.edit(key, ChangeAction::ChangeValueSource, |condition| {
            condition.set_value_source(source);
            Ok(())
        })
    }

    pub fn set_active(&mut self, key: NodeKey, active: bool) -> Result<()> {
        self.edit(key, ChangeAction::ChangeFlags, |condition| {
            condition.is_active = active;
            Ok(())
        })
    }

    pub fn set_required(&mut self, key: NodeKey, required: bool) -> Result<()> {
        self.edit(key, ChangeAction::ChangeFlags, |condition| {
            condition.is_required = required;
            Ok(())
        })
    }

    pub(crate) fn find(&self, key: NodeKey) -> Result<&Condition> {
        self.tree
            .condition(key)
            .ok_or(FilterError::ConditionNotFound(key))
    }

    /// Apply `change` to one condition, then queue and announce it
    fn edit<F>(&mut self, key: NodeKey, action: ChangeAction, change: F) -> Result<()>
    where
        F: FnOnce(&mut Condition) -> Result<()>,
    {
        let condition = self
            .tree
            .condition_mut(key)
            .ok_or(FilterError::ConditionNotFound(key))?;
        let before = ConditionRecord::from(&*condition);
        change(condition)?;

        self.queue_changed(vec![(key, before)]);
        self.emit(action, NodeId::Condition(key));
        Ok(())
    }

    fn default_condition(&mut self, group: GroupId) -> Result<Condition> {
        let data_source = self
            .group_data_source(group)
            .ok_or(FilterError::NoDataSource)?;
        let field = self
            .fields
            .first_field(&data_source)
            .ok_or_else(|| FilterError::NoFields(data_source.clone()))?;

        let mut condition = self.tree.new_condition(data_source, &field);
        condition.is_active = self.config.new_conditions_active;
        Ok(condition)
    }

    /// Condition keys of a node's subtree
    pub(crate) fn subtree_keys(&self, node: NodeId) -> Result<Vec<NodeKey>> {
        match node {
            NodeId::Condition(key) => self.find(key).map(|c| vec![c.key]),
            NodeId::Group(id) => {
                let group = self.tree.group(id).ok_or(FilterError::GroupNotFound(id))?;
                let mut conditions = Vec::new();
                group.collect_conditions(&mut conditions);
                Ok(conditions.into_iter().map(|c| c.key).collect())
            }
        }
    }

    fn snapshot(&self, keys: &[NodeKey]) -> Vec<(NodeKey, ConditionRecord)> {
        keys.iter()
            .filter_map(|key| {
                self.tree
                    .condition(*key)
                    .map(|condition| (*key, ConditionRecord::from(condition)))
            })
            .collect()
    }

    /// Queue upserts for the conditions whose record differs from `before`
    fn queue_changed(&mut self, before: Vec<(NodeKey, ConditionRecord)>) {
        for (key, previous) in before {
            if let Some(condition) = self.tree.condition(key) {
                let current = ConditionRecord::from(condition);
                if current != previous {
                    self.log.upsert(key, current);
                }
            }
        }
    }

    fn queue_new(&mut self, key: NodeKey) {
        if let Some(condition) = self.tree.condition(key) {
            self.log.upsert(key, ConditionRecord::from(condition));
        }
    }

    fn emit(&mut self, action: ChangeAction, node: NodeId) {
        let record = match node {
            NodeId::Condition(key) => self.tree.condition(key).map(ConditionRecord::from),
            NodeId::Group(_) => None,
        };
        self.push_event(action, node, record);
    }

    pub(crate) fn push_event(
        &mut self,
        action: ChangeAction,
        node: NodeId,
        record: Option<ConditionRecord>,
    ) {
        tracing::debug!(action = %action, node = %node, "filter changed");
        self.events.push(ChangeEvent {
            action,
            node,
            record,
        });
    }

    pub(crate) fn notify(&mut self, err: &FilterError) {
        tracing::warn!(error = %err, "filter edit skipped");
        self.notices.push(Notice::from(err));
    }

    /// Turn configuration errors into a notice and `None`; anything else
    /// propagates
    pub(crate) fn recover<T>(&mut self, result: Result<T>) -> Result<Option<T>> {
        match result {
            Ok(value) => Ok(Some(value)),
            Err(err) if err.is_configuration() => {
                self.notify(&err);
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }
}

fn check_value(condition: &Condition, value: &Value) -> Result<()> {
    let shape = condition.shape();
    if shape.kind == ValueKind::None || condition.value_source.is_static() {
        if shape.kind.matches(value) {
            return Ok(());
        }
        return Err(FilterError::ValueShapeMismatch {
            expected: shape.kind,
        });
    }

    let reference = value.as_str().ok_or(FilterError::InvalidReferenceKey)?;
    if condition.value_source == ValueSource::Dynamic
        && !reference.is_empty()
        && dynamic_value(reference).is_none()
    {
        return Err(FilterError::UnknownDynamicValue(reference.to_string()));
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::editor::NoticeLevel;
    use crate::field::{FieldReference, FieldType};
    use crate::store::{MemoryStore, SyncCommand};
    use serde_json::json;

    pub(crate) fn orders() -> DataSourceId {
        DataSourceId::new("orders")
    }

    pub(crate) fn order_fields() -> Vec<FieldReference> {
        vec![
            FieldReference::new("status", "Status", FieldType::Char),
            FieldReference::new("quantity", "Quantity", FieldType::Integer),
            FieldReference::new("total", "Total", FieldType::Decimal),
            FieldReference::new("paid", "Paid", FieldType::Boolean),
            FieldReference::new("created", "Created", FieldType::Date),
        ]
    }

    /// Editor over an `orders` data source with its fields already resolved
    pub(crate) fn editor_with(store: Arc<MemoryStore>) -> FilterEditor {
        let fields = FieldCache::new();
        fields.insert(orders(), order_fields());
        FilterEditor::new(EditorConfig::default(), store)
            .with_field_cache(fields)
            .with_data_sources([orders()])
    }

    fn editor() -> FilterEditor {
        editor_with(Arc::new(MemoryStore::new()))
    }

    #[test]
    fn test_add_condition_uses_first_field() {
        let mut editor = editor();
        let key = editor.add_condition(GroupId::ROOT).unwrap().unwrap();

        let condition = editor.tree().condition(key).unwrap();
        assert_eq!(condition.field_path, "status");
        assert_eq!(condition.operator, Operator::Eq);
        assert_eq!(condition.value, json!(""));
        assert_eq!(condition.value_source, ValueSource::Static);
        assert_eq!(condition.logic_group, Combinator::And);
        assert_eq!(editor.pending().len(), 1);

        let events = editor.drain_events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].action, ChangeAction::AddFilter);
        assert!(events[0].record.is_some());
    }

    #[test]
    fn test_boolean_field_defaults() {
        let fields = FieldCache::new();
        fields.insert(
            DataSourceId::new("flags"),
            vec![FieldReference::new("enabled", "Enabled", FieldType::Boolean)],
        );
        let mut editor = FilterEditor::new(EditorConfig::default(), Arc::new(MemoryStore::new()))
            .with_field_cache(fields)
            .with_data_sources([DataSourceId::new("flags")]);

        let key = editor.add_condition(GroupId::ROOT).unwrap().unwrap();
        let condition = editor.tree().condition(key).unwrap();
        assert_eq!(condition.operator, Operator::Eq);
        assert_eq!(condition.value, json!(false));
        assert_eq!(condition.value_source, ValueSource::Static);
    }

    #[test]
    fn test_no_data_source_is_a_notice() {
        let mut editor = FilterEditor::new(EditorConfig::default(), Arc::new(MemoryStore::new()));

        assert_eq!(editor.add_condition(GroupId::ROOT).unwrap(), None);
        assert!(editor.tree().is_empty());
        assert!(editor.drain_events().is_empty());

        let notices = editor.drain_notices();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].level, NoticeLevel::Warning);
    }

    #[test]
    fn test_unloaded_fields_is_a_notice() {
        let mut editor = FilterEditor::new(EditorConfig::default(), Arc::new(MemoryStore::new()))
            .with_data_sources([orders()]);

        assert_eq!(editor.add_group(GroupId::ROOT).unwrap(), None);
        assert_eq!(editor.tree().group_count(), 1);
        assert_eq!(editor.drain_notices().len(), 1);
    }

    #[test]
    fn test_unknown_group_is_an_error() {
        let mut editor = editor();
        assert_eq!(
            editor.add_condition(GroupId(9)),
            Err(FilterError::GroupNotFound(GroupId(9)))
        );
    }

    #[test]
    fn test_add_group_flips_combinator() {
        let mut editor = editor();
        let outer = editor.add_group(GroupId::ROOT).unwrap().unwrap();
        let inner = editor.add_group(outer).unwrap().unwrap();

        assert_eq!(editor.tree().group(outer).unwrap().combinator, Combinator::Or);
        assert_eq!(editor.tree().group(inner).unwrap().combinator, Combinator::And);

        let first = editor.tree().group(outer).unwrap().conditions().next().unwrap();
        assert_eq!(first.logic_group, Combinator::Or);
        assert_eq!(first.parent_group, Some(outer));
    }

    #[test]
    fn test_group_depth_limit() {
        let config = EditorConfig {
            max_group_depth: Some(1),
            ..EditorConfig::default()
        };
        let fields = FieldCache::new();
        fields.insert(orders(), order_fields());
        let mut editor = FilterEditor::new(config, Arc::new(MemoryStore::new()))
            .with_field_cache(fields)
            .with_data_sources([orders()]);

        let group = editor.add_group(GroupId::ROOT).unwrap().unwrap();
        assert_eq!(editor.add_group(group).unwrap(), None);
        assert_eq!(editor.tree().group_count(), 2);
        assert!(editor.drain_notices()[0].message.contains("1"));
    }

    #[test]
    fn test_group_uses_its_own_data_source() {
        let fields = FieldCache::new();
        fields.insert(orders(), order_fields());
        fields.insert(
            DataSourceId::new("customers"),
            vec![FieldReference::new("email", "Email", FieldType::Email)],
        );
        let mut editor = FilterEditor::new(EditorConfig::default(), Arc::new(MemoryStore::new()))
            .with_field_cache(fields)
            .with_data_sources([orders(), DataSourceId::new("customers")]);

        let group = editor.tree.add_group(GroupId::ROOT, Combinator::Or).unwrap();
        let field = FieldReference::new("email", "Email", FieldType::Email);
        let seeded = editor.tree.new_condition(DataSourceId::new("customers"), &field);
        editor.tree.push_condition(group, seeded).unwrap();

        let key = editor.add_condition(group).unwrap().unwrap();
        assert_eq!(editor.tree().condition(key).unwrap().field_path, "email");

        let top = editor.add_condition(GroupId::ROOT).unwrap().unwrap();
        assert_eq!(editor.tree().condition(top).unwrap().data_source, orders());
    }

    #[test]
    fn test_toggle_leaves_nested_groups_alone() {
        let mut editor = editor();
        let top = editor.add_condition(GroupId::ROOT).unwrap().unwrap();
        let group = editor.add_group(GroupId::ROOT).unwrap().unwrap();
        let nested = editor.tree().group(group).unwrap().conditions().next().unwrap().key;

        let combinator = editor.toggle_combinator(GroupId::ROOT).unwrap();
        assert_eq!(combinator, Combinator::Or);
        assert_eq!(editor.tree().condition(top).unwrap().logic_group, Combinator::Or);
        assert_eq!(editor.tree().group(group).unwrap().combinator, Combinator::Or);
        assert_eq!(editor.tree().condition(nested).unwrap().logic_group, Combinator::Or);

        editor.toggle_combinator(GroupId::ROOT).unwrap();
        assert_eq!(editor.tree().condition(top).unwrap().logic_group, Combinator::And);
        assert_eq!(editor.tree().condition(nested).unwrap().logic_group, Combinator::Or);
        assert!(editor.tree().invariant_violations().is_empty());
    }

    #[test]
    fn test_change_field_resets_condition() {
        let mut editor = editor();
        let key = editor.add_condition(GroupId::ROOT).unwrap().unwrap();
        editor.change_operator(key, Operator::Contains).unwrap();
        editor.change_value(key, json!("pending")).unwrap();

        assert!(editor.change_field(key, "quantity").unwrap());
        let condition = editor.tree().condition(key).unwrap();
        assert_eq!(condition.field_type, FieldType::Integer);
        assert_eq!(condition.operator, Operator::Eq);
        assert_eq!(condition.value, json!(0));
        assert_eq!(condition.value_source, ValueSource::Static);
    }

    #[test]
    fn test_change_field_to_unknown_path_is_a_notice() {
        let mut editor = editor();
        let key = editor.add_condition(GroupId::ROOT).unwrap().unwrap();
        editor.drain_events();

        assert!(!editor.change_field(key, "missing").unwrap());
        assert_eq!(editor.tree().condition(key).unwrap().field_path, "status");
        assert!(editor.drain_events().is_empty());
        assert_eq!(editor.drain_notices().len(), 1);
    }

    #[test]
    fn test_between_on_decimal() {
        let mut editor = editor();
        let key = editor.add_condition(GroupId::ROOT).unwrap().unwrap();
        editor.change_field(key, "total").unwrap();
        editor.change_value(key, json!(5)).unwrap();

        editor.change_operator(key, Operator::Between).unwrap();
        let condition = editor.tree().condition(key).unwrap();
        assert_eq!(condition.value, json!([0, 0]));
        assert_eq!(condition.field_path, "total");
        assert_eq!(condition.value_source, ValueSource::Static);
    }

    #[test]
    fn test_operator_outside_catalog_is_rejected() {
        let mut editor = editor();
        let key = editor.add_condition(GroupId::ROOT).unwrap().unwrap();
        editor.change_field(key, "paid").unwrap();

        let result = editor.change_operator(key, Operator::Contains);
        assert_eq!(
            result,
            Err(FilterError::OperatorNotAllowed {
                operator: Operator::Contains,
                field_type: FieldType::Boolean,
            })
        );
        assert_eq!(editor.tree().condition(key).unwrap().operator, Operator::Eq);
    }

    #[test]
    fn test_change_value_checks_shape() {
        let mut editor = editor();
        let key = editor.add_condition(GroupId::ROOT).unwrap().unwrap();
        editor.change_operator(key, Operator::In).unwrap();

        assert_eq!(
            editor.change_value(key, json!("a")),
            Err(FilterError::ValueShapeMismatch {
                expected: ValueKind::List
            })
        );
        editor.change_value(key, json!(["a", "b"])).unwrap();
        assert_eq!(editor.tree().condition(key).unwrap().value, json!(["a", "b"]));
    }

    #[test]
    fn test_reference_values() {
        let mut editor = editor();
        let key = editor.add_condition(GroupId::ROOT).unwrap().unwrap();
        editor.change_field(key, "created").unwrap();
        editor.change_value_source(key, ValueSource::Dynamic).unwrap();
        assert_eq!(editor.tree().condition(key).unwrap().value, json!(""));

        assert_eq!(
            editor.change_value(key, json!("next_century")),
            Err(FilterError::UnknownDynamicValue("next_century".to_string()))
        );
        assert_eq!(
            editor.change_value(key, json!(3)),
            Err(FilterError::InvalidReferenceKey)
        );
        editor.change_value(key, json!("today")).unwrap();

        editor.change_value_source(key, ValueSource::Parameter).unwrap();
        editor.change_value(key, json!("any_parameter")).unwrap();

        editor.change_value_source(key, ValueSource::Static).unwrap();
        assert_eq!(editor.tree().condition(key).unwrap().value, Value::Null);
        assert!(editor.tree().invariant_violations().is_empty());
    }

    #[test]
    fn test_move_between_groups_syncs_combinator() {
        let mut editor = editor();
        let key = editor.add_condition(GroupId::ROOT).unwrap().unwrap();
        let group = editor.add_group(GroupId::ROOT).unwrap().unwrap();
        assert_eq!(editor.tree().condition(key).unwrap().logic_group, Combinator::And);

        editor.move_node(NodeId::Condition(key), group, 0).unwrap();
        let moved = editor.tree().condition(key).unwrap();
        assert_eq!(moved.logic_group, Combinator::Or);
        assert_eq!(moved.group_order, group.ordinal());
        assert_eq!(editor.tree().parent_of(NodeId::Condition(key)), Some((group, 0)));
    }

    #[test]
    fn test_reorder_within_group() {
        let mut editor = editor();
        let first = editor.add_condition(GroupId::ROOT).unwrap().unwrap();
        let second = editor.add_condition(GroupId::ROOT).unwrap().unwrap();
        let third = editor.add_condition(GroupId::ROOT).unwrap().unwrap();
        editor.log.take();

        editor.move_node(NodeId::Condition(first), GroupId::ROOT, 2).unwrap();
        let order: Vec<NodeKey> = editor.tree().conditions().iter().map(|c| c.key).collect();
        assert_eq!(order, vec![second, third, first]);
        // Records are unchanged by a pure reorder
        assert!(editor.pending().is_empty());
        assert_eq!(editor.drain_events().last().unwrap().action, ChangeAction::DragDrop);
    }

    #[test]
    fn test_group_cannot_move_into_descendant() {
        let mut editor = editor();
        let outer = editor.add_group(GroupId::ROOT).unwrap().unwrap();
        let inner = editor.add_group(outer).unwrap().unwrap();

        assert!(matches!(
            editor.move_node(NodeId::Group(outer), inner, 0),
            Err(FilterError::InvalidMove(_))
        ));
        assert!(matches!(
            editor.move_node(NodeId::Group(outer), outer, 0),
            Err(FilterError::InvalidMove(_))
        ));
        assert!(matches!(
            editor.move_node(NodeId::Group(GroupId::ROOT), outer, 0),
            Err(FilterError::InvalidMove(_))
        ));

        editor.move_node(NodeId::Group(inner), GroupId::ROOT, 0).unwrap();
        assert_eq!(editor.tree().depth_of(inner), Some(1));
    }

    #[test]
    fn test_inactive_conditions_skip_execution() {
        let mut editor = editor();
        let key = editor.add_condition(GroupId::ROOT).unwrap().unwrap();
        editor.add_condition(GroupId::ROOT).unwrap();
        editor.set_active(key, false).unwrap();
        editor.set_required(key, true).unwrap();

        assert_eq!(editor.flatten().len(), 2);
        assert_eq!(editor.flatten_for_execution().len(), 1);
        assert!(editor.flatten()[0].is_required);
    }

    #[test]
    fn test_edits_coalesce_in_pending_log() {
        let mut editor = editor();
        let key = editor.add_condition(GroupId::ROOT).unwrap().unwrap();
        editor.change_operator(key, Operator::Contains).unwrap();
        editor.change_value(key, json!("x")).unwrap();

        match editor.pending().commands() {
            [SyncCommand::Upsert { id: None, record, .. }] => {
                assert_eq!(record.operator, Operator::Contains);
                assert_eq!(record.value, json!("x"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_operators_for_condition() {
        let mut editor = editor();
        let key = editor.add_condition(GroupId::ROOT).unwrap().unwrap();
        let operators = editor.operators_for(key).unwrap();
        assert_eq!(operators[0].operator, Operator::Eq);
        assert!(operators.iter().any(|entry| entry.operator == Operator::Regex));
        assert!(editor.operators_for(NodeKey(99)).is_err());
    }

    #[test]
    fn test_from_records_restores_groups() {
        let mut source = editor();
        source.add_condition(GroupId::ROOT).unwrap();
        let group = source.add_group(GroupId::ROOT).unwrap().unwrap();
        source.add_condition(group).unwrap();
        let records = source.flatten();

        let reopened = FilterEditor::from_records(
            &records,
            EditorConfig::default(),
            Arc::new(MemoryStore::new()),
        );
        assert_eq!(reopened.tree().group_count(), 2);
        assert_eq!(reopened.tree().condition_count(), 3);
        assert_eq!(reopened.data_sources(), &[orders()]);
        assert_eq!(reopened.flatten(), records);
    }

    #[test]
    fn test_from_records_without_root_conditions_uses_configured_combinator() {
        let mut source = FilterEditor::new(
            EditorConfig {
                root_combinator: Combinator::Or,
                ..EditorConfig::default()
            },
            Arc::new(MemoryStore::new()),
        )
        .with_field_cache({
            let fields = FieldCache::new();
            fields.insert(orders(), order_fields());
            fields
        })
        .with_data_sources([orders()]);
        let first = source.add_group(GroupId::ROOT).unwrap().unwrap();
        source.add_group(GroupId::ROOT).unwrap().unwrap();
        let records = source.flatten();
        assert!(records.iter().all(|record| record.group_order != 0));

        let reopened = FilterEditor::from_records(
            &records,
            source.config().clone(),
            Arc::new(MemoryStore::new()),
        );
        assert_eq!(reopened.tree().root().combinator, Combinator::Or);
        assert_eq!(
            reopened.tree().group(first).unwrap().combinator,
            Combinator::And
        );
        assert_eq!(reopened.flatten(), records);
    }

    #[test]
    fn test_from_records_with_exhausted_ordinal_stays_editable() {
        let mut source = editor();
        source.add_condition(GroupId::ROOT).unwrap();
        let mut records = source.flatten();
        records[0].group_order = u32::MAX;

        let mut reopened = FilterEditor::from_records(
            &records,
            EditorConfig::default(),
            Arc::new(MemoryStore::new()),
        )
        .with_field_cache(source.field_cache().clone());
        let group = reopened.add_group(GroupId::ROOT).unwrap().unwrap();
        assert!(!group.is_root());
        assert_eq!(reopened.tree().group_count(), 3);
        assert!(reopened.tree().invariant_violations().is_empty());
    }
}
