//! Operations that wait on collaborators: field metadata and the store

use crate::codec::ConditionRecord;
use crate::editor::engine::FilterEditor;
use crate::editor::event::ChangeAction;
use crate::error::{FilterError, Result};
use crate::field::DataSourceId;
use crate::store::{delete_idempotent, replay, SyncCommand, SyncReport};
use crate::tree::{GroupId, NodeId};
use std::sync::Arc;

impl FilterEditor {
    /// Resolve a data source's fields through the configured provider and
    /// register the data source.
    ///
    /// Returns `false` (with a notice) when the metadata cannot be resolved.
    pub async fn load_fields(&mut self, data_source: &DataSourceId) -> Result<bool> {
        let loaded = match self.provider.clone() {
            Some(provider) => self.fields.load(provider.as_ref(), data_source).await,
            None => Err(FilterError::MetadataUnavailable(
                "no field provider configured".to_string(),
            )),
        };
        if self.recover(loaded)?.is_none() {
            return Ok(false);
        }
        self.add_data_source(data_source.clone());
        Ok(true)
    }

    /// Remove a condition or a group with its whole subtree.
    ///
    /// Persisted conditions are deleted from the store first and the node
    /// leaves the tree only once every delete succeeded. A failed delete
    /// keeps the node and raises a notice; the result is then `false`.
    pub async fn remove(&mut self, node: NodeId) -> Result<bool> {
        if node == NodeId::Group(GroupId::ROOT) {
            return Err(FilterError::InvalidMove(
                "the root group cannot be removed".to_string(),
            ));
        }
        let keys = self.subtree_keys(node)?;
        let persisted: Vec<(_, i64)> = keys
            .iter()
            .filter_map(|key| {
                self.tree
                    .condition(*key)
                    .and_then(|condition| condition.id)
                    .map(|id| (*key, id))
            })
            .collect();

        let store = Arc::clone(&self.store);
        for (key, id) in persisted {
            if let Err(err) = delete_idempotent(store.as_ref(), id).await {
                tracing::warn!(key = %key, id, error = %err, "delete failed, node kept");
                self.notify(&FilterError::Store(err));
                return Ok(false);
            }
        }

        let record = match node {
            NodeId::Condition(key) => self.tree.condition(key).map(ConditionRecord::from),
            NodeId::Group(_) => None,
        };
        self.tree.detach(node)?;
        for key in keys {
            // Already deleted above, or never created
            self.log.discard(key);
        }

        self.push_event(ChangeAction::Delete, node, record);
        Ok(true)
    }

    /// Hand the pending commands over for replay. Edits may continue while
    /// the batch is in flight; pass the outcome to [`FilterEditor::finish_sync`].
    pub fn begin_sync(&mut self) -> Vec<SyncCommand> {
        self.log.take()
    }

    /// Fold a replay outcome back into the session.
    ///
    /// New identities are written onto their conditions. A create whose
    /// condition was removed meanwhile is queued for deletion. Failed
    /// commands are queued again with the condition's current content.
    pub fn finish_sync(&mut self, report: &SyncReport) {
        for (key, id) in &report.created {
            match self.tree.condition_mut(*key) {
                Some(condition) => {
                    condition.id = Some(*id);
                    self.log.assign_id(*key, *id);
                }
                None => {
                    tracing::debug!(key = %key, id, "created condition was removed meanwhile");
                    self.log.delete(*key, Some(*id));
                }
            }
        }

        for (command, err) in &report.failed {
            self.notify(&FilterError::Store(err.clone()));
            match command {
                SyncCommand::Upsert { key, .. } => {
                    if let Some(condition) = self.tree.condition(*key) {
                        let record = ConditionRecord::from(condition);
                        self.log.requeue(SyncCommand::Upsert {
                            key: *key,
                            id: condition.id,
                            record,
                        });
                    }
                }
                SyncCommand::Delete { .. } => self.log.requeue(command.clone()),
            }
        }
    }

    /// Send every pending command to the store
    pub async fn flush(&mut self) -> SyncReport {
        let commands = self.begin_sync();
        if commands.is_empty() {
            return SyncReport::default();
        }
        let store = Arc::clone(&self.store);
        let report = replay(commands, store.as_ref()).await;
        self.finish_sync(&report);
        report
    }

    /// Bulk save: queue every condition, then flush
    pub async fn save_all(&mut self) -> SyncReport {
        let records: Vec<_> = self
            .tree
            .conditions()
            .into_iter()
            .map(|condition| (condition.key, ConditionRecord::from(condition)))
            .collect();
        for (key, record) in records {
            self.log.upsert(key, record);
        }
        self.flush().await
    }
}
