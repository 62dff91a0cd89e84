//! Command log between the editing session and the store
//!
//! Each mutated condition leaves at most one pending command. Commands are
//! replay-safe: an upsert becomes a create or an update depending on whether
//! the condition has a server identity by the time it is sent, and deletes
//! tolerate missing records.

use crate::codec::ConditionRecord;
use crate::store::{delete_idempotent, ConditionStore, StoreError};
use crate::tree::NodeKey;

#[derive(Debug, Clone, PartialEq)]
pub enum SyncCommand {
    Upsert {
        key: NodeKey,
        id: Option<i64>,
        record: ConditionRecord,
    },
    Delete {
        key: NodeKey,
        id: i64,
    },
}

impl SyncCommand {
    pub fn key(&self) -> NodeKey {
        match self {
            SyncCommand::Upsert { key, .. } | SyncCommand::Delete { key, .. } => *key,
        }
    }
}

/// Outcome of replaying a batch of commands
#[derive(Debug, Default)]
pub struct SyncReport {
    /// Identities the store assigned to newly created conditions
    pub created: Vec<(NodeKey, i64)>,
    pub updated: Vec<NodeKey>,
    pub deleted: Vec<i64>,
    pub failed: Vec<(SyncCommand, StoreError)>,
}

impl SyncReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

#[derive(Debug, Default)]
pub struct CommandLog {
    commands: Vec<SyncCommand>,
}

impl CommandLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the latest content of a condition, replacing any pending upsert
    pub fn upsert(&mut self, key: NodeKey, record: ConditionRecord) {
        for command in &mut self.commands {
            if let SyncCommand::Upsert {
                key: pending,
                id,
                record: pending_record,
            } = command
            {
                if *pending == key {
                    *id = id.or(record.id);
                    *pending_record = record;
                    return;
                }
            }
        }
        self.commands.push(SyncCommand::Upsert {
            key,
            id: record.id,
            record,
        });
    }

    /// Queue removal of a condition. Pending upserts for it are dropped; a
    /// condition the store never saw needs no command at all.
    pub fn delete(&mut self, key: NodeKey, id: Option<i64>) {
        let mut known_id = id;
        self.commands.retain(|command| match command {
            SyncCommand::Upsert {
                key: pending,
                id: pending_id,
                ..
            } if *pending == key => {
                known_id = known_id.or(*pending_id);
                false
            }
            _ => true,
        });

        if let Some(id) = known_id {
            let queued = self
                .commands
                .iter()
                .any(|command| matches!(command, SyncCommand::Delete { id: pending, .. } if *pending == id));
            if !queued {
                self.commands.push(SyncCommand::Delete { key, id });
            }
        }
    }

    /// Drop every pending command for a key without queueing anything
    pub fn discard(&mut self, key: NodeKey) {
        self.commands.retain(|command| command.key() != key);
    }

    /// Record a server identity that arrived while commands were queued
    pub fn assign_id(&mut self, key: NodeKey, server_id: i64) {
        for command in &mut self.commands {
            if let SyncCommand::Upsert {
                key: pending,
                id,
                record,
            } = command
            {
                if *pending == key {
                    *id = Some(server_id);
                    record.id = Some(server_id);
                }
            }
        }
    }

    /// Put a failed command back unless something newer replaced it
    pub fn requeue(&mut self, command: SyncCommand) {
        let key = command.key();
        if self.commands.iter().any(|pending| pending.key() == key) {
            return;
        }
        self.commands.insert(0, command);
    }

    /// Drain every pending command for replay
    pub fn take(&mut self) -> Vec<SyncCommand> {
        std::mem::take(&mut self.commands)
    }

    pub fn commands(&self) -> &[SyncCommand] {
        &self.commands
    }

    pub fn is_pending(&self, key: NodeKey) -> bool {
        self.commands.iter().any(|command| command.key() == key)
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

/// Send a batch to the store, in order. Failures do not stop the batch.
pub async fn replay(commands: Vec<SyncCommand>, store: &dyn ConditionStore) -> SyncReport {
    let mut report = SyncReport::default();

    for command in commands {
        let outcome = match &command {
            SyncCommand::Upsert {
                key,
                id: None,
                record,
            } => store.create(record).await.map(|created| {
                if let Some(id) = created.id {
                    report.created.push((*key, id));
                }
            }),
            SyncCommand::Upsert {
                key,
                id: Some(id),
                record,
            } => store
                .update(*id, record)
                .await
                .map(|_| report.updated.push(*key)),
            SyncCommand::Delete { id, .. } => delete_idempotent(store, *id)
                .await
                .map(|_| report.deleted.push(*id)),
        };

        if let Err(err) = outcome {
            tracing::warn!(key = %command.key(), error = %err, "store command failed");
            report.failed.push((command, err));
        }
    }

    report
}
