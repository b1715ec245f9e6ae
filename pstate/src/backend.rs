//! State backend trait, backend configuration, and in-memory backend.

use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use pcommon::{BoxFuture, ConversationId};
use serde::{Deserialize, Serialize};

use crate::backends::sqlite::default_sqlite_path;
use crate::error::StateError;

pub use crate::backends::filesystem::FilesystemStateBackend;
pub use crate::backends::sqlite::SqliteStateBackend;

/// Every persisted property of one conversation, keyed by property name.
pub type PropertyMap = BTreeMap<String, serde_json::Value>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", content = "value", rename_all = "snake_case")]
pub enum PropertyChange {
    Set(serde_json::Value),
    Remove,
}

pub type PropertyChanges = BTreeMap<String, PropertyChange>;

pub(crate) fn apply_changes(properties: &mut PropertyMap, changes: PropertyChanges) {
    for (key, change) in changes {
        match change {
            PropertyChange::Set(value) => {
                properties.insert(key, value);
            }
            PropertyChange::Remove => {
                properties.remove(&key);
            }
        }
    }
}

pub trait StateBackend: Send + Sync {
    fn load_properties<'a>(
        &'a self,
        conversation_id: &'a ConversationId,
    ) -> BoxFuture<'a, Result<PropertyMap, StateError>>;

    /// Applies all `changes` for one conversation as a single write.
    fn save_properties<'a>(
        &'a self,
        conversation_id: &'a ConversationId,
        changes: PropertyChanges,
    ) -> BoxFuture<'a, Result<(), StateError>>;

    /// Returns whether anything was stored for the conversation.
    fn delete_conversation<'a>(
        &'a self,
        conversation_id: &'a ConversationId,
    ) -> BoxFuture<'a, Result<bool, StateError>>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateBackendConfig {
    InMemory,
    Filesystem { root: PathBuf },
    Sqlite { path: PathBuf },
}

impl Default for StateBackendConfig {
    fn default() -> Self {
        Self::Sqlite {
            path: default_sqlite_path(),
        }
    }
}

pub fn create_state_backend(
    config: StateBackendConfig,
) -> Result<Arc<dyn StateBackend>, StateError> {
    match config {
        StateBackendConfig::InMemory => Ok(Arc::new(InMemoryStateBackend::new())),
        StateBackendConfig::Filesystem { root } => Ok(Arc::new(FilesystemStateBackend::new(root)?)),
        StateBackendConfig::Sqlite { path } => Ok(Arc::new(SqliteStateBackend::new(path)?)),
    }
}

pub fn create_default_state_backend() -> Result<Arc<dyn StateBackend>, StateError> {
    create_state_backend(StateBackendConfig::default())
}

#[derive(Debug, Default)]
pub struct InMemoryStateBackend {
    conversations: Mutex<HashMap<ConversationId, PropertyMap>>,
}

impl InMemoryStateBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn conversation_count(&self) -> Result<usize, StateError> {
        Ok(self
            .conversations
            .lock()
            .map_err(|_| StateError::storage("memory backend lock poisoned"))?
            .len())
    }
}

impl StateBackend for InMemoryStateBackend {
    fn load_properties<'a>(
        &'a self,
        conversation_id: &'a ConversationId,
    ) -> BoxFuture<'a, Result<PropertyMap, StateError>> {
        Box::pin(async move {
            let conversations = self
                .conversations
                .lock()
                .map_err(|_| StateError::storage("memory backend lock poisoned"))?;

            Ok(conversations
                .get(conversation_id)
                .cloned()
                .unwrap_or_default())
        })
    }

    fn save_properties<'a>(
        &'a self,
        conversation_id: &'a ConversationId,
        changes: PropertyChanges,
    ) -> BoxFuture<'a, Result<(), StateError>> {
        Box::pin(async move {
            let mut conversations = self
                .conversations
                .lock()
                .map_err(|_| StateError::storage("memory backend lock poisoned"))?;

            let properties = conversations.entry(conversation_id.clone()).or_default();
            apply_changes(properties, changes);
            Ok(())
        })
    }

    fn delete_conversation<'a>(
        &'a self,
        conversation_id: &'a ConversationId,
    ) -> BoxFuture<'a, Result<bool, StateError>> {
        Box::pin(async move {
            let mut conversations = self
                .conversations
                .lock()
                .map_err(|_| StateError::storage("memory backend lock poisoned"))?;

            Ok(conversations.remove(conversation_id).is_some())
        })
    }
}
