//! Typed, change-tracking view over a conversation's persisted properties.
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use pstate::{ConversationStateStore, InMemoryStateBackend};
//!
//! let store = ConversationStateStore::new(Arc::new(InMemoryStateBackend::new()));
//! let _backend = Arc::clone(store.backend());
//! ```

use std::sync::Arc;

use pcommon::ConversationId;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::backend::{PropertyChange, PropertyChanges, PropertyMap, StateBackend};
use crate::error::StateError;

#[derive(Clone)]
pub struct ConversationStateStore {
    backend: Arc<dyn StateBackend>,
}

impl ConversationStateStore {
    pub fn new(backend: Arc<dyn StateBackend>) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &Arc<dyn StateBackend> {
        &self.backend
    }

    /// Reads every property of the conversation; a new conversation yields an empty state.
    pub async fn load(
        &self,
        conversation_id: impl Into<ConversationId>,
    ) -> Result<TurnState, StateError> {
        let conversation_id = conversation_id.into();
        let values = self.backend.load_properties(&conversation_id).await?;

        Ok(TurnState {
            conversation_id,
            backend: Arc::clone(&self.backend),
            values,
            changes: PropertyChanges::new(),
        })
    }

    pub async fn delete(
        &self,
        conversation_id: impl Into<ConversationId>,
    ) -> Result<bool, StateError> {
        let conversation_id = conversation_id.into();
        self.backend.delete_conversation(&conversation_id).await
    }
}

/// One turn's working copy of a conversation's properties.
pub struct TurnState {
    conversation_id: ConversationId,
    backend: Arc<dyn StateBackend>,
    values: PropertyMap,
    changes: PropertyChanges,
}

impl TurnState {
    pub fn conversation_id(&self) -> &ConversationId {
        &self.conversation_id
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn get<T>(&self, key: &str) -> Result<Option<T>, StateError>
    where
        T: DeserializeOwned,
    {
        self.values
            .get(key)
            .map(|value| {
                serde_json::from_value(value.clone()).map_err(|error| {
                    StateError::serialization(format!("failed to decode property '{key}': {error}"))
                })
            })
            .transpose()
    }

    /// Returns the stored value, or stores and returns `T::default()` when absent.
    pub fn get_or_default<T>(&mut self, key: &str) -> Result<T, StateError>
    where
        T: DeserializeOwned + Serialize + Default,
    {
        if let Some(value) = self.get(key)? {
            return Ok(value);
        }

        let value = T::default();
        self.set(key, &value)?;
        Ok(value)
    }

    pub fn set<T>(&mut self, key: &str, value: &T) -> Result<(), StateError>
    where
        T: Serialize + ?Sized,
    {
        let value = serde_json::to_value(value).map_err(|error| {
            StateError::serialization(format!("failed to encode property '{key}': {error}"))
        })?;

        if self.values.get(key) == Some(&value) {
            return Ok(());
        }

        self.values.insert(key.to_string(), value.clone());
        self.changes
            .insert(key.to_string(), PropertyChange::Set(value));
        Ok(())
    }

    pub fn remove(&mut self, key: &str) -> bool {
        let existed = self.values.remove(key).is_some();
        if existed {
            self.changes.insert(key.to_string(), PropertyChange::Remove);
        }
        existed
    }

    pub fn is_dirty(&self) -> bool {
        !self.changes.is_empty()
    }

    pub fn dirty_keys(&self) -> Vec<String> {
        self.changes.keys().cloned().collect()
    }

    /// Writes all pending changes in one backend call and clears the dirty set.
    pub async fn save_changes(&mut self) -> Result<(), StateError> {
        if self.changes.is_empty() {
            return Ok(());
        }

        let changes = std::mem::take(&mut self.changes);
        if let Err(error) = self
            .backend
            .save_properties(&self.conversation_id, changes.clone())
            .await
        {
            self.changes = changes;
            return Err(error);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use pcommon::BoxFuture;
    use serde::Deserialize;

    use super::*;
    use crate::{InMemoryStateBackend, StateErrorKind};

    #[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
    struct Profile {
        make: Option<String>,
        year: Option<i32>,
    }

    #[derive(Default)]
    struct CountingBackend {
        inner: InMemoryStateBackend,
        saves: Mutex<Vec<usize>>,
    }

    impl StateBackend for CountingBackend {
        fn load_properties<'a>(
            &'a self,
            conversation_id: &'a ConversationId,
        ) -> BoxFuture<'a, Result<PropertyMap, StateError>> {
            self.inner.load_properties(conversation_id)
        }

        fn save_properties<'a>(
            &'a self,
            conversation_id: &'a ConversationId,
            changes: PropertyChanges,
        ) -> BoxFuture<'a, Result<(), StateError>> {
            self.saves.lock().expect("saves lock").push(changes.len());
            self.inner.save_properties(conversation_id, changes)
        }

        fn delete_conversation<'a>(
            &'a self,
            conversation_id: &'a ConversationId,
        ) -> BoxFuture<'a, Result<bool, StateError>> {
            self.inner.delete_conversation(conversation_id)
        }
    }

    #[tokio::test]
    async fn get_or_default_creates_and_set_persists_on_save() {
        let backend = Arc::new(CountingBackend::default());
        let store = ConversationStateStore::new(backend.clone());

        let mut turn = store.load("conv-1").await.expect("load should work");
        assert!(turn.get::<Profile>("profile").expect("get").is_none());

        let mut profile: Profile = turn.get_or_default("profile").expect("default");
        profile.make = Some("Toyota".to_string());
        turn.set("profile", &profile).expect("set should work");
        turn.set("turns", &1_u32).expect("set should work");
        assert_eq!(turn.dirty_keys(), vec!["profile".to_string(), "turns".to_string()]);

        turn.save_changes().await.expect("save should work");
        assert!(!turn.is_dirty());
        assert_eq!(*backend.saves.lock().expect("saves lock"), vec![2]);

        let reloaded = store.load("conv-1").await.expect("reload should work");
        assert_eq!(
            reloaded.get::<Profile>("profile").expect("get"),
            Some(profile)
        );
    }

    #[tokio::test]
    async fn unchanged_values_do_not_trigger_writes() {
        let backend = Arc::new(CountingBackend::default());
        let store = ConversationStateStore::new(backend.clone());

        let mut turn = store.load("conv-2").await.expect("load should work");
        turn.set("count", &3_u32).expect("set");
        turn.save_changes().await.expect("save");

        let mut turn = store.load("conv-2").await.expect("load should work");
        turn.set("count", &3_u32).expect("set");
        assert!(!turn.is_dirty());
        turn.save_changes().await.expect("save");

        assert_eq!(backend.saves.lock().expect("saves lock").len(), 1);
    }

    #[tokio::test]
    async fn remove_is_persisted_and_type_mismatch_is_reported() {
        let store = ConversationStateStore::new(Arc::new(InMemoryStateBackend::new()));

        let mut turn = store.load("conv-3").await.expect("load");
        turn.set("year", &"not a number").expect("set");
        let error = turn.get::<i32>("year").expect_err("decode should fail");
        assert_eq!(error.kind, StateErrorKind::Serialization);

        assert!(turn.remove("year"));
        assert!(!turn.remove("year"));
        turn.save_changes().await.expect("save");

        let reloaded = store.load("conv-3").await.expect("reload");
        assert!(!reloaded.contains("year"));
        assert!(store.delete("conv-3").await.expect("delete"));
        assert!(!store.delete("conv-3").await.expect("delete"));
    }
}
