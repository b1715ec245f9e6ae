use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use pcommon::{BoxFuture, ConversationId};
use serde::{Deserialize, Serialize};

use crate::backend::{PropertyChanges, PropertyMap, StateBackend, apply_changes};
use crate::error::StateError;

const FORMAT_VERSION: u32 = 1;

/// Stores one pretty-printed JSON document per conversation under `root/conversations`.
#[derive(Debug)]
pub struct FilesystemStateBackend {
    root: PathBuf,
    lock: Mutex<()>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct PersistedConversation {
    format_version: u32,
    conversation_id: String,
    #[serde(default)]
    properties: PropertyMap,
}

impl FilesystemStateBackend {
    pub fn new(root: impl AsRef<Path>) -> Result<Self, StateError> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(root.join("conversations")).map_err(|error| {
            StateError::storage(format!("failed to create filesystem backend root: {error}"))
        })?;
        Ok(Self {
            root,
            lock: Mutex::new(()),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn conversation_path(&self, conversation_id: &ConversationId) -> PathBuf {
        self.root.join("conversations").join(format!(
            "{}.json",
            hex_encode(conversation_id.as_str().as_bytes())
        ))
    }

    fn load_document(
        &self,
        conversation_id: &ConversationId,
    ) -> Result<Option<PersistedConversation>, StateError> {
        let path = self.conversation_path(conversation_id);
        if !path.exists() {
            return Ok(None);
        }
        let bytes = fs::read(&path).map_err(|error| {
            StateError::storage(format!("failed to read conversation state file: {error}"))
        })?;
        let document = serde_json::from_slice::<PersistedConversation>(&bytes).map_err(|error| {
            StateError::serialization(format!("failed to deserialize conversation state: {error}"))
        })?;
        if document.format_version != FORMAT_VERSION {
            return Err(StateError::storage(format!(
                "unsupported conversation state format version {}",
                document.format_version
            )));
        }
        Ok(Some(document))
    }

    fn save_document(
        &self,
        conversation_id: &ConversationId,
        document: &PersistedConversation,
    ) -> Result<(), StateError> {
        let path = self.conversation_path(conversation_id);
        let bytes = serde_json::to_vec_pretty(document).map_err(|error| {
            StateError::serialization(format!("failed to serialize conversation state: {error}"))
        })?;

        write_atomic(&path, &bytes)
    }
}

impl StateBackend for FilesystemStateBackend {
    fn load_properties<'a>(
        &'a self,
        conversation_id: &'a ConversationId,
    ) -> BoxFuture<'a, Result<PropertyMap, StateError>> {
        Box::pin(async move {
            let _guard = self
                .lock
                .lock()
                .map_err(|_| StateError::storage("filesystem backend lock poisoned"))?;
            Ok(self
                .load_document(conversation_id)?
                .map(|document| document.properties)
                .unwrap_or_default())
        })
    }

    fn save_properties<'a>(
        &'a self,
        conversation_id: &'a ConversationId,
        changes: PropertyChanges,
    ) -> BoxFuture<'a, Result<(), StateError>> {
        Box::pin(async move {
            let _guard = self
                .lock
                .lock()
                .map_err(|_| StateError::storage("filesystem backend lock poisoned"))?;
            let mut document =
                self.load_document(conversation_id)?
                    .unwrap_or_else(|| PersistedConversation {
                        format_version: FORMAT_VERSION,
                        conversation_id: conversation_id.to_string(),
                        properties: PropertyMap::new(),
                    });
            apply_changes(&mut document.properties, changes);
            self.save_document(conversation_id, &document)
        })
    }

    fn delete_conversation<'a>(
        &'a self,
        conversation_id: &'a ConversationId,
    ) -> BoxFuture<'a, Result<bool, StateError>> {
        Box::pin(async move {
            let _guard = self
                .lock
                .lock()
                .map_err(|_| StateError::storage("filesystem backend lock poisoned"))?;
            let path = self.conversation_path(conversation_id);
            if !path.exists() {
                return Ok(false);
            }
            fs::remove_file(&path).map_err(|error| {
                StateError::storage(format!("failed to delete conversation state file: {error}"))
            })?;
            Ok(true)
        })
    }
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), StateError> {
    let Some(parent) = path.parent() else {
        return Err(StateError::storage(
            "conversation state file missing parent directory",
        ));
    };
    fs::create_dir_all(parent).map_err(|error| {
        StateError::storage(format!("failed to create parent directory: {error}"))
    })?;

    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, bytes).map_err(|error| {
        StateError::storage(format!("failed to write temporary state file: {error}"))
    })?;

    if path.exists() {
        fs::remove_file(path).map_err(|error| {
            StateError::storage(format!("failed to replace existing state file: {error}"))
        })?;
    }
    fs::rename(&tmp, path)
        .map_err(|error| StateError::storage(format!("failed to finalize state file: {error}")))
}

fn hex_encode(input: &[u8]) -> String {
    input.iter().map(|byte| format!("{byte:02x}")).collect()
}
