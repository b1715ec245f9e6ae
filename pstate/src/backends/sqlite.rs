use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use pcommon::{BoxFuture, ConversationId};
use rusqlite::{Connection, params};

use crate::backend::{PropertyChange, PropertyChanges, PropertyMap, StateBackend};
use crate::error::StateError;

/// Stores each conversation property as one JSON row keyed by `(conversation_id, key)`.
#[derive(Debug)]
pub struct SqliteStateBackend {
    connection: Mutex<Connection>,
}

impl SqliteStateBackend {
    pub fn new(path: impl AsRef<Path>) -> Result<Self, StateError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|error| {
                StateError::storage(format!("failed to create sqlite parent directory: {error}"))
            })?;
        }

        let connection = Connection::open(path).map_err(|error| {
            StateError::storage(format!("failed to open sqlite database: {error}"))
        })?;
        Self::from_connection(connection)
    }

    pub fn new_in_memory() -> Result<Self, StateError> {
        let connection = Connection::open_in_memory().map_err(|error| {
            StateError::storage(format!("failed to open in-memory sqlite database: {error}"))
        })?;
        Self::from_connection(connection)
    }

    fn from_connection(connection: Connection) -> Result<Self, StateError> {
        connection
            .busy_timeout(Duration::from_secs(5))
            .map_err(|error| {
                StateError::storage(format!("failed to configure sqlite busy timeout: {error}"))
            })?;
        let backend = Self {
            connection: Mutex::new(connection),
        };
        backend.initialize_schema()?;
        Ok(backend)
    }

    fn connection(&self) -> Result<MutexGuard<'_, Connection>, StateError> {
        self.connection
            .lock()
            .map_err(|_| StateError::storage("sqlite backend lock poisoned"))
    }

    fn initialize_schema(&self) -> Result<(), StateError> {
        let conn = self.connection()?;
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;

            CREATE TABLE IF NOT EXISTS conversation_properties (
                conversation_id TEXT NOT NULL,
                key TEXT NOT NULL,
                value_json TEXT NOT NULL,
                updated_at_secs INTEGER NOT NULL,
                PRIMARY KEY (conversation_id, key)
            );
            ",
        )
        .map_err(|error| {
            StateError::storage(format!("failed to initialize sqlite schema: {error}"))
        })?;

        Ok(())
    }
}

impl StateBackend for SqliteStateBackend {
    fn load_properties<'a>(
        &'a self,
        conversation_id: &'a ConversationId,
    ) -> BoxFuture<'a, Result<PropertyMap, StateError>> {
        Box::pin(async move {
            let conn = self.connection()?;
            let mut statement = conn
                .prepare(
                    "
                    SELECT key, value_json
                    FROM conversation_properties
                    WHERE conversation_id = ?1
                    ",
                )
                .map_err(|error| {
                    StateError::storage(format!("failed to prepare property query: {error}"))
                })?;

            let rows = statement
                .query_map(params![conversation_id.as_str()], |row| {
                    Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
                })
                .map_err(|error| {
                    StateError::storage(format!("failed to query properties: {error}"))
                })?;

            let mut properties = PropertyMap::new();
            for row in rows {
                let (key, value_json) = row.map_err(|error| {
                    StateError::storage(format!("failed to read property row: {error}"))
                })?;
                let value = serde_json::from_str(&value_json).map_err(|error| {
                    StateError::serialization(format!(
                        "failed to deserialize property '{key}': {error}"
                    ))
                })?;
                properties.insert(key, value);
            }

            Ok(properties)
        })
    }

    fn save_properties<'a>(
        &'a self,
        conversation_id: &'a ConversationId,
        changes: PropertyChanges,
    ) -> BoxFuture<'a, Result<(), StateError>> {
        Box::pin(async move {
            let updated_at = unix_seconds()?;
            let mut conn = self.connection()?;
            let tx = conn.transaction().map_err(|error| {
                StateError::storage(format!("failed to begin sqlite transaction: {error}"))
            })?;

            for (key, change) in changes {
                match change {
                    PropertyChange::Set(value) => {
                        let value_json = serde_json::to_string(&value).map_err(|error| {
                            StateError::serialization(format!(
                                "failed to serialize property '{key}': {error}"
                            ))
                        })?;
                        tx.execute(
                            "
                            INSERT INTO conversation_properties (
                                conversation_id,
                                key,
                                value_json,
                                updated_at_secs
                            )
                            VALUES (?1, ?2, ?3, ?4)
                            ON CONFLICT(conversation_id, key) DO UPDATE SET
                                value_json = excluded.value_json,
                                updated_at_secs = excluded.updated_at_secs
                            ",
                            params![conversation_id.as_str(), &key, value_json, updated_at],
                        )
                        .map_err(|error| {
                            StateError::storage(format!("failed to upsert property: {error}"))
                        })?;
                    }
                    PropertyChange::Remove => {
                        tx.execute(
                            "
                            DELETE FROM conversation_properties
                            WHERE conversation_id = ?1 AND key = ?2
                            ",
                            params![conversation_id.as_str(), &key],
                        )
                        .map_err(|error| {
                            StateError::storage(format!("failed to delete property: {error}"))
                        })?;
                    }
                }
            }

            tx.commit().map_err(|error| {
                StateError::storage(format!("failed to commit sqlite transaction: {error}"))
            })
        })
    }

    fn delete_conversation<'a>(
        &'a self,
        conversation_id: &'a ConversationId,
    ) -> BoxFuture<'a, Result<bool, StateError>> {
        Box::pin(async move {
            let conn = self.connection()?;
            let deleted = conn
                .execute(
                    "DELETE FROM conversation_properties WHERE conversation_id = ?1",
                    params![conversation_id.as_str()],
                )
                .map_err(|error| {
                    StateError::storage(format!("failed to delete conversation: {error}"))
                })?;
            Ok(deleted > 0)
        })
    }
}

fn unix_seconds() -> Result<i64, StateError> {
    let duration = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|error| StateError::storage(format!("system clock before unix epoch: {error}")))?;
    Ok(duration.as_secs() as i64)
}

pub(crate) fn default_sqlite_path() -> PathBuf {
    if let Some(explicit) = std::env::var_os("PARLEY_SQLITE_PATH") {
        return PathBuf::from(explicit);
    }

    if let Some(home) = std::env::var_os("HOME").or_else(|| std::env::var_os("USERPROFILE")) {
        return PathBuf::from(home).join(".parley").join("state.sqlite3");
    }

    PathBuf::from("parley-state.sqlite3")
}
