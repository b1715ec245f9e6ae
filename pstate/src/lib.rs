//! Per-conversation property persistence: backends plus a typed turn-scoped view.

mod backend;
mod backends;
mod error;
mod store;

pub mod prelude {
    pub use crate::{
        ConversationStateStore, FilesystemStateBackend, InMemoryStateBackend, PropertyChange,
        PropertyChanges, PropertyMap, SqliteStateBackend, StateBackend, StateBackendConfig,
        StateError, StateErrorKind, TurnState, create_default_state_backend, create_state_backend,
    };
}

pub use backend::{
    FilesystemStateBackend, InMemoryStateBackend, PropertyChange, PropertyChanges, PropertyMap,
    SqliteStateBackend, StateBackend, StateBackendConfig, create_default_state_backend,
    create_state_backend,
};
pub use error::{StateError, StateErrorKind};
pub use store::{ConversationStateStore, TurnState};
