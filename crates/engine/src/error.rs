use chimitheque_core::{ItemClass, PermLevel, PersonId};
use chimitheque_storage::StorageError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("person {person} lacks {} permission on {}", level.as_str(), item.as_str())]
    PermissionDenied {
        person: PersonId,
        level: PermLevel,
        item: ItemClass,
    },

    #[error("not found: {0}")]
    NotFound(String),

    #[error("entity not empty: {0}")]
    EntityNotEmpty(String),
}
