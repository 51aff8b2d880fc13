use chimitheque_core::ReferenceKind;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("resolving {kind} reference: {source}")]
    ReferenceResolution {
        kind: ReferenceKind,
        #[source]
        source: rusqlite::Error,
    },

    #[error("writing {step}: {source}")]
    Write {
        step: &'static str,
        #[source]
        source: rusqlite::Error,
    },

    #[error("core error: {0}")]
    Core(#[from] chimitheque_core::CoreError),
}

impl StorageError {
    /// Wrap a failed statement with the name of the table it was writing.
    pub(crate) fn write(step: &'static str) -> impl FnOnce(rusqlite::Error) -> Self {
        move |source| Self::Write { step, source }
    }

    pub fn is_constraint_violation(&self) -> bool {
        let source = match self {
            Self::Sqlite(e) => e,
            Self::ReferenceResolution { source, .. } | Self::Write { source, .. } => source,
            Self::ConstraintViolation(_) => return true,
            _ => return false,
        };
        matches!(
            source,
            rusqlite::Error::SqliteFailure(err, _) if err.code == rusqlite::ErrorCode::ConstraintViolation
        )
    }
}
