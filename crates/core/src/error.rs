use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("unknown item class: {0}")]
    UnknownItemClass(String),

    #[error("unknown permission level: {0}")]
    UnknownPermLevel(String),
}
