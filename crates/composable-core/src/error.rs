use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("resource not found: {0}")]
    ResourceNotFound(String),

    #[error("invalid resource '{id}': {reason}")]
    InvalidResource { id: String, reason: String },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
