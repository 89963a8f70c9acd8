use thiserror::Error;

pub type Result<T> = std::result::Result<T, CoreError>;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("actuator link error: {0}")]
    Link(#[from] LinkError),
}

/// Failures while setting up the actuator transport. Send failures are not
/// errors; they are reported as [`crate::actuator::SendOutcome::Failed`].
#[derive(Error, Debug)]
pub enum LinkError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("could not resolve actuator endpoint {host}:{port}")]
    Unresolved { host: String, port: u16 },
}

pub(crate) fn invalid<S: Into<String>>(msg: S) -> CoreError {
    CoreError::InvalidConfig(msg.into())
}
