use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("A scan is already in progress")]
    AlreadyScanning,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Snapshot failed ({status}): {output}")]
    Snapshot { status: String, output: String },

    #[error("Could not determine home directory")]
    HomeDirUnavailable,

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
