use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum SegError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("{0} is not installed or in system PATH variable")]
    Dependency(String),
    #[error("type error: {0}")]
    Type(String),
    #[error(transparent)]
    Files(#[from] anat_seg_files::FilesError),

    #[error("failed to start `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },
    #[error("`{command}` exited with {status}")]
    SubprocessFailed { command: String, status: String },
    #[error("expected {expected} classifier outputs, found {found}")]
    UnexpectedOutputs { expected: usize, found: usize },

    #[error("failed to open log file {}: {source}", path.display())]
    LogOpen {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write log file: {0}")]
    LogWrite(std::io::Error),
    #[error("failed to create working directory {}: {source}", path.display())]
    WorkDirCreation {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to create scratch directory: {0}")]
    ScratchDirCreation(std::io::Error),
    #[error("failed to read directory: {0}")]
    DirRead(std::io::Error),

    #[error("neonatal atlas unavailable: {0}")]
    AtlasUnavailable(String),
    #[error("failed to extract atlas archive {}: {source}", path.display())]
    AtlasExtract {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type SegResult<T> = std::result::Result<T, SegError>;
