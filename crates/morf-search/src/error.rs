use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Core(#[from] morf_core::Error),

    #[error("Missing input file: {path}", path = path.display())]
    MissingFile { path: PathBuf },

    #[error("Failed to start '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Script '{script}' failed ({status}): {stderr}")]
    Script {
        script: String,
        status: String,
        stderr: String,
    },

    #[error("Submitting linker '{linker}' failed ({status}): {stderr}")]
    Submit {
        linker: String,
        status: String,
        stderr: String,
    },

    #[error("No queued jobs to submit")]
    EmptyBuffer,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
