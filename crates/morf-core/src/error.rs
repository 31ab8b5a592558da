use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Unknown feature '{0}' (supported: point)")]
    UnknownFeature(String),

    #[error("Unknown property '{0}' (supported: stiff)")]
    UnknownProperty(String),

    #[error("Missing data file: {path}", path = path.display())]
    MissingFile { path: PathBuf },

    #[error("Failed to read array from '{path}': {source}", path = path.display())]
    Npy {
        path: PathBuf,
        #[source]
        source: ndarray_npy::ReadNpyError,
    },

    #[error("Linker '{0}' is not in the data set")]
    UnknownLinker(String),

    #[error("Shape mismatch for linker '{linker}': expected {expected:?}, found {found:?}")]
    ShapeMismatch {
        linker: String,
        expected: Vec<usize>,
        found: Vec<usize>,
    },

    #[error("Invalid input rank: expected {expected}, found {found}")]
    Rank { expected: usize, found: usize },

    #[error("The data set is empty; add linkers before fitting")]
    EmptyDataSet,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Tensor(#[from] candle_core::Error),

    #[error(transparent)]
    Shape(#[from] ndarray::ShapeError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
