//! morf-search
//!
//! The simulation side of a linker search run: computing features and
//! properties with the helper scripts, and feeding linkers to the deformation
//! simulations a few at a time.
pub mod buffer;
pub mod computation;
pub mod config;
pub mod error;

pub use buffer::{CommandSubmitter, JobBuffer, Submitter};
pub use computation::Computation;
pub use config::SearchConfig;
pub use error::{Error, Result};
