//! Error taxonomy of the application layer.
//!
//! Resolution and parse failures never surface here: the collectors skip unresolved references
//! and the parser excludes units it cannot read.

use crate::app::blackboard::BlackboardState;
use crate::domain::graph::GraphError;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum RtsError {
    #[error("Failed to write snapshot file {path}: {source}")]
    Persistence {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    SnapshotCodec(#[from] GraphError),

    #[error("Invalid configuration in {path}: {message}")]
    Config { path: PathBuf, message: String },

    #[error("Pipeline failed in state {state} while running {stage}: {message}")]
    Pipeline {
        state: BlackboardState,
        stage: &'static str,
        message: String,
    },

    #[error("No knowledge source applies to state {0}")]
    NoKnowledgeSource(BlackboardState),
}
