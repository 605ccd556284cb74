use thiserror::Error;

use crate::experiment::ExperimentType;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SpecError {
    #[error("Invalid range: {0}")]
    InvalidRangeSyntax(String),
    #[error("Unknown site '{0}'")]
    UnknownSite(String),
    #[error("Unknown architecture '{0}'")]
    UnknownArchitecture(String),
    #[error("Malformed resource specification: {0}")]
    MalformedSpec(String),
    #[error("Property '{0}' is given more than once")]
    DuplicateProperty(String),
    #[error("Positional value '{0}' cannot follow a key=value pair")]
    PositionalAfterKeyword(String),
    #[error("Cannot add {added} resources to an experiment of type {current}")]
    MixedExperimentType {
        current: ExperimentType,
        added: ExperimentType,
    },
    #[error("Nodes are assigned by resource specifications with different resources: {}", .0.join(", "))]
    DuplicateNodeAssignment(Vec<String>),
    #[error("Round trip mismatch: {0}")]
    RoundTripMismatch(String),
    #[error("Experiment has no resources")]
    EmptyExperiment,
    #[error("Invalid experiment document: {0}")]
    InvalidDocument(String),
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<serde_json::error::Error> for SpecError {
    fn from(e: serde_json::error::Error) -> Self {
        Self::SerializationError(e.to_string())
    }
}

pub fn malformed<T>(message: impl Into<String>) -> crate::Result<T> {
    Err(SpecError::MalformedSpec(message.into()))
}
