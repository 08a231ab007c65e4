use std::path::PathBuf;
use thiserror::Error;

/// Errors reported to the caller of an allocation.
///
/// Constraint infeasibility is never an error: placement degrades through its
/// passes instead.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AllocationError {
    #[error("Unknown strategy: {0}")]
    UnknownStrategy(String),

    #[error("No students found")]
    NoCandidates,

    #[error("No rooms found")]
    NoRooms,

    #[error("No students found for subject: {0}")]
    NoCandidatesForSubject(String),

    #[error("Room {0} has no seats")]
    InvalidRoomCapacity(String),

    #[error("{0}")]
    InvalidConfig(String),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

pub type Result<T> = std::result::Result<T, AllocationError>;
