//! Exam seat allocation: seats candidates across rooms so that students of
//! the same subject do not sit next to each other.

pub mod config;
pub mod data;
pub mod error;
pub mod geometry;
pub mod grouping;
pub mod placement;
pub mod policy;
pub mod quota;
pub mod scoring;
pub mod server;
pub mod solver;

pub use config::{AppConfig, SeatingConfig};
pub use data::{AllocationRequest, AllocationResult, Candidate, Room, Strategy};
pub use error::{AllocationError, ConfigError};
pub use solver::{allocate_seats, solve};
