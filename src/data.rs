use crate::error::AllocationError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

// Type aliases for clarity
pub type SeatNumber = u32;
pub type Subject = String;

/// Subject used for candidates that list none.
pub const UNKNOWN_SUBJECT: &str = "Unknown";

/// An exam candidate. Fields the engine does not know about are kept in
/// `extra` and written back out untouched.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Candidate {
    pub name: String,
    #[serde(default)]
    pub roll_number: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<Value>,
    #[serde(default)]
    pub subjects: Vec<Subject>,
    /// Legacy single-subject field.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<Subject>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Candidate {
    pub fn new(name: impl Into<String>, roll_number: impl Into<String>, subjects: &[&str]) -> Self {
        Self {
            name: name.into(),
            roll_number: roll_number.into(),
            year: None,
            subjects: subjects.iter().map(|s| s.to_string()).collect(),
            subject: None,
            extra: Map::new(),
        }
    }

    /// The subject used for grouping and placement.
    pub fn primary_subject(&self) -> &str {
        self.subjects
            .first()
            .or(self.subject.as_ref())
            .map(String::as_str)
            .unwrap_or(UNKNOWN_SUBJECT)
    }

    /// True when the candidate sits `subject`, in either the list or the legacy field.
    pub fn takes_subject(&self, subject: &str) -> bool {
        if self.subjects.is_empty() {
            self.subject.as_deref() == Some(subject)
        } else {
            self.subjects.iter().any(|s| s == subject)
        }
    }
}

/// Represents a physical exam room.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Room {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    pub capacity: u32,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Room {
    pub fn new(name: impl Into<String>, capacity: u32) -> Self {
        Self {
            id: None,
            name: name.into(),
            capacity,
            extra: Map::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Left,
    Right,
}

/// Where a seat sits in the room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct SeatGrid {
    pub row: u32,
    pub col: u32,
    pub position: Side,
    pub bench_num: u32,
}

/// Bench layout of a room, as read by the seating-chart renderers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct RoomLayout {
    pub total_rows: u32,
    pub total_columns: u32,
    pub benches_per_row: u32,
    pub total_benches: u32,
}

/// A single seated candidate.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SeatAssignment {
    pub seat_number: SeatNumber,
    pub student: Candidate,
    pub grid: SeatGrid,
}

impl fmt::Display for SeatAssignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "seat {} (row {}, col {}, {:?}) -> {} [{}]",
            self.seat_number,
            self.grid.row,
            self.grid.col,
            self.grid.position,
            self.student.name,
            self.student.primary_subject()
        )
    }
}

/// All seats filled in one room.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RoomAllocation {
    pub room: Room,
    pub students: Vec<SeatAssignment>,
    pub subject_breakdown: BTreeMap<Subject, usize>,
    pub distribution_score: f64,
    pub separation_quality: f64,
    pub room_layout: RoomLayout,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub utilization_rate: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub packing_efficiency: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Deserialize, Serialize)]
pub enum QualityRating {
    #[serde(rename = "Needs Improvement")]
    NeedsImprovement,
    Fair,
    Good,
    #[serde(rename = "Very Good")]
    VeryGood,
    Excellent,
}

impl fmt::Display for QualityRating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            QualityRating::Excellent => "Excellent",
            QualityRating::VeryGood => "Very Good",
            QualityRating::Good => "Good",
            QualityRating::Fair => "Fair",
            QualityRating::NeedsImprovement => "Needs Improvement",
        };
        f.write_str(label)
    }
}

/// Head counts of an allocation.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct AllocationCounts {
    pub total_students: usize,
    pub total_allocated: usize,
    pub total_unallocated: usize,
    pub rooms_used: usize,
    pub subject_distribution: BTreeMap<Subject, usize>,
    pub allocation_percentage: f64,
}

/// Head counts plus quality metrics, serialized as one flat object.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct AllocationSummary {
    #[serde(flatten)]
    pub counts: AllocationCounts,
    pub average_distribution_score: f64,
    pub average_separation_score: f64,
    pub quality_rating: QualityRating,
    pub algorithm_version: String,
    pub strategy: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rooms_saved: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub utilization_efficiency: Option<f64>,
}

/// The final output of the allocator.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct AllocationResult {
    pub allocations: Vec<RoomAllocation>,
    pub summary: AllocationSummary,
    pub strategy: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    Mixed,
    Separated,
    OptimalPacking,
}

impl Strategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::Mixed => "mixed",
            Strategy::Separated => "separated",
            Strategy::OptimalPacking => "optimal_packing",
        }
    }

    /// Tag recorded on the result.
    pub fn result_tag(&self) -> &'static str {
        match self {
            Strategy::Mixed => "mixed_advanced",
            Strategy::Separated => "separated_advanced",
            Strategy::OptimalPacking => "optimal_packing",
        }
    }
}

impl FromStr for Strategy {
    type Err = AllocationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mixed" => Ok(Strategy::Mixed),
            "separated" => Ok(Strategy::Separated),
            "optimal_packing" => Ok(Strategy::OptimalPacking),
            other => Err(AllocationError::UnknownStrategy(other.to_string())),
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn default_strategy() -> String {
    Strategy::Mixed.as_str().to_string()
}

/// The complete input for one allocation request.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AllocationRequest {
    pub students: Vec<Candidate>,
    pub rooms: Vec<Room>,
    #[serde(default = "default_strategy")]
    pub strategy: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject_filter: Option<Subject>,
    /// Overrides the configured seed for this request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}
