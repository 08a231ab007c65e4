//! Separation rules deciding whether a subject may take a seat.

use crate::data::{SeatNumber, Subject};
use crate::geometry::seat_to_grid;
use std::collections::BTreeMap;
use std::fmt;

/// Seats taken so far in one room, with the subject of each occupant.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OccupiedSeats {
    seats: BTreeMap<SeatNumber, Subject>,
}

impl OccupiedSeats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn occupy(&mut self, seat: SeatNumber, subject: impl Into<Subject>) {
        let previous = self.seats.insert(seat, subject.into());
        debug_assert!(previous.is_none(), "seat {seat} assigned twice");
    }

    pub fn is_occupied(&self, seat: SeatNumber) -> bool {
        self.seats.contains_key(&seat)
    }

    pub fn subject_at(&self, seat: SeatNumber) -> Option<&str> {
        self.seats.get(&seat).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.seats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seats.is_empty()
    }

    /// Occupied seats in seat-number order.
    pub fn iter(&self) -> impl Iterator<Item = (SeatNumber, &str)> + Clone + '_ {
        self.seats.iter().map(|(seat, subject)| (*seat, subject.as_str()))
    }

    pub fn seats_of<'s>(&'s self, subject: &'s str) -> impl Iterator<Item = SeatNumber> + 's {
        self.iter()
            .filter(move |(_, s)| *s == subject)
            .map(|(seat, _)| seat)
    }

    /// Linear distance from `seat` to the nearest seat holding `subject`.
    pub fn nearest_same_subject(&self, seat: SeatNumber, subject: &str) -> Option<u32> {
        self.seats_of(subject).map(|other| other.abs_diff(seat)).min()
    }

    /// Like [`Self::nearest_same_subject`], but `capacity` when the subject is absent.
    pub fn min_distance_to_subject(&self, seat: SeatNumber, subject: &str, capacity: u32) -> u32 {
        self.nearest_same_subject(seat, subject)
            .map_or(capacity, |distance| distance.min(capacity))
    }
}

/// Decides whether `subject` may sit at `seat` given who is already seated.
/// Vacancy is checked by the caller.
pub trait SeparationPolicy: fmt::Debug + Send + Sync {
    fn name(&self) -> &'static str;

    fn is_placeable(&self, seat: SeatNumber, subject: &str, occupied: &OccupiedSeats) -> bool;
}

/// Same-subject candidates must be at least `min_distance` seat numbers apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinearDistancePolicy {
    pub min_distance: u32,
}

impl LinearDistancePolicy {
    pub fn new(min_distance: u32) -> Self {
        Self { min_distance }
    }
}

impl SeparationPolicy for LinearDistancePolicy {
    fn name(&self) -> &'static str {
        "linear_distance"
    }

    fn is_placeable(&self, seat: SeatNumber, subject: &str, occupied: &OccupiedSeats) -> bool {
        occupied
            .nearest_same_subject(seat, subject)
            .is_none_or(|distance| distance >= self.min_distance)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Conflict {
    /// Beside: the other half of the same bench.
    SameBench,
    /// Across: the same bench column in another row.
    SameColumn,
}

/// Same-subject candidates may share neither a bench nor a bench column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StrictBenchPolicy {
    pub benches_per_row: u32,
}

impl StrictBenchPolicy {
    pub fn new(benches_per_row: u32) -> Self {
        Self { benches_per_row }
    }

    /// First same-subject occupant blocking `seat`, and why.
    pub fn conflict(&self, seat: SeatNumber, subject: &str, occupied: &OccupiedSeats) -> Option<(SeatNumber, Conflict)> {
        let grid = seat_to_grid(seat, self.benches_per_row);
        occupied.seats_of(subject).find_map(|other| {
            let other_grid = seat_to_grid(other, self.benches_per_row);
            if other_grid.bench_num == grid.bench_num {
                Some((other, Conflict::SameBench))
            } else if other_grid.col == grid.col {
                Some((other, Conflict::SameColumn))
            } else {
                None
            }
        })
    }
}

impl SeparationPolicy for StrictBenchPolicy {
    fn name(&self) -> &'static str {
        "strict_bench"
    }

    fn is_placeable(&self, seat: SeatNumber, subject: &str, occupied: &OccupiedSeats) -> bool {
        self.conflict(seat, subject, occupied).is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strict_rules_sixty_seats() {
        let policy = StrictBenchPolicy::new(4);
        let mut occupied = OccupiedSeats::new();
        occupied.occupy(1, "Mathematics");

        let cases = [
            (2, "Mathematics", false),
            (2, "Physics", true),
            (9, "Mathematics", false),
            (9, "Physics", true),
            (3, "Mathematics", true),
            (17, "Mathematics", false),
            (5, "Mathematics", true),
        ];
        for (seat, subject, expected) in cases {
            assert_eq!(
                policy.is_placeable(seat, subject, &occupied),
                expected,
                "seat {seat} for {subject}"
            );
        }
    }

    #[test]
    fn test_strict_conflict_reasons() {
        let policy = StrictBenchPolicy::new(4);
        let mut occupied = OccupiedSeats::new();
        for seat in [1, 10, 19] {
            occupied.occupy(seat, "Computer Science");
        }

        let subject = "Computer Science";
        assert_eq!(policy.conflict(2, subject, &occupied), Some((1, Conflict::SameBench)));
        assert_eq!(policy.conflict(9, subject, &occupied), Some((1, Conflict::SameColumn)));
        assert_eq!(policy.conflict(20, subject, &occupied), Some((19, Conflict::SameBench)));
        assert_eq!(policy.conflict(27, subject, &occupied), Some((19, Conflict::SameColumn)));
        assert_eq!(policy.conflict(3, subject, &occupied), Some((19, Conflict::SameColumn)));
        assert_eq!(policy.conflict(11, subject, &occupied), Some((19, Conflict::SameColumn)));
        assert_eq!(policy.conflict(5, subject, &occupied), None);
        assert_eq!(policy.conflict(7, subject, &occupied), None);
    }

    #[test]
    fn test_strict_single_row_room() {
        // capacity 8: four benches, one row
        let policy = StrictBenchPolicy::new(4);
        let mut occupied = OccupiedSeats::new();
        occupied.occupy(1, "Math");

        assert!(!policy.is_placeable(2, "Math", &occupied));
        for seat in 3..=8 {
            assert!(policy.is_placeable(seat, "Math", &occupied), "seat {seat}");
        }
    }

    #[test]
    fn test_linear_distance() {
        let policy = LinearDistancePolicy::new(2);
        let mut occupied = OccupiedSeats::new();
        occupied.occupy(5, "Art");
        assert!(!policy.is_placeable(4, "Art", &occupied));
        assert!(!policy.is_placeable(6, "Art", &occupied));
        assert!(policy.is_placeable(7, "Art", &occupied));
        assert!(policy.is_placeable(6, "Music", &occupied));
    }

    #[test]
    fn test_min_distance_defaults_to_capacity() {
        let mut occupied = OccupiedSeats::new();
        assert_eq!(occupied.min_distance_to_subject(3, "Art", 30), 30);
        occupied.occupy(10, "Art");
        occupied.occupy(4, "Art");
        assert_eq!(occupied.min_distance_to_subject(6, "Art", 30), 2);
        assert_eq!(occupied.nearest_same_subject(6, "Music"), None);
    }
}
