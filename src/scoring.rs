//! Quality metrics and result summaries.

use crate::data::{
    AllocationCounts, AllocationSummary, QualityRating, Room, RoomAllocation, SeatNumber, Strategy, Subject,
};
use crate::geometry::Geometry;
use crate::policy::OccupiedSeats;
use itertools::Itertools;
use std::collections::BTreeMap;

pub const ALGORITHM_VERSION: &str = "advanced_v3.0";

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Mean over subjects of the mean linear distance between same-subject
/// pairs. 0 for an empty room, `capacity` when no subject repeats.
pub fn distribution_score(occupied: &OccupiedSeats, capacity: u32) -> f64 {
    if occupied.is_empty() {
        return 0.0;
    }

    let mut by_subject: BTreeMap<&str, Vec<SeatNumber>> = BTreeMap::new();
    for (seat, subject) in occupied.iter() {
        by_subject.entry(subject).or_default().push(seat);
    }
    let subject_means: Vec<f64> = by_subject
        .values()
        .filter(|seats| seats.len() > 1)
        .map(|seats| {
            let distances: Vec<u32> = seats
                .iter()
                .tuple_combinations()
                .map(|(a, b)| a.abs_diff(*b))
                .collect();
            distances.iter().sum::<u32>() as f64 / distances.len() as f64
        })
        .collect();

    if subject_means.is_empty() {
        return capacity as f64;
    }
    round2(subject_means.iter().sum::<f64>() / subject_means.len() as f64)
}

/// Mean spatial score over all occupant pairs: different subjects earn up to
/// 3, same subjects earn `0.8 * d` when at least 2 apart and lose 2 otherwise.
pub fn separation_quality(occupied: &OccupiedSeats, geometry: &Geometry, capacity: u32) -> f64 {
    if occupied.is_empty() {
        return 0.0;
    }

    let mut total_score = 0.0;
    let mut total_pairs = 0usize;
    for ((seat_a, subject_a), (seat_b, subject_b)) in occupied.iter().tuple_combinations() {
        total_pairs += 1;
        let (row_a, col_a) = geometry.spatial_coords(seat_a, capacity);
        let (row_b, col_b) = geometry.spatial_coords(seat_b, capacity);
        let spatial_distance = ((row_b - row_a).powi(2) + (col_b - col_a).powi(2)).sqrt();

        if subject_a == subject_b {
            if spatial_distance >= 2.0 {
                total_score += spatial_distance * 0.8;
            } else {
                total_score -= 2.0;
            }
        } else {
            total_score += spatial_distance.min(3.0);
        }
    }

    round2(total_score / total_pairs.max(1) as f64)
}

/// Seats filled as a percentage of capacity.
pub fn utilization_rate(allocated: usize, capacity: u32) -> f64 {
    if capacity == 0 {
        return 0.0;
    }
    allocated as f64 / capacity as f64 * 100.0
}

pub fn packing_efficiency(allocated: usize, capacity: u32) -> f64 {
    round2(utilization_rate(allocated, capacity))
}

/// Mean of the fill rate over all rooms and over the rooms actually used.
pub fn utilization_efficiency(allocations: &[RoomAllocation], rooms: &[Room]) -> f64 {
    if allocations.is_empty() {
        return 0.0;
    }

    let total_capacity: u64 = rooms.iter().map(|room| room.capacity as u64).sum();
    let used_capacity: u64 = allocations.iter().map(|a| a.room.capacity as u64).sum();
    let total_allocated = allocations.iter().map(|a| a.students.len()).sum::<usize>() as f64;

    let rate = |capacity: u64| {
        if capacity > 0 {
            total_allocated / capacity as f64 * 100.0
        } else {
            0.0
        }
    };
    round2((rate(total_capacity) + rate(used_capacity)) / 2.0)
}

pub fn quality_rating(allocation_percentage: f64, combined_score: f64) -> QualityRating {
    const LADDER: [(f64, f64, QualityRating); 4] = [
        (95.0, 3.0, QualityRating::Excellent),
        (90.0, 2.0, QualityRating::VeryGood),
        (85.0, 1.5, QualityRating::Good),
        (70.0, 1.0, QualityRating::Fair),
    ];
    LADDER
        .iter()
        .find(|(min_pct, min_score, _)| allocation_percentage >= *min_pct && combined_score >= *min_score)
        .map_or(QualityRating::NeedsImprovement, |(_, _, rating)| *rating)
}

pub fn generate_summary(allocations: &[RoomAllocation], total_students: usize) -> AllocationCounts {
    let total_allocated: usize = allocations.iter().map(|a| a.students.len()).sum();

    let mut subject_distribution: BTreeMap<Subject, usize> = BTreeMap::new();
    for (subject, count) in allocations.iter().flat_map(|a| a.subject_breakdown.iter()) {
        *subject_distribution.entry(subject.clone()).or_default() += count;
    }

    let allocation_percentage = if total_students > 0 {
        round2(total_allocated as f64 / total_students as f64 * 100.0)
    } else {
        0.0
    };

    AllocationCounts {
        total_students,
        total_allocated,
        total_unallocated: total_students.saturating_sub(total_allocated),
        rooms_used: allocations.len(),
        subject_distribution,
        allocation_percentage,
    }
}

pub fn generate_enhanced_summary(allocations: &[RoomAllocation], total_students: usize, strategy: Strategy) -> AllocationSummary {
    let counts = generate_summary(allocations, total_students);

    let mean = |score: fn(&RoomAllocation) -> f64| {
        if allocations.is_empty() {
            0.0
        } else {
            allocations.iter().map(score).sum::<f64>() / allocations.len() as f64
        }
    };
    let average_distribution_score = mean(|a| a.distribution_score);
    let average_separation_score = mean(|a| a.separation_quality);
    let combined_score = (average_distribution_score + average_separation_score) / 2.0;

    AllocationSummary {
        quality_rating: quality_rating(counts.allocation_percentage, combined_score),
        counts,
        average_distribution_score: round2(average_distribution_score),
        average_separation_score: round2(average_separation_score),
        algorithm_version: ALGORITHM_VERSION.to_string(),
        strategy: strategy.as_str().to_string(),
        rooms_saved: None,
        utilization_efficiency: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{RoomLayout, SeatAssignment};
    use crate::geometry::seat_to_grid;

    fn occupied(seats: &[(u32, &str)]) -> OccupiedSeats {
        let mut occupied = OccupiedSeats::new();
        for (seat, subject) in seats {
            occupied.occupy(*seat, *subject);
        }
        occupied
    }

    fn room_allocation(capacity: u32, filled: usize, distribution: f64, separation: f64) -> RoomAllocation {
        let students = (1..=filled as u32)
            .map(|seat| SeatAssignment {
                seat_number: seat,
                student: crate::data::Candidate::new(format!("c{seat}"), format!("r{seat}"), &["Math"]),
                grid: seat_to_grid(seat, 4),
            })
            .collect();
        RoomAllocation {
            room: Room::new(format!("R{capacity}"), capacity),
            students,
            subject_breakdown: BTreeMap::from([("Math".to_string(), filled)]),
            distribution_score: distribution,
            separation_quality: separation,
            room_layout: RoomLayout {
                total_rows: 1,
                total_columns: 4,
                benches_per_row: 4,
                total_benches: 4,
            },
            utilization_rate: None,
            packing_efficiency: None,
        }
    }

    #[test]
    fn test_distribution_score_edge_cases() {
        assert_eq!(distribution_score(&OccupiedSeats::new(), 20), 0.0);
        assert_eq!(distribution_score(&occupied(&[(1, "A"), (2, "B")]), 20), 20.0);
    }

    #[test]
    fn test_distribution_score_averages_subjects() {
        // A pairs: 4, 8, 4 -> 5.33; B pair: 1 -> mean 3.17
        let seats = occupied(&[(1, "A"), (5, "A"), (9, "A"), (2, "B"), (3, "B")]);
        assert_eq!(distribution_score(&seats, 10), 3.17);
    }

    #[test]
    fn test_separation_quality_rewards_mixing() {
        let geometry = Geometry::StrictBench { benches_per_row: 4 };
        let mixed = occupied(&[(1, "A"), (2, "B")]);
        let clustered = occupied(&[(1, "A"), (2, "A")]);
        assert_eq!(separation_quality(&mixed, &geometry, 8), 1.0);
        assert_eq!(separation_quality(&clustered, &geometry, 8), -2.0);
        assert_eq!(separation_quality(&OccupiedSeats::new(), &geometry, 8), 0.0);
    }

    #[test]
    fn test_separation_quality_distance_geometry() {
        // 9 seats: 3x3 grid, seats 1 and 9 sit at opposite corners
        let far = occupied(&[(1, "A"), (9, "A")]);
        let expected = round2(8f64.sqrt() * 0.8);
        assert_eq!(separation_quality(&far, &Geometry::Distance, 9), expected);
    }

    #[test]
    fn test_quality_rating_boundaries() {
        assert_eq!(quality_rating(96.0, 3.1), QualityRating::Excellent);
        assert_eq!(quality_rating(96.0, 2.5), QualityRating::VeryGood);
        assert_eq!(quality_rating(95.0, 3.0), QualityRating::Excellent);
        assert_eq!(quality_rating(89.9, 5.0), QualityRating::Good);
        assert_eq!(quality_rating(75.0, 1.2), QualityRating::Fair);
        assert_eq!(quality_rating(100.0, 0.5), QualityRating::NeedsImprovement);
        assert_eq!(quality_rating(50.0, 10.0), QualityRating::NeedsImprovement);
    }

    #[test]
    fn test_summary_counts() {
        let allocations = vec![room_allocation(4, 4, 2.0, 1.0), room_allocation(4, 2, 4.0, 3.0)];
        let counts = generate_summary(&allocations, 8);
        assert_eq!(counts.total_allocated, 6);
        assert_eq!(counts.total_unallocated, 2);
        assert_eq!(counts.rooms_used, 2);
        assert_eq!(counts.subject_distribution["Math"], 6);
        assert_eq!(counts.allocation_percentage, 75.0);

        assert_eq!(generate_summary(&[], 0).allocation_percentage, 0.0);
    }

    #[test]
    fn test_enhanced_summary_averages() {
        let allocations = vec![room_allocation(4, 4, 2.0, 1.0), room_allocation(4, 4, 4.0, 3.0)];
        let summary = generate_enhanced_summary(&allocations, 8, Strategy::Mixed);
        assert_eq!(summary.average_distribution_score, 3.0);
        assert_eq!(summary.average_separation_score, 2.0);
        // 100% placed, combined 2.5
        assert_eq!(summary.quality_rating, QualityRating::VeryGood);
        assert_eq!(summary.algorithm_version, ALGORITHM_VERSION);
        assert_eq!(summary.strategy, "mixed");

        let empty = generate_enhanced_summary(&[], 0, Strategy::Separated);
        assert_eq!(empty.average_distribution_score, 0.0);
        assert_eq!(empty.quality_rating, QualityRating::NeedsImprovement);
    }

    #[test]
    fn test_utilization_metrics() {
        let rooms = vec![Room::new("R10", 10), Room::new("R6", 6), Room::new("R4", 4)];
        let allocations = vec![room_allocation(10, 10, 0.0, 0.0), room_allocation(6, 5, 0.0, 0.0)];
        // 15 of 20 overall, 15 of 16 used
        assert_eq!(utilization_efficiency(&allocations, &rooms), 84.38);
        assert_eq!(packing_efficiency(5, 6), 83.33);
        assert_eq!(utilization_efficiency(&[], &rooms), 0.0);
    }
}
