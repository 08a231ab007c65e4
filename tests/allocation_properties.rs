use proptest::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use seat_allocator::geometry::seat_to_grid;
use seat_allocator::{AllocationResult, Candidate, Room, SeatingConfig, allocate_seats};
use std::collections::{BTreeMap, HashSet};

const STRATEGIES: [&str; 3] = ["mixed", "separated", "optimal_packing"];

fn roster(sizes: &[usize]) -> Vec<Candidate> {
    sizes
        .iter()
        .enumerate()
        .flat_map(|(s, count)| {
            (0..*count).map(move |i| {
                let subject = format!("Subject{s}");
                Candidate::new(format!("{subject} #{i}"), format!("S{s}-{i}"), &[subject.as_str()])
            })
        })
        .collect()
}

fn rooms(capacities: &[u32]) -> Vec<Room> {
    capacities
        .iter()
        .enumerate()
        .map(|(i, capacity)| Room::new(format!("Room {i}"), *capacity))
        .collect()
}

fn check_invariants(result: &AllocationResult, total: usize) -> Result<(), TestCaseError> {
    let mut rolls = HashSet::new();
    for allocation in &result.allocations {
        prop_assert!(!allocation.students.is_empty());
        prop_assert!(allocation.students.len() <= allocation.room.capacity as usize);

        let mut seats = HashSet::new();
        for assignment in &allocation.students {
            prop_assert!((1..=allocation.room.capacity).contains(&assignment.seat_number));
            prop_assert!(seats.insert(assignment.seat_number));
            prop_assert!(rolls.insert(assignment.student.roll_number.clone()));
            prop_assert_eq!(assignment.grid, seat_to_grid(assignment.seat_number, 4));
        }
        prop_assert_eq!(allocation.subject_breakdown.values().sum::<usize>(), allocation.students.len());
    }

    let counts = &result.summary.counts;
    prop_assert_eq!(counts.total_students, total);
    prop_assert_eq!(counts.total_allocated, rolls.len());
    prop_assert_eq!(counts.total_allocated + counts.total_unallocated, total);
    prop_assert_eq!(counts.rooms_used, result.allocations.len());
    Ok(())
}

proptest! {
    #[test]
    fn every_strategy_keeps_seating_invariants(
        sizes in prop::collection::vec(0usize..15, 1..6),
        capacities in prop::collection::vec(1u32..30, 1..5),
        seed in any::<u64>(),
    ) {
        let candidates = roster(&sizes);
        let rooms = rooms(&capacities);
        let config = SeatingConfig::default();
        let total_capacity: usize = capacities.iter().map(|c| *c as usize).sum();

        for strategy in STRATEGIES {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let result = allocate_seats(&candidates, &rooms, strategy, &config, &mut rng).unwrap();
            check_invariants(&result, candidates.len())?;
            if total_capacity >= candidates.len() {
                prop_assert_eq!(result.summary.counts.total_unallocated, 0);
            }
        }
    }

    #[test]
    fn separated_rooms_keep_subjects_out_of_shared_columns(
        sizes in prop::collection::vec(1usize..=4, 1..6),
        seed in any::<u64>(),
    ) {
        // four bench columns: at most four of a subject can sit apart
        let candidates = roster(&sizes);
        let rooms = rooms(&[120]);
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let result = allocate_seats(&candidates, &rooms, "separated", &SeatingConfig::default(), &mut rng).unwrap();

        for allocation in &result.allocations {
            let mut columns: BTreeMap<&str, HashSet<u32>> = BTreeMap::new();
            for assignment in &allocation.students {
                let subject = assignment.student.primary_subject();
                prop_assert!(
                    columns.entry(subject).or_default().insert(assignment.grid.col),
                    "{} shares column {}",
                    subject,
                    assignment.grid.col
                );
            }
        }
    }
}

#[test]
fn overflow_leaves_the_rest_unallocated() {
    let candidates = roster(&[30, 20]);
    let rooms = rooms(&[10, 15]);
    for strategy in STRATEGIES {
        let mut rng = ChaCha8Rng::seed_from_u64(99);
        let result = allocate_seats(&candidates, &rooms, strategy, &SeatingConfig::default(), &mut rng).unwrap();
        assert_eq!(result.summary.counts.total_allocated, 25, "{strategy}");
        assert_eq!(result.summary.counts.total_unallocated, 25, "{strategy}");
    }
}

#[test]
fn linear_distance_mode_reports_row_major_layout() {
    let config = SeatingConfig {
        strict_mode: false,
        ..SeatingConfig::default()
    };
    let candidates = roster(&[5, 4]);
    let rooms = rooms(&[9]);
    let mut rng = ChaCha8Rng::seed_from_u64(5);
    let result = allocate_seats(&candidates, &rooms, "mixed", &config, &mut rng).unwrap();

    let layout = result.allocations[0].room_layout;
    assert_eq!((layout.total_rows, layout.total_columns), (3, 3));
    let last = result.allocations[0].students.last().unwrap();
    assert_eq!(last.seat_number, 9);
    assert_eq!((last.grid.row, last.grid.col), (2, 2));
}
