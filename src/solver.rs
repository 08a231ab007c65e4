use crate::config::SeatingConfig;
use crate::data::{AllocationRequest, AllocationResult, Candidate, Room, RoomAllocation, Strategy};
use crate::error::{AllocationError, Result};
use crate::grouping::{
    SubjectPools, filter_by_subject, group_by_subject, group_in_order, interleaved_pool, subject_order,
};
use crate::placement::{RoomPlacer, place_in_room};
use crate::policy::SeparationPolicy;
use crate::quota::compute_quotas;
use crate::scoring;
use itertools::Itertools;
use log::{debug, info, trace};
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::borrow::Cow;
use std::cmp::Reverse;
use std::collections::VecDeque;
use std::time::Instant;

/// Seeded generator when a seed is given, fresh entropy otherwise.
pub fn make_rng(seed: Option<u64>) -> ChaCha8Rng {
    match seed {
        Some(seed) => ChaCha8Rng::seed_from_u64(seed),
        None => ChaCha8Rng::from_entropy(),
    }
}

/// Validates a request, applies its subject filter and runs the allocation.
pub fn solve(request: &AllocationRequest, config: &SeatingConfig) -> Result<AllocationResult> {
    let strategy: Strategy = request.strategy.parse()?;
    check_config(config)?;

    if request.students.is_empty() {
        return Err(AllocationError::NoCandidates);
    }
    if request.rooms.is_empty() {
        return Err(AllocationError::NoRooms);
    }
    if let Some(room) = request.rooms.iter().find(|room| room.capacity == 0) {
        return Err(AllocationError::InvalidRoomCapacity(room.name.clone()));
    }

    let candidates: Cow<'_, [Candidate]> = match request.subject_filter.as_deref() {
        Some(subject) if !subject.is_empty() => {
            let filtered: Vec<Candidate> = filter_by_subject(&request.students, subject)
                .into_iter()
                .cloned()
                .collect();
            if filtered.is_empty() {
                return Err(AllocationError::NoCandidatesForSubject(subject.to_string()));
            }
            info!("Subject filter '{}' kept {} of {} students", subject, filtered.len(), request.students.len());
            Cow::Owned(filtered)
        }
        _ => Cow::Borrowed(request.students.as_slice()),
    };

    let mut rng = make_rng(request.seed.or(config.seed));
    Ok(run_strategy(&candidates, &request.rooms, strategy, config, &mut rng))
}

fn check_config(config: &SeatingConfig) -> Result<()> {
    config
        .validate()
        .map_err(|e| AllocationError::InvalidConfig(e.to_string()))
}

/// Seats `candidates` across `rooms` with the named strategy
/// (`mixed`, `separated` or `optimal_packing`).
pub fn allocate_seats<R: Rng + ?Sized>(
    candidates: &[Candidate],
    rooms: &[Room],
    strategy: &str,
    config: &SeatingConfig,
    rng: &mut R,
) -> Result<AllocationResult> {
    let strategy: Strategy = strategy.parse()?;
    check_config(config)?;
    Ok(run_strategy(candidates, rooms, strategy, config, rng))
}

pub fn run_strategy<R: Rng + ?Sized>(
    candidates: &[Candidate],
    rooms: &[Room],
    strategy: Strategy,
    config: &SeatingConfig,
    rng: &mut R,
) -> AllocationResult {
    let start_time = Instant::now();
    let policy = config.separation_policy();
    info!(
        "Allocating {} students across {} rooms with the {} strategy ({} separation)...",
        candidates.len(),
        rooms.len(),
        strategy,
        policy.name()
    );

    let result = match strategy {
        Strategy::Mixed => allocate_mixed(candidates, rooms, config, policy.as_ref(), rng),
        Strategy::Separated => allocate_separated(candidates, rooms, config, policy.as_ref(), rng),
        Strategy::OptimalPacking => allocate_optimal_packing(candidates, rooms, config, policy.as_ref(), rng),
    };

    info!(
        "Allocation finished in {:.2?}: {}/{} seated in {} rooms, rated {}",
        start_time.elapsed(),
        result.summary.counts.total_allocated,
        result.summary.counts.total_students,
        result.summary.counts.rooms_used,
        result.summary.quality_rating
    );
    result
}

/// Largest rooms first, then by name.
pub fn sort_rooms_strategically(rooms: &[Room]) -> Vec<&Room> {
    rooms
        .iter()
        .sorted_by(|a, b| b.capacity.cmp(&a.capacity).then_with(|| a.name.cmp(&b.name)))
        .collect()
}

fn allocate_mixed<R: Rng + ?Sized>(
    candidates: &[Candidate],
    rooms: &[Room],
    config: &SeatingConfig,
    policy: &dyn SeparationPolicy,
    rng: &mut R,
) -> AllocationResult {
    let mut pools = group_by_subject(candidates, rng);
    let order = subject_order(&pools, rng);
    debug!("Subject order: {:?}", order);

    let total_students = candidates.len();
    let mut total_allocated = 0;
    let mut allocations = Vec::new();

    for room in sort_rooms_strategically(rooms) {
        if total_allocated >= total_students {
            break;
        }
        let remaining = total_students - total_allocated;
        let quotas = compute_quotas(&pools, room.capacity, remaining);
        trace!("Room {} quotas: {:?}", room.name, quotas);

        let allocation = place_in_room(room, &mut pools, &order, quotas, config, policy);
        if allocation.students.is_empty() {
            continue;
        }
        total_allocated += allocation.students.len();
        allocations.push(allocation);
    }

    finish(allocations, total_students, Strategy::Mixed)
}

/// Candidates handed to one room by the separated strategy.
#[derive(Debug, Clone)]
pub struct RoomShare<'a> {
    pub room: &'a Room,
    pub candidates: Vec<&'a Candidate>,
}

impl RoomShare<'_> {
    fn spare(&self) -> usize {
        (self.room.capacity as usize).saturating_sub(self.candidates.len())
    }
}

/// Splits every subject across the rooms before any seat is chosen.
///
/// Subjects no larger than the room count go one per room. Larger subjects
/// give each room `pool / rooms`, and the remainder goes round-robin to rooms
/// with spare seats. Candidates that fit nowhere are left out.
pub fn partition_across_rooms<'a>(pools: &SubjectPools<'a>, rooms: &'a [Room]) -> Vec<RoomShare<'a>> {
    let mut shares: Vec<RoomShare<'a>> = rooms
        .iter()
        .map(|room| RoomShare { room, candidates: Vec::new() })
        .collect();
    let room_count = shares.len();
    if room_count == 0 {
        return shares;
    }

    let by_size = pools.iter().sorted_by_key(|(_, pool)| Reverse(pool.len()));
    for (subject, pool) in by_size {
        if pool.len() <= room_count {
            for (i, candidate) in pool.iter().enumerate() {
                let target = (0..room_count)
                    .map(|offset| (i + offset) % room_count)
                    .find(|idx| shares[*idx].spare() > 0);
                if let Some(idx) = target {
                    shares[idx].candidates.push(*candidate);
                }
            }
            continue;
        }

        let per_room = (pool.len() / room_count).max(1);
        let mut rest: VecDeque<&'a Candidate> = pool.iter().copied().collect();
        for share in shares.iter_mut() {
            let take = per_room.min(share.spare()).min(rest.len());
            share.candidates.extend(rest.drain(..take));
        }

        let mut idx = 0;
        let mut idle = 0;
        while !rest.is_empty() && idle < room_count {
            if shares[idx].spare() > 0 {
                if let Some(candidate) = rest.pop_front() {
                    shares[idx].candidates.push(candidate);
                }
                idle = 0;
            } else {
                idle += 1;
            }
            idx = (idx + 1) % room_count;
        }
        if !rest.is_empty() {
            debug!("{} students of {} did not fit any room", rest.len(), subject);
        }
    }
    shares
}

fn allocate_separated<R: Rng + ?Sized>(
    candidates: &[Candidate],
    rooms: &[Room],
    config: &SeatingConfig,
    policy: &dyn SeparationPolicy,
    rng: &mut R,
) -> AllocationResult {
    let pools = group_by_subject(candidates, rng);
    let shares = partition_across_rooms(&pools, rooms);

    let mut allocations = Vec::new();
    for share in shares {
        if share.candidates.is_empty() {
            continue;
        }
        let mut queue = share.candidates;
        queue.shuffle(rng);

        let mut placer = RoomPlacer::new(share.room, config, policy);
        let placed = placer.place_queue(&queue);
        debug!("Room {}: seated {} of {} assigned", share.room.name, placed, queue.len());

        let allocation = placer.finish();
        if !allocation.students.is_empty() {
            allocations.push(allocation);
        }
    }

    finish(allocations, candidates.len(), Strategy::Separated)
}

fn allocate_optimal_packing<R: Rng + ?Sized>(
    candidates: &[Candidate],
    rooms: &[Room],
    config: &SeatingConfig,
    policy: &dyn SeparationPolicy,
    rng: &mut R,
) -> AllocationResult {
    let mut shuffled: Vec<&Candidate> = candidates.iter().collect();
    shuffled.shuffle(rng);
    let pools = group_in_order(shuffled.iter().copied());
    let mut pool: VecDeque<&Candidate> = interleaved_pool(&pools, rng).into();

    let total_students = candidates.len();
    let mut total_allocated = 0;
    let mut allocations = Vec::new();

    let sorted_rooms = rooms.iter().sorted_by_key(|room| Reverse(room.capacity));
    for room in sorted_rooms {
        if total_allocated >= total_students || pool.is_empty() {
            break;
        }
        let to_allocate = (room.capacity as usize).min(total_students - total_allocated).min(pool.len());
        let batch: Vec<&Candidate> = pool.drain(..to_allocate).collect();

        let mut placer = RoomPlacer::new(room, config, policy);
        let placed = placer.place_packed(&batch);
        // anyone not seated goes back to the front of the pool
        for &candidate in batch[placed..].iter().rev() {
            pool.push_front(candidate);
        }

        let mut allocation = placer.finish();
        if allocation.students.is_empty() {
            continue;
        }
        let seated = allocation.students.len();
        allocation.utilization_rate = Some(scoring::utilization_rate(seated, room.capacity));
        allocation.packing_efficiency = Some(scoring::packing_efficiency(seated, room.capacity));
        debug!("Room {}: packed {} of {} seats", room.name, seated, room.capacity);

        total_allocated += seated;
        allocations.push(allocation);
    }

    let mut result = finish(allocations, total_students, Strategy::OptimalPacking);
    result.summary.rooms_saved = Some(rooms.len().saturating_sub(result.allocations.len()));
    result.summary.utilization_efficiency = Some(scoring::utilization_efficiency(&result.allocations, rooms));
    result
}

fn finish(allocations: Vec<RoomAllocation>, total_students: usize, strategy: Strategy) -> AllocationResult {
    let summary = scoring::generate_enhanced_summary(&allocations, total_students, strategy);
    AllocationResult {
        allocations,
        summary,
        strategy: strategy.result_tag().to_string(),
    }
}
