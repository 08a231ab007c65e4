//! Seat placement inside a single room.
//!
//! A seat is chosen by walking a ladder of rungs, strictest first:
//! preferred distance, minimum distance, policy-only feasibility, and finally
//! any free seat. Placement passes stop at the feasibility rung and leave the
//! rest to the emergency fill.

use crate::config::SeatingConfig;
use crate::data::{Candidate, Room, RoomAllocation, SeatAssignment, SeatNumber, Subject};
use crate::geometry::{DistanceGrid, Geometry, SeatPosition, generate_seat_positions};
use crate::grouping::SubjectPools;
use crate::policy::{OccupiedSeats, SeparationPolicy};
use crate::scoring;
use log::{debug, trace};
use std::collections::BTreeMap;

/// The rung of the seat-selection ladder a seat was found on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Rung {
    Preferred,
    Minimum,
    Feasible,
    FirstAvailable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeatChoice {
    pub seat: SeatNumber,
    pub rung: Rung,
}

/// Seat search over one room's positions.
#[derive(Debug, Clone, Copy)]
pub struct SeatFinder<'p> {
    policy: &'p dyn SeparationPolicy,
    min_distance: u32,
}

impl<'p> SeatFinder<'p> {
    pub fn new(policy: &'p dyn SeparationPolicy, config: &SeatingConfig) -> Self {
        Self {
            policy,
            min_distance: config.min_distance,
        }
    }

    /// Distance thresholds tried when the search starts at `start`.
    pub fn thresholds(&self, start: u32) -> Vec<(u32, Rung)> {
        if start > self.min_distance {
            vec![(start, Rung::Preferred), (self.min_distance, Rung::Minimum)]
        } else {
            vec![(self.min_distance, Rung::Minimum)]
        }
    }

    /// Whether `seat` keeps `subject` at least `threshold` seats from its
    /// nearest same-subject occupant and satisfies the policy.
    fn qualifies(&self, seat: SeatNumber, subject: &str, occupied: &OccupiedSeats, threshold: u32) -> bool {
        occupied
            .nearest_same_subject(seat, subject)
            .is_none_or(|distance| distance >= threshold)
            && self.policy.is_placeable(seat, subject, occupied)
    }

    /// Best qualifying seat at one threshold: the highest
    /// `distance + position_score`, earliest position on ties.
    pub fn best_at_threshold(
        &self,
        positions: &[SeatPosition],
        occupied: &OccupiedSeats,
        subject: &str,
        capacity: u32,
        threshold: u32,
    ) -> Option<SeatNumber> {
        let mut best: Option<(SeatNumber, f64)> = None;
        for position in vacant(positions, occupied) {
            if !self.qualifies(position.seat, subject, occupied, threshold) {
                continue;
            }
            let distance = occupied.min_distance_to_subject(position.seat, subject, capacity);
            let score = distance as f64 + position.position_score;
            if best.is_none_or(|(_, best_score)| score > best_score) {
                best = Some((position.seat, score));
            }
        }
        best.map(|(seat, _)| seat)
    }

    /// First free seat, in position order, the policy accepts.
    pub fn first_feasible(&self, positions: &[SeatPosition], occupied: &OccupiedSeats, subject: &str) -> Option<SeatNumber> {
        vacant(positions, occupied)
            .find(|position| self.policy.is_placeable(position.seat, subject, occupied))
            .map(|position| position.seat)
    }

    pub fn first_available(&self, positions: &[SeatPosition], occupied: &OccupiedSeats) -> Option<SeatNumber> {
        vacant(positions, occupied).next().map(|position| position.seat)
    }

    /// Walks the ladder from `start`. With `allow_unconstrained` unset the
    /// search gives up instead of taking a seat that breaks the policy.
    pub fn find_best_seat(
        &self,
        positions: &[SeatPosition],
        occupied: &OccupiedSeats,
        subject: &str,
        capacity: u32,
        start: u32,
        allow_unconstrained: bool,
    ) -> Option<SeatChoice> {
        for (threshold, rung) in self.thresholds(start) {
            if let Some(seat) = self.best_at_threshold(positions, occupied, subject, capacity, threshold) {
                return Some(SeatChoice { seat, rung });
            }
        }
        if let Some(seat) = self.first_feasible(positions, occupied, subject) {
            trace!("{subject}: no seat at distance {}, taking feasible seat {seat}", self.min_distance);
            return Some(SeatChoice { seat, rung: Rung::Feasible });
        }
        if allow_unconstrained {
            if let Some(seat) = self.first_available(positions, occupied) {
                trace!("{subject}: no feasible seat under {}, taking seat {seat}", self.policy.name());
                return Some(SeatChoice { seat, rung: Rung::FirstAvailable });
            }
        }
        None
    }

    /// Density-first choice: among well separated seats prefer the lowest
    /// numbers, otherwise the seat furthest from the same subject.
    pub fn find_packing_seat(&self, positions: &[SeatPosition], occupied: &OccupiedSeats, subject: &str) -> Option<SeatNumber> {
        let total_seats = positions.len() as i64;
        let capacity = positions.len() as u32;

        let mut best_separated: Option<(SeatNumber, i64)> = None;
        let mut furthest: Option<(SeatNumber, u32)> = None;
        for position in vacant(positions, occupied) {
            let seat = position.seat;
            let distance = occupied.min_distance_to_subject(seat, subject, capacity);
            if self.qualifies(seat, subject, occupied, self.min_distance) {
                let packing_score = total_seats - seat as i64;
                let score = packing_score * 10 + distance as i64;
                if best_separated.is_none_or(|(_, best)| score > best) {
                    best_separated = Some((seat, score));
                }
            }
            if furthest.is_none_or(|(_, best)| distance > best) {
                furthest = Some((seat, distance));
            }
        }

        best_separated
            .map(|(seat, _)| seat)
            .or(furthest.map(|(seat, _)| seat))
            .or_else(|| self.first_available(positions, occupied))
    }
}

fn vacant<'s>(positions: &'s [SeatPosition], occupied: &'s OccupiedSeats) -> impl Iterator<Item = &'s SeatPosition> {
    positions.iter().filter(move |position| !occupied.is_occupied(position.seat))
}

/// Working state while one room is being filled.
pub struct RoomPlacer<'a, 'p> {
    room: &'a Room,
    capacity: u32,
    geometry: Geometry,
    finder: SeatFinder<'p>,
    positions: Vec<SeatPosition>,
    occupied: OccupiedSeats,
    seated: Vec<(SeatNumber, &'a Candidate)>,
    preferred_distance: u32,
    min_distance: u32,
    round_cap: usize,
}

impl<'a, 'p> RoomPlacer<'a, 'p> {
    pub fn new(room: &'a Room, config: &SeatingConfig, policy: &'p dyn SeparationPolicy) -> Self {
        let capacity = room.capacity;
        let grid = DistanceGrid::for_capacity(capacity);
        Self {
            room,
            capacity,
            geometry: Geometry::from_config(config),
            finder: SeatFinder::new(policy, config),
            positions: generate_seat_positions(capacity, grid.rows, grid.cols),
            occupied: OccupiedSeats::new(),
            seated: Vec::new(),
            preferred_distance: config.preferred_distance,
            min_distance: config.min_distance,
            round_cap: config.round_cap(capacity),
        }
    }

    pub fn is_full(&self) -> bool {
        self.seated.len() >= self.capacity as usize
    }

    pub fn seated_count(&self) -> usize {
        self.seated.len()
    }

    pub fn occupied(&self) -> &OccupiedSeats {
        &self.occupied
    }

    fn seat(&mut self, seat: SeatNumber, candidate: &'a Candidate) {
        self.occupied.occupy(seat, candidate.primary_subject());
        self.seated.push((seat, candidate));
    }

    /// One placement pass: each round seats at most one candidate per subject
    /// with quota left. Stops when a round seats nobody, the room is full or
    /// the round cap is reached. Returns how many were seated.
    pub fn run_pass(
        &mut self,
        pools: &mut SubjectPools<'a>,
        subject_order: &[Subject],
        quotas: &mut BTreeMap<Subject, usize>,
        threshold: u32,
    ) -> usize {
        let mut placed = 0;
        for _ in 0..self.round_cap {
            if self.is_full() {
                break;
            }
            let mut made_allocation = false;

            for subject in subject_order {
                if self.is_full() {
                    break;
                }
                let Some(quota) = quotas.get_mut(subject).filter(|q| **q > 0) else {
                    continue;
                };
                let Some(pool) = pools.get_mut(subject).filter(|p| !p.is_empty()) else {
                    continue;
                };
                let Some(choice) = self.finder.find_best_seat(
                    &self.positions,
                    &self.occupied,
                    subject,
                    self.capacity,
                    threshold,
                    false,
                ) else {
                    continue;
                };
                if let Some(candidate) = pool.pop_front() {
                    self.seat(choice.seat, candidate);
                    *quota -= 1;
                    placed += 1;
                    made_allocation = true;
                }
            }

            if !made_allocation {
                break;
            }
        }
        placed
    }

    /// Fills the remaining seats in seat-number order with whoever is left,
    /// taking subjects in `subject_order`.
    pub fn emergency_fill(&mut self, pools: &mut SubjectPools<'a>, subject_order: &[Subject]) -> usize {
        let open: Vec<SeatNumber> = (1..=self.capacity)
            .filter(|seat| !self.occupied.is_occupied(*seat))
            .collect();
        let mut open_seats = open.into_iter();
        let mut placed = 0;

        'subjects: for subject in subject_order {
            let Some(pool) = pools.get_mut(subject) else {
                continue;
            };
            while !pool.is_empty() {
                let Some(seat) = open_seats.next() else {
                    break 'subjects;
                };
                if let Some(candidate) = pool.pop_front() {
                    self.seat(seat, candidate);
                    placed += 1;
                }
            }
        }
        placed
    }

    /// Seats a mixed queue one by one, falling all the way down the ladder
    /// when needed. Returns how many were seated.
    pub fn place_queue(&mut self, queue: &[&'a Candidate]) -> usize {
        let mut placed = 0;
        for &candidate in queue {
            if self.is_full() {
                break;
            }
            let subject = candidate.primary_subject();
            let choice = self.finder.find_best_seat(
                &self.positions,
                &self.occupied,
                subject,
                self.capacity,
                self.preferred_distance,
                true,
            );
            if let Some(choice) = choice {
                self.seat(choice.seat, candidate);
                placed += 1;
            }
        }
        placed
    }

    /// Seats candidates with the density-first packing rule.
    pub fn place_packed(&mut self, candidates: &[&'a Candidate]) -> usize {
        let mut placed = 0;
        for &candidate in candidates {
            if self.is_full() {
                break;
            }
            if let Some(seat) = self.finder.find_packing_seat(&self.positions, &self.occupied, candidate.primary_subject()) {
                self.seat(seat, candidate);
                placed += 1;
            }
        }
        placed
    }

    pub fn finish(self) -> RoomAllocation {
        let Self {
            room,
            capacity,
            geometry,
            occupied,
            mut seated,
            ..
        } = self;
        seated.sort_by_key(|(seat, _)| *seat);

        let mut subject_breakdown: BTreeMap<Subject, usize> = BTreeMap::new();
        let students = seated
            .into_iter()
            .map(|(seat_number, candidate)| {
                *subject_breakdown
                    .entry(candidate.primary_subject().to_string())
                    .or_default() += 1;
                SeatAssignment {
                    seat_number,
                    student: candidate.clone(),
                    grid: geometry.seat_to_grid(seat_number, capacity),
                }
            })
            .collect();

        RoomAllocation {
            room: room.clone(),
            students,
            subject_breakdown,
            distribution_score: scoring::distribution_score(&occupied, capacity),
            separation_quality: scoring::separation_quality(&occupied, &geometry, capacity),
            room_layout: geometry.layout(capacity),
            utilization_rate: None,
            packing_efficiency: None,
        }
    }
}

/// Fills one room from the shared subject pools: preferred pass, minimum
/// pass, then emergency fill. Seated candidates are removed from `pools`.
pub fn place_in_room<'a>(
    room: &'a Room,
    pools: &mut SubjectPools<'a>,
    subject_order: &[Subject],
    mut quotas: BTreeMap<Subject, usize>,
    config: &SeatingConfig,
    policy: &dyn SeparationPolicy,
) -> RoomAllocation {
    let mut placer = RoomPlacer::new(room, config, policy);

    let preferred = placer.run_pass(pools, subject_order, &mut quotas, placer.preferred_distance);
    let minimum = if placer.is_full() {
        0
    } else {
        placer.run_pass(pools, subject_order, &mut quotas, placer.min_distance)
    };
    let emergency = if placer.is_full() {
        0
    } else {
        placer.emergency_fill(pools, subject_order)
    };

    debug!(
        "Room {}: seated {} (preferred {}, minimum {}, emergency {}) of capacity {}",
        room.name,
        placer.seated_count(),
        preferred,
        minimum,
        emergency,
        room.capacity
    );
    placer.finish()
}
