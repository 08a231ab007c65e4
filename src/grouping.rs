//! Candidate grouping by primary subject.

use crate::data::{Candidate, Subject};
use itertools::Itertools;
use rand::Rng;
use rand::seq::SliceRandom;
use std::collections::{BTreeMap, HashMap, VecDeque};

/// Remaining candidates per subject, in the order they will be seated.
pub type SubjectPools<'a> = BTreeMap<Subject, VecDeque<&'a Candidate>>;

/// Groups candidates by primary subject, keeping input order inside each group.
pub fn group_in_order<'a>(candidates: impl IntoIterator<Item = &'a Candidate>) -> SubjectPools<'a> {
    let mut pools = SubjectPools::new();
    for candidate in candidates {
        pools
            .entry(candidate.primary_subject().to_string())
            .or_default()
            .push_back(candidate);
    }
    pools
}

/// Groups candidates by primary subject and shuffles every group, so the same
/// roster never seats identically twice unless the RNG is seeded.
pub fn group_by_subject<'a, R: Rng + ?Sized>(candidates: &'a [Candidate], rng: &mut R) -> SubjectPools<'a> {
    let mut pools = group_in_order(candidates);
    for pool in pools.values_mut() {
        pool.make_contiguous().shuffle(rng);
    }
    pools
}

pub fn remaining(pools: &SubjectPools<'_>) -> usize {
    pools.values().map(VecDeque::len).sum()
}

/// Subjects by descending pool size. Equal sizes are ordered by a key drawn
/// once per call, so ties do not always resolve the same way.
pub fn subject_order<R: Rng + ?Sized>(pools: &SubjectPools<'_>, rng: &mut R) -> Vec<Subject> {
    let tie_keys: HashMap<&str, u32> = pools
        .keys()
        .map(|subject| (subject.as_str(), rng.gen_range(0..100)))
        .collect();
    pools
        .iter()
        .sorted_by_key(|(subject, pool)| (std::cmp::Reverse(pool.len()), tie_keys[subject.as_str()]))
        .map(|(subject, _)| subject.clone())
        .collect()
}

/// Round-robin across subjects (subject order reshuffled every round), then
/// shuffled once more.
pub fn interleaved_pool<'a, R: Rng + ?Sized>(pools: &SubjectPools<'a>, rng: &mut R) -> Vec<&'a Candidate> {
    let mut subjects: Vec<&Subject> = pools.keys().collect();
    let rounds = pools.values().map(VecDeque::len).max().unwrap_or(0);
    let mut pool = Vec::with_capacity(remaining(pools));

    for i in 0..rounds {
        subjects.shuffle(rng);
        for subject in &subjects {
            if let Some(candidate) = pools[*subject].get(i) {
                pool.push(*candidate);
            }
        }
    }

    pool.shuffle(rng);
    pool
}

/// Candidates sitting `subject` in any of their listed subjects.
pub fn filter_by_subject<'a>(candidates: &'a [Candidate], subject: &str) -> Vec<&'a Candidate> {
    candidates.iter().filter(|c| c.takes_subject(subject)).collect()
}
