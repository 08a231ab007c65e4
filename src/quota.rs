//! Per-room subject quotas.

use crate::data::Subject;
use crate::grouping::SubjectPools;
use itertools::Itertools;
use std::cmp::Reverse;
use std::collections::BTreeMap;

/// How many seats each subject may take in a room before placement starts.
///
/// Every non-empty subject gets an equal share of `min(room_capacity, remaining)`,
/// capped by its pool. Leftover seats go to the largest pools first, each
/// taking at most half of what is left. When there are more subjects than
/// seats, the largest subjects get one seat each.
pub fn compute_quotas(pools: &SubjectPools<'_>, room_capacity: u32, remaining: usize) -> BTreeMap<Subject, usize> {
    let room_allocation = (room_capacity as usize).min(remaining);
    let by_size: Vec<(&Subject, usize)> = pools
        .iter()
        .filter(|(_, pool)| !pool.is_empty())
        .map(|(subject, pool)| (subject, pool.len()))
        .sorted_by_key(|(_, len)| Reverse(*len))
        .collect();

    let mut quotas = BTreeMap::new();
    if by_size.is_empty() || room_allocation == 0 {
        return quotas;
    }

    let base_share = room_allocation / by_size.len();
    if base_share == 0 {
        for (subject, _) in by_size.iter().take(room_allocation) {
            quotas.insert((*subject).clone(), 1);
        }
        return quotas;
    }

    for (subject, len) in &by_size {
        quotas.insert((*subject).clone(), base_share.min(*len));
    }

    let mut leftover = room_allocation - quotas.values().sum::<usize>();
    for (subject, len) in &by_size {
        if leftover == 0 {
            break;
        }
        let Some(quota) = quotas.get_mut(*subject) else {
            continue;
        };
        let max_additional = leftover.min(len - *quota);
        if max_additional > 0 {
            let additional = max_additional.min((leftover / 2).max(1));
            *quota += additional;
            leftover -= additional;
        }
    }

    quotas
}
