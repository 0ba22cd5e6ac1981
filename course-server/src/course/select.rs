//! Deterministic selection and ordering of course stops.
//!
//! Everything here works on pool indices and is pure, so the assembler
//! can mix these steps freely with proposer answers.

use std::cmp::Ordering;
use std::collections::HashSet;

use crate::domain::{CandidatePlace, Category, breaks_continuity};

use super::proposal::Plan;

/// Most dining stops a course of `stops` can hold without two adjacent.
pub fn dining_capacity(stops: usize) -> usize {
    stops.div_ceil(2)
}

fn dining_count(pool: &[CandidatePlace], places: &[usize]) -> usize {
    places.iter().filter(|&&i| pool[i].category.is_dining()).count()
}

fn category_count(pool: &[CandidatePlace], places: &[usize], category: Category) -> usize {
    places.iter().filter(|&&i| pool[i].category == category).count()
}

/// Pool indices in ranking order: pinned first, then trust descending.
fn ranked(pool: &[CandidatePlace]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..pool.len()).collect();
    order.sort_by(|&a, &b| {
        pool[b]
            .is_user_saved
            .cmp(&pool[a].is_user_saved)
            .then_with(|| {
                pool[b]
                    .trust_score
                    .partial_cmp(&pool[a].trust_score)
                    .unwrap_or(Ordering::Equal)
            })
            .then(a.cmp(&b))
    });
    order
}

/// Pick up to `stop_count` stops: every pinned place, then the most
/// trusted remaining candidates.
///
/// The category cap and the dining capacity are honoured first and then
/// relaxed one at a time if the pool cannot otherwise fill the course.
/// Indices in `avoid` are used only as a last resort.
pub fn select_stops(
    pool: &[CandidatePlace],
    stop_count: usize,
    max_per_category: usize,
    avoid: &HashSet<usize>,
) -> Vec<usize> {
    let target = stop_count.min(pool.len());
    let order = ranked(pool);

    let mut chosen: Vec<usize> = order
        .iter()
        .copied()
        .filter(|&i| pool[i].is_user_saved)
        .take(target)
        .collect();

    let passes = [
        (true, true, true),
        (false, true, true),
        (false, false, true),
        (false, false, false),
    ];
    for (cap_category, cap_dining, skip_avoided) in passes {
        for &i in &order {
            if chosen.len() >= target {
                return chosen;
            }
            if chosen.contains(&i) || (skip_avoided && avoid.contains(&i)) {
                continue;
            }
            let category = pool[i].category;
            if cap_category && category_count(pool, &chosen, category) >= max_per_category {
                continue;
            }
            if cap_dining
                && category.is_dining()
                && dining_count(pool, &chosen) + 1 > dining_capacity(target)
            {
                continue;
            }
            chosen.push(i);
        }
    }
    chosen
}

/// Order `places` by repeatedly walking to the closest unvisited stop,
/// starting from `places[start % len]`.
///
/// A closer stop that would put two dining stops side by side is passed
/// over while any other choice remains. The result is then run through
/// [`repair_continuity`].
pub fn nearest_neighbour(pool: &[CandidatePlace], places: &[usize], start: usize) -> Vec<usize> {
    if places.is_empty() {
        return Vec::new();
    }

    let mut remaining: Vec<usize> = places.to_vec();
    let mut order = vec![remaining.remove(start % places.len())];

    while !remaining.is_empty() {
        let last = &pool[order[order.len() - 1]];
        let distance = |&&i: &&usize| last.coordinates.distance_m(&pool[i].coordinates);
        let closest = |candidates: Vec<&usize>| {
            candidates
                .into_iter()
                .min_by(|a, b| distance(a).partial_cmp(&distance(b)).unwrap_or(Ordering::Equal))
                .copied()
        };

        let compatible = remaining
            .iter()
            .filter(|&&i| !breaks_continuity(last.category, pool[i].category))
            .collect();
        let next = closest(compatible).or_else(|| closest(remaining.iter().collect()));
        let Some(next) = next else { break };

        remaining.retain(|&i| i != next);
        order.push(next);
    }

    repair_continuity(pool, &mut order);
    order
}

/// True when no two adjacent stops are both dining.
pub fn is_continuous(pool: &[CandidatePlace], sequence: &[usize]) -> bool {
    sequence
        .windows(2)
        .all(|w| !breaks_continuity(pool[w[0]].category, pool[w[1]].category))
}

/// Reorder `sequence` so no two dining stops are adjacent, disturbing the
/// existing order as little as possible.
///
/// Returns false, leaving `sequence` unchanged, when the stops cannot be
/// arranged that way (more dining stops than [`dining_capacity`]).
pub fn repair_continuity(pool: &[CandidatePlace], sequence: &mut Vec<usize>) -> bool {
    if is_continuous(pool, sequence) {
        return true;
    }
    let is_dining = |i: usize| pool[i].category.is_dining();

    let mut shifted = sequence.clone();
    for i in 1..shifted.len() {
        if breaks_continuity(pool[shifted[i - 1]].category, pool[shifted[i]].category) {
            match (i + 1..shifted.len()).find(|&j| !is_dining(shifted[j])) {
                Some(j) => shifted[i..=j].rotate_right(1),
                None => break,
            }
        }
    }
    if is_continuous(pool, &shifted) {
        *sequence = shifted;
        return true;
    }

    let (dining, other): (Vec<usize>, Vec<usize>) =
        sequence.iter().copied().partition(|&i| is_dining(i));
    if dining.len() > other.len() + 1 {
        return false;
    }

    let mut interleaved = Vec::with_capacity(sequence.len());
    let mut dining = dining.into_iter();
    let other = other.into_iter();
    if dining.len() == other.len() + 1 {
        interleaved.extend(dining.next());
    }
    for o in other {
        interleaved.push(o);
        interleaved.extend(dining.next());
    }
    *sequence = interleaved;
    true
}

/// Swap the stop `out` for the unused candidate with the lowest `cost`.
/// A cost of `None` rules a candidate out.
///
/// Candidates must not be pinned, avoided, or push a category past
/// `max_per_category` or dining past capacity. The replacement takes the
/// same position in the sequence. Returns the replacement, or `None` when
/// `out` is pinned or nothing qualifies.
pub fn substitute<F>(
    pool: &[CandidatePlace],
    plan: &mut Plan,
    out: usize,
    avoid: &HashSet<usize>,
    max_per_category: usize,
    cost: F,
) -> Option<usize>
where
    F: Fn(&CandidatePlace) -> Option<f64>,
{
    if pool.get(out)?.is_user_saved || !plan.places.contains(&out) {
        return None;
    }

    let kept: Vec<usize> = plan.places.iter().copied().filter(|&i| i != out).collect();
    let capacity = dining_capacity(plan.places.len());

    let replacement = (0..pool.len())
        .filter(|i| !plan.places.contains(i) && !avoid.contains(i) && !pool[*i].is_user_saved)
        .filter(|&i| category_count(pool, &kept, pool[i].category) < max_per_category)
        .filter(|&i| !pool[i].category.is_dining() || dining_count(pool, &kept) < capacity)
        .filter_map(|i| cost(&pool[i]).map(|c| (i, c)))
        .min_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal))
        .map(|(i, _)| i)?;

    for slot in plan.places.iter_mut().chain(plan.sequence.iter_mut()) {
        if *slot == out {
            *slot = replacement;
        }
    }
    plan.durations.remove(&out);
    Some(replacement)
}
