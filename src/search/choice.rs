//! Acceptance rule for one local-search step.

use rand::seq::IndexedRandom;
use rand::Rng;

use crate::assignment::Assignment;

/// Two accumulated route costs within this margin count as tied.
const COST_EPS: f64 = 1e-9;

/// Picks the next assignment from a candidate pool.
///
/// With probability `p_random` the step is skipped (`None`), which is
/// the caller's cue to keep its current assignment; this random refusal
/// is the only source of uphill drift in the search. Otherwise one of
/// the cheapest candidates is returned, chosen uniformly among ties.
pub fn local_choice<R: Rng>(
    candidates: &[Assignment],
    p_random: f64,
    rng: &mut R,
) -> Option<Assignment> {
    if candidates.is_empty() {
        return None;
    }
    if rng.random_range(0.0..1.0) < p_random {
        return None;
    }

    let best = candidates
        .iter()
        .map(Assignment::cost)
        .fold(f64::INFINITY, f64::min);
    let tied: Vec<&Assignment> = candidates
        .iter()
        .filter(|a| a.cost() - best <= COST_EPS)
        .collect();

    tied.choose(rng).map(|a| (*a).clone())
}
