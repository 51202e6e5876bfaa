//! Candidate generation: bounded structural perturbations of one
//! assignment, used as the pool for a single local-search step.

use rand::seq::IndexedRandom;
use rand::Rng;

use super::state::Assignment;
use crate::model::{Problem, Topology, VehicleId};

/// Produces the validity-filtered neighbor pool of `current`.
///
/// One vehicle with a non-empty route is chosen at random, then four
/// perturbation families are applied to it:
///
/// 1. **Relocate**: its first task is handed to every other vehicle
///    whose capacity admits the task, pickup immediately followed by
///    delivery at the front of the receiving route.
/// 2. **Reorder**: every pair of distinct stops in the chosen route is
///    swapped (routes of more than two stops only).
/// 3. **Shuffle**: one fully random permutation of the chosen route.
/// 4. **Scatter**: a random handful of the route's tasks is sprinkled
///    at random positions across the other routes.
///
/// Candidates failing validity are dropped. The pool is never empty:
/// with no perturbable route, or when every candidate was filtered out,
/// the unmodified input is returned as the only member, so the search
/// loop cannot stall.
pub fn neighbors<T: Topology, R: Rng>(
    problem: &Problem<T>,
    current: &Assignment,
    rng: &mut R,
) -> Vec<Assignment> {
    let loaded: Vec<VehicleId> = current
        .routes()
        .iter()
        .enumerate()
        .filter(|(_, route)| !route.is_empty())
        .map(|(v, _)| v)
        .collect();

    let Some(&src) = loaded.choose(rng) else {
        return vec![current.clone()];
    };

    let mut pool = Vec::new();
    let route = current.route(src);

    // Relocate the head task to every vehicle that can carry it.
    let head_weight = problem.task(route[0]).weight;
    for dst in 0..problem.vehicles().len() {
        if dst == src || problem.vehicle(dst).capacity < head_weight {
            continue;
        }
        let candidate = current.relocate(problem, src, dst);
        if candidate.is_valid(problem) {
            pool.push(candidate);
        }
    }

    // Swap every pair of distinct stops within the chosen route.
    if route.len() > 2 {
        for i in 0..route.len() {
            for j in (i + 1)..route.len() {
                if route[i] == route[j] {
                    continue;
                }
                let candidate = current.swap_stops(problem, src, i, j);
                if candidate.is_valid(problem) {
                    pool.push(candidate);
                }
            }
        }
    }

    // One fully shuffled variant of the chosen route.
    let shuffled = current.shuffle_route(problem, src, rng);
    if shuffled.is_valid(problem) {
        pool.push(shuffled);
    }

    if problem.vehicles().len() > 1 {
        let scattered = scatter(problem, current, src, rng);
        if scattered.is_valid(problem) {
            pool.push(scattered);
        }
    }

    if pool.is_empty() {
        pool.push(current.clone());
    }
    pool
}

/// Moves up to half of `src`'s tasks to random positions in random other
/// routes. The two occurrences of a moved task land at independent
/// positions; whichever comes first becomes the pickup.
fn scatter<T: Topology, R: Rng>(
    problem: &Problem<T>,
    current: &Assignment,
    src: VehicleId,
    rng: &mut R,
) -> Assignment {
    let mut routes = current.routes().to_vec();
    let moves = rng.random_range(0..routes[src].len() / 2);

    for _ in 0..moves {
        if routes[src].is_empty() {
            break;
        }
        let task = routes[src][rng.random_range(0..routes[src].len())];
        let dst = loop {
            let d = rng.random_range(0..routes.len());
            if d != src {
                break d;
            }
        };

        routes[src].retain(|&t| t != task);
        let first = rng.random_range(0..=routes[dst].len());
        routes[dst].insert(first, task);
        let second = rng.random_range(0..=routes[dst].len());
        routes[dst].insert(second, task);
    }

    Assignment::from_routes(routes, problem)
}
