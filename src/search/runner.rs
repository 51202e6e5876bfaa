//! Staged population search loop.
//!
//! The driver seeds `2^stages` independent lineages, refines each
//! through a local-search loop (neighbor generation + acceptance), then
//! sorts by cost and keeps the better half. Every surviving generation
//! receives twice the per-lineage iteration budget of the previous one,
//! so refinement effort concentrates on lineages that already look
//! promising. Lineages never share mutable state; each owns a seeded
//! random stream, which makes sequential and parallel evaluation produce
//! identical results.

use std::cmp::Ordering;
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};
use std::sync::Arc;
use std::time::Instant;

use rand::seq::{IndexedRandom, SliceRandom};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use tracing::{debug, info};

use super::choice::local_choice;
use super::config::SearchConfig;
use crate::assignment::{neighbors, Assignment};
use crate::error::SolveError;
use crate::model::{Problem, TaskId, Topology, VehicleId, VehiclePlan};

/// Random permutations tried per route during seeding before falling
/// back to the pickup-immediately-delivered ordering.
const SEED_SHUFFLE_RETRIES: usize = 64;

/// Outcome of a full search run.
#[derive(Debug, Clone)]
pub struct SearchResult {
    /// Executable plan for every vehicle, indexed by vehicle id.
    pub plans: Vec<VehiclePlan>,

    /// Travel cost of the winning assignment.
    pub best_cost: f64,

    /// Total local-search steps executed across all lineages.
    pub iterations: usize,

    /// Generations completed (including a truncated final one).
    pub generations: usize,

    /// Population minimum cost after seeding and after each generation.
    /// Non-increasing.
    pub cost_history: Vec<f64>,

    /// Whether the wall-clock deadline cut the search short.
    pub deadline_hit: bool,

    /// Whether the cancellation token cut the search short.
    pub cancelled: bool,
}

/// What one lineage reports back after a refinement round.
struct LineageOutcome {
    best: Assignment,
    steps: usize,
    deadline_hit: bool,
    cancelled: bool,
}

/// Executes the staged population search.
pub struct SearchRunner;

impl SearchRunner {
    /// Runs the search to completion (or deadline).
    pub fn run<T: Topology>(
        problem: &Problem<T>,
        config: &SearchConfig,
    ) -> Result<SearchResult, SolveError> {
        Self::run_with_cancel(problem, config, None)
    }

    /// Runs the search with an optional cancellation token.
    ///
    /// When the flag flips to `true`, every lineage stops at its next
    /// iteration boundary and the best assignment found so far is
    /// returned, exactly as with an expired deadline.
    pub fn run_with_cancel<T: Topology>(
        problem: &Problem<T>,
        config: &SearchConfig,
        cancel: Option<Arc<AtomicBool>>,
    ) -> Result<SearchResult, SolveError> {
        config.validate().map_err(SolveError::InvalidConfig)?;
        check_feasible(problem)?;

        let seed = config.seed.unwrap_or_else(rand::random);
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let deadline = config.deadline.map(|d| Instant::now() + d);
        let cancel = cancel.as_deref();

        if problem.tasks().is_empty() {
            let idle = Assignment::empty(problem.vehicles().len());
            return Ok(SearchResult {
                plans: idle.to_plans(problem),
                best_cost: 0.0,
                iterations: 0,
                generations: 0,
                cost_history: vec![0.0],
                deadline_hit: false,
                cancelled: false,
            });
        }

        let stages = config.stages as usize;
        let population_size = 1usize << stages;
        info!(
            population = population_size,
            iterations = config.iterations,
            tasks = problem.tasks().len(),
            fleet = problem.vehicles().len(),
            "seeding population"
        );

        let mut population: Vec<Assignment> = (0..population_size)
            .map(|_| seed_assignment(problem, &mut rng))
            .collect();

        let mut cost_history = vec![population_min(&population)];
        let mut total_steps = 0usize;
        let mut generations = 0usize;
        let mut deadline_hit = false;
        let mut cancelled = false;

        // With 0 stages the single seed still gets the full budget.
        let rounds = stages.max(1);
        for s in 0..rounds {
            let budget = if stages == 0 {
                config.iterations
            } else {
                config.iterations / (1usize << (stages - s - 1))
            };
            let streams: Vec<u64> = (0..population.len()).map(|_| rng.random()).collect();
            let lineages: Vec<(Assignment, u64)> = population.drain(..).zip(streams).collect();

            let refine = |(start, stream): (Assignment, u64)| {
                refine_lineage(
                    problem,
                    start,
                    budget,
                    config.p_random,
                    stream,
                    deadline,
                    cancel,
                )
            };
            let outcomes: Vec<LineageOutcome> = if config.parallel {
                lineages.into_par_iter().map(refine).collect()
            } else {
                lineages.into_iter().map(refine).collect()
            };

            for outcome in &outcomes {
                total_steps += outcome.steps;
                deadline_hit |= outcome.deadline_hit;
                cancelled |= outcome.cancelled;
            }
            population = outcomes.into_iter().map(|o| o.best).collect();

            population.sort_by(|a, b| {
                a.cost().partial_cmp(&b.cost()).unwrap_or(Ordering::Equal)
            });
            let survivors = if stages == 0 {
                1
            } else {
                1usize << (stages - s - 1)
            };
            population.truncate(survivors);
            generations += 1;

            cost_history.push(population[0].cost());
            debug!(
                generation = generations,
                survivors,
                budget,
                best_cost = population[0].cost(),
                "generation complete"
            );

            if deadline_hit || cancelled {
                break;
            }
        }

        let best = population
            .into_iter()
            .next()
            .expect("population is never empty");
        info!(
            best_cost = best.cost(),
            steps = total_steps,
            deadline_hit,
            cancelled,
            "search complete"
        );

        Ok(SearchResult {
            plans: best.to_plans(problem),
            best_cost: best.cost(),
            iterations: total_steps,
            generations,
            cost_history,
            deadline_hit,
            cancelled,
        })
    }
}

/// Advances one lineage through up to `budget` local-search steps,
/// tracking the cheapest assignment it visits. The start counts as
/// visited, so the outcome never costs more than the start.
fn refine_lineage<T: Topology>(
    problem: &Problem<T>,
    start: Assignment,
    budget: usize,
    p_random: f64,
    stream: u64,
    deadline: Option<Instant>,
    cancel: Option<&AtomicBool>,
) -> LineageOutcome {
    let mut rng = ChaCha8Rng::seed_from_u64(stream);
    let mut best = start.clone();
    let mut current = start;
    let mut steps = 0usize;
    let mut deadline_hit = false;
    let mut cancelled = false;

    for _ in 0..budget {
        if cancel.is_some_and(|flag| flag.load(AtomicOrdering::Relaxed)) {
            cancelled = true;
            break;
        }
        if deadline.is_some_and(|limit| Instant::now() >= limit) {
            deadline_hit = true;
            break;
        }

        let pool = neighbors(problem, &current, &mut rng);
        if let Some(next) = local_choice(&pool, p_random, &mut rng) {
            current = next;
        }
        if current.cost() < best.cost() {
            best = current.clone();
        }
        steps += 1;
    }

    LineageOutcome {
        best,
        steps,
        deadline_hit,
        cancelled,
    }
}

/// Builds one random seed assignment: every task goes to a uniformly
/// random vehicle that can carry it, then each route is shuffled until
/// the shuffle respects that vehicle's capacity.
fn seed_assignment<T: Topology, R: Rng>(problem: &Problem<T>, rng: &mut R) -> Assignment {
    let fleet = problem.vehicles();
    let mut routes: Vec<Vec<TaskId>> = vec![Vec::new(); fleet.len()];

    for task in problem.tasks() {
        let carriers: Vec<VehicleId> = fleet
            .iter()
            .filter(|v| v.capacity >= task.weight)
            .map(|v| v.id)
            .collect();
        let v = *carriers
            .choose(rng)
            .expect("feasibility is checked before seeding");
        routes[v].splice(0..0, [task.id, task.id]);
    }

    for (v, route) in routes.iter_mut().enumerate() {
        let capacity = fleet[v].capacity;
        let mut fits = false;
        for _ in 0..SEED_SHUFFLE_RETRIES {
            route.shuffle(rng);
            if route_fits(problem, route, capacity) {
                fits = true;
                break;
            }
        }
        if !fits {
            // Deliver each task right after its pickup; with every task
            // individually within capacity this ordering always fits.
            let mut order: Vec<TaskId> = Vec::with_capacity(route.len() / 2);
            for &t in route.iter() {
                if !order.contains(&t) {
                    order.push(t);
                }
            }
            route.clear();
            for t in order {
                route.extend([t, t]);
            }
        }
    }

    Assignment::from_routes(routes, problem)
}

/// Whether a single route stays within `capacity` at every stop.
fn route_fits<T: Topology>(problem: &Problem<T>, route: &[TaskId], capacity: u32) -> bool {
    let mut onboard: Vec<TaskId> = Vec::new();
    let mut load = 0u32;
    for &t in route {
        if let Some(pos) = onboard.iter().position(|&x| x == t) {
            onboard.swap_remove(pos);
            load -= problem.task(t).weight;
        } else {
            onboard.push(t);
            load += problem.task(t).weight;
            if load > capacity {
                return false;
            }
        }
    }
    true
}

/// Rejects problems where some task outweighs every vehicle.
fn check_feasible<T: Topology>(problem: &Problem<T>) -> Result<(), SolveError> {
    if problem.tasks().is_empty() {
        return Ok(());
    }
    let max_capacity = problem.max_capacity();
    for task in problem.tasks() {
        if task.weight > max_capacity {
            return Err(SolveError::Infeasible {
                task: task.id,
                weight: task.weight,
                max_capacity,
            });
        }
    }
    Ok(())
}

fn population_min(population: &[Assignment]) -> f64 {
    population
        .iter()
        .map(Assignment::cost)
        .fold(f64::INFINITY, f64::min)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Action, MatrixTopology, Task, Vehicle};
    use proptest::prelude::*;
    use std::time::Duration;

    /// Lets `RUST_LOG=debug cargo test` show the search progress.
    fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .try_init();
    }

    // A -- B -- C with unit edges.
    fn chain_problem() -> Problem<MatrixTopology> {
        let topo = MatrixTopology::from_edges(3, &[(0, 1, 1.0), (1, 2, 1.0)]);
        let tasks = vec![Task::new(0, 0, 1, 4, 10), Task::new(1, 1, 2, 4, 10)];
        let vehicles = vec![Vehicle::new(0, 0, 10, 1.0)];
        Problem::new(tasks, vehicles, topo)
    }

    /// Routes as the sequence of stop actions each plan executes.
    fn routes_from_plans(plans: &[VehiclePlan]) -> Vec<Vec<TaskId>> {
        plans
            .iter()
            .map(|plan| {
                plan.actions
                    .iter()
                    .filter_map(|action| match action {
                        Action::Pickup(t) | Action::Deliver(t) => Some(*t),
                        Action::Move(_) => None,
                    })
                    .collect()
            })
            .collect()
    }

    #[test]
    fn test_two_task_chain_reaches_brute_force_optimum() {
        init_tracing();
        let problem = chain_problem();

        // All orderings of the single vehicle's four stops.
        let orderings = [
            vec![0, 0, 1, 1],
            vec![0, 1, 0, 1],
            vec![0, 1, 1, 0],
            vec![1, 0, 0, 1],
            vec![1, 0, 1, 0],
            vec![1, 1, 0, 0],
        ];
        let brute_force = orderings
            .iter()
            .map(|route| Assignment::from_routes(vec![route.clone()], &problem))
            .filter(|a| a.is_valid(&problem))
            .map(|a| a.cost())
            .fold(f64::INFINITY, f64::min);
        assert!((brute_force - 2.0).abs() < 1e-12);

        let config = SearchConfig::default()
            .with_stages(3)
            .with_iterations(400)
            .with_seed(42)
            .with_parallel(false);
        let result = SearchRunner::run(&problem, &config).unwrap();

        assert!((result.best_cost - brute_force).abs() < 1e-9);
    }

    #[test]
    fn test_infeasible_task_reported() {
        let topo = MatrixTopology::from_edges(2, &[(0, 1, 1.0)]);
        let tasks = vec![Task::new(0, 0, 1, 8, 10)];
        let vehicles = vec![Vehicle::new(0, 0, 5, 1.0), Vehicle::new(1, 1, 5, 1.0)];
        let problem = Problem::new(tasks, vehicles, topo);

        let err = SearchRunner::run(&problem, &SearchConfig::default()).unwrap_err();
        assert_eq!(
            err,
            SolveError::Infeasible {
                task: 0,
                weight: 8,
                max_capacity: 5,
            }
        );
    }

    #[test]
    fn test_empty_fleet_with_tasks_is_infeasible() {
        let topo = MatrixTopology::from_edges(2, &[(0, 1, 1.0)]);
        let tasks = vec![Task::new(0, 0, 1, 1, 10)];
        let problem = Problem::new(tasks, vec![], topo);

        let err = SearchRunner::run(&problem, &SearchConfig::default()).unwrap_err();
        assert!(matches!(err, SolveError::Infeasible { max_capacity: 0, .. }));
    }

    #[test]
    fn test_zero_deadline_still_returns_valid_assignment() {
        let problem = chain_problem();
        let config = SearchConfig::default()
            .with_stages(2)
            .with_iterations(1000)
            .with_seed(7)
            .with_deadline(Duration::ZERO)
            .with_parallel(false);

        let result = SearchRunner::run(&problem, &config).unwrap();
        assert!(result.deadline_hit);
        assert_eq!(result.iterations, 0);

        let rebuilt = Assignment::from_routes(routes_from_plans(&result.plans), &problem);
        assert!(rebuilt.is_valid(&problem));
        assert!((rebuilt.cost() - result.best_cost).abs() < 1e-9);
    }

    #[test]
    fn test_cancellation_before_start_returns_seeds() {
        let problem = chain_problem();
        let config = SearchConfig::default()
            .with_stages(2)
            .with_iterations(1000)
            .with_seed(7)
            .with_parallel(false);
        let cancel = Arc::new(AtomicBool::new(true));

        let result = SearchRunner::run_with_cancel(&problem, &config, Some(cancel)).unwrap();
        assert!(result.cancelled);
        assert_eq!(result.iterations, 0);

        let rebuilt = Assignment::from_routes(routes_from_plans(&result.plans), &problem);
        assert!(rebuilt.is_valid(&problem));
    }

    #[test]
    fn test_cost_history_is_non_increasing() {
        let topo = MatrixTopology::from_edges(
            5,
            &[(0, 1, 2.0), (1, 2, 1.0), (2, 3, 3.0), (3, 4, 1.0), (0, 4, 5.0)],
        );
        let tasks = vec![
            Task::new(0, 0, 3, 3, 10),
            Task::new(1, 1, 4, 2, 10),
            Task::new(2, 2, 0, 4, 10),
            Task::new(3, 4, 1, 1, 10),
        ];
        let vehicles = vec![Vehicle::new(0, 0, 8, 1.0), Vehicle::new(1, 2, 6, 2.0)];
        let problem = Problem::new(tasks, vehicles, topo);

        let config = SearchConfig::default()
            .with_stages(4)
            .with_iterations(200)
            .with_seed(13)
            .with_parallel(false);
        let result = SearchRunner::run(&problem, &config).unwrap();

        assert_eq!(result.cost_history.len(), 5);
        for window in result.cost_history.windows(2) {
            assert!(
                window[1] <= window[0] + 1e-9,
                "population minimum increased: {} -> {}",
                window[0],
                window[1]
            );
        }
    }

    #[test]
    fn test_same_seed_reproduces_run() {
        let problem = chain_problem();
        let config = SearchConfig::default()
            .with_stages(2)
            .with_iterations(60)
            .with_seed(99)
            .with_parallel(false);

        let a = SearchRunner::run(&problem, &config).unwrap();
        let b = SearchRunner::run(&problem, &config).unwrap();
        assert_eq!(a.plans, b.plans);
        assert!((a.best_cost - b.best_cost).abs() < 1e-15);
        assert_eq!(a.cost_history, b.cost_history);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let problem = chain_problem();
        let base = SearchConfig::default()
            .with_stages(3)
            .with_iterations(80)
            .with_seed(5);

        let sequential =
            SearchRunner::run(&problem, &base.clone().with_parallel(false)).unwrap();
        let parallel = SearchRunner::run(&problem, &base.with_parallel(true)).unwrap();
        assert!((sequential.best_cost - parallel.best_cost).abs() < 1e-15);
        assert_eq!(sequential.plans, parallel.plans);
    }

    #[test]
    fn test_zero_stages_refines_single_lineage() {
        let problem = chain_problem();
        let config = SearchConfig::default()
            .with_stages(0)
            .with_iterations(300)
            .with_seed(21)
            .with_parallel(false);

        let result = SearchRunner::run(&problem, &config).unwrap();
        assert_eq!(result.generations, 1);
        assert!((result.best_cost - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_no_tasks_yields_idle_plans() {
        let topo = MatrixTopology::from_edges(2, &[(0, 1, 1.0)]);
        let vehicles = vec![Vehicle::new(0, 0, 5, 1.0), Vehicle::new(1, 1, 5, 1.0)];
        let problem = Problem::new(vec![], vehicles, topo);

        let result = SearchRunner::run(&problem, &SearchConfig::default()).unwrap();
        assert!((result.best_cost).abs() < 1e-15);
        assert_eq!(result.plans.len(), 2);
        assert!(result.plans.iter().all(|p| p.actions.is_empty()));
    }

    #[test]
    fn test_seed_assignments_are_valid() {
        let topo = MatrixTopology::from_edges(4, &[(0, 1, 1.0), (1, 2, 1.0), (2, 3, 1.0)]);
        let tasks = vec![
            Task::new(0, 0, 2, 5, 10),
            Task::new(1, 1, 3, 3, 10),
            Task::new(2, 3, 0, 6, 10),
            Task::new(3, 2, 1, 2, 10),
        ];
        // Vehicle 1 cannot carry tasks 0 and 2 at all.
        let vehicles = vec![Vehicle::new(0, 0, 9, 1.0), Vehicle::new(1, 3, 4, 1.0)];
        let problem = Problem::new(tasks, vehicles, topo);

        let mut rng = ChaCha8Rng::seed_from_u64(31);
        for _ in 0..100 {
            let seeded = seed_assignment(&problem, &mut rng);
            assert!(seeded.is_valid(&problem));
        }
    }

    proptest! {
        #[test]
        fn prop_optimize_covers_every_task_exactly_twice(
            raw_tasks in prop::collection::vec((0usize..4, 0usize..4, 1u32..=6u32), 1..5),
            raw_vehicles in prop::collection::vec((0usize..4, 6u32..=12u32), 1..3),
            seed in any::<u64>(),
        ) {
            let topo = MatrixTopology::from_edges(
                4,
                &[(0, 1, 1.0), (1, 2, 1.0), (2, 3, 1.0)],
            );
            let tasks: Vec<Task> = raw_tasks
                .iter()
                .enumerate()
                .map(|(i, &(p, d, w))| Task::new(i, p, d, w, 1))
                .collect();
            let vehicles: Vec<Vehicle> = raw_vehicles
                .iter()
                .enumerate()
                .map(|(i, &(home, cap))| Vehicle::new(i, home, cap, 1.0))
                .collect();
            let n_tasks = tasks.len();
            let problem = Problem::new(tasks, vehicles, topo);

            let config = SearchConfig::default()
                .with_stages(2)
                .with_iterations(20)
                .with_seed(seed)
                .with_parallel(false);
            let result = SearchRunner::run(&problem, &config).unwrap();

            let routes = routes_from_plans(&result.plans);
            let rebuilt = Assignment::from_routes(routes.clone(), &problem);
            prop_assert!(rebuilt.is_valid(&problem));

            let mut occurrences = vec![0usize; n_tasks];
            for route in &routes {
                for &t in route {
                    occurrences[t] += 1;
                }
            }
            prop_assert!(occurrences.iter().all(|&c| c == 2));
        }

        #[test]
        fn prop_neighbors_of_random_seeds_are_valid(
            raw_tasks in prop::collection::vec((0usize..4, 0usize..4, 1u32..=6u32), 1..5),
            seed in any::<u64>(),
        ) {
            let topo = MatrixTopology::from_edges(
                4,
                &[(0, 1, 1.0), (1, 2, 1.0), (2, 3, 1.0)],
            );
            let tasks: Vec<Task> = raw_tasks
                .iter()
                .enumerate()
                .map(|(i, &(p, d, w))| Task::new(i, p, d, w, 1))
                .collect();
            let vehicles = vec![Vehicle::new(0, 0, 10, 1.0), Vehicle::new(1, 2, 7, 1.0)];
            let problem = Problem::new(tasks, vehicles, topo);

            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let seeded = seed_assignment(&problem, &mut rng);
            prop_assert!(seeded.is_valid(&problem));

            for neighbor in neighbors(&problem, &seeded, &mut rng) {
                prop_assert!(neighbor.is_valid(&problem));
            }
        }
    }
}
