//! Staged population stochastic local search.
//!
//! The search machinery splits into the acceptance rule
//! ([`local_choice`]), the configuration ([`SearchConfig`]), and the
//! population driver ([`SearchRunner`]).

mod choice;
mod config;
mod runner;

pub use choice::local_choice;
pub use config::SearchConfig;
pub use runner::{SearchResult, SearchRunner};

use crate::error::SolveError;
use crate::model::{Problem, Task, Topology, Vehicle};

/// One-call entry point: builds the problem instance and runs the
/// staged search.
///
/// Returns the per-vehicle plans and the winning assignment's cost
/// inside a [`SearchResult`].
pub fn optimize<T: Topology>(
    tasks: Vec<Task>,
    vehicles: Vec<Vehicle>,
    topology: T,
    config: &SearchConfig,
) -> Result<SearchResult, SolveError> {
    let problem = Problem::new(tasks, vehicles, topology);
    SearchRunner::run(&problem, config)
}
