//! Pickup-and-delivery fleet routing via staged population stochastic
//! local search.
//!
//! Given a fixed set of pickup-and-delivery tasks and a fleet of
//! capacity-constrained vehicles, the solver produces the lowest-cost
//! feasible routing it can find within a bounded search effort:
//!
//! - **Model** ([`model`]): immutable [`Task`](model::Task) and
//!   [`Vehicle`](model::Vehicle) records, a pluggable
//!   [`Topology`](model::Topology) distance/path oracle, and the
//!   executable [`VehiclePlan`](model::VehiclePlan)s the solver emits.
//! - **Assignment** ([`assignment`]): the candidate-solution
//!   representation (one stop sequence per vehicle, first occurrence of
//!   a task id is its pickup, the second its delivery) with cost,
//!   validity checking, and the relocate/reorder/shuffle/scatter
//!   perturbation operators.
//! - **Search** ([`search`]): a staged population of independently
//!   seeded local-search lineages. Each generation refines every
//!   lineage, then keeps the cheaper half with a doubled per-lineage
//!   budget, concentrating effort on promising starting points.
//!
//! Randomness is always explicit: the runner seeds one generator per
//! call and derives an independent stream per lineage, so runs are
//! reproducible and lineages can be refined in parallel without
//! changing the outcome.
//!
//! # Example
//!
//! ```
//! use haulplan::model::{MatrixTopology, Task, Vehicle};
//! use haulplan::{optimize, SearchConfig};
//!
//! let topology = MatrixTopology::from_edges(3, &[(0, 1, 5.0), (1, 2, 4.0)]);
//! let tasks = vec![Task::new(0, 0, 1, 4, 100), Task::new(1, 1, 2, 4, 100)];
//! let vehicles = vec![Vehicle::new(0, 0, 10, 1.0)];
//!
//! let config = SearchConfig::default().with_stages(4).with_seed(7);
//! let result = optimize(tasks, vehicles, topology, &config)?;
//! assert!(result.best_cost <= 9.0 + 1e-9);
//! # Ok::<(), haulplan::SolveError>(())
//! ```

pub mod assignment;
pub mod error;
pub mod model;
pub mod search;

pub use error::SolveError;
pub use search::{optimize, SearchConfig, SearchResult, SearchRunner};
