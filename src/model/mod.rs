//! Domain model: tasks, vehicles, topology oracle, problem instance,
//! and the executable plans the solver emits.

mod plan;
mod problem;
mod topology;
mod types;

pub use plan::{Action, VehiclePlan};
pub use problem::Problem;
pub use topology::{MatrixTopology, Topology};
pub use types::{LocationId, Task, TaskId, Vehicle, VehicleId};
