//! The shared read-only context every candidate solution is evaluated
//! against: the task set, the fleet, and the topology oracle.

use super::topology::Topology;
use super::types::{Task, TaskId, Vehicle, VehicleId};

/// A fixed pickup-and-delivery problem instance.
///
/// Owns the task list, the fleet, and the topology. All solver state
/// (assignments, candidate pools, populations) borrows this immutably,
/// which is what makes lineage-parallel refinement safe.
#[derive(Debug)]
pub struct Problem<T: Topology> {
    tasks: Vec<Task>,
    vehicles: Vec<Vehicle>,
    topology: T,
}

impl<T: Topology> Problem<T> {
    /// Bundles tasks, vehicles, and a topology into a problem instance.
    ///
    /// # Panics
    /// Panics if task or vehicle ids are not dense indices into their
    /// respective lists.
    pub fn new(tasks: Vec<Task>, vehicles: Vec<Vehicle>, topology: T) -> Self {
        for (i, task) in tasks.iter().enumerate() {
            assert_eq!(task.id, i, "task ids must be dense indices");
        }
        for (i, vehicle) in vehicles.iter().enumerate() {
            assert_eq!(vehicle.id, i, "vehicle ids must be dense indices");
        }
        Self {
            tasks,
            vehicles,
            topology,
        }
    }

    /// All tasks under consideration.
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    /// The fleet.
    pub fn vehicles(&self) -> &[Vehicle] {
        &self.vehicles
    }

    /// The distance/path oracle.
    pub fn topology(&self) -> &T {
        &self.topology
    }

    /// A task by id.
    pub fn task(&self, id: TaskId) -> &Task {
        &self.tasks[id]
    }

    /// A vehicle by id.
    pub fn vehicle(&self, id: VehicleId) -> &Vehicle {
        &self.vehicles[id]
    }

    /// The largest capacity in the fleet, or 0 for an empty fleet.
    pub fn max_capacity(&self) -> u32 {
        self.vehicles.iter().map(|v| v.capacity).max().unwrap_or(0)
    }
}
