//! Executable per-vehicle plans emitted by the solver.

use super::types::{LocationId, TaskId, VehicleId};

/// One step of a vehicle's plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Action {
    /// Drive to an adjacent location.
    Move(LocationId),
    /// Collect the task's load at the current location.
    Pickup(TaskId),
    /// Drop the task's load at the current location.
    Deliver(TaskId),
}

/// The ordered action sequence one vehicle executes.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VehiclePlan {
    /// The vehicle this plan belongs to.
    pub vehicle: VehicleId,
    /// Moves interleaved with pickups and deliveries, in execution order.
    pub actions: Vec<Action>,
}

impl VehiclePlan {
    /// Creates an empty plan for a vehicle.
    pub fn new(vehicle: VehicleId) -> Self {
        Self {
            vehicle,
            actions: Vec::new(),
        }
    }

    /// Task ids in the order their pickups appear.
    pub fn pickups(&self) -> impl Iterator<Item = TaskId> + '_ {
        self.actions.iter().filter_map(|a| match a {
            Action::Pickup(t) => Some(*t),
            _ => None,
        })
    }

    /// Task ids in the order their deliveries appear.
    pub fn deliveries(&self) -> impl Iterator<Item = TaskId> + '_ {
        self.actions.iter().filter_map(|a| match a {
            Action::Deliver(t) => Some(*t),
            _ => None,
        })
    }
}
