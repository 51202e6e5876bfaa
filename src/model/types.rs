//! Immutable domain records: tasks and vehicles.
//!
//! Both records are supplied by the caller and never mutated by the
//! solver. Ids are dense indices: `tasks[i].id == i` and
//! `vehicles[i].id == i`, which lets routes store plain task indices.

/// Index of a task within the problem's task list.
pub type TaskId = usize;

/// Index of a vehicle within the problem's fleet.
pub type VehicleId = usize;

/// Index of a location within the topology.
pub type LocationId = usize;

/// A pickup-and-delivery request.
///
/// The load of `weight` is collected at `pickup` and dropped at
/// `delivery`. `reward` is what the customer pays for the task; it is
/// carried for callers (e.g. bidding logic) but never read by the
/// optimizer, which minimizes travel cost for a fixed task set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Task {
    /// Dense task index.
    pub id: TaskId,
    /// Where the load is collected.
    pub pickup: LocationId,
    /// Where the load is dropped.
    pub delivery: LocationId,
    /// Load weight, in the same unit as vehicle capacity.
    pub weight: u32,
    /// Payment for completing the task.
    pub reward: u64,
}

impl Task {
    /// Creates a task record.
    pub fn new(
        id: TaskId,
        pickup: LocationId,
        delivery: LocationId,
        weight: u32,
        reward: u64,
    ) -> Self {
        Self {
            id,
            pickup,
            delivery,
            weight,
            reward,
        }
    }
}

/// A capacity-constrained vehicle.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Vehicle {
    /// Dense vehicle index.
    pub id: VehicleId,
    /// Starting location of every route this vehicle drives.
    pub home: LocationId,
    /// Maximum load carried at any moment.
    pub capacity: u32,
    /// Travel cost per distance unit.
    pub cost_per_km: f64,
}

impl Vehicle {
    /// Creates a vehicle record.
    pub fn new(id: VehicleId, home: LocationId, capacity: u32, cost_per_km: f64) -> Self {
        Self {
            id,
            home,
            capacity,
            cost_per_km,
        }
    }
}
