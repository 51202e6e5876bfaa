//! Candidate solution state: one ordered stop sequence per vehicle.
//!
//! A route stores each task id twice; the first occurrence is the pickup
//! stop, the second the delivery stop. Every operator produces a fresh
//! [`Assignment`] with fully independent route containers, so a derived
//! candidate can never alias its parent's routes.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::model::{Action, Problem, TaskId, Topology, VehicleId, VehiclePlan};

/// One candidate routing of all tasks across the fleet.
///
/// The travel cost is computed once at construction and cached, so
/// population sorting and tie-breaking never re-walk routes.
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    routes: Vec<Vec<TaskId>>,
    cost: f64,
}

impl Assignment {
    /// An assignment with an empty route for every vehicle.
    pub fn empty(fleet_size: usize) -> Self {
        Self {
            routes: vec![Vec::new(); fleet_size],
            cost: 0.0,
        }
    }

    /// Builds an assignment from explicit routes, costing them against
    /// the problem's topology.
    pub fn from_routes<T: Topology>(routes: Vec<Vec<TaskId>>, problem: &Problem<T>) -> Self {
        let cost = routes
            .iter()
            .enumerate()
            .map(|(v, route)| route_cost(problem, v, route))
            .sum();
        Self { routes, cost }
    }

    /// One route per vehicle, indexed by vehicle id.
    pub fn routes(&self) -> &[Vec<TaskId>] {
        &self.routes
    }

    /// A single vehicle's route.
    pub fn route(&self, vehicle: VehicleId) -> &[TaskId] {
        &self.routes[vehicle]
    }

    /// Total travel cost across the fleet.
    ///
    /// Pure function of the routes; cached at construction.
    pub fn cost(&self) -> f64 {
        self.cost
    }

    /// Checks coverage, pickup-before-delivery pairing, capacity, and
    /// route closure.
    ///
    /// Fails the moment a route's accumulated load exceeds its vehicle's
    /// capacity; closure (nothing left onboard) is judged only after the
    /// full route scan.
    pub fn is_valid<T: Topology>(&self, problem: &Problem<T>) -> bool {
        let n_tasks = problem.tasks().len();
        if self.routes.len() != problem.vehicles().len() {
            return false;
        }

        let mut occurrences = vec![0u8; n_tasks];
        for (v, route) in self.routes.iter().enumerate() {
            let capacity = problem.vehicle(v).capacity;
            let mut onboard: Vec<TaskId> = Vec::new();
            let mut load: u32 = 0;

            for &t in route {
                if t >= n_tasks {
                    return false;
                }
                occurrences[t] = occurrences[t].saturating_add(1);

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

            if !onboard.is_empty() {
                return false;
            }
        }

        occurrences.iter().all(|&c| c == 2)
    }

    /// Moves the first task of `src`'s route to the front of `dst`'s
    /// route, pickup immediately followed by delivery.
    ///
    /// # Panics
    /// Panics if `src`'s route is empty.
    pub fn relocate<T: Topology>(
        &self,
        problem: &Problem<T>,
        src: VehicleId,
        dst: VehicleId,
    ) -> Self {
        let task = self.routes[src][0];
        let mut routes = self.routes.clone();
        routes[src].retain(|&t| t != task);
        routes[dst].splice(0..0, [task, task]);
        Self::from_routes(routes, problem)
    }

    /// Swaps the stops at positions `i` and `j` of a vehicle's route.
    pub fn swap_stops<T: Topology>(
        &self,
        problem: &Problem<T>,
        vehicle: VehicleId,
        i: usize,
        j: usize,
    ) -> Self {
        let mut routes = self.routes.clone();
        routes[vehicle].swap(i, j);
        Self::from_routes(routes, problem)
    }

    /// Randomly permutes one vehicle's entire route.
    pub fn shuffle_route<T: Topology, R: Rng>(
        &self,
        problem: &Problem<T>,
        vehicle: VehicleId,
        rng: &mut R,
    ) -> Self {
        let mut routes = self.routes.clone();
        routes[vehicle].shuffle(rng);
        Self::from_routes(routes, problem)
    }

    /// Expands the routes into executable per-vehicle plans, splicing in
    /// the topology's hop-by-hop paths between consecutive stops.
    pub fn to_plans<T: Topology>(&self, problem: &Problem<T>) -> Vec<VehiclePlan> {
        self.routes
            .iter()
            .enumerate()
            .map(|(v, route)| {
                let topo = problem.topology();
                let mut plan = VehiclePlan::new(v);
                let mut at = problem.vehicle(v).home;
                let mut onboard: Vec<TaskId> = Vec::new();

                for &t in route {
                    let (dest, stop) = if let Some(pos) = onboard.iter().position(|&x| x == t) {
                        onboard.swap_remove(pos);
                        (problem.task(t).delivery, Action::Deliver(t))
                    } else {
                        onboard.push(t);
                        (problem.task(t).pickup, Action::Pickup(t))
                    };
                    for hop in topo.path(at, dest) {
                        plan.actions.push(Action::Move(hop));
                    }
                    at = dest;
                    plan.actions.push(stop);
                }
                plan
            })
            .collect()
    }
}

/// Costs one vehicle's route from its home location: the first occurrence
/// of a task id heads to its pickup, the second to its delivery.
fn route_cost<T: Topology>(problem: &Problem<T>, vehicle: VehicleId, route: &[TaskId]) -> f64 {
    let v = problem.vehicle(vehicle);
    let topo = problem.topology();
    let mut onboard: Vec<TaskId> = Vec::new();
    let mut at = v.home;
    let mut sum = 0.0;

    for &t in route {
        let dest = if let Some(pos) = onboard.iter().position(|&x| x == t) {
            onboard.swap_remove(pos);
            problem.task(t).delivery
        } else {
            onboard.push(t);
            problem.task(t).pickup
        };
        sum += v.cost_per_km * topo.distance(at, dest);
        at = dest;
    }
    sum
}
