//! Location oracle: distances and concrete travel paths.
//!
//! The solver itself only needs [`Topology::distance`] to cost a route;
//! [`Topology::path`] is used once, when the winning assignment is
//! expanded into executable move sequences. Implementations must be
//! `Send + Sync` so lineages can be refined in parallel against a shared
//! problem.

use super::types::LocationId;

/// Distance and path oracle over a fixed set of locations.
pub trait Topology: Send + Sync {
    /// Travel distance from `a` to `b`.
    fn distance(&self, a: LocationId, b: LocationId) -> f64;

    /// Hop-by-hop route from `a` to `b`, excluding `a` and including `b`.
    ///
    /// Returns an empty sequence when `a == b`.
    fn path(&self, a: LocationId, b: LocationId) -> Vec<LocationId>;
}

/// Dense-matrix topology with optional shortest-path reconstruction.
///
/// Built either from a complete distance matrix (every pair is one hop)
/// or from a weighted edge list, in which case all-pairs shortest paths
/// are precomputed with Floyd-Warshall and [`Topology::path`] returns
/// the intermediate hops of the shortest route.
#[derive(Debug, Clone)]
pub struct MatrixTopology {
    n: usize,
    dist: Vec<f64>,
    // next[a * n + b] = first hop on the shortest a -> b route.
    // None when the matrix was supplied directly (single-hop paths).
    next: Option<Vec<LocationId>>,
}

impl MatrixTopology {
    /// Builds a topology from a full distance matrix.
    ///
    /// Every pair of locations is directly connected; paths are single
    /// hops. The matrix must be square with a zero diagonal.
    ///
    /// # Panics
    /// Panics if the matrix is not square.
    pub fn from_matrix(matrix: Vec<Vec<f64>>) -> Self {
        let n = matrix.len();
        let mut dist = Vec::with_capacity(n * n);
        for row in &matrix {
            assert_eq!(row.len(), n, "distance matrix must be square");
            dist.extend_from_slice(row);
        }
        Self {
            n,
            dist,
            next: None,
        }
    }

    /// Builds a topology from undirected weighted edges over `n` locations.
    ///
    /// Runs Floyd-Warshall to derive all-pairs shortest distances and the
    /// next-hop table used for path reconstruction. Unreachable pairs get
    /// infinite distance and an empty path.
    pub fn from_edges(n: usize, edges: &[(LocationId, LocationId, f64)]) -> Self {
        let idx = |a: usize, b: usize| a * n + b;
        let mut dist = vec![f64::INFINITY; n * n];
        let mut next = vec![usize::MAX; n * n];

        for a in 0..n {
            dist[idx(a, a)] = 0.0;
            next[idx(a, a)] = a;
        }
        for &(a, b, w) in edges {
            if w < dist[idx(a, b)] {
                dist[idx(a, b)] = w;
                dist[idx(b, a)] = w;
                next[idx(a, b)] = b;
                next[idx(b, a)] = a;
            }
        }

        for k in 0..n {
            for a in 0..n {
                let d_ak = dist[idx(a, k)];
                if d_ak.is_infinite() {
                    continue;
                }
                for b in 0..n {
                    let through = d_ak + dist[idx(k, b)];
                    if through < dist[idx(a, b)] {
                        dist[idx(a, b)] = through;
                        next[idx(a, b)] = next[idx(a, k)];
                    }
                }
            }
        }

        Self {
            n,
            dist,
            next: Some(next),
        }
    }

    /// Number of locations.
    pub fn len(&self) -> usize {
        self.n
    }

    /// Whether the topology has no locations.
    pub fn is_empty(&self) -> bool {
        self.n == 0
    }
}

impl Topology for MatrixTopology {
    fn distance(&self, a: LocationId, b: LocationId) -> f64 {
        self.dist[a * self.n + b]
    }

    fn path(&self, a: LocationId, b: LocationId) -> Vec<LocationId> {
        if a == b {
            return Vec::new();
        }
        match &self.next {
            None => vec![b],
            Some(next) => {
                let mut hops = Vec::new();
                let mut current = a;
                while current != b {
                    let hop = next[current * self.n + b];
                    if hop == usize::MAX {
                        return Vec::new(); // unreachable
                    }
                    hops.push(hop);
                    current = hop;
                }
                hops
            }
        }
    }
}
