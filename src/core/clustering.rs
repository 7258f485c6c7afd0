//! k-means partition of households by location.
//!
//! Distances are haversine; centroids are the planar mean of member
//! coordinates, which holds up at city scale but not near the poles or
//! across the antimeridian.

use crate::core::distance::haversine_distance;
use crate::domain::model::{Household, LatLng};
use rand::seq::SliceRandom;
use rand::Rng;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClusterParams {
    pub max_iterations: usize,
    /// Largest per-axis centroid movement, in degrees, still counted as converged.
    pub tolerance: f64,
}

impl Default for ClusterParams {
    fn default() -> Self {
        Self {
            max_iterations: 50,
            tolerance: 0.0001,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Cluster {
    pub households: Vec<Household>,
    pub center: LatLng,
}

impl Cluster {
    pub fn voter_ids(&self) -> impl Iterator<Item = &String> + '_ {
        self.households
            .iter()
            .flat_map(|h| h.member_voter_ids.iter())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClusterOutcome {
    pub clusters: Vec<Cluster>,
    pub iterations: usize,
    pub converged: bool,
}

/// `max(1, ceil(doors / doors_per_turf))`; a zero `doors_per_turf` is treated as one.
pub fn cluster_count(door_count: usize, doors_per_turf: usize) -> usize {
    door_count.div_ceil(doors_per_turf.max(1)).max(1)
}

pub fn cluster_households<R: Rng + ?Sized>(
    households: Vec<Household>,
    k: usize,
    params: ClusterParams,
    rng: &mut R,
) -> ClusterOutcome {
    if households.is_empty() {
        return ClusterOutcome {
            clusters: Vec::new(),
            iterations: 0,
            converged: true,
        };
    }

    let k = k.max(1);
    if k >= households.len() {
        let clusters = households
            .into_iter()
            .map(|h| Cluster {
                center: h.location,
                households: vec![h],
            })
            .collect();
        return ClusterOutcome {
            clusters,
            iterations: 0,
            converged: true,
        };
    }

    let mut seeds: Vec<usize> = (0..households.len()).collect();
    seeds.shuffle(rng);
    let mut centroids: Vec<LatLng> = seeds[..k].iter().map(|&i| households[i].location).collect();

    let mut iterations = 0;
    let mut converged = false;
    while iterations < params.max_iterations {
        iterations += 1;
        let assignment = assign(&households, &centroids);
        let next = recompute(&households, &assignment, &centroids);

        let moved = centroids.iter().zip(&next).any(|(old, new)| {
            (old.lat - new.lat).abs() > params.tolerance
                || (old.lng - new.lng).abs() > params.tolerance
        });
        centroids = next;

        if !moved {
            converged = true;
            break;
        }
    }

    if !converged {
        tracing::debug!(
            "k-means stopped at the {} iteration cap without converging",
            params.max_iterations
        );
    }

    let assignment = assign(&households, &centroids);
    let mut groups: Vec<Vec<Household>> = vec![Vec::new(); k];
    for (household, cluster) in households.into_iter().zip(assignment) {
        groups[cluster].push(household);
    }

    let clusters: Vec<Cluster> = groups
        .into_iter()
        .zip(centroids)
        .filter(|(members, _)| !members.is_empty())
        .map(|(households, center)| Cluster { households, center })
        .collect();

    if clusters.len() < k {
        tracing::debug!("Dropped {} empty clusters", k - clusters.len());
    }

    ClusterOutcome {
        clusters,
        iterations,
        converged,
    }
}

/// Index of the nearest centroid for every household; ties go to the lower index.
fn assign(households: &[Household], centroids: &[LatLng]) -> Vec<usize> {
    households
        .iter()
        .map(|h| {
            let mut best = 0;
            let mut best_distance = f64::INFINITY;
            for (i, centroid) in centroids.iter().enumerate() {
                let d = haversine_distance(h.location, *centroid);
                if d < best_distance {
                    best = i;
                    best_distance = d;
                }
            }
            best
        })
        .collect()
}

fn recompute(households: &[Household], assignment: &[usize], previous: &[LatLng]) -> Vec<LatLng> {
    let mut sums = vec![(0.0f64, 0.0f64, 0usize); previous.len()];
    for (household, &cluster) in households.iter().zip(assignment) {
        let entry = &mut sums[cluster];
        entry.0 += household.location.lat;
        entry.1 += household.location.lng;
        entry.2 += 1;
    }

    sums.into_iter()
        .zip(previous)
        .map(|((lat, lng, n), old)| {
            if n == 0 {
                *old
            } else {
                LatLng::new(lat / n as f64, lng / n as f64)
            }
        })
        .collect()
}
