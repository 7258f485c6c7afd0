use crate::core::distance::haversine_distance;
use crate::domain::model::{Household, Route, RouteStop};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RouteParams {
    /// Minutes spent at each door.
    pub dwell_minutes: f64,
    pub walking_speed_m_per_min: f64,
}

impl Default for RouteParams {
    fn default() -> Self {
        Self {
            dwell_minutes: 3.0,
            walking_speed_m_per_min: 80.0,
        }
    }
}

impl RouteParams {
    pub fn estimate_minutes(&self, doors: usize, distance_m: f64) -> u32 {
        let walking = if self.walking_speed_m_per_min > 0.0 {
            distance_m / self.walking_speed_m_per_min
        } else {
            0.0
        };
        (doors as f64 * self.dwell_minutes + walking).round() as u32
    }
}

/// Nearest-neighbour walk order starting from the first household.
///
/// Households are visited exactly once; ties go to the earliest household in
/// input order. Runs in O(n²).
pub fn optimize_route(households: &[Household], params: RouteParams) -> Route {
    let n = households.len();
    let mut visited = vec![false; n];
    let mut order: Vec<(usize, f64)> = Vec::with_capacity(n);

    if n > 0 {
        visited[0] = true;
        order.push((0, 0.0));
    }

    let mut current = 0;
    while order.len() < n {
        let here = households[current].location;
        let mut next = None;
        let mut next_distance = f64::INFINITY;
        for (i, household) in households.iter().enumerate() {
            if visited[i] {
                continue;
            }
            let d = haversine_distance(here, household.location);
            if next.is_none() || d < next_distance {
                next = Some(i);
                next_distance = d;
            }
        }

        let Some(i) = next else { break };
        visited[i] = true;
        order.push((i, next_distance));
        current = i;
    }

    let total: f64 = order.iter().map(|(_, leg)| leg).sum();
    let stops = order
        .into_iter()
        .enumerate()
        .map(|(position, (i, leg))| RouteStop {
            stop: position + 1,
            household_id: households[i].id.clone(),
            location: households[i].location,
            voter_ids: households[i].member_voter_ids.clone(),
            leg_distance_m: leg,
        })
        .collect();

    Route {
        stops,
        total_distance_m: total.round() as u64,
        estimated_minutes: params.estimate_minutes(n, total),
    }
}
