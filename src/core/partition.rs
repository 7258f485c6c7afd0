use crate::core::clustering::Cluster;
use crate::domain::model::{CutMethod, LatLng, PrecinctGroup, VoterId};
use std::collections::HashSet;

/// A drawn polygon and the voters it contains.
#[derive(Debug, Clone, PartialEq)]
pub struct PolygonSelection {
    pub boundary: geojson::Geometry,
    pub center: LatLng,
    pub voter_ids: Vec<VoterId>,
    pub door_count: usize,
}

/// One group produced by a partition strategy, waiting to become a turf.
#[derive(Debug, Clone, PartialEq)]
pub enum Partition {
    Cluster(Cluster),
    Precinct(PrecinctGroup),
    Polygon(PolygonSelection),
}

impl Partition {
    pub fn method(&self) -> CutMethod {
        match self {
            Self::Cluster(_) => CutMethod::Cluster,
            Self::Precinct(_) => CutMethod::Precinct,
            Self::Polygon(_) => CutMethod::Manual,
        }
    }

    /// Distinct member voter ids, in first-seen order.
    pub fn members(&self) -> Vec<VoterId> {
        let ids: Box<dyn Iterator<Item = &VoterId> + '_> = match self {
            Self::Cluster(cluster) => Box::new(cluster.voter_ids()),
            Self::Precinct(group) => Box::new(group.voter_ids.iter()),
            Self::Polygon(selection) => Box::new(selection.voter_ids.iter()),
        };
        let mut seen = HashSet::new();
        ids.filter(|id| seen.insert(id.as_str()))
            .cloned()
            .collect()
    }

    pub fn door_count(&self) -> usize {
        match self {
            Self::Cluster(cluster) => cluster.households.len(),
            Self::Precinct(group) => group.door_count,
            Self::Polygon(selection) => selection.door_count,
        }
    }

    pub fn center(&self) -> LatLng {
        match self {
            Self::Cluster(cluster) => cluster.center,
            Self::Precinct(group) => group.center,
            Self::Polygon(selection) => selection.center,
        }
    }

    /// Only drawn turfs keep their geometry.
    pub fn boundary(&self) -> Option<&geojson::Geometry> {
        match self {
            Self::Polygon(selection) => Some(&selection.boundary),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.door_count() == 0 || self.members().is_empty()
    }

    /// Name used when the caller did not supply one.
    pub fn default_name(&self, ordinal: usize) -> String {
        match self {
            Self::Precinct(group) => format!("Precinct {}", group.precinct),
            _ => format!("Turf {}", ordinal),
        }
    }
}
