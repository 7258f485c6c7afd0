use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type ListId = String;
pub type VoterId = String;
pub type TurfId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Finite and within the WGS84 lat/lng ranges.
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }
}

/// A member of a voter list as the host database reports it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Voter {
    pub id: VoterId,
    pub household_key: Option<String>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub precinct: Option<String>,
    pub sort_order: Option<i64>,
}

impl Voter {
    pub fn location(&self) -> Option<LatLng> {
        let point = LatLng::new(self.lat?, self.lng?);
        point.is_valid().then_some(point)
    }

    pub fn household_key(&self) -> Option<&str> {
        self.household_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
    }
}

/// A door: every voter sharing one household key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Household {
    pub id: String,
    pub location: LatLng,
    pub member_voter_ids: Vec<VoterId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum CutMethod {
    Cluster,
    Precinct,
    #[cfg_attr(feature = "cli", value(skip))]
    Manual,
}

impl std::fmt::Display for CutMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cluster => write!(f, "cluster"),
            Self::Precinct => write!(f, "precinct"),
            Self::Manual => write!(f, "manual"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurfSettings {
    pub method: CutMethod,
    pub parameters: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteStop {
    pub stop: usize,
    pub household_id: String,
    pub location: LatLng,
    pub voter_ids: Vec<VoterId>,
    /// Metres walked from the previous stop.
    pub leg_distance_m: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    pub stops: Vec<RouteStop>,
    pub total_distance_m: u64,
    pub estimated_minutes: u32,
}

/// A route together with the membership version it was computed against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedRoute {
    pub route: Route,
    pub membership_version: u64,
    pub computed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turf {
    pub id: TurfId,
    pub list_id: ListId,
    pub name: String,
    pub boundary: Option<geojson::Geometry>,
    pub center: LatLng,
    pub voter_count: usize,
    pub door_count: usize,
    pub estimated_time_minutes: u32,
    pub route: Option<CachedRoute>,
    pub settings: TurfSettings,
    pub membership_version: u64,
    pub created_at: DateTime<Utc>,
}

impl Turf {
    /// The cached route, if it still matches the turf's membership.
    pub fn fresh_route(&self) -> Option<&Route> {
        self.route
            .as_ref()
            .filter(|cached| cached.membership_version == self.membership_version)
            .map(|cached| &cached.route)
    }
}

/// Everything needed to insert a turf row; the store assigns id and timestamps.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTurf {
    pub list_id: ListId,
    pub name: String,
    pub boundary: Option<geojson::Geometry>,
    pub center: LatLng,
    pub voter_count: usize,
    pub door_count: usize,
    pub estimated_time_minutes: u32,
    pub settings: TurfSettings,
}

/// Recomputed counters after a turf's membership changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MembershipStats {
    pub voter_count: usize,
    pub door_count: usize,
    pub estimated_time_minutes: u32,
}

/// One precinct's geocoded members, as the precinct source aggregates them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrecinctGroup {
    pub precinct: String,
    pub center: LatLng,
    pub voter_ids: Vec<VoterId>,
    pub door_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailedTurf {
    pub name: String,
    pub door_count: usize,
    pub error: String,
}

/// Outcome of an auto-cut: turf creation is per group, not all-or-nothing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CutSummary {
    pub list_id: ListId,
    pub method: CutMethod,
    pub created: Vec<Turf>,
    pub failed: Vec<FailedTurf>,
}

impl CutSummary {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}
