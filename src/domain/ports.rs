use crate::domain::model::{
    CachedRoute, MembershipStats, NewTurf, PrecinctGroup, Turf, TurfId, Voter, VoterId,
};
use crate::utils::error::Result;
use async_trait::async_trait;

/// Read side of the host voter database.
#[async_trait]
pub trait VoterSource: Send + Sync {
    /// Members of a list in canonical order (sort order, then insertion).
    async fn list_voters(&self, list_id: &str) -> Result<Vec<Voter>>;

    /// One group per precinct among the list's geocoded, household-bearing members.
    async fn precinct_groups(&self, list_id: &str) -> Result<Vec<PrecinctGroup>>;
}

#[async_trait]
pub trait TurfStore: Send + Sync {
    async fn create_turf(&self, turf: NewTurf) -> Result<Turf>;
    async fn get_turf(&self, turf_id: TurfId) -> Result<Option<Turf>>;
    async fn list_turfs(&self, list_id: &str) -> Result<Vec<Turf>>;
    async fn rename_turf(&self, turf_id: TurfId, name: &str) -> Result<Turf>;

    /// Overwrites the counters and bumps the membership version.
    async fn update_stats(&self, turf_id: TurfId, stats: MembershipStats) -> Result<Turf>;

    async fn save_route(&self, turf_id: TurfId, route: CachedRoute) -> Result<()>;

    /// Returns false when no such turf existed.
    async fn delete_turf(&self, turf_id: TurfId) -> Result<bool>;
}

#[async_trait]
pub trait MembershipStore: Send + Sync {
    /// Points each voter's list-membership at `turf_id` (or clears it with `None`).
    /// Returns the distinct turfs that lost members.
    async fn assign_voters(
        &self,
        list_id: &str,
        turf_id: Option<TurfId>,
        voter_ids: &[VoterId],
    ) -> Result<Vec<TurfId>>;

    /// Current members of a turf in canonical list order.
    async fn turf_members(&self, turf_id: TurfId) -> Result<Vec<Voter>>;

    async fn turf_of(&self, list_id: &str, voter_id: &str) -> Result<Option<TurfId>>;

    /// Clears the turf id on every member in one step; returns how many were cleared.
    async fn clear_turf(&self, turf_id: TurfId) -> Result<usize>;
}

/// Read-only view of the parameters the engine runs with.
pub trait SettingsProvider: Send + Sync {
    fn doors_per_turf(&self) -> usize;
    fn max_iterations(&self) -> usize;
    fn convergence_tolerance(&self) -> f64;
    fn dwell_minutes(&self) -> f64;
    fn walking_speed_m_per_min(&self) -> f64;
    fn blocking_route_threshold(&self) -> usize;
    fn max_route_doors(&self) -> usize;
    fn seed(&self) -> Option<u64>;
}
