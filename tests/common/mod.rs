#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use turf_engine::domain::model::{
    CachedRoute, MembershipStats, NewTurf, PrecinctGroup, Turf, TurfId, Voter, VoterId,
};
use turf_engine::domain::ports::{MembershipStore, TurfStore, VoterSource};
use turf_engine::{EngineSettings, InMemoryStore, TurfEngine, TurfError};

pub const LIST: &str = "list-7";

pub fn voter(id: &str, household: Option<&str>, lat: f64, lng: f64) -> Voter {
    Voter {
        id: id.to_string(),
        household_key: household.map(str::to_string),
        lat: Some(lat),
        lng: Some(lng),
        precinct: None,
        sort_order: None,
    }
}

pub fn in_precinct(mut voter: Voter, precinct: &str) -> Voter {
    voter.precinct = Some(precinct.to_string());
    voter
}

pub fn sorted(mut voter: Voter, sort_order: i64) -> Voter {
    voter.sort_order = Some(sort_order);
    voter
}

/// Four doors on the corners of a small square in Asheville.
pub fn square_voters() -> Vec<Voter> {
    vec![
        voter("v1", Some("h1"), 35.60, -82.55),
        voter("v2", Some("h2"), 35.61, -82.55),
        voter("v3", Some("h3"), 35.60, -82.56),
        voter("v4", Some("h4"), 35.61, -82.56),
        voter("v5", Some("h1"), 35.60, -82.55),
    ]
}

pub fn store_with(voters: Vec<Voter>) -> InMemoryStore {
    InMemoryStore::from_rows(voters.into_iter().map(|v| (LIST.to_string(), v)))
}

pub fn seeded_settings(seed: u64) -> EngineSettings {
    EngineSettings {
        seed: Some(seed),
        ..EngineSettings::default()
    }
}

pub fn engine_with(voters: Vec<Voter>) -> TurfEngine<InMemoryStore, EngineSettings> {
    TurfEngine::new(store_with(voters), seeded_settings(42))
}

/// A GeoJSON polygon around the given lat/lng box.
pub fn box_polygon(south: f64, west: f64, north: f64, east: f64) -> serde_json::Value {
    serde_json::json!({
        "type": "Polygon",
        "coordinates": [[
            [west, south], [east, south], [east, north], [west, north], [west, south]
        ]]
    })
}

/// Delegates to an in-memory store but fails chosen calls.
pub struct FlakyStore {
    pub inner: InMemoryStore,
    creates: AtomicUsize,
    pub fail_create_at: Option<usize>,
    pub fail_assign: bool,
    /// The first `get_turf` yields this many times before answering.
    pub slow_first_lookup: usize,
    lookups: AtomicUsize,
}

impl FlakyStore {
    pub fn new(voters: Vec<Voter>) -> Self {
        Self {
            inner: store_with(voters),
            creates: AtomicUsize::new(0),
            fail_create_at: None,
            fail_assign: false,
            slow_first_lookup: 0,
            lookups: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl VoterSource for FlakyStore {
    async fn list_voters(&self, list_id: &str) -> turf_engine::Result<Vec<Voter>> {
        self.inner.list_voters(list_id).await
    }

    async fn precinct_groups(&self, list_id: &str) -> turf_engine::Result<Vec<PrecinctGroup>> {
        self.inner.precinct_groups(list_id).await
    }
}

#[async_trait]
impl TurfStore for FlakyStore {
    async fn create_turf(&self, turf: NewTurf) -> turf_engine::Result<Turf> {
        let n = self.creates.fetch_add(1, Ordering::SeqCst) + 1;
        if Some(n) == self.fail_create_at {
            return Err(TurfError::store("create_turf", "connection reset"));
        }
        self.inner.create_turf(turf).await
    }

    async fn get_turf(&self, turf_id: TurfId) -> turf_engine::Result<Option<Turf>> {
        if self.lookups.fetch_add(1, Ordering::SeqCst) == 0 {
            for _ in 0..self.slow_first_lookup {
                tokio::task::yield_now().await;
            }
        }
        self.inner.get_turf(turf_id).await
    }

    async fn list_turfs(&self, list_id: &str) -> turf_engine::Result<Vec<Turf>> {
        self.inner.list_turfs(list_id).await
    }

    async fn rename_turf(&self, turf_id: TurfId, name: &str) -> turf_engine::Result<Turf> {
        self.inner.rename_turf(turf_id, name).await
    }

    async fn update_stats(
        &self,
        turf_id: TurfId,
        stats: MembershipStats,
    ) -> turf_engine::Result<Turf> {
        self.inner.update_stats(turf_id, stats).await
    }

    async fn save_route(&self, turf_id: TurfId, route: CachedRoute) -> turf_engine::Result<()> {
        self.inner.save_route(turf_id, route).await
    }

    async fn delete_turf(&self, turf_id: TurfId) -> turf_engine::Result<bool> {
        self.inner.delete_turf(turf_id).await
    }
}

#[async_trait]
impl MembershipStore for FlakyStore {
    async fn assign_voters(
        &self,
        list_id: &str,
        turf_id: Option<TurfId>,
        voter_ids: &[VoterId],
    ) -> turf_engine::Result<Vec<TurfId>> {
        if self.fail_assign && turf_id.is_some() {
            return Err(TurfError::store("assign_voters", "deadlock detected"));
        }
        self.inner.assign_voters(list_id, turf_id, voter_ids).await
    }

    async fn turf_members(&self, turf_id: TurfId) -> turf_engine::Result<Vec<Voter>> {
        self.inner.turf_members(turf_id).await
    }

    async fn turf_of(&self, list_id: &str, voter_id: &str) -> turf_engine::Result<Option<TurfId>> {
        self.inner.turf_of(list_id, voter_id).await
    }

    async fn clear_turf(&self, turf_id: TurfId) -> turf_engine::Result<usize> {
        self.inner.clear_turf(turf_id).await
    }
}
