use crate::core::clustering::{cluster_count, cluster_households, ClusterParams};
use crate::core::households::{aggregate_doors, aggregate_households};
use crate::core::partition::Partition;
use crate::core::polygon::{parse_polygon, select_voters};
use crate::core::precinct::precinct_partitions;
use crate::core::routing::{optimize_route, RouteParams};
use crate::domain::model::{
    CachedRoute, CutMethod, CutSummary, FailedTurf, ListId, MembershipStats, NewTurf, Route, Turf,
    TurfId, TurfSettings,
};
use crate::domain::ports::{MembershipStore, SettingsProvider, TurfStore, VoterSource};
use crate::utils::error::{Result, TurfError};
use crate::utils::validation::validate_non_empty_string;
use chrono::Utc;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Cuts voter lists into turfs and sequences walk routes for them.
///
/// Turf-creating operations and deletes are serialized per list, so two
/// concurrent cuts of the same list cannot hand one household to two turfs.
pub struct TurfEngine<S, C>
where
    S: VoterSource + TurfStore + MembershipStore,
    C: SettingsProvider,
{
    store: S,
    settings: C,
    rng: Mutex<StdRng>,
    list_locks: Mutex<HashMap<ListId, Arc<Mutex<()>>>>,
}

impl<S, C> TurfEngine<S, C>
where
    S: VoterSource + TurfStore + MembershipStore,
    C: SettingsProvider,
{
    /// Seeds clustering from the configured seed, or from OS entropy when unset.
    pub fn new(store: S, settings: C) -> Self {
        let rng = match settings.seed() {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self::with_rng(store, settings, rng)
    }

    pub fn with_rng(store: S, settings: C, rng: StdRng) -> Self {
        Self {
            store,
            settings,
            rng: Mutex::new(rng),
            list_locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn settings(&self) -> &C {
        &self.settings
    }

    fn route_params(&self) -> RouteParams {
        RouteParams {
            dwell_minutes: self.settings.dwell_minutes(),
            walking_speed_m_per_min: self.settings.walking_speed_m_per_min(),
        }
    }

    /// Entries nobody holds or waits on are pruned, so the map only keeps
    /// lists with work in flight.
    async fn lock_list(&self, list_id: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.list_locks.lock().await;
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            locks
                .entry(list_id.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        lock.lock_owned().await
    }

    /// Partitions a list by geography or precinct and persists one turf per group.
    ///
    /// Groups are persisted one at a time; a group that fails is reported in
    /// the summary and does not undo the turfs created before it.
    pub async fn auto_cut(
        &self,
        list_id: &str,
        doors_per_turf: usize,
        method: CutMethod,
    ) -> Result<CutSummary> {
        validate_non_empty_string("list_id", list_id)?;
        if doors_per_turf < 1 {
            return Err(TurfError::validation("doors_per_turf", "must be at least 1"));
        }
        if method == CutMethod::Manual {
            return Err(TurfError::validation(
                "method",
                "auto-cut supports 'cluster' or 'precinct'; draw a polygon for manual turfs",
            ));
        }

        let _guard = self.lock_list(list_id).await;
        tracing::info!("✂️ Auto-cutting list {} by {} ({} doors per turf)", list_id, method, doors_per_turf);

        let partitions = match method {
            CutMethod::Cluster => self.cluster_partitions(list_id, doors_per_turf).await?,
            _ => precinct_partitions(self.store.precinct_groups(list_id).await?),
        };
        if partitions.is_empty() {
            return Err(TurfError::NothingToCut {
                list_id: list_id.to_string(),
                reason: "no geocoded voters with a household key".to_string(),
            });
        }

        let mut summary = CutSummary {
            list_id: list_id.to_string(),
            method,
            created: Vec::new(),
            failed: Vec::new(),
        };

        for (i, partition) in partitions.into_iter().enumerate() {
            let name = partition.default_name(i + 1);
            let mut parameters = json!({ "doors_per_turf": doors_per_turf });
            if let Partition::Precinct(group) = &partition {
                parameters["precinct"] = json!(group.precinct);
            }
            let door_count = partition.door_count();

            match self.persist(list_id, partition, &name, parameters).await {
                Ok(turf) => summary.created.push(turf),
                Err(e) => {
                    tracing::warn!("⚠️ Failed to create turf '{}' for list {}: {}", name, list_id, e);
                    summary.failed.push(FailedTurf {
                        name,
                        door_count,
                        error: e.to_string(),
                    });
                }
            }
        }

        tracing::info!(
            "✅ List {}: created {} turfs, {} failed",
            list_id,
            summary.created.len(),
            summary.failed.len()
        );
        Ok(summary)
    }

    async fn cluster_partitions(&self, list_id: &str, doors_per_turf: usize) -> Result<Vec<Partition>> {
        let voters = self.store.list_voters(list_id).await?;
        let households = aggregate_households(&voters);
        tracing::debug!("List {}: {} voters collapse to {} doors", list_id, voters.len(), households.len());
        if households.is_empty() {
            return Ok(Vec::new());
        }

        let k = cluster_count(households.len(), doors_per_turf);
        let params = ClusterParams {
            max_iterations: self.settings.max_iterations(),
            tolerance: self.settings.convergence_tolerance(),
        };
        let outcome = {
            let mut rng = self.rng.lock().await;
            cluster_households(households, k, params, &mut *rng)
        };

        tracing::debug!(
            "k-means with k={} finished after {} iterations (converged: {}), {} non-empty clusters",
            k,
            outcome.iterations,
            outcome.converged,
            outcome.clusters.len()
        );
        Ok(outcome.clusters.into_iter().map(Partition::Cluster).collect())
    }

    /// Creates a single turf from a GeoJSON polygon drawn by the caller.
    pub async fn create_manual(
        &self,
        list_id: &str,
        polygon: &serde_json::Value,
        name: &str,
    ) -> Result<Turf> {
        validate_non_empty_string("list_id", list_id)?;
        validate_non_empty_string("name", name)?;
        let drawn = parse_polygon(polygon)?;

        let _guard = self.lock_list(list_id).await;
        let voters = self.store.list_voters(list_id).await?;
        let selection = select_voters(list_id, &drawn, &voters)?;
        tracing::info!(
            "✏️ Polygon '{}' on list {} contains {} voters at {} doors",
            name,
            list_id,
            selection.voter_ids.len(),
            selection.door_count
        );

        self.persist(list_id, Partition::Polygon(selection), name.trim(), json!({}))
            .await
    }

    /// Inserts the turf and points its members at it. If assignment fails
    /// the new turf is removed again.
    async fn persist(
        &self,
        list_id: &str,
        partition: Partition,
        name: &str,
        parameters: serde_json::Value,
    ) -> Result<Turf> {
        let members = partition.members();
        if partition.is_empty() {
            return Err(TurfError::NothingToCut {
                list_id: list_id.to_string(),
                reason: format!("group '{}' has no doors", name),
            });
        }

        let door_count = partition.door_count();
        let turf = self
            .store
            .create_turf(NewTurf {
                list_id: list_id.to_string(),
                name: name.to_string(),
                boundary: partition.boundary().cloned(),
                center: partition.center(),
                voter_count: members.len(),
                door_count,
                estimated_time_minutes: self.route_params().estimate_minutes(door_count, 0.0),
                settings: TurfSettings {
                    method: partition.method(),
                    parameters,
                },
            })
            .await?;

        let displaced = match self
            .store
            .assign_voters(list_id, Some(turf.id), &members)
            .await
        {
            Ok(displaced) => displaced,
            Err(e) => {
                tracing::warn!("Rolling back turf {} after failed assignment: {}", turf.id, e);
                if let Err(cleanup) = self.remove(turf.id).await {
                    tracing::warn!("Could not roll back turf {}: {}", turf.id, cleanup);
                }
                return Err(e);
            }
        };

        tracing::debug!(
            "Turf {} '{}': {} voters, {} doors",
            turf.id,
            turf.name,
            turf.voter_count,
            turf.door_count
        );
        self.refresh_displaced(&displaced, turf.id).await;
        Ok(turf)
    }

    async fn refresh_displaced(&self, displaced: &[TurfId], except: TurfId) {
        for &turf_id in displaced.iter().filter(|&&id| id != except) {
            if let Err(e) = self.refresh_stats(turf_id).await {
                tracing::warn!("Could not refresh counters of turf {}: {}", turf_id, e);
            }
        }
    }

    /// Recounts a turf after its membership changed. A turf left without
    /// members is deleted.
    async fn refresh_stats(&self, turf_id: TurfId) -> Result<()> {
        let members = self.store.turf_members(turf_id).await?;
        if members.is_empty() {
            tracing::info!("🗑️ Removing turf {} left without members", turf_id);
            return self.remove(turf_id).await;
        }

        let door_count = aggregate_doors(&members).len();
        self.store
            .update_stats(
                turf_id,
                MembershipStats {
                    voter_count: members.len(),
                    door_count,
                    estimated_time_minutes: self.route_params().estimate_minutes(door_count, 0.0),
                },
            )
            .await?;
        Ok(())
    }

    /// Returns the turf's walk route, computing and caching it when the
    /// cache is missing or older than the turf's current membership.
    pub async fn get_route(&self, turf_id: TurfId) -> Result<Route> {
        let turf = self.get_turf(turf_id).await?;
        if let Some(route) = turf.fresh_route() {
            tracing::debug!("Route cache hit for turf {}", turf_id);
            return Ok(route.clone());
        }

        let members = self.store.turf_members(turf_id).await?;
        let doors = aggregate_doors(&members);
        let limit = self.settings.max_route_doors();
        if doors.len() > limit {
            return Err(TurfError::RouteTooLarge {
                turf_id,
                doors: doors.len(),
                limit,
            });
        }

        let params = self.route_params();
        let route = if doors.len() > self.settings.blocking_route_threshold() {
            tracing::debug!("Routing {} doors of turf {} on a blocking worker", doors.len(), turf_id);
            tokio::task::spawn_blocking(move || optimize_route(&doors, params)).await?
        } else {
            optimize_route(&doors, params)
        };

        self.store
            .save_route(
                turf_id,
                CachedRoute {
                    route: route.clone(),
                    membership_version: turf.membership_version,
                    computed_at: Utc::now(),
                },
            )
            .await?;

        tracing::info!(
            "🚶 Turf {}: {} stops, {} m, ~{} min",
            turf_id,
            route.stops.len(),
            route.total_distance_m,
            route.estimated_minutes
        );
        Ok(route)
    }

    /// Clears the turf from every member's list-membership, then deletes it.
    pub async fn delete_turf(&self, turf_id: TurfId) -> Result<()> {
        let turf = self.get_turf(turf_id).await?;
        let _guard = self.lock_list(&turf.list_id).await;
        self.remove(turf_id).await?;
        tracing::info!("🗑️ Deleted turf {} '{}' from list {}", turf_id, turf.name, turf.list_id);
        Ok(())
    }

    async fn remove(&self, turf_id: TurfId) -> Result<()> {
        let cleared = self.store.clear_turf(turf_id).await?;
        tracing::debug!("Cleared turf {} from {} memberships", turf_id, cleared);
        if !self.store.delete_turf(turf_id).await? {
            return Err(TurfError::TurfNotFound { turf_id });
        }
        Ok(())
    }

    pub async fn get_turf(&self, turf_id: TurfId) -> Result<Turf> {
        self.store
            .get_turf(turf_id)
            .await?
            .ok_or(TurfError::TurfNotFound { turf_id })
    }

    pub async fn list_turfs(&self, list_id: &str) -> Result<Vec<Turf>> {
        validate_non_empty_string("list_id", list_id)?;
        self.store.list_turfs(list_id).await
    }

    pub async fn rename_turf(&self, turf_id: TurfId, name: &str) -> Result<Turf> {
        validate_non_empty_string("name", name)?;
        self.get_turf(turf_id).await?;
        self.store.rename_turf(turf_id, name.trim()).await
    }

    /// Moves one voter of a list to another turf of the same list, or out of
    /// any turf with `None`. Counters and route caches of both turfs follow.
    pub async fn reassign_voter(
        &self,
        list_id: &str,
        voter_id: &str,
        turf_id: Option<TurfId>,
    ) -> Result<()> {
        validate_non_empty_string("list_id", list_id)?;
        validate_non_empty_string("voter_id", voter_id)?;

        // the target must still exist once the list is locked
        let _guard = self.lock_list(list_id).await;
        if let Some(target) = turf_id {
            let turf = self.get_turf(target).await?;
            if turf.list_id != list_id {
                return Err(TurfError::validation(
                    "turf_id",
                    format!("turf {} belongs to list {}", target, turf.list_id),
                ));
            }
        }

        let voters = self.store.list_voters(list_id).await?;
        if !voters.iter().any(|v| v.id == voter_id) {
            return Err(TurfError::validation(
                "voter_id",
                format!("voter {} is not on list {}", voter_id, list_id),
            ));
        }

        let displaced = self
            .store
            .assign_voters(list_id, turf_id, &[voter_id.to_string()])
            .await?;
        if let Some(target) = turf_id {
            self.refresh_stats(target).await?;
            self.refresh_displaced(&displaced, target).await;
        } else {
            for &previous in &displaced {
                self.refresh_stats(previous).await?;
            }
        }
        Ok(())
    }
}
