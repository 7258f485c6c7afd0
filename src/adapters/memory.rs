use crate::core::precinct::group_by_precinct;
use crate::domain::model::{
    CachedRoute, ListId, MembershipStats, NewTurf, PrecinctGroup, Turf, TurfId, Voter, VoterId,
};
use crate::domain::ports::{MembershipStore, TurfStore, VoterSource};
use crate::utils::error::{Result, TurfError};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tokio::sync::RwLock;

#[derive(Debug, Default)]
struct State {
    lists: HashMap<ListId, Vec<Voter>>,
    memberships: HashMap<(ListId, VoterId), TurfId>,
    turfs: BTreeMap<TurfId, Turf>,
    next_turf_id: TurfId,
}

/// Voter lists, turfs and memberships held in process memory.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: RwLock<State>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a store from `(list id, voter)` rows, preserving row order within each list.
    pub fn from_rows(rows: impl IntoIterator<Item = (ListId, Voter)>) -> Self {
        let mut state = State::default();
        for (list_id, voter) in rows {
            state.lists.entry(list_id).or_default().push(voter);
        }
        Self {
            state: RwLock::new(state),
        }
    }
}

/// Members ordered by sort order; unsorted members keep insertion order at the end.
fn canonical(voters: &[Voter]) -> Vec<Voter> {
    let mut ordered = voters.to_vec();
    ordered.sort_by_key(|v| v.sort_order.unwrap_or(i64::MAX));
    ordered
}

#[async_trait]
impl VoterSource for InMemoryStore {
    async fn list_voters(&self, list_id: &str) -> Result<Vec<Voter>> {
        let state = self.state.read().await;
        Ok(state
            .lists
            .get(list_id)
            .map(|voters| canonical(voters))
            .unwrap_or_default())
    }

    async fn precinct_groups(&self, list_id: &str) -> Result<Vec<PrecinctGroup>> {
        let voters = self.list_voters(list_id).await?;
        Ok(group_by_precinct(&voters))
    }
}

#[async_trait]
impl TurfStore for InMemoryStore {
    async fn create_turf(&self, turf: NewTurf) -> Result<Turf> {
        let mut state = self.state.write().await;
        state.next_turf_id += 1;
        let created = Turf {
            id: state.next_turf_id,
            list_id: turf.list_id,
            name: turf.name,
            boundary: turf.boundary,
            center: turf.center,
            voter_count: turf.voter_count,
            door_count: turf.door_count,
            estimated_time_minutes: turf.estimated_time_minutes,
            route: None,
            settings: turf.settings,
            membership_version: 0,
            created_at: Utc::now(),
        };
        state.turfs.insert(created.id, created.clone());
        Ok(created)
    }

    async fn get_turf(&self, turf_id: TurfId) -> Result<Option<Turf>> {
        let state = self.state.read().await;
        Ok(state.turfs.get(&turf_id).cloned())
    }

    async fn list_turfs(&self, list_id: &str) -> Result<Vec<Turf>> {
        let state = self.state.read().await;
        Ok(state
            .turfs
            .values()
            .filter(|t| t.list_id == list_id)
            .cloned()
            .collect())
    }

    async fn rename_turf(&self, turf_id: TurfId, name: &str) -> Result<Turf> {
        let mut state = self.state.write().await;
        let turf = state
            .turfs
            .get_mut(&turf_id)
            .ok_or(TurfError::TurfNotFound { turf_id })?;
        turf.name = name.to_string();
        Ok(turf.clone())
    }

    async fn update_stats(&self, turf_id: TurfId, stats: MembershipStats) -> Result<Turf> {
        let mut state = self.state.write().await;
        let turf = state
            .turfs
            .get_mut(&turf_id)
            .ok_or(TurfError::TurfNotFound { turf_id })?;
        turf.voter_count = stats.voter_count;
        turf.door_count = stats.door_count;
        turf.estimated_time_minutes = stats.estimated_time_minutes;
        turf.membership_version += 1;
        Ok(turf.clone())
    }

    async fn save_route(&self, turf_id: TurfId, route: CachedRoute) -> Result<()> {
        let mut state = self.state.write().await;
        let turf = state
            .turfs
            .get_mut(&turf_id)
            .ok_or(TurfError::TurfNotFound { turf_id })?;
        turf.route = Some(route);
        Ok(())
    }

    async fn delete_turf(&self, turf_id: TurfId) -> Result<bool> {
        let mut state = self.state.write().await;
        Ok(state.turfs.remove(&turf_id).is_some())
    }
}

#[async_trait]
impl MembershipStore for InMemoryStore {
    async fn assign_voters(
        &self,
        list_id: &str,
        turf_id: Option<TurfId>,
        voter_ids: &[VoterId],
    ) -> Result<Vec<TurfId>> {
        let mut guard = self.state.write().await;
        let state = &mut *guard;
        let Some(members) = state.lists.get(list_id) else {
            return Ok(Vec::new());
        };

        let mut displaced = BTreeSet::new();
        for voter_id in voter_ids {
            // only members of the list carry a membership record
            if !members.iter().any(|v| &v.id == voter_id) {
                continue;
            }
            let key = (list_id.to_string(), voter_id.clone());
            let previous = match turf_id {
                Some(turf_id) => state.memberships.insert(key, turf_id),
                None => state.memberships.remove(&key),
            };
            if let Some(previous) = previous.filter(|&p| Some(p) != turf_id) {
                displaced.insert(previous);
            }
        }
        Ok(displaced.into_iter().collect())
    }

    async fn turf_members(&self, turf_id: TurfId) -> Result<Vec<Voter>> {
        let state = self.state.read().await;
        let mut members = Vec::new();
        let mut list_ids: Vec<&ListId> = state
            .memberships
            .iter()
            .filter(|(_, &t)| t == turf_id)
            .map(|((list_id, _), _)| list_id)
            .collect();
        list_ids.sort();
        list_ids.dedup();

        for list_id in list_ids {
            let Some(voters) = state.lists.get(list_id) else {
                continue;
            };
            members.extend(canonical(voters).into_iter().filter(|v| {
                state.memberships.get(&(list_id.clone(), v.id.clone())) == Some(&turf_id)
            }));
        }
        Ok(members)
    }

    async fn turf_of(&self, list_id: &str, voter_id: &str) -> Result<Option<TurfId>> {
        let state = self.state.read().await;
        Ok(state
            .memberships
            .get(&(list_id.to_string(), voter_id.to_string()))
            .copied())
    }

    async fn clear_turf(&self, turf_id: TurfId) -> Result<usize> {
        let mut state = self.state.write().await;
        let before = state.memberships.len();
        state.memberships.retain(|_, t| *t != turf_id);
        Ok(before - state.memberships.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{CutMethod, LatLng, TurfSettings};

    fn voter(id: &str, sort_order: Option<i64>) -> Voter {
        Voter {
            id: id.to_string(),
            household_key: Some(format!("h-{}", id)),
            lat: Some(35.6),
            lng: Some(-82.5),
            precinct: Some("01".to_string()),
            sort_order,
        }
    }

    fn new_turf(list_id: &str) -> NewTurf {
        NewTurf {
            list_id: list_id.to_string(),
            name: "Turf".to_string(),
            boundary: None,
            center: LatLng::new(35.6, -82.5),
            voter_count: 0,
            door_count: 0,
            estimated_time_minutes: 0,
            settings: TurfSettings {
                method: CutMethod::Cluster,
                parameters: serde_json::json!({}),
            },
        }
    }

    #[test]
    fn test_list_voters_in_sort_order() {
        let store = InMemoryStore::from_rows(vec![
            ("1".to_string(), voter("c", None)),
            ("1".to_string(), voter("b", Some(2))),
            ("1".to_string(), voter("a", Some(1))),
            ("2".to_string(), voter("z", None)),
        ]);

        let voters = tokio_test::block_on(store.list_voters("1")).unwrap();
        let ids: Vec<&str> = voters.iter().map(|v| v.id.as_str()).collect();

        assert_eq!(ids, vec!["a", "b", "c"]);
        assert!(tokio_test::block_on(store.list_voters("missing")).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_assign_reports_displaced_turfs() {
        let store = InMemoryStore::from_rows(vec![
            ("1".to_string(), voter("a", None)),
            ("1".to_string(), voter("b", None)),
        ]);
        let first = store.create_turf(new_turf("1")).await.unwrap();
        let second = store.create_turf(new_turf("1")).await.unwrap();
        let ids = vec!["a".to_string(), "b".to_string(), "stranger".to_string()];

        let displaced = store.assign_voters("1", Some(first.id), &ids).await.unwrap();
        assert!(displaced.is_empty());

        let displaced = store
            .assign_voters("1", Some(second.id), &ids[..1])
            .await
            .unwrap();
        assert_eq!(displaced, vec![first.id]);
        assert_eq!(store.turf_of("1", "a").await.unwrap(), Some(second.id));
        assert_eq!(store.turf_of("1", "stranger").await.unwrap(), None);

        let members = store.turf_members(first.id).await.unwrap();
        assert_eq!(members.len(), 1);
        assert_eq!(members[0].id, "b");
    }

    #[tokio::test]
    async fn test_same_voter_in_different_turfs_per_list() {
        let store = InMemoryStore::from_rows(vec![
            ("1".to_string(), voter("a", None)),
            ("2".to_string(), voter("a", None)),
        ]);
        let t1 = store.create_turf(new_turf("1")).await.unwrap();
        let t2 = store.create_turf(new_turf("2")).await.unwrap();
        let ids = vec!["a".to_string()];

        store.assign_voters("1", Some(t1.id), &ids).await.unwrap();
        store.assign_voters("2", Some(t2.id), &ids).await.unwrap();

        assert_eq!(store.turf_of("1", "a").await.unwrap(), Some(t1.id));
        assert_eq!(store.turf_of("2", "a").await.unwrap(), Some(t2.id));
    }

    #[tokio::test]
    async fn test_clear_and_delete() {
        let store = InMemoryStore::from_rows(vec![
            ("1".to_string(), voter("a", None)),
            ("1".to_string(), voter("b", None)),
        ]);
        let turf = store.create_turf(new_turf("1")).await.unwrap();
        let ids = vec!["a".to_string(), "b".to_string()];
        store.assign_voters("1", Some(turf.id), &ids).await.unwrap();

        assert_eq!(store.clear_turf(turf.id).await.unwrap(), 2);
        assert!(store.delete_turf(turf.id).await.unwrap());
        assert!(!store.delete_turf(turf.id).await.unwrap());
        assert_eq!(store.turf_of("1", "a").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_update_stats_bumps_membership_version() {
        let store = InMemoryStore::new();
        let turf = store.create_turf(new_turf("1")).await.unwrap();

        let updated = store
            .update_stats(
                turf.id,
                MembershipStats {
                    voter_count: 3,
                    door_count: 2,
                    estimated_time_minutes: 6,
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.membership_version, turf.membership_version + 1);
        assert_eq!(updated.door_count, 2);
        assert!(matches!(
            store.rename_turf(99, "x").await,
            Err(TurfError::TurfNotFound { turf_id: 99 })
        ));
    }
}
