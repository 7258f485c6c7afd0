use crate::core::partition::Partition;
use crate::domain::model::{LatLng, PrecinctGroup, Voter};
use std::collections::{BTreeMap, HashSet};

/// Turns precinct rows into partitions, dropping groups that would make empty
/// or unplaceable turfs.
pub fn precinct_partitions(groups: Vec<PrecinctGroup>) -> Vec<Partition> {
    groups
        .into_iter()
        .filter(|group| {
            let keep = !group.voter_ids.is_empty() && group.door_count > 0 && group.center.is_valid();
            if !keep {
                tracing::warn!("Skipping precinct {} with no geocoded doors", group.precinct);
            }
            keep
        })
        .map(Partition::Precinct)
        .collect()
}

/// Groups geocoded, household-bearing voters by precinct, centered on the mean
/// of their coordinates. Sources without a native aggregate can use this.
pub fn group_by_precinct(voters: &[Voter]) -> Vec<PrecinctGroup> {
    struct Acc<'a> {
        lat: f64,
        lng: f64,
        voter_ids: Vec<String>,
        households: HashSet<&'a str>,
    }

    let mut by_precinct: BTreeMap<&str, Acc<'_>> = BTreeMap::new();
    for voter in voters {
        let (Some(precinct), Some(household), Some(location)) = (
            voter.precinct.as_deref().filter(|p| !p.trim().is_empty()),
            voter.household_key(),
            voter.location(),
        ) else {
            continue;
        };

        let acc = by_precinct.entry(precinct).or_insert_with(|| Acc {
            lat: 0.0,
            lng: 0.0,
            voter_ids: Vec::new(),
            households: HashSet::new(),
        });
        acc.lat += location.lat;
        acc.lng += location.lng;
        acc.voter_ids.push(voter.id.clone());
        acc.households.insert(household);
    }

    by_precinct
        .into_iter()
        .map(|(precinct, acc)| {
            let n = acc.voter_ids.len() as f64;
            PrecinctGroup {
                precinct: precinct.to_string(),
                center: LatLng::new(acc.lat / n, acc.lng / n),
                door_count: acc.households.len(),
                voter_ids: acc.voter_ids,
            }
        })
        .collect()
}
