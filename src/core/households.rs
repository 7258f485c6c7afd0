use crate::domain::model::{Household, Voter};
use std::collections::HashMap;

/// Collapses list members into doors, keeping first-seen order and coordinates.
///
/// Voters without a household key cannot be turfed automatically and are skipped,
/// as are voters without usable coordinates.
pub fn aggregate_households(voters: &[Voter]) -> Vec<Household> {
    aggregate(voters, false)
}

/// Like [`aggregate_households`], but a voter without a household key becomes
/// a door of its own. Used for walk routes and drawn turfs.
pub fn aggregate_doors(voters: &[Voter]) -> Vec<Household> {
    aggregate(voters, true)
}

fn aggregate(voters: &[Voter], keyless_as_own_door: bool) -> Vec<Household> {
    let mut households: Vec<Household> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut missing_location = 0usize;
    let mut missing_key = 0usize;

    for voter in voters {
        let Some(location) = voter.location() else {
            missing_location += 1;
            continue;
        };

        let key = match voter.household_key() {
            Some(key) => key.to_string(),
            None if keyless_as_own_door => format!("voter:{}", voter.id),
            None => {
                missing_key += 1;
                continue;
            }
        };

        match index.get(&key) {
            Some(&i) => households[i].member_voter_ids.push(voter.id.clone()),
            None => {
                index.insert(key.clone(), households.len());
                households.push(Household {
                    id: key,
                    location,
                    member_voter_ids: vec![voter.id.clone()],
                });
            }
        }
    }

    if missing_location > 0 || missing_key > 0 {
        tracing::debug!(
            "Skipped {} voters without coordinates and {} without a household key",
            missing_location,
            missing_key
        );
    }

    households
}
