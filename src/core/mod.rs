pub mod clustering;
pub mod distance;
pub mod engine;
pub mod households;
pub mod partition;
pub mod polygon;
pub mod precinct;
pub mod routing;

pub use crate::domain::model::{Household, LatLng, Route, Turf, Voter};
pub use crate::domain::ports::{MembershipStore, SettingsProvider, TurfStore, VoterSource};
pub use crate::utils::error::Result;
