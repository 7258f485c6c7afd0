pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;
pub use config::{EngineSettings, TurfConfig};

pub use adapters::InMemoryStore;
pub use core::engine::TurfEngine;
pub use domain::model::{CutMethod, CutSummary, Route, Turf};
pub use utils::error::{Result, TurfError};
