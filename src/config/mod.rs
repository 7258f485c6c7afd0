#[cfg(feature = "cli")]
pub mod cli;
pub mod toml_config;

#[cfg(feature = "cli")]
pub use cli::CliConfig;
pub use toml_config::TurfConfig;

use crate::core::SettingsProvider;
use crate::domain::model::CutMethod;
use crate::utils::error::Result;
use crate::utils::validation::{validate_positive_number, validate_range, Validate};
use serde::{Deserialize, Serialize};

/// Tunables of the turf engine. Every field has a default, so an empty
/// `[engine]` table is valid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    pub doors_per_turf: usize,
    pub method: CutMethod,
    pub max_iterations: usize,
    pub convergence_tolerance: f64,
    pub dwell_minutes: f64,
    pub walking_speed_m_per_min: f64,
    /// Turfs with more doors are routed on a blocking worker thread.
    pub blocking_route_threshold: usize,
    pub max_route_doors: usize,
    pub seed: Option<u64>,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            doors_per_turf: 50,
            method: CutMethod::Cluster,
            max_iterations: 50,
            convergence_tolerance: 0.0001,
            dwell_minutes: 3.0,
            walking_speed_m_per_min: 80.0,
            blocking_route_threshold: 2000,
            max_route_doors: 20000,
            seed: None,
        }
    }
}

impl Validate for EngineSettings {
    fn validate(&self) -> Result<()> {
        validate_positive_number("engine.doors_per_turf", self.doors_per_turf, 1)?;
        validate_positive_number("engine.max_iterations", self.max_iterations, 1)?;
        validate_range("engine.convergence_tolerance", self.convergence_tolerance, 0.0, 1.0)?;
        validate_range("engine.dwell_minutes", self.dwell_minutes, 0.0, 120.0)?;
        validate_range(
            "engine.walking_speed_m_per_min",
            self.walking_speed_m_per_min,
            1.0,
            1000.0,
        )?;
        validate_positive_number("engine.max_route_doors", self.max_route_doors, 1)?;
        if self.method == CutMethod::Manual {
            return Err(crate::utils::error::TurfError::InvalidConfigValueError {
                field: "engine.method".to_string(),
                value: self.method.to_string(),
                reason: "default auto-cut method must be 'cluster' or 'precinct'".to_string(),
            });
        }
        Ok(())
    }
}

impl SettingsProvider for EngineSettings {
    fn doors_per_turf(&self) -> usize {
        self.doors_per_turf
    }

    fn max_iterations(&self) -> usize {
        self.max_iterations
    }

    fn convergence_tolerance(&self) -> f64 {
        self.convergence_tolerance
    }

    fn dwell_minutes(&self) -> f64 {
        self.dwell_minutes
    }

    fn walking_speed_m_per_min(&self) -> f64 {
        self.walking_speed_m_per_min
    }

    fn blocking_route_threshold(&self) -> usize {
        self.blocking_route_threshold
    }

    fn max_route_doors(&self) -> usize {
        self.max_route_doors
    }

    fn seed(&self) -> Option<u64> {
        self.seed
    }
}
