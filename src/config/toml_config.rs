use crate::config::EngineSettings;
use crate::core::SettingsProvider;
use crate::utils::error::{Result, TurfError};
use crate::utils::validation::{validate_file_extension, validate_path, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurfConfig {
    #[serde(default)]
    pub engine: EngineSettings,
    pub source: SourceConfig,
    pub output: Option<OutputConfig>,
    pub monitoring: Option<MonitoringConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// CSV with columns list_id,voter_id,household_key,lat,lng,precinct,sort_order.
    pub voters_csv: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub path: String,
    pub pretty: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringConfig {
    pub enabled: bool,
    pub log_level: Option<String>,
    pub json_logs: Option<bool>,
}

impl TurfConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| TurfError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${VOTERS_CSV})；未設定的變數保持原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| TurfError::ConfigError {
            message: e.to_string(),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn validate_config(&self) -> Result<()> {
        self.engine.validate()?;

        validate_path("source.voters_csv", &self.source.voters_csv)?;
        validate_file_extension("source.voters_csv", &self.source.voters_csv, &["csv"])?;

        if let Some(output) = &self.output {
            validate_path("output.path", &output.path)?;
        }

        if let Some(level) = self.monitoring.as_ref().and_then(|m| m.log_level.as_deref()) {
            let valid_levels = ["trace", "debug", "info", "warn", "error"];
            if !valid_levels.contains(&level) {
                return Err(TurfError::InvalidConfigValueError {
                    field: "monitoring.log_level".to_string(),
                    value: level.to_string(),
                    reason: format!("Valid levels: {}", valid_levels.join(", ")),
                });
            }
        }

        Ok(())
    }

    pub fn output_path(&self) -> &str {
        self.output.as_ref().map_or("./output", |o| o.path.as_str())
    }

    pub fn pretty_output(&self) -> bool {
        self.output.as_ref().and_then(|o| o.pretty).unwrap_or(true)
    }

    pub fn monitoring_enabled(&self) -> bool {
        self.monitoring.as_ref().is_some_and(|m| m.enabled)
    }

    pub fn json_logs(&self) -> bool {
        self.monitoring
            .as_ref()
            .and_then(|m| m.json_logs)
            .unwrap_or(false)
    }
}

impl SettingsProvider for TurfConfig {
    fn doors_per_turf(&self) -> usize {
        self.engine.doors_per_turf
    }

    fn max_iterations(&self) -> usize {
        self.engine.max_iterations
    }

    fn convergence_tolerance(&self) -> f64 {
        self.engine.convergence_tolerance
    }

    fn dwell_minutes(&self) -> f64 {
        self.engine.dwell_minutes
    }

    fn walking_speed_m_per_min(&self) -> f64 {
        self.engine.walking_speed_m_per_min
    }

    fn blocking_route_threshold(&self) -> usize {
        self.engine.blocking_route_threshold
    }

    fn max_route_doors(&self) -> usize {
        self.engine.max_route_doors
    }

    fn seed(&self) -> Option<u64> {
        self.engine.seed
    }
}

impl Validate for TurfConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
