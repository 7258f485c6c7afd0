use thiserror::Error;

#[derive(Error, Debug)]
pub enum TurfError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Background task failed: {0}")]
    TaskError(#[from] tokio::task::JoinError),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing configuration field: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Validation error on {field}: {message}")]
    ValidationError { field: String, message: String },

    #[error("Invalid polygon: {reason}")]
    InvalidPolygon { reason: String },

    #[error("Nothing to cut for list {list_id}: {reason}")]
    NothingToCut { list_id: String, reason: String },

    #[error("No voters of list {list_id} fall inside the polygon")]
    NoVotersInPolygon { list_id: String },

    #[error("Turf {turf_id} not found")]
    TurfNotFound { turf_id: u64 },

    #[error("Turf {turf_id} has {doors} doors, above the routing limit of {limit}")]
    RouteTooLarge {
        turf_id: u64,
        doors: usize,
        limit: usize,
    },

    #[error("Store operation '{operation}' failed: {message}")]
    StoreError { operation: String, message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Validation,
    EmptyResult,
    NotFound,
    Persistence,
    Configuration,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl TurfError {
    pub fn validation(field: &str, message: impl Into<String>) -> Self {
        Self::ValidationError {
            field: field.to_string(),
            message: message.into(),
        }
    }

    pub fn store(operation: &str, message: impl Into<String>) -> Self {
        Self::StoreError {
            operation: operation.to_string(),
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::ValidationError { .. } | Self::InvalidPolygon { .. } => ErrorCategory::Validation,
            Self::NothingToCut { .. } | Self::NoVotersInPolygon { .. } => {
                ErrorCategory::EmptyResult
            }
            Self::TurfNotFound { .. } => ErrorCategory::NotFound,
            Self::StoreError { .. } | Self::RouteTooLarge { .. } => ErrorCategory::Persistence,
            Self::ConfigError { .. }
            | Self::MissingConfigError { .. }
            | Self::InvalidConfigValueError { .. } => ErrorCategory::Configuration,
            Self::IoError(_)
            | Self::SerializationError(_)
            | Self::CsvError(_)
            | Self::TaskError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::EmptyResult => ErrorSeverity::Low,
            ErrorCategory::NotFound | ErrorCategory::Persistence => ErrorSeverity::Medium,
            ErrorCategory::Validation | ErrorCategory::Configuration => ErrorSeverity::High,
            ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    /// True for well-formed requests that simply had nothing to act on.
    pub fn is_empty_result(&self) -> bool {
        self.category() == ErrorCategory::EmptyResult
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            Self::NothingToCut { .. } => {
                "Geocode the list's addresses or pick a list with household keys".to_string()
            }
            Self::NoVotersInPolygon { .. } => {
                "Redraw the polygon around geocoded voters of this list".to_string()
            }
            Self::InvalidPolygon { .. } => {
                "Send a GeoJSON Polygon with at least three [lng, lat] vertices".to_string()
            }
            Self::ValidationError { field, .. } => format!("Check the value of '{}'", field),
            Self::TurfNotFound { .. } => "Refresh the turf list; it may have been deleted".to_string(),
            Self::RouteTooLarge { .. } => {
                "Cut the turf into smaller turfs before requesting a walk route".to_string()
            }
            Self::StoreError { .. } => "Retry the operation; the store may be unavailable".to_string(),
            Self::MissingConfigError { field } => format!("Add '{}' to the configuration", field),
            Self::InvalidConfigValueError { field, .. } => {
                format!("Fix '{}' in the configuration file", field)
            }
            Self::ConfigError { .. } => "Check the configuration file syntax".to_string(),
            Self::CsvError(_) => {
                "Check the voter CSV header: list_id,voter_id,household_key,lat,lng,precinct,sort_order"
                    .to_string()
            }
            Self::IoError(_) => "Check that the file exists and is readable".to_string(),
            Self::SerializationError(_) => "Check that the input is valid JSON".to_string(),
            Self::TaskError(_) => "Retry; a background worker was interrupted".to_string(),
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Validation => format!("Invalid request: {}", self),
            ErrorCategory::EmptyResult => format!("Nothing to do: {}", self),
            ErrorCategory::NotFound => self.to_string(),
            ErrorCategory::Persistence => format!("Could not save turfs: {}", self),
            ErrorCategory::Configuration => format!("Configuration problem: {}", self),
            ErrorCategory::System => format!("System error: {}", self),
        }
    }
}

pub type Result<T> = std::result::Result<T, TurfError>;
