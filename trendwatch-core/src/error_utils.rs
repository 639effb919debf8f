use crate::error::*;
use tracing::{error, info, warn};

pub trait ErrorExt {
    fn log_error(&self) -> &Self;
    fn log_warn(&self) -> &Self;
    fn is_retryable(&self) -> bool;
    fn user_friendly_message(&self) -> String;
    fn error_code(&self) -> String;
}

impl ErrorExt for CoreError {
    fn log_error(&self) -> &Self {
        error!("CoreError: {}", self);
        match self {
            CoreError::SocialApi(e) => {
                error!("Social API error details: {:?}", e);
            }
            CoreError::Database(e) => {
                error!("Database error details: {:?}", e);
            }
            CoreError::Export(e) => {
                error!("Export error details: {:?}", e);
            }
            CoreError::Config(e) => {
                error!("Configuration error details: {:?}", e);
            }
            _ => {}
        }
        self
    }

    fn log_warn(&self) -> &Self {
        warn!("CoreError (warning): {}", self);
        self
    }

    fn is_retryable(&self) -> bool {
        match self {
            CoreError::SocialApi(e) => e.is_retryable(),
            CoreError::Database(e) => e.is_retryable(),
            CoreError::Network(e) => e.is_timeout() || e.is_connect(),
            _ => false,
        }
    }

    fn user_friendly_message(&self) -> String {
        match self {
            CoreError::SocialApi(e) => e.user_friendly_message(),
            CoreError::Database(e) => e.user_friendly_message(),
            CoreError::Export(e) => e.user_friendly_message(),
            CoreError::Config(e) => e.user_friendly_message(),
            CoreError::Sentiment(_) => {
                "Sentiment classification failed; the post was counted as neutral.".to_string()
            }
            CoreError::Network(_) => {
                "Network connection error. Please check your internet connection.".to_string()
            }
            CoreError::InvalidInput { message } => format!("Invalid input: {}", message),
            _ => "An unexpected error occurred. Please try again later.".to_string(),
        }
    }

    fn error_code(&self) -> String {
        match self {
            CoreError::SocialApi(_) => "SOCIAL_API".to_string(),
            CoreError::Database(_) => "DATABASE".to_string(),
            CoreError::Export(_) => "EXPORT".to_string(),
            CoreError::Sentiment(_) => "SENTIMENT".to_string(),
            CoreError::Config(_) => "CONFIG".to_string(),
            CoreError::Io(_) => "IO".to_string(),
            CoreError::Serialization(_) => "SERIALIZATION".to_string(),
            CoreError::Network(_) => "NETWORK".to_string(),
            CoreError::InvalidInput { .. } => "INVALID_INPUT".to_string(),
            CoreError::Internal { .. } => "INTERNAL".to_string(),
        }
    }
}

impl ErrorExt for SocialApiError {
    fn log_error(&self) -> &Self {
        error!("SocialApiError: {}", self);
        self
    }

    fn log_warn(&self) -> &Self {
        warn!("SocialApiError (warning): {}", self);
        self
    }

    /// Only a throttling signal that names its reset time is worth waiting on.
    fn is_retryable(&self) -> bool {
        matches!(
            self,
            SocialApiError::RateLimitExceeded {
                reset_at: Some(_)
            }
        )
    }

    fn user_friendly_message(&self) -> String {
        match self {
            SocialApiError::RateLimitExceeded {
                reset_at: Some(reset),
            } => format!(
                "Too many requests. The rate limit window resets at epoch {}.",
                reset
            ),
            SocialApiError::RateLimitExceeded { reset_at: None } => {
                "Too many requests and no reset time was provided.".to_string()
            }
            SocialApiError::Unauthorized { .. } => {
                "Authentication failed. Please check your credentials or token.".to_string()
            }
            SocialApiError::Forbidden { resource } => format!(
                "Access denied to {}. Your access level might be limited.",
                resource
            ),
            SocialApiError::NotFound { resource } => format!("Could not find: {}", resource),
            SocialApiError::RequestTimeout => {
                "Request to the social API timed out. Please try again.".to_string()
            }
            _ => "Social API error occurred. Please try again later.".to_string(),
        }
    }

    fn error_code(&self) -> String {
        match self {
            SocialApiError::RateLimitExceeded { .. } => "SOCIAL_RATE_LIMIT".to_string(),
            SocialApiError::Unauthorized { .. } => "SOCIAL_UNAUTHORIZED".to_string(),
            SocialApiError::Forbidden { .. } => "SOCIAL_FORBIDDEN".to_string(),
            SocialApiError::NotFound { .. } => "SOCIAL_NOT_FOUND".to_string(),
            SocialApiError::RequestTimeout => "SOCIAL_TIMEOUT".to_string(),
            SocialApiError::InvalidResponse { .. } => "SOCIAL_INVALID_RESPONSE".to_string(),
            SocialApiError::ServerError { .. } => "SOCIAL_SERVER_ERROR".to_string(),
            SocialApiError::UnexpectedStatus { .. } => "SOCIAL_UNEXPECTED_STATUS".to_string(),
        }
    }
}

impl ErrorExt for DatabaseError {
    fn log_error(&self) -> &Self {
        error!("DatabaseError: {}", self);
        self
    }

    fn log_warn(&self) -> &Self {
        warn!("DatabaseError (warning): {}", self);
        self
    }

    fn is_retryable(&self) -> bool {
        matches!(self, DatabaseError::DatabaseLocked)
    }

    fn user_friendly_message(&self) -> String {
        match self {
            DatabaseError::ConnectionFailed { .. } => {
                "Could not open the trend database. Please check the database path.".to_string()
            }
            DatabaseError::MigrationFailed { .. } => {
                "Trend database schema could not be prepared.".to_string()
            }
            DatabaseError::DatabaseLocked => {
                "Trend database is busy. Is another run in progress?".to_string()
            }
            DatabaseError::CorruptRow { table, .. } => {
                format!("Stored data in '{}' could not be read.", table)
            }
            _ => "Database error occurred. The run's trend record was not saved.".to_string(),
        }
    }

    fn error_code(&self) -> String {
        match self {
            DatabaseError::ConnectionFailed { .. } => "DB_CONNECTION_FAILED".to_string(),
            DatabaseError::MigrationFailed { .. } => "DB_MIGRATION_FAILED".to_string(),
            DatabaseError::QueryFailed { .. } => "DB_QUERY_FAILED".to_string(),
            DatabaseError::CorruptRow { .. } => "DB_CORRUPT_ROW".to_string(),
            DatabaseError::DatabaseLocked => "DB_LOCKED".to_string(),
            DatabaseError::Sql(_) => "DB_SQL_ERROR".to_string(),
        }
    }
}

impl ErrorExt for ExportError {
    fn log_error(&self) -> &Self {
        error!("ExportError: {}", self);
        self
    }

    fn log_warn(&self) -> &Self {
        warn!("ExportError (warning): {}", self);
        self
    }

    fn is_retryable(&self) -> bool {
        false
    }

    fn user_friendly_message(&self) -> String {
        match self {
            ExportError::OpenFailed { path, .. } => {
                format!("Could not open the report file '{}'.", path)
            }
            ExportError::ReadFailed { path, .. } => {
                format!("Could not read the report file '{}'.", path)
            }
            ExportError::Csv(_) => "Could not write the report row.".to_string(),
        }
    }

    fn error_code(&self) -> String {
        match self {
            ExportError::OpenFailed { .. } => "EXPORT_OPEN_FAILED".to_string(),
            ExportError::ReadFailed { .. } => "EXPORT_READ_FAILED".to_string(),
            ExportError::Csv(_) => "EXPORT_CSV_ERROR".to_string(),
        }
    }
}

impl ErrorExt for ConfigError {
    fn log_error(&self) -> &Self {
        error!("ConfigError: {}", self);
        self
    }

    fn log_warn(&self) -> &Self {
        warn!("ConfigError (warning): {}", self);
        self
    }

    fn is_retryable(&self) -> bool {
        false
    }

    fn user_friendly_message(&self) -> String {
        match self {
            ConfigError::FileNotFound { path } => {
                format!("Configuration file '{}' not found.", path)
            }
            ConfigError::MissingField { field } => {
                format!("Required configuration field '{}' is missing.", field)
            }
            ConfigError::InvalidValue { field, .. } => {
                format!("Invalid value for configuration field '{}'.", field)
            }
            ConfigError::MissingEnvironmentVariable { var_name } => format!(
                "Environment variable '{}' is required but not set.",
                var_name
            ),
            ConfigError::Parse(_) => {
                "Configuration file format is invalid. Please check the settings.".to_string()
            }
        }
    }

    fn error_code(&self) -> String {
        match self {
            ConfigError::FileNotFound { .. } => "CONFIG_FILE_NOT_FOUND".to_string(),
            ConfigError::MissingField { .. } => "CONFIG_MISSING_FIELD".to_string(),
            ConfigError::InvalidValue { .. } => "CONFIG_INVALID_VALUE".to_string(),
            ConfigError::MissingEnvironmentVariable { .. } => "CONFIG_MISSING_ENV_VAR".to_string(),
            ConfigError::Parse(_) => "CONFIG_PARSE_ERROR".to_string(),
        }
    }
}

pub struct ErrorReporter {
    report_errors: bool,
    report_warnings: bool,
}

impl ErrorReporter {
    pub fn new() -> Self {
        Self {
            report_errors: true,
            report_warnings: true,
        }
    }

    pub fn with_error_reporting(mut self, enabled: bool) -> Self {
        self.report_errors = enabled;
        self
    }

    pub fn with_warning_reporting(mut self, enabled: bool) -> Self {
        self.report_warnings = enabled;
        self
    }

    pub fn report_error(&self, error: &CoreError) {
        if self.report_errors {
            error.log_error();
            info!("Error code: {}", error.error_code());
            info!("User message: {}", error.user_friendly_message());
        }
    }

    pub fn report_warning(&self, error: &CoreError) {
        if self.report_warnings {
            error.log_warn();
        }
    }
}

impl Default for ErrorReporter {
    fn default() -> Self {
        Self::new()
    }
}
