use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Social API error: {0}")]
    SocialApi(#[from] SocialApiError),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Export error: {0}")]
    Export(#[from] ExportError),

    #[error("Sentiment error: {0}")]
    Sentiment(#[from] SentimentError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SocialApiError {
    #[error("Rate limit exceeded (reset at {reset_at:?})")]
    RateLimitExceeded { reset_at: Option<i64> },

    #[error("Unauthorized: {reason}")]
    Unauthorized { reason: String },

    #[error("Forbidden access to resource: {resource}")]
    Forbidden { resource: String },

    #[error("Resource not found: {resource}")]
    NotFound { resource: String },

    #[error("Request timeout")]
    RequestTimeout,

    #[error("Invalid API response: {details}")]
    InvalidResponse { details: String },

    #[error("Server error: {status_code}")]
    ServerError { status_code: u16 },

    #[error("Unexpected status {status_code}: {details}")]
    UnexpectedStatus { status_code: u16, details: String },
}

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("Connection failed: {reason}")]
    ConnectionFailed { reason: String },

    #[error("Migration failed: {migration}")]
    MigrationFailed { migration: String },

    #[error("Query execution failed: {query}")]
    QueryFailed { query: String },

    #[error("Corrupt row in {table}: {details}")]
    CorruptRow { table: String, details: String },

    #[error("Database locked")]
    DatabaseLocked,

    #[error("SQL error: {0}")]
    Sql(#[from] sqlx::Error),
}

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Failed to open export file {path}: {reason}")]
    OpenFailed { path: String, reason: String },

    #[error("Failed to read export file {path}: {reason}")]
    ReadFailed { path: String, reason: String },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SentimentError {
    #[error("Empty input text")]
    EmptyInput,

    #[error("Unknown model label: {label}")]
    UnknownLabel { label: String },

    #[error("Lexicon unavailable: {reason}")]
    LexiconUnavailable { reason: String },

    #[error("Model inference failed: {reason}")]
    InferenceFailed { reason: String },
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {path}")]
    FileNotFound { path: String },

    #[error("Missing required field: {field}")]
    MissingField { field: String },

    #[error("Invalid value for {field}: {value}")]
    InvalidValue { field: String, value: String },

    #[error("Environment variable not set: {var_name}")]
    MissingEnvironmentVariable { var_name: String },

    #[error("Configuration parsing error: {0}")]
    Parse(#[from] toml::de::Error),
}
