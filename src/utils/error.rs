use std::path::PathBuf;

use thiserror::Error;

/// Startup-time configuration failures. Each category maps to its own exit code.
#[derive(Error, Debug)]
pub enum ConfigurationError {
    #[error("Invalid country {code:?}. Acceptable values are: {allowed}")]
    InvalidCountry { code: String, allowed: String },

    #[error("Invalid duration for availability interval, must be at least {min} seconds")]
    ProbeIntervalTooShort { min: u64 },

    #[error("Invalid duration for p-file interval, must be at least {min} seconds")]
    ReloadIntervalTooShort { min: u64 },

    #[error(
        "Unable to read p-file {path:?}, please create one, make sure it's readable and point to it with --filename"
    )]
    WatchlistUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("p-file {path:?} does not look like a regular text file")]
    WatchlistNotRegularFile { path: PathBuf },

    #[error("Configuration source error: {0}")]
    Source(#[from] config::ConfigError),

    #[error("Invalid setting: {0}")]
    Invalid(String),
}

impl ConfigurationError {
    pub fn exit_code(&self) -> i32 {
        match self {
            ConfigurationError::InvalidCountry { .. } => 1,
            ConfigurationError::ProbeIntervalTooShort { .. } => 2,
            ConfigurationError::ReloadIntervalTooShort { .. } => 3,
            ConfigurationError::WatchlistUnreadable { .. } => 4,
            ConfigurationError::WatchlistNotRegularFile { .. } => 5,
            ConfigurationError::Source(_) | ConfigurationError::Invalid(_) => 7,
        }
    }
}

/// Exit code used when the monitor loop itself fails after startup.
pub const RUNTIME_EXIT_CODE: i32 = 6;

/// Watch-list loading failures. Cycle-scoped: the registry is left untouched.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Unable to read products file {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Too many products being tracked: {count} listed, at most {max} allowed")]
    TooManyListings { count: usize, max: usize },
}

/// Per-listing availability check failures. Never abort a probe batch.
#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("Invalid URL or no product ID")]
    InvalidListing,

    #[error("HTTP client error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Request unsuccessful, status code is {0}")]
    UnexpectedStatus(u16),

    #[error("Malformed availability response: {0}")]
    MalformedBody(#[from] serde_json::Error),

    #[error("No SKU availability data in response")]
    NoAvailabilityData,
}

/// Alert delivery failures. Always swallowed by the dispatcher after logging.
#[derive(Error, Debug)]
pub enum AlertError {
    #[error("{sink} is not supported on this platform")]
    Unsupported { sink: String },

    #[error("{sink} failed: {message}")]
    Delivery { sink: String, message: String },

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("Load error: {0}")]
    Load(#[from] LoadError),

    #[error("Probe error: {0}")]
    Probe(#[from] ProbeError),

    #[error("Alert error: {0}")]
    Alert(#[from] AlertError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

// Result type alias for convenience
pub type Result<T> = std::result::Result<T, AppError>;
