use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{ArgAction, Parser};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::country::Country;
use crate::utils::error::ConfigurationError;
use crate::watchlist::DEFAULT_MAX_LISTINGS;

/// Neither periodic task may run more often than this.
pub const MIN_INTERVAL_SECS: u64 = 2;

const DISCORD_WEBHOOK_PREFIX: &str = "https://discord.com/api/webhooks/";

/// Command line flags. Anything left unset falls through to the config file,
/// the environment and finally the built-in defaults.
#[derive(Debug, Clone, Default, Parser)]
#[command(name = "lv-stock-watcher", version, about = "Louis Vuitton product availability monitor")]
pub struct CliArgs {
    /// Country code to check availability for, two letters, any case
    #[arg(long)]
    pub country: Option<String>,

    /// Name of file to load product URLs from
    #[arg(long)]
    pub filename: Option<PathBuf>,

    /// Attempt to open the product URL in your browser when it comes in stock
    #[arg(long, action = ArgAction::Set, value_name = "BOOL")]
    pub browser: Option<bool>,

    /// Attempt to notify via desktop notification when a product comes in stock
    #[arg(long, action = ArgAction::Set, value_name = "BOOL")]
    pub notify: Option<bool>,

    /// Seconds between reloads of the product file
    #[arg(long, value_name = "SECS")]
    pub pfilecheck: Option<u64>,

    /// Seconds between product availability checks
    #[arg(long, value_name = "SECS")]
    pub availabilitycheck: Option<u64>,

    /// Optional TOML configuration file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub country: String,
    pub watchlist: WatchlistConfig,
    pub probe: ProbeConfig,
    pub alerts: AlertsConfig,
    pub display: DisplayConfig,
    pub logging: LoggingConfig,
    pub shutdown_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchlistConfig {
    pub path: PathBuf,
    pub reload_interval_secs: u64,
    pub max_listings: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeConfig {
    pub interval_secs: u64,
    pub request_timeout_secs: u64,
    pub api_base_url: String,
    pub concurrency: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertsConfig {
    pub desktop: bool,
    pub browser: bool,
    pub discord_webhook_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplayConfig {
    pub status_table: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub directory: Option<PathBuf>,
}

/// Timing and sizing knobs the monitor loop needs, derived from [`AppConfig`].
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    pub watchlist_path: PathBuf,
    pub max_listings: usize,
    pub reload_interval: Duration,
    pub probe_interval: Duration,
    pub probe_concurrency: usize,
    pub shutdown_timeout: Duration,
    pub status_table: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            country: "dk".to_string(),
            watchlist: WatchlistConfig::default(),
            probe: ProbeConfig::default(),
            alerts: AlertsConfig::default(),
            display: DisplayConfig::default(),
            logging: LoggingConfig::default(),
            shutdown_timeout_secs: 5,
        }
    }
}

impl Default for WatchlistConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("products.txt"),
            reload_interval_secs: 10,
            max_listings: DEFAULT_MAX_LISTINGS,
        }
    }
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            interval_secs: 30,
            request_timeout_secs: 5,
            api_base_url: "https://api.louisvuitton.com".to_string(),
            concurrency: 4,
        }
    }
}

impl Default for AlertsConfig {
    fn default() -> Self {
        Self {
            desktop: true,
            browser: true,
            discord_webhook_url: None,
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self { status_table: true }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            directory: None,
        }
    }
}

impl AppConfig {
    /// Layers defaults, an optional TOML file, `LVWATCH__*` environment
    /// variables and finally the command line.
    pub fn load(cli: &CliArgs) -> Result<Self, ConfigurationError> {
        let file = match &cli.config {
            Some(path) => File::from(path.as_path()).required(true),
            None => File::with_name("config/local").required(false),
        };

        let s = Config::builder()
            .add_source(Config::try_from(&AppConfig::default())?)
            .add_source(file)
            .add_source(
                Environment::with_prefix("LVWATCH")
                    .separator("__")
                    .try_parsing(true),
            )
            .set_override_option("country", cli.country.clone())?
            .set_override_option(
                "watchlist.path",
                cli.filename.as_ref().map(|p| p.to_string_lossy().into_owned()),
            )?
            .set_override_option("watchlist.reload_interval_secs", cli.pfilecheck.map(|s| s as i64))?
            .set_override_option("probe.interval_secs", cli.availabilitycheck.map(|s| s as i64))?
            .set_override_option("alerts.browser", cli.browser)?
            .set_override_option("alerts.desktop", cli.notify)?
            .set_override_option("logging.level", cli.verbose.then(|| "debug".to_string()))?
            .build()?;

        Ok(s.try_deserialize()?)
    }

    /// Checks every setting, in the order their exit codes are numbered.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        self.country()?;

        if self.probe.interval_secs < MIN_INTERVAL_SECS {
            return Err(ConfigurationError::ProbeIntervalTooShort {
                min: MIN_INTERVAL_SECS,
            });
        }
        if self.watchlist.reload_interval_secs < MIN_INTERVAL_SECS {
            return Err(ConfigurationError::ReloadIntervalTooShort {
                min: MIN_INTERVAL_SECS,
            });
        }

        check_watchlist_file(&self.watchlist.path)?;

        if self.watchlist.max_listings == 0 {
            return Err(ConfigurationError::Invalid(
                "watchlist.max_listings must be greater than 0".into(),
            ));
        }
        if self.probe.request_timeout_secs == 0 {
            return Err(ConfigurationError::Invalid(
                "probe.request_timeout_secs must be greater than 0".into(),
            ));
        }
        if self.probe.concurrency == 0 {
            return Err(ConfigurationError::Invalid(
                "probe.concurrency must be greater than 0".into(),
            ));
        }
        if url::Url::parse(&self.probe.api_base_url).is_err() {
            return Err(ConfigurationError::Invalid(
                "probe.api_base_url is not a valid URL".into(),
            ));
        }
        if let Some(webhook) = &self.alerts.discord_webhook_url {
            if !webhook.starts_with(DISCORD_WEBHOOK_PREFIX) {
                return Err(ConfigurationError::Invalid(
                    "alerts.discord_webhook_url is not a Discord webhook URL".into(),
                ));
            }
        }

        Ok(())
    }

    pub fn country(&self) -> Result<Country, ConfigurationError> {
        Country::parse(&self.country)
    }

    pub fn scheduler(&self) -> SchedulerConfig {
        SchedulerConfig {
            watchlist_path: self.watchlist.path.clone(),
            max_listings: self.watchlist.max_listings,
            reload_interval: Duration::from_secs(self.watchlist.reload_interval_secs),
            probe_interval: Duration::from_secs(self.probe.interval_secs),
            probe_concurrency: self.probe.concurrency,
            shutdown_timeout: Duration::from_secs(self.shutdown_timeout_secs),
            status_table: self.display.status_table,
        }
    }
}

fn check_watchlist_file(path: &Path) -> Result<(), ConfigurationError> {
    let meta = std::fs::metadata(path).map_err(|source| ConfigurationError::WatchlistUnreadable {
        path: path.to_path_buf(),
        source,
    })?;
    if !meta.is_file() {
        return Err(ConfigurationError::WatchlistNotRegularFile {
            path: path.to_path_buf(),
        });
    }
    Ok(())
}
