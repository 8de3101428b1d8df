use std::path::PathBuf;

use festflow_core::config::{PipelineConfig, Preset};
use festflow_core::error::CoreError;
use festflow_sources::events::DateWindow;
use festflow_sources::stops::TFE_STOPS_URL;
use festflow_sources::timestamps::parse_bound;

/// Server configuration loaded from environment variables.
///
/// All fields have defaults suitable for local development.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `8000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS`.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                                        |
    /// |------------------------|------------------------------------------------|
    /// | `HOST`                 | `0.0.0.0`                                      |
    /// | `PORT`                 | `8000`                                         |
    /// | `CORS_ORIGINS`         | `http://localhost:3000,http://localhost:5173`  |
    /// | `REQUEST_TIMEOUT_SECS` | `30`                                           |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "8000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:3000,http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
        }
    }
}

/// Where transit stops come from.
#[derive(Debug, Clone, PartialEq)]
pub enum StopsSetting {
    /// Deterministic demo stops around the median venue.
    Demo,
    /// A local TfE-shaped JSON file.
    File(PathBuf),
    /// The live TfE API.
    Live(String),
}

/// Data-source and pipeline settings.
#[derive(Debug, Clone, PartialEq)]
pub struct DataConfig {
    pub events_path: PathBuf,
    pub stops: StopsSetting,
    /// Optional `{stop_id: ["HH:MM", ...]}` timetable file.
    pub timetable_path: Option<PathBuf>,
    pub preset: Preset,
    pub stop_radius_m: Option<f64>,
    pub window: DateWindow,
}

impl DataConfig {
    /// Load from the process environment.
    ///
    /// | Env Var              | Default                        |
    /// |----------------------|--------------------------------|
    /// | `EVENTS_PATH`        | `data/events.json`             |
    /// | `OFFLINE_STOPS`      | `false`                        |
    /// | `STOPS_PATH`         | unset                          |
    /// | `STOPS_URL`          | TfE open-data stops endpoint   |
    /// | `TIMETABLE_PATH`     | unset                          |
    /// | `PIPELINE_PRESET`    | `optimisation`                 |
    /// | `STOP_RADIUS_METERS` | preset value                   |
    /// | `EVENTS_FROM`        | unbounded                      |
    /// | `EVENTS_TO`          | unbounded                      |
    ///
    /// Panics on malformed values so misconfiguration fails at startup.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
            .unwrap_or_else(|e| panic!("Invalid data configuration: {e}"))
    }

    /// Build from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, CoreError> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let offline = var("OFFLINE_STOPS")
            .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);
        let stops = if offline {
            StopsSetting::Demo
        } else if let Some(path) = var("STOPS_PATH") {
            StopsSetting::File(PathBuf::from(path))
        } else {
            StopsSetting::Live(var("STOPS_URL").unwrap_or_else(|| TFE_STOPS_URL.to_string()))
        };

        let preset = match var("PIPELINE_PRESET") {
            Some(raw) => raw.parse::<Preset>()?,
            None => Preset::Optimisation,
        };

        let stop_radius_m = var("STOP_RADIUS_METERS")
            .map(|raw| {
                raw.trim().parse::<f64>().map_err(|_| {
                    CoreError::Validation(format!("STOP_RADIUS_METERS must be a number, got '{raw}'"))
                })
            })
            .transpose()?;

        let bound = |key: &str| {
            var(key)
                .map(|raw| {
                    parse_bound(&raw).ok_or_else(|| {
                        CoreError::Validation(format!("{key} must be a date or timestamp, got '{raw}'"))
                    })
                })
                .transpose()
        };
        let window = DateWindow {
            from: bound("EVENTS_FROM")?,
            to: bound("EVENTS_TO")?,
        };

        Ok(Self {
            events_path: PathBuf::from(var("EVENTS_PATH").unwrap_or_else(|| "data/events.json".into())),
            stops,
            timetable_path: var("TIMETABLE_PATH").map(PathBuf::from),
            preset,
            stop_radius_m,
            window,
        })
    }

    /// The preset with any radius override applied, validated.
    pub fn pipeline_config(&self) -> Result<PipelineConfig, CoreError> {
        let mut config = self.preset.config();
        if let Some(radius) = self.stop_radius_m {
            config.stop_radius_m = radius;
        }
        config.validate()?;
        Ok(config)
    }
}
