use std::env;
use std::net::SocketAddr;

use crate::calendar::WeekStart;
use crate::error::AppError;
use crate::records::RecordConfig;

const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DataSource {
    /// Seed dataset held in memory.
    Mock,
    Remote(RecordConfig),
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub data_source: DataSource,
    pub bind_addr: SocketAddr,
    pub week_start: WeekStart,
}

impl AppConfig {
    /// Reads the process environment, after loading `.env` when present.
    pub fn new_from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();
        Self::from_vars(|key| env::var(key).ok())
    }

    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let data_source = match var("DATA_SOURCE").as_deref().map(str::trim) {
            None | Some("") | Some("mock") => DataSource::Mock,
            Some("remote") => DataSource::Remote(RecordConfig::from_vars(&var)?),
            Some(other) => {
                return Err(AppError::Config(format!(
                    "unsupported DATA_SOURCE '{}', expected mock or remote",
                    other
                )));
            }
        };

        let bind_addr = var("BIND_ADDR")
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string())
            .parse::<SocketAddr>()
            .map_err(|e| AppError::Config(format!("invalid BIND_ADDR: {}", e)))?;

        let week_start = match var("CALENDAR_WEEK_START") {
            Some(value) => value.parse()?,
            None => WeekStart::default(),
        };

        Ok(Self {
            data_source,
            bind_addr,
            week_start,
        })
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_source: DataSource::Mock,
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            week_start: WeekStart::Sunday,
        }
    }
}
