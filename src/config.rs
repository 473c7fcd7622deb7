use std::{net::SocketAddr, path::PathBuf};

use crate::catalog::MIN_YEAR;
use crate::error::ConfigError;

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_REFERENCE_YEAR: i32 = 2025;
pub const DEFAULT_DASHBOARD_URL: &str = "https://public.tableau.com/views/Book1_17700872354460/Dashboard1?:language=en-US&publish=yes&:sid=&:redirect=auth&:display_count=n&:origin=viz_share_link";

/// Process configuration, read from the environment.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub model_path: PathBuf,
    pub features_path: PathBuf,
    pub bind_addr: SocketAddr,
    pub reference_year: i32,
    pub dashboard_url: String,
    pub brand_popularity_path: Option<PathBuf>,
    pub catalog_path: Option<PathBuf>,
    pub log_predictions: bool,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    /// Build from any key lookup; `from_env` passes `std::env::var`.
    pub fn from_lookup<F>(get: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |k: &str| get(k).filter(|v| !v.trim().is_empty());

        let model_path = get("MODEL_PATH").ok_or(ConfigError::Missing("MODEL_PATH"))?;
        let features_path = get("FEATURES_PATH")
            .or_else(|| get("META_PATH"))
            .ok_or(ConfigError::Missing("FEATURES_PATH"))?;

        let bind_addr = match get("BIND_ADDR") {
            Some(addr) => addr.parse().map_err(|_| ConfigError::Invalid {
                name: "BIND_ADDR",
                value: addr,
            })?,
            None => {
                let port: u16 = parse_or("PORT", get("PORT"), DEFAULT_PORT)?;
                SocketAddr::from(([0, 0, 0, 0], port))
            }
        };

        let reference_year = parse_or("REFERENCE_YEAR", get("REFERENCE_YEAR"), DEFAULT_REFERENCE_YEAR)?;
        // the form's year range is MIN_YEAR..=reference_year
        if reference_year < MIN_YEAR {
            return Err(ConfigError::Invalid {
                name: "REFERENCE_YEAR",
                value: reference_year.to_string(),
            });
        }

        Ok(Self {
            model_path: PathBuf::from(model_path),
            features_path: PathBuf::from(features_path),
            bind_addr,
            reference_year,
            dashboard_url: get("DASHBOARD_URL").unwrap_or_else(|| DEFAULT_DASHBOARD_URL.to_string()),
            brand_popularity_path: get("BRAND_POPULARITY_PATH").map(PathBuf::from),
            catalog_path: get("CATALOG_PATH").map(PathBuf::from),
            log_predictions: get("LOG_PRED").as_deref() == Some("1"),
        })
    }
}

fn parse_or<T: std::str::FromStr>(
    name: &'static str,
    raw: Option<String>,
    default: T,
) -> Result<T, ConfigError> {
    match raw {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
        None => Ok(default),
    }
}
