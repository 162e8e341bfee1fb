use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub data: DataConfig,
    #[serde(default)]
    pub geocoder: GeocoderConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DataConfig {
    pub zip_file: PathBuf,
    pub city_file: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct GeocoderConfig {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_endpoint() -> String {
    "https://nominatim.openstreetmap.org/search".to_string()
}

fn default_user_agent() -> String {
    "usgeo/0.1 (gazetteer fallback)".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for GeocoderConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            user_agent: default_user_agent(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        // Gazetteer files in the working directory, matching the layout the
        // reference data ships in
        Self {
            data: DataConfig {
                zip_file: PathBuf::from("zip_info.txt"),
                city_file: PathBuf::from("city_info.txt"),
            },
            geocoder: GeocoderConfig::default(),
        }
    }
}

impl Config {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path).context("Failed to read config file")?;
        let config: Config = toml::from_str(&content).context("Failed to parse config file")?;
        Ok(config)
    }
}
