//! Application configuration, read from a TOML secrets file.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::Deserialize;

use crate::data::auth::ServiceAccountKey;
use crate::data::cache::DEFAULT_TTL;
use crate::data::fetcher::{CsvFileFetcher, SheetLocator, SheetsFetcher, TableFetcher};

/// Environment variable naming the config file.
pub const CONFIG_ENV: &str = "THESIS_SEARCH_CONFIG";
pub const DEFAULT_CONFIG_FILE: &str = "secrets.toml";

fn default_worksheet() -> String {
    "Sheet1".to_string()
}

fn default_ttl_secs() -> u64 {
    DEFAULT_TTL.as_secs()
}

fn default_api_base() -> String {
    "https://sheets.googleapis.com".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Link to the spreadsheet (or its bare id).
    #[serde(default)]
    pub spreadsheet_url: Option<String>,
    #[serde(default = "default_worksheet")]
    pub worksheet: String,
    #[serde(default = "default_ttl_secs")]
    pub cache_ttl_secs: u64,
    #[serde(default = "default_api_base")]
    pub api_base: String,
    /// Local CSV export to read instead of the remote sheet.
    #[serde(default)]
    pub csv_path: Option<PathBuf>,
    /// Font with CJK glyphs for the column headers and records.
    #[serde(default)]
    pub font_path: Option<PathBuf>,
    #[serde(default)]
    pub gcp_service_account: Option<ServiceAccountKey>,
}

impl AppConfig {
    /// Load from `$THESIS_SEARCH_CONFIG`, falling back to `./secrets.toml`.
    pub fn load() -> Result<Self> {
        let path = std::env::var_os(CONFIG_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
        Self::from_file(&path)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        Self::from_toml(&content).with_context(|| format!("parsing {}", path.display()))
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        Ok(config)
    }

    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    /// Build the data source this config describes. A CSV snapshot wins over
    /// the remote sheet.
    pub fn fetcher(&self) -> Result<Box<dyn TableFetcher>> {
        if let Some(path) = &self.csv_path {
            return Ok(Box::new(CsvFileFetcher::new(path)));
        }

        let Some(url) = &self.spreadsheet_url else {
            bail!("neither `csv_path` nor `spreadsheet_url` is set");
        };
        let Some(key) = &self.gcp_service_account else {
            bail!("`spreadsheet_url` is set but the [gcp_service_account] table is missing");
        };

        let locator = SheetLocator {
            url: url.clone(),
            worksheet: self.worksheet.clone(),
        };
        // Surface a bad URL at startup rather than on first fetch.
        locator.spreadsheet_id()?;

        let fetcher = SheetsFetcher::new(key.clone(), locator, self.api_base.clone())
            .context("building HTTP client")?;
        Ok(Box::new(fetcher))
    }
}
