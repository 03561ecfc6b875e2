use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Name of the optional configuration file in the base directory.
pub const CONFIG_FILE_NAME: &str = "tillbook.toml";

/// Locations of ledgers and generated documents under one base directory.
/// Resolved once at startup and passed to everything that touches disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataPaths {
    base: PathBuf,
}

impl DataPaths {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    /// Use the explicit directory when given (flag or `TILLBOOK_HOME`),
    /// otherwise the current working directory.
    pub fn resolve(explicit: Option<PathBuf>) -> Result<Self> {
        let base = match explicit {
            Some(dir) => dir,
            None => std::env::current_dir().context("Failed to determine current directory")?,
        };
        Ok(Self::new(base))
    }

    pub fn data_dir(&self) -> PathBuf {
        self.base.join("data")
    }

    pub fn documents_dir(&self) -> PathBuf {
        self.base.join("invoices")
    }

    pub fn products_file(&self) -> PathBuf {
        self.data_dir().join("products.csv")
    }

    pub fn sales_file(&self) -> PathBuf {
        self.data_dir().join("sales.csv")
    }

    pub fn expenses_file(&self) -> PathBuf {
        self.data_dir().join("expenses.csv")
    }

    /// Last catalog id handed out, kept beside the catalog.
    pub fn catalog_sequence_file(&self) -> PathBuf {
        self.data_dir().join("catalog.seq")
    }

    pub fn config_file(&self) -> PathBuf {
        self.base.join(CONFIG_FILE_NAME)
    }
}

/// Contents of `tillbook.toml`. Every section is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub business: BusinessProfile,
    pub documents: DocumentSettings,
}

/// Business details printed in document headers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BusinessProfile {
    pub name: String,
    pub address: String,
    pub phone: String,
}

impl Default for BusinessProfile {
    fn default() -> Self {
        Self {
            name: "My Business".to_string(),
            address: String::new(),
            phone: String::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFormat {
    #[default]
    Text,
    Json,
}

impl DocumentFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            DocumentFormat::Text => "txt",
            DocumentFormat::Json => "json",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentSettings {
    pub format: DocumentFormat,
}

impl AppConfig {
    /// Load the configuration for `paths`, falling back to defaults when no file exists.
    pub fn load(paths: &DataPaths) -> Result<Self> {
        let path = paths.config_file();
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_toml(&content)
            .with_context(|| format!("Invalid config file {}", path.display()))
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Write this configuration to `tillbook.toml` unless the file already exists.
    /// Returns whether a file was written.
    pub fn write_if_missing(&self, paths: &DataPaths) -> Result<bool> {
        let path = paths.config_file();
        if path.exists() {
            return Ok(false);
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(&path, content)
            .with_context(|| format!("Failed to write config file {}", path.display()))?;
        tracing::info!(path = %path.display(), "wrote default config");
        Ok(true)
    }
}
