// src/config.rs
use crate::table::row::{ColumnLayout, ColumnWidths};
use crate::table::TableDefinition;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Where the feed comes from. Without `url` the file at `path` is read as is;
/// with it, the download is stored at `path` first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Source {
    #[serde(default)]
    pub url: Option<String>,
    pub path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub source: Source,
    pub output: PathBuf,
    /// Document title printed on the first page.
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub columns: Option<ColumnLayout>,
    /// Table filters, in print order.
    pub tables: Vec<TableDefinition>,
}

impl Config {
    /// Read and validate the YAML config at `path`.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text =
            fs::read_to_string(path).with_context(|| format!("reading config {:?}", path))?;
        Self::from_yaml(&text).with_context(|| format!("loading config {:?}", path))
    }

    pub fn from_yaml(text: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(text).context("parsing config YAML")?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.tables.is_empty() {
            bail!("config defines no tables");
        }
        let mut seen = HashSet::new();
        for table in &self.tables {
            if table.name.trim().is_empty() {
                bail!("table with empty name");
            }
            if !seen.insert(table.name.as_str()) {
                bail!("duplicate table name {:?}", table.name);
            }
            if table.activities.is_empty() {
                bail!("table {:?} lists no activities", table.name);
            }
        }
        self.column_widths()?;
        Ok(())
    }

    /// Column widths from the configured layout, or the default layout.
    pub fn column_widths(&self) -> Result<ColumnWidths> {
        match &self.columns {
            Some(layout) => Ok(ColumnWidths::from_layout(layout)?),
            None => Ok(ColumnWidths::default()),
        }
    }
}
