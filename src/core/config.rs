//! Configuration management with layered hierarchy

use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use crate::core::lock::LockSettings;
use crate::core::mirror::TableKind;
use crate::core::plant::Plant;

/// plantops configuration with layered hierarchy
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Workbook file, relative to the workspace root
    pub workbook: Option<PathBuf>,

    /// Mirror database location, relative to the workspace root
    pub mirror: Option<PathBuf>,

    /// Default operator recorded on movements and orders
    pub operator: Option<String>,

    /// How long to wait for the workbook lock before giving up
    pub lock_timeout_ms: Option<u64>,

    /// Lock retry interval
    pub lock_poll_ms: Option<u64>,

    /// Sheet names backing each mirror table
    pub sheets: Option<SheetNames>,
}

/// The workbook sheet behind each synced mirror table.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SheetNames {
    pub stock_raw: String,
    pub stock_finished: String,
    pub production: String,
    pub orders: String,
}

impl Default for SheetNames {
    fn default() -> Self {
        Self {
            stock_raw: "Raw Materials".to_string(),
            stock_finished: "Finished Goods".to_string(),
            production: "Production".to_string(),
            orders: "Orders".to_string(),
        }
    }
}

impl SheetNames {
    pub fn sheet_for(&self, table: TableKind) -> &str {
        match table {
            TableKind::StockRaw => &self.stock_raw,
            TableKind::StockFinished => &self.stock_finished,
            TableKind::Production => &self.production,
            TableKind::Orders => &self.orders,
        }
    }

    /// All (sheet, table) pairs, in import order.
    pub fn pairs(&self) -> Vec<(String, TableKind)> {
        TableKind::ALL
            .iter()
            .map(|t| (self.sheet_for(*t).to_string(), *t))
            .collect()
    }
}

impl Config {
    /// Load configuration from all sources, merging in priority order
    pub fn load(plant: Option<&Plant>) -> Self {
        let mut config = Config::default();

        // 1. Built-in defaults (already in Default impl)

        // 2. Global user config (~/.config/plantops/config.yaml)
        if let Some(global_path) = Self::global_config_path() {
            if global_path.exists() {
                if let Ok(contents) = std::fs::read_to_string(&global_path) {
                    if let Ok(global) = serde_yml::from_str::<Config>(&contents) {
                        config.merge(global);
                    }
                }
            }
        }

        // 3. Workspace config (.plantops/config.yaml)
        if let Some(plant) = plant {
            let plant_config_path = plant.ops_dir().join("config.yaml");
            if plant_config_path.exists() {
                if let Ok(contents) = std::fs::read_to_string(&plant_config_path) {
                    if let Ok(plant_config) = serde_yml::from_str::<Config>(&contents) {
                        config.merge(plant_config);
                    }
                }
            }
        }

        // 4. Environment variables
        if let Ok(operator) = std::env::var("PLANTOPS_OPERATOR") {
            config.operator = Some(operator);
        }
        if let Ok(workbook) = std::env::var("PLANTOPS_WORKBOOK") {
            config.workbook = Some(PathBuf::from(workbook));
        }

        config
    }

    /// Get the path to the global config file
    fn global_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "plantops")
            .map(|dirs| dirs.config_dir().join("config.yaml"))
    }

    /// Merge another config into this one (other takes precedence)
    fn merge(&mut self, other: Config) {
        if other.workbook.is_some() {
            self.workbook = other.workbook;
        }
        if other.mirror.is_some() {
            self.mirror = other.mirror;
        }
        if other.operator.is_some() {
            self.operator = other.operator;
        }
        if other.lock_timeout_ms.is_some() {
            self.lock_timeout_ms = other.lock_timeout_ms;
        }
        if other.lock_poll_ms.is_some() {
            self.lock_poll_ms = other.lock_poll_ms;
        }
        if other.sheets.is_some() {
            self.sheets = other.sheets;
        }
    }

    /// Absolute workbook path for a workspace
    pub fn workbook_path(&self, plant: &Plant) -> PathBuf {
        let rel = self
            .workbook
            .clone()
            .unwrap_or_else(|| PathBuf::from("plant.xlsx"));
        plant.root().join(rel)
    }

    /// Absolute mirror database path for a workspace
    pub fn mirror_path(&self, plant: &Plant) -> PathBuf {
        let rel = self
            .mirror
            .clone()
            .unwrap_or_else(|| PathBuf::from(".plantops/mirror.db"));
        plant.root().join(rel)
    }

    pub fn lock_settings(&self) -> LockSettings {
        let defaults = LockSettings::default();
        LockSettings {
            timeout: self
                .lock_timeout_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.timeout),
            poll: self
                .lock_poll_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.poll),
        }
    }

    pub fn sheets(&self) -> SheetNames {
        self.sheets.clone().unwrap_or_default()
    }

    /// Get the operator name, falling back to the login user
    pub fn operator(&self) -> String {
        if let Some(ref operator) = self.operator {
            return operator.clone();
        }

        std::env::var("USER")
            .or_else(|_| std::env::var("USERNAME"))
            .unwrap_or_else(|_| "unknown".to_string())
    }
}
