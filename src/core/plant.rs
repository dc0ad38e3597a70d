//! Plant workspace discovery and structure

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Represents a plant workspace: the directory holding the workbook, the
/// mirror database and the `.plantops/` configuration directory.
#[derive(Debug)]
pub struct Plant {
    /// Root directory of the workspace (parent of .plantops/)
    root: PathBuf,
}

impl Plant {
    /// Find the workspace root by walking up from the current directory
    pub fn discover() -> Result<Self, PlantError> {
        let current =
            std::env::current_dir().map_err(|e| PlantError::IoError(e.to_string()))?;
        Self::discover_from(&current)
    }

    /// Find the workspace root by walking up from the given directory
    pub fn discover_from(start: &Path) -> Result<Self, PlantError> {
        let mut current = start
            .canonicalize()
            .map_err(|e| PlantError::IoError(e.to_string()))?;

        loop {
            let ops_dir = current.join(".plantops");
            if ops_dir.is_dir() {
                return Ok(Self { root: current });
            }

            if !current.pop() {
                return Err(PlantError::NotFound {
                    searched_from: start.to_path_buf(),
                });
            }
        }
    }

    /// Create a new workspace at the given path
    pub fn init(path: &Path) -> Result<Self, PlantError> {
        let root = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());

        let ops_dir = root.join(".plantops");
        if ops_dir.exists() {
            return Err(PlantError::AlreadyExists(root.clone()));
        }

        std::fs::create_dir_all(&ops_dir).map_err(|e| PlantError::IoError(e.to_string()))?;

        let config_path = ops_dir.join("config.yaml");
        std::fs::write(&config_path, Self::default_config())
            .map_err(|e| PlantError::IoError(e.to_string()))?;

        Ok(Self { root })
    }

    fn default_config() -> &'static str {
        r#"# plantops workspace configuration

# Workbook file, relative to the workspace root
# workbook: plant.xlsx

# Mirror database location
# mirror: .plantops/mirror.db

# Default operator recorded on movements and orders
# operator: ""

# Workbook lock behavior (milliseconds)
# lock_timeout_ms: 10000
# lock_poll_ms: 50

# Sheet names backing each mirror table
# sheets:
#   stock_raw: Raw Materials
#   stock_finished: Finished Goods
#   production: Production
#   orders: Orders
"#
    }

    /// Get the workspace root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Get the .plantops configuration directory
    pub fn ops_dir(&self) -> PathBuf {
        self.root.join(".plantops")
    }
}

/// Errors that can occur during workspace operations
#[derive(Debug, Error)]
pub enum PlantError {
    #[error("not a plantops workspace (searched from {searched_from:?}). Run 'plantops init' to create one.")]
    NotFound { searched_from: PathBuf },

    #[error("plantops workspace already exists at {0:?}")]
    AlreadyExists(PathBuf),

    #[error("IO error: {0}")]
    IoError(String),
}
