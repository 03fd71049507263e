use crate::error::{Result, SolokitError};
use crate::paths;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

// ---------------------------------------------------------------------------
// GitWorkflowConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GitWorkflowConfig {
    /// Branch new work items are cut from and merged back into.
    #[serde(default = "default_parent_branch")]
    pub parent_branch: String,
    #[serde(default = "default_remote")]
    pub remote: String,
    /// Ask the GitHub CLI about pull requests when resolving branch status.
    #[serde(default = "default_true")]
    pub check_pull_requests: bool,
    #[serde(default = "default_command_timeout")]
    pub command_timeout_secs: u64,
}

fn default_parent_branch() -> String {
    "main".to_string()
}

fn default_remote() -> String {
    "origin".to_string()
}

fn default_true() -> bool {
    true
}

fn default_command_timeout() -> u64 {
    10
}

impl Default for GitWorkflowConfig {
    fn default() -> Self {
        Self {
            parent_branch: default_parent_branch(),
            remote: default_remote(),
            check_pull_requests: default_true(),
            command_timeout_secs: default_command_timeout(),
        }
    }
}

impl GitWorkflowConfig {
    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.command_timeout_secs.max(1))
    }
}

// ---------------------------------------------------------------------------
// SolokitConfig (top-level)
// ---------------------------------------------------------------------------

/// Project configuration. Built once per invocation and passed by reference.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SolokitConfig {
    #[serde(default)]
    pub git_workflow: GitWorkflowConfig,
}

impl SolokitConfig {
    /// Load `.session/config.json`, falling back to defaults when it is absent.
    pub fn load(root: &Path) -> Result<Self> {
        let path = paths::config_path(root);
        if !path.exists() {
            return Ok(Self::default());
        }
        let data = std::fs::read_to_string(&path)?;
        serde_json::from_str(&data).map_err(|source| SolokitError::CorruptData { path, source })
    }

    pub fn save(&self, root: &Path) -> Result<()> {
        crate::io::atomic_write(&paths::config_path(root), &self.to_json()?)
    }

    /// Write the default config unless one exists. Returns true if written.
    pub fn write_default(root: &Path) -> Result<bool> {
        crate::io::write_if_missing(&paths::config_path(root), &Self::default().to_json()?)
    }

    fn to_json(&self) -> Result<Vec<u8>> {
        let mut data = serde_json::to_string_pretty(self)?;
        data.push('\n');
        Ok(data.into_bytes())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
