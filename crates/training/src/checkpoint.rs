//! Checkpoint persistence under `<results_dir>/<run_id>/`.

use crate::config::TrainConfig;
use crate::curriculum::Curriculum;
use crate::policy::SoftmaxPolicy;
use crate::trainer::IterationMetrics;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Checkpoint {
    pub run_id: String,
    pub iteration: usize,
    pub total_steps: u64,
    pub policy: SoftmaxPolicy,
    pub curriculum: Curriculum,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metrics: Option<IterationMetrics>,
    pub config: TrainConfig,
}

impl Checkpoint {
    pub fn file_name(iteration: usize) -> String {
        format!("checkpoint_{:06}.json", iteration)
    }

    /// Write into `dir`, creating it if needed. Returns the file path.
    pub fn save(&self, dir: impl AsRef<Path>) -> Result<PathBuf> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)
            .with_context(|| format!("failed to create {}", dir.display()))?;
        let path = dir.join(Self::file_name(self.iteration));
        let json = serde_json::to_string_pretty(self)?;
        fs::write(&path, json).with_context(|| format!("failed to write {}", path.display()))?;
        Ok(path)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read_to_string(path)
            .with_context(|| format!("failed to read checkpoint {}", path.display()))?;
        serde_json::from_str(&data)
            .with_context(|| format!("failed to parse checkpoint {}", path.display()))
    }
}
