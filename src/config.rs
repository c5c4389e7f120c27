use crate::alignment::ExhaustionPolicy;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub exhaustion_policy: ExhaustionPolicy,
    pub labels_file_name: String,
    pub trajectory_dir_name: String,
    pub labeled_file_name: String,
    pub training_file_name: String,
    // process users on the rayon pool instead of one after another
    pub parallel: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            exhaustion_policy: ExhaustionPolicy::Terminate,
            labels_file_name: "labels.txt".to_owned(),
            trajectory_dir_name: "Trajectory".to_owned(),
            labeled_file_name: "labeled_trajectories.csv".to_owned(),
            training_file_name: "training_data.txt".to_owned(),
            parallel: true,
        }
    }
}

impl PipelineConfig {
    pub fn load(file_path: &Path) -> Result<Self> {
        let content = fs::read_to_string(file_path)
            .with_context(|| format!("failed to read config {}", file_path.display()))?;
        let config = serde_json::from_str(&content)
            .with_context(|| format!("invalid config {}", file_path.display()))?;
        Ok(config)
    }
}
