//! geolife-labeler CLI
//!
//! Usage:
//!   geolife-labeler import <raw_data_dir> <workspace_dir>
//!   geolife-labeler label <workspace_dir>
//!   geolife-labeler train <workspace_dir>
//!   geolife-labeler process <workspace_dir>
//!   geolife-labeler stats <workspace_dir>
//!
//! Global options: --config <file.json>, --exhaustion-policy <policy>,
//! --log-dir <dir>, -v

use anyhow::Result;
use clap::{Parser, Subcommand};
use geolife_labeler::{
    alignment::ExhaustionPolicy,
    config::PipelineConfig,
    import_data, logs,
    pipeline::{self, Stage},
    stats,
};
use log::{error, info};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "geolife-labeler")]
#[command(about = "Align Geolife trajectories with activity labels and build training data", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// JSON pipeline config, defaults are used for missing fields
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// `terminate` or `drain-and-count`, overrides the config file
    #[arg(long, global = true, value_parser = parse_exhaustion_policy)]
    exhaustion_policy: Option<ExhaustionPolicy>,

    /// Also write rotated logs into this directory
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    /// Enable verbose debug output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Copy users that have a label file out of a raw Geolife `Data/` folder
    Import {
        raw_data_dir: PathBuf,
        workspace_dir: PathBuf,
    },
    /// Align every user's fixes with their labels
    Label { workspace_dir: PathBuf },
    /// Build training examples from the aligned streams
    Train { workspace_dir: PathBuf },
    /// Label, then train
    Process { workspace_dir: PathBuf },
    /// Print training data statistics per user
    Stats { workspace_dir: PathBuf },
}

fn parse_exhaustion_policy(s: &str) -> Result<ExhaustionPolicy, String> {
    ExhaustionPolicy::of_str(s).ok_or_else(|| format!("unknown exhaustion policy: {s}"))
}

fn run_stage(workspace_dir: &Path, config: &PipelineConfig, stage: Stage) -> Result<()> {
    let results = pipeline::process_dataset(workspace_dir, config, stage)?;
    let failed = results.iter().filter(|(_, result)| result.is_err()).count();
    info!("{} users processed, {} failed", results.len(), failed);
    if failed > 0 {
        for (user_dir, result) in &results {
            if let Err(e) = result {
                error!("{}: {:#}", user_dir.display(), e);
            }
        }
        anyhow::bail!("{} users failed", failed);
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match &cli.log_dir {
        Some(log_dir) => {
            std::fs::create_dir_all(log_dir)?;
            logs::init(log_dir, cli.verbose)?
        }
        None => logs::init_terminal(cli.verbose)?,
    }

    let mut config = match &cli.config {
        Some(path) => PipelineConfig::load(path)?,
        None => PipelineConfig::default(),
    };
    if let Some(policy) = cli.exhaustion_policy {
        config.exhaustion_policy = policy;
    }

    match cli.command {
        Commands::Import {
            raw_data_dir,
            workspace_dir,
        } => {
            std::fs::create_dir_all(&workspace_dir)?;
            import_data::copy_useful_data(
                &raw_data_dir,
                &workspace_dir,
                &config.labels_file_name,
                &config.trajectory_dir_name,
            )?;
        }
        Commands::Label { workspace_dir } => run_stage(&workspace_dir, &config, Stage::Label)?,
        Commands::Train { workspace_dir } => run_stage(&workspace_dir, &config, Stage::Train)?,
        Commands::Process { workspace_dir } => run_stage(&workspace_dir, &config, Stage::All)?,
        Commands::Stats { workspace_dir } => {
            for (user_dir, user_stats) in
                stats::dataset_stats(&workspace_dir, &config.training_file_name)?
            {
                let name = user_dir
                    .file_name()
                    .map(|x| x.to_string_lossy().into_owned())
                    .unwrap_or_default();
                match user_stats {
                    Some(user_stats) => println!("{}: {}", name, user_stats),
                    None => println!("{}: skipped", name),
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{parse_exhaustion_policy, Cli};
    use clap::Parser;
    use geolife_labeler::alignment::ExhaustionPolicy;

    #[test]
    fn exhaustion_policy_flag() {
        let cli = Cli::try_parse_from([
            "geolife-labeler",
            "label",
            "workspace",
            "--exhaustion-policy",
            "drain-and-count",
        ])
        .unwrap();
        assert_eq!(cli.exhaustion_policy, Some(ExhaustionPolicy::DrainAndCount));
        assert!(parse_exhaustion_policy("stop").is_err());
    }
}
