use crate::{export_data, gps_data::TrainingExample, import_data};
use anyhow::{Context, Result};
use std::{
    fmt,
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};

#[derive(Clone, Debug, PartialEq)]
pub struct UserStats {
    pub num_examples: usize,
    pub mean_len: f64,
    pub max_len: usize,
    pub mean_time_span_min: f64,
    pub max_time_span_min: f64,
    // only over examples with at least one step
    pub mean_time_step_sec: Option<f64>,
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values.fold((0.0, 0usize), |(sum, count), x| (sum + x, count + 1));
    if count == 0 {
        None
    } else {
        Some(sum / count as f64)
    }
}

impl UserStats {
    /// `None` when there is nothing to summarize.
    pub fn of_examples(examples: &[TrainingExample]) -> Option<Self> {
        if examples.is_empty() {
            return None;
        }
        let span_min = |example: &TrainingExample| example.time_span_sec() as f64 / 60.0;
        Some(UserStats {
            num_examples: examples.len(),
            mean_len: mean(examples.iter().map(|x| x.len() as f64))?,
            max_len: examples.iter().map(|x| x.len()).max()?,
            mean_time_span_min: mean(examples.iter().map(span_min))?,
            max_time_span_min: examples.iter().map(span_min).fold(0.0, f64::max),
            mean_time_step_sec: mean(
                examples
                    .iter()
                    .filter(|x| !x.is_empty())
                    .map(|x| x.time_span_sec() as f64 / x.len() as f64),
            ),
        })
    }
}

impl fmt::Display for UserStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Num tras: {}\t Mean tra len: {}\t Max tra len: {}\t mean time span: {}min\t max time span: {}min\t mean time step size: ",
            self.num_examples,
            self.mean_len as i64,
            self.max_len,
            self.mean_time_span_min as i64,
            self.max_time_span_min as i64,
        )?;
        match self.mean_time_step_sec {
            Some(step) => write!(f, "{}s", step as i64),
            None => write!(f, "-"),
        }
    }
}

pub fn user_stats(training_file: &Path) -> Result<Option<UserStats>> {
    let file = File::open(training_file)
        .with_context(|| format!("failed to open {}", training_file.display()))?;
    let examples = export_data::read_training_examples(BufReader::new(file))
        .with_context(|| format!("in {}", training_file.display()))?;
    Ok(UserStats::of_examples(&examples))
}

pub fn dataset_stats(
    root: &Path,
    training_file_name: &str,
) -> Result<Vec<(PathBuf, Option<UserStats>)>> {
    import_data::list_user_dirs(root)?
        .into_iter()
        .map(|user_dir| {
            let training_file = user_dir.join(training_file_name);
            if !training_file.is_file() {
                warn!("[stats] {}: no training data", user_dir.display());
                return Ok((user_dir, None));
            }
            let stats = user_stats(&training_file)?;
            Ok((user_dir, stats))
        })
        .collect()
}
