use crate::{
    alignment::{align, AlignmentEngine, AlignmentSummary, ExhaustionPolicy},
    config::PipelineConfig,
    export_data::{read_aligned_rows, AlignedRowWriter, TrainingExampleWriter},
    feature_extractor::{extract_features, FeatureExtractor},
    gps_data::{GpsFix, LabelInterval, TrainingExample},
    import_data,
};
use anyhow::{Context, Result};
use rayon::prelude::*;
use std::{
    ffi::OsString,
    fs::{self, File},
    io::{BufReader, BufWriter},
    path::{Path, PathBuf},
};

/// Aligns one user's fixes against the user's label table and turns every
/// labeled run into a training example. Fixes must be in chronological order.
pub fn align_and_segment(
    fixes: impl IntoIterator<Item = GpsFix>,
    intervals: &[LabelInterval],
) -> Vec<TrainingExample> {
    let alignment = align(fixes, intervals, ExhaustionPolicy::Terminate);
    extract_features(alignment.rows)
}

/// Runs `write` against `<path>.tmp` and moves the file to `path` only when it
/// succeeds. On error the temporary file is removed and `path` is untouched.
fn write_output<T>(path: &Path, write: impl FnOnce(BufWriter<File>) -> Result<T>) -> Result<T> {
    let mut tmp_path = OsString::from(path.as_os_str());
    tmp_path.push(".tmp");
    let tmp_path = PathBuf::from(tmp_path);
    let file = File::create(&tmp_path)
        .with_context(|| format!("failed to create {}", tmp_path.display()))?;
    match write(BufWriter::new(file)) {
        Ok(value) => {
            fs::rename(&tmp_path, path)
                .with_context(|| format!("failed to move output to {}", path.display()))?;
            Ok(value)
        }
        Err(e) => {
            if let Err(remove_error) = fs::remove_file(&tmp_path) {
                warn!(
                    "[pipeline] failed to remove {}: {}",
                    tmp_path.display(),
                    remove_error
                );
            }
            Err(e)
        }
    }
}

/// Writes `labeled_file_name` for one user. Trajectory files are read in
/// order and reading stops as soon as the engine is done.
pub fn label_trajectories(user_dir: &Path, config: &PipelineConfig) -> Result<AlignmentSummary> {
    let intervals = import_data::read_labels(&user_dir.join(&config.labels_file_name))?;
    let files =
        import_data::sorted_trajectory_files(&user_dir.join(&config.trajectory_dir_name))?;
    debug!(
        "[pipeline] {}: {} intervals, {} trajectory files, policy {}",
        user_dir.display(),
        intervals.len(),
        files.len(),
        config.exhaustion_policy.to_str()
    );

    write_output(&user_dir.join(&config.labeled_file_name), |output| {
        let mut writer = AlignedRowWriter::new(output);
        let mut engine = AlignmentEngine::new(&intervals, config.exhaustion_policy);
        let mut rows = Vec::new();
        for fix in import_data::stream_fixes(files) {
            engine.process(fix?, |row| rows.push(row));
            for row in rows.drain(..) {
                writer.write(&row)?;
            }
            if engine.is_finished() {
                break;
            }
        }
        writer.finish()?;
        Ok(engine.into_summary())
    })
}

/// Reads the aligned stream of one user and writes its training examples.
/// Returns the number of examples written.
pub fn create_training_data(user_dir: &Path, config: &PipelineConfig) -> Result<usize> {
    let input_path = user_dir.join(&config.labeled_file_name);
    let input = File::open(&input_path)
        .with_context(|| format!("failed to open {}", input_path.display()))?;

    write_output(&user_dir.join(&config.training_file_name), |output| {
        let mut writer = TrainingExampleWriter::new(output);
        let mut extractor = FeatureExtractor::new();
        let mut count = 0;
        for row in read_aligned_rows(BufReader::new(input)) {
            let row = row.with_context(|| format!("in {}", input_path.display()))?;
            if let Some(example) = extractor.push(row) {
                writer.write(&example)?;
                count += 1;
            }
        }
        if let Some(example) = extractor.finish() {
            writer.write(&example)?;
            count += 1;
        }
        writer.finish()?;
        Ok(count)
    })
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Stage {
    Label,
    Train,
    All,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UserOutcome {
    pub alignment: Option<AlignmentSummary>,
    pub examples: Option<usize>,
}

pub fn process_user(user_dir: &Path, config: &PipelineConfig, stage: Stage) -> Result<UserOutcome> {
    let mut outcome = UserOutcome::default();
    if matches!(stage, Stage::Label | Stage::All) {
        let summary = label_trajectories(user_dir, config)?;
        info!(
            "[pipeline] {}: labeled={} skipped={} breaks={} dropped={} exhausted={}",
            user_dir.display(),
            summary.labeled,
            summary.skipped,
            summary.segment_breaks,
            summary.dropped_after_exhaustion,
            summary.exhausted
        );
        outcome.alignment = Some(summary);
    }
    if matches!(stage, Stage::Train | Stage::All) {
        let examples = create_training_data(user_dir, config)?;
        info!("[pipeline] {}: {} examples", user_dir.display(), examples);
        outcome.examples = Some(examples);
    }
    Ok(outcome)
}

/// Runs `stage` for every user directory under `root`. Users are independent,
/// a failure is logged and reported without stopping the others.
pub fn process_dataset(
    root: &Path,
    config: &PipelineConfig,
    stage: Stage,
) -> Result<Vec<(PathBuf, Result<UserOutcome>)>> {
    let user_dirs = import_data::list_user_dirs(root)?;
    info!(
        "[pipeline] processing {} users in {}",
        user_dirs.len(),
        root.display()
    );
    let run = |user_dir: &PathBuf| {
        let result = process_user(user_dir, config, stage);
        if let Err(e) = &result {
            warn!("[pipeline] {} failed: {:#}", user_dir.display(), e);
        }
        (user_dir.clone(), result)
    };
    let results = if config.parallel {
        user_dirs.par_iter().map(run).collect()
    } else {
        user_dirs.iter().map(run).collect()
    };
    Ok(results)
}

#[cfg(test)]
mod tests {
    use crate::distance::distance;
    use crate::gps_data::{GpsFix, LabelInterval, Point};
    use crate::pipeline::align_and_segment;

    #[test]
    fn one_interval_one_example() {
        let fixes = vec![
            GpsFix::new(0, 39.9750, 116.3300, 50.0),
            GpsFix::new(10, 39.9760, 116.3310, 50.0),
            GpsFix::new(25, 39.9780, 116.3330, 50.0),
        ];
        let intervals = vec![LabelInterval::new(0, 30, "walk")];
        let examples = align_and_segment(fixes, &intervals);
        assert_eq!(examples.len(), 1);
        assert_eq!(examples[0].label, "walk");
        assert_eq!(examples[0].time_deltas, vec![10, 15]);
        let d01 = distance(&Point::new(39.9750, 116.3300), &Point::new(39.9760, 116.3310));
        let d12 = distance(&Point::new(39.9760, 116.3310), &Point::new(39.9780, 116.3330));
        assert_eq!(
            examples[0].distances,
            vec![d01.round() as u64, d12.round() as u64]
        );
    }

    #[test]
    fn single_fix_then_end_of_stream() {
        let examples = align_and_segment(
            vec![GpsFix::new(100, 0.0, 0.0, 0.0)],
            &[LabelInterval::new(50, 150, "run")],
        );
        assert_eq!(examples.len(), 1);
        assert!(examples[0].is_empty());
    }
}
