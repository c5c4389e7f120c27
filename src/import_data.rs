use crate::gps_data::{GpsFix, LabelInterval};
use crate::utils;
use anyhow::{Context, Result};
use csv::{ReaderBuilder, StringRecord, Trim};
use itertools::Itertools;
use std::{
    fs,
    path::{Path, PathBuf},
};

// A `.plt` file starts with 6 lines of header we don't care about.
const TRAJECTORY_HEADER_LINES: usize = 6;

fn field(record: &StringRecord, index: usize) -> Result<&str> {
    record
        .get(index)
        .ok_or_else(|| anyhow!("missing field {} in {:?}", index, record))
}

fn parse_trajectory_record(record: &StringRecord) -> Result<GpsFix> {
    // latitude, longitude, 0, altitude, days since 1899, date, time
    let latitude: f64 = field(record, 0)?.parse()?;
    let longitude: f64 = field(record, 1)?.parse()?;
    let altitude: f64 = field(record, 3)?.parse()?;
    let timestamp_sec = utils::trajectory_timestamp_sec(field(record, 5)?, field(record, 6)?)?;
    Ok(GpsFix::new(timestamp_sec, latitude, longitude, altitude))
}

pub fn read_trajectory(file_path: &Path) -> Result<Vec<GpsFix>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(Trim::All)
        .from_path(file_path)
        .with_context(|| format!("failed to open trajectory {}", file_path.display()))?;
    let mut fixes = Vec::new();
    for (i, record) in reader
        .records()
        .enumerate()
        .skip(TRAJECTORY_HEADER_LINES)
    {
        let fix = record
            .map_err(anyhow::Error::from)
            .and_then(|record| parse_trajectory_record(&record))
            .with_context(|| format!("{}: bad row at line {}", file_path.display(), i + 1))?;
        fixes.push(fix);
    }
    Ok(fixes)
}

fn parse_label_record(record: &StringRecord) -> Result<LabelInterval> {
    Ok(LabelInterval {
        start_sec: utils::label_timestamp_sec(field(record, 0)?)?,
        end_sec: utils::label_timestamp_sec(field(record, 1)?)?,
        label: field(record, 2)?.to_owned(),
    })
}

pub fn read_labels(file_path: &Path) -> Result<Vec<LabelInterval>> {
    let mut reader = ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(true)
        .trim(Trim::All)
        .from_path(file_path)
        .with_context(|| format!("failed to open labels {}", file_path.display()))?;
    let mut intervals = Vec::new();
    for (i, record) in reader.records().enumerate() {
        let interval = record
            .map_err(anyhow::Error::from)
            .and_then(|record| parse_label_record(&record))
            // +2: 1-based and the header line
            .with_context(|| format!("{}: bad row at line {}", file_path.display(), i + 2))?;
        intervals.push(interval);
    }
    Ok(intervals)
}

/// Trajectory files of one user in recording order. The file names are the
/// start time of the recording, so numeric order is chronological order.
pub fn sorted_trajectory_files(trajectory_dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(trajectory_dir)
        .with_context(|| format!("failed to list {}", trajectory_dir.display()))?
    {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        let file_name = path
            .file_name()
            .and_then(|x| x.to_str())
            .unwrap_or_default();
        match utils::numeric_file_stem(file_name) {
            Some(key) => files.push((key, path)),
            None => bail!("unexpected trajectory file: {}", path.display()),
        }
    }
    Ok(files
        .into_iter()
        .sorted_by_key(|(key, _)| *key)
        .map(|(_, path)| path)
        .collect())
}

/// All fixes of a user in order. Files are only opened when the iterator
/// reaches them, so stopping early leaves the remaining files untouched.
pub fn stream_fixes(files: Vec<PathBuf>) -> impl Iterator<Item = Result<GpsFix>> {
    files
        .into_iter()
        .map(|path| {
            debug!("[import] reading {}", path.display());
            read_trajectory(&path)
        })
        .flatten_ok()
}

/// User directories under `root`, numerically ordered by name (`000`, `001`,
/// ...). Directories with non-numeric names come last, by name.
pub fn list_user_dirs(root: &Path) -> Result<Vec<PathBuf>> {
    let mut dirs = Vec::new();
    for entry in
        fs::read_dir(root).with_context(|| format!("failed to list {}", root.display()))?
    {
        let path = entry?.path();
        if path.is_dir() {
            dirs.push(path);
        }
    }
    Ok(dirs
        .into_iter()
        .sorted_by_key(|path| {
            let name = path
                .file_name()
                .and_then(|x| x.to_str())
                .unwrap_or_default()
                .to_owned();
            let number = utils::numeric_file_stem(&name);
            (number.is_none(), number, name)
        })
        .collect())
}

/// Copies every user of a raw Geolife `Data/` directory that has a label
/// file into `workspace_dir`. Returns the number of users copied.
pub fn copy_useful_data(
    raw_data_dir: &Path,
    workspace_dir: &Path,
    labels_file_name: &str,
    trajectory_dir_name: &str,
) -> Result<usize> {
    let user_dirs = list_user_dirs(raw_data_dir)?;
    let mut useful_users = 0;
    for user_dir in &user_dirs {
        let labels_file = user_dir.join(labels_file_name);
        if !labels_file.is_file() {
            debug!("[import] skipping {}: no labels", user_dir.display());
            continue;
        }
        let user_name = user_dir
            .file_name()
            .ok_or_else(|| anyhow!("invalid user dir: {}", user_dir.display()))?;
        let target_dir = workspace_dir.join(user_name);
        let target_trajectory_dir = target_dir.join(trajectory_dir_name);
        fs::create_dir_all(&target_trajectory_dir)?;
        fs::copy(&labels_file, target_dir.join(labels_file_name))
            .with_context(|| format!("failed to copy {}", labels_file.display()))?;

        for entry in fs::read_dir(user_dir.join(trajectory_dir_name))? {
            let path = entry?.path();
            if let Some(file_name) = path.file_name() {
                if path.is_file() {
                    fs::copy(&path, target_trajectory_dir.join(file_name))
                        .with_context(|| format!("failed to copy {}", path.display()))?;
                }
            }
        }
        useful_users += 1;
    }
    info!(
        "Number of useful directories: {} (of {})",
        useful_users,
        user_dirs.len()
    );
    Ok(useful_users)
}
