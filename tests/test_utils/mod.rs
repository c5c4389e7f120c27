#![allow(dead_code)]

use chrono::DateTime;
use geolife_labeler::gps_data::{GpsFix, LabelInterval};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

// 2008-10-23 02:53:04 UTC
pub const BASE_TIMESTAMP_SEC: i64 = 1224730384;

const PLT_HEADER: &str = "Geolife trajectory\nWGS 84\nAltitude is in Feet\nReserved 3\n0,2,255,My Track,0,0,2,8421376\n0\n";

pub fn fix(offset_sec: i64, latitude: f64, longitude: f64) -> GpsFix {
    GpsFix::new(BASE_TIMESTAMP_SEC + offset_sec, latitude, longitude, 492.0)
}

pub fn interval(start_offset_sec: i64, end_offset_sec: i64, label: &str) -> LabelInterval {
    LabelInterval::new(
        BASE_TIMESTAMP_SEC + start_offset_sec,
        BASE_TIMESTAMP_SEC + end_offset_sec,
        label,
    )
}

pub fn write_trajectory(file_path: &Path, fixes: &[GpsFix]) {
    let mut file = File::create(file_path).unwrap();
    file.write_all(PLT_HEADER.as_bytes()).unwrap();
    for fix in fixes {
        let time = DateTime::from_timestamp(fix.timestamp_sec, 0).unwrap();
        writeln!(
            file,
            "{},{},0,{},39744.1201851852,{},{}",
            fix.point.latitude,
            fix.point.longitude,
            fix.altitude,
            time.format("%Y-%m-%d"),
            time.format("%H:%M:%S")
        )
        .unwrap();
    }
}

pub fn write_labels(file_path: &Path, intervals: &[LabelInterval]) {
    let mut file = File::create(file_path).unwrap();
    writeln!(file, "Start Time\tEnd Time\tTransportation Mode").unwrap();
    for interval in intervals {
        let start = DateTime::from_timestamp(interval.start_sec, 0).unwrap();
        let end = DateTime::from_timestamp(interval.end_sec, 0).unwrap();
        writeln!(
            file,
            "{}\t{}\t{}",
            start.format("%Y/%m/%d %H:%M:%S"),
            end.format("%Y/%m/%d %H:%M:%S"),
            interval.label
        )
        .unwrap();
    }
}

/// Creates `<root>/<user>/labels.txt` and `<root>/<user>/Trajectory/<name>`
/// for each given file. `intervals = None` leaves the label file out.
pub fn create_user(
    root: &Path,
    user: &str,
    trajectories: &[(&str, Vec<GpsFix>)],
    intervals: Option<&[LabelInterval]>,
) -> PathBuf {
    let user_dir = root.join(user);
    let trajectory_dir = user_dir.join("Trajectory");
    fs::create_dir_all(&trajectory_dir).unwrap();
    for (name, fixes) in trajectories {
        write_trajectory(&trajectory_dir.join(name), fixes);
    }
    if let Some(intervals) = intervals {
        write_labels(&user_dir.join("labels.txt"), intervals);
    }
    user_dir
}

// Two trajectory files whose names sort differently as text and as numbers,
// and a label table that runs out before the last fix.
pub fn sample_trajectories() -> Vec<(&'static str, Vec<GpsFix>)> {
    vec![
        (
            "10.plt",
            vec![
                fix(100, 39.9800, 116.3200),
                fix(160, 39.9900, 116.3300),
                fix(300, 40.0000, 116.3400),
            ],
        ),
        (
            "9.plt",
            vec![
                fix(0, 39.9750, 116.3300),
                fix(10, 39.9760, 116.3310),
                fix(25, 39.9780, 116.3330),
                fix(50, 39.9790, 116.3340),
            ],
        ),
    ]
}

pub fn sample_intervals() -> Vec<LabelInterval> {
    vec![interval(0, 30, "walk"), interval(100, 200, "bus")]
}

pub fn sample_fixes_in_order() -> Vec<GpsFix> {
    let mut trajectories = sample_trajectories();
    trajectories.reverse();
    trajectories
        .into_iter()
        .flat_map(|(_, fixes)| fixes)
        .collect()
}
