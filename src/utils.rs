use anyhow::Result;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

// Geolife timestamps carry no zone. Both the trajectory and the label files
// are read as UTC so the two stay comparable.
const TRAJECTORY_DATE_FORMAT: &str = "%Y-%m-%d";
const TRAJECTORY_TIME_FORMAT: &str = "%H:%M:%S";
const LABEL_DATE_TIME_FORMAT: &str = "%Y/%m/%d %H:%M:%S";

pub fn trajectory_timestamp_sec(date: &str, time: &str) -> Result<i64> {
    let date = NaiveDate::parse_from_str(date.trim(), TRAJECTORY_DATE_FORMAT)?;
    let time = NaiveTime::parse_from_str(time.trim(), TRAJECTORY_TIME_FORMAT)?;
    Ok(NaiveDateTime::new(date, time).and_utc().timestamp())
}

pub fn label_timestamp_sec(date_time: &str) -> Result<i64> {
    let date_time = NaiveDateTime::parse_from_str(date_time.trim(), LABEL_DATE_TIME_FORMAT)?;
    Ok(date_time.and_utc().timestamp())
}

/// Parses `20081023025304.plt` or `010` as a number; used to order files and
/// user directories the way they were recorded.
pub fn numeric_file_stem(file_name: &str) -> Option<u64> {
    file_name.split('.').next()?.parse().ok()
}

#[cfg(test)]
mod tests {
    use crate::utils::{label_timestamp_sec, numeric_file_stem, trajectory_timestamp_sec};

    #[test]
    fn both_formats_agree() {
        let t1 = trajectory_timestamp_sec("2008-10-23", "02:53:04").unwrap();
        let t2 = label_timestamp_sec("2008/10/23 02:53:04").unwrap();
        assert_eq!(t1, t2);
        assert_eq!(t1, 1224730384);
    }

    #[test]
    fn bad_timestamp() {
        assert!(trajectory_timestamp_sec("2008-13-23", "02:53:04").is_err());
        assert!(label_timestamp_sec("2008-10-23 02:53:04").is_err());
    }

    #[test]
    fn file_stem() {
        assert_eq!(numeric_file_stem("20081023025304.plt"), Some(20081023025304));
        assert_eq!(numeric_file_stem("010"), Some(10));
        assert_eq!(numeric_file_stem(".DS_Store"), None);
        assert_eq!(numeric_file_stem("abc.plt"), None);
    }
}
