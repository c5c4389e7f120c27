/// A position on the map, in fractional degrees. Latitude is in [-90, 90] and
/// is not periodic, longitude is in [-180, 180] and wraps around.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Point {
    pub latitude: f64,
    pub longitude: f64,
}

impl Point {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Point {
            latitude,
            longitude,
        }
    }
}

/// One GPS reading from a trajectory file.
#[derive(Clone, Debug, PartialEq)]
pub struct GpsFix {
    pub timestamp_sec: i64,
    pub point: Point,
    pub altitude: f64,
}

impl GpsFix {
    pub fn new(timestamp_sec: i64, latitude: f64, longitude: f64, altitude: f64) -> Self {
        GpsFix {
            timestamp_sec,
            point: Point::new(latitude, longitude),
            altitude,
        }
    }
}

/// A closed time window `[start_sec, end_sec]` carrying one activity label.
/// A user's table is sorted by `start_sec` and the windows don't overlap.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LabelInterval {
    pub start_sec: i64,
    pub end_sec: i64,
    pub label: String,
}

impl LabelInterval {
    pub fn new(start_sec: i64, end_sec: i64, label: impl Into<String>) -> Self {
        LabelInterval {
            start_sec,
            end_sec,
            label: label.into(),
        }
    }

    pub fn contains(&self, timestamp_sec: i64) -> bool {
        self.start_sec <= timestamp_sec && timestamp_sec <= self.end_sec
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum AlignedRow {
    Labeled { fix: GpsFix, label: String },
    // Delimits segments: either a gap with no matching interval or the end of
    // the interval the previous rows belonged to.
    SegmentBreak,
}

impl AlignedRow {
    pub fn is_segment_break(&self) -> bool {
        matches!(self, AlignedRow::SegmentBreak)
    }
}

/// Features of one contiguous labeled run. Both sequences have one entry per
/// pair of consecutive fixes, so a single-fix run gives empty sequences.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TrainingExample {
    pub label: String,
    pub time_deltas: Vec<i64>,
    pub distances: Vec<u64>,
}

impl TrainingExample {
    pub fn new(label: impl Into<String>) -> Self {
        TrainingExample {
            label: label.into(),
            time_deltas: Vec::new(),
            distances: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.time_deltas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time_deltas.is_empty()
    }

    pub fn time_span_sec(&self) -> i64 {
        self.time_deltas.iter().sum()
    }
}
