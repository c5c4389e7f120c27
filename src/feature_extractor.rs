use crate::gps_data::{AlignedRow, GpsFix, TrainingExample};

/// Folds the aligned stream into training examples, one per labeled run.
pub struct FeatureExtractor {
    current_run: Option<TrainingExample>,
    last_fix: Option<GpsFix>,
}

impl FeatureExtractor {
    pub fn new() -> Self {
        FeatureExtractor {
            current_run: None,
            last_fix: None,
        }
    }

    /// Returns the example closed by this row, if any.
    pub fn push(&mut self, row: AlignedRow) -> Option<TrainingExample> {
        match row {
            AlignedRow::SegmentBreak => self.close_run(),
            AlignedRow::Labeled { fix, label } => {
                // the aligner always puts a break between intervals, but a
                // label change still starts a new example.
                let label_changed = self
                    .current_run
                    .as_ref()
                    .is_some_and(|run| run.label != label);
                let closed = if label_changed { self.close_run() } else { None };
                let run = self
                    .current_run
                    .get_or_insert_with(|| TrainingExample::new(label));
                if let Some(last_fix) = &self.last_fix {
                    // out of order input gives a meaningless but finite delta
                    run.time_deltas
                        .push(fix.timestamp_sec.saturating_sub(last_fix.timestamp_sec));
                    let distance = last_fix.point.haversine_distance(&fix.point);
                    run.distances.push(distance.round() as u64);
                }
                self.last_fix = Some(fix);
                closed
            }
        }
    }

    /// Closes the run left open at the end of the stream.
    pub fn finish(mut self) -> Option<TrainingExample> {
        self.close_run()
    }

    fn close_run(&mut self) -> Option<TrainingExample> {
        self.last_fix = None;
        self.current_run.take()
    }
}

pub fn extract_features(rows: impl IntoIterator<Item = AlignedRow>) -> Vec<TrainingExample> {
    let mut extractor = FeatureExtractor::new();
    let mut examples: Vec<TrainingExample> = rows
        .into_iter()
        .filter_map(|row| extractor.push(row))
        .collect();
    examples.extend(extractor.finish());
    examples
}

#[cfg(test)]
mod tests {
    use crate::feature_extractor::{extract_features, FeatureExtractor};
    use crate::gps_data::{AlignedRow, GpsFix};

    fn labeled(t: i64, lat: f64, lng: f64, label: &str) -> AlignedRow {
        AlignedRow::Labeled {
            fix: GpsFix::new(t, lat, lng, 0.0),
            label: label.to_owned(),
        }
    }

    #[test]
    fn consecutive_breaks_emit_nothing() {
        let examples = extract_features(vec![
            AlignedRow::SegmentBreak,
            AlignedRow::SegmentBreak,
        ]);
        assert!(examples.is_empty());
    }

    #[test]
    fn single_fix_run() {
        let examples = extract_features(vec![labeled(0, 0.0, 0.0, "bike"), AlignedRow::SegmentBreak]);
        assert_eq!(examples.len(), 1);
        assert_eq!(examples[0].label, "bike");
        assert!(examples[0].time_deltas.is_empty());
        assert!(examples[0].distances.is_empty());
    }

    #[test]
    fn flush_at_end_of_stream() {
        let mut extractor = FeatureExtractor::new();
        assert_eq!(extractor.push(labeled(7, 0.0, 0.0, "taxi")), None);
        let example = extractor.finish().unwrap();
        assert_eq!(example.label, "taxi");
        assert!(example.is_empty());
    }

    #[test]
    fn break_resets_lookback() {
        let examples = extract_features(vec![
            labeled(0, 0.0, 0.0, "walk"),
            labeled(10, 0.0, 0.001, "walk"),
            AlignedRow::SegmentBreak,
            labeled(100, 0.0, 0.002, "walk"),
            labeled(130, 0.0, 0.002, "walk"),
        ]);
        assert_eq!(examples.len(), 2);
        assert_eq!(examples[0].time_deltas, vec![10]);
        assert_eq!(examples[0].distances, vec![111]);
        assert_eq!(examples[1].time_deltas, vec![30]);
        assert_eq!(examples[1].distances, vec![0]);
    }

    #[test]
    fn extreme_timestamps_do_not_overflow() {
        let examples = extract_features(vec![
            labeled(i64::MAX, 0.0, 0.0, "walk"),
            labeled(i64::MIN, 0.0, 0.0, "walk"),
            labeled(0, 0.0, 0.0, "walk"),
            labeled(-5, 0.0, 0.0, "walk"),
        ]);
        assert_eq!(examples.len(), 1);
        assert_eq!(examples[0].time_deltas, vec![i64::MIN, i64::MAX, -5]);
    }

    #[test]
    fn label_change_closes_run() {
        let examples = extract_features(vec![
            labeled(0, 0.0, 0.0, "walk"),
            labeled(5, 0.0, 0.0, "walk"),
            labeled(9, 0.0, 0.0, "bus"),
        ]);
        assert_eq!(examples.len(), 2);
        assert_eq!(examples[0].label, "walk");
        assert_eq!(examples[0].time_deltas, vec![5]);
        assert_eq!(examples[1].label, "bus");
        assert!(examples[1].is_empty());
    }
}
