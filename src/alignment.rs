use serde::{Deserialize, Serialize};
use strum_macros::EnumIter;

use crate::gps_data::{AlignedRow, GpsFix, LabelInterval};

/* Merge-join of a user's fixes against the user's label table.
   Both inputs are sorted by time and the intervals don't overlap, so the
   cursor into the interval table only ever moves forward. The fixes must be
   fed in non-decreasing timestamp order across all of the user's files; this
   is not checked and out of order input gives wrong segments.
*/

/// What happens to the fixes that arrive after the last interval has passed.
#[derive(Copy, Clone, Debug, Default, EnumIter, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExhaustionPolicy {
    /// Stop reading the user's fixes right away.
    #[default]
    Terminate,
    /// Keep reading so the remaining fixes can be counted, emit nothing.
    DrainAndCount,
}

impl ExhaustionPolicy {
    pub fn to_str(self) -> &'static str {
        match self {
            ExhaustionPolicy::Terminate => "terminate",
            ExhaustionPolicy::DrainAndCount => "drain-and-count",
        }
    }

    pub fn of_str(s: &str) -> Option<Self> {
        match s {
            "terminate" => Some(ExhaustionPolicy::Terminate),
            "drain-and-count" => Some(ExhaustionPolicy::DrainAndCount),
            _ => None,
        }
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct AlignmentCursor {
    interval_index: usize,
}

impl AlignmentCursor {
    pub fn new() -> Self {
        AlignmentCursor { interval_index: 0 }
    }

    pub fn interval_index(&self) -> usize {
        self.interval_index
    }

    pub fn current<'a>(&self, intervals: &'a [LabelInterval]) -> Option<&'a LabelInterval> {
        intervals.get(self.interval_index)
    }

    fn advance(&mut self) {
        self.interval_index += 1;
    }
}

/// Outcome of feeding one fix to the engine.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum CursorState {
    Labeled,
    // the fix is before the window of the current interval
    Skipped,
    // every interval has passed, nothing more will be emitted
    Exhausted,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AlignmentSummary {
    pub labeled: usize,
    pub skipped: usize,
    pub segment_breaks: usize,
    pub dropped_after_exhaustion: usize,
    pub exhausted: bool,
}

pub struct AlignmentEngine<'a> {
    intervals: &'a [LabelInterval],
    cursor: AlignmentCursor,
    policy: ExhaustionPolicy,
    summary: AlignmentSummary,
}

impl<'a> AlignmentEngine<'a> {
    pub fn new(intervals: &'a [LabelInterval], policy: ExhaustionPolicy) -> Self {
        AlignmentEngine {
            intervals,
            cursor: AlignmentCursor::new(),
            policy,
            summary: AlignmentSummary::default(),
        }
    }

    pub fn cursor(&self) -> AlignmentCursor {
        self.cursor
    }

    pub fn summary(&self) -> &AlignmentSummary {
        &self.summary
    }

    pub fn into_summary(self) -> AlignmentSummary {
        self.summary
    }

    pub fn is_exhausted(&self) -> bool {
        self.cursor.current(self.intervals).is_none()
    }

    /// `true` once the caller should stop feeding fixes.
    pub fn is_finished(&self) -> bool {
        self.is_exhausted() && self.policy == ExhaustionPolicy::Terminate
    }

    // Rows are handed to `f` as they are produced so the caller can stream
    // them to disk. A fix can produce several breaks followed by at most one
    // labeled row.
    pub fn process<F>(&mut self, fix: GpsFix, mut f: F) -> CursorState
    where
        F: FnMut(AlignedRow),
    {
        let intervals = self.intervals;
        loop {
            match self.cursor.current(intervals) {
                None => {
                    self.summary.exhausted = true;
                    self.summary.dropped_after_exhaustion += 1;
                    return CursorState::Exhausted;
                }
                Some(interval) if interval.end_sec < fix.timestamp_sec => {
                    f(AlignedRow::SegmentBreak);
                    self.summary.segment_breaks += 1;
                    self.cursor.advance();
                    if self.cursor.current(intervals).is_none() {
                        debug!(
                            "[alignment] label table exhausted at timestamp {}",
                            fix.timestamp_sec
                        );
                    }
                }
                Some(interval) if fix.timestamp_sec < interval.start_sec => {
                    self.summary.skipped += 1;
                    return CursorState::Skipped;
                }
                Some(interval) => {
                    let label = interval.label.clone();
                    f(AlignedRow::Labeled { fix, label });
                    self.summary.labeled += 1;
                    return CursorState::Labeled;
                }
            }
        }
    }
}

#[derive(Debug, Default, PartialEq)]
pub struct Alignment {
    pub rows: Vec<AlignedRow>,
    pub summary: AlignmentSummary,
}

/// Runs a whole alignment pass in memory.
pub fn align(
    fixes: impl IntoIterator<Item = GpsFix>,
    intervals: &[LabelInterval],
    policy: ExhaustionPolicy,
) -> Alignment {
    let mut engine = AlignmentEngine::new(intervals, policy);
    let mut rows = Vec::new();
    for fix in fixes {
        engine.process(fix, |row| rows.push(row));
        if engine.is_finished() {
            break;
        }
    }
    Alignment {
        rows,
        summary: engine.into_summary(),
    }
}
