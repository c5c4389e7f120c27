use crate::gps_data::{AlignedRow, GpsFix, TrainingExample};
use anyhow::{Context, Result};
use csv::{ReaderBuilder, StringRecord, WriterBuilder};
use itertools::Itertools;
use std::{
    fmt::Display,
    io::{Read, Write},
    str::FromStr,
};

/* Two text formats are written per user:
   - the aligned stream: tab separated `timestamp, lat, lng, alt, label`, with
     a row of empty fields for each segment break.
   - training examples: `;` separated `label; [deltas]; [distances]`, the two
     sequences in list literal syntax.
*/

const ALIGNED_FIELDS: usize = 5;

pub struct AlignedRowWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> AlignedRowWriter<W> {
    pub fn new(inner: W) -> Self {
        AlignedRowWriter {
            writer: WriterBuilder::new()
                .delimiter(b'\t')
                .has_headers(false)
                .from_writer(inner),
        }
    }

    pub fn write(&mut self, row: &AlignedRow) -> Result<()> {
        match row {
            AlignedRow::SegmentBreak => self.writer.write_record([""; ALIGNED_FIELDS])?,
            AlignedRow::Labeled { fix, label } => self.writer.write_record([
                fix.timestamp_sec.to_string(),
                fix.point.latitude.to_string(),
                fix.point.longitude.to_string(),
                fix.altitude.to_string(),
                label.clone(),
            ])?,
        }
        Ok(())
    }

    pub fn finish(mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

// Older files store the timestamp as a float, e.g. `1224730384.0`.
fn parse_timestamp(s: &str) -> Result<i64> {
    match s.parse::<i64>() {
        Ok(t) => Ok(t),
        Err(_) => {
            let t: f64 = s.parse()?;
            // `i64::MAX as f64` rounds up to 2^63, which is already out of range
            if t.fract() != 0.0 || !(i64::MIN as f64..i64::MAX as f64).contains(&t) {
                bail!("invalid timestamp: {}", s);
            }
            Ok(t as i64)
        }
    }
}

fn parse_aligned_record(record: &StringRecord) -> Result<AlignedRow> {
    if record.iter().all(|field| field.is_empty()) {
        return Ok(AlignedRow::SegmentBreak);
    }
    if record.len() != ALIGNED_FIELDS {
        bail!(
            "expected {} fields, got {}: {:?}",
            ALIGNED_FIELDS,
            record.len(),
            record
        );
    }
    let fix = GpsFix::new(
        parse_timestamp(&record[0])?,
        record[1].parse()?,
        record[2].parse()?,
        record[3].parse()?,
    );
    Ok(AlignedRow::Labeled {
        fix,
        label: record[4].to_owned(),
    })
}

/// Reads an aligned stream back. Rows are yielded lazily.
pub fn read_aligned_rows<R: Read>(inner: R) -> impl Iterator<Item = Result<AlignedRow>> {
    let reader = ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .flexible(true)
        .from_reader(inner);
    reader.into_records().enumerate().map(|(i, record)| {
        record
            .map_err(anyhow::Error::from)
            .and_then(|record| parse_aligned_record(&record))
            .with_context(|| format!("bad aligned row at line {}", i + 1))
    })
}

pub fn format_number_list<T: Display>(values: &[T]) -> String {
    format!("[{}]", values.iter().join(", "))
}

/// Strict parser for `[1, 2, 3]` style lists. Only numeric literals of type
/// `T` are accepted between the brackets.
pub fn parse_number_list<T>(s: &str) -> Result<Vec<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let inner = s
        .trim()
        .strip_prefix('[')
        .and_then(|x| x.strip_suffix(']'))
        .ok_or_else(|| anyhow!("not a list literal: {:?}", s))?;
    if inner.trim().is_empty() {
        return Ok(Vec::new());
    }
    inner
        .split(',')
        .map(|item| {
            let item = item.trim();
            // `FromStr` for numbers already rejects anything but digits, sign
            // and decimal syntax.
            if item.is_empty() {
                bail!("empty list element in {:?}", s);
            }
            item.parse::<T>()
                .with_context(|| format!("invalid list element {:?}", item))
        })
        .collect()
}

pub struct TrainingExampleWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> TrainingExampleWriter<W> {
    pub fn new(inner: W) -> Self {
        TrainingExampleWriter {
            writer: WriterBuilder::new()
                .delimiter(b';')
                .has_headers(false)
                .from_writer(inner),
        }
    }

    pub fn write(&mut self, example: &TrainingExample) -> Result<()> {
        let time_deltas = format_number_list(&example.time_deltas);
        let distances = format_number_list(&example.distances);
        self.writer.write_record([
            example.label.as_str(),
            time_deltas.as_str(),
            distances.as_str(),
        ])?;
        Ok(())
    }

    pub fn finish(mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

fn parse_training_record(record: &StringRecord) -> Result<TrainingExample> {
    if record.len() != 3 {
        bail!("expected 3 fields, got {}: {:?}", record.len(), record);
    }
    let example = TrainingExample {
        label: record[0].to_owned(),
        time_deltas: parse_number_list(&record[1])?,
        distances: parse_number_list(&record[2])?,
    };
    if example.time_deltas.len() != example.distances.len() {
        bail!(
            "{} time deltas but {} distances",
            example.time_deltas.len(),
            example.distances.len()
        );
    }
    Ok(example)
}

pub fn read_training_examples<R: Read>(inner: R) -> Result<Vec<TrainingExample>> {
    let mut reader = ReaderBuilder::new()
        .delimiter(b';')
        .has_headers(false)
        .flexible(true)
        .from_reader(inner);
    let mut examples = Vec::new();
    for (i, record) in reader.records().enumerate() {
        let example = record
            .map_err(anyhow::Error::from)
            .and_then(|record| parse_training_record(&record))
            .with_context(|| format!("bad training example at line {}", i + 1))?;
        examples.push(example);
    }
    Ok(examples)
}
