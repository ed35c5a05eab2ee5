//! Loading of the tab-delimited city table and magnitude normalization.

pub mod encoding;

use std::fs;
use std::path::Path;

use indexmap::IndexMap;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::constants::{MAX_MARKER_RADIUS, TABLE_ENCODINGS};
use crate::error::{MapError, Result};

pub use encoding::decode_with_fallback;

/// One city after parsing and normalization.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CityRecord {
    pub longitude: f64,
    pub latitude: f64,
    pub magnitude: f64,
    pub scaled_radius: f64,
}

/// Why a row did not make it into the table.
#[derive(Debug, Clone, PartialEq, Serialize, thiserror::Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SkipReason {
    #[error("expected at least 4 columns, found {found}")]
    TooFewFields { found: usize },
    #[error("column {column} is not a number: {value:?}")]
    InvalidNumber { column: &'static str, value: String },
    #[error("magnitude must not be negative: {value}")]
    NegativeMagnitude { value: f64 },
    #[error("unreadable record: {message}")]
    Unreadable { message: String },
}

/// A skipped row, with its 1-based line in the source file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RowIssue {
    pub line: u64,
    pub content: String,
    pub reason: SkipReason,
}

/// City name -> record, in first-seen order.
#[derive(Debug, Clone, Default)]
pub struct CityTable {
    records: IndexMap<String, CityRecord>,
    skipped: Vec<RowIssue>,
    max_magnitude: f64,
    encoding: Option<&'static str>,
}

struct ParsedRow {
    name: String,
    longitude: f64,
    latitude: f64,
    magnitude: f64,
}

/// Reads a city table from disk, trying each encoding in [`TABLE_ENCODINGS`] in turn.
pub fn load_table(path: impl AsRef<Path>) -> Result<CityTable> {
    let path = path.as_ref();
    let bytes = fs::read(path).map_err(|source| MapError::TableRead {
        path: path.to_path_buf(),
        source,
    })?;

    let (text, encoding) =
        decode_with_fallback(&bytes, TABLE_ENCODINGS).ok_or_else(|| MapError::EncodingExhausted {
            path: path.to_path_buf(),
            tried: TABLE_ENCODINGS.join(", "),
        })?;
    info!("reading {} as {}", path.display(), encoding.name());

    let mut table = CityTable::parse(&text);
    table.encoding = Some(encoding.name());

    info!(
        "loaded {} cities from {} ({} rows skipped, max magnitude {})",
        table.len(),
        path.display(),
        table.skipped.len(),
        table.max_magnitude
    );
    Ok(table)
}

impl CityTable {
    /// Parses already-decoded table text. The first line is a header and is ignored.
    ///
    /// Blank lines count as rows with no columns and are reported like any other short row.
    pub fn parse(text: &str) -> Self {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .has_headers(true)
            .flexible(true)
            .from_reader(text.as_bytes());

        match reader.headers() {
            Ok(header) => debug!("table header: {:?}", header.iter().collect::<Vec<_>>()),
            Err(e) => warn!("could not read table header: {}", e),
        }

        let lines = LineIndex::new(text);
        let mut last_line = lines.line_at(reader.position().byte().saturating_sub(1) as usize);
        let mut rows = Vec::new();
        let mut skipped = Vec::new();

        for result in reader.records() {
            let record = match result {
                Ok(record) => record,
                Err(e) => {
                    let line = e
                        .position()
                        .map(|p| lines.line_at(lines.record_start(p.byte() as usize)))
                        .unwrap_or(last_line + 1);
                    warn!("skipping line {}: unreadable record: {}", line, e);
                    skipped.push(RowIssue {
                        line,
                        content: String::new(),
                        reason: SkipReason::Unreadable {
                            message: e.to_string(),
                        },
                    });
                    last_line = line;
                    continue;
                }
            };

            // csv stamps the position before skipping empty lines
            let start = record
                .position()
                .map(|p| lines.record_start(p.byte() as usize))
                .unwrap_or_default();
            let line = lines.line_at(start);
            push_blank_lines(&mut skipped, last_line + 1..line);
            last_line = line + record.iter().map(|f| f.matches('\n').count() as u64).sum::<u64>();

            match parse_row(&record) {
                Ok(row) => rows.push(row),
                Err(reason) => {
                    let content = record.iter().collect::<Vec<_>>().join("\t");
                    warn!("skipping line {} {:?}: {}", line, content, reason);
                    skipped.push(RowIssue { line, content, reason });
                }
            }
        }
        push_blank_lines(&mut skipped, last_line + 1..lines.count() + 1);

        let mut table = Self::from_rows(rows);
        table.skipped = skipped;
        table
    }

    /// Builds a table from `(name, longitude, latitude, magnitude)` entries.
    ///
    /// Later entries with an existing name replace the earlier record but keep its position.
    pub fn from_entries<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, f64, f64, f64)>,
        S: Into<String>,
    {
        let rows = entries
            .into_iter()
            .map(|(name, longitude, latitude, magnitude)| ParsedRow {
                name: name.into(),
                longitude,
                latitude,
                magnitude,
            })
            .collect();
        Self::from_rows(rows)
    }

    // The maximum must be known before any radius is computed, so this is two passes.
    // Duplicates are resolved first so an overwritten row cannot set the scale.
    fn from_rows(rows: Vec<ParsedRow>) -> Self {
        let mut records = IndexMap::with_capacity(rows.len());
        for row in rows {
            records.insert(
                row.name,
                CityRecord {
                    longitude: row.longitude,
                    latitude: row.latitude,
                    magnitude: row.magnitude,
                    scaled_radius: 0.0,
                },
            );
        }

        let max_magnitude = records
            .values()
            .map(|r: &CityRecord| r.magnitude)
            .fold(0.0_f64, f64::max);

        for (name, record) in records.iter_mut() {
            record.scaled_radius = scale_radius(record.magnitude, max_magnitude);
            debug!(
                "read {} at ({}, {}), magnitude {}, scaled radius {:.2}",
                name, record.longitude, record.latitude, record.magnitude, record.scaled_radius
            );
        }

        CityTable {
            records,
            skipped: Vec::new(),
            max_magnitude,
            encoding: None,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&CityRecord> {
        self.records.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &CityRecord)> {
        self.records.iter().map(|(name, record)| (name.as_str(), record))
    }

    /// Rows that were rejected while parsing.
    pub fn skipped(&self) -> &[RowIssue] {
        &self.skipped
    }

    /// Largest magnitude among accepted rows, or 0 when none is positive.
    pub fn max_magnitude(&self) -> f64 {
        self.max_magnitude
    }

    /// Name of the encoding the source file was decoded with, when loaded from disk.
    pub fn encoding(&self) -> Option<&'static str> {
        self.encoding
    }
}

/// Linear scaling onto `[0, MAX_MARKER_RADIUS]`; a non-positive maximum yields 0.
pub fn scale_radius(magnitude: f64, max_magnitude: f64) -> f64 {
    if max_magnitude > 0.0 {
        magnitude / max_magnitude * MAX_MARKER_RADIUS
    } else {
        0.0
    }
}

/// Byte offset to 1-based line lookup over the decoded table text.
struct LineIndex<'a> {
    text: &'a str,
    newlines: Vec<usize>,
}

impl<'a> LineIndex<'a> {
    fn new(text: &'a str) -> Self {
        let newlines = text
            .bytes()
            .enumerate()
            .filter_map(|(i, b)| (b == b'\n').then_some(i))
            .collect();
        Self { text, newlines }
    }

    fn line_at(&self, byte: usize) -> u64 {
        self.newlines.partition_point(|&nl| nl < byte) as u64 + 1
    }

    /// First byte at or after `byte` that is not a line break.
    fn record_start(&self, byte: usize) -> usize {
        let rest = self.text.as_bytes().get(byte..).unwrap_or_default();
        byte + rest.iter().take_while(|b| matches!(b, b'\r' | b'\n')).count()
    }

    fn count(&self) -> u64 {
        self.text.lines().count() as u64
    }
}

fn push_blank_lines(skipped: &mut Vec<RowIssue>, lines: std::ops::Range<u64>) {
    for line in lines {
        warn!("skipping line {}: blank line", line);
        skipped.push(RowIssue {
            line,
            content: String::new(),
            reason: SkipReason::TooFewFields { found: 0 },
        });
    }
}

fn parse_row(record: &csv::StringRecord) -> std::result::Result<ParsedRow, SkipReason> {
    if record.len() < 4 {
        return Err(SkipReason::TooFewFields {
            found: record.len(),
        });
    }

    let name = record[0].trim().to_string();
    let longitude = parse_number(&record[1], "longitude")?;
    let latitude = parse_number(&record[2], "latitude")?;
    let magnitude = parse_number(&record[3], "magnitude")?;
    if magnitude < 0.0 {
        return Err(SkipReason::NegativeMagnitude { value: magnitude });
    }

    Ok(ParsedRow {
        name,
        longitude,
        latitude,
        magnitude,
    })
}

fn parse_number(field: &str, column: &'static str) -> std::result::Result<f64, SkipReason> {
    match field.trim().parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(SkipReason::InvalidNumber {
            column,
            value: field.to_string(),
        }),
    }
}
