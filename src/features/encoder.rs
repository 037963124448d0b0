//! Feature Encoder - raw flight records -> risk-score matrix
//!
//! Derived keys (`Route`, `Hub_Airline`, `Hub_x_Dest`) are always built
//! from the raw category text, never from already-encoded scores.

use std::sync::Arc;

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};

use crate::{AppError, AppResult};
use super::layout::{self, FEATURE_COUNT};
use super::mapping::{MappingTable, HUB_X_DEST};

// ============================================================================
// RAW INPUT
// ============================================================================

/// A batch of raw rows sharing one header
#[derive(Debug, Clone, Default)]
pub struct RawBatch {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
    /// Zero-based index of the first row within the whole input
    row_offset: usize,
}

impl RawBatch {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { columns, rows, row_offset: 0 }
    }

    pub fn with_row_offset(mut self, row_offset: usize) -> Self {
        self.row_offset = row_offset;
        self
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn row_offset(&self) -> usize {
        self.row_offset
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Keep only `names`, in that order. Missing names are skipped.
    pub fn select(&self, names: &[String]) -> RawBatch {
        let picks: Vec<usize> = names.iter().filter_map(|n| self.column_index(n)).collect();
        RawBatch {
            columns: picks.iter().map(|&i| self.columns[i].clone()).collect(),
            rows: self
                .rows
                .iter()
                .map(|row| picks.iter().map(|&i| row.get(i).cloned().unwrap_or_default()).collect())
                .collect(),
            row_offset: self.row_offset,
        }
    }
}

// ============================================================================
// ENCODED OUTPUT
// ============================================================================

/// Row-major numeric matrix with named columns in canonical order
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FeatureMatrix {
    columns: Vec<&'static str>,
    values: Vec<f64>,
    n_rows: usize,
}

impl FeatureMatrix {
    pub fn new(columns: Vec<&'static str>, values: Vec<f64>) -> AppResult<Self> {
        let width = columns.len();
        let n_rows = if width == 0 { 0 } else { values.len() / width };
        if width > 0 && values.len() % width != 0 {
            return Err(AppError::DataError(format!(
                "{} values do not fill rows of width {}",
                values.len(),
                width
            )));
        }
        Ok(Self { columns, values, n_rows })
    }

    pub fn columns(&self) -> &[&'static str] {
        &self.columns
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn len(&self) -> usize {
        self.n_rows
    }

    pub fn is_empty(&self) -> bool {
        self.n_rows == 0
    }

    pub fn row(&self, index: usize) -> &[f64] {
        let w = self.width();
        &self.values[index * w..(index + 1) * w]
    }

    pub fn rows(&self) -> impl Iterator<Item = &[f64]> + '_ {
        (0..self.n_rows).map(move |i| self.row(i))
    }

    /// Value of a named column in one row
    pub fn get(&self, row: usize, column: &str) -> Option<f64> {
        let col = self.columns.iter().position(|&c| c == column)?;
        self.values.get(row * self.width() + col).copied()
    }
}

// ============================================================================
// ENCODER
// ============================================================================

/// Batch-level decisions: which sources exist and which mappings to use
struct EncodePlan {
    airline: Option<usize>,
    origin: Option<usize>,
    dest: Option<usize>,
    month: Option<usize>,
    day: Option<usize>,
    flight_date: Option<usize>,
    cancelled: Option<usize>,
    derive_from_date: bool,
    month_map: &'static str,
    day_map: &'static str,
    winter_map: &'static str,
    present: [bool; FEATURE_COUNT],
}

#[derive(Debug, Clone)]
pub struct FeatureEncoder {
    table: Arc<MappingTable>,
}

impl FeatureEncoder {
    pub fn new(table: Arc<MappingTable>) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &MappingTable {
        &self.table
    }

    /// Encode a batch. Only an unparseable `FlightDate` is an error;
    /// unknown categories score `UNKNOWN_RISK`.
    pub fn encode(&self, batch: &RawBatch) -> AppResult<FeatureMatrix> {
        let plan = self.plan(batch);
        let columns: Vec<&'static str> = (0..FEATURE_COUNT)
            .filter(|&slot| plan.present[slot])
            .filter_map(layout::feature_name)
            .collect();

        let mut values = Vec::with_capacity(batch.len() * columns.len());
        for (i, row) in batch.rows().iter().enumerate() {
            let encoded = self.encode_row(&plan, row, batch.row_offset() + i + 1)?;
            values.extend(
                encoded
                    .iter()
                    .zip(plan.present.iter())
                    .filter(|(_, present)| **present)
                    .map(|(v, _)| *v),
            );
        }

        let mut matrix = FeatureMatrix::new(columns, values)?;
        matrix.n_rows = batch.len();
        Ok(matrix)
    }

    fn plan(&self, batch: &RawBatch) -> EncodePlan {
        let airline = batch.column_index(layout::RAW_AIRLINE);
        let origin = batch.column_index(layout::RAW_ORIGIN);
        let dest = batch.column_index(layout::RAW_DEST);
        let month = batch.column_index(layout::RAW_MONTH);
        let day = batch.column_index(layout::RAW_DAY_OF_MONTH);
        let flight_date = batch.column_index(layout::RAW_FLIGHT_DATE);
        let cancelled = batch.column_index(layout::RAW_CANCELLED);

        let derive_from_date = flight_date.is_some() && (month.is_none() || day.is_none());
        let has_month = month.is_some() || derive_from_date;
        let has_day = day.is_some() || derive_from_date;

        let t = &self.table;
        let month_map = if t.contains("Month") { "Month" } else { "Month_cos" };
        let day_map = if t.contains("DayofMonth") { "DayofMonth" } else { "DayofMonth_cos" };
        let winter_map = if t.contains("Is_Winter") { "Is_Winter" } else { "Is_Winter_from_Month" };

        let mut present = [false; FEATURE_COUNT];
        present[layout::AIRLINE] = airline.is_some();
        present[layout::ORIGIN] = origin.is_some();
        present[layout::DEST] = dest.is_some();
        present[layout::ROUTE] = origin.is_some() && dest.is_some();
        present[layout::HUB_AIRLINE] = airline.is_some() && origin.is_some();
        present[layout::MONTH_COS] = has_month;
        present[layout::DAY_OF_MONTH_COS] = has_day;
        present[layout::IS_WINTER] = has_month;
        present[layout::HUB_X_DEST] =
            present[layout::HUB_AIRLINE] && dest.is_some() && t.contains(HUB_X_DEST);
        present[layout::CANCELLED] = cancelled.is_some() && t.contains(layout::RAW_CANCELLED);

        EncodePlan {
            airline,
            origin,
            dest,
            month,
            day,
            flight_date,
            cancelled,
            derive_from_date,
            month_map,
            day_map,
            winter_map,
            present,
        }
    }

    fn encode_row(&self, plan: &EncodePlan, row: &[String], row_no: usize) -> AppResult<[f64; FEATURE_COUNT]> {
        let t = &self.table;
        let text = |idx: Option<usize>| idx.map(|i| row.get(i).map(String::as_str).unwrap_or(""));
        let mut out = [0.0; FEATURE_COUNT];

        // Raw category text first; every derived key is built from these
        let airline = text(plan.airline);
        let origin = text(plan.origin);
        let dest = text(plan.dest);
        let route = origin.zip(dest).map(|(o, d)| format!("{}_{}", o, d));
        let hub_airline = airline.zip(origin).map(|(a, o)| format!("{}_{}", a, o));

        let (month, day) = if plan.derive_from_date {
            let raw = text(plan.flight_date).unwrap_or("");
            let (m, d) = parse_flight_date(raw).ok_or_else(|| {
                AppError::DataError(format!("Unparseable FlightDate '{}' at row {}", raw, row_no))
            })?;
            (Some(m.to_string()), Some(d.to_string()))
        } else {
            (text(plan.month).map(integer_text), text(plan.day).map(integer_text))
        };

        if let Some(v) = airline {
            out[layout::AIRLINE] = t.lookup("Airline", v);
        }
        if let Some(v) = origin {
            out[layout::ORIGIN] = t.lookup("Origin", v);
        }
        if let Some(v) = dest {
            out[layout::DEST] = t.lookup("Dest", v);
        }
        if let Some(v) = &route {
            out[layout::ROUTE] = t.lookup("Route", v);
        }
        if let Some(v) = &hub_airline {
            out[layout::HUB_AIRLINE] = t.lookup("Hub_Airline", v);
        }
        if let Some(m) = &month {
            out[layout::MONTH_COS] = t.lookup(plan.month_map, m);
            out[layout::IS_WINTER] = t.lookup(plan.winter_map, m);
        }
        if let Some(d) = &day {
            out[layout::DAY_OF_MONTH_COS] = t.lookup(plan.day_map, d);
        }
        if plan.present[layout::HUB_X_DEST] {
            if let (Some(hub), Some(d)) = (&hub_airline, dest) {
                out[layout::HUB_X_DEST] = t.lookup(HUB_X_DEST, &format!("{}_{}", hub, d));
            }
        }
        if plan.present[layout::CANCELLED] {
            if let Some(c) = text(plan.cancelled) {
                out[layout::CANCELLED] = t.lookup(layout::RAW_CANCELLED, c);
            }
        }

        Ok(out)
    }
}

// ============================================================================
// VALUE HELPERS
// ============================================================================

/// Month/day text normalized to an integer key ("3.0" -> "3").
/// Non-numeric text is returned unchanged.
pub fn integer_text(raw: &str) -> String {
    let trimmed = raw.trim();
    match trimmed.parse::<f64>() {
        Ok(v) if v.is_finite() && v.fract() == 0.0 => format!("{}", v as i64),
        _ => raw.to_string(),
    }
}

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %I:%M:%S %p",
];

/// Parse a flight date into (month, day-of-month)
pub fn parse_flight_date(raw: &str) -> Option<(u32, u32)> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
                .map(|dt| dt.date())
        })
        .or_else(|| DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.date_naive()))
        .map(|d| (d.month(), d.day()))
}
