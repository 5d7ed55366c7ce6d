//! Best-effort date/time coercion for string columns.
use crate::metrics::error::MetricError;
use crate::store::types::midnight;
use crate::store::Scalar;
use chrono::{DateTime, NaiveDate, NaiveDateTime};

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
];

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%d %B %Y",
    "%B %d, %Y",
    "%b %d, %Y",
    "%d %b %Y",
    "%Y%m%d",
];

/// Parses a date or date-time string in any of the common layouts.
///
/// Offsets are normalized to UTC; bare dates map to midnight.
pub fn parse_datetime(input: &str) -> Option<NaiveDateTime> {
    let s = input.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }
    DATETIME_FORMATS
        .iter()
        .find_map(|f| NaiveDateTime::parse_from_str(s, f).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|f| NaiveDate::parse_from_str(s, f).ok())
                .map(midnight)
        })
}

/// How a column came out of datetime coercion. Decided once for the whole column.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseOutcome {
    /// Every value was a string and parsed.
    Parsed(Vec<NaiveDateTime>),
    /// A non-string value was met; the column is compared as-is.
    Raw(Vec<Scalar>),
}

impl ParseOutcome {
    /// Attempts to coerce every value, visiting rows in order.
    ///
    /// The first failure decides: a non-string value abandons parsing for the
    /// whole column (`Raw`), an unrecognized string is an error.
    pub fn coerce(values: &[Scalar]) -> Result<ParseOutcome, MetricError> {
        let mut parsed = Vec::with_capacity(values.len());
        for (row, value) in values.iter().enumerate() {
            match value {
                Scalar::Str(s) => match parse_datetime(s) {
                    Some(dt) => parsed.push(dt),
                    None => return Err(MetricError::UnparseableDatetime { row, value: s.clone() }),
                },
                other => {
                    tracing::debug!(row, found = other.type_name(), "datetime coercion abandoned, comparing raw values");
                    return Ok(ParseOutcome::Raw(values.to_vec()));
                }
            }
        }
        Ok(ParseOutcome::Parsed(parsed))
    }

    pub fn into_scalars(self) -> Vec<Scalar> {
        match self {
            ParseOutcome::Parsed(values) => values.into_iter().map(Scalar::Timestamp).collect(),
            ParseOutcome::Raw(values) => values,
        }
    }
}
