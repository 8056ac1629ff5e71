//! Error types for the calendar engine.

use chrono::NaiveDate;
use thiserror::Error;

/// Failures reported by the engine operations.
///
/// Every variant is a reportable result: nothing in the engine panics or
/// aborts a render part way through.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CalendarError {
    #[error("invalid flag: {0}")]
    InvalidInterval(String),

    #[error("range {start} to {end} spans {months} months; at most {max} are allowed", max = crate::range::MAX_SPAN_MONTHS)]
    RangeTooLarge {
        start: NaiveDate,
        end: NaiveDate,
        months: i32,
    },

    #[error("range end {end} is before its start {start}")]
    ReversedRange { start: NaiveDate, end: NaiveDate },

    #[error("unsupported output format: {0}")]
    UnsupportedFormat(String),

    #[error("flag '{name}' has an unreadable date: {value}")]
    MalformedDateInFlag { name: String, value: String },
}

/// Result type alias for engine operations.
pub type CalendarResult<T> = Result<T, CalendarError>;
