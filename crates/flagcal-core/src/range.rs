use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::datetime::{add_months, end_of_month, months_between, start_of_month};
use crate::error::{CalendarError, CalendarResult};

/// Largest number of calendar months a project range may touch.
pub const MAX_SPAN_MONTHS: i32 = 16;

/// The user-selected, inclusive span of days being rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectRange {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl ProjectRange {
    /// Builds a range after running [`validate_range`].
    pub fn new(start_date: NaiveDate, end_date: NaiveDate) -> CalendarResult<Self> {
        validate_range(start_date, end_date)?;
        Ok(Self {
            start_date,
            end_date,
        })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start_date <= date && date <= self.end_date
    }

    /// First day of the start month through the last day of the end month.
    pub fn display_span(&self) -> (NaiveDate, NaiveDate) {
        (start_of_month(self.start_date), end_of_month(self.end_date))
    }

    /// The first day of every month in the display span, in order.
    pub fn months(&self) -> impl Iterator<Item = NaiveDate> + Clone + use<> {
        let (first, last) = self.display_span();
        let count = months_between(first, last).max(0) + 1;
        (0..count).map_while(move |offset| add_months(first, offset))
    }

    pub fn month_count(&self) -> i32 {
        months_between(self.start_date, self.end_date) + 1
    }
}

/// Checks that `end` is not before `start` and that the range touches at
/// most [`MAX_SPAN_MONTHS`] calendar months.
#[instrument]
pub fn validate_range(start: NaiveDate, end: NaiveDate) -> CalendarResult<()> {
    if end < start {
        return Err(CalendarError::ReversedRange { start, end });
    }

    let months = months_between(start, end) + 1;
    if months > MAX_SPAN_MONTHS {
        return Err(CalendarError::RangeTooLarge { start, end, months });
    }

    Ok(())
}
