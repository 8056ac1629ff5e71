//! Labeled date intervals ("flags") and the raw records they are stored as.

use chrono::{DateTime, NaiveDate, TimeZone};
use serde::{Deserialize, Serialize};

use crate::datetime::{CalendarZone, parse_calendar_date};
use crate::error::{CalendarError, CalendarResult};

/// A named, inclusive range of calendar days. Only [`DateInterval::new`]
/// builds one, so the end never precedes the start.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DateInterval {
    name: String,
    start_date: NaiveDate,
    end_date: NaiveDate,
}

impl DateInterval {
    /// Builds a validated interval. A missing `end_date` means a single day.
    pub fn new(
        name: impl Into<String>,
        start_date: NaiveDate,
        end_date: Option<NaiveDate>,
    ) -> CalendarResult<Self> {
        let name = name.into();
        let name = name.trim();
        if name.is_empty() {
            return Err(CalendarError::InvalidInterval(
                "flag name cannot be empty".to_string(),
            ));
        }

        let end_date = end_date.unwrap_or(start_date);
        if end_date < start_date {
            return Err(CalendarError::InvalidInterval(format!(
                "end date {end_date} is before start date {start_date}"
            )));
        }

        Ok(Self {
            name: name.to_string(),
            start_date,
            end_date,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn start_date(&self) -> NaiveDate {
        self.start_date
    }

    pub fn end_date(&self) -> NaiveDate {
        self.end_date
    }

    /// Inclusive on both ends; boundary days are contained.
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start_date <= date && date <= self.end_date
    }

    /// Containment of an instant, judged by its calendar day in its own zone.
    pub fn contains_at<Tz: TimeZone>(&self, instant: &DateTime<Tz>) -> bool {
        self.contains(instant.date_naive())
    }

    pub fn is_single_day(&self) -> bool {
        self.start_date == self.end_date
    }

    /// `Dec 25, 2024` or `Dec 24, 2024 - Dec 26, 2024`.
    pub fn display_dates(&self) -> String {
        let start = self.start_date.format("%b %-d, %Y");
        if self.is_single_day() {
            start.to_string()
        } else {
            format!("{start} - {}", self.end_date.format("%b %-d, %Y"))
        }
    }

    pub fn to_record(&self) -> FlagRecord {
        FlagRecord {
            name: self.name.clone(),
            start_date: self.start_date.format("%Y-%m-%d").to_string(),
            end_date: Some(self.end_date.format("%Y-%m-%d").to_string()),
        }
    }
}

/// A flag as it appears in a flag document. Dates are kept verbatim so a
/// damaged entry survives a load/save cycle and is reported when used.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlagRecord {
    pub name: String,
    pub start_date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
}

impl FlagRecord {
    /// The stored end date, or the start date when none was stored.
    pub fn end_or_start(&self) -> &str {
        match self.end_date.as_deref() {
            Some(end) if !end.trim().is_empty() => end,
            _ => &self.start_date,
        }
    }

    /// Reads the record's dates. Unreadable dates yield
    /// [`CalendarError::MalformedDateInFlag`]; readable but reversed dates
    /// yield [`CalendarError::InvalidInterval`].
    pub fn interval(&self, zone: &CalendarZone, today: NaiveDate) -> CalendarResult<DateInterval> {
        let start = self.parse_date(&self.start_date, zone, today)?;
        let end = self.parse_date(self.end_or_start(), zone, today)?;
        DateInterval::new(self.name.clone(), start, Some(end))
    }

    fn parse_date(
        &self,
        raw: &str,
        zone: &CalendarZone,
        today: NaiveDate,
    ) -> CalendarResult<NaiveDate> {
        parse_calendar_date(raw, zone, today).map_err(|_| CalendarError::MalformedDateInFlag {
            name: self.name.clone(),
            value: raw.to_string(),
        })
    }
}
