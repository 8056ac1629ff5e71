//! Sunday-first week rows for a single month.

use chrono::{Datelike, NaiveDate};

use crate::datetime::{end_of_month, first_day_of_month, start_of_month};

pub const DAYS_PER_WEEK: usize = 7;

pub type WeekRow = [Option<NaiveDate>; DAYS_PER_WEEK];

/// A month laid out Sunday through Saturday, with `None` padding before
/// the 1st and after the last day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthGrid {
    first: NaiveDate,
    leading: usize,
    days: u32,
}

impl MonthGrid {
    /// The grid of the month containing `date`.
    pub fn containing(date: NaiveDate) -> Self {
        let first = start_of_month(date);
        Self {
            first,
            leading: first.weekday().num_days_from_sunday() as usize,
            days: end_of_month(date).day(),
        }
    }

    pub fn month(&self) -> NaiveDate {
        self.first
    }

    /// Empty cells before the 1st (0 when the month starts on Sunday).
    pub fn leading_padding(&self) -> usize {
        self.leading
    }

    pub fn days_in_month(&self) -> u32 {
        self.days
    }

    pub fn week_count(&self) -> usize {
        (self.leading + self.days as usize).div_ceil(DAYS_PER_WEEK)
    }

    pub fn trailing_padding(&self) -> usize {
        self.week_count() * DAYS_PER_WEEK - self.leading - self.days as usize
    }

    /// A fresh pass over the week rows; every call starts from the top.
    pub fn weeks(&self) -> WeekRows {
        WeekRows {
            grid: *self,
            next_week: 0,
        }
    }
}

/// `None` when `month` is outside 1..=12 or `year` is beyond chrono's range.
pub fn build_month_grid(year: i32, month: u32) -> Option<MonthGrid> {
    first_day_of_month(year, month).map(MonthGrid::containing)
}

#[derive(Debug, Clone)]
pub struct WeekRows {
    grid: MonthGrid,
    next_week: usize,
}

impl Iterator for WeekRows {
    type Item = WeekRow;

    fn next(&mut self) -> Option<WeekRow> {
        if self.next_week >= self.grid.week_count() {
            return None;
        }

        let mut row: WeekRow = [None; DAYS_PER_WEEK];
        let base = self.next_week * DAYS_PER_WEEK;
        for (column, slot) in row.iter_mut().enumerate() {
            let position = base + column;
            if position < self.grid.leading {
                continue;
            }
            let day = (position - self.grid.leading) as u32 + 1;
            if day > self.grid.days {
                break;
            }
            *slot = self.grid.first.with_day(day);
        }

        self.next_week += 1;
        Some(row)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.grid.week_count().saturating_sub(self.next_week);
        (left, Some(left))
    }
}

impl ExactSizeIterator for WeekRows {}
