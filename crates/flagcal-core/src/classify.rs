use chrono::NaiveDate;
use serde::Serialize;

use crate::datetime::is_weekend;
use crate::flags::FlagSet;
use crate::interval::DateInterval;
use crate::range::ProjectRange;

pub const COLOR_GRAY: &str = "#808080";
pub const COLOR_ORANGE: &str = "#FFA500";
pub const COLOR_ACTIVE: &str = "#E6E6E6";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum DayCategory {
    Padding,
    OutOfRange,
    Flagged,
    DimmedWeekend,
    Active,
}

impl DayCategory {
    pub fn color(self) -> &'static str {
        match self {
            DayCategory::Padding | DayCategory::OutOfRange | DayCategory::DimmedWeekend => {
                COLOR_GRAY
            }
            DayCategory::Flagged => COLOR_ORANGE,
            DayCategory::Active => COLOR_ACTIVE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DayStyle {
    pub category: DayCategory,
    pub color: &'static str,
}

impl From<DayCategory> for DayStyle {
    fn from(category: DayCategory) -> Self {
        Self {
            category,
            color: category.color(),
        }
    }
}

/// One square of a week row. Built fresh on every render.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DayCell {
    pub date: Option<NaiveDate>,
    pub in_project_range: bool,
    pub is_weekend: bool,
    pub matched_flag: Option<DateInterval>,
}

impl DayCell {
    pub fn padding() -> Self {
        Self {
            date: None,
            in_project_range: false,
            is_weekend: false,
            matched_flag: None,
        }
    }

    pub fn build(date: Option<NaiveDate>, range: &ProjectRange, flags: &FlagSet) -> Self {
        let Some(day) = date else {
            return Self::padding();
        };
        Self {
            date,
            in_project_range: range.contains(day),
            is_weekend: is_weekend(day),
            matched_flag: flags.matching_flag(day).cloned(),
        }
    }
}

/// Assigns exactly one category, checking in this order: padding, outside
/// the project range, flagged, dimmed weekend, active. A flag therefore
/// beats weekend dimming, and the project range beats a flag.
pub fn classify(
    date: Option<NaiveDate>,
    range: &ProjectRange,
    flags: &FlagSet,
    dim_weekends: bool,
) -> DayStyle {
    let Some(day) = date else {
        return DayCategory::Padding.into();
    };
    if !range.contains(day) {
        return DayCategory::OutOfRange.into();
    }
    if flags.is_flagged(day) {
        return DayCategory::Flagged.into();
    }
    if dim_weekends && is_weekend(day) {
        return DayCategory::DimmedWeekend.into();
    }
    DayCategory::Active.into()
}

/// Category from an already built cell, so flags are consulted once per day.
pub fn classify_cell(cell: &DayCell, dim_weekends: bool) -> DayStyle {
    let category = match cell.date {
        None => DayCategory::Padding,
        Some(_) if !cell.in_project_range => DayCategory::OutOfRange,
        Some(_) if cell.matched_flag.is_some() => DayCategory::Flagged,
        Some(_) if dim_weekends && cell.is_weekend => DayCategory::DimmedWeekend,
        Some(_) => DayCategory::Active,
    };
    category.into()
}
