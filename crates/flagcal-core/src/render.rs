//! Calendar rendering.
//!
//! Every output format shares one pipeline: walk the months of the display
//! span, lay each out as a [`MonthGrid`], classify each cell, and
//! hand the results to the format's [`Emitter`]. Formats differ only in the
//! text their emitter writes.

mod html;
mod markdown;
mod text;
mod word;

use std::fmt;
use std::str::FromStr;

use anyhow::anyhow;
use chrono::{Datelike, NaiveDate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::classify::{DayCell, DayStyle, classify_cell};
use crate::error::{CalendarError, CalendarResult};
use crate::flags::FlagSet;
use crate::grid::{DAYS_PER_WEEK, MonthGrid};
use crate::range::{ProjectRange, validate_range};

pub(crate) const WEEKDAY_INITIALS: [&str; DAYS_PER_WEEK] = ["S", "M", "T", "W", "T", "F", "S"];
pub(crate) const WEEKDAY_ABBREVIATIONS: [&str; DAYS_PER_WEEK] =
    ["Su", "Mo", "Tu", "We", "Th", "Fr", "Sa"];

pub(crate) const CHROME_BACKGROUND: &str = "#2D2D2D";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Inline-styled markup meant for pasting into a word processor.
    Word,
    Html,
    Text,
    Markdown,
}

impl OutputFormat {
    pub const ALL: [OutputFormat; 4] = [
        OutputFormat::Word,
        OutputFormat::Html,
        OutputFormat::Text,
        OutputFormat::Markdown,
    ];

    pub fn name(self) -> &'static str {
        match self {
            OutputFormat::Word => "word",
            OutputFormat::Html => "html",
            OutputFormat::Text => "text",
            OutputFormat::Markdown => "markdown",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            OutputFormat::Word => "rich markup with inline styles for word processors",
            OutputFormat::Html => "minimal HTML tables",
            OutputFormat::Text => "fixed-width plain text",
            OutputFormat::Markdown => "Markdown tables",
        }
    }

    /// Whether the output carries per-day colour.
    pub fn is_markup(self) -> bool {
        matches!(self, OutputFormat::Word | OutputFormat::Html)
    }

    fn emitter(self) -> &'static dyn Emitter {
        match self {
            OutputFormat::Word => &word::WordEmitter,
            OutputFormat::Html => &html::HtmlEmitter,
            OutputFormat::Text => &text::TextEmitter,
            OutputFormat::Markdown => &markdown::MarkdownEmitter,
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for OutputFormat {
    type Err = CalendarError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "word" => Ok(OutputFormat::Word),
            "html" => Ok(OutputFormat::Html),
            "text" | "txt" => Ok(OutputFormat::Text),
            "markdown" | "md" => Ok(OutputFormat::Markdown),
            _ => Err(CalendarError::UnsupportedFormat(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderOptions {
    pub dim_weekends: bool,
    pub format: OutputFormat,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassifiedDay {
    pub cell: DayCell,
    pub style: DayStyle,
}

impl ClassifiedDay {
    /// Day of month, or an empty string for padding.
    pub fn label(&self) -> String {
        self.cell
            .date
            .map(|date| date.day().to_string())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthView {
    pub month: NaiveDate,
    pub weeks: Vec<[ClassifiedDay; DAYS_PER_WEEK]>,
}

impl MonthView {
    /// `2024 December`
    pub fn title(&self) -> String {
        self.month.format("%Y %B").to_string()
    }
}

/// Writes one format. The pipeline calls these in document order:
/// `open`, then per month `month_header`, `weekday_header`, per week
/// `open_week`, seven `day_cell`s and `close_week`, then `close_month`;
/// finally `close`.
pub(crate) trait Emitter {
    fn open(&self, _out: &mut String) {}

    fn month_header(&self, out: &mut String, month: &MonthView, index: usize);

    fn weekday_header(&self, out: &mut String);

    fn open_week(&self, _out: &mut String) {}

    fn day_cell(&self, out: &mut String, day: &ClassifiedDay, column: usize);

    fn close_week(&self, out: &mut String);

    fn close_month(&self, out: &mut String);

    fn close(&self, _out: &mut String) {}
}

/// Classified month grids for every month of the range's display span.
#[instrument(skip(flags))]
pub fn calendar_months(
    range: &ProjectRange,
    flags: &FlagSet,
    dim_weekends: bool,
) -> Vec<MonthView> {
    range
        .months()
        .map(|month| {
            let grid = MonthGrid::containing(month);
            let weeks = grid
                .weeks()
                .map(|row| {
                    row.map(|date| {
                        let cell = DayCell::build(date, range, flags);
                        let style = classify_cell(&cell, dim_weekends);
                        ClassifiedDay { cell, style }
                    })
                })
                .collect();
            MonthView { month, weeks }
        })
        .collect()
}

/// Renders the range in the requested format.
#[instrument(skip(flags), fields(flag_count = flags.len()))]
pub fn render(
    range: &ProjectRange,
    flags: &FlagSet,
    options: RenderOptions,
) -> CalendarResult<String> {
    validate_range(range.start_date, range.end_date)?;

    let months = calendar_months(range, flags, options.dim_weekends);
    let emitter = options.format.emitter();

    let mut out = String::new();
    emitter.open(&mut out);
    for (index, month) in months.iter().enumerate() {
        emitter.month_header(&mut out, month, index);
        emitter.weekday_header(&mut out);
        for week in &month.weeks {
            emitter.open_week(&mut out);
            for (column, day) in week.iter().enumerate() {
                emitter.day_cell(&mut out, day, column);
            }
            emitter.close_week(&mut out);
        }
        emitter.close_month(&mut out);
    }
    emitter.close(&mut out);

    debug!(
        months = months.len(),
        bytes = out.len(),
        format = %options.format,
        "rendered calendar"
    );
    Ok(out)
}

/// [`render`] with the format given by name.
pub fn render_named(
    range: &ProjectRange,
    flags: &FlagSet,
    dim_weekends: bool,
    format: &str,
) -> CalendarResult<String> {
    let format = format.parse::<OutputFormat>()?;
    render(
        range,
        flags,
        RenderOptions {
            dim_weekends,
            format,
        },
    )
}

/// Drops whitespace between tags and squeezes other runs of whitespace to
/// a single space, for pasting markup as one line.
pub fn compact_markup(markup: &str) -> anyhow::Result<String> {
    let between_tags =
        Regex::new(r">\s+<").map_err(|e| anyhow!("internal regex compile failure: {e}"))?;
    let runs = Regex::new(r"\s+").map_err(|e| anyhow!("internal regex compile failure: {e}"))?;

    let squeezed = between_tags.replace_all(markup, "><");
    let squeezed = runs.replace_all(&squeezed, " ");
    Ok(squeezed.trim().to_string())
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::{
        OutputFormat, RenderOptions, calendar_months, compact_markup, render, render_named,
    };
    use crate::classify::DayCategory;
    use crate::error::CalendarError;
    use crate::flags::FlagSet;
    use crate::interval::DateInterval;
    use crate::range::ProjectRange;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    fn december() -> ProjectRange {
        ProjectRange::new(date(2024, 12, 19), date(2024, 12, 31)).expect("valid range")
    }

    fn christmas() -> FlagSet {
        FlagSet::from_intervals([
            DateInterval::new("Christmas", date(2024, 12, 25), None).expect("valid interval")
        ])
    }

    #[test]
    fn parses_format_names_and_aliases() {
        assert_eq!("word".parse::<OutputFormat>(), Ok(OutputFormat::Word));
        assert_eq!("HTML".parse::<OutputFormat>(), Ok(OutputFormat::Html));
        assert_eq!("txt".parse::<OutputFormat>(), Ok(OutputFormat::Text));
        assert_eq!("md".parse::<OutputFormat>(), Ok(OutputFormat::Markdown));
        assert_eq!(
            "pdf".parse::<OutputFormat>(),
            Err(CalendarError::UnsupportedFormat("pdf".to_string()))
        );
        for format in OutputFormat::ALL {
            assert_eq!(format.name().parse::<OutputFormat>(), Ok(format));
        }
    }

    #[test]
    fn unknown_format_fails_loudly() {
        let err = render_named(&december(), &christmas(), true, "rtf").expect_err("bad format");
        assert!(matches!(err, CalendarError::UnsupportedFormat(_)));
    }

    #[test]
    fn oversized_range_is_rejected_before_rendering() {
        let range = ProjectRange {
            start_date: date(2024, 1, 1),
            end_date: date(2025, 5, 31),
        };
        let err = render(
            &range,
            &FlagSet::new(),
            RenderOptions {
                dim_weekends: false,
                format: OutputFormat::Text,
            },
        )
        .expect_err("too large");
        assert!(matches!(err, CalendarError::RangeTooLarge { .. }));
    }

    #[test]
    fn months_are_classified_per_day() {
        let months = calendar_months(&december(), &christmas(), true);
        assert_eq!(months.len(), 1);
        let month = &months[0];
        assert_eq!(month.title(), "2024 December");

        let christmas_cell = month
            .weeks
            .iter()
            .flatten()
            .find(|day| day.cell.date == Some(date(2024, 12, 25)))
            .expect("christmas present");
        assert_eq!(christmas_cell.style.category, DayCategory::Flagged);
        assert_eq!(
            christmas_cell.cell.matched_flag.as_ref().map(|f| f.name()),
            Some("Christmas")
        );

        let first = &month.weeks[0][0];
        assert_eq!(first.cell.date, Some(date(2024, 12, 1)));
        assert_eq!(first.style.category, DayCategory::OutOfRange);

        let saturday = month
            .weeks
            .iter()
            .flatten()
            .find(|day| day.cell.date == Some(date(2024, 12, 21)))
            .expect("saturday present");
        assert_eq!(saturday.style.category, DayCategory::DimmedWeekend);
    }

    #[test]
    fn multi_month_output_is_chronological() {
        let range = ProjectRange::new(date(2024, 11, 20), date(2025, 1, 10)).expect("valid range");
        let out = render_named(&range, &FlagSet::new(), false, "text").expect("render");
        let nov = out.find("2024 November").expect("november");
        let dec = out.find("2024 December").expect("december");
        let jan = out.find("2025 January").expect("january");
        assert!(nov < dec && dec < jan);
    }

    #[test]
    fn compacts_markup_whitespace() {
        let compact = compact_markup("  <div>\n   <span>a   b</span>\n</div>  ").expect("compact");
        assert_eq!(compact, "<div><span>a b</span></div>");
    }

    #[test]
    fn repeated_renders_are_identical() {
        let options = RenderOptions {
            dim_weekends: true,
            format: OutputFormat::Word,
        };
        let first = render(&december(), &christmas(), options).expect("render");
        let second = render(&december(), &christmas(), options).expect("render");
        assert_eq!(first, second);
    }
}
