use chrono::NaiveDate;
use tracing::{debug, info, instrument, warn};

use crate::datetime::{CalendarZone, parse_calendar_date};
use crate::error::{CalendarError, CalendarResult};
use crate::interval::{DateInterval, FlagRecord};

#[derive(Debug, Clone)]
struct Flag {
    record: FlagRecord,
    interval: CalendarResult<DateInterval>,
}

impl Flag {
    fn contains(&self, date: NaiveDate) -> bool {
        match &self.interval {
            Ok(interval) => interval.contains(date),
            Err(err) => {
                warn!(flag = %self.record.name, error = %err, "skipping flag with unreadable date");
                false
            }
        }
    }
}

/// An ordered collection of flags.
///
/// Stored order is insertion order and decides overlaps: when two flags
/// cover the same day, the one added first is the match. Display order is
/// by start date.
#[derive(Debug, Clone, Default)]
pub struct FlagSet {
    flags: Vec<Flag>,
}

/// One row of the sorted flag listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlagListing {
    pub name: String,
    pub dates: String,
    pub start_date: String,
    pub end_date: String,
    pub valid: bool,
}

impl FlagSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads records leniently: an entry whose dates cannot be read is kept
    /// and reported each time it is consulted.
    pub fn from_records<I>(records: I, zone: &CalendarZone, today: NaiveDate) -> Self
    where
        I: IntoIterator<Item = FlagRecord>,
    {
        let flags = records
            .into_iter()
            .map(|record| {
                let interval = record.interval(zone, today);
                Flag { record, interval }
            })
            .collect();
        Self { flags }
    }

    pub fn from_intervals<I>(intervals: I) -> Self
    where
        I: IntoIterator<Item = DateInterval>,
    {
        let flags = intervals
            .into_iter()
            .map(|interval| Flag {
                record: interval.to_record(),
                interval: Ok(interval),
            })
            .collect();
        Self { flags }
    }

    pub fn len(&self) -> usize {
        self.flags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }

    /// Records in stored order.
    pub fn records(&self) -> Vec<FlagRecord> {
        self.flags.iter().map(|flag| flag.record.clone()).collect()
    }

    pub fn is_flagged(&self, date: NaiveDate) -> bool {
        self.flags.iter().any(|flag| flag.contains(date))
    }

    /// First flag in stored order that covers `date`.
    pub fn matching_flag(&self, date: NaiveDate) -> Option<&DateInterval> {
        self.flags
            .iter()
            .find(|flag| flag.contains(date))
            .and_then(|flag| flag.interval.as_ref().ok())
    }

    /// Validates and appends a flag. The end date defaults to the start
    /// date; a reversed pair is rejected rather than swapped.
    #[instrument(skip(self, zone, today))]
    pub fn add(
        &mut self,
        name: &str,
        start: &str,
        end: Option<&str>,
        zone: &CalendarZone,
        today: NaiveDate,
    ) -> CalendarResult<DateInterval> {
        if name.trim().is_empty() {
            return Err(CalendarError::InvalidInterval(
                "flag name cannot be empty".to_string(),
            ));
        }
        if start.trim().is_empty() {
            return Err(CalendarError::InvalidInterval(
                "flag start date is required".to_string(),
            ));
        }

        let start_date = parse_input_date(start, zone, today)?;
        let end_date = match end.map(str::trim).filter(|raw| !raw.is_empty()) {
            Some(raw) => Some(parse_input_date(raw, zone, today)?),
            None => None,
        };

        let interval = DateInterval::new(name, start_date, end_date)?;
        self.push(interval.clone());
        info!(
            name = %interval.name(),
            start = %interval.start_date(),
            end = %interval.end_date(),
            "flag added"
        );
        Ok(interval)
    }

    pub fn push(&mut self, interval: DateInterval) {
        self.flags.push(Flag {
            record: interval.to_record(),
            interval: Ok(interval),
        });
    }

    /// Removes every flag stored with this start/end pair and returns how
    /// many went. Flags sharing a pair cannot be told apart here.
    #[instrument(skip(self, zone, today))]
    pub fn remove(&mut self, start: &str, end: &str, zone: &CalendarZone, today: NaiveDate) -> usize {
        let wanted = match (
            parse_calendar_date(start, zone, today),
            parse_calendar_date(end, zone, today),
        ) {
            (Ok(start), Ok(end)) => Some((start, end)),
            _ => None,
        };

        let before = self.flags.len();
        self.flags.retain(|flag| {
            let raw_match =
                flag.record.start_date == start.trim() && flag.record.end_or_start() == end.trim();
            let date_match = match (&flag.interval, wanted) {
                (Ok(interval), Some((start, end))) => {
                    interval.start_date() == start && interval.end_date() == end
                }
                _ => false,
            };
            !(raw_match || date_match)
        });

        let removed = before - self.flags.len();
        debug!(removed, remaining = self.flags.len(), "flags removed");
        removed
    }

    /// Flags sorted by start date; unreadable entries sort last.
    pub fn sorted_listing(&self) -> Vec<FlagListing> {
        let mut flags: Vec<&Flag> = self.flags.iter().collect();
        flags.sort_by_key(|flag| match &flag.interval {
            Ok(interval) => (false, interval.start_date()),
            Err(_) => (true, NaiveDate::MAX),
        });

        flags
            .into_iter()
            .map(|flag| match &flag.interval {
                Ok(interval) => FlagListing {
                    name: interval.name().to_string(),
                    dates: interval.display_dates(),
                    start_date: interval.start_date().format("%Y-%m-%d").to_string(),
                    end_date: interval.end_date().format("%Y-%m-%d").to_string(),
                    valid: true,
                },
                Err(_) => FlagListing {
                    name: flag.record.name.clone(),
                    dates: "Invalid date".to_string(),
                    start_date: flag.record.start_date.clone(),
                    end_date: flag.record.end_or_start().to_string(),
                    valid: false,
                },
            })
            .collect()
    }
}

fn parse_input_date(raw: &str, zone: &CalendarZone, today: NaiveDate) -> CalendarResult<NaiveDate> {
    parse_calendar_date(raw, zone, today)
        .map_err(|err| CalendarError::InvalidInterval(format!("unreadable date '{raw}': {err:#}")))
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::FlagSet;
    use crate::datetime::CalendarZone;
    use crate::error::CalendarError;
    use crate::interval::{DateInterval, FlagRecord};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    fn utc() -> CalendarZone {
        CalendarZone::Named(chrono_tz::UTC)
    }

    fn flag(name: &str, start: NaiveDate, end: NaiveDate) -> DateInterval {
        DateInterval::new(name, start, Some(end)).expect("valid interval")
    }

    #[test]
    fn empty_set_flags_nothing() {
        let set = FlagSet::new();
        assert!(!set.is_flagged(date(2024, 12, 25)));
        assert!(set.matching_flag(date(2024, 12, 25)).is_none());
    }

    #[test]
    fn matching_flag_prefers_first_added() {
        let set = FlagSet::from_intervals([
            flag("Break", date(2024, 12, 20), date(2024, 12, 31)),
            flag("Christmas", date(2024, 12, 25), date(2024, 12, 25)),
        ]);
        let matched = set.matching_flag(date(2024, 12, 25)).expect("flagged");
        assert_eq!(matched.name(), "Break");

        let reversed = FlagSet::from_intervals([
            flag("Christmas", date(2024, 12, 25), date(2024, 12, 25)),
            flag("Break", date(2024, 12, 20), date(2024, 12, 31)),
        ]);
        let matched = reversed.matching_flag(date(2024, 12, 25)).expect("flagged");
        assert_eq!(matched.name(), "Christmas");
        assert_eq!(
            reversed.matching_flag(date(2024, 12, 21)).map(|f| f.name()),
            Some("Break")
        );
    }

    #[test]
    fn add_defaults_end_and_rejects_bad_input() {
        let mut set = FlagSet::new();
        let today = date(2024, 1, 1);

        let added = set
            .add("Christmas", "2024-12-25", None, &utc(), today)
            .expect("add flag");
        assert_eq!(added.end_date(), date(2024, 12, 25));

        let err = set
            .add("", "2024-12-25", None, &utc(), today)
            .expect_err("empty name");
        assert!(matches!(err, CalendarError::InvalidInterval(_)));

        let err = set.add("Trip", "", None, &utc(), today).expect_err("no start");
        assert!(matches!(err, CalendarError::InvalidInterval(_)));

        let err = set
            .add("Trip", "2024-06-10", Some("2024-06-01"), &utc(), today)
            .expect_err("reversed");
        assert!(matches!(err, CalendarError::InvalidInterval(_)));

        let err = set
            .add("Trip", "someday", None, &utc(), today)
            .expect_err("unreadable");
        assert!(matches!(err, CalendarError::InvalidInterval(_)));

        assert_eq!(set.len(), 1);
    }

    #[test]
    fn remove_drops_every_flag_with_the_pair() {
        let today = date(2024, 1, 1);
        let mut set = FlagSet::from_intervals([
            flag("New Year", date(2024, 1, 1), date(2024, 1, 1)),
            flag("Also New Year", date(2024, 1, 1), date(2024, 1, 1)),
            flag("Holiday week", date(2024, 1, 1), date(2024, 1, 5)),
        ]);

        let removed = set.remove("2024-01-01", "2024-01-01", &utc(), today);
        assert_eq!(removed, 2);
        assert_eq!(set.len(), 1);
        assert_eq!(set.records()[0].name, "Holiday week");
        assert!(set.is_flagged(date(2024, 1, 3)));
    }

    #[test]
    fn malformed_flag_is_skipped_not_fatal() {
        let today = date(2024, 1, 1);
        let set = FlagSet::from_records(
            [
                FlagRecord {
                    name: "Broken".to_string(),
                    start_date: "garbage".to_string(),
                    end_date: None,
                },
                FlagRecord {
                    name: "Christmas".to_string(),
                    start_date: "2024-12-25".to_string(),
                    end_date: Some("2024-12-25".to_string()),
                },
            ],
            &utc(),
            today,
        );

        assert_eq!(set.len(), 2);
        assert!(set.is_flagged(date(2024, 12, 25)));
        assert_eq!(
            set.matching_flag(date(2024, 12, 25)).map(|f| f.name()),
            Some("Christmas")
        );
        assert!(!set.is_flagged(date(2024, 12, 24)));
    }

    #[test]
    fn malformed_flag_can_still_be_removed_by_raw_pair() {
        let today = date(2024, 1, 1);
        let mut set = FlagSet::from_records(
            [FlagRecord {
                name: "Broken".to_string(),
                start_date: "garbage".to_string(),
                end_date: None,
            }],
            &utc(),
            today,
        );
        assert_eq!(set.remove("garbage", "garbage", &utc(), today), 1);
        assert!(set.is_empty());
    }

    #[test]
    fn listing_sorts_by_start_date() {
        let today = date(2024, 1, 1);
        let set = FlagSet::from_records(
            [
                FlagRecord {
                    name: "Broken".to_string(),
                    start_date: "nope".to_string(),
                    end_date: None,
                },
                FlagRecord {
                    name: "Christmas".to_string(),
                    start_date: "2024-12-25".to_string(),
                    end_date: None,
                },
                FlagRecord {
                    name: "Break".to_string(),
                    start_date: "2024-07-01".to_string(),
                    end_date: Some("2024-07-05".to_string()),
                },
            ],
            &utc(),
            today,
        );

        let listing = set.sorted_listing();
        let names: Vec<&str> = listing.iter().map(|row| row.name.as_str()).collect();
        assert_eq!(names, vec!["Break", "Christmas", "Broken"]);
        assert_eq!(listing[0].dates, "Jul 1, 2024 - Jul 5, 2024");
        assert_eq!(listing[1].dates, "Dec 25, 2024");
        assert_eq!(listing[2].dates, "Invalid date");
        assert!(!listing[2].valid);
    }
}
