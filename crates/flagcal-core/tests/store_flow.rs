use std::fs;

use chrono::NaiveDate;
use flagcal_core::datetime::CalendarZone;
use flagcal_core::store::{FlagStore, LastState};
use flagcal_core::{FlagRecord, FlagSet, OutputFormat, ProjectRange, RenderOptions, render};
use tempfile::tempdir;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

#[test]
fn flags_survive_save_and_reload() {
    let temp = tempdir().expect("tempdir");
    let store = FlagStore::open(temp.path()).expect("open store");
    let zone = CalendarZone::System;
    let today = date(2024, 12, 1);

    assert!(store.load_flags().expect("load empty").is_empty());

    let mut flags = FlagSet::new();
    flags
        .add("Sprint review", "2024-12-19", None, &zone, today)
        .expect("add sprint review");
    flags
        .add("Holiday break", "2024-12-23", Some("2024-12-27"), &zone, today)
        .expect("add holiday break");
    store.save_flags(&flags.records()).expect("save flags");

    let raw = fs::read_to_string(&store.flags_path).expect("read flags.json");
    assert!(raw.contains("\"startDate\": \"2024-12-23\""));
    assert!(raw.contains("\"endDate\": \"2024-12-27\""));

    let reloaded = FlagSet::from_records(store.load_flags().expect("load"), &zone, today);
    assert_eq!(reloaded.len(), 2);
    assert!(reloaded.is_flagged(date(2024, 12, 19)));
    assert!(reloaded.is_flagged(date(2024, 12, 27)));
    assert!(!reloaded.is_flagged(date(2024, 12, 28)));
}

#[test]
fn malformed_records_are_kept_and_listed_as_invalid() {
    let temp = tempdir().expect("tempdir");
    let store = FlagStore::open(temp.path()).expect("open store");
    fs::write(
        &store.flags_path,
        r#"[
  { "name": "Broken", "startDate": "not-a-date" },
  { "name": "Christmas", "startDate": "2024-12-25" }
]"#,
    )
    .expect("write flags.json");

    let zone = CalendarZone::System;
    let today = date(2024, 12, 1);
    let flags = FlagSet::from_records(store.load_flags().expect("load"), &zone, today);

    assert!(flags.is_flagged(date(2024, 12, 25)));
    assert!(!flags.is_flagged(date(2024, 12, 24)));

    let listing = flags.sorted_listing();
    assert_eq!(listing[0].name, "Christmas");
    assert_eq!(listing[1].dates, "Invalid date");
    assert!(!listing[1].valid);

    store.save_flags(&flags.records()).expect("save flags");
    let records = store.load_flags().expect("reload");
    assert_eq!(
        records[0],
        FlagRecord {
            name: "Broken".to_string(),
            start_date: "not-a-date".to_string(),
            end_date: None,
        }
    );
}

#[test]
fn first_run_seeds_holidays_once() {
    let temp = tempdir().expect("tempdir");
    let store = FlagStore::open(temp.path()).expect("open store");

    assert!(store.seed_if_missing(2024).expect("seed"));
    assert!(!store.seed_if_missing(2024).expect("second seed"));

    let records = store.load_flags().expect("load");
    assert_eq!(records.len(), 10);
    assert!(
        records
            .iter()
            .any(|r| r.name == "Thanksgiving Day" && r.start_date == "2024-11-28")
    );
}

#[test]
fn reset_replaces_user_flags() {
    let temp = tempdir().expect("tempdir");
    let store = FlagStore::open(temp.path()).expect("open store");
    let zone = CalendarZone::System;
    let today = date(2025, 3, 1);

    let mut flags = FlagSet::new();
    flags
        .add("Offsite", "2025-03-10", Some("2025-03-12"), &zone, today)
        .expect("add offsite");
    store.save_flags(&flags.records()).expect("save");

    let restored = store.reset_to_defaults(2025).expect("reset");
    assert_eq!(restored.len(), 10);

    let reloaded = FlagSet::from_records(store.load_flags().expect("load"), &zone, today);
    assert!(!reloaded.is_flagged(date(2025, 3, 11)));
    assert!(reloaded.is_flagged(date(2025, 12, 25)));
}

#[test]
fn delete_by_pair_removes_all_matches() {
    let zone = CalendarZone::System;
    let today = date(2024, 1, 1);

    let mut flags = FlagSet::new();
    flags
        .add("New Year", "2024-01-01", None, &zone, today)
        .expect("add new year");
    flags
        .add("Office closed", "2024-01-01", Some("2024-01-01"), &zone, today)
        .expect("add office closed");
    flags
        .add("Kickoff", "2024-01-02", None, &zone, today)
        .expect("add kickoff");

    assert_eq!(flags.remove("2024-01-01", "2024-01-01", &zone, today), 2);
    assert_eq!(flags.len(), 1);
    assert!(!flags.is_flagged(date(2024, 1, 1)));
    assert!(flags.is_flagged(date(2024, 1, 2)));
}

#[test]
fn last_state_round_trips() {
    let temp = tempdir().expect("tempdir");
    let store = FlagStore::open(temp.path()).expect("open store");
    assert_eq!(store.load_last_state().expect("load missing"), None);

    let state = LastState {
        start_date: date(2024, 12, 19),
        end_date: date(2024, 12, 31),
        dim_weekends: false,
        format: OutputFormat::Markdown,
    };
    store.save_last_state(&state).expect("save state");

    let raw = fs::read_to_string(&store.state_path).expect("read state.json");
    assert!(raw.contains("\"dimWeekends\": false"));
    assert!(raw.contains("\"format\": \"markdown\""));
    assert_eq!(store.load_last_state().expect("load"), Some(state));
}

#[test]
fn reset_rejects_years_beyond_the_calendar() {
    let temp = tempdir().expect("tempdir");
    let store = FlagStore::open(temp.path()).expect("open store");
    store.reset_to_defaults(2024).expect("reset 2024");

    assert!(store.reset_to_defaults(999_999).is_err());
    assert_eq!(store.load_flags().expect("load").len(), 10);
}

#[test]
fn unreachable_relative_date_does_not_break_rendering() {
    let temp = tempdir().expect("tempdir");
    let store = FlagStore::open(temp.path()).expect("open store");
    fs::write(
        &store.flags_path,
        r#"[
  { "name": "Far future", "startDate": "+99999999999999999d" },
  { "name": "Overflow", "startDate": "2024-12-01", "endDate": "+2147483647m" },
  { "name": "Christmas", "startDate": "2024-12-25" }
]"#,
    )
    .expect("write flags.json");

    let zone = CalendarZone::System;
    let today = date(2024, 12, 1);
    let flags = FlagSet::from_records(store.load_flags().expect("load"), &zone, today);
    assert_eq!(flags.len(), 3);
    assert_eq!(
        flags
            .sorted_listing()
            .iter()
            .filter(|row| !row.valid)
            .count(),
        2
    );

    let range = ProjectRange::new(date(2024, 12, 19), date(2024, 12, 31)).expect("valid range");
    let out = render(
        &range,
        &flags,
        RenderOptions {
            dim_weekends: true,
            format: OutputFormat::Html,
        },
    )
    .expect("render");
    assert!(out.contains(r#"style="color: #FFA500; padding: 4px;">25</td>"#));
    assert!(out.contains(r#"style="color: #E6E6E6; padding: 4px;">20</td>"#));
}
