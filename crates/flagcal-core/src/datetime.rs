use std::fs;
use std::path::{
  Path,
  PathBuf
};

use anyhow::{
  Context,
  anyhow
};
use chrono::{
  DateTime,
  Datelike,
  FixedOffset,
  Local,
  Months,
  NaiveDate,
  NaiveDateTime,
  TimeDelta,
  Utc,
  Weekday
};
use chrono_tz::Tz;
use regex::Regex;
use serde::Deserialize;

const TIMEZONE_CONFIG_FILE: &str =
  "flagcal-time.toml";
const TIMEZONE_ENV_VAR: &str =
  "FLAGCAL_TIMEZONE";
const TIMEZONE_CONFIG_ENV_VAR: &str =
  "FLAGCAL_TIME_CONFIG";

#[derive(Debug, Deserialize)]
struct TimezoneConfig {
  timezone: Option<String>,
  time:     Option<TimezoneSection>
}

#[derive(Debug, Deserialize)]
struct TimezoneSection {
  timezone: Option<String>
}

/// Reference frame in which instants are
/// turned into calendar days.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CalendarZone {
  System,
  Named(Tz)
}

impl CalendarZone {
  #[must_use]
  pub fn today(&self) -> NaiveDate {
    self.date_of(Utc::now().fixed_offset())
  }

  /// Local calendar day of `instant` in
  /// this zone.
  #[must_use]
  pub fn date_of(
    &self,
    instant: DateTime<FixedOffset>
  ) -> NaiveDate {
    match self {
      | CalendarZone::System => {
        instant
          .with_timezone(&Local)
          .date_naive()
      }
      | CalendarZone::Named(tz) => {
        instant
          .with_timezone(tz)
          .date_naive()
      }
    }
  }

  #[must_use]
  pub fn label(&self) -> String {
    match self {
      | CalendarZone::System => {
        "system".to_string()
      }
      | CalendarZone::Named(tz) => {
        tz.name().to_string()
      }
    }
  }
}

/// Resolve the zone from the environment,
/// then the rc value, then the TOML time
/// config, falling back to the system
/// zone.
pub fn resolve_zone(
  rc_timezone: Option<&str>
) -> CalendarZone {
  if let Ok(raw) =
    std::env::var(TIMEZONE_ENV_VAR)
    && let Some(tz) =
      parse_timezone(&raw, TIMEZONE_ENV_VAR)
  {
    return CalendarZone::Named(tz);
  }

  if let Some(raw) = rc_timezone
    && let Some(tz) =
      parse_timezone(raw, "rc.timezone")
  {
    return CalendarZone::Named(tz);
  }

  if let Some(path) =
    timezone_config_path()
    && let Some(tz) =
      load_timezone_from_file(&path)
  {
    return CalendarZone::Named(tz);
  }

  tracing::debug!(
    "no timezone configured; using \
     system local zone"
  );
  CalendarZone::System
}

fn timezone_config_path()
-> Option<PathBuf> {
  if let Ok(raw) = std::env::var(
    TIMEZONE_CONFIG_ENV_VAR
  ) {
    let trimmed = raw.trim();
    if !trimmed.is_empty() {
      return Some(PathBuf::from(
        trimmed
      ));
    }
  }

  std::env::current_dir().ok().map(
    |dir| {
      dir.join(TIMEZONE_CONFIG_FILE)
    }
  )
}

fn load_timezone_from_file(
  path: &Path
) -> Option<Tz> {
  if !path.exists() {
    tracing::debug!(
      file = %path.display(),
      "timezone config file not found"
    );
    return None;
  }

  let raw = match fs::read_to_string(
    path
  ) {
    | Ok(raw) => raw,
    | Err(err) => {
      tracing::error!(
        file = %path.display(),
        error = %err,
        "failed reading timezone config file"
      );
      return None;
    }
  };

  let timezone =
    match timezone_from_toml(&raw) {
      | Ok(timezone) => timezone,
      | Err(err) => {
        tracing::error!(
          file = %path.display(),
          error = %err,
          "failed parsing timezone config file"
        );
        return None;
      }
    };

  let Some(timezone) = timezone else {
    tracing::warn!(
      file = %path.display(),
      "timezone config had no timezone field"
    );
    return None;
  };

  parse_timezone(
    timezone.as_str(),
    &format!("file:{}", path.display())
  )
}

fn timezone_from_toml(
  raw: &str
) -> anyhow::Result<Option<String>> {
  let parsed =
    toml::from_str::<TimezoneConfig>(
      raw
    )?;
  Ok(parsed.timezone.or_else(|| {
    parsed
      .time
      .and_then(|section| section.timezone)
  }))
}

fn parse_timezone(
  raw: &str,
  source: &str
) -> Option<Tz> {
  let trimmed = raw.trim();
  if trimmed.is_empty() {
    tracing::warn!(
      source,
      "timezone source was empty"
    );
    return None;
  }

  match trimmed.parse::<Tz>() {
    | Ok(tz) => {
      tracing::info!(
        source,
        timezone = %trimmed,
        "configured calendar timezone"
      );
      Some(tz)
    }
    | Err(err) => {
      tracing::error!(
        source,
        timezone = %trimmed,
        error = %err,
        "failed to parse timezone id"
      );
      None
    }
  }
}

/// Resolve a date expression to a
/// calendar day. Instants are converted
/// into `zone` before the day is taken;
/// wall-clock times are dropped.
#[tracing::instrument(skip(zone, today), fields(input = input))]
pub fn parse_calendar_date(
  input: &str,
  zone: &CalendarZone,
  today: NaiveDate
) -> anyhow::Result<NaiveDate> {
  let token = input.trim();
  if token.is_empty() {
    return Err(anyhow!(
      "date expression is empty"
    ));
  }
  let lower =
    token.to_ascii_lowercase();

  match lower.as_str() {
    | "today" => return Ok(today),
    | "tomorrow" => {
      return add_days(today, 1)
        .ok_or_else(|| out_of_range(token));
    }
    | "yesterday" => {
      return add_days(today, -1)
        .ok_or_else(|| out_of_range(token));
    }
    | "som" => {
      return Ok(start_of_month(today));
    }
    | "eom" => {
      return Ok(end_of_month(today));
    }
    | "soy" => {
      return today
        .with_ordinal(1)
        .ok_or_else(|| out_of_range(token));
    }
    | "eoy" => {
      return NaiveDate::from_ymd_opt(
        today.year(),
        12,
        31
      )
      .ok_or_else(|| out_of_range(token));
    }
    | _ => {}
  }

  let rel_re = Regex::new(r"^(?P<sign>[+-])(?P<num>\d+)(?P<unit>[dwm])$")
        .map_err(|e| anyhow!("internal regex compile failure: {e}"))?;

  if let Some(caps) =
    rel_re.captures(&lower)
  {
    let sign = caps
      .name("sign")
      .map(|m| m.as_str())
      .ok_or_else(|| {
        anyhow!("missing relative sign")
      })?;
    let num: i64 = caps
      .name("num")
      .map(|m| m.as_str())
      .ok_or_else(|| {
        anyhow!(
          "missing relative amount"
        )
      })?
      .parse()
      .context(
        "invalid relative number"
      )?;
    let num =
      if sign == "-" { -num } else { num };
    let unit = caps
      .name("unit")
      .map(|m| m.as_str())
      .ok_or_else(|| {
        anyhow!("missing relative unit")
      })?;

    let shifted = match unit {
      | "d" => add_days(today, num),
      | "w" => {
        num
          .checked_mul(7)
          .and_then(|days| {
            add_days(today, days)
          })
      }
      | "m" => {
        let months = i32::try_from(num)
          .context(
            "relative month offset out \
             of range"
          )?;
        add_months(today, months)
      }
      | _ => {
        return Err(anyhow!(
          "unknown relative unit: \
           {unit}"
        ));
      }
    };
    return shifted
      .ok_or_else(|| out_of_range(token));
  }

  if let Ok(date) =
    NaiveDate::parse_from_str(
      token, "%Y-%m-%d"
    )
  {
    return Ok(date);
  }

  if let Ok(dt) =
    DateTime::parse_from_rfc3339(token)
  {
    return Ok(zone.date_of(dt));
  }

  if let Ok(ndt) =
    NaiveDateTime::parse_from_str(
      token,
      "%Y%m%dT%H%M%SZ"
    )
  {
    let instant = DateTime::<Utc>::from_naive_utc_and_offset(ndt, Utc);
    return Ok(
      zone.date_of(instant.fixed_offset())
    );
  }

  for fmt in [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M"
  ] {
    if let Ok(ndt) =
      NaiveDateTime::parse_from_str(
        token, fmt
      )
    {
      return Ok(ndt.date());
    }
  }

  Err(anyhow!(
    "unrecognized date expression: \
     {input}"
  ))
  .with_context(|| {
    "supported formats: \
     today/tomorrow/yesterday, \
     som/eom/soy/eoy, +Nd/+Nw/+Nm, \
     YYYY-MM-DD, YYYY-MM-DDTHH:MM[:SS], \
     YYYY-MM-DD HH:MM, RFC3339, \
     YYYYMMDDTHHMMSSZ"
  })
}

fn out_of_range(
  token: &str
) -> anyhow::Error {
  anyhow!(
    "date expression {token} falls \
     outside the supported calendar"
  )
}

/// `None` when `year`/`month` does not
/// name a representable month.
#[must_use]
pub fn first_day_of_month(
  year: i32,
  month: u32
) -> Option<NaiveDate> {
  NaiveDate::from_ymd_opt(
    year, month, 1
  )
}

#[must_use]
pub fn last_day_of_month(
  year: i32,
  month: u32
) -> Option<NaiveDate> {
  (28..=31).rev().find_map(|day| {
    NaiveDate::from_ymd_opt(
      year, month, day
    )
  })
}

#[must_use]
pub fn days_in_month(
  year: i32,
  month: u32
) -> Option<u32> {
  last_day_of_month(year, month)
    .map(|last| last.day())
}

#[must_use]
pub fn start_of_month(
  date: NaiveDate
) -> NaiveDate {
  date.with_day(1).unwrap_or(date)
}

#[must_use]
pub fn end_of_month(
  date: NaiveDate
) -> NaiveDate {
  last_day_of_month(
    date.year(),
    date.month()
  )
  .unwrap_or(date)
}

/// `None` when the result leaves
/// chrono's date range.
#[must_use]
pub fn add_days(
  date: NaiveDate,
  days: i64
) -> Option<NaiveDate> {
  TimeDelta::try_days(days).and_then(
    |delta| {
      date.checked_add_signed(delta)
    }
  )
}

/// Shift by whole months, clamping the
/// day to the length of the target month.
#[must_use]
pub fn add_months(
  date: NaiveDate,
  months: i32
) -> Option<NaiveDate> {
  let step =
    Months::new(months.unsigned_abs());
  if months >= 0 {
    date.checked_add_months(step)
  } else {
    date.checked_sub_months(step)
  }
}

/// Whole-month distance between the
/// months containing `start` and `end`.
#[must_use]
pub fn months_between(
  start: NaiveDate,
  end: NaiveDate
) -> i32 {
  (end.year() - start.year()) * 12
    + (end.month() as i32
      - start.month() as i32)
}

#[must_use]
pub fn is_weekend(
  date: NaiveDate
) -> bool {
  matches!(
    date.weekday(),
    Weekday::Sat | Weekday::Sun
  )
}
