use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, anyhow};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::holidays::us_federal_holidays;
use crate::interval::FlagRecord;
use crate::render::OutputFormat;

/// Settings of the most recent successful render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LastState {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub dim_weekends: bool,
    pub format: OutputFormat,
}

/// The flag document and last-used state in a data directory.
#[derive(Debug)]
pub struct FlagStore {
    pub data_dir: PathBuf,
    pub flags_path: PathBuf,
    pub state_path: PathBuf,
}

impl FlagStore {
    #[tracing::instrument(skip(data_dir))]
    pub fn open(data_dir: &Path) -> anyhow::Result<Self> {
        let data_dir = data_dir.to_path_buf();
        fs::create_dir_all(&data_dir)
            .with_context(|| format!("failed to create {}", data_dir.display()))?;

        let flags_path = data_dir.join("flags.json");
        let state_path = data_dir.join("state.json");

        info!(
            data_dir = %data_dir.display(),
            flags = %flags_path.display(),
            state = %state_path.display(),
            "opened flag store"
        );

        Ok(Self {
            data_dir,
            flags_path,
            state_path,
        })
    }

    pub fn has_flags_file(&self) -> bool {
        self.flags_path.exists()
    }

    /// Records in stored order. A missing document is an empty list.
    #[tracing::instrument(skip(self))]
    pub fn load_flags(&self) -> anyhow::Result<Vec<FlagRecord>> {
        if !self.flags_path.exists() {
            debug!("no flag document yet");
            return Ok(vec![]);
        }

        let raw = fs::read_to_string(&self.flags_path)
            .with_context(|| format!("failed reading {}", self.flags_path.display()))?;
        if raw.trim().is_empty() {
            return Ok(vec![]);
        }

        let records: Vec<FlagRecord> = serde_json::from_str(&raw)
            .with_context(|| format!("failed parsing {}", self.flags_path.display()))?;
        debug!(count = records.len(), "loaded flag records");
        Ok(records)
    }

    #[tracing::instrument(skip(self, records))]
    pub fn save_flags(&self, records: &[FlagRecord]) -> anyhow::Result<()> {
        let payload = serde_json::to_string_pretty(records)?;
        write_atomic(&self.flags_path, &payload).context("failed to save flags.json")?;
        debug!(count = records.len(), "saved flag records");
        Ok(())
    }

    /// Writes the default holidays for `year` when no flag document exists.
    /// Returns whether anything was written.
    #[tracing::instrument(skip(self))]
    pub fn seed_if_missing(&self, year: i32) -> anyhow::Result<bool> {
        if self.has_flags_file() {
            return Ok(false);
        }
        self.reset_to_defaults(year)?;
        info!(year, "seeded default flags on first run");
        Ok(true)
    }

    /// Replaces the flag document with the holidays of `year`. A year with
    /// no holidays leaves the document untouched.
    #[tracing::instrument(skip(self))]
    pub fn reset_to_defaults(&self, year: i32) -> anyhow::Result<Vec<FlagRecord>> {
        let records: Vec<FlagRecord> = us_federal_holidays(year)
            .iter()
            .map(|holiday| holiday.to_record())
            .collect();
        if records.is_empty() {
            return Err(anyhow!("year {year} is outside the supported calendar"));
        }
        self.save_flags(&records)?;
        Ok(records)
    }

    #[tracing::instrument(skip(self))]
    pub fn load_last_state(&self) -> anyhow::Result<Option<LastState>> {
        if !self.state_path.exists() {
            return Ok(None);
        }
        let raw = fs::read_to_string(&self.state_path)
            .with_context(|| format!("failed reading {}", self.state_path.display()))?;
        if raw.trim().is_empty() {
            return Ok(None);
        }
        let state = serde_json::from_str(&raw)
            .with_context(|| format!("failed parsing {}", self.state_path.display()))?;
        Ok(Some(state))
    }

    #[tracing::instrument(skip(self))]
    pub fn save_last_state(&self, state: &LastState) -> anyhow::Result<()> {
        let payload = serde_json::to_string_pretty(state)?;
        write_atomic(&self.state_path, &payload).context("failed to save state.json")
    }
}

#[tracing::instrument(skip(path, payload))]
fn write_atomic(path: &Path, payload: &str) -> anyhow::Result<()> {
    debug!(file = %path.display(), bytes = payload.len(), "writing atomically");

    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut temp = NamedTempFile::new_in(dir)?;
    temp.write_all(payload.as_bytes())?;
    writeln!(temp)?;
    temp.flush()?;

    temp.persist(path)
        .map_err(|err| anyhow!("failed to persist {}: {}", path.display(), err))?;

    Ok(())
}
