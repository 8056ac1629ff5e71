pub mod classify;
pub mod cli;
pub mod commands;
pub mod config;
pub mod datetime;
pub mod error;
pub mod flags;
pub mod grid;
pub mod holidays;
pub mod interval;
pub mod printer;
pub mod range;
pub mod render;
pub mod store;

use std::ffi::OsString;

use anyhow::Context;
use clap::Parser;
use tracing::{
  debug,
  info
};

pub use crate::classify::{
  DayCategory,
  DayCell,
  DayStyle,
  classify
};
pub use crate::error::{
  CalendarError,
  CalendarResult
};
pub use crate::flags::FlagSet;
pub use crate::grid::{
  MonthGrid,
  build_month_grid
};
pub use crate::interval::{
  DateInterval,
  FlagRecord
};
pub use crate::range::{
  ProjectRange,
  validate_range
};
pub use crate::render::{
  OutputFormat,
  RenderOptions,
  calendar_months,
  render
};

#[tracing::instrument(skip_all)]
pub fn run(
  raw_args: Vec<OsString>
) -> anyhow::Result<()> {
  let pre =
    cli::preprocess_args(&raw_args)?;
  let cli = cli::GlobalCli::parse_from(
    pre.cleaned_args
  );

  cli::init_tracing(
    cli.verbose,
    cli.quiet
  )?;

  info!(
    verbose = cli.verbose,
    quiet = cli.quiet,
    "starting flagcal"
  );
  debug!(?pre.rc_overrides, "preprocessed rc overrides");

  let mut cfg = config::Config::load(
    cli.calrc.as_deref()
  )?;
  cfg.apply_overrides(
    pre.rc_overrides.into_iter().chain(
      cli
        .rc_overrides
        .into_iter()
        .map(|kv| (kv.key, kv.value))
    )
  );

  let zone = datetime::resolve_zone(
    cfg.get("timezone").as_deref()
  );
  debug!(zone = %zone.label(), "resolved calendar zone");

  let data_dir =
    config::resolve_data_dir(
      &cfg,
      cli.data.as_deref()
    )
    .context(
      "failed to resolve data \
       directory"
    )?;

  let store = store::FlagStore::open(
    &data_dir
  )
  .with_context(|| {
    format!(
      "failed to open flag store at {}",
      data_dir.display()
    )
  })?;

  let printer =
    printer::Printer::new(&cfg)?;
  let inv = cli::Invocation::parse(
    &cfg, cli.rest
  )?;

  commands::dispatch(
    &store, &cfg, &printer, &zone, inv
  )?;

  info!("done");
  Ok(())
}
