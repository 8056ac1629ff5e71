use anyhow::{Context, anyhow};
use chrono::{Datelike, NaiveDate};
use tracing::{debug, info, instrument, warn};

use crate::cli::Invocation;
use crate::config::{Config, parse_bool};
use crate::datetime::{CalendarZone, end_of_month, months_between, parse_calendar_date};
use crate::flags::FlagSet;
use crate::printer::Printer;
use crate::range::{ProjectRange, validate_range};
use crate::render::{OutputFormat, RenderOptions, compact_markup, render};
use crate::store::{FlagStore, LastState};

pub fn known_command_names() -> Vec<&'static str> {
    vec![
        "render", "add", "delete", "flags", "check", "reset", "formats", "_show", "help",
        "version",
    ]
}

pub fn expand_command_abbrev<'a>(token: &str, known: &[&'a str]) -> Option<&'a str> {
    if let Some(exact) = known.iter().copied().find(|name| *name == token) {
        return Some(exact);
    }
    if token.is_empty() {
        return None;
    }

    let mut matches = known.iter().copied().filter(|name| name.starts_with(token));
    let first = matches.next()?;
    if matches.next().is_some() {
        None
    } else {
        Some(first)
    }
}

#[instrument(skip(store, cfg, printer, zone, inv))]
pub fn dispatch(
    store: &FlagStore,
    cfg: &Config,
    printer: &Printer,
    zone: &CalendarZone,
    inv: Invocation,
) -> anyhow::Result<()> {
    let today = zone.today();
    let command = inv.command.as_str();

    debug!(
        command,
        args = ?inv.command_args,
        zone = %zone.label(),
        %today,
        "dispatching command"
    );

    match command {
        "render" => cmd_render(store, cfg, zone, today, &inv.command_args),
        "add" => cmd_add(store, cfg, zone, today, &inv.command_args),
        "delete" => cmd_delete(store, cfg, zone, today, &inv.command_args),
        "flags" => cmd_flags(store, cfg, printer, zone, today),
        "check" => cmd_check(zone, today, &inv.command_args),
        "reset" => cmd_reset(store, today, &inv.command_args),
        "formats" => cmd_formats(cfg, printer),
        "_show" => cmd_show(cfg, store, zone),
        "help" => cmd_help(),
        "version" => {
            println!("{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        other => Err(anyhow!("unknown command: {other}")),
    }
}

/// Loads the flag document into a set, seeding the default holidays first
/// when the document does not exist and `flags.seed` is on.
#[instrument(skip(store, cfg, zone))]
fn load_flag_set(
    store: &FlagStore,
    cfg: &Config,
    zone: &CalendarZone,
    today: NaiveDate,
) -> anyhow::Result<FlagSet> {
    if cfg.get_bool("flags.seed").unwrap_or(true) && store.seed_if_missing(today.year())? {
        info!(year = today.year(), "created flag document with default holidays");
    }

    let records = store.load_flags()?;
    Ok(FlagSet::from_records(records, zone, today))
}

fn default_format(cfg: &Config) -> anyhow::Result<OutputFormat> {
    let name = cfg
        .get("default.format")
        .unwrap_or_else(|| "word".to_string());
    name.parse::<OutputFormat>()
        .context("invalid default.format setting")
}

fn parse_date_arg(
    raw: &str,
    what: &str,
    zone: &CalendarZone,
    today: NaiveDate,
) -> anyhow::Result<NaiveDate> {
    parse_calendar_date(raw, zone, today).with_context(|| format!("invalid {what} date '{raw}'"))
}

#[derive(Debug, Default)]
struct RenderArgs {
    dates: Vec<String>,
    format: Option<OutputFormat>,
    dim_weekends: Option<bool>,
    compact: bool,
}

fn parse_render_args(args: &[String]) -> anyhow::Result<RenderArgs> {
    let mut parsed = RenderArgs::default();

    for arg in args {
        if let Some(name) = arg.strip_prefix("format:") {
            parsed.format = Some(name.parse::<OutputFormat>()?);
        } else if let Some(value) = arg.strip_prefix("dim:") {
            parsed.dim_weekends = Some(parse_bool(value));
        } else if arg == "--compact" {
            parsed.compact = true;
        } else {
            parsed.dates.push(arg.clone());
        }
    }

    if parsed.dates.len() > 2 {
        return Err(anyhow!(
            "render takes at most a start and an end date, got {}",
            parsed.dates.len()
        ));
    }

    Ok(parsed)
}

#[instrument(skip(store, cfg, zone, args))]
fn cmd_render(
    store: &FlagStore,
    cfg: &Config,
    zone: &CalendarZone,
    today: NaiveDate,
    args: &[String],
) -> anyhow::Result<()> {
    info!("command render");

    let parsed = parse_render_args(args)?;

    let (start, end, saved) = match parsed.dates.as_slice() {
        [] => match store.load_last_state()? {
            Some(state) => {
                debug!(?state, "reusing last render state");
                (state.start_date, state.end_date, Some(state))
            }
            None => (today, end_of_month(today), None),
        },
        [start] => {
            let start = parse_date_arg(start, "start", zone, today)?;
            (start, end_of_month(start), None)
        }
        [start, end, ..] => (
            parse_date_arg(start, "start", zone, today)?,
            parse_date_arg(end, "end", zone, today)?,
            None,
        ),
    };

    let format = match (parsed.format, saved) {
        (Some(format), _) => format,
        (None, Some(state)) => state.format,
        (None, None) => default_format(cfg)?,
    };
    let dim_weekends = match (parsed.dim_weekends, saved) {
        (Some(dim), _) => dim,
        (None, Some(state)) => state.dim_weekends,
        (None, None) => cfg.get_bool("dim.weekends").unwrap_or(true),
    };

    let range = ProjectRange::new(start, end)?;
    let flags = load_flag_set(store, cfg, zone, today)?;
    let mut output = render(
        &range,
        &flags,
        RenderOptions {
            dim_weekends,
            format,
        },
    )?;

    if parsed.compact {
        if format.is_markup() {
            output = compact_markup(&output)?;
        } else {
            warn!(%format, "--compact only applies to markup formats; ignoring");
        }
    }

    if output.ends_with('\n') {
        print!("{output}");
    } else {
        println!("{output}");
    }

    store.save_last_state(&LastState {
        start_date: range.start_date,
        end_date: range.end_date,
        dim_weekends,
        format,
    })?;
    Ok(())
}

#[instrument(skip(store, cfg, zone, args))]
fn cmd_add(
    store: &FlagStore,
    cfg: &Config,
    zone: &CalendarZone,
    today: NaiveDate,
    args: &[String],
) -> anyhow::Result<()> {
    info!("command add");

    let (name, start, end) = match args {
        [name, start] => (name, start, None),
        [name, start, end] => (name, start, Some(end.as_str())),
        _ => return Err(anyhow!("usage: add NAME START [END]")),
    };

    let mut flags = load_flag_set(store, cfg, zone, today)?;
    let interval = flags.add(name, start, end, zone, today)?;
    store.save_flags(&flags.records())?;

    println!("Added flag '{}'.", interval.name());
    Ok(())
}

#[instrument(skip(store, cfg, zone, args))]
fn cmd_delete(
    store: &FlagStore,
    cfg: &Config,
    zone: &CalendarZone,
    today: NaiveDate,
    args: &[String],
) -> anyhow::Result<()> {
    info!("command delete");

    let (start, end) = match args {
        [start] => (start, start),
        [start, end] => (start, end),
        _ => return Err(anyhow!("usage: delete START [END]")),
    };

    let mut flags = load_flag_set(store, cfg, zone, today)?;
    let removed = flags.remove(start, end, zone, today);
    if removed > 0 {
        store.save_flags(&flags.records())?;
    }

    println!("Removed {removed} flag(s).");
    Ok(())
}

fn cmd_flags(
    store: &FlagStore,
    cfg: &Config,
    printer: &Printer,
    zone: &CalendarZone,
    today: NaiveDate,
) -> anyhow::Result<()> {
    let flags = load_flag_set(store, cfg, zone, today)?;
    if flags.is_empty() {
        println!("No flags.");
        return Ok(());
    }
    printer.print_flag_table(&flags.sorted_listing())
}

fn cmd_check(zone: &CalendarZone, today: NaiveDate, args: &[String]) -> anyhow::Result<()> {
    let [start, end] = args else {
        return Err(anyhow!("usage: check START END"));
    };
    let start = parse_date_arg(start, "start", zone, today)?;
    let end = parse_date_arg(end, "end", zone, today)?;

    validate_range(start, end)?;
    println!("ok: {} month(s)", months_between(start, end) + 1);
    Ok(())
}

#[instrument(skip(store, args))]
fn cmd_reset(store: &FlagStore, today: NaiveDate, args: &[String]) -> anyhow::Result<()> {
    info!("command reset");

    let year = match args {
        [] => today.year(),
        [year] => year
            .parse::<i32>()
            .with_context(|| format!("invalid year '{year}'"))?,
        _ => return Err(anyhow!("usage: reset [YEAR]")),
    };

    let records = store.reset_to_defaults(year)?;
    println!("Restored {} default flag(s) for {year}.", records.len());
    Ok(())
}

fn cmd_formats(cfg: &Config, printer: &Printer) -> anyhow::Result<()> {
    printer.print_formats(default_format(cfg)?)
}

fn cmd_show(cfg: &Config, store: &FlagStore, zone: &CalendarZone) -> anyhow::Result<()> {
    for (k, v) in cfg.iter() {
        println!("{k}={v}");
    }
    for file in &cfg.loaded_files {
        debug!(file = %file.display(), "rc file in effect");
    }
    println!("resolved.data={}", store.data_dir.display());
    println!("resolved.timezone={}", zone.label());
    Ok(())
}

fn cmd_help() -> anyhow::Result<()> {
    println!(
        "usage: flagcal [-v|-q] [--rc KEY=VALUE] [--calrc PATH] [--data DIR] [COMMAND] [ARGS...]

commands:
  render [START [END]] [format:F] [dim:on|off] [--compact]
  add NAME START [END]
  delete START [END]
  flags
  check START END
  reset [YEAR]
  formats
  _show
  help
  version

dates: YYYY-MM-DD, today, tomorrow, yesterday, som, eom, soy, eoy, +Nd, -Nw, +Nm"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{expand_command_abbrev, known_command_names, parse_render_args};
    use crate::render::OutputFormat;

    #[test]
    fn expands_unique_prefixes_only() {
        let known = known_command_names();
        assert_eq!(expand_command_abbrev("render", &known), Some("render"));
        assert_eq!(expand_command_abbrev("ren", &known), Some("render"));
        assert_eq!(expand_command_abbrev("a", &known), Some("add"));
        assert_eq!(expand_command_abbrev("fl", &known), Some("flags"));
        assert_eq!(expand_command_abbrev("f", &known), None);
        assert_eq!(expand_command_abbrev("2024-12-19", &known), None);
        assert_eq!(expand_command_abbrev("", &known), None);
    }

    #[test]
    fn splits_render_modifiers_from_dates() {
        let args: Vec<String> = ["2024-12-19", "format:md", "dim:off", "--compact", "eom"]
            .iter()
            .map(ToString::to_string)
            .collect();
        let parsed = parse_render_args(&args).expect("parse");
        assert_eq!(parsed.dates, vec!["2024-12-19".to_string(), "eom".to_string()]);
        assert_eq!(parsed.format, Some(OutputFormat::Markdown));
        assert_eq!(parsed.dim_weekends, Some(false));
        assert!(parsed.compact);
    }

    #[test]
    fn rejects_unknown_format_modifier() {
        let args = vec!["format:pdf".to_string()];
        assert!(parse_render_args(&args).is_err());
    }

    #[test]
    fn rejects_third_date() {
        let args: Vec<String> = ["today", "tomorrow", "eom"]
            .iter()
            .map(ToString::to_string)
            .collect();
        assert!(parse_render_args(&args).is_err());
    }
}
