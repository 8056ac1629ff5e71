use std::io::{self, IsTerminal, Write};

use anyhow::anyhow;
use unicode_width::UnicodeWidthStr;

use crate::config::Config;
use crate::flags::FlagListing;
use crate::render::OutputFormat;

/// Terminal output for the listing commands.
#[derive(Debug, Clone)]
pub struct Printer {
    color: bool,
}

impl Printer {
    pub fn new(cfg: &Config) -> anyhow::Result<Self> {
        let color_cfg = cfg.get("color").unwrap_or_else(|| "on".to_string());
        let color = match color_cfg.to_ascii_lowercase().as_str() {
            "on" | "yes" | "true" | "1" => true,
            "off" | "no" | "false" | "0" => false,
            other => return Err(anyhow!("invalid color setting: {other}")),
        };

        Ok(Self { color })
    }

    #[tracing::instrument(skip(self, flags))]
    pub fn print_flag_table(&self, flags: &[FlagListing]) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();
        self.write_flag_table(&mut out, flags)
    }

    pub fn write_flag_table<W: Write>(
        &self,
        writer: W,
        flags: &[FlagListing],
    ) -> anyhow::Result<()> {
        let headers = vec![
            "Name".to_string(),
            "Dates".to_string(),
            "Start".to_string(),
            "End".to_string(),
        ];

        let rows = flags
            .iter()
            .map(|flag| {
                let dates = if flag.valid {
                    self.paint(&flag.dates, "33")
                } else {
                    self.paint(&flag.dates, "31")
                };
                vec![
                    flag.name.clone(),
                    dates,
                    flag.start_date.clone(),
                    flag.end_date.clone(),
                ]
            })
            .collect();

        write_table(writer, headers, rows)
    }

    pub fn print_formats(&self, default: OutputFormat) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();
        let headers = vec!["Format".to_string(), "Description".to_string()];
        let rows = OutputFormat::ALL
            .iter()
            .map(|format| {
                let name = if *format == default {
                    self.paint(&format!("{format} (default)"), "32")
                } else {
                    format.to_string()
                };
                vec![name, format.description().to_string()]
            })
            .collect();
        write_table(&mut out, headers, rows)
    }

    fn paint(&self, text: &str, code: &str) -> String {
        if !self.color || !io::stdout().is_terminal() {
            return text.to_string();
        }
        format!("\x1b[{code}m{text}\x1b[0m")
    }
}

fn write_table<W: Write>(
    mut writer: W,
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
) -> anyhow::Result<()> {
    let column_count = headers.len();
    let mut widths = vec![0usize; column_count];

    for (idx, header) in headers.iter().enumerate() {
        widths[idx] = widths[idx].max(UnicodeWidthStr::width(header.as_str()));
    }

    for row in &rows {
        for (idx, cell) in row.iter().enumerate() {
            widths[idx] = widths[idx].max(UnicodeWidthStr::width(strip_ansi(cell).as_str()));
        }
    }

    for idx in 0..column_count {
        write!(writer, "{:width$} ", headers[idx], width = widths[idx])?;
    }
    writeln!(writer)?;

    for idx in 0..column_count {
        write!(writer, "{:-<width$} ", "", width = widths[idx])?;
    }
    writeln!(writer)?;

    for row in rows {
        for idx in 0..column_count {
            let cell = &row[idx];
            let visible_width = UnicodeWidthStr::width(strip_ansi(cell).as_str());
            let padding = widths[idx].saturating_sub(visible_width);
            write!(writer, "{}{} ", cell, " ".repeat(padding))?;
        }
        writeln!(writer)?;
    }

    Ok(())
}

fn strip_ansi(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut escaped = false;

    for ch in s.chars() {
        if escaped {
            if ch == 'm' {
                escaped = false;
            }
            continue;
        }

        if ch == '\x1b' {
            escaped = true;
            continue;
        }

        out.push(ch);
    }

    out
}
