use super::{ClassifiedDay, Emitter, MonthView, WEEKDAY_ABBREVIATIONS};

const BLANK_CELL: &str = "   ";

pub(super) struct MarkdownEmitter;

impl Emitter for MarkdownEmitter {
    fn month_header(&self, out: &mut String, month: &MonthView, _index: usize) {
        out.push_str(&format!("\n### {}\n\n", month.title()));
    }

    fn weekday_header(&self, out: &mut String) {
        out.push_str(&format!("| {} |\n", WEEKDAY_ABBREVIATIONS.join(" | ")));
        out.push('|');
        for _ in WEEKDAY_ABBREVIATIONS {
            out.push_str("----|");
        }
        out.push('\n');
    }

    fn open_week(&self, out: &mut String) {
        out.push_str("| ");
    }

    fn day_cell(&self, out: &mut String, day: &ClassifiedDay, column: usize) {
        if column > 0 {
            out.push_str(" | ");
        }
        match day.cell.date {
            Some(_) => out.push_str(&format!("{:>2}", day.label())),
            None => out.push_str(BLANK_CELL),
        }
    }

    fn close_week(&self, out: &mut String) {
        out.push_str(" |\n");
    }

    fn close_month(&self, out: &mut String) {
        out.push('\n');
    }
}
