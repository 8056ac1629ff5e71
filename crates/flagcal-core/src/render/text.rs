use super::{ClassifiedDay, Emitter, MonthView, WEEKDAY_ABBREVIATIONS};

const CELL_GAP: &str = "  ";

pub(super) struct TextEmitter;

impl Emitter for TextEmitter {
    fn month_header(&self, out: &mut String, month: &MonthView, _index: usize) {
        out.push('\n');
        out.push_str(&month.title());
        out.push('\n');
    }

    fn weekday_header(&self, out: &mut String) {
        let header = WEEKDAY_ABBREVIATIONS.join(CELL_GAP);
        out.push_str(&header);
        out.push('\n');
        out.push_str(&"-".repeat(header.len() + CELL_GAP.len()));
        out.push('\n');
    }

    fn day_cell(&self, out: &mut String, day: &ClassifiedDay, column: usize) {
        if column > 0 {
            out.push_str(CELL_GAP);
        }
        out.push_str(&format!("{:>2}", day.label()));
    }

    fn close_week(&self, out: &mut String) {
        out.push('\n');
    }

    fn close_month(&self, out: &mut String) {
        out.push('\n');
    }
}
