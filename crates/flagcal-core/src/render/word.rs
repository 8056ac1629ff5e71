use super::{CHROME_BACKGROUND, ClassifiedDay, Emitter, MonthView, WEEKDAY_INITIALS};
use crate::classify::{COLOR_ACTIVE, COLOR_GRAY};

const TABLE_STYLE: &str = "border-collapse: collapse; width: 100%; margin-bottom: 40px; \
                           -webkit-border-horizontal-spacing: 0px; \
                           -webkit-border-vertical-spacing: 0px;";

pub(super) struct WordEmitter;

impl Emitter for WordEmitter {
    fn open(&self, out: &mut String) {
        out.push_str(
            r#"<div data-render-src="onenote-calendar" style="font-family: Calibri, sans-serif;">"#,
        );
    }

    fn month_header(&self, out: &mut String, month: &MonthView, index: usize) {
        let top_margin = if index == 0 { "5px" } else { "20px" };
        out.push_str(&format!(
            r#"<div data-render-src="month-header" style="margin: {top_margin} 0 5px 0; color: {COLOR_ACTIVE}; background-color: {CHROME_BACKGROUND}; padding: 5px;">{}</div>"#,
            month.title()
        ));
        out.push_str(&format!(
            r#"<table data-render-src="calendar-table" style="{TABLE_STYLE}">"#
        ));
    }

    fn weekday_header(&self, out: &mut String) {
        out.push_str("<tr>");
        for initial in WEEKDAY_INITIALS {
            out.push_str(&format!(
                r#"<td data-render-src="header-cell" style="border: 1px solid {COLOR_GRAY}; padding: 5px; text-align: center; width: 14.28%; font-weight: bold; color: {CHROME_BACKGROUND}; background-color: {COLOR_ACTIVE};">{initial}</td>"#
            ));
        }
        out.push_str("</tr>");
    }

    fn open_week(&self, out: &mut String) {
        out.push_str("<tr>");
    }

    fn day_cell(&self, out: &mut String, day: &ClassifiedDay, _column: usize) {
        let style = [
            format!("border: 1px solid {COLOR_GRAY}"),
            "padding: 5px".to_string(),
            "text-align: center".to_string(),
            "height: 20px".to_string(),
            format!("color: {}", day.style.color),
            "-webkit-border-horizontal-spacing: 0px".to_string(),
            "-webkit-border-vertical-spacing: 0px".to_string(),
        ]
        .join(";");
        out.push_str(&format!(
            r#"<td data-render-src="day-cell" style="{style}">{}</td>"#,
            day.label()
        ));
    }

    fn close_week(&self, out: &mut String) {
        out.push_str("</tr>");
    }

    fn close_month(&self, out: &mut String) {
        out.push_str("</table>");
    }

    fn close(&self, out: &mut String) {
        out.push_str("</div>");
    }
}
