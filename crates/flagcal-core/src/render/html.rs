use super::{CHROME_BACKGROUND, ClassifiedDay, Emitter, MonthView, WEEKDAY_INITIALS};

pub(super) struct HtmlEmitter;

impl Emitter for HtmlEmitter {
    fn month_header(&self, out: &mut String, month: &MonthView, _index: usize) {
        out.push_str(&format!(
            r#"<table bgcolor="{CHROME_BACKGROUND}" style="border-collapse: collapse;" cellspacing="0" cellpadding="0" border="1" width="100%"><thead><tr><th colspan="7" align="left" bgcolor="{CHROME_BACKGROUND}" style="color: white; padding: 8px;">{}</th></tr>"#,
            month.title()
        ));
    }

    fn weekday_header(&self, out: &mut String) {
        out.push_str(r##"<tr bgcolor="#E8E8E8">"##);
        for initial in WEEKDAY_INITIALS {
            out.push_str(&format!(
                r#"<th align="center" width="14%" style="padding: 4px;">{initial}</th>"#
            ));
        }
        out.push_str("</tr></thead><tbody>");
    }

    fn open_week(&self, out: &mut String) {
        out.push_str(&format!(r#"<tr bgcolor="{CHROME_BACKGROUND}">"#));
    }

    fn day_cell(&self, out: &mut String, day: &ClassifiedDay, _column: usize) {
        if day.cell.date.is_none() {
            out.push_str(r#"<td align="center" style="color: white; padding: 4px;"></td>"#);
            return;
        }
        out.push_str(&format!(
            r#"<td align="center" style="color: {}; padding: 4px;">{}</td>"#,
            day.style.color,
            day.label()
        ));
    }

    fn close_week(&self, out: &mut String) {
        out.push_str("</tr>");
    }

    fn close_month(&self, out: &mut String) {
        out.push_str("</tbody></table>");
    }
}
