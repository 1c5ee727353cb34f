//! Rendering a zone's collapsed components as RFC 5545 `VTIMEZONE` text.

use std::fmt::Write as _;

use crate::collapse::{ByDaySpec, CollapsedComponent, RealizedPoint};
use crate::config::Config;
use crate::line::Month;

/// Years beyond this are not legitimately finite: the source data should
/// never produce one, but a malformed corpus could.
const MAX_TIME_T_YEAR: i64 = 2037;

fn month_number(m: Month) -> u8 {
    m as u8
}

fn format_offset(seconds: i64, force_seconds: bool) -> String {
    let sign = if seconds < 0 { '-' } else { '+' };
    let abs = seconds.unsigned_abs();
    let h = abs / 3600;
    let m = (abs % 3600) / 60;
    let s = abs % 60;
    if s != 0 || force_seconds {
        format!("{sign}{h:02}{m:02}{s:02}")
    } else {
        format!("{sign}{h:02}{m:02}")
    }
}

fn format_dtstart(point: &RealizedPoint) -> String {
    let h = point.wall_seconds / 3600;
    let m = (point.wall_seconds % 3600) / 60;
    let s = point.wall_seconds % 60;
    format!(
        "{:04}{:02}{:02}T{:02}{:02}{:02}",
        point.year,
        month_number(point.month),
        point.day,
        h,
        m,
        s
    )
}

fn format_byday(spec: &ByDaySpec) -> Option<String> {
    match spec {
        ByDaySpec::WeekOfMonth { week, weekday } => Some(format!("BYDAY={week}{}", weekday.ical_code())),
        ByDaySpec::MonthDayRange { .. } => None,
        ByDaySpec::Fixed => None,
    }
}

fn format_bymonthday(spec: &ByDaySpec) -> Option<String> {
    match spec {
        ByDaySpec::MonthDayRange { start_day, .. } => {
            let days: Vec<String> = (0..7).map(|d| (*start_day + d).to_string()).collect();
            Some(format!("BYMONTHDAY={}", days.join(",")))
        }
        _ => None,
    }
}

fn render_rrule(component: &CollapsedComponent) -> Option<String> {
    let rrule = component.rrule.as_ref()?;
    let mut parts = vec!["FREQ=YEARLY".to_owned(), format!("BYMONTH={}", month_number(rrule.month))];

    if let Some(bymonthday) = format_bymonthday(&rrule.by_day) {
        parts.push(bymonthday);
    }
    if let Some(byday) = format_byday(&rrule.by_day) {
        parts.push(byday);
    }
    if let Some(until) = &component.until {
        if until.year <= MAX_TIME_T_YEAR {
            parts.push(format!("UNTIL={}Z", format_dtstart(until)));
        }
    }

    Some(parts.join(";"))
}

fn render_component(out: &mut String, component: &CollapsedComponent) {
    let kind = if component.is_daylight { "DAYLIGHT" } else { "STANDARD" };
    let _ = writeln!(out, "BEGIN:{kind}");
    let _ = writeln!(out, "TZOFFSETFROM:{}", format_offset(component.tzoffsetfrom, false));
    let _ = writeln!(out, "TZOFFSETTO:{}", format_offset(component.tzoffsetto, false));
    if let Some(name) = &component.tzname {
        let _ = writeln!(out, "TZNAME:{name}");
    }
    let _ = writeln!(out, "DTSTART:{}", format_dtstart(&component.dtstart));

    if let Some(rrule) = render_rrule(component) {
        let _ = writeln!(out, "RRULE:{rrule}");
    }
    for rdate in &component.rdates {
        let _ = writeln!(out, "RDATE:{}", format_dtstart(rdate));
    }

    let _ = writeln!(out, "END:{kind}");
}

/// Expands `%D` (today's date as `YYYYMMDD`) and `%%` (a literal `%`) in
/// a configured `TZID` prefix.
fn expand_tzid_prefix(prefix: &str, today: &str) -> String {
    let mut out = String::with_capacity(prefix.len());
    let mut chars = prefix.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '%' {
            match chars.peek() {
                Some('D') => {
                    chars.next();
                    out.push_str(today);
                }
                Some('%') => {
                    chars.next();
                    out.push('%');
                }
                _ => out.push('%'),
            }
        } else {
            out.push(c);
        }
    }
    out
}

/// Writes the complete `VCALENDAR`/`VTIMEZONE` envelope for one zone.
/// `today` is the `YYYYMMDD` stamp used to expand `%D` in the configured
/// `TZID` prefix; callers stamp it once at the start of a run rather than
/// computing it per zone, since this crate never calls `Local::now`-style
/// clock functions from library code.
pub fn emit_vtimezone(zone_name: &str, components: &[CollapsedComponent], config: &Config, today: &str) -> String {
    let tzid = format!("{}{}", expand_tzid_prefix(&config.tzid_prefix, today), zone_name);

    let mut out = String::new();
    let _ = writeln!(out, "BEGIN:VCALENDAR");
    let _ = writeln!(out, "VERSION:2.0");
    let _ = writeln!(out, "PRODID:{}", config.prodid);
    let _ = writeln!(out, "BEGIN:VTIMEZONE");
    let _ = writeln!(out, "TZID:{tzid}");
    if let Some(prefix) = &config.url_prefix {
        let _ = writeln!(out, "TZURL:{prefix}/{zone_name}");
    }
    let _ = writeln!(out, "X-LIC-LOCATION:{zone_name}");

    for component in components {
        render_component(&mut out, component);
    }

    let _ = writeln!(out, "END:VTIMEZONE");
    let _ = writeln!(out, "END:VCALENDAR");
    out
}
