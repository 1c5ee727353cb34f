//! Collapsing a zone's flat transition list into RRULE/RDATE/standalone
//! VTIMEZONE components.
//!
//! This is the stage that decides *how* a repeating pattern gets written:
//! an open-ended rule becomes an infinite `RRULE`, a long-but-finite run
//! of identical yearly firings becomes a bounded `RRULE`, and anything
//! left over is either a standalone component (optionally carrying
//! `RDATE`s in pure mode) or, in compatibility mode, folded into a single
//! trailing `STANDARD` block.

use crate::config::Config;
use crate::error::Error;
use crate::line::{is_leap, DaySpec, Month, TimeType, Weekday};
use crate::vzictime::{VzicTime, VzicYear};

/// The calendar year `Min` renders as, chosen for maximum compatibility
/// with calendar clients that reject dates before the Gregorian epoch.
const MIN_RENDER_YEAR: i64 = 1601;

const RRULE_START_YEAR: i64 = 1970;
const RDATE_YEAR: i64 = 1970;

/// A transition's position realised onto an actual calendar, in local
/// wall time.
#[derive(Debug, Clone, PartialEq)]
pub struct RealizedPoint {
    pub year: i64,
    pub month: Month,
    pub day: i8,
    pub weekday: Weekday,
    pub wall_seconds: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ByDaySpec {
    /// `BYDAY=<n><wd>` or `BYDAY=-1<wd>` for the last occurrence.
    WeekOfMonth { week: i8, weekday: Weekday },
    /// `BYMONTHDAY=d..d+6;BYDAY=<wd>`, pure mode only, for a
    /// `WeekdayOnOrAfter`/`WeekdayOnOrBefore` day that doesn't land on a
    /// fixed week-of-month.
    MonthDayRange { start_day: i8, weekday: Weekday },
    /// A fixed calendar day, carried purely by `DTSTART`; no `BYDAY` at
    /// all.
    Fixed,
}

#[derive(Debug, Clone)]
pub struct RruleSpec {
    pub month: Month,
    pub by_day: ByDaySpec,
}

#[derive(Debug, Clone)]
pub struct CollapsedComponent {
    pub is_daylight: bool,
    pub tzoffsetfrom: i64,
    pub tzoffsetto: i64,
    pub tzname: Option<String>,
    pub dtstart: RealizedPoint,
    pub rrule: Option<RruleSpec>,
    /// Additional fixed occurrences sharing this component's offsets and
    /// name, emitted as `RDATE` lines (pure mode only).
    pub rdates: Vec<RealizedPoint>,
    /// The RRULE's `UNTIL`, if the recurrence is bounded.
    pub until: Option<RealizedPoint>,
}

/// Converts a transition's calendar-relative fields into a concrete wall
/// time, carrying any day spilled over by a Standard/Universal-to-Wall
/// conversion into the neighbouring day (and, at month or year
/// boundaries, into the neighbouring month or year).
pub fn calculate_actual_time(t: &VzicTime) -> Result<RealizedPoint, Error> {
    let year = match t.year {
        VzicYear::Minimum => {
            return Ok(RealizedPoint {
                year: MIN_RENDER_YEAR,
                month: t.month,
                day: 1,
                weekday: Weekday::calculate(MIN_RENDER_YEAR, t.month, 1),
                wall_seconds: 0,
            })
        }
        VzicYear::Number(y) => y,
    };

    let (mut month, mut day) = t.day_code.to_concrete_day(year, t.month);
    let mut weekday = Weekday::calculate(year, month, day);
    let mut year = year;

    let adjustment = match t.time_code {
        TimeType::UTC => t.walloff,
        TimeType::Standard => t.walloff - t.stdoff,
        TimeType::Wall => 0,
    };
    let mut wall_seconds = t.time_seconds + adjustment;

    if wall_seconds < 0 {
        wall_seconds += 86_400;
        weekday = weekday.prev();
        day -= 1;
        if day < 1 {
            match month.prev_in_year() {
                Ok(prev) => {
                    month = prev;
                    day = prev.length(is_leap(year));
                }
                Err(_) => {
                    month = Month::December;
                    day = 31;
                    year -= 1;
                }
            }
        }
    } else if wall_seconds >= 86_400 {
        wall_seconds -= 86_400;
        weekday = weekday.next();
        day += 1;
        if day > month.length(is_leap(year)) {
            match month.next_in_year() {
                Ok(next) => {
                    month = next;
                    day = 1;
                }
                Err(_) => {
                    month = Month::January;
                    day = 1;
                    year += 1;
                }
            }
        }
    }

    if month == Month::February && day == 29 && !is_leap(year) {
        return Err(Error::Semantic {
            zone: String::new(),
            message: format!("rule collides with Feb 29 in non-leap year {year}"),
        });
    }

    Ok(RealizedPoint { year, month, day, weekday, wall_seconds })
}

fn same_recurrence_pattern(t: &VzicTime, u: &VzicTime) -> bool {
    t.month == u.month
        && t.day_code == u.day_code
        && t.time_seconds == u.time_seconds
        && t.time_code == u.time_code
        && t.prev_walloff == u.prev_walloff
        && t.walloff == u.walloff
        && t.tzname == u.tzname
}

/// Zones whose transition day falls close enough to a month boundary
/// that the generically computed week-of-month picks the wrong week in
/// some years; carried over as data, not derived.
fn week_of_month_override(zone_name: &str) -> Option<i8> {
    match zone_name {
        "Asia/Karachi" | "Antarctica/Palmer" | "America/Santiago" | "America/Godthab" => Some(-1),
        _ => None,
    }
}

fn day_spec_to_byday(
    zone_name: &str,
    day_code: DaySpec,
    day_number: i8,
    weekday: Weekday,
    pure_output: bool,
) -> ByDaySpec {
    match day_code {
        DaySpec::Last(wd) => ByDaySpec::WeekOfMonth { week: -1, weekday: wd },

        DaySpec::Ordinal(_) => {
            if pure_output {
                ByDaySpec::Fixed
            } else {
                ByDaySpec::WeekOfMonth { week: (day_number - 1) / 7 + 1, weekday }
            }
        }

        DaySpec::LastOnOrBefore(wd, _) | DaySpec::FirstOnOrAfter(wd, _) => {
            if let Some(week) = week_of_month_override(zone_name) {
                ByDaySpec::WeekOfMonth { week, weekday: wd }
            } else if pure_output {
                ByDaySpec::MonthDayRange { start_day: day_number, weekday: wd }
            } else {
                ByDaySpec::WeekOfMonth { week: (day_number - 1) / 7 + 1, weekday: wd }
            }
        }
    }
}

fn build_rrule_component(
    zone_name: &str,
    t: &VzicTime,
    until: Option<&VzicTime>,
    config: &Config,
) -> Result<CollapsedComponent, Error> {
    let anchor = if config.pure_output || t.year == VzicYear::Minimum {
        t.clone()
    } else {
        let mut anchored = t.clone();
        anchored.year = VzicYear::Number(RRULE_START_YEAR);
        anchored
    };

    let dtstart = calculate_actual_time(&anchor)?;
    let by_day = day_spec_to_byday(zone_name, t.day_code, dtstart.day, dtstart.weekday, config.pure_output);

    let until_point = match until {
        Some(u) if !u.is_infinite => Some(calculate_actual_time(u)?),
        _ => None,
    };

    Ok(CollapsedComponent {
        is_daylight: t.is_daylight(),
        tzoffsetfrom: t.prev_walloff,
        tzoffsetto: t.walloff,
        tzname: t.tzname.clone(),
        dtstart,
        rrule: Some(RruleSpec { month: t.month, by_day }),
        rdates: Vec::new(),
        until: until_point,
    })
}

fn build_standalone_component(t: &VzicTime, rdates: Vec<RealizedPoint>) -> Result<CollapsedComponent, Error> {
    let dtstart = calculate_actual_time(t)?;
    Ok(CollapsedComponent {
        is_daylight: t.is_daylight(),
        tzoffsetfrom: t.prev_walloff,
        tzoffsetto: t.walloff,
        tzname: t.tzname.clone(),
        dtstart,
        rrule: None,
        rdates,
        until: None,
    })
}

/// The minimum number of consecutive yearly firings with an identical
/// pattern before they're worth collapsing into one RRULE rather than
/// being left as standalone components/RDATEs. Set high enough that in
/// practice only genuinely open-ended rules qualify.
const MIN_RRULE_OCCURRENCES: usize = 100;

/// Runs the full two-pass collapse over one zone's transition vector.
pub fn collapse_zone(
    zone_name: &str,
    transitions: &[VzicTime],
    config: &Config,
) -> Result<Vec<CollapsedComponent>, Error> {
    let mut emitted = vec![false; transitions.len()];
    let mut out = Vec::new();

    // Pass 1: RRULEs.
    for i in 0..transitions.len() {
        if emitted[i] {
            continue;
        }
        let t = &transitions[i];
        if t.year == VzicYear::Minimum {
            continue;
        }

        if t.is_infinite && !config.no_rrules {
            out.push(build_rrule_component(zone_name, t, None, config)?);
            emitted[i] = true;
            continue;
        }

        if config.no_rrules {
            continue;
        }

        let start_year = match t.year {
            VzicYear::Number(y) => y,
            VzicYear::Minimum => unreachable!(),
        };
        let mut matched = vec![i];
        let mut last_year = start_year;

        for j in (i + 1)..transitions.len() {
            if emitted[j] {
                continue;
            }
            let u = &transitions[j];
            let u_year = match u.year {
                VzicYear::Number(y) => y,
                VzicYear::Minimum => continue,
            };
            if u_year <= last_year {
                continue;
            }
            if u_year > last_year + 1 {
                break;
            }
            if !same_recurrence_pattern(t, u) {
                break;
            }
            matched.push(j);
            last_year = u_year;
        }

        if matched.len() >= MIN_RRULE_OCCURRENCES {
            let until_t = &transitions[*matched.last().unwrap()];
            out.push(build_rrule_component(zone_name, t, Some(until_t), config)?);
            for idx in matched {
                emitted[idx] = true;
            }
        }
    }

    // Pass 2: standalone components, with RDATEs in pure mode.
    if config.pure_output {
        for i in 1..transitions.len() {
            if emitted[i] {
                continue;
            }
            let t = &transitions[i];
            let mut rdates = Vec::new();

            if !config.no_rdates {
                for j in (i + 1)..transitions.len() {
                    if emitted[j] {
                        continue;
                    }
                    let u = &transitions[j];
                    if u.is_daylight() == t.is_daylight()
                        && u.prev_walloff == t.prev_walloff
                        && u.walloff == t.walloff
                        && u.tzname == t.tzname
                    {
                        rdates.push(calculate_actual_time(u)?);
                        emitted[j] = true;
                    }
                }
            }

            out.push(build_standalone_component(t, rdates)?);
            emitted[i] = true;
        }

        if transitions.len() == 1 && !emitted[0] {
            out.insert(0, build_standalone_component(&transitions[0], Vec::new())?);
            emitted[0] = true;
        }
    } else if let Some(idx) = transitions
        .iter()
        .enumerate()
        .rev()
        .find(|(i, t)| !emitted[*i] && !t.is_daylight())
        .map(|(i, _)| i)
    {
        let t = &transitions[idx];
        let dtstart = RealizedPoint {
            year: RDATE_YEAR,
            month: Month::January,
            day: 1,
            weekday: Weekday::calculate(RDATE_YEAR, Month::January, 1),
            wall_seconds: 0,
        };
        out.push(CollapsedComponent {
            is_daylight: false,
            tzoffsetfrom: t.walloff,
            tzoffsetto: t.walloff,
            tzname: t.tzname.clone(),
            dtstart,
            rrule: None,
            rdates: Vec::new(),
            until: None,
        });
        emitted[idx] = true;
    }

    out.sort_by_key(|c| (c.dtstart.year, c.dtstart.month as i8, c.dtstart.day));
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn config(pure_output: bool) -> Config {
        Config {
            olson_dir: PathBuf::new(),
            output_dir: PathBuf::new(),
            pure_output,
            no_rrules: false,
            no_rdates: false,
            dump_output: false,
            dump_changes: false,
            dump_zone_names_and_coords: false,
            dump_zone_translatable_strings: false,
            url_prefix: None,
            prodid: "-//test//EN".to_owned(),
            tzid_prefix: String::new(),
        }
    }

    fn transition(year: VzicYear, month: Month, day_code: DaySpec, time_seconds: i64, walloff: i64, prev_walloff: i64, is_infinite: bool, tzname: &str) -> VzicTime {
        VzicTime {
            year,
            month,
            day_code,
            time_seconds,
            time_code: TimeType::Wall,
            stdoff: 0,
            walloff,
            prev_stdoff: 0,
            prev_walloff,
            is_infinite,
            tzname: Some(tzname.to_owned()),
        }
    }

    #[test]
    fn infinite_transition_becomes_unbounded_rrule() {
        let t = transition(VzicYear::Number(2007), Month::March, DaySpec::FirstOnOrAfter(Weekday::Sunday, 8), 7200, 3600, 0, true, "DST");
        let config = config(true);
        let components = collapse_zone("Test/Zone", &[t], &config).unwrap();
        assert_eq!(components.len(), 1);
        assert!(components[0].rrule.is_some());
        assert!(components[0].until.is_none());
    }

    #[test]
    fn short_run_of_repeats_stays_standalone() {
        let a = transition(VzicYear::Number(2000), Month::March, DaySpec::FirstOnOrAfter(Weekday::Sunday, 8), 7200, 3600, 0, false, "DST");
        let b = transition(VzicYear::Number(2001), Month::March, DaySpec::FirstOnOrAfter(Weekday::Sunday, 8), 7200, 3600, 0, false, "DST");
        let config = config(true);
        let components = collapse_zone("Test/Zone", &[a, b], &config).unwrap();
        assert!(components.iter().all(|c| c.rrule.is_none()));
        assert_eq!(components.len(), 2);
    }

    #[test]
    fn feb29_collision_is_an_error() {
        let t = VzicTime {
            year: VzicYear::Number(2019),
            month: Month::February,
            day_code: DaySpec::Ordinal(28),
            time_seconds: 23 * 3600 + 30 * 60,
            time_code: TimeType::Standard,
            stdoff: 0,
            walloff: 3600,
            prev_stdoff: 0,
            prev_walloff: 0,
            is_infinite: false,
            tzname: None,
        };
        assert!(calculate_actual_time(&t).is_err());
    }

    #[test]
    fn compatibility_mode_collapses_to_one_standard_block() {
        let t = transition(VzicYear::Number(2005), Month::November, DaySpec::Ordinal(1), 7200, 0, 3600, false, "STD");
        let config = config(false);
        let components = collapse_zone("Test/Zone", &[t], &config).unwrap();
        assert_eq!(components.len(), 1);
        assert_eq!(components[0].dtstart.year, RDATE_YEAR);
        assert!(!components[0].is_daylight);
    }
}
