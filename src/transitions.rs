//! Building transition lists from a fully constructed `Table`.
//!
//! Once a table has been built, each named zone's segments need to be
//! walked in order, interleaving each segment's rule set with the segment
//! boundaries themselves, to produce a flat chronological list of
//! [`VzicTime`] transitions. This is the same sweep a classic "fixed
//! timespan set" builder performs, except that it keeps the calendar
//! fields of each transition alive instead of collapsing straight to a
//! resolved UTC offset pair, because the recurrence collapser downstream
//! needs them to recognise "the same rule fires every year".
//!
//! Like the fixed-timespan-set builder this replaces, a fresh `dst_offset`
//! starts at zero for every segment and is replayed forward from that
//! segment's own ruleset — rules from *before* the segment's start are
//! still walked (just not emitted) so that a segment beginning mid-DST
//! inherits the correct save without a special lookup.
//!
//! ### Example
//!
//! The complete definition of the `Indian/Mauritius` time zone, as
//! specified in the `africa` file, has two Zone definitions, one of which
//! refers to four Rule definitions:
//!
//! ```tz
//! # Rule      NAME    FROM    TO      TYPE    IN      ON      AT      SAVE    LETTER/S
//! Rule Mauritius      1982    only    -       Oct     10      0:00    1:00    S
//! Rule Mauritius      1983    only    -       Mar     21      0:00    0       -
//! Rule Mauritius      2008    only    -       Oct     lastSun 2:00    1:00    S
//! Rule Mauritius      2009    only    -       Mar     lastSun 2:00    0       -
//!
//! # Zone      NAME            GMTOFF  RULES   FORMAT  [UNTIL]
//! Zone Indian/Mauritius       3:50:00 -       LMT     1907   # Port Louis
//!                             4:00 Mauritius  MU%sT          # Mauritius Time
//! ```
//!
//! The first segment is a fixed local-mean-time offset lasting until the
//! start of 1907; the second segment names the `Mauritius` ruleset and
//! has no `UNTIL`, so it runs forever, picking up the four rules above as
//! they fall due.

use std::collections::HashMap;

use crate::line::{ChangeTime, DaySpec, Month, TimeSpec, TimeSpecAndType, TimeType, Year};
use crate::rules::{expand_ruleset, ExpandedRule};
use crate::table::{Format, RuleInfo, Saving, ZoneInfo};
use crate::vzictime::{VzicTime, VzicYear};

/// Zones whose historical abbreviation is known even though no active
/// rule supplies a `letter_s` to fill in a `FORMAT`'s `%s`. See the
/// fallback table.
fn tzname_fallback(zone_name: &str) -> Option<&'static str> {
    match zone_name {
        "Asia/Macao" | "Asia/Macau" => Some("CST"),
        "Asia/Samarkand" => Some("TAST"),
        "Atlantic/Azores" | "Europe/Paris" => Some("WET"),
        "Europe/Warsaw" => Some("CET"),
        "America/Phoenix" => Some("MST"),
        "America/Nome" => Some("YST"),
        _ => None,
    }
}

fn resolve_tzname(
    format: &Format,
    dst_offset: i64,
    letters: Option<&String>,
    fallback: Option<&'static str>,
) -> Option<String> {
    match format {
        Format::Constant(_) | Format::Alternate { .. } => Some(format.format(dst_offset, letters)),
        Format::Placeholder(_) => {
            if letters.is_some() {
                Some(format.format(dst_offset, letters))
            } else {
                fallback.map(str::to_owned)
            }
        }
    }
}

/// Turns a raw seconds-past-midnight value back into a `TimeSpec`, the
/// inverse of `TimeSpec::as_seconds`. `ExpandedRule` and `ZoneInfo` both
/// store the time of day pre-reduced to seconds.
fn seconds_to_timespec(seconds: i64) -> TimeSpec {
    if seconds == 0 {
        return TimeSpec::Zero;
    }
    let h = (seconds / 3600) as i8;
    let rem = seconds % 3600;
    if rem == 0 {
        return TimeSpec::Hours(h);
    }
    let m = (rem / 60) as i8;
    let s = (rem % 60) as i8;
    if s == 0 {
        TimeSpec::HoursMinutes(h, m)
    } else {
        TimeSpec::HoursMinutesSeconds(h, m, s)
    }
}

/// The UTC instant a `ChangeTime` denotes, given the standard and
/// wall-clock offsets in effect either side of it. `UntilYear`/
/// `UntilMonth`/`UntilDay` carry no explicit time type, so a bare date is
/// taken as wall-clock midnight, matching how the source format treats it.
fn change_time_instant(ct: &ChangeTime, stdoff: i64, walloff: i64) -> i64 {
    let time_type = match ct {
        ChangeTime::UntilTime(_, _, _, TimeSpecAndType(_, tt)) => *tt,
        _ => TimeType::Wall,
    };
    let offset = match time_type {
        TimeType::UTC => 0,
        TimeType::Standard => stdoff,
        TimeType::Wall => walloff,
    };
    ct.to_timestamp() - offset
}

fn change_time_fields(ct: &ChangeTime) -> (VzicYear, Month, DaySpec, i64, TimeType) {
    match *ct {
        ChangeTime::UntilYear(y) => (year_of(y), Month::January, DaySpec::Ordinal(1), 0, TimeType::Wall),
        ChangeTime::UntilMonth(y, m) => (year_of(y), m, DaySpec::Ordinal(1), 0, TimeType::Wall),
        ChangeTime::UntilDay(y, m, d) => (year_of(y), m, d, 0, TimeType::Wall),
        ChangeTime::UntilTime(y, m, d, TimeSpecAndType(spec, tt)) => {
            (year_of(y), m, d, spec.as_seconds(), tt)
        }
    }
}

fn year_of(y: Year) -> VzicYear {
    match y {
        Year::Number(n) => VzicYear::Number(n),
        Year::Minimum => VzicYear::Minimum,
        Year::Maximum => unreachable!("a change time's year is never Max"),
    }
}

fn rule_change_time(rule: &ExpandedRule) -> ChangeTime {
    ChangeTime::UntilTime(
        Year::Number(rule.year),
        rule.month,
        rule.day,
        TimeSpecAndType(seconds_to_timespec(rule.time), rule.time_type),
    )
}

/// Builds the chronological transition list for a single zone.
///
/// `horizon_year` bounds the expansion of any open-ended (`to = max`)
/// rule; it should be derived from [`crate::rules::max_until_year`] plus
/// a small margin, so that an infinite-tailed rule is still represented
/// by at least one concrete, dateable firing.
pub fn build_zone_transitions(
    zone_name: &str,
    segments: &[ZoneInfo],
    rulesets: &HashMap<String, Vec<RuleInfo>>,
    horizon_year: i64,
) -> Vec<VzicTime> {
    let fallback = tzname_fallback(zone_name);
    let mut out: Vec<VzicTime> = Vec::new();

    // The instant + calendar fields at which the *next* segment begins;
    // `None` only for the very first segment, which starts at `Min`.
    let mut start_time: Option<i64> = None;
    let mut start_fields: Option<(VzicYear, Month, DaySpec, i64, TimeType)> = None;

    let push = |out: &mut Vec<VzicTime>,
                year: VzicYear,
                month: Month,
                day_code: DaySpec,
                time_seconds: i64,
                time_code: TimeType,
                stdoff: i64,
                walloff: i64,
                is_infinite: bool,
                tzname: Option<String>| {
        out.push(VzicTime {
            year,
            month,
            day_code,
            time_seconds,
            time_code,
            stdoff,
            walloff,
            prev_stdoff: 0,
            prev_walloff: 0,
            is_infinite,
            tzname,
        });
    };

    let segment_count = segments.len();
    for (i, segment) in segments.iter().enumerate() {
        let stdoff = segment.offset;
        let use_until = i != segment_count - 1;
        let mut dst_offset: i64 = 0;
        let mut insert_start_transition = i > 0;

        match &segment.saving {
            Saving::NoSaving | Saving::OneOff(_) => {
                if let Saving::OneOff(amount) = segment.saving {
                    dst_offset = amount;
                }
                let name = resolve_tzname(&segment.format, dst_offset, None, fallback);

                if insert_start_transition {
                    let (year, month, day_code, time_seconds, time_code) =
                        start_fields.expect("start_fields set whenever insert_start_transition is");
                    push(&mut out, year, month, day_code, time_seconds, time_code, stdoff, stdoff + dst_offset, false, name);
                } else {
                    push(&mut out, VzicYear::Minimum, Month::January, DaySpec::Ordinal(1), 0, TimeType::Wall, stdoff, stdoff + dst_offset, false, name);
                }
            }

            Saving::Multiple(ruleset_name) => {
                let rules = rulesets.get(ruleset_name.as_str()).map(Vec::as_slice).unwrap_or(&[]);
                let expanded = expand_ruleset(rules, horizon_year);
                let mut start_tzname: Option<String> = None;

                for rule in &expanded {
                    let until_instant = if use_until {
                        Some(change_time_instant(
                            segment.end_time.as_ref().expect("use_until implies an end_time"),
                            stdoff,
                            stdoff + dst_offset,
                        ))
                    } else {
                        None
                    };

                    let rule_ct = rule_change_time(rule);
                    let rule_instant = change_time_instant(&rule_ct, stdoff, stdoff + dst_offset);

                    if let Some(until) = until_instant {
                        if rule_instant >= until {
                            break;
                        }
                    }

                    dst_offset = rule.time_to_add;
                    let name = resolve_tzname(&segment.format, dst_offset, rule.letters.as_ref(), fallback);

                    if insert_start_transition && Some(rule_instant) == start_time {
                        insert_start_transition = false;
                    }

                    if insert_start_transition {
                        if rule_instant < start_time.unwrap() {
                            start_tzname = name;
                            continue;
                        }

                        let (year, month, day_code, time_seconds, time_code) = start_fields.unwrap();
                        push(
                            &mut out,
                            year,
                            month,
                            day_code,
                            time_seconds,
                            time_code,
                            stdoff,
                            stdoff + dst_offset,
                            false,
                            start_tzname.take().or_else(|| name.clone()),
                        );
                        insert_start_transition = false;
                    }

                    push(
                        &mut out,
                        VzicYear::Number(rule.year),
                        rule.month,
                        rule.day,
                        rule.time,
                        rule.time_type,
                        stdoff,
                        stdoff + dst_offset,
                        rule.is_infinite,
                        name,
                    );
                }

                if insert_start_transition {
                    // No rule fired on or after the segment start: the
                    // segment's baseline is the standard offset with no
                    // save in effect.
                    let (year, month, day_code, time_seconds, time_code) = start_fields.unwrap();
                    let name = resolve_tzname(&segment.format, 0, None, fallback);
                    push(&mut out, year, month, day_code, time_seconds, time_code, stdoff, stdoff, false, name);
                }
            }
        }

        if use_until {
            let end = segment.end_time.expect("use_until implies an end_time");
            start_time = Some(change_time_instant(&end, stdoff, stdoff + dst_offset));
            start_fields = Some(change_time_fields(&end));
        }
    }

    drop_coincident_segment_starts(&mut out);
    backfill_prev_offsets(&mut out);
    out
}

/// Step 5 of the builder: a segment-start transition and the first rule
/// firing inside that segment sometimes name the exact same calendar
/// point (a rule fires precisely when the previous segment's `UNTIL`
/// ends). When two adjacent transitions are otherwise identical except
/// for which one "owns" the moment, keep only the later (rule-driven) one
/// so a single instant isn't described twice.
fn drop_coincident_segment_starts(transitions: &mut Vec<VzicTime>) {
    let mut i = 0;
    while i + 1 < transitions.len() {
        let a = &transitions[i];
        let b = &transitions[i + 1];
        let same_point = a.year == b.year
            && a.month == b.month
            && a.day_code == b.day_code
            && a.time_seconds == b.time_seconds
            && a.walloff == b.walloff;
        if same_point {
            transitions.remove(i);
        } else {
            i += 1;
        }
    }
}

fn backfill_prev_offsets(transitions: &mut [VzicTime]) {
    for i in 1..transitions.len() {
        let (before, after) = transitions.split_at_mut(i);
        let prev = &before[before.len() - 1];
        after[0].prev_stdoff = prev.stdoff;
        after[0].prev_walloff = prev.walloff;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::line::{DaySpec, Month, TimeType, Weekday, Year};
    use crate::table::{Format, Saving, ZoneInfo};

    fn rule(year: i64, month: Month, day: DaySpec, save: i64, letters: Option<&str>) -> RuleInfo {
        RuleInfo {
            from_year: Year::Number(year),
            to_year: None,
            month,
            day,
            time: 2 * 3600,
            time_type: TimeType::Wall,
            time_to_add: save,
            letters: letters.map(str::to_owned),
        }
    }

    #[test]
    fn single_fixed_segment_has_one_transition() {
        let segments = vec![ZoneInfo {
            offset: 3600,
            saving: Saving::NoSaving,
            format: Format::Constant("CET".to_owned()),
            end_time: None,
        }];
        let rulesets = HashMap::new();
        let out = build_zone_transitions("Europe/Nowhere", &segments, &rulesets, 2030);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].year, VzicYear::Minimum);
        assert_eq!(out[0].stdoff, 3600);
        assert_eq!(out[0].walloff, 3600);
        assert_eq!(out[0].tzname.as_deref(), Some("CET"));
    }

    #[test]
    fn multi_year_dst_ruleset_produces_repeating_transitions() {
        let mut spring = rule(2007, Month::March, DaySpec::FirstOnOrAfter(Weekday::Sunday, 8), 3600, Some("D"));
        spring.to_year = Some(Year::Maximum);
        let mut autumn = rule(2007, Month::November, DaySpec::FirstOnOrAfter(Weekday::Sunday, 1), 0, None);
        autumn.to_year = Some(Year::Maximum);

        let mut rulesets = HashMap::new();
        rulesets.insert("US".to_owned(), vec![spring, autumn]);
        let segments = vec![ZoneInfo {
            offset: -5 * 3600,
            saving: Saving::Multiple("US".to_owned()),
            format: Format::Placeholder("E%sT".to_owned()),
            end_time: None,
        }];
        let out = build_zone_transitions("America/Nowhere", &segments, &rulesets, 2009);
        assert!(out.iter().any(|t| t.tzname.as_deref() == Some("EDT")));
        assert!(out.iter().any(|t| t.tzname.as_deref() == Some("EST")));
        assert!(out.iter().filter(|t| t.year == VzicYear::Number(2007)).count() == 2);
        assert!(out.iter().any(|t| t.is_infinite));
    }

    #[test]
    fn segment_boundary_inherits_dst_in_progress() {
        let mut annual_on = rule(1980, Month::April, DaySpec::FirstOnOrAfter(Weekday::Sunday, 1), 3600, Some("S"));
        annual_on.to_year = Some(Year::Maximum);
        let mut annual_off = rule(1980, Month::October, DaySpec::Last(Weekday::Sunday), 0, None);
        annual_off.to_year = Some(Year::Maximum);

        let mut rulesets = HashMap::new();
        rulesets.insert("EU".to_owned(), vec![annual_on, annual_off]);

        let segments = vec![
            ZoneInfo {
                offset: 3600,
                saving: Saving::Multiple("EU".to_owned()),
                format: Format::Placeholder("CE%sT".to_owned()),
                // the boundary falls in July, squarely inside the DST span.
                end_time: Some(ChangeTime::UntilMonth(Year::Number(1990), Month::July)),
            },
            ZoneInfo {
                offset: 3600,
                saving: Saving::Multiple("EU".to_owned()),
                format: Format::Placeholder("CE%sT".to_owned()),
                end_time: None,
            },
        ];
        let out = build_zone_transitions("Europe/Nowhere", &segments, &rulesets, 2000);
        // the second segment's opening transition should carry the daylight
        // save already in effect, not reset to standard time.
        let second_segment_start = out.iter().find(|t| t.year == VzicYear::Number(1990)).unwrap();
        assert!(second_segment_start.is_daylight());
    }
}
