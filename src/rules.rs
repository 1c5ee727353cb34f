//! Expanding multi-year `Rule` entries into one entry per applicable year.
//!
//! [`table::RuleInfo`](crate::table::RuleInfo) already knows how to test
//! `applies_to_year` and compute an `absolute_datetime` for a given year, but
//! a transition builder that has to find "the next rule to fire" wants a
//! flat, pre-sorted list of concrete per-year firings rather than a
//! relation it re-queries for every candidate year. This module materialises
//! that list once per ruleset.

use crate::line::{DaySpec, Month, TimeType, Year};
use crate::table::RuleInfo;

/// A single concrete firing of a rule in one specific year.
#[derive(Debug, Clone)]
pub struct ExpandedRule {
    pub year: i64,
    pub month: Month,
    pub day: DaySpec,
    pub time: i64,
    pub time_type: TimeType,
    pub time_to_add: i64,
    pub letters: Option<String>,

    /// True for the last materialised entry of a rule whose `to_year` was
    /// `Maximum`: this firing recurs forever, and the year it was
    /// materialised at is only the horizon used to bound expansion, not a
    /// real `UNTIL`.
    pub is_infinite: bool,
}

impl ExpandedRule {
    pub fn absolute_datetime(&self, utc_offset: i64, dst_offset: i64) -> i64 {
        let offset = match self.time_type {
            TimeType::UTC => 0,
            TimeType::Standard => utc_offset,
            TimeType::Wall => utc_offset + dst_offset,
        };
        let changetime =
            crate::line::ChangeTime::UntilDay(Year::Number(self.year), self.month, self.day);
        changetime.to_timestamp() + self.time - offset
    }

    /// The day number used to order same-month firings before the exact
    /// offset is known. `LastWeekday` uses 31 so it always sorts after any
    /// fixed-day or on-or-after/on-or-before firing in the same month, which
    /// keeps expansion order stable even though the true day isn't resolved
    /// until the year's calendar is known.
    fn sort_day(&self) -> i8 {
        match self.day {
            DaySpec::Ordinal(d) => d,
            DaySpec::Last(_) => 31,
            DaySpec::LastOnOrBefore(_, d) => d,
            DaySpec::FirstOnOrAfter(_, d) => d,
        }
    }
}

/// Expands every rule in a ruleset into one [`ExpandedRule`] per applicable
/// year, up to `horizon_year` for open-ended rules, then sorts the result
/// by effective instant (year, month, day, time-of-day).
///
/// Panics if any rule's year range doesn't resolve to at least one
/// concrete year — callers are expected to have already rejected malformed
/// `from`/`to` combinations at parse time.
pub fn expand_ruleset(rules: &[RuleInfo], horizon_year: i64) -> Vec<ExpandedRule> {
    let mut out = Vec::new();

    for rule in rules {
        let from = match rule.from_year {
            Year::Number(y) => y,
            _ => unreachable!("a rule's from_year is always a concrete number"),
        };

        let (last_year, last_is_open) = match rule.to_year {
            None => (from, false),
            Some(Year::Number(to)) => (to, false),
            Some(Year::Maximum) => (horizon_year, true),
            Some(Year::Minimum) => unreachable!("to_year is never Minimum"),
        };

        for year in from..=last_year {
            out.push(ExpandedRule {
                year,
                month: rule.month,
                day: rule.day,
                time: rule.time,
                time_type: rule.time_type,
                time_to_add: rule.time_to_add,
                letters: rule.letters.clone(),
                is_infinite: last_is_open && year == last_year,
            });
        }
    }

    out.sort_by_key(|r| (r.year, r.month as i8, r.sort_day(), r.time));
    out
}

/// The maximum finite `UNTIL` year named by any zone segment in the table,
/// used to bound open-ended rule expansion. Returns `None` if no zone names
/// a finite `UNTIL` at all.
pub fn max_until_year(table: &crate::table::Table) -> Option<i64> {
    table
        .zonesets
        .values()
        .flat_map(|segments| segments.iter())
        .filter_map(|segment| segment.end_time.as_ref())
        .filter_map(|ct| match ct {
            crate::line::ChangeTime::UntilYear(Year::Number(y))
            | crate::line::ChangeTime::UntilMonth(Year::Number(y), ..)
            | crate::line::ChangeTime::UntilDay(Year::Number(y), ..)
            | crate::line::ChangeTime::UntilTime(Year::Number(y), ..) => Some(*y),
            _ => None,
        })
        .max()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::line::{DaySpec, Month, TimeType, Weekday, Year};
    use crate::table::RuleInfo;

    fn rule(from: i64, to: Option<Year>) -> RuleInfo {
        RuleInfo {
            from_year: Year::Number(from),
            to_year: to,
            month: Month::April,
            day: DaySpec::FirstOnOrAfter(Weekday::Sunday, 1),
            time: 3600,
            time_type: TimeType::UTC,
            time_to_add: 3600,
            letters: Some("S".to_owned()),
        }
    }

    #[test]
    fn only_rule_expands_once() {
        let rules = vec![rule(1977, None)];
        let expanded = expand_ruleset(&rules, 2039);
        assert_eq!(expanded.len(), 1);
        assert_eq!(expanded[0].year, 1977);
        assert!(!expanded[0].is_infinite);
    }

    #[test]
    fn ranged_rule_expands_per_year() {
        let rules = vec![rule(1977, Some(Year::Number(1980)))];
        let expanded = expand_ruleset(&rules, 2039);
        let years: Vec<i64> = expanded.iter().map(|r| r.year).collect();
        assert_eq!(years, vec![1977, 1978, 1979, 1980]);
        assert!(expanded.iter().all(|r| !r.is_infinite));
    }

    #[test]
    fn open_ended_rule_uses_horizon_and_flags_tail() {
        let rules = vec![rule(2007, Some(Year::Maximum))];
        let expanded = expand_ruleset(&rules, 2009);
        let years: Vec<i64> = expanded.iter().map(|r| r.year).collect();
        assert_eq!(years, vec![2007, 2008, 2009]);
        assert!(!expanded[0].is_infinite);
        assert!(!expanded[1].is_infinite);
        assert!(expanded[2].is_infinite);
    }

    #[test]
    fn entries_sorted_across_rules() {
        let rules = vec![rule(1979, None), rule(1977, None), rule(1978, None)];
        let expanded = expand_ruleset(&rules, 2039);
        let years: Vec<i64> = expanded.iter().map(|r| r.year).collect();
        assert_eq!(years, vec![1977, 1978, 1979]);
    }
}
