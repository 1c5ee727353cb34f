//! The in-memory transition record shared by the transition builder,
//! recurrence collapser, and emitter.
//!
//! Unlike a plain Unix timestamp, a `VzicTime` keeps the transition's
//! calendar representation (month, day specifier, time-of-day and its
//! frame) alongside the UTC offsets either side of it. The collapser needs
//! the calendar fields to recognise "the same rule fires every year"; the
//! emitter needs them to print `DTSTART`/`RRULE` in local wall time.

use crate::line::{DaySpec, Month, TimeType, Weekday};

/// A transition's year, or one of the two open-ended sentinels.
#[derive(PartialEq, Eq, Debug, Copy, Clone)]
pub enum VzicYear {
    Minimum,
    Number(i64),
}

/// A single point at which a zone's effective UTC offset changes.
#[derive(Debug, Clone)]
pub struct VzicTime {
    pub year: VzicYear,
    pub month: Month,
    pub day_code: DaySpec,
    pub time_seconds: i64,
    pub time_code: TimeType,

    /// The standard (non-DST) UTC offset in effect after this transition.
    pub stdoff: i64,
    /// The wall-clock UTC offset (`stdoff + save`) in effect after this
    /// transition.
    pub walloff: i64,

    pub prev_stdoff: i64,
    pub prev_walloff: i64,

    /// Set on the final materialised firing of a rule whose `to_year` was
    /// open-ended: this transition, and the yearly pattern it belongs to,
    /// recurs forever.
    pub is_infinite: bool,

    pub tzname: Option<String>,
}

impl VzicTime {
    pub fn is_daylight(&self) -> bool {
        self.walloff != self.stdoff
    }

    /// The weekday implied by this transition's day specifier, if it
    /// already names one directly (`Last`/`LastOnOrBefore`/`FirstOnOrAfter`).
    /// `Ordinal` days carry no inherent weekday until resolved against a
    /// specific year.
    pub fn named_weekday(&self) -> Option<Weekday> {
        match self.day_code {
            DaySpec::Ordinal(_) => None,
            DaySpec::Last(wd) | DaySpec::LastOnOrBefore(wd, _) | DaySpec::FirstOnOrAfter(wd, _) => {
                Some(wd)
            }
        }
    }
}
