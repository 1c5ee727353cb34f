use std::collections::HashMap;
use std::path::PathBuf;

use zoneinfo_ics::collapse::collapse_zone;
use zoneinfo_ics::config::Config;
use zoneinfo_ics::emit::emit_vtimezone;
use zoneinfo_ics::line::{ChangeTime, DaySpec, Line, LineParser, Month, TimeSpec, TimeType, Weekday, Year};
use zoneinfo_ics::table::{Format, RuleInfo, Saving, TableBuilder, ZoneInfo};
use zoneinfo_ics::transitions::build_zone_transitions;

fn config() -> Config {
    Config {
        olson_dir: PathBuf::new(),
        output_dir: PathBuf::new(),
        pure_output: true,
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

#[test]
fn no_transitions_single_segment() {
    let zone = ZoneInfo {
        offset: 1234,
        format: Format::new("TEST"),
        saving: Saving::NoSaving,
        end_time: None,
    };

    let rulesets = HashMap::new();
    let transitions = build_zone_transitions("Test/Zone", &[zone], &rulesets, 2030);
    assert_eq!(transitions.len(), 1);
    assert_eq!(transitions[0].stdoff, 1234);
    assert_eq!(transitions[0].tzname.as_deref(), Some("TEST"));

    let components = collapse_zone("Test/Zone", &transitions, &config()).unwrap();
    assert_eq!(components.len(), 1);
    assert!(!components[0].is_daylight);
}

#[test]
fn one_fixed_offset_change() {
    let zone_1 = ZoneInfo {
        offset: 1234,
        format: Format::new("TEST"),
        saving: Saving::NoSaving,
        end_time: Some(ChangeTime::UntilTime(
            Year::Number(1970),
            Month::January,
            DaySpec::Ordinal(2),
            TimeSpec::HoursMinutesSeconds(10, 17, 36).with_type(TimeType::UTC),
        )),
    };

    let zone_2 = ZoneInfo {
        offset: 5678,
        format: Format::new("TSET"),
        saving: Saving::NoSaving,
        end_time: None,
    };

    let rulesets = HashMap::new();
    let transitions = build_zone_transitions("Test/Zone", &[zone_1, zone_2], &rulesets, 2030);
    assert_eq!(transitions.len(), 2);
    assert_eq!(transitions[1].stdoff, 5678);
    assert_eq!(transitions[1].tzname.as_deref(), Some("TSET"));
}

#[test]
fn one_rule_produces_a_second_transition() {
    let ruleset = vec![RuleInfo {
        from_year: Year::Number(1980),
        to_year: None,
        month: Month::February,
        day: DaySpec::Ordinal(4),
        time: 0,
        time_type: TimeType::UTC,
        time_to_add: 1000,
        letters: None,
    }];

    let lmt = ZoneInfo {
        offset: 0,
        format: Format::new("LMT"),
        saving: Saving::NoSaving,
        end_time: Some(ChangeTime::UntilYear(Year::Number(1980))),
    };

    let zone = ZoneInfo {
        offset: 2000,
        format: Format::new("TEST"),
        saving: Saving::Multiple("Dwayne".to_owned()),
        end_time: None,
    };

    let mut rulesets = HashMap::new();
    rulesets.insert("Dwayne".to_owned(), ruleset);

    let transitions = build_zone_transitions("Test/Zone", &[lmt, zone], &rulesets, 2030);
    assert_eq!(transitions.len(), 2);
    assert_eq!(transitions[1].stdoff, 2000);
    assert_eq!(transitions[1].walloff, 3000);
}

/// Mirrors the historical `Libya` zone's record, exercising a long chain
/// of fixed and ruleset-driven segments end to end through transition
/// building, collapsing, and emission.
#[test]
fn tripoli_emits_a_complete_vtimezone() {
    let libya = vec![
        RuleInfo {
            from_year: Year::Number(1951),
            to_year: None,
            month: Month::October,
            day: DaySpec::Ordinal(14),
            time: 7200,
            time_type: TimeType::Wall,
            time_to_add: 3600,
            letters: Some("S".to_owned()),
        },
        RuleInfo {
            from_year: Year::Number(1952),
            to_year: None,
            month: Month::January,
            day: DaySpec::Ordinal(1),
            time: 0,
            time_type: TimeType::Wall,
            time_to_add: 0,
            letters: None,
        },
        RuleInfo {
            from_year: Year::Number(1997),
            to_year: None,
            month: Month::April,
            day: DaySpec::Ordinal(4),
            time: 0,
            time_type: TimeType::Wall,
            time_to_add: 3600,
            letters: Some("S".to_owned()),
        },
        RuleInfo {
            from_year: Year::Number(1997),
            to_year: None,
            month: Month::October,
            day: DaySpec::Ordinal(4),
            time: 0,
            time_type: TimeType::Wall,
            time_to_add: 0,
            letters: None,
        },
    ];

    let zone = vec![
        ZoneInfo {
            offset: 3164,
            format: Format::new("LMT"),
            saving: Saving::NoSaving,
            end_time: Some(ChangeTime::UntilYear(Year::Number(1920))),
        },
        ZoneInfo {
            offset: 3600,
            format: Format::new("CE%sT"),
            saving: Saving::Multiple("Libya".to_owned()),
            end_time: Some(ChangeTime::UntilYear(Year::Number(1959))),
        },
        ZoneInfo {
            offset: 7200,
            format: Format::new("EET"),
            saving: Saving::NoSaving,
            end_time: None,
        },
    ];

    let mut rulesets = HashMap::new();
    rulesets.insert("Libya".to_owned(), libya);

    let transitions = build_zone_transitions("Africa/Tripoli", &zone, &rulesets, 2000);
    assert!(transitions.iter().any(|t| t.tzname.as_deref() == Some("CEST")));
    assert!(transitions.iter().any(|t| t.tzname.as_deref() == Some("EET")));

    let config = config();
    let components = collapse_zone("Africa/Tripoli", &transitions, &config).unwrap();
    assert!(!components.is_empty());

    let ics = emit_vtimezone("Africa/Tripoli", &components, &config, "20260726");
    assert!(ics.starts_with("BEGIN:VCALENDAR\n"));
    assert!(ics.contains("BEGIN:VTIMEZONE"));
    assert!(ics.contains("TZID:Africa/Tripoli"));
    assert!(ics.contains("END:VTIMEZONE"));
    assert!(ics.ends_with("END:VCALENDAR\n"));
}

#[test]
fn dushanbe_parses_and_builds_transitions() {
    static ZONEINFO: &str = r#"
Zone    Asia/Dushanbe   4:35:12 -   LMT 1924 May  2
            5:00    1:00    +05/+06 1991 Sep  9  2:00s
"#;

    let mut builder = TableBuilder::new(false);
    let parser = LineParser::default();
    for line in ZONEINFO.lines() {
        match parser.parse_str(line).unwrap() {
            Line::Zone(zone) => builder.add_zone_line(zone).unwrap(),
            Line::Continuation(cont) => builder.add_continuation_line(cont).unwrap(),
            Line::Rule(rule) => builder.add_rule_line(rule).unwrap(),
            Line::Link(link) => builder.add_link_line(link).unwrap(),
            Line::Space => {}
        }
    }
    let table = builder.build();

    let segments = table.get_zoneset("Asia/Dushanbe").unwrap();
    let rulesets = HashMap::new();
    let transitions = build_zone_transitions("Asia/Dushanbe", segments, &rulesets, 2030);
    assert_eq!(transitions.len(), 2);
    assert_eq!(transitions[0].tzname.as_deref(), Some("LMT"));
    assert_eq!(transitions[1].stdoff, 5 * 3600);
}
