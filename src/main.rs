//! Driver binary: reads an Olson source tree, builds one shared `Table`,
//! and writes one `.ics` file per named zone plus its links.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::exit;

use clap::Parser;
use log::{debug, info, warn};

use zoneinfo_ics::collapse::collapse_zone;
use zoneinfo_ics::config::{Cli, Config};
use zoneinfo_ics::emit::emit_vtimezone;
use zoneinfo_ics::error::Error;
use zoneinfo_ics::line::{Line, LineParser};
use zoneinfo_ics::links::{resolve_link, LinkStrategy};
use zoneinfo_ics::rules::max_until_year;
use zoneinfo_ics::structure::Structure;
use zoneinfo_ics::table::{Table, TableBuilder};
use zoneinfo_ics::transitions::build_zone_transitions;
use zoneinfo_ics::zonetab::{parse_zone_tab, write_zones_h, write_zones_tab, ZoneDescription};

/// The fixed set of source files vzic itself reads, minus the ones this
/// crate deliberately doesn't model (`backward`, `etcetera`, `systemv`,
/// `factory`, `solar87`/`solar88`/`solar89`).
const SOURCE_FILES: &[&str] = &[
    "africa",
    "antarctica",
    "asia",
    "australasia",
    "europe",
    "northamerica",
    "southamerica",
];

/// A horizon margin added past the last finite `UNTIL` year in the data,
/// so an infinite-tailed rule is still materialised with at least one
/// concrete firing beyond every segment boundary.
const HORIZON_MARGIN_YEARS: i64 = 2;

fn main() {
    let cli = Cli::parse();

    let level = if cli.quiet {
        log::LevelFilter::Error
    } else if cli.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    env_logger::Builder::new().filter_level(level).init();

    if let Err(e) = run(cli) {
        eprintln!("error: {e}");
        exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Error> {
    let config: Config = cli.into();

    let table = build_table(&config.olson_dir, config.pure_output)?;

    if config.dump_output {
        println!("{table:#?}");
        return Ok(());
    }

    let horizon_year = max_until_year(&table)
        .map(|y| y + HORIZON_MARGIN_YEARS)
        .unwrap_or(2050);
    info!("expanding rules up to horizon year {horizon_year}");

    fs::create_dir_all(&config.output_dir)?;
    create_directory_tree(&table, &config.output_dir)?;

    let today = stamp_today();

    let mut zone_names: Vec<&String> = table.zonesets.keys().collect();
    zone_names.sort();

    for zone_name in zone_names {
        write_zone(zone_name, &table, &config, &today, horizon_year)?;
    }

    let mut link_names: Vec<(&String, &String)> = table.links.iter().collect();
    link_names.sort();
    for (from_alias, target) in link_names {
        match config.link_strategy {
            LinkStrategy::Alias => {
                debug!("resolving link {from_alias} -> {target}");
                resolve_link(target, from_alias, &config.output_dir)?;
            }
            LinkStrategy::ReEmit => {
                debug!("re-emitting link {from_alias} -> {target}");
                write_zone_as(from_alias, target, &table, &config, &today, horizon_year)?;
            }
        }
    }

    if config.dump_zone_names_and_coords || config.dump_zone_translatable_strings {
        write_zone_tab_companions(&config)?;
    }

    info!("wrote {} zone files", table.zonesets.len());
    Ok(())
}

/// Reads and parses every source file present in `olson_dir` into one
/// shared `Table`. A file named in [`SOURCE_FILES`] that doesn't exist is
/// skipped with a warning rather than treated as fatal, since a partial
/// Olson tree (e.g. one without `southamerica`) is still useful to
/// process.
fn build_table(olson_dir: &Path, pure_output: bool) -> Result<Table, Error> {
    let parser = LineParser::default();
    let mut builder = TableBuilder::new(pure_output);

    for file_name in SOURCE_FILES {
        let path = olson_dir.join(file_name);
        if !path.exists() {
            warn!("source file {path:?} not found, skipping");
            continue;
        }

        let contents = fs::read_to_string(&path)?;
        for (line_number, line) in contents.lines().enumerate() {
            let parsed = parser.parse_str(line).map_err(Error::Line)?;
            add_line(&mut builder, parsed).map_err(|message| Error::Parse {
                file: file_name.to_string(),
                line: line_number + 1,
                message,
                text: line.to_owned(),
            })?;
        }
    }

    Ok(builder.build())
}

fn add_line(builder: &mut TableBuilder, parsed: Line) -> Result<(), String> {
    match parsed {
        Line::Space => Ok(()),
        Line::Zone(zone) => builder.add_zone_line(zone).map_err(|e| e.to_string()),
        Line::Continuation(cont) => builder.add_continuation_line(cont).map_err(|e| e.to_string()),
        Line::Rule(rule) => builder.add_rule_line(rule).map_err(|e| e.to_string()),
        Line::Link(link) => builder.add_link_line(link).map_err(|e| e.to_string()),
    }
}

/// Creates every intermediate `Area`/`Area/Sub` directory ahead of time,
/// so writing a leaf zone never has to worry about a missing parent.
fn create_directory_tree(table: &Table, output_dir: &Path) -> Result<(), Error> {
    for entry in table.structure() {
        let dir = output_dir.join(entry.name);
        fs::create_dir_all(dir)?;
    }
    Ok(())
}

fn zone_output_path(output_dir: &Path, zone_name: &str) -> PathBuf {
    let mut path = output_dir.to_path_buf();
    for component in zone_name.split('/') {
        path.push(component);
    }
    path.set_extension("ics");
    path
}

fn write_zone(zone_name: &str, table: &Table, config: &Config, today: &str, horizon_year: i64) -> Result<(), Error> {
    write_zone_as(zone_name, zone_name, table, config, today, horizon_year)
}

/// Builds the transition stream for `source_zone_name` and writes it out
/// under `output_name`. The two differ only when re-emitting a `Link`:
/// the transitions come from the link's target zone, but the `TZID` and
/// file path use the alias name.
fn write_zone_as(
    output_name: &str,
    source_zone_name: &str,
    table: &Table,
    config: &Config,
    today: &str,
    horizon_year: i64,
) -> Result<(), Error> {
    let segments = table
        .zonesets
        .get(source_zone_name)
        .ok_or_else(|| Error::UnknownZone(source_zone_name.to_owned()))?;

    let transitions = build_zone_transitions(output_name, segments, &table.rulesets, horizon_year);

    if config.dump_changes {
        println!("{output_name}: {transitions:#?}");
    }

    let components = collapse_zone(output_name, &transitions, config)?;
    let ics = emit_vtimezone(output_name, &components, config, today);

    let path = zone_output_path(&config.output_dir, output_name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&path, ics)?;
    debug!("wrote {path:?}");
    Ok(())
}

fn write_zone_tab_companions(config: &Config) -> Result<(), Error> {
    let zone_tab_path = config.olson_dir.join("zone.tab");
    let zones: Vec<ZoneDescription> = if zone_tab_path.exists() {
        let contents = fs::read_to_string(&zone_tab_path)?;
        parse_zone_tab(&contents)?
    } else {
        warn!("zone.tab not found in {:?}, skipping companion output", config.olson_dir);
        Vec::new()
    };

    if config.dump_zone_names_and_coords {
        let mut out = fs::File::create(config.output_dir.join("zones.tab"))?;
        write_zones_tab(&zones, &mut out)?;
    }

    if config.dump_zone_translatable_strings {
        let mut out = fs::File::create(config.output_dir.join("zones.h"))?;
        write_zones_h(&zones, &mut out)?;
    }

    Ok(())
}

/// Stamps `today` as `YYYYMMDD` for `%D` expansion in a configured
/// `TZID` prefix. Library code never calls a clock function directly;
/// `main` computes this once per run and threads it through.
fn stamp_today() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};

    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0) as i64;

    let days = secs.div_euclid(86_400);
    let (year, month, day) = civil_from_days(days);
    format!("{year:04}{month:02}{day:02}")
}

/// Howard Hinnant's days-from-civil algorithm, inverted: turns a count of
/// days since the Unix epoch into a proleptic-Gregorian (year, month,
/// day). Used only to stamp `%D`, so no external date crate is pulled in
/// just for this.
fn civil_from_days(days: i64) -> (i64, u32, u32) {
    let z = days + 719_468;
    let era = if z >= 0 { z } else { z - 146_096 } / 146_097;
    let doe = (z - era * 146_097) as u64;
    let yoe = (doe - doe / 1460 + doe / 36524 - doe / 146_096) / 365;
    let y = yoe as i64 + era * 400;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let d = (doy - (153 * mp + 2) / 5 + 1) as u32;
    let m = if mp < 10 { mp + 3 } else { mp - 9 } as u32;
    let y = if m <= 2 { y + 1 } else { y };
    (y, m, d)
}
