//! Ambient run configuration, built once from CLI arguments and threaded
//! through the whole pipeline.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::links::LinkStrategy;

/// CLI-facing mirror of [`LinkStrategy`], kept separate so `clap`'s
/// `ValueEnum` derive doesn't need to reach into `links.rs`.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CliLinkStrategy {
    ReEmit,
    Alias,
}

impl From<CliLinkStrategy> for LinkStrategy {
    fn from(strategy: CliLinkStrategy) -> LinkStrategy {
        match strategy {
            CliLinkStrategy::ReEmit => LinkStrategy::ReEmit,
            CliLinkStrategy::Alias => LinkStrategy::Alias,
        }
    }
}

/// Convert an IANA zoneinfo source tree into RFC 5545 VTIMEZONE files.
#[derive(Parser, Debug, Clone)]
#[command(name = "zoneinfo-ics", version, about)]
pub struct Cli {
    /// Directory containing the tz source files (`africa`, `europe`, …).
    #[arg(long)]
    pub olson_dir: PathBuf,

    /// Output root; one file per zone is written beneath it.
    #[arg(long, default_value = "zoneinfo")]
    pub output_dir: PathBuf,

    /// Disable compatibility rewrites aimed at lossy calendar consumers.
    #[arg(long)]
    pub pure_output: bool,

    /// Never emit RRULEs, only RDATEs/standalone components.
    #[arg(long)]
    pub no_rrules: bool,

    /// Never emit RDATEs, only standalone components.
    #[arg(long)]
    pub no_rdates: bool,

    /// How `Link` records are satisfied: `alias` symlinks the aliased
    /// name to the target's file, `re-emit` writes a full copy under
    /// the aliased name.
    #[arg(long, value_enum, default_value = "alias")]
    pub link_strategy: CliLinkStrategy,

    /// Dump the parsed table to stdout for debugging, then exit.
    #[arg(long)]
    pub dump: bool,

    /// Dump the per-zone transition stream (pre-collapse) for debugging.
    #[arg(long)]
    pub dump_changes: bool,

    /// Write `zones.tab` alongside the output.
    #[arg(long)]
    pub dump_zone_names_and_coords: bool,

    /// Write `zones.h` alongside the output.
    #[arg(long)]
    pub dump_zone_translatable_strings: bool,

    /// Base URL for `TZURL`; a trailing slash is stripped.
    #[arg(long)]
    pub url_prefix: Option<String>,

    /// `PRODID` value written into every VCALENDAR.
    #[arg(long, default_value = "-//tz.example//zoneinfo-ics//EN")]
    pub prodid: String,

    /// Prefix prepended to every `TZID`. May contain `%D` (today's date as
    /// `YYYYMMDD`) and `%%` (a literal `%`).
    #[arg(long, default_value = "")]
    pub tzid_prefix: String,

    #[arg(short = 'v', long)]
    pub verbose: bool,

    #[arg(short = 'q', long)]
    pub quiet: bool,
}

/// The resolved settings the pipeline actually consults; kept separate
/// from `Cli` so library code doesn't depend on `clap`.
#[derive(Debug, Clone)]
pub struct Config {
    pub olson_dir: PathBuf,
    pub output_dir: PathBuf,
    pub pure_output: bool,
    pub no_rrules: bool,
    pub no_rdates: bool,
    pub link_strategy: LinkStrategy,
    pub dump_output: bool,
    pub dump_changes: bool,
    pub dump_zone_names_and_coords: bool,
    pub dump_zone_translatable_strings: bool,
    pub url_prefix: Option<String>,
    pub prodid: String,
    pub tzid_prefix: String,
}

impl From<Cli> for Config {
    fn from(cli: Cli) -> Config {
        Config {
            olson_dir: cli.olson_dir,
            output_dir: cli.output_dir,
            pure_output: cli.pure_output,
            no_rrules: cli.no_rrules,
            no_rdates: cli.no_rdates,
            link_strategy: cli.link_strategy.into(),
            dump_output: cli.dump,
            dump_changes: cli.dump_changes,
            dump_zone_names_and_coords: cli.dump_zone_names_and_coords,
            dump_zone_translatable_strings: cli.dump_zone_translatable_strings,
            url_prefix: cli.url_prefix.map(|u| u.trim_end_matches('/').to_owned()),
            prodid: cli.prodid,
            tzid_prefix: cli.tzid_prefix,
        }
    }
}
