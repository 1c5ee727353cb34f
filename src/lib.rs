//! Rust library for reading the text files comprising the [zoneinfo
//! database][w], which records time zone changes and offsets across the world
//! from multiple sources.
//!
//! The zoneinfo database is distributed in one of two formats: a raw text
//! format with one file per continent, and a compiled binary format with one
//! file per time zone. This crate deals with the former; for the latter, see
//! the [`zoneinfo_compiled` crate][zc] instead.
//!
//! The database itself is maintained by IANA. For more information, see
//! [IANA’s page on the time zone database][iana]. You can also find the text
//! files themselves in [the tz repository][tz].
//!
//! [iana]: https://www.iana.org/time-zones
//! [tz]: https://github.com/eggert/tz
//! [w]: https://en.wikipedia.org/wiki/Tz_database
//! [zc]: https://github.com/rust-datetime/zoneinfo-compiled
//!
//! ## Outline
//!
//! Turning a zoneinfo text file into VTIMEZONE components is split into
//! several stages:
//!
//! - **Lexing** a line into whitespace/comment/quote-aware fields is done
//!   by the `lexer` module;
//! - **Parsing** individual lines into `Line`s is done by the `line`
//!   module;
//! - **Interpreting** these lines into a complete `Table` is done by the
//!   `table` module;
//! - **Expanding** multi-year rules into one firing per year is done by
//!   the `rules` module;
//! - **Building transitions** from a table's zone segments and expanded
//!   rules is done by the `transitions` module, producing the `vzictime`
//!   module's `VzicTime` records;
//! - **Collapsing** those transitions into RRULE/RDATE recurrences is
//!   done by the `collapse` module;
//! - **Emitting** RFC 5545 VTIMEZONE text is done by the `emit` module;
//! - **Resolving** `Link` aliases is done by the `links` module;
//! - **Describing** each zone's coordinates and comments (the `zone.tab`
//!   companion data) is done by the `zonetab` module.

#![warn(missing_copy_implementations)]
//#![warn(missing_docs)]
#![warn(nonstandard_style)]
#![warn(trivial_numeric_casts)]
#![warn(unreachable_pub)]
#![warn(unused)]

pub mod collapse;
pub mod config;
pub mod emit;
pub mod error;
pub mod lexer;
pub mod line;
pub mod links;
pub mod rules;
pub mod structure;
pub mod table;
pub mod transitions;
pub mod vzictime;
pub mod zonetab;
