//! Parsing `zone.tab` and writing its `zones.tab`/`zones.h` companions.
//!
//! `zone.tab` is tab-separated: a 2-letter country code, coordinates in
//! `±DDMM[SS]±DDDMM[SS]` form, the zone name, and an optional trailing
//! comment. Lines starting with `#` are comments. A zone present in the
//! parsed tz source but absent here is tolerated — this module only ever
//! adds metadata, it never gates whether a zone's `.ics` file is written.

use std::io::Write as _;

use crate::error::Error;

#[derive(Debug, Clone, PartialEq)]
pub struct Coordinates {
    /// Signed degrees, minutes, seconds of latitude.
    pub lat: (i32, i32, i32),
    /// Signed degrees, minutes, seconds of longitude.
    pub lng: (i32, i32, i32),
}

#[derive(Debug, Clone)]
pub struct ZoneDescription {
    pub country_code: String,
    pub coordinates: Coordinates,
    pub zone_name: String,
    pub comment: Option<String>,
}

fn parse_coordinate_component(field: &str) -> Result<i32, Error> {
    field.parse().map_err(|_| Error::Semantic {
        zone: field.to_owned(),
        message: "malformed zone.tab coordinate".to_owned(),
    })
}

/// Splits a signed `±DDMM[SS]` or `±DDDMM[SS]` run into (degrees,
/// minutes, seconds), defaulting seconds to 0 when omitted.
fn split_signed_dms(field: &str, degree_digits: usize) -> Result<(i32, i32, i32), Error> {
    let (sign, rest) = match field.as_bytes().first() {
        Some(b'+') => (1, &field[1..]),
        Some(b'-') => (-1, &field[1..]),
        _ => {
            return Err(Error::Semantic {
                zone: field.to_owned(),
                message: "zone.tab coordinate missing sign".to_owned(),
            })
        }
    };

    if rest.len() < degree_digits + 2 {
        return Err(Error::Semantic {
            zone: field.to_owned(),
            message: "zone.tab coordinate too short".to_owned(),
        });
    }

    let degrees = parse_coordinate_component(&rest[..degree_digits])?;
    let minutes = parse_coordinate_component(&rest[degree_digits..degree_digits + 2])?;
    let seconds = if rest.len() > degree_digits + 2 {
        parse_coordinate_component(&rest[degree_digits + 2..])?
    } else {
        0
    };

    Ok((sign * degrees, minutes, seconds))
}

/// Parses the `±DDMM[SS]±DDDMM[SS]` coordinate field into latitude and
/// longitude components.
pub fn parse_coordinates(field: &str) -> Result<Coordinates, Error> {
    let second_sign_pos = field[1..]
        .find(['+', '-'])
        .map(|i| i + 1)
        .ok_or_else(|| Error::Semantic {
            zone: field.to_owned(),
            message: "zone.tab coordinate missing longitude sign".to_owned(),
        })?;

    let lat_field = &field[..second_sign_pos];
    let lng_field = &field[second_sign_pos..];

    Ok(Coordinates {
        lat: split_signed_dms(lat_field, 2)?,
        lng: split_signed_dms(lng_field, 3)?,
    })
}

/// Parses a complete `zone.tab` file's contents.
pub fn parse_zone_tab(contents: &str) -> Result<Vec<ZoneDescription>, Error> {
    let mut out = Vec::new();

    for line in contents.lines() {
        if line.trim_start().starts_with('#') || line.trim().is_empty() {
            continue;
        }

        let fields: Vec<&str> = line.splitn(4, '\t').collect();
        if fields.len() < 3 {
            return Err(Error::Semantic {
                zone: line.to_owned(),
                message: "zone.tab line has fewer than 3 fields".to_owned(),
            });
        }

        out.push(ZoneDescription {
            country_code: fields[0].to_owned(),
            coordinates: parse_coordinates(fields[1])?,
            zone_name: fields[2].to_owned(),
            comment: fields.get(3).map(|s| s.to_string()),
        });
    }

    Ok(out)
}

fn format_dms(value: (i32, i32, i32)) -> String {
    let (d, m, s) = value;
    let sign = if d < 0 { '-' } else { '+' };
    format!("{sign}{:02}{:02}{:02}", d.abs(), m, s)
}

/// Writes the `zones.tab` companion: one line per zone,
/// `±DDMMSS ±DDDMMSS name`, coordinates always expanded to full seconds
/// form even when the source omitted them.
pub fn write_zones_tab(zones: &[ZoneDescription], writer: &mut impl std::io::Write) -> Result<(), Error> {
    for zone in zones {
        writeln!(
            writer,
            "{} {} {}",
            format_dms(zone.coordinates.lat),
            format_dms(zone.coordinates.lng),
            zone.zone_name
        )?;
    }
    Ok(())
}

/// Writes the `zones.h` companion: one `N_("name");` line per zone, the
/// gettext-marker convention used so zone names can be pulled into a
/// translation catalogue.
pub fn write_zones_h(zones: &[ZoneDescription], writer: &mut impl std::io::Write) -> Result<(), Error> {
    for zone in zones {
        writeln!(writer, "N_(\"{}\");", zone.zone_name)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_seconds_and_no_seconds_coordinates() {
        let coords = parse_coordinates("+4043-07952").unwrap();
        assert_eq!(coords.lat, (40, 43, 0));
        assert_eq!(coords.lng, (-79, 52, 0));

        let coords = parse_coordinates("+425903+0132746").unwrap();
        assert_eq!(coords.lat, (42, 59, 3));
        assert_eq!(coords.lng, (13, 27, 46));
    }

    #[test]
    fn parses_full_zone_tab() {
        let zones = parse_zone_tab("# comment\nUS\t+404251-0740023\tAmerica/New_York\tEastern\n").unwrap();
        assert_eq!(zones.len(), 1);
        assert_eq!(zones[0].country_code, "US");
        assert_eq!(zones[0].zone_name, "America/New_York");
        assert_eq!(zones[0].comment.as_deref(), Some("Eastern"));
    }

    #[test]
    fn writes_expanded_zones_tab() {
        let zones = vec![ZoneDescription {
            country_code: "US".to_owned(),
            coordinates: Coordinates { lat: (40, 43, 0), lng: (-74, 0, 23) },
            zone_name: "America/New_York".to_owned(),
            comment: None,
        }];
        let mut buf = Vec::new();
        write_zones_tab(&zones, &mut buf).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "+404300 -0740023 America/New_York\n");
    }
}
