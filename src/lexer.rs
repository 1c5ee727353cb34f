//! Stripping comments from a single line of zoneinfo source text.
//!
//! This is the first stage of the pipeline: it knows nothing about `Zone`,
//! `Rule`, or `Link` records, only about comments and quoting. The
//! [`line`](crate::line) module runs its classification regexes against
//! the *comment-stripped* text this module produces.

use std::fmt;

#[derive(PartialEq, Eq, Debug, Clone)]
pub enum Error {
    UnterminatedQuote,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::UnterminatedQuote => write!(f, "unterminated quoted field"),
        }
    }
}

impl std::error::Error for Error {}

/// Strips a trailing, unquoted `#...` comment from a line, leaving the
/// whitespace layout of the remaining fields untouched. Used to feed the
/// field-classifying regexes in [`line`](crate::line) a comment-free line
/// while still validating quote balance up front.
pub fn strip_comment(line: &str) -> Result<String, Error> {
    let mut out = String::with_capacity(line.len());
    let mut in_quotes = false;

    for c in line.chars() {
        match c {
            '"' => {
                in_quotes = !in_quotes;
                out.push(c);
            }
            '#' if !in_quotes => break,
            c => out.push(c),
        }
    }

    if in_quotes {
        return Err(Error::UnterminatedQuote);
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_trailing_comment() {
        assert_eq!(
            strip_comment("Zone Europe/London 0:00 # historical note").unwrap(),
            "Zone Europe/London 0:00 "
        );
    }

    #[test]
    fn leaves_quoted_hash_alone() {
        assert_eq!(
            strip_comment(r#"Link Europe/London "Not #1, really""#).unwrap(),
            r#"Link Europe/London "Not #1, really""#
        );
    }

    #[test]
    fn unterminated_quote_is_an_error() {
        assert_eq!(strip_comment(r#"Zone "Europe/London 0:00"#), Err(Error::UnterminatedQuote));
    }
}
