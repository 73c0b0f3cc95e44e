//! Scalar value parsers and their formatting companions
//!
//! These take the raw value string of a key/value item and produce the
//! typed value, or a [`ValueError`] that the extraction layer wraps with
//! the parameter's site. The multi-fragment grammars (sizes, durations)
//! use winnow; single-token grammars use plain parsing.

use compact_str::CompactString;
use policykoll_types::FileType;
use std::fmt::Write as _;
use std::str::FromStr;
use winnow::ModalResult;
use winnow::Parser;
use winnow::ascii::digit1;
use winnow::ascii::space0;
use winnow::combinator::alt;
use winnow::combinator::opt;
use winnow::combinator::repeat;
use winnow::token::any;
use winnow::token::take_while;

/// Error parsing a scalar value
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum ValueError {
    #[error("integer expected")]
    IntExpected,
    #[error("extra characters '{0}' found after number")]
    TrailingChars(CompactString),
    #[error("invalid suffix '{0}': only 'k', 'M', 'G' or 'T' are allowed")]
    BadSuffix(CompactString),
    #[error("value out of range")]
    OutOfRange,
    #[error("size expected (e.g. 10MB)")]
    SizeExpected,
    #[error("duration expected (e.g. 10s)")]
    DurationExpected,
    #[error("float expected")]
    FloatExpected,
    #[error("boolean expected (0, 1, true, false, yes, no, enabled, disabled)")]
    BoolExpected,
    #[error("file, directory, symlink, chr, blk, fifo or sock expected")]
    TypeExpected,
}

/// Parse a signed 32-bit integer. Trailing non-whitespace is an error.
pub fn parse_int(input: &str) -> Result<i32, ValueError> {
    let s = input.trim();
    let end = s
        .char_indices()
        .find(|&(i, c)| !(c.is_ascii_digit() || (i == 0 && (c == '+' || c == '-'))))
        .map_or(s.len(), |(i, _)| i);
    let (number, rest) = s.split_at(end);
    let value: i32 = number.parse().map_err(|_| ValueError::IntExpected)?;
    let rest = rest.trim_start();
    if !rest.is_empty() {
        return Err(ValueError::TrailingChars(rest.into()));
    }
    Ok(value)
}

/// Parse an unsigned 64-bit integer with an optional one-letter decimal SI
/// suffix (`k`, `M`, `G`, `T`, case-insensitive).
pub fn parse_int64(input: &str) -> Result<u64, ValueError> {
    let s = input.trim();
    let end = s
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(s.len());
    let (number, rest) = s.split_at(end);
    let value: u64 = number.parse().map_err(|_| ValueError::IntExpected)?;
    let rest = rest.trim();
    let multiplier = match rest {
        "" => 1,
        r if r.eq_ignore_ascii_case("k") => 1_000,
        r if r.eq_ignore_ascii_case("m") => 1_000_000,
        r if r.eq_ignore_ascii_case("g") => 1_000_000_000,
        r if r.eq_ignore_ascii_case("t") => 1_000_000_000_000,
        r => return Err(ValueError::BadSuffix(r.into())),
    };
    value.checked_mul(multiplier).ok_or(ValueError::OutOfRange)
}

/// Parse a size in bytes: digits plus an optional binary unit
/// (`B`, `KB`/`KiB`, `MB`/`MiB`, ... `EB`/`EiB`, case-insensitive).
pub fn parse_size(input: &str) -> Result<u64, ValueError> {
    size.parse(input.trim())
        .map_err(|_| ValueError::SizeExpected)
}

fn size(i: &mut &str) -> ModalResult<u64> {
    (
        digit1.try_map(str::parse::<u64>),
        space0,
        opt(size_unit).map(|m| m.unwrap_or(1)),
    )
        .verify_map(|(value, _, multiplier)| value.checked_mul(multiplier))
        .parse_next(i)
}

fn size_unit(i: &mut &str) -> ModalResult<u64> {
    take_while(1.., |c: char| c.is_ascii_alphabetic())
        .verify_map(unit_multiplier)
        .parse_next(i)
}

fn unit_multiplier(unit: &str) -> Option<u64> {
    let units = [
        ("b", None, 0u32),
        ("kb", Some("kib"), 1),
        ("mb", Some("mib"), 2),
        ("gb", Some("gib"), 3),
        ("tb", Some("tib"), 4),
        ("pb", Some("pib"), 5),
        ("eb", Some("eib"), 6),
    ];
    units
        .iter()
        .find(|(short, long, _)| {
            unit.eq_ignore_ascii_case(short)
                || long.is_some_and(|l| unit.eq_ignore_ascii_case(l))
        })
        .map(|&(_, _, exponent)| 1024u64.pow(exponent))
}

/// Parse a duration in seconds: either a bare integer (seconds) or a
/// sequence of `<n><unit>` fragments with units `s m h d w y`.
pub fn parse_duration(input: &str) -> Result<u64, ValueError> {
    duration.parse(input.trim())
        .map_err(|_| ValueError::DurationExpected)
}

fn duration(i: &mut &str) -> ModalResult<u64> {
    alt((
        repeat(1.., duration_fragment).verify_map(|parts: Vec<u64>| {
            parts.into_iter().try_fold(0u64, u64::checked_add)
        }),
        digit1.try_map(str::parse::<u64>),
    ))
    .parse_next(i)
}

fn duration_fragment(i: &mut &str) -> ModalResult<u64> {
    (digit1.try_map(str::parse::<u64>), duration_unit)
        .verify_map(|(value, unit)| value.checked_mul(unit))
        .parse_next(i)
}

fn duration_unit(i: &mut &str) -> ModalResult<u64> {
    any.verify_map(|c: char| match c.to_ascii_lowercase() {
        's' => Some(1),
        'm' => Some(60),
        'h' => Some(3600),
        'd' => Some(86_400),
        'w' => Some(604_800),
        'y' => Some(31_536_000),
        _ => None,
    })
    .parse_next(i)
}

/// Parse a float; with `allow_pct`, a single trailing `%` is accepted and
/// stripped.
pub fn parse_float(input: &str, allow_pct: bool) -> Result<f64, ValueError> {
    let mut s = input.trim();
    if allow_pct {
        if let Some(stripped) = s.strip_suffix('%') {
            s = stripped.trim_end();
        }
    }
    s.parse().map_err(|_| ValueError::FloatExpected)
}

/// Parse a boolean token (case-insensitive)
pub fn parse_bool(input: &str) -> Result<bool, ValueError> {
    let s = input.trim();
    if ["true", "yes", "enabled", "1"]
        .iter()
        .any(|t| s.eq_ignore_ascii_case(t))
    {
        Ok(true)
    } else if ["false", "no", "disabled", "0"]
        .iter()
        .any(|t| s.eq_ignore_ascii_case(t))
    {
        Ok(false)
    } else {
        Err(ValueError::BoolExpected)
    }
}

/// Parse a file type token (case-insensitive)
pub fn parse_file_type(input: &str) -> Result<FileType, ValueError> {
    FileType::from_str(input.trim()).map_err(|_| ValueError::TypeExpected)
}

/// Format a byte count the way policies print it: plain below 1 KiB, else
/// two decimals with a binary unit (`10.00 MB`).
#[must_use]
pub fn format_size(size: u64) -> String {
    if size < 1024 {
        return size.to_string();
    }
    let mut value = size as f64;
    let mut unit = "KB";
    for next in ["KB", "MB", "GB", "TB", "PB", "EB"] {
        unit = next;
        value /= 1024.0;
        if value < 1024.0 {
            break;
        }
    }
    format!("{value:.2} {unit}")
}

/// Format a duration as concatenated `d/h/m/s` fragments (`2d3h`)
#[must_use]
pub fn format_duration(seconds: u64) -> String {
    if seconds == 0 {
        return "0s".to_owned();
    }
    let mut out = String::new();
    let mut rest = seconds;
    for (step, label) in [(86_400, 'd'), (3600, 'h'), (60, 'm'), (1, 's')] {
        let count = rest / step;
        rest %= step;
        if count > 0 {
            let _ = write!(out, "{count}{label}");
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_int() {
        assert_eq!(parse_int("42"), Ok(42));
        assert_eq!(parse_int(" -7 "), Ok(-7));
        assert_eq!(parse_int("+3"), Ok(3));
        assert_eq!(
            parse_int("12 oz"),
            Err(ValueError::TrailingChars("oz".into()))
        );
        assert_eq!(parse_int("twelve"), Err(ValueError::IntExpected));
        assert_eq!(parse_int(""), Err(ValueError::IntExpected));
    }

    #[test]
    fn test_parse_int64_suffixes() {
        assert_eq!(parse_int64("2M"), Ok(2_000_000));
        assert_eq!(parse_int64("2m"), Ok(2_000_000));
        assert_eq!(parse_int64("10k"), Ok(10_000));
        assert_eq!(parse_int64("3T"), Ok(3_000_000_000_000));
        assert_eq!(parse_int64("17"), Ok(17));
        assert_eq!(parse_int64("5X"), Err(ValueError::BadSuffix("X".into())));
        assert_eq!(parse_int64("-5"), Err(ValueError::IntExpected));
    }

    #[test]
    fn test_parse_size() {
        assert_eq!(parse_size("0"), Ok(0));
        assert_eq!(parse_size("512"), Ok(512));
        assert_eq!(parse_size("512B"), Ok(512));
        assert_eq!(parse_size("2MB"), Ok(2 * 1024 * 1024));
        assert_eq!(parse_size("2 MB"), Ok(2 * 1024 * 1024));
        assert_eq!(parse_size("2MiB"), Ok(2 * 1024 * 1024));
        assert_eq!(parse_size("1gb"), Ok(1024 * 1024 * 1024));
        assert_eq!(parse_size("1TB"), Ok(1024u64.pow(4)));
        assert_eq!(parse_size("10 potatoes"), Err(ValueError::SizeExpected));
        assert_eq!(parse_size("MB"), Err(ValueError::SizeExpected));
        assert_eq!(parse_size(""), Err(ValueError::SizeExpected));
    }

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("90"), Ok(90));
        assert_eq!(parse_duration("10s"), Ok(10));
        assert_eq!(parse_duration("2h30m"), Ok(2 * 3600 + 30 * 60));
        assert_eq!(parse_duration("1w"), Ok(604_800));
        assert_eq!(parse_duration("1y1d"), Ok(31_536_000 + 86_400));
        assert_eq!(parse_duration("1h30"), Err(ValueError::DurationExpected));
        assert_eq!(parse_duration("h"), Err(ValueError::DurationExpected));
        assert_eq!(parse_duration(""), Err(ValueError::DurationExpected));
    }

    #[test]
    fn test_parse_float() {
        assert_eq!(parse_float("1.5", false), Ok(1.5));
        assert_eq!(parse_float("80%", true), Ok(80.0));
        assert_eq!(parse_float("80 %", true), Ok(80.0));
        assert_eq!(parse_float("80%", false), Err(ValueError::FloatExpected));
        assert_eq!(parse_float("abc", true), Err(ValueError::FloatExpected));
    }

    #[test]
    fn test_parse_bool() {
        for token in ["true", "YES", "Enabled", "1"] {
            assert_eq!(parse_bool(token), Ok(true), "{token}");
        }
        for token in ["false", "No", "DISABLED", "0"] {
            assert_eq!(parse_bool(token), Ok(false), "{token}");
        }
        assert_eq!(parse_bool("maybe"), Err(ValueError::BoolExpected));
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(512), "512");
        assert_eq!(format_size(2 * 1024 * 1024), "2.00 MB");
        assert_eq!(format_size(10 * 1024 * 1024), "10.00 MB");
        assert_eq!(format_size(1536), "1.50 KB");
        assert_eq!(format_size(1024u64.pow(4)), "1.00 TB");
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(0), "0s");
        assert_eq!(format_duration(10), "10s");
        assert_eq!(format_duration(2 * 86_400 + 3 * 3600), "2d3h");
        assert_eq!(format_duration(90), "1m30s");
    }
}
