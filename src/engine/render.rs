//! Python-literal rendering of result values
//!
//! Rows are printed as tuple literals (`(1,)`, `('a', None)`), the same
//! text for both engines.

use fancy_regex::Regex;
use std::fmt::Write;
use std::sync::LazyLock;

pub const NONE: &str = "None";

/// The Other and Separator categories, which `str.isprintable` rejects
static NON_PRINTABLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:\p{C}|\p{Z})$").expect("valid regex"));

fn is_printable(c: char) -> bool {
    if c == ' ' || c.is_ascii_graphic() {
        return true;
    }
    let mut buf = [0; 4];
    !NON_PRINTABLE
        .is_match(c.encode_utf8(&mut buf))
        .unwrap_or(false)
}

#[inline]
pub fn tuple(values: &[String]) -> String {
    match values {
        [single] => format!("({single},)"),
        _ => format!("({})", values.join(", ")),
    }
}

#[inline]
pub fn boolean(value: bool) -> String {
    if value { "True" } else { "False" }.to_string()
}

/// Shortest round-trip form with Python's exponent style (`1e+16`, `1e-05`)
#[inline]
pub fn float(value: f64) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf" } else { "-inf" }.to_string();
    }

    let repr = format!("{value:?}");
    match repr.split_once('e') {
        Some((mantissa, exponent)) => {
            let (sign, digits) = match exponent.strip_prefix('-') {
                Some(digits) => ('-', digits),
                None => ('+', exponent),
            };
            format!("{mantissa}e{sign}{digits:0>2}")
        }
        None => repr,
    }
}

/// Quoted string literal, preferring single quotes
#[inline]
pub fn text(value: &str) -> String {
    let quote = if value.contains('\'') && !value.contains('"') {
        '"'
    } else {
        '\''
    };

    let mut out = String::with_capacity(value.len() + 2);
    out.push(quote);
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c == quote => {
                out.push('\\');
                out.push(c);
            }
            c if !is_printable(c) => {
                let code = u32::from(c);
                let _ = if code < 0x100 {
                    write!(out, "\\x{code:02x}")
                } else if code < 0x1_0000 {
                    write!(out, "\\u{code:04x}")
                } else {
                    write!(out, "\\U{code:08x}")
                };
            }
            c => out.push(c),
        }
    }
    out.push(quote);
    out
}

/// Bytes literal: printable ASCII as is, everything else as `\xNN`
#[inline]
pub fn bytes(value: &[u8]) -> String {
    let quote = if value.contains(&b'\'') && !value.contains(&b'"') {
        b'"'
    } else {
        b'\''
    };

    let mut out = String::with_capacity(value.len() + 3);
    out.push('b');
    out.push(char::from(quote));
    for &byte in value {
        match byte {
            b'\\' => out.push_str("\\\\"),
            b'\n' => out.push_str("\\n"),
            b'\r' => out.push_str("\\r"),
            b'\t' => out.push_str("\\t"),
            b if b == quote => {
                out.push('\\');
                out.push(char::from(b));
            }
            0x20..=0x7e => out.push(char::from(byte)),
            _ => {
                let _ = write!(out, "\\x{byte:02x}");
            }
        }
    }
    out.push(char::from(quote));
    out
}

#[inline]
pub fn list<I>(items: I) -> String
where
    I: IntoIterator<Item = String>,
{
    format!("[{}]", items.into_iter().collect::<Vec<_>>().join(", "))
}

#[inline]
pub fn dict<I>(entries: I) -> String
where
    I: IntoIterator<Item = (String, String)>,
{
    let entries: Vec<String> = entries
        .into_iter()
        .map(|(key, value)| format!("{key}: {value}"))
        .collect();
    format!("{{{}}}", entries.join(", "))
}

#[inline]
pub fn decimal(value: impl std::fmt::Display) -> String {
    format!("Decimal('{value}')")
}

const MICROS_PER_SECOND: i64 = 1_000_000;
const MICROS_PER_DAY: i64 = 86_400 * MICROS_PER_SECOND;

/// Proleptic Gregorian (year, month, day) for days since 1970-01-01
fn civil_from_days(days: i64) -> (i64, i64, i64) {
    let z = days + 719_468;
    let era = z.div_euclid(146_097);
    let doe = z.rem_euclid(146_097);
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = doy - (153 * mp + 2) / 5 + 1;
    let month = if mp < 10 { mp + 3 } else { mp - 9 };
    let year = yoe + era * 400 + i64::from(month <= 2);
    (year, month, day)
}

/// Hour, minute, second and microsecond fields, trimmed the way
/// `datetime.time` prints them
fn clock_fields(micros_of_day: i64) -> String {
    let hour = micros_of_day / (3600 * MICROS_PER_SECOND);
    let minute = micros_of_day / (60 * MICROS_PER_SECOND) % 60;
    let second = micros_of_day / MICROS_PER_SECOND % 60;
    let micro = micros_of_day % MICROS_PER_SECOND;

    let mut out = format!("{hour}, {minute}");
    if second != 0 || micro != 0 {
        let _ = write!(out, ", {second}");
    }
    if micro != 0 {
        let _ = write!(out, ", {micro}");
    }
    out
}

#[inline]
pub fn date(days_since_epoch: i64) -> String {
    let (year, month, day) = civil_from_days(days_since_epoch);
    format!("datetime.date({year}, {month}, {day})")
}

#[inline]
pub fn datetime(micros_since_epoch: i64) -> String {
    let days = micros_since_epoch.div_euclid(MICROS_PER_DAY);
    let (year, month, day) = civil_from_days(days);
    let clock = clock_fields(micros_since_epoch.rem_euclid(MICROS_PER_DAY));
    format!("datetime.datetime({year}, {month}, {day}, {clock})")
}

#[inline]
pub fn time(micros_of_day: i64) -> String {
    format!(
        "datetime.time({})",
        clock_fields(micros_of_day.rem_euclid(MICROS_PER_DAY))
    )
}

/// `datetime.timedelta` with days, seconds and microseconds normalized
#[inline]
pub fn timedelta(days: i64, micros: i64) -> String {
    let days = days.saturating_add(micros.div_euclid(MICROS_PER_DAY));
    let rest = micros.rem_euclid(MICROS_PER_DAY);
    let seconds = rest / MICROS_PER_SECOND;
    let micros = rest % MICROS_PER_SECOND;

    let mut fields = Vec::new();
    if days != 0 {
        fields.push(format!("days={days}"));
    }
    if seconds != 0 {
        fields.push(format!("seconds={seconds}"));
    }
    if micros != 0 {
        fields.push(format!("microseconds={micros}"));
    }
    if fields.is_empty() {
        fields.push("0".to_string());
    }
    format!("datetime.timedelta({})", fields.join(", "))
}
