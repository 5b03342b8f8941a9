//! Date formatting with .NET style format strings.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Timelike, Utc};

use crate::{Error, Result, Value};

const DAYS: [&str; 7] = [
    "Sunday",
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
];

const MONTHS: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// Formats a timestamp in UTC.
///
/// The timestamp is either a number of milliseconds since the Unix epoch or
/// a date string. A single character format is a standard format such as
/// `o` or `d`, anything longer is a custom format such as `yyyy-MM-dd`.
pub fn format_date(timestamp: &Value, format: &str) -> Result<String> {
    if format.is_empty() {
        return Ok(String::new());
    }
    let date = to_date(timestamp).ok_or_else(|| Error::msg("invalid date"))?;
    let mut chars = format.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => {
            let pattern = standard(c)
                .ok_or_else(|| Error::msg(format!("unknown standard date format `{c}`")))?;
            custom(&date, pattern)
        }
        _ => custom(&date, format),
    }
}

fn to_date(v: &Value) -> Option<DateTime<Utc>> {
    match v {
        Value::String(s) => parse(s.trim()),
        v => {
            let ms = v.to_number();
            if !ms.is_finite() {
                return None;
            }
            DateTime::<Utc>::from_timestamp_millis(ms.trunc() as i64)
        }
    }
}

fn parse(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(d) = DateTime::parse_from_rfc3339(s) {
        return Some(d.with_timezone(&Utc));
    }
    if let Ok(d) = DateTime::parse_from_rfc2822(s) {
        return Some(d.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(d) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(d.and_utc());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|d| d.and_utc())
}

/// Expands a standard format to its invariant culture pattern.
fn standard(c: char) -> Option<&'static str> {
    Some(match c {
        'd' => "MM/dd/yyyy",
        'D' => "dddd, dd MMMM yyyy",
        'f' => "dddd, dd MMMM yyyy HH:mm",
        'F' | 'U' => "dddd, dd MMMM yyyy HH:mm:ss",
        'g' => "MM/dd/yyyy HH:mm",
        'G' => "MM/dd/yyyy HH:mm:ss",
        'm' | 'M' => "MMMM dd",
        'o' | 'O' => "yyyy'-'MM'-'dd'T'HH':'mm':'ss'.'fffffffK",
        'r' | 'R' => "ddd, dd MMM yyyy HH':'mm':'ss 'GMT'",
        's' => "yyyy'-'MM'-'dd'T'HH':'mm':'ss",
        't' => "HH:mm",
        'T' => "HH:mm:ss",
        'u' => "yyyy'-'MM'-'dd HH':'mm':'ss'Z'",
        'y' | 'Y' => "yyyy MMMM",
        _ => return None,
    })
}

fn custom(date: &DateTime<Utc>, format: &str) -> Result<String> {
    let chars: Vec<char> = format.chars().collect();
    let mut buf = String::with_capacity(format.len() * 2);
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        let mut n = 1;
        while i + n < chars.len() && chars[i + n] == c {
            n += 1;
        }
        match c {
            'd' => match n {
                1 => buf.push_str(&date.day().to_string()),
                2 => buf.push_str(&format!("{:02}", date.day())),
                _ => {
                    let day = DAYS[date.weekday().num_days_from_sunday() as usize];
                    buf.push_str(if n == 3 { &day[..3] } else { day });
                }
            },
            'M' => match n {
                1 => buf.push_str(&date.month().to_string()),
                2 => buf.push_str(&format!("{:02}", date.month())),
                _ => {
                    let month = MONTHS[date.month0() as usize];
                    buf.push_str(if n == 3 { &month[..3] } else { month });
                }
            },
            'y' => {
                let year = date.year();
                match n {
                    1 => buf.push_str(&(year % 100).to_string()),
                    2 => buf.push_str(&format!("{:02}", year % 100)),
                    _ => buf.push_str(&format!("{year:0n$}")),
                }
            }
            'h' => {
                let hour = match date.hour() % 12 {
                    0 => 12,
                    h => h,
                };
                pad(&mut buf, hour, n);
            }
            'H' => pad(&mut buf, date.hour(), n),
            'm' => pad(&mut buf, date.minute(), n),
            's' => pad(&mut buf, date.second(), n),
            't' => {
                let marker = if date.hour() < 12 { "AM" } else { "PM" };
                buf.push_str(if n == 1 { &marker[..1] } else { marker });
            }
            'f' | 'F' => {
                if n > 7 {
                    return Err(Error::msg("invalid date format"));
                }
                let nanos = date.nanosecond() % 1_000_000_000;
                let digits = format!("{:0n$}", nanos / 10_u32.pow(9 - n as u32));
                if c == 'f' {
                    buf.push_str(&digits);
                } else {
                    let digits = digits.trim_end_matches('0');
                    if digits.is_empty() && buf.ends_with('.') {
                        buf.pop();
                    }
                    buf.push_str(digits);
                }
            }
            'g' => buf.push_str("A.D."),
            'K' => buf.push('Z'),
            'z' => buf.push_str(match n {
                1 => "+0",
                2 => "+00",
                _ => "+00:00",
            }),
            '\'' | '"' => {
                let close = chars[i + 1..]
                    .iter()
                    .position(|&q| q == c)
                    .ok_or_else(|| Error::msg("unterminated quote in date format"))?;
                buf.extend(&chars[i + 1..i + 1 + close]);
                i += close + 2;
                continue;
            }
            '\\' | '%' => {
                let Some(&next) = chars.get(i + 1) else {
                    return Err(Error::msg("invalid date format"));
                };
                if c == '\\' {
                    buf.push(next);
                    i += 2;
                } else {
                    // `%d` is the custom specifier `d` on its own.
                    let rest: String = chars[i + 1..i + 2].iter().collect();
                    buf.push_str(&custom(date, &rest)?);
                    i += 2;
                }
                continue;
            }
            _ => {
                for _ in 0..n {
                    buf.push(c);
                }
            }
        }
        i += n;
    }
    Ok(buf)
}

fn pad(buf: &mut String, n: u32, width: usize) {
    if width == 1 {
        buf.push_str(&n.to_string());
    } else {
        buf.push_str(&format!("{n:02}"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // 2024-03-05T14:07:09.120Z, a Tuesday
    const TS: f64 = 1_709_647_629_120.0;

    fn fmt(format: &str) -> String {
        format_date(&Value::from(TS), format).unwrap()
    }

    #[test]
    fn date_custom() {
        assert_eq!(fmt("yyyy-MM-dd HH:mm:ss"), "2024-03-05 14:07:09");
        assert_eq!(fmt("d/M/yy h:m tt"), "5/3/24 2:7 PM");
        assert_eq!(fmt("ddd dddd MMM MMMM"), "Tue Tuesday Mar March");
        assert_eq!(fmt("HH:mm:ss.fff"), "14:07:09.120");
        assert_eq!(fmt("ss.FFF"), "09.12");
        assert_eq!(fmt("'at' HH\\h"), "at 14h");
    }

    #[test]
    fn date_trims_empty_fraction() {
        let v = Value::from(1_709_647_629_000.0);
        assert_eq!(format_date(&v, "ss.FFF").unwrap(), "09");
    }

    #[test]
    fn date_standard() {
        assert_eq!(fmt("d"), "03/05/2024");
        assert_eq!(fmt("o"), "2024-03-05T14:07:09.1200000Z");
        assert_eq!(fmt("R"), "Tue, 05 Mar 2024 14:07:09 GMT");
        assert_eq!(fmt("%d"), "5");
        assert!(format_date(&Value::from(TS), "Q").is_err());
    }

    #[test]
    fn date_from_string() {
        let v = Value::from("2024-03-05T14:07:09Z");
        assert_eq!(format_date(&v, "s").unwrap(), "2024-03-05T14:07:09");
        let v = Value::from("2024-03-05");
        assert_eq!(format_date(&v, "yyyy/MM/dd HH:mm").unwrap(), "2024/03/05 00:00");
    }

    #[test]
    fn date_rejects_bad_input() {
        assert_eq!(format_date(&Value::from("soon"), "").unwrap(), "");
        assert!(format_date(&Value::from("soon"), "yyyy").is_err());
        assert!(format_date(&Value::from(f64::NAN), "yyyy").is_err());
        assert!(format_date(&Value::from(1e300), "yyyy").is_err());
    }
}
