//! Conversions between numbers and text.

/// Parses text the way numeric coercion does.
///
/// Surrounding whitespace is ignored and empty text is zero. Accepts decimal
/// literals with an optional exponent, `0x`/`0o`/`0b` prefixed integers and
/// `Infinity`. Anything else is `NaN`.
pub fn parse(s: &str) -> f64 {
    let s = s.trim();
    if s.is_empty() {
        return 0.0;
    }
    match s {
        "Infinity" | "+Infinity" => return f64::INFINITY,
        "-Infinity" => return f64::NEG_INFINITY,
        _ => {}
    }
    for (prefix, radix) in [("0x", 16), ("0X", 16), ("0o", 8), ("0O", 8), ("0b", 2), ("0B", 2)] {
        if let Some(digits) = s.strip_prefix(prefix) {
            return match u64::from_str_radix(digits, radix) {
                Ok(n) => n as f64,
                Err(_) => f64::NAN,
            };
        }
    }
    if is_decimal(s) {
        s.parse().unwrap_or(f64::NAN)
    } else {
        f64::NAN
    }
}

/// Parses a literal token, returns `None` unless the whole token is numeric.
pub fn parse_literal(s: &str) -> Option<f64> {
    let n = parse(s);
    if n.is_nan() || s.trim().is_empty() {
        None
    } else {
        Some(n)
    }
}

fn is_decimal(s: &str) -> bool {
    let b = s.as_bytes();
    let mut i = 0;
    if matches!(b.first(), Some(b'+' | b'-')) {
        i += 1;
    }
    let int = digits(b, &mut i);
    let mut frac = 0;
    if b.get(i) == Some(&b'.') {
        i += 1;
        frac = digits(b, &mut i);
    }
    if int + frac == 0 {
        return false;
    }
    if matches!(b.get(i), Some(b'e' | b'E')) {
        i += 1;
        if matches!(b.get(i), Some(b'+' | b'-')) {
            i += 1;
        }
        if digits(b, &mut i) == 0 {
            return false;
        }
    }
    i == b.len()
}

fn digits(b: &[u8], i: &mut usize) -> usize {
    let start = *i;
    while b.get(*i).map_or(false, u8::is_ascii_digit) {
        *i += 1;
    }
    *i - start
}

/// Formats a number the way string coercion does.
pub fn to_string(n: f64) -> String {
    if n.is_nan() {
        return "NaN".into();
    }
    if n.is_infinite() {
        return if n > 0.0 { "Infinity" } else { "-Infinity" }.into();
    }
    if n == 0.0 {
        return "0".into();
    }
    if n.fract() == 0.0 && n.abs() < 1e21 {
        return format!("{:.0}", n);
    }
    let exp = format!("{:e}", n);
    let (mantissa, e) = match exp.split_once('e') {
        Some((m, e)) => (m, e.parse::<i32>().unwrap_or(0)),
        None => return exp,
    };
    if (-7..21).contains(&e) {
        format!("{}", n)
    } else if e > 0 {
        format!("{}e+{}", mantissa, e)
    } else {
        format!("{}e{}", mantissa, e)
    }
}

/// Returns the number as an integer if it is integral and exactly
/// representable.
pub fn as_integer(n: f64) -> Option<i64> {
    const MAX_SAFE: f64 = 9007199254740991.0;
    if n.fract() == 0.0 && n.abs() <= MAX_SAFE {
        Some(n as i64)
    } else {
        None
    }
}
