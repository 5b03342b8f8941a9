//! A `printf` style formatter over values.

use crate::value::number;
use crate::Value;

/// The largest field width or precision honored.
const MAX_FIELD: usize = 1024;

/// A parsed conversion, e.g. `%-08.3f`.
#[derive(Debug, Default, PartialEq)]
struct Spec {
    left: bool,
    plus: bool,
    space: bool,
    zero: bool,
    alt: bool,
    group: bool,
    width: usize,
    precision: Option<usize>,
    conv: char,
}

/// Formats `args` according to `format`.
///
/// Each conversion consumes the next argument, a conversion without an
/// argument writes nothing. A `%` that does not start a valid conversion is
/// written as is.
pub fn sprintf(format: &str, args: &[Value]) -> String {
    let mut buf = String::with_capacity(format.len());
    let mut args = args.iter();
    let mut rest = format;
    while let Some(i) = rest.find('%') {
        buf.push_str(&rest[..i]);
        rest = &rest[i + 1..];
        match parse_spec(rest) {
            Some((spec, n)) => {
                rest = &rest[n..];
                if spec.conv == '%' {
                    buf.push('%');
                } else if let Some(arg) = args.next() {
                    buf.push_str(&format_one(&spec, arg));
                }
            }
            None => buf.push('%'),
        }
    }
    buf.push_str(rest);
    buf
}

/// Parses a conversion following a `%`, returning it along with the number
/// of bytes it spans.
fn parse_spec(s: &str) -> Option<(Spec, usize)> {
    let b = s.as_bytes();
    let mut spec = Spec::default();
    let mut i = 0;
    while let Some(c) = b.get(i) {
        match c {
            b'-' => spec.left = true,
            b'+' => spec.plus = true,
            b' ' => spec.space = true,
            b'0' => spec.zero = true,
            b'#' => spec.alt = true,
            b'\'' => spec.group = true,
            _ => break,
        }
        i += 1;
    }
    let start = i;
    while b.get(i).map_or(false, u8::is_ascii_digit) {
        i += 1;
    }
    if i > start {
        spec.width = field(&s[start..i]);
    }
    if b.get(i) == Some(&b'.') {
        i += 1;
        let start = i;
        while b.get(i).map_or(false, u8::is_ascii_digit) {
            i += 1;
        }
        spec.precision = Some(if i > start { field(&s[start..i]) } else { 0 });
    }
    if matches!(b.get(i), Some(b'h' | b'l')) {
        i += 1;
    }
    match b.get(i) {
        Some(&c) if b"diucsfFeEgGxXob%".contains(&c) => {
            spec.conv = char::from(c);
            Some((spec, i + 1))
        }
        _ => None,
    }
}

/// Parses a width or precision, clamped to [`MAX_FIELD`].
fn field(digits: &str) -> usize {
    digits.parse().map_or(MAX_FIELD, |n: usize| n.min(MAX_FIELD))
}

fn format_one(spec: &Spec, value: &Value) -> String {
    match spec.conv {
        's' => {
            let text = value.as_text();
            let text = match spec.precision {
                Some(p) => text.chars().take(p).collect(),
                None => text.into_owned(),
            };
            pad(spec, "", "", &text, false)
        }
        'c' => {
            let c = match value {
                Value::String(s) => s.chars().next(),
                v => char::from_u32(v.to_number_or_zero() as u32),
            };
            pad(spec, "", "", &c.map(String::from).unwrap_or_default(), false)
        }
        conv => {
            let n = value.to_number();
            if !n.is_finite() {
                let text = number::to_string(n);
                let (sign, text) = match text.strip_prefix('-') {
                    Some(t) => ("-", t.to_owned()),
                    None => (sign(spec, false), text),
                };
                return pad(spec, sign, "", &text, false);
            }
            match conv {
                'd' | 'i' => {
                    let t = n.trunc();
                    let mut digits = min_digits(format!("{:.0}", t.abs()), spec.precision);
                    if spec.group {
                        digits = group(&digits);
                    }
                    pad(spec, sign(spec, t < 0.0), "", &digits, true)
                }
                'u' | 'x' | 'X' | 'o' | 'b' => {
                    let u = n.trunc() as i64 as u64;
                    let (digits, prefix) = match conv {
                        'u' => (u.to_string(), ""),
                        'x' => (format!("{u:x}"), "0x"),
                        'X' => (format!("{u:X}"), "0X"),
                        'o' => (format!("{u:o}"), "0"),
                        _ => (format!("{u:b}"), "0b"),
                    };
                    let prefix = if spec.alt && u != 0 { prefix } else { "" };
                    let mut digits = min_digits(digits, spec.precision);
                    if spec.group && conv == 'u' {
                        digits = group(&digits);
                    }
                    pad(spec, "", prefix, &digits, true)
                }
                'f' | 'F' => {
                    let p = spec.precision.unwrap_or(6);
                    let mut digits = format!("{:.*}", p, n.abs());
                    if spec.alt && p == 0 {
                        digits.push('.');
                    }
                    if spec.group {
                        digits = group(&digits);
                    }
                    pad(spec, sign(spec, n.is_sign_negative() && n != 0.0), "", &digits, true)
                }
                'e' | 'E' => {
                    let digits = exponential(n.abs(), spec.precision.unwrap_or(6), spec.alt);
                    let digits = if conv == 'E' { digits.to_uppercase() } else { digits };
                    pad(spec, sign(spec, n < 0.0), "", &digits, true)
                }
                _ => {
                    let digits = general(n.abs(), spec.precision.unwrap_or(6), spec.alt);
                    let digits = if conv == 'G' { digits.to_uppercase() } else { digits };
                    pad(spec, sign(spec, n < 0.0), "", &digits, true)
                }
            }
        }
    }
}

fn sign(spec: &Spec, negative: bool) -> &'static str {
    if negative {
        "-"
    } else if spec.plus {
        "+"
    } else if spec.space {
        " "
    } else {
        ""
    }
}

/// Pads the parts to the field width, zeros go between the prefix and the
/// digits.
fn pad(spec: &Spec, sign: &str, prefix: &str, digits: &str, numeric: bool) -> String {
    let len = sign.len() + prefix.len() + digits.chars().count();
    let fill = spec.width.saturating_sub(len);
    let mut s = String::with_capacity(len + fill);
    if spec.left {
        s.push_str(sign);
        s.push_str(prefix);
        s.push_str(digits);
        s.extend(std::iter::repeat(' ').take(fill));
    } else if spec.zero && numeric {
        s.push_str(sign);
        s.push_str(prefix);
        s.extend(std::iter::repeat('0').take(fill));
        s.push_str(digits);
    } else {
        s.extend(std::iter::repeat(' ').take(fill));
        s.push_str(sign);
        s.push_str(prefix);
        s.push_str(digits);
    }
    s
}

fn min_digits(digits: String, precision: Option<usize>) -> String {
    match precision {
        Some(p) if p > digits.len() => format!("{}{}", "0".repeat(p - digits.len()), digits),
        _ => digits,
    }
}

/// Inserts a comma between each group of three integer digits.
fn group(digits: &str) -> String {
    let (int, frac) = match digits.find('.') {
        Some(i) => digits.split_at(i),
        None => (digits, ""),
    };
    let mut s = String::with_capacity(digits.len() + int.len() / 3);
    for (i, c) in int.chars().enumerate() {
        if i > 0 && (int.len() - i) % 3 == 0 {
            s.push(',');
        }
        s.push(c);
    }
    s.push_str(frac);
    s
}

/// Formats as `d.ddde+xx` with at least two exponent digits.
fn exponential(n: f64, precision: usize, alt: bool) -> String {
    let s = format!("{:.*e}", precision, n);
    let Some((mantissa, exp)) = s.split_once('e') else {
        return s;
    };
    let exp: i32 = exp.parse().unwrap_or(0);
    let dot = if alt && precision == 0 { "." } else { "" };
    let sign = if exp < 0 { '-' } else { '+' };
    format!("{mantissa}{dot}e{sign}{:02}", exp.abs())
}

/// Uses the shorter of fixed and exponential notation for the number of
/// significant digits, dropping trailing zeros unless `alt` is set.
fn general(n: f64, precision: usize, alt: bool) -> String {
    let p = precision.max(1);
    let exp = if n == 0.0 {
        0
    } else {
        let s = format!("{:.*e}", p - 1, n);
        s.split_once('e')
            .and_then(|(_, e)| e.parse::<i64>().ok())
            .unwrap_or(0)
    };
    let p = p as i64;
    if exp < p && exp >= -4 {
        let s = format!("{:.*}", (p - 1 - exp) as usize, n);
        if alt {
            s
        } else {
            strip_zeros(&s).to_owned()
        }
    } else {
        let s = exponential(n, (p - 1) as usize, alt);
        if alt {
            return s;
        }
        match s.split_once('e') {
            Some((mantissa, exp)) => format!("{}e{}", strip_zeros(mantissa), exp),
            None => s,
        }
    }
}

fn strip_zeros(s: &str) -> &str {
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.')
    } else {
        s
    }
}
