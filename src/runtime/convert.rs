//! Conversions between values and host types.

use crate::runtime::{
    error::{TypeError, TypeResult},
    value::{Kind, Value},
};

/// Numbers at or above this magnitude print in exponent form.
const PLAIN_INTEGER_LIMIT: f64 = 1e16;

/// Coerces to a number: numbers pass through, strings are parsed from their
/// longest numeric prefix, everything else (and unparsable text) is nil.
pub fn to_number(value: &Value) -> Value {
    if value.as_number().is_some() {
        return value.clone();
    }
    value
        .with_str(parse_number_prefix)
        .flatten()
        .map_or_else(Value::nil, Value::from)
}

/// Coerces to a host number type, failing when [`to_number`] yields nil.
pub fn to_number_as<T: FromNumber>(value: &Value) -> TypeResult<T> {
    to_number(value)
        .as_number()
        .map(T::from_number)
        .ok_or_else(|| TypeError::mismatch("convert to number", value.kind()))
}

/// Textual form as a string value: see [`Value`]'s `Display`.
pub fn to_string(value: &Value) -> Value {
    if value.kind() == Kind::String {
        return value.clone();
    }
    Value::from(value.to_string())
}

/// Renders one level of a table as `{ key = value, ... }`.
///
/// Strings are quoted; nested tables and functions show their identity tag.
/// Entry order follows the table and is not stable.
pub fn render_table(value: &Value) -> TypeResult<String> {
    let entries = value
        .entries()
        .map_err(|_| TypeError::mismatch("render", value.kind()))?;
    if entries.is_empty() {
        return Ok("{}".to_string());
    }
    let items: Vec<String> = entries
        .iter()
        .map(|(k, v)| format!("{} = {}", literal(k), literal(v)))
        .collect();
    Ok(format!("{{ {} }}", items.join(", ")))
}

fn literal(value: &Value) -> String {
    match value.with_str(|text| format!("\"{}\"", text)) {
        Some(quoted) => quoted,
        None => value.to_string(),
    }
}

/// Shortest text that parses back to the same `f64`.
pub(crate) fn format_number(n: f64) -> String {
    if n.is_nan() {
        "nan".to_string()
    } else if n.is_infinite() {
        let text = if n > 0.0 { "inf" } else { "-inf" };
        text.to_string()
    } else if n.fract() == 0.0 && n.abs() < PLAIN_INTEGER_LIMIT {
        format!("{}", n)
    } else {
        // `Debug` picks exponent notation for very large and small numbers.
        format!("{:?}", n)
    }
}

/// Parses the longest numeric prefix of `text`, ignoring leading whitespace.
///
/// Accepts an optional sign, decimal digits with an optional fraction and
/// exponent, and `inf` / `infinity` / `nan` in any case. A `0x` prefix reads
/// hexadecimal digits, an optional hex fraction and an optional binary
/// exponent (`0x1.8p3`). Parsing does not depend on the process locale.
pub(crate) fn parse_number_prefix(text: &str) -> Option<f64> {
    let s = text.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end = 1;
    }

    let rest = &s[end..];
    for word in ["infinity", "inf", "nan"] {
        if rest
            .get(..word.len())
            .is_some_and(|head| head.eq_ignore_ascii_case(word))
        {
            return s[..end + word.len()].parse().ok();
        }
    }

    if let Some(magnitude) = parse_hex(bytes, end) {
        return Some(if s.starts_with('-') { -magnitude } else { magnitude });
    }

    let digits_from = end;
    end = skip_digits(bytes, end);
    let mut mantissa_digits = end - digits_from;
    if bytes.get(end) == Some(&b'.') {
        let fraction_from = end + 1;
        end = skip_digits(bytes, fraction_from);
        mantissa_digits += end - fraction_from;
    }
    if mantissa_digits == 0 {
        return None;
    }

    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exp_end = end + 1;
        if matches!(bytes.get(exp_end), Some(b'+' | b'-')) {
            exp_end += 1;
        }
        let exp_digits_end = skip_digits(bytes, exp_end);
        if exp_digits_end > exp_end {
            end = exp_digits_end;
        }
    }

    s[..end].parse().ok()
}

/// Unsigned hex float starting at `at`. Without any hex digit after the
/// prefix this is `None`, and the caller reads the leading `0` as decimal.
fn parse_hex(bytes: &[u8], at: usize) -> Option<f64> {
    if bytes.get(at) != Some(&b'0') || !matches!(bytes.get(at + 1), Some(b'x' | b'X')) {
        return None;
    }

    let mut end = at + 2;
    let mut value = 0.0_f64;
    let mut scale = 0_i32;
    let mut digits = 0;
    while let Some(d) = bytes.get(end).and_then(|b| char::from(*b).to_digit(16)) {
        value = value * 16.0 + f64::from(d);
        digits += 1;
        end += 1;
    }
    if bytes.get(end) == Some(&b'.') {
        end += 1;
        while let Some(d) = bytes.get(end).and_then(|b| char::from(*b).to_digit(16)) {
            value = value * 16.0 + f64::from(d);
            scale = scale.saturating_sub(4);
            digits += 1;
            end += 1;
        }
    }
    if digits == 0 {
        return None;
    }

    if matches!(bytes.get(end), Some(b'p' | b'P')) {
        let mut exp_at = end + 1;
        let negative = bytes.get(exp_at) == Some(&b'-');
        if matches!(bytes.get(exp_at), Some(b'+' | b'-')) {
            exp_at += 1;
        }
        let mut exponent = 0_i32;
        let mut exp_digits = 0;
        while let Some(d) = bytes.get(exp_at).filter(|b| b.is_ascii_digit()) {
            exponent = exponent.saturating_mul(10).saturating_add(i32::from(d - b'0'));
            exp_digits += 1;
            exp_at += 1;
        }
        if exp_digits > 0 {
            scale = if negative {
                scale.saturating_sub(exponent)
            } else {
                scale.saturating_add(exponent)
            };
        }
    }

    Some(value * 2f64.powi(scale))
}

fn skip_digits(bytes: &[u8], mut at: usize) -> usize {
    while at < bytes.len() && bytes[at].is_ascii_digit() {
        at += 1;
    }
    at
}

/// Host number types a value can be coerced into.
///
/// Integer targets truncate toward zero and saturate at their bounds.
pub trait FromNumber {
    fn from_number(n: f64) -> Self;
}

macro_rules! from_number_cast {
    ($($ty:ty),*) => {
        $(
            impl FromNumber for $ty {
                fn from_number(n: f64) -> Self {
                    n as $ty
                }
            }
        )*
    };
}

from_number_cast!(f32, f64, i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

impl Value {
    pub fn to_number(&self) -> Value {
        to_number(self)
    }

    pub fn to_number_as<T: FromNumber>(&self) -> TypeResult<T> {
        to_number_as(self)
    }

    pub fn render_table(&self) -> TypeResult<String> {
        render_table(self)
    }
}
