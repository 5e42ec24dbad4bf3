//! Classification and rendering of leaf values.
//!
//! [`classify`] walks the value kinds in dispatch order. The order only
//! changes the outcome for objects, which are checked for an error shape
//! before being treated as generic objects, but it is kept explicit so the
//! precedence reads the same everywhere.

use alloc::{
    format,
    string::{String, ToString},
};
use core::fmt::Write;

use chrono::{DateTime, Datelike};

use crate::{
    escape::quote,
    fault::Fault,
    value::{ErrorValue, Object, Value},
};

/// The largest distance from the epoch a date may have, in milliseconds.
const MAX_DATE_MILLIS: i64 = 8_640_000_000_000_000;

/// The length of one 400-year Gregorian cycle, in milliseconds.
const CYCLE_MILLIS: i64 = 146_097 * 86_400_000;

/// The closed set of value kinds, in dispatch order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    /// Text.
    Text,
    /// An arbitrary precision integer.
    ArbitraryInteger,
    /// A boolean.
    Boolean,
    /// A double precision number.
    Number,
    /// A regular expression.
    Pattern,
    /// A function.
    Function,
    /// The null value.
    Null,
    /// A unique token.
    OpaqueToken,
    /// The global execution context.
    Global,
    /// A native error, or an object with text `name` and `message`.
    ErrorLike,
    /// A point in time.
    Date,
    /// A deferred result.
    DeferredResult,
    /// An array.
    Array,
    /// Any other object.
    GenericObject,
    /// Everything else, such as `undefined` or a host object.
    Other,
}

impl Kind {
    /// Returns `true` for the kinds the serializer recurses into.
    #[must_use]
    pub fn is_composite(self) -> bool {
        matches!(self, Self::Array | Self::GenericObject)
    }
}

/// Classifies a value.
///
/// Fails only when probing an object for an error shape runs an accessor
/// that fails.
///
/// ```
/// use diagnote::{Kind, Value, classify};
///
/// let error_like = Value::object([("name", "TypeError"), ("message", "bad")]);
/// assert_eq!(classify(&error_like), Ok(Kind::ErrorLike));
/// assert_eq!(classify(&Value::object([("name", "x")])), Ok(Kind::GenericObject));
/// ```
pub fn classify(value: &Value) -> Result<Kind, Fault> {
    Ok(match value {
        Value::Text(_) => Kind::Text,
        Value::BigInt(_) => Kind::ArbitraryInteger,
        Value::Bool(_) => Kind::Boolean,
        Value::Number(_) => Kind::Number,
        Value::Pattern(_) => Kind::Pattern,
        Value::Function(_) => Kind::Function,
        Value::Null => Kind::Null,
        Value::Symbol(_) => Kind::OpaqueToken,
        Value::Global => Kind::Global,
        Value::Error(_) => Kind::ErrorLike,
        Value::Date(_) => Kind::Date,
        Value::Promise => Kind::DeferredResult,
        Value::Array(_) => Kind::Array,
        Value::Object(object) => match error_shape(object)? {
            Some(_) => Kind::ErrorLike,
            None => Kind::GenericObject,
        },
        Value::Undefined | Value::Host(_) => Kind::Other,
    })
}

/// Reads `name` and `message` from an object, returning them if both are
/// text. `message` is only read once `name` has been found to be text.
pub(crate) fn error_shape(object: &Object) -> Result<Option<ErrorValue>, Fault> {
    let Value::Text(name) = object.get("name")? else {
        return Ok(None);
    };
    let Value::Text(message) = object.get("message")? else {
        return Ok(None);
    };
    Ok(Some(ErrorValue { name, message }))
}

pub(crate) fn render_error(error: &ErrorValue) -> String {
    format!("[{error}]")
}

/// Renders any value that is neither an array nor an object.
pub(crate) fn render_scalar(value: &Value) -> Result<String, Fault> {
    Ok(match value {
        Value::Text(text) => quote(text),
        Value::BigInt(big) => format!("{big}n"),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => number_text(*n),
        Value::Pattern(pattern) => {
            let source = if pattern.source.is_empty() {
                "(?:)"
            } else {
                &pattern.source
            };
            format!("/{source}/{}", pattern.flags)
        }
        Value::Function(source) => source.clone(),
        Value::Null => String::from("null"),
        Value::Symbol(description) => {
            format!("Symbol({})", description.as_deref().unwrap_or_default())
        }
        Value::Global => String::from("[Global]"),
        Value::Error(error) => render_error(error),
        Value::Date(millis) => date_text(*millis)?,
        Value::Promise => String::from("[Promise]"),
        Value::Undefined => String::from("undefined"),
        Value::Host(host) => host.to_string(),
        Value::Array(_) => String::from("[Array]"),
        Value::Object(_) => String::from("{Object}"),
    })
}

/// Formats a date as ISO-8601 with millisecond precision.
///
/// Years outside `0..=9999` use the signed six-digit extended form
/// (`+010000`, `-000001`). The timestamp is folded into the first 400-year
/// cycle after the epoch before handing it to chrono, so the whole date
/// range is covered even where chrono's own calendar ends.
fn date_text(millis: i64) -> Result<String, Fault> {
    if !(-MAX_DATE_MILLIS..=MAX_DATE_MILLIS).contains(&millis) {
        return Err(Fault::InvalidDate { millis });
    }
    let cycles = millis.div_euclid(CYCLE_MILLIS);
    let date = DateTime::from_timestamp_millis(millis.rem_euclid(CYCLE_MILLIS))
        .ok_or(Fault::InvalidDate { millis })?;
    let year = i64::from(date.year()) + 400 * cycles;

    let mut out = String::with_capacity(27);
    let written = if (0..=9999).contains(&year) {
        write!(out, "{year:04}")
    } else {
        let sign = if year < 0 { '-' } else { '+' };
        write!(out, "{sign}{:06}", year.unsigned_abs())
    };
    written
        .and_then(|()| write!(out, "{}", date.format("-%m-%dT%H:%M:%S%.3fZ")))
        .map_err(|_| Fault::InvalidDate { millis })?;
    Ok(out)
}

/// Formats a number the way ECMAScript's Number-to-String does: shortest
/// round-trip digits, plain notation for decimal exponents in `-7..21`,
/// exponential notation otherwise.
pub(crate) fn number_text(n: f64) -> String {
    if n.is_nan() {
        return String::from("NaN");
    }
    if n == 0.0 {
        return String::from("0");
    }
    if n.is_infinite() {
        return String::from(if n > 0.0 { "Infinity" } else { "-Infinity" });
    }

    let scientific = format!("{:e}", n.abs());
    let Some((mantissa, exponent)) = scientific.split_once('e') else {
        return format!("{n}");
    };
    let Ok(exponent) = exponent.parse::<i32>() else {
        return format!("{n}");
    };
    let digits: String = mantissa.chars().filter(|c| *c != '.').collect();
    let k = i32::try_from(digits.len()).unwrap_or(i32::MAX);
    let point = exponent + 1;

    let mut out = String::with_capacity(digits.len() + 8);
    if n < 0.0 {
        out.push('-');
    }
    if k <= point && point <= 21 {
        out.push_str(&digits);
        out.extend(core::iter::repeat_n('0', usize::try_from(point - k).unwrap_or(0)));
    } else if 0 < point && point <= 21 {
        let (integral, fractional) = digits.split_at(usize::try_from(point).unwrap_or(0));
        out.push_str(integral);
        out.push('.');
        out.push_str(fractional);
    } else if -6 < point && point <= 0 {
        out.push_str("0.");
        out.extend(core::iter::repeat_n('0', usize::try_from(-point).unwrap_or(0)));
        out.push_str(&digits);
    } else {
        let (first, rest) = digits.split_at(1);
        out.push_str(first);
        if !rest.is_empty() {
            out.push('.');
            out.push_str(rest);
        }
        let exponent = point - 1;
        out.push('e');
        out.push(if exponent >= 0 { '+' } else { '-' });
        out.push_str(&exponent.unsigned_abs().to_string());
    }
    out
}
