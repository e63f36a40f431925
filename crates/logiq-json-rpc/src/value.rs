//! Runtime-typed value model
//!
//! Wire JSON is held as [`JsonValue`], an insertion-ordered `serde_json::Value`.
//! Native values are held as [`NativeValue`]. [`classify`] picks the native shape
//! a wire value maps to and [`convert`] produces it; [`ToWireValue`] goes the
//! other way.
//!
//! Encoding is lossy in exactly one place: non-finite floats become `null`, so
//! the output is always well-formed JSON.

use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Serialize, Serializer};
use serde_json::ser::PrettyFormatter;
use serde_json::{Number, Value};

use crate::error::MessageResult;

/// Wire-side JSON value. Objects keep insertion order.
pub type JsonValue = Value;

/// Native type a wire value can be converted to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetType {
    /// Text
    String,
    /// 32-bit signed integer
    Integer,
    /// 64-bit signed integer
    Long,
    /// 64-bit float
    Double,
    /// UTC date-time parsed from an RFC 3339 string
    Timestamp,
    /// Ordered collection of native values
    List,
    /// Opaque structure, kept as raw JSON
    Opaque,
}

/// Native-side value carried in request params, response results and error data
#[derive(Debug, Clone, PartialEq)]
pub enum NativeValue {
    Null,
    Bool(bool),
    Int(i32),
    Long(i64),
    Double(f64),
    Text(String),
    Timestamp(DateTime<Utc>),
    List(Vec<NativeValue>),
    /// Opaque JSON that was not (or could not be) converted
    Raw(JsonValue),
}

impl NativeValue {
    pub fn is_null(&self) -> bool {
        matches!(self, NativeValue::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            NativeValue::Bool(value) => Some(*value),
            _ => None,
        }
    }

    /// Integer value of either integer width
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            NativeValue::Int(value) => Some(i64::from(*value)),
            NativeValue::Long(value) => Some(*value),
            _ => None,
        }
    }

    /// Numeric value of any numeric variant
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            NativeValue::Int(value) => Some(f64::from(*value)),
            NativeValue::Long(value) => Some(*value as f64),
            NativeValue::Double(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            NativeValue::Text(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<&DateTime<Utc>> {
        match self {
            NativeValue::Timestamp(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[NativeValue]> {
        match self {
            NativeValue::List(values) => Some(values),
            _ => None,
        }
    }

    pub fn as_raw(&self) -> Option<&JsonValue> {
        match self {
            NativeValue::Raw(value) => Some(value),
            _ => None,
        }
    }
}

impl fmt::Display for NativeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_wire_value())
    }
}

impl Serialize for NativeValue {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.to_wire_value().serialize(serializer)
    }
}

impl From<bool> for NativeValue {
    fn from(value: bool) -> Self {
        NativeValue::Bool(value)
    }
}

impl From<i32> for NativeValue {
    fn from(value: i32) -> Self {
        NativeValue::Int(value)
    }
}

impl From<i64> for NativeValue {
    fn from(value: i64) -> Self {
        NativeValue::Long(value)
    }
}

impl From<u32> for NativeValue {
    fn from(value: u32) -> Self {
        NativeValue::Long(i64::from(value))
    }
}

impl From<f32> for NativeValue {
    fn from(value: f32) -> Self {
        NativeValue::Double(f64::from(value))
    }
}

impl From<f64> for NativeValue {
    fn from(value: f64) -> Self {
        NativeValue::Double(value)
    }
}

impl From<&str> for NativeValue {
    fn from(value: &str) -> Self {
        NativeValue::Text(value.to_string())
    }
}

impl From<String> for NativeValue {
    fn from(value: String) -> Self {
        NativeValue::Text(value)
    }
}

impl From<DateTime<Utc>> for NativeValue {
    fn from(value: DateTime<Utc>) -> Self {
        NativeValue::Timestamp(value)
    }
}

impl From<JsonValue> for NativeValue {
    fn from(value: JsonValue) -> Self {
        NativeValue::Raw(value)
    }
}

impl<T: Into<NativeValue>> From<Vec<T>> for NativeValue {
    fn from(values: Vec<T>) -> Self {
        NativeValue::List(values.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<NativeValue>> From<Option<T>> for NativeValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(NativeValue::Null, Into::into)
    }
}

/// Conversion of a native value into its wire representation
pub trait ToWireValue {
    fn to_wire_value(&self) -> JsonValue;
}

impl ToWireValue for NativeValue {
    fn to_wire_value(&self) -> JsonValue {
        match self {
            NativeValue::Null => Value::Null,
            NativeValue::Bool(value) => Value::Bool(*value),
            NativeValue::Int(value) => Value::from(*value),
            NativeValue::Long(value) => Value::from(*value),
            NativeValue::Double(value) => float_value(*value),
            NativeValue::Text(value) => Value::String(value.clone()),
            NativeValue::Timestamp(value) => value.to_wire_value(),
            NativeValue::List(values) => values.to_wire_value(),
            NativeValue::Raw(value) => value.clone(),
        }
    }
}

impl ToWireValue for bool {
    fn to_wire_value(&self) -> JsonValue {
        Value::Bool(*self)
    }
}

impl ToWireValue for i32 {
    fn to_wire_value(&self) -> JsonValue {
        Value::from(*self)
    }
}

impl ToWireValue for i64 {
    fn to_wire_value(&self) -> JsonValue {
        Value::from(*self)
    }
}

impl ToWireValue for u32 {
    fn to_wire_value(&self) -> JsonValue {
        Value::from(*self)
    }
}

impl ToWireValue for f32 {
    fn to_wire_value(&self) -> JsonValue {
        float_value(f64::from(*self))
    }
}

impl ToWireValue for f64 {
    fn to_wire_value(&self) -> JsonValue {
        float_value(*self)
    }
}

impl ToWireValue for str {
    fn to_wire_value(&self) -> JsonValue {
        Value::String(self.to_string())
    }
}

impl ToWireValue for String {
    fn to_wire_value(&self) -> JsonValue {
        Value::String(self.clone())
    }
}

impl ToWireValue for DateTime<Utc> {
    fn to_wire_value(&self) -> JsonValue {
        Value::String(self.to_rfc3339_opts(SecondsFormat::Millis, true))
    }
}

impl ToWireValue for JsonValue {
    fn to_wire_value(&self) -> JsonValue {
        self.clone()
    }
}

impl<T: ToWireValue> ToWireValue for Option<T> {
    fn to_wire_value(&self) -> JsonValue {
        self.as_ref().map_or(Value::Null, ToWireValue::to_wire_value)
    }
}

impl<T: ToWireValue> ToWireValue for [T] {
    fn to_wire_value(&self) -> JsonValue {
        Value::Array(self.iter().map(ToWireValue::to_wire_value).collect())
    }
}

impl<T: ToWireValue> ToWireValue for Vec<T> {
    fn to_wire_value(&self) -> JsonValue {
        self.as_slice().to_wire_value()
    }
}

impl<T: ToWireValue + ?Sized> ToWireValue for &T {
    fn to_wire_value(&self) -> JsonValue {
        (**self).to_wire_value()
    }
}

/// Non-finite floats have no JSON form and become `null`
fn float_value(value: f64) -> JsonValue {
    Number::from_f64(value).map_or(Value::Null, Value::Number)
}

/// Integral value of a wire number, if it has no fractional part and fits in 64 bits
pub(crate) fn integral(number: &Number) -> Option<i64> {
    if let Some(value) = number.as_i64() {
        return Some(value);
    }
    if number.is_u64() {
        return None;
    }
    let value = number.as_f64()?;
    // -2^63 and 2^63 are exact in f64; 2^63 itself overflows i64
    let in_range = (-9_223_372_036_854_775_808.0..9_223_372_036_854_775_808.0).contains(&value);
    if value.fract() == 0.0 && in_range {
        Some(value as i64)
    } else {
        None
    }
}

/// Parse JSON text into a wire value
pub fn decode(text: &str) -> MessageResult<JsonValue> {
    Ok(serde_json::from_str(text)?)
}

/// Encode any wire-encodable value as compact JSON text
pub fn encode<T: ToWireValue + ?Sized>(value: &T) -> String {
    value.to_wire_value().to_string()
}

/// Check whether the text is well-formed JSON
pub fn is_valid(text: &str) -> bool {
    serde_json::from_str::<serde::de::IgnoredAny>(text).is_ok()
}

/// Native type the given wire value maps to when no target is requested
pub fn classify(value: &JsonValue) -> TargetType {
    match value {
        Value::String(_) => TargetType::String,
        Value::Number(number) => match integral(number) {
            Some(v) if i32::try_from(v).is_ok() => TargetType::Integer,
            Some(_) => TargetType::Long,
            None => TargetType::Double,
        },
        Value::Array(_) => TargetType::List,
        Value::Null | Value::Bool(_) | Value::Object(_) => TargetType::Opaque,
    }
}

/// Convert a wire value to the requested native type.
///
/// `null` and booleans convert to [`NativeValue::Null`] and [`NativeValue::Bool`]
/// whatever the target. A target the value cannot be expressed as yields the
/// raw value unchanged.
pub fn convert(value: &JsonValue, target: TargetType) -> NativeValue {
    let raw = || NativeValue::Raw(value.clone());

    match (target, value) {
        (_, Value::Null) => NativeValue::Null,
        (_, Value::Bool(flag)) => NativeValue::Bool(*flag),
        (TargetType::String, Value::String(text)) => NativeValue::Text(text.clone()),
        (TargetType::String, other) => NativeValue::Text(other.to_string()),
        (TargetType::Integer, Value::Number(number)) => integral(number)
            .and_then(|v| i32::try_from(v).ok())
            .map_or_else(raw, NativeValue::Int),
        (TargetType::Long, Value::Number(number)) => {
            integral(number).map_or_else(raw, NativeValue::Long)
        }
        (TargetType::Double, Value::Number(number)) => {
            number.as_f64().map_or_else(raw, NativeValue::Double)
        }
        (TargetType::Timestamp, Value::String(text)) => DateTime::parse_from_rfc3339(text)
            .map(|t| NativeValue::Timestamp(t.with_timezone(&Utc)))
            .unwrap_or_else(|_| raw()),
        (TargetType::List, Value::Array(items)) => {
            NativeValue::List(items.iter().map(to_native).collect())
        }
        _ => raw(),
    }
}

/// Convert a wire value to the native type [`classify`] picks for it
pub fn to_native(value: &JsonValue) -> NativeValue {
    convert(value, classify(value))
}

/// Render a wire value with four-space indentation. Diagnostic use only.
pub fn pretty_print(value: &JsonValue) -> String {
    let formatter = PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(Vec::new(), formatter);
    if value.serialize(&mut serializer).is_err() {
        return value.to_string();
    }
    String::from_utf8(serializer.into_inner()).unwrap_or_else(|_| value.to_string())
}

/// Pretty form of JSON text, or the text unchanged if it is not valid JSON
pub fn pretty_print_text(text: &str) -> String {
    match decode(text) {
        Ok(value) => pretty_print(&value),
        Err(_) => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn test_classify_number_widths() {
        assert_eq!(classify(&json!(42)), TargetType::Integer);
        assert_eq!(classify(&json!(-2147483648i64)), TargetType::Integer);
        assert_eq!(classify(&json!(2147483648i64)), TargetType::Long);
        assert_eq!(classify(&json!(i64::MIN)), TargetType::Long);
        assert_eq!(classify(&json!(3.25)), TargetType::Double);
        // integral float is narrowed
        assert_eq!(classify(&json!(7.0)), TargetType::Integer);
        // beyond i64 is promoted to floating point
        assert_eq!(classify(&json!(u64::MAX)), TargetType::Double);
    }

    #[test]
    fn test_classify_other_shapes() {
        assert_eq!(classify(&json!("x")), TargetType::String);
        assert_eq!(classify(&json!([1, 2])), TargetType::List);
        assert_eq!(classify(&json!({"a": 1})), TargetType::Opaque);
        assert_eq!(classify(&json!(true)), TargetType::Opaque);
        assert_eq!(classify(&Value::Null), TargetType::Opaque);
    }

    #[test]
    fn test_to_native() {
        assert_eq!(to_native(&json!(42)), NativeValue::Int(42));
        assert_eq!(to_native(&json!(5_000_000_000i64)), NativeValue::Long(5_000_000_000));
        assert_eq!(to_native(&json!(0.5)), NativeValue::Double(0.5));
        assert_eq!(to_native(&json!("well")), NativeValue::Text("well".to_string()));
        assert_eq!(to_native(&json!(false)), NativeValue::Bool(false));
        assert_eq!(to_native(&Value::Null), NativeValue::Null);
        assert_eq!(
            to_native(&json!([1, "a", [2.5]])),
            NativeValue::List(vec![
                NativeValue::Int(1),
                NativeValue::Text("a".to_string()),
                NativeValue::List(vec![NativeValue::Double(2.5)]),
            ])
        );
        assert_eq!(
            to_native(&json!({"curve": "GR"})),
            NativeValue::Raw(json!({"curve": "GR"}))
        );
    }

    #[test]
    fn test_convert_unsupported_target_returns_raw() {
        assert_eq!(
            convert(&json!("12"), TargetType::Integer),
            NativeValue::Raw(json!("12"))
        );
        assert_eq!(
            convert(&json!(1.5), TargetType::Long),
            NativeValue::Raw(json!(1.5))
        );
        assert_eq!(
            convert(&json!(3_000_000_000i64), TargetType::Integer),
            NativeValue::Raw(json!(3_000_000_000i64))
        );
        assert_eq!(
            convert(&json!({"a": 1}), TargetType::List),
            NativeValue::Raw(json!({"a": 1}))
        );
        assert_eq!(
            convert(&json!("not a date"), TargetType::Timestamp),
            NativeValue::Raw(json!("not a date"))
        );
    }

    #[test]
    fn test_convert_explicit_targets() {
        assert_eq!(convert(&json!(7), TargetType::Double), NativeValue::Double(7.0));
        assert_eq!(convert(&json!(7), TargetType::Long), NativeValue::Long(7));
        assert_eq!(
            convert(&json!([1, 2]), TargetType::String),
            NativeValue::Text("[1,2]".to_string())
        );
        assert_eq!(convert(&json!(true), TargetType::Integer), NativeValue::Bool(true));
        assert_eq!(convert(&Value::Null, TargetType::String), NativeValue::Null);

        let expected = Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap();
        assert_eq!(
            convert(&json!("2024-03-01T12:30:00.000Z"), TargetType::Timestamp),
            NativeValue::Timestamp(expected)
        );
    }

    #[test]
    fn test_encode_scalars() {
        assert_eq!(encode(&NativeValue::Null), "null");
        assert_eq!(encode(&true), "true");
        assert_eq!(encode(&42), "42");
        assert_eq!(encode(&i64::MAX), "9223372036854775807");
        assert_eq!(encode(&1.5), "1.5");
        assert_eq!(encode(&NativeValue::Long(12)), "12");
    }

    #[test]
    fn test_encode_non_finite_as_null() {
        assert_eq!(encode(&f64::NAN), "null");
        assert_eq!(encode(&f64::INFINITY), "null");
        assert_eq!(encode(&f32::NEG_INFINITY), "null");
        assert_eq!(
            encode(&vec![NativeValue::Double(1.0), NativeValue::Double(f64::NAN)]),
            "[1.0,null]"
        );
    }

    #[test]
    fn test_encode_string_escapes() {
        assert_eq!(encode("a\"b\\c\n\u{1}"), r#""a\"b\\c\n\u0001""#);
        assert_eq!(encode("brønn"), "\"brønn\"");
        assert!(is_valid(&encode("tab\there")));
    }

    #[test]
    fn test_encode_timestamp() {
        let time = Utc.with_ymd_and_hms(2023, 11, 5, 8, 15, 30).unwrap();
        assert_eq!(encode(&time), "\"2023-11-05T08:15:30.000Z\"");
        assert_eq!(encode(&NativeValue::Timestamp(time)), "\"2023-11-05T08:15:30.000Z\"");
    }

    #[test]
    fn test_encode_collections() {
        let values = vec![
            NativeValue::from("depth"),
            NativeValue::from(vec![1, 2]),
            NativeValue::from(None::<i32>),
        ];
        assert_eq!(encode(&values), r#"["depth",[1,2],null]"#);
        assert_eq!(encode(&json!({"b": 1, "a": 2})), r#"{"b":1,"a":2}"#);
    }

    #[test]
    fn test_decode() {
        assert_eq!(decode("[1, 2]").unwrap(), json!([1, 2]));
        assert!(decode("{\"a\":").unwrap_err().is_parse_error());
        assert!(decode("").is_err());
    }

    #[test]
    fn test_pretty_print() {
        let pretty = pretty_print(&json!({"a": [1, 2]}));
        assert_eq!(pretty, "{\n    \"a\": [\n        1,\n        2\n    ]\n}");
        assert_eq!(pretty_print_text("not json"), "not json");
        assert_eq!(pretty_print_text("[true]"), "[\n    true\n]");
    }

    #[test]
    fn test_native_accessors() {
        assert_eq!(NativeValue::Int(3).as_i64(), Some(3));
        assert_eq!(NativeValue::Long(3).as_f64(), Some(3.0));
        assert_eq!(NativeValue::Text("x".into()).as_str(), Some("x"));
        assert!(NativeValue::Double(1.0).as_i64().is_none());
        assert!(NativeValue::Null.is_null());
        assert_eq!(NativeValue::from(vec![1]).as_list().map(<[_]>::len), Some(1));
    }
}
