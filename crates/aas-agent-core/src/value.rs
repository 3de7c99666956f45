//! Value coercion: untyped input to one of four primitive kinds and back.

use serde_json::Value;

use crate::error::{AasError, Result};

/// Lowercase strings that coerce to `true`. Everything else is `false`.
pub const TRUTHY: &[&str] = &["true", "t", "yes", "1"];

/// `xs:int` is 32-bit.
pub const XS_INT_MIN: i64 = i32::MIN as i64;
pub const XS_INT_MAX: i64 = i32::MAX as i64;

/// Declared type of a property. Immutable once the property exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    Text,
    Integer,
    Float,
    Boolean,
}

impl ValueType {
    pub const ALL: [ValueType; 4] = [
        ValueType::Text,
        ValueType::Integer,
        ValueType::Float,
        ValueType::Boolean,
    ];

    /// Resolve a type tag as the model sends it (`string`, `int`, `float`, `boolean`).
    pub fn from_tag(tag: &str) -> Result<Self> {
        match tag.trim().to_lowercase().as_str() {
            "string" => Ok(ValueType::Text),
            "int" => Ok(ValueType::Integer),
            "float" => Ok(ValueType::Float),
            "boolean" => Ok(ValueType::Boolean),
            _ => Err(AasError::InvalidType(tag.to_string())),
        }
    }

    pub fn tag(self) -> &'static str {
        match self {
            ValueType::Text => "string",
            ValueType::Integer => "int",
            ValueType::Float => "float",
            ValueType::Boolean => "boolean",
        }
    }

    /// XSD name used in the AAS JSON exchange format.
    pub fn xsd(self) -> &'static str {
        match self {
            ValueType::Text => "xs:string",
            ValueType::Integer => "xs:int",
            ValueType::Float => "xs:float",
            ValueType::Boolean => "xs:boolean",
        }
    }

    pub fn from_xsd(xsd: &str) -> Option<Self> {
        match xsd {
            "xs:string" => Some(ValueType::Text),
            "xs:int" => Some(ValueType::Integer),
            "xs:float" => Some(ValueType::Float),
            "xs:boolean" => Some(ValueType::Boolean),
            _ => None,
        }
    }

    /// Coerce an untyped input into this type.
    pub fn coerce(self, input: &Value) -> Result<PropertyValue> {
        if input.is_null() {
            return Err(self.invalid("a value is required"));
        }
        match self {
            ValueType::Text => Ok(PropertyValue::Text(stringify(input))),
            ValueType::Integer => {
                let i = coerce_int(input)
                    .ok_or_else(|| self.invalid(format!("'{}' is not an integer", stringify(input))))?;
                if !(XS_INT_MIN..=XS_INT_MAX).contains(&i) {
                    return Err(self.invalid(format!("{} is outside the xs:int range", i)));
                }
                Ok(PropertyValue::Integer(i))
            }
            ValueType::Float => coerce_float(input)
                .map(PropertyValue::Float)
                .ok_or_else(|| self.invalid(format!("'{}' is not a number", stringify(input)))),
            ValueType::Boolean => Ok(PropertyValue::Boolean(coerce_bool_permissive(input))),
        }
    }

    /// Parse the string form stored in an AAS file.
    pub fn parse_stored(self, raw: &str) -> Result<PropertyValue> {
        match self {
            // Files only ever hold the canonical tokens, so be strict here.
            ValueType::Boolean => match raw.trim() {
                "true" | "1" => Ok(PropertyValue::Boolean(true)),
                "false" | "0" => Ok(PropertyValue::Boolean(false)),
                other => Err(self.invalid(format!("'{}' is not an xs:boolean", other))),
            },
            _ => self.coerce(&Value::String(raw.to_string())),
        }
    }

    fn invalid(self, reason: impl Into<String>) -> AasError {
        AasError::InvalidValue {
            value_type: self.tag().to_string(),
            reason: reason.into(),
        }
    }
}

impl std::fmt::Display for ValueType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.tag())
    }
}

/// A coerced property value. Its variant always matches the owning
/// property's `ValueType`.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Text(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
}

impl PropertyValue {
    pub fn value_type(&self) -> ValueType {
        match self {
            PropertyValue::Text(_) => ValueType::Text,
            PropertyValue::Integer(_) => ValueType::Integer,
            PropertyValue::Float(_) => ValueType::Float,
            PropertyValue::Boolean(_) => ValueType::Boolean,
        }
    }
}

impl std::fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PropertyValue::Text(s) => f.write_str(s),
            PropertyValue::Integer(i) => write!(f, "{}", i),
            PropertyValue::Float(x) => f.write_str(&format_float(*x)),
            PropertyValue::Boolean(b) => write!(f, "{}", b),
        }
    }
}

/// Render an optional value, `None` when unset.
pub fn display_value(value: Option<&PropertyValue>) -> String {
    value.map_or_else(|| "None".to_string(), |v| v.to_string())
}

/// Integral floats keep one fractional digit so `30.0` never reads as an int.
pub fn format_float(x: f64) -> String {
    if x.is_finite() && x.fract() == 0.0 && x.abs() < 1e16 {
        format!("{:.1}", x)
    } else {
        format!("{}", x)
    }
}

/// Best-effort boolean: pass booleans through, otherwise compare the
/// lowercase string form against [`TRUTHY`]. Malformed input is `false`.
pub fn coerce_bool_permissive(input: &Value) -> bool {
    match input {
        Value::Bool(b) => *b,
        other => TRUTHY.contains(&stringify(other).to_lowercase().as_str()),
    }
}

/// String form of an untyped input; JSON strings lose their quotes.
pub fn stringify(input: &Value) -> String {
    match input {
        Value::String(s) => s.clone(),
        Value::Null => "None".to_string(),
        other => other.to_string(),
    }
}

fn coerce_int(input: &Value) -> Option<i64> {
    match input {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|x| x.fract() == 0.0 && x.abs() < i64::MAX as f64)
                .map(|x| x as i64)
        }),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

fn coerce_float(input: &Value) -> Option<f64> {
    match input {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_type_tags() {
        assert_eq!(ValueType::from_tag("Float").unwrap(), ValueType::Float);
        assert_eq!(ValueType::from_tag(" int ").unwrap(), ValueType::Integer);
        assert!(matches!(
            ValueType::from_tag("double"),
            Err(AasError::InvalidType(_))
        ));
        for t in ValueType::ALL {
            assert_eq!(ValueType::from_tag(t.tag()).unwrap(), t);
            assert_eq!(ValueType::from_xsd(t.xsd()), Some(t));
        }
    }

    #[test]
    fn test_coerce_text() {
        assert_eq!(
            ValueType::Text.coerce(&json!("abc")).unwrap(),
            PropertyValue::Text("abc".into())
        );
        assert_eq!(
            ValueType::Text.coerce(&json!(42)).unwrap(),
            PropertyValue::Text("42".into())
        );
    }

    #[test]
    fn test_coerce_int() {
        assert_eq!(
            ValueType::Integer.coerce(&json!("42")).unwrap(),
            PropertyValue::Integer(42)
        );
        assert_eq!(
            ValueType::Integer.coerce(&json!(7.0)).unwrap(),
            PropertyValue::Integer(7)
        );
        assert!(matches!(
            ValueType::Integer.coerce(&json!("4.5")),
            Err(AasError::InvalidValue { .. })
        ));
        assert!(ValueType::Integer.coerce(&json!("hot")).is_err());
    }

    #[test]
    fn test_int_stays_within_xs_int() {
        assert_eq!(
            ValueType::Integer.coerce(&json!(2147483647)).unwrap(),
            PropertyValue::Integer(2147483647)
        );
        assert_eq!(
            ValueType::Integer.coerce(&json!("-2147483648")).unwrap(),
            PropertyValue::Integer(-2147483648)
        );
        for big in [json!(2147483648i64), json!("-2147483649"), json!(3000000000i64)] {
            assert!(
                matches!(
                    ValueType::Integer.coerce(&big),
                    Err(AasError::InvalidValue { .. })
                ),
                "{big}"
            );
        }
    }

    #[test]
    fn test_coerce_float() {
        assert_eq!(
            ValueType::Float.coerce(&json!("30")).unwrap(),
            PropertyValue::Float(30.0)
        );
        assert_eq!(
            ValueType::Float.coerce(&json!(25.5)).unwrap(),
            PropertyValue::Float(25.5)
        );
        assert!(ValueType::Float.coerce(&json!("warm")).is_err());
        assert!(ValueType::Float.coerce(&json!(true)).is_err());
    }

    #[test]
    fn test_bool_is_permissive() {
        for truthy in [json!(true), json!("TRUE"), json!("t"), json!("Yes"), json!(1), json!("1")] {
            assert!(coerce_bool_permissive(&truthy), "{truthy}");
        }
        for falsy in [json!(false), json!("no"), json!("garbage"), json!(0), json!(1.0)] {
            assert!(!coerce_bool_permissive(&falsy), "{falsy}");
        }
    }

    #[test]
    fn test_null_needs_a_value() {
        for t in ValueType::ALL {
            assert!(t.coerce(&Value::Null).is_err());
        }
    }

    #[test]
    fn test_display() {
        assert_eq!(PropertyValue::Float(30.0).to_string(), "30.0");
        assert_eq!(PropertyValue::Float(25.5).to_string(), "25.5");
        assert_eq!(PropertyValue::Boolean(true).to_string(), "true");
        assert_eq!(PropertyValue::Integer(-3).to_string(), "-3");
        assert_eq!(display_value(None), "None");
    }

    #[test]
    fn test_parse_stored_round_trips_display() {
        for v in [
            PropertyValue::Text("x y".into()),
            PropertyValue::Integer(12),
            PropertyValue::Float(0.125),
            PropertyValue::Float(30.0),
            PropertyValue::Boolean(false),
        ] {
            let back = v.value_type().parse_stored(&v.to_string()).unwrap();
            assert_eq!(back, v);
        }
    }
}
