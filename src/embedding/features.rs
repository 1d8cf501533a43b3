use serde_json::Value;

/// Raw request features: feature name to JSON value.
pub type FeatureMap = serde_json::Map<String, Value>;

/// Renders a raw value the way it is fed to the text encoder.
///
/// Strings pass through unquoted, numbers keep their JSON spelling and booleans are
/// capitalized. Nulls, arrays and objects have no text form.
pub fn text_repr(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(true) => Some("True".to_string()),
        Value::Bool(false) => Some("False".to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// Coerces a raw value to a real number for DICE encoding.
pub fn numeric_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        // `f64::from_str` accepts "inf", "infinity" and "nan" in any case.
        Value::String(s) => s.trim().parse::<f64>().ok(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}
