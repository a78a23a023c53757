use serde_json::{Map, Value};

/// Renders one JSON value as a form field.
///
/// Strings pass through, numbers become integers (fractions are truncated),
/// everything else becomes the empty string. The listing service validates
/// the fields itself, so a lossy value is still forwarded rather than refused.
pub fn to_form_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                i.to_string()
            } else if let Some(u) = n.as_u64() {
                u.to_string()
            } else {
                // `as` saturates at the i64 bounds and maps NaN to 0
                n.as_f64().map(|f| (f.trunc() as i64).to_string()).unwrap_or_default()
            }
        }
        Value::Bool(_) | Value::Null | Value::Array(_) | Value::Object(_) => String::new(),
    }
}

// One form field per top-level key
pub fn to_form_fields(object: &Map<String, Value>) -> Vec<(String, String)> {
    object
        .iter()
        .map(|(key, value)| (key.clone(), to_form_value(value)))
        .collect()
}
