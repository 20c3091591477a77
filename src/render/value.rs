use serde_json::Value;
use std::borrow::Cow;

/// Return true if the given [`Value`] is truthy.
///
/// `null`, `false`, the empty string and the empty array are falsy.
/// Everything else is truthy, including `0` and the empty object.
///
/// # Examples
///
/// ```
/// use serde_json::json;
/// use whisker::is_truthy;
///
/// assert!(is_truthy(&json!(0)));
/// assert!(is_truthy(&json!({})));
/// assert!(!is_truthy(&json!([])));
/// assert!(!is_truthy(&json!("")));
/// ```
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(bool) => *bool,
        Value::String(string) => !string.is_empty(),
        Value::Array(array) => !array.is_empty(),
        Value::Number(_) | Value::Object(_) => true,
    }
}

/// Return the text that is written when the [`Value`] is output.
pub fn stringify(value: &Value) -> Cow<'_, str> {
    match value {
        Value::Null => Cow::Borrowed(""),
        Value::Bool(true) => Cow::Borrowed("true"),
        Value::Bool(false) => Cow::Borrowed("false"),
        Value::String(string) => Cow::Borrowed(string),
        Value::Number(number) => match number.as_f64() {
            // Whole floats are written without a fraction, `1.0` is `1`.
            Some(float) if number.is_f64() && float.fract() == 0.0 && float.abs() < 1e15 => {
                Cow::Owned((float as i64).to_string())
            }
            _ => Cow::Owned(number.to_string()),
        },
        Value::Array(array) => Cow::Owned(
            array
                .iter()
                .map(stringify)
                .collect::<Vec<_>>()
                .join(","),
        ),
        Value::Object(_) => Cow::Borrowed("[object Object]"),
    }
}
