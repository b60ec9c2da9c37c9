//! Local input checks run before any request is sent.

use crate::{Error, Result};
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use serde::Serialize;
use serde_json::{Map, Value};

/// Bytes escaped when a caller value becomes a single URL path segment.
/// `%` is included so pre-encoded input cannot smuggle `%2F` or `%2E`.
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'\\')
    .add(b'^')
    .add(b'`')
    .add(b'{')
    .add(b'|')
    .add(b'}');

/// Fails with [`Error::Validation`] if `value` is empty or whitespace only.
pub(crate) fn non_empty<'a>(value: &'a str, param_name: &str) -> Result<&'a str> {
    if value.trim().is_empty() {
        return Err(Error::Validation(format!("{} cannot be empty", param_name)));
    }
    Ok(value)
}

/// Checks `value` like [`non_empty`] and percent-encodes it as exactly one
/// path segment. `.` and `..` are rejected since URL parsing would resolve
/// them against the surrounding path.
pub(crate) fn path_segment(value: &str, param_name: &str) -> Result<String> {
    let value = non_empty(value, param_name)?;
    if is_dot_segment(value) {
        return Err(Error::Validation(format!(
            "{} cannot be a relative path segment",
            param_name
        )));
    }
    Ok(utf8_percent_encode(value, PATH_SEGMENT).to_string())
}

/// Checks a caller-supplied relative path (an optional `?query` allowed)
/// for `.` and `..` segments, in plain or percent-encoded form.
pub(crate) fn relative_path<'a>(value: &'a str, param_name: &str) -> Result<&'a str> {
    let value = non_empty(value, param_name)?;
    let path = value.split(['?', '#']).next().unwrap_or_default();
    if path.split(['/', '\\']).any(is_dot_segment) {
        return Err(Error::Validation(format!(
            "{} cannot contain `.` or `..` segments",
            param_name
        )));
    }
    Ok(value)
}

fn is_dot_segment(segment: &str) -> bool {
    let segment = segment.to_ascii_lowercase().replace("%2e", ".");
    segment == "." || segment == ".."
}

/// Serializes `payload` and checks that it is a JSON object.
pub(crate) fn json_object<T: Serialize + ?Sized>(
    payload: &T,
    param_name: &str,
) -> Result<Map<String, Value>> {
    match serde_json::to_value(payload) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(Error::Validation(format!(
            "{} must be a JSON object",
            param_name
        ))),
        Err(e) => Err(Error::SerializationFailed(e.to_string())),
    }
}

/// Checks that every key in `required` is present with a non-null value.
pub(crate) fn required_keys(
    object: &Map<String, Value>,
    required: &[&str],
    param_name: &str,
) -> Result<()> {
    let missing: Vec<&str> = required
        .iter()
        .copied()
        .filter(|key| object.get(*key).map_or(true, Value::is_null))
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(Error::Validation(format!(
            "{} is missing required field(s): {}",
            param_name,
            missing.join(", ")
        )))
    }
}
