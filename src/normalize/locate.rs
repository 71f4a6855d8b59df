//! Ordered candidate-path lookup inside an untyped JSON payload.
//!
//! The backend envelope is not firmly contracted: the same field may sit at
//! the top level, under `data`, or under `result`. Instead of scattering
//! `get().or_else(get())` chains, each lookup names its candidate paths once,
//! in priority order, and [`locate`] returns the first that satisfies a
//! predicate.

use crate::model::format_number;
use serde_json::Value;

/// A path of object keys from the payload root, e.g. `&["data", "job_id"]`.
pub type Path = &'static [&'static str];

/// Follow `path` through nested objects.
pub fn at<'a>(payload: &'a Value, path: &[&str]) -> Option<&'a Value> {
    path.iter()
        .try_fold(payload, |node, key| node.as_object()?.get(*key))
}

/// First candidate whose value satisfies `accept`.
pub fn locate<'a>(
    payload: &'a Value,
    candidates: &[Path],
    accept: impl Fn(&Value) -> bool,
) -> Option<&'a Value> {
    candidates
        .iter()
        .filter_map(|path| at(payload, path))
        .find(|v| accept(*v))
}

/// Accepts anything that is not `null`.
pub fn present(v: &Value) -> bool {
    !v.is_null()
}

/// Accepts values a loose truthiness check would keep: not null, not
/// `false`, not `0`, not `""`.
pub fn truthy(v: &Value) -> bool {
    match v {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// First present (non-null) field among `keys` on a single object.
pub fn field<'a>(obj: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|k| obj.get(*k))
        .find(|v| present(*v))
}

/// Render a scalar as display text: strings verbatim, numbers without a
/// spurious `.0`, everything else via its JSON text.
pub fn text_of(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        Value::Number(n) => match n.as_i64() {
            Some(i) => i.to_string(),
            None => n.as_f64().map_or_else(|| n.to_string(), format_number),
        },
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Numeric reading of a scalar: numbers as-is, numeric strings parsed,
/// anything else `None`.
pub fn number_of(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
        _ => None,
    }
}
