//! Bounding-box normalization.
//!
//! OCR providers disagree on box conventions. Three are recognized:
//!
//! ```text
//! [x, y, w, h]                      4-tuple
//! [{x,y}, {x,y}, …] or [[x,y], …]   polygon → axis-aligned bounds
//! {x|left, y|top, width|right, height|bottom}
//! ```
//!
//! Anything else means "no overlay" rather than an error.

use super::locate::{field, number_of};
use crate::model::BBox;
use serde_json::Value;

/// Keys under which an item may carry its raw box.
pub const BBOX_KEYS: &[&str] = &["bbox", "box", "bounding_box", "boundingBox"];

/// Normalize the box carried by an OCR or dimension item.
pub fn normalize_bbox(item: &Value) -> Option<BBox> {
    let raw = field(item, BBOX_KEYS)?;
    match raw {
        Value::Array(seq) => from_sequence(seq),
        Value::Object(_) => Some(from_object(raw)),
        _ => None,
    }
}

fn from_sequence(seq: &[Value]) -> Option<BBox> {
    if seq.len() == 4 && seq.iter().all(|v| !is_point(v)) {
        let n: Vec<f64> = seq.iter().map(coerce).collect();
        return Some(BBox::new(n[0], n[1], n[2], n[3]));
    }
    if seq.len() >= 2 && seq.iter().all(is_point) {
        let points: Vec<(f64, f64)> = seq.iter().filter_map(point).collect();
        return bounds(&points);
    }
    None
}

fn from_object(obj: &Value) -> BBox {
    let x = field(obj, &["x", "left"]).map(coerce).unwrap_or(0.0);
    let y = field(obj, &["y", "top"]).map(coerce).unwrap_or(0.0);
    let width = match (field(obj, &["width"]), field(obj, &["right"])) {
        (Some(w), _) => coerce(w),
        (None, Some(right)) => coerce(right) - x,
        (None, None) => 0.0,
    };
    let height = match (field(obj, &["height"]), field(obj, &["bottom"])) {
        (Some(h), _) => coerce(h),
        (None, Some(bottom)) => coerce(bottom) - y,
        (None, None) => 0.0,
    };
    BBox::new(x, y, width, height)
}

fn bounds(points: &[(f64, f64)]) -> Option<BBox> {
    let (first, rest) = points.split_first()?;
    let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.0, first.1, first.0, first.1);
    for &(x, y) in rest {
        min_x = min_x.min(x);
        min_y = min_y.min(y);
        max_x = max_x.max(x);
        max_y = max_y.max(y);
    }
    Some(BBox::new(min_x, min_y, max_x - min_x, max_y - min_y))
}

/// An object exposing `x`/`y`, or a sequence with at least two entries.
fn is_point(v: &Value) -> bool {
    match v {
        Value::Object(map) => map.contains_key("x") || map.contains_key("y"),
        Value::Array(seq) => seq.len() >= 2,
        _ => false,
    }
}

fn point(v: &Value) -> Option<(f64, f64)> {
    match v {
        Value::Object(_) => Some((
            field(v, &["x"]).map(coerce).unwrap_or(0.0),
            field(v, &["y"]).map(coerce).unwrap_or(0.0),
        )),
        Value::Array(seq) => Some((
            seq.first().map(coerce).unwrap_or(0.0),
            seq.get(1).map(coerce).unwrap_or(0.0),
        )),
        _ => None,
    }
}

fn coerce(v: &Value) -> f64 {
    number_of(v).unwrap_or(0.0)
}
