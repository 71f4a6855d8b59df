//! Canonical result shapes.
//!
//! Every backend response variant is normalized into these types before the
//! workflow stores it. They serialize to the same JSON a presentation layer
//! would bind to: absent dimension values are `""`, never `null`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A dimension value as displayed and edited.
///
/// `Number` when the backend reported a number, `Text` otherwise. The
/// canonical "absent" value is `Text("")`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Number(f64),
    Text(String),
}

impl Default for FieldValue {
    fn default() -> Self {
        FieldValue::Text(String::new())
    }
}

impl FieldValue {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, FieldValue::Text(s) if s.is_empty())
    }

    /// Loose numeric coercion, matching what a browser form submits:
    /// blank → 0, unparseable → NaN.
    pub fn to_number(&self) -> f64 {
        match self {
            FieldValue::Number(n) => *n,
            FieldValue::Text(s) => coerce_number(s),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Number(n) => f.write_str(&format_number(*n)),
            FieldValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<f64> for FieldValue {
    fn from(n: f64) -> Self {
        FieldValue::Number(n)
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_string())
    }
}

/// Coerce user text to a number: surrounding whitespace ignored, blank is 0,
/// anything unparseable is NaN. Rust's `inf`/`nan` spellings are not numbers here.
pub fn coerce_number(s: &str) -> f64 {
    let t = s.trim();
    if t.is_empty() {
        return 0.0;
    }
    let lowered = t.to_ascii_lowercase();
    if lowered.contains("inf") || lowered.contains("nan") {
        return match t {
            "Infinity" | "+Infinity" => f64::INFINITY,
            "-Infinity" => f64::NEG_INFINITY,
            _ => f64::NAN,
        };
    }
    t.parse::<f64>().unwrap_or(f64::NAN)
}

/// Render a number the way a form field shows it: `12` not `12.0`.
pub fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}

/// Which of the three package dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DimensionKey {
    Width,
    Height,
    Depth,
}

impl DimensionKey {
    pub const ALL: [DimensionKey; 3] = [Self::Width, Self::Height, Self::Depth];

    pub fn as_str(self) -> &'static str {
        match self {
            DimensionKey::Width => "width",
            DimensionKey::Height => "height",
            DimensionKey::Depth => "depth",
        }
    }
}

impl fmt::Display for DimensionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DimensionKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "width" | "w" => Ok(DimensionKey::Width),
            "height" | "h" => Ok(DimensionKey::Height),
            "depth" | "d" => Ok(DimensionKey::Depth),
            other => Err(format!("unknown dimension '{other}'")),
        }
    }
}

/// Width/height/depth in millimetres.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: FieldValue,
    pub height: FieldValue,
    pub depth: FieldValue,
}

impl Dimensions {
    pub fn get(&self, key: DimensionKey) -> &FieldValue {
        match key {
            DimensionKey::Width => &self.width,
            DimensionKey::Height => &self.height,
            DimensionKey::Depth => &self.depth,
        }
    }

    pub fn get_mut(&mut self, key: DimensionKey) -> &mut FieldValue {
        match key {
            DimensionKey::Width => &mut self.width,
            DimensionKey::Height => &mut self.height,
            DimensionKey::Depth => &mut self.depth,
        }
    }

    pub fn is_empty(&self) -> bool {
        DimensionKey::ALL.iter().all(|k| self.get(*k).is_empty())
    }

    /// The numeric body sent to the update endpoint.
    pub fn to_update(&self) -> DimensionsUpdate {
        DimensionsUpdate {
            width: self.width.to_number(),
            height: self.height.to_number(),
            depth: self.depth.to_number(),
        }
    }
}

/// Body of the dimension update call.
///
/// Non-finite values serialize as JSON `null`; the backend decides whether
/// that is acceptable.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DimensionsUpdate {
    pub width: f64,
    pub height: f64,
    pub depth: f64,
}

/// Axis-aligned box in percent of the source image.
///
/// `width` and `height` are never negative.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl BBox {
    /// Build a box, collapsing negative (or NaN) extents to 0.
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width: non_negative(width),
            height: non_negative(height),
        }
    }
}

fn non_negative(v: f64) -> f64 {
    if v > 0.0 {
        v
    } else {
        0.0
    }
}

/// One recognized text fragment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OcrItem {
    pub id: String,
    pub key: String,
    pub text: String,
    pub value: String,
    pub bbox: Option<BBox>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

/// Editable copy of one mapped dimension.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimensionItem {
    pub id: String,
    pub key: String,
    pub value: String,
    pub unit: String,
    #[serde(rename = "sourceText")]
    pub source_text: String,
    pub bbox: Option<BBox>,
}

/// One confirmed value in a [`ConfirmationExport`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfirmedDimension {
    pub key: String,
    pub value: String,
    pub unit: String,
}

/// Confirmation artifact built from in-memory dimension items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfirmationExport {
    pub confirmed_dimensions: Vec<ConfirmedDimension>,
}

impl ConfirmationExport {
    pub fn from_items(items: &[DimensionItem]) -> Self {
        Self {
            confirmed_dimensions: items
                .iter()
                .map(|d| ConfirmedDimension {
                    key: d.key.clone(),
                    value: d.value.clone(),
                    unit: d.unit.clone(),
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coerce_number_like_a_form() {
        assert_eq!(coerce_number("12"), 12.0);
        assert_eq!(coerce_number(" 12.5 "), 12.5);
        assert_eq!(coerce_number(""), 0.0);
        assert_eq!(coerce_number("   "), 0.0);
        assert!(coerce_number("abc").is_nan());
        assert!(coerce_number("12mm").is_nan());
        assert!(coerce_number("nan").is_nan());
        assert!(coerce_number("inf").is_nan());
        assert_eq!(coerce_number("-Infinity"), f64::NEG_INFINITY);
    }

    #[test]
    fn field_value_serializes_untagged() {
        let d = Dimensions {
            width: FieldValue::Number(11.0),
            height: FieldValue::empty(),
            depth: FieldValue::Text("7".into()),
        };
        let json = serde_json::to_value(&d).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"width": 11.0, "height": "", "depth": "7"})
        );
    }

    #[test]
    fn update_body_turns_nan_into_null() {
        let d = Dimensions {
            width: FieldValue::Text("x".into()),
            height: FieldValue::Number(2.0),
            depth: FieldValue::empty(),
        };
        let json = serde_json::to_value(d.to_update()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"width": null, "height": 2.0, "depth": 0.0})
        );
    }

    #[test]
    fn bbox_collapses_negative_extent() {
        let b = BBox::new(5.0, 5.0, -3.0, f64::NAN);
        assert_eq!(b.width, 0.0);
        assert_eq!(b.height, 0.0);
    }

    #[test]
    fn number_display() {
        assert_eq!(FieldValue::Number(12.0).to_string(), "12");
        assert_eq!(FieldValue::Number(12.25).to_string(), "12.25");
        assert_eq!(format_number(0.0), "0");
    }

    #[test]
    fn dimension_key_parse() {
        assert_eq!("W".parse::<DimensionKey>().unwrap(), DimensionKey::Width);
        assert_eq!(
            "depth".parse::<DimensionKey>().unwrap(),
            DimensionKey::Depth
        );
        assert!("girth".parse::<DimensionKey>().is_err());
    }
}
