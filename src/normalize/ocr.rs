//! Two-phase pipeline shapes: OCR items and mapped dimension items.

use super::bbox::normalize_bbox;
use super::dimensions::DIMENSIONS_MM;
use super::locate::{field, locate, number_of, text_of, Path};
use crate::model::{DimensionItem, OcrItem};
use serde_json::Value;
use std::collections::HashSet;
use tracing::debug;

/// Where the OCR item sequence may live.
pub const OCR_ITEMS: &[Path] = &[
    &["items"],
    &["results"],
    &["ocr"],
    &["data", "items"],
    &["data", "ocr"],
];

/// Where an explicit mapped-dimension sequence may live.
pub const DIMENSION_ITEMS: &[Path] = &[
    &["dimensions"],
    &["data", "dimensions"],
    &["mapped_dimensions"],
    &["mapping_items"],
    &["data", "mapping_items"],
];

/// Extra flat-object locations the mapping endpoint uses, tried after
/// [`DIMENSIONS_MM`].
pub const MAPPED_DIMENSIONS_MM: &[Path] = &[
    &["mapped_dimensions_mm"],
    &["data", "mapped_dimensions_mm"],
];

/// Where mapping warnings may live.
pub const WARNINGS: &[Path] = &[&["warnings"], &["data", "warnings"]];

pub const DEFAULT_UNIT: &str = "mm";

/// Normalize OCR items in source order; the order is the display order.
pub fn normalize_ocr_items(payload: Option<&Value>) -> Vec<OcrItem> {
    let entries = sequence(payload, OCR_ITEMS, Value::is_array);
    let mut ids = UniqueIds::default();

    let items: Vec<OcrItem> = entries
        .iter()
        .enumerate()
        .map(|(index, entry)| {
            let text = text_at(entry, &["text", "value"]).unwrap_or_default();
            OcrItem {
                id: ids.claim(text_at(entry, &["id"]), || format!("ocr-{index}")),
                key: text_at(entry, &["key", "label", "name"])
                    .unwrap_or_else(|| format!("item-{}", index + 1)),
                value: text_at(entry, &["value"]).unwrap_or_else(|| text.clone()),
                text,
                bbox: normalize_bbox(entry),
                confidence: field(entry, &["confidence"]).and_then(number_of),
            }
        })
        .collect();

    debug!("Normalized {} OCR items", items.len());
    items
}

/// Normalize mapped dimensions.
///
/// Prefers an explicit non-empty item sequence; otherwise synthesizes one
/// item per key of a flat `dimensions_mm`-style object. Returns an empty
/// vector when neither exists.
pub fn normalize_dimension_items(payload: Option<&Value>) -> Vec<DimensionItem> {
    let entries = sequence(payload, DIMENSION_ITEMS, non_empty_array);
    if !entries.is_empty() {
        let mut ids = UniqueIds::default();
        let items: Vec<DimensionItem> = entries
            .iter()
            .enumerate()
            .map(|(index, entry)| DimensionItem {
                id: ids.claim(text_at(entry, &["id"]), || format!("dim-{index}")),
                key: text_at(entry, &["key", "label", "name", "target"])
                    .unwrap_or_else(|| format!("dimension-{}", index + 1)),
                value: text_at(entry, &["value", "value_mm"]).unwrap_or_default(),
                unit: text_at(entry, &["unit"])
                    .filter(|u| !u.is_empty())
                    .unwrap_or_else(|| DEFAULT_UNIT.to_string()),
                source_text: text_at(entry, &["source_text", "text"]).unwrap_or_default(),
                bbox: normalize_bbox(entry),
            })
            .collect();
        debug!("Normalized {} mapped dimension items", items.len());
        return items;
    }

    let Some(payload) = payload else {
        return Vec::new();
    };
    let flat = locate(payload, DIMENSIONS_MM, Value::is_object)
        .or_else(|| locate(payload, MAPPED_DIMENSIONS_MM, Value::is_object))
        .and_then(Value::as_object);

    match flat {
        Some(map) => map
            .iter()
            .map(|(key, value)| DimensionItem {
                id: key.clone(),
                key: key.clone(),
                value: text_of(value),
                unit: DEFAULT_UNIT.to_string(),
                source_text: String::new(),
                bbox: None,
            })
            .collect(),
        None => {
            debug!("No dimensions found in mapping response");
            Vec::new()
        }
    }
}

/// String warnings attached to a mapping response.
pub fn mapping_warnings(payload: Option<&Value>) -> Vec<String> {
    sequence(payload, WARNINGS, Value::is_array)
        .iter()
        .filter_map(|w| w.as_str().map(str::to_string))
        .collect()
}

fn sequence<'a>(
    payload: Option<&'a Value>,
    candidates: &[Path],
    accept: impl Fn(&Value) -> bool,
) -> &'a [Value] {
    payload
        .and_then(|p| locate(p, candidates, accept))
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

fn text_at(entry: &Value, keys: &[&str]) -> Option<String> {
    field(entry, keys).map(text_of)
}

fn non_empty_array(v: &Value) -> bool {
    v.as_array().is_some_and(|a| !a.is_empty())
}

/// Hands out ids that are unique within one result set.
#[derive(Default)]
struct UniqueIds {
    seen: HashSet<String>,
}

impl UniqueIds {
    fn claim(&mut self, source: Option<String>, synthesize: impl FnOnce() -> String) -> String {
        let base = source.filter(|s| !s.is_empty()).unwrap_or_else(synthesize);
        let mut id = base.clone();
        let mut n = 1;
        while !self.seen.insert(id.clone()) {
            id = format!("{base}-{n}");
            n += 1;
        }
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::BBox;
    use serde_json::json;

    #[test]
    fn ocr_items_defaults() {
        let v = json!({"items": [
            {"text": "W 120 mm", "confidence": 0.91, "bbox": [1, 2, 3, 4]},
            {"label": "H", "value": 80},
            {}
        ]});
        let items = normalize_ocr_items(Some(&v));
        assert_eq!(items.len(), 3);

        assert_eq!(items[0].id, "ocr-0");
        assert_eq!(items[0].key, "item-1");
        assert_eq!(items[0].text, "W 120 mm");
        assert_eq!(items[0].value, "W 120 mm");
        assert_eq!(items[0].confidence, Some(0.91));
        assert_eq!(items[0].bbox, Some(BBox::new(1.0, 2.0, 3.0, 4.0)));

        assert_eq!(items[1].key, "H");
        assert_eq!(items[1].text, "80");
        assert_eq!(items[1].value, "80");
        assert_eq!(items[1].confidence, None);
        assert_eq!(items[1].bbox, None);

        assert_eq!(items[2].id, "ocr-2");
        assert_eq!(items[2].text, "");
        assert_eq!(items[2].value, "");
    }

    #[test]
    fn numeric_string_confidence_is_kept() {
        let v = json!({"items": [
            {"text": "W", "confidence": "0.93"},
            {"text": "H", "confidence": " 1 "},
            {"text": "D", "confidence": "high"}
        ]});
        let items = normalize_ocr_items(Some(&v));
        assert_eq!(items[0].confidence, Some(0.93));
        assert_eq!(items[1].confidence, Some(1.0));
        assert_eq!(items[2].confidence, None);
    }

    #[test]
    fn ocr_items_from_alternate_locations() {
        let v = json!({"data": {"ocr": [{"id": "a", "text": "x"}]}});
        let items = normalize_ocr_items(Some(&v));
        assert_eq!(items[0].id, "a");

        let v = json!({"items": "not-a-list", "results": [{"text": "y"}]});
        assert_eq!(normalize_ocr_items(Some(&v))[0].text, "y");

        assert!(normalize_ocr_items(Some(&json!({"items": {}}))).is_empty());
        assert!(normalize_ocr_items(None).is_empty());
    }

    #[test]
    fn ocr_ids_stay_unique() {
        let v = json!({"items": [{"id": "x"}, {"id": "x"}, {"id": "ocr-3"}, {}]});
        let ids: Vec<String> = normalize_ocr_items(Some(&v))
            .into_iter()
            .map(|i| i.id)
            .collect();
        assert_eq!(ids, vec!["x", "x-1", "ocr-3", "ocr-3-1"]);
    }

    #[test]
    fn explicit_dimension_items() {
        let v = json!({"dimensions": [
            {
                "id": "d1",
                "key": "width",
                "value": 120,
                "source_text": "W 120",
                "bbox": {"x": 1, "y": 2, "width": 3, "height": 4}
            },
            {"key": "height", "value": "80", "unit": "cm", "text": "H 8cm"}
        ]});
        let items = normalize_dimension_items(Some(&v));
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].id, "d1");
        assert_eq!(items[0].value, "120");
        assert_eq!(items[0].unit, "mm");
        assert_eq!(items[0].source_text, "W 120");
        assert!(items[0].bbox.is_some());
        assert_eq!(items[1].id, "dim-1");
        assert_eq!(items[1].unit, "cm");
        assert_eq!(items[1].source_text, "H 8cm");
    }

    #[test]
    fn mapping_items_use_target_and_value_mm() {
        let v = json!({"mapping_items": [
            {"target": "depth", "value_mm": 30.0, "source_text": "D 3 cm", "source_index": 2}
        ]});
        let items = normalize_dimension_items(Some(&v));
        assert_eq!(items[0].key, "depth");
        assert_eq!(items[0].value, "30");
    }

    #[test]
    fn flat_object_fallback_keeps_order() {
        let v = json!({
            "dimensions": [],
            "data": {"dimensions_mm": {"width": 12, "height": 34.5, "depth": null}}
        });
        let items = normalize_dimension_items(Some(&v));
        let keys: Vec<&str> = items.iter().map(|i| i.key.as_str()).collect();
        assert_eq!(keys, vec!["width", "height", "depth"]);
        assert_eq!(items[0].id, "width");
        assert_eq!(items[0].value, "12");
        assert_eq!(items[1].value, "34.5");
        assert_eq!(items[2].value, "");
        assert!(items.iter().all(|i| i.unit == "mm" && i.bbox.is_none()));
    }

    #[test]
    fn empty_sequence_defers_to_next_candidate() {
        let v = json!({"dimensions": [], "mapped_dimensions": [{"key": "width", "value": 5}]});
        let items = normalize_dimension_items(Some(&v));
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].value, "5");
    }

    #[test]
    fn mapped_dimensions_mm_fallback() {
        let v = json!({"mapped_dimensions_mm": {"width": 10.0, "height": 20.0}});
        let items = normalize_dimension_items(Some(&v));
        assert_eq!(items.len(), 2);
        assert_eq!(items[1].value, "20");
    }

    #[test]
    fn nothing_extracted_is_empty_not_error() {
        assert!(normalize_dimension_items(Some(&json!({"ok": true}))).is_empty());
        assert!(normalize_dimension_items(None).is_empty());
    }

    #[test]
    fn warnings_are_strings_only() {
        let v = json!({"warnings": ["missing_required:depth", 3, null]});
        assert_eq!(mapping_warnings(Some(&v)), vec!["missing_required:depth"]);
        assert!(mapping_warnings(Some(&json!({}))).is_empty());
    }
}
