//! Tests for the COCO JSON format.

use serde_json::Value;

use super::sample_document;
use crate::export::formats::CocoFormat;
use crate::export::traits::ExportFormat;

fn encode() -> Value {
    let bytes = CocoFormat.encode(&sample_document()).expect("encode");
    serde_json::from_slice(&bytes).expect("valid JSON")
}

#[test]
fn test_coco_format_metadata() {
    let format = CocoFormat;
    assert_eq!(format.id(), "coco");
    assert_eq!(format.display_name(), "COCO (JSON)");
    assert_eq!(format.extension(), "json");
}

#[test]
fn test_coco_single_image() {
    let coco = encode();
    let images = coco["images"].as_array().expect("images");

    assert_eq!(images.len(), 1);
    assert_eq!(images[0]["file_name"], "plan.png");
    assert_eq!(images[0]["width"], 1024);
    assert_eq!(images[0]["height"], 768);
}

#[test]
fn test_coco_categories_in_first_appearance_order() {
    let coco = encode();
    let categories = coco["categories"].as_array().expect("categories");

    assert_eq!(categories.len(), 2);
    assert_eq!(categories[0]["id"], 1);
    assert_eq!(categories[0]["name"], "Valve");
    assert_eq!(categories[1]["id"], 2);
    assert_eq!(categories[1]["name"], "Pump");
}

#[test]
fn test_coco_annotations() {
    let coco = encode();
    let annotations = coco["annotations"].as_array().expect("annotations");

    assert_eq!(annotations.len(), 2);
    let pump = &annotations[1];
    assert_eq!(pump["category_id"], 2);
    assert_eq!(pump["image_id"], 1);
    // COCO bbox is [x, y, width, height]
    assert_eq!(pump["bbox"], serde_json::json!([300.0, 150.0, 60.0, 50.0]));
    assert_eq!(pump["area"], 3000.0);
    assert_eq!(pump["iscrowd"], 0);
    assert!((pump["score"].as_f64().expect("score") - 0.88).abs() < 1e-6);
}
