//! CLI output formatting tests.
//!
//! - JSON output with --json flag
//! - Pretty-print output as default

use eodhapi::{Collection, Item, PrettyPrint, Process};

fn make_test_collection() -> Collection {
    serde_json::from_value(serde_json::json!({
        "type": "Collection",
        "id": "cmip6",
        "title": "CMIP6",
        "description": "Climate model output",
        "license": "CC-BY-4.0",
        "keywords": ["climate", "model"],
        "extent": {
            "spatial": {"bbox": [[-180.0, -90.0, 180.0, 90.0]]},
            "temporal": {"interval": [["2015-01-01T00:00:00Z", null]]}
        },
        "links": [{"rel": "self", "href": "https://hub/collections/cmip6"}],
        "sci:doi": "10.5194/gmd-9-1937-2016"
    }))
    .unwrap()
}

fn make_test_item() -> Item {
    serde_json::from_value(serde_json::json!({
        "type": "Feature",
        "id": "scene-1",
        "collection": "sentinel2_ard",
        "geometry": {"type": "Point", "coordinates": [-3.0, 51.5]},
        "bbox": [-3.0, 51.5, -3.0, 51.5],
        "properties": {"datetime": "2023-06-01T11:00:00Z", "eo:cloud_cover": 4.5},
        "assets": {"cog": {"href": "https://data/scene-1.tif"}},
        "links": []
    }))
    .unwrap()
}

// ============================================================================
// JSON Output Tests
// ============================================================================

#[test]
fn test_json_output_preserves_unmodelled_fields() {
    let collection = make_test_collection();
    let parsed: serde_json::Value =
        serde_json::from_str(&serde_json::to_string_pretty(&collection).unwrap()).unwrap();

    assert_eq!(parsed["id"], "cmip6");
    assert_eq!(parsed["type"], "Collection");
    assert_eq!(parsed["sci:doi"], "10.5194/gmd-9-1937-2016");
    assert_eq!(parsed["extent"]["temporal"]["interval"][0][1], serde_json::Value::Null);
}

#[test]
fn test_json_for_list_outputs_array() {
    let items = vec![make_test_item(), make_test_item()];
    let parsed: serde_json::Value =
        serde_json::from_str(&serde_json::to_string_pretty(&items).unwrap()).unwrap();

    assert_eq!(parsed.as_array().map(Vec::len), Some(2));
    assert_eq!(parsed[0]["properties"]["eo:cloud_cover"], 4.5);
}

// ============================================================================
// Pretty-Print Tests
// ============================================================================

#[test]
fn test_default_output_is_not_json() {
    let pretty = make_test_item().pretty_print();
    assert!(serde_json::from_str::<serde_json::Value>(&pretty).is_err());
}

#[test]
fn test_collection_pretty_print() {
    let output = make_test_collection().pretty_print();

    assert!(output.starts_with("Collection: cmip6"));
    assert!(output.contains("License:        CC-BY-4.0"));
    assert!(output.contains("2015-01-01 00:00:00 UTC / .."));
    assert!(output.contains("Keywords:       climate, model"));
}

#[test]
fn test_item_pretty_print() {
    let output = make_test_item().pretty_print();

    assert!(output.starts_with("Item: scene-1"));
    assert!(output.contains("Collection:     sentinel2_ard"));
    assert!(output.contains("Datetime:       2023-06-01 11:00:00 UTC"));
    assert!(output.contains("Assets:         cog"));
}

#[test]
fn test_process_pretty_print_lists_inputs() {
    let process: Process = serde_json::from_value(serde_json::json!({
        "id": "convert-url",
        "title": "Convert URL",
        "version": "0.1.0",
        "inputs": {"size": {}, "url": {}},
        "outputs": {"converted": {}}
    }))
    .unwrap();

    let output = process.pretty_print();
    assert!(output.contains("Version:        0.1.0"));
    assert!(output.contains("Inputs:         size, url"));
    assert!(output.contains("Outputs:        converted"));
}
