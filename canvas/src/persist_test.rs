#![allow(clippy::float_cmp)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use futures::executor::block_on;
use serde_json::json;

use super::*;

// =============================================================
// Helpers
// =============================================================

/// Resolves sources from a fixed table; anything else fails.
#[derive(Default)]
struct TableResolver {
    sizes: HashMap<String, (f64, f64)>,
    calls: AtomicUsize,
}

impl TableResolver {
    fn with(sources: &[(&str, f64, f64)]) -> Self {
        Self {
            sizes: sources.iter().map(|(src, w, h)| ((*src).to_owned(), (*w, *h))).collect(),
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl ImageResolver for TableResolver {
    async fn resolve(&self, src: &str, alt: &str) -> Result<ResolvedImage, ResolveError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.sizes.get(src) {
            Some((w, h)) => Ok(ResolvedImage::new(ImageRef::new(src, alt, *w, *h))),
            None => Err(ResolveError::new(src, "not found")),
        }
    }
}

fn record(src: &str, x: f64, locked: bool) -> serde_json::Value {
    json!({
        "src": src,
        "alt": "alt",
        "x": x,
        "y": 20.0,
        "width": 30.0,
        "height": 40.0,
        "rotation": 0.5,
        "reversed": false,
        "locked": locked,
    })
}

fn sample_scene() -> Scene {
    let mut scene = Scene::new();
    scene.append_background(PlacedItem::background_tile(
        ImageRef::new("items/background/tile1.png", "tile1", 64.0, 64.0),
        Point::new(32.0, 32.0),
        64.0,
    ));
    let mut oak = PlacedItem::new(ImageRef::new("items/trees/oak.png", "oak", 200.0, 300.0), Point::new(100.0, 120.0), 50.0, 75.0);
    oak.rotation = 1.25;
    oak.reversed = true;
    scene.insert_after_background(oak);
    scene.push_line(DrawnLine { start: Point::new(1.0, 2.0), end: Point::new(30.0, 40.0), color: "#ff0000".to_owned() });
    scene
}

// =============================================================
// Export format
// =============================================================

#[test]
fn export_uses_camel_case_root_keys() {
    let text = export_json(&sample_scene()).unwrap();
    let value: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert!(value.get("placedItems").is_some());
    assert!(value.get("drawnLines").is_some());
}

#[test]
fn export_item_fields_are_exact() {
    let text = export_json(&sample_scene()).unwrap();
    let value: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(
        value["placedItems"][1],
        json!({
            "src": "items/trees/oak.png",
            "alt": "oak",
            "x": 100.0,
            "y": 120.0,
            "width": 50.0,
            "height": 75.0,
            "rotation": 1.25,
            "reversed": true,
            "locked": false,
        })
    );
    assert_eq!(value["drawnLines"][0], json!({ "start": { "x": 1.0, "y": 2.0 }, "end": { "x": 30.0, "y": 40.0 }, "color": "#ff0000" }));
}

#[test]
fn export_is_pretty_printed_with_two_spaces() {
    let text = export_json(&Scene::new()).unwrap();
    assert!(text.contains("\n  \"placedItems\""));
}

// =============================================================
// Parsing
// =============================================================

#[test]
fn blank_input_is_empty_error() {
    assert!(matches!(parse_scene("   \n"), Err(PersistError::EmptyInput)));
}

#[test]
fn non_json_is_malformed() {
    assert!(matches!(parse_scene("{ not json"), Err(PersistError::Malformed(_))));
}

#[test]
fn missing_placed_items_is_malformed() {
    assert!(matches!(parse_scene(r#"{ "drawnLines": [] }"#), Err(PersistError::Malformed(_))));
}

#[test]
fn missing_drawn_lines_is_tolerated() {
    let text = json!({ "placedItems": [record("a.png", 1.0, false)] }).to_string();
    let file = parse_scene(&text).unwrap();
    assert_eq!(file.placed_items.len(), 1);
    assert!(file.drawn_lines.is_empty());
}

#[test]
fn non_positive_size_is_invalid_item() {
    let mut bad = record("a.png", 1.0, false);
    bad["width"] = json!(0.0);
    let text = json!({ "placedItems": [record("ok.png", 1.0, false), bad] }).to_string();
    assert!(matches!(parse_scene(&text), Err(PersistError::InvalidItem { index: 1, .. })));
}

#[test]
fn blank_source_is_invalid_item() {
    let text = json!({ "placedItems": [record("  ", 1.0, false)] }).to_string();
    assert!(matches!(parse_scene(&text), Err(PersistError::InvalidItem { index: 0, .. })));
}

#[test]
fn out_of_range_line_is_invalid_line() {
    let line = |x: f64| json!({ "start": { "x": 0.0, "y": 0.0 }, "end": { "x": x, "y": 10.0 }, "color": "#000" });
    let text = json!({ "placedItems": [], "drawnLines": [line(50.0), line(1e300)] }).to_string();
    assert!(matches!(parse_scene(&text), Err(PersistError::InvalidLine { index: 1, .. })));
    let text = json!({ "placedItems": [], "drawnLines": [line(-2.0 * MAX_COORDINATE)] }).to_string();
    let err = parse_scene(&text).unwrap_err();
    assert!(matches!(err, PersistError::InvalidLine { index: 0, .. }));
    assert_eq!(err.user_message(), "Invalid JSON format. Please check the input and try again.");
}

#[test]
fn line_at_coordinate_limit_is_accepted() {
    let text = json!({
        "placedItems": [],
        "drawnLines": [{ "start": { "x": -MAX_COORDINATE, "y": 0.0 }, "end": { "x": MAX_COORDINATE, "y": 0.0 }, "color": "red" }],
    })
    .to_string();
    assert_eq!(parse_scene(&text).unwrap().drawn_lines.len(), 1);
}

#[test]
fn user_messages_distinguish_failure_kinds() {
    let empty = PersistError::EmptyInput.user_message();
    let malformed = parse_scene("nope").map(|_| ()).unwrap_err().user_message();
    let resolve = PersistError::Resolve { failed: 1, total: 2, first: ResolveError::new("x", "y") }.user_message();
    assert_eq!(empty, "Please paste a valid JSON string.");
    assert_eq!(malformed, "Invalid JSON format. Please check the input and try again.");
    assert_eq!(resolve, "Error loading images. Please check the JSON data and try again.");
}

// =============================================================
// Loading
// =============================================================

#[test]
fn round_trip_preserves_items_and_lines() {
    let original = sample_scene();
    let text = export_json(&original).unwrap();
    let resolver = TableResolver::with(&[("items/background/tile1.png", 64.0, 64.0), ("items/trees/oak.png", 200.0, 300.0)]);
    let loaded = block_on(load_scene(&text, &resolver, &SceneConfig::default())).unwrap();

    assert_eq!(loaded.len(), original.len());
    for (a, b) in loaded.items().iter().zip(original.items()) {
        assert_eq!(a.image, b.image);
        assert_eq!((a.x, a.y, a.width, a.height, a.rotation), (b.x, b.y, b.width, b.height, b.rotation));
        assert_eq!((a.reversed, a.locked, a.layer), (b.reversed, b.locked, b.layer));
    }
    assert_eq!(loaded.lines(), original.lines());
}

#[test]
fn loaded_items_get_fresh_ids() {
    let original = sample_scene();
    let text = export_json(&original).unwrap();
    let resolver = TableResolver::with(&[("items/background/tile1.png", 64.0, 64.0), ("items/trees/oak.png", 200.0, 300.0)]);
    let loaded = block_on(load_scene(&text, &resolver, &SceneConfig::default())).unwrap();
    assert_ne!(loaded.items()[1].id, original.items()[1].id);
}

#[test]
fn one_failed_image_fails_the_whole_import() {
    let text = json!({
        "placedItems": [record("a.png", 1.0, false), record("missing.png", 2.0, false), record("c.png", 3.0, false)],
    })
    .to_string();
    let resolver = TableResolver::with(&[("a.png", 10.0, 10.0), ("c.png", 10.0, 10.0)]);
    let err = block_on(load_scene(&text, &resolver, &SceneConfig::default())).unwrap_err();
    match err {
        PersistError::Resolve { failed, total, first } => {
            assert_eq!((failed, total), (1, 3));
            assert_eq!(first.src, "missing.png");
        }
        other => panic!("expected Resolve, got {other:?}"),
    }
}

#[test]
fn every_image_is_resolved_even_after_a_failure() {
    let text = json!({
        "placedItems": [record("missing.png", 1.0, false), record("a.png", 2.0, false), record("b.png", 3.0, false)],
    })
    .to_string();
    let resolver = TableResolver::with(&[("a.png", 10.0, 10.0)]);
    let err = block_on(load_scene(&text, &resolver, &SceneConfig::default())).unwrap_err();
    assert!(matches!(err, PersistError::Resolve { failed: 2, total: 3, .. }));
    assert_eq!(resolver.calls.load(Ordering::SeqCst), 3);
}

#[test]
fn parse_errors_skip_resolution() {
    let resolver = TableResolver::default();
    let err = block_on(load_scene("", &resolver, &SceneConfig::default())).unwrap_err();
    assert!(matches!(err, PersistError::EmptyInput));
    assert_eq!(resolver.calls.load(Ordering::SeqCst), 0);
}

#[test]
fn locked_tile_sources_become_background_prefix() {
    let text = json!({
        "placedItems": [
            record("items/trees/oak.png", 1.0, false),
            record("items/background/tile2.png", 2.0, true),
            record("items/background/tile1.png", 3.0, false),
        ],
    })
    .to_string();
    let resolver = TableResolver::with(&[
        ("items/trees/oak.png", 10.0, 10.0),
        ("items/background/tile1.png", 64.0, 64.0),
        ("items/background/tile2.png", 64.0, 64.0),
    ]);
    let scene = block_on(load_scene(&text, &resolver, &SceneConfig::default())).unwrap();
    assert_eq!(scene.background_len(), 1);
    assert_eq!(scene.items()[0].x, 2.0);
    // Unlocked tile image counts as content and keeps its relative order.
    assert_eq!(scene.items()[1].x, 1.0);
    assert_eq!(scene.items()[2].x, 3.0);
    assert!(scene.is_layer_ordered());
}

#[test]
fn locked_content_stays_content() {
    let text = json!({ "placedItems": [record("items/rocks/big.png", 1.0, true)] }).to_string();
    let resolver = TableResolver::with(&[("items/rocks/big.png", 10.0, 10.0)]);
    let scene = block_on(load_scene(&text, &resolver, &SceneConfig::default())).unwrap();
    assert_eq!(scene.items()[0].layer, Layer::Content);
    assert!(scene.items()[0].locked);
}
