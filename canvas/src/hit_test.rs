#![allow(clippy::float_cmp)]

use std::f64::consts::FRAC_PI_2;

use super::*;
use crate::doc::ImageRef;

fn item_at(x: f64, y: f64, w: f64, h: f64) -> PlacedItem {
    PlacedItem::new(ImageRef::new("items/trees/oak.png", "oak", w, h), Point::new(x, y), w, h)
}

fn locked(mut item: PlacedItem) -> PlacedItem {
    item.locked = true;
    item
}

// =============================================================
// is_point_in_item
// =============================================================

#[test]
fn centre_is_inside() {
    assert!(is_point_in_item(Point::new(100.0, 100.0), &item_at(100.0, 100.0, 40.0, 20.0)));
}

#[test]
fn hit_buffer_extends_bounds_by_two_pixels() {
    let item = item_at(100.0, 100.0, 40.0, 20.0);
    // Right edge at x=120; buffer reaches 122.
    assert!(is_point_in_item(Point::new(121.9, 100.0), &item));
    assert!(is_point_in_item(Point::new(122.0, 100.0), &item));
    assert!(!is_point_in_item(Point::new(122.1, 100.0), &item));
}

#[test]
fn rotated_item_uses_its_own_frame() {
    let mut item = item_at(0.0, 0.0, 100.0, 10.0);
    item.rotation = FRAC_PI_2;
    // Long axis is now vertical.
    assert!(is_point_in_item(Point::new(0.0, 45.0), &item));
    assert!(!is_point_in_item(Point::new(45.0, 0.0), &item));
}

#[test]
fn locked_item_is_never_hit() {
    let item = locked(item_at(100.0, 100.0, 40.0, 20.0));
    assert!(!is_point_in_item(Point::new(100.0, 100.0), &item));
}

#[test]
fn to_item_frame_undoes_rotation() {
    let mut item = item_at(10.0, 10.0, 20.0, 20.0);
    item.rotation = FRAC_PI_2;
    let local = to_item_frame(Point::new(10.0, 15.0), &item);
    assert!((local.x - 5.0).abs() < 1e-9);
    assert!(local.y.abs() < 1e-9);
}

// =============================================================
// group_centroid
// =============================================================

#[test]
fn centroid_of_empty_group_is_none() {
    assert!(group_centroid(std::iter::empty::<&PlacedItem>()).is_none());
}

#[test]
fn centroid_is_mean_of_centres() {
    let items = [item_at(0.0, 0.0, 10.0, 10.0), item_at(100.0, 50.0, 10.0, 10.0)];
    assert_eq!(group_centroid(&items), Some(Point::new(50.0, 25.0)));
}

// =============================================================
// pick
// =============================================================

#[test]
fn pick_prefers_topmost_overlapping_item() {
    let mut scene = Scene::new();
    let a = scene.insert_after_background(item_at(100.0, 100.0, 50.0, 50.0));
    let b = scene.insert_after_background(item_at(110.0, 110.0, 50.0, 50.0));
    // b was inserted beneath a; bring it to the top.
    let index = scene.index_of(&b).unwrap();
    scene.reorder_to_front(index);
    assert_eq!(pick(&scene, Point::new(105.0, 105.0)), Some(b));
    assert_eq!(pick(&scene, Point::new(80.0, 80.0)), Some(a));
}

#[test]
fn pick_skips_locked_top_item() {
    let mut scene = Scene::new();
    let below = scene.insert_after_background(item_at(100.0, 100.0, 50.0, 50.0));
    let above = locked(item_at(100.0, 100.0, 50.0, 50.0));
    let above_id = above.id;
    scene.insert_after_background(above);
    let index = scene.index_of(&above_id).unwrap();
    scene.reorder_to_front(index);
    assert_eq!(pick(&scene, Point::new(100.0, 100.0)), Some(below));
}

#[test]
fn pick_on_empty_canvas_is_none() {
    let mut scene = Scene::new();
    scene.insert_after_background(item_at(100.0, 100.0, 50.0, 50.0));
    assert_eq!(pick(&scene, Point::new(400.0, 400.0)), None);
}

#[test]
fn pick_ignores_background_tiles() {
    let mut scene = Scene::new();
    scene.append_background(PlacedItem::background_tile(
        ImageRef::new("items/background/tile1.png", "tile1", 64.0, 64.0),
        Point::new(32.0, 32.0),
        64.0,
    ));
    assert_eq!(pick(&scene, Point::new(32.0, 32.0)), None);
}

// =============================================================
// marquee_members
// =============================================================

#[test]
fn marquee_selects_unlocked_centres_strictly_inside() {
    let mut scene = Scene::new();
    scene.insert_after_background(locked(item_at(10.0, 10.0, 8.0, 8.0)));
    let inside = scene.insert_after_background(item_at(50.0, 50.0, 8.0, 8.0));
    scene.insert_after_background(item_at(200.0, 200.0, 8.0, 8.0));
    let rect = Rect::from_corners(Point::new(0.0, 0.0), Point::new(100.0, 100.0));
    assert_eq!(marquee_members(&scene, rect), vec![inside]);
}

#[test]
fn marquee_excludes_centre_on_edge() {
    let mut scene = Scene::new();
    scene.insert_after_background(item_at(100.0, 50.0, 8.0, 8.0));
    let rect = Rect::new(0.0, 0.0, 100.0, 100.0);
    assert!(marquee_members(&scene, rect).is_empty());
}

#[test]
fn marquee_uses_centre_not_overlap() {
    let mut scene = Scene::new();
    // Large item overlapping the rect but centred outside it.
    scene.insert_after_background(item_at(150.0, 50.0, 200.0, 50.0));
    let rect = Rect::new(0.0, 0.0, 100.0, 100.0);
    assert!(marquee_members(&scene, rect).is_empty());
}
