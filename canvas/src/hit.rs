//! Hit-testing: oriented item bounds, top-most picking, and marquee membership.
//!
//! All inputs are in canvas space; convert pointer positions with
//! [`crate::viewport::ViewportMetrics::to_canvas`] first.

#[cfg(test)]
#[path = "hit_test.rs"]
mod hit_test;

use crate::consts::HIT_BUFFER_PX;
use crate::doc::{ItemId, PlacedItem, Scene};
use crate::viewport::{Point, Rect};

/// Whether `point` falls inside the item's rotated bounds, enlarged by
/// [`HIT_BUFFER_PX`] on every side. Locked items are never hit.
#[must_use]
pub fn is_point_in_item(point: Point, item: &PlacedItem) -> bool {
    if item.locked {
        return false;
    }
    let local = to_item_frame(point, item);
    let half_w = (item.width + 2.0 * HIT_BUFFER_PX) / 2.0;
    let half_h = (item.height + 2.0 * HIT_BUFFER_PX) / 2.0;
    local.x.abs() <= half_w && local.y.abs() <= half_h
}

/// Express `point` in the item's unrotated local frame (origin at its centre).
#[must_use]
pub fn to_item_frame(point: Point, item: &PlacedItem) -> Point {
    let dx = point.x - item.x;
    let dy = point.y - item.y;
    let (sin, cos) = (-item.rotation).sin_cos();
    Point { x: dx * cos - dy * sin, y: dx * sin + dy * cos }
}

/// Arithmetic mean of the item centres, or `None` for an empty group.
#[must_use]
pub fn group_centroid<'a, I>(items: I) -> Option<Point>
where
    I: IntoIterator<Item = &'a PlacedItem>,
{
    let mut sum_x = 0.0_f64;
    let mut sum_y = 0.0_f64;
    let mut count = 0_usize;
    for item in items {
        sum_x += item.x;
        sum_y += item.y;
        count += 1;
    }
    if count == 0 {
        return None;
    }
    #[allow(clippy::cast_precision_loss)]
    let n = count as f64;
    Some(Point::new(sum_x / n, sum_y / n))
}

/// The top-most unlocked item under `point`.
#[must_use]
pub fn pick(scene: &Scene, point: Point) -> Option<ItemId> {
    scene
        .items()
        .iter()
        .rev()
        .find(|item| !item.locked && is_point_in_item(point, item))
        .map(|item| item.id)
}

/// Unlocked items whose centre lies strictly inside `rect`, in paint order.
#[must_use]
pub fn marquee_members(scene: &Scene, rect: Rect) -> Vec<ItemId> {
    scene
        .items()
        .iter()
        .filter(|item| !item.locked && rect.contains_strict(item.center()))
        .map(|item| item.id)
        .collect()
}
