//! Selection set and the batch transforms applied through it.
//!
//! Every transform here acts on the whole selection as a formation:
//!
//! - **Move** adds the same incremental delta to every member.
//! - **Rotate** points every member at the pointer, measured from the group
//!   centroid. All members receive the *same absolute angle*; relative
//!   orientation offsets are not preserved.
//! - **Resize** derives one clamped scale factor from the pointer's distance
//!   to the centroid and applies it to each member's *own* natural size, so a
//!   mixed selection does not end up uniform in absolute pixels.
//!
//! An empty selection turns every transform into a silent no-op.

#[cfg(test)]
#[path = "selection_test.rs"]
mod selection_test;

use crate::consts::{MAX_ROTATION_DEG, MAX_SCALE, MIN_SCALE};
use crate::doc::{ImageRef, ItemId, PlacedItem, Scene};
use crate::hit::group_centroid;
use crate::viewport::Point;

/// Ordered set of selected item handles.
///
/// Insertion order is kept: the first member anchors copy/paste. Members
/// must exist in the scene and be unlocked; the methods that add members
/// check this against the scene they are given.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selection {
    members: Vec<ItemId>,
    primary: Option<ItemId>,
}

impl Selection {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    #[must_use]
    pub fn contains(&self, id: &ItemId) -> bool {
        self.members.contains(id)
    }

    /// Members in insertion order.
    #[must_use]
    pub fn ids(&self) -> &[ItemId] {
        &self.members
    }

    /// The item targeted by single-item UI, if any.
    #[must_use]
    pub fn primary(&self) -> Option<ItemId> {
        self.primary
    }

    /// Designate a member as primary. Non-members are refused.
    pub fn set_primary(&mut self, id: ItemId) -> bool {
        if !self.contains(&id) {
            return false;
        }
        self.primary = Some(id);
        true
    }

    /// Add `id` if it is selectable. Returns whether it is now a member.
    pub fn insert(&mut self, scene: &Scene, id: ItemId) -> bool {
        if self.contains(&id) {
            return true;
        }
        if !is_selectable(scene, &id) {
            return false;
        }
        self.members.push(id);
        true
    }

    /// Remove `id`. Returns whether it was a member.
    pub fn remove(&mut self, id: &ItemId) -> bool {
        let before = self.members.len();
        self.members.retain(|m| m != id);
        if self.primary.as_ref() == Some(id) {
            self.primary = None;
        }
        self.members.len() != before
    }

    /// Add or remove `id`. Returns whether it is a member afterwards.
    pub fn toggle(&mut self, scene: &Scene, id: ItemId) -> bool {
        if self.remove(&id) { false } else { self.insert(scene, id) }
    }

    /// Replace the selection with a single item (if selectable).
    pub fn replace_with(&mut self, scene: &Scene, id: ItemId) {
        self.clear();
        self.insert(scene, id);
    }

    /// Replace the selection with every selectable id in `ids`.
    pub fn replace_all<I>(&mut self, scene: &Scene, ids: I)
    where
        I: IntoIterator<Item = ItemId>,
    {
        self.clear();
        for id in ids {
            self.insert(scene, id);
        }
    }

    pub fn clear(&mut self) {
        self.members.clear();
        self.primary = None;
    }

    /// Drop members that no longer exist or have become locked.
    pub fn prune(&mut self, scene: &Scene) {
        self.members.retain(|id| is_selectable(scene, id));
        if self.primary.is_some_and(|id| !is_selectable(scene, &id)) {
            self.primary = None;
        }
    }

    /// Selected items in selection order.
    pub fn items<'a>(&'a self, scene: &'a Scene) -> impl Iterator<Item = &'a PlacedItem> + 'a {
        self.members.iter().filter_map(|id| scene.get(id))
    }
}

fn is_selectable(scene: &Scene, id: &ItemId) -> bool {
    scene.get(id).is_some_and(|item| !item.locked)
}

// =============================================================
// Pointer-driven batch transforms
// =============================================================

/// Translate every selected item by `(dx, dy)`.
pub fn move_by(scene: &mut Scene, selection: &Selection, dx: f64, dy: f64) {
    for id in selection.ids() {
        if let Some(item) = scene.get_mut(id) {
            item.x += dx;
            item.y += dy;
        }
    }
}

/// Point every selected item at `pointer` from the group centroid.
///
/// Returns the assigned angle in radians, or `None` for an empty selection.
pub fn rotate_to(scene: &mut Scene, selection: &Selection, pointer: Point) -> Option<f64> {
    let center = group_centroid(selection.items(scene))?;
    let rotation = (pointer.y - center.y).atan2(pointer.x - center.x);
    set_rotation(scene, selection, rotation);
    Some(rotation)
}

/// Scale every selected item by the pointer's distance from the group centroid.
///
/// Returns the clamped scale factor, or `None` for an empty selection.
pub fn resize_to(scene: &mut Scene, selection: &Selection, pointer: Point) -> Option<f64> {
    let center = group_centroid(selection.items(scene))?;
    let sizes: Vec<f64> = selection.items(scene).map(|item| item.image.max_natural_dimension()).collect();
    #[allow(clippy::cast_precision_loss)]
    let mean_size = sizes.iter().sum::<f64>() / sizes.len() as f64;
    let scale = resize_scale(pointer.distance(center), mean_size)?;
    set_scale(scene, selection, scale);
    Some(scale)
}

/// Scale factor for a pointer `distance` from the centroid, given the mean
/// of the members' larger natural dimensions. Clamped to
/// [`MIN_SCALE`]..=[`MAX_SCALE`]; `None` when the mean size is not positive.
#[must_use]
pub fn resize_scale(distance: f64, mean_natural_size: f64) -> Option<f64> {
    if mean_natural_size <= 0.0 || !mean_natural_size.is_finite() {
        return None;
    }
    Some((distance / (mean_natural_size * 0.5)).clamp(MIN_SCALE, MAX_SCALE))
}

// =============================================================
// Absolute (slider-driven) transforms
// =============================================================

/// Assign `radians` to every selected item.
pub fn set_rotation(scene: &mut Scene, selection: &Selection, radians: f64) {
    for id in selection.ids() {
        if let Some(item) = scene.get_mut(id) {
            item.rotation = radians;
        }
    }
}

/// Size every selected item to `scale` times its natural size.
pub fn set_scale(scene: &mut Scene, selection: &Selection, scale: f64) {
    for id in selection.ids() {
        if let Some(item) = scene.get_mut(id) {
            item.width = item.image.natural_width * scale;
            item.height = item.image.natural_height * scale;
        }
    }
}

/// Clamp a slider rotation to `[0, 360]` degrees and convert to radians.
#[must_use]
pub fn slider_rotation(degrees: f64) -> f64 {
    degrees.clamp(0.0, MAX_ROTATION_DEG).to_radians()
}

/// Clamp a slider percentage to `[10, 200]` and convert to a scale factor.
#[must_use]
pub fn slider_scale(percent: f64) -> f64 {
    (percent / 100.0).clamp(MIN_SCALE, MAX_SCALE)
}

/// Mean rotation of the selection in whole degrees, for slider display.
#[must_use]
pub fn representative_rotation_deg(scene: &Scene, selection: &Selection) -> Option<f64> {
    mean(selection.items(scene).map(|item| item.rotation)).map(|r| r.to_degrees().round())
}

/// Mean `width / natural_width` of the selection as a whole percentage.
#[must_use]
pub fn representative_scale_percent(scene: &Scene, selection: &Selection) -> Option<f64> {
    mean(
        selection
            .items(scene)
            .filter(|item| item.image.natural_width > 0.0)
            .map(|item| item.width / item.image.natural_width),
    )
    .map(|s| (s * 100.0).round())
}

fn mean<I: Iterator<Item = f64>>(values: I) -> Option<f64> {
    let (sum, count) = values.fold((0.0, 0_usize), |(s, n), v| (s + v, n + 1));
    #[allow(clippy::cast_precision_loss)]
    let n = count as f64;
    (count > 0).then(|| sum / n)
}

/// Flip the mirror flag of one item. Returns the new value.
pub fn toggle_reversed(scene: &mut Scene, id: &ItemId) -> Option<bool> {
    let item = scene.get_mut(id)?;
    item.reversed = !item.reversed;
    Some(item.reversed)
}

// =============================================================
// Gesture snapshots
// =============================================================

/// Geometry of one item captured at the start of a gesture.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemSnapshot {
    pub id: ItemId,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub rotation: f64,
}

/// Capture the geometry of every selected item.
#[must_use]
pub fn snapshot(scene: &Scene, selection: &Selection) -> Vec<ItemSnapshot> {
    selection
        .items(scene)
        .map(|item| ItemSnapshot {
            id: item.id,
            x: item.x,
            y: item.y,
            width: item.width,
            height: item.height,
            rotation: item.rotation,
        })
        .collect()
}

/// Write captured geometry back. Items removed since the capture are skipped.
pub fn restore(scene: &mut Scene, snapshots: &[ItemSnapshot]) {
    for snap in snapshots {
        if let Some(item) = scene.get_mut(&snap.id) {
            item.x = snap.x;
            item.y = snap.y;
            item.width = snap.width;
            item.height = snap.height;
            item.rotation = snap.rotation;
        }
    }
}

// =============================================================
// Copy / paste
// =============================================================

/// One copied item, positioned relative to the copy anchor.
#[derive(Debug, Clone, PartialEq)]
pub struct ClipEntry {
    pub image: ImageRef,
    pub dx: f64,
    pub dy: f64,
    pub width: f64,
    pub height: f64,
    pub rotation: f64,
    pub reversed: bool,
}

/// Template produced by [`copy`]; can be pasted any number of times.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Clipboard {
    entries: Vec<ClipEntry>,
}

impl Clipboard {
    #[must_use]
    pub fn entries(&self) -> &[ClipEntry] {
        &self.entries
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Instantiate the template with the anchor at `center`.
    ///
    /// New items are content items with fresh ids, inserted above the
    /// background prefix. Returns their ids in template order.
    pub fn paste(&self, scene: &mut Scene, center: Point) -> Vec<ItemId> {
        self.entries
            .iter()
            .map(|entry| {
                let mut item = PlacedItem::new(
                    entry.image.clone(),
                    Point::new(center.x + entry.dx, center.y + entry.dy),
                    entry.width,
                    entry.height,
                );
                item.rotation = entry.rotation;
                item.reversed = entry.reversed;
                scene.insert_after_background(item)
            })
            .collect()
    }
}

/// Copy the selection relative to its first member. `None` when empty.
#[must_use]
pub fn copy(scene: &Scene, selection: &Selection) -> Option<Clipboard> {
    let anchor = selection.items(scene).next()?.center();
    let entries = selection
        .items(scene)
        .map(|item| ClipEntry {
            image: item.image.clone(),
            dx: item.x - anchor.x,
            dy: item.y - anchor.y,
            width: item.width,
            height: item.height,
            rotation: item.rotation,
            reversed: item.reversed,
        })
        .collect();
    Some(Clipboard { entries })
}
