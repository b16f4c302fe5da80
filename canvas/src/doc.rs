//! Scene model: placed items, drawn lines, and the ordered store that owns them.
//!
//! The item sequence is the paint order: index 0 is painted first and sits
//! furthest back. Items carry an explicit [`Layer`] tag, and the store keeps
//! every [`Layer::Background`] item in a contiguous prefix so generated
//! background tiles always stay beneath user content.
//!
//! Items are addressed by a stable [`ItemId`]. Indices shift on every
//! insertion or removal, so callers holding on to an item across mutations
//! must re-resolve it through [`Scene::index_of`].

#[cfg(test)]
#[path = "doc_test.rs"]
mod doc_test;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::viewport::Point;

/// Stable identifier for a placed item. Never persisted.
pub type ItemId = Uuid;

/// Paint band an item belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Layer {
    /// Generated tiling fill, kept in the front of the paint order.
    Background,
    /// User-placed item.
    #[default]
    Content,
}

/// A resolved raster image: where it came from and its natural size.
///
/// Only resolved images can become items, so everything in a [`Scene`] is
/// paintable.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageRef {
    /// Source identifier (path or URL) the image was loaded from.
    pub src: String,
    /// Human-readable label, usually the file name.
    pub alt: String,
    /// Natural pixel width of the decoded image.
    pub natural_width: f64,
    /// Natural pixel height of the decoded image.
    pub natural_height: f64,
}

impl ImageRef {
    #[must_use]
    pub fn new(src: impl Into<String>, alt: impl Into<String>, natural_width: f64, natural_height: f64) -> Self {
        Self { src: src.into(), alt: alt.into(), natural_width, natural_height }
    }

    /// The larger of the two natural dimensions.
    #[must_use]
    pub fn max_natural_dimension(&self) -> f64 {
        self.natural_width.max(self.natural_height)
    }
}

/// An image instance placed on the canvas.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedItem {
    /// Stable handle used by the selection.
    pub id: ItemId,
    /// Image drawn for this item.
    pub image: ImageRef,
    /// Centre x in canvas pixels.
    pub x: f64,
    /// Centre y in canvas pixels.
    pub y: f64,
    /// Rendered width, always positive.
    pub width: f64,
    /// Rendered height, always positive.
    pub height: f64,
    /// Radians, counter-clockwise from the positive x axis.
    pub rotation: f64,
    /// Mirror horizontally about the centre before rotating.
    pub reversed: bool,
    /// Locked items are painted but never hit, selected, or dragged.
    pub locked: bool,
    /// Paint band.
    pub layer: Layer,
}

impl PlacedItem {
    /// Create an unlocked, unrotated content item with a fresh id.
    #[must_use]
    pub fn new(image: ImageRef, center: Point, width: f64, height: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            image,
            x: center.x,
            y: center.y,
            width,
            height,
            rotation: 0.0,
            reversed: false,
            locked: false,
            layer: Layer::Content,
        }
    }

    /// Create a locked background tile with a fresh id.
    #[must_use]
    pub fn background_tile(image: ImageRef, center: Point, size: f64) -> Self {
        Self { locked: true, layer: Layer::Background, ..Self::new(image, center, size, size) }
    }

    #[must_use]
    pub fn center(&self) -> Point {
        Point::new(self.x, self.y)
    }

    #[must_use]
    pub fn is_background(&self) -> bool {
        self.layer == Layer::Background
    }
}

/// A dotted straight segment drawn over the scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrawnLine {
    pub start: Point,
    pub end: Point,
    /// Stroke colour token, e.g. `"#ff0000"` or `"red"`.
    pub color: String,
}

/// Ordered store of placed items and drawn lines.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Scene {
    items: Vec<PlacedItem>,
    lines: Vec<DrawnLine>,
}

impl Scene {
    /// Create an empty scene.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Items in paint order.
    #[must_use]
    pub fn items(&self) -> &[PlacedItem] {
        &self.items
    }

    /// Drawn lines in paint order.
    #[must_use]
    pub fn lines(&self) -> &[DrawnLine] {
        &self.lines
    }

    /// Number of items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns `true` if the scene holds no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[must_use]
    pub fn get(&self, id: &ItemId) -> Option<&PlacedItem> {
        self.items.iter().find(|item| item.id == *id)
    }

    pub fn get_mut(&mut self, id: &ItemId) -> Option<&mut PlacedItem> {
        self.items.iter_mut().find(|item| item.id == *id)
    }

    /// Current paint index of an item.
    #[must_use]
    pub fn index_of(&self, id: &ItemId) -> Option<usize> {
        self.items.iter().position(|item| item.id == *id)
    }

    /// Length of the background prefix.
    #[must_use]
    pub fn background_len(&self) -> usize {
        self.items.iter().take_while(|item| item.is_background()).count()
    }

    /// Insert an item directly above the background prefix, beneath any
    /// existing content. Returns its id.
    pub fn insert_after_background(&mut self, item: PlacedItem) -> ItemId {
        let id = item.id;
        let at = self.background_len();
        self.items.insert(at, item);
        id
    }

    /// Add an item to the end of the background prefix, tagging it as background.
    pub fn append_background(&mut self, mut item: PlacedItem) -> ItemId {
        item.layer = Layer::Background;
        let id = item.id;
        let at = self.background_len();
        self.items.insert(at, item);
        id
    }

    /// Remove the item at `index`.
    pub fn remove_at(&mut self, index: usize) -> Option<PlacedItem> {
        if index < self.items.len() { Some(self.items.remove(index)) } else { None }
    }

    /// Remove an item by id.
    pub fn remove(&mut self, id: &ItemId) -> Option<PlacedItem> {
        let index = self.index_of(id)?;
        self.remove_at(index)
    }

    /// Move the item at `index` to the top of its layer band.
    ///
    /// Content goes to the end of the sequence; a background tile goes to
    /// the end of the background prefix. Returns `false` for a bad index.
    pub fn reorder_to_front(&mut self, index: usize) -> bool {
        let Some(item) = self.remove_at(index) else {
            return false;
        };
        if item.is_background() {
            let at = self.background_len();
            self.items.insert(at, item);
        } else {
            self.items.push(item);
        }
        true
    }

    /// Move the item at `index` to the bottom of its layer band.
    ///
    /// Content goes directly above the background prefix; a background tile
    /// goes to index 0. Returns `false` for a bad index.
    pub fn reorder_to_back(&mut self, index: usize) -> bool {
        let Some(item) = self.remove_at(index) else {
            return false;
        };
        let at = if item.is_background() { 0 } else { self.background_len() };
        self.items.insert(at, item);
        true
    }

    /// Flip the lock flag of the item at `index`, returning the new value.
    pub fn toggle_lock(&mut self, index: usize) -> Option<bool> {
        let item = self.items.get_mut(index)?;
        item.locked = !item.locked;
        Some(item.locked)
    }

    /// Remove every background tile, returning the removed ids.
    pub fn clear_background(&mut self) -> Vec<ItemId> {
        let k = self.background_len();
        self.items.drain(..k).map(|item| item.id).collect()
    }

    /// Append a drawn line above all items.
    pub fn push_line(&mut self, line: DrawnLine) {
        self.lines.push(line);
    }

    /// Remove every drawn line.
    pub fn clear_lines(&mut self) {
        self.lines.clear();
    }

    /// Replace the whole contents, restoring the background-prefix invariant.
    pub fn replace(&mut self, items: Vec<PlacedItem>, lines: Vec<DrawnLine>) {
        self.items = items;
        self.lines = lines;
        self.normalize_layers();
    }

    /// Stable-partition items so every background tile precedes all content.
    pub fn normalize_layers(&mut self) {
        if self.is_layer_ordered() {
            return;
        }
        let (background, content): (Vec<_>, Vec<_>) = self.items.drain(..).partition(PlacedItem::is_background);
        self.items = background;
        self.items.extend(content);
    }

    /// Whether the background-prefix invariant currently holds.
    #[must_use]
    pub fn is_layer_ordered(&self) -> bool {
        let k = self.background_len();
        self.items[k..].iter().all(|item| !item.is_background())
    }
}
