//! Scene configuration: canvas size, colours, background tiling, and how new
//! items are sized when they are placed.
//!
//! Every field has a default matching the stock map maker, so a config file
//! only needs to name what it overrides.

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

use serde::{Deserialize, Serialize};

/// Width of the stock map canvas in pixels.
pub const DEFAULT_CANVAS_WIDTH: f64 = 900.0;

/// Aspect ratio (width / height) of the stock map canvas.
pub const DEFAULT_ASPECT_RATIO: f64 = 958.2 / 481.8;

/// How a new item picked from the palette gets its initial size and rotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Placement {
    /// Scale so the larger natural side is a fixed fraction of the smaller canvas side.
    #[default]
    FitCanvas,
    /// Use the image's sidecar defaults, falling back to [`ItemDefaults::default`].
    Sidecar,
}

/// Optional per-image defaults read from a sidecar next to the image.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ItemDefaults {
    /// Multiplier applied to the natural size.
    pub scale: f64,
    /// Initial rotation in radians.
    pub rotation: f64,
}

impl Default for ItemDefaults {
    fn default() -> Self {
        Self { scale: 0.5, rotation: 0.0 }
    }
}

impl ItemDefaults {
    /// Whether these defaults yield a paintable item: a finite positive
    /// scale and a finite rotation.
    #[must_use]
    pub fn is_usable(&self) -> bool {
        self.scale.is_finite() && self.scale > 0.0 && self.rotation.is_finite()
    }
}

/// Canvas-wide settings consumed by the engine, the renderer and import.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    /// Canvas width in pixels.
    pub width: f64,
    /// Canvas height in pixels.
    pub height: f64,
    /// Colour token painted under every item.
    pub background_color: String,
    /// Edge length of a generated background tile.
    pub tile_size: f64,
    /// Image sources that count as background tiles when imported locked.
    pub background_tiles: Vec<String>,
    /// Sizing policy for newly placed items.
    pub placement: Placement,
    /// Fraction of the smaller canvas side used by [`Placement::FitCanvas`].
    pub fit_fraction: f64,
    /// Colour token for newly drawn lines.
    pub line_color: String,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_CANVAS_WIDTH,
            height: DEFAULT_CANVAS_WIDTH / DEFAULT_ASPECT_RATIO,
            background_color: "#8fbc8f".to_owned(),
            tile_size: 64.0,
            background_tiles: vec![
                "items/background/tile1.png".to_owned(),
                "items/background/tile2.png".to_owned(),
            ],
            placement: Placement::FitCanvas,
            fit_fraction: 0.15,
            line_color: "#1f1a17".to_owned(),
        }
    }
}

impl SceneConfig {
    /// Whether `src` names one of the configured background tiles.
    ///
    /// Sources are compared by path suffix so absolute URLs exported by a
    /// browser (`http://host/items/background/tile1.png`) still match.
    #[must_use]
    pub fn is_background_source(&self, src: &str) -> bool {
        self.background_tiles.iter().any(|tile| {
            src == tile || src.strip_suffix(tile.as_str()).is_some_and(|head| head.ends_with('/'))
        })
    }

    /// Canvas centre in canvas pixels.
    #[must_use]
    pub fn center(&self) -> crate::viewport::Point {
        crate::viewport::Point::new(self.width / 2.0, self.height / 2.0)
    }
}
