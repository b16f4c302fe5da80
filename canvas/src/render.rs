//! Rendering: issues draw commands for the scene against a [`Surface`].
//!
//! This module never owns pixels. The host provides a surface with
//! canvas-style affine transforms and primitive fills; the functions here
//! read the scene and UI state and emit commands in paint order. Nothing in
//! this module mutates application state.
//!
//! Two frames exist:
//! - [`draw`] paints the interactive view: items with their click-area shading,
//!   drawn lines, selection indicators, the live marquee and a pending line start.
//! - [`draw_export`] paints the flattened image: background, items, drawn lines.

#[cfg(test)]
#[path = "render_test.rs"]
mod render_test;

use crate::config::SceneConfig;
use crate::consts::{DASH_PATTERN, DOT_RADIUS_PX, DOT_SPACING_PX, INDICATOR_PADDING_PX, MAX_DOTS_PER_LINE};
use crate::doc::{DrawnLine, ImageRef, PlacedItem, Scene};
use crate::input::UiState;
use crate::selection::Selection;
use crate::viewport::{Point, Rect};

/// Straight-alpha RGBA colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const BLACK: Self = Self::rgb(0, 0, 0);

    #[must_use]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Parse a colour token: `#rgb`, `#rrggbb`, `#rrggbbaa`, or a basic CSS name.
    #[must_use]
    pub fn parse(token: &str) -> Option<Self> {
        let token = token.trim();
        if let Some(hex) = token.strip_prefix('#') {
            return parse_hex(hex);
        }
        let named = match token.to_ascii_lowercase().as_str() {
            "black" => Self::rgb(0, 0, 0),
            "white" => Self::rgb(255, 255, 255),
            "red" => Self::rgb(255, 0, 0),
            "green" => Self::rgb(0, 128, 0),
            "blue" => Self::rgb(0, 0, 255),
            "yellow" => Self::rgb(255, 255, 0),
            "orange" => Self::rgb(255, 165, 0),
            "purple" => Self::rgb(128, 0, 128),
            "brown" => Self::rgb(165, 42, 42),
            "gray" | "grey" => Self::rgb(128, 128, 128),
            "darkseagreen" => Self::rgb(143, 188, 143),
            _ => return None,
        };
        Some(named)
    }

    /// Parse a token, falling back to black for anything unrecognized.
    #[must_use]
    pub fn parse_or_black(token: &str) -> Self {
        Self::parse(token).unwrap_or(Self::BLACK)
    }
}

fn parse_hex(hex: &str) -> Option<Rgba> {
    if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    let byte = |s: &str| match u8::from_str_radix(s, 16) {
        Ok(v) => Some(v),
        Err(_) => None,
    };
    let nibble = |s: &str| byte(s).map(|v| v * 17);
    match hex.len() {
        3 => Some(Rgba::rgb(nibble(&hex[0..1])?, nibble(&hex[1..2])?, nibble(&hex[2..3])?)),
        6 => Some(Rgba::rgb(byte(&hex[0..2])?, byte(&hex[2..4])?, byte(&hex[4..6])?)),
        8 => Some(Rgba { r: byte(&hex[0..2])?, g: byte(&hex[2..4])?, b: byte(&hex[4..6])?, a: byte(&hex[6..8])? }),
        _ => None,
    }
}

/// Translucent grey behind each item marking its clickable area.
const CLICK_AREA_COLOR: Rgba = Rgba { r: 200, g: 200, b: 200, a: 77 };

/// Dashed outline around selected items.
const SELECTION_COLOR: Rgba = Rgba::rgb(255, 0, 0);

/// Dashed outline of the marquee.
const MARQUEE_COLOR: Rgba = Rgba::rgb(0, 0, 255);

/// Stroke width of indicator and marquee outlines.
const OUTLINE_WIDTH: f64 = 2.0;

/// A 2D drawing target with canvas-style transform state.
///
/// Transforms compose onto the current matrix; `save`/`restore` push and
/// pop it together with the dash pattern.
pub trait Surface {
    /// Error raised by fallible drawing or encoding calls.
    type Error;

    fn save(&mut self);
    fn restore(&mut self);
    fn translate(&mut self, dx: f64, dy: f64);
    fn rotate(&mut self, radians: f64);
    fn scale(&mut self, sx: f64, sy: f64);
    /// Dash pattern for subsequent strokes; an empty slice means solid.
    fn set_line_dash(&mut self, segments: &[f64]);

    /// Fill a rectangle in the current transform.
    ///
    /// # Errors
    ///
    /// Surface-specific failure.
    fn fill_rect(&mut self, rect: Rect, color: Rgba) -> Result<(), Self::Error>;

    /// Stroke a rectangle outline in the current transform.
    ///
    /// # Errors
    ///
    /// Surface-specific failure.
    fn stroke_rect(&mut self, rect: Rect, color: Rgba, width: f64) -> Result<(), Self::Error>;

    /// Fill a circle in the current transform.
    ///
    /// # Errors
    ///
    /// Surface-specific failure.
    fn fill_circle(&mut self, center: Point, radius: f64, color: Rgba) -> Result<(), Self::Error>;

    /// Blit `image` scaled into `dest` in the current transform.
    ///
    /// # Errors
    ///
    /// Surface-specific failure, e.g. the image pixels are unavailable.
    fn draw_image(&mut self, image: &ImageRef, dest: Rect) -> Result<(), Self::Error>;

    /// Encode the current pixel buffer as PNG.
    ///
    /// # Errors
    ///
    /// Surface-specific failure, e.g. the buffer cannot be read back.
    fn encode_png(&self) -> Result<Vec<u8>, Self::Error>;
}

/// Draw the interactive view.
///
/// # Errors
///
/// Propagates the first surface failure.
pub fn draw<S: Surface>(
    surface: &mut S,
    scene: &Scene,
    selection: &Selection,
    ui: &UiState,
    config: &SceneConfig,
) -> Result<(), S::Error> {
    // Layer 1: background fill.
    fill_background(surface, config)?;

    // Layer 2: items in paint order with their click areas.
    for item in scene.items() {
        draw_item(surface, item, true)?;
    }

    // Layer 3: drawn lines.
    for line in scene.lines() {
        draw_line(surface, line)?;
    }

    // Layer 4: selection UI.
    for item in selection.items(scene) {
        draw_selection_indicator(surface, item)?;
    }
    if let Some(rect) = ui.marquee {
        draw_marquee(surface, rect)?;
    }
    if let Some(start) = ui.pending_line_start {
        surface.fill_circle(start, DOT_RADIUS_PX * 1.5, Rgba::parse_or_black(&ui.line_color))?;
    }
    Ok(())
}

/// Draw the flattened export frame: background, items, lines.
///
/// # Errors
///
/// Propagates the first surface failure.
pub fn draw_export<S: Surface>(surface: &mut S, scene: &Scene, config: &SceneConfig) -> Result<(), S::Error> {
    fill_background(surface, config)?;
    for item in scene.items() {
        draw_item(surface, item, false)?;
    }
    for line in scene.lines() {
        draw_line(surface, line)?;
    }
    Ok(())
}

/// Draw the export frame onto `surface` and encode it as PNG.
///
/// # Errors
///
/// Propagates the first drawing or encoding failure.
pub fn export_png<S: Surface>(surface: &mut S, scene: &Scene, config: &SceneConfig) -> Result<Vec<u8>, S::Error> {
    draw_export(surface, scene, config)?;
    surface.encode_png()
}

fn fill_background<S: Surface>(surface: &mut S, config: &SceneConfig) -> Result<(), S::Error> {
    surface.fill_rect(
        Rect::new(0.0, 0.0, config.width, config.height),
        Rgba::parse_or_black(&config.background_color),
    )
}

fn draw_item<S: Surface>(surface: &mut S, item: &PlacedItem, click_area: bool) -> Result<(), S::Error> {
    surface.save();
    surface.translate(item.x, item.y);
    surface.rotate(item.rotation);
    surface.scale(if item.reversed { -1.0 } else { 1.0 }, 1.0);
    if click_area {
        surface.fill_rect(padded(item), CLICK_AREA_COLOR)?;
    }
    surface.draw_image(&item.image, Rect::centered(item.width, item.height))?;
    surface.restore();
    Ok(())
}

fn draw_selection_indicator<S: Surface>(surface: &mut S, item: &PlacedItem) -> Result<(), S::Error> {
    surface.save();
    surface.set_line_dash(&DASH_PATTERN);
    surface.translate(item.x, item.y);
    surface.rotate(item.rotation);
    surface.stroke_rect(padded(item), SELECTION_COLOR, OUTLINE_WIDTH)?;
    surface.restore();
    Ok(())
}

fn draw_marquee<S: Surface>(surface: &mut S, rect: Rect) -> Result<(), S::Error> {
    surface.save();
    surface.set_line_dash(&DASH_PATTERN);
    surface.stroke_rect(rect, MARQUEE_COLOR, OUTLINE_WIDTH)?;
    surface.restore();
    Ok(())
}

fn draw_line<S: Surface>(surface: &mut S, line: &DrawnLine) -> Result<(), S::Error> {
    let color = Rgba::parse_or_black(&line.color);
    for dot in dot_positions(line.start, line.end) {
        surface.fill_circle(dot, DOT_RADIUS_PX, color)?;
    }
    Ok(())
}

fn padded(item: &PlacedItem) -> Rect {
    Rect::centered(item.width + 2.0 * INDICATOR_PADDING_PX, item.height + 2.0 * INDICATOR_PADDING_PX)
}

/// Evenly spaced dot centres from `start` to `end`, both endpoints included.
///
/// Spacing is as close to [`DOT_SPACING_PX`] as an even division allows,
/// with at most [`MAX_DOTS_PER_LINE`] steps. A zero-length segment yields a
/// single dot.
#[must_use]
pub fn dot_positions(start: Point, end: Point) -> Vec<Point> {
    let length = start.distance(end);
    if length <= f64::EPSILON {
        return vec![start];
    }
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let steps = ((length / DOT_SPACING_PX).round().max(1.0) as usize).min(MAX_DOTS_PER_LINE);
    (0..=steps)
        .map(|i| {
            #[allow(clippy::cast_precision_loss)]
            let t = i as f64 / steps as f64;
            Point::new(start.x + (end.x - start.x) * t, start.y + (end.y - start.y) * t)
        })
        .collect()
}

/// File name for an exported artifact stamped with an ISO-8601 timestamp.
///
/// `:` and `.` in the timestamp are replaced with `-` so the name is valid
/// on every filesystem.
#[must_use]
pub fn export_file_name(prefix: &str, iso_timestamp: &str, extension: &str) -> String {
    let stamp: String = iso_timestamp.chars().map(|c| if c == ':' || c == '.' { '-' } else { c }).collect();
    format!("{prefix}_{stamp}.{extension}")
}
