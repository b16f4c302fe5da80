//! Shared numeric constants for the canvas crate.

// ── Hit-testing ─────────────────────────────────────────────────

/// Extra margin around an item's visual bounds that still counts as a hit, in canvas pixels.
pub const HIT_BUFFER_PX: f64 = 2.0;

/// Padding of the dashed selection indicator and the click-area shading.
pub const INDICATOR_PADDING_PX: f64 = 5.0;

// ── Transforms ──────────────────────────────────────────────────

/// Lower bound of the pointer-driven and slider-driven scale factor.
pub const MIN_SCALE: f64 = 0.1;

/// Upper bound of the pointer-driven and slider-driven scale factor.
pub const MAX_SCALE: f64 = 2.0;

/// Slider rotation range in degrees.
pub const MAX_ROTATION_DEG: f64 = 360.0;

// ── Drawing ─────────────────────────────────────────────────────

/// Distance between consecutive dots of a drawn line.
pub const DOT_SPACING_PX: f64 = 10.0;

/// Radius of a single dot of a drawn line.
pub const DOT_RADIUS_PX: f64 = 2.0;

/// Upper bound on the dots laid along one line, whatever its length.
pub const MAX_DOTS_PER_LINE: usize = 10_000;

/// Largest coordinate magnitude accepted from a scene file.
pub const MAX_COORDINATE: f64 = 1.0e6;

/// Minimum pointer travel for a press-drag-release to commit a line on release.
pub const DRAG_DRAW_MIN_PX: f64 = 4.0;

/// Dash pattern shared by the selection indicator and the marquee.
pub const DASH_PATTERN: [f64; 2] = [5.0, 5.0];
