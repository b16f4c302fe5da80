//! JSON persistence: the scene file format, export, and all-or-nothing import.
//!
//! DESIGN
//! ======
//! The file references images by source identifier, never by pixel data, so
//! import has to resolve every image again before the scene can be rebuilt.
//! All resolutions run concurrently and [`load_scene`] waits for every one
//! of them to settle. Only a fully resolved scene is handed back; a single
//! failure discards the whole batch. `load_scene` never touches the engine,
//! so the caller's scene stays exactly as it was until it decides to apply
//! the result (see [`crate::engine::EngineCore::finish_import`]).

#[cfg(test)]
#[path = "persist_test.rs"]
mod persist_test;

use async_trait::async_trait;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::{ItemDefaults, SceneConfig};
use crate::consts::MAX_COORDINATE;
use crate::doc::{DrawnLine, ImageRef, Layer, PlacedItem, Scene};
use crate::viewport::Point;

/// Error returned by an [`ImageResolver`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("failed to load image `{src}`: {reason}")]
pub struct ResolveError {
    /// Source identifier that failed.
    pub src: String,
    /// Human-readable cause.
    pub reason: String,
}

impl ResolveError {
    #[must_use]
    pub fn new(src: impl Into<String>, reason: impl Into<String>) -> Self {
        Self { src: src.into(), reason: reason.into() }
    }
}

/// An image that finished loading, plus optional sidecar defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedImage {
    pub image: ImageRef,
    pub defaults: Option<ItemDefaults>,
}

impl ResolvedImage {
    #[must_use]
    pub fn new(image: ImageRef) -> Self {
        Self { image, defaults: None }
    }
}

/// Loads images by source identifier.
///
/// Each call is an independent asynchronous load; the engine only ever sees
/// images whose load completed.
#[async_trait]
pub trait ImageResolver: Send + Sync {
    /// Resolve `src` to a loaded image. `alt` is carried through unchanged.
    async fn resolve(&self, src: &str, alt: &str) -> Result<ResolvedImage, ResolveError>;
}

/// Error returned by export and import.
#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    /// Nothing was pasted.
    #[error("no scene data provided")]
    EmptyInput,
    /// The text is not JSON of the expected shape.
    #[error("invalid scene JSON: {0}")]
    Malformed(#[source] serde_json::Error),
    /// An item entry has geometry the scene cannot hold.
    #[error("item {index} is invalid: {reason}")]
    InvalidItem { index: usize, reason: String },
    /// A drawn line has coordinates the canvas cannot hold.
    #[error("line {index} is invalid: {reason}")]
    InvalidLine { index: usize, reason: String },
    /// At least one image could not be resolved; nothing was applied.
    #[error("{failed} of {total} images failed to load; first failure: {first}")]
    Resolve { failed: usize, total: usize, first: ResolveError },
    /// Another import has not finished yet.
    #[error("an import is already in progress")]
    ImportInProgress,
    /// The import finished after being superseded.
    #[error("import result is stale")]
    StaleImport,
    /// The scene could not be written out.
    #[error("failed to serialize scene: {0}")]
    Serialize(#[source] serde_json::Error),
}

impl PersistError {
    /// Message suitable for showing to the user.
    #[must_use]
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::EmptyInput => "Please paste a valid JSON string.",
            Self::Malformed(_) | Self::InvalidItem { .. } | Self::InvalidLine { .. } => "Invalid JSON format. Please check the input and try again.",
            Self::Resolve { .. } => "Error loading images. Please check the JSON data and try again.",
            Self::ImportInProgress | Self::StaleImport => "Another import is still loading. Please wait and try again.",
            Self::Serialize(_) => "The map could not be exported. Please try again.",
        }
    }
}

// =============================================================
// File format
// =============================================================

/// Root of a persisted scene.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneFile {
    pub placed_items: Vec<ItemRecord>,
    #[serde(default)]
    pub drawn_lines: Vec<DrawnLine>,
}

/// One persisted item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemRecord {
    pub src: String,
    #[serde(default)]
    pub alt: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub rotation: f64,
    pub reversed: bool,
    pub locked: bool,
}

impl ItemRecord {
    fn from_item(item: &PlacedItem) -> Self {
        Self {
            src: item.image.src.clone(),
            alt: item.image.alt.clone(),
            x: item.x,
            y: item.y,
            width: item.width,
            height: item.height,
            rotation: item.rotation,
            reversed: item.reversed,
            locked: item.locked,
        }
    }

    fn validate(&self, index: usize) -> Result<(), PersistError> {
        let finite = [self.x, self.y, self.width, self.height, self.rotation].iter().all(|v| v.is_finite());
        if !finite {
            return Err(PersistError::InvalidItem { index, reason: "non-finite number".to_owned() });
        }
        if self.width <= 0.0 || self.height <= 0.0 {
            return Err(PersistError::InvalidItem { index, reason: "width and height must be positive".to_owned() });
        }
        if self.src.trim().is_empty() {
            return Err(PersistError::InvalidItem { index, reason: "missing image source".to_owned() });
        }
        Ok(())
    }
}

impl SceneFile {
    /// Project a scene into its persisted form.
    #[must_use]
    pub fn from_scene(scene: &Scene) -> Self {
        Self {
            placed_items: scene.items().iter().map(ItemRecord::from_item).collect(),
            drawn_lines: scene.lines().to_vec(),
        }
    }
}

/// Serialize a scene to pretty-printed JSON.
///
/// # Errors
///
/// Returns [`PersistError::Serialize`] if the serializer fails.
pub fn export_json(scene: &Scene) -> Result<String, PersistError> {
    serde_json::to_string_pretty(&SceneFile::from_scene(scene)).map_err(PersistError::Serialize)
}

/// Parse and validate scene JSON without resolving any images.
///
/// # Errors
///
/// [`PersistError::EmptyInput`] for blank text, [`PersistError::Malformed`]
/// for bad JSON, [`PersistError::InvalidItem`] for unusable geometry.
pub fn parse_scene(text: &str) -> Result<SceneFile, PersistError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(PersistError::EmptyInput);
    }
    let file: SceneFile = serde_json::from_str(text).map_err(PersistError::Malformed)?;
    for (index, record) in file.placed_items.iter().enumerate() {
        record.validate(index)?;
    }
    for (index, line) in file.drawn_lines.iter().enumerate() {
        validate_line(line, index)?;
    }
    Ok(file)
}

fn validate_line(line: &DrawnLine, index: usize) -> Result<(), PersistError> {
    let in_range = [line.start.x, line.start.y, line.end.x, line.end.y]
        .iter()
        .all(|v| v.is_finite() && v.abs() <= MAX_COORDINATE);
    if !in_range {
        return Err(PersistError::InvalidLine { index, reason: format!("coordinates must be finite and at most {MAX_COORDINATE} from the origin on each axis") });
    }
    Ok(())
}

// =============================================================
// Import
// =============================================================

/// Parse `text` and resolve every referenced image concurrently.
///
/// Waits for all resolutions to settle. Succeeds only if every one did,
/// returning a fresh scene with the background-prefix invariant restored.
///
/// # Errors
///
/// Any parse error from [`parse_scene`], or [`PersistError::Resolve`] if one
/// or more images failed.
pub async fn load_scene<R>(text: &str, resolver: &R, config: &SceneConfig) -> Result<Scene, PersistError>
where
    R: ImageResolver + ?Sized,
{
    let file = parse_scene(text)?;
    let total = file.placed_items.len();
    debug!(items = total, lines = file.drawn_lines.len(), "import: resolving images");

    let results = join_all(file.placed_items.iter().map(|record| resolver.resolve(&record.src, &record.alt))).await;

    let mut items = Vec::with_capacity(total);
    let mut failures = Vec::new();
    for (record, result) in file.placed_items.iter().zip(results) {
        match result {
            Ok(resolved) => items.push(item_from_record(record, resolved.image, config)),
            Err(e) => failures.push(e),
        }
    }

    if let Some(first) = failures.first().cloned() {
        warn!(failed = failures.len(), total, error = %first, "import: image resolution failed");
        return Err(PersistError::Resolve { failed: failures.len(), total, first });
    }

    let mut scene = Scene::new();
    scene.replace(items, file.drawn_lines);
    Ok(scene)
}

fn item_from_record(record: &ItemRecord, image: ImageRef, config: &SceneConfig) -> PlacedItem {
    let layer = if record.locked && config.is_background_source(&record.src) { Layer::Background } else { Layer::Content };
    let mut item = PlacedItem::new(image, Point::new(record.x, record.y), record.width, record.height);
    item.rotation = record.rotation;
    item.reversed = record.reversed;
    item.locked = record.locked;
    item.layer = layer;
    item
}
