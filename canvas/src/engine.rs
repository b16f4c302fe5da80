//! The interaction engine: owns the scene, the selection and the gesture
//! state, and turns host input events into scene edits.
//!
//! Handlers never touch the screen. They mutate [`EngineCore`] and return a
//! list of [`Action`]s for the host to act on (repaint, change the cursor,
//! refresh the item table). [`Engine`] pairs the core with a [`Surface`] so
//! the host can render the current state.

use std::sync::{Arc, Weak};

use rand::Rng;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::{ItemDefaults, Placement, SceneConfig};
use crate::consts::DRAG_DRAW_MIN_PX;
use crate::doc::{DrawnLine, ItemId, PlacedItem, Scene};
use crate::hit;
use crate::input::{Button, DragAction, InputState, Key, Modifiers, Tool, UiState};
use crate::persist::{self, ImageResolver, PersistError, ResolvedImage};
use crate::render::{self, Surface};
use crate::selection::{self, Clipboard, ItemSnapshot, Selection};
use crate::viewport::{Point, Rect, ViewportMetrics};

#[cfg(test)]
#[path = "engine_test.rs"]
mod engine_test;

const CURSOR_DEFAULT: &str = "default";
const CURSOR_POINTER: &str = "pointer";

/// Effects returned from input handlers for the host to process.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// The frame is out of date.
    RenderNeeded,
    /// Show this CSS cursor over the canvas.
    SetCursor(String),
    /// Selection membership changed; refresh selection-dependent UI.
    SelectionChanged,
    /// Items were added, removed, reordered or edited.
    SceneChanged,
    /// A line was committed by the draw tool.
    LineDrawn(DrawnLine),
}

/// One row of the item table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemRow {
    /// Current paint index.
    pub index: usize,
    pub id: ItemId,
    /// Display label: the image's alt text, or a positional name.
    pub label: String,
    pub locked: bool,
    pub selected: bool,
}

/// Item table: background tiles are summarized, content is listed.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ItemTable {
    pub background_tiles: usize,
    /// Content rows, selected rows first, each group in paint order.
    pub rows: Vec<ItemRow>,
}

/// Proof that an import was started; consumed by [`EngineCore::finish_import`].
///
/// The import slot stays taken exactly as long as the ticket is alive, so a
/// ticket dropped unfinished (a cancelled future, a host timeout) frees it.
#[derive(Debug)]
pub struct ImportTicket {
    generation: u64,
    slot: Arc<()>,
}

/// Core engine state. Holds no surface, so it can be driven and tested headless.
#[derive(Debug)]
pub struct EngineCore {
    pub scene: Scene,
    pub selection: Selection,
    pub ui: UiState,
    pub input: InputState,
    pub viewport: ViewportMetrics,
    pub config: SceneConfig,
    clipboard: Option<Clipboard>,
    cursor: &'static str,
    import_generation: u64,
    import_slot: Weak<()>,
}

impl Default for EngineCore {
    fn default() -> Self {
        Self::with_config(SceneConfig::default())
    }
}

impl EngineCore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Engine for a canvas described by `config`, shown at native size.
    #[must_use]
    pub fn with_config(config: SceneConfig) -> Self {
        let ui = UiState { line_color: config.line_color.clone(), last_scale: 1.0, ..UiState::default() };
        Self {
            scene: Scene::new(),
            selection: Selection::new(),
            ui,
            input: InputState::neutral(None),
            viewport: ViewportMetrics::identity(config.width, config.height),
            config,
            clipboard: None,
            cursor: CURSOR_DEFAULT,
            import_generation: 0,
            import_slot: Weak::new(),
        }
    }

    /// Record the current on-screen layout of the canvas.
    pub fn set_viewport(&mut self, viewport: ViewportMetrics) {
        self.viewport = viewport;
    }

    // --- Tool state ---

    /// Arm `tool`, or disarm it if it is already armed.
    ///
    /// Any change of armed action abandons the gesture in progress.
    pub fn set_action(&mut self, tool: Tool) -> Vec<Action> {
        self.ui.armed = if self.ui.armed == Some(tool) { None } else { Some(tool) };
        self.reset_gesture();
        debug!(armed = ?self.ui.armed, "armed action changed");
        vec![Action::RenderNeeded]
    }

    /// Colour token for lines drawn from now on.
    pub fn set_line_color(&mut self, color: impl Into<String>) {
        self.ui.line_color = color.into();
    }

    fn reset_gesture(&mut self) {
        self.input = InputState::neutral(self.ui.armed);
        self.ui.marquee = None;
        self.ui.pending_line_start = None;
    }

    // --- Pointer input ---

    pub fn on_pointer_down(&mut self, client: Point, button: Button, modifiers: Modifiers) -> Vec<Action> {
        if button != Button::Primary {
            return Vec::new();
        }
        let pt = self.viewport.to_canvas(client);

        if self.ui.armed == Some(Tool::Draw) {
            return self.place_line_point(pt);
        }

        // A marquee whose release was lost must not outlive the next press.
        self.ui.marquee = None;
        let hit = hit::pick(&self.scene, pt);
        if modifiers.toggle() {
            return match hit {
                Some(id) => {
                    self.selection.toggle(&self.scene, id);
                    self.input = InputState::Selecting;
                    vec![Action::SelectionChanged, Action::RenderNeeded]
                }
                None => {
                    self.input = InputState::Marqueeing { start: pt, current: pt };
                    self.ui.marquee = Some(Rect::from_corners(pt, pt));
                    vec![Action::RenderNeeded]
                }
            };
        }

        match hit {
            Some(id) => self.begin_drag(id, pt, modifiers),
            None => {
                self.selection.clear();
                self.ui.armed = None;
                self.input = InputState::Idle;
                vec![Action::SelectionChanged, Action::RenderNeeded]
            }
        }
    }

    fn begin_drag(&mut self, id: ItemId, pt: Point, modifiers: Modifiers) -> Vec<Action> {
        if !modifiers.multi() && !self.selection.contains(&id) {
            self.selection.replace_with(&self.scene, id);
        }
        self.selection.set_primary(id);
        let tool = *self.ui.armed.get_or_insert(Tool::Move);
        let action = tool.drag_action().unwrap_or(DragAction::Move);
        let origins = selection::snapshot(&self.scene, &self.selection);
        debug!(?action, items = origins.len(), "drag started");
        self.input = InputState::Dragging { action, last: pt, origins };
        vec![Action::SelectionChanged, Action::RenderNeeded]
    }

    pub fn on_pointer_move(&mut self, client: Point, _modifiers: Modifiers) -> Vec<Action> {
        let pt = self.viewport.to_canvas(client);
        match &mut self.input {
            InputState::Dragging { action, last, .. } => {
                match action {
                    DragAction::Move => {
                        selection::move_by(&mut self.scene, &self.selection, pt.x - last.x, pt.y - last.y);
                    }
                    DragAction::Rotate => {
                        selection::rotate_to(&mut self.scene, &self.selection, pt);
                    }
                    DragAction::Resize => {
                        selection::resize_to(&mut self.scene, &self.selection, pt);
                    }
                }
                *last = pt;
                vec![Action::RenderNeeded]
            }
            InputState::Marqueeing { start, current } => {
                *current = pt;
                self.ui.marquee = Some(Rect::from_corners(*start, pt));
                vec![Action::RenderNeeded]
            }
            InputState::Idle => {
                let cursor = if hit::pick(&self.scene, pt).is_some() { CURSOR_POINTER } else { CURSOR_DEFAULT };
                if cursor == self.cursor {
                    return Vec::new();
                }
                self.cursor = cursor;
                vec![Action::SetCursor(cursor.to_owned())]
            }
            InputState::Selecting | InputState::Drawing { .. } => Vec::new(),
        }
    }

    pub fn on_pointer_up(&mut self, client: Point, button: Button, _modifiers: Modifiers) -> Vec<Action> {
        if button != Button::Primary {
            return Vec::new();
        }
        let pt = self.viewport.to_canvas(client);
        match std::mem::take(&mut self.input) {
            InputState::Marqueeing { start, .. } => {
                let rect = Rect::from_corners(start, pt);
                let members = hit::marquee_members(&self.scene, rect);
                debug!(selected = members.len(), "marquee finished");
                self.selection.replace_all(&self.scene, members);
                self.ui.marquee = None;
                vec![Action::SelectionChanged, Action::RenderNeeded]
            }
            InputState::Dragging { origins, .. } => {
                if geometry_changed(&self.scene, &origins) {
                    vec![Action::SceneChanged, Action::RenderNeeded]
                } else {
                    Vec::new()
                }
            }
            InputState::Drawing { start: Some(start) } if start.distance(pt) > DRAG_DRAW_MIN_PX => {
                self.commit_line(start, pt)
            }
            other @ InputState::Drawing { .. } => {
                self.input = other;
                Vec::new()
            }
            InputState::Idle | InputState::Selecting => Vec::new(),
        }
    }

    fn place_line_point(&mut self, pt: Point) -> Vec<Action> {
        if let InputState::Drawing { start: Some(start) } = self.input {
            return self.commit_line(start, pt);
        }
        self.input = InputState::Drawing { start: Some(pt) };
        self.ui.pending_line_start = Some(pt);
        vec![Action::RenderNeeded]
    }

    fn commit_line(&mut self, start: Point, end: Point) -> Vec<Action> {
        let line = DrawnLine { start, end, color: self.ui.line_color.clone() };
        self.scene.push_line(line.clone());
        self.input = InputState::Drawing { start: None };
        self.ui.pending_line_start = None;
        debug!(lines = self.scene.lines().len(), "line drawn");
        vec![Action::LineDrawn(line), Action::SceneChanged, Action::RenderNeeded]
    }

    // --- Keyboard input ---

    pub fn on_key_down(&mut self, key: Key, modifiers: Modifiers) -> Vec<Action> {
        if key.is("Escape") {
            return self.cancel_gesture();
        }
        if key.is("Delete") || key.is("Backspace") {
            return self.remove_selected();
        }
        if modifiers.multi() && key.is("c") {
            self.copy();
            return Vec::new();
        }
        if modifiers.multi() && key.is("v") {
            return self.paste();
        }
        Vec::new()
    }

    /// Abandon the gesture in progress, undoing its live effects.
    ///
    /// The armed action is kept.
    pub fn cancel_gesture(&mut self) -> Vec<Action> {
        match std::mem::take(&mut self.input) {
            InputState::Dragging { origins, .. } => {
                selection::restore(&mut self.scene, &origins);
                debug!(items = origins.len(), "drag cancelled");
                vec![Action::RenderNeeded]
            }
            InputState::Marqueeing { .. } => {
                self.ui.marquee = None;
                vec![Action::RenderNeeded]
            }
            InputState::Drawing { start: Some(_) } => {
                self.input = InputState::Drawing { start: None };
                self.ui.pending_line_start = None;
                vec![Action::RenderNeeded]
            }
            other => {
                self.input = other;
                Vec::new()
            }
        }
    }

    // --- Scene edits ---

    /// Place a new content item at the canvas centre.
    pub fn add_item(&mut self, resolved: ResolvedImage) -> ItemId {
        let center = self.config.center();
        self.add_item_at(resolved, center)
    }

    /// Place a new content item dropped at a client-space position.
    pub fn drop_item(&mut self, resolved: ResolvedImage, client: Point) -> ItemId {
        let at = self.viewport.to_canvas(client);
        self.add_item_at(resolved, at)
    }

    /// Place a new content item centred on the canvas point `at`.
    ///
    /// The item goes directly above the background, beneath existing content.
    pub fn add_item_at(&mut self, resolved: ResolvedImage, at: Point) -> ItemId {
        let (width, height, rotation) = initial_geometry(&resolved, &self.config);
        let mut item = PlacedItem::new(resolved.image, at, width, height);
        item.rotation = rotation;
        let src = item.image.src.clone();
        let id = self.scene.insert_after_background(item);
        info!(%id, %src, width, height, "item placed");
        id
    }

    /// Tile the canvas with locked background items chosen at random from `tiles`.
    ///
    /// Returns the number of tiles added.
    pub fn generate_background<R: Rng + ?Sized>(&mut self, tiles: &[ResolvedImage], rng: &mut R) -> usize {
        let size = self.config.tile_size;
        if tiles.is_empty() || size <= 0.0 {
            warn!(tiles = tiles.len(), size, "background generation skipped");
            return 0;
        }
        let mut count = 0;
        let mut y = 0.0;
        while y < self.config.height {
            let mut x = 0.0;
            while x < self.config.width {
                let tile = &tiles[rng.random_range(0..tiles.len())];
                let center = Point::new(x + size / 2.0, y + size / 2.0);
                self.scene.append_background(PlacedItem::background_tile(tile.image.clone(), center, size));
                count += 1;
                x += size;
            }
            y += size;
        }
        info!(count, "background generated");
        count
    }

    /// Remove every background tile. Returns how many were removed.
    pub fn clear_background(&mut self) -> usize {
        let removed = self.scene.clear_background();
        for id in &removed {
            self.selection.remove(id);
        }
        info!(count = removed.len(), "background cleared");
        removed.len()
    }

    /// Remove one item, evicting it from the selection.
    pub fn remove_item(&mut self, id: &ItemId) -> Option<PlacedItem> {
        let item = self.scene.remove(id)?;
        self.selection.remove(id);
        debug!(%id, "item removed");
        Some(item)
    }

    /// Remove every selected item.
    pub fn remove_selected(&mut self) -> Vec<Action> {
        let ids = self.selection.ids().to_vec();
        if ids.is_empty() {
            return Vec::new();
        }
        for id in &ids {
            self.scene.remove(id);
        }
        self.selection.clear();
        info!(count = ids.len(), "selected items removed");
        vec![Action::SelectionChanged, Action::SceneChanged, Action::RenderNeeded]
    }

    /// Move an item to the top of its layer band.
    pub fn reorder_to_front(&mut self, id: &ItemId) -> bool {
        self.scene.index_of(id).is_some_and(|index| self.scene.reorder_to_front(index))
    }

    /// Move an item to the bottom of its layer band.
    pub fn reorder_to_back(&mut self, id: &ItemId) -> bool {
        self.scene.index_of(id).is_some_and(|index| self.scene.reorder_to_back(index))
    }

    /// Flip an item's lock flag. A newly locked item leaves the selection.
    pub fn toggle_lock(&mut self, id: &ItemId) -> Option<bool> {
        let index = self.scene.index_of(id)?;
        let locked = self.scene.toggle_lock(index)?;
        self.selection.prune(&self.scene);
        debug!(%id, locked, "lock toggled");
        Some(locked)
    }

    /// Flip an item's mirror flag.
    pub fn reverse_item(&mut self, id: &ItemId) -> Option<bool> {
        selection::toggle_reversed(&mut self.scene, id)
    }

    /// Add or remove an item from the selection, as a row click does.
    pub fn toggle_item_selection(&mut self, id: ItemId) -> bool {
        self.selection.toggle(&self.scene, id)
    }

    // --- Sliders ---

    /// Rotate every selected item to `degrees`, clamped to `[0, 360]`.
    pub fn set_rotation_degrees(&mut self, degrees: f64) -> Vec<Action> {
        let radians = selection::slider_rotation(degrees);
        self.ui.last_rotation = radians;
        if self.selection.is_empty() {
            return Vec::new();
        }
        selection::set_rotation(&mut self.scene, &self.selection, radians);
        vec![Action::SceneChanged, Action::RenderNeeded]
    }

    /// Size every selected item to `percent` of its natural size, clamped to `[10, 200]`.
    pub fn set_scale_percent(&mut self, percent: f64) -> Vec<Action> {
        let scale = selection::slider_scale(percent);
        self.ui.last_scale = scale;
        if self.selection.is_empty() {
            return Vec::new();
        }
        selection::set_scale(&mut self.scene, &self.selection, scale);
        vec![Action::SceneChanged, Action::RenderNeeded]
    }

    #[must_use]
    pub fn representative_rotation_degrees(&self) -> Option<f64> {
        selection::representative_rotation_deg(&self.scene, &self.selection)
    }

    #[must_use]
    pub fn representative_scale_percent(&self) -> Option<f64> {
        selection::representative_scale_percent(&self.scene, &self.selection)
    }

    // --- Clipboard ---

    /// Copy the selection. Returns whether anything was copied.
    pub fn copy(&mut self) -> bool {
        let Some(clip) = selection::copy(&self.scene, &self.selection) else {
            return false;
        };
        debug!(items = clip.entries().len(), "selection copied");
        self.clipboard = Some(clip);
        true
    }

    /// Paste the clipboard centred on the canvas and select the new items.
    pub fn paste(&mut self) -> Vec<Action> {
        let Some(clip) = &self.clipboard else {
            return Vec::new();
        };
        let ids = clip.paste(&mut self.scene, self.config.center());
        self.selection.replace_all(&self.scene, ids.iter().copied());
        if let Some(first) = ids.first() {
            self.selection.set_primary(*first);
        }
        debug!(items = ids.len(), "clipboard pasted");
        vec![Action::SelectionChanged, Action::SceneChanged, Action::RenderNeeded]
    }

    #[must_use]
    pub fn has_clipboard(&self) -> bool {
        self.clipboard.as_ref().is_some_and(|clip| !clip.is_empty())
    }

    // --- Queries ---

    #[must_use]
    pub fn item(&self, id: &ItemId) -> Option<&PlacedItem> {
        self.scene.get(id)
    }

    /// Rows for the item table.
    #[must_use]
    pub fn item_rows(&self) -> ItemTable {
        let background_tiles = self.scene.background_len();
        let (selected, rest): (Vec<_>, Vec<_>) = self
            .scene
            .items()
            .iter()
            .enumerate()
            .skip(background_tiles)
            .map(|(index, item)| ItemRow {
                index,
                id: item.id,
                label: item.image.alt.clone(),
                locked: item.locked,
                selected: self.selection.contains(&item.id),
            })
            .partition(|row| row.selected);
        let mut rows = selected;
        rows.extend(rest);
        for (n, row) in rows.iter_mut().enumerate() {
            if row.label.is_empty() {
                row.label = format!("Item {}", n + 1);
            }
        }
        ItemTable { background_tiles, rows }
    }

    // --- Persistence ---

    /// Serialize the scene.
    ///
    /// # Errors
    ///
    /// See [`persist::export_json`].
    pub fn export_json(&self) -> Result<String, PersistError> {
        persist::export_json(&self.scene)
    }

    /// Start an import. Only one may be outstanding at a time.
    ///
    /// # Errors
    ///
    /// [`PersistError::ImportInProgress`] while another import is unfinished.
    pub fn begin_import(&mut self) -> Result<ImportTicket, PersistError> {
        if self.import_in_progress() {
            warn!("import rejected: another import is in progress");
            return Err(PersistError::ImportInProgress);
        }
        let slot = Arc::new(());
        self.import_slot = Arc::downgrade(&slot);
        self.import_generation += 1;
        Ok(ImportTicket { generation: self.import_generation, slot })
    }

    /// Finish an import, replacing the scene only if `loaded` succeeded.
    ///
    /// # Errors
    ///
    /// [`PersistError::StaleImport`] for a ticket that is not the live one,
    /// otherwise the load error itself. Either way the scene is untouched.
    pub fn finish_import(
        &mut self,
        ticket: ImportTicket,
        loaded: Result<Scene, PersistError>,
    ) -> Result<Vec<Action>, PersistError> {
        let live = self.import_slot.upgrade().is_some_and(|slot| Arc::ptr_eq(&slot, &ticket.slot));
        if !live || ticket.generation != self.import_generation {
            warn!(generation = ticket.generation, "stale import discarded");
            return Err(PersistError::StaleImport);
        }
        self.import_slot = Weak::new();
        let scene = loaded?;
        info!(items = scene.len(), lines = scene.lines().len(), "import applied");
        self.scene = scene;
        self.selection.clear();
        self.reset_gesture();
        Ok(vec![Action::SelectionChanged, Action::SceneChanged, Action::RenderNeeded])
    }

    /// Whether a started import still holds its ticket.
    #[must_use]
    pub fn import_in_progress(&self) -> bool {
        self.import_slot.strong_count() > 0
    }

    /// Give up on an import without applying anything, freeing the slot.
    pub fn abandon_import(&mut self, ticket: ImportTicket) {
        if self.import_slot.upgrade().is_some_and(|slot| Arc::ptr_eq(&slot, &ticket.slot)) {
            self.import_slot = Weak::new();
        }
        debug!(generation = ticket.generation, "import abandoned");
    }

    /// Parse, resolve and apply scene JSON in one step.
    ///
    /// # Errors
    ///
    /// Any [`PersistError`]; on error the scene is unchanged.
    pub async fn import_json<R>(&mut self, text: &str, resolver: &R) -> Result<Vec<Action>, PersistError>
    where
        R: ImageResolver + ?Sized,
    {
        let ticket = self.begin_import()?;
        let loaded = persist::load_scene(text, resolver, &self.config).await;
        self.finish_import(ticket, loaded)
    }
}

fn initial_geometry(resolved: &ResolvedImage, config: &SceneConfig) -> (f64, f64, f64) {
    let natural_w = resolved.image.natural_width.max(1.0);
    let natural_h = resolved.image.natural_height.max(1.0);
    match config.placement {
        Placement::FitCanvas => {
            let target = config.width.min(config.height) * config.fit_fraction;
            let scale = (target / natural_w).min(target / natural_h);
            (natural_w * scale, natural_h * scale, 0.0)
        }
        Placement::Sidecar => {
            let defaults = resolved.defaults.filter(ItemDefaults::is_usable).unwrap_or_default();
            (natural_w * defaults.scale, natural_h * defaults.scale, defaults.rotation)
        }
    }
}

#[allow(clippy::float_cmp)]
fn geometry_changed(scene: &Scene, origins: &[ItemSnapshot]) -> bool {
    origins.iter().any(|snap| {
        scene.get(&snap.id).is_some_and(|item| {
            item.x != snap.x
                || item.y != snap.y
                || item.width != snap.width
                || item.height != snap.height
                || item.rotation != snap.rotation
        })
    })
}

/// The full engine: the core plus the surface it renders to.
pub struct Engine<S: Surface> {
    surface: S,
    pub core: EngineCore,
}

impl<S: Surface> Engine<S> {
    #[must_use]
    pub fn new(surface: S, config: SceneConfig) -> Self {
        Self { surface, core: EngineCore::with_config(config) }
    }

    #[must_use]
    pub fn surface(&self) -> &S {
        &self.surface
    }

    // --- Delegated input ---

    pub fn set_action(&mut self, tool: Tool) -> Vec<Action> {
        self.core.set_action(tool)
    }

    pub fn on_pointer_down(&mut self, client: Point, button: Button, modifiers: Modifiers) -> Vec<Action> {
        self.core.on_pointer_down(client, button, modifiers)
    }

    pub fn on_pointer_move(&mut self, client: Point, modifiers: Modifiers) -> Vec<Action> {
        self.core.on_pointer_move(client, modifiers)
    }

    pub fn on_pointer_up(&mut self, client: Point, button: Button, modifiers: Modifiers) -> Vec<Action> {
        self.core.on_pointer_up(client, button, modifiers)
    }

    pub fn on_key_down(&mut self, key: Key, modifiers: Modifiers) -> Vec<Action> {
        self.core.on_key_down(key, modifiers)
    }

    // --- Render ---

    /// Draw the interactive frame.
    ///
    /// # Errors
    ///
    /// Propagates the surface's failure.
    pub fn render(&mut self) -> Result<(), S::Error> {
        render::draw(&mut self.surface, &self.core.scene, &self.core.selection, &self.core.ui, &self.core.config)
    }

    /// Draw the export frame onto `target` and encode it as PNG.
    ///
    /// # Errors
    ///
    /// Propagates the target's failure.
    pub fn export_png<T: Surface>(&self, target: &mut T) -> Result<Vec<u8>, T::Error> {
        render::export_png(target, &self.core.scene, &self.core.config)
    }
}
