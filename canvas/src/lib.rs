//! Scene, selection and interaction engine for the map maker.
//!
//! This crate owns everything that has real invariants: the ordered list of
//! placed items and drawn lines, the geometry that maps pointer input onto
//! those items, the multi-selection transform logic, the gesture state
//! machine, and the JSON persistence contract. The host (see the `mapmaker`
//! binary) supplies the collaborators: a [`persist::ImageResolver`] for
//! loading images and a [`render::Surface`] to draw on.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`engine`] | Top-level [`engine::EngineCore`] state machine and the surface-owning [`engine::Engine`] |
//! | [`doc`] | Placed items, drawn lines, and the ordered [`doc::Scene`] |
//! | [`selection`] | Selection set and batch transforms (move, rotate, resize, copy/paste) |
//! | [`viewport`] | Points, rectangles and client-to-canvas conversion |
//! | [`input`] | Tools, modifier keys, buttons and the gesture state |
//! | [`hit`] | Oriented hit-testing, picking and marquee membership |
//! | [`persist`] | JSON export/import with all-or-nothing image resolution |
//! | [`render`] | Draw commands for the interactive view and PNG export |
//! | [`config`] | Canvas dimensions, colours and placement policy |
//! | [`consts`] | Shared numeric constants |

pub mod config;
pub mod consts;
pub mod doc;
pub mod engine;
pub mod hit;
pub mod input;
pub mod persist;
pub mod render;
pub mod selection;
pub mod viewport;
