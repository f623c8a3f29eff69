//! Headless engine for an interactive study canvas.
//!
//! The crate holds everything behind a mind-map / sticky-note board except
//! the drawing: an ordered entity store, a pan/zoom viewport, expand/collapse
//! visibility, hit-testing, the pointer interaction state machine and the
//! discrete editing commands. A host feeds pointer events and commands into a
//! [`Canvas`] and renders from its accessors.
//!
//! The binary `mindcanvas` seeds a canvas from generated content, optionally
//! replays a scripted session and exports the result.

pub mod canvas;
pub mod commands;
pub mod config;
pub mod content;
pub mod export;
pub mod geometry;
pub mod hit_test;
pub mod interaction;
pub mod layout;
pub mod model;
pub mod script;
pub mod selection;
pub mod store;
pub mod viewport;
pub mod visibility;

pub use canvas::Canvas;
pub use commands::Command;
pub use config::{CanvasConfig, LayoutConfig};
pub use content::Content;
pub use export::ExportFormat;
pub use geometry::{Rect, Vec2};
pub use hit_test::Hit;
pub use interaction::{InteractionMode, Modifiers, PointerButton, PointerEvent};
pub use model::{ContentMode, Node, NodeId, Swatch};
pub use viewport::Viewport;
