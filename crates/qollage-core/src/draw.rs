//! Drawing primitives shared by the layout engine and the markup dialects.
//!
//! # Overview
//!
//! - [`DrawCommand`] - A single backend-neutral primitive (rectangle, line, circle, text)
//! - [`RenderLayer`] / [`LayeredOutput`] - Z-ordering of emitted commands
//! - [`StrokeDefinition`] / [`StrokeStyle`] - Line appearance
//! - [`TextDefinition`] / [`Text`] - Font configuration and text measurement
//!
//! Commands carry absolute coordinates. Dialects serialize them in the order
//! returned by [`LayeredOutput::render`] and never reorder them.

mod command;
mod layer;
mod stroke;
mod text;

pub use command::{DrawCommand, TextAlign};
pub use layer::{LayeredOutput, RenderLayer};
pub use stroke::{StrokeDefinition, StrokeStyle};
pub use text::{Text, TextDefinition};
