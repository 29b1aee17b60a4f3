//! Layer-based ordering of draw commands.
//!
//! Emitters push commands into a [`LayeredOutput`] tagged with a
//! [`RenderLayer`]. Rendering returns every command sorted by layer, keeping
//! insertion order within a layer, so wires always sit beneath connectors,
//! connectors beneath glyphs and glyphs beneath text.
//!
//! # Example
//!
//! ```
//! # use qollage_core::draw::{DrawCommand, LayeredOutput, RenderLayer, StrokeDefinition};
//! # use qollage_core::geometry::Point;
//! # use qollage_core::color::Color;
//! let stroke = StrokeDefinition::solid(Color::default(), 1.0);
//! let mut output = LayeredOutput::new();
//! output.add_to_layer(
//!     RenderLayer::Connector,
//!     DrawCommand::line(Point::new(0.0, 0.0), Point::new(0.0, 10.0), stroke.clone()),
//! );
//! output.add_to_layer(
//!     RenderLayer::Wire,
//!     DrawCommand::line(Point::new(0.0, 0.0), Point::new(10.0, 0.0), stroke),
//! );
//!
//! let commands = output.render();
//! assert_eq!(commands.len(), 2);
//! ```

use crate::draw::DrawCommand;

/// Rendering layers, bottom to top.
///
/// The `Ord` derive uses declaration order, so the first variant renders first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RenderLayer {
    /// Canvas background and loop frames
    Background,
    /// Quantum, bosonic and classical wires
    Wire,
    /// Vertical connectors of multi-line operations and barrier separators
    Connector,
    /// Gate boxes, control dots, targets, crosses and meters
    Glyph,
    /// Labels
    Text,
}

/// Draw commands grouped by rendering layer.
#[derive(Debug, Default, Clone)]
pub struct LayeredOutput {
    items: Vec<(RenderLayer, DrawCommand)>,
}

impl LayeredOutput {
    /// Creates a new empty `LayeredOutput`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a command to the given layer.
    pub fn add_to_layer(&mut self, layer: RenderLayer, command: DrawCommand) {
        self.items.push((layer, command));
    }

    /// Consumes the output and returns its commands bottom to top.
    ///
    /// The sort is stable: commands on the same layer keep the order in which
    /// they were added.
    pub fn render(self) -> Vec<DrawCommand> {
        let mut items = self.items;
        items.sort_by_key(|(layer, _)| *layer);
        items.into_iter().map(|(_, command)| command).collect()
    }
}
