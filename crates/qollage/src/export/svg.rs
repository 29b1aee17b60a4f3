//! SVG markup dialect.
//!
//! Produces a self-contained SVG document with the `svg` crate. Unlike the
//! Typst dialect it needs no external engine to be viewed.

use log::debug;
use svg::{Document, node::element as svg_element};

use qollage_core::draw::{DrawCommand, StrokeDefinition};

use super::{Error, Exporter, Theme, emit, format_coordinate};
use crate::layout::Diagram;

/// Applies color, opacity, width and dash pattern of a [`StrokeDefinition`]
/// to an SVG element.
macro_rules! apply_stroke {
    ($element:expr, $stroke:expr) => {{
        let stroke: &StrokeDefinition = $stroke;
        let element = $element
            .set("stroke", stroke.color().to_hex())
            .set("stroke-width", format_coordinate(stroke.width()));
        match stroke.style().dash_array() {
            Some(dashes) => {
                let pattern: Vec<String> = dashes.iter().map(|d| format_coordinate(*d)).collect();
                element.set("stroke-dasharray", pattern.join(","))
            }
            None => element,
        }
    }};
}

/// SVG exporter.
#[derive(Debug, Clone)]
pub struct Svg {
    theme: Theme,
}

impl Svg {
    pub fn new(theme: Theme) -> Self {
        Self { theme }
    }

    fn render_command(&self, document: Document, command: &DrawCommand) -> Document {
        match command {
            DrawCommand::Rectangle {
                bounds,
                fill,
                stroke,
                radius,
            } => {
                let mut rect = svg_element::Rectangle::new()
                    .set("x", format_coordinate(bounds.min_x()))
                    .set("y", format_coordinate(bounds.min_y()))
                    .set("width", format_coordinate(bounds.width()))
                    .set("height", format_coordinate(bounds.height()))
                    .set("fill", fill.map_or_else(|| "none".to_string(), |c| c.to_hex()));
                if *radius > 0.0 {
                    rect = rect.set("rx", format_coordinate(*radius));
                }
                match stroke {
                    Some(stroke) => document.add(apply_stroke!(rect, stroke)),
                    None => document.add(rect),
                }
            }
            DrawCommand::Line { start, end, stroke } => {
                let line = svg_element::Line::new()
                    .set("x1", format_coordinate(start.x()))
                    .set("y1", format_coordinate(start.y()))
                    .set("x2", format_coordinate(end.x()))
                    .set("y2", format_coordinate(end.y()));
                document.add(apply_stroke!(line, stroke))
            }
            DrawCommand::Circle {
                center,
                radius,
                fill,
                stroke,
            } => {
                let circle = svg_element::Circle::new()
                    .set("cx", format_coordinate(center.x()))
                    .set("cy", format_coordinate(center.y()))
                    .set("r", format_coordinate(*radius))
                    .set("fill", fill.map_or_else(|| "none".to_string(), |c| c.to_hex()));
                match stroke {
                    Some(stroke) => document.add(apply_stroke!(circle, stroke)),
                    None => document.add(circle),
                }
            }
            DrawCommand::Text {
                anchor,
                content,
                font,
                align,
            } => {
                let fill = font.color().copied().unwrap_or_else(|| self.theme.wire());
                let text = svg_element::Text::new(content.as_str())
                    .set("x", format_coordinate(anchor.x()))
                    .set("y", format_coordinate(anchor.y()))
                    .set("text-anchor", align.name())
                    .set("dominant-baseline", "central")
                    .set("font-family", font.font_family())
                    .set("font-size", font.font_size())
                    .set("fill", fill.to_hex());
                document.add(text)
            }
        }
    }
}

impl Exporter for Svg {
    fn export_diagram(&mut self, diagram: &Diagram) -> Result<String, Error> {
        let bounds = diagram.bounds();
        let width = format_coordinate(bounds.width());
        let height = format_coordinate(bounds.height());

        let mut document = Document::new()
            .set("viewBox", format!("0 0 {width} {height}"))
            .set("width", width)
            .set("height", height);

        let commands = emit(diagram, &self.theme).render();
        for command in &commands {
            document = self.render_command(document, command);
        }

        let markup = document.to_string();
        debug!(commands = commands.len(), bytes = markup.len(); "SVG document written");
        Ok(markup)
    }
}

#[cfg(test)]
mod tests {
    use qollage_core::circuit::{Circuit, Operation};

    use super::*;
    use crate::{
        config::{RenderConfig, StyleConfig},
        layout::EngineBuilder,
        structure::CircuitStructure,
        timeline::Allocation,
    };

    fn export(circuit: &Circuit) -> String {
        let structure = CircuitStructure::from_circuit(circuit, &RenderConfig::default()).unwrap();
        let allocation = Allocation::allocate(&structure);
        let diagram = EngineBuilder::new().build(&structure, &allocation).unwrap();
        let theme = Theme::from_style(&StyleConfig::default()).unwrap();
        Svg::new(theme).export_diagram(&diagram).unwrap()
    }

    #[test]
    fn test_svg_document() {
        let mut circuit = Circuit::new(2);
        circuit.add_operation(Operation::gate("Hadamard", [0]));
        circuit.add_operation(Operation::cnot(0, 1));
        let markup = export(&circuit);

        assert!(markup.starts_with("<svg"));
        assert!(markup.contains("viewBox=\"0 0 "));
        assert!(markup.contains("<rect"));
        assert!(markup.contains("<circle"));
        assert!(markup.contains("<line"));
        assert!(markup.contains(">H</text>") || markup.contains(">\nH\n</text>"));
    }

    #[test]
    fn test_svg_is_deterministic() {
        let mut circuit = Circuit::new(2);
        circuit.add_operation(Operation::define_bits("ro", 2));
        circuit.add_operation(Operation::gate("Hadamard", [1]));
        circuit.add_operation(Operation::measure(1, "ro", 1));
        circuit.add_operation(Operation::barrier(Vec::new()));
        assert_eq!(export(&circuit), export(&circuit));
    }

    #[test]
    fn test_dashed_barrier_has_dasharray() {
        let mut circuit = Circuit::new(2);
        circuit.add_operation(Operation::barrier(Vec::new()));
        assert!(export(&circuit).contains("stroke-dasharray=\"4,3\""));
    }
}
