//! Walks a [`Diagram`] and emits draw commands.
//!
//! Emission order is fixed: the background and group frames, then the wires
//! and their labels, then every node in column-then-line order. Layers keep
//! connectors beneath glyphs and all text on top.

use qollage_core::{
    color::Color,
    draw::{DrawCommand, LayeredOutput, RenderLayer, StrokeDefinition, TextAlign, TextDefinition},
    geometry::{Bounds, Point},
};

use super::Theme;
use crate::{
    layout::{Connector, ConnectorStyle, Diagram, Glyph, LayoutNode, Wire},
    structure::LineKind,
};

/// Half the distance between the two strokes of a classical wire.
const DOUBLE_LINE_OFFSET: f32 = 1.5;

const WIRE_WIDTH: f32 = 1.0;

const BOSONIC_WIRE_WIDTH: f32 = 2.5;

const GATE_RADIUS: f32 = 2.0;

/// Emits the draw commands of a diagram.
pub fn emit(diagram: &Diagram, theme: &Theme) -> LayeredOutput {
    let mut output = LayeredOutput::new();
    let wire_stroke = StrokeDefinition::solid(theme.wire(), WIRE_WIDTH);

    if let Some(background) = theme.background() {
        output.add_to_layer(
            RenderLayer::Background,
            DrawCommand::rectangle(diagram.bounds(), Some(background), None),
        );
    }

    for frame in diagram.groups() {
        output.add_to_layer(
            RenderLayer::Background,
            DrawCommand::rectangle(
                frame.bounds(),
                None,
                Some(StrokeDefinition::dashed(theme.wire(), WIRE_WIDTH)),
            )
            .with_radius(GATE_RADIUS * 2.0),
        );
        let font = small_font(theme.font());
        let anchor = Point::new(
            frame.bounds().min_x(),
            frame.bounds().min_y() - f32::from(font.font_size()) * 0.7,
        );
        output.add_to_layer(
            RenderLayer::Text,
            DrawCommand::text(anchor, frame.label(), font, TextAlign::Start),
        );
        if let Some(connector) = frame.connector() {
            emit_connector(&mut output, connector, &wire_stroke);
        }
        if let Some(marker) = frame.marker() {
            emit_glyph(&mut output, marker, theme.gate_fill(), &wire_stroke, theme);
        }
    }

    for wire in diagram.wires() {
        emit_wire(&mut output, wire, &wire_stroke, theme);
    }

    for node in diagram.nodes() {
        emit_node(&mut output, node, &wire_stroke, theme);
    }

    output
}

fn emit_wire(output: &mut LayeredOutput, wire: &Wire, stroke: &StrokeDefinition, theme: &Theme) {
    match wire.kind() {
        LineKind::Quantum => output.add_to_layer(
            RenderLayer::Wire,
            DrawCommand::line(wire.start(), wire.end(), stroke.clone()),
        ),
        LineKind::Bosonic => output.add_to_layer(
            RenderLayer::Wire,
            DrawCommand::line(
                wire.start(),
                wire.end(),
                stroke.clone().with_width(BOSONIC_WIRE_WIDTH),
            ),
        ),
        LineKind::Classical => {
            for offset in [-DOUBLE_LINE_OFFSET, DOUBLE_LINE_OFFSET] {
                output.add_to_layer(
                    RenderLayer::Wire,
                    DrawCommand::line(
                        wire.start().offset(0.0, offset),
                        wire.end().offset(0.0, offset),
                        stroke.clone(),
                    ),
                );
            }
        }
    }
    output.add_to_layer(
        RenderLayer::Text,
        DrawCommand::text(
            wire.label_anchor(),
            wire.label(),
            theme.font().clone(),
            TextAlign::End,
        ),
    );
}

fn emit_node(
    output: &mut LayeredOutput,
    node: &LayoutNode,
    stroke: &StrokeDefinition,
    theme: &Theme,
) {
    if let Some(connector) = node.connector() {
        emit_connector(output, connector, stroke);
    }

    let fill = theme.fill_for(node.class());
    for glyph in node.glyphs() {
        emit_glyph(output, glyph, fill, stroke, theme);
    }
}

/// Emits one glyph; `fill` colors gate boxes.
fn emit_glyph(
    output: &mut LayeredOutput,
    glyph: &Glyph,
    fill: Color,
    stroke: &StrokeDefinition,
    theme: &Theme,
) {
    let gate_stroke = StrokeDefinition::solid(theme.gate_stroke(), WIRE_WIDTH);
    match glyph {
        Glyph::Gate { bounds, label } => {
            output.add_to_layer(
                RenderLayer::Glyph,
                DrawCommand::rectangle(*bounds, Some(fill), Some(gate_stroke.clone()))
                    .with_radius(GATE_RADIUS),
            );
            output.add_to_layer(
                RenderLayer::Text,
                DrawCommand::text(
                    bounds.center(),
                    label.as_str(),
                    theme.font().clone(),
                    TextAlign::Middle,
                ),
            );
        }
        Glyph::Control { center, radius } => output.add_to_layer(
            RenderLayer::Glyph,
            DrawCommand::circle(*center, *radius, Some(theme.wire()), None),
        ),
        Glyph::Oplus { center, radius } => {
            output.add_to_layer(
                RenderLayer::Glyph,
                DrawCommand::circle(
                    *center,
                    *radius,
                    Some(theme.gate_fill()),
                    Some(stroke.clone()),
                ),
            );
            for (dx, dy) in [(*radius, 0.0), (0.0, *radius)] {
                output.add_to_layer(
                    RenderLayer::Glyph,
                    DrawCommand::line(
                        center.offset(-dx, -dy),
                        center.offset(dx, dy),
                        stroke.clone(),
                    ),
                );
            }
        }
        Glyph::Cross { center, half_size } => {
            let d = *half_size;
            for (start, end) in [((-d, -d), (d, d)), ((-d, d), (d, -d))] {
                output.add_to_layer(
                    RenderLayer::Glyph,
                    DrawCommand::line(
                        center.offset(start.0, start.1),
                        center.offset(end.0, end.1),
                        stroke.clone().with_width(WIRE_WIDTH * 1.5),
                    ),
                );
            }
        }
        Glyph::Meter { bounds } => emit_meter(output, *bounds, &gate_stroke, theme),
        Glyph::Separator { top, bottom } => output.add_to_layer(
            RenderLayer::Connector,
            DrawCommand::line(
                *top,
                *bottom,
                StrokeDefinition::dashed(theme.wire(), WIRE_WIDTH),
            ),
        ),
        Glyph::BitMarker {
            center,
            radius,
            label,
        } => {
            output.add_to_layer(
                RenderLayer::Glyph,
                DrawCommand::circle(*center, *radius, Some(theme.wire()), None),
            );
            let font = small_font(theme.font());
            let anchor = center.offset(*radius + 2.0, f32::from(font.font_size()) * 0.7);
            output.add_to_layer(
                RenderLayer::Text,
                DrawCommand::text(anchor, label.as_str(), font, TextAlign::Start),
            );
        }
    }
}

fn emit_connector(output: &mut LayeredOutput, connector: &Connector, stroke: &StrokeDefinition) {
    match connector.style() {
        ConnectorStyle::Single => output.add_to_layer(
            RenderLayer::Connector,
            DrawCommand::line(connector.start(), connector.end(), stroke.clone()),
        ),
        ConnectorStyle::Double => {
            for offset in [-DOUBLE_LINE_OFFSET, DOUBLE_LINE_OFFSET] {
                output.add_to_layer(
                    RenderLayer::Connector,
                    DrawCommand::line(
                        connector.start().offset(offset, 0.0),
                        connector.end().offset(offset, 0.0),
                        stroke.clone(),
                    ),
                );
            }
        }
    }
}

/// Meter box: a framed gauge with a needle pointing up and to the right.
fn emit_meter(output: &mut LayeredOutput, bounds: Bounds, stroke: &StrokeDefinition, theme: &Theme) {
    output.add_to_layer(
        RenderLayer::Glyph,
        DrawCommand::rectangle(bounds, Some(theme.gate_fill()), Some(stroke.clone()))
            .with_radius(GATE_RADIUS),
    );
    let pivot = Point::new(bounds.center().x(), bounds.max_y() - bounds.height() * 0.2);
    let tip = Point::new(
        bounds.max_x() - bounds.width() * 0.2,
        bounds.min_y() + bounds.height() * 0.25,
    );
    output.add_to_layer(
        RenderLayer::Glyph,
        DrawCommand::line(pivot, tip, stroke.clone()),
    );
    output.add_to_layer(
        RenderLayer::Glyph,
        DrawCommand::circle(pivot, bounds.width() * 0.06, Some(*stroke.color()), None),
    );
}

fn small_font(font: &TextDefinition) -> TextDefinition {
    font.clone()
        .with_font_size(font.font_size().saturating_sub(2).max(6))
}
