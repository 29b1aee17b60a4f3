//! Layout engine for positioning circuit elements.
//!
//! This module converts classified operations and their allocated columns
//! into absolute coordinates: wire geometry for every line, one
//! [`LayoutNode`] per operation with its glyphs and connector, frames for
//! loop, conditional and controlled groups and the overall canvas bounds.
//!
//! # Geometry
//!
//! - Line `i` sits at `margin + line_spacing * (i + 0.5)`.
//! - A column is as wide as its widest glyph (label plus padding), floored at
//!   the minimum column width, plus the column gap. Glyphs are centered in
//!   their column.
//! - The canvas is `margin + label column + Σ columns + trailing wire + margin`
//!   wide and `2 * margin + lines * line_spacing` tall.
//!
//! # Usage
//!
//! ```
//! # use qollage::config::RenderConfig;
//! # use qollage::layout::EngineBuilder;
//! # use qollage::structure::CircuitStructure;
//! # use qollage::timeline::Allocation;
//! # use qollage_core::circuit::{Circuit, Operation};
//! let mut circuit = Circuit::new(2);
//! circuit.add_operation(Operation::cnot(0, 1));
//!
//! let structure = CircuitStructure::from_circuit(&circuit, &RenderConfig::default()).unwrap();
//! let allocation = Allocation::allocate(&structure);
//! let diagram = EngineBuilder::new().build(&structure, &allocation).unwrap();
//!
//! assert_eq!(diagram.columns().len(), 1);
//! assert!(diagram.nodes()[0].connector().is_some());
//! ```

use log::{debug, trace};

use qollage_core::{
    draw::{Text, TextDefinition},
    geometry::{Bounds, Point, Size},
};

use crate::{
    error::QollageError,
    structure::{
        CircuitStructure, Descriptor, Element, Group, GroupAnchor, LineKind, OperationClass,
        Position, Shape, Span, TargetGlyph,
    },
    timeline::{Allocation, Slot},
};

// =============================================================================
// Layout output
// =============================================================================

/// Geometry of one horizontal line.
#[derive(Debug, Clone, PartialEq)]
pub struct Wire {
    line: usize,
    kind: LineKind,
    label: String,
    start: Point,
    end: Point,
    label_anchor: Point,
}

impl Wire {
    pub fn line(&self) -> usize {
        self.line
    }

    pub fn kind(&self) -> LineKind {
        self.kind
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn start(&self) -> Point {
        self.start
    }

    pub fn end(&self) -> Point {
        self.end
    }

    /// Right-aligned anchor of the line label.
    pub fn label_anchor(&self) -> Point {
        self.label_anchor
    }
}

/// Horizontal extent of one time column, gap included.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColumnExtent {
    left: f32,
    width: f32,
}

impl ColumnExtent {
    pub fn left(self) -> f32 {
        self.left
    }

    pub fn width(self) -> f32 {
        self.width
    }

    pub fn right(self) -> f32 {
        self.left + self.width
    }

    pub fn center(self) -> f32 {
        self.left + self.width / 2.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectorStyle {
    /// Quantum connector
    Single,
    /// Classical connector, drawn as a double line
    Double,
}

/// Vertical connector of a multi-line operation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Connector {
    start: Point,
    end: Point,
    style: ConnectorStyle,
}

impl Connector {
    pub fn start(&self) -> Point {
        self.start
    }

    pub fn end(&self) -> Point {
        self.end
    }

    pub fn style(&self) -> ConnectorStyle {
        self.style
    }
}

/// A resolved piece of an operation's drawing.
#[derive(Debug, Clone, PartialEq)]
pub enum Glyph {
    /// Labelled gate box.
    Gate { bounds: Bounds, label: String },
    /// Filled control dot.
    Control { center: Point, radius: f32 },
    /// `⊕` target.
    Oplus { center: Point, radius: f32 },
    /// Swap cross.
    Cross { center: Point, half_size: f32 },
    /// Measurement meter box.
    Meter { bounds: Bounds },
    /// Dashed barrier separator.
    Separator { top: Point, bottom: Point },
    /// Dot on a classical line with the measured bit index next to it.
    BitMarker {
        center: Point,
        radius: f32,
        label: String,
    },
}

impl Glyph {
    pub fn bounds(&self) -> Bounds {
        match self {
            Self::Gate { bounds, .. } | Self::Meter { bounds } => *bounds,
            Self::Control { center, radius }
            | Self::Oplus { center, radius }
            | Self::BitMarker { center, radius, .. } => {
                Bounds::new_from_center(*center, Size::new(radius * 2.0, radius * 2.0))
            }
            Self::Cross { center, half_size } => {
                Bounds::new_from_center(*center, Size::new(half_size * 2.0, half_size * 2.0))
            }
            Self::Separator { top, bottom } => Bounds::from_corners(*top, *bottom),
        }
    }
}

/// Resolved layout of one operation instance.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutNode {
    position: Position,
    column: usize,
    class: OperationClass,
    span: Span,
    bounds: Bounds,
    label: Option<String>,
    connector: Option<Connector>,
    glyphs: Vec<Glyph>,
}

impl LayoutNode {
    pub fn position(&self) -> &Position {
        &self.position
    }

    pub fn column(&self) -> usize {
        self.column
    }

    pub fn class(&self) -> OperationClass {
        self.class
    }

    pub fn span(&self) -> Span {
        self.span
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn connector(&self) -> Option<&Connector> {
        self.connector.as_ref()
    }

    pub fn glyphs(&self) -> &[Glyph] {
        &self.glyphs
    }
}

/// Dashed frame around the columns of a group body.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupFrame {
    position: Position,
    label: String,
    bounds: Bounds,
    columns: std::ops::Range<usize>,
    marker: Option<Glyph>,
    connector: Option<Connector>,
}

impl GroupFrame {
    pub fn position(&self) -> &Position {
        &self.position
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    /// Columns covered by the frame.
    pub fn columns(&self) -> std::ops::Range<usize> {
        self.columns.clone()
    }

    /// Condition bit marker or control dot on the anchor line.
    pub fn marker(&self) -> Option<&Glyph> {
        self.marker.as_ref()
    }

    /// Link from the frame edge to the anchor line.
    pub fn connector(&self) -> Option<&Connector> {
        self.connector.as_ref()
    }
}

/// A fully laid out circuit diagram.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagram {
    wires: Vec<Wire>,
    columns: Vec<ColumnExtent>,
    nodes: Vec<LayoutNode>,
    groups: Vec<GroupFrame>,
    bounds: Bounds,
    font: TextDefinition,
}

impl Diagram {
    pub fn wires(&self) -> &[Wire] {
        &self.wires
    }

    pub fn columns(&self) -> &[ColumnExtent] {
        &self.columns
    }

    /// Nodes in column-then-line order.
    pub fn nodes(&self) -> &[LayoutNode] {
        &self.nodes
    }

    pub fn groups(&self) -> &[GroupFrame] {
        &self.groups
    }

    /// Canvas bounds, margins included. The top-left corner is the origin.
    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    /// Font used for every label.
    pub fn font(&self) -> &TextDefinition {
        &self.font
    }
}

// =============================================================================
// Engine
// =============================================================================

/// Builder for the layout engine.
#[derive(Debug, Clone)]
pub struct EngineBuilder {
    line_spacing: f32,
    min_column_width: f32,
    column_gap: f32,
    gate_height: f32,
    gate_padding: f32,
    margin: f32,
    label_gap: f32,
    trailing_wire: f32,
    font: TextDefinition,
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self {
            line_spacing: 40.0,
            min_column_width: 30.0,
            column_gap: 12.0,
            gate_height: 28.0,
            gate_padding: 8.0,
            margin: 20.0,
            label_gap: 10.0,
            trailing_wire: 20.0,
            font: TextDefinition::default(),
        }
    }
}

impl EngineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the vertical distance between adjacent lines
    pub fn with_line_spacing(mut self, spacing: f32) -> Self {
        self.line_spacing = spacing;
        self
    }

    pub fn with_min_column_width(mut self, width: f32) -> Self {
        self.min_column_width = width;
        self
    }

    /// Set the horizontal space added to every column
    pub fn with_column_gap(mut self, gap: f32) -> Self {
        self.column_gap = gap;
        self
    }

    pub fn with_gate_height(mut self, height: f32) -> Self {
        self.gate_height = height;
        self
    }

    /// Set the horizontal padding between a gate label and its box
    pub fn with_gate_padding(mut self, padding: f32) -> Self {
        self.gate_padding = padding;
        self
    }

    pub fn with_margin(mut self, margin: f32) -> Self {
        self.margin = margin;
        self
    }

    pub fn with_label_gap(mut self, gap: f32) -> Self {
        self.label_gap = gap;
        self
    }

    pub fn with_trailing_wire(mut self, length: f32) -> Self {
        self.trailing_wire = length;
        self
    }

    /// Set the font labels are measured and drawn with
    pub fn with_font(mut self, font: TextDefinition) -> Self {
        self.font = font;
        self
    }

    /// Lays out an allocated circuit structure.
    ///
    /// # Errors
    ///
    /// Returns [`QollageError::Layout`] if the allocation does not belong to
    /// the structure or an element references a line that does not exist.
    pub fn build(
        &self,
        structure: &CircuitStructure,
        allocation: &Allocation,
    ) -> Result<Diagram, QollageError> {
        let elements = structure.elements();
        if elements.len() != allocation.slots().len() {
            return Err(QollageError::Layout(format!(
                "allocation has {} slots for {} elements",
                allocation.slots().len(),
                elements.len()
            )));
        }
        let line_count = structure.lines().len();
        if let Some(element) = elements.iter().find(|e| e.span().last() >= line_count) {
            return Err(QollageError::Layout(format!(
                "element spans line {} but the circuit has {line_count} lines",
                element.span().last()
            )));
        }

        let columns = self.column_extents(structure, allocation);
        let wire_end = columns
            .last()
            .map_or(self.wire_start(structure), |column| column.right())
            + self.trailing_wire;

        let wires = structure
            .lines()
            .iter()
            .map(|line| {
                let y = self.line_y(line.index());
                Wire {
                    line: line.index(),
                    kind: line.kind(),
                    label: line.label().to_string(),
                    start: Point::new(self.wire_start(structure), y),
                    end: Point::new(wire_end, y),
                    label_anchor: Point::new(self.wire_start(structure) - self.label_gap, y),
                }
            })
            .collect();

        let mut nodes = Vec::new();
        let mut groups = Vec::new();
        let mut open_groups = Vec::new();
        for (element, slot) in elements.iter().zip(allocation.slots()) {
            match (element, *slot) {
                (Element::Operation(descriptor), Slot::Column(column)) => {
                    nodes.push(self.layout_node(descriptor, columns[column], column));
                }
                (Element::GroupStart(group), Slot::Boundary(start)) => {
                    open_groups.push((group, start));
                }
                (Element::GroupEnd(_), Slot::Boundary(end)) => {
                    let Some((group, start)) = open_groups.pop() else {
                        return Err(QollageError::Layout("unbalanced group markers".to_string()));
                    };
                    groups.push(self.group_frame(group, start..end, &columns));
                }
                (element, slot) => {
                    return Err(QollageError::Layout(format!(
                        "element {element:?} cannot occupy {slot:?}"
                    )));
                }
            }
        }
        if !open_groups.is_empty() {
            return Err(QollageError::Layout("unbalanced group markers".to_string()));
        }

        nodes.sort_by_key(|node| (node.column, node.span.first()));

        let width = wire_end + self.margin;
        let height = 2.0 * self.margin + line_count as f32 * self.line_spacing;
        let bounds = Bounds::new_from_top_left(Point::default(), Size::new(width, height));

        debug!(
            width,
            height,
            columns = columns.len(),
            nodes = nodes.len();
            "Layout calculated"
        );

        Ok(Diagram {
            wires,
            columns,
            nodes,
            groups,
            bounds,
            font: self.font.clone(),
        })
    }

    fn line_y(&self, line: usize) -> f32 {
        self.margin + self.line_spacing * (line as f32 + 0.5)
    }

    /// Left end of every wire: margin plus the line label column.
    fn wire_start(&self, structure: &CircuitStructure) -> f32 {
        let widest_label = structure
            .lines()
            .iter()
            .map(|line| self.text_width(line.label()))
            .fold(0.0_f32, f32::max);
        let label_column = if structure.lines().is_empty() {
            0.0
        } else {
            widest_label + self.label_gap
        };
        self.margin + label_column
    }

    fn text_width(&self, text: &str) -> f32 {
        Text::new(&self.font, text).calculate_size().width()
    }

    fn column_extents(
        &self,
        structure: &CircuitStructure,
        allocation: &Allocation,
    ) -> Vec<ColumnExtent> {
        let mut widths = vec![self.min_column_width; allocation.column_count()];
        for (element, slot) in structure.elements().iter().zip(allocation.slots()) {
            if let (Element::Operation(descriptor), Slot::Column(column)) = (element, slot) {
                let width = self.glyph_width(descriptor);
                trace!(position:% = descriptor.position(), column, width; "Glyph measured");
                widths[*column] = widths[*column].max(width);
            }
        }

        let mut left = self.wire_start(structure);
        widths
            .into_iter()
            .map(|width| {
                let extent = ColumnExtent {
                    left,
                    width: width + self.column_gap,
                };
                left = extent.right();
                extent
            })
            .collect()
    }

    /// Width of the widest glyph of an operation, gap excluded.
    fn glyph_width(&self, descriptor: &Descriptor) -> f32 {
        match descriptor.label() {
            Some(label) => (self.text_width(label) + 2.0 * self.gate_padding).max(self.gate_height),
            None => match descriptor.shape() {
                Shape::Barrier { .. } | Shape::Swap { .. } => self.gate_height / 2.0,
                _ => self.gate_height,
            },
        }
    }

    fn layout_node(&self, descriptor: &Descriptor, column: ColumnExtent, index: usize) -> LayoutNode {
        let x = column.center();
        let width = self.glyph_width(descriptor);
        let half_gate = self.gate_height / 2.0;
        let dot_radius = self.gate_height * 0.14;
        let label = descriptor.label().map(str::to_string);

        let gate_box = |first: usize, last: usize| Glyph::Gate {
            bounds: Bounds::from_corners(
                Point::new(x - width / 2.0, self.line_y(first) - half_gate),
                Point::new(x + width / 2.0, self.line_y(last) + half_gate),
            ),
            label: label.clone().unwrap_or_default(),
        };
        let single_connector = |span: Span| Connector {
            start: Point::new(x, self.line_y(span.first())),
            end: Point::new(x, self.line_y(span.last())),
            style: ConnectorStyle::Single,
        };

        let mut connector = None;
        let mut glyphs = Vec::new();
        match descriptor.shape() {
            Shape::Box { line } => glyphs.push(gate_box(*line, *line)),
            Shape::Block { .. } => {
                let span = descriptor.span();
                glyphs.push(gate_box(span.first(), span.last()));
            }
            Shape::Controlled {
                controls,
                targets,
                target,
            } => {
                connector = Some(single_connector(descriptor.span()));
                for control in controls {
                    glyphs.push(Glyph::Control {
                        center: Point::new(x, self.line_y(*control)),
                        radius: dot_radius,
                    });
                }
                match target {
                    TargetGlyph::Box => {
                        if let Some(span) = Span::covering(targets) {
                            glyphs.push(gate_box(span.first(), span.last()));
                        }
                    }
                    TargetGlyph::Oplus => glyphs.extend(targets.iter().map(|line| Glyph::Oplus {
                        center: Point::new(x, self.line_y(*line)),
                        radius: self.gate_height * 0.3,
                    })),
                    TargetGlyph::Dot => glyphs.extend(targets.iter().map(|line| Glyph::Control {
                        center: Point::new(x, self.line_y(*line)),
                        radius: dot_radius,
                    })),
                    TargetGlyph::Cross => glyphs.extend(targets.iter().map(|line| Glyph::Cross {
                        center: Point::new(x, self.line_y(*line)),
                        half_size: self.gate_height * 0.2,
                    })),
                }
            }
            Shape::Swap { lines } => {
                connector = Some(single_connector(descriptor.span()));
                glyphs.extend(lines.iter().map(|line| Glyph::Cross {
                    center: Point::new(x, self.line_y(*line)),
                    half_size: self.gate_height * 0.2,
                }));
            }
            Shape::Measurement {
                qubit,
                register,
                bit,
            } => {
                let qubit_y = self.line_y(*qubit);
                let register_y = self.line_y(*register);
                let direction = if register_y >= qubit_y { 1.0 } else { -1.0 };
                connector = Some(Connector {
                    start: Point::new(x, qubit_y + direction * half_gate),
                    end: Point::new(x, register_y),
                    style: ConnectorStyle::Double,
                });
                glyphs.push(Glyph::Meter {
                    bounds: Bounds::new_from_center(
                        Point::new(x, qubit_y),
                        Size::new(self.gate_height, self.gate_height),
                    ),
                });
                glyphs.push(Glyph::BitMarker {
                    center: Point::new(x, register_y),
                    radius: dot_radius,
                    label: bit.to_string(),
                });
            }
            Shape::Barrier { .. } => {
                let span = descriptor.span();
                let half_line = self.line_spacing / 2.0;
                glyphs.push(Glyph::Separator {
                    top: Point::new(x, self.line_y(span.first()) - half_line),
                    bottom: Point::new(x, self.line_y(span.last()) + half_line),
                });
            }
        }

        let mut bounds = glyphs
            .iter()
            .map(Glyph::bounds)
            .reduce(|acc, bounds| acc.merge(&bounds))
            .unwrap_or_else(|| Bounds::from_corners(Point::new(x, 0.0), Point::new(x, 0.0)));
        if let Some(connector) = &connector {
            bounds = bounds.merge(&Bounds::from_corners(connector.start, connector.end));
        }

        LayoutNode {
            position: descriptor.position().clone(),
            column: index,
            class: descriptor.class(),
            span: descriptor.span(),
            bounds,
            label,
            connector,
            glyphs,
        }
    }

    fn group_frame(
        &self,
        group: &Group,
        columns: std::ops::Range<usize>,
        extents: &[ColumnExtent],
    ) -> GroupFrame {
        let span = group.body();
        let inset = self.column_gap / 4.0;
        let left = extents
            .get(columns.start)
            .map_or(0.0, |column| column.left());
        let right = columns
            .end
            .checked_sub(1)
            .and_then(|last| extents.get(last))
            .map_or(left, |column| column.right());
        let vertical_pad = (self.line_spacing - self.gate_height) / 4.0;
        let top = self.line_y(span.first()) - self.gate_height / 2.0 - vertical_pad;
        let bottom = self.line_y(span.last()) + self.gate_height / 2.0 + vertical_pad;

        let bounds = Bounds::from_corners(
            Point::new(left + inset, top),
            Point::new(right - inset, bottom),
        );

        let (marker, connector) = match group.anchor() {
            Some(anchor) => self.frame_anchor(anchor, bounds),
            None => (None, None),
        };

        GroupFrame {
            position: group.position().clone(),
            label: group.label().to_string(),
            bounds,
            columns,
            marker,
            connector,
        }
    }

    /// Marker on the frame's left edge at the anchor line, linked to the
    /// nearest horizontal edge when the line lies outside the frame.
    fn frame_anchor(
        &self,
        anchor: GroupAnchor,
        frame: Bounds,
    ) -> (Option<Glyph>, Option<Connector>) {
        let x = frame.min_x();
        let y = self.line_y(anchor.line());
        let center = Point::new(x, y);
        let radius = self.gate_height * 0.14;
        let (marker, style) = match anchor {
            GroupAnchor::Condition { bit, .. } => (
                Glyph::BitMarker {
                    center,
                    radius,
                    label: bit.to_string(),
                },
                ConnectorStyle::Double,
            ),
            GroupAnchor::Control { .. } => {
                (Glyph::Control { center, radius }, ConnectorStyle::Single)
            }
        };

        let edge = if y > frame.max_y() {
            Some(frame.max_y())
        } else if y < frame.min_y() {
            Some(frame.min_y())
        } else {
            None
        };
        let connector = edge.map(|edge| Connector {
            start: Point::new(x, edge),
            end: center,
            style,
        });
        trace!(line = anchor.line(), linked = connector.is_some(); "Group frame anchored");
        (Some(marker), connector)
    }
}

#[cfg(test)]
mod tests {
    use float_cmp::assert_approx_eq;

    use qollage_core::circuit::{Circuit, Operation};

    use super::*;
    use crate::config::RenderConfig;

    fn layout(circuit: &Circuit) -> Diagram {
        let structure = CircuitStructure::from_circuit(circuit, &RenderConfig::default()).unwrap();
        let allocation = Allocation::allocate(&structure);
        EngineBuilder::new().build(&structure, &allocation).unwrap()
    }

    #[test]
    fn test_single_hadamard() {
        let mut circuit = Circuit::new(1);
        circuit.add_operation(Operation::gate("Hadamard", [0]));
        let diagram = layout(&circuit);

        assert_eq!(diagram.wires().len(), 1);
        assert_eq!(diagram.columns().len(), 1);
        assert_eq!(diagram.nodes().len(), 1);

        let node = &diagram.nodes()[0];
        assert_eq!(node.class(), OperationClass::SingleQubit);
        assert_eq!(node.label(), Some("H"));
        assert!(node.connector().is_none());
        let [Glyph::Gate { bounds, label }] = node.glyphs() else {
            panic!("expected a single gate box, got {:?}", node.glyphs());
        };
        assert_eq!(label, "H");
        assert_approx_eq!(f32, bounds.center().y(), 20.0 + 20.0);
        assert_approx_eq!(f32, bounds.center().x(), diagram.columns()[0].center());
    }

    #[test]
    fn test_line_positions_and_canvas_height() {
        let diagram = layout(&Circuit::new(3));
        let ys: Vec<f32> = diagram.wires().iter().map(|wire| wire.start().y()).collect();
        assert_eq!(ys, [40.0, 80.0, 120.0]);
        assert_approx_eq!(f32, diagram.bounds().height(), 2.0 * 20.0 + 3.0 * 40.0);
        assert!(diagram.columns().is_empty());
    }

    #[test]
    fn test_canvas_width_is_sum_of_columns() {
        let mut circuit = Circuit::new(2);
        circuit.add_operation(Operation::gate("Hadamard", [0]));
        circuit.add_operation(Operation::rotation("RotateX", 0, "theta + 2*phi"));
        circuit.add_operation(Operation::cnot(0, 1));
        let diagram = layout(&circuit);

        let wire = &diagram.wires()[0];
        let total: f32 = diagram.columns().iter().map(|c| c.width()).sum();
        assert_approx_eq!(
            f32,
            wire.end().x() - wire.start().x(),
            total + 20.0,
            epsilon = 0.01
        );
        assert_approx_eq!(f32, diagram.bounds().width(), wire.end().x() + 20.0);

        assert!(diagram.columns()[1].width() > diagram.columns()[0].width());
        for pair in diagram.columns().windows(2) {
            assert_approx_eq!(f32, pair[0].right(), pair[1].left());
        }
    }

    #[test]
    fn test_columns_respect_minimum_width() {
        let mut circuit = Circuit::new(1);
        circuit.add_operation(Operation::barrier(Vec::new()));
        let diagram = layout(&circuit);
        assert_approx_eq!(f32, diagram.columns()[0].width(), 30.0 + 12.0);
    }

    #[test]
    fn test_controlled_x_glyphs() {
        let mut circuit = Circuit::new(2);
        circuit.add_operation(Operation::cnot(0, 1));
        let diagram = layout(&circuit);
        let node = &diagram.nodes()[0];

        assert_eq!(node.column(), 0);
        assert_eq!(node.span(), Span::new(0, 1));
        let connector = node.connector().unwrap();
        assert_eq!(connector.style(), ConnectorStyle::Single);
        assert_approx_eq!(f32, connector.start().y(), 40.0);
        assert_approx_eq!(f32, connector.end().y(), 80.0);
        assert!(matches!(node.glyphs()[0], Glyph::Control { .. }));
        assert!(matches!(node.glyphs()[1], Glyph::Oplus { .. }));
    }

    #[test]
    fn test_measurement_uses_double_connector() {
        let mut circuit = Circuit::new(1);
        circuit.add_operation(Operation::define_bits("ro", 2));
        circuit.add_operation(Operation::measure(0, "ro", 1));
        let diagram = layout(&circuit);

        assert_eq!(diagram.wires()[1].kind(), LineKind::Classical);
        let node = &diagram.nodes()[0];
        assert_eq!(node.connector().unwrap().style(), ConnectorStyle::Double);
        assert!(node.glyphs().iter().any(|glyph| matches!(
            glyph,
            Glyph::BitMarker { label, .. } if label == "1"
        )));
    }

    #[test]
    fn test_nodes_sorted_column_then_line() {
        let mut circuit = Circuit::new(3);
        circuit.add_operation(Operation::gate("Hadamard", [2]));
        circuit.add_operation(Operation::gate("Hadamard", [2]));
        circuit.add_operation(Operation::gate("Hadamard", [0]));
        let diagram = layout(&circuit);
        let order: Vec<(usize, usize)> = diagram
            .nodes()
            .iter()
            .map(|node| (node.column(), node.span().first()))
            .collect();
        assert_eq!(order, [(0, 0), (0, 2), (1, 2)]);
    }

    #[test]
    fn test_group_frame_covers_body_columns() {
        let circuit = Circuit::from_operations(vec![
            Operation::gate("Hadamard", [0]),
            Operation::repeat(
                2.0,
                vec![
                    Operation::gate("PauliX", [0]),
                    Operation::gate("PauliX", [0]),
                ],
            ),
        ]);
        let diagram = layout(&circuit);
        let [frame] = diagram.groups() else {
            panic!("expected one frame");
        };
        assert_eq!(frame.columns(), 1..3);
        assert_eq!(frame.label(), "Loop ×2");
        assert!(frame.bounds().min_x() > diagram.columns()[1].left());
        assert!(frame.bounds().max_x() < diagram.columns()[2].right());
        for node in &diagram.nodes()[1..] {
            assert!(frame.bounds().contains(node.bounds().center()));
        }
    }

    #[test]
    fn test_conditional_frame_links_to_register_line() {
        let circuit = Circuit::from_operations(vec![
            Operation::define_bits("ro", 1),
            Operation::measure(0, "ro", 0),
            Operation::conditional("ro", 0, vec![Operation::gate("PauliX", [0])]),
        ]);
        let diagram = layout(&circuit);
        let [frame] = diagram.groups() else {
            panic!("expected one frame");
        };
        assert_eq!(frame.label(), "if ro[0]");
        assert_eq!(frame.columns(), 1..2);

        let register_y = diagram.wires()[1].start().y();
        assert!(frame.bounds().max_y() < register_y);
        let connector = frame.connector().unwrap();
        assert_eq!(connector.style(), ConnectorStyle::Double);
        assert_approx_eq!(f32, connector.start().y(), frame.bounds().max_y());
        assert_approx_eq!(f32, connector.end().y(), register_y);
        assert_approx_eq!(f32, connector.start().x(), frame.bounds().min_x());
        assert!(matches!(
            frame.marker(),
            Some(Glyph::BitMarker { label, .. }) if label == "0"
        ));
    }

    #[test]
    fn test_controlled_frame_links_upwards_to_control() {
        let circuit = Circuit::from_operations(vec![Operation::controlled_circuit(
            0,
            vec![Operation::gate("Hadamard", [2])],
        )]);
        let diagram = layout(&circuit);
        let [frame] = diagram.groups() else {
            panic!("expected one frame");
        };
        let connector = frame.connector().unwrap();
        assert_eq!(connector.style(), ConnectorStyle::Single);
        assert_approx_eq!(f32, connector.start().y(), frame.bounds().min_y());
        assert_approx_eq!(f32, connector.end().y(), 40.0);
        assert!(matches!(frame.marker(), Some(Glyph::Control { .. })));
        assert!(frame.bounds().min_y() > 80.0);
    }

    #[test]
    fn test_loop_frame_has_no_anchor() {
        let circuit = Circuit::from_operations(vec![Operation::repeat(
            3.0,
            vec![Operation::gate("Hadamard", [0])],
        )]);
        let diagram = layout(&circuit);
        assert!(diagram.groups()[0].marker().is_none());
        assert!(diagram.groups()[0].connector().is_none());
    }

    #[test]
    fn test_barrier_separator_covers_synchronized_lines() {
        let mut circuit = Circuit::new(3);
        circuit.add_operation(Operation::barrier([1, 2]));
        let diagram = layout(&circuit);
        let [Glyph::Separator { top, bottom }] = diagram.nodes()[0].glyphs() else {
            panic!("expected a separator");
        };
        assert_approx_eq!(f32, top.y(), 60.0);
        assert_approx_eq!(f32, bottom.y(), 140.0);
    }

    #[test]
    fn test_nodes_fit_inside_canvas() {
        let mut circuit = Circuit::new(3);
        circuit.add_operation(Operation::gate("MultiQubitMS", [0, 2]));
        circuit.add_operation(Operation::gate("SWAP", [0, 1]));
        circuit.add_operation(Operation::barrier(Vec::new()));
        let diagram = layout(&circuit);
        let canvas = diagram.bounds();
        for node in diagram.nodes() {
            assert!(canvas.contains(node.bounds().min_point()));
            assert!(canvas.contains(Point::new(node.bounds().max_x(), node.bounds().max_y())));
        }
    }

    #[test]
    fn test_mismatched_allocation_is_rejected() {
        let mut circuit = Circuit::new(1);
        circuit.add_operation(Operation::gate("Hadamard", [0]));
        let structure = CircuitStructure::from_circuit(&circuit, &RenderConfig::default()).unwrap();
        let other = CircuitStructure::from_circuit(&Circuit::new(1), &RenderConfig::default()).unwrap();
        let allocation = Allocation::allocate(&other);
        let err = EngineBuilder::new().build(&structure, &allocation).unwrap_err();
        assert!(matches!(err, QollageError::Layout(_)));
    }
}
