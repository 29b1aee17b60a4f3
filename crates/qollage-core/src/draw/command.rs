//! Backend-neutral drawing commands.

use crate::{
    color::Color,
    draw::{StrokeDefinition, TextDefinition},
    geometry::{Bounds, Point},
};

/// Horizontal alignment of a text command relative to its anchor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TextAlign {
    Start,
    #[default]
    Middle,
    End,
}

impl TextAlign {
    pub fn name(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Middle => "middle",
            Self::End => "end",
        }
    }
}

/// A single drawing primitive in absolute canvas coordinates.
///
/// Text anchors are vertically centered: the anchor's `y` is the middle of
/// the text line.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Rectangle {
        bounds: Bounds,
        fill: Option<Color>,
        stroke: Option<StrokeDefinition>,
        radius: f32,
    },
    Line {
        start: Point,
        end: Point,
        stroke: StrokeDefinition,
    },
    Circle {
        center: Point,
        radius: f32,
        fill: Option<Color>,
        stroke: Option<StrokeDefinition>,
    },
    Text {
        anchor: Point,
        content: String,
        font: TextDefinition,
        align: TextAlign,
    },
}

impl DrawCommand {
    /// Creates a rectangle with square corners.
    pub fn rectangle(
        bounds: Bounds,
        fill: Option<Color>,
        stroke: Option<StrokeDefinition>,
    ) -> Self {
        Self::Rectangle {
            bounds,
            fill,
            stroke,
            radius: 0.0,
        }
    }

    pub fn line(start: Point, end: Point, stroke: StrokeDefinition) -> Self {
        Self::Line { start, end, stroke }
    }

    pub fn circle(
        center: Point,
        radius: f32,
        fill: Option<Color>,
        stroke: Option<StrokeDefinition>,
    ) -> Self {
        Self::Circle {
            center,
            radius,
            fill,
            stroke,
        }
    }

    pub fn text(
        anchor: Point,
        content: impl Into<String>,
        font: TextDefinition,
        align: TextAlign,
    ) -> Self {
        Self::Text {
            anchor,
            content: content.into(),
            font,
            align,
        }
    }

    /// Sets the corner radius of a rectangle. Other commands are unchanged.
    pub fn with_radius(mut self, value: f32) -> Self {
        if let Self::Rectangle { radius, .. } = &mut self {
            *radius = value;
        }
        self
    }

    /// Returns the primitive's name as used in diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Rectangle { .. } => "rectangle",
            Self::Line { .. } => "line",
            Self::Circle { .. } => "circle",
            Self::Text { .. } => "text",
        }
    }

    /// Returns the geometric extent of the command, ignoring stroke width.
    ///
    /// Text is approximated by its anchor point; callers that need the full
    /// text extent measure it with [`Text`](crate::draw::Text).
    pub fn bounds(&self) -> Bounds {
        match self {
            Self::Rectangle { bounds, .. } => *bounds,
            Self::Line { start, end, .. } => Bounds::from_corners(*start, *end),
            Self::Circle { center, radius, .. } => Bounds::from_corners(
                center.offset(-radius, -radius),
                center.offset(*radius, *radius),
            ),
            Self::Text { anchor, .. } => Bounds::from_corners(*anchor, *anchor),
        }
    }
}
