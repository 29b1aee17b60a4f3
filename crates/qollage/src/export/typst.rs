//! Typst markup dialect.
//!
//! Produces a self-contained Typst document: a `#set page(...)` rule sized
//! to the canvas, followed by one absolutely placed primitive per draw
//! command. All values are written in points.

use std::fmt::Write;

use log::debug;

use qollage_core::{
    color::Color,
    draw::{DrawCommand, StrokeDefinition, TextAlign, TextDefinition},
};

use super::{Error, Exporter, Theme, emit, format_coordinate};
use crate::layout::Diagram;

/// Width of the box text is aligned in. Wide enough for any label.
const TEXT_BOX_WIDTH: f32 = 600.0;

/// Typst exporter.
#[derive(Debug, Clone)]
pub struct Typst {
    theme: Theme,
}

impl Typst {
    pub fn new(theme: Theme) -> Self {
        Self { theme }
    }

    fn write_command(&self, out: &mut String, command: &DrawCommand) -> Result<(), Error> {
        match command {
            DrawCommand::Rectangle {
                bounds,
                fill,
                stroke,
                radius,
            } => writeln!(
                out,
                "#place(top + left, dx: {}, dy: {}, rect(width: {}, height: {}, fill: {}, stroke: {}, radius: {}))",
                pt(bounds.min_x()),
                pt(bounds.min_y()),
                pt(bounds.width()),
                pt(bounds.height()),
                paint(fill.as_ref()),
                stroke_spec(stroke.as_ref()),
                pt(*radius),
            )?,
            DrawCommand::Line { start, end, stroke } => writeln!(
                out,
                "#place(top + left, line(start: ({}, {}), end: ({}, {}), stroke: {}))",
                pt(start.x()),
                pt(start.y()),
                pt(end.x()),
                pt(end.y()),
                stroke_spec(Some(stroke)),
            )?,
            DrawCommand::Circle {
                center,
                radius,
                fill,
                stroke,
            } => writeln!(
                out,
                "#place(top + left, dx: {}, dy: {}, circle(radius: {}, fill: {}, stroke: {}))",
                pt(center.x() - radius),
                pt(center.y() - radius),
                pt(*radius),
                paint(fill.as_ref()),
                stroke_spec(stroke.as_ref()),
            )?,
            DrawCommand::Text {
                anchor,
                content,
                font,
                align,
            } => {
                let height = f32::from(font.font_size()) * 2.0;
                let (dx, alignment) = match align {
                    TextAlign::Start => (anchor.x(), "left"),
                    TextAlign::Middle => (anchor.x() - TEXT_BOX_WIDTH / 2.0, "center"),
                    TextAlign::End => (anchor.x() - TEXT_BOX_WIDTH, "right"),
                };
                writeln!(
                    out,
                    "#place(top + left, dx: {}, dy: {}, box(width: {}, height: {}, align({alignment} + horizon, {})))",
                    pt(dx),
                    pt(anchor.y() - height / 2.0),
                    pt(TEXT_BOX_WIDTH),
                    pt(height),
                    text_call(font, content, &self.theme),
                )?
            }
        }
        Ok(())
    }
}

impl Exporter for Typst {
    fn export_diagram(&mut self, diagram: &Diagram) -> Result<String, Error> {
        let bounds = diagram.bounds();
        let font = self.theme.font();
        let mut out = String::new();

        writeln!(out, "// Circuit diagram generated by qollage")?;
        writeln!(
            out,
            "#set page(width: {}, height: {}, margin: 0pt, fill: none)",
            pt(bounds.width()),
            pt(bounds.height()),
        )?;
        writeln!(
            out,
            "#set text(font: {}, size: {}pt)",
            string_literal(font.font_family()),
            font.font_size(),
        )?;

        let commands = emit(diagram, &self.theme).render();
        for command in &commands {
            self.write_command(&mut out, command)?;
        }

        debug!(commands = commands.len(), bytes = out.len(); "Typst document written");
        Ok(out)
    }
}

fn pt(value: f32) -> String {
    format!("{}pt", format_coordinate(value))
}

fn color_value(color: &Color) -> String {
    format!("rgb(\"{}\")", color.to_hex())
}

fn paint(color: Option<&Color>) -> String {
    color.map_or_else(|| "none".to_string(), color_value)
}

fn stroke_spec(stroke: Option<&StrokeDefinition>) -> String {
    let Some(stroke) = stroke else {
        return "none".to_string();
    };
    let dash = stroke
        .style()
        .dash_array()
        .map(|dashes| {
            let lengths: Vec<String> = dashes.iter().map(|length| pt(*length)).collect();
            // A one-element array needs a trailing comma in Typst.
            format!(", dash: ({},)", lengths.join(", "))
        })
        .unwrap_or_default();
    format!(
        "(paint: {}, thickness: {}{dash})",
        color_value(stroke.color()),
        pt(stroke.width()),
    )
}

fn text_call(font: &TextDefinition, content: &str, theme: &Theme) -> String {
    let fill = font.color().copied().unwrap_or_else(|| theme.wire());
    let font_argument = if font.font_family() == theme.font().font_family() {
        String::new()
    } else {
        format!("font: {}, ", string_literal(font.font_family()))
    };
    format!(
        "text({font_argument}size: {}pt, fill: {}, {})",
        font.font_size(),
        color_value(&fill),
        string_literal(content),
    )
}

/// Quotes `value` as a Typst string literal.
fn string_literal(value: &str) -> String {
    let mut literal = String::with_capacity(value.len() + 2);
    literal.push('"');
    for ch in value.chars() {
        match ch {
            '"' => literal.push_str("\\\""),
            '\\' => literal.push_str("\\\\"),
            '\n' => literal.push_str("\\n"),
            '\r' => literal.push_str("\\r"),
            '\t' => literal.push_str("\\t"),
            other => literal.push(other),
        }
    }
    literal.push('"');
    literal
}
