//! Render emission and markup serialization.
//!
//! This module provides the [`Exporter`] trait that converts a laid-out
//! [`Diagram`] into a markup document. It is the last pure stage of the
//! pipeline:
//!
//! ```text
//! Circuit
//!     ↓ structure
//! CircuitStructure
//!     ↓ timeline
//! Allocation
//!     ↓ layout
//! Diagram
//!     ↓ export (this module)
//! Markup (Typst or SVG)
//! ```
//!
//! Both dialects share the same emitter ([`emit`]), which walks the diagram
//! and produces backend-neutral [`DrawCommand`]s in a deterministic order.
//! Serializing the same diagram twice yields byte-identical markup.
//!
//! # Available Backends
//!
//! - [`typst`] - A self-contained Typst document
//! - [`svg`] - A self-contained SVG document
//!
//! [`DrawCommand`]: qollage_core::draw::DrawCommand

mod emit;
pub mod svg;
pub mod typst;

pub use emit::emit;

use std::fmt;

use qollage_core::{color::Color, draw::TextDefinition};

use crate::{
    config::{Dialect, StyleConfig},
    layout::Diagram,
    structure::OperationClass,
};

/// Abstraction for markup backends.
pub trait Exporter {
    /// Serializes a laid-out diagram into a complete markup document.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Render`] if a primitive cannot be expressed in the
    /// target dialect, or [`Error::Format`] if writing the document fails.
    fn export_diagram(&mut self, diagram: &Diagram) -> Result<String, Error>;
}

/// Returns the exporter for `dialect`.
pub fn exporter_for(dialect: Dialect, theme: Theme) -> Box<dyn Exporter> {
    match dialect {
        Dialect::Typst => Box::new(typst::Typst::new(theme)),
        Dialect::Svg => Box::new(svg::Svg::new(theme)),
    }
}

/// Errors that can occur during export.
///
/// Converted into [`QollageError::Export`] at the crate boundary.
///
/// [`QollageError::Export`]: crate::QollageError::Export
#[derive(Debug)]
pub enum Error {
    /// A primitive could not be expressed, described by `message`.
    Render(String),
    /// Writing into the output buffer failed.
    Format(fmt::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Render(msg) => write!(f, "Render error: {msg}"),
            Self::Format(err) => write!(f, "Format error: {err}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Render(_) => None,
            Self::Format(err) => Some(err),
        }
    }
}

impl From<fmt::Error> for Error {
    fn from(err: fmt::Error) -> Self {
        Self::Format(err)
    }
}

/// Resolved colors and font used by the emitter.
#[derive(Debug, Clone, PartialEq)]
pub struct Theme {
    background: Option<Color>,
    wire: Color,
    gate_fill: Color,
    gate_stroke: Color,
    pragma_fill: Color,
    bosonic_fill: Color,
    font: TextDefinition,
}

impl Theme {
    /// Parses every color of the style section.
    ///
    /// # Errors
    ///
    /// Returns the message of the first color that fails to parse.
    pub fn from_style(style: &StyleConfig) -> Result<Self, String> {
        let mut font = style.text_definition();
        let wire = style.wire_color()?;
        font.set_color(Some(wire));
        Ok(Self {
            background: style.background_color()?,
            wire,
            gate_fill: style.gate_fill()?,
            gate_stroke: style.gate_stroke()?,
            pragma_fill: style.pragma_fill()?,
            bosonic_fill: style.bosonic_fill()?,
            font,
        })
    }

    pub fn background(&self) -> Option<Color> {
        self.background
    }

    pub fn wire(&self) -> Color {
        self.wire
    }

    pub fn gate_fill(&self) -> Color {
        self.gate_fill
    }

    pub fn gate_stroke(&self) -> Color {
        self.gate_stroke
    }

    pub fn font(&self) -> &TextDefinition {
        &self.font
    }

    /// Fill color of a gate box of the given class.
    pub fn fill_for(&self, class: OperationClass) -> Color {
        match class {
            OperationClass::Pragma | OperationClass::Placeholder => self.pragma_fill,
            OperationClass::Bosonic => self.bosonic_fill,
            _ => self.gate_fill,
        }
    }
}

/// Formats a coordinate with at most two decimals.
///
/// Shared by both dialects so equal diagrams always produce equal text.
pub(crate) fn format_coordinate(value: f32) -> String {
    let fixed = format!("{value:.2}");
    let trimmed = fixed.trim_end_matches('0').trim_end_matches('.');
    if trimmed == "-0" {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}
