//! Qollage - quantum circuit diagrams rendered through Typst.
//!
//! A [`Circuit`](circuit::Circuit) is classified into drawable operations,
//! packed into columns, positioned on a canvas, and serialized as Typst (or
//! SVG) markup. Typst markup can then be rasterized into PNG, SVG or PDF by
//! the external Typst CLI.

pub mod config;
pub mod export;
pub mod layout;
pub mod output;
pub mod rasterize;
pub mod structure;
pub mod timeline;

mod error;

pub use qollage_core::{circuit, color, draw, geometry};

pub use error::QollageError;
pub use output::{InlineViewer, RenderedImage, Rendering};

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use log::{debug, info, trace, warn};

use circuit::Circuit;
use config::{AppConfig, Dialect, ImageFormat};
use export::Theme;
use layout::{Diagram, EngineBuilder};
use rasterize::{Rasterizer, TypstCli};
use structure::CircuitStructure;
use timeline::Allocation;

/// Per-call options of [`DiagramBuilder::draw`].
#[derive(Debug, Clone)]
pub struct DrawOptions {
    render_as_image: bool,
    output_path: Option<PathBuf>,
    display_inline: bool,
}

impl Default for DrawOptions {
    fn default() -> Self {
        Self {
            render_as_image: true,
            output_path: None,
            display_inline: false,
        }
    }
}

impl DrawOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rasterize through the engine, or stop at the markup when `false`.
    pub fn with_render_as_image(mut self, render_as_image: bool) -> Self {
        self.render_as_image = render_as_image;
        self
    }

    /// Write the image (or the markup when not rasterizing) to `path`.
    ///
    /// A directory receives `circuit.<ext>` and a path without an extension
    /// gets the artifact's extension appended.
    pub fn with_output_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_path = Some(path.into());
        self
    }

    pub fn with_display_inline(mut self, display_inline: bool) -> Self {
        self.display_inline = display_inline;
        self
    }

    pub fn render_as_image(&self) -> bool {
        self.render_as_image
    }

    pub fn output_path(&self) -> Option<&Path> {
        self.output_path.as_deref()
    }

    pub fn display_inline(&self) -> bool {
        self.display_inline
    }
}

/// Builder for classifying, laying out and rendering circuits.
///
/// Each stage is available on its own; [`DiagramBuilder::draw`] runs all of
/// them.
///
/// # Examples
///
/// ```rust,no_run
/// use qollage::{DiagramBuilder, DrawOptions, circuit::{Circuit, Operation}, config::AppConfig};
///
/// let mut circuit = Circuit::new(2);
/// circuit.add_operation(Operation::gate("Hadamard", [0]));
/// circuit.add_operation(Operation::cnot(0, 1));
///
/// let builder = DiagramBuilder::new(AppConfig::default());
/// let rendering = builder
///     .draw(&circuit, &DrawOptions::new().with_render_as_image(false))
///     .expect("Failed to draw");
/// println!("{}", rendering.markup());
/// ```
#[derive(Default)]
pub struct DiagramBuilder {
    config: AppConfig,
    viewer: Option<Arc<dyn InlineViewer>>,
    rasterizer: Option<Arc<dyn Rasterizer>>,
}

impl DiagramBuilder {
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            viewer: None,
            rasterizer: None,
        }
    }

    /// Registers the viewer used when inline display is requested.
    pub fn with_viewer(mut self, viewer: Arc<dyn InlineViewer>) -> Self {
        self.viewer = Some(viewer);
        self
    }

    /// Replaces the Typst CLI rasterizer.
    pub fn with_rasterizer(mut self, rasterizer: Arc<dyn Rasterizer>) -> Self {
        self.rasterizer = Some(rasterizer);
        self
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Classifies every operation of `circuit`.
    ///
    /// # Errors
    ///
    /// Returns [`QollageError::UnsupportedOperation`] or
    /// [`QollageError::InvalidRegisterReference`].
    pub fn classify(&self, circuit: &Circuit) -> Result<CircuitStructure, QollageError> {
        info!(operations = circuit.len(), qubits = circuit.number_of_qubits(); "Classifying circuit");
        let structure = CircuitStructure::from_circuit(circuit, self.config.render())?;
        debug!(
            lines = structure.lines().len(),
            elements = structure.elements().len();
            "Circuit classified"
        );
        Ok(structure)
    }

    /// Allocates columns and positions every element of `structure`.
    pub fn layout(&self, structure: &CircuitStructure) -> Result<Diagram, QollageError> {
        let layout = self.config.layout();
        layout.validate().map_err(QollageError::Layout)?;

        let allocation = Allocation::allocate(structure);
        info!(columns = allocation.column_count(); "Timeline allocated");

        let engine = EngineBuilder::new()
            .with_line_spacing(layout.line_spacing())
            .with_min_column_width(layout.min_column_width())
            .with_column_gap(layout.column_gap())
            .with_gate_height(layout.gate_height())
            .with_gate_padding(layout.gate_padding())
            .with_margin(layout.margin())
            .with_label_gap(layout.label_gap())
            .with_trailing_wire(layout.trailing_wire())
            .with_font(self.config.style().text_definition());
        let diagram = engine.build(structure, &allocation)?;
        trace!(diagram:?; "Positioned diagram");
        Ok(diagram)
    }

    /// Serializes `diagram` in the configured markup dialect.
    pub fn render_markup(&self, diagram: &Diagram) -> Result<String, QollageError> {
        let dialect = self.config.render().dialect();
        let theme = Theme::from_style(self.config.style()).map_err(QollageError::Config)?;
        let markup = export::exporter_for(dialect, theme).export_diagram(diagram)?;
        info!(dialect:%, bytes = markup.len(); "Markup rendered");
        Ok(markup)
    }

    /// Runs the whole pipeline and delivers the result as `options` request.
    ///
    /// # Errors
    ///
    /// Any stage error is returned unchanged. When writing the output file
    /// fails, no file is left at the target path.
    pub fn draw(&self, circuit: &Circuit, options: &DrawOptions) -> Result<Rendering, QollageError> {
        let structure = self.classify(circuit)?;
        let diagram = self.layout(&structure)?;
        let markup = self.render_markup(&diagram)?;

        let render = self.config.render();
        let mut rendering = Rendering::new(markup, render.dialect(), diagram);

        if options.render_as_image() {
            let image = self.rasterize(rendering.markup(), render.dialect(), render.format())?;
            rendering.set_image(image);
        }

        if let Some(path) = options.output_path() {
            let path = output::resolve_output_path(path, rendering.extension());
            output::write_atomically(&path, rendering.artifact())?;
            rendering.set_written_to(&path);
        }

        if options.display_inline() {
            match &self.viewer {
                Some(viewer) => {
                    debug!("Displaying rendering inline");
                    viewer.display(&rendering)?;
                }
                None => warn!("Inline display requested but no viewer is registered"),
            }
        }

        Ok(rendering)
    }

    fn rasterize(
        &self,
        markup: &str,
        dialect: Dialect,
        format: ImageFormat,
    ) -> Result<RenderedImage, QollageError> {
        match dialect {
            Dialect::Typst => {
                let data = match &self.rasterizer {
                    Some(rasterizer) => rasterizer.rasterize(markup, format)?,
                    None => TypstCli::from_config(self.config.render()).rasterize(markup, format)?,
                };
                Ok(RenderedImage::new(format, data))
            }
            Dialect::Svg if format == ImageFormat::Svg => {
                debug!("SVG dialect already is the requested image");
                Ok(RenderedImage::new(format, markup.as_bytes().to_vec()))
            }
            Dialect::Svg => Err(QollageError::Config(format!(
                "the svg dialect cannot be rasterized to {format}; use the typst dialect"
            ))),
        }
    }
}

/// Draws `circuit` with the default configuration.
///
/// Shorthand for `DiagramBuilder::default().draw(circuit, options)`.
pub fn draw_circuit(circuit: &Circuit, options: &DrawOptions) -> Result<Rendering, QollageError> {
    DiagramBuilder::default().draw(circuit, options)
}
