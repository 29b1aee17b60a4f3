//! Configuration types for Qollage circuit rendering.
//!
//! All types implement [`serde::Deserialize`] and fall back to defaults for
//! every missing field, so a configuration file only needs to name the
//! settings it changes.
//!
//! # Overview
//!
//! - [`AppConfig`] - Top-level configuration combining the three sections below
//! - [`LayoutConfig`] - Spacing and sizes used by the layout engine
//! - [`StyleConfig`] - Colors and fonts
//! - [`RenderConfig`] - Classification switches, markup dialect and rasterizer settings
//!
//! # Example
//!
//! ```
//! # use qollage::config::{AppConfig, Dialect, InitializationMode};
//! let config: AppConfig = toml::from_str(
//!     r#"
//!     [layout]
//!     line_spacing = 50.0
//!
//!     [render]
//!     initialization = "qubit"
//!     pragmas = ["PragmaSleep"]
//!     dialect = "svg"
//!     "#,
//! )
//! .unwrap();
//!
//! assert_eq!(config.layout().line_spacing(), 50.0);
//! assert_eq!(config.render().initialization(), InitializationMode::Qubit);
//! assert_eq!(config.render().dialect(), Dialect::Svg);
//! assert!(config.style().wire_color().is_ok());
//! ```

use std::{fmt, time::Duration};

use serde::Deserialize;

use qollage_core::{color::Color, draw::TextDefinition};

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    layout: LayoutConfig,

    #[serde(default)]
    style: StyleConfig,

    #[serde(default)]
    render: RenderConfig,
}

impl AppConfig {
    pub fn new(layout: LayoutConfig, style: StyleConfig, render: RenderConfig) -> Self {
        Self {
            layout,
            style,
            render,
        }
    }

    pub fn layout(&self) -> &LayoutConfig {
        &self.layout
    }

    pub fn style(&self) -> &StyleConfig {
        &self.style
    }

    pub fn render(&self) -> &RenderConfig {
        &self.render
    }

    /// Returns a mutable reference to the render section.
    ///
    /// Used by front ends that override individual settings from the command line.
    pub fn render_mut(&mut self) -> &mut RenderConfig {
        &mut self.render
    }
}

// =============================================================================
// Layout
// =============================================================================

/// Spacing and sizes used by the layout engine, in points.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Vertical distance between two adjacent lines.
    line_spacing: f32,
    /// Lower bound for the glyph area of a column.
    min_column_width: f32,
    /// Horizontal space added to every column.
    column_gap: f32,
    /// Height of gate boxes.
    gate_height: f32,
    /// Horizontal padding between a gate label and its box.
    gate_padding: f32,
    /// Margin around the whole canvas.
    margin: f32,
    /// Space between the line labels and the start of the wires.
    label_gap: f32,
    /// Length of wire drawn after the last column.
    trailing_wire: f32,
}

impl Default for LayoutConfig {
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
        }
    }
}

impl LayoutConfig {
    pub fn line_spacing(&self) -> f32 {
        self.line_spacing
    }

    pub fn min_column_width(&self) -> f32 {
        self.min_column_width
    }

    pub fn column_gap(&self) -> f32 {
        self.column_gap
    }

    pub fn gate_height(&self) -> f32 {
        self.gate_height
    }

    pub fn gate_padding(&self) -> f32 {
        self.gate_padding
    }

    pub fn margin(&self) -> f32 {
        self.margin
    }

    pub fn label_gap(&self) -> f32 {
        self.label_gap
    }

    pub fn trailing_wire(&self) -> f32 {
        self.trailing_wire
    }

    /// Checks that every size is finite and non-negative, and that gates fit
    /// between two lines.
    pub fn validate(&self) -> Result<(), String> {
        let fields = [
            ("line_spacing", self.line_spacing),
            ("min_column_width", self.min_column_width),
            ("column_gap", self.column_gap),
            ("gate_height", self.gate_height),
            ("gate_padding", self.gate_padding),
            ("margin", self.margin),
            ("label_gap", self.label_gap),
            ("trailing_wire", self.trailing_wire),
        ];
        if let Some((name, value)) = fields
            .iter()
            .find(|(_, value)| !value.is_finite() || *value < 0.0)
        {
            return Err(format!("layout.{name} must be a non-negative number, got {value}"));
        }
        if self.line_spacing <= 0.0 {
            return Err("layout.line_spacing must be positive".to_string());
        }
        if self.gate_height > self.line_spacing {
            return Err(format!(
                "layout.gate_height ({}) must not exceed layout.line_spacing ({})",
                self.gate_height, self.line_spacing
            ));
        }
        Ok(())
    }
}

// =============================================================================
// Style
// =============================================================================

/// Colors and fonts, as CSS color strings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StyleConfig {
    /// Canvas background. `None` leaves the canvas transparent.
    background_color: Option<String>,
    wire_color: String,
    gate_fill: String,
    gate_stroke: String,
    pragma_fill: String,
    bosonic_fill: String,
    font_family: String,
    font_size: u16,
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            background_color: Some("white".to_string()),
            wire_color: "black".to_string(),
            gate_fill: "white".to_string(),
            gate_stroke: "black".to_string(),
            pragma_fill: "#e8e8e8".to_string(),
            bosonic_fill: "#dbe9f7".to_string(),
            font_family: "sans-serif".to_string(),
            font_size: 12,
        }
    }
}

impl StyleConfig {
    /// Returns the parsed background [`Color`], or `None` if no color is configured.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured color string cannot be parsed.
    pub fn background_color(&self) -> Result<Option<Color>, String> {
        self.background_color
            .as_ref()
            .map(|color| Color::new(color))
            .transpose()
            .map_err(|err| format!("Invalid background color in config: {err}"))
    }

    pub fn wire_color(&self) -> Result<Color, String> {
        parse_color("wire_color", &self.wire_color)
    }

    pub fn gate_fill(&self) -> Result<Color, String> {
        parse_color("gate_fill", &self.gate_fill)
    }

    pub fn gate_stroke(&self) -> Result<Color, String> {
        parse_color("gate_stroke", &self.gate_stroke)
    }

    pub fn pragma_fill(&self) -> Result<Color, String> {
        parse_color("pragma_fill", &self.pragma_fill)
    }

    pub fn bosonic_fill(&self) -> Result<Color, String> {
        parse_color("bosonic_fill", &self.bosonic_fill)
    }

    pub fn font_family(&self) -> &str {
        &self.font_family
    }

    pub fn font_size(&self) -> u16 {
        self.font_size
    }

    /// Builds the text definition used for every label.
    pub fn text_definition(&self) -> TextDefinition {
        let mut definition = TextDefinition::new();
        definition.set_font_family(&self.font_family);
        definition.set_font_size(self.font_size);
        definition
    }
}

fn parse_color(field: &str, value: &str) -> Result<Color, String> {
    Color::new(value).map_err(|err| format!("Invalid {field} in config: {err}"))
}

// =============================================================================
// Render
// =============================================================================

/// How qubit lines are labelled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InitializationMode {
    /// Every qubit starts labelled with its initial state `|0⟩`.
    #[default]
    State,
    /// Qubits are labelled `q[i]`.
    Qubit,
}

/// Which pragma operations are drawn.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(try_from = "PragmaFilterRepr")]
pub enum PragmaFilter {
    #[default]
    None,
    All,
    /// Only pragmas whose name is listed.
    Only(Vec<String>),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PragmaFilterRepr {
    Keyword(String),
    Names(Vec<String>),
}

impl TryFrom<PragmaFilterRepr> for PragmaFilter {
    type Error = String;

    fn try_from(repr: PragmaFilterRepr) -> Result<Self, Self::Error> {
        match repr {
            PragmaFilterRepr::Keyword(keyword) => match keyword.as_str() {
                "none" => Ok(Self::None),
                "all" => Ok(Self::All),
                other => Err(format!(
                    "invalid pragma filter `{other}`, expected \"none\", \"all\" or a list of names"
                )),
            },
            PragmaFilterRepr::Names(names) => Ok(Self::Only(names)),
        }
    }
}

impl PragmaFilter {
    /// Returns `true` if the pragma called `name` should be drawn.
    pub fn includes(&self, name: &str) -> bool {
        match self {
            Self::None => false,
            Self::All => true,
            Self::Only(names) => names.iter().any(|candidate| candidate == name),
        }
    }
}

/// Markup language produced by the render emitter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dialect {
    #[default]
    Typst,
    Svg,
}

impl Dialect {
    /// File extension of a markup document in this dialect.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Typst => "typ",
            Self::Svg => "svg",
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Typst => write!(f, "typst"),
            Self::Svg => write!(f, "svg"),
        }
    }
}

/// Image format produced by rasterization.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageFormat {
    #[default]
    Png,
    Svg,
    Pdf,
}

impl ImageFormat {
    pub fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Svg => "svg",
            Self::Pdf => "pdf",
        }
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Classification switches, markup dialect and rasterizer settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    initialization: InitializationMode,
    pragmas: PragmaFilter,
    /// Render unknown operations as labelled blocks instead of failing.
    best_effort: bool,
    dialect: Dialect,
    format: ImageFormat,
    /// Pixels per inch for PNG output.
    ppi: u32,
    timeout_secs: u64,
    /// Program and leading arguments used to invoke the Typst CLI.
    typst_command: Vec<String>,
    /// Decimal places for float parameters that are not fractions of π.
    float_precision: usize,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            initialization: InitializationMode::default(),
            pragmas: PragmaFilter::default(),
            best_effort: false,
            dialect: Dialect::default(),
            format: ImageFormat::default(),
            ppi: 144,
            timeout_secs: 30,
            typst_command: vec!["typst".to_string()],
            float_precision: 3,
        }
    }
}

impl RenderConfig {
    pub fn initialization(&self) -> InitializationMode {
        self.initialization
    }

    pub fn pragmas(&self) -> &PragmaFilter {
        &self.pragmas
    }

    pub fn best_effort(&self) -> bool {
        self.best_effort
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    pub fn format(&self) -> ImageFormat {
        self.format
    }

    pub fn ppi(&self) -> u32 {
        self.ppi
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn typst_command(&self) -> &[String] {
        &self.typst_command
    }

    pub fn float_precision(&self) -> usize {
        self.float_precision
    }

    pub fn set_initialization(&mut self, initialization: InitializationMode) {
        self.initialization = initialization;
    }

    pub fn set_pragmas(&mut self, pragmas: PragmaFilter) {
        self.pragmas = pragmas;
    }

    pub fn set_best_effort(&mut self, best_effort: bool) {
        self.best_effort = best_effort;
    }

    pub fn set_dialect(&mut self, dialect: Dialect) {
        self.dialect = dialect;
    }

    pub fn set_format(&mut self, format: ImageFormat) {
        self.format = format;
    }

    pub fn set_timeout(&mut self, timeout: Duration) {
        self.timeout_secs = timeout.as_secs();
    }

    pub fn set_typst_command(&mut self, command: Vec<String>) {
        self.typst_command = command;
    }

    pub fn set_float_precision(&mut self, precision: usize) {
        self.float_precision = precision;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.layout().line_spacing(), 40.0);
        assert!(config.layout().validate().is_ok());
        assert_eq!(config.render().dialect(), Dialect::Typst);
        assert_eq!(config.render().pragmas(), &PragmaFilter::None);
        assert_eq!(config.render().typst_command(), ["typst".to_string()]);
        assert_eq!(config.render().timeout(), Duration::from_secs(30));
        assert_eq!(config.style().font_size(), 12);
        assert!(config.style().background_color().unwrap().is_some());
    }

    #[test]
    fn test_empty_document_uses_defaults() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert_eq!(config.render().float_precision(), 3);
        assert_eq!(config.layout().margin(), 20.0);
    }

    #[test]
    fn test_pragma_filter_forms() {
        #[derive(Deserialize)]
        struct Wrapper {
            pragmas: PragmaFilter,
        }

        let all: Wrapper = toml::from_str(r#"pragmas = "all""#).unwrap();
        assert_eq!(all.pragmas, PragmaFilter::All);
        assert!(all.pragmas.includes("PragmaSleep"));

        let none: Wrapper = toml::from_str(r#"pragmas = "none""#).unwrap();
        assert!(!none.pragmas.includes("PragmaSleep"));

        let only: Wrapper = toml::from_str(r#"pragmas = ["PragmaSleep"]"#).unwrap();
        assert!(only.pragmas.includes("PragmaSleep"));
        assert!(!only.pragmas.includes("PragmaDamping"));

        assert!(toml::from_str::<Wrapper>(r#"pragmas = "some""#).is_err());
    }

    #[test]
    fn test_invalid_colors_are_reported() {
        let config: StyleConfig = toml::from_str(r#"wire_color = "not-a-color""#).unwrap();
        let err = config.wire_color().unwrap_err();
        assert!(err.contains("wire_color"), "{err}");

        let config: StyleConfig = toml::from_str(r#"background_color = "nope""#).unwrap();
        assert!(config.background_color().is_err());
    }

    #[test]
    fn test_layout_validation() {
        let config: LayoutConfig = toml::from_str("gate_height = 50.0").unwrap();
        assert!(config.validate().is_err());

        let config: LayoutConfig = toml::from_str("margin = -1.0").unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.contains("layout.margin"), "{err}");
    }

    #[test]
    fn test_render_setters() {
        let mut render = RenderConfig::default();
        render.set_dialect(Dialect::Svg);
        render.set_best_effort(true);
        render.set_timeout(Duration::from_secs(2));
        render.set_typst_command(vec!["sh".to_string(), "fake.sh".to_string()]);
        assert_eq!(render.dialect(), Dialect::Svg);
        assert!(render.best_effort());
        assert_eq!(render.timeout(), Duration::from_secs(2));
        assert_eq!(render.typst_command().len(), 2);
    }

    #[test]
    fn test_text_definition_from_style() {
        let style: StyleConfig =
            toml::from_str("font_family = \"DejaVu Sans\"\nfont_size = 14").unwrap();
        let definition = style.text_definition();
        assert_eq!(definition.font_family(), "DejaVu Sans");
        assert_eq!(definition.font_size(), 14);
    }
}
