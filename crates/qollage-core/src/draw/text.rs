//! Text configuration and measurement.
//!
//! # Overview
//!
//! - [`TextDefinition`] - Reusable font configuration (family, size, color)
//! - [`Text`] - Content paired with a [`TextDefinition`], able to measure itself
//!
//! Measurement uses `cosmic-text` with a process-wide font system that is
//! built on first use and shared by every later measurement.
//!
//! ```
//! # use qollage_core::draw::{Text, TextDefinition};
//! let mut font = TextDefinition::new();
//! font.set_font_family("DejaVu Sans");
//! font.set_font_size(14);
//!
//! let size = Text::new(&font, "Rx(π/2)").calculate_size();
//! assert!(size.width() > 0.0);
//! ```

use std::sync::{Mutex, OnceLock};

use cosmic_text::{Attrs, Buffer, Family, FontSystem, Metrics, Shaping};
use log::{info, warn};

use crate::{color::Color, geometry::Size};

/// Ratio between a glyph's advance and the font size used when no font
/// could be shaped.
const FALLBACK_ADVANCE: f32 = 0.6;

/// Line height as a multiple of the font size.
const LINE_HEIGHT: f32 = 1.2;

/// Font configuration for labels.
#[derive(Debug, Clone, PartialEq)]
pub struct TextDefinition {
    font_family: String,
    font_size: u16,
    color: Option<Color>,
}

impl TextDefinition {
    /// Creates a definition with a sans-serif 12pt font and no explicit color.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_font_size(&mut self, size: u16) {
        self.font_size = size;
    }

    pub fn set_font_family(&mut self, family: &str) {
        self.font_family = family.to_string();
    }

    /// Sets the text color. `None` lets the backend use its default.
    pub fn set_color(&mut self, color: Option<Color>) {
        self.color = color;
    }

    pub fn with_font_size(mut self, size: u16) -> Self {
        self.font_size = size;
        self
    }

    pub fn font_size(&self) -> u16 {
        self.font_size
    }

    pub fn font_family(&self) -> &str {
        &self.font_family
    }

    pub fn color(&self) -> Option<&Color> {
        self.color.as_ref()
    }
}

impl Default for TextDefinition {
    fn default() -> Self {
        Self {
            font_family: "sans-serif".to_string(),
            font_size: 12,
            color: None,
        }
    }
}

/// A piece of text paired with the font it is drawn with.
#[derive(Debug, Clone)]
pub struct Text<'a> {
    definition: &'a TextDefinition,
    content: &'a str,
}

impl<'a> Text<'a> {
    pub fn new(definition: &'a TextDefinition, content: &'a str) -> Self {
        Self {
            definition,
            content,
        }
    }

    pub fn content(&self) -> &str {
        self.content
    }

    /// Returns the size the text occupies on the canvas.
    ///
    /// Empty text has zero size. When the font system cannot shape the text
    /// (for example on hosts without any installed font) the width falls
    /// back to an estimate proportional to the character count.
    pub fn calculate_size(&self) -> Size {
        if self.content.is_empty() {
            return Size::default();
        }
        let measured = TEXT_MANAGER
            .get_or_init(TextManager::new)
            .calculate_text_size(self.content, self.definition);
        if measured.width() > 0.0 {
            measured
        } else {
            estimate_size(self.content, self.definition)
        }
    }
}

fn estimate_size(content: &str, definition: &TextDefinition) -> Size {
    let font_size = f32::from(definition.font_size());
    let longest = content
        .lines()
        .map(|line| line.chars().count())
        .max()
        .unwrap_or(0);
    let line_count = content.lines().count().max(1);
    Size::new(
        longest as f32 * font_size * FALLBACK_ADVANCE,
        line_count as f32 * font_size * LINE_HEIGHT,
    )
}

/// Owns the shared font system used for text measurement.
struct TextManager {
    font_system: Mutex<FontSystem>,
}

impl TextManager {
    fn new() -> Self {
        info!("Initializing FontSystem");
        Self {
            font_system: Mutex::new(FontSystem::new()),
        }
    }

    /// Shapes `text` and returns the extent of its layout runs.
    ///
    /// Returns a zero width when nothing could be shaped.
    fn calculate_text_size(&self, text: &str, text_def: &TextDefinition) -> Size {
        let Ok(mut font_system) = self.font_system.lock() else {
            warn!("FontSystem lock poisoned, estimating text size");
            return Size::default();
        };

        let font_size = f32::from(text_def.font_size());
        let metrics = Metrics::new(font_size, font_size * LINE_HEIGHT);

        let mut buffer = Buffer::new(&mut font_system, metrics);
        let mut buffer = buffer.borrow_with(&mut font_system);
        let attrs = Attrs::new().family(font_family(text_def.font_family()));

        buffer.set_size(None, None);
        buffer.set_text(text, &attrs, Shaping::Advanced, None);
        buffer.shape_until_scroll(true);

        let mut max_width: f32 = 0.0;
        let mut total_height: f32 = 0.0;
        for run in buffer.layout_runs() {
            if let Some(last) = run.glyphs.last() {
                max_width = max_width.max(last.x + last.w);
            }
            total_height += metrics.line_height;
        }

        Size::new(max_width, total_height.max(metrics.line_height))
    }
}

static TEXT_MANAGER: OnceLock<TextManager> = OnceLock::new();

/// Maps CSS generic family keywords to their cosmic-text counterparts.
fn font_family(name: &str) -> Family<'_> {
    match name {
        "sans-serif" => Family::SansSerif,
        "serif" => Family::Serif,
        "monospace" => Family::Monospace,
        "cursive" => Family::Cursive,
        "fantasy" => Family::Fantasy,
        _ => Family::Name(name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_definition_defaults() {
        let def = TextDefinition::default();
        assert_eq!(def.font_family(), "sans-serif");
        assert_eq!(def.font_size(), 12);
        assert!(def.color().is_none());
    }

    #[test]
    fn test_text_definition_setters() {
        let mut def = TextDefinition::new();
        def.set_font_family("Courier");
        def.set_font_size(20);
        def.set_color(Some(Color::new("blue").unwrap()));

        assert_eq!(def.font_family(), "Courier");
        assert_eq!(def.font_size(), 20);
        assert_eq!(def.color(), Some(&Color::new("blue").unwrap()));
        assert_eq!(def.with_font_size(8).font_size(), 8);
    }

    #[test]
    fn test_generic_font_families() {
        assert_eq!(font_family("sans-serif"), Family::SansSerif);
        assert_eq!(font_family("serif"), Family::Serif);
        assert_eq!(font_family("monospace"), Family::Monospace);
        assert_eq!(font_family("Fira Sans"), Family::Name("Fira Sans"));
    }

    #[test]
    fn test_calculate_size_empty() {
        let def = TextDefinition::new();
        let size = Text::new(&def, "").calculate_size();
        assert_eq!(size.width(), 0.0);
        assert_eq!(size.height(), 0.0);
    }

    #[test]
    fn test_calculate_size_non_empty() {
        let def = TextDefinition::new();
        let size = Text::new(&def, "H").calculate_size();
        assert!(size.width() > 0.0);
        assert!(size.height() > 0.0);
    }

    #[test]
    fn test_longer_text_is_wider() {
        let def = TextDefinition::new();
        let short = Text::new(&def, "X").calculate_size();
        let long = Text::new(&def, "PhaseShiftedControlledZ").calculate_size();
        assert!(long.width() > short.width());
    }

    #[test]
    fn test_estimate_size_scales_with_font_size() {
        let small = TextDefinition::new().with_font_size(10);
        let large = TextDefinition::new().with_font_size(20);
        let a = estimate_size("abc", &small);
        let b = estimate_size("abc", &large);
        assert_eq!(b.width(), a.width() * 2.0);
        assert_eq!(estimate_size("a\nbcd", &small).width(), 3.0 * 10.0 * FALLBACK_ADVANCE);
    }

    #[test]
    fn test_content_accessor() {
        let def = TextDefinition::new();
        assert_eq!(Text::new(&def, "Rz(θ)").content(), "Rz(θ)");
    }
}
