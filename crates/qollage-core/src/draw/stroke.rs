//! Stroke and line-style definitions.
//!
//! # Overview
//!
//! - [`StrokeDefinition`]: color, width and dash style of a line or outline
//! - [`StrokeStyle`]: solid or patterned line
//!
//! ```
//! use qollage_core::color::Color;
//! use qollage_core::draw::{StrokeDefinition, StrokeStyle};
//!
//! let wire = StrokeDefinition::solid(Color::new("black").unwrap(), 1.0);
//! let barrier = StrokeDefinition::dashed(Color::new("gray").unwrap(), 1.5);
//! assert_eq!(barrier.style(), &StrokeStyle::Dashed);
//! assert_eq!(wire.style().dash_array(), None);
//! ```

use std::str::FromStr;

use crate::color::Color;

/// Visual style of a stroke, including its dash pattern.
///
/// | Variant | Dash array |
/// |---------|------------|
/// | `Solid` | none |
/// | `Dashed` | `4, 3` |
/// | `Dotted` | `1, 2` |
/// | `Custom` | the given pattern |
#[derive(Debug, Default, Clone, PartialEq)]
pub enum StrokeStyle {
    #[default]
    Solid,
    Dashed,
    Dotted,
    /// Comma or space separated list of dash and gap lengths, e.g. `"6,2,1,2"`
    Custom(String),
}

impl FromStr for StrokeStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "solid" => Ok(Self::Solid),
            "dashed" => Ok(Self::Dashed),
            "dotted" => Ok(Self::Dotted),
            _ => {
                let style = Self::Custom(s.to_string());
                if style.dash_array().is_some_and(|dashes| !dashes.is_empty()) {
                    Ok(style)
                } else {
                    Err(format!("invalid stroke style `{s}`"))
                }
            }
        }
    }
}

impl StrokeStyle {
    /// Returns the dash and gap lengths, or `None` for solid lines.
    ///
    /// Custom patterns with unparsable entries yield `Some` of the entries
    /// that parsed.
    pub fn dash_array(&self) -> Option<Vec<f32>> {
        match self {
            Self::Solid => None,
            Self::Dashed => Some(vec![4.0, 3.0]),
            Self::Dotted => Some(vec![1.0, 2.0]),
            Self::Custom(pattern) => Some(
                pattern
                    .split([',', ' '])
                    .filter(|part| !part.is_empty())
                    .filter_map(|part| part.trim().parse::<f32>().ok())
                    .collect(),
            ),
        }
    }
}

/// Complete stroke definition for a line or an outline.
#[derive(Debug, Clone, PartialEq)]
pub struct StrokeDefinition {
    color: Color,
    width: f32,
    style: StrokeStyle,
}

impl StrokeDefinition {
    /// Creates a solid stroke.
    pub fn new(color: Color, width: f32) -> Self {
        Self {
            color,
            width,
            style: StrokeStyle::Solid,
        }
    }

    pub fn solid(color: Color, width: f32) -> Self {
        Self::new(color, width)
    }

    pub fn dashed(color: Color, width: f32) -> Self {
        Self::new(color, width).with_style(StrokeStyle::Dashed)
    }

    pub fn color(&self) -> &Color {
        &self.color
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn style(&self) -> &StrokeStyle {
        &self.style
    }

    pub fn with_width(mut self, width: f32) -> Self {
        self.width = width;
        self
    }

    pub fn with_style(mut self, style: StrokeStyle) -> Self {
        self.style = style;
        self
    }
}

impl Default for StrokeDefinition {
    fn default() -> Self {
        Self::new(Color::default(), 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stroke_style_from_str() {
        assert_eq!("solid".parse::<StrokeStyle>(), Ok(StrokeStyle::Solid));
        assert_eq!("dashed".parse::<StrokeStyle>(), Ok(StrokeStyle::Dashed));
        assert_eq!(
            "6,2".parse::<StrokeStyle>(),
            Ok(StrokeStyle::Custom("6,2".to_string()))
        );
        assert!("wavy".parse::<StrokeStyle>().is_err());
    }

    #[test]
    fn test_dash_array() {
        assert_eq!(StrokeStyle::Solid.dash_array(), None);
        assert_eq!(StrokeStyle::Dashed.dash_array(), Some(vec![4.0, 3.0]));
        assert_eq!(
            StrokeStyle::Custom("6, 2 1".to_string()).dash_array(),
            Some(vec![6.0, 2.0, 1.0])
        );
    }

    #[test]
    fn test_constructors() {
        let red = Color::new("red").unwrap();
        let stroke = StrokeDefinition::dashed(red, 2.0);
        assert_eq!(stroke.style(), &StrokeStyle::Dashed);
        assert_eq!(stroke.width(), 2.0);
        assert_eq!(stroke.color(), &red);

        let solid = stroke.with_style(StrokeStyle::Solid).with_width(0.5);
        assert_eq!(solid, StrokeDefinition::solid(red, 0.5));
    }
}
