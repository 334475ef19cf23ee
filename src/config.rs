//! Configuration – the planner's [`GenerationConfig`] and the user-facing
//! [`CarouselSettings`] surface it is built from.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{CarouselError, Result};
use crate::export::ExportFormat;
use crate::render::RenderOptions;
use crate::style::{Color, FontFamily, RenderStyle};

/// Slide counts offered to users.
pub const SUPPORTED_SLIDE_COUNTS: [u32; 4] = [3, 5, 7, 10];

/// Default square canvas edge in pixels.
pub const DEFAULT_CANVAS_PX: u32 = 1080;

/// How the call-to-action prompt is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PromptChoice {
    /// Always the default prompt.
    #[default]
    Fixed,
    /// Pick from the prompt list using the given seed. Same seed, same prompt.
    Seeded(u64),
}

/// Planner input alongside the corpus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationConfig {
    pub target_slide_count: u32,
    pub include_hashtags: bool,
    pub include_author: bool,
    pub style: RenderStyle,
    #[serde(default)]
    pub prompt: PromptChoice,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            target_slide_count: 5,
            include_hashtags: true,
            include_author: true,
            style: RenderStyle::default(),
            prompt: PromptChoice::Fixed,
        }
    }
}

/// Canvas dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanvasSize {
    pub width: u32,
    pub height: u32,
}

impl CanvasSize {
    pub fn square(edge: u32) -> Self {
        Self {
            width: edge,
            height: edge,
        }
    }
}

impl Default for CanvasSize {
    fn default() -> Self {
        Self::square(DEFAULT_CANVAS_PX)
    }
}

// ---------------------------------------------------------------------------
// User-facing settings
// ---------------------------------------------------------------------------

/// Settings as collected from the user, typically loaded from JSON.
/// Every field is optional; missing fields take the defaults below.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CarouselSettings {
    pub primary_color: Color,
    pub secondary_color: Color,
    pub text_color: Color,
    pub font_family: FontFamily,
    pub font_size_pt: u32,
    pub slide_count: u32,
    pub include_hashtags: bool,
    pub include_author: bool,
    pub brand_name: String,
    pub canvas_size: u32,
    pub format: ExportFormat,
    pub strict_layout: bool,
    pub prompt_seed: Option<u64>,
}

impl Default for CarouselSettings {
    fn default() -> Self {
        let style = RenderStyle::default();
        Self {
            primary_color: style.primary_color,
            secondary_color: style.secondary_color,
            text_color: style.text_color,
            font_family: style.font_family,
            font_size_pt: style.font_size_pt,
            slide_count: 5,
            include_hashtags: true,
            include_author: true,
            brand_name: String::new(),
            canvas_size: DEFAULT_CANVAS_PX,
            format: ExportFormat::Png,
            strict_layout: false,
            prompt_seed: None,
        }
    }
}

impl CarouselSettings {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }

    pub fn style(&self) -> RenderStyle {
        RenderStyle {
            primary_color: self.primary_color,
            secondary_color: self.secondary_color,
            text_color: self.text_color,
            font_family: self.font_family,
            font_size_pt: self.font_size_pt,
        }
    }

    /// Reject anything the UI would not have offered.
    pub fn validate(&self) -> Result<()> {
        if !SUPPORTED_SLIDE_COUNTS.contains(&self.slide_count) {
            return Err(CarouselError::InvalidConfiguration(format!(
                "slide count {} is not one of {SUPPORTED_SLIDE_COUNTS:?}",
                self.slide_count
            )));
        }
        if self.canvas_size == 0 {
            return Err(CarouselError::InvalidConfiguration(
                "canvas size must be positive".to_string(),
            ));
        }
        self.style().validate()
    }

    pub fn generation_config(&self) -> Result<GenerationConfig> {
        self.validate()?;
        Ok(GenerationConfig {
            target_slide_count: self.slide_count,
            include_hashtags: self.include_hashtags,
            include_author: self.include_author,
            style: self.style(),
            prompt: self
                .prompt_seed
                .map(PromptChoice::Seeded)
                .unwrap_or_default(),
        })
    }

    pub fn render_options(&self) -> RenderOptions {
        RenderOptions {
            canvas: CanvasSize::square(self.canvas_size),
            brand_name: self.brand_name.trim().to_string(),
            strict_layout: self.strict_layout,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_json_yields_defaults() {
        let settings = CarouselSettings::from_json("{}").unwrap();
        assert_eq!(settings, CarouselSettings::default());
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn camel_case_fields_are_read() {
        let settings = CarouselSettings::from_json(
            r##"{
                "primaryColor": "#000000",
                "secondaryColor": "#ffffff",
                "fontFamily": "Roboto",
                "fontSizePt": 20,
                "slideCount": 7,
                "includeHashtags": false,
                "brandName": "Acme",
                "format": "jpeg",
                "promptSeed": 9
            }"##,
        )
        .unwrap();
        assert_eq!(settings.primary_color, Color::rgb(0, 0, 0));
        assert_eq!(settings.font_family, FontFamily::Roboto);
        assert_eq!(settings.format, ExportFormat::Jpeg);

        let config = settings.generation_config().unwrap();
        assert_eq!(config.target_slide_count, 7);
        assert!(!config.include_hashtags);
        assert_eq!(config.style.font_size_pt, 20);
        assert_eq!(config.prompt, PromptChoice::Seeded(9));

        assert_eq!(settings.render_options().brand_name, "Acme");
    }

    #[test]
    fn unsupported_slide_count_is_rejected() {
        let settings = CarouselSettings {
            slide_count: 4,
            ..CarouselSettings::default()
        };
        assert!(matches!(
            settings.generation_config(),
            Err(CarouselError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn out_of_range_font_size_is_rejected() {
        let settings = CarouselSettings {
            font_size_pt: 30,
            ..CarouselSettings::default()
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn bad_hex_color_fails_to_parse() {
        let err = CarouselSettings::from_json(r#"{"primaryColor":"blue"}"#);
        assert!(matches!(err, Err(CarouselError::Json(_))));
    }
}
