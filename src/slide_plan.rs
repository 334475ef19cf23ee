//! Slide plan – the intermediate representation between pagination and
//! rendering. This is the "frozen" structure that encodes exactly what goes on
//! each slide.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::style::RenderStyle;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlideKind {
    Cover,
    Content,
    Cta,
}

/// Everything the renderer needs for one slide.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlideSpec {
    pub id: String,
    pub kind: SlideKind,
    pub title: String,
    /// Subtitle for the cover, newline-joined items for content slides,
    /// hashtags or fallback text for the call to action.
    pub body: String,
    /// Key points grouped onto this slide (content slides only).
    #[serde(default)]
    pub items: Vec<String>,
    pub style: RenderStyle,
}

/// An ordered sequence of slides: cover first, call to action last.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlidePlan {
    pub slides: Vec<SlideSpec>,
}

impl SlidePlan {
    pub fn len(&self) -> usize {
        self.slides.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slides.is_empty()
    }

    pub fn content_slides(&self) -> impl Iterator<Item = &SlideSpec> {
        self.slides.iter().filter(|s| s.kind == SlideKind::Content)
    }

    /// Serialise to JSON.
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }

    /// Deserialise from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
