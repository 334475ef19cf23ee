//! Error types shared by every pipeline stage.

use thiserror::Error;

use crate::layout::OverflowAxis;

#[derive(Error, Debug)]
pub enum CarouselError {
    /// Rejected before any planning or rendering starts.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// A word is wider than the line, or a line runs into the footer. Only
    /// raised when strict layout is requested; otherwise the text is drawn
    /// past its budget.
    #[error("Layout overflow: {text:?} reaches {extent:.1}px of {axis}, limit is {limit:.1}px")]
    LayoutOverflow {
        axis: OverflowAxis,
        text: String,
        extent: f32,
        limit: f32,
    },

    #[error("Drawing surface unavailable for slide {index}: {reason}")]
    RenderUnavailable { index: usize, reason: String },

    #[error("Export failed after {completed} artifact(s): {reason}")]
    ExportFailed {
        completed: usize,
        reason: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Failed to load font: {0}")]
    Font(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CarouselError {
    /// Number of artifacts that were handed off before the failure, if this
    /// is an export error.
    pub fn completed_exports(&self) -> Option<usize> {
        match self {
            CarouselError::ExportFailed { completed, .. } => Some(*completed),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, CarouselError>;
