//! # carousel-forge – content → carousel slide images
//!
//! This crate compiles a pre-structured corpus (title, author, key points,
//! hashtags) into a deck of square slide images. The pipeline stages are:
//!
//! 1. **Plan** – distribute key points over a slide budget ([`pagination`])
//! 2. **Layout** – greedy word wrapping and text placement ([`layout`])
//! 3. **Render** – gradient background and glyphs via tiny-skia ([`render`])
//! 4. **Export** – encode and hand each slide to a sink ([`export`])
//!
//! [`pipeline::Generator`] runs all four for a [`pipeline::GenerationRequest`].

pub mod config;
pub mod corpus;
pub mod error;
pub mod export;
pub mod fonts;
pub mod layout;
pub mod pagination;
pub mod pipeline;
pub mod render;
pub mod slide_plan;
pub mod style;

// Re-exports for convenience
pub use config::{CarouselSettings, GenerationConfig};
pub use corpus::ContentCorpus;
pub use error::{CarouselError, Result};
pub use pipeline::{GenerationReport, GenerationRequest, Generator};
