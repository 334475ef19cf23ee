//! Pipeline – ties together planning, rendering and export into a single
//! call.
//!
//! Slides go through one at a time: slide i is rendered, encoded and handed
//! off before slide i+1 is rendered, so only one pixel buffer is alive.

use log::{info, warn};

use crate::config::{CarouselSettings, GenerationConfig};
use crate::corpus::ContentCorpus;
use crate::error::Result;
use crate::export::{
    ArtifactSink, ExportFormat, ExportOutcome, Exporter, GenerationCounter, ImageEncoder,
    SlideEncoder,
};
use crate::fonts::FontManager;
use crate::pagination::plan;
use crate::render::{RenderOptions, Renderer};
use crate::slide_plan::SlidePlan;

/// Everything one generation needs. Built once, never mutated; a settings
/// change means building a new request.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub corpus: ContentCorpus,
    pub config: GenerationConfig,
    pub render: RenderOptions,
    pub format: ExportFormat,
}

impl GenerationRequest {
    pub fn new(corpus: ContentCorpus, config: GenerationConfig) -> Self {
        Self {
            corpus,
            config,
            render: RenderOptions::default(),
            format: ExportFormat::Png,
        }
    }

    pub fn from_settings(corpus: ContentCorpus, settings: &CarouselSettings) -> Result<Self> {
        Ok(Self {
            corpus,
            config: settings.generation_config()?,
            render: settings.render_options(),
            format: settings.format,
        })
    }

    /// Validate and plan without rendering.
    pub fn plan(&self) -> Result<SlidePlan> {
        self.config.style.validate()?;
        plan(&self.corpus, &self.config)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationReport {
    pub generation: u64,
    /// Slides in the plan.
    pub planned: usize,
    /// Artifacts handed to the sink.
    pub exported: usize,
    /// A newer generation started before this one finished.
    pub superseded: bool,
}

/// Runs generations against one set of fonts. Starting a generation makes
/// any generation still in flight on the same generator stale.
pub struct Generator {
    fonts: FontManager,
    generations: GenerationCounter,
}

impl Generator {
    pub fn new(fonts: FontManager) -> Self {
        Self {
            fonts,
            generations: GenerationCounter::new(),
        }
    }

    pub fn fonts(&self) -> &FontManager {
        &self.fonts
    }

    /// Shared handle; cloning it lets another thread supersede a run.
    pub fn generations(&self) -> &GenerationCounter {
        &self.generations
    }

    /// Plan, render and export with the request's image format.
    pub fn generate<S: ArtifactSink>(
        &self,
        request: &GenerationRequest,
        sink: S,
    ) -> Result<GenerationReport> {
        self.generate_with(request, ImageEncoder::new(request.format), sink)
    }

    pub fn generate_with<E: SlideEncoder, S: ArtifactSink>(
        &self,
        request: &GenerationRequest,
        encoder: E,
        sink: S,
    ) -> Result<GenerationReport> {
        // 1. Validate + plan (fails before anything is rendered)
        let plan = request.plan()?;
        let total = plan.len();

        let token = self.generations.begin();
        let generation = token.id();
        info!(
            "Generation {generation}: {total} slide(s) for {:?}",
            request.corpus.title
        );

        // 2. Render + export, one slide at a time
        let mut renderer = Renderer::new(&self.fonts, request.render.clone());
        let mut exporter = Exporter::new(encoder, sink).with_generation(token.clone());
        let mut superseded = false;

        for (i, spec) in plan.slides.iter().enumerate() {
            if !token.is_current() {
                superseded = true;
                break;
            }
            let slide = renderer.render(spec, i + 1, total)?;
            if exporter.export_slide(&slide)? == ExportOutcome::Discarded {
                superseded = true;
                break;
            }
        }

        if superseded {
            warn!(
                "Generation {generation} superseded after {} of {total} slide(s)",
                exporter.completed()
            );
        } else {
            info!("Generation {generation} complete: {total} artifact(s)");
        }

        Ok(GenerationReport {
            generation,
            planned: total,
            exported: exporter.completed(),
            superseded,
        })
    }
}

impl Default for Generator {
    fn default() -> Self {
        Self::new(FontManager::default())
    }
}
