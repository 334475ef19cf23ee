//! Exporter – encodes rendered slides one at a time and hands each artifact
//! to an [`ArtifactSink`] before touching the next.
//!
//! The first encode or handoff failure stops the run; the error carries how
//! many artifacts were already delivered. Nothing is retried and nothing
//! already delivered is rolled back.

use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use base64::{engine::general_purpose::STANDARD as BASE64_STD, Engine as _};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::error::{CarouselError, Result};
use crate::render::RenderedSlide;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Encoded image format of the artifacts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Png,
    #[serde(alias = "jpg")]
    Jpeg,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Png => "png",
            ExportFormat::Jpeg => "jpg",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            ExportFormat::Png => "image/png",
            ExportFormat::Jpeg => "image/jpeg",
        }
    }
}

/// `carousel-slide-{index}.{ext}`
pub fn artifact_filename(index: usize, format: ExportFormat) -> String {
    format!("carousel-slide-{index}.{}", format.extension())
}

/// One encoded slide.
#[derive(Debug, Clone, PartialEq)]
pub struct Artifact {
    pub index: usize,
    pub filename: String,
    pub mime_type: &'static str,
    pub bytes: Vec<u8>,
}

// ---------------------------------------------------------------------------
// Encoding
// ---------------------------------------------------------------------------

pub trait SlideEncoder {
    fn format(&self) -> ExportFormat;
    fn encode(&self, slide: &RenderedSlide) -> std::result::Result<Vec<u8>, BoxError>;
}

/// Encodes with the `image` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageEncoder {
    format: ExportFormat,
}

impl ImageEncoder {
    pub fn new(format: ExportFormat) -> Self {
        Self { format }
    }
}

impl SlideEncoder for ImageEncoder {
    fn format(&self) -> ExportFormat {
        self.format
    }

    fn encode(&self, slide: &RenderedSlide) -> std::result::Result<Vec<u8>, BoxError> {
        let expected = slide.width as usize * slide.height as usize * 4;
        if slide.pixels.len() != expected {
            return Err(format!(
                "pixel buffer holds {} bytes, {}x{} RGBA needs {expected}",
                slide.pixels.len(),
                slide.width,
                slide.height
            )
            .into());
        }

        let mut output = Cursor::new(Vec::new());
        match self.format {
            ExportFormat::Png => image::write_buffer_with_format(
                &mut output,
                &slide.pixels,
                slide.width,
                slide.height,
                image::ExtendedColorType::Rgba8,
                image::ImageFormat::Png,
            )?,
            ExportFormat::Jpeg => {
                // JPEG has no alpha channel.
                let rgb: Vec<u8> = slide
                    .pixels
                    .chunks_exact(4)
                    .flat_map(|p| [p[0], p[1], p[2]])
                    .collect();
                image::write_buffer_with_format(
                    &mut output,
                    &rgb,
                    slide.width,
                    slide.height,
                    image::ExtendedColorType::Rgb8,
                    image::ImageFormat::Jpeg,
                )?
            }
        }
        Ok(output.into_inner())
    }
}

// ---------------------------------------------------------------------------
// Sinks
// ---------------------------------------------------------------------------

/// The save/download side channel artifacts are delivered to.
pub trait ArtifactSink {
    fn save(&mut self, artifact: &Artifact) -> std::result::Result<(), BoxError>;
}

impl<S: ArtifactSink + ?Sized> ArtifactSink for &mut S {
    fn save(&mut self, artifact: &Artifact) -> std::result::Result<(), BoxError> {
        (**self).save(artifact)
    }
}

/// Writes each artifact into a directory, creating it on first use.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
    written: Vec<PathBuf>,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            written: Vec::new(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }
}

impl ArtifactSink for DirectorySink {
    fn save(&mut self, artifact: &Artifact) -> std::result::Result<(), BoxError> {
        if !self.dir.exists() {
            fs::create_dir_all(&self.dir)?;
        }
        let path = self.dir.join(&artifact.filename);
        fs::write(&path, &artifact.bytes)?;
        debug!("Wrote {} ({} bytes)", path.display(), artifact.bytes.len());
        self.written.push(path);
        Ok(())
    }
}

/// Keeps every artifact in memory.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    pub artifacts: Vec<Artifact>,
}

impl ArtifactSink for MemorySink {
    fn save(&mut self, artifact: &Artifact) -> std::result::Result<(), BoxError> {
        self.artifacts.push(artifact.clone());
        Ok(())
    }
}

/// Collects `(filename, data URI)` pairs, the form a browser download link
/// takes.
#[derive(Debug, Clone, Default)]
pub struct DataUriSink {
    pub uris: Vec<(String, String)>,
}

impl ArtifactSink for DataUriSink {
    fn save(&mut self, artifact: &Artifact) -> std::result::Result<(), BoxError> {
        let uri = format!(
            "data:{};base64,{}",
            artifact.mime_type,
            BASE64_STD.encode(&artifact.bytes)
        );
        self.uris.push((artifact.filename.clone(), uri));
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Generation guard
// ---------------------------------------------------------------------------

/// Hands out increasing generation ids. Starting a generation makes every
/// earlier token stale.
#[derive(Debug, Clone, Default)]
pub struct GenerationCounter {
    latest: Arc<AtomicU64>,
}

impl GenerationCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&self) -> GenerationToken {
        let id = self.latest.fetch_add(1, Ordering::SeqCst) + 1;
        GenerationToken {
            id,
            latest: Arc::clone(&self.latest),
        }
    }

    pub fn current(&self) -> u64 {
        self.latest.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone)]
pub struct GenerationToken {
    id: u64,
    latest: Arc<AtomicU64>,
}

impl GenerationToken {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn is_current(&self) -> bool {
        self.latest.load(Ordering::SeqCst) == self.id
    }
}

// ---------------------------------------------------------------------------
// Exporter
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportOutcome {
    Saved { filename: String },
    /// A newer generation started; the slide was dropped unexported.
    Discarded,
}

pub struct Exporter<E, S> {
    encoder: E,
    sink: S,
    generation: Option<GenerationToken>,
    completed: usize,
}

impl<E: SlideEncoder, S: ArtifactSink> Exporter<E, S> {
    pub fn new(encoder: E, sink: S) -> Self {
        Self {
            encoder,
            sink,
            generation: None,
            completed: 0,
        }
    }

    /// Discard slides once `token` is no longer the latest generation.
    pub fn with_generation(mut self, token: GenerationToken) -> Self {
        self.generation = Some(token);
        self
    }

    /// Artifacts delivered so far.
    pub fn completed(&self) -> usize {
        self.completed
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    fn is_stale(&self) -> bool {
        self.generation.as_ref().is_some_and(|t| !t.is_current())
    }

    fn failure(&self, reason: String, source: Option<BoxError>) -> CarouselError {
        CarouselError::ExportFailed {
            completed: self.completed,
            reason,
            source,
        }
    }

    /// Encode `slide` and hand it to the sink. Slides must arrive with
    /// indices `1, 2, 3, …` in order.
    pub fn export_slide(&mut self, slide: &RenderedSlide) -> Result<ExportOutcome> {
        let expected = self.completed + 1;
        if slide.index != expected {
            return Err(self.failure(
                format!("slide {} arrived out of order, expected slide {expected}", slide.index),
                None,
            ));
        }
        if self.is_stale() {
            warn!("Discarding slide {}: a newer generation has started", slide.index);
            return Ok(ExportOutcome::Discarded);
        }

        let format = self.encoder.format();
        let bytes = self
            .encoder
            .encode(slide)
            .map_err(|e| self.failure(format!("encoding slide {} failed", slide.index), Some(e)))?;

        // Encoding takes time; re-check before anything leaves the process.
        if self.is_stale() {
            warn!("Discarding slide {}: a newer generation has started", slide.index);
            return Ok(ExportOutcome::Discarded);
        }

        let artifact = Artifact {
            index: slide.index,
            filename: artifact_filename(slide.index, format),
            mime_type: format.mime_type(),
            bytes,
        };
        if let Err(e) = self.sink.save(&artifact) {
            return Err(self.failure(format!("saving {} failed", artifact.filename), Some(e)));
        }

        self.completed += 1;
        info!(
            "Exported {} ({}/{}, {} bytes)",
            artifact.filename,
            slide.index,
            slide.total,
            artifact.bytes.len()
        );
        Ok(ExportOutcome::Saved {
            filename: artifact.filename,
        })
    }

    /// Export every slide in ascending index order and return the number of
    /// artifacts delivered by this exporter. Stops quietly at the first slide
    /// discarded by the generation guard.
    pub fn export_all(&mut self, mut slides: Vec<RenderedSlide>) -> Result<usize> {
        slides.sort_by_key(|s| s.index);
        for slide in &slides {
            if self.export_slide(slide)? == ExportOutcome::Discarded {
                break;
            }
        }
        Ok(self.completed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn slide(index: usize, total: usize) -> RenderedSlide {
        RenderedSlide {
            index,
            total,
            width: 4,
            height: 4,
            pixels: [10, 20, 30, 255].repeat(16),
        }
    }

    fn deck(n: usize) -> Vec<RenderedSlide> {
        (1..=n).map(|i| slide(i, n)).collect()
    }

    /// Fails on one slide index, counting every encode attempt.
    struct FailOn {
        index: usize,
        attempts: Cell<usize>,
    }

    impl SlideEncoder for FailOn {
        fn format(&self) -> ExportFormat {
            ExportFormat::Png
        }

        fn encode(&self, slide: &RenderedSlide) -> std::result::Result<Vec<u8>, BoxError> {
            self.attempts.set(self.attempts.get() + 1);
            if slide.index == self.index {
                return Err("injected encode failure".into());
            }
            ImageEncoder::default().encode(slide)
        }
    }

    struct BrokenSink;

    impl ArtifactSink for BrokenSink {
        fn save(&mut self, _: &Artifact) -> std::result::Result<(), BoxError> {
            Err("disk full".into())
        }
    }

    #[test]
    fn filenames_are_contiguous_and_unique() {
        let mut exporter = Exporter::new(ImageEncoder::default(), MemorySink::default());
        let count = exporter.export_all(deck(5)).unwrap();
        assert_eq!(count, 5);

        let names: Vec<String> = exporter
            .sink()
            .artifacts
            .iter()
            .map(|a| a.filename.clone())
            .collect();
        let expected: Vec<String> = (1..=5).map(|i| format!("carousel-slide-{i}.png")).collect();
        assert_eq!(names, expected);
        assert!(exporter.sink().artifacts.iter().all(|a| a.bytes.starts_with(b"\x89PNG")));
    }

    #[test]
    fn unsorted_input_is_exported_in_order() {
        let mut slides = deck(3);
        slides.reverse();
        let mut exporter = Exporter::new(ImageEncoder::default(), MemorySink::default());
        exporter.export_all(slides).unwrap();
        let indices: Vec<usize> = exporter.sink().artifacts.iter().map(|a| a.index).collect();
        assert_eq!(indices, vec![1, 2, 3]);
    }

    #[test]
    fn encode_failure_on_third_slide_stops_the_run() {
        let encoder = FailOn {
            index: 3,
            attempts: Cell::new(0),
        };
        let mut exporter = Exporter::new(encoder, MemorySink::default());
        let err = exporter.export_all(deck(5)).unwrap_err();

        assert_eq!(err.completed_exports(), Some(2));
        assert_eq!(exporter.sink().artifacts.len(), 2);
        // slides 4 and 5 were never attempted
        assert_eq!(exporter.encoder.attempts.get(), 3);
    }

    #[test]
    fn sink_failure_reports_zero_completed() {
        let mut exporter = Exporter::new(ImageEncoder::default(), BrokenSink);
        let err = exporter.export_all(deck(2)).unwrap_err();
        match err {
            CarouselError::ExportFailed {
                completed, source, ..
            } => {
                assert_eq!(completed, 0);
                assert_eq!(source.unwrap().to_string(), "disk full");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn duplicate_index_is_rejected() {
        let mut slides = deck(3);
        slides.push(slide(2, 3));
        let mut exporter = Exporter::new(ImageEncoder::default(), MemorySink::default());
        let err = exporter.export_all(slides).unwrap_err();
        assert_eq!(err.completed_exports(), Some(2));
    }

    #[test]
    fn stale_generation_is_discarded() {
        let counter = GenerationCounter::new();
        let first = counter.begin();
        let mut exporter =
            Exporter::new(ImageEncoder::default(), MemorySink::default()).with_generation(first);

        let slides = deck(3);
        assert!(matches!(
            exporter.export_slide(&slides[0]).unwrap(),
            ExportOutcome::Saved { .. }
        ));

        let second = counter.begin();
        assert!(second.is_current());
        assert_eq!(exporter.export_slide(&slides[1]).unwrap(), ExportOutcome::Discarded);
        assert_eq!(exporter.completed(), 1);
        assert_eq!(exporter.into_sink().artifacts.len(), 1);
    }

    #[test]
    fn jpeg_drops_alpha() {
        let mut exporter =
            Exporter::new(ImageEncoder::new(ExportFormat::Jpeg), MemorySink::default());
        exporter.export_all(deck(1)).unwrap();
        let artifact = &exporter.sink().artifacts[0];
        assert_eq!(artifact.filename, "carousel-slide-1.jpg");
        assert_eq!(artifact.mime_type, "image/jpeg");
        assert!(artifact.bytes.starts_with(&[0xFF, 0xD8]));
    }

    #[test]
    fn short_pixel_buffer_fails_to_encode() {
        let mut bad = slide(1, 1);
        bad.pixels.truncate(10);
        let mut exporter = Exporter::new(ImageEncoder::default(), MemorySink::default());
        assert!(matches!(
            exporter.export_slide(&bad),
            Err(CarouselError::ExportFailed { completed: 0, .. })
        ));
    }

    #[test]
    fn data_uri_sink() {
        let mut exporter = Exporter::new(ImageEncoder::default(), DataUriSink::default());
        exporter.export_all(deck(2)).unwrap();
        let uris = &exporter.sink().uris;
        assert_eq!(uris.len(), 2);
        assert_eq!(uris[1].0, "carousel-slide-2.png");
        assert!(uris[0].1.starts_with("data:image/png;base64,"));
    }
}
