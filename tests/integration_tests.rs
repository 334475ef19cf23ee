//! Integration tests for the carousel pipeline.
//!
//! These tests validate:
//! - Plans honour the bookend and clamp rules end to end
//! - Artifacts land on disk with contiguous names and canvas dimensions
//! - Rendering is deterministic for fixed font metrics
//! - Failures and superseded generations stop the run cleanly

use std::fs;

use carousel_forge::config::{CanvasSize, CarouselSettings, GenerationConfig};
use carousel_forge::export::{
    Artifact, ArtifactSink, BoxError, DirectorySink, Exporter, GenerationCounter, ImageEncoder,
    MemorySink,
};
use carousel_forge::fonts::FontManager;
use carousel_forge::pagination::{group_points, plan};
use carousel_forge::render::{RenderOptions, Renderer};
use carousel_forge::slide_plan::SlideKind;
use carousel_forge::{CarouselError, ContentCorpus, GenerationRequest, Generator};
use sha2::{Digest, Sha256};
use tempfile::TempDir;

// =====================================================================
// Helpers
// =====================================================================

fn sample_corpus(points: usize) -> ContentCorpus {
    ContentCorpus::new("Shipping Rust in Production", "Grace Hopper")
        .with_key_points((1..=points).map(|i| {
            format!("Lesson {i}: keep the hot path allocation free and measure before tuning")
        }))
        .with_hashtags(["rust", "performance", "#engineering"])
}

fn request(points: usize, slides: u32) -> GenerationRequest {
    let mut request = GenerationRequest::new(
        sample_corpus(points),
        GenerationConfig {
            target_slide_count: slides,
            ..GenerationConfig::default()
        },
    );
    request.render.canvas = CanvasSize::square(240);
    request
}

fn digest(bytes: &[u8]) -> Vec<u8> {
    Sha256::digest(bytes).to_vec()
}

/// Starts a new generation on the shared counter once `after` artifacts have
/// been saved, as if the user pressed "generate" again mid-export.
struct InterruptingSink {
    counter: GenerationCounter,
    after: usize,
    saved: Vec<Artifact>,
}

impl ArtifactSink for InterruptingSink {
    fn save(&mut self, artifact: &Artifact) -> Result<(), BoxError> {
        self.saved.push(artifact.clone());
        if self.saved.len() == self.after {
            self.counter.begin();
        }
        Ok(())
    }
}

// =====================================================================
// Planning
// =====================================================================

#[test]
fn plan_bookends_for_all_supported_counts() {
    for count in [3, 5, 7, 10] {
        let req = request(20, count);
        let plan = req.plan().unwrap();
        assert_eq!(plan.slides[0].kind, SlideKind::Cover);
        assert_eq!(plan.slides[plan.len() - 1].kind, SlideKind::Cta);

        let groups = group_points(&req.corpus.key_points, count as usize - 2).len();
        assert_eq!(plan.len(), groups + 2);
    }
}

#[test]
fn few_points_shorten_the_plan() {
    let plan = request(2, 7).plan().unwrap();
    assert_eq!(plan.len(), 4);
    assert!(plan.content_slides().all(|s| s.items.len() == 1));
}

#[test]
fn settings_json_drive_the_request() {
    let json = r##"{
        "slideCount": 3,
        "includeHashtags": false,
        "primaryColor": "#112233",
        "brandName": "Acme"
    }"##;
    let settings = CarouselSettings::from_json(json).unwrap();
    let request = GenerationRequest::from_settings(sample_corpus(4), &settings).unwrap();
    let plan = request.plan().unwrap();

    assert_eq!(plan.len(), 3);
    assert_eq!(plan.slides[1].items.len(), 4);
    assert_eq!(plan.slides[0].style.primary_color.to_hex(), "#112233");
    assert_eq!(request.render.brand_name, "Acme");
    assert!(!plan.slides[2].body.contains('#'));
}

#[test]
fn unsupported_settings_fail_fast() {
    let settings = CarouselSettings {
        slide_count: 2,
        ..CarouselSettings::default()
    };
    let err = GenerationRequest::from_settings(sample_corpus(4), &settings).unwrap_err();
    assert!(matches!(err, CarouselError::InvalidConfiguration(_)));
}

// =====================================================================
// End to end
// =====================================================================

#[test]
fn writes_contiguous_png_files() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let out = dir.path().join("slides");
    let generator = Generator::default();
    let report = generator
        .generate(&request(5, 5), DirectorySink::new(&out))
        .unwrap();

    assert_eq!(report.exported, 5);
    for i in 1..=5 {
        let path = out.join(format!("carousel-slide-{i}.png"));
        let bytes = fs::read(&path).expect("slide file should exist");
        let img = image::load_from_memory(&bytes).unwrap();
        assert_eq!((img.width(), img.height()), (240, 240));
    }
    assert_eq!(fs::read_dir(&out).unwrap().count(), 5);
}

#[test]
fn clamped_plan_writes_fewer_files() {
    let mut sink = MemorySink::default();
    let report = Generator::default()
        .generate(&request(2, 7), &mut sink)
        .unwrap();
    assert_eq!(report.planned, 4);
    assert_eq!(sink.artifacts.len(), 4);
    assert_eq!(sink.artifacts[3].filename, "carousel-slide-4.png");
}

#[test]
fn identical_requests_produce_identical_bytes() {
    let run = || {
        let mut sink = MemorySink::default();
        Generator::default()
            .generate(&request(6, 5), &mut sink)
            .unwrap();
        sink.artifacts
            .iter()
            .map(|a| digest(&a.bytes))
            .collect::<Vec<_>>()
    };
    assert_eq!(run(), run());
}

#[test]
fn export_all_on_prerendered_deck() {
    let fonts = FontManager::default();
    let plan = plan(&sample_corpus(3), &GenerationConfig::default()).unwrap();
    let mut renderer = Renderer::new(
        &fonts,
        RenderOptions {
            canvas: CanvasSize::square(120),
            ..RenderOptions::default()
        },
    );
    let slides: Vec<_> = plan
        .slides
        .iter()
        .enumerate()
        .map(|(i, spec)| renderer.render(spec, i + 1, plan.len()).unwrap())
        .collect();
    assert!(slides.iter().all(|s| s.width == 120 && s.height == 120));

    let mut exporter = Exporter::new(ImageEncoder::default(), MemorySink::default());
    assert_eq!(exporter.export_all(slides).unwrap(), plan.len());
}

// =====================================================================
// Failures
// =====================================================================

#[test]
fn superseded_generation_stops_exporting() {
    let generator = Generator::default();
    let sink = InterruptingSink {
        counter: generator.generations().clone(),
        after: 2,
        saved: Vec::new(),
    };
    let report = generator.generate(&request(5, 5), sink).unwrap();

    assert!(report.superseded);
    assert_eq!(report.exported, 2);
    assert_eq!(report.planned, 5);
}

#[test]
fn strict_overflow_keeps_earlier_artifacts() {
    let corpus = ContentCorpus::new("Short", "Author")
        .with_key_points(["a".repeat(400)]);
    let config = GenerationConfig {
        target_slide_count: 3,
        ..GenerationConfig::default()
    };
    // full-size canvas so the cover itself fits
    let mut req = GenerationRequest::new(corpus, config);
    req.render.strict_layout = true;

    let mut sink = MemorySink::default();
    let err = Generator::default().generate(&req, &mut sink).unwrap_err();
    assert!(matches!(err, CarouselError::LayoutOverflow { .. }));
    // the cover went out before the content slide failed
    assert_eq!(sink.artifacts.len(), 1);
}

#[test]
fn unavailable_surface_exports_nothing() {
    let mut req = request(3, 5);
    req.render.canvas = CanvasSize::square(0);
    let mut sink = MemorySink::default();
    let err = Generator::default().generate(&req, &mut sink).unwrap_err();
    assert!(matches!(err, CarouselError::RenderUnavailable { index: 1, .. }));
    assert!(sink.artifacts.is_empty());
}
