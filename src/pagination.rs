//! Pagination – distributes a corpus across a fixed slide budget.
//!
//! Handles:
//! - Cover and call-to-action bookends
//! - Even grouping of key points across content slides
//! - Clamping the plan when there are fewer groups than content slots

use log::{debug, info};

use crate::config::{GenerationConfig, PromptChoice};
use crate::corpus::ContentCorpus;
use crate::error::{CarouselError, Result};
use crate::slide_plan::{SlideKind, SlidePlan, SlideSpec};

/// Smallest plan that still fits a cover, one content slide and a CTA.
pub const MIN_SLIDE_COUNT: u32 = 3;

/// Prompt used on the call-to-action slide unless a seeded choice is made.
pub const DEFAULT_CTA_PROMPT: &str = "Found this helpful?";

/// CTA body when hashtags are disabled or absent.
pub const CTA_FALLBACK_BODY: &str = "Follow for more insights like this!";

/// Prompts a seeded choice picks from. The first entry is the default.
pub const CTA_PROMPTS: [&str; 5] = [
    DEFAULT_CTA_PROMPT,
    "Which point resonated most?",
    "Save this for later!",
    "Share this with someone who needs it",
    "Want more like this?",
];

/// Build the slide plan for `corpus`.
///
/// Content slides never come out empty: blank key points are dropped, and
/// when the rest form fewer groups than there are content slots, the plan is
/// shortened instead.
pub fn plan(corpus: &ContentCorpus, config: &GenerationConfig) -> Result<SlidePlan> {
    if config.target_slide_count < MIN_SLIDE_COUNT {
        return Err(CarouselError::InvalidConfiguration(format!(
            "at least {MIN_SLIDE_COUNT} slides are required, got {}",
            config.target_slide_count
        )));
    }
    let points: Vec<String> = corpus
        .key_points
        .iter()
        .filter(|p| !p.trim().is_empty())
        .cloned()
        .collect();
    if points.is_empty() {
        return Err(CarouselError::InvalidConfiguration(
            "corpus has no key points".to_string(),
        ));
    }
    if points.len() < corpus.key_points.len() {
        debug!(
            "Skipping {} blank key point(s)",
            corpus.key_points.len() - points.len()
        );
    }

    let content_slots = (config.target_slide_count - 2) as usize;
    let groups = group_points(&points, content_slots);
    if groups.len() < content_slots {
        info!(
            "Only {} key point group(s) for {} content slot(s); shortening plan to {} slides",
            groups.len(),
            content_slots,
            groups.len() + 2
        );
    }

    let mut slides = Vec::with_capacity(groups.len() + 2);
    slides.push(cover_slide(corpus, config));

    let mut first_point = 1;
    for group in groups {
        let last_point = first_point + group.len() - 1;
        let title = if group.len() == 1 {
            format!("Key Point {first_point}")
        } else {
            format!("Key Points {first_point}–{last_point}")
        };
        debug!("{title}: {} item(s)", group.len());
        slides.push(SlideSpec {
            id: String::new(),
            kind: SlideKind::Content,
            title,
            body: group.join("\n"),
            items: group.to_vec(),
            style: config.style.clone(),
        });
        first_point = last_point + 1;
    }

    slides.push(cta_slide(corpus, config));

    for (i, slide) in slides.iter_mut().enumerate() {
        slide.id = format!("slide-{}", i + 1);
    }

    Ok(SlidePlan { slides })
}

/// Split `points` into consecutive groups of `ceil(n / slots)`.
/// Produces at most `slots` groups, none of them empty.
pub fn group_points(points: &[String], slots: usize) -> Vec<&[String]> {
    if points.is_empty() || slots == 0 {
        return Vec::new();
    }
    let per_slide = points.len().div_ceil(slots);
    points.chunks(per_slide).collect()
}

/// Resolve the call-to-action prompt.
pub fn cta_prompt(choice: PromptChoice) -> &'static str {
    match choice {
        PromptChoice::Fixed => DEFAULT_CTA_PROMPT,
        PromptChoice::Seeded(seed) => {
            let idx = (mix_seed(seed) % CTA_PROMPTS.len() as u64) as usize;
            CTA_PROMPTS[idx]
        }
    }
}

/// splitmix64 finalizer, enough to spread consecutive seeds.
fn mix_seed(seed: u64) -> u64 {
    let mut z = seed.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

fn cover_slide(corpus: &ContentCorpus, config: &GenerationConfig) -> SlideSpec {
    let author = corpus.author.trim();
    let body = if config.include_author && !author.is_empty() {
        format!("By {author}")
    } else {
        String::new()
    };
    SlideSpec {
        id: String::new(),
        kind: SlideKind::Cover,
        title: corpus.title.clone(),
        body,
        items: Vec::new(),
        style: config.style.clone(),
    }
}

fn cta_slide(corpus: &ContentCorpus, config: &GenerationConfig) -> SlideSpec {
    let tags: Vec<String> = corpus
        .hashtags
        .iter()
        .map(|t| t.trim())
        .filter(|t| !t.is_empty() && *t != "#")
        .map(|t| {
            if t.starts_with('#') {
                t.to_string()
            } else {
                format!("#{t}")
            }
        })
        .collect();

    let body = if config.include_hashtags && !tags.is_empty() {
        tags.join(" ")
    } else {
        CTA_FALLBACK_BODY.to_string()
    };

    SlideSpec {
        id: String::new(),
        kind: SlideKind::Cta,
        title: cta_prompt(config.prompt).to_string(),
        body,
        items: Vec::new(),
        style: config.style.clone(),
    }
}
