//! Layout engine – greedy word wrapping and per-slide text placement.
//!
//! [`wrap`] is the core: a pure, single-pass word wrapper driven by an
//! injected width function. [`compose`] uses it to place every text run of a
//! slide on the canvas before anything is rasterized.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::CanvasSize;
use crate::fonts::{FontKey, FontManager};
use crate::slide_plan::{SlideKind, SlideSpec};

/// Horizontal margin on each side of every text block.
pub const SIDE_MARGIN_PX: f32 = 50.0;
/// Baseline of the first title line on content and CTA slides.
pub const CONTENT_TITLE_Y: f32 = 150.0;
/// Baseline of the first body line on content and CTA slides.
pub const CONTENT_BODY_Y: f32 = 250.0;
/// Extra space between the cover title block and its subtitle.
pub const COVER_SUBTITLE_GAP: f32 = 40.0;
/// Distance of the page label and brand from the bottom and side edges.
pub const FOOTER_INSET_PX: f32 = 50.0;

// ---------------------------------------------------------------------------
// Greedy wrapping
// ---------------------------------------------------------------------------

/// Word-wrap `text` so that each line measures at most `max_width`.
///
/// Text that already fits comes back unchanged as a single line. Otherwise
/// words are whitespace-separated and never split: a word that is wider than
/// `max_width` on its own is emitted alone on its line and overflows (see
/// [`find_overflows`]). Empty text, and whitespace that does not fit, yield
/// one empty line.
pub fn wrap<F>(text: &str, max_width: f32, measure: F) -> Vec<String>
where
    F: Fn(&str) -> f32,
{
    if text.is_empty() || measure(text) <= max_width {
        return vec![text.to_string()];
    }

    let mut words = text.split_whitespace();
    let Some(first) = words.next() else {
        return vec![String::new()];
    };

    let mut lines = Vec::new();
    let mut current = first.to_string();
    // One iteration per word, however the measure behaves.
    for word in words {
        let candidate = format!("{current} {word}");
        if measure(&candidate) <= max_width {
            current = candidate;
        } else {
            lines.push(std::mem::replace(&mut current, word.to_string()));
        }
    }
    lines.push(current);
    lines
}

/// Wrap each `\n`-separated paragraph on its own and concatenate the lines.
pub fn wrap_paragraphs<F>(text: &str, max_width: f32, measure: F) -> Vec<String>
where
    F: Fn(&str) -> f32,
{
    text.split('\n')
        .flat_map(|p| wrap(p, max_width, &measure))
        .collect()
}

/// Which budget a line exceeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverflowAxis {
    /// Wider than the line. Greedy wrapping only produces these for single
    /// words.
    Width,
    /// Baseline below the last line that clears the footer.
    Height,
}

impl fmt::Display for OverflowAxis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OverflowAxis::Width => f.write_str("width"),
            OverflowAxis::Height => f.write_str("height"),
        }
    }
}

/// A line that does not fit. `extent` is the line width for
/// [`OverflowAxis::Width`] and the baseline for [`OverflowAxis::Height`];
/// `limit` is the matching budget.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutOverflow {
    pub axis: OverflowAxis,
    pub text: String,
    pub extent: f32,
    pub limit: f32,
}

pub fn find_overflows<F>(lines: &[String], max_width: f32, measure: F) -> Vec<LayoutOverflow>
where
    F: Fn(&str) -> f32,
{
    lines
        .iter()
        .filter_map(|line| {
            let width = measure(line);
            (width > max_width).then(|| LayoutOverflow {
                axis: OverflowAxis::Width,
                text: line.clone(),
                extent: width,
                limit: max_width,
            })
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Slide composition
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TextRole {
    Title,
    Body,
    PageLabel,
    Brand,
}

/// One line of text positioned on the canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacedText {
    pub text: String,
    /// Left edge of the line.
    pub x: f32,
    /// Alphabetic baseline.
    pub baseline: f32,
    pub width: f32,
    pub font_size: f32,
    pub bold: bool,
    pub role: TextRole,
}

/// Every text run of a slide, ready to rasterize.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlideLayout {
    pub width: u32,
    pub height: u32,
    pub runs: Vec<PlacedText>,
    pub overflows: Vec<LayoutOverflow>,
}

impl SlideLayout {
    pub fn runs_with_role(&self, role: TextRole) -> impl Iterator<Item = &PlacedText> {
        self.runs.iter().filter(move |r| r.role == role)
    }
}

struct Composer<'a> {
    fonts: &'a FontManager,
    spec: &'a SlideSpec,
    canvas_w: f32,
    canvas_h: f32,
    max_width: f32,
    runs: Vec<PlacedText>,
    overflows: Vec<LayoutOverflow>,
}

impl<'a> Composer<'a> {
    fn key(&self, bold: bool) -> FontKey {
        FontKey {
            family: self.spec.style.font_family,
            bold,
        }
    }

    /// Center every line, starting at `first_baseline`. Lines whose baseline
    /// leaves less than one `pitch` above the footer are placed anyway and
    /// the first of them is recorded as a height overflow.
    /// Returns the baseline of the last line placed.
    fn centered_block(
        &mut self,
        lines: Vec<String>,
        first_baseline: f32,
        pitch: f32,
        font_size: f32,
        bold: bool,
        role: TextRole,
    ) -> f32 {
        let fonts = self.fonts;
        let measure = fonts.measurer(font_size, self.key(bold));
        self.overflows
            .extend(find_overflows(&lines, self.max_width, &measure));

        let floor = self.canvas_h - FOOTER_INSET_PX - pitch;
        let mut clipped = false;
        let mut baseline = first_baseline;
        for (i, line) in lines.into_iter().enumerate() {
            baseline = first_baseline + i as f32 * pitch;
            if baseline > floor && !clipped {
                clipped = true;
                self.overflows.push(LayoutOverflow {
                    axis: OverflowAxis::Height,
                    text: line.clone(),
                    extent: baseline,
                    limit: floor,
                });
            }
            let width = measure(&line);
            self.runs.push(PlacedText {
                x: (self.canvas_w - width) / 2.0,
                baseline,
                width,
                text: line,
                font_size,
                bold,
                role,
            });
        }
        baseline
    }

    fn wrapped(&self, text: &str, font_size: f32, bold: bool) -> Vec<String> {
        wrap_paragraphs(text, self.max_width, self.fonts.measurer(font_size, self.key(bold)))
    }
}

/// Place the title, body, page label and optional brand of one slide.
///
/// - cover: title at `font + 20` (pitch `font + 30`) centered vertically,
///   subtitle below it after [`COVER_SUBTITLE_GAP`]
/// - content / cta: title from [`CONTENT_TITLE_Y`] at `font + 10`, body from
///   [`CONTENT_BODY_Y`] with pitch `font + 20`
pub fn compose(
    spec: &SlideSpec,
    canvas: CanvasSize,
    slide_index: usize,
    total: usize,
    brand_name: &str,
    fonts: &FontManager,
) -> SlideLayout {
    let base = spec.style.font_size();
    let canvas_w = canvas.width as f32;
    let canvas_h = canvas.height as f32;

    let mut c = Composer {
        fonts,
        spec,
        canvas_w,
        canvas_h,
        max_width: canvas_w - 2.0 * SIDE_MARGIN_PX,
        runs: Vec::new(),
        overflows: Vec::new(),
    };

    match spec.kind {
        SlideKind::Cover => {
            let title_size = base + 20.0;
            let pitch = base + 30.0;
            let lines = c.wrapped(&spec.title, title_size, true);
            let first = canvas_h / 2.0 - (lines.len() as f32 - 1.0) * pitch / 2.0;
            let last = c.centered_block(lines, first, pitch, title_size, true, TextRole::Title);

            if !spec.body.trim().is_empty() {
                let lines = c.wrapped(&spec.body, base, false);
                c.centered_block(
                    lines,
                    last + pitch + COVER_SUBTITLE_GAP,
                    base + 20.0,
                    base,
                    false,
                    TextRole::Body,
                );
            }
        }
        SlideKind::Content | SlideKind::Cta => {
            let title_size = base + 10.0;
            let pitch = base + 20.0;
            let lines = c.wrapped(&spec.title, title_size, true);
            let last = c.centered_block(
                lines,
                CONTENT_TITLE_Y,
                pitch,
                title_size,
                true,
                TextRole::Title,
            );

            // Long titles push the body down instead of overlapping it.
            let body_start = CONTENT_BODY_Y.max(last + pitch);
            let lines = c.wrapped(&spec.body, base, false);
            c.centered_block(lines, body_start, pitch, base, false, TextRole::Body);
        }
    }

    let label_size = base - 4.0;
    let label_key = c.key(false);
    let label = format!("{slide_index}/{total}");
    let label_width = fonts.measure_text_width(&label, label_size, label_key);
    c.runs.push(PlacedText {
        x: canvas_w - FOOTER_INSET_PX - label_width,
        baseline: canvas_h - FOOTER_INSET_PX,
        width: label_width,
        text: label,
        font_size: label_size,
        bold: false,
        role: TextRole::PageLabel,
    });

    if !brand_name.is_empty() {
        let width = fonts.measure_text_width(brand_name, label_size, label_key);
        c.runs.push(PlacedText {
            x: FOOTER_INSET_PX,
            baseline: canvas_h - FOOTER_INSET_PX,
            width,
            text: brand_name.to_string(),
            font_size: label_size,
            bold: false,
            role: TextRole::Brand,
        });
    }

    SlideLayout {
        width: canvas.width,
        height: canvas.height,
        runs: c.runs,
        overflows: c.overflows,
    }
}
