//! Slide renderer – rasterizes a [`SlideSpec`] onto a reusable `tiny-skia`
//! surface and returns the straight-alpha RGBA pixels.
//!
//! Only one surface exists per [`Renderer`]. Each render leases it, clears
//! it, paints, copies the pixels out and clears it again when the lease is
//! dropped, so nothing from one slide can show up on the next.

use log::{debug, warn};
use tiny_skia::{
    FillRule, GradientStop, LinearGradient, Paint, Path, PathBuilder, Pixmap, Point, Rect,
    SpreadMode, Transform,
};

use crate::config::CanvasSize;
use crate::error::{CarouselError, Result};
use crate::fonts::{FontKey, FontManager};
use crate::layout::{compose, PlacedText};
use crate::slide_plan::SlideSpec;
use crate::style::{Color, RenderStyle};

/// Options that apply to every slide of a run.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RenderOptions {
    pub canvas: CanvasSize,
    /// Drawn bottom-left when non-empty.
    pub brand_name: String,
    /// Fail with [`CarouselError::LayoutOverflow`] instead of drawing text
    /// past the line width or into the footer.
    pub strict_layout: bool,
}

/// One rasterized slide.
#[derive(Clone)]
pub struct RenderedSlide {
    /// 1-based position in the deck.
    pub index: usize,
    pub total: usize,
    pub width: u32,
    pub height: u32,
    /// RGBA8, straight alpha, row-major.
    pub pixels: Vec<u8>,
}

impl RenderedSlide {
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y as usize * self.width as usize + x as usize) * 4;
        self.pixels.get(i..i + 4).map(|p| [p[0], p[1], p[2], p[3]])
    }
}

impl std::fmt::Debug for RenderedSlide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderedSlide")
            .field("index", &self.index)
            .field("total", &self.total)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.pixels.len())
            .finish()
    }
}

/// Exclusive use of the renderer's surface for one slide.
struct SurfaceLease<'a> {
    pixmap: &'a mut Pixmap,
}

impl SurfaceLease<'_> {
    fn pixmap(&mut self) -> &mut Pixmap {
        self.pixmap
    }
}

impl Drop for SurfaceLease<'_> {
    fn drop(&mut self) {
        self.pixmap.fill(tiny_skia::Color::TRANSPARENT);
    }
}

pub struct Renderer<'f> {
    fonts: &'f FontManager,
    options: RenderOptions,
    surface: Option<Pixmap>,
}

impl<'f> Renderer<'f> {
    pub fn new(fonts: &'f FontManager, options: RenderOptions) -> Self {
        Self {
            fonts,
            options,
            surface: None,
        }
    }

    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    /// Render `spec` as slide `slide_index` (1-based) of `total`.
    pub fn render(
        &mut self,
        spec: &SlideSpec,
        slide_index: usize,
        total: usize,
    ) -> Result<RenderedSlide> {
        let fonts = self.fonts;
        let layout = compose(
            spec,
            self.options.canvas,
            slide_index,
            total,
            &self.options.brand_name,
            fonts,
        );

        for overflow in &layout.overflows {
            warn!(
                "Slide {slide_index}: {:?} overflows its {} ({:.0}px, limit {:.0}px)",
                overflow.text, overflow.axis, overflow.extent, overflow.limit
            );
        }
        if self.options.strict_layout {
            if let Some(o) = layout.overflows.first() {
                return Err(CarouselError::LayoutOverflow {
                    axis: o.axis,
                    text: o.text.clone(),
                    extent: o.extent,
                    limit: o.limit,
                });
            }
        }

        let mut lease = self.acquire(slide_index)?;
        let pixmap = lease.pixmap();
        paint_background(pixmap, &spec.style);
        for run in &layout.runs {
            draw_text(pixmap, run, fonts, &spec.style);
        }
        let pixels = extract_rgba(pixmap);
        let (width, height) = (pixmap.width(), pixmap.height());
        drop(lease);

        debug!(
            "Rendered {} ({:?}) as {slide_index}/{total}: {} text run(s)",
            spec.id,
            spec.kind,
            layout.runs.len()
        );

        Ok(RenderedSlide {
            index: slide_index,
            total,
            width,
            height,
            pixels,
        })
    }

    fn acquire(&mut self, slide_index: usize) -> Result<SurfaceLease<'_>> {
        let CanvasSize { width, height } = self.options.canvas;
        let reusable = self
            .surface
            .as_ref()
            .is_some_and(|p| p.width() == width && p.height() == height);
        if !reusable {
            self.surface = Pixmap::new(width, height);
        }
        let Some(pixmap) = self.surface.as_mut() else {
            return Err(CarouselError::RenderUnavailable {
                index: slide_index,
                reason: format!("cannot allocate a {width}x{height} surface"),
            });
        };
        pixmap.fill(tiny_skia::Color::TRANSPARENT);
        Ok(SurfaceLease { pixmap })
    }
}

fn skia_color(c: Color) -> tiny_skia::Color {
    tiny_skia::Color::from_rgba(c.r, c.g, c.b, c.a).unwrap_or(tiny_skia::Color::BLACK)
}

/// Two-stop gradient from the primary color (top-left) to the secondary
/// color (bottom-right).
fn paint_background(pixmap: &mut Pixmap, style: &RenderStyle) {
    let w = pixmap.width() as f32;
    let h = pixmap.height() as f32;

    let shader = LinearGradient::new(
        Point::from_xy(0.0, 0.0),
        Point::from_xy(w, h),
        vec![
            GradientStop::new(0.0, skia_color(style.primary_color)),
            GradientStop::new(1.0, skia_color(style.secondary_color)),
        ],
        SpreadMode::Pad,
        Transform::identity(),
    );

    let (Some(shader), Some(rect)) = (shader, Rect::from_xywh(0.0, 0.0, w, h)) else {
        pixmap.fill(skia_color(style.primary_color));
        return;
    };
    let paint = Paint {
        shader,
        ..Paint::default()
    };
    pixmap.fill_rect(rect, &paint, Transform::identity(), None);
}

fn draw_text(pixmap: &mut Pixmap, run: &PlacedText, fonts: &FontManager, style: &RenderStyle) {
    if run.text.is_empty() {
        return;
    }
    let key = FontKey {
        family: style.font_family,
        bold: run.bold,
    };
    let data = fonts.get(key);
    let path = match data.face() {
        Some(face) => glyph_path(&face, data.units_per_em, run),
        None => placeholder_path(run, fonts, key),
    };
    let Some(path) = path else {
        return;
    };

    let mut paint = Paint::default();
    paint.set_color(skia_color(style.text_color));
    paint.anti_alias = true;
    pixmap.fill_path(&path, &paint, FillRule::Winding, Transform::identity(), None);
}

/// Feeds ttf-parser outlines (y up, font units) into a tiny-skia path
/// (y down, pixels) positioned at the pen.
struct GlyphOutline<'a> {
    builder: &'a mut PathBuilder,
    scale: f32,
    pen_x: f32,
    baseline: f32,
}

impl GlyphOutline<'_> {
    fn px(&self, x: f32) -> f32 {
        self.pen_x + x * self.scale
    }

    fn py(&self, y: f32) -> f32 {
        self.baseline - y * self.scale
    }
}

impl ttf_parser::OutlineBuilder for GlyphOutline<'_> {
    fn move_to(&mut self, x: f32, y: f32) {
        let (x, y) = (self.px(x), self.py(y));
        self.builder.move_to(x, y);
    }

    fn line_to(&mut self, x: f32, y: f32) {
        let (x, y) = (self.px(x), self.py(y));
        self.builder.line_to(x, y);
    }

    fn quad_to(&mut self, x1: f32, y1: f32, x: f32, y: f32) {
        let (x1, y1, x, y) = (self.px(x1), self.py(y1), self.px(x), self.py(y));
        self.builder.quad_to(x1, y1, x, y);
    }

    fn curve_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, x: f32, y: f32) {
        let (x1, y1) = (self.px(x1), self.py(y1));
        let (x2, y2) = (self.px(x2), self.py(y2));
        let (x, y) = (self.px(x), self.py(y));
        self.builder.cubic_to(x1, y1, x2, y2, x, y);
    }

    fn close(&mut self) {
        self.builder.close();
    }
}

/// Outline every glyph of the run. Advances match
/// [`FontManager::measure_text_width`] so centering agrees with layout.
fn glyph_path(face: &ttf_parser::Face<'_>, units_per_em: f32, run: &PlacedText) -> Option<Path> {
    let scale = run.font_size / units_per_em;
    let mut builder = PathBuilder::new();
    let mut pen_x = run.x;

    for ch in run.text.chars() {
        let Some(gid) = face.glyph_index(ch) else {
            pen_x += run.font_size * 0.5;
            continue;
        };
        let mut outline = GlyphOutline {
            builder: &mut builder,
            scale,
            pen_x,
            baseline: run.baseline,
        };
        face.outline_glyph(gid, &mut outline);
        pen_x += face.glyph_hor_advance(gid).unwrap_or(0) as f32 * scale;
    }
    builder.finish()
}

/// Block glyphs for when no real face is loaded: one bar per visible
/// character, tall for capitals and digits, x-height for lowercase.
fn placeholder_path(run: &PlacedText, fonts: &FontManager, key: FontKey) -> Option<Path> {
    let mut builder = PathBuilder::new();
    let mut pen_x = run.x;
    let mut buf = [0u8; 4];
    let cap = fonts.ascender_px(run.font_size, key);
    let measure = fonts.measurer(run.font_size, key);

    for ch in run.text.chars() {
        let advance = measure(ch.encode_utf8(&mut buf));
        if !ch.is_whitespace() {
            let height = if ch.is_uppercase() || ch.is_ascii_digit() {
                cap
            } else if ch.is_lowercase() {
                cap * 0.67
            } else {
                cap * 0.8
            };
            if let Some(rect) =
                Rect::from_ltrb(pen_x, run.baseline - height, pen_x + advance * 0.8, run.baseline)
            {
                builder.push_rect(rect);
            }
        }
        pen_x += advance;
    }
    builder.finish()
}

fn extract_rgba(pixmap: &Pixmap) -> Vec<u8> {
    pixmap
        .pixels()
        .iter()
        .flat_map(|p| {
            let c = p.demultiply();
            [c.red(), c.green(), c.blue(), c.alpha()]
        })
        .collect()
}
