//! Font loading and text measurement using `ttf-parser`.
//!
//! Real faces come from explicit TTF/OTF bytes or from the system font
//! database (`fontdb`). When neither is available the manager falls back to
//! synthetic Helvetica-like metrics so layout stays deterministic.

use std::collections::HashMap;

use log::{debug, warn};

use crate::error::{CarouselError, Result};
use crate::style::FontFamily;

/// A loaded font face with metrics.
#[derive(Clone)]
pub struct FontData {
    /// Raw font bytes (kept alive for ttf-parser's zero-copy API). Empty for
    /// synthetic faces.
    pub bytes: Vec<u8>,
    /// Face index inside a collection file.
    pub face_index: u32,
    pub units_per_em: f32,
    pub ascender: f32,
    pub descender: f32,
}

impl FontData {
    fn synthetic() -> Self {
        Self {
            bytes: Vec::new(),
            face_index: 0,
            units_per_em: 1000.0,
            ascender: 750.0,
            descender: -250.0,
        }
    }

    pub fn is_synthetic(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Parse the face. `None` for synthetic faces.
    pub fn face(&self) -> Option<ttf_parser::Face<'_>> {
        if self.bytes.is_empty() {
            return None;
        }
        ttf_parser::Face::parse(&self.bytes, self.face_index).ok()
    }
}

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub struct FontKey {
    pub family: FontFamily,
    pub bold: bool,
}

/// Manages loaded fonts and answers width queries.
pub struct FontManager {
    fonts: HashMap<FontKey, FontData>,
    fallback: FontData,
}

impl FontManager {
    /// A manager with only the synthetic fallback face.
    pub fn new() -> Self {
        Self {
            fonts: HashMap::new(),
            fallback: FontData::synthetic(),
        }
    }

    /// A manager that looks up every [`FontFamily`] in the installed system
    /// fonts, regular and bold. Families that cannot be found fall back to the
    /// closest sans-serif face, then to synthetic metrics.
    pub fn with_system_fonts() -> Self {
        let mut mgr = Self::new();
        let mut db = fontdb::Database::new();
        db.load_system_fonts();
        debug!("fontdb: {} system faces available", db.len());

        for family in FontFamily::ALL {
            for bold in [false, true] {
                let weight = if bold {
                    fontdb::Weight::BOLD
                } else {
                    fontdb::Weight::NORMAL
                };
                let families = [fontdb::Family::Name(family.name()), fontdb::Family::SansSerif];
                let query = fontdb::Query {
                    families: &families,
                    weight,
                    stretch: fontdb::Stretch::Normal,
                    style: fontdb::Style::Normal,
                };
                let Some(id) = db.query(&query) else {
                    warn!("No system face for {} (bold: {bold})", family.name());
                    continue;
                };
                let loaded = db.with_face_data(id, |data, index| (data.to_vec(), index));
                if let Some((bytes, index)) = loaded {
                    if let Err(e) = mgr.load_font(family, bold, bytes, index) {
                        warn!("Skipping system face for {}: {e}", family.name());
                    }
                }
            }
        }
        mgr
    }

    /// Load a TTF/OTF font from bytes for `family`.
    pub fn load_font(
        &mut self,
        family: FontFamily,
        bold: bool,
        bytes: Vec<u8>,
        face_index: u32,
    ) -> Result<()> {
        let face = ttf_parser::Face::parse(&bytes, face_index)
            .map_err(|e| CarouselError::Font(format!("{}: {e}", family.name())))?;

        let data = FontData {
            units_per_em: face.units_per_em() as f32,
            ascender: face.ascender() as f32,
            descender: face.descender() as f32,
            face_index,
            bytes,
        };
        self.fonts.insert(FontKey { family, bold }, data);
        Ok(())
    }

    /// Use one font file for every family and weight.
    pub fn load_font_everywhere(&mut self, bytes: Vec<u8>) -> Result<()> {
        for family in FontFamily::ALL {
            for bold in [false, true] {
                self.load_font(family, bold, bytes.clone(), 0)?;
            }
        }
        Ok(())
    }

    /// Get font data for a key. A missing bold face falls back to the regular
    /// one of the same family, then to the synthetic face.
    pub fn get(&self, key: FontKey) -> &FontData {
        self.fonts
            .get(&key)
            .or_else(|| {
                self.fonts.get(&FontKey {
                    family: key.family,
                    bold: false,
                })
            })
            .unwrap_or(&self.fallback)
    }

    /// Measure the width of a string at a given font size (in px).
    /// If we have actual font bytes, we sum glyph advances. Otherwise we use
    /// an average character width heuristic (0.5 × font_size per char).
    pub fn measure_text_width(&self, text: &str, font_size: f32, key: FontKey) -> f32 {
        let data = self.get(key);
        text_width(data, data.face().as_ref(), text, font_size, key.bold)
    }

    /// A measuring closure bound to one font and size, suitable for
    /// [`crate::layout::wrap`]. The face is parsed once, not per call.
    pub fn measurer(&self, font_size: f32, key: FontKey) -> impl Fn(&str) -> f32 + '_ {
        let data = self.get(key);
        let face = data.face();
        move |s| text_width(data, face.as_ref(), s, font_size, key.bold)
    }

    /// Get the ascender in px for the given font.
    pub fn ascender_px(&self, font_size: f32, key: FontKey) -> f32 {
        let data = self.get(key);
        data.ascender * font_size / data.units_per_em
    }

    /// Check if real font bytes are loaded for `family`.
    pub fn has_real_font(&self, family: FontFamily) -> bool {
        self.fonts
            .get(&FontKey {
                family,
                bold: false,
            })
            .is_some_and(|d| !d.is_synthetic())
    }
}

fn text_width(
    data: &FontData,
    face: Option<&ttf_parser::Face<'_>>,
    text: &str,
    font_size: f32,
    bold: bool,
) -> f32 {
    let Some(face) = face else {
        // Bold is ~10 % wider.
        let avg = if bold { 0.55 } else { 0.5 };
        return text.chars().count() as f32 * font_size * avg;
    };

    let scale = font_size / data.units_per_em;
    text.chars()
        .map(|ch| match face.glyph_index(ch) {
            Some(gid) => face.glyph_hor_advance(gid).unwrap_or(0) as f32 * scale,
            None => font_size * 0.5,
        })
        .sum()
}

impl Default for FontManager {
    fn default() -> Self {
        Self::new()
    }
}
