//! Visual style for a slide: gradient colors, text color and font choice.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{CarouselError, Result};

/// Smallest body font size accepted by [`RenderStyle::validate`].
pub const MIN_FONT_SIZE_PT: u32 = 12;
/// Largest body font size accepted by [`RenderStyle::validate`].
pub const MAX_FONT_SIZE_PT: u32 = 24;

// ---------------------------------------------------------------------------
// Color
// ---------------------------------------------------------------------------

/// RGBA color with components in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const WHITE: Color = Color {
        r: 1.0,
        g: 1.0,
        b: 1.0,
        a: 1.0,
    };

    pub fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self {
            r: r as f32 / 255.0,
            g: g as f32 / 255.0,
            b: b as f32 / 255.0,
            a: 1.0,
        }
    }

    /// Parse `#rrggbb` or `#rgb` (the leading `#` is optional).
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.trim().trim_start_matches('#');
        if !hex.is_ascii() {
            return None;
        }
        if hex.len() == 6 {
            let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
            let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
            let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
            Some(Self::rgb(r, g, b))
        } else if hex.len() == 3 {
            let r = u8::from_str_radix(&hex[0..1].repeat(2), 16).ok()?;
            let g = u8::from_str_radix(&hex[1..2].repeat(2), 16).ok()?;
            let b = u8::from_str_radix(&hex[2..3].repeat(2), 16).ok()?;
            Some(Self::rgb(r, g, b))
        } else {
            None
        }
    }

    /// Lowercase `#rrggbb`, dropping alpha.
    pub fn to_hex(&self) -> String {
        let [r, g, b, _] = self.to_rgba8();
        format!("#{r:02x}{g:02x}{b:02x}")
    }

    pub fn to_rgba8(&self) -> [u8; 4] {
        let q = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
        [q(self.r), q(self.g), q(self.b), q(self.a)]
    }
}

impl FromStr for Color {
    type Err = CarouselError;

    fn from_str(s: &str) -> Result<Self> {
        Color::from_hex(s)
            .ok_or_else(|| CarouselError::InvalidConfiguration(format!("invalid hex color {s:?}")))
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl Serialize for Color {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Color::from_hex(&s)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid hex color {s:?}")))
    }
}

// ---------------------------------------------------------------------------
// Font family
// ---------------------------------------------------------------------------

/// The fixed set of font families a carousel can be set in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum FontFamily {
    #[default]
    Inter,
    Roboto,
    #[serde(rename = "Open Sans", alias = "OpenSans")]
    OpenSans,
    Montserrat,
    Poppins,
}

impl FontFamily {
    pub const ALL: [FontFamily; 5] = [
        FontFamily::Inter,
        FontFamily::Roboto,
        FontFamily::OpenSans,
        FontFamily::Montserrat,
        FontFamily::Poppins,
    ];

    /// Family name as installed on most systems.
    pub fn name(&self) -> &'static str {
        match self {
            FontFamily::Inter => "Inter",
            FontFamily::Roboto => "Roboto",
            FontFamily::OpenSans => "Open Sans",
            FontFamily::Montserrat => "Montserrat",
            FontFamily::Poppins => "Poppins",
        }
    }
}

impl FromStr for FontFamily {
    type Err = CarouselError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted: String = s.chars().filter(|c| !c.is_whitespace()).collect();
        FontFamily::ALL
            .into_iter()
            .find(|f| f.name().replace(' ', "").eq_ignore_ascii_case(&wanted))
            .ok_or_else(|| {
                CarouselError::InvalidConfiguration(format!("unknown font family {s:?}"))
            })
    }
}

// ---------------------------------------------------------------------------
// Render style
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderStyle {
    pub primary_color: Color,
    pub secondary_color: Color,
    pub text_color: Color,
    pub font_family: FontFamily,
    /// Base body size; titles and labels are derived from it.
    pub font_size_pt: u32,
}

impl Default for RenderStyle {
    fn default() -> Self {
        Self {
            primary_color: Color::rgb(0x66, 0x7e, 0xea),
            secondary_color: Color::rgb(0x76, 0x4b, 0xa2),
            text_color: Color::WHITE,
            font_family: FontFamily::Inter,
            font_size_pt: 16,
        }
    }
}

impl RenderStyle {
    pub fn validate(&self) -> Result<()> {
        if !(MIN_FONT_SIZE_PT..=MAX_FONT_SIZE_PT).contains(&self.font_size_pt) {
            return Err(CarouselError::InvalidConfiguration(format!(
                "font size {} is outside [{MIN_FONT_SIZE_PT}, {MAX_FONT_SIZE_PT}]",
                self.font_size_pt
            )));
        }
        Ok(())
    }

    pub fn font_size(&self) -> f32 {
        self.font_size_pt as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn color_from_hex() {
        let c = Color::from_hex("#ff0000").unwrap();
        assert_eq!(c.r, 1.0);
        assert_eq!(c.g, 0.0);

        let short = Color::from_hex("0f0").unwrap();
        assert_eq!(short, Color::rgb(0, 255, 0));

        assert!(Color::from_hex("#12345").is_none());
        assert!(Color::from_hex("#zzzzzz").is_none());
        assert!(Color::from_hex("#ééé").is_none());
    }

    #[test]
    fn color_hex_round_trip_through_serde() {
        let json = serde_json::to_string(&Color::rgb(0x66, 0x7e, 0xea)).unwrap();
        assert_eq!(json, "\"#667eea\"");
        let back: Color = serde_json::from_str(&json).unwrap();
        assert_eq!(back.to_hex(), "#667eea");
    }

    #[test]
    fn font_family_parsing_ignores_case_and_spaces() {
        assert_eq!("open sans".parse::<FontFamily>().unwrap(), FontFamily::OpenSans);
        assert_eq!("OpenSans".parse::<FontFamily>().unwrap(), FontFamily::OpenSans);
        assert_eq!("POPPINS".parse::<FontFamily>().unwrap(), FontFamily::Poppins);
        assert!("Comic Sans".parse::<FontFamily>().is_err());
    }

    #[test]
    fn font_size_bounds() {
        let mut style = RenderStyle::default();
        assert!(style.validate().is_ok());
        style.font_size_pt = 11;
        assert!(matches!(
            style.validate(),
            Err(CarouselError::InvalidConfiguration(_))
        ));
        style.font_size_pt = 24;
        assert!(style.validate().is_ok());
        style.font_size_pt = 25;
        assert!(style.validate().is_err());
    }
}
