//! Render configuration and partial config updates

use std::fmt;

use serde::Deserialize;

use crate::{TempoError, TempoResult};

/// Opaque RGB color
#[derive(Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(0xff, 0xff, 0xff);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Color { r, g, b }
    }

    /// Parse `#rrggbb` or `#rgb`
    pub fn parse(s: &str) -> TempoResult<Self> {
        let invalid = || TempoError::InvalidColor(s.to_string());
        let hex = s.trim().strip_prefix('#').ok_or_else(invalid)?;
        if !hex.is_ascii() {
            return Err(invalid());
        }

        match hex.len() {
            6 => {
                let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16);
                match (channel(0), channel(2), channel(4)) {
                    (Ok(r), Ok(g), Ok(b)) => Ok(Color { r, g, b }),
                    _ => Err(invalid()),
                }
            }
            3 => {
                let channel = |i: usize| u8::from_str_radix(&hex[i..i + 1], 16).map(|v| v * 17);
                match (channel(0), channel(1), channel(2)) {
                    (Ok(r), Ok(g), Ok(b)) => Ok(Color { r, g, b }),
                    _ => Err(invalid()),
                }
            }
            _ => Err(invalid()),
        }
    }

    /// Packed `0xRRGGBBAA`, fully opaque
    #[inline]
    pub fn to_rgba(self) -> u32 {
        u32::from_be_bytes([self.r, self.g, self.b, 0xff])
    }
}

impl TryFrom<String> for Color {
    type Error = TempoError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Color::parse(&value)
    }
}

impl fmt::Debug for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// Visual configuration of a rendered clock face
#[derive(Clone, Debug, PartialEq)]
pub struct RenderConfig {
    /// Paint fill
    pub background_color: Color,
    /// Digit color
    pub text_color: Color,
    pub font_family: String,
    /// Shadow/blur behind the digits
    pub glow_effect: bool,
    /// Status dot, visible on even seconds
    pub show_dot: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        RenderConfig {
            background_color: Color::BLACK,
            text_color: Color::WHITE,
            font_family: "monospace".to_string(),
            glow_effect: false,
            show_dot: false,
        }
    }
}

impl RenderConfig {
    /// Broadcast-style preset: green digits with glow and the status dot
    pub fn broadcast() -> Self {
        RenderConfig {
            background_color: Color::BLACK,
            text_color: Color::rgb(0x00, 0xff, 0x66),
            font_family: "monospace".to_string(),
            glow_effect: true,
            show_dot: true,
        }
    }

    /// Merge a patch. Omitted fields keep their current values.
    pub fn apply(&mut self, patch: ConfigPatch) {
        if let Some(color) = patch.background_color {
            self.background_color = color;
        }
        if let Some(color) = patch.text_color {
            self.text_color = color;
        }
        if let Some(family) = patch.font_family {
            self.font_family = family;
        }
        if let Some(glow) = patch.glow_effect {
            self.glow_effect = glow;
        }
        if let Some(dot) = patch.show_dot {
            self.show_dot = dot;
        }
    }
}

/// Partial update of a [`RenderConfig`].
///
/// Accepts camelCase or snake_case keys; unknown keys are ignored.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConfigPatch {
    #[serde(alias = "background_color")]
    pub background_color: Option<Color>,
    #[serde(alias = "text_color")]
    pub text_color: Option<Color>,
    #[serde(alias = "font_family")]
    pub font_family: Option<String>,
    #[serde(alias = "glow_effect")]
    pub glow_effect: Option<bool>,
    #[serde(alias = "show_dot")]
    pub show_dot: Option<bool>,
}

impl ConfigPatch {
    pub fn from_json(json: &str) -> TempoResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn is_empty(&self) -> bool {
        *self == ConfigPatch::default()
    }
}

impl From<RenderConfig> for ConfigPatch {
    fn from(config: RenderConfig) -> Self {
        ConfigPatch {
            background_color: Some(config.background_color),
            text_color: Some(config.text_color),
            font_family: Some(config.font_family),
            glow_effect: Some(config.glow_effect),
            show_dot: Some(config.show_dot),
        }
    }
}
