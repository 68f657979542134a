use std::fmt;

use serde::{Deserialize, Serialize};

use crate::foundation::error::{LinestackError, LinestackResult};

/// Height of the solid band inserted between a subtitle-only run and the next keyframe.
pub const GAP_HEIGHT_PX: u32 = 8;

/// Longest watermark the pipeline accepts, in characters.
pub const WATERMARK_MAX_CHARS: usize = 20;

/// Largest image list an export job may carry.
pub const MAX_IMAGES: usize = 30;

/// JPEG quality used when settings do not override it.
pub const DEFAULT_JPEG_QUALITY: f32 = 0.9;

/// How an image participates in the stack.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Full frame kept, starts a new scene.
    Keyframe,
    /// Only a slice (usually the subtitle band) is kept.
    #[serde(alias = "subtitle")]
    SubtitleOnly,
}

impl Role {
    pub fn is_keyframe(self) -> bool {
        matches!(self, Role::Keyframe)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Keyframe => f.write_str("keyframe"),
            Role::SubtitleOnly => f.write_str("subtitle_only"),
        }
    }
}

/// Pixel width of every output segment. Only the widths the risk table knows are allowed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum OutputWidth {
    #[default]
    W720,
    W1080,
}

impl OutputWidth {
    pub const ALL: [OutputWidth; 2] = [OutputWidth::W720, OutputWidth::W1080];

    pub fn px(self) -> u32 {
        match self {
            OutputWidth::W720 => 720,
            OutputWidth::W1080 => 1080,
        }
    }
}

impl TryFrom<u32> for OutputWidth {
    type Error = LinestackError;

    fn try_from(value: u32) -> LinestackResult<Self> {
        match value {
            720 => Ok(OutputWidth::W720),
            1080 => Ok(OutputWidth::W1080),
            other => Err(LinestackError::validation(format!(
                "unsupported output width {other} (expected 720 or 1080)"
            ))),
        }
    }
}

impl From<OutputWidth> for u32 {
    fn from(value: OutputWidth) -> Self {
        value.px()
    }
}

impl fmt::Display for OutputWidth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.px())
    }
}

/// Opaque sRGB color used for the background and gap bands.
///
/// Serialized as `#RRGGBB`; also accepts `[r, g, b]` byte arrays.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Rgb8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb8 {
    pub const WHITE: Rgb8 = Rgb8::new(0xFF, 0xFF, 0xFF);
    pub const BLACK: Rgb8 = Rgb8::new(0x00, 0x00, 0x00);
    pub const DARK_GRAY: Rgb8 = Rgb8::new(0x33, 0x33, 0x33);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn parse_hex(s: &str) -> LinestackResult<Self> {
        let s = s.trim();
        let s = s.strip_prefix('#').unwrap_or(s);
        if s.len() != 6 || !s.is_ascii() {
            return Err(LinestackError::validation(format!(
                "color \"{s}\" must be #RRGGBB"
            )));
        }

        fn hex_byte(pair: &str) -> LinestackResult<u8> {
            u8::from_str_radix(pair, 16)
                .map_err(|_| LinestackError::validation(format!("invalid hex byte \"{pair}\"")))
        }

        Ok(Self::new(
            hex_byte(&s[0..2])?,
            hex_byte(&s[2..4])?,
            hex_byte(&s[4..6])?,
        ))
    }

    pub fn to_rgba(self) -> image::Rgba<u8> {
        image::Rgba([self.r, self.g, self.b, 255])
    }
}

impl Default for Rgb8 {
    fn default() -> Self {
        Rgb8::WHITE
    }
}

impl fmt::Display for Rgb8 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

impl Serialize for Rgb8 {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Rgb8 {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Hex(String),
            Arr([u8; 3]),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Hex(s) => Rgb8::parse_hex(&s).map_err(serde::de::Error::custom),
            Repr::Arr([r, g, b]) => Ok(Rgb8::new(r, g, b)),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
