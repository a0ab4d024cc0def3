//! sRGB colors as they appear in configuration (`"#rrggbb"`) and CSS.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::RenderError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Self = Self::new(0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub const fn hex(value: u32) -> Self {
        Self::new((value >> 16) as u8, (value >> 8) as u8, value as u8)
    }

    /// Linear 0..1 channels for GL uniforms.
    pub fn to_unit(self) -> [f32; 3] {
        [
            f32::from(self.r) / 255.0,
            f32::from(self.g) / 255.0,
            f32::from(self.b) / 255.0,
        ]
    }

    /// CSS `rgba()` string with the given alpha, clamped to 0..1.
    pub fn css_rgba(self, alpha: f32) -> String {
        format!(
            "rgba({}, {}, {}, {:.3})",
            self.r,
            self.g,
            self.b,
            alpha.clamp(0.0, 1.0)
        )
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl FromStr for Rgb {
    type Err = RenderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.trim().trim_start_matches('#');
        if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(RenderError::invalid(format!("bad color `{s}`")));
        }
        let expanded: String = match digits.len() {
            3 => digits.chars().flat_map(|c| [c, c]).collect(),
            6 => digits.to_owned(),
            _ => return Err(RenderError::invalid(format!("bad color `{s}`"))),
        };
        let value = u32::from_str_radix(&expanded, 16)
            .map_err(|_| RenderError::invalid(format!("bad color `{s}`")))?;
        Ok(Self::hex(value))
    }
}

impl TryFrom<String> for Rgb {
    type Error = RenderError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Rgb> for String {
    fn from(value: Rgb) -> Self {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_short_and_long_hex() {
        assert_eq!("#0ff".parse::<Rgb>().unwrap(), Rgb::new(0, 255, 255));
        assert_eq!("#05060f".parse::<Rgb>().unwrap(), Rgb::new(5, 6, 15));
        assert!("#12345".parse::<Rgb>().is_err());
        assert!("#zzzzzz".parse::<Rgb>().is_err());
    }

    #[test]
    fn rejects_signed_digits() {
        assert!("#+fffff".parse::<Rgb>().is_err());
        assert!("+ff".parse::<Rgb>().is_err());
    }

    #[test]
    fn css_alpha_is_clamped() {
        assert_eq!(Rgb::hex(0x22d3ee).css_rgba(1.7), "rgba(34, 211, 238, 1.000)");
    }

    #[test]
    fn deserializes_from_json_string() {
        let c: Rgb = serde_json::from_str("\"#a855f7\"").unwrap();
        assert_eq!(c, Rgb::hex(0xa855f7));
        assert_eq!(serde_json::to_string(&c).unwrap(), "\"#a855f7\"");
    }
}
