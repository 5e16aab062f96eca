use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// An 8-bit RGB triple. Channel order is always R, G, B.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Rgb {
        Rgb { r, g, b }
    }

    /// Label form: each channel divided by 255, the same scale the feature
    /// extractor uses for pixel intensities.
    pub fn to_unit(self) -> [f64; 3] {
        [
            self.r as f64 / 255.0,
            self.g as f64 / 255.0,
            self.b as f64 / 255.0,
        ]
    }

    /// Inverse of `to_unit` for model outputs: `round(clamp(v, 0, 1) * 255)`.
    pub fn from_unit(values: [f64; 3]) -> Rgb {
        let [r, g, b] = values.map(|v| to_byte(unit_clamp(v) * 255.0));
        Rgb { r, g, b }
    }

    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl FromStr for Rgb {
    type Err = Error;

    fn from_str(s: &str) -> Result<Rgb> {
        hex_to_rgb(s)
    }
}

/// Parses `rrggbb` or `#rrggbb`, case-insensitive.
pub fn hex_to_rgb(hex: &str) -> Result<Rgb> {
    let digits = hex.strip_prefix('#').unwrap_or(hex);
    // from_str_radix would also accept a leading '+', so check the charset first.
    if digits.len() != 6 || !digits.bytes().all(|c| c.is_ascii_hexdigit()) {
        return Err(Error::InvalidFormat(hex.to_owned()));
    }
    let value = u32::from_str_radix(digits, 16).map_err(|_| Error::InvalidFormat(hex.to_owned()))?;
    Ok(Rgb {
        r: ((value >> 16) & 0xff) as u8,
        g: ((value >> 8) & 0xff) as u8,
        b: (value & 0xff) as u8,
    })
}

/// Formats 0-255 scale channels as `#rrggbb`.
///
/// Channels are rounded to the nearest integer and clamped to [0, 255];
/// non-finite inputs become 0.
pub fn rgb_to_hex(r: f64, g: f64, b: f64) -> String {
    Rgb::new(to_byte(r), to_byte(g), to_byte(b)).to_hex()
}

fn unit_clamp(v: f64) -> f64 {
    if v.is_finite() { v.clamp(0.0, 1.0) } else { 0.0 }
}

fn to_byte(v: f64) -> u8 {
    if !v.is_finite() {
        return 0;
    }
    v.round().clamp(0.0, 255.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_with_and_without_prefix() {
        assert_eq!(hex_to_rgb("ff0000").unwrap(), Rgb::new(255, 0, 0));
        assert_eq!(hex_to_rgb("#673AB7").unwrap(), Rgb::new(0x67, 0x3a, 0xb7));
        assert_eq!(hex_to_rgb("40e0d0").unwrap(), hex_to_rgb("40E0D0").unwrap());
    }

    #[test]
    fn rejects_bad_charset_and_length() {
        for bad in ["zzzzzz", "#fff", "ff00000", "", "#", "+fffff", "gg0000", "ff 000"] {
            assert!(
                matches!(hex_to_rgb(bad), Err(Error::InvalidFormat(_))),
                "'{}' should not parse",
                bad
            );
        }
    }

    #[test]
    fn formats_lowercase_with_prefix() {
        assert_eq!(rgb_to_hex(255.0, 165.0, 0.0), "#ffa500");
        assert_eq!(Rgb::new(0x67, 0x3a, 0xb7).to_string(), "#673ab7");
    }

    #[test]
    fn rgb_to_hex_rounds_and_clamps() {
        assert_eq!(rgb_to_hex(254.6, 0.4, 127.5), "#ff0080");
        assert_eq!(rgb_to_hex(300.0, -12.0, 255.49), "#ff00ff");
        assert_eq!(rgb_to_hex(f64::NAN, f64::INFINITY, 16.0), "#000010");
    }

    #[test]
    fn hex_round_trips_every_channel_value() {
        for v in 0..=255u8 {
            for rgb in [Rgb::new(v, 0, 0), Rgb::new(0, v, 0), Rgb::new(0, 0, v), Rgb::new(v, 255 - v, v / 3)] {
                let hex = rgb_to_hex(rgb.r as f64, rgb.g as f64, rgb.b as f64);
                assert_eq!(hex_to_rgb(&hex).unwrap(), rgb);
            }
        }
    }

    #[test]
    fn unit_conversions_are_inverse_and_bounded() {
        let rgb = Rgb::new(64, 128, 255);
        assert_eq!(Rgb::from_unit(rgb.to_unit()), rgb);
        assert_eq!(Rgb::from_unit([1.7, -0.2, f64::NAN]), Rgb::new(255, 0, 0));
    }
}
