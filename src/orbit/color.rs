use std::fmt;

use ndarray::Array1;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::orbit::OrbitError;

/// 8-bit sRGB colour, written as `#rrggbb` in configuration files.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgb(pub u8, pub u8, pub u8);

/// Bar colour used when no colour signal is configured.
pub const DEFAULT_COLOR: Rgb = Rgb(0x69, 0x5f, 0x5e);

impl Rgb {
    pub fn from_hex(text: &str) -> Result<Self, OrbitError> {
        let trimmed = text.trim();
        let digits = trimmed.strip_prefix('#').unwrap_or(trimmed);
        if digits.len() != 6 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(OrbitError::config(format!("bad colour {text:?}")));
        }
        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&digits[range], 16)
                .map_err(|_| OrbitError::config(format!("bad colour {text:?}")))
        };
        Ok(Rgb(channel(0..2)?, channel(2..4)?, channel(4..6)?))
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.0, self.1, self.2)
    }
}

impl TryFrom<String> for Rgb {
    type Error = OrbitError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Rgb::from_hex(&value)
    }
}

impl From<Rgb> for String {
    fn from(value: Rgb) -> Self {
        value.to_string()
    }
}

/// Built-in sequential palettes, darkest first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Palette {
    Reds9,
    Blues9,
}

static REDS9: Lazy<Vec<Rgb>> = Lazy::new(|| {
    parse_palette(&[
        "#67000d", "#a50f15", "#cb181d", "#ef3b2c", "#fb6a4a", "#fc9272", "#fcbba1", "#fee0d2",
        "#fff5f0",
    ])
});

static BLUES9: Lazy<Vec<Rgb>> = Lazy::new(|| {
    parse_palette(&[
        "#08306b", "#08519c", "#2171b5", "#4292c6", "#6baed6", "#9ecae1", "#c6dbef", "#deebf7",
        "#f7fbff",
    ])
});

fn parse_palette(hex: &[&str]) -> Vec<Rgb> {
    hex.iter().filter_map(|h| Rgb::from_hex(h).ok()).collect()
}

impl Palette {
    pub fn colors(self) -> &'static [Rgb] {
        match self {
            Palette::Reds9 => &REDS9,
            Palette::Blues9 => &BLUES9,
        }
    }
}

/// Nearest-extent colour lookup. Stateless once built.
#[derive(Clone, Debug, PartialEq)]
pub struct ColorBinner {
    extents: Array1<f64>,
    colors: Vec<Rgb>,
}

impl ColorBinner {
    pub fn new(extents: Vec<f64>, colors: Vec<Rgb>) -> Result<Self, OrbitError> {
        if extents.is_empty() {
            return Err(OrbitError::config("colour extents are empty"));
        }
        if let Some(bad) = extents.iter().find(|e| !e.is_finite()) {
            return Err(OrbitError::config(format!("colour extent {bad} is not finite")));
        }
        if extents.len() != colors.len() {
            return Err(OrbitError::config(format!(
                "{} colour extents but {} colours",
                extents.len(),
                colors.len()
            )));
        }
        Ok(Self {
            extents: Array1::from(extents),
            colors,
        })
    }

    /// One extent per colour, evenly spaced over `[low, high]`.
    pub fn spanning(low: f64, high: f64, colors: Vec<Rgb>) -> Result<Self, OrbitError> {
        if !(low.is_finite() && high.is_finite()) || high < low {
            return Err(OrbitError::config(format!(
                "colour range [{low}, {high}] is not increasing"
            )));
        }
        let extents = match colors.len() {
            0 => Vec::new(),
            1 => vec![low],
            n => Array1::linspace(low, high, n).to_vec(),
        };
        Self::new(extents, colors)
    }

    pub fn extents(&self) -> &[f64] {
        self.extents.as_slice().unwrap_or(&[])
    }

    pub fn colors(&self) -> &[Rgb] {
        &self.colors
    }

    /// Index of the extent closest to `value`; ties go to the lower index.
    pub fn nearest_index(&self, value: f64) -> usize {
        let distances = self.extents.mapv(|e| (e - value).abs());
        let mut best = 0;
        for (idx, d) in distances.iter().enumerate().skip(1) {
            if *d < distances[best] {
                best = idx;
            }
        }
        best
    }

    pub fn bin(&self, value: f64) -> Rgb {
        self.colors[self.nearest_index(value)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rgb(hex: &str) -> Rgb {
        Rgb::from_hex(hex).unwrap()
    }

    #[test]
    fn picks_nearest_extent() {
        let binner = ColorBinner::new(vec![0.0, 10.0, 20.0], vec![DEFAULT_COLOR; 3]).unwrap();
        assert_eq!(binner.nearest_index(14.0), 1);
        assert_eq!(binner.nearest_index(-3.0), 0);
        assert_eq!(binner.nearest_index(99.0), 2);
    }

    #[test]
    fn ties_go_to_lowest_index() {
        let binner = ColorBinner::new(vec![0.0, 10.0, 20.0], vec![DEFAULT_COLOR; 3]).unwrap();
        assert_eq!(binner.nearest_index(15.0), 1);
        assert_eq!(binner.nearest_index(5.0), 0);
    }

    #[test]
    fn bins_signal_to_named_colour() {
        let red = rgb("#ff0000");
        let green = rgb("#00ff00");
        let blue = rgb("#0000ff");
        let binner = ColorBinner::new(vec![0.0, 1.0, 2.0], vec![red, green, blue]).unwrap();
        assert_eq!(binner.bin(1.6), blue);
        assert_eq!(binner.bin(0.4), red);
    }

    #[test]
    fn mismatched_or_empty_configuration_fails() {
        let err = ColorBinner::new(vec![0.0, 1.0], vec![DEFAULT_COLOR]).unwrap_err();
        assert!(err.is_invalid_configuration());
        let err = ColorBinner::new(Vec::new(), Vec::new()).unwrap_err();
        assert!(err.is_invalid_configuration());
        let err = ColorBinner::new(vec![f64::NAN, 1.0], vec![DEFAULT_COLOR; 2]).unwrap_err();
        assert!(err.is_invalid_configuration());
        let err = ColorBinner::new(vec![0.0, f64::INFINITY], vec![DEFAULT_COLOR; 2]).unwrap_err();
        assert!(err.is_invalid_configuration());
    }

    #[test]
    fn malformed_hex_is_rejected() {
        for text in ["not-a-colour", "#+1+2+3", "##ff0000", "#ff00", "#ff00000", "#gg0000"] {
            let err = Rgb::from_hex(text).unwrap_err();
            assert!(err.is_invalid_configuration(), "{text} accepted");
        }
    }

    #[test]
    fn spanning_spreads_extents_evenly() {
        let binner = ColorBinner::spanning(0.0, 8.0, Palette::Blues9.colors().to_vec()).unwrap();
        assert_eq!(binner.extents().len(), 9);
        assert_eq!(binner.extents()[0], 0.0);
        assert_eq!(binner.extents()[8], 8.0);
        assert_eq!(binner.bin(3.2), Palette::Blues9.colors()[3]);
        assert!(ColorBinner::spanning(5.0, 1.0, vec![DEFAULT_COLOR]).is_err());
    }

    #[test]
    fn hex_round_trips_through_display() {
        assert_eq!(DEFAULT_COLOR.to_string(), "#695f5e");
        assert_eq!(rgb("695F5E"), DEFAULT_COLOR);
        assert_eq!(Palette::Reds9.colors().len(), 9);
    }
}
