//! Deterministic presentation colors for services and series
//!
//! A color is a pure function of the palette configuration and the series
//! name (or index), so the same service is drawn in the same color across
//! invocations and views. There is no shared counter or other module state
//! to drift between callers.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;
use thiserror::Error;

const GOLDEN_RATIO_CONJUGATE: f64 = 0.618033988749895;

#[derive(Debug, Error)]
pub enum PaletteError {
    #[error("Failed to read palette config '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse palette config '{path}': {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid color '{0}': expected #rrggbb hex")]
    InvalidHexColor(String),
    #[error("{field} must be at most 100, got {value}")]
    ComponentOutOfRange { field: &'static str, value: u8 },
}

/// An RGB color with a `#rrggbb` text form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    /// Parse a `#rrggbb` (or bare `rrggbb`) hex color.
    pub fn from_hex(hex: &str) -> Result<Self, PaletteError> {
        let digits = hex.strip_prefix('#').unwrap_or(hex);
        if digits.len() != 6 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(PaletteError::InvalidHexColor(hex.to_string()));
        }

        let component = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&digits[range], 16)
                .map_err(|_| PaletteError::InvalidHexColor(hex.to_string()))
        };
        Ok(Self {
            r: component(0..2)?,
            g: component(2..4)?,
            b: component(4..6)?,
        })
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// Palette configuration, usually loaded from a TOML file. Missing fields
/// fall back to the defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PaletteConfig {
    /// HSV saturation of generated colors, in percent.
    pub saturation: u8,
    /// HSV value (brightness) of generated colors, in percent.
    pub value: u8,
    /// Hue family in degrees used for error colors.
    pub error_hue: f64,
    /// Fixed categorical palette of `#rrggbb` entries used for indexed
    /// assignment. Empty means hue-generated colors.
    pub categorical: Vec<String>,
}

impl Default for PaletteConfig {
    fn default() -> Self {
        Self {
            saturation: 50,
            value: 95,
            error_hue: 0.0,
            categorical: Vec::new(),
        }
    }
}

/// Load a [`PaletteConfig`] from a TOML file.
pub fn load_palette_config(path: &Path) -> Result<PaletteConfig, PaletteError> {
    let shown_path = path.display().to_string();
    let raw = fs::read_to_string(path).map_err(|source| PaletteError::Read {
        path: shown_path.clone(),
        source,
    })?;

    toml::from_str(&raw).map_err(|source| PaletteError::Parse {
        path: shown_path,
        source,
    })
}

/// Assigns colors to series names and indexes.
#[derive(Debug, Clone)]
pub struct Palette {
    saturation: f64,
    value: f64,
    error_hue: f64,
    categorical: Vec<Color>,
}

impl Palette {
    /// Build a palette from a configuration, validating percentages and the
    /// categorical entries.
    pub fn new(config: PaletteConfig) -> Result<Self, PaletteError> {
        for (field, value) in [("saturation", config.saturation), ("value", config.value)] {
            if value > 100 {
                return Err(PaletteError::ComponentOutOfRange { field, value });
            }
        }

        let categorical = config
            .categorical
            .iter()
            .map(|hex| Color::from_hex(hex))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            saturation: f64::from(config.saturation),
            value: f64::from(config.value),
            error_hue: config.error_hue,
            categorical,
        })
    }

    /// Color for a named series. The hue derives from a hash of the name,
    /// so a given name keeps its color across palette instances.
    pub fn color_for(&self, name: &str) -> Color {
        let fraction = (hash_fraction(name) + GOLDEN_RATIO_CONJUGATE) % 1.0;
        hsv_to_rgb(fraction * 360.0, self.saturation, self.value)
    }

    /// Color for a named series drawn from the error family: the configured
    /// error hue shifted by a small per-name offset, so failing services
    /// remain distinguishable while all reading as errors.
    pub fn error_color_for(&self, name: &str) -> Color {
        let jitter = hash_fraction(name) * 30.0 - 15.0;
        hsv_to_rgb(
            (self.error_hue + jitter).rem_euclid(360.0),
            self.saturation,
            self.value,
        )
    }

    /// Color for a series index. With a categorical palette configured the
    /// entries cycle, darkening one step per full cycle; without one, hues
    /// follow a golden-ratio walk around the wheel.
    pub fn color_at(&self, index: usize) -> Color {
        if self.categorical.is_empty() {
            let fraction = (index as f64 * GOLDEN_RATIO_CONJUGATE) % 1.0;
            return hsv_to_rgb(fraction * 360.0, self.saturation, self.value);
        }

        let base = self.categorical[index % self.categorical.len()];
        let cycle = index / self.categorical.len();
        if cycle == 0 {
            return base;
        }
        darken(base, (1.0 - cycle as f64 * 0.2).clamp(0.0, 1.0))
    }
}

/// Map a name to a stable fraction in `[0, 1)` using FNV-1a.
fn hash_fraction(name: &str) -> f64 {
    const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
    const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

    let mut hash = FNV_OFFSET_BASIS;
    for byte in name.bytes() {
        hash ^= u64::from(byte);
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    // Top 53 bits fit the f64 mantissa exactly.
    (hash >> 11) as f64 / (1u64 << 53) as f64
}

/// Convert HSV (degrees, percent, percent) to RGB.
fn hsv_to_rgb(hue: f64, saturation: f64, value: f64) -> Color {
    let s = saturation / 100.0;
    let v = value / 100.0;

    let h = hue.rem_euclid(360.0) / 60.0;
    let c = v * s;
    let x = c * (1.0 - (h % 2.0 - 1.0).abs());
    let (r, g, b) = match h as usize {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };

    let m = v - c;
    Color {
        r: ((r + m) * 255.0).round() as u8,
        g: ((g + m) * 255.0).round() as u8,
        b: ((b + m) * 255.0).round() as u8,
    }
}

/// Scale a color toward black by `factor` in `[0, 1]`.
fn darken(color: Color, factor: f64) -> Color {
    Color {
        r: (f64::from(color.r) * factor).round() as u8,
        g: (f64::from(color.g) * factor).round() as u8,
        b: (f64::from(color.b) * factor).round() as u8,
    }
}
