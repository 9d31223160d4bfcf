/// Color mapping for the U-Matrix: HSB conversion plus the two supported
/// color modes.

use image::Rgba;
use serde::{Deserialize, Serialize};

/// How distance values are mapped to fill colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColorMode {
    /// Light-to-dark grey ramp: larger distances are darker.
    Greyscale,
    /// Hue rotation: larger distances move from violet toward red.
    Colored,
}

/// Converts hue/saturation/brightness (all 0..=1, hue wrapping) to an opaque
/// RGBA color.
pub fn hsb_color(hue: f64, saturation: f64, brightness: f64) -> Rgba<u8> {
    let b = brightness.clamp(0.0, 1.0);
    let s = saturation.clamp(0.0, 1.0);
    if s == 0.0 {
        let v = (b * 255.0 + 0.5) as u8;
        return Rgba([v, v, v, 255]);
    }

    let h = (hue - hue.floor()) * 6.0;
    let f = h - h.floor();
    let p = b * (1.0 - s);
    let q = b * (1.0 - s * f);
    let t = b * (1.0 - s * (1.0 - f));

    let (r, g, bl) = match h as u32 {
        0 => (b, t, p),
        1 => (q, b, p),
        2 => (p, b, t),
        3 => (p, q, b),
        4 => (t, p, b),
        _ => (b, p, q),
    };

    Rgba([
        (r * 255.0 + 0.5) as u8,
        (g * 255.0 + 0.5) as u8,
        (bl * 255.0 + 0.5) as u8,
        255,
    ])
}

/// Hue palette entry for a normalized distance (0..=1).
pub fn hue_color(brightness: f64) -> Rgba<u8> {
    hsb_color((1.0 - brightness) * 0.708, 1.0, 1.0)
}

/// Flat fill color for a hexagon value under the given mode.
///
/// A value of exactly 0 paints white; node hexagons without interpolation
/// stay white this way.
pub fn fill_color(value: f64, max_distance: f64, mode: ColorMode) -> Rgba<u8> {
    if value == 0.0 {
        return Rgba([255, 255, 255, 255]);
    }
    let brightness = value / max_distance;
    match mode {
        ColorMode::Greyscale => hsb_color(1.0, 0.0, 1.0 - brightness),
        ColorMode::Colored => hue_color(brightness),
    }
}

pub const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);
pub const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);
