/// Stroke styles for trajectory drawing.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

/// A dash pattern plus a base line width. An empty dash pattern draws a
/// solid line; otherwise the entries alternate drawn/skipped lengths in
/// pixels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrokeStyle {
    pub name: String,
    pub width: f64,
    pub dash: Vec<f64>,
}

impl StrokeStyle {
    pub fn new(name: &str, width: f64, dash: Vec<f64>) -> Self {
        Self {
            name: name.to_string(),
            width,
            dash,
        }
    }

    pub fn solid() -> Self {
        Self::new("simple", 2.0, vec![])
    }

    /// Same dash pattern with a different width. Zero or negative widths are
    /// ignored and leave the style unchanged.
    pub fn with_width(&self, width: f64) -> Self {
        if width <= 0.0 {
            return self.clone();
        }
        Self {
            name: self.name.clone(),
            width,
            dash: self.dash.clone(),
        }
    }

    /// Whether a position along the stroke (in pixels from its start) is on
    /// a drawn segment of the dash pattern.
    pub fn is_drawn_at(&self, position: f64) -> bool {
        if self.dash.is_empty() {
            return true;
        }
        let cycle: f64 = self.dash.iter().sum();
        if cycle <= 0.0 {
            return true;
        }
        let mut t = position % cycle;
        for (i, len) in self.dash.iter().enumerate() {
            if t < *len {
                return i % 2 == 0;
            }
            t -= len;
        }
        true
    }
}

/// The predefined strokes offered by the trajectory options editor.
pub static STROKE_PRESETS: Lazy<Vec<StrokeStyle>> = Lazy::new(|| {
    vec![
        StrokeStyle::solid(),
        StrokeStyle::new("dashed short", 2.0, vec![5.0, 2.0]),
        StrokeStyle::new("dashed long", 2.0, vec![10.0, 4.0]),
        StrokeStyle::new("dots", 2.0, vec![1.0, 2.0]),
    ]
});
