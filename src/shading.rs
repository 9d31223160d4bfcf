/// Per-pixel interpolated shading for a single hexagon.
///
/// This is the "paint" behind the smoothed U-Matrix look: every pixel inside
/// a hexagon blends the colors and distance values of the hexagon's center
/// and its up-to-six neighbors, weighted by how close the pixel sits to each
/// of them. Contour lines fall out of the same computation by blacking out
/// pixels whose interpolated value lands near a configured level.
///
/// Shading is deterministic and side-effect free; pixels are independent of
/// each other.

use glam::DVec2;
use image::Rgba;

use crate::hexagon::NEIGHBOR_SLOTS;
use crate::palette;

/// A sample point feeding the interpolation: a hexagon center with its
/// palette color and scalar distance value.
#[derive(Debug, Clone, Copy)]
pub struct SurfacePoint {
    pub position: DVec2,
    pub color: Rgba<u8>,
    pub value: f64,
}

/// Shades the pixels of one hexagon from an immutable neighbor snapshot.
#[derive(Debug, Clone)]
pub struct HexagonShader {
    neighbors: [Option<SurfacePoint>; NEIGHBOR_SLOTS],
    /// Distance from the hexagon center to each present neighbor,
    /// precomputed once.
    center_spans: [Option<f64>; NEIGHBOR_SLOTS],
    center: SurfacePoint,
    /// Radius around the center inside which the center's own color
    /// contributes.
    center_radius: f64,
    contour_levels: Vec<f64>,
    contour_thickness: f64,
}

impl HexagonShader {
    pub fn new(
        neighbors: [Option<SurfacePoint>; NEIGHBOR_SLOTS],
        center: SurfacePoint,
        center_radius: f64,
        contour_levels: Vec<f64>,
        contour_thickness: f64,
    ) -> Self {
        let mut center_spans = [None; NEIGHBOR_SLOTS];
        for (span, neighbor) in center_spans.iter_mut().zip(&neighbors) {
            *span = neighbor.map(|n| n.position.distance(center.position));
        }
        Self {
            neighbors,
            center_spans,
            center,
            center_radius,
            contour_levels,
            contour_thickness,
        }
    }

    /// Interpolated color and value at `pixel`.
    ///
    /// Each present neighbor contributes `max(1 - d(pixel, n) / d(center, n), 0)`,
    /// the center contributes `max(1 - d(pixel, center) / center_radius, 0)`,
    /// and all weights are normalized to sum to 1. A pixel beyond the reach
    /// of every sample is black. Contour levels override the color, never
    /// the value.
    pub fn shade(&self, pixel: DVec2) -> (Rgba<u8>, f64) {
        let mut weights = [0.0f64; NEIGHBOR_SLOTS];
        let mut norm = 0.0f64;

        for i in 0..NEIGHBOR_SLOTS {
            if let (Some(neighbor), Some(span)) = (&self.neighbors[i], self.center_spans[i]) {
                let w = (1.0 - neighbor.position.distance(pixel) / span).max(0.0);
                weights[i] = w;
                norm += w;
            }
        }

        let center_weight =
            (1.0 - self.center.position.distance(pixel) / self.center_radius).max(0.0);
        norm += center_weight;

        if norm == 0.0 {
            return (palette::BLACK, 0.0);
        }

        let mut rgb = [0.0f64; 3];
        let mut value = 0.0f64;
        for i in 0..NEIGHBOR_SLOTS {
            if let Some(neighbor) = &self.neighbors[i] {
                let w = weights[i] / norm;
                for c in 0..3 {
                    rgb[c] += w * neighbor.color.0[c] as f64;
                }
                value += w * neighbor.value;
            }
        }
        let w = center_weight / norm;
        for c in 0..3 {
            rgb[c] += w * self.center.color.0[c] as f64;
        }
        value += w * self.center.value;

        let mut color = Rgba([rgb[0] as u8, rgb[1] as u8, rgb[2] as u8, 255]);
        for level in &self.contour_levels {
            if value > level - self.contour_thickness / 2.0
                && value < level + self.contour_thickness / 2.0
            {
                color = palette::BLACK;
            }
        }

        (color, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(x: f64, y: f64, grey: u8, value: f64) -> SurfacePoint {
        SurfacePoint {
            position: DVec2::new(x, y),
            color: Rgba([grey, grey, grey, 255]),
            value,
        }
    }

    fn shader(contours: Vec<f64>, thickness: f64) -> HexagonShader {
        let mut neighbors = [None; NEIGHBOR_SLOTS];
        neighbors[0] = Some(point(10.0, 0.0, 200, 8.0));
        neighbors[1] = Some(point(-10.0, 0.0, 100, 4.0));
        HexagonShader::new(neighbors, point(0.0, 0.0, 0, 2.0), 5.0, contours, thickness)
    }

    #[test]
    fn test_center_pixel_blends_all_reachable_samples() {
        let s = shader(vec![], 0.0);
        // at the center each neighbor sits at exactly its own span, so both
        // neighbor weights are 0 and only the center contributes
        let (color, value) = s.shade(DVec2::ZERO);
        assert_eq!(color, Rgba([0, 0, 0, 255]));
        assert_eq!(value, 2.0);
    }

    #[test]
    fn test_pixel_near_neighbor_leans_toward_it() {
        let s = shader(vec![], 0.0);
        // 6 units toward the first neighbor: neighbor weight 0.6, the other
        // neighbor is 16 away (weight 0), center out of radius (6 > 5)
        let (color, value) = s.shade(DVec2::new(6.0, 0.0));
        assert_eq!(value, 8.0);
        assert_eq!(color, Rgba([200, 200, 200, 255]));
    }

    #[test]
    fn test_unreachable_pixel_is_black() {
        let s = shader(vec![], 0.0);
        let (color, value) = s.shade(DVec2::new(0.0, 50.0));
        assert_eq!(color, palette::BLACK);
        assert_eq!(value, 0.0);
    }

    #[test]
    fn test_contour_blackout_overrides_color_not_value() {
        let s = shader(vec![8.0], 1.0);
        let (color, value) = s.shade(DVec2::new(6.0, 0.0));
        // interpolated value 8.0 sits on the contour level
        assert_eq!(value, 8.0);
        assert_eq!(color, palette::BLACK);
    }

    #[test]
    fn test_weights_normalize() {
        let s = shader(vec![], 0.0);
        // halfway to the first neighbor: neighbor weight 0.5, center weight
        // 1 - 5/5 = 0; value is exactly the neighbor's
        let (_, value) = s.shade(DVec2::new(5.0, 0.0));
        assert_eq!(value, 8.0);
    }
}
