/// Geometry for the doubled hexagonal lattice.
///
/// All sizes derive from the "quality" value: the radius of the circle
/// inscribed in one hexagon, in pixels. Rendering resolution is controlled
/// here and is decoupled from zooming.

use glam::DVec2;

/// Produces hexagon outlines and center points for lattice coordinates.
#[derive(Debug, Clone, Copy)]
pub struct HexGeometry {
    tile_width: f64,
    tile_height: f64,
    triangle_height: f64,
    vertical_offset: f64,
}

impl HexGeometry {
    /// `quality` is the inscribed-circle radius of one hexagon in pixels.
    pub fn new(quality: u32) -> Self {
        let s = quality as f64;
        Self {
            tile_width: s * 3.0_f64.sqrt(),
            tile_height: s * 2.0,
            triangle_height: s / 2.0,
            vertical_offset: s * 1.5,
        }
    }

    /// The six corner points of the hexagon at lattice position
    /// `(col, row)`, in drawing order.
    ///
    /// Rows stagger horizontally in a cycle of four (0, w/2, w, w/2), and
    /// the whole grid is inset by one tile width/height so the image keeps a
    /// border.
    pub fn outline(&self, col: usize, row: usize) -> [DVec2; 6] {
        let mut x_offset = match row % 4 {
            1 | 3 => self.tile_width / 2.0,
            2 => self.tile_width,
            _ => 0.0,
        };
        x_offset += self.hexagon_width();
        let y_offset = self.hexagon_height();

        let xi = col as f64;
        let yi = row as f64;

        let x_left = x_offset + xi * self.tile_width;
        let x_mid = x_offset + self.tile_width / 2.0 + xi * self.tile_width;
        let x_right = x_offset + (xi + 1.0) * self.tile_width;
        let y_top = y_offset + yi * self.vertical_offset;
        let y_upper_mid = y_top + self.triangle_height;
        let y_lower_mid = y_offset + (yi + 1.0) * self.vertical_offset;
        let y_bottom = y_top + self.tile_height;

        [
            DVec2::new(x_left, y_upper_mid),
            DVec2::new(x_mid, y_top),
            DVec2::new(x_right, y_upper_mid),
            DVec2::new(x_right, y_lower_mid),
            DVec2::new(x_mid, y_bottom),
            DVec2::new(x_left, y_lower_mid),
        ]
    }

    /// Bounding-box center of an outline.
    pub fn center(outline: &[DVec2]) -> DVec2 {
        let min_x = outline.iter().map(|p| p.x).fold(f64::MAX, f64::min);
        let max_x = outline.iter().map(|p| p.x).fold(f64::MIN, f64::max);
        let min_y = outline.iter().map(|p| p.y).fold(f64::MAX, f64::min);
        let max_y = outline.iter().map(|p| p.y).fold(f64::MIN, f64::max);
        DVec2::new((min_x + max_x) / 2.0, (min_y + max_y) / 2.0)
    }

    /// Ray-cast point-in-polygon test. A point outside every hexagon is a
    /// legitimate result (clicks on the border area), so there is no error
    /// path here.
    pub fn contains(outline: &[DVec2], point: DVec2) -> bool {
        let mut inside = false;
        let n = outline.len();
        let mut j = n - 1;
        for i in 0..n {
            let pi = outline[i];
            let pj = outline[j];
            if (pi.y > point.y) != (pj.y > point.y)
                && point.x < (pj.x - pi.x) * (point.y - pi.y) / (pj.y - pi.y) + pi.x
            {
                inside = !inside;
            }
            j = i;
        }
        inside
    }

    /// Visible width of one hexagon tile.
    pub fn hexagon_width(&self) -> f64 {
        self.tile_width
    }

    /// Visible height of one hexagon: staggered rows overlap by the top
    /// triangle.
    pub fn hexagon_height(&self) -> f64 {
        self.tile_height - self.triangle_height
    }

    pub fn vertical_offset(&self) -> f64 {
        self.vertical_offset
    }

    /// Pixel dimensions of a raster large enough for the full lattice of a
    /// `(x_dim, y_dim)` node SOM, including the one-tile border on every
    /// side.
    pub fn buffer_dimensions(&self, x_dim: usize, y_dim: usize) -> (u32, u32) {
        let width = self.hexagon_width() * (x_dim as f64 * 2.0) + 2.0 * self.hexagon_width();
        let height = self.hexagon_height() * (y_dim as f64 * 2.0) + 2.0 * self.hexagon_height();
        (width.ceil() as u32, height.ceil() as u32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_tile_metrics() {
        let geom = HexGeometry::new(10);
        assert_relative_eq!(geom.hexagon_width(), 10.0 * 3.0_f64.sqrt());
        assert_relative_eq!(geom.hexagon_height(), 15.0);
        assert_relative_eq!(geom.vertical_offset(), 15.0);
    }

    #[test]
    fn test_outline_is_closed_hexagon() {
        let geom = HexGeometry::new(15);
        let outline = geom.outline(0, 0);
        // left and right edges are vertical
        assert_relative_eq!(outline[0].x, outline[5].x);
        assert_relative_eq!(outline[2].x, outline[3].x);
        // width equals one tile width
        assert_relative_eq!(outline[2].x - outline[0].x, geom.hexagon_width());
        // height equals one tile height
        assert_relative_eq!(outline[4].y - outline[1].y, 30.0);
    }

    #[test]
    fn test_row_stagger_cycle() {
        let geom = HexGeometry::new(10);
        let x0 = geom.outline(0, 0)[0].x;
        let x1 = geom.outline(0, 1)[0].x;
        let x2 = geom.outline(0, 2)[0].x;
        let x3 = geom.outline(0, 3)[0].x;
        let x4 = geom.outline(0, 4)[0].x;
        let w = geom.hexagon_width();
        assert_relative_eq!(x1 - x0, w / 2.0);
        assert_relative_eq!(x2 - x0, w);
        assert_relative_eq!(x3 - x0, w / 2.0);
        assert_relative_eq!(x4 - x0, 0.0);
    }

    #[test]
    fn test_center_and_containment() {
        let geom = HexGeometry::new(12);
        let outline = geom.outline(2, 3);
        let center = HexGeometry::center(&outline);
        assert!(HexGeometry::contains(&outline, center));
        // a point two tiles away is outside
        let far = center + DVec2::new(2.0 * geom.hexagon_width(), 0.0);
        assert!(!HexGeometry::contains(&outline, far));
    }

    #[test]
    fn test_buffer_dimensions_cover_outlines() {
        let geom = HexGeometry::new(15);
        let (w, h) = geom.buffer_dimensions(3, 2);
        // the furthest hexagon of a 3x2 node SOM is at lattice (4, 2)
        let outline = geom.outline(4, 2);
        for p in outline {
            assert!(p.x < w as f64);
            assert!(p.y < h as f64);
        }
    }
}
