/// The full grid of node and distance hexagons derived from a SOM.
///
/// The lattice is an arena: hexagons are stored by `(row, col)` and refer to
/// their neighbors through indices, so a rebuild (after a quality or SOM
/// change) simply drops the whole arena and builds a new one. Neighbor links
/// are recomputed after every build and never survive one.

use glam::DVec2;

use crate::hex_geometry::HexGeometry;
use crate::hexagon::{Hexagon, HexagonKind, NEIGHBOR_SLOTS};
use crate::som_model::SomModel;

#[derive(Debug, Clone)]
pub struct HexagonLattice {
    geometry: HexGeometry,
    quality: u32,
    rows: usize,
    cols: usize,
    hexagons: Vec<Vec<Hexagon>>,
}

impl HexagonLattice {
    /// Builds the lattice for `som` at the given quality.
    ///
    /// Cells where the distance lattice holds exactly 0 become node hexagons
    /// carrying the prototype at `(row/2, col/2)`; all others become distance
    /// hexagons. Node values stay 0 unless interpolation is requested (the
    /// contour shader needs interpolated node values too, so contours force
    /// it on).
    pub fn build(
        som: &SomModel,
        quality: u32,
        interpolate_node_values: bool,
        contour_active: bool,
    ) -> Self {
        let geometry = HexGeometry::new(quality);
        let rows = som.lattice_rows();
        let cols = som.lattice_cols();

        let mut hexagons: Vec<Vec<Hexagon>> = Vec::with_capacity(rows);
        for row in 0..rows {
            let mut line = Vec::with_capacity(cols);
            for col in 0..cols {
                let outline = geometry.outline(col, row);
                let center = HexGeometry::center(&outline);
                let raw = som.distances()[row][col];

                let hexagon = if raw == 0.0 {
                    let value = if interpolate_node_values || contour_active {
                        interpolate_node_value(som, row, col)
                    } else {
                        0.0
                    };
                    Hexagon::new(
                        outline,
                        center,
                        value,
                        HexagonKind::Node {
                            vector: som.map()[row / 2][col / 2].clone(),
                            connections: Default::default(),
                        },
                    )
                } else {
                    Hexagon::new(outline, center, raw, HexagonKind::Distance)
                };
                line.push(hexagon);
            }
            hexagons.push(line);
        }

        let mut lattice = Self {
            geometry,
            quality,
            rows,
            cols,
            hexagons,
        };
        lattice.link_neighbors();
        lattice
    }

    /// Records the six neighbor slots of every hexagon.
    ///
    /// The upper and lower neighbor pairs share a lattice row; which of the
    /// two candidates is the left one is decided by comparing its center x
    /// against the current hexagon's center x. That comparison, not a fixed
    /// index offset, is the source of truth for adjacency. Out-of-range
    /// candidates leave their slot `None`.
    fn link_neighbors(&mut self) {
        for row in 0..self.rows {
            for col in 0..self.cols {
                let center_x = self.hexagons[row][col].center().x;
                let mut slots: [Option<(usize, usize)>; NEIGHBOR_SLOTS] = [None; NEIGHBOR_SLOTS];

                // upper-left
                if row > 0 {
                    if self.hexagons[row - 1][col].center().x < center_x {
                        slots[0] = Some((row - 1, col));
                    } else if col > 0 {
                        slots[0] = Some((row - 1, col - 1));
                    }
                }
                // lower-left
                if row + 1 < self.rows {
                    if self.hexagons[row + 1][col].center().x < center_x {
                        slots[1] = Some((row + 1, col));
                    } else if col > 0 {
                        slots[1] = Some((row + 1, col - 1));
                    }
                }
                // upper-right
                if row > 0 {
                    if self.hexagons[row - 1][col].center().x > center_x {
                        slots[2] = Some((row - 1, col));
                    } else if col + 1 < self.cols {
                        slots[2] = Some((row - 1, col + 1));
                    }
                }
                // lower-right
                if row + 1 < self.rows {
                    if self.hexagons[row + 1][col].center().x > center_x {
                        slots[3] = Some((row + 1, col));
                    } else if col + 1 < self.cols {
                        slots[3] = Some((row + 1, col + 1));
                    }
                }
                // left
                if col > 0 {
                    slots[4] = Some((row, col - 1));
                }
                // right
                if col + 1 < self.cols {
                    slots[5] = Some((row, col + 1));
                }

                self.hexagons[row][col].set_neighbors(slots);
            }
        }
    }

    pub fn get(&self, row: usize, col: usize) -> &Hexagon {
        &self.hexagons[row][col]
    }

    pub fn get_mut(&mut self, row: usize, col: usize) -> &mut Hexagon {
        &mut self.hexagons[row][col]
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn quality(&self) -> u32 {
        self.quality
    }

    pub fn geometry(&self) -> &HexGeometry {
        &self.geometry
    }

    /// Finds the hexagon containing `point`, if any.
    ///
    /// Starts from a coarse row/column estimate derived from the tile
    /// metrics, then containment-checks the surrounding window. Points on
    /// the border area legitimately hit nothing and return `None`.
    pub fn hexagon_at_point(&self, point: DVec2) -> Option<(usize, usize)> {
        let approx_row = ((point.y - self.geometry.hexagon_height())
            / self.geometry.vertical_offset())
        .round();
        let approx_col = ((point.x - self.geometry.hexagon_width()) / self.geometry.hexagon_width())
            .round();
        let approx_row = approx_row.clamp(0.0, (self.rows - 1) as f64) as usize;
        let approx_col = approx_col.clamp(0.0, (self.cols - 1) as f64) as usize;

        for row in approx_row.saturating_sub(1)..=(approx_row + 1).min(self.rows - 1) {
            for col in approx_col.saturating_sub(2)..=(approx_col + 2).min(self.cols - 1) {
                if HexGeometry::contains(self.hexagons[row][col].outline(), point) {
                    return Some((row, col));
                }
            }
        }
        None
    }
}

/// Averages the distance-lattice values of the up-to-six directional
/// neighbors of the node cell at `(row, col)`.
///
/// Which diagonal cells count as upper/lower neighbors follows the same
/// `row % 4` stagger rule the distance lattice itself uses. Out-of-range
/// neighbors are skipped entirely rather than averaged in as zero; a cell
/// with no neighbor at all yields 0.
pub fn interpolate_node_value(som: &SomModel, row: usize, col: usize) -> f64 {
    let distances = som.distances();
    let rows = som.lattice_rows();
    let cols = som.lattice_cols();

    let mut sum = 0.0;
    let mut count = 0u32;

    // left
    if col > 0 {
        sum += distances[row][col - 1];
        count += 1;
    }
    // right
    if col + 1 < cols {
        sum += distances[row][col + 1];
        count += 1;
    }
    // top pair; node rows are even, so row % 4 is 0 or 2
    if row > 0 {
        if row % 4 == 0 {
            if col > 0 {
                sum += distances[row - 1][col - 1];
                count += 1;
            }
            sum += distances[row - 1][col];
            count += 1;
        } else if row % 4 == 2 {
            if col + 1 < cols {
                sum += distances[row - 1][col + 1];
                count += 1;
            }
            sum += distances[row - 1][col];
            count += 1;
        }
    }
    // bottom pair
    if row + 1 < rows {
        if row % 4 == 2 {
            if col > 0 {
                sum += distances[row + 1][col - 1];
                count += 1;
            }
            sum += distances[row + 1][col];
            count += 1;
        } else if row % 4 == 0 {
            if col + 1 < cols {
                sum += distances[row + 1][col + 1];
                count += 1;
            }
            sum += distances[row + 1][col];
            count += 1;
        }
    }

    if count > 0 { sum / count as f64 } else { 0.0 }
}
