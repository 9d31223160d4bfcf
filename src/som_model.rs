/// Parsed Self-Organizing Map plus its derived inter-node distance lattice.
///
/// The model is built once from a `.cod` style file (SOMToolbox format) and
/// is immutable afterwards; loading a new file replaces the whole model.

use std::fs;
use std::path::Path;

use image::Rgba;

use crate::error::{Result, UMatrixError};
use crate::palette;
use crate::vector_math::{self, DistanceRange};

/// A trained SOM: a `(x_dim, y_dim)` grid of prototype vectors of length
/// `dim`, plus the distance lattice derived from it.
#[derive(Debug, Clone)]
pub struct SomModel {
    dim: usize,
    topology: String,
    x_dim: usize,
    y_dim: usize,
    neighborhood: String,
    /// Prototype vectors, indexed `map[y][x][component]`.
    map: Vec<Vec<Vec<f64>>>,
    /// Distance lattice of shape `(2*y_dim-1, 2*x_dim-1)`. Node positions
    /// hold 0, distance positions hold the Euclidean distance between the
    /// two prototypes they separate.
    distances: Vec<Vec<f64>>,
    range: DistanceRange,
}

impl SomModel {
    /// Reads a SOM from a `.cod` file on disk.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<SomModel> {
        let text = fs::read_to_string(path)?;
        Self::parse(&text)
    }

    /// Parses the `.cod` text format.
    ///
    /// The first non-comment line is the header
    /// `dim topology x_dim y_dim [neighborhood]` (4 or 5 tokens; the
    /// neighborhood defaults to `"bubble"`; all three sizes must be
    /// positive). Every following non-blank,
    /// non-comment line carries exactly `dim` numeric tokens, one node per
    /// line in row-major order (y outer, x inner).
    pub fn parse(input: &str) -> Result<SomModel> {
        let mut header: Option<(usize, String, usize, usize, String)> = None;
        let mut map: Vec<Vec<Vec<f64>>> = Vec::new();
        let mut index = 0usize;

        for (line_no, line) in input.lines().enumerate() {
            let line_no = line_no + 1;
            if line.starts_with('#') || line.trim().is_empty() {
                continue;
            }
            let tokens: Vec<&str> = line.split_whitespace().collect();

            match &header {
                None => {
                    if tokens.len() != 4 && tokens.len() != 5 {
                        return Err(UMatrixError::MalformedHeader {
                            tokens: tokens.len(),
                        });
                    }
                    let dim = parse_usize(tokens[0], line_no)?;
                    let x_dim = parse_usize(tokens[2], line_no)?;
                    let y_dim = parse_usize(tokens[3], line_no)?;
                    if dim == 0 || x_dim == 0 || y_dim == 0 {
                        return Err(UMatrixError::EmptyMap { dim, x_dim, y_dim });
                    }
                    let neighborhood = tokens
                        .get(4)
                        .map(|s| s.to_string())
                        .unwrap_or_else(|| "bubble".to_string());
                    header = Some((dim, tokens[1].to_string(), x_dim, y_dim, neighborhood));
                    map = vec![vec![vec![0.0; dim]; x_dim]; y_dim];
                }
                Some((dim, _, x_dim, y_dim, _)) => {
                    if tokens.len() != *dim {
                        return Err(UMatrixError::DimensionMismatch {
                            expected: *dim,
                            found: tokens.len(),
                        });
                    }
                    // extra rows past the last node would fall off the grid;
                    // the grid is preallocated, so they are skipped
                    if index >= x_dim * y_dim {
                        continue;
                    }
                    for (i, token) in tokens.iter().enumerate() {
                        let value = parse_f64(token, line_no)?;
                        map[index / x_dim][index % x_dim][i] = value;
                    }
                    index += 1;
                }
            }
        }

        let (dim, topology, x_dim, y_dim, neighborhood) =
            header.ok_or(UMatrixError::MalformedHeader { tokens: 0 })?;

        let mut som = SomModel {
            dim,
            topology,
            x_dim,
            y_dim,
            neighborhood,
            map,
            distances: Vec::new(),
            range: DistanceRange::default(),
        };
        som.compute_distance_lattice()?;
        Ok(som)
    }

    /// Derives the distance lattice from the prototype grid.
    ///
    /// Even lattice rows hold horizontal adjacency: odd columns carry the
    /// distance between the node columns left and right of them, even columns
    /// are node positions and hold 0. Odd lattice rows hold vertical and
    /// diagonal adjacency; which diagonal an odd column takes alternates with
    /// the row stagger (`row % 4`).
    fn compute_distance_lattice(&mut self) -> Result<()> {
        let rows = self.y_dim * 2 - 1;
        let cols = self.x_dim * 2 - 1;
        let mut distances = vec![vec![0.0; cols]; rows];
        let mut range = DistanceRange::default();

        for row in 0..rows {
            for col in 0..cols {
                let d = if row % 2 == 0 {
                    if col % 2 == 0 {
                        0.0
                    } else {
                        vector_math::distance(
                            &self.map[row / 2][(col - 1) / 2],
                            &self.map[row / 2][(col + 1) / 2],
                        )?
                    }
                } else if col % 2 == 0 {
                    vector_math::distance(
                        &self.map[(row - 1) / 2][col / 2],
                        &self.map[(row + 1) / 2][col / 2],
                    )?
                } else if row % 4 == 1 {
                    vector_math::distance(
                        &self.map[(row - 1) / 2][(col + 1) / 2],
                        &self.map[(row + 1) / 2][col / 2],
                    )?
                } else {
                    vector_math::distance(
                        &self.map[(row - 1) / 2][col / 2],
                        &self.map[(row + 1) / 2][(col + 1) / 2],
                    )?
                };
                distances[row][col] = d;
                range.observe(d);
            }
        }

        self.distances = distances;
        self.range = range;
        Ok(())
    }

    /// Best-matching unit for `vector`: the `(x, y)` node coordinate whose
    /// prototype minimizes the Euclidean distance. Scan order is x outer,
    /// y inner; the first match wins a tie.
    pub fn bmu(&self, vector: &[f64]) -> Result<(usize, usize)> {
        let mut min_dist = f64::MAX;
        let mut best = (0, 0);
        for x in 0..self.x_dim {
            for y in 0..self.y_dim {
                let dist = vector_math::distance(&self.map[y][x], vector)?;
                if dist < min_dist {
                    min_dist = dist;
                    best = (x, y);
                }
            }
        }
        Ok(best)
    }

    /// Hue palette entry for a raw distance value. The interpolation shader
    /// always draws from this palette, whatever color mode the flat fill
    /// uses.
    pub fn hexagon_color(&self, value: f64) -> Rgba<u8> {
        palette::hue_color(value / self.range.max())
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn topology(&self) -> &str {
        &self.topology
    }

    pub fn x_dim(&self) -> usize {
        self.x_dim
    }

    pub fn y_dim(&self) -> usize {
        self.y_dim
    }

    pub fn neighborhood(&self) -> &str {
        &self.neighborhood
    }

    /// Prototype vectors, indexed `[y][x][component]`.
    pub fn map(&self) -> &Vec<Vec<Vec<f64>>> {
        &self.map
    }

    /// Distance lattice, indexed `[row][col]` over `(2y-1, 2x-1)`.
    pub fn distances(&self) -> &Vec<Vec<f64>> {
        &self.distances
    }

    pub fn max_distance(&self) -> f64 {
        self.range.max()
    }

    pub fn min_distance(&self) -> f64 {
        self.range.min()
    }

    /// Lattice rows: `2 * y_dim - 1`.
    pub fn lattice_rows(&self) -> usize {
        self.y_dim * 2 - 1
    }

    /// Lattice columns: `2 * x_dim - 1`.
    pub fn lattice_cols(&self) -> usize {
        self.x_dim * 2 - 1
    }
}

fn parse_usize(token: &str, line: usize) -> Result<usize> {
    token.parse().map_err(|_| UMatrixError::NumericParse {
        token: token.to_string(),
        line,
    })
}

fn parse_f64(token: &str, line: usize) -> Result<f64> {
    token.parse().map_err(|_| UMatrixError::NumericParse {
        token: token.to_string(),
        line,
    })
}
