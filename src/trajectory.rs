/// Trajectories: input-vector sequences mapped onto the SOM over time.
///
/// Each trajectory is parsed from a SOMToolbox `.dat` style file, mapped to
/// its best-matching-unit path, and carries the display styling the overlay
/// renderer needs.

use std::fs;
use std::path::Path;

use image::Rgba;
use rand::Rng;

use crate::error::{Result, UMatrixError};
use crate::som_model::SomModel;
use crate::stroke::StrokeStyle;

#[derive(Debug, Clone)]
pub struct Trajectory {
    label: String,
    /// Input vectors, `path[i][component]`.
    path: Vec<Vec<f64>>,
    /// Best-matching node per step, `(x, y)`.
    bmus: Vec<(usize, usize)>,
    /// How often each node was the BMU, indexed `[y][x]`.
    hit_counts: Vec<Vec<u32>>,

    pub display: bool,
    /// Synchronize the drawn portion with an external playback clock.
    pub display_synced: bool,
    color: Rgba<u8>,
    stroke: StrokeStyle,
    /// Drawing offset in hexagon-size units, separating overlapping
    /// trajectories.
    offset: f64,

    x_dim: usize,
    y_dim: usize,
    // partial hit-count cache for synchronized playback
    incomplete_counts: Vec<Vec<u32>>,
    last_incomplete_step: Option<usize>,
}

impl Trajectory {
    fn new(label: String, som: &SomModel) -> Self {
        let mut rng = rand::rng();
        let color = Rgba([
            rng.random_range(0..=255),
            rng.random_range(0..=255),
            rng.random_range(0..=255),
            255,
        ]);
        Self {
            label,
            path: Vec::new(),
            bmus: Vec::new(),
            hit_counts: Vec::new(),
            display: true,
            display_synced: false,
            color,
            stroke: StrokeStyle::solid().with_width(0.5),
            offset: 0.2,
            x_dim: som.x_dim(),
            y_dim: som.y_dim(),
            incomplete_counts: vec![vec![0; som.x_dim()]; som.y_dim()],
            last_incomplete_step: None,
        }
    }

    /// Maps every path vector to its BMU and tallies per-node hit counts.
    fn compute_bmus_and_hit_counts(&mut self, som: &SomModel) -> Result<()> {
        self.bmus = Vec::with_capacity(self.path.len());
        for vector in &self.path {
            self.bmus.push(som.bmu(vector)?);
        }
        self.hit_counts = vec![vec![0; self.x_dim]; self.y_dim];
        for (x, y) in &self.bmus {
            self.hit_counts[*y][*x] += 1;
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.path.len()
    }

    pub fn is_empty(&self) -> bool {
        self.path.is_empty()
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn path(&self) -> &Vec<Vec<f64>> {
        &self.path
    }

    pub fn bmus(&self) -> &[(usize, usize)] {
        &self.bmus
    }

    /// Final hit counts over the whole path, indexed `[y][x]`.
    pub fn hit_counts(&self) -> &Vec<Vec<u32>> {
        &self.hit_counts
    }

    pub fn color(&self) -> Rgba<u8> {
        self.color
    }

    pub fn set_color(&mut self, color: Rgba<u8>) {
        self.color = color;
    }

    pub fn stroke(&self) -> &StrokeStyle {
        &self.stroke
    }

    /// Adopts the dash pattern of `stroke` while keeping the current width.
    pub fn set_stroke(&mut self, stroke: &StrokeStyle) {
        let width = self.stroke.width;
        self.stroke = stroke.with_width(width);
    }

    /// Line width; non-positive values are ignored.
    pub fn set_line_width(&mut self, width: f64) {
        self.stroke = self.stroke.with_width(width);
    }

    pub fn line_width(&self) -> f64 {
        self.stroke.width
    }

    pub fn offset(&self) -> f64 {
        self.offset
    }

    pub fn set_offset(&mut self, offset: f64) {
        self.offset = offset;
    }

    /// Hit counts over the path prefix ending at `step`, for synchronized
    /// playback.
    ///
    /// Repeating the previous step returns the cached grid unchanged, and
    /// advancing by exactly one increments a single cell, so a monotone
    /// playback clock pays O(1) per update. Any other seek recomputes the
    /// grid over `0..=min(step, len - 1)`.
    pub fn incomplete_counts_at(&mut self, step: usize) -> &Vec<Vec<u32>> {
        match self.last_incomplete_step {
            Some(last) if step == last => {}
            Some(last) if step == last + 1 => {
                if step < self.path.len() {
                    let (x, y) = self.bmus[step];
                    self.incomplete_counts[y][x] += 1;
                }
            }
            _ => {
                self.incomplete_counts = vec![vec![0; self.x_dim]; self.y_dim];
                if !self.bmus.is_empty() {
                    let end = step.min(self.bmus.len() - 1);
                    for i in 0..=end {
                        let (x, y) = self.bmus[i];
                        self.incomplete_counts[y][x] += 1;
                    }
                }
            }
        }
        self.last_incomplete_step = Some(step);
        &self.incomplete_counts
    }
}

/// Reads a `.dat` trajectory file from disk.
pub fn trajectories_from_file<P: AsRef<Path>>(
    path: P,
    expected_dim: usize,
    som: &SomModel,
) -> Result<Vec<Trajectory>> {
    let text = fs::read_to_string(path)?;
    parse_trajectories(&text, expected_dim, som)
}

/// Parses trajectory vector sequences.
///
/// Comment and blank lines are skipped. A line with a single token declares
/// the vector dimensionality and must match `expected_dim`. Every other line
/// holds at least `expected_dim` numeric components; the tokens after the
/// components, minus the trailing one, concatenate into the trajectory
/// label. Consecutive lines with the same label belong to one trajectory and
/// a label change starts a new one. An empty file parses to an empty list.
pub fn parse_trajectories(
    input: &str,
    expected_dim: usize,
    som: &SomModel,
) -> Result<Vec<Trajectory>> {
    let mut trajectories: Vec<Trajectory> = Vec::new();
    let mut current: Option<Trajectory> = None;

    for (line_no, line) in input.lines().enumerate() {
        let line_no = line_no + 1;
        if line.starts_with('#') || line.trim().is_empty() {
            continue;
        }
        let tokens: Vec<&str> = line.split_whitespace().collect();

        if tokens.len() == 1 {
            let dim: usize = tokens[0].parse().map_err(|_| UMatrixError::NumericParse {
                token: tokens[0].to_string(),
                line: line_no,
            })?;
            if dim != expected_dim {
                return Err(UMatrixError::DimensionMismatch {
                    expected: expected_dim,
                    found: dim,
                });
            }
            continue;
        }
        if tokens.len() < expected_dim {
            return Err(UMatrixError::DimensionMismatch {
                expected: expected_dim,
                found: tokens.len(),
            });
        }

        // the last token never joins the label; it is treated as a trailing
        // separator
        let label = if tokens.len() > expected_dim {
            tokens[expected_dim..tokens.len() - 1].concat()
        } else {
            String::new()
        };

        let mut vector = Vec::with_capacity(expected_dim);
        for token in &tokens[..expected_dim] {
            let value: f64 = token.parse().map_err(|_| UMatrixError::NumericParse {
                token: token.to_string(),
                line: line_no,
            })?;
            vector.push(value);
        }

        let starts_new = current.as_ref().is_none_or(|t| t.label() != label);
        if starts_new {
            if let Some(mut done) = current.take() {
                done.compute_bmus_and_hit_counts(som)?;
                trajectories.push(done);
            }
        }
        current
            .get_or_insert_with(|| Trajectory::new(label, som))
            .path
            .push(vector);
    }

    if let Some(mut done) = current.take() {
        done.compute_bmus_and_hit_counts(som)?;
        trajectories.push(done);
    }

    Ok(trajectories)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn som() -> SomModel {
        SomModel::parse("1 hexa 2 2\n0\n10\n5\n5\n").unwrap()
    }

    #[test]
    fn test_empty_file_yields_no_trajectories() {
        let som = som();
        let list = parse_trajectories("", 1, &som).unwrap();
        assert!(list.is_empty());
        let list = parse_trajectories("# only comments\n\n", 1, &som).unwrap();
        assert!(list.is_empty());
    }

    #[test]
    fn test_dimension_declaration_line() {
        let som = som();
        assert!(parse_trajectories("1\n", 1, &som).unwrap().is_empty());
        let err = parse_trajectories("3\n", 1, &som).unwrap_err();
        assert!(matches!(
            err,
            UMatrixError::DimensionMismatch { expected: 1, found: 3 }
        ));
    }

    #[test]
    fn test_label_grouping() {
        let som = som();
        let text = "0.1 walk x\n0.2 walk x\n9.9 run x\n9.8 run x\n9.7 run x\n";
        let list = parse_trajectories(text, 1, &som).unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].label(), "walk");
        assert_eq!(list[0].len(), 2);
        assert_eq!(list[1].label(), "run");
        assert_eq!(list[1].len(), 3);
    }

    #[test]
    fn test_trailing_token_never_joins_label() {
        let som = som();
        // two tokens past the components: "walk" + dropped trailing "1"
        let list = parse_trajectories("0.1 walk 1\n", 1, &som).unwrap();
        assert_eq!(list[0].label(), "walk");
        // exactly dim + 1 tokens leaves an empty label
        let list = parse_trajectories("0.1 x\n0.2 x\n", 1, &som).unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].label(), "");
    }

    #[test]
    fn test_non_numeric_component() {
        let som = som();
        let err = parse_trajectories("abc walk x\n", 1, &som).unwrap_err();
        assert!(matches!(err, UMatrixError::NumericParse { .. }));
    }

    #[test]
    fn test_bmus_and_hit_counts() {
        let som = som();
        let text = "0.1 t x\n9.9 t x\n9.8 t x\n6.0 t x\n";
        let list = parse_trajectories(text, 1, &som).unwrap();
        let t = &list[0];
        assert_eq!(t.bmus().len(), t.len());
        // 0.1 -> node (0,0); 9.9 and 9.8 -> node (1,0); 6.0 ties at the two
        // 5-nodes, first in scan order is (0,1)
        assert_eq!(t.bmus(), &[(0, 0), (1, 0), (1, 0), (0, 1)]);
        let total: u32 = t.hit_counts().iter().flatten().sum();
        assert_eq!(total as usize, t.len());
        assert_eq!(t.hit_counts()[0][1], 2);
    }

    #[test]
    fn test_incomplete_counts_final_step_equals_full_counts() {
        let som = som();
        let text = "0.1 t x\n9.9 t x\n9.8 t x\n6.0 t x\n";
        let mut list = parse_trajectories(text, 1, &som).unwrap();
        let t = &mut list[0];
        let len = t.len();
        let full = t.hit_counts().clone();
        assert_eq!(t.incomplete_counts_at(len - 1), &full);
    }

    #[test]
    fn test_incremental_cache_equivalence() {
        let som = som();
        let text = "0.1 t x\n9.9 t x\n9.8 t x\n6.0 t x\n0.2 t x\n";
        let mut one_shot = parse_trajectories(text, 1, &som).unwrap();
        let mut stepped = one_shot.clone();

        let len = one_shot[0].len();
        let expected = one_shot[0].incomplete_counts_at(len - 1).clone();

        let t = &mut stepped[0];
        let mut last = Vec::new();
        for step in 0..len {
            last = t.incomplete_counts_at(step).clone();
        }
        assert_eq!(last, expected);
    }

    #[test]
    fn test_incomplete_counts_past_end_clamps() {
        let som = som();
        let mut list = parse_trajectories("0.1 t x\n9.9 t x\n", 1, &som).unwrap();
        let t = &mut list[0];
        let full = t.hit_counts().clone();
        assert_eq!(t.incomplete_counts_at(100), &full);
        // advancing from past the end must not add phantom hits
        assert_eq!(t.incomplete_counts_at(101), &full);
    }

    #[test]
    fn test_repeat_step_returns_cached_grid() {
        let som = som();
        let mut list = parse_trajectories("0.1 t x\n9.9 t x\n", 1, &som).unwrap();
        let t = &mut list[0];
        let first = t.incomplete_counts_at(0).clone();
        assert_eq!(t.incomplete_counts_at(0), &first);
    }

    #[test]
    fn test_default_styling() {
        let som = som();
        let list = parse_trajectories("0.1 t x\n", 1, &som).unwrap();
        let t = &list[0];
        assert!(t.display);
        assert!(!t.display_synced);
        assert_eq!(t.line_width(), 0.5);
        assert_eq!(t.offset(), 0.2);
        assert!(t.stroke().dash.is_empty());
    }
}
