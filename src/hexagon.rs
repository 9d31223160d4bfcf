/// A single cell of the U-Matrix lattice.
///
/// Hexagons live in an arena owned by the lattice; neighbor references are
/// `(row, col)` indices into that arena, never owning pointers, so rebuilt
/// lattices can be dropped wholesale.

use std::collections::BTreeMap;
use std::fmt;

use glam::DVec2;

/// Neighbor slots, in fixed positional order. Slots without a valid
/// neighbor stay `None` but keep their position, which the interpolation
/// shader relies on.
pub const NEIGHBOR_SLOTS: usize = 6;

/// Variant payload of a hexagon.
#[derive(Debug, Clone)]
pub enum HexagonKind {
    /// Cell sitting on a SOM node: carries the node's prototype vector and a
    /// count of recorded connections to other node hexagons. The connection
    /// counts are exposed as data and not used for rendering.
    Node {
        vector: Vec<f64>,
        connections: BTreeMap<(usize, usize), u32>,
    },
    /// Interstitial cell carrying the distance between the two nodes it
    /// separates.
    Distance,
}

#[derive(Debug, Clone)]
pub struct Hexagon {
    outline: [DVec2; 6],
    center: DVec2,
    /// Raw distance for distance hexagons; 0 or the interpolated neighbor
    /// average for node hexagons.
    value: f64,
    neighbors: [Option<(usize, usize)>; NEIGHBOR_SLOTS],
    kind: HexagonKind,
}

impl Hexagon {
    pub fn new(outline: [DVec2; 6], center: DVec2, value: f64, kind: HexagonKind) -> Self {
        Self {
            outline,
            center,
            value,
            neighbors: [None; NEIGHBOR_SLOTS],
            kind,
        }
    }

    pub fn outline(&self) -> &[DVec2; 6] {
        &self.outline
    }

    pub fn center(&self) -> DVec2 {
        self.center
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn kind(&self) -> &HexagonKind {
        &self.kind
    }

    pub fn is_node(&self) -> bool {
        matches!(self.kind, HexagonKind::Node { .. })
    }

    /// Prototype vector, if this is a node hexagon.
    pub fn vector(&self) -> Option<&[f64]> {
        match &self.kind {
            HexagonKind::Node { vector, .. } => Some(vector),
            HexagonKind::Distance => None,
        }
    }

    /// Connection counts to other node hexagons, if this is a node hexagon.
    pub fn connections(&self) -> Option<&BTreeMap<(usize, usize), u32>> {
        match &self.kind {
            HexagonKind::Node { connections, .. } => Some(connections),
            HexagonKind::Distance => None,
        }
    }

    /// Increments the connection count toward another node hexagon.
    pub fn record_connection(&mut self, other: (usize, usize)) {
        if let HexagonKind::Node { connections, .. } = &mut self.kind {
            *connections.entry(other).or_insert(0) += 1;
        }
    }

    /// All six neighbor slots; absent neighbors are `None` and keep their
    /// position.
    pub fn neighbors(&self) -> &[Option<(usize, usize)>; NEIGHBOR_SLOTS] {
        &self.neighbors
    }

    pub(crate) fn set_neighbors(&mut self, neighbors: [Option<(usize, usize)>; NEIGHBOR_SLOTS]) {
        self.neighbors = neighbors;
    }
}

impl fmt::Display for Hexagon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            HexagonKind::Node { vector, .. } => {
                for v in vector {
                    write!(f, "{}; ", v)?;
                }
                Ok(())
            }
            HexagonKind::Distance => write!(f, "distance: {}", self.value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hexagon(kind: HexagonKind) -> Hexagon {
        let outline = [DVec2::ZERO; 6];
        Hexagon::new(outline, DVec2::ZERO, 2.5, kind)
    }

    #[test]
    fn test_node_payload() {
        let mut hex = hexagon(HexagonKind::Node {
            vector: vec![1.0, 2.0],
            connections: BTreeMap::new(),
        });
        assert_eq!(hex.vector(), Some(&[1.0, 2.0][..]));
        hex.record_connection((0, 2));
        hex.record_connection((0, 2));
        assert_eq!(hex.connections().unwrap()[&(0, 2)], 2);
    }

    #[test]
    fn test_distance_payload() {
        let hex = hexagon(HexagonKind::Distance);
        assert!(hex.vector().is_none());
        assert!(hex.connections().is_none());
        assert_eq!(hex.to_string(), "distance: 2.5");
    }

    #[test]
    fn test_neighbor_slots_default_absent() {
        let hex = hexagon(HexagonKind::Distance);
        assert_eq!(hex.neighbors().len(), NEIGHBOR_SLOTS);
        assert!(hex.neighbors().iter().all(|n| n.is_none()));
    }
}
