pub mod error;
pub mod vector_math;
pub mod som_model;
pub mod palette;
pub mod hex_geometry;
pub mod hexagon;
pub mod hex_lattice;
pub mod shading;
pub mod stroke;
pub mod progress;
pub mod trajectory;
pub mod render;
pub mod viewer;

pub use error::{Result, UMatrixError};
pub use viewer::{UMatrixViewer, ViewOptions};
