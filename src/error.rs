use thiserror::Error;

/// Errors surfaced by the U-Matrix core.
///
/// Parse errors abort the running parse; a partially parsed SOM or trajectory
/// list is never installed as the active model.
#[derive(Debug, Error)]
pub enum UMatrixError {
    /// The .cod header did not contain 4 or 5 whitespace-separated tokens.
    #[error("malformed .cod header: expected 4 or 5 tokens, found {tokens}")]
    MalformedHeader { tokens: usize },

    /// The .cod header declared a zero-sized map or zero-length vectors.
    #[error("header declares an empty map: dim {dim}, grid {x_dim}x{y_dim}")]
    EmptyMap {
        dim: usize,
        x_dim: usize,
        y_dim: usize,
    },

    /// A vector did not match the expected dimensionality.
    #[error("dimension mismatch: expected {expected} components, found {found}")]
    DimensionMismatch { expected: usize, found: usize },

    /// A token that should have been a number was not.
    #[error("'{token}' is not a numeric value (line {line})")]
    NumericParse { token: String, line: usize },

    #[error("i/o failure: {0}")]
    Io(#[from] std::io::Error),

    #[error("image failure: {0}")]
    Image(#[from] image::ImageError),
}

pub type Result<T> = std::result::Result<T, UMatrixError>;
