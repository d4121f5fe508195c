use crate::geometry::{Rect, Size};

/// Errors raised by the fill pipeline.  Degenerate images are not errors;
/// these are caller precondition violations.
#[derive(Debug)]
pub enum BlurFillError {
    /// Selection has zero width or height (aspect ratio undefined).
    InvalidSelection(Rect),
    /// Selection is not fully inside the canvas.
    SelectionOutOfBounds { selection: Rect, canvas: Size },
    /// Source, destination or canvas sizes disagree.
    SizeMismatch(String),
    /// `render_*` called before a completed `prepare`.
    NotPrepared,
    /// Parameter token could not be encoded or decoded.
    Config(String),
}

impl std::fmt::Display for BlurFillError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BlurFillError::InvalidSelection(r) => {
                write!(f, "Invalid selection {}x{} at ({}, {}): width and height must be non-zero", r.width, r.height, r.x, r.y)
            }
            BlurFillError::SelectionOutOfBounds { selection, canvas } => write!(
                f,
                "Selection ({}, {}, {}x{}) exceeds canvas {}x{}",
                selection.x, selection.y, selection.width, selection.height, canvas.width, canvas.height
            ),
            BlurFillError::SizeMismatch(e) => write!(f, "Size mismatch: {}", e),
            BlurFillError::NotPrepared => write!(f, "Pipeline has not been prepared"),
            BlurFillError::Config(e) => write!(f, "Parameter token error: {}", e),
        }
    }
}

impl std::error::Error for BlurFillError {}

impl From<Box<bincode::ErrorKind>> for BlurFillError {
    fn from(e: Box<bincode::ErrorKind>) -> Self {
        BlurFillError::Config(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, BlurFillError>;
