//! Error types for the oscillator field core.
//!
//! Configuration and bounds errors are always typed and returned
//! immediately; numeric degeneracies (non-finite phases, zero-energy
//! sites, sub-epsilon kernel taps) are recovered locally by the code
//! that encounters them and never surface here.

use thiserror::Error;

/// Result type alias for field-core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Error type for all field-core operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// Externally supplied backing store does not match the expected
    /// element count for the resolution and component count.
    #[error("field store size mismatch: expected {expected} elements, got {actual}")]
    StoreSizeMismatch { expected: usize, actual: usize },

    /// A buffer needs at least one component.
    #[error("component count must be >= 1")]
    ZeroComponents,

    /// Component index outside the buffer's component range.
    #[error("component {index} out of range (buffer has {count})")]
    ComponentOutOfRange { index: usize, count: usize },

    /// Requested component count differs from the pool's configured count.
    #[error("component count mismatch: pool is configured for {configured}, caller requested {requested}")]
    ComponentCountMismatch { configured: usize, requested: usize },

    /// Frame is not owned by this pool (cross-manager misuse).
    #[error("frame is not managed by this pool")]
    UnmanagedFrame,

    /// Phase-alignment anchor index outside the grid.
    #[error("anchor index {index} out of bounds ({texels} texels)")]
    AnchorOutOfBounds { index: usize, texels: usize },

    /// Derived-view block does not match the buffer's resolution.
    #[error("derived views sized for {views} texels, buffer has {texels}")]
    ViewSizeMismatch { views: usize, texels: usize },
}
