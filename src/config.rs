/// Metadata schema version stamped onto every frame
pub const SCHEMA_VERSION: u32 = 3;

/// Solver identifier stamped onto frame metadata
pub const SOLVER_ID: &str = "kuramoto-cpu";

/// Frame pool capacity: surplus released buffers beyond this are dropped
pub const DEFAULT_POOL_CAPACITY: usize = 4;

// ============================================
// Stamp Defaults (first stamp on a fresh frame)
// ============================================

/// Default integration step in seconds (one 60 Hz animation frame)
pub const DEFAULT_DT: f32 = 1.0 / 60.0;

/// Default optical wavelength in nanometers (green, mid-visible)
pub const DEFAULT_WAVELENGTH_NM: f32 = 550.0;

/// Default pixel pitch in meters (typical display texel)
pub const DEFAULT_PIXEL_PITCH_M: f32 = 8.0e-6;

// ============================================
// Numeric Floors and Tolerances
// ============================================

/// Kernel taps with |weight| below this are never stored
pub const KERNEL_WEIGHT_EPSILON: f32 = 1e-5;

/// Slack added to the kernel radius when accepting integer offsets
pub const KERNEL_RADIUS_SLACK: f32 = 1e-6;

/// Sites with primary-component energy at or below this floor are
/// excluded from the order-parameter sum
pub const ORDER_ENERGY_FLOOR: f32 = 1e-12;

/// Default angular tolerance for phase alignment; smaller misalignments
/// are left uncorrected
pub const DEFAULT_ALIGN_TOLERANCE: f32 = 1e-6;

/// Upper clamp for the small-world rewiring degree
pub const MAX_REWIRE_DEGREE: u32 = 64;

// ============================================
// Parity Harness Tolerances
// ============================================

/// Per-element tolerance for strict regression comparison
pub const PARITY_STRICT_TOLERANCE: f32 = 1e-6;

/// Aggregate-error tolerance for cross-context comparison
pub const PARITY_AGGREGATE_TOLERANCE: f32 = 1e-4;
