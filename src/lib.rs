//! Coupled-oscillator field simulation core.
//!
//! Owns the field memory, advances the field state, and exposes
//! read-only derived views plus metadata to consumers. Rendering, UI,
//! and capture live elsewhere and only see this crate's outputs.
//!
//! # Components
//!
//! - [`field`]: pooled, versioned complex-field buffers with frame
//!   metadata and phase alignment
//! - [`coupling`]: memoized difference-of-Gaussians coupling stencils
//!   and small-world rewiring tables
//! - [`optics`]: the thin-element operator pipeline (flux, amplitude,
//!   phase, polarization, beam split) and the exported derived views
//! - [`solver`]: the Kuramoto-type integrator, seedable noise, and
//!   per-step telemetry
//!
//! # Determinism
//!
//! Every source of randomness is seeded explicitly. Two instances fed
//! the same seed and parameter stream produce identical output, which
//! is what makes cross-context parity checking possible; see the
//! `indra-field` binary for the reference harness.

pub mod config;
pub mod coupling;
mod cpx;
pub mod error;
pub mod field;
pub mod optics;
pub mod solver;

pub use cpx::Cpx;
pub use error::{CoreError, CoreResult};
pub use field::{
    FieldBuffer, FieldFrame, FrameMetadata, FramePool, PhaseAlignRequest, Resolution,
};
pub use optics::{DerivedViews, FluxDrive, OperatorPipeline, ScheduleStep};
pub use solver::{
    BoxMuller, DerivedGains, KuramotoParams, OscillatorIntegrator, StepInputs,
    TelemetrySnapshot,
};
