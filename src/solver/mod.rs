mod gains;
mod integrator;
mod rng;
mod telemetry;

pub use gains::{ControlState, DerivedGains, KernelSpec};
pub use integrator::{seed_twist, KuramotoParams, OscillatorIntegrator, StepInputs};
pub use rng::{BoxMuller, NoiseSource};
pub use telemetry::{
    InterferenceStats, OrderParameter, TelemetryAccumulator, TelemetrySnapshot,
};
