use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Caller-supplied standard-normal generator feeding the integrator's
/// noise term. Implementations must be deterministic under a fixed seed.
pub trait NoiseSource {
    fn randn(&mut self) -> f32;
}

/// Box-Muller transform over any `rand` generator. Draws pairs and hands
/// out the spare on the next call, so one uniform pair yields two
/// normals in a fixed order.
pub struct BoxMuller<R: Rng> {
    rng: R,
    spare: Option<f32>,
}

impl BoxMuller<StdRng> {
    /// Deterministic source from a 64-bit seed.
    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> BoxMuller<R> {
    pub fn new(rng: R) -> Self {
        Self { rng, spare: None }
    }
}

impl<R: Rng> NoiseSource for BoxMuller<R> {
    fn randn(&mut self) -> f32 {
        if let Some(z) = self.spare.take() {
            return z;
        }
        // 1 - u keeps the log argument in (0, 1].
        let u1: f64 = 1.0 - self.rng.gen::<f64>();
        let u2: f64 = self.rng.gen::<f64>();
        let r = (-2.0 * u1.ln()).sqrt();
        let theta = std::f64::consts::TAU * u2;
        self.spare = Some((r * theta.sin()) as f32);
        (r * theta.cos()) as f32
    }
}
