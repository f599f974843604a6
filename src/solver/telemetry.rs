/// Circular order parameter over the primary component: the normalized
/// complex average of unit phase vectors across participating sites.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct OrderParameter {
    pub magnitude: f32,
    pub phase: f32,
    pub real: f32,
    pub imag: f32,
    /// Sites that cleared the energy floor and entered the sum.
    pub sample_count: u64,
}

/// Per-step statistics over per-pixel energy summed across components.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct InterferenceStats {
    pub mean: f32,
    pub variance: f32,
    pub max: f32,
}

/// Per-step aggregate diagnostics. Owned by the caller and filled in
/// place every step, never reallocated.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TelemetrySnapshot {
    pub order: OrderParameter,
    pub interference: InterferenceStats,
}

/// Streaming accumulator behind a step's telemetry: Welford mean and
/// variance plus max for interference, vector sum for the order
/// parameter. f64 throughout so large grids do not lose the tail.
#[derive(Debug, Default)]
pub struct TelemetryAccumulator {
    count: u64,
    mean: f64,
    m2: f64,
    max: f64,
    order_re: f64,
    order_im: f64,
    order_samples: u64,
}

impl TelemetryAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold in one site's total energy.
    pub fn add_energy(&mut self, energy: f64) {
        self.count += 1;
        let delta = energy - self.mean;
        self.mean += delta / self.count as f64;
        self.m2 += delta * (energy - self.mean);
        if energy > self.max {
            self.max = energy;
        }
    }

    /// Fold in one site's unit phase vector.
    pub fn add_order(&mut self, unit_re: f64, unit_im: f64) {
        self.order_re += unit_re;
        self.order_im += unit_im;
        self.order_samples += 1;
    }

    /// Write the aggregates into an existing snapshot.
    pub fn finish(&self, snapshot: &mut TelemetrySnapshot) {
        let (re, im) = if self.order_samples > 0 {
            (
                self.order_re / self.order_samples as f64,
                self.order_im / self.order_samples as f64,
            )
        } else {
            (0.0, 0.0)
        };
        snapshot.order = OrderParameter {
            magnitude: (re * re + im * im).sqrt() as f32,
            phase: im.atan2(re) as f32,
            real: re as f32,
            imag: im as f32,
            sample_count: self.order_samples,
        };
        snapshot.interference = InterferenceStats {
            mean: self.mean as f32,
            variance: if self.count > 0 {
                (self.m2 / self.count as f64) as f32
            } else {
                0.0
            },
            max: self.max as f32,
        };
    }
}
