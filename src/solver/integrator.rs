use std::f32::consts::TAU;

use crate::config::ORDER_ENERGY_FLOOR;
use crate::coupling::{CouplingKernel, RewiringTable};
use crate::cpx::Cpx;
use crate::error::CoreResult;
use crate::field::{FieldBuffer, FieldFrame, FrameMetadata, FramePool, StampOptions};

use super::gains::DerivedGains;
use super::rng::NoiseSource;
use super::telemetry::{TelemetryAccumulator, TelemetrySnapshot};

/// Per-step integration parameters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct KuramotoParams {
    /// Phase lag applied to the coupling field.
    pub alpha: f32,
    /// Amplitude damping.
    pub gamma: f32,
    /// Natural frequency.
    pub omega0: f32,
    /// Coupling strength.
    pub k0: f32,
    /// Noise variance rate.
    pub eps: f32,
    /// Boundary flux drive, radians per x-wrap.
    pub flux_x: f32,
    /// Boundary flux drive, radians per y-wrap.
    pub flux_y: f32,
    /// Blend factor for long-range contributions; 0 disables the blend
    /// even when a rewiring table is supplied.
    pub small_world_weight: f32,
    /// Rewiring degree; 0 disables the feature at the cache level.
    pub small_world_degree: u32,
    pub small_world_seed: u32,
}

impl Default for KuramotoParams {
    fn default() -> Self {
        Self {
            alpha: 0.0,
            gamma: 0.1,
            omega0: 0.2,
            k0: 0.8,
            eps: 0.0,
            flux_x: 0.0,
            flux_y: 0.0,
            small_world_weight: 0.0,
            small_world_degree: 0,
            small_world_seed: 0,
        }
    }
}

/// Everything one step reads besides the frame itself: parameters, the
/// resolved coupling tables, and the derived gains.
pub struct StepInputs<'a> {
    pub params: &'a KuramotoParams,
    pub kernel: &'a CouplingKernel,
    pub rewiring: Option<&'a RewiringTable>,
    pub gains: &'a DerivedGains,
    pub dt: f32,
    pub timestamp: f64,
}

/// Fixed-step in-place integrator for the coupled oscillator field.
///
/// Each call advances the whole grid exactly once. All neighbor reads
/// are of the previous step's state, held in an integrator-owned scratch
/// copy, so traversal order carries no dependency.
#[derive(Default)]
pub struct OscillatorIntegrator {
    prev: Vec<f32>,
}

impl OscillatorIntegrator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance `frame` by one step, fill `telemetry` in place, and stamp
    /// the frame with the new timestamp and dt. Returns the fresh
    /// metadata.
    pub fn step<N: NoiseSource>(
        &mut self,
        pool: &mut FramePool,
        frame: &mut FieldFrame,
        inputs: &StepInputs<'_>,
        noise: &mut N,
        telemetry: &mut TelemetrySnapshot,
    ) -> CoreResult<FrameMetadata> {
        let resolution = frame.buffer().resolution();
        let (w, h) = (resolution.width, resolution.height);
        let texels = resolution.texels();
        let components = frame.buffer().component_count();

        self.prev.clear();
        self.prev.extend_from_slice(frame.buffer().store());
        let prev = &self.prev;

        let params = inputs.params;
        let kernel = inputs.kernel;
        let dt = inputs.dt;
        let noise_scale = (dt * params.eps).max(0.0).sqrt();
        let lag = Cpx::from_polar(1.0, params.alpha);
        let coupling_gain = 0.5 * params.k0 * inputs.gains.phase_gain;
        let anisotropy = inputs.gains.anisotropy;

        let mut acc = TelemetryAccumulator::new();
        {
            let store = frame.buffer_mut().store_mut();
            for y in 0..h {
                for x in 0..w {
                    let site = y * w + x;
                    let mut site_energy = 0.0f64;
                    for c in 0..components {
                        let base = c * texels * 2;
                        let z = Cpx::new(prev[base + site], prev[base + texels + site]);

                        let mut coupled = z.scale(kernel.self_weight);
                        for tap in &kernel.taps {
                            let (nx, wx) = wrap_offset(x, tap.dx, w);
                            let (ny, wy) = wrap_offset(y, tap.dy, h);
                            let neighbor = ny * w + nx;
                            let mut zn =
                                Cpx::new(prev[base + neighbor], prev[base + texels + neighbor]);
                            if wx != 0 || wy != 0 {
                                // Twisted boundary: each wrap picks up the
                                // flux drive as a phase.
                                let shift =
                                    params.flux_x * wx as f32 + params.flux_y * wy as f32;
                                if shift != 0.0 {
                                    zn = zn * Cpx::from_polar(1.0, shift);
                                }
                            }
                            let weight =
                                tap.weight * (1.0 + anisotropy * tap.orientation);
                            coupled = coupled + zn.scale(weight);
                        }

                        if let Some(table) = inputs.rewiring {
                            if params.small_world_weight != 0.0 {
                                let targets = table.targets_for(site);
                                let mut long_range = Cpx::ZERO;
                                for &target in targets {
                                    let t = target as usize;
                                    long_range = long_range
                                        + Cpx::new(prev[base + t], prev[base + texels + t]);
                                }
                                coupled = coupled
                                    + long_range
                                        .scale(params.small_world_weight / targets.len() as f32);
                            }
                        }

                        let z2 = z * z;
                        let h1 = lag * coupled;
                        let h2 = lag * (z2 * coupled.conj());
                        let spin = Cpx::new(-z.im, z.re);
                        let dz = z.scale(-params.gamma)
                            + spin.scale(params.omega0)
                            + (h1 - h2).scale(coupling_gain);
                        let kick = Cpx::new(noise.randn(), noise.randn()).scale(noise_scale);
                        let z_next = z + dz.scale(dt) + kick;

                        store[base + site] = z_next.re;
                        store[base + texels + site] = z_next.im;

                        let energy = z_next.norm_sq();
                        site_energy += energy as f64;
                        if c == 0 && energy > ORDER_ENERGY_FLOOR {
                            let magnitude = (energy as f64).sqrt();
                            acc.add_order(
                                z_next.re as f64 / magnitude,
                                z_next.im as f64 / magnitude,
                            );
                        }
                    }
                    acc.add_energy(site_energy);
                }
            }
        }
        acc.finish(telemetry);

        pool.stamp(frame, StampOptions::timing(inputs.timestamp, dt))?;
        Ok(frame.metadata().clone())
    }
}

/// Toroidal index step: wrapped coordinate plus the signed number of
/// boundary crossings.
fn wrap_offset(i: usize, delta: i32, n: usize) -> (usize, i32) {
    let n = n as i32;
    let raw = i as i32 + delta;
    let wrapped = raw.rem_euclid(n);
    ((wrapped as usize), (raw - wrapped) / n)
}

/// Seed every component with a phase twist of winding number `q` along
/// x: `real = cos(2pi q x / width)`, `imag = sin(2pi q x / width)`.
pub fn seed_twist(buffer: &mut FieldBuffer, q: f32) {
    let resolution = buffer.resolution();
    let (w, h) = (resolution.width, resolution.height);
    let texels = resolution.texels();
    let components = buffer.component_count();
    let store = buffer.store_mut();
    for y in 0..h {
        for x in 0..w {
            let phase = TAU * q * x as f32 / w as f32;
            let (re, im) = (phase.cos(), phase.sin());
            let idx = y * w + x;
            for c in 0..components {
                let base = c * texels * 2;
                store[base + idx] = re;
                store[base + texels + idx] = im;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coupling::{CouplingParams, CouplingPreset, KernelCache, RewiringCache};
    use crate::field::Resolution;
    use crate::solver::rng::BoxMuller;
    use std::f32::consts::FRAC_PI_2;

    struct Rig {
        pool: FramePool,
        kernels: KernelCache,
        rewiring: RewiringCache,
        integrator: OscillatorIntegrator,
        noise: BoxMuller<rand::rngs::StdRng>,
    }

    fn rig(seed: u64) -> Rig {
        Rig {
            pool: FramePool::new(Resolution::new(8, 8), 1),
            kernels: KernelCache::new(),
            rewiring: RewiringCache::new(),
            integrator: OscillatorIntegrator::new(),
            noise: BoxMuller::seeded(seed),
        }
    }

    fn run_steps(rig: &mut Rig, params: &KuramotoParams, steps: usize) -> (Vec<f32>, TelemetrySnapshot) {
        let mut frame = rig.pool.acquire(None).unwrap();
        seed_twist(frame.buffer_mut(), 1.0);
        let kernel = rig
            .kernels
            .resolve(&CouplingParams::preset(CouplingPreset::MexicanHat));
        let rewiring = rig.rewiring.resolve(
            8,
            8,
            params.small_world_degree,
            params.small_world_seed,
        );
        let gains = DerivedGains::neutral();
        let mut telemetry = TelemetrySnapshot::default();
        for i in 0..steps {
            let inputs = StepInputs {
                params,
                kernel: &kernel,
                rewiring: rewiring.as_deref(),
                gains: &gains,
                dt: 1.0 / 60.0,
                timestamp: (i + 1) as f64 / 60.0,
            };
            rig.integrator
                .step(&mut rig.pool, &mut frame, &inputs, &mut rig.noise, &mut telemetry)
                .unwrap();
        }
        let out = frame.buffer().store().to_vec();
        rig.pool.release(frame).unwrap();
        (out, telemetry)
    }

    #[test]
    fn test_twist_seed_phase_scenario() {
        let mut buffer = FieldBuffer::new(Resolution::new(4, 4), 1).unwrap();
        seed_twist(&mut buffer, 1.0);
        for y in 0..4 {
            let phase = buffer.phase_at(y * 4 + 1, 0);
            assert!(
                (phase - FRAC_PI_2).abs() < 1e-6,
                "x=1 of a q=1 twist must sit at pi/2, row {} got {}",
                y,
                phase
            );
        }
    }

    #[test]
    fn test_two_instances_agree_exactly() {
        let params = KuramotoParams {
            eps: 0.01,
            flux_x: 0.3,
            small_world_weight: 0.2,
            small_world_degree: 4,
            small_world_seed: 11,
            ..KuramotoParams::default()
        };
        let (a, ta) = run_steps(&mut rig(99), &params, 5);
        let (b, tb) = run_steps(&mut rig(99), &params, 5);
        assert_eq!(a, b, "same seed and inputs must be bit-identical");
        assert_eq!(ta, tb);
    }

    #[test]
    fn test_different_noise_seeds_diverge() {
        let params = KuramotoParams {
            eps: 0.05,
            ..KuramotoParams::default()
        };
        let (a, _) = run_steps(&mut rig(1), &params, 3);
        let (b, _) = run_steps(&mut rig(2), &params, 3);
        assert_ne!(a, b, "noise seeds must actually enter the field");
    }

    #[test]
    fn test_synchronized_field_reports_high_order() {
        let mut rig = rig(5);
        let mut frame = rig.pool.acquire(None).unwrap();
        // Uniform phase, no dynamics: order parameter must be ~1.
        {
            let view = frame.buffer_mut().component_mut(0).unwrap();
            for re in view.real.iter_mut() {
                *re = 1.0;
            }
        }
        let kernel = rig.kernels.resolve(&CouplingParams {
            radius: 0.0,
            normalization: crate::coupling::Normalization::None,
            base_gain: 0.0,
            near_gain: 0.0,
            far_gain: 0.0,
            ..CouplingParams::preset(CouplingPreset::Broadband)
        });
        let params = KuramotoParams {
            gamma: 0.0,
            omega0: 0.0,
            k0: 0.0,
            ..KuramotoParams::default()
        };
        let gains = DerivedGains::neutral();
        let mut telemetry = TelemetrySnapshot::default();
        let inputs = StepInputs {
            params: &params,
            kernel: &kernel,
            rewiring: None,
            gains: &gains,
            dt: 0.01,
            timestamp: 0.01,
        };
        rig.integrator
            .step(&mut rig.pool, &mut frame, &inputs, &mut rig.noise, &mut telemetry)
            .unwrap();
        assert!(
            (telemetry.order.magnitude - 1.0).abs() < 1e-5,
            "uniform field must be fully synchronized, got {}",
            telemetry.order.magnitude
        );
        assert_eq!(telemetry.order.sample_count, 64);
        assert!((telemetry.interference.mean - 1.0).abs() < 1e-5);
        assert!(telemetry.interference.variance < 1e-8);
        rig.pool.release(frame).unwrap();
    }

    #[test]
    fn test_dead_sites_stay_out_of_order_sum() {
        let mut rig = rig(6);
        let mut frame = rig.pool.acquire(None).unwrap();
        let kernel = rig
            .kernels
            .resolve(&CouplingParams::preset(CouplingPreset::MexicanHat));
        let params = KuramotoParams {
            gamma: 0.0,
            omega0: 0.0,
            k0: 0.0,
            eps: 0.0,
            ..KuramotoParams::default()
        };
        let gains = DerivedGains::neutral();
        let mut telemetry = TelemetrySnapshot::default();
        let inputs = StepInputs {
            params: &params,
            kernel: &kernel,
            rewiring: None,
            gains: &gains,
            dt: 0.01,
            timestamp: 0.01,
        };
        rig.integrator
            .step(&mut rig.pool, &mut frame, &inputs, &mut rig.noise, &mut telemetry)
            .unwrap();
        assert_eq!(
            telemetry.order.sample_count, 0,
            "an all-zero field has no sites above the energy floor"
        );
        assert_eq!(telemetry.order.magnitude, 0.0);
        rig.pool.release(frame).unwrap();
    }

    #[test]
    fn test_step_stamps_fresh_metadata() {
        let mut rig = rig(7);
        let mut frame = rig.pool.acquire(None).unwrap();
        let first_id = frame.metadata().frame_id;
        let kernel = rig
            .kernels
            .resolve(&CouplingParams::preset(CouplingPreset::MexicanHat));
        let params = KuramotoParams::default();
        let gains = DerivedGains::neutral();
        let mut telemetry = TelemetrySnapshot::default();
        let inputs = StepInputs {
            params: &params,
            kernel: &kernel,
            rewiring: None,
            gains: &gains,
            dt: 0.25,
            timestamp: 12.5,
        };
        let metadata = rig
            .integrator
            .step(&mut rig.pool, &mut frame, &inputs, &mut rig.noise, &mut telemetry)
            .unwrap();
        assert_eq!(metadata.frame_id, first_id + 1);
        assert_eq!(metadata.dt, 0.25);
        assert_eq!(metadata.timestamp, 12.5);
        rig.pool.release(frame).unwrap();
    }

    #[test]
    fn test_wrap_offset_tracks_crossings() {
        assert_eq!(wrap_offset(3, 1, 4), (0, 1));
        assert_eq!(wrap_offset(0, -1, 4), (3, -1));
        assert_eq!(wrap_offset(1, 2, 4), (3, 0));
        assert_eq!(wrap_offset(0, -5, 4), (3, -2));
    }
}
