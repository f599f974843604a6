use std::f32::consts::TAU;

use crate::cpx::Cpx;
use crate::error::{CoreError, CoreResult};
use crate::field::{wrap_angle, FieldBuffer};
use crate::solver::DerivedGains;

use super::jones::PolarizationSpec;
use super::views::DerivedViews;

/// Whole-field single-pass operators.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OperatorKind {
    /// Position-dependent phase rotation from the flux drive.
    Flux,
    /// Amplitude and coherence extraction into the derived views.
    Amplitude,
    /// Phase gradient and vorticity extraction into the derived views.
    Phase,
}

/// How beam-split branches are folded back together. `Priority`, `Max`
/// and `Phase` are accepted but currently recombine as a plain weighted
/// sum.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecombineMode {
    Sum,
    Average,
    Energy,
    Priority,
    Max,
    Phase,
}

/// One branch of a beam split: a weight and an independent sub-schedule.
#[derive(Clone, Debug)]
pub struct BranchSpec {
    pub weight: f32,
    pub schedule: Vec<ScheduleStep>,
}

/// One step of an operator schedule. The step set is closed; execution
/// is a single dispatch in [`OperatorPipeline::run`].
#[derive(Clone, Debug)]
pub enum ScheduleStep {
    Operator(OperatorKind),
    Polarization(PolarizationSpec),
    BeamSplit {
        branches: Vec<BranchSpec>,
        recombine: RecombineMode,
    },
}

/// In-plane drive for the flux operator and the integrator's boundary
/// phase shifts.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FluxDrive {
    pub x: f32,
    pub y: f32,
}

/// The canonical post-step schedule: flux rotates phase state first,
/// then amplitude and phase extraction read it. Callers composing their
/// own schedules must keep that ordering.
pub fn default_post_schedule() -> Vec<ScheduleStep> {
    vec![
        ScheduleStep::Operator(OperatorKind::Flux),
        ScheduleStep::Operator(OperatorKind::Amplitude),
        ScheduleStep::Operator(OperatorKind::Phase),
    ]
}

/// Sequential executor for operator schedules. Owns scratch space so
/// steady-state frames run without allocation (beam splits excepted,
/// which clone the field per branch).
#[derive(Default)]
pub struct OperatorPipeline {
    phase_scratch: Vec<f32>,
}

impl OperatorPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `schedule` over `buffer` in order, writing derived views as
    /// amplitude/phase steps are encountered.
    pub fn run(
        &mut self,
        buffer: &mut FieldBuffer,
        schedule: &[ScheduleStep],
        gains: &DerivedGains,
        drive: FluxDrive,
        views: &mut DerivedViews,
    ) -> CoreResult<()> {
        if views.texels() != buffer.texels() {
            return Err(CoreError::ViewSizeMismatch {
                views: views.texels(),
                texels: buffer.texels(),
            });
        }
        for step in schedule {
            match step {
                ScheduleStep::Operator(OperatorKind::Flux) => {
                    apply_flux(buffer, gains.flux_gain, drive);
                }
                ScheduleStep::Operator(OperatorKind::Amplitude) => {
                    apply_amplitude(buffer, gains, views);
                }
                ScheduleStep::Operator(OperatorKind::Phase) => {
                    self.apply_phase(buffer, gains, views)?;
                }
                ScheduleStep::Polarization(spec) => {
                    apply_polarization(buffer, spec);
                }
                ScheduleStep::BeamSplit {
                    branches,
                    recombine,
                } => {
                    self.apply_beam_split(buffer, branches, *recombine, gains, drive, views)?;
                }
            }
        }
        Ok(())
    }

    fn apply_phase(
        &mut self,
        buffer: &FieldBuffer,
        gains: &DerivedGains,
        views: &mut DerivedViews,
    ) -> CoreResult<()> {
        let resolution = buffer.resolution();
        let (w, h) = (resolution.width, resolution.height);
        let texels = resolution.texels();
        self.phase_scratch.resize(texels, 0.0);
        {
            let view = buffer.component(0)?;
            for idx in 0..texels {
                self.phase_scratch[idx] = view.imag[idx].atan2(view.real[idx]);
            }
        }
        let phases = &self.phase_scratch;
        let segments = views.segments_mut();
        for y in 0..h {
            let up = (y + h - 1) % h;
            let down = (y + 1) % h;
            for x in 0..w {
                let left = (x + w - 1) % w;
                let right = (x + 1) % w;
                let idx = y * w + x;
                segments.grad_x[idx] = wrap_angle(phases[y * w + right] - phases[y * w + left])
                    * 0.5
                    * gains.grad_scale;
                segments.grad_y[idx] = wrap_angle(phases[down * w + x] - phases[up * w + x])
                    * 0.5
                    * gains.grad_scale;
                // Circulation around the unit cell anchored at (x, y).
                let p00 = phases[y * w + x];
                let p10 = phases[y * w + right];
                let p11 = phases[down * w + right];
                let p01 = phases[down * w + x];
                let circulation = wrap_angle(p10 - p00)
                    + wrap_angle(p11 - p10)
                    + wrap_angle(p01 - p11)
                    + wrap_angle(p00 - p01);
                segments.vort[idx] = circulation / TAU * gains.vorticity_scale;
            }
        }
        Ok(())
    }

    fn apply_beam_split(
        &mut self,
        buffer: &mut FieldBuffer,
        branches: &[BranchSpec],
        recombine: RecombineMode,
        gains: &DerivedGains,
        drive: FluxDrive,
        views: &mut DerivedViews,
    ) -> CoreResult<()> {
        if branches.is_empty() {
            return Ok(());
        }
        let original = buffer.clone();
        let mut accumulated = vec![0.0f32; original.store().len()];
        let mut weight_sum = 0.0f32;
        let mut weight_sq_sum = 0.0f32;
        for branch in branches {
            let mut branch_buffer = original.clone();
            self.run(&mut branch_buffer, &branch.schedule, gains, drive, views)?;
            for (slot, sample) in accumulated.iter_mut().zip(branch_buffer.store()) {
                *slot += branch.weight * sample;
            }
            weight_sum += branch.weight;
            weight_sq_sum += branch.weight * branch.weight;
        }
        let norm = match recombine {
            RecombineMode::Average => {
                if weight_sum != 0.0 {
                    1.0 / weight_sum
                } else {
                    1.0
                }
            }
            RecombineMode::Energy => {
                let energy = weight_sq_sum.sqrt();
                if energy > 0.0 {
                    1.0 / energy
                } else {
                    1.0
                }
            }
            RecombineMode::Sum
            | RecombineMode::Priority
            | RecombineMode::Max
            | RecombineMode::Phase => 1.0,
        };
        for (dst, src) in buffer.store_mut().iter_mut().zip(&accumulated) {
            *dst = *src * norm;
        }
        Ok(())
    }
}

fn norm_coord(i: usize, n: usize) -> f32 {
    if n > 1 {
        2.0 * i as f32 / (n - 1) as f32 - 1.0
    } else {
        0.0
    }
}

fn apply_flux(buffer: &mut FieldBuffer, flux_gain: f32, drive: FluxDrive) {
    if drive.x == 0.0 && drive.y == 0.0 {
        return;
    }
    let resolution = buffer.resolution();
    let (w, h) = (resolution.width, resolution.height);
    let texels = resolution.texels();
    let components = buffer.component_count();
    let store = buffer.store_mut();
    for y in 0..h {
        let ny = norm_coord(y, h);
        for x in 0..w {
            let nx = norm_coord(x, w);
            let theta = flux_gain * (nx * drive.x + ny * drive.y);
            if theta == 0.0 {
                continue;
            }
            let (cos_t, sin_t) = (theta.cos(), theta.sin());
            let idx = y * w + x;
            for c in 0..components {
                let base = c * texels * 2;
                let re = store[base + idx];
                let im = store[base + texels + idx];
                store[base + idx] = re * cos_t - im * sin_t;
                store[base + texels + idx] = re * sin_t + im * cos_t;
            }
        }
    }
}

fn apply_amplitude(buffer: &FieldBuffer, gains: &DerivedGains, views: &mut DerivedViews) {
    let texels = buffer.texels();
    let components = buffer.component_count();
    let store = buffer.store();
    let segments = views.segments_mut();
    for idx in 0..texels {
        let mut energy = 0.0f32;
        for c in 0..components {
            let base = c * texels * 2;
            let re = store[base + idx];
            let im = store[base + texels + idx];
            energy += re * re + im * im;
        }
        let amp = energy.sqrt() * gains.amplitude_gain;
        segments.amp[idx] = amp;
        segments.coh[idx] = (amp * gains.transparency_gain).clamp(0.0, 1.0);
    }
}

fn apply_polarization(buffer: &mut FieldBuffer, spec: &PolarizationSpec) {
    // Polarization acts on the first two components; scalar fields pass
    // through untouched.
    if buffer.component_count() < 2 {
        return;
    }
    let texels = buffer.texels();
    let matrix = spec.resolve();
    let store = buffer.store_mut();
    let base1 = texels * 2;
    for idx in 0..texels {
        let a = Cpx::new(store[idx], store[texels + idx]);
        let b = Cpx::new(store[base1 + idx], store[base1 + texels + idx]);
        let (a2, b2) = matrix.apply(a, b);
        store[idx] = a2.re;
        store[texels + idx] = a2.im;
        store[base1 + idx] = b2.re;
        store[base1 + texels + idx] = b2.im;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::Resolution;
    use crate::optics::jones::PolarizationSpec;
    use std::f32::consts::PI;

    fn unit_field(w: usize, h: usize, components: usize) -> FieldBuffer {
        let mut buffer = FieldBuffer::new(Resolution::new(w, h), components).unwrap();
        for c in 0..components {
            let view = buffer.component_mut(c).unwrap();
            for re in view.real.iter_mut() {
                *re = 1.0;
            }
        }
        buffer
    }

    fn run_steps(buffer: &mut FieldBuffer, steps: &[ScheduleStep]) -> DerivedViews {
        let mut views = DerivedViews::new(buffer.texels());
        let mut pipeline = OperatorPipeline::new();
        pipeline
            .run(
                buffer,
                steps,
                &DerivedGains::neutral(),
                FluxDrive::default(),
                &mut views,
            )
            .unwrap();
        views
    }

    #[test]
    fn test_flux_with_zero_drive_is_noop() {
        let mut buffer = unit_field(4, 4, 1);
        let before = buffer.store().to_vec();
        let mut views = DerivedViews::new(buffer.texels());
        let mut pipeline = OperatorPipeline::new();
        pipeline
            .run(
                &mut buffer,
                &[ScheduleStep::Operator(OperatorKind::Flux)],
                &DerivedGains::neutral(),
                FluxDrive { x: 0.0, y: 0.0 },
                &mut views,
            )
            .unwrap();
        assert_eq!(buffer.store(), &before[..]);
    }

    #[test]
    fn test_flux_rotates_by_position() {
        let mut buffer = unit_field(3, 1, 1);
        let mut views = DerivedViews::new(buffer.texels());
        let mut pipeline = OperatorPipeline::new();
        pipeline
            .run(
                &mut buffer,
                &[ScheduleStep::Operator(OperatorKind::Flux)],
                &DerivedGains::neutral(),
                FluxDrive { x: 0.5, y: 0.0 },
                &mut views,
            )
            .unwrap();
        // Normalized x runs -1, 0, 1, so phases land at -0.5, 0, 0.5.
        assert!((buffer.phase_at(0, 0) + 0.5).abs() < 1e-6);
        assert!(buffer.phase_at(1, 0).abs() < 1e-6);
        assert!((buffer.phase_at(2, 0) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_amplitude_and_coherence_extraction() {
        let mut buffer = FieldBuffer::new(Resolution::new(2, 1), 2).unwrap();
        {
            let view = buffer.component_mut(0).unwrap();
            view.real[0] = 3.0;
        }
        {
            let view = buffer.component_mut(1).unwrap();
            view.imag[0] = 4.0;
        }
        let views = run_steps(&mut buffer, &[ScheduleStep::Operator(OperatorKind::Amplitude)]);
        assert!((views.amp()[0] - 5.0).abs() < 1e-5, "amp sums energy across components");
        assert_eq!(views.coh()[0], 1.0, "coherence clamps to 1");
        assert_eq!(views.amp()[1], 0.0);
        assert_eq!(views.coh()[1], 0.0);
    }

    #[test]
    fn test_phase_gradient_of_uniform_twist() {
        let w = 8;
        let mut buffer = FieldBuffer::new(Resolution::new(w, 4), 1).unwrap();
        {
            let view = buffer.component_mut(0).unwrap();
            for y in 0..4 {
                for x in 0..w {
                    let phase = TAU * x as f32 / w as f32;
                    view.real[y * w + x] = phase.cos();
                    view.imag[y * w + x] = phase.sin();
                }
            }
        }
        let views = run_steps(&mut buffer, &[ScheduleStep::Operator(OperatorKind::Phase)]);
        let expected = TAU / w as f32;
        for (idx, &g) in views.grad_x().iter().enumerate() {
            assert!(
                (g - expected).abs() < 1e-5,
                "uniform twist must give constant gradient, site {} got {}",
                idx,
                g
            );
        }
        for &v in views.vort() {
            assert!(v.abs() < 1e-5, "twist field carries no vorticity");
        }
    }

    #[test]
    fn test_vortex_core_shows_unit_circulation() {
        let n = 8;
        let mut buffer = FieldBuffer::new(Resolution::new(n, n), 1).unwrap();
        {
            let view = buffer.component_mut(0).unwrap();
            for y in 0..n {
                for x in 0..n {
                    let phase = (y as f32 - 3.5).atan2(x as f32 - 3.5);
                    view.real[y * n + x] = phase.cos();
                    view.imag[y * n + x] = phase.sin();
                }
            }
        }
        let views = run_steps(&mut buffer, &[ScheduleStep::Operator(OperatorKind::Phase)]);
        let core = views.vort()[3 * n + 3];
        assert!(
            (core - 1.0).abs() < 1e-4,
            "plaquette around the vortex core must circulate once, got {}",
            core
        );
    }

    #[test]
    fn test_polarization_noop_on_scalar_field() {
        let mut buffer = unit_field(4, 4, 1);
        let before = buffer.store().to_vec();
        run_steps(
            &mut buffer,
            &[ScheduleStep::Polarization(PolarizationSpec::WavePlate {
                retardance: PI,
                axis: 0.0,
            })],
        );
        assert_eq!(buffer.store(), &before[..]);
    }

    #[test]
    fn test_half_wave_plate_flips_second_component() {
        let mut buffer = unit_field(2, 2, 2);
        run_steps(
            &mut buffer,
            &[ScheduleStep::Polarization(PolarizationSpec::WavePlate {
                retardance: PI,
                axis: 0.0,
            })],
        );
        let first = buffer.component(0).unwrap();
        let second = buffer.component(1).unwrap();
        assert!((first.real[0] - 1.0).abs() < 1e-6);
        assert!((second.real[0] + 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_beam_split_average_of_identity_branches() {
        let mut buffer = unit_field(4, 4, 1);
        let before = buffer.store().to_vec();
        run_steps(
            &mut buffer,
            &[ScheduleStep::BeamSplit {
                branches: vec![
                    BranchSpec {
                        weight: 1.0,
                        schedule: Vec::new(),
                    },
                    BranchSpec {
                        weight: 1.0,
                        schedule: Vec::new(),
                    },
                ],
                recombine: RecombineMode::Average,
            }],
        );
        for (a, b) in buffer.store().iter().zip(&before) {
            assert!((a - b).abs() < 1e-6, "averaged identity branches must reproduce the field");
        }
    }

    #[test]
    fn test_beam_split_energy_normalization() {
        let mut buffer = unit_field(2, 2, 1);
        run_steps(
            &mut buffer,
            &[ScheduleStep::BeamSplit {
                branches: vec![
                    BranchSpec {
                        weight: 1.0,
                        schedule: Vec::new(),
                    },
                    BranchSpec {
                        weight: 1.0,
                        schedule: Vec::new(),
                    },
                ],
                recombine: RecombineMode::Energy,
            }],
        );
        let expected = 2.0 / 2.0f32.sqrt();
        assert!(
            (buffer.component(0).unwrap().real[0] - expected).abs() < 1e-6,
            "energy recombination divides by sqrt of summed squared weights"
        );
    }

    #[test]
    fn test_priority_mode_behaves_as_sum() {
        let branches = vec![
            BranchSpec {
                weight: 0.25,
                schedule: Vec::new(),
            },
            BranchSpec {
                weight: 0.5,
                schedule: Vec::new(),
            },
        ];
        let mut summed = unit_field(4, 4, 1);
        run_steps(
            &mut summed,
            &[ScheduleStep::BeamSplit {
                branches: branches.clone(),
                recombine: RecombineMode::Sum,
            }],
        );
        let mut priority = unit_field(4, 4, 1);
        run_steps(
            &mut priority,
            &[ScheduleStep::BeamSplit {
                branches,
                recombine: RecombineMode::Priority,
            }],
        );
        assert_eq!(summed.store(), priority.store());
    }

    #[test]
    fn test_view_size_mismatch_is_error() {
        let mut buffer = unit_field(4, 4, 1);
        let mut views = DerivedViews::new(9);
        let mut pipeline = OperatorPipeline::new();
        let result = pipeline.run(
            &mut buffer,
            &default_post_schedule(),
            &DerivedGains::neutral(),
            FluxDrive::default(),
            &mut views,
        );
        assert!(matches!(result, Err(CoreError::ViewSizeMismatch { .. })));
    }
}
