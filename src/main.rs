//! Cross-context parity harness.
//!
//! Runs two fully independent engine stacks from the same seed and the
//! same parameter stream, then compares field stores, derived views,
//! and telemetry against the regression tolerances. This is the check a
//! worker or GPU execution context must pass against the UI-thread
//! copy: the core guarantees determinism, the harness verifies it.

use rand::rngs::StdRng;

use indra_field::config::{PARITY_AGGREGATE_TOLERANCE, PARITY_STRICT_TOLERANCE};
use indra_field::coupling::{CouplingParams, KernelCache, RewiringCache};
use indra_field::optics::{default_post_schedule, PolarizationSpec, ScheduleStep};
use indra_field::solver::{ControlState, KernelSpec};
use indra_field::{
    BoxMuller, CoreResult, DerivedGains, DerivedViews, FieldFrame, FluxDrive, FramePool,
    KuramotoParams, OperatorPipeline, OscillatorIntegrator, Resolution, StepInputs,
    TelemetrySnapshot,
};

const GRID: usize = 64;
const COMPONENTS: usize = 2;
const STEPS: usize = 120;
const SEED: u64 = 0x1D2A_F1E1D;

/// One self-contained engine stack: pool, caches, pipeline, integrator,
/// and noise stream. Two of these never share state.
struct Engine {
    pool: FramePool,
    kernels: KernelCache,
    rewiring: RewiringCache,
    pipeline: OperatorPipeline,
    integrator: OscillatorIntegrator,
    noise: BoxMuller<StdRng>,
    frame: FieldFrame,
    views: DerivedViews,
    telemetry: TelemetrySnapshot,
    schedule: Vec<ScheduleStep>,
}

impl Engine {
    fn new(seed: u64) -> CoreResult<Self> {
        let resolution = Resolution::new(GRID, GRID);
        let mut pool = FramePool::new(resolution, COMPONENTS);
        let mut frame = pool.acquire(None)?;
        indra_field::solver::seed_twist(frame.buffer_mut(), 1.0);
        let mut schedule = default_post_schedule();
        schedule.insert(
            1,
            ScheduleStep::Polarization(PolarizationSpec::WavePlate {
                retardance: 0.35,
                axis: 0.2,
            }),
        );
        Ok(Self {
            pool,
            kernels: KernelCache::new(),
            rewiring: RewiringCache::new(),
            pipeline: OperatorPipeline::new(),
            integrator: OscillatorIntegrator::new(),
            noise: BoxMuller::seeded(seed),
            frame,
            views: DerivedViews::new(resolution.texels()),
            telemetry: TelemetrySnapshot::default(),
            schedule,
        })
    }

    /// Advance one frame with the shared deterministic parameter stream.
    fn step(&mut self, index: usize) -> CoreResult<()> {
        let params = KuramotoParams {
            eps: 0.002,
            flux_x: 0.15,
            flux_y: -0.05,
            small_world_weight: 0.1,
            small_world_degree: 4,
            small_world_seed: 2024,
            ..KuramotoParams::default()
        };
        let spec = KernelSpec {
            anisotropy: 0.2,
            chirality: 0.1,
            ..KernelSpec::default()
        };
        let controls = ControlState {
            dmt: 0.3,
            arousal: 0.5,
        };
        let gains = DerivedGains::derive(&spec, &controls);
        let kernel = self
            .kernels
            .resolve(&CouplingParams::preset(spec.coupling_preset));
        let rewiring = self.rewiring.resolve(
            GRID,
            GRID,
            params.small_world_degree,
            params.small_world_seed,
        );
        let dt = 1.0 / 60.0;
        let inputs = StepInputs {
            params: &params,
            kernel: &kernel,
            rewiring: rewiring.as_deref(),
            gains: &gains,
            dt,
            timestamp: (index + 1) as f64 * dt as f64,
        };
        self.integrator.step(
            &mut self.pool,
            &mut self.frame,
            &inputs,
            &mut self.noise,
            &mut self.telemetry,
        )?;
        self.pipeline.run(
            self.frame.buffer_mut(),
            &self.schedule,
            &gains,
            FluxDrive {
                x: params.flux_x,
                y: params.flux_y,
            },
            &mut self.views,
        )?;
        Ok(())
    }
}

fn max_abs_diff(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y).abs())
        .fold(0.0f32, f32::max)
}

fn main() {
    env_logger::init();

    log::info!("parity harness: {}x{} grid, {} components, {} steps", GRID, GRID, COMPONENTS, STEPS);

    let mut primary = Engine::new(SEED).expect("failed to build primary engine");
    let mut shadow = Engine::new(SEED).expect("failed to build shadow engine");

    let mut worst_field = 0.0f32;
    let mut worst_views = 0.0f32;
    for index in 0..STEPS {
        primary.step(index).expect("primary step failed");
        shadow.step(index).expect("shadow step failed");

        let field_diff = max_abs_diff(primary.frame.buffer().store(), shadow.frame.buffer().store());
        let views_diff = max_abs_diff(primary.views.as_slice(), shadow.views.as_slice());
        worst_field = worst_field.max(field_diff);
        worst_views = worst_views.max(views_diff);

        if primary.telemetry != shadow.telemetry {
            log::warn!("step {}: telemetry snapshots differ", index);
        }
        if field_diff > PARITY_AGGREGATE_TOLERANCE || views_diff > PARITY_AGGREGATE_TOLERANCE {
            log::warn!(
                "step {}: divergence beyond aggregate tolerance (field {}, views {})",
                index,
                field_diff,
                views_diff
            );
            std::process::exit(1);
        }
    }

    let order = primary.telemetry.order;
    log::info!(
        "final order parameter: r = {:.4}, psi = {:.4}, {} sites",
        order.magnitude,
        order.phase,
        order.sample_count
    );
    log::info!(
        "parity ok: worst field delta {:.3e}, worst view delta {:.3e} (strict bound {:.0e})",
        worst_field,
        worst_views,
        PARITY_STRICT_TOLERANCE
    );
    if worst_field > PARITY_STRICT_TOLERANCE || worst_views > PARITY_STRICT_TOLERANCE {
        log::info!("within aggregate tolerance but outside strict regression bound");
    }
}
