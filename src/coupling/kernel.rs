use std::collections::HashMap;
use std::sync::Arc;

use crate::config::{KERNEL_RADIUS_SLACK, KERNEL_WEIGHT_EPSILON};

/// Named radial-profile presets. The preset participates in the cache key
/// and supplies default parameters; the weight law is the same for all.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CouplingPreset {
    /// Inhibitory center, excitatory ring.
    Halo,
    /// Excitatory center, inhibitory surround (difference of Gaussians).
    MexicanHat,
    /// Wide shallow excitation with a small uniform floor.
    Broadband,
}

/// Weight normalization applied after the table is built.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Normalization {
    None,
    /// Rescale self-weight and all taps so the sum of |weight| is 1.
    L1,
}

/// Parameters of the difference-of-Gaussians coupling profile.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CouplingParams {
    pub preset: CouplingPreset,
    pub radius: f32,
    pub near_gain: f32,
    pub near_sigma: f32,
    pub far_gain: f32,
    pub far_sigma: f32,
    pub base_gain: f32,
    pub normalization: Normalization,
}

impl CouplingParams {
    /// Default parameter set for a preset.
    pub fn preset(preset: CouplingPreset) -> Self {
        match preset {
            CouplingPreset::Halo => Self {
                preset,
                radius: 6.0,
                near_gain: 1.0,
                near_sigma: 1.5,
                far_gain: 0.9,
                far_sigma: 3.5,
                base_gain: 0.0,
                normalization: Normalization::L1,
            },
            CouplingPreset::MexicanHat => Self {
                preset,
                radius: 4.0,
                near_gain: 1.0,
                near_sigma: 0.9,
                far_gain: 1.6,
                far_sigma: 2.2,
                base_gain: 0.0,
                normalization: Normalization::L1,
            },
            CouplingPreset::Broadband => Self {
                preset,
                radius: 3.0,
                near_gain: 0.0,
                near_sigma: 1.0,
                far_gain: 1.0,
                far_sigma: 2.0,
                base_gain: 0.05,
                normalization: Normalization::L1,
            },
        }
    }
}

/// Coupling weight at Euclidean distance `d`. Zero beyond the radius and
/// for non-finite distances; each Gaussian term is zero when its gain is
/// zero or its sigma is non-positive.
pub fn compute_coupling_weight(d: f32, params: &CouplingParams) -> f32 {
    if !d.is_finite() || d > params.radius {
        return 0.0;
    }
    params.base_gain + gaussian_term(d, params.far_gain, params.far_sigma)
        - gaussian_term(d, params.near_gain, params.near_sigma)
}

fn gaussian_term(d: f32, gain: f32, sigma: f32) -> f32 {
    if gain == 0.0 || sigma <= 0.0 {
        return 0.0;
    }
    let ratio = d / sigma;
    gain * (-0.5 * ratio * ratio).exp()
}

/// One off-site coupling tap.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct KernelTap {
    pub dx: i32,
    pub dy: i32,
    pub weight: f32,
    /// `(dx^2 - dy^2) / (dx^2 + dy^2)`, for anisotropic weighting.
    pub orientation: f32,
}

/// Built coupling stencil: on-site self weight plus pruned offset taps.
/// Immutable once built; shared via `Arc` from the cache.
#[derive(Clone, Debug)]
pub struct CouplingKernel {
    pub self_weight: f32,
    pub taps: Vec<KernelTap>,
}

impl CouplingKernel {
    /// Enumerate integer offsets within `floor(radius)`, keep those with
    /// Euclidean distance within the radius (plus slack) and weight
    /// magnitude at or above the pruning epsilon, then normalize.
    pub fn build(params: &CouplingParams) -> Self {
        let span = if params.radius.is_finite() && params.radius > 0.0 {
            params.radius.floor() as i32
        } else {
            0
        };
        let mut taps = Vec::new();
        for dy in -span..=span {
            for dx in -span..=span {
                if dx == 0 && dy == 0 {
                    continue;
                }
                let d = ((dx * dx + dy * dy) as f32).sqrt();
                if d > params.radius + KERNEL_RADIUS_SLACK {
                    continue;
                }
                let weight = compute_coupling_weight(d, params);
                if weight.abs() < KERNEL_WEIGHT_EPSILON {
                    continue;
                }
                let r2 = (dx * dx + dy * dy) as f32;
                taps.push(KernelTap {
                    dx,
                    dy,
                    weight,
                    orientation: ((dx * dx - dy * dy) as f32) / r2,
                });
            }
        }
        let mut self_weight = compute_coupling_weight(0.0, params);
        if params.normalization == Normalization::L1 {
            let total: f32 =
                self_weight.abs() + taps.iter().map(|t| t.weight.abs()).sum::<f32>();
            if total > 0.0 {
                let scale = 1.0 / total;
                self_weight *= scale;
                for tap in &mut taps {
                    tap.weight *= scale;
                }
            }
        }
        Self { self_weight, taps }
    }
}

/// Cache key packing every float through its bit pattern so identical
/// parameter tuples hash and compare exactly.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
struct KernelKey {
    preset: CouplingPreset,
    radius: u32,
    near_gain: u32,
    near_sigma: u32,
    far_gain: u32,
    far_sigma: u32,
    base_gain: u32,
    normalization: Normalization,
}

impl KernelKey {
    fn of(params: &CouplingParams) -> Self {
        Self {
            preset: params.preset,
            radius: params.radius.to_bits(),
            near_gain: params.near_gain.to_bits(),
            near_sigma: params.near_sigma.to_bits(),
            far_gain: params.far_gain.to_bits(),
            far_sigma: params.far_sigma.to_bits(),
            base_gain: params.base_gain.to_bits(),
            normalization: params.normalization,
        }
    }
}

/// Memoizing kernel cache. Identical parameters always return the same
/// shared table, avoiding redundant O(radius^2) rebuilds. Unbounded; see
/// DESIGN.md for the eviction open question.
#[derive(Default)]
pub struct KernelCache {
    entries: HashMap<KernelKey, Arc<CouplingKernel>>,
}

impl KernelCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch or build the kernel table for `params`.
    pub fn resolve(&mut self, params: &CouplingParams) -> Arc<CouplingKernel> {
        let key = KernelKey::of(params);
        self.entries
            .entry(key)
            .or_insert_with(|| {
                let kernel = CouplingKernel::build(params);
                log::debug!(
                    "kernel cache: built {:?} radius {} with {} taps",
                    params.preset,
                    params.radius,
                    kernel.taps.len()
                );
                Arc::new(kernel)
            })
            .clone()
    }

    /// Number of distinct parameter tuples built so far.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
