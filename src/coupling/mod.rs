mod kernel;
mod smallworld;

pub use kernel::{
    compute_coupling_weight, CouplingKernel, CouplingParams, CouplingPreset, KernelCache,
    KernelTap, Normalization,
};
pub use smallworld::{RewiringCache, RewiringTable};
