use crate::coupling::CouplingPreset;

/// Kernel specification supplied by the orchestrator each step. Drives
/// both the coupling preset selection and the derived operator gains.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct KernelSpec {
    pub gain: f32,
    pub k0: f32,
    pub q: f32,
    pub anisotropy: f32,
    pub chirality: f32,
    pub transparency: f32,
    pub coupling_preset: CouplingPreset,
}

impl Default for KernelSpec {
    fn default() -> Self {
        Self {
            gain: 1.0,
            k0: 1.0,
            q: 1.0,
            anisotropy: 0.0,
            chirality: 0.0,
            transparency: 1.0,
            coupling_preset: CouplingPreset::MexicanHat,
        }
    }
}

/// External control state modulating the per-step gains.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ControlState {
    pub dmt: f32,
    pub arousal: f32,
}

/// Per-step gains derived from the kernel spec and control state, read
/// by the thin-element operators and the integrator's coupling term.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DerivedGains {
    pub flux_gain: f32,
    pub amplitude_gain: f32,
    pub transparency_gain: f32,
    pub grad_scale: f32,
    pub vorticity_scale: f32,
    pub phase_gain: f32,
    pub anisotropy: f32,
}

impl DerivedGains {
    /// Monotone multiplicative derivation: `dmt` widens transparency and
    /// the coupling phase gain, `arousal` widens amplitude, `chirality`
    /// skews the flux drive, `k0` sets the gradient scale, `q` the
    /// vorticity scale. All gains are 1 for a default spec at rest.
    pub fn derive(spec: &KernelSpec, controls: &ControlState) -> Self {
        let excitation = 1.0 + 0.6 * controls.dmt;
        let drive = 1.0 + 0.4 * controls.arousal;
        Self {
            flux_gain: spec.gain * spec.k0 * (1.0 + 0.5 * spec.chirality),
            amplitude_gain: spec.gain * drive,
            transparency_gain: spec.transparency * excitation,
            grad_scale: if spec.k0 > 0.0 { 1.0 / spec.k0 } else { 1.0 },
            vorticity_scale: spec.q,
            phase_gain: spec.gain * excitation,
            anisotropy: spec.anisotropy,
        }
    }

    /// Unit gains, zero anisotropy. Used by tests and the parity harness
    /// where gain shaping is not under test.
    pub fn neutral() -> Self {
        Self {
            flux_gain: 1.0,
            amplitude_gain: 1.0,
            transparency_gain: 1.0,
            grad_scale: 1.0,
            vorticity_scale: 1.0,
            phase_gain: 1.0,
            anisotropy: 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_spec_at_rest_is_neutral() {
        let gains = DerivedGains::derive(&KernelSpec::default(), &ControlState::default());
        assert_eq!(gains, DerivedGains::neutral());
    }

    #[test]
    fn test_controls_widen_gains_monotonically() {
        let spec = KernelSpec::default();
        let calm = DerivedGains::derive(&spec, &ControlState::default());
        let lifted = DerivedGains::derive(
            &spec,
            &ControlState {
                dmt: 1.0,
                arousal: 1.0,
            },
        );
        assert!(lifted.transparency_gain > calm.transparency_gain);
        assert!(lifted.amplitude_gain > calm.amplitude_gain);
        assert!(lifted.phase_gain > calm.phase_gain);
    }

    #[test]
    fn test_anisotropy_passes_through() {
        let spec = KernelSpec {
            anisotropy: 0.4,
            ..KernelSpec::default()
        };
        let gains = DerivedGains::derive(&spec, &ControlState::default());
        assert_eq!(gains.anisotropy, 0.4);
    }
}
