use crate::cpx::Cpx;

/// 2x2 complex Jones matrix acting on a polarization pair.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct JonesMatrix {
    pub m00: Cpx,
    pub m01: Cpx,
    pub m10: Cpx,
    pub m11: Cpx,
}

impl JonesMatrix {
    pub fn identity() -> Self {
        Self {
            m00: Cpx::ONE,
            m01: Cpx::ZERO,
            m10: Cpx::ZERO,
            m11: Cpx::ONE,
        }
    }

    /// Retarder with phase delay `retardance` between fast and slow axes,
    /// fast axis rotated by `axis` radians:
    /// `R(axis) * diag(1, e^{i*retardance}) * R(-axis)`.
    pub fn wave_plate(retardance: f32, axis: f32) -> Self {
        let (c, s) = (axis.cos(), axis.sin());
        let e = Cpx::from_polar(1.0, retardance);
        let cross = (Cpx::ONE - e).scale(c * s);
        Self {
            m00: Cpx::new(c * c, 0.0) + e.scale(s * s),
            m01: cross,
            m10: cross,
            m11: Cpx::new(s * s, 0.0) + e.scale(c * c),
        }
    }

    /// Linear polarizer with amplitude extinction ratio for the blocked
    /// axis, transmission axis rotated by `axis` radians.
    pub fn polarizer(extinction: f32, axis: f32) -> Self {
        let (c, s) = (axis.cos(), axis.sin());
        let cross = (1.0 - extinction) * c * s;
        Self {
            m00: Cpx::new(c * c + extinction * s * s, 0.0),
            m01: Cpx::new(cross, 0.0),
            m10: Cpx::new(cross, 0.0),
            m11: Cpx::new(s * s + extinction * c * c, 0.0),
        }
    }

    /// Apply to a polarization pair.
    pub fn apply(&self, a: Cpx, b: Cpx) -> (Cpx, Cpx) {
        (
            self.m00 * a + self.m01 * b,
            self.m10 * a + self.m11 * b,
        )
    }
}

/// Descriptor for a polarization transform step; resolved to a Jones
/// matrix at execution time.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PolarizationSpec {
    WavePlate { retardance: f32, axis: f32 },
    Polarizer { extinction: f32, axis: f32 },
    Matrix(JonesMatrix),
}

impl PolarizationSpec {
    pub fn resolve(&self) -> JonesMatrix {
        match *self {
            PolarizationSpec::WavePlate { retardance, axis } => {
                JonesMatrix::wave_plate(retardance, axis)
            }
            PolarizationSpec::Polarizer { extinction, axis } => {
                JonesMatrix::polarizer(extinction, axis)
            }
            PolarizationSpec::Matrix(matrix) => matrix,
        }
    }
}
