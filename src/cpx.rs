use std::ops::{Add, Mul, Sub};

/// Complex scalar over `f32`, matching the field store's sample type.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Cpx {
    pub re: f32,
    pub im: f32,
}

impl Cpx {
    pub const ZERO: Cpx = Cpx { re: 0.0, im: 0.0 };
    pub const ONE: Cpx = Cpx { re: 1.0, im: 0.0 };

    pub fn new(re: f32, im: f32) -> Self {
        Self { re, im }
    }

    /// Unit-magnitude phasor `e^{i*phase}` scaled by `mag`.
    pub fn from_polar(mag: f32, phase: f32) -> Self {
        Self {
            re: mag * phase.cos(),
            im: mag * phase.sin(),
        }
    }

    pub fn conj(self) -> Self {
        Self {
            re: self.re,
            im: -self.im,
        }
    }

    pub fn scale(self, s: f32) -> Self {
        Self {
            re: self.re * s,
            im: self.im * s,
        }
    }

    /// Squared magnitude `|z|^2`.
    pub fn norm_sq(self) -> f32 {
        self.re * self.re + self.im * self.im
    }
}

impl Add for Cpx {
    type Output = Cpx;

    fn add(self, rhs: Cpx) -> Cpx {
        Cpx::new(self.re + rhs.re, self.im + rhs.im)
    }
}

impl Sub for Cpx {
    type Output = Cpx;

    fn sub(self, rhs: Cpx) -> Cpx {
        Cpx::new(self.re - rhs.re, self.im - rhs.im)
    }
}

impl Mul for Cpx {
    type Output = Cpx;

    fn mul(self, rhs: Cpx) -> Cpx {
        Cpx::new(
            self.re * rhs.re - self.im * rhs.im,
            self.re * rhs.im + self.im * rhs.re,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn test_multiplication_rotates() {
        let z = Cpx::new(1.0, 0.0);
        let quarter = Cpx::from_polar(1.0, FRAC_PI_2);
        let rotated = z * quarter;
        assert!(rotated.re.abs() < 1e-6);
        assert!((rotated.im - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_conjugate_squares_to_norm() {
        let z = Cpx::new(3.0, -4.0);
        let n = z * z.conj();
        assert!((n.re - 25.0).abs() < 1e-4);
        assert!(n.im.abs() < 1e-4);
        assert_eq!(z.norm_sq(), 25.0);
    }
}
