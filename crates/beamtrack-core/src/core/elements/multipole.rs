use super::{BeamOptic, ElementError, check_finite};
use crate::core::particles::{Particle, RefPart};
use num_complex::Complex;

/// Thin multipole kick of order `m` (1 dipole, 2 quadrupole, 3 sextupole, ...).
///
/// `k_normal` and `k_skew` are the integrated strengths in 1/m^(m-1).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Multipole {
    multipole: u32,
    k_normal: f64,
    k_skew: f64,
    factorial: f64,
}

impl Multipole {
    pub fn new(multipole: u32, k_normal: f64, k_skew: f64) -> Result<Self, ElementError> {
        if multipole == 0 {
            return Err(ElementError::InvalidMultipoleIndex(multipole));
        }
        let factorial = (1..multipole).map(f64::from).product();
        Ok(Self {
            multipole,
            k_normal: check_finite("Multipole", "k_normal", k_normal)?,
            k_skew: check_finite("Multipole", "k_skew", k_skew)?,
            factorial,
        })
    }

    pub fn order(&self) -> u32 {
        self.multipole
    }
}

impl BeamOptic for Multipole {
    fn name(&self) -> &'static str {
        "Multipole"
    }

    fn push_particle(&self, p: &mut Particle, _refpart: &RefPart) {
        let zeta = Complex::new(p.x, p.y);
        let strength = Complex::new(self.k_normal, self.k_skew);
        let kick = strength * zeta.powu(self.multipole - 1);
        p.px -= kick.re / self.factorial;
        p.py += kick.im / self.factorial;
    }

    fn push_reference(&self, _refpart: &mut RefPart) {}
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;

    #[test]
    fn index_zero_is_rejected() {
        assert_eq!(
            Multipole::new(0, 1.0, 0.0),
            Err(ElementError::InvalidMultipoleIndex(0))
        );
    }

    #[test]
    fn normal_quadrupole_kick_is_linear() {
        let refpart = reference(10.0);
        let quad = Multipole::new(2, 3.0, 0.0).unwrap();
        let mut p = particle(1e-3, 2e-3, 0.5, 1e-4, 0.0, 0.1);
        quad.push_particle(&mut p, &refpart);

        assert_close(p.px, 1e-4 - 3.0 * 1e-3, 1e-16);
        assert_close(p.py, 3.0 * 2e-3, 1e-16);
        assert_eq!((p.x, p.y, p.t, p.pt), (1e-3, 2e-3, 0.5, 0.1));
    }

    #[test]
    fn sextupole_kick_divides_by_factorial() {
        let refpart = reference(10.0);
        let sext = Multipole::new(3, 2.0, 0.0).unwrap();
        let mut p = particle(0.1, 0.2, 0.0, 0.0, 0.0, 0.0);
        sext.push_particle(&mut p, &refpart);

        // K (x + iy)^2 / 2! = (x^2 - y^2) + 2ixy for K = 2
        assert_close(p.px, -(0.01 - 0.04), 1e-16);
        assert_close(p.py, 2.0 * 0.1 * 0.2, 1e-16);
    }

    #[test]
    fn skew_dipole_kicks_vertically() {
        let refpart = reference(10.0);
        let dipole = Multipole::new(1, 0.0, 1e-3).unwrap();
        let mut p = particle(0.3, -0.4, 0.0, 0.0, 0.0, 0.0);
        dipole.push_particle(&mut p, &refpart);
        assert_close(p.px, 0.0, 1e-18);
        assert_close(p.py, 1e-3, 1e-18);
    }

    #[test]
    fn reference_is_not_moved() {
        let mut refpart = reference(10.0);
        let before = refpart;
        Multipole::new(4, 1.0, 1.0)
            .unwrap()
            .push_reference(&mut refpart);
        assert_eq!(refpart, before);
    }

    #[test]
    fn octupole_kick_is_symplectic() {
        let refpart = reference(10.0);
        let octupole = Multipole::new(4, 50.0, -20.0).unwrap();
        let jac = jacobian(
            |p| octupole.push_particle(p, &refpart),
            [2e-2, 1e-3, -1e-2, 2e-3, 0.0, 0.0],
        );
        assert_symplectic(&jac, 1e-6);
    }
}
