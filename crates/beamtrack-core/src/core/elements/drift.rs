use super::{BeamOptic, ElementError, Thick, push_reference_straight};
use crate::core::particles::{Particle, RefPart};

/// Field-free drift, linearised about the reference momentum.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Drift {
    thick: Thick,
}

impl Drift {
    pub fn new(ds: f64, nslice: usize) -> Result<Self, ElementError> {
        Ok(Self {
            thick: Thick::new("Drift", ds, nslice)?,
        })
    }
}

impl BeamOptic for Drift {
    fn name(&self) -> &'static str {
        "Drift"
    }

    fn push_particle(&self, p: &mut Particle, refpart: &RefPart) {
        let ds = self.thick.slice_ds();
        let betgam2 = refpart.pt * refpart.pt - 1.0;
        p.x += ds * p.px;
        p.y += ds * p.py;
        p.t += ds / betgam2 * p.pt;
    }

    fn push_reference(&self, refpart: &mut RefPart) {
        push_reference_straight(refpart, self.thick.slice_ds());
    }

    fn length(&self) -> f64 {
        self.thick.ds
    }

    fn nslice(&self) -> usize {
        self.thick.nslice
    }
}

/// Field-free drift with the exact energy dependence of the transverse motion.
///
/// The Hamiltonian is expanded to second order in `(px, py)` while the dependence on `pt` is
/// kept exact, so off-energy particles drift with their own velocity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChrDrift {
    thick: Thick,
}

impl ChrDrift {
    pub fn new(ds: f64, nslice: usize) -> Result<Self, ElementError> {
        Ok(Self {
            thick: Thick::new("ChrDrift", ds, nslice)?,
        })
    }
}

/// Normalised total momentum `1 + delta` of a particle with energy deviation `pt`.
#[inline]
pub(super) fn chromatic_delta1(pt: f64, beta: f64) -> f64 {
    (1.0 - 2.0 * pt / beta + pt * pt).sqrt()
}

/// Chromatic drift map for one segment, shared with the zero-gradient quadrupole.
pub(super) fn chromatic_drift(p: &mut Particle, refpart: &RefPart, ds: f64) {
    let beta = refpart.beta();
    let delta1 = chromatic_delta1(p.pt, beta);
    let delta = delta1 - 1.0;
    let transverse = p.px * p.px + p.py * p.py;

    p.x += ds * p.px / delta1;
    p.y += ds * p.py / delta1;
    p.t += -(p.pt + delta / beta) * ds / delta1
        + (1.0 / beta - p.pt) * transverse * ds / (2.0 * delta1.powi(3));
}

impl BeamOptic for ChrDrift {
    fn name(&self) -> &'static str {
        "ChrDrift"
    }

    fn push_particle(&self, p: &mut Particle, refpart: &RefPart) {
        chromatic_drift(p, refpart, self.thick.slice_ds());
    }

    fn push_reference(&self, refpart: &mut RefPart) {
        push_reference_straight(refpart, self.thick.slice_ds());
    }

    fn length(&self) -> f64 {
        self.thick.ds
    }

    fn nslice(&self) -> usize {
        self.thick.nslice
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;

    #[test]
    fn linear_drift_moves_positions_by_momentum() {
        let refpart = reference(100.0);
        let drift = Drift::new(2.0, 1).unwrap();
        let mut p = particle(1e-3, -2e-3, 0.0, 1e-4, 2e-4, 1e-3);
        drift.push_particle(&mut p, &refpart);

        let betgam2 = refpart.beta_gamma().powi(2);
        assert_close(p.x, 1e-3 + 2e-4, 1e-15);
        assert_close(p.y, -2e-3 + 4e-4, 1e-15);
        assert_close(p.t, 2.0 * 1e-3 / betgam2, 1e-15);
        assert_eq!((p.px, p.py, p.pt), (1e-4, 2e-4, 1e-3));
    }

    #[test]
    fn slices_compose_to_the_full_drift() {
        let refpart = reference(100.0);
        let whole = ChrDrift::new(1.2, 1).unwrap();
        let sliced = ChrDrift::new(1.2, 4).unwrap();

        let mut a = particle(1e-3, 1e-3, 0.0, 1e-4, -1e-4, 2e-3);
        let mut b = a;
        whole.push_particle(&mut a, &refpart);
        for _ in 0..sliced.nslice() {
            sliced.push_particle(&mut b, &refpart);
        }
        assert_close(a.x, b.x, 1e-15);
        assert_close(a.y, b.y, 1e-15);
        assert_close(a.t, b.t, 1e-14);
    }

    #[test]
    fn chromatic_drift_matches_linear_drift_near_reference_energy() {
        let refpart = reference(50.0);
        let linear = Drift::new(1.0, 1).unwrap();
        let chromatic = ChrDrift::new(1.0, 1).unwrap();

        let mut a = particle(0.0, 0.0, 0.0, 1e-5, 0.0, 1e-7);
        let mut b = a;
        linear.push_particle(&mut a, &refpart);
        chromatic.push_particle(&mut b, &refpart);
        assert_close(b.x, a.x, 1e-11);
        assert_close(b.t, a.t, 1e-10);
    }

    #[test]
    fn off_energy_particles_drift_with_scaled_slope() {
        let refpart = reference(10.0);
        let chromatic = ChrDrift::new(1.0, 1).unwrap();
        let mut p = particle(0.0, 0.0, 0.0, 1e-3, 0.0, -0.1);
        chromatic.push_particle(&mut p, &refpart);

        let delta1 = chromatic_delta1(-0.1, refpart.beta());
        assert!(delta1 > 1.0);
        assert_close(p.x, 1e-3 / delta1, 1e-15);
    }

    #[test]
    fn chromatic_drift_is_symplectic() {
        let refpart = reference(10.0);
        let chromatic = ChrDrift::new(0.7, 1).unwrap();
        let jac = jacobian(
            |p| chromatic.push_particle(p, &refpart),
            [1e-3, 2e-3, -1e-3, 5e-4, 1e-4, 0.05],
        );
        assert_symplectic(&jac, 1e-6);
    }

    #[test]
    fn reference_push_advances_s_by_slice_length() {
        let mut refpart = reference(10.0);
        let drift = Drift::new(3.0, 3).unwrap();
        for _ in 0..drift.nslice() {
            drift.push_reference(&mut refpart);
        }
        assert_close(refpart.s, 3.0, 1e-14);
    }
}
