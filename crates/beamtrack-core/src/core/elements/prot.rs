use super::{BeamOptic, ElementError, check_finite};
use crate::core::constants::DEGREE_TO_RADIAN;
use crate::core::particles::{Particle, RefPart};

/// Exact rotation of the reference frame in the horizontal plane.
///
/// `phi_in` and `phi_out` are the angles of the reference trajectory, in degrees, before and after
/// the rotation; only their difference moves particles, while `phi_in` fixes the frame the
/// incoming momenta are measured in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PRot {
    phi_in: f64,
    phi_out: f64,
}

impl PRot {
    pub fn new(phi_in_deg: f64, phi_out_deg: f64) -> Result<Self, ElementError> {
        Ok(Self {
            phi_in: check_finite("PRot", "phi_in", phi_in_deg)? * DEGREE_TO_RADIAN,
            phi_out: check_finite("PRot", "phi_out", phi_out_deg)? * DEGREE_TO_RADIAN,
        })
    }
}

impl BeamOptic for PRot {
    fn name(&self) -> &'static str {
        "PRot"
    }

    fn push_particle(&self, p: &mut Particle, refpart: &RefPart) {
        let beta = refpart.beta();
        let theta = self.phi_out - self.phi_in;
        let (sin_theta, cos_theta) = theta.sin_cos();
        let (sin_in, cos_in) = self.phi_in.sin_cos();

        let px_in = p.px + sin_in;
        let pz = (1.0 - 2.0 * p.pt / beta + p.pt * p.pt - p.py * p.py - px_in * px_in).sqrt();
        let pzf = pz * cos_theta - px_in * sin_theta;

        let x = p.x;
        p.x = x * pz / pzf;
        p.px = p.px * cos_theta + (pz - cos_in) * sin_theta;
        p.y += p.py * x * sin_theta / pzf;
        p.t -= (p.pt - 1.0 / beta) * x * sin_theta / pzf;
    }

    fn push_reference(&self, _refpart: &mut RefPart) {}
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;

    #[test]
    fn equal_angles_leave_particles_unchanged() {
        let refpart = reference(50.0);
        let start = particle(1e-3, -2e-3, 1e-4, 2e-3, 1e-3, 0.02);
        for angle in [0.0, 12.5] {
            let rot = PRot::new(angle, angle).unwrap();
            let mut p = start;
            rot.push_particle(&mut p, &refpart);
            assert_close(p.x, start.x, 1e-16);
            assert_close(p.px, start.px, 1e-16);
            assert_close(p.y, start.y, 1e-16);
            assert_close(p.t, start.t, 1e-16);
        }
    }

    #[test]
    fn rotating_back_restores_the_particle() {
        let refpart = reference(50.0);
        let start = particle(1e-3, 2e-3, 1e-4, -2e-3, 1e-3, 0.02);
        let mut p = start;
        PRot::new(0.0, 10.0).unwrap().push_particle(&mut p, &refpart);
        assert!((p.px - start.px).abs() > 1e-3);
        PRot::new(10.0, 0.0).unwrap().push_particle(&mut p, &refpart);

        assert_close(p.x, start.x, 1e-15);
        assert_close(p.px, start.px, 1e-15);
        assert_close(p.y, start.y, 1e-15);
        assert_close(p.t, start.t, 1e-15);
    }

    #[test]
    fn rotation_is_symplectic() {
        let refpart = reference(50.0);
        let rot = PRot::new(5.0, -7.0).unwrap();
        let jac = jacobian(
            |p| rot.push_particle(p, &refpart),
            [1e-3, -2e-3, 2e-3, 1e-3, 1e-4, 0.02],
        );
        assert_symplectic(&jac, 1e-6);
    }
}
