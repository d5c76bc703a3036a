use super::{BeamOptic, ElementError, check_finite};
use crate::core::particles::{Particle, RefPart};
use num_complex::Complex;

/// Thin nonlinear lens with an integrable (Danilov-Nagaitsev) potential.
///
/// `knll` is the integrated strength in m, `cnll` the distance of the branch points from the
/// axis in m.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NonlinearLens {
    knll: f64,
    cnll: f64,
}

impl NonlinearLens {
    pub fn new(knll: f64, cnll: f64) -> Result<Self, ElementError> {
        if !cnll.is_finite() || cnll <= 0.0 {
            return Err(ElementError::InvalidParameter {
                element: "NonlinearLens",
                name: "cnll",
                value: cnll,
            });
        }
        Ok(Self {
            knll: check_finite("NonlinearLens", "knll", knll)?,
            cnll,
        })
    }
}

impl BeamOptic for NonlinearLens {
    fn name(&self) -> &'static str {
        "NonlinearLens"
    }

    fn push_particle(&self, p: &mut Particle, _refpart: &RefPart) {
        let i = Complex::<f64>::i();
        let zeta = Complex::new(p.x, p.y) / self.cnll;
        let croot = (Complex::new(1.0, 0.0) - zeta * zeta).sqrt();
        let carcsin = -i * (i * zeta + croot).ln();
        let d_f = zeta / croot.powu(2) + carcsin / croot.powu(3);

        let kick = -self.knll / self.cnll;
        p.px += kick * d_f.re;
        p.py -= kick * d_f.im;
    }

    fn push_reference(&self, _refpart: &mut RefPart) {}
}
