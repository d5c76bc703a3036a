use super::{BeamOptic, ElementError, Thick, push_reference_straight};
use crate::core::particles::{Particle, RefPart};

/// Linear constant focusing in all three planes.
///
/// `kx`, `ky` and `kt` are the focusing strengths in 1/m; a zero strength leaves that plane as a
/// drift.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConstF {
    thick: Thick,
    kx: f64,
    ky: f64,
    kt: f64,
}

impl ConstF {
    pub fn new(ds: f64, kx: f64, ky: f64, kt: f64, nslice: usize) -> Result<Self, ElementError> {
        for (name, value) in [("kx", kx), ("ky", ky), ("kt", kt)] {
            if !value.is_finite() || value < 0.0 {
                return Err(ElementError::InvalidParameter {
                    element: "ConstF",
                    name,
                    value,
                });
            }
        }
        Ok(Self {
            thick: Thick::new("ConstF", ds, nslice)?,
            kx,
            ky,
            kt,
        })
    }
}

/// Harmonic rotation of `(q, p)` with strength `k` and effective mass `mass`.
#[inline]
fn oscillate(q: f64, p: f64, k: f64, mass: f64, ds: f64) -> (f64, f64) {
    if k == 0.0 {
        return (q + ds / mass * p, p);
    }
    let (sin, cos) = (k * ds).sin_cos();
    (cos * q + sin / (mass * k) * p, -k * mass * sin * q + cos * p)
}

impl BeamOptic for ConstF {
    fn name(&self) -> &'static str {
        "ConstF"
    }

    fn push_particle(&self, p: &mut Particle, refpart: &RefPart) {
        let ds = self.thick.slice_ds();
        let betgam2 = refpart.pt * refpart.pt - 1.0;
        (p.x, p.px) = oscillate(p.x, p.px, self.kx, 1.0, ds);
        (p.y, p.py) = oscillate(p.y, p.py, self.ky, 1.0, ds);
        (p.t, p.pt) = oscillate(p.t, p.pt, self.kt, betgam2, ds);
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
