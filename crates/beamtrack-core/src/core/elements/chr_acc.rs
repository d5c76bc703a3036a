use super::{BeamOptic, ElementError, Thick, check_finite};
use crate::core::particles::{Particle, RefPart};

/// Acceleration in a uniform longitudinal electric field, with an optional uniform solenoidal
/// magnetic field.
///
/// `ez` and `bz` are normalised field strengths in 1/m: `ez = q E / (m c^2)` and
/// `bz = q B / (m c)`. The reference particle gains `ez * ds` in `gamma` per segment, and particle
/// momenta are rescaled to the new reference momentum, which damps the transverse and
/// longitudinal momenta adiabatically.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChrAcc {
    thick: Thick,
    ez: f64,
    bz: f64,
}

impl ChrAcc {
    pub fn new(ds: f64, ez: f64, bz: f64, nslice: usize) -> Result<Self, ElementError> {
        Ok(Self {
            thick: Thick::new("ChrAcc", ds, nslice)?,
            ez: check_finite("ChrAcc", "ez", ez)?,
            bz: check_finite("ChrAcc", "bz", bz)?,
        })
    }

    pub fn ez(&self) -> f64 {
        self.ez
    }

    pub fn bz(&self) -> f64 {
        self.bz
    }
}

/// Path integrals along one slice for a particle whose total `pt` falls linearly from `pti`.
struct Segment {
    pti: f64,
    ptf: f64,
    pi: f64,
    pf: f64,
    ez: f64,
    ds: f64,
}

impl Segment {
    fn new(pti: f64, ez: f64, ds: f64) -> Self {
        let ptf = pti - ez * ds;
        Self {
            pti,
            ptf,
            pi: (pti * pti - 1.0).sqrt(),
            pf: (ptf * ptf - 1.0).sqrt(),
            ez,
            ds,
        }
    }

    /// True when the energy change is too small for the closed forms to be accurate.
    fn field_free(&self) -> bool {
        (self.ez * self.ds).abs() <= 1e-10 * self.pti.abs()
    }

    /// `integral dz / p`.
    fn reduced_path(&self) -> f64 {
        if self.field_free() {
            self.ds / self.pi
        } else {
            ((-self.ptf + self.pf) / (-self.pti + self.pi)).ln() / self.ez
        }
    }

    /// `integral gamma / p dz`, the time of flight.
    fn time_of_flight(&self) -> f64 {
        if self.field_free() {
            -self.pti * self.ds / self.pi
        } else {
            (self.pf - self.pi) / self.ez
        }
    }

    /// `integral gamma / p^3 dz`.
    fn inverse_cube(&self) -> f64 {
        if self.field_free() {
            -self.pti * self.ds / self.pi.powi(3)
        } else {
            (1.0 / self.pi - 1.0 / self.pf) / self.ez
        }
    }
}

impl BeamOptic for ChrAcc {
    fn name(&self) -> &'static str {
        "ChrAcc"
    }

    fn push_particle(&self, p: &mut Particle, refpart: &RefPart) {
        let ds = self.thick.slice_ds();
        let reference = Segment::new(refpart.pt, self.ez, ds);
        let (bgi, bgf) = (reference.pi, reference.pf);

        // Work in dynamic units, normalised to m c rather than to the reference momentum.
        let (px, py, pt) = (p.px * bgi, p.py * bgi, p.pt * bgi);
        let particle = Segment::new(refpart.pt + pt, self.ez, ds);
        let tau = particle.reduced_path();

        // Larmor frame: a harmonic oscillator in tau, then a rotation by the same angle.
        let alpha = 0.5 * self.bz;
        let theta = alpha * tau;
        let (sin, cos) = theta.sin_cos();
        let sin_over_alpha = if alpha == 0.0 { tau } else { sin / alpha };

        let x1 = cos * p.x + sin_over_alpha * px;
        let px1 = -alpha * sin * p.x + cos * px;
        let y1 = cos * p.y + sin_over_alpha * py;
        let py1 = -alpha * sin * p.y + cos * py;

        let mechanical = px * px
            + py * py
            + alpha * alpha * (p.x * p.x + p.y * p.y)
            - 2.0 * alpha * (p.x * py - p.y * px);

        p.x = cos * x1 + sin * y1;
        p.y = -sin * x1 + cos * y1;
        p.px = (cos * px1 + sin * py1) / bgf;
        p.py = (-sin * px1 + cos * py1) / bgf;
        p.t += particle.time_of_flight() + 0.5 * mechanical * particle.inverse_cube()
            - reference.time_of_flight();
        p.pt = pt / bgf;
    }

    fn push_reference(&self, refpart: &mut RefPart) {
        let ds = self.thick.slice_ds();
        let segment = Segment::new(refpart.pt, self.ez, ds);
        let tau = segment.reduced_path();

        refpart.x += refpart.px * tau;
        refpart.y += refpart.py * tau;
        refpart.z += ds;
        refpart.t += segment.time_of_flight();
        refpart.pt = segment.ptf;
        refpart.pz = segment.pf;
        refpart.s += ds;
    }

    fn length(&self) -> f64 {
        self.thick.ds
    }

    fn nslice(&self) -> usize {
        self.thick.nslice
    }
}
