use super::drift::{chromatic_delta1, chromatic_drift};
use super::{BeamOptic, ElementError, Thick, check_finite, push_reference_straight};
use crate::core::particles::{Particle, RefPart};

/// Convention used to interpret a quadrupole strength.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StrengthUnits {
    /// `k` in 1/m^2: gradient divided by the magnetic rigidity.
    #[default]
    MadX,
    /// `k` in T/m: the raw field gradient.
    MaryLie,
}

impl StrengthUnits {
    /// Maps the numeric unit codes used in lattice files (`0` MAD-X, `1` MaryLie).
    pub fn from_code(code: i64) -> Result<Self, ElementError> {
        match code {
            0 => Ok(Self::MadX),
            1 => Ok(Self::MaryLie),
            other => Err(ElementError::InvalidParameter {
                element: "ChrQuad",
                name: "units",
                value: other as f64,
            }),
        }
    }

    /// Normalised focusing strength in 1/m^2 for the given reference particle.
    pub fn normalized(self, k: f64, refpart: &RefPart) -> f64 {
        match self {
            Self::MadX => k,
            Self::MaryLie => k / refpart.rigidity_tm(),
        }
    }
}

/// `(q, p)` after a segment of harmonic motion with frequency `omega` and effective mass `mass`.
#[inline]
fn focus(q: f64, p: f64, omega: f64, mass: f64, ds: f64) -> (f64, f64) {
    let (sin, cos) = (omega * ds).sin_cos();
    (
        cos * q + sin / (omega * mass) * p,
        -omega * mass * sin * q + cos * p,
    )
}

#[inline]
fn defocus(q: f64, p: f64, omega: f64, mass: f64, ds: f64) -> (f64, f64) {
    let (sinh, cosh) = ((omega * ds).sinh(), (omega * ds).cosh());
    (
        cosh * q + sinh / (omega * mass) * p,
        omega * mass * sinh * q + cosh * p,
    )
}

/// Linear quadrupole: `k > 0` focuses horizontally, `k < 0` vertically.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quad {
    thick: Thick,
    k: f64,
}

impl Quad {
    pub fn new(ds: f64, k: f64, nslice: usize) -> Result<Self, ElementError> {
        Ok(Self {
            thick: Thick::new("Quad", ds, nslice)?,
            k: check_finite("Quad", "k", k)?,
        })
    }

    pub fn k(&self) -> f64 {
        self.k
    }
}

impl BeamOptic for Quad {
    fn name(&self) -> &'static str {
        "Quad"
    }

    fn push_particle(&self, p: &mut Particle, refpart: &RefPart) {
        let ds = self.thick.slice_ds();
        let betgam2 = refpart.pt * refpart.pt - 1.0;
        let omega = self.k.abs().sqrt();

        if self.k > 0.0 {
            (p.x, p.px) = focus(p.x, p.px, omega, 1.0, ds);
            (p.y, p.py) = defocus(p.y, p.py, omega, 1.0, ds);
        } else if self.k < 0.0 {
            (p.x, p.px) = defocus(p.x, p.px, omega, 1.0, ds);
            (p.y, p.py) = focus(p.y, p.py, omega, 1.0, ds);
        } else {
            p.x += ds * p.px;
            p.y += ds * p.py;
        }
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

/// Quadrupole with chromatic focusing.
///
/// The Hamiltonian is expanded through second order in `(x, px, y, py)` and keeps the exact
/// `pt` dependence, so the focusing strength seen by a particle scales with `1 / (1 + delta)`.
/// The time-of-flight update is the closed-form integral of that Hamiltonian over the slice.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChrQuad {
    thick: Thick,
    k: f64,
    units: StrengthUnits,
}

impl ChrQuad {
    pub fn new(ds: f64, k: f64, units: StrengthUnits, nslice: usize) -> Result<Self, ElementError> {
        Ok(Self {
            thick: Thick::new("ChrQuad", ds, nslice)?,
            k: check_finite("ChrQuad", "k", k)?,
            units,
        })
    }

    pub fn k(&self) -> f64 {
        self.k
    }

    pub fn units(&self) -> StrengthUnits {
        self.units
    }
}

impl BeamOptic for ChrQuad {
    fn name(&self) -> &'static str {
        "ChrQuad"
    }

    fn push_particle(&self, p: &mut Particle, refpart: &RefPart) {
        let ds = self.thick.slice_ds();
        let g = self.units.normalized(self.k, refpart);
        if g == 0.0 {
            chromatic_drift(p, refpart, ds);
            return;
        }

        let beta = refpart.beta();
        let delta1 = chromatic_delta1(p.pt, beta);
        let delta = delta1 - 1.0;
        let omega = (g.abs() / delta1).sqrt();
        let w = omega * delta1;

        // (q1, p1) is the focusing plane, (q2, p2) the defocusing one, both at the entrance.
        let (q1, p1, q2, p2) = if g > 0.0 {
            (p.x, p.px, p.y, p.py)
        } else {
            (p.y, p.py, p.x, p.px)
        };
        let (q1_out, p1_out) = focus(q1, p1, omega, delta1, ds);
        let (q2_out, p2_out) = defocus(q2, p2, omega, delta1, ds);
        if g > 0.0 {
            (p.x, p.px, p.y, p.py) = (q1_out, p1_out, q2_out, p2_out);
        } else {
            (p.y, p.py, p.x, p.px) = (q1_out, p1_out, q2_out, p2_out);
        }

        let t0 = p.t - (p.pt + delta / beta) * ds / delta1;
        let phase = 2.0 * ds * omega;
        let term1 = -(p2 * p2 + q2 * q2 * w * w) * phase.sinh();
        let term2 = -(p1 * p1 - q1 * q1 * w * w) * phase.sin();
        let term3 = -2.0 * q2 * p2 * w * phase.cosh();
        let term4 = -2.0 * q1 * p1 * w * phase.cos();
        let term5 = 2.0
            * omega
            * (q1 * p1 * delta1 + q2 * p2 * delta1
                - (p1 * p1 + p2 * p2) * ds
                - (q1 * q1 - q2 * q2) * w * w * ds);
        p.t = t0
            + (-1.0 + beta * p.pt) / (8.0 * beta * delta1.powi(3) * omega)
                * (term1 + term2 + term3 + term4 + term5);
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
