//! # Lattice Elements
//!
//! Each element is a symplectic map for the six phase-space coordinates of a macro-particle,
//! plus a map that advances the reference particle through the same element.
//!
//! Thick elements are split into `nslice` equal slices; the engine applies the slice map once per
//! slice, which is where diagnostics and (in the future) collective effects hook in. Thin elements
//! act as a single kick and do not move the reference particle.
//!
//! Particle maps always read the reference particle as it is at the *entrance* of the slice; the
//! engine pushes the particles first and the reference particle afterwards.

mod chr_acc;
mod const_f;
mod drift;
mod marker;
mod multipole;
mod nonlinear_lens;
mod prot;
mod quad;

pub use chr_acc::ChrAcc;
pub use const_f::ConstF;
pub use drift::{ChrDrift, Drift};
pub use marker::Marker;
pub use multipole::Multipole;
pub use nonlinear_lens::NonlinearLens;
pub use prot::PRot;
pub use quad::{ChrQuad, Quad, StrengthUnits};

use crate::core::diagnostics::monitor::MonitorId;
use crate::core::particles::{Particle, RefPart};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Clone)]
pub enum ElementError {
    #[error("{element}: segment length must be finite and non-negative, got {value}")]
    InvalidLength { element: &'static str, value: f64 },
    #[error("{element}: number of slices must be at least 1")]
    InvalidSlices { element: &'static str },
    #[error("{element}: parameter '{name}' is invalid ({value})")]
    InvalidParameter {
        element: &'static str,
        name: &'static str,
        value: f64,
    },
    #[error("Multipole index must be at least 1, got {0}")]
    InvalidMultipoleIndex(u32),
}

/// A beamline element that maps particles and the reference particle through one slice.
pub trait BeamOptic: Send + Sync {
    /// Element kind, as shown in logs and summaries.
    fn name(&self) -> &'static str;

    /// Applies one slice of the element to a macro-particle.
    fn push_particle(&self, particle: &mut Particle, refpart: &RefPart);

    /// Applies one slice of the element to the reference particle.
    fn push_reference(&self, refpart: &mut RefPart);

    /// Total element length, in m. Zero for thin elements.
    fn length(&self) -> f64 {
        0.0
    }

    fn nslice(&self) -> usize {
        1
    }

    fn slice_ds(&self) -> f64 {
        self.length() / self.nslice() as f64
    }
}

/// Shared length and slicing parameters of thick elements.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thick {
    pub ds: f64,
    pub nslice: usize,
}

impl Thick {
    pub fn new(element: &'static str, ds: f64, nslice: usize) -> Result<Self, ElementError> {
        if !ds.is_finite() || ds < 0.0 {
            return Err(ElementError::InvalidLength { element, value: ds });
        }
        if nslice == 0 {
            return Err(ElementError::InvalidSlices { element });
        }
        Ok(Self { ds, nslice })
    }

    #[inline]
    pub fn slice_ds(&self) -> f64 {
        self.ds / self.nslice as f64
    }
}

/// Advances the reference particle along a straight segment of length `slice_ds`.
pub(crate) fn push_reference_straight(refpart: &mut RefPart, slice_ds: f64) {
    let step = slice_ds / (refpart.pt * refpart.pt - 1.0).sqrt();
    refpart.x += step * refpart.px;
    refpart.y += step * refpart.py;
    refpart.z += step * refpart.pz;
    refpart.t -= step * refpart.pt;
    refpart.s += slice_ds;
}

pub(crate) fn check_finite(
    element: &'static str,
    name: &'static str,
    value: f64,
) -> Result<f64, ElementError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ElementError::InvalidParameter {
            element,
            name,
            value,
        })
    }
}

/// The ordered building blocks of a lattice.
#[derive(Debug, Clone, PartialEq)]
pub enum Element {
    Drift(Drift),
    ChrDrift(ChrDrift),
    Quad(Quad),
    ChrQuad(ChrQuad),
    ChrAcc(ChrAcc),
    ConstF(ConstF),
    Multipole(Multipole),
    NonlinearLens(NonlinearLens),
    PRot(PRot),
    /// Zero-length pass-through.
    Marker(Marker),
    /// Records the beam into the monitor registered under this id.
    BeamMonitor(MonitorId),
}

impl Element {
    /// The element's map, or `None` for elements that do not move particles.
    pub fn as_optic(&self) -> Option<&dyn BeamOptic> {
        match self {
            Element::Drift(e) => Some(e),
            Element::ChrDrift(e) => Some(e),
            Element::Quad(e) => Some(e),
            Element::ChrQuad(e) => Some(e),
            Element::ChrAcc(e) => Some(e),
            Element::ConstF(e) => Some(e),
            Element::Multipole(e) => Some(e),
            Element::NonlinearLens(e) => Some(e),
            Element::PRot(e) => Some(e),
            Element::Marker(e) => Some(e),
            Element::BeamMonitor(_) => None,
        }
    }

    pub fn name(&self) -> &'static str {
        self.as_optic().map_or("BeamMonitor", |optic| optic.name())
    }

    pub fn length(&self) -> f64 {
        self.as_optic().map_or(0.0, |optic| optic.length())
    }

    pub fn nslice(&self) -> usize {
        self.as_optic().map_or(1, |optic| optic.nslice())
    }
}

macro_rules! impl_from_element {
    ($($kind:ident),* $(,)?) => {
        $(
            impl From<$kind> for Element {
                fn from(element: $kind) -> Self {
                    Element::$kind(element)
                }
            }
        )*
    };
}

impl_from_element!(
    Drift,
    ChrDrift,
    Quad,
    ChrQuad,
    ChrAcc,
    ConstF,
    Multipole,
    NonlinearLens,
    PRot,
    Marker
);

impl From<MonitorId> for Element {
    fn from(id: MonitorId) -> Self {
        Element::BeamMonitor(id)
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::core::constants::ELECTRON_MASS_MEV;
    use crate::core::particles::{Particle, RefPart};
    use nalgebra::Matrix6;

    pub fn reference(kinetic_mev: f64) -> RefPart {
        let mut refpart = RefPart::new();
        refpart
            .set_charge_qe(1.0)
            .set_mass_mev(ELECTRON_MASS_MEV)
            .unwrap()
            .set_energy_mev(kinetic_mev)
            .unwrap();
        refpart
    }

    pub fn particle(x: f64, y: f64, t: f64, px: f64, py: f64, pt: f64) -> Particle {
        Particle {
            x,
            y,
            t,
            px,
            py,
            pt,
            weight: 1.0,
            ..Particle::default()
        }
    }

    pub fn assert_close(actual: f64, expected: f64, tol: f64) {
        assert!(
            (actual - expected).abs() <= tol,
            "expected {expected}, got {actual} (tolerance {tol})"
        );
    }

    /// Central-difference Jacobian of `map` in the ordering `(x, px, y, py, t, pt)`.
    pub fn jacobian(map: impl Fn(&mut Particle), at: [f64; 6]) -> Matrix6<f64> {
        let h = 1e-7;
        let eval = |z: [f64; 6]| {
            let mut p = particle(z[0], z[2], z[4], z[1], z[3], z[5]);
            map(&mut p);
            [p.x, p.px, p.y, p.py, p.t, p.pt]
        };
        let mut jac = Matrix6::zeros();
        for j in 0..6 {
            let mut plus = at;
            let mut minus = at;
            plus[j] += h;
            minus[j] -= h;
            let (fp, fm) = (eval(plus), eval(minus));
            for i in 0..6 {
                jac[(i, j)] = (fp[i] - fm[i]) / (2.0 * h);
            }
        }
        jac
    }

    /// Asserts `J^T S J = S` for the canonical symplectic form `S`.
    pub fn assert_symplectic(jac: &Matrix6<f64>, tol: f64) {
        assert_conformally_symplectic(jac, 1.0, tol);
    }

    /// Asserts `J^T S J = factor * S`, as for maps that rescale momenta.
    pub fn assert_conformally_symplectic(jac: &Matrix6<f64>, factor: f64, tol: f64) {
        let mut form = Matrix6::zeros();
        for plane in 0..3 {
            form[(2 * plane, 2 * plane + 1)] = 1.0;
            form[(2 * plane + 1, 2 * plane)] = -1.0;
        }
        let residual = jac.transpose() * form * jac - form * factor;
        let worst = residual.iter().fold(0.0_f64, |acc, v| acc.max(v.abs()));
        assert!(worst <= tol, "map is not symplectic: max residual {worst}");
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;

    #[test]
    fn thick_rejects_zero_slices_and_negative_length() {
        assert_eq!(
            Thick::new("Drift", 1.0, 0),
            Err(ElementError::InvalidSlices { element: "Drift" })
        );
        assert!(matches!(
            Thick::new("Drift", -1.0, 1),
            Err(ElementError::InvalidLength { .. })
        ));
        assert_eq!(Thick::new("Drift", 1.5, 3).unwrap().slice_ds(), 0.5);
    }

    #[test]
    fn straight_reference_push_advances_path_and_time() {
        let mut refpart = reference(10.0);
        let beta = refpart.beta();
        push_reference_straight(&mut refpart, 2.0);
        assert_close(refpart.s, 2.0, 1e-15);
        assert_close(refpart.z, 2.0, 1e-12);
        assert_close(refpart.t, 2.0 / beta, 1e-12);
        assert_eq!(refpart.x, 0.0);
    }

    #[test]
    fn element_enum_reports_name_length_and_slices() {
        let quad: Element = ChrQuad::new(0.2, 6.0, StrengthUnits::MaryLie, 4).unwrap().into();
        assert_eq!(quad.name(), "ChrQuad");
        assert_close(quad.length(), 0.2, 1e-15);
        assert_eq!(quad.nslice(), 4);

        let kick: Element = Multipole::new(2, 1.0, 0.0).unwrap().into();
        assert_eq!(kick.length(), 0.0);
        assert_eq!(kick.nslice(), 1);
    }
}
