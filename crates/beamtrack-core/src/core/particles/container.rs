use super::reference::RefPart;
use crate::core::diagnostics::reduced::{DiagnosticsError, ReducedBeamCharacteristics};
use thiserror::Error;

/// One macro-particle: phase-space coordinates relative to the reference particle.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Particle {
    pub id: u64,
    pub x: f64,
    pub y: f64,
    pub t: f64,
    pub px: f64,
    pub py: f64,
    pub pt: f64,
    /// Charge over mass, in elementary charges per eV.
    pub qm: f64,
    /// Number of physical particles represented by this macro-particle.
    pub weight: f64,
}

#[derive(Debug, Error, PartialEq)]
pub enum ContainerError {
    #[error("Phase-space arrays have mismatched lengths: {0:?}")]
    LengthMismatch([usize; 6]),
    #[error("Reference particle charge is zero; cannot assign macro-particle weights")]
    ZeroReferenceCharge,
    #[error("Bunch charge must be finite and non-negative, got {0}")]
    InvalidBunchCharge(f64),
}

#[derive(Debug, Clone, Default)]
pub struct ParticleContainer {
    particles: Vec<Particle>,
    ref_particle: RefPart,
    next_id: u64,
}

impl ParticleContainer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ref_particle(&self) -> &RefPart {
        &self.ref_particle
    }

    pub fn ref_particle_mut(&mut self) -> &mut RefPart {
        &mut self.ref_particle
    }

    pub fn set_ref_particle(&mut self, refpart: RefPart) {
        self.ref_particle = refpart;
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub(crate) fn particles_mut(&mut self) -> &mut [Particle] {
        &mut self.particles
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    /// Adds macro-particles at fixed `s`.
    ///
    /// The bunch charge is split evenly: each macro-particle represents
    /// `bunch_charge / (n * |q_ref|)` physical particles.
    #[allow(clippy::too_many_arguments)]
    pub fn add_n_particles(
        &mut self,
        x: &[f64],
        y: &[f64],
        t: &[f64],
        px: &[f64],
        py: &[f64],
        pt: &[f64],
        qm: f64,
        bunch_charge: f64,
    ) -> Result<(), ContainerError> {
        let lengths = [x.len(), y.len(), t.len(), px.len(), py.len(), pt.len()];
        if lengths.iter().any(|&len| len != lengths[0]) {
            return Err(ContainerError::LengthMismatch(lengths));
        }
        if !bunch_charge.is_finite() || bunch_charge < 0.0 {
            return Err(ContainerError::InvalidBunchCharge(bunch_charge));
        }
        let n = lengths[0];
        if n == 0 {
            return Ok(());
        }
        let ref_charge = self.ref_particle.charge.abs();
        if ref_charge == 0.0 {
            return Err(ContainerError::ZeroReferenceCharge);
        }

        let weight = bunch_charge / (n as f64 * ref_charge);
        self.particles.reserve(n);
        for i in 0..n {
            self.particles.push(Particle {
                id: self.next_id,
                x: x[i],
                y: y[i],
                t: t[i],
                px: px[i],
                py: py[i],
                pt: pt[i],
                qm,
                weight,
            });
            self.next_id += 1;
        }
        Ok(())
    }

    /// Total charge carried by all macro-particles, in C.
    pub fn total_charge_c(&self) -> f64 {
        let weight: f64 = self.particles.iter().map(|p| p.weight).sum();
        weight * self.ref_particle.charge
    }

    /// Returns `(x_min, y_min, t_min, x_max, y_max, t_max)`, or `None` for an empty container.
    pub fn min_and_max_positions(&self) -> Option<(f64, f64, f64, f64, f64, f64)> {
        if self.particles.is_empty() {
            return None;
        }
        let init = (
            f64::INFINITY,
            f64::INFINITY,
            f64::INFINITY,
            f64::NEG_INFINITY,
            f64::NEG_INFINITY,
            f64::NEG_INFINITY,
        );
        Some(self.particles.iter().fold(init, |acc, p| {
            (
                acc.0.min(p.x),
                acc.1.min(p.y),
                acc.2.min(p.t),
                acc.3.max(p.x),
                acc.4.max(p.y),
                acc.5.max(p.t),
            )
        }))
    }

    /// Returns `(x_mean, x_std, y_mean, y_std, t_mean, t_std)`, weighted by macro-particle weight.
    pub fn mean_and_std_positions(&self) -> Option<(f64, f64, f64, f64, f64, f64)> {
        let total_weight: f64 = self.particles.iter().map(|p| p.weight).sum();
        if self.particles.is_empty() || total_weight <= 0.0 {
            return None;
        }

        let mut sums = [0.0; 6];
        for p in &self.particles {
            sums[0] += p.weight * p.x;
            sums[1] += p.weight * p.x * p.x;
            sums[2] += p.weight * p.y;
            sums[3] += p.weight * p.y * p.y;
            sums[4] += p.weight * p.t;
            sums[5] += p.weight * p.t * p.t;
        }
        let moment = |first: f64, second: f64| {
            let mean = first / total_weight;
            let var = (second / total_weight - mean * mean).max(0.0);
            (mean, var.sqrt())
        };
        let (x_mean, x_std) = moment(sums[0], sums[1]);
        let (y_mean, y_std) = moment(sums[2], sums[3]);
        let (t_mean, t_std) = moment(sums[4], sums[5]);
        Some((x_mean, x_std, y_mean, y_std, t_mean, t_std))
    }

    pub fn reduced_beam_characteristics(
        &self,
    ) -> Result<ReducedBeamCharacteristics, DiagnosticsError> {
        ReducedBeamCharacteristics::compute(&self.particles, &self.ref_particle)
    }
}
