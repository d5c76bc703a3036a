use crate::core::constants::{ELEMENTARY_CHARGE, MEV_INV_C2, SPEED_OF_LIGHT};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Clone)]
pub enum RefPartError {
    #[error("Reference particle mass cannot be zero")]
    ZeroMass,
    #[error("Reference particle mass must be set before its energy")]
    MassNotSet,
    #[error("Invalid reference particle value for {field}: {value}")]
    InvalidValue { field: &'static str, value: f64 },
}

/// The nominal particle whose trajectory defines the design orbit and energy.
///
/// Momenta are stored in dynamic units (`p / (m c)`), `pt` is `-gamma`, so a particle at rest has
/// `pt = -1`. A freshly constructed reference particle has no mass and `pt = 0`, which is how
/// "energy not set yet" is detected.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RefPart {
    /// Integrated orbit path length, in m.
    pub s: f64,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    /// Clock time times `c`, in m.
    pub t: f64,
    pub px: f64,
    pub py: f64,
    pub pz: f64,
    pub pt: f64,
    /// Rest mass, in kg.
    pub mass: f64,
    /// Charge, in C.
    pub charge: f64,
    /// Value of `s` at the entrance of the element currently being tracked.
    pub sedge: f64,
}

impl RefPart {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn gamma(&self) -> f64 {
        -self.pt
    }

    #[inline]
    pub fn beta(&self) -> f64 {
        let gamma = self.gamma();
        (1.0 - 1.0 / (gamma * gamma)).sqrt()
    }

    #[inline]
    pub fn beta_gamma(&self) -> f64 {
        (self.pt * self.pt - 1.0).sqrt()
    }

    pub fn mass_mev(&self) -> f64 {
        self.mass / MEV_INV_C2
    }

    /// Sets the rest mass. If the energy was already set, the kinetic energy is preserved.
    pub fn set_mass_mev(&mut self, mass_mev: f64) -> Result<&mut Self, RefPartError> {
        if mass_mev == 0.0 {
            return Err(RefPartError::ZeroMass);
        }
        if !mass_mev.is_finite() || mass_mev < 0.0 {
            return Err(RefPartError::InvalidValue {
                field: "mass_mev",
                value: mass_mev,
            });
        }

        let kinetic_mev = self.has_energy().then(|| self.energy_mev());
        self.mass = mass_mev * MEV_INV_C2;

        if let Some(kinetic_mev) = kinetic_mev {
            self.pt = -kinetic_mev / mass_mev - 1.0;
            self.pz = (self.pt * self.pt - 1.0).sqrt();
        }
        Ok(self)
    }

    /// Kinetic energy, in MeV.
    pub fn energy_mev(&self) -> f64 {
        self.mass_mev() * (self.gamma() - 1.0)
    }

    /// Sets the kinetic energy and points the momentum along the design orbit.
    pub fn set_energy_mev(&mut self, kinetic_mev: f64) -> Result<&mut Self, RefPartError> {
        if self.mass == 0.0 {
            return Err(RefPartError::MassNotSet);
        }
        if !kinetic_mev.is_finite() || kinetic_mev <= 0.0 {
            return Err(RefPartError::InvalidValue {
                field: "energy_mev",
                value: kinetic_mev,
            });
        }

        self.px = 0.0;
        self.py = 0.0;
        self.pt = -kinetic_mev / self.mass_mev() - 1.0;
        self.pz = (self.pt * self.pt - 1.0).sqrt();
        Ok(self)
    }

    /// Magnetic rigidity `B rho`, in T·m.
    pub fn rigidity_tm(&self) -> f64 {
        self.mass * self.beta_gamma() * SPEED_OF_LIGHT / ELEMENTARY_CHARGE
    }

    pub fn charge_qe(&self) -> f64 {
        self.charge / ELEMENTARY_CHARGE
    }

    pub fn set_charge_qe(&mut self, charge_qe: f64) -> &mut Self {
        self.charge = charge_qe * ELEMENTARY_CHARGE;
        self
    }

    /// Charge-to-mass ratio in units of elementary charges per eV.
    pub fn qm_ratio(&self) -> f64 {
        self.charge_qe() / (self.mass_mev() * 1.0e6)
    }

    /// True once both mass and energy have been assigned.
    pub fn has_energy(&self) -> bool {
        self.mass != 0.0 && self.pt < -1.0
    }
}
