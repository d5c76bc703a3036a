use crate::core::constants::{self, Species};
use crate::core::distribution::Distribution;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Clone)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),
    #[error("Invalid value for '{parameter}': {reason}")]
    InvalidValue {
        parameter: &'static str,
        reason: String,
    },
}

impl ConfigError {
    fn invalid(parameter: &'static str, reason: impl Into<String>) -> Self {
        ConfigError::InvalidValue {
            parameter,
            reason: reason.into(),
        }
    }
}

pub const DEFAULT_PARTICLE_SHAPE: u8 = 2;
pub const DEFAULT_OUTPUT_DIR: &str = "diags";

/// Scalar options of one simulation run.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationConfig {
    /// Order of the B-spline used to deposit charge on the mesh (1, 2 or 3).
    pub particle_shape: u8,
    pub space_charge: bool,
    /// Write the reduced beam characteristics and the reference particle history.
    pub diagnostics: bool,
    /// Write diagnostics after every slice instead of after every element.
    pub slice_step_diagnostics: bool,
    /// How many times the lattice is traversed.
    pub periods: usize,
    pub output_dir: PathBuf,
    /// Seed for bunch sampling; `None` draws one from the operating system.
    pub seed: Option<u64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            particle_shape: DEFAULT_PARTICLE_SHAPE,
            space_charge: false,
            diagnostics: true,
            slice_step_diagnostics: false,
            periods: 1,
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            seed: None,
        }
    }
}

#[derive(Default)]
pub struct SimulationConfigBuilder {
    particle_shape: Option<u8>,
    space_charge: Option<bool>,
    diagnostics: Option<bool>,
    slice_step_diagnostics: Option<bool>,
    periods: Option<usize>,
    output_dir: Option<PathBuf>,
    seed: Option<u64>,
}

impl SimulationConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn particle_shape(mut self, order: u8) -> Self {
        self.particle_shape = Some(order);
        self
    }
    pub fn space_charge(mut self, enabled: bool) -> Self {
        self.space_charge = Some(enabled);
        self
    }
    pub fn diagnostics(mut self, enabled: bool) -> Self {
        self.diagnostics = Some(enabled);
        self
    }
    pub fn slice_step_diagnostics(mut self, enabled: bool) -> Self {
        self.slice_step_diagnostics = Some(enabled);
        self
    }
    pub fn periods(mut self, periods: usize) -> Self {
        self.periods = Some(periods);
        self
    }
    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(dir.into());
        self
    }
    pub fn seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    pub fn build(self) -> Result<SimulationConfig, ConfigError> {
        let defaults = SimulationConfig::default();
        let particle_shape = self.particle_shape.unwrap_or(defaults.particle_shape);
        if !(1..=3).contains(&particle_shape) {
            return Err(ConfigError::invalid(
                "particle_shape",
                format!("must be 1, 2 or 3, got {particle_shape}"),
            ));
        }
        let periods = self.periods.unwrap_or(defaults.periods);
        if periods == 0 {
            return Err(ConfigError::invalid("periods", "must be at least 1"));
        }
        let output_dir = self.output_dir.unwrap_or(defaults.output_dir);
        if output_dir.as_os_str().is_empty() {
            return Err(ConfigError::invalid("output_dir", "must not be empty"));
        }

        Ok(SimulationConfig {
            particle_shape,
            space_charge: self.space_charge.unwrap_or(defaults.space_charge),
            diagnostics: self.diagnostics.unwrap_or(defaults.diagnostics),
            slice_step_diagnostics: self
                .slice_step_diagnostics
                .unwrap_or(defaults.slice_step_diagnostics),
            periods,
            output_dir,
            seed: self.seed,
        })
    }
}

/// Everything needed to create the bunch: species, energy and the phase-space distribution.
#[derive(Debug, Clone, PartialEq)]
pub struct BeamConfig {
    pub species: Species,
    pub kinetic_energy_mev: f64,
    /// Total bunch charge, in C.
    pub bunch_charge_c: f64,
    pub num_particles: usize,
    pub distribution: Distribution,
}

#[derive(Default)]
pub struct BeamConfigBuilder {
    species_name: Option<String>,
    charge_qe: Option<f64>,
    mass_mev: Option<f64>,
    kinetic_energy_mev: Option<f64>,
    bunch_charge_c: Option<f64>,
    num_particles: Option<usize>,
    distribution: Option<Distribution>,
}

impl BeamConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses a built-in species; explicit `charge_qe` or `mass_mev` override its values.
    pub fn species(mut self, name: impl Into<String>) -> Self {
        self.species_name = Some(name.into());
        self
    }
    pub fn charge_qe(mut self, charge: f64) -> Self {
        self.charge_qe = Some(charge);
        self
    }
    pub fn mass_mev(mut self, mass: f64) -> Self {
        self.mass_mev = Some(mass);
        self
    }
    pub fn kinetic_energy_mev(mut self, energy: f64) -> Self {
        self.kinetic_energy_mev = Some(energy);
        self
    }
    pub fn bunch_charge_c(mut self, charge: f64) -> Self {
        self.bunch_charge_c = Some(charge);
        self
    }
    pub fn num_particles(mut self, n: usize) -> Self {
        self.num_particles = Some(n);
        self
    }
    pub fn distribution(mut self, distribution: Distribution) -> Self {
        self.distribution = Some(distribution);
        self
    }

    pub fn build(self) -> Result<BeamConfig, ConfigError> {
        let named = match &self.species_name {
            Some(name) => Some(constants::species(name).ok_or_else(|| {
                ConfigError::invalid(
                    "species",
                    format!(
                        "unknown species '{name}' (known: {})",
                        constants::species_names().join(", ")
                    ),
                )
            })?),
            None => None,
        };
        let charge_qe = self
            .charge_qe
            .or(named.map(|s| s.charge_qe))
            .ok_or(ConfigError::MissingParameter("charge_qe"))?;
        let mass_mev = self
            .mass_mev
            .or(named.map(|s| s.mass_mev))
            .ok_or(ConfigError::MissingParameter("mass_mev"))?;
        if !charge_qe.is_finite() || charge_qe == 0.0 {
            return Err(ConfigError::invalid("charge_qe", "must be finite and non-zero"));
        }
        if !mass_mev.is_finite() || mass_mev <= 0.0 {
            return Err(ConfigError::invalid("mass_mev", "must be finite and positive"));
        }

        let kinetic_energy_mev = self
            .kinetic_energy_mev
            .ok_or(ConfigError::MissingParameter("kinetic_energy_mev"))?;
        if !kinetic_energy_mev.is_finite() || kinetic_energy_mev <= 0.0 {
            return Err(ConfigError::invalid(
                "kinetic_energy_mev",
                "must be finite and positive",
            ));
        }
        let bunch_charge_c = self
            .bunch_charge_c
            .ok_or(ConfigError::MissingParameter("bunch_charge_c"))?;
        if !bunch_charge_c.is_finite() || bunch_charge_c < 0.0 {
            return Err(ConfigError::invalid(
                "bunch_charge_c",
                "must be finite and non-negative",
            ));
        }
        let num_particles = self
            .num_particles
            .ok_or(ConfigError::MissingParameter("num_particles"))?;
        if num_particles == 0 {
            return Err(ConfigError::invalid("num_particles", "must be at least 1"));
        }
        let distribution = self
            .distribution
            .ok_or(ConfigError::MissingParameter("distribution"))?;
        distribution
            .validate()
            .map_err(|e| ConfigError::invalid("distribution", e.to_string()))?;

        Ok(BeamConfig {
            species: Species {
                charge_qe,
                mass_mev,
            },
            kinetic_energy_mev,
            bunch_charge_c,
            num_particles,
            distribution,
        })
    }
}
