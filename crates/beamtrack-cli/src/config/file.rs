use crate::error::{CliError, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use toml::{Table, Value};
use tracing::debug;

/// The run configuration as written in the TOML file. Every value is optional here; missing
/// values fall back to [`super::defaults::DefaultsConfig`] or are reported by the builder.
#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct FileConfig {
    pub simulation: Option<FileSimulationConfig>,
    pub beam: Option<FileBeamConfig>,
    #[serde(default)]
    pub monitors: Vec<FileMonitor>,
    #[serde(default)]
    pub lattice: Vec<FileLatticeItem>,
}

#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct FileSimulationConfig {
    pub particle_shape: Option<u8>,
    pub space_charge: Option<bool>,
    pub diagnostics: Option<bool>,
    pub slice_step_diagnostics: Option<bool>,
    pub periods: Option<usize>,
    pub output_dir: Option<PathBuf>,
    pub seed: Option<u64>,
}

#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct FileBeamConfig {
    pub species: Option<String>,
    pub charge_qe: Option<f64>,
    pub mass_mev: Option<f64>,
    pub kinetic_energy_mev: Option<f64>,
    pub bunch_charge_c: Option<f64>,
    pub num_particles: Option<usize>,
    pub distribution: Option<FileDistribution>,
}

/// Second moments and correlations shared by all non-empty distribution kinds.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct FileMoments {
    pub sigma_x: f64,
    pub sigma_y: f64,
    pub sigma_t: f64,
    pub sigma_px: f64,
    pub sigma_py: f64,
    pub sigma_pt: f64,
    #[serde(default)]
    pub mu_xpx: f64,
    #[serde(default)]
    pub mu_ypy: f64,
    #[serde(default)]
    pub mu_tpt: f64,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields, rename_all = "kebab-case", tag = "type")]
pub enum FileDistribution {
    Empty {},
    Gaussian(FileMoments),
    Waterbag(FileMoments),
    Kurth4d(FileMoments),
    Triangle(FileMoments),
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct FileMonitor {
    pub name: String,
    pub backend: Option<String>,
}

fn one_slice() -> usize {
    1
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(
    deny_unknown_fields,
    rename_all = "kebab-case",
    rename_all_fields = "kebab-case",
    tag = "type"
)]
pub enum FileLatticeItem {
    Drift {
        ds: f64,
        #[serde(default = "one_slice")]
        nslice: usize,
    },
    ChrDrift {
        ds: f64,
        #[serde(default = "one_slice")]
        nslice: usize,
    },
    Quad {
        ds: f64,
        k: f64,
        #[serde(default = "one_slice")]
        nslice: usize,
    },
    ChrQuad {
        ds: f64,
        k: f64,
        /// 0 for MAD-X convention (1/m^2), 1 for MaryLie convention (T/m).
        #[serde(default)]
        units: i64,
        #[serde(default = "one_slice")]
        nslice: usize,
    },
    ChrAcc {
        ds: f64,
        ez: f64,
        bz: f64,
        #[serde(default = "one_slice")]
        nslice: usize,
    },
    ConstF {
        ds: f64,
        kx: f64,
        ky: f64,
        kt: f64,
        #[serde(default = "one_slice")]
        nslice: usize,
    },
    Multipole {
        multipole: u32,
        k_normal: f64,
        k_skew: f64,
    },
    NonlinearLens {
        knll: f64,
        cnll: f64,
    },
    #[serde(rename = "prot")]
    PRot {
        phi_in: f64,
        phi_out: f64,
    },
    /// Zero-length placeholder; `none` is accepted for lattices written for other codes.
    #[serde(alias = "none")]
    Marker {},
    BeamMonitor {
        name: String,
    },
}

impl FileConfig {
    /// Reads `path` as an untyped table, so `-S` overrides can be applied before typing it.
    pub fn read_table(path: &Path) -> Result<Table> {
        debug!("Loading configuration from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| parsing_error(path, e))
    }

    /// Types a table previously read from `path`.
    pub fn from_table(table: Table, path: &Path) -> Result<Self> {
        Value::Table(table)
            .try_into::<Self>()
            .map_err(|e| parsing_error(path, e))
    }
}

fn parsing_error(path: &Path, source: toml::de::Error) -> CliError {
    CliError::FileParsing {
        path: path.to_path_buf(),
        source: source.into(),
    }
}
