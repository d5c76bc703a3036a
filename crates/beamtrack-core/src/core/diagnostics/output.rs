use super::reduced::{DiagnosticsError, ReducedBeamCharacteristics};
use crate::core::particles::{ParticleContainer, RefPart};
use serde::Serialize;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub const REDUCED_FILE_NAME: &str = "reduced_beam_characteristics.csv";
pub const REFERENCE_FILE_NAME: &str = "ref_particle.csv";

/// One row of the reference particle history.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ReferenceRecord {
    pub step: usize,
    pub s: f64,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub t: f64,
    pub px: f64,
    pub py: f64,
    pub pz: f64,
    pub pt: f64,
    pub gamma: f64,
    pub beta_gamma: f64,
    pub energy_mev: f64,
}

impl ReferenceRecord {
    pub fn new(step: usize, refpart: &RefPart) -> Self {
        Self {
            step,
            s: refpart.s,
            x: refpart.x,
            y: refpart.y,
            z: refpart.z,
            t: refpart.t,
            px: refpart.px,
            py: refpart.py,
            pz: refpart.pz,
            pt: refpart.pt,
            gamma: refpart.gamma(),
            beta_gamma: refpart.beta_gamma(),
            energy_mev: refpart.energy_mev(),
        }
    }
}

struct CsvFile {
    path: PathBuf,
    writer: csv::Writer<File>,
}

impl CsvFile {
    fn create(path: PathBuf) -> Result<Self, DiagnosticsError> {
        let writer = csv::Writer::from_path(&path).map_err(|source| DiagnosticsError::Csv {
            path: path.clone(),
            source,
        })?;
        Ok(Self { path, writer })
    }

    fn write<T: Serialize>(&mut self, row: &T) -> Result<(), DiagnosticsError> {
        self.writer
            .serialize(row)
            .map_err(|source| DiagnosticsError::Csv {
                path: self.path.clone(),
                source,
            })
    }

    fn flush(&mut self) -> Result<(), DiagnosticsError> {
        self.writer.flush().map_err(|source| DiagnosticsError::Io {
            path: self.path.clone(),
            source,
        })
    }
}

/// Writes the reduced beam characteristics and the reference particle history during tracking.
pub struct DiagnosticsWriter {
    reduced: CsvFile,
    reference: CsvFile,
    history: Vec<ReducedBeamCharacteristics>,
    warned_empty: bool,
}

impl DiagnosticsWriter {
    pub fn create(output_dir: &Path) -> Result<Self, DiagnosticsError> {
        fs::create_dir_all(output_dir).map_err(|source| DiagnosticsError::Io {
            path: output_dir.to_path_buf(),
            source,
        })?;
        debug!(dir = %output_dir.display(), "Writing reduced diagnostics");
        Ok(Self {
            reduced: CsvFile::create(output_dir.join(REDUCED_FILE_NAME))?,
            reference: CsvFile::create(output_dir.join(REFERENCE_FILE_NAME))?,
            history: Vec::new(),
            warned_empty: false,
        })
    }

    /// Appends one row to each history. An empty beam only gets a reference row.
    pub fn write(&mut self, step: usize, container: &ParticleContainer) -> Result<(), DiagnosticsError> {
        self.reference
            .write(&ReferenceRecord::new(step, container.ref_particle()))?;

        match container.reduced_beam_characteristics() {
            Ok(rbc) => {
                let rbc = rbc.at_step(step);
                self.reduced.write(&rbc)?;
                self.history.push(rbc);
            }
            Err(DiagnosticsError::EmptyBeam) => {
                if !self.warned_empty {
                    warn!("Beam is empty; skipping reduced beam characteristics");
                    self.warned_empty = true;
                }
            }
            Err(err) => return Err(err),
        }
        Ok(())
    }

    /// Every reduced row written so far.
    pub fn history(&self) -> &[ReducedBeamCharacteristics] {
        &self.history
    }

    pub fn into_history(self) -> Vec<ReducedBeamCharacteristics> {
        self.history
    }

    pub fn flush(&mut self) -> Result<(), DiagnosticsError> {
        self.reduced.flush()?;
        self.reference.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::constants::ELECTRON_MASS_MEV;
    use tempfile::tempdir;

    fn container() -> ParticleContainer {
        let mut pc = ParticleContainer::new();
        pc.ref_particle_mut()
            .set_charge_qe(1.0)
            .set_mass_mev(ELECTRON_MASS_MEV)
            .unwrap()
            .set_energy_mev(10.0)
            .unwrap();
        pc
    }

    #[test]
    fn writes_header_and_one_row_per_step() {
        let dir = tempdir().unwrap();
        let mut pc = container();
        pc.add_n_particles(&[1e-3, -1e-3], &[0.0; 2], &[0.0; 2], &[0.0; 2], &[0.0; 2], &[0.0; 2], 1.0, 1e-12)
            .unwrap();

        let mut writer = DiagnosticsWriter::create(dir.path()).unwrap();
        writer.write(0, &pc).unwrap();
        pc.ref_particle_mut().s = 1.0;
        writer.write(1, &pc).unwrap();
        writer.flush().unwrap();

        let reduced = std::fs::read_to_string(dir.path().join(REDUCED_FILE_NAME)).unwrap();
        assert!(reduced.starts_with("step,s,ref_beta_gamma,x_mean"));
        assert_eq!(reduced.lines().count(), 3);

        let reference = std::fs::read_to_string(dir.path().join(REFERENCE_FILE_NAME)).unwrap();
        let last = reference.lines().last().unwrap();
        assert!(last.starts_with("1,1.0,"));
        assert_eq!(writer.history().len(), 2);
    }

    #[test]
    fn empty_beam_still_records_reference() {
        let dir = tempdir().unwrap();
        let pc = container();
        let mut writer = DiagnosticsWriter::create(dir.path()).unwrap();
        writer.write(0, &pc).unwrap();
        writer.flush().unwrap();

        let reference = std::fs::read_to_string(dir.path().join(REFERENCE_FILE_NAME)).unwrap();
        assert_eq!(reference.lines().count(), 2);
        let reduced = std::fs::read_to_string(dir.path().join(REDUCED_FILE_NAME)).unwrap();
        assert_eq!(reduced.lines().count(), 0);
        assert!(writer.into_history().is_empty());
    }
}
