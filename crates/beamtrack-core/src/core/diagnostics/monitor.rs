use super::output::{REDUCED_FILE_NAME, REFERENCE_FILE_NAME};
use super::reduced::DiagnosticsError;
use crate::core::particles::{Particle, ParticleContainer, RefPart};
use serde::Serialize;
use slotmap::new_key_type;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::debug;

/// Monitor outputs share the directory with these files.
fn is_reserved_name(name: &str) -> bool {
    [REDUCED_FILE_NAME, REFERENCE_FILE_NAME]
        .iter()
        .filter_map(|file| file.strip_suffix(".csv"))
        .any(|stem| stem.eq_ignore_ascii_case(name))
}

new_key_type! {
    /// Handle of a beam monitor registered with a simulation.
    pub struct MonitorId;
}

/// Where a beam monitor stores its snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MonitorBackend {
    /// One CSV file per monitor, one row per particle per visit.
    #[default]
    Csv,
    /// Snapshots kept in memory, for library users and tests.
    Memory,
}

impl MonitorBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            MonitorBackend::Csv => "csv",
            MonitorBackend::Memory => "memory",
        }
    }
}

impl FromStr for MonitorBackend {
    type Err = DiagnosticsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(MonitorBackend::Csv),
            "memory" => Ok(MonitorBackend::Memory),
            _ => Err(DiagnosticsError::UnsupportedBackend(s.to_string())),
        }
    }
}

/// The full beam as seen by a monitor on one visit.
#[derive(Debug, Clone, PartialEq)]
pub struct MonitorSnapshot {
    pub step: usize,
    pub ref_particle: RefPart,
    pub particles: Vec<Particle>,
}

#[derive(Debug, Serialize)]
struct ParticleRecord {
    step: usize,
    s: f64,
    id: u64,
    x: f64,
    y: f64,
    t: f64,
    px: f64,
    py: f64,
    pt: f64,
    qm: f64,
    weight: f64,
}

#[derive(Debug)]
struct CsvSink {
    path: PathBuf,
    writer: csv::Writer<File>,
}

/// Records the beam every time the tracker passes it.
///
/// A monitor can sit at several places in a lattice; every visit is appended to the same output.
#[derive(Debug)]
pub struct BeamMonitor {
    name: String,
    backend: MonitorBackend,
    sink: Option<CsvSink>,
    snapshots: Vec<MonitorSnapshot>,
    visits: usize,
}

impl BeamMonitor {
    pub fn new(name: impl Into<String>, backend: MonitorBackend) -> Result<Self, DiagnosticsError> {
        let name = name.into();
        if name.trim().is_empty() || name.contains(['/', '\\']) || name == "." || name == ".." {
            return Err(DiagnosticsError::InvalidMonitorName(name));
        }
        if is_reserved_name(&name) {
            return Err(DiagnosticsError::ReservedMonitorName(name));
        }
        Ok(Self {
            name,
            backend,
            sink: None,
            snapshots: Vec::new(),
            visits: 0,
        })
    }

    /// Builds a monitor from a backend name as it appears in a configuration file.
    pub fn with_backend_name(name: impl Into<String>, backend: &str) -> Result<Self, DiagnosticsError> {
        Self::new(name, backend.parse()?)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn backend(&self) -> MonitorBackend {
        self.backend
    }

    pub fn visits(&self) -> usize {
        self.visits
    }

    /// Snapshots recorded so far. Always empty for the CSV backend.
    pub fn snapshots(&self) -> &[MonitorSnapshot] {
        &self.snapshots
    }

    /// Path of the CSV output under `output_dir`.
    pub fn output_path(&self, output_dir: &Path) -> PathBuf {
        output_dir.join(format!("{}.csv", self.name))
    }

    /// Creates the backing file. A no-op for the memory backend or if already open.
    pub fn open(&mut self, output_dir: &Path) -> Result<(), DiagnosticsError> {
        if self.backend != MonitorBackend::Csv || self.sink.is_some() {
            return Ok(());
        }
        fs::create_dir_all(output_dir).map_err(|source| DiagnosticsError::Io {
            path: output_dir.to_path_buf(),
            source,
        })?;
        let path = self.output_path(output_dir);
        let writer = csv::Writer::from_path(&path).map_err(|source| DiagnosticsError::Csv {
            path: path.clone(),
            source,
        })?;
        debug!(monitor = %self.name, path = %path.display(), "Opened beam monitor output");
        self.sink = Some(CsvSink { path, writer });
        Ok(())
    }

    pub fn record(&mut self, step: usize, container: &ParticleContainer) -> Result<(), DiagnosticsError> {
        let refpart = container.ref_particle();
        match self.backend {
            MonitorBackend::Memory => self.snapshots.push(MonitorSnapshot {
                step,
                ref_particle: *refpart,
                particles: container.particles().to_vec(),
            }),
            MonitorBackend::Csv => {
                let sink = self
                    .sink
                    .as_mut()
                    .ok_or_else(|| DiagnosticsError::MonitorNotOpen(self.name.clone()))?;
                for p in container.particles() {
                    let record = ParticleRecord {
                        step,
                        s: refpart.s,
                        id: p.id,
                        x: p.x,
                        y: p.y,
                        t: p.t,
                        px: p.px,
                        py: p.py,
                        pt: p.pt,
                        qm: p.qm,
                        weight: p.weight,
                    };
                    sink.writer
                        .serialize(record)
                        .map_err(|source| DiagnosticsError::Csv {
                            path: sink.path.clone(),
                            source,
                        })?;
                }
            }
        }
        self.visits += 1;
        Ok(())
    }

    /// Flushes and closes the backing file. Safe to call more than once.
    pub fn finalize(&mut self) -> Result<(), DiagnosticsError> {
        if let Some(mut sink) = self.sink.take() {
            sink.writer.flush().map_err(|source| DiagnosticsError::Io {
                path: sink.path.clone(),
                source,
            })?;
            debug!(monitor = %self.name, visits = self.visits, "Closed beam monitor output");
        }
        Ok(())
    }
}
