use crate::core::diagnostics::{
    BeamMonitor, MonitorBackend, MonitorSnapshot, ReducedBeamCharacteristics,
};
use crate::core::elements::Element;
use crate::core::particles::RefPart;
use crate::engine::config::{BeamConfig, SimulationConfig};
use crate::engine::error::EngineError;
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::simulation::{EvolveSummary, Simulation};
use std::collections::HashSet;
use tracing::{info, instrument};

/// A beam monitor declared by name, to be referenced from the lattice.
#[derive(Debug, Clone, PartialEq)]
pub struct MonitorSpec {
    pub name: String,
    pub backend: MonitorBackend,
}

/// One entry of a lattice description.
#[derive(Debug, Clone, PartialEq)]
pub enum LatticeItem {
    Element(Element),
    /// Placement of the declared monitor with this name.
    Monitor(String),
}

impl From<Element> for LatticeItem {
    fn from(element: Element) -> Self {
        LatticeItem::Element(element)
    }
}

/// A complete run described as plain data.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackingSetup {
    pub simulation: SimulationConfig,
    pub beam: BeamConfig,
    pub monitors: Vec<MonitorSpec>,
    /// One lattice period; it is traversed `simulation.periods` times.
    pub lattice: Vec<LatticeItem>,
}

impl TrackingSetup {
    /// Length of one lattice period, in m.
    pub fn period_length(&self) -> f64 {
        self.lattice
            .iter()
            .map(|item| match item {
                LatticeItem::Element(element) => element.length(),
                LatticeItem::Monitor(_) => 0.0,
            })
            .sum()
    }

    /// Number of lattice items in one period, monitors included.
    pub fn items_per_period(&self) -> usize {
        self.lattice.len()
    }

    /// Checks that monitor names are unique and that every lattice reference is declared.
    pub fn validate_monitors(&self) -> Result<(), EngineError> {
        let mut declared = HashSet::new();
        for monitor in &self.monitors {
            if !declared.insert(monitor.name.as_str()) {
                return Err(EngineError::DuplicateMonitor(monitor.name.clone()));
            }
        }
        for item in &self.lattice {
            if let LatticeItem::Monitor(name) = item {
                if !declared.contains(name.as_str()) {
                    return Err(EngineError::UnknownMonitor(name.clone()));
                }
            }
        }
        Ok(())
    }
}

/// What a beam monitor saw during the run.
#[derive(Debug, Clone, PartialEq)]
pub struct MonitorReport {
    pub name: String,
    pub backend: MonitorBackend,
    pub visits: usize,
    /// Snapshots of memory-backed monitors; empty for file-backed ones.
    pub snapshots: Vec<MonitorSnapshot>,
}

#[derive(Debug, Clone)]
pub struct TrackingResult {
    pub initial_reference: RefPart,
    pub summary: EvolveSummary,
    pub history: Vec<ReducedBeamCharacteristics>,
    pub monitors: Vec<MonitorReport>,
}

/// Configures a simulation from `setup`, tracks the bunch and finalizes all outputs.
#[instrument(skip_all, name = "tracking_workflow")]
pub fn run(setup: &TrackingSetup, reporter: &ProgressReporter) -> Result<TrackingResult, EngineError> {
    setup.validate_monitors()?;

    // === Phase 1: Simulation, reference particle and bunch ===
    reporter.report(Progress::PhaseStart { name: "Setup" });
    let mut sim = Simulation::new(setup.simulation.clone());
    sim.init_grids()?;

    let beam = &setup.beam;
    sim.ref_particle_mut()
        .set_charge_qe(beam.species.charge_qe)
        .set_mass_mev(beam.species.mass_mev)?
        .set_energy_mev(beam.kinetic_energy_mev)?;
    let initial_reference = *sim.ref_particle();
    info!(
        energy_mev = beam.kinetic_energy_mev,
        distribution = beam.distribution.name(),
        particles = beam.num_particles,
        "Configured reference particle and bunch"
    );
    sim.add_particles(beam.bunch_charge_c, &beam.distribution, beam.num_particles)?;

    // === Phase 2: Monitors and lattice ===
    for monitor in &setup.monitors {
        sim.add_monitor(BeamMonitor::new(monitor.name.clone(), monitor.backend)?)?;
    }
    let mut lattice = Vec::with_capacity(setup.lattice.len());
    for item in &setup.lattice {
        let element = match item {
            LatticeItem::Element(element) => element.clone(),
            LatticeItem::Monitor(name) => Element::BeamMonitor(
                sim.monitor_by_name(name)
                    .ok_or_else(|| EngineError::UnknownMonitor(name.clone()))?,
            ),
        };
        lattice.push(element);
    }
    sim.lattice_mut().extend(lattice);
    reporter.report(Progress::PhaseFinish);

    // === Phase 3: Tracking ===
    let summary = sim.evolve(reporter)?;

    // === Phase 4: Cleanup ===
    sim.finalize()?;
    let monitors = sim
        .monitors()
        .map(|(_, monitor)| MonitorReport {
            name: monitor.name().to_string(),
            backend: monitor.backend(),
            visits: monitor.visits(),
            snapshots: monitor.snapshots().to_vec(),
        })
        .collect();

    info!(
        final_energy_mev = summary.final_energy_mev(),
        s = summary.reference.s,
        "Workflow complete"
    );
    Ok(TrackingResult {
        initial_reference,
        history: sim.history().to_vec(),
        summary,
        monitors,
    })
}
