use super::config::{ConfigError, SimulationConfig};
use super::error::EngineError;
use super::progress::{Progress, ProgressReporter};
use crate::core::diagnostics::{
    BeamMonitor, DiagnosticsWriter, MonitorId, ReducedBeamCharacteristics,
};
use crate::core::distribution::Distribution;
use crate::core::elements::{BeamOptic, Element};
use crate::core::particles::{ParticleContainer, RefPart};
use rand::SeedableRng;
use rand::rngs::StdRng;
use slotmap::SlotMap;
use tracing::{debug, info, instrument, warn};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Where a simulation is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Configured,
    GridsReady,
    Finalized,
}

/// Snapshot of a simulation's progress, returned by [`Simulation::evolve`].
#[derive(Debug, Clone, PartialEq)]
pub struct EvolveSummary {
    pub periods: usize,
    pub steps: usize,
    pub lattice_elements: usize,
    pub num_particles: usize,
    pub reference: RefPart,
    pub monitor_visits: Vec<(String, usize)>,
}

impl EvolveSummary {
    pub fn final_energy_mev(&self) -> f64 {
        self.reference.energy_mev()
    }
}

/// A beam-dynamics run: the bunch, the lattice, the beam monitors and the diagnostics output.
///
/// The expected call order is `init_grids`, then setting the reference particle, then
/// `add_particles`, `add_monitor` and lattice assembly, then `evolve` and finally `finalize`.
/// Dropping an unfinalized simulation flushes its outputs on a best-effort basis.
pub struct Simulation {
    config: SimulationConfig,
    state: Lifecycle,
    container: ParticleContainer,
    lattice: Vec<Element>,
    monitors: SlotMap<MonitorId, BeamMonitor>,
    diagnostics: Option<DiagnosticsWriter>,
    history: Vec<ReducedBeamCharacteristics>,
    rng: StdRng,
    step: usize,
    periods_done: usize,
}

impl Simulation {
    pub fn new(config: SimulationConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            config,
            state: Lifecycle::Configured,
            container: ParticleContainer::new(),
            lattice: Vec::new(),
            monitors: SlotMap::with_key(),
            diagnostics: None,
            history: Vec::new(),
            rng,
            step: 0,
            periods_done: 0,
        }
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn state(&self) -> Lifecycle {
        self.state
    }

    /// Prepares the simulation for particles.
    ///
    /// Without space charge no field mesh is needed, so this validates the deposition settings and
    /// moves the lifecycle forward.
    pub fn init_grids(&mut self) -> Result<(), EngineError> {
        match self.state {
            Lifecycle::Configured => {}
            Lifecycle::GridsReady => return Err(EngineError::GridsAlreadyInitialized),
            Lifecycle::Finalized => return Err(EngineError::Finalized),
        }
        info!(
            particle_shape = self.config.particle_shape,
            space_charge = self.config.space_charge,
            "Initializing grids"
        );
        if !self.config.space_charge {
            debug!("Space charge is off; no field mesh is allocated");
        }
        self.state = Lifecycle::GridsReady;
        Ok(())
    }

    pub fn particle_container(&self) -> &ParticleContainer {
        &self.container
    }

    pub fn particle_container_mut(&mut self) -> &mut ParticleContainer {
        &mut self.container
    }

    pub fn ref_particle(&self) -> &RefPart {
        self.container.ref_particle()
    }

    pub fn ref_particle_mut(&mut self) -> &mut RefPart {
        self.container.ref_particle_mut()
    }

    /// Samples `count` macro-particles from `distribution` and adds them to the bunch.
    #[instrument(skip_all, fields(count = count, distribution = distribution.name()))]
    pub fn add_particles(
        &mut self,
        bunch_charge_c: f64,
        distribution: &Distribution,
        count: usize,
    ) -> Result<(), EngineError> {
        self.require_grids()?;
        if !self.container.ref_particle().has_energy() {
            return Err(EngineError::ReferenceNotSet);
        }
        if count == 0 {
            return Err(ConfigError::InvalidValue {
                parameter: "num_particles",
                reason: "must be at least 1".into(),
            }
            .into());
        }
        distribution.validate()?;

        let points = distribution.sample_n(count, &mut self.rng);
        let mut columns: [Vec<f64>; 6] = Default::default();
        for column in &mut columns {
            column.reserve(count);
        }
        for p in &points {
            columns[0].push(p.x);
            columns[1].push(p.y);
            columns[2].push(p.t);
            columns[3].push(p.px);
            columns[4].push(p.py);
            columns[5].push(p.pt);
        }
        let [x, y, t, px, py, pt] = &columns;
        let qm = self.container.ref_particle().qm_ratio();
        self.container
            .add_n_particles(x, y, t, px, py, pt, qm, bunch_charge_c)?;

        info!(
            total = self.container.len(),
            charge_c = bunch_charge_c,
            "Added macro-particles"
        );
        Ok(())
    }

    /// Registers a beam monitor; its id can then be placed in the lattice any number of times.
    pub fn add_monitor(&mut self, monitor: BeamMonitor) -> Result<MonitorId, EngineError> {
        if self.state == Lifecycle::Finalized {
            return Err(EngineError::Finalized);
        }
        if self.monitor_by_name(monitor.name()).is_some() {
            return Err(EngineError::DuplicateMonitor(monitor.name().to_string()));
        }
        debug!(name = monitor.name(), backend = monitor.backend().as_str(), "Registered beam monitor");
        Ok(self.monitors.insert(monitor))
    }

    pub fn monitor(&self, id: MonitorId) -> Option<&BeamMonitor> {
        self.monitors.get(id)
    }

    pub fn monitor_by_name(&self, name: &str) -> Option<MonitorId> {
        self.monitors
            .iter()
            .find(|(_, monitor)| monitor.name() == name)
            .map(|(id, _)| id)
    }

    pub fn monitors(&self) -> impl Iterator<Item = (MonitorId, &BeamMonitor)> {
        self.monitors.iter()
    }

    pub fn lattice(&self) -> &[Element] {
        &self.lattice
    }

    pub fn lattice_mut(&mut self) -> &mut Vec<Element> {
        &mut self.lattice
    }

    /// Number of slices pushed so far.
    pub fn step(&self) -> usize {
        self.step
    }

    /// Reduced beam characteristics recorded so far, one entry per diagnostics row.
    pub fn history(&self) -> &[ReducedBeamCharacteristics] {
        match &self.diagnostics {
            Some(writer) => writer.history(),
            None => &self.history,
        }
    }

    pub fn summary(&self) -> EvolveSummary {
        EvolveSummary {
            periods: self.periods_done,
            steps: self.step,
            lattice_elements: self.lattice.len(),
            num_particles: self.container.len(),
            reference: *self.container.ref_particle(),
            monitor_visits: self
                .monitors
                .values()
                .map(|m| (m.name().to_string(), m.visits()))
                .collect(),
        }
    }

    /// Tracks the bunch through `periods` passes of the lattice.
    #[instrument(skip_all, name = "evolve")]
    pub fn evolve(&mut self, reporter: &ProgressReporter) -> Result<EvolveSummary, EngineError> {
        self.require_grids()?;
        if self.config.space_charge {
            return Err(EngineError::SpaceChargeUnsupported);
        }
        if self.lattice.is_empty() {
            return Err(EngineError::EmptyLattice);
        }
        if !self.container.ref_particle().has_energy() {
            return Err(EngineError::ReferenceNotSet);
        }
        for element in &self.lattice {
            if let Element::BeamMonitor(id) = element {
                if !self.monitors.contains_key(*id) {
                    return Err(EngineError::InvalidMonitorId);
                }
            }
        }
        if self.container.is_empty() {
            warn!("No macro-particles in the bunch; only the reference particle is tracked");
        }

        self.open_outputs()?;

        let periods = self.config.periods;
        info!(
            particles = self.container.len(),
            elements = self.lattice.len(),
            periods,
            "Starting tracking"
        );
        reporter.report(Progress::PhaseStart { name: "Tracking" });
        reporter.report(Progress::TaskStart {
            total_steps: (periods * self.lattice.len()) as u64,
        });

        for period in 1..=periods {
            reporter.report(Progress::PeriodStart {
                current: period,
                total: periods,
            });
            self.track_period(reporter)?;
            self.periods_done += 1;
            debug!(
                period,
                s = self.container.ref_particle().s,
                energy_mev = self.container.ref_particle().energy_mev(),
                "Finished period"
            );
        }

        reporter.report(Progress::TaskFinish);
        reporter.report(Progress::PhaseFinish);

        let summary = self.summary();
        info!(
            steps = summary.steps,
            s = summary.reference.s,
            energy_mev = summary.final_energy_mev(),
            "Tracking complete"
        );
        Ok(summary)
    }

    /// Flushes monitors and diagnostics and closes the simulation. Safe to call more than once.
    pub fn finalize(&mut self) -> Result<(), EngineError> {
        if self.state == Lifecycle::Finalized {
            return Ok(());
        }
        self.state = Lifecycle::Finalized;
        for monitor in self.monitors.values_mut() {
            monitor.finalize()?;
        }
        if let Some(mut writer) = self.diagnostics.take() {
            writer.flush()?;
            self.history = writer.into_history();
        }
        info!(steps = self.step, "Simulation finalized");
        Ok(())
    }

    fn require_grids(&self) -> Result<(), EngineError> {
        match self.state {
            Lifecycle::GridsReady => Ok(()),
            Lifecycle::Configured => Err(EngineError::GridsNotInitialized),
            Lifecycle::Finalized => Err(EngineError::Finalized),
        }
    }

    fn open_outputs(&mut self) -> Result<(), EngineError> {
        for monitor in self.monitors.values_mut() {
            monitor.open(&self.config.output_dir)?;
        }
        if self.config.diagnostics && self.diagnostics.is_none() {
            let mut writer = DiagnosticsWriter::create(&self.config.output_dir)?;
            writer.write(self.step, &self.container)?;
            self.diagnostics = Some(writer);
        }
        Ok(())
    }

    fn track_period(&mut self, reporter: &ProgressReporter) -> Result<(), EngineError> {
        let per_slice = self.config.slice_step_diagnostics;
        for element in &self.lattice {
            match element.as_optic() {
                None => {
                    if let Element::BeamMonitor(id) = element {
                        let monitor = self
                            .monitors
                            .get_mut(*id)
                            .ok_or(EngineError::InvalidMonitorId)?;
                        monitor.record(self.step, &self.container)?;
                    }
                }
                Some(optic) => {
                    let refpart = self.container.ref_particle_mut();
                    refpart.sedge = refpart.s;
                    for _ in 0..optic.nslice() {
                        push_slice(optic, &mut self.container);
                        self.step += 1;
                        if per_slice {
                            if let Some(writer) = self.diagnostics.as_mut() {
                                writer.write(self.step, &self.container)?;
                            }
                        }
                    }
                    if !per_slice {
                        if let Some(writer) = self.diagnostics.as_mut() {
                            writer.write(self.step, &self.container)?;
                        }
                    }
                }
            }
            reporter.report(Progress::TaskIncrement);
        }
        Ok(())
    }
}

/// Pushes every particle, then the reference particle, through one slice of `optic`.
fn push_slice(optic: &dyn BeamOptic, container: &mut ParticleContainer) {
    let refpart = *container.ref_particle();
    let particles = container.particles_mut();

    #[cfg(feature = "parallel")]
    particles
        .par_iter_mut()
        .for_each(|p| optic.push_particle(p, &refpart));

    #[cfg(not(feature = "parallel"))]
    particles
        .iter_mut()
        .for_each(|p| optic.push_particle(p, &refpart));

    optic.push_reference(container.ref_particle_mut());
}

impl Drop for Simulation {
    fn drop(&mut self) {
        if let Err(e) = self.finalize() {
            warn!("Failed to finalize simulation on drop: {e}");
        }
    }
}
