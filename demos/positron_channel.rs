//! A 10 GeV positron beam accelerated through 250 periods of a FODO channel, driven through the
//! library API step by step.
//!
//! ```text
//! cargo run --release --example positron_channel
//! ```

use beamtrack::core::constants::ELECTRON_MASS_MEV;
use beamtrack::core::diagnostics::{BeamMonitor, MonitorBackend};
use beamtrack::core::distribution::{Distribution, Moments};
use beamtrack::core::elements::{ChrAcc, ChrDrift, ChrQuad, Element, StrengthUnits};
use beamtrack::engine::config::SimulationConfigBuilder;
use beamtrack::engine::error::EngineError;
use beamtrack::engine::progress::{Progress, ProgressReporter};
use beamtrack::engine::simulation::Simulation;

fn main() -> Result<(), EngineError> {
    let config = SimulationConfigBuilder::new()
        .particle_shape(2)
        .space_charge(false)
        .slice_step_diagnostics(false)
        .periods(250)
        .build()?;
    let mut sim = Simulation::new(config);
    sim.init_grids()?;

    let energy_mev = 10.0e3;
    let bunch_charge_c = 190.0e-12;
    let npart = 10_000;

    sim.ref_particle_mut()
        .set_charge_qe(1.0)
        .set_mass_mev(ELECTRON_MASS_MEV)?
        .set_energy_mev(energy_mev)?;

    let distr = Distribution::Triangle(
        Moments::new(
            5.054566450e-6,
            5.054566450e-6,
            8.43732950e-7,
            1.01091329e-7,
            1.01091329e-7,
            1.0e-2,
        )
        .with_correlations(0.0, 0.0, 0.995037190209989),
    );
    sim.add_particles(bunch_charge_c, &distr, npart)?;

    let monitor = sim.add_monitor(BeamMonitor::new("monitor", MonitorBackend::Csv)?)?;

    let ns = 1;
    let units = StrengthUnits::MaryLie;
    let period: Vec<Element> = vec![
        monitor.into(),
        ChrQuad::new(0.1, -6.674941, units, ns)?.into(),
        ChrDrift::new(0.3, ns)?.into(),
        ChrQuad::new(0.2, 6.674941, units, ns)?.into(),
        ChrDrift::new(0.3, ns)?.into(),
        ChrQuad::new(0.1, -6.674941, units, ns)?.into(),
        ChrDrift::new(0.1, ns)?.into(),
        ChrAcc::new(1.8, 10871.950994502130424, 1.0e-12, ns)?.into(),
        ChrDrift::new(0.1, ns)?.into(),
        monitor.into(),
    ];
    sim.lattice_mut().extend(period);

    let reporter = ProgressReporter::with_callback(Box::new(|event| {
        if let Progress::PeriodStart { current, total } = event {
            if current % 50 == 0 || current == total {
                println!("period {current}/{total}");
            }
        }
    }));
    let summary = sim.evolve(&reporter)?;
    sim.finalize()?;

    println!(
        "final kinetic energy: {:.3} MeV after {:.1} m",
        summary.final_energy_mev(),
        summary.reference.s
    );
    Ok(())
}
