use crate::cli::CheckArgs;
use crate::config::builder::{CliOverrides, build_config};
use crate::error::Result;
use beamtrack::workflows::track::{LatticeItem, TrackingSetup};
use tracing::info;

pub fn run(args: CheckArgs) -> Result<()> {
    let overrides = CliOverrides {
        set_values: args.set_values,
        ..CliOverrides::default()
    };
    let app = build_config(&args.config, &overrides)?;
    info!(config = ?app.config_path, "Configuration is valid");
    print!("{}", describe(&app.setup));
    Ok(())
}

fn describe(setup: &TrackingSetup) -> String {
    let sim = &setup.simulation;
    let beam = &setup.beam;
    let mut out = String::new();
    out.push_str(&format!(
        "Beam: {} macro-particles, {:.6} MeV kinetic, {} distribution\n",
        beam.num_particles,
        beam.kinetic_energy_mev,
        beam.distribution.name()
    ));
    out.push_str(&format!(
        "      charge {} qe, mass {} MeV, bunch charge {:e} C\n",
        beam.species.charge_qe, beam.species.mass_mev, beam.bunch_charge_c
    ));
    out.push_str(&format!(
        "Simulation: {} period(s), particle shape {}, diagnostics {}, output '{}'\n",
        sim.periods,
        sim.particle_shape,
        if sim.diagnostics { "on" } else { "off" },
        sim.output_dir.display()
    ));
    out.push_str(&format!(
        "Lattice: {} item(s), {:.6} m per period, {:.6} m total\n",
        setup.items_per_period(),
        setup.period_length(),
        setup.period_length() * sim.periods as f64
    ));
    for (i, item) in setup.lattice.iter().enumerate() {
        let line = match item {
            LatticeItem::Element(element) => format!(
                "{:>4}  {:<14} ds = {:<10} nslice = {}",
                i + 1,
                element.name(),
                element.length(),
                element.nslice()
            ),
            LatticeItem::Monitor(name) => format!("{:>4}  {:<14} '{}'", i + 1, "BeamMonitor", name),
        };
        out.push_str(line.trim_end());
        out.push('\n');
    }
    if sim.space_charge {
        out.push_str("Warning: space charge is requested but not supported; `run` will fail.\n");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn describe_lists_every_lattice_item() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("run.toml");
        fs::write(
            &path,
            r#"
            [simulation]
            periods = 3

            [beam]
            species = "positron"
            kinetic-energy-mev = 100.0
            num-particles = 10

            [beam.distribution]
            type = "empty"

            [[monitors]]
            name = "m"

            [[lattice]]
            type = "beam-monitor"
            name = "m"

            [[lattice]]
            type = "chr-drift"
            ds = 0.5
            nslice = 2
            "#,
        )
        .unwrap();

        let setup = build_config(&path, &CliOverrides::default()).unwrap().setup;
        let text = describe(&setup);
        assert!(text.contains("10 macro-particles"));
        assert!(text.contains("Empty distribution"));
        assert!(text.contains("2 item(s), 0.500000 m per period, 1.500000 m total"));
        assert!(text.contains("BeamMonitor    'm'"));
        assert!(text.contains("nslice = 2"));
        assert!(!text.contains("Warning"));
    }
}
