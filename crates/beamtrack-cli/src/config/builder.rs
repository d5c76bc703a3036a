use super::defaults::DefaultsConfig;
use super::file::{FileConfig, FileDistribution, FileLatticeItem, FileMoments};
use super::models::AppConfig;
use crate::cli::RunArgs;
use crate::error::{CliError, Result};
use beamtrack::core::diagnostics::MonitorBackend;
use beamtrack::core::distribution::{Distribution, Moments};
use beamtrack::core::elements::{
    ChrAcc, ChrDrift, ChrQuad, ConstF, Drift, Element, ElementError, Marker, Multipole,
    NonlinearLens, PRot, Quad, StrengthUnits,
};
use beamtrack::engine::config::{BeamConfigBuilder, SimulationConfigBuilder};
use beamtrack::workflows::track::{LatticeItem, MonitorSpec, TrackingSetup};
use std::path::{Path, PathBuf};
use toml::{Table, Value};
use tracing::debug;

/// Command-line values that take precedence over the configuration file.
#[derive(Debug, Default, Clone)]
pub struct CliOverrides {
    pub output_dir: Option<PathBuf>,
    pub periods: Option<usize>,
    pub num_particles: Option<usize>,
    pub seed: Option<u64>,
    pub no_diagnostics: bool,
    pub set_values: Vec<String>,
}

impl From<&RunArgs> for CliOverrides {
    fn from(args: &RunArgs) -> Self {
        Self {
            output_dir: args.output_dir.clone(),
            periods: args.periods,
            num_particles: args.num_particles,
            seed: args.seed,
            no_diagnostics: args.no_diagnostics,
            set_values: args.set_values.clone(),
        }
    }
}

/// Reads `config_path`, applies `-S` overrides and then the command-line flags.
pub fn build_config(config_path: &Path, overrides: &CliOverrides) -> Result<AppConfig> {
    let mut table = FileConfig::read_table(config_path)?;
    apply_set_values(&mut table, &overrides.set_values)?;
    let file_config = FileConfig::from_table(table, config_path)?;
    let setup = merge(file_config, overrides)?;
    Ok(AppConfig {
        config_path: config_path.to_path_buf(),
        setup,
    })
}

/// Applies `KEY=VALUE` overrides to the raw TOML table. Keys are dotted paths; numeric segments
/// index into arrays, so `lattice.2.k=1.5` edits the third lattice item. Values are parsed as
/// TOML and fall back to plain strings.
fn apply_set_values(table: &mut Table, set_values: &[String]) -> Result<()> {
    for kv_pair in set_values {
        let Some((key, value_str)) = kv_pair.split_once('=') else {
            return Err(CliError::Config(format!(
                "Invalid --set format: '{}'. Expected KEY=VALUE.",
                kv_pair
            )));
        };
        let key = key.trim();
        let segments: Vec<&str> = key.split('.').collect();
        if segments.iter().any(|s| s.is_empty()) {
            return Err(CliError::Config(format!(
                "Invalid configuration key for --set: '{}'",
                key
            )));
        }
        debug!(key, value = value_str, "Applying configuration override");
        set_path(table, &segments, parse_value(value_str.trim()), key)?;
    }
    Ok(())
}

fn parse_value(raw: &str) -> Value {
    toml::from_str::<Table>(&format!("v = {raw}"))
        .ok()
        .and_then(|mut t| t.remove("v"))
        .unwrap_or_else(|| Value::String(raw.to_string()))
}

fn set_path(table: &mut Table, segments: &[&str], value: Value, key: &str) -> Result<()> {
    let (first, rest) = match segments.split_first() {
        Some(split) => split,
        None => return Ok(()),
    };
    if rest.is_empty() {
        table.insert(first.to_string(), value);
        return Ok(());
    }
    let child = table
        .entry(first.to_string())
        .or_insert_with(|| Value::Table(Table::new()));
    set_in_value(child, rest, value, key)
}

fn set_in_value(node: &mut Value, segments: &[&str], value: Value, key: &str) -> Result<()> {
    match node {
        Value::Table(table) => set_path(table, segments, value, key),
        Value::Array(items) => {
            let index: usize = segments[0].parse().map_err(|_| {
                CliError::Config(format!(
                    "Expected an array index in '{}', found '{}'",
                    key, segments[0]
                ))
            })?;
            let len = items.len();
            let item = items.get_mut(index).ok_or_else(|| {
                CliError::Config(format!(
                    "Index {} in '{}' is out of range ({} entries)",
                    index, key, len
                ))
            })?;
            if segments.len() == 1 {
                *item = value;
                Ok(())
            } else {
                set_in_value(item, &segments[1..], value, key)
            }
        }
        _ => Err(CliError::Config(format!(
            "Cannot set '{}': '{}' is not a table",
            key, segments[0]
        ))),
    }
}

fn merge(file_config: FileConfig, overrides: &CliOverrides) -> Result<TrackingSetup> {
    let defaults = DefaultsConfig::default();

    let sim_file = file_config.simulation.unwrap_or_default();
    let simulation = SimulationConfigBuilder::new()
        .particle_shape(sim_file.particle_shape.unwrap_or(defaults.particle_shape))
        .space_charge(sim_file.space_charge.unwrap_or(defaults.space_charge))
        .diagnostics(if overrides.no_diagnostics {
            false
        } else {
            sim_file.diagnostics.unwrap_or(defaults.diagnostics)
        })
        .slice_step_diagnostics(
            sim_file
                .slice_step_diagnostics
                .unwrap_or(defaults.slice_step_diagnostics),
        )
        .periods(
            overrides
                .periods
                .or(sim_file.periods)
                .unwrap_or(defaults.periods),
        )
        .output_dir(
            overrides
                .output_dir
                .clone()
                .or(sim_file.output_dir)
                .unwrap_or_else(|| PathBuf::from(&defaults.output_dir)),
        )
        .seed(overrides.seed.or(sim_file.seed))
        .build()
        .map_err(|e| CliError::Config(e.to_string()))?;

    let beam_file = file_config
        .beam
        .ok_or_else(|| CliError::Config("missing [beam] section".to_string()))?;
    let mut beam = BeamConfigBuilder::new()
        .species(beam_file.species.unwrap_or(defaults.species))
        .bunch_charge_c(beam_file.bunch_charge_c.unwrap_or(defaults.bunch_charge_c));
    if let Some(charge) = beam_file.charge_qe {
        beam = beam.charge_qe(charge);
    }
    if let Some(mass) = beam_file.mass_mev {
        beam = beam.mass_mev(mass);
    }
    if let Some(energy) = beam_file.kinetic_energy_mev {
        beam = beam.kinetic_energy_mev(energy);
    }
    if let Some(n) = overrides.num_particles.or(beam_file.num_particles) {
        beam = beam.num_particles(n);
    }
    if let Some(distribution) = beam_file.distribution {
        beam = beam.distribution(distribution.into());
    }
    let beam = beam.build().map_err(|e| CliError::Config(e.to_string()))?;

    let monitors = file_config
        .monitors
        .into_iter()
        .map(|m| {
            let backend = m
                .backend
                .unwrap_or_else(|| defaults.monitor_backend.clone())
                .parse::<MonitorBackend>()
                .map_err(|e| CliError::Config(format!("monitor '{}': {}", m.name, e)))?;
            Ok(MonitorSpec {
                name: m.name,
                backend,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    if file_config.lattice.is_empty() {
        return Err(CliError::Config(
            "the lattice is empty; add at least one [[lattice]] item".to_string(),
        ));
    }
    let lattice = file_config
        .lattice
        .into_iter()
        .enumerate()
        .map(|(i, item)| {
            lattice_item(item)
                .map_err(|e| CliError::Config(format!("lattice item {}: {}", i + 1, e)))
        })
        .collect::<Result<Vec<_>>>()?;

    let setup = TrackingSetup {
        simulation,
        beam,
        monitors,
        lattice,
    };
    setup
        .validate_monitors()
        .map_err(|e| CliError::Config(e.to_string()))?;
    Ok(setup)
}

impl From<FileMoments> for Moments {
    fn from(m: FileMoments) -> Self {
        Moments::new(
            m.sigma_x,
            m.sigma_y,
            m.sigma_t,
            m.sigma_px,
            m.sigma_py,
            m.sigma_pt,
        )
        .with_correlations(m.mu_xpx, m.mu_ypy, m.mu_tpt)
    }
}

impl From<FileDistribution> for Distribution {
    fn from(d: FileDistribution) -> Self {
        match d {
            FileDistribution::Empty {} => Distribution::Empty,
            FileDistribution::Gaussian(m) => Distribution::Gaussian(m.into()),
            FileDistribution::Waterbag(m) => Distribution::Waterbag(m.into()),
            FileDistribution::Kurth4d(m) => Distribution::Kurth4D(m.into()),
            FileDistribution::Triangle(m) => Distribution::Triangle(m.into()),
        }
    }
}

fn lattice_item(item: FileLatticeItem) -> std::result::Result<LatticeItem, ElementError> {
    let element: Element = match item {
        FileLatticeItem::BeamMonitor { name } => return Ok(LatticeItem::Monitor(name)),
        FileLatticeItem::Drift { ds, nslice } => Drift::new(ds, nslice)?.into(),
        FileLatticeItem::ChrDrift { ds, nslice } => ChrDrift::new(ds, nslice)?.into(),
        FileLatticeItem::Quad { ds, k, nslice } => Quad::new(ds, k, nslice)?.into(),
        FileLatticeItem::ChrQuad {
            ds,
            k,
            units,
            nslice,
        } => ChrQuad::new(ds, k, StrengthUnits::from_code(units)?, nslice)?.into(),
        FileLatticeItem::ChrAcc { ds, ez, bz, nslice } => ChrAcc::new(ds, ez, bz, nslice)?.into(),
        FileLatticeItem::ConstF {
            ds,
            kx,
            ky,
            kt,
            nslice,
        } => ConstF::new(ds, kx, ky, kt, nslice)?.into(),
        FileLatticeItem::Multipole {
            multipole,
            k_normal,
            k_skew,
        } => Multipole::new(multipole, k_normal, k_skew)?.into(),
        FileLatticeItem::NonlinearLens { knll, cnll } => NonlinearLens::new(knll, cnll)?.into(),
        FileLatticeItem::PRot { phi_in, phi_out } => PRot::new(phi_in, phi_out)?.into(),
        FileLatticeItem::Marker {} => Marker.into(),
    };
    Ok(LatticeItem::Element(element))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    const MINIMAL: &str = r#"
        [simulation]
        periods = 4
        output-dir = "from-file"

        [beam]
        species = "proton"
        kinetic-energy-mev = 250.0
        bunch-charge-c = 1.0e-9
        num-particles = 200

        [beam.distribution]
        type = "gaussian"
        sigma-x = 1.0e-3
        sigma-y = 1.0e-3
        sigma-t = 1.0e-3
        sigma-px = 1.0e-4
        sigma-py = 1.0e-4
        sigma-pt = 1.0e-3

        [[monitors]]
        name = "start"
        backend = "memory"

        [[lattice]]
        type = "beam-monitor"
        name = "start"

        [[lattice]]
        type = "drift"
        ds = 0.25

        [[lattice]]
        type = "quad"
        ds = 0.5
        k = 1.2
        nslice = 4
    "#;

    fn write_config(content: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempdir().unwrap();
        let path = dir.path().join("run.toml");
        fs::write(&path, content).unwrap();
        (dir, path)
    }

    #[test]
    fn file_values_fill_in_the_setup() {
        let (_dir, path) = write_config(MINIMAL);
        let app = build_config(&path, &CliOverrides::default()).unwrap();
        let setup = app.setup;

        assert_eq!(setup.simulation.periods, 4);
        assert_eq!(setup.simulation.output_dir, PathBuf::from("from-file"));
        assert_eq!(setup.simulation.particle_shape, 2);
        assert!(setup.simulation.diagnostics);
        assert_eq!(setup.beam.species.charge_qe, 1.0);
        assert_eq!(setup.beam.num_particles, 200);
        assert!(matches!(setup.beam.distribution, Distribution::Gaussian(_)));
        assert_eq!(setup.monitors[0].backend, MonitorBackend::Memory);
        assert_eq!(setup.lattice.len(), 3);
        assert_eq!(setup.lattice[0], LatticeItem::Monitor("start".into()));
        assert!((setup.period_length() - 0.75).abs() < 1e-12);
    }

    #[test]
    fn cli_flags_beat_set_values_which_beat_the_file() {
        let (_dir, path) = write_config(MINIMAL);
        let overrides = CliOverrides {
            periods: Some(9),
            no_diagnostics: true,
            seed: Some(11),
            set_values: vec![
                "simulation.periods=7".to_string(),
                "beam.num-particles=50".to_string(),
                "lattice.2.k=-0.8".to_string(),
                "simulation.output-dir=elsewhere".to_string(),
            ],
            ..CliOverrides::default()
        };
        let setup = build_config(&path, &overrides).unwrap().setup;

        assert_eq!(setup.simulation.periods, 9);
        assert_eq!(setup.beam.num_particles, 50);
        assert_eq!(setup.simulation.output_dir, PathBuf::from("elsewhere"));
        assert_eq!(setup.simulation.seed, Some(11));
        assert!(!setup.simulation.diagnostics);
        assert_eq!(
            setup.lattice[2],
            LatticeItem::Element(Quad::new(0.5, -0.8, 4).unwrap().into())
        );
    }

    #[test]
    fn malformed_set_values_are_rejected() {
        let (_dir, path) = write_config(MINIMAL);
        for bad in ["simulation.periods", "lattice.x.k=1", "lattice.10.k=1", "beam..species=x"] {
            let overrides = CliOverrides {
                set_values: vec![bad.to_string()],
                ..CliOverrides::default()
            };
            assert!(
                matches!(build_config(&path, &overrides), Err(CliError::Config(_))),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn unknown_set_key_is_reported_as_a_parse_error() {
        let (_dir, path) = write_config(MINIMAL);
        let overrides = CliOverrides {
            set_values: vec!["simulation.warp-factor=9".to_string()],
            ..CliOverrides::default()
        };
        assert!(matches!(
            build_config(&path, &overrides),
            Err(CliError::FileParsing { .. })
        ));
    }

    #[test]
    fn monitor_references_must_be_declared() {
        let content = MINIMAL.replace("name = \"start\"\n        backend", "name = \"other\"\n        backend");
        let (_dir, path) = write_config(&content);
        let err = build_config(&path, &CliOverrides::default()).unwrap_err();
        assert!(err.to_string().contains("start"));
    }

    #[test]
    fn unsupported_backend_is_rejected() {
        let content = MINIMAL.replace("\"memory\"", "\"h5\"");
        let (_dir, path) = write_config(&content);
        let err = build_config(&path, &CliOverrides::default()).unwrap_err();
        assert!(matches!(err, CliError::Config(ref msg) if msg.contains("h5")));
    }

    #[test]
    fn invalid_element_parameters_name_the_item() {
        let content = MINIMAL.replace("nslice = 4", "nslice = 0");
        let (_dir, path) = write_config(&content);
        let err = build_config(&path, &CliOverrides::default()).unwrap_err();
        assert!(matches!(err, CliError::Config(ref msg) if msg.contains("lattice item 3")));
    }

    #[test]
    fn positron_channel_demo_matches_the_reference_run() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../demos/positron_channel.toml");
        let setup = build_config(&path, &CliOverrides::default()).unwrap().setup;

        assert_eq!(setup.beam.kinetic_energy_mev, 10000.0);
        assert_eq!(setup.beam.num_particles, 10000);
        assert_eq!(setup.simulation.periods, 250);
        assert_eq!(setup.beam.bunch_charge_c, 190.0e-12);
        assert_eq!(setup.beam.species.charge_qe, 1.0);
        assert!(!setup.simulation.space_charge);
        assert!(matches!(setup.beam.distribution, Distribution::Triangle(m) if m.mu_tpt == 0.995037190209989));
        assert_eq!(setup.items_per_period(), 10);
        assert_eq!(setup.lattice[0], LatticeItem::Monitor("monitor".into()));
        assert_eq!(setup.lattice[9], LatticeItem::Monitor("monitor".into()));
        assert_eq!(
            setup.lattice[7],
            LatticeItem::Element(ChrAcc::new(1.8, 10871.950994502130424, 1.0e-12, 1).unwrap().into())
        );
        assert!((setup.period_length() - 3.0).abs() < 1e-12);
    }

    #[test]
    fn marker_items_pass_through_to_the_lattice() {
        let content = MINIMAL.replace(
            "type = \"drift\"",
            "type = \"none\"\n\n        [[lattice]]\n        type = \"drift\"",
        );
        let (_dir, path) = write_config(&content);
        let setup = build_config(&path, &CliOverrides::default()).unwrap().setup;
        assert_eq!(setup.lattice.len(), 4);
        assert_eq!(setup.lattice[1], LatticeItem::Element(Marker.into()));
        assert!((setup.period_length() - 0.75).abs() < 1e-12);
    }

    #[test]
    fn missing_beam_section_is_a_config_error() {
        let (_dir, path) = write_config(
            r#"
            [[lattice]]
            type = "drift"
            ds = 1.0
            "#,
        );
        assert!(matches!(
            build_config(&path, &CliOverrides::default()),
            Err(CliError::Config(_))
        ));
    }
}
