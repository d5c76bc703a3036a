use crate::cli::RunArgs;
use crate::config::builder::{CliOverrides, build_config};
use crate::error::Result;
use crate::utils::progress::CliProgressHandler;
use beamtrack::core::diagnostics::{REDUCED_FILE_NAME, REFERENCE_FILE_NAME};
use beamtrack::engine::progress::ProgressReporter;
use beamtrack::workflows::{self, track::TrackingResult};
use tracing::info;

pub fn run(args: RunArgs, quiet: bool) -> Result<()> {
    info!("Merging configuration from file and CLI arguments...");
    let app = build_config(&args.config, &CliOverrides::from(&args))?;
    let setup = &app.setup;

    let progress_handler = if quiet {
        CliProgressHandler::hidden()
    } else {
        CliProgressHandler::new()
    };
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    println!(
        "Tracking {} macro-particles through {} period(s) of a {:.4} m lattice...",
        setup.beam.num_particles,
        setup.simulation.periods,
        setup.period_length()
    );
    info!(config = ?app.config_path, "Invoking the tracking workflow...");

    let result = workflows::track::run(setup, &reporter)?;
    print_report(&result, setup.simulation.diagnostics, &setup.simulation.output_dir);
    Ok(())
}

fn print_report(result: &TrackingResult, diagnostics: bool, output_dir: &std::path::Path) {
    let summary = &result.summary;
    println!(
        "✓ Tracked {} slices over {} period(s); s = {:.6} m",
        summary.steps, summary.periods, summary.reference.s
    );
    println!(
        "  Reference kinetic energy: {:.6} MeV -> {:.6} MeV",
        result.initial_reference.energy_mev(),
        summary.final_energy_mev()
    );
    if let Some(last) = result.history.last() {
        println!(
            "  Normalized rms emittance (x, y, t): {:.4e}, {:.4e}, {:.4e}",
            last.emittance_xn, last.emittance_yn, last.emittance_tn
        );
    }
    for monitor in &result.monitors {
        println!(
            "  Monitor '{}' ({}): {} visit(s)",
            monitor.name,
            monitor.backend.as_str(),
            monitor.visits
        );
    }
    if diagnostics {
        println!(
            "  Diagnostics written to {} and {}",
            output_dir.join(REDUCED_FILE_NAME).display(),
            output_dir.join(REFERENCE_FILE_NAME).display()
        );
    }
}
