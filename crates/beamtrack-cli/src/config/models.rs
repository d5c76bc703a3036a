use beamtrack::workflows::track::TrackingSetup;
use std::path::PathBuf;

/// A fully merged and validated run configuration.
#[derive(Debug)]
pub struct AppConfig {
    pub config_path: PathBuf,
    pub setup: TrackingSetup,
}
