use beamtrack::engine::config::{DEFAULT_OUTPUT_DIR, DEFAULT_PARTICLE_SHAPE};

pub struct DefaultsConfig {
    pub particle_shape: u8,
    pub space_charge: bool,
    pub diagnostics: bool,
    pub slice_step_diagnostics: bool,
    pub periods: usize,
    pub output_dir: String,
    pub species: String,
    pub bunch_charge_c: f64,
    pub monitor_backend: String,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            particle_shape: DEFAULT_PARTICLE_SHAPE,
            space_charge: false,
            diagnostics: true,
            slice_step_diagnostics: false,
            periods: 1,
            output_dir: DEFAULT_OUTPUT_DIR.to_string(),
            species: "electron".to_string(),
            bunch_charge_c: 0.0,
            monitor_backend: "csv".to_string(),
        }
    }
}
