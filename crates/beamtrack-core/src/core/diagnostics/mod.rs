//! Beam diagnostics: reduced statistics of the bunch, beam monitors that record full particle
//! snapshots, and the per-step CSV histories written during tracking.

pub mod monitor;
pub mod output;
pub mod reduced;

pub use monitor::{BeamMonitor, MonitorBackend, MonitorId, MonitorSnapshot};
pub use output::{DiagnosticsWriter, REDUCED_FILE_NAME, REFERENCE_FILE_NAME, ReferenceRecord};
pub use reduced::{DiagnosticsError, ReducedBeamCharacteristics};
