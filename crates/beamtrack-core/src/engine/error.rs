use thiserror::Error;

use super::config::ConfigError;
use crate::core::diagnostics::DiagnosticsError;
use crate::core::distribution::DistributionError;
use crate::core::elements::ElementError;
use crate::core::particles::{ContainerError, RefPartError};

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Grids must be initialized before particles are added or tracked")]
    GridsNotInitialized,

    #[error("Grids are already initialized")]
    GridsAlreadyInitialized,

    #[error("Simulation has been finalized")]
    Finalized,

    #[error("Reference particle has no mass or energy; set both before adding particles")]
    ReferenceNotSet,

    #[error("Lattice is empty; nothing to track")]
    EmptyLattice,

    #[error("Space-charge field solves are not supported; set space_charge = false")]
    SpaceChargeUnsupported,

    #[error("Lattice references unknown beam monitor '{0}'")]
    UnknownMonitor(String),

    #[error("Lattice references a beam monitor that is not registered with this simulation")]
    InvalidMonitorId,

    #[error("A beam monitor named '{0}' is already registered")]
    DuplicateMonitor(String),

    #[error("Reference particle error: {source}")]
    RefPart {
        #[from]
        source: RefPartError,
    },

    #[error("Particle container error: {source}")]
    Container {
        #[from]
        source: ContainerError,
    },

    #[error("Distribution error: {source}")]
    Distribution {
        #[from]
        source: DistributionError,
    },

    #[error("Lattice element error: {source}")]
    Element {
        #[from]
        source: ElementError,
    },

    #[error("Diagnostics error: {source}")]
    Diagnostics {
        #[from]
        source: DiagnosticsError,
    },
}
