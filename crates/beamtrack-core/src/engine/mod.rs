//! # Engine Module
//!
//! The stateful half of beamtrack: the [`simulation::Simulation`] handle that owns the bunch, the
//! lattice and the beam monitors and drives the particle push.
//!
//! ## Architecture
//!
//! - **Configuration** ([`config`]) - Simulation options and beam descriptions, built and validated
//!   through builders
//! - **Simulation** ([`simulation`]) - The run lifecycle (`init_grids`, `add_particles`, `evolve`,
//!   `finalize`) and the slice-by-slice push, parallelized with rayon under the `parallel` feature
//! - **Progress Monitoring** ([`progress`]) - Callback-based progress events for front-ends
//! - **Error Handling** ([`error`]) - The engine error type wrapping every lower-level error

pub mod config;
pub mod error;
pub mod progress;
pub mod simulation;
