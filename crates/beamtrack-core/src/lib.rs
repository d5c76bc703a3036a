//! # beamtrack Core Library
//!
//! Symplectic tracking of charged-particle bunches through accelerator lattices built from
//! drifts, quadrupoles, accelerating sections and thin kicks.
//!
//! ## Architectural Philosophy
//!
//! The library follows a three-layer architecture so that each concern can be tested on its own.
//!
//! - **[`core`]: The Foundation.** Stateless physics: the reference particle, the macro-particle
//!   container, phase-space distributions, the per-element symplectic maps and the reduced
//!   beam diagnostics.
//!
//! - **[`engine`]: The Logic Core.** The stateful [`engine::simulation::Simulation`] handle. It owns
//!   the particle container, the lattice and the beam monitors, enforces the run lifecycle
//!   (`init_grids` → `add_particles` → `evolve` → `finalize`) and drives the particle push.
//!
//! - **[`workflows`]: The Public API.** Describe a complete run as plain data and execute it in a
//!   single call, as the command-line front-end does.

pub mod core;
pub mod engine;
pub mod workflows;
