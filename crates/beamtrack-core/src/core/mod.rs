//! # Core Module
//!
//! This module provides the physics building blocks of beamtrack.
//!
//! ## Overview
//!
//! Everything in here is free of run-time state: the types describe particles, distributions
//! and lattice elements, and the functions map a particle's phase-space coordinates through one
//! slice of an element. The stateful orchestration lives in [`crate::engine`].
//!
//! ## Architecture
//!
//! - **Constants** ([`constants`]) - Physical constants and the built-in particle species table
//! - **Particles** ([`particles`]) - The reference particle and the macro-particle container
//! - **Distributions** ([`distribution`]) - Parametric 6D phase-space samplers
//! - **Elements** ([`elements`]) - Drifts, quadrupoles, accelerating sections, thin kicks, monitors
//! - **Diagnostics** ([`diagnostics`]) - Reduced beam moments and monitor output
//!
//! ## Coordinates
//!
//! Particles carry `(x, y, t, px, py, pt)` relative to the reference particle. Positions are in
//! meters (`t` is `c` times the arrival-time deviation), momenta are normalized to the reference
//! momentum and `pt` is the negative energy deviation over `p0 c`.

pub mod constants;
pub mod diagnostics;
pub mod distribution;
pub mod elements;
pub mod particles;
