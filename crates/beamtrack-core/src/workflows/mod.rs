//! # Workflows Module
//!
//! High-level entry points that run a complete simulation from a plain-data description.
//!
//! - **Tracking Workflow** ([`track`]) - Builds the reference particle, the bunch, the beam
//!   monitors and the lattice from a [`track::TrackingSetup`], tracks the bunch for the requested
//!   number of periods and finalizes all outputs.

pub mod track;
