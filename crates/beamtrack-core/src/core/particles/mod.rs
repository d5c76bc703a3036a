//! The reference particle and the container holding the bunch's macro-particles.

pub mod container;
pub mod reference;

pub use container::{ContainerError, Particle, ParticleContainer};
pub use reference::{RefPart, RefPartError};
