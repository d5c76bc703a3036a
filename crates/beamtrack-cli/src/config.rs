//! Run configuration: the TOML file format, built-in defaults and the merge of file values,
//! `-S` overrides and command-line flags into a [`beamtrack::workflows::track::TrackingSetup`].

pub mod builder;
pub mod defaults;
pub mod file;
pub mod models;
