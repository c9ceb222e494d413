//! Core types for bioenergetic school-based fish population models.
//!
//! This crate holds the data model (schools, resources, parameters) and the
//! boundary contracts (prey pools, physical fields, configuration) used by the
//! engines in `bioen-components`.

pub mod config;
pub mod errors;
pub mod mortality;
pub mod parameters;
pub mod physical;
pub mod prey;
pub mod resource;
pub mod school;
pub mod trait_overrides;
pub mod units;
