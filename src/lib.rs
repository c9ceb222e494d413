//! Bioenergetic growth, predation and starvation for school-based fish
//! population models.
//!
//! Schools of fish feed on each other and on background resources, turn what
//! they eat into net energy according to temperature and oxygen, grow, build
//! a gonad reserve, spawn, and die of starvation when their energy budget
//! stays negative.
//!
//! The data model and boundary contracts live in [`bioen_core`], the engines
//! in [`bioen_components`]. This crate ties them together with a
//! [`Population`] container and a [`BioenSimulation`] that runs the engines
//! in order for one time step at a time.

pub mod population;
pub mod simulation;

pub use bioen_components;
pub use bioen_core;

pub use population::Population;
pub use simulation::{BioenSimulation, Encounter, SpeciesSummary, StepSummary};
