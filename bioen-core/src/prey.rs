//! What predators see of their prey.
//!
//! Predation only needs two things from a prey pool: how much biomass is
//! currently there and a way to take some of it away. Schools and background
//! resources both implement [`PreyPool`]; nothing else of a school (growth,
//! maturity, energy budget) is reachable through it.

use serde::{Deserialize, Serialize};

/// A pool of biomass that predators can feed upon.
pub trait PreyPool {
    /// Biomass remaining after the mortality already applied this step.
    /// unit: t
    fn instantaneous_biomass(&self) -> f64;

    /// Remove `biomass` tonnes eaten by predators.
    fn register_predation_loss(&mut self, biomass: f64);
}

/// Address of a prey pool within a population.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PreyId {
    School(usize),
    Resource(usize),
}
