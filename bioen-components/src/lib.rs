//! Bioenergetic engines
//!
//! Each engine is a small value built from the run parameters and applied to
//! schools one at a time:
//!
//! - [`TemperatureResponse`] and [`OxygenLimitation`]: environmental responses
//! - [`PredationAllocator`]: sharing of prey biomass among predators
//! - [`EnergyBudget`]: net energy, growth and gonad accrual, with [`Maturation`]
//! - [`StarvationMortality`]: repayment of energy deficits
//! - [`ReproductionAllocator`]: egg release and new cohorts
//!
//! Ordering between engines within a time step is the responsibility of the
//! caller.

pub mod components;

pub use components::*;
