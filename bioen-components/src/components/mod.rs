mod energy_budget;
mod maturation;
mod oxygen;
mod predation;
mod reproduction;
mod starvation;
mod temperature;

pub use energy_budget::{EnergyBudget, Physiology};
pub use maturation::Maturation;
pub use oxygen::OxygenLimitation;
pub use predation::{PredationAllocator, PredationOutcome};
pub use reproduction::{ReproductionAllocator, Spawning};
pub use starvation::StarvationMortality;
pub use temperature::{SampleContext, TemperatureResponse};
