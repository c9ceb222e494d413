//! Background (non individual-based) biomass pools such as plankton groups.

use crate::errors::{BioenError, BioenResult};
use crate::prey::PreyPool;
use serde::{Deserialize, Serialize};

/// A resource pool only tracks its biomass and what predators removed from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    pub name: String,
    /// Biomass at the start of the step
    /// unit: t
    biomass: f64,
    /// Biomass eaten so far this step
    /// unit: t
    predated: f64,
}

impl Resource {
    /// A pool holding `biomass` tonnes. Negative or non-finite biomass is
    /// rejected.
    pub fn new(name: impl Into<String>, biomass: f64) -> BioenResult<Self> {
        let resource = Self {
            name: name.into(),
            biomass,
            predated: 0.0,
        };
        resource.validate()?;
        Ok(resource)
    }

    pub fn biomass(&self) -> f64 {
        self.biomass
    }

    pub fn predated(&self) -> f64 {
        self.predated
    }

    /// Replace the biomass with this step's forcing value and clear the
    /// predation counter. An invalid forcing value leaves the pool unchanged.
    pub fn begin_step(&mut self, biomass: f64) -> BioenResult<()> {
        check_biomass(&self.name, biomass)?;
        self.biomass = biomass;
        self.predated = 0.0;
        Ok(())
    }

    /// Check the forcing biomass, e.g. after deserialisation.
    pub fn validate(&self) -> BioenResult<()> {
        check_biomass(&self.name, self.biomass)
    }
}

fn check_biomass(name: &str, biomass: f64) -> BioenResult<()> {
    if biomass >= 0.0 && biomass.is_finite() {
        Ok(())
    } else {
        Err(BioenError::InvalidResourceBiomass {
            name: name.to_string(),
            biomass,
        })
    }
}

impl PreyPool for Resource {
    fn instantaneous_biomass(&self) -> f64 {
        // predated can exceed biomass by rounding only
        (self.biomass - self.predated).max(0.0)
    }

    fn register_predation_loss(&mut self, biomass: f64) {
        self.predated += biomass;
    }
}
