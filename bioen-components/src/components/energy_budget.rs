//! Energy budget
//!
//! Turns the biomass ingested by a school during one time step into net
//! energy and splits the surplus between somatic growth and the gonad
//! reserve. Energies are expressed as biomass (t) for the whole school.
//!
//! $$E_{gross} = I \, \alpha \, \phi_T \, f(O_2)$$
//!
//! $$E_{maint} = c_{smr} \, (10^6 w)^{\beta} \, \frac{A(T)}{n_{dt}} \, N \, 10^{-6}$$
//!
//! $$E_{net} = E_{gross} - E_{maint}$$
//!
//! Mature fish route a fraction
//!
//! $$\kappa = 1 - \frac{r}{I_{max} - c_{smr}} (10^6 w)^{1 - \beta}$$
//!
//! of a positive net energy to growth and the rest to the gonad. Immature fish
//! have $\kappa = 1$. A negative net energy is left for starvation to settle.

use crate::components::maturation::Maturation;
use crate::components::oxygen::OxygenLimitation;
use crate::components::temperature::{SampleContext, TemperatureResponse};
use bioen_core::errors::{BioenError, BioenResult};
use bioen_core::parameters::SpeciesBioenergeticParameters;
use bioen_core::physical::FieldSample;
use bioen_core::school::School;
use bioen_core::trait_overrides::BioenTrait;
use bioen_core::units::{grams_to_tonnes, tonnes_to_grams};
use log::warn;
use serde::{Deserialize, Serialize};

/// Environmental response of one school for the current time step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Physiology {
    pub phi_t: f64,
    pub oxygen_factor: f64,
    pub arrhenius: f64,
}

impl Physiology {
    /// Evaluate the temperature and oxygen responses of `species` for a
    /// physical field sample.
    pub fn evaluate(
        species: &SpeciesBioenergeticParameters,
        oxygen: &OxygenLimitation,
        sample: FieldSample,
        context: SampleContext,
    ) -> BioenResult<Self> {
        let temperature = TemperatureResponse::from_parameters(species);
        Ok(Self {
            phi_t: temperature.phi_t(sample.temperature, context)?,
            oxygen_factor: oxygen.factor(sample.oxygen),
            arrhenius: temperature.arrhenius(sample.temperature),
        })
    }
}

/// Turns ingested energy into net energy, somatic growth and gonad reserve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnergyBudget {
    steps_per_year: usize,
}

impl EnergyBudget {
    pub fn new(steps_per_year: usize) -> Self {
        Self { steps_per_year }
    }

    pub fn gross_energy(
        &self,
        ingestion: f64,
        species: &SpeciesBioenergeticParameters,
        physiology: &Physiology,
    ) -> f64 {
        ingestion * species.assimilation * physiology.phi_t * physiology.oxygen_factor
    }

    /// Maintenance cost of the whole school over one time step (t).
    pub fn maintenance(
        &self,
        school: &School,
        species: &SpeciesBioenergeticParameters,
        physiology: &Physiology,
    ) -> f64 {
        let per_fish = species.csmr
            * tonnes_to_grams(school.weight()).powf(species.beta)
            * physiology.arrhenius
            / self.steps_per_year as f64;
        grams_to_tonnes(per_fish * school.instantaneous_abundance())
    }

    /// Check that the somatic allocation of `school` is defined should it be
    /// mature, whatever its current maturity.
    pub fn check_allocation(
        &self,
        school: &School,
        species: &SpeciesBioenergeticParameters,
    ) -> BioenResult<()> {
        let r = school.traits().resolve(BioenTrait::R, species.r);
        let imax = school.traits().resolve(BioenTrait::Imax, species.imax);
        if !(imax - species.csmr > 0.0) {
            return Err(BioenError::InvalidParameter {
                key: format!("{} (species {})", BioenTrait::Imax, school.species()),
                reason: format!(
                    "imax ({}) must exceed csmr ({}) to compute the somatic allocation",
                    imax, species.csmr
                ),
            });
        }
        if !r.is_finite() {
            return Err(BioenError::InvalidParameter {
                key: format!("{} (species {})", BioenTrait::R, school.species()),
                reason: format!("somatic allocation is undefined for r = {}", r),
            });
        }
        Ok(())
    }

    /// Fraction of positive net energy allocated to somatic growth.
    pub fn kappa(&self, school: &School, species: &SpeciesBioenergeticParameters) -> BioenResult<f64> {
        if !school.is_mature() {
            return Ok(1.0);
        }
        self.check_allocation(school, species)?;
        let r = school.traits().resolve(BioenTrait::R, species.r);
        let imax = school.traits().resolve(BioenTrait::Imax, species.imax);
        let denominator = imax - species.csmr;

        let kappa = 1.0 - r / denominator * tonnes_to_grams(school.weight()).powf(1.0 - species.beta);
        if kappa.is_nan() {
            return Err(BioenError::InvalidParameter {
                key: format!("{} (species {})", BioenTrait::R, school.species()),
                reason: format!("somatic allocation is undefined for r = {}", r),
            });
        }
        if !(0.0..=1.0).contains(&kappa) {
            warn!(
                "kappa = {:.4} clamped to [0, 1] for {} (weight {:.3e} t)",
                kappa,
                species.name,
                school.weight()
            );
        }
        Ok(kappa.clamp(0.0, 1.0))
    }

    /// Run the budget for one school and apply growth and gonad accrual.
    pub fn apply(
        &self,
        school: &mut School,
        species: &SpeciesBioenergeticParameters,
        physiology: &Physiology,
    ) -> BioenResult<()> {
        let abundance = school.instantaneous_abundance();
        if abundance <= 0.0 {
            return Err(BioenError::EmptySchool {
                species: school.species(),
            });
        }

        let e_gross = self.gross_energy(school.ingestion(), species, physiology);
        let e_maint = self.maintenance(school, species, physiology);
        school.set_energy_budget(e_gross, e_maint);

        Maturation::new(self.steps_per_year).update(school, species);

        let kappa = self.kappa(school, species)?;
        school.set_kappa(kappa);

        let e_net = school.e_net();
        if e_net > 0.0 {
            let dw = e_net * kappa / abundance;
            let dg = e_net * (1.0 - kappa) / abundance;
            school.increment_weight(dw, species);
            school.increment_gonad_weight(dg)?;
        }
        school.update_ingestion_total();
        Ok(())
    }
}
