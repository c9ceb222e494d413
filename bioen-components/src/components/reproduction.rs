//! Reproduction
//!
//! At each time step mature schools release the seasonal fraction of their
//! gonad reserve as eggs:
//!
//! $$w_{egg} = G \, s(t)$$
//!
//! $$n_{egg} = \frac{w_{egg} \, \rho_{sex}}{w_{1 egg}} N$$
//!
//! When a species has no mature biomass left during the seeding window, a
//! fixed seeding biomass is used instead:
//!
//! $$n_{egg} = \rho_{sex} \, F_{rel} \, s(t) \, B_{seed} \, 10^6$$
//!
//! The eggs of a species are split into at most `n_school` new cohorts.

use bioen_core::errors::BioenResult;
use bioen_core::parameters::SpeciesBioenergeticParameters;
use bioen_core::prey::PreyPool;
use bioen_core::school::School;
use bioen_core::units::tonnes_to_grams;
use log::debug;
use serde::{Deserialize, Serialize};

/// Eggs released by one species during one time step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Spawning {
    /// Biomass of mature schools before spawning
    /// unit: t
    pub spawning_stock_biomass: f64,
    /// Whether the seeding biomass was used
    pub seeded: bool,
    pub n_eggs: f64,
    /// New egg cohorts, not yet placed on the grid
    pub cohorts: Vec<School>,
}

/// Releases the seasonal share of the gonad reserve as egg cohorts.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReproductionAllocator {
    /// Time steps before this one are within the seeding window
    seeding_max_step: usize,
}

impl ReproductionAllocator {
    pub fn new(seeding_max_step: usize) -> Self {
        Self { seeding_max_step }
    }

    /// Release the seasonal fraction of the gonad reserve of a mature school.
    /// Returns the number of eggs laid.
    pub fn release_eggs(
        &self,
        school: &mut School,
        species: &SpeciesBioenergeticParameters,
        step: usize,
    ) -> BioenResult<f64> {
        if !school.is_mature() {
            return Ok(0.0);
        }
        let w_egg = school.gonad_weight() * species.season_fraction(step);
        school.increment_gonad_weight(-w_egg)?;

        let n_eggs =
            w_egg * species.sex_ratio / species.egg_weight_tonnes() * school.instantaneous_abundance();
        school.increment_n_eggs(n_eggs);
        Ok(n_eggs)
    }

    /// Eggs laid from the seeding biomass by a collapsed species.
    pub fn seeding_eggs(&self, species: &SpeciesBioenergeticParameters, step: usize) -> f64 {
        species.sex_ratio
            * species.relative_fecundity
            * species.season_fraction(step)
            * tonnes_to_grams(species.seeding_biomass)
    }

    /// Split `n_eggs` into egg cohorts. A single cohort is created when there
    /// are fewer eggs than cohorts.
    pub fn egg_cohorts(
        &self,
        species_index: usize,
        species: &SpeciesBioenergeticParameters,
        n_eggs: f64,
    ) -> BioenResult<Vec<School>> {
        if !(n_eggs > 0.0) || species.n_school == 0 {
            return Ok(Vec::new());
        }
        let n_school = species.n_school as f64;
        if n_eggs < n_school {
            return Ok(vec![School::egg_cohort(species_index, species, n_eggs)?]);
        }
        (0..species.n_school)
            .map(|_| School::egg_cohort(species_index, species, n_eggs / n_school))
            .collect()
    }

    /// Spawn all schools of one species.
    pub fn spawn<'a>(
        &self,
        species_index: usize,
        species: &SpeciesBioenergeticParameters,
        schools: impl IntoIterator<Item = &'a mut School>,
        step: usize,
    ) -> BioenResult<Spawning> {
        let mut mature: Vec<&mut School> = schools
            .into_iter()
            .filter(|s| s.species() == species_index && s.is_mature() && s.is_alive())
            .collect();
        let spawning_stock_biomass: f64 = mature.iter().map(|s| s.instantaneous_biomass()).sum();

        let seeded = spawning_stock_biomass == 0.0 && step < self.seeding_max_step;
        let n_eggs = if seeded {
            self.seeding_eggs(species, step)
        } else {
            let mut total = 0.0;
            for school in mature.iter_mut() {
                total += self.release_eggs(school, species, step)?;
            }
            total
        };

        let cohorts = self.egg_cohorts(species_index, species, n_eggs)?;
        debug!(
            "{}: {:.3e} eggs in {} cohorts (seeded: {})",
            species.name,
            n_eggs,
            cohorts.len(),
            seeded
        );
        Ok(Spawning {
            spawning_stock_biomass,
            seeded,
            n_eggs,
            cohorts,
        })
    }
}
