//! Per time step driver of the bioenergetic engines.
//!
//! A time step runs in a fixed order:
//!
//! 1. physical fields are sampled and the encounters validated for every
//!    living school. Any fatal error stops the step before anything changes;
//! 2. the deaths of the previous step are folded into the abundances;
//! 3. predation, over `subdt` sub-steps. Within a sub-step every predator is
//!    evaluated against the same prey state, then all losses are committed;
//! 4. energy budget, growth and gonad accrual;
//! 5. starvation, over `subdt` sub-steps;
//! 6. reproduction, the new egg cohorts being appended to the population;
//! 7. ageing of the schools that existed before the step.
//!
//! Which school meets which prey, and how accessible that prey is, is decided
//! by the spatial and size-selection collaborators and passed in as a list of
//! [`Encounter`]s.

use crate::population::Population;
use bioen_components::{
    EnergyBudget, OxygenLimitation, Physiology, PredationAllocator, PredationOutcome,
    ReproductionAllocator, SampleContext, StarvationMortality,
};
use bioen_core::config::ParameterMap;
use bioen_core::errors::{BioenError, BioenResult};
use bioen_core::mortality::MortalityCause;
use bioen_core::parameters::BioenParameters;
use bioen_core::physical::{PhysicalFieldProvider, PhysicalFields};
use bioen_core::prey::{PreyId, PreyPool};
use bioen_core::school::{School, SchoolSnapshot};
use log::{debug, info, trace};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Prey available to one predator school during a time step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Encounter {
    /// Index of the predator school in the population
    pub predator: usize,
    /// Prey pools with the accessibility of each to the predator
    pub preys: Vec<(PreyId, f64)>,
}

impl Encounter {
    pub fn new(predator: usize, preys: Vec<(PreyId, f64)>) -> Self {
        Self { predator, preys }
    }

    fn prey_ids(&self) -> impl Iterator<Item = PreyId> + '_ {
        self.preys.iter().map(|(id, _)| *id)
    }

    fn accessibility(&self) -> Vec<f64> {
        self.preys.iter().map(|(_, a)| *a).collect()
    }
}

/// Per-species totals of one time step.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpeciesSummary {
    /// Biomass eaten by the schools of the species
    /// unit: t
    pub ingested: f64,
    /// Individuals of the species eaten by predators
    pub predation_deaths: f64,
    pub starvation_deaths: f64,
    /// Biomass of mature schools at spawning
    /// unit: t
    pub spawning_stock_biomass: f64,
    pub n_eggs: f64,
    pub n_new_cohorts: usize,
    pub seeded: bool,
}

/// Diagnostics of one time step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepSummary {
    pub step: usize,
    /// Snapshots of the schools that existed at the start of the step, in
    /// population order
    pub schools: Vec<SchoolSnapshot>,
    pub species: Vec<SpeciesSummary>,
}

/// Bioenergetic engines of a run, with the time step they are at.
#[derive(Debug)]
pub struct BioenSimulation<P> {
    parameters: BioenParameters,
    fields: P,
    oxygen: Vec<OxygenLimitation>,
    predation: PredationAllocator,
    energy_budget: EnergyBudget,
    starvation: StarvationMortality,
    reproduction: ReproductionAllocator,
    time_index: usize,
}

impl BioenSimulation<PhysicalFields> {
    /// Build a simulation with uniform physical fields read from the
    /// configuration.
    pub fn from_config(config: &ParameterMap) -> BioenResult<Self> {
        let parameters = BioenParameters::from_config(config)?;
        let fields = PhysicalFields::from_config(config)?;
        Ok(Self::new(parameters, fields))
    }
}

impl<P: PhysicalFieldProvider> BioenSimulation<P> {
    pub fn new(parameters: BioenParameters, fields: P) -> Self {
        let oxygen = parameters
            .species
            .iter()
            .map(|sp| OxygenLimitation::from_parameters(sp, &parameters.oxygen))
            .collect();
        Self {
            oxygen,
            predation: PredationAllocator::new(parameters.steps_per_year, parameters.subdt),
            energy_budget: EnergyBudget::new(parameters.steps_per_year),
            starvation: StarvationMortality::new(parameters.subdt),
            reproduction: ReproductionAllocator::new(parameters.seeding_max_step),
            parameters,
            fields,
            time_index: 0,
        }
    }

    /// Start counting time steps from `step` instead of 0.
    pub fn with_start_step(mut self, step: usize) -> Self {
        self.time_index = step;
        self
    }

    pub fn parameters(&self) -> &BioenParameters {
        &self.parameters
    }

    pub fn current_step(&self) -> usize {
        self.time_index
    }

    /// Process one time step and move to the next one.
    ///
    /// On error the population is left as it was and the step is not
    /// counted.
    pub fn step(
        &mut self,
        population: &mut Population,
        encounters: &[Encounter],
    ) -> BioenResult<StepSummary> {
        let step = self.time_index;
        for resource in population.resources() {
            resource.validate()?;
        }
        let physiology = self.sample_physiology(population, step)?;
        self.validate_encounters(population, encounters)?;

        let n_existing = population.schools().len();
        for school in population.schools_mut() {
            school.begin_step();
        }

        let mut species = vec![SpeciesSummary::default(); self.parameters.n_species()];

        for _ in 0..self.parameters.subdt {
            self.predation_substep(population, encounters, &physiology, &mut species)?;
        }

        for (school, physiology) in population.schools_mut().iter_mut().zip(&physiology) {
            let Some(physiology) = physiology else {
                continue;
            };
            if !school.is_alive() {
                trace!("school of species {} eaten before its energy budget", school.species());
                continue;
            }
            let sp = self.parameters.species(school.species())?;
            self.energy_budget.apply(school, sp, physiology)?;
        }

        for school in population.schools_mut().iter_mut().take(n_existing) {
            if !school.is_alive() {
                continue;
            }
            let index = school.species();
            let n_dead = self.starvation.apply(school, self.parameters.species(index)?)?;
            species[index].starvation_deaths += n_dead;
        }

        let mut cohorts = Vec::new();
        for (index, sp) in self.parameters.species.iter().enumerate() {
            let spawning =
                self.reproduction
                    .spawn(index, sp, population.schools_mut().iter_mut(), step)?;
            let summary = &mut species[index];
            summary.spawning_stock_biomass = spawning.spawning_stock_biomass;
            summary.n_eggs = spawning.n_eggs;
            summary.n_new_cohorts = spawning.cohorts.len();
            summary.seeded = spawning.seeded;
            cohorts.extend(spawning.cohorts);
        }

        for school in population.schools().iter() {
            if let Some(summary) = species.get_mut(school.species()) {
                summary.predation_deaths += school.n_dead()[MortalityCause::Predation];
            }
        }
        let schools = population.schools().iter().map(School::snapshot).collect();

        for school in population.schools_mut().iter_mut() {
            school.increment_age();
        }
        population.extend_schools(cohorts);

        debug!(
            "step {}: {} schools processed, {} egg cohorts added",
            step,
            n_existing,
            population.schools().len() - n_existing
        );
        self.time_index += 1;

        Ok(StepSummary {
            step,
            schools,
            species,
        })
    }

    /// Run `n_steps` time steps with the same encounters.
    pub fn run(
        &mut self,
        population: &mut Population,
        encounters: &[Encounter],
        n_steps: usize,
    ) -> BioenResult<Vec<StepSummary>> {
        info!("running {} bioenergetic steps from step {}", n_steps, self.time_index);
        (0..n_steps).map(|_| self.step(population, encounters)).collect()
    }

    /// Environmental response of every living school, `None` for the others.
    fn sample_physiology(
        &self,
        population: &Population,
        step: usize,
    ) -> BioenResult<Vec<Option<Physiology>>> {
        population
            .schools()
            .iter()
            .map(|school| {
                if !school.is_alive() {
                    return Ok(None);
                }
                let index = school.species();
                let sp = self.parameters.species(index)?;
                self.energy_budget.check_allocation(school, sp)?;
                let cell = school
                    .cell()
                    .ok_or(BioenError::UnplacedSchool { species: index })?;
                let sample = self.fields.sample(sp.depth_layer, cell, step)?;
                let context = SampleContext {
                    species: index,
                    cell,
                    step,
                };
                Physiology::evaluate(sp, &self.oxygen[index], sample, context).map(Some)
            })
            .collect()
    }

    fn validate_encounters(&self, population: &Population, encounters: &[Encounter]) -> BioenResult<()> {
        for encounter in encounters {
            let predator = population.school(encounter.predator)?;
            let biomass = encounter
                .prey_ids()
                .map(|id| population.prey(id).map(|p| p.instantaneous_biomass()))
                .collect::<BioenResult<Vec<_>>>()?;
            PredationAllocator::accessible_biomass(
                predator.species(),
                &biomass,
                &encounter.accessibility(),
            )?;
        }
        Ok(())
    }

    /// One predation sub-step: every predator is evaluated against the same
    /// prey state, then the losses are committed.
    ///
    /// When the predators of one prey ask for more than it holds, all their
    /// requests are scaled by the same factor.
    fn predation_substep(
        &self,
        population: &mut Population,
        encounters: &[Encounter],
        physiology: &[Option<Physiology>],
        species: &mut [SpeciesSummary],
    ) -> BioenResult<()> {
        let mut requests: Vec<(&Encounter, PredationOutcome)> = Vec::with_capacity(encounters.len());
        for encounter in encounters {
            let predator = population.school(encounter.predator)?;
            let Some(Some(response)) = physiology.get(encounter.predator) else {
                continue;
            };
            if !predator.is_alive() {
                continue;
            }
            let sp = self.parameters.species(predator.species())?;
            let biomass = encounter
                .prey_ids()
                .map(|id| population.prey(id).map(|p| p.instantaneous_biomass()))
                .collect::<BioenResult<Vec<_>>>()?;
            let outcome = self.predation.compute_from_biomass(
                predator,
                sp,
                &biomass,
                &encounter.accessibility(),
                response.oxygen_factor,
            )?;
            requests.push((encounter, outcome));
        }

        let mut requested: BTreeMap<PreyId, f64> = BTreeMap::new();
        for (encounter, outcome) in &requests {
            for (id, loss) in encounter.prey_ids().zip(&outcome.losses) {
                *requested.entry(id).or_default() += loss;
            }
        }

        let mut scale: BTreeMap<PreyId, f64> = BTreeMap::new();
        for (&id, &total) in &requested {
            let prey = population.prey_mut(id)?;
            let available = prey.instantaneous_biomass();
            let factor = if total > available { available / total } else { 1.0 };
            if total > 0.0 {
                prey.register_predation_loss(total * factor);
            }
            scale.insert(id, factor);
        }

        for (encounter, outcome) in &requests {
            let taken: f64 = encounter
                .prey_ids()
                .zip(&outcome.losses)
                .map(|(id, loss)| loss * scale.get(&id).copied().unwrap_or(1.0))
                .sum();
            let predator = population.school_mut(encounter.predator)?;
            predator.increment_ingestion(taken);
            species[predator.species()].ingested += taken;
        }
        Ok(())
    }
}
