//! Predation allocator
//!
//! Shares the ingestion of one predator school among its prey pools in
//! proportion to the biomass it can access, up to a ceiling set by the
//! predator's size and maximum mass-specific ingestion rate.
//!
//! # Algorithm
//!
//! 1. Fish younger than the first-feeding age (eggs) do not feed.
//! 2. Accessible biomass of prey $i$: $B_i = a_i \cdot P_i$ with accessibility
//!    $a_i \in [0, 1]$.
//! 3. Ceiling for the whole school over one sub-step:
//!    $$C = \frac{I_{max}}{n_{sub}} \, (10^6 w)^{\beta} \, N \, 10^{-6}$$
//!    with $w$ in tonnes so that $10^6 w$ is the weight in grams.
//! 4. Predated biomass $P = \min(\sum_i B_i, C)$.
//! 5. Loss of prey $i$: $\frac{B_i}{\sum_j B_j} P f(O_2)$.
//!
//! Computation is read-only: [`PredationAllocator::compute`] returns a
//! [`PredationOutcome`] which is applied separately, so that several
//! predators can be evaluated against the same prey state before any of them
//! is committed.

use bioen_core::errors::{BioenError, BioenResult};
use bioen_core::parameters::SpeciesBioenergeticParameters;
use bioen_core::prey::PreyPool;
use bioen_core::school::School;
use bioen_core::trait_overrides::BioenTrait;
use bioen_core::units::{grams_to_tonnes, tonnes_to_grams};
use log::trace;
use serde::{Deserialize, Serialize};

/// Result of one predator feeding on its prey during one sub-step.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PredationOutcome {
    /// Biomass removed from each prey, parallel to the prey list
    /// unit: t
    pub losses: Vec<f64>,
    /// Sum of the accessible biomass of all prey
    /// unit: t
    pub total_accessible: f64,
    /// Maximum biomass the predator school could eat
    /// unit: t
    pub ceiling: f64,
    /// Biomass credited to the predator (sum of `losses`)
    /// unit: t
    pub ingested: f64,
}

impl PredationOutcome {
    fn nothing(n_prey: usize) -> Self {
        Self {
            losses: vec![0.0; n_prey],
            ..Default::default()
        }
    }
}

/// Splits each predator's ingestion ceiling across its encountered prey.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PredationAllocator {
    steps_per_year: usize,
    subdt: usize,
}

impl PredationAllocator {
    pub fn new(steps_per_year: usize, subdt: usize) -> Self {
        Self {
            steps_per_year,
            subdt,
        }
    }

    /// Whether the predator is old enough to feed.
    pub fn feeds(&self, predator: &School, species: &SpeciesBioenergeticParameters) -> bool {
        predator.age_dt() >= species.first_feeding_age_dt
    }

    /// Maximum mass-specific ingestion rate over one time step.
    ///
    /// Fish younger than one year use the larval rate
    /// `imax + (factor - 1) * c_rate`. The larval rate covers the whole first
    /// year of life, not only the steps before first feeding.
    pub fn max_ingestion_rate(
        &self,
        predator: &School,
        species: &SpeciesBioenergeticParameters,
    ) -> f64 {
        let imax = predator.traits().resolve(BioenTrait::Imax, species.imax);
        let factor = if predator.age(self.steps_per_year) < 1.0 {
            species.larvae_imax_factor
        } else {
            1.0
        };
        (imax + (factor - 1.0) * species.c_rate) / self.steps_per_year as f64
    }

    /// Maximum biomass (t) the whole school can ingest over one sub-step.
    pub fn ceiling(&self, predator: &School, species: &SpeciesBioenergeticParameters) -> f64 {
        let per_fish = self.max_ingestion_rate(predator, species)
            * tonnes_to_grams(predator.weight()).powf(species.beta)
            / self.subdt as f64;
        grams_to_tonnes(per_fish * predator.instantaneous_abundance())
    }

    /// Accessible biomass of each prey.
    pub fn accessible_biomass(
        species: usize,
        prey_biomass: &[f64],
        accessibility: &[f64],
    ) -> BioenResult<Vec<f64>> {
        if prey_biomass.len() != accessibility.len() {
            return Err(BioenError::LengthMismatch {
                expected: prey_biomass.len(),
                found: accessibility.len(),
            });
        }
        prey_biomass
            .iter()
            .zip(accessibility)
            .enumerate()
            .map(|(prey, (&biomass, &access))| {
                if !(0.0..=1.0).contains(&access) {
                    return Err(BioenError::InvalidAccessibility {
                        species,
                        prey,
                        value: access,
                    });
                }
                if !(biomass >= 0.0 && biomass.is_finite()) {
                    return Err(BioenError::NegativeBiomass { prey, biomass });
                }
                Ok(access * biomass)
            })
            .collect()
    }

    /// Share `min(total accessible, ceiling)` among the prey.
    pub fn distribute(accessible: &[f64], ceiling: f64, oxygen_factor: f64) -> PredationOutcome {
        let total_accessible: f64 = accessible.iter().sum();
        if total_accessible <= 0.0 {
            trace!("no accessible prey biomass, predation skipped");
            return PredationOutcome {
                ceiling,
                ..PredationOutcome::nothing(accessible.len())
            };
        }

        let to_predate = total_accessible.min(ceiling);
        let losses: Vec<f64> = accessible
            .iter()
            .map(|biomass| biomass / total_accessible * to_predate * oxygen_factor)
            .collect();
        let ingested = losses.iter().sum();

        PredationOutcome {
            losses,
            total_accessible,
            ceiling,
            ingested,
        }
    }

    /// Compute what `predator` takes from each prey without modifying anything.
    pub fn compute(
        &self,
        predator: &School,
        species: &SpeciesBioenergeticParameters,
        preys: &[&dyn PreyPool],
        accessibility: &[f64],
        oxygen_factor: f64,
    ) -> BioenResult<PredationOutcome> {
        let biomass: Vec<f64> = preys.iter().map(|p| p.instantaneous_biomass()).collect();
        self.compute_from_biomass(predator, species, &biomass, accessibility, oxygen_factor)
    }

    /// As [`compute`](Self::compute), from already sampled prey biomass.
    pub fn compute_from_biomass(
        &self,
        predator: &School,
        species: &SpeciesBioenergeticParameters,
        prey_biomass: &[f64],
        accessibility: &[f64],
        oxygen_factor: f64,
    ) -> BioenResult<PredationOutcome> {
        // Inputs are validated even for predators that do not feed
        let accessible =
            Self::accessible_biomass(predator.species(), prey_biomass, accessibility)?;
        if !self.feeds(predator, species) {
            return Ok(PredationOutcome::nothing(prey_biomass.len()));
        }
        Ok(Self::distribute(
            &accessible,
            self.ceiling(predator, species),
            oxygen_factor,
        ))
    }

    /// Apply an outcome: remove the losses from the prey and credit the
    /// predator's ingestion.
    pub fn commit(predator: &mut School, preys: &mut [&mut dyn PreyPool], outcome: &PredationOutcome) {
        for (prey, &loss) in preys.iter_mut().zip(&outcome.losses) {
            if loss > 0.0 {
                prey.register_predation_loss(loss);
            }
        }
        predator.increment_ingestion(outcome.ingested);
    }
}
