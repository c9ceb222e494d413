//! Schools: cohorts of identical individuals of one species.
//!
//! Masses are stored in tonnes. `weight` and `gonad_weight` are per
//! individual; `ingestion` and the energy fluxes are for the whole school
//! during the current time step.

use crate::errors::{BioenError, BioenResult};
use crate::mortality::{MortalityCause, MortalityCounts};
use crate::parameters::SpeciesBioenergeticParameters;
use crate::physical::Cell;
use crate::prey::PreyPool;
use crate::trait_overrides::TraitOverrides;
use serde::{Deserialize, Serialize};

/// Maturity state of a school. Transitions only from immature to mature.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Maturity {
    Immature,
    Mature {
        /// Age at maturation (years)
        age: f64,
        /// Length at maturation (cm)
        length: f64,
    },
}

impl Maturity {
    pub fn is_mature(&self) -> bool {
        matches!(self, Maturity::Mature { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct School {
    species: usize,
    traits: TraitOverrides,
    cell: Option<Cell>,
    /// Number of individuals at the start of the step
    abundance: f64,
    n_dead: MortalityCounts,
    /// unit: t
    weight: f64,
    /// unit: cm
    length: f64,
    age_dt: usize,
    /// unit: t
    gonad_weight: f64,
    /// unit: t
    ingestion: f64,
    /// Cumulative ingestion per individual since birth
    /// unit: t
    ingestion_total: f64,
    e_gross: f64,
    e_maint: f64,
    e_net: f64,
    kappa: f64,
    maturity: Maturity,
    n_eggs: f64,
}

impl School {
    /// Create a school of `abundance` individuals weighing `weight` tonnes.
    pub fn new(species: usize, abundance: f64, weight: f64, length: f64) -> BioenResult<Self> {
        if !(weight > 0.0 && weight.is_finite()) {
            return Err(BioenError::InvalidWeight { species, weight });
        }
        if !(abundance >= 0.0 && abundance.is_finite()) {
            return Err(BioenError::InvalidParameter {
                key: "abundance".to_string(),
                reason: format!("must be a finite non-negative number, found {}", abundance),
            });
        }
        Ok(Self {
            species,
            traits: TraitOverrides::default(),
            cell: None,
            abundance,
            n_dead: MortalityCounts::default(),
            weight,
            length,
            age_dt: 0,
            gonad_weight: 0.0,
            ingestion: 0.0,
            ingestion_total: 0.0,
            e_gross: 0.0,
            e_maint: 0.0,
            e_net: 0.0,
            kappa: 1.0,
            maturity: Maturity::Immature,
            n_eggs: 0.0,
        })
    }

    /// A freshly spawned cohort of eggs.
    pub fn egg_cohort(
        species: usize,
        parameters: &SpeciesBioenergeticParameters,
        abundance: f64,
    ) -> BioenResult<Self> {
        let weight = parameters.egg_weight_tonnes();
        Self::new(species, abundance, weight, parameters.length_from_weight(weight))
    }

    pub fn with_age_dt(mut self, age_dt: usize) -> Self {
        self.age_dt = age_dt;
        self
    }

    pub fn with_cell(mut self, cell: Cell) -> Self {
        self.cell = Some(cell);
        self
    }

    pub fn with_traits(mut self, traits: TraitOverrides) -> Self {
        self.traits = traits;
        self
    }

    /// Start the school with a gonad reserve of `gonad_weight` tonnes per
    /// individual. A negative or undefined reserve is rejected.
    pub fn with_gonad_weight(mut self, gonad_weight: f64) -> BioenResult<Self> {
        if !(gonad_weight >= 0.0 && gonad_weight.is_finite()) {
            return Err(BioenError::NegativeReserve {
                species: self.species,
                reserve: gonad_weight,
            });
        }
        self.gonad_weight = gonad_weight;
        Ok(self)
    }

    /// Same transition as [`set_mature`](Self::set_mature): `Immature` never
    /// replaces a recorded maturation.
    pub fn with_maturity(mut self, maturity: Maturity) -> Self {
        if let Maturity::Mature { age, length } = maturity {
            self.set_mature(age, length);
        }
        self
    }

    // ===== Identity and location =====

    pub fn species(&self) -> usize {
        self.species
    }

    pub fn traits(&self) -> &TraitOverrides {
        &self.traits
    }

    pub fn cell(&self) -> Option<Cell> {
        self.cell
    }

    pub fn set_cell(&mut self, cell: Cell) {
        self.cell = Some(cell);
    }

    // ===== Abundance and mortality =====

    pub fn abundance(&self) -> f64 {
        self.abundance
    }

    /// Number of individuals left after this step's mortality so far.
    pub fn instantaneous_abundance(&self) -> f64 {
        (self.abundance - self.n_dead.total()).max(0.0)
    }

    pub fn is_alive(&self) -> bool {
        self.instantaneous_abundance() > 0.0
    }

    pub fn n_dead(&self) -> &MortalityCounts {
        &self.n_dead
    }

    /// Record `n_dead` deaths. Deaths beyond the remaining abundance are
    /// ignored; returns the number actually applied.
    pub fn increment_n_dead(&mut self, cause: MortalityCause, n_dead: f64) -> f64 {
        let applied = n_dead.clamp(0.0, self.instantaneous_abundance());
        self.n_dead[cause] += applied;
        applied
    }

    /// Folds the deaths of the previous step into the abundance and resets the
    /// per-step fluxes.
    pub fn begin_step(&mut self) {
        self.abundance = self.instantaneous_abundance();
        self.n_dead.clear();
        self.ingestion = 0.0;
        self.e_gross = 0.0;
        self.e_maint = 0.0;
        self.e_net = 0.0;
        self.n_eggs = 0.0;
    }

    // ===== Size and age =====

    pub fn weight(&self) -> f64 {
        self.weight
    }

    pub fn length(&self) -> f64 {
        self.length
    }

    pub fn age_dt(&self) -> usize {
        self.age_dt
    }

    /// Age in years.
    pub fn age(&self, steps_per_year: usize) -> f64 {
        self.age_dt as f64 / steps_per_year as f64
    }

    pub fn increment_age(&mut self) {
        self.age_dt += 1;
    }

    /// Add `dw` tonnes to the individual weight and update the length. Only
    /// positive increments are applied.
    pub fn increment_weight(&mut self, dw: f64, parameters: &SpeciesBioenergeticParameters) {
        if dw > 0.0 {
            self.weight += dw;
            self.length = parameters.length_from_weight(self.weight);
        }
    }

    // ===== Gonad reserve =====

    pub fn gonad_weight(&self) -> f64 {
        self.gonad_weight
    }

    /// Change the gonad reserve by `delta` tonnes. The reserve can never go
    /// below zero.
    pub fn increment_gonad_weight(&mut self, delta: f64) -> BioenResult<()> {
        let reserve = self.gonad_weight + delta;
        if reserve < 0.0 || reserve.is_nan() {
            return Err(BioenError::NegativeReserve {
                species: self.species,
                reserve,
            });
        }
        self.gonad_weight = reserve;
        Ok(())
    }

    /// Empty the gonad reserve, returning what it held.
    pub fn flush_gonad(&mut self) -> f64 {
        std::mem::take(&mut self.gonad_weight)
    }

    // ===== Feeding and energy =====

    pub fn ingestion(&self) -> f64 {
        self.ingestion
    }

    pub fn ingestion_total(&self) -> f64 {
        self.ingestion_total
    }

    pub fn increment_ingestion(&mut self, biomass: f64) {
        self.ingestion += biomass;
    }

    /// Accumulate this step's ingestion per individual into the lifetime total.
    pub fn update_ingestion_total(&mut self) {
        let abundance = self.instantaneous_abundance();
        if abundance > 0.0 {
            self.ingestion_total += self.ingestion / abundance;
        }
    }

    pub fn e_gross(&self) -> f64 {
        self.e_gross
    }

    pub fn e_maint(&self) -> f64 {
        self.e_maint
    }

    pub fn e_net(&self) -> f64 {
        self.e_net
    }

    /// Store the energy fluxes of the step. Net energy is always derived here
    /// from the two terms.
    pub fn set_energy_budget(&mut self, e_gross: f64, e_maint: f64) {
        self.e_gross = e_gross;
        self.e_maint = e_maint;
        self.e_net = e_gross - e_maint;
    }

    /// Repay part of an energy deficit (starvation bookkeeping).
    pub fn increment_e_net(&mut self, delta: f64) {
        self.e_net += delta;
    }

    pub fn kappa(&self) -> f64 {
        self.kappa
    }

    pub fn set_kappa(&mut self, kappa: f64) {
        self.kappa = kappa;
    }

    // ===== Maturity and reproduction =====

    pub fn maturity(&self) -> Maturity {
        self.maturity
    }

    pub fn is_mature(&self) -> bool {
        self.maturity.is_mature()
    }

    /// Flag the school as mature at the given age (years) and length (cm).
    /// Has no effect on a school that is already mature.
    pub fn set_mature(&mut self, age: f64, length: f64) {
        if !self.is_mature() {
            self.maturity = Maturity::Mature { age, length };
        }
    }

    pub fn n_eggs(&self) -> f64 {
        self.n_eggs
    }

    pub fn increment_n_eggs(&mut self, n_eggs: f64) {
        self.n_eggs += n_eggs;
    }

    /// Read-only view for output and diagnostics.
    pub fn snapshot(&self) -> SchoolSnapshot {
        let (age_at_maturity, length_at_maturity) = match self.maturity {
            Maturity::Mature { age, length } => (Some(age), Some(length)),
            Maturity::Immature => (None, None),
        };
        SchoolSnapshot {
            species: self.species,
            abundance: self.instantaneous_abundance(),
            weight: self.weight,
            length: self.length,
            age_dt: self.age_dt,
            gonad_weight: self.gonad_weight,
            ingestion: self.ingestion,
            ingestion_total: self.ingestion_total,
            e_gross: self.e_gross,
            e_maint: self.e_maint,
            e_net: self.e_net,
            kappa: self.kappa,
            is_mature: self.is_mature(),
            age_at_maturity,
            length_at_maturity,
            n_dead: self.n_dead,
            n_eggs: self.n_eggs,
        }
    }
}

impl PreyPool for School {
    fn instantaneous_biomass(&self) -> f64 {
        self.instantaneous_abundance() * self.weight
    }

    fn register_predation_loss(&mut self, biomass: f64) {
        self.increment_n_dead(MortalityCause::Predation, biomass / self.weight);
    }
}

/// Per-school diagnostics exposed to output writers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchoolSnapshot {
    pub species: usize,
    pub abundance: f64,
    pub weight: f64,
    pub length: f64,
    pub age_dt: usize,
    pub gonad_weight: f64,
    pub ingestion: f64,
    pub ingestion_total: f64,
    pub e_gross: f64,
    pub e_maint: f64,
    pub e_net: f64,
    pub kappa: f64,
    pub is_mature: bool,
    pub age_at_maturity: Option<f64>,
    pub length_at_maturity: Option<f64>,
    pub n_dead: MortalityCounts,
    pub n_eggs: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn school() -> School {
        School::new(0, 1000.0, 0.002, 15.0).unwrap()
    }

    // ===== Construction =====

    #[test]
    fn test_rejects_non_positive_weight() {
        assert_eq!(
            School::new(1, 10.0, 0.0, 1.0),
            Err(BioenError::InvalidWeight {
                species: 1,
                weight: 0.0
            })
        );
        assert!(School::new(1, -5.0, 0.01, 1.0).is_err());
    }

    // ===== Mortality =====

    #[test]
    fn test_instantaneous_abundance_and_biomass() {
        let mut s = school();
        s.increment_n_dead(MortalityCause::Starvation, 250.0);
        assert_eq!(s.instantaneous_abundance(), 750.0);
        assert!((s.instantaneous_biomass() - 1.5).abs() < 1e-12);
        assert_eq!(s.abundance(), 1000.0);
    }

    #[test]
    fn test_deaths_capped_at_abundance() {
        let mut s = school();
        let applied = s.increment_n_dead(MortalityCause::Starvation, 5000.0);
        assert_eq!(applied, 1000.0);
        assert!(!s.is_alive());
        assert_eq!(s.instantaneous_abundance(), 0.0);
    }

    #[test]
    fn test_predation_loss_converts_biomass_to_individuals() {
        let mut s = school();
        s.register_predation_loss(0.5);
        assert!((s.n_dead()[MortalityCause::Predation] - 250.0).abs() < 1e-9);
    }

    #[test]
    fn test_begin_step_folds_deaths() {
        let mut s = school();
        s.increment_n_dead(MortalityCause::Predation, 100.0);
        s.increment_ingestion(3.0);
        s.set_energy_budget(5.0, 2.0);
        s.begin_step();
        assert_eq!(s.abundance(), 900.0);
        assert_eq!(s.n_dead().total(), 0.0);
        assert_eq!(s.ingestion(), 0.0);
        assert_eq!(s.e_net(), 0.0);
    }

    // ===== Energy =====

    #[test]
    fn test_net_energy_identity() {
        let mut s = school();
        s.set_energy_budget(0.1 + 0.2, 0.3);
        assert_eq!(s.e_net(), s.e_gross() - s.e_maint());
    }

    #[test]
    fn test_gonad_never_negative() {
        let mut s = school().with_gonad_weight(1.0).unwrap();
        assert!(s.increment_gonad_weight(-0.4).is_ok());
        assert!(matches!(
            s.increment_gonad_weight(-1.0),
            Err(BioenError::NegativeReserve { .. })
        ));
        assert!((s.gonad_weight() - 0.6).abs() < 1e-12);
        assert!((s.flush_gonad() - 0.6).abs() < 1e-12);
        assert_eq!(s.gonad_weight(), 0.0);
    }

    // ===== Maturity =====

    #[test]
    fn test_maturity_is_irreversible() {
        let mut s = school();
        s.set_mature(1.5, 14.0);
        s.set_mature(3.0, 20.0);
        assert_eq!(
            s.maturity(),
            Maturity::Mature {
                age: 1.5,
                length: 14.0
            }
        );
    }

    #[test]
    fn test_builder_cannot_revert_maturity() {
        let s = school()
            .with_maturity(Maturity::Mature {
                age: 1.0,
                length: 10.0,
            })
            .with_maturity(Maturity::Immature)
            .with_maturity(Maturity::Mature {
                age: 4.0,
                length: 30.0,
            });
        assert!(s.is_mature(), "an immature state must not replace maturity");
        assert_eq!(
            s.maturity(),
            Maturity::Mature {
                age: 1.0,
                length: 10.0
            }
        );
    }

    #[test]
    fn test_negative_initial_reserve_rejected() {
        assert_eq!(
            school().with_gonad_weight(-0.5),
            Err(BioenError::NegativeReserve {
                species: 0,
                reserve: -0.5
            })
        );
        assert!(school().with_gonad_weight(f64::NAN).is_err());
        assert_eq!(school().with_gonad_weight(0.0).unwrap().gonad_weight(), 0.0);
    }

    #[test]
    fn test_snapshot_serializes() {
        let mut s = school();
        s.set_mature(1.0, 12.0);
        let snapshot = s.snapshot();
        assert_eq!(snapshot.age_at_maturity, Some(1.0));
        let json = serde_json::to_string(&snapshot).unwrap();
        let back: SchoolSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(snapshot, back);
    }
}
