//! Starvation mortality
//!
//! A negative net energy is first repaid from the gonad reserve. Whatever the
//! reserve cannot cover is converted into dead individuals. The deficit is
//! spread evenly over the `subdt` mortality sub-steps of the time step.

use bioen_core::errors::BioenResult;
use bioen_core::mortality::MortalityCause;
use bioen_core::parameters::SpeciesBioenergeticParameters;
use bioen_core::school::School;
use log::{trace, warn};
use serde::{Deserialize, Serialize};

/// Repays an energy deficit from the gonad reserve, killing individuals when it runs out.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StarvationMortality {
    subdt: usize,
}

impl StarvationMortality {
    pub fn new(subdt: usize) -> Self {
        Self { subdt }
    }

    /// Deficit settled at each sub-step, or `None` when there is no deficit.
    pub fn deficit_per_substep(&self, school: &School) -> Option<f64> {
        (school.e_net() < 0.0).then(|| school.e_net().abs() / self.subdt as f64)
    }

    /// Settle a deficit `deficit` for one sub-step and record the deaths.
    ///
    /// Returns the number of individuals that died of starvation.
    pub fn substep(
        &self,
        school: &mut School,
        species: &SpeciesBioenergeticParameters,
        deficit: f64,
    ) -> BioenResult<f64> {
        let eta = species.eta;
        let reserve = school.gonad_weight();

        if reserve >= eta * deficit {
            school.increment_gonad_weight(-eta * deficit)?;
            school.increment_e_net(deficit);
            return Ok(0.0);
        }

        let paid = reserve / eta;
        school.flush_gonad();
        school.increment_e_net(paid);

        let n_dead = (deficit - paid) / school.weight();
        let applied = school.increment_n_dead(MortalityCause::Starvation, n_dead);
        if applied < n_dead {
            warn!(
                "{} starvation deaths capped to the {} remaining individuals of {}",
                n_dead, applied, species.name
            );
        }
        Ok(applied)
    }

    /// Run all sub-steps for one school. Returns the total number of deaths.
    pub fn apply(&self, school: &mut School, species: &SpeciesBioenergeticParameters) -> BioenResult<f64> {
        let Some(deficit) = self.deficit_per_substep(school) else {
            return Ok(0.0);
        };

        let mut n_dead = 0.0;
        for _ in 0..self.subdt {
            if !school.is_alive() {
                trace!("school of {} starved out", species.name);
                break;
            }
            n_dead += self.substep(school, species, deficit)?;
        }
        Ok(n_dead)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::fixtures;
    use is_close::is_close;

    fn starving_school(reserve: f64) -> School {
        let mut school = School::new(0, 5000.0, 0.002, 20.0)
            .unwrap()
            .with_gonad_weight(reserve)
            .unwrap();
        school.set_energy_budget(5.0, 8.0);
        school
    }

    // ===== Scenarios =====

    #[test]
    fn test_reserve_covers_deficit() {
        let engine = StarvationMortality::new(1);
        let mut school = starving_school(5.0);
        let n_dead = engine.apply(&mut school, &fixtures::species()).unwrap();

        assert_eq!(n_dead, 0.0);
        assert!(is_close!(school.gonad_weight(), 2.0));
        assert_eq!(school.e_net(), 0.0);
        assert_eq!(school.n_dead()[MortalityCause::Starvation], 0.0);
    }

    #[test]
    fn test_partial_reserve_kills() {
        let engine = StarvationMortality::new(1);
        let mut school = starving_school(1.0);
        let n_dead = engine.apply(&mut school, &fixtures::species()).unwrap();

        assert_eq!(school.gonad_weight(), 0.0);
        assert!(is_close!(n_dead, 1000.0), "Expected 1000 deaths, got {}", n_dead);
        assert!(is_close!(school.n_dead()[MortalityCause::Starvation], 1000.0));
        // Residual equals the biomass lost to starvation
        assert!(is_close!(-school.e_net(), n_dead * school.weight()));
    }

    #[test]
    fn test_no_deficit_no_effect() {
        let engine = StarvationMortality::new(10);
        let mut school = School::new(0, 100.0, 0.002, 20.0).unwrap().with_gonad_weight(1.0).unwrap();
        school.set_energy_budget(8.0, 5.0);
        assert_eq!(engine.apply(&mut school, &fixtures::species()).unwrap(), 0.0);
        assert_eq!(school.gonad_weight(), 1.0);
        assert_eq!(school.e_net(), 3.0);
    }

    // ===== Sub-stepping =====

    #[test]
    fn test_net_energy_converges_when_reserve_suffices() {
        let engine = StarvationMortality::new(10);
        let mut school = starving_school(4.0);
        engine.apply(&mut school, &fixtures::species()).unwrap();
        assert!(school.e_net().abs() < 1e-12, "ENet should be repaid, got {}", school.e_net());
        assert!(is_close!(school.gonad_weight(), 1.0));
    }

    #[test]
    fn test_reserve_runs_out_mid_step() {
        let engine = StarvationMortality::new(4);
        // deficit 0.75 per sub-step, reserve covers two of them
        let mut school = starving_school(1.5);
        let n_dead = engine.apply(&mut school, &fixtures::species()).unwrap();
        assert_eq!(school.gonad_weight(), 0.0);
        assert!(is_close!(n_dead, 1.5 / 0.002));
        assert!(is_close!(-school.e_net(), n_dead * school.weight()));
    }

    #[test]
    fn test_gonad_never_negative() {
        let sp = fixtures::species();
        for subdt in [1, 3, 10] {
            for reserve in [0.0, 0.1, 2.9, 3.0, 50.0] {
                let engine = StarvationMortality::new(subdt);
                let mut school = starving_school(reserve);
                engine.apply(&mut school, &sp).unwrap();
                assert!(school.gonad_weight() >= 0.0, "negative reserve for subdt {} and reserve {}", subdt, reserve);
            }
        }
    }

    #[test]
    fn test_eta_scales_reserve_use() {
        let engine = StarvationMortality::new(1);
        let sp = SpeciesBioenergeticParameters {
            eta: 2.0,
            ..fixtures::species()
        };
        let mut school = starving_school(7.0);
        engine.apply(&mut school, &sp).unwrap();
        // 3 units of deficit consume 6 units of gonad
        assert!(is_close!(school.gonad_weight(), 1.0));
        assert_eq!(school.e_net(), 0.0);
    }

    #[test]
    fn test_deaths_capped_at_abundance() {
        let engine = StarvationMortality::new(1);
        let mut school = School::new(0, 10.0, 0.002, 20.0).unwrap();
        school.set_energy_budget(0.0, 8.0);
        let n_dead = engine.apply(&mut school, &fixtures::species()).unwrap();
        assert_eq!(n_dead, 10.0);
        assert!(!school.is_alive());
    }
}
