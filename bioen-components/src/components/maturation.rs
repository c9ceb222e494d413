//! Maturation reaction norm
//!
//! An immature fish becomes mature once its length reaches
//!
//! $$L_{lim}(a) = m_0 \, a + m_1$$
//!
//! with $a$ the age in years. `m0` and `m1` may be carried as individual
//! traits. The transition is irreversible and the age and length at which it
//! happened are kept on the school.

use bioen_core::parameters::SpeciesBioenergeticParameters;
use bioen_core::school::School;
use bioen_core::trait_overrides::BioenTrait;
use serde::{Deserialize, Serialize};

/// Maturation reaction norm on age and length.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Maturation {
    steps_per_year: usize,
}

impl Maturation {
    pub fn new(steps_per_year: usize) -> Self {
        Self { steps_per_year }
    }

    /// Length (cm) the school must reach at its current age to mature.
    pub fn threshold_length(&self, school: &School, species: &SpeciesBioenergeticParameters) -> f64 {
        let m0 = school.traits().resolve(BioenTrait::M0, species.m0);
        let m1 = school.traits().resolve(BioenTrait::M1, species.m1);
        m0 * school.age(self.steps_per_year) + m1
    }

    /// Flag the school as mature when it reached the threshold. Returns `true`
    /// only on the step where the transition happens.
    pub fn update(&self, school: &mut School, species: &SpeciesBioenergeticParameters) -> bool {
        if school.is_mature() {
            return false;
        }
        if school.length() >= self.threshold_length(school, species) {
            school.set_mature(school.age(self.steps_per_year), school.length());
            return true;
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::fixtures;
    use bioen_core::school::Maturity;
    use bioen_core::trait_overrides::TraitOverrides;
    use is_close::is_close;

    fn species() -> SpeciesBioenergeticParameters {
        fixtures::species()
    }

    #[test]
    fn test_threshold_grows_with_age() {
        let maturation = Maturation::new(12);
        let sp = species();
        let young = School::new(0, 10.0, 1e-5, 9.0).unwrap().with_age_dt(6);
        let old = School::new(0, 10.0, 1e-5, 9.0).unwrap().with_age_dt(24);
        assert!(is_close!(maturation.threshold_length(&young, &sp), 9.0));
        assert!(is_close!(maturation.threshold_length(&old, &sp), 12.0));
    }

    #[test]
    fn test_transition_records_age_and_length() {
        let maturation = Maturation::new(12);
        let sp = species();
        let mut school = School::new(0, 10.0, 1e-5, 10.0).unwrap().with_age_dt(12);

        assert!(maturation.update(&mut school, &sp), "10 cm at 1 year should mature");
        assert_eq!(
            school.maturity(),
            Maturity::Mature {
                age: 1.0,
                length: 10.0
            }
        );
    }

    #[test]
    fn test_too_short_stays_immature() {
        let maturation = Maturation::new(12);
        let mut school = School::new(0, 10.0, 1e-5, 9.5).unwrap().with_age_dt(12);
        assert!(!maturation.update(&mut school, &species()));
        assert!(!school.is_mature());
    }

    #[test]
    fn test_trait_overrides_threshold() {
        let maturation = Maturation::new(12);
        let traits = TraitOverrides::new()
            .with(BioenTrait::M0, 0.0)
            .with(BioenTrait::M1, 5.0);
        let mut school = School::new(0, 10.0, 1e-5, 6.0)
            .unwrap()
            .with_age_dt(12)
            .with_traits(traits);
        assert!(maturation.update(&mut school, &species()));
    }

    #[test]
    fn test_maturity_never_reverts() {
        let maturation = Maturation::new(12);
        let sp = species();
        let mut school = School::new(0, 10.0, 1e-5, 10.0).unwrap().with_age_dt(12);
        assert!(maturation.update(&mut school, &sp));

        // Much older: the threshold now exceeds the length
        let mut school = school.with_age_dt(120);
        assert!(!maturation.update(&mut school, &sp));
        assert!(school.is_mature());
        assert_eq!(
            school.maturity(),
            Maturity::Mature {
                age: 1.0,
                length: 10.0
            }
        );
    }
}
