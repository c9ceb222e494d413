//! Conservation tests for the bioenergetic engines.
//!
//! These tests verify that biomass and energy are accounted for:
//! - predation never removes more than the ceiling or the accessible biomass
//! - what prey lose is what predators ingest
//! - positive net energy ends up in somatic or gonad mass
//! - unpaid starvation deficits are exactly the biomass of the dead

use approx::assert_relative_eq;
use osmose_bioen::bioen_components::{
    EnergyBudget, Physiology, PredationAllocator, StarvationMortality,
};
use osmose_bioen::bioen_core::mortality::MortalityCause;
use osmose_bioen::bioen_core::parameters::{
    BioenParameters, OxygenParameters, SpeciesBioenergeticParameters,
};
use osmose_bioen::bioen_core::physical::{Cell, PhysicalFields};
use osmose_bioen::bioen_core::prey::{PreyId, PreyPool};
use osmose_bioen::bioen_core::resource::Resource;
use osmose_bioen::bioen_core::school::{Maturity, School};
use osmose_bioen::{BioenSimulation, Encounter, Population};

fn sardine() -> SpeciesBioenergeticParameters {
    SpeciesBioenergeticParameters {
        name: "sardine".to_string(),
        imax: 4.0,
        larvae_imax_factor: 1.8,
        c_rate: 1.5,
        beta: 0.75,
        csmr: 0.6,
        assimilation: 0.9,
        gamma: -3.0,
        km: 5.0,
        c_t: 4500.0,
        tr: 290.0,
        o2_crit: 1.5,
        m0: 1.5,
        m1: 10.0,
        r: 0.35,
        eta: 1.0,
        lw_condition_factor: 0.008,
        lw_allometric_power: 3.05,
        egg_weight: 0.0005386,
        sex_ratio: 0.5,
        relative_fecundity: 450.0,
        seeding_biomass: 0.0,
        first_feeding_age_dt: 1,
        depth_layer: 0,
        n_school: 5,
        season: vec![0.05],
    }
}

mod predation_conservation {
    use super::*;

    /// Removed biomass is bounded by the ceiling and by what is accessible.
    #[test]
    fn test_losses_bounded() {
        let allocator = PredationAllocator::new(24, 10);
        let sp = sardine();
        let weights = [1e-7, 1e-6, 1e-5, 1e-4];
        let abundances = [1.0, 1e3, 1e6];
        let prey_sets: [&[f64]; 4] = [&[0.5], &[1e-6, 3.0], &[0.0, 0.0, 2.0], &[1e-3; 6]];

        for &weight in &weights {
            for &abundance in &abundances {
                let predator = School::new(0, abundance, weight, 10.0).unwrap().with_age_dt(30);
                let ceiling = allocator.ceiling(&predator, &sp);
                for biomass in prey_sets {
                    let accessibility = vec![0.7; biomass.len()];
                    let outcome = allocator
                        .compute_from_biomass(&predator, &sp, biomass, &accessibility, 0.9)
                        .unwrap();
                    let removed: f64 = outcome.losses.iter().sum();
                    let accessible: f64 = biomass.iter().map(|b| b * 0.7).sum();
                    assert!(removed <= ceiling * (1.0 + 1e-12), "removed {} above ceiling {}", removed, ceiling);
                    assert!(removed <= accessible * (1.0 + 1e-12), "removed {} above accessible {}", removed, accessible);
                    assert!(outcome.losses.iter().all(|l| *l >= 0.0));
                }
            }
        }
    }

    /// Single prey pool: the predator takes the smaller of the ceiling and the
    /// accessible biomass.
    #[test]
    fn test_single_prey() {
        let allocator = PredationAllocator::new(24, 1);
        let sp = sardine();
        let predator = School::new(0, 1e4, 2e-5, 12.0).unwrap().with_age_dt(48);
        let ceiling = allocator.ceiling(&predator, &sp);

        let plenty = allocator
            .compute_from_biomass(&predator, &sp, &[ceiling * 10.0], &[1.0], 1.0)
            .unwrap();
        assert_relative_eq!(plenty.ingested, ceiling, max_relative = 1e-12);

        let scarce = allocator
            .compute_from_biomass(&predator, &sp, &[ceiling * 0.1], &[1.0], 1.0)
            .unwrap();
        assert_relative_eq!(scarce.ingested, ceiling * 0.1, max_relative = 1e-12);
    }

    /// Prey losses and predator ingestion balance over a full time step.
    #[test]
    fn test_prey_loss_equals_ingestion() {
        let parameters = BioenParameters {
            species: vec![sardine()],
            oxygen: OxygenParameters { c1: 0.95, c2: 2.0 },
            steps_per_year: 24,
            subdt: 10,
            seeding_max_step: 0,
        };
        let mut sim = BioenSimulation::new(parameters, PhysicalFields::constant(14.0, 6.0));

        let cell = Cell::new(2, 3);
        let adult = |abundance: f64| {
            School::new(0, abundance, 3e-5, 14.0)
                .unwrap()
                .with_age_dt(72)
                .with_cell(cell)
        };
        let juvenile = School::new(0, 2e5, 2e-7, 3.0)
            .unwrap()
            .with_age_dt(10)
            .with_cell(cell);
        let mut population = Population::new(
            vec![adult(2e4), adult(5e3), juvenile],
            vec![Resource::new("copepods", 0.05).unwrap(), Resource::new("krill", 0.2).unwrap()],
        );
        let encounters = vec![
            Encounter::new(
                0,
                vec![
                    (PreyId::Resource(0), 0.4),
                    (PreyId::Resource(1), 0.9),
                    (PreyId::School(2), 0.6),
                ],
            ),
            Encounter::new(1, vec![(PreyId::Resource(1), 1.0), (PreyId::School(2), 1.0)]),
            Encounter::new(2, vec![(PreyId::Resource(0), 1.0)]),
        ];
        let juvenile_biomass = population.schools()[2].instantaneous_biomass();

        let summary = sim.step(&mut population, &encounters).unwrap();

        let resource_loss: f64 = population.resources().iter().map(|r| r.predated()).sum();
        let juvenile_loss = summary.schools[2].n_dead[MortalityCause::Predation] * 2e-7;
        let ingested: f64 = summary.schools.iter().map(|s| s.ingestion).sum();

        assert!(juvenile_loss <= juvenile_biomass * (1.0 + 1e-12));
        assert_relative_eq!(resource_loss + juvenile_loss, ingested, max_relative = 1e-9);
        assert_relative_eq!(summary.species[0].ingested, ingested, max_relative = 1e-9);
        for resource in population.resources() {
            assert!(resource.instantaneous_biomass() >= 0.0);
            assert!(resource.predated() <= resource.biomass() * (1.0 + 1e-12));
        }
    }
}

mod energy_conservation {
    use super::*;

    fn physiology() -> Physiology {
        Physiology {
            phi_t: 0.8,
            oxygen_factor: 0.9,
            arrhenius: 1.1,
        }
    }

    /// Positive net energy is fully split into somatic and gonad mass.
    #[test]
    fn test_surplus_is_conserved() {
        let budget = EnergyBudget::new(24);
        let sp = sardine();
        for mature in [false, true] {
            for ingestion in [1e-4, 1e-3, 1e-2] {
                let mut school = School::new(0, 1000.0, 2e-5, 13.0).unwrap().with_age_dt(40);
                if mature {
                    school = school.with_maturity(Maturity::Mature { age: 1.0, length: 12.0 });
                }
                school.increment_ingestion(ingestion);
                let (weight, gonad) = (school.weight(), school.gonad_weight());

                budget.apply(&mut school, &sp, &physiology()).unwrap();

                assert_eq!(school.e_net(), school.e_gross() - school.e_maint());
                if school.e_net() > 0.0 {
                    let stored = (school.weight() - weight + school.gonad_weight() - gonad) * 1000.0;
                    assert_relative_eq!(stored, school.e_net(), max_relative = 1e-6);
                }
            }
        }
    }

    /// An unpaid deficit is exactly the biomass of the starved fish.
    #[test]
    fn test_starvation_residual() {
        let sp = sardine();
        for subdt in [1, 4, 10, 25] {
            for reserve in [0.0, 1e-9, 5e-7, 1e-5] {
                let engine = StarvationMortality::new(subdt);
                let mut school = School::new(0, 1e6, 2e-5, 13.0).unwrap().with_gonad_weight(reserve).unwrap();
                school.set_energy_budget(1e-3, 3e-3);
                let n_dead = engine.apply(&mut school, &sp).unwrap();

                assert!(school.gonad_weight() >= 0.0);
                if n_dead > 0.0 {
                    assert_relative_eq!(-school.e_net(), n_dead * school.weight(), max_relative = 1e-9);
                } else {
                    assert!(school.e_net().abs() < 1e-15);
                }
            }
        }
    }
}
