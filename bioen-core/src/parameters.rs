//! Bioenergetic parameters
//!
//! Per-species parameters are read once from the [`ParameterMap`] at
//! initialisation and are immutable for the rest of the run. They are passed
//! by reference to every engine rather than being looked up from global
//! arrays.

use crate::config::{species_key, ParameterMap};
use crate::errors::{BioenError, BioenResult};
use crate::units::{grams_to_tonnes, tonnes_to_grams};
use log::warn;
use serde::{Deserialize, Serialize};

/// Default egg weight when `species.egg.weight.sp#` is absent.
/// unit: g
pub const DEFAULT_EGG_WEIGHT: f64 = 0.000_538_6;

/// Default proportion of females.
pub const DEFAULT_SEX_RATIO: f64 = 0.5;

/// Default number of egg cohorts laid per species and time step.
pub const DEFAULT_N_SCHOOL: usize = 10;

/// Default number of mortality sub-steps per time step.
pub const DEFAULT_SUBDT: usize = 10;

/// Parameters of one focal species.
///
/// # Ingestion
///
/// The maximum biomass a single fish of weight $w$ (grams) can ingest per time
/// step is
///
/// $$I_{max}(w) = \frac{I + (f - 1) c}{n_{dt}} w^{\beta}$$
///
/// where $f$ is the larval factor for fish younger than one year and 1 otherwise.
///
/// # Maintenance
///
/// $$E_{maint} = c_{smr} \, w^{\beta} \, A(T) / n_{dt}$$
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeciesBioenergeticParameters {
    /// Species name, used in log messages only.
    pub name: String,

    /// Maximum mass-specific ingestion rate of adults
    /// unit: g food / g^beta / year
    pub imax: f64,

    /// Multiplicative factor on the ingestion rate of fish younger than one year
    /// unit: dimensionless
    pub larvae_imax_factor: f64,

    /// Scaling applied to `(larvae_imax_factor - 1)`
    /// unit: g food / g^beta / year
    pub c_rate: f64,

    /// Mass-scaling exponent of ingestion and maintenance
    /// unit: dimensionless
    pub beta: f64,

    /// Standard metabolic rate coefficient
    /// unit: g / g^beta / year
    pub csmr: f64,

    /// Fraction of ingested biomass that is assimilated
    /// default: 1.0
    pub assimilation: f64,

    /// Temperature offset of the gross-energy efficiency
    /// unit: degC
    pub gamma: f64,

    /// Half-saturation constant of the gross-energy efficiency
    /// unit: degC
    pub km: f64,

    /// Arrhenius activation parameter (E / k_B)
    /// unit: K
    pub c_t: f64,

    /// Arrhenius reference temperature
    /// unit: K
    pub tr: f64,

    /// Critical oxygen concentration below which the fish do not feed
    pub o2_crit: f64,

    /// Slope of the maturation reaction norm
    /// unit: cm / year
    pub m0: f64,

    /// Intercept of the maturation reaction norm
    /// unit: cm
    pub m1: f64,

    /// Somatic allocation rate of mature fish
    pub r: f64,

    /// Gonad mass consumed per unit of energy deficit
    /// default: 1.0
    pub eta: f64,

    /// Condition factor of the length-weight relation W = c L^b
    /// unit: g / cm^b
    pub lw_condition_factor: f64,

    /// Allometric power of the length-weight relation
    pub lw_allometric_power: f64,

    /// Weight of one egg
    /// unit: g
    pub egg_weight: f64,

    /// Proportion of females
    pub sex_ratio: f64,

    /// Eggs per gram of mature female, used when seeding collapsed species
    /// unit: eggs / g
    pub relative_fecundity: f64,

    /// Spawning stock biomass used when the species has collapsed during the
    /// seeding window
    /// unit: t
    pub seeding_biomass: f64,

    /// Age (in time steps) at which fish start feeding
    pub first_feeding_age_dt: usize,

    /// Index of the vertical layer where the physical fields are sampled
    pub depth_layer: usize,

    /// Number of egg cohorts created per spawning event
    pub n_school: usize,

    /// Fraction of the gonad reserve released at each time step of the year.
    /// Indexed by `step % season.len()`.
    pub season: Vec<f64>,
}

impl SpeciesBioenergeticParameters {
    /// Read the parameters of species `index` from the configuration.
    pub fn from_config(
        config: &ParameterMap,
        index: usize,
        steps_per_year: usize,
    ) -> BioenResult<Self> {
        let req = |prefix: &str| config.get_float(&species_key(prefix, index));
        let opt = |prefix: &str, default: f64| config.get_float_or(&species_key(prefix, index), default);

        let season_key = species_key("reproduction.season", index);
        let season = match config.get_list(&season_key)? {
            Some(values) => values,
            None => vec![1.0 / steps_per_year as f64],
        };

        let parameters = Self {
            name: config.get_string_or(&species_key("species.name", index), &format!("sp{}", index)),
            imax: req("predation.ingestion.rate.max.bioen")?,
            larvae_imax_factor: req("predation.ingestion.rate.max.larvae.bioen")?,
            c_rate: req("predation.c.bioen")?,
            beta: req("species.beta.bioen")?,
            csmr: req("bioen.maint.energy.csmr")?,
            assimilation: opt("bioen.assimilation", 1.0)?,
            gamma: req("bioen.gross.energy.gamma")?,
            km: req("bioen.gross.energy.km")?,
            c_t: req("bioen.arrh.ct")?,
            tr: req("bioen.maint.energy.Tr")?,
            o2_crit: req("bioen.fo2.o2crit")?,
            m0: req("bioen.maturity.m0")?,
            m1: req("bioen.maturity.m1")?,
            r: req("bioen.maturity.r")?,
            eta: opt("species.bioen.maturity.eta", 1.0)?,
            lw_condition_factor: req("species.length2weight.condition.factor")?,
            lw_allometric_power: req("species.length2weight.allometric.power")?,
            egg_weight: opt("species.egg.weight", DEFAULT_EGG_WEIGHT)?,
            sex_ratio: opt("species.sexratio", DEFAULT_SEX_RATIO)?,
            relative_fecundity: req("species.relativefecundity")?,
            seeding_biomass: opt("population.seeding.biomass", 0.0)?,
            first_feeding_age_dt: config
                .get_usize_or(&species_key("species.first.feeding.age.dt", index), 1)?,
            depth_layer: config.get_usize_or(&species_key("species.depth.layer", index), 0)?,
            n_school: config.get_usize_or(&species_key("simulation.nschool", index), DEFAULT_N_SCHOOL)?,
            season,
        };
        parameters.validate(index)?;
        Ok(parameters)
    }

    /// Check the physical plausibility of the parameters.
    pub fn validate(&self, index: usize) -> BioenResult<()> {
        let positive = [
            ("species.beta.bioen", self.beta),
            ("bioen.maint.energy.csmr", self.csmr),
            ("predation.ingestion.rate.max.bioen", self.imax),
            ("species.length2weight.condition.factor", self.lw_condition_factor),
            ("species.length2weight.allometric.power", self.lw_allometric_power),
            ("species.egg.weight", self.egg_weight),
            ("species.bioen.maturity.eta", self.eta),
            ("bioen.maint.energy.Tr", self.tr),
        ];
        for (prefix, value) in positive {
            if !(value > 0.0 && value.is_finite()) {
                return Err(BioenError::invalid(
                    species_key(prefix, index),
                    format!("must be strictly positive, found {}", value),
                ));
            }
        }
        if !(0.0..=1.0).contains(&self.sex_ratio) {
            return Err(BioenError::invalid(
                species_key("species.sexratio", index),
                format!("must lie in [0, 1], found {}", self.sex_ratio),
            ));
        }
        if self.imax <= self.csmr {
            return Err(BioenError::invalid(
                species_key("predation.ingestion.rate.max.bioen", index),
                format!(
                    "must exceed csmr ({}) for the somatic allocation to be defined, found {}",
                    self.csmr, self.imax
                ),
            ));
        }
        if self.relative_fecundity < 0.0 || self.seeding_biomass < 0.0 {
            return Err(BioenError::invalid(
                species_key("species.relativefecundity", index),
                "fecundity and seeding biomass must be non-negative",
            ));
        }
        if self.season.is_empty() || self.season.iter().any(|f| !(0.0..=1.0).contains(f)) {
            return Err(BioenError::invalid(
                species_key("reproduction.season", index),
                "season fractions must be a non-empty list of values in [0, 1]",
            ));
        }
        Ok(())
    }

    /// Length (cm) of a fish weighing `weight` tonnes.
    pub fn length_from_weight(&self, weight: f64) -> f64 {
        (tonnes_to_grams(weight) / self.lw_condition_factor).powf(1.0 / self.lw_allometric_power)
    }

    /// Weight (t) of a fish of the given length in cm.
    pub fn weight_from_length(&self, length: f64) -> f64 {
        grams_to_tonnes(self.lw_condition_factor * length.powf(self.lw_allometric_power))
    }

    /// Egg weight in tonnes.
    pub fn egg_weight_tonnes(&self) -> f64 {
        grams_to_tonnes(self.egg_weight)
    }

    /// Fraction of the gonad reserve released at the given time step.
    pub fn season_fraction(&self, step: usize) -> f64 {
        self.season[step % self.season.len()]
    }
}

/// Constants of the oxygen limitation function, shared by all species.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OxygenParameters {
    /// Asymptote of the limitation factor
    pub c1: f64,
    /// Half-saturation offset above the critical concentration
    pub c2: f64,
}

/// Run-wide bioenergetic configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BioenParameters {
    pub species: Vec<SpeciesBioenergeticParameters>,
    pub oxygen: OxygenParameters,
    /// Number of time steps per simulated year
    pub steps_per_year: usize,
    /// Number of predation/mortality sub-steps per time step
    pub subdt: usize,
    /// Last time step (exclusive) at which collapsed species are seeded
    pub seeding_max_step: usize,
}

impl BioenParameters {
    pub fn from_config(config: &ParameterMap) -> BioenResult<Self> {
        let steps_per_year = config.get_usize("simulation.time.ndtperyear")?;
        if steps_per_year == 0 {
            return Err(BioenError::invalid(
                "simulation.time.ndtperyear",
                "must be at least 1",
            ));
        }
        let subdt = config.get_usize_or("mortality.subdt", DEFAULT_SUBDT)?;
        if subdt == 0 {
            return Err(BioenError::invalid("mortality.subdt", "must be at least 1"));
        }

        let n_species = config.get_usize("simulation.nspecies")?;
        let species = (0..n_species)
            .map(|i| SpeciesBioenergeticParameters::from_config(config, i, steps_per_year))
            .collect::<BioenResult<Vec<_>>>()?;

        let oxygen = OxygenParameters {
            c1: config.get_float("bioen.fo2.c1")?,
            c2: config.get_float("bioen.fo2.c2")?,
        };
        if !(oxygen.c1 > 0.0 && oxygen.c1 <= 1.0) {
            return Err(BioenError::invalid(
                "bioen.fo2.c1",
                format!("the limitation asymptote must lie in (0, 1], found {}", oxygen.c1),
            ));
        }
        if !(oxygen.c2 > 0.0) {
            return Err(BioenError::invalid("bioen.fo2.c2", "must be strictly positive"));
        }

        let seeding_max_step = if config.contains("population.seeding.year.max") {
            config.get_usize("population.seeding.year.max")? * steps_per_year
        } else {
            warn!("population.seeding.year.max not set; collapsed species will not be seeded");
            0
        };

        Ok(Self {
            species,
            oxygen,
            steps_per_year,
            subdt,
            seeding_max_step,
        })
    }

    pub fn n_species(&self) -> usize {
        self.species.len()
    }

    pub fn species(&self, index: usize) -> BioenResult<&SpeciesBioenergeticParameters> {
        self.species.get(index).ok_or(BioenError::UnknownSpecies {
            species: index,
            n_species: self.species.len(),
        })
    }
}
