use crate::physical::Cell;
use crate::prey::PreyId;
use thiserror::Error;

/// Error type for invalid configuration or numerically undefined operations.
///
/// Every variant is fatal: the run (or initialisation) stops and the caller
/// reports the message. Recoverable edge cases such as an empty prey field are
/// never represented here.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BioenError {
    #[error("Missing required parameter '{key}'")]
    MissingParameter { key: String },
    #[error("Invalid value for parameter '{key}': {reason}")]
    InvalidParameter { key: String, reason: String },
    #[error("Could not parse configuration: {0}")]
    ConfigParse(String),
    #[error("Unknown species index {species} (configured species: {n_species})")]
    UnknownSpecies { species: usize, n_species: usize },
    #[error(
        "Temperature response is undefined for species {species} at T={temperature} degC \
         (cell {cell}, step {step}): phiT = {value}"
    )]
    UndefinedTemperatureResponse {
        species: usize,
        temperature: f64,
        cell: Cell,
        step: usize,
        value: f64,
    },
    #[error("Accessibility coefficient {value} for prey {prey} of a species {species} predator is outside [0, 1]")]
    InvalidAccessibility {
        species: usize,
        prey: usize,
        value: f64,
    },
    #[error("Prey {prey} offers a negative or undefined biomass ({biomass} t)")]
    NegativeBiomass { prey: usize, biomass: f64 },
    #[error("Resource '{name}' has a negative or undefined biomass ({biomass} t)")]
    InvalidResourceBiomass { name: String, biomass: f64 },
    #[error("Prey {prey:?} does not exist in the population")]
    UnknownPrey { prey: PreyId },
    #[error("School index {index} is out of range ({n_schools} schools)")]
    UnknownSchool { index: usize, n_schools: usize },
    #[error("Expected {expected} accessibility coefficients, got {found}")]
    LengthMismatch { expected: usize, found: usize },
    #[error("School of species {species} has no individuals left and cannot be processed")]
    EmptySchool { species: usize },
    #[error("School of species {species} has not been placed on the grid")]
    UnplacedSchool { species: usize },
    #[error("School of species {species} has a non-positive weight ({weight} t)")]
    InvalidWeight { species: usize, weight: f64 },
    #[error("Gonad reserve of a species {species} school became negative ({reserve} t)")]
    NegativeReserve { species: usize, reserve: f64 },
    #[error("Physical field '{variable}' has no value at layer {layer}, cell {cell}, step {step}")]
    PhysicalFieldOutOfRange {
        variable: String,
        layer: usize,
        cell: Cell,
        step: usize,
    },
}

/// Convenience type for `Result<T, BioenError>`.
pub type BioenResult<T> = Result<T, BioenError>;

impl BioenError {
    pub(crate) fn invalid(key: impl Into<String>, reason: impl Into<String>) -> Self {
        BioenError::InvalidParameter {
            key: key.into(),
            reason: reason.into(),
        }
    }
}
