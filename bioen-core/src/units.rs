//! Mass unit conversions.
//!
//! Biomass pools, school weights and gonad reserves are tracked in tonnes,
//! while the physiological rate parameters (`imax`, `csmr`, egg weight,
//! length-weight allometry) are calibrated on individuals weighed in grams.
//! Every crossing of that boundary goes through the helpers below so the
//! factor of $10^6$ appears in exactly one place.

/// Number of grams in one tonne.
pub const GRAMS_PER_TONNE: f64 = 1e6;

/// Offset between degrees Celsius and Kelvin.
pub const KELVIN_OFFSET: f64 = 273.15;

/// Convert a mass in tonnes to grams.
#[inline]
pub fn tonnes_to_grams(tonnes: f64) -> f64 {
    tonnes * GRAMS_PER_TONNE
}

/// Convert a mass in grams to tonnes.
#[inline]
pub fn grams_to_tonnes(grams: f64) -> f64 {
    grams / GRAMS_PER_TONNE
}

/// Convert a temperature in degrees Celsius to Kelvin.
#[inline]
pub fn celsius_to_kelvin(celsius: f64) -> f64 {
    celsius + KELVIN_OFFSET
}
