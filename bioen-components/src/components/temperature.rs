//! Temperature response
//!
//! Converts the temperature experienced by a school into
//!
//! 1. a gross-energy efficiency
//!
//!    $$\phi_T = \frac{T - \gamma}{T - \gamma + K_m}$$
//!
//! 2. an Arrhenius scaling of the maintenance cost
//!
//!    $$A(T) = \exp\left(c_T \left(\frac{1}{T + 273.15} - \frac{1}{T_r}\right)\right)$$
//!
//! $\phi_T$ is not clamped: values outside [0, 1] flag physiologically extreme
//! temperatures and are passed through. A non-finite value (denominator of
//! zero) is a fatal error.

use bioen_core::errors::{BioenError, BioenResult};
use bioen_core::parameters::SpeciesBioenergeticParameters;
use bioen_core::physical::Cell;
use bioen_core::units::celsius_to_kelvin;
use serde::{Deserialize, Serialize};

/// Temperature response of one species.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TemperatureResponse {
    /// unit: degC
    pub gamma: f64,
    /// unit: degC
    pub km: f64,
    /// unit: K
    pub c_t: f64,
    /// unit: K
    pub tr: f64,
}

/// Where a temperature was sampled, for error reporting.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampleContext {
    pub species: usize,
    pub cell: Cell,
    pub step: usize,
}

impl TemperatureResponse {
    pub fn from_parameters(parameters: &SpeciesBioenergeticParameters) -> Self {
        Self {
            gamma: parameters.gamma,
            km: parameters.km,
            c_t: parameters.c_t,
            tr: parameters.tr,
        }
    }

    /// Raw gross-energy efficiency, possibly non-finite.
    pub fn calculate_phi_t(&self, temperature: f64) -> f64 {
        let shifted = temperature - self.gamma;
        shifted / (shifted + self.km)
    }

    /// Gross-energy efficiency, failing when it is undefined.
    pub fn phi_t(&self, temperature: f64, context: SampleContext) -> BioenResult<f64> {
        let value = self.calculate_phi_t(temperature);
        if !value.is_finite() {
            return Err(BioenError::UndefinedTemperatureResponse {
                species: context.species,
                temperature,
                cell: context.cell,
                step: context.step,
                value,
            });
        }
        Ok(value)
    }

    /// Arrhenius scaling of the maintenance cost.
    ///
    /// The exponent is `c_T (1/T - 1/Tr)` with `T` in kelvin, deliberately the
    /// opposite sign to the usual `c_T (1/Tr - 1/T)`. Maintenance rises with
    /// temperature only for a negative `c_T`.
    pub fn arrhenius(&self, temperature: f64) -> f64 {
        (self.c_t * (1.0 / celsius_to_kelvin(temperature) - 1.0 / self.tr)).exp()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use is_close::is_close;

    fn response() -> TemperatureResponse {
        TemperatureResponse {
            gamma: -2.0,
            km: 4.0,
            c_t: 5000.0,
            tr: 288.15,
        }
    }

    fn context() -> SampleContext {
        SampleContext {
            species: 0,
            cell: Cell::new(4, 2),
            step: 10,
        }
    }

    // ===== Gross-energy efficiency =====

    #[test]
    fn test_phi_t_value() {
        // (10 + 2) / (10 + 2 + 4)
        let phi = response().phi_t(10.0, context()).unwrap();
        assert!(is_close!(phi, 0.75));
    }

    #[test]
    fn test_phi_t_increases_with_temperature() {
        let r = response();
        let cold = r.phi_t(2.0, context()).unwrap();
        let warm = r.phi_t(20.0, context()).unwrap();
        assert!(warm > cold, "phiT should increase with temperature");
        assert!(warm < 1.0);
    }

    #[test]
    fn test_phi_t_not_clamped() {
        // Below gamma the efficiency turns negative and is passed through
        let phi = response().phi_t(-3.0, context()).unwrap();
        assert!(phi < 0.0, "Expected a negative efficiency, got {}", phi);
    }

    #[test]
    fn test_phi_t_undefined_is_fatal() {
        // T - gamma + km == 0  => T = gamma - km = -6
        let result = response().phi_t(-6.0, context());
        match result {
            Err(BioenError::UndefinedTemperatureResponse {
                species,
                cell,
                step,
                ..
            }) => {
                assert_eq!(species, 0);
                assert_eq!(cell, Cell::new(4, 2));
                assert_eq!(step, 10);
            }
            other => panic!("Expected an undefined response error, got {:?}", other),
        }
    }

    // ===== Arrhenius =====

    #[test]
    fn test_arrhenius_is_one_at_reference() {
        let a = response().arrhenius(15.0);
        assert!(is_close!(a, 1.0), "A(Tr) should be 1, got {}", a);
    }

    #[test]
    fn test_arrhenius_sign_convention() {
        // exp(c_T (1/T - 1/Tr)): above the reference temperature the factor
        // is below one for a positive c_T
        let r = response();
        assert!(r.arrhenius(25.0) < 1.0);
        assert!(r.arrhenius(5.0) > 1.0);
    }
}
