//! Oxygen limitation of ingestion
//!
//! $$f(O_2) = \begin{cases} 0 & O_2 \le O_{2,crit} \\
//! c_1 \frac{O_2 - O_{2,crit}}{O_2 - O_{2,crit} + c_2} & \text{otherwise} \end{cases}$$
//!
//! The factor multiplies realised ingestion, never the ingestion ceiling.

use bioen_core::parameters::{OxygenParameters, SpeciesBioenergeticParameters};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OxygenLimitation {
    pub o2_crit: f64,
    pub c1: f64,
    pub c2: f64,
}

impl OxygenLimitation {
    pub fn from_parameters(
        species: &SpeciesBioenergeticParameters,
        oxygen: &OxygenParameters,
    ) -> Self {
        Self {
            o2_crit: species.o2_crit,
            c1: oxygen.c1,
            c2: oxygen.c2,
        }
    }

    pub fn factor(&self, oxygen: f64) -> f64 {
        if oxygen <= self.o2_crit {
            return 0.0;
        }
        let excess = oxygen - self.o2_crit;
        self.c1 * excess / (excess + self.c2)
    }
}
