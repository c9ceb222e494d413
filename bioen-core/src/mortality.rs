//! Mortality causes and per-school death counters.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Index, IndexMut};

/// Cause of death of individuals within a school.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MortalityCause {
    Predation,
    Starvation,
    Additional,
    Fishing,
}

impl MortalityCause {
    pub const ALL: [MortalityCause; 4] = [
        MortalityCause::Predation,
        MortalityCause::Starvation,
        MortalityCause::Additional,
        MortalityCause::Fishing,
    ];

    fn index(self) -> usize {
        match self {
            MortalityCause::Predation => 0,
            MortalityCause::Starvation => 1,
            MortalityCause::Additional => 2,
            MortalityCause::Fishing => 3,
        }
    }
}

impl fmt::Display for MortalityCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MortalityCause::Predation => "PREDATION",
            MortalityCause::Starvation => "STARVATION",
            MortalityCause::Additional => "ADDITIONAL",
            MortalityCause::Fishing => "FISHING",
        };
        f.write_str(name)
    }
}

/// Number of dead individuals per cause during the current time step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MortalityCounts([f64; 4]);

impl MortalityCounts {
    pub fn total(&self) -> f64 {
        self.0.iter().sum()
    }

    pub fn clear(&mut self) {
        self.0 = [0.0; 4];
    }

    pub fn iter(&self) -> impl Iterator<Item = (MortalityCause, f64)> + '_ {
        MortalityCause::ALL.into_iter().map(move |c| (c, self[c]))
    }
}

impl Index<MortalityCause> for MortalityCounts {
    type Output = f64;

    fn index(&self, cause: MortalityCause) -> &f64 {
        &self.0[cause.index()]
    }
}

impl IndexMut<MortalityCause> for MortalityCounts {
    fn index_mut(&mut self, cause: MortalityCause) -> &mut f64 {
        &mut self.0[cause.index()]
    }
}
