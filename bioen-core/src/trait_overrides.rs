//! Per-individual overrides of bioenergetic parameters.
//!
//! When genetic traits are enabled, a school may carry its own value of some
//! species parameters. Lookups fall back to the species value when no override
//! is present.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Parameters that can be expressed as an individual trait.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BioenTrait {
    /// Slope of the maturation reaction norm
    M0,
    /// Intercept of the maturation reaction norm
    M1,
    /// Somatic allocation rate
    R,
    /// Maximum mass-specific ingestion rate
    Imax,
}

impl BioenTrait {
    pub const ALL: [BioenTrait; 4] = [BioenTrait::M0, BioenTrait::M1, BioenTrait::R, BioenTrait::Imax];

    pub fn name(&self) -> &'static str {
        match self {
            BioenTrait::M0 => "m0",
            BioenTrait::M1 => "m1",
            BioenTrait::R => "r",
            BioenTrait::Imax => "imax",
        }
    }

    /// Parse a trait name as used by the genetic module.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|t| t.name().eq_ignore_ascii_case(name))
    }
}

impl fmt::Display for BioenTrait {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Optional trait values attached to a school. Empty by default.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TraitOverrides {
    values: BTreeMap<BioenTrait, f64>,
}

impl TraitOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, t: BioenTrait, value: f64) -> Self {
        self.set(t, value);
        self
    }

    pub fn set(&mut self, t: BioenTrait, value: f64) {
        self.values.insert(t, value);
    }

    pub fn get(&self, t: BioenTrait) -> Option<f64> {
        self.values.get(&t).copied()
    }

    /// The override for `t`, or `default` when the school does not carry it.
    pub fn resolve(&self, t: BioenTrait, default: f64) -> f64 {
        self.get(t).unwrap_or(default)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
