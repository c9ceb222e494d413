//! Physical forcing (temperature and oxygen) seen by the schools.
//!
//! The engine asks a [`PhysicalFieldProvider`] for a [`FieldSample`] at the
//! school's depth layer, cell and time step. Samples are not cached here.
//!
//! Each variable is either a constant or a gridded field already loaded in
//! memory with dimensions `(time, layer, j, i)`. Reading forcing files is the
//! responsibility of the caller.

use crate::config::ParameterMap;
use crate::errors::{BioenError, BioenResult};
use ndarray::Array4;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Horizontal grid coordinates of an ocean cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Cell {
    pub i: usize,
    pub j: usize,
}

impl Cell {
    pub fn new(i: usize, j: usize) -> Self {
        Self { i, j }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.i, self.j)
    }
}

/// Immutable snapshot of the environment of a school.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FieldSample {
    /// unit: degC
    pub temperature: f64,
    pub oxygen: f64,
}

/// Source of temperature and oxygen for the engine.
pub trait PhysicalFieldProvider {
    fn sample(&self, layer: usize, cell: Cell, step: usize) -> BioenResult<FieldSample>;
}

/// A single scalar physical variable.
#[typetag::serde(tag = "kind")]
pub trait PhysicalVariable: fmt::Debug + Send + Sync {
    /// Value at the given layer, cell and time step, or `None` outside the
    /// field (or on a land cell).
    fn value(&self, layer: usize, cell: Cell, step: usize) -> Option<f64>;
}

/// Variable that takes the same value everywhere and at all times.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstantVariable {
    pub value: f64,
}

#[typetag::serde]
impl PhysicalVariable for ConstantVariable {
    fn value(&self, _layer: usize, _cell: Cell, _step: usize) -> Option<f64> {
        Some(self.value)
    }
}

/// Variable resolved on the grid, cycled over its time dimension.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GriddedVariable {
    /// Converted values, dimensions `(time, layer, j, i)`. Land cells hold NaN.
    values: Array4<f64>,
    /// Number of simulation steps covered by one record of the field
    steps_per_record: usize,
}

impl GriddedVariable {
    /// Build a gridded variable from raw values.
    ///
    /// Raw values are converted as `factor * (offset + raw)`. The field holds
    /// `records_per_year` records per simulated year, which must divide the
    /// number of simulation steps per year.
    pub fn new(
        name: &str,
        raw: Array4<f64>,
        records_per_year: usize,
        steps_per_year: usize,
        factor: f64,
        offset: f64,
    ) -> BioenResult<Self> {
        if records_per_year == 0 || steps_per_year % records_per_year != 0 {
            return Err(BioenError::InvalidParameter {
                key: format!("{}.nsteps.year", name),
                reason: format!(
                    "{} records per year do not divide {} time steps per year",
                    records_per_year, steps_per_year
                ),
            });
        }
        if raw.shape()[0] == 0 {
            return Err(BioenError::InvalidParameter {
                key: format!("{}.filename", name),
                reason: "field has no time record".to_string(),
            });
        }
        Ok(Self {
            values: raw.mapv(|v| factor * (offset + v)),
            steps_per_record: steps_per_year / records_per_year,
        })
    }

    pub fn n_records(&self) -> usize {
        self.values.shape()[0]
    }

    fn record(&self, step: usize) -> usize {
        (step / self.steps_per_record) % self.n_records()
    }
}

#[typetag::serde]
impl PhysicalVariable for GriddedVariable {
    fn value(&self, layer: usize, cell: Cell, step: usize) -> Option<f64> {
        self.values
            .get([self.record(step), layer, cell.j, cell.i])
            .copied()
            .filter(|v| !v.is_nan())
    }
}

/// Temperature and oxygen fields of the simulation.
#[derive(Debug, Serialize, Deserialize)]
pub struct PhysicalFields {
    pub temperature: Box<dyn PhysicalVariable>,
    pub oxygen: Box<dyn PhysicalVariable>,
}

impl PhysicalFields {
    pub fn new(temperature: Box<dyn PhysicalVariable>, oxygen: Box<dyn PhysicalVariable>) -> Self {
        Self {
            temperature,
            oxygen,
        }
    }

    /// Constant fields everywhere.
    pub fn constant(temperature: f64, oxygen: f64) -> Self {
        Self::new(
            Box::new(ConstantVariable { value: temperature }),
            Box::new(ConstantVariable { value: oxygen }),
        )
    }

    /// Build constant fields from `temperature.value` and `oxygen.value`.
    pub fn from_config(config: &ParameterMap) -> BioenResult<Self> {
        Ok(Self::constant(
            config.get_float("temperature.value")?,
            config.get_float("oxygen.value")?,
        ))
    }
}

impl PhysicalFieldProvider for PhysicalFields {
    fn sample(&self, layer: usize, cell: Cell, step: usize) -> BioenResult<FieldSample> {
        let lookup = |name: &str, variable: &dyn PhysicalVariable| {
            variable
                .value(layer, cell, step)
                .ok_or_else(|| BioenError::PhysicalFieldOutOfRange {
                    variable: name.to_string(),
                    layer,
                    cell,
                    step,
                })
        };
        Ok(FieldSample {
            temperature: lookup("temperature", self.temperature.as_ref())?,
            oxygen: lookup("oxygen", self.oxygen.as_ref())?,
        })
    }
}
