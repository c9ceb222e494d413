//! Flat parameter map.
//!
//! The configuration loader hands the engine a flat mapping from dotted string
//! keys (`bioen.maturity.r.sp0`) to values. Per-species parameters are
//! suffixed with `.sp{index}`.

use crate::errors::{BioenError, BioenResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A single configuration value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParameterValue {
    Scalar(f64),
    List(Vec<f64>),
    Text(String),
}

/// Flat `key -> value` configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParameterMap {
    values: BTreeMap<String, ParameterValue>,
}

/// Builds the key of a per-species parameter.
pub fn species_key(prefix: &str, species: usize) -> String {
    format!("{}.sp{}", prefix, species)
}

impl ParameterMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a TOML document, flattening nested tables into dotted keys.
    ///
    /// Integers are stored as scalars, arrays must only contain numbers and
    /// booleans are rejected.
    pub fn from_toml_str(content: &str) -> BioenResult<Self> {
        let table: toml::Table =
            toml::from_str(content).map_err(|e| BioenError::ConfigParse(e.to_string()))?;
        let mut map = Self::new();
        map.flatten_table("", &table)?;
        Ok(map)
    }

    fn flatten_table(&mut self, prefix: &str, table: &toml::Table) -> BioenResult<()> {
        for (key, value) in table {
            let full_key = if prefix.is_empty() {
                key.clone()
            } else {
                format!("{}.{}", prefix, key)
            };
            match value {
                toml::Value::Table(inner) => self.flatten_table(&full_key, inner)?,
                toml::Value::Float(v) => self.insert(full_key, *v),
                toml::Value::Integer(v) => self.insert(full_key, *v as f64),
                toml::Value::String(v) => self.insert(full_key, v.as_str()),
                toml::Value::Array(items) => {
                    let list = items
                        .iter()
                        .map(|item| match item {
                            toml::Value::Float(v) => Ok(*v),
                            toml::Value::Integer(v) => Ok(*v as f64),
                            other => Err(BioenError::invalid(
                                &full_key,
                                format!("list entries must be numbers, found {}", other.type_str()),
                            )),
                        })
                        .collect::<BioenResult<Vec<_>>>()?;
                    self.insert(full_key, list);
                }
                other => {
                    return Err(BioenError::invalid(
                        full_key,
                        format!("unsupported value type {}", other.type_str()),
                    ))
                }
            }
        }
        Ok(())
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<ParameterValue>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<&ParameterValue> {
        self.values.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ParameterValue)> {
        self.values.iter()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Get a required scalar.
    pub fn get_float(&self, key: &str) -> BioenResult<f64> {
        match self.values.get(key) {
            Some(ParameterValue::Scalar(v)) => Ok(*v),
            Some(ParameterValue::Text(s)) => s
                .trim()
                .parse::<f64>()
                .map_err(|_| BioenError::invalid(key, format!("'{}' is not a number", s))),
            Some(ParameterValue::List(_)) => Err(BioenError::invalid(key, "expected a scalar, found a list")),
            None => Err(BioenError::MissingParameter {
                key: key.to_string(),
            }),
        }
    }

    /// Get an optional scalar, falling back to a documented default.
    pub fn get_float_or(&self, key: &str, default: f64) -> BioenResult<f64> {
        if self.contains(key) {
            self.get_float(key)
        } else {
            Ok(default)
        }
    }

    /// Get a required non-negative integer.
    pub fn get_usize(&self, key: &str) -> BioenResult<usize> {
        let value = self.get_float(key)?;
        if value < 0.0 || value.fract() != 0.0 || !value.is_finite() {
            return Err(BioenError::invalid(
                key,
                format!("expected a non-negative integer, found {}", value),
            ));
        }
        Ok(value as usize)
    }

    pub fn get_usize_or(&self, key: &str, default: usize) -> BioenResult<usize> {
        if self.contains(key) {
            self.get_usize(key)
        } else {
            Ok(default)
        }
    }

    /// Get an optional list of scalars. A scalar is read as a one-element list.
    pub fn get_list(&self, key: &str) -> BioenResult<Option<Vec<f64>>> {
        match self.values.get(key) {
            None => Ok(None),
            Some(ParameterValue::List(values)) => Ok(Some(values.clone())),
            Some(ParameterValue::Scalar(v)) => Ok(Some(vec![*v])),
            Some(ParameterValue::Text(s)) => s
                .split(|c| c == ',' || c == ';')
                .map(|item| {
                    item.trim()
                        .parse::<f64>()
                        .map_err(|_| BioenError::invalid(key, format!("'{}' is not a number", item)))
                })
                .collect::<BioenResult<Vec<_>>>()
                .map(Some),
        }
    }

    pub fn get_string_or(&self, key: &str, default: &str) -> String {
        match self.values.get(key) {
            Some(ParameterValue::Text(s)) => s.clone(),
            _ => default.to_string(),
        }
    }
}

impl From<f64> for ParameterValue {
    fn from(value: f64) -> Self {
        ParameterValue::Scalar(value)
    }
}

impl From<Vec<f64>> for ParameterValue {
    fn from(value: Vec<f64>) -> Self {
        ParameterValue::List(value)
    }
}

impl From<&str> for ParameterValue {
    fn from(value: &str) -> Self {
        ParameterValue::Text(value.to_string())
    }
}

impl From<String> for ParameterValue {
    fn from(value: String) -> Self {
        ParameterValue::Text(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flatten_nested_tables() {
        let map = ParameterMap::from_toml_str(
            r#"
            "bioen.maturity.r.sp0" = 0.4

            [bioen.maint.energy]
            "csmr.sp0" = 0.12

            [simulation]
            nspecies = 1
            "#,
        )
        .unwrap();

        assert_eq!(map.get_float("bioen.maturity.r.sp0").unwrap(), 0.4);
        assert_eq!(map.get_float("bioen.maint.energy.csmr.sp0").unwrap(), 0.12);
        assert_eq!(map.get_usize("simulation.nspecies").unwrap(), 1);
    }

    #[test]
    fn test_missing_key_is_error() {
        let map = ParameterMap::new();
        assert_eq!(
            map.get_float("bioen.maturity.m0.sp3"),
            Err(BioenError::MissingParameter {
                key: "bioen.maturity.m0.sp3".to_string()
            })
        );
    }

    #[test]
    fn test_default_only_when_absent() {
        let mut map = ParameterMap::new();
        assert_eq!(map.get_float_or("species.sexratio.sp0", 0.5).unwrap(), 0.5);
        map.insert("species.sexratio.sp0", 0.3);
        assert_eq!(map.get_float_or("species.sexratio.sp0", 0.5).unwrap(), 0.3);
    }

    #[test]
    fn test_lists() {
        let map = ParameterMap::from_toml_str(
            r#"
            "reproduction.season.sp0" = [0.0, 0.5, 0.5, 0]
            "reproduction.season.sp1" = "0.25; 0.75"
            "#,
        )
        .unwrap();
        assert_eq!(
            map.get_list("reproduction.season.sp0").unwrap(),
            Some(vec![0.0, 0.5, 0.5, 0.0])
        );
        assert_eq!(
            map.get_list("reproduction.season.sp1").unwrap(),
            Some(vec![0.25, 0.75])
        );
        assert_eq!(map.get_list("reproduction.season.sp2").unwrap(), None);
    }

    #[test]
    fn test_rejects_fractional_integer() {
        let mut map = ParameterMap::new();
        map.insert("mortality.subdt", 2.5);
        assert!(matches!(
            map.get_usize("mortality.subdt"),
            Err(BioenError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_rejects_booleans() {
        let result = ParameterMap::from_toml_str("flag = true");
        assert!(matches!(result, Err(BioenError::InvalidParameter { .. })));
    }

    #[test]
    fn test_invalid_toml() {
        let result = ParameterMap::from_toml_str("this is = = not toml");
        assert!(matches!(result, Err(BioenError::ConfigParse(_))));
    }

    #[test]
    fn test_species_key() {
        assert_eq!(species_key("bioen.arrh.ct", 4), "bioen.arrh.ct.sp4");
    }
}
