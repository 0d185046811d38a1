//! PLUTO run configuration
//!
//! The user-defined constants of a run are read from its `definitions.h`:
//! ```text
//! #define  UNIT_DENSITY                   1.e8
//! #define  RMAX                           2.00
//! ```

use regex::Regex;
use std::{collections::BTreeMap, fs, ops::Deref, path::Path};

#[derive(thiserror::Error, Debug)]
pub enum DefinitionsError {
    #[error("failed to read the definitions file")]
    Io(#[from] std::io::Error),
    #[error("failed to compile the definitions pattern")]
    Regex(#[from] regex::Error),
    #[error("{key} = {value:?} is not a valid number")]
    Value { key: String, value: String },
}
type Result<T> = std::result::Result<T, DefinitionsError>;

/// Code units of the simulation, in cgs
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Units {
    /// g/cm^3
    pub density: f64,
    /// cm/s
    pub velocity: f64,
}
impl Default for Units {
    fn default() -> Self {
        Self {
            density: 1e8,
            velocity: 1e10,
        }
    }
}
impl Units {
    /// Magnetic field code unit `sqrt(UNIT_DENSITY)*UNIT_VELOCITY` [G]
    pub fn magnetic_field(&self) -> f64 {
        self.density.sqrt() * self.velocity
    }
}

/// `#define NAME VALUE` entries of a `definitions.h` file
#[derive(Debug, Default, Clone)]
pub struct Definitions(BTreeMap<String, String>);
impl Deref for Definitions {
    type Target = BTreeMap<String, String>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}
impl Definitions {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        log::info!("Loading {:?}...", path.as_ref());
        Self::parse(&fs::read_to_string(path)?)
    }
    pub fn parse(contents: &str) -> Result<Self> {
        let re_define = Regex::new(r"(?m)^\s*#define\s+(\w+)\s+([^\s/]+)")?;
        Ok(Self(
            re_define
                .captures_iter(contents)
                .map(|capts| (capts[1].to_string(), capts[2].to_string()))
                .collect(),
        ))
    }
    pub fn get_f64(&self, key: &str) -> Result<Option<f64>> {
        self.get(key)
            .map(|value| {
                value.parse::<f64>().map_err(|_| DefinitionsError::Value {
                    key: key.to_string(),
                    value: value.clone(),
                })
            })
            .transpose()
    }
    pub fn get_usize(&self, key: &str) -> Result<Option<usize>> {
        self.get(key)
            .map(|value| {
                value.parse::<usize>().map_err(|_| DefinitionsError::Value {
                    key: key.to_string(),
                    value: value.clone(),
                })
            })
            .transpose()
    }
    /// Code units, falling back to [Units::default] for the missing ones
    pub fn units(&self) -> Result<Units> {
        let default = Units::default();
        Ok(Units {
            density: self.get_f64("UNIT_DENSITY")?.unwrap_or(default.density),
            velocity: self.get_f64("UNIT_VELOCITY")?.unwrap_or(default.velocity),
        })
    }
    /// Outer radius of the computational domain [stellar radius]
    pub fn r_max(&self) -> Result<Option<f64>> {
        self.get_f64("RMAX")
    }
}
