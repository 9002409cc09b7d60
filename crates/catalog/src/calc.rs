//! Cable-length arithmetic on top of a resolved catalog.

use crate::error::{CatalogError, Result};
use crate::record::Catalog;

/// Extra length added to the cut, absolute or relative to the cable length.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Tolerance {
    Millimeters(f64),
    Percent(f64),
}

impl Tolerance {
    pub fn to_mm(self, cable_length: f64) -> f64 {
        match self {
            Self::Millimeters(mm) => mm,
            Self::Percent(percent) => percent / 100.0 * cable_length,
        }
    }
}

impl Default for Tolerance {
    fn default() -> Self {
        Self::Millimeters(0.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CalculationInputs {
    pub first: String,
    pub second: String,
    /// Millimetres, `>= 0`.
    pub cable_length: f64,
    pub tolerance: Tolerance,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Calculation {
    pub first_size: f64,
    pub second_size: f64,
    pub tolerance_mm: f64,
    pub final_length: f64,
}

/// `final = cable_length - (size1 + size2) + tolerance_mm`.
pub fn calculate(catalog: &Catalog, inputs: &CalculationInputs) -> Result<Calculation> {
    if !inputs.cable_length.is_finite() || inputs.cable_length < 0.0 {
        return Err(CatalogError::InvalidSize {
            value: inputs.cable_length,
        });
    }
    let first_size = lookup(catalog, &inputs.first)?;
    let second_size = lookup(catalog, &inputs.second)?;
    let tolerance_mm = inputs.tolerance.to_mm(inputs.cable_length);

    Ok(Calculation {
        first_size,
        second_size,
        tolerance_mm,
        final_length: inputs.cable_length - (first_size + second_size) + tolerance_mm,
    })
}

fn lookup(catalog: &Catalog, name: &str) -> Result<f64> {
    catalog.size_of(name).ok_or_else(|| CatalogError::NotFound {
        name: name.to_string(),
    })
}

/// Length conversions offered alongside the calculator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Conversion {
    MetersToMillimeters,
    MetersToCentimeters,
    CentimetersToMillimeters,
}

impl Conversion {
    pub fn apply(self, value: f64) -> f64 {
        match self {
            Self::MetersToMillimeters => value * 1000.0,
            Self::MetersToCentimeters => value * 100.0,
            Self::CentimetersToMillimeters => value * 10.0,
        }
    }

    pub fn target_unit(self) -> &'static str {
        match self {
            Self::MetersToMillimeters | Self::CentimetersToMillimeters => "mm",
            Self::MetersToCentimeters => "cm",
        }
    }
}
