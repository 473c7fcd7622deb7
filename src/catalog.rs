//! Choices and numeric bounds offered by the prediction form.

use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fs, path::Path};

use crate::error::ConfigError;
use crate::popularity::BrandPopularity;
use crate::types::Condition;

pub const OTHER_MODEL: &str = "Other_Model";
/// Oldest manufacturing year the form accepts.
pub const MIN_YEAR: i32 = 1995;
pub const FUEL_TYPES: [&str; 3] = ["Gasoline", "Diesel", "Electric"];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormBounds {
    pub year_min: i32,
    pub year_max: i32,
    pub year_default: i32,
    pub mileage_min: f64,
    pub mileage_default: f64,
    pub engine_hp_min: f64,
    pub engine_hp_default: f64,
    pub owners_min: u32,
    pub owners_max: u32,
    pub owners_default: u32,
}

impl FormBounds {
    pub fn new(reference_year: i32) -> Self {
        Self {
            year_min: MIN_YEAR,
            year_max: reference_year,
            year_default: 2018.min(reference_year),
            mileage_min: 0.0,
            mileage_default: 50_000.0,
            engine_hp_min: 50.0,
            engine_hp_default: 120.0,
            owners_min: 1,
            owners_max: 5,
            owners_default: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormCatalog {
    pub makes: Vec<String>,
    pub models_by_make: BTreeMap<String, Vec<String>>,
    pub conditions: Vec<Condition>,
    pub fuel_types: Vec<String>,
    pub bounds: FormBounds,
}

#[derive(Deserialize)]
struct ModelsJson {
    models_by_make: BTreeMap<String, Vec<String>>,
}

fn default_models() -> BTreeMap<String, Vec<String>> {
    let owned = |names: &[&str]| names.iter().map(|n| n.to_string()).collect::<Vec<_>>();
    BTreeMap::from([
        (
            "Honda".to_string(),
            owned(&["Accord", "CR-V", "Civic", "Pilot", "Odyssey"]),
        ),
        (
            "Volkswagen".to_string(),
            owned(&["Jetta", "Atlas", "Passat", "Tiguan"]),
        ),
        ("Other".to_string(), owned(&[OTHER_MODEL])),
    ])
}

impl FormCatalog {
    /// Makes follow the brand table; models use the built-in list.
    pub fn new(brands: &BrandPopularity, reference_year: i32) -> Self {
        Self::with_models(brands, reference_year, default_models())
    }

    pub fn with_models(
        brands: &BrandPopularity,
        reference_year: i32,
        models_by_make: BTreeMap<String, Vec<String>>,
    ) -> Self {
        Self {
            makes: brands.brands().map(str::to_string).collect(),
            models_by_make,
            conditions: Condition::ALL.to_vec(),
            fuel_types: FUEL_TYPES.iter().map(|f| f.to_string()).collect(),
            bounds: FormBounds::new(reference_year),
        }
    }

    /// Load the models-by-make list from `{"models_by_make": {...}}`.
    pub fn load_models(
        path: impl AsRef<Path>,
    ) -> Result<BTreeMap<String, Vec<String>>, ConfigError> {
        let path = path.as_ref();
        let data = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let parsed: ModelsJson = serde_json::from_str(&data).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })?;
        Ok(parsed.models_by_make)
    }

    /// Model choices for `make`; unknown makes only offer `Other_Model`.
    pub fn models_for(&self, make: &str) -> Vec<String> {
        self.models_by_make
            .get(make)
            .cloned()
            .unwrap_or_else(|| vec![OTHER_MODEL.to_string()])
    }
}
