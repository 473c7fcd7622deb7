//! Feature schema: the ordered slot names the model was trained on, and the
//! index resolved from them once at startup.

use serde::Deserialize;
use std::{collections::HashMap, fs, path::Path};

use crate::error::SchemaError;

pub const YEAR: &str = "year";
pub const MILEAGE: &str = "mileage";
pub const ENGINE_HP: &str = "engine_hp";
pub const OWNER_COUNT: &str = "owner_count";
pub const VEHICLE_AGE: &str = "vehicle_age";
pub const MILEAGE_PER_YEAR: &str = "mileage_per_year";
pub const CONDITION_ENCODED: &str = "condition_encoded";
pub const BRAND_POPULARITY: &str = "brand_popularity";
pub const TRANSMISSION_MANUAL: &str = "transmission_Manual";

pub const MAKE_PREFIX: &str = "make_cleaned_";
pub const MODEL_PREFIX: &str = "model_cleaned_";
pub const FUEL_PREFIX: &str = "fuel_type_";

pub const MAKE_OTHER: &str = "make_cleaned_Other";
pub const MODEL_OTHER: &str = "model_cleaned_Other_Model";

// Either a bare list of names or the `{feat_list, in_dim}` meta document.
#[derive(Deserialize)]
#[serde(untagged)]
enum SchemaJson {
    List(Vec<String>),
    Meta {
        feat_list: Vec<String>,
        in_dim: Option<usize>,
    },
}

/// Ordered slot names, exactly as the model expects them.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureSchema {
    names: Vec<String>,
    declared_dim: Option<usize>,
}

impl FeatureSchema {
    pub fn new(names: Vec<String>) -> Self {
        Self {
            names,
            declared_dim: None,
        }
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, SchemaError> {
        let path = path.as_ref();
        let txt = fs::read_to_string(path).map_err(|source| SchemaError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&txt)
    }

    pub fn from_json(txt: &str) -> Result<Self, SchemaError> {
        let schema = match serde_json::from_str(txt)? {
            SchemaJson::List(names) => Self::new(names),
            SchemaJson::Meta { feat_list, in_dim } => Self {
                names: feat_list,
                declared_dim: in_dim,
            },
        };
        if schema.names.is_empty() {
            return Err(SchemaError::Empty);
        }
        if let Some(dim) = schema.declared_dim {
            if dim != schema.names.len() {
                tracing::warn!(
                    "meta.in_dim ({}) != feat_list.len() ({}); using feat_list.len()",
                    dim,
                    schema.names.len()
                );
            }
        }
        Ok(schema)
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Slot positions resolved from a [`FeatureSchema`].
///
/// Categorical lookups are hash-map hits instead of scans over the slot list.
/// Make and model keys are lower-cased suffixes; fuel keys are exact.
#[derive(Debug, Clone)]
pub struct FeatureIndex {
    schema: FeatureSchema,
    pub year: usize,
    pub mileage: usize,
    pub engine_hp: usize,
    pub owner_count: usize,
    pub vehicle_age: usize,
    pub mileage_per_year: usize,
    pub condition_encoded: usize,
    pub brand_popularity: usize,
    pub transmission_manual: usize,
    pub make_other: usize,
    pub model_other: usize,
    makes: HashMap<String, usize>,
    models: HashMap<String, usize>,
    fuels: HashMap<String, usize>,
    make_slots: Vec<usize>,
    model_slots: Vec<usize>,
}

impl FeatureIndex {
    pub fn build(schema: FeatureSchema) -> Result<Self, SchemaError> {
        if schema.is_empty() {
            return Err(SchemaError::Empty);
        }

        let mut makes = HashMap::new();
        let mut models = HashMap::new();
        let mut fuels = HashMap::new();
        let mut make_slots = Vec::new();
        let mut model_slots = Vec::new();
        let mut positions: HashMap<String, usize> = HashMap::with_capacity(schema.len());

        for (i, name) in schema.names().iter().enumerate() {
            if positions.insert(name.clone(), i).is_some() {
                return Err(SchemaError::DuplicateSlot(name.clone()));
            }
            if let Some(suffix) = name.strip_prefix(MAKE_PREFIX) {
                make_slots.push(i);
                makes.entry(suffix.to_lowercase()).or_insert(i);
            } else if let Some(suffix) = name.strip_prefix(MODEL_PREFIX) {
                model_slots.push(i);
                models.entry(suffix.to_lowercase()).or_insert(i);
            } else if let Some(suffix) = name.strip_prefix(FUEL_PREFIX) {
                fuels.insert(suffix.to_string(), i);
            }
        }

        let slot = |name: &'static str| {
            positions
                .get(name)
                .copied()
                .ok_or(SchemaError::MissingSlot(name))
        };

        let index = Self {
            year: slot(YEAR)?,
            mileage: slot(MILEAGE)?,
            engine_hp: slot(ENGINE_HP)?,
            owner_count: slot(OWNER_COUNT)?,
            vehicle_age: slot(VEHICLE_AGE)?,
            mileage_per_year: slot(MILEAGE_PER_YEAR)?,
            condition_encoded: slot(CONDITION_ENCODED)?,
            brand_popularity: slot(BRAND_POPULARITY)?,
            transmission_manual: slot(TRANSMISSION_MANUAL)?,
            make_other: slot(MAKE_OTHER)?,
            model_other: slot(MODEL_OTHER)?,
            makes,
            models,
            fuels,
            make_slots,
            model_slots,
            schema,
        };

        tracing::debug!(
            "feature index: {} slots, {} makes, {} models, {} fuel types",
            index.len(),
            index.make_slots.len(),
            index.model_slots.len(),
            index.fuels.len()
        );
        Ok(index)
    }

    pub fn names(&self) -> &[String] {
        self.schema.names()
    }

    pub fn len(&self) -> usize {
        self.schema.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schema.is_empty()
    }

    /// Make slot for `make`, compared case-insensitively, else the `Other` slot.
    pub fn make_slot(&self, make: &str) -> usize {
        self.makes
            .get(&make.to_lowercase())
            .copied()
            .unwrap_or(self.make_other)
    }

    /// Model slot for `model`, compared case-insensitively, else `Other_Model`.
    pub fn model_slot(&self, model: &str) -> usize {
        self.models
            .get(&model.to_lowercase())
            .copied()
            .unwrap_or(self.model_other)
    }

    /// Fuel slot for the exact fuel string, if the schema has one.
    pub fn fuel_slot(&self, fuel: &str) -> Option<usize> {
        self.fuels.get(fuel).copied()
    }

    pub fn make_slots(&self) -> &[usize] {
        &self.make_slots
    }

    pub fn model_slots(&self) -> &[usize] {
        &self.model_slots
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn meta_document_and_bare_list_both_parse() {
        let bare = FeatureSchema::from_json(r#"["year", "mileage"]"#).unwrap();
        let meta =
            FeatureSchema::from_json(r#"{"feat_list": ["year", "mileage"], "in_dim": 2}"#).unwrap();
        assert_eq!(bare.names(), meta.names());
    }

    #[test]
    fn empty_schema_is_rejected() {
        assert!(matches!(
            FeatureSchema::from_json("[]"),
            Err(SchemaError::Empty)
        ));
    }
}
