//! Brand popularity: how often each make appears in the training data.

use serde_json::{Map, Value};
use std::{fs, path::Path};

use crate::error::PopularityError;

pub const OTHER: &str = "Other";

const BUILTIN: &[(&str, f64)] = &[
    ("Kia", 0.04005),
    ("Mazda", 0.04004),
    ("Subaru", 0.04023),
    ("Tesla", 0.04018),
    ("Nissan", 0.04012),
    ("Porsche", 0.04010),
    ("Ram", 0.04009),
    ("Acura", 0.04008),
    ("Land Rover", 0.04007),
    ("Chrysler", 0.04006),
    ("Volkswagen", 0.04005),
    ("Dodge", 0.04004),
    ("Audi", 0.03990),
    ("Honda", 0.04001),
    ("Jeep", 0.04000),
    ("Chevrolet", 0.03998),
    ("Lexus", 0.03992),
    ("Cadillac", 0.03985),
    ("Volvo", 0.03984),
    ("Ford", 0.03984),
    (OTHER, 0.03950),
];

/// Brand to frequency table with an `Other` fallback. Keys match
/// case-sensitively.
#[derive(Debug, Clone, PartialEq)]
pub struct BrandPopularity {
    entries: Vec<(String, f64)>,
    other: f64,
}

impl BrandPopularity {
    /// Build from ordered entries. One of them must be `Other`.
    pub fn from_entries(entries: Vec<(String, f64)>) -> Result<Self, PopularityError> {
        let other = entries
            .iter()
            .find(|(brand, _)| brand == OTHER)
            .map(|(_, v)| *v)
            .ok_or(PopularityError::MissingFallback)?;
        Ok(Self { entries, other })
    }

    /// Read an override table from a JSON object of brand to frequency.
    /// Brands keep the order they have in the file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, PopularityError> {
        let path = path.as_ref();
        let txt = fs::read_to_string(path).map_err(|source| PopularityError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&txt)
    }

    pub fn from_json(txt: &str) -> Result<Self, PopularityError> {
        let map: Map<String, Value> = serde_json::from_str(txt)?;
        let entries = map
            .into_iter()
            .map(|(brand, v)| match v.as_f64() {
                Some(freq) => Ok((brand, freq)),
                None => Err(PopularityError::NotANumber(brand)),
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::from_entries(entries)
    }

    /// Raw frequency for `brand`, or the `Other` value.
    pub fn frequency(&self, brand: &str) -> f64 {
        self.entries
            .iter()
            .find(|(b, _)| b == brand)
            .map(|(_, v)| *v)
            .unwrap_or(self.other)
    }

    /// The model input: `ln(1 + frequency)`.
    pub fn feature(&self, brand: &str) -> f64 {
        self.frequency(brand).ln_1p()
    }

    /// Brand names in table order, `Other` included.
    pub fn brands(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(b, _)| b.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for BrandPopularity {
    fn default() -> Self {
        let entries: Vec<(String, f64)> = BUILTIN
            .iter()
            .map(|(brand, v)| (brand.to_string(), *v))
            .collect();
        let other = BUILTIN
            .iter()
            .find(|(brand, _)| *brand == OTHER)
            .map_or(0.0, |(_, v)| *v);
        Self { entries, other }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn override_requires_other() {
        let err = BrandPopularity::from_json(r#"{"Honda": 0.5}"#).unwrap_err();
        assert!(matches!(err, PopularityError::MissingFallback));
    }

    #[test]
    fn override_keeps_file_order() {
        let table = BrandPopularity::from_json(r#"{"Kia": 0.3, "Audi": 0.2, "Other": 0.1}"#).unwrap();
        let brands: Vec<_> = table.brands().collect();
        assert_eq!(brands, vec!["Kia", "Audi", "Other"]);
        assert_eq!(table.frequency("Tesla"), 0.1);
    }

    #[test]
    fn override_rejects_non_numeric_frequency() {
        let err = BrandPopularity::from_json(r#"{"Kia": "high", "Other": 0.1}"#).unwrap_err();
        assert!(matches!(err, PopularityError::NotANumber(brand) if brand == "Kia"));
    }

    #[test]
    fn builtin_fallback_matches_table() {
        let table = BrandPopularity::default();
        assert_eq!(table.frequency("Unknown"), 0.03950);
        assert_eq!(table.len(), 21);
    }

    #[test]
    fn lookup_is_case_sensitive() {
        let table = BrandPopularity::default();
        assert_eq!(table.frequency("Tesla"), 0.04018);
        assert_eq!(table.frequency("tesla"), 0.03950);
    }
}
