//! Turns a [`CarDescription`] into the numeric vector the model was trained on.

use std::fmt;

use crate::popularity::BrandPopularity;
use crate::schema::FeatureIndex;
use crate::types::CarDescription;

/// Encode one car into schema order.
///
/// Slots not touched here stay zero. Unknown makes and models land in the
/// `Other` slots; an unknown fuel type sets nothing. `transmission_Manual` is
/// always 1: every car in the training set carried that column, so the model
/// has only ever seen it set.
pub fn encode(
    car: &CarDescription,
    index: &FeatureIndex,
    brands: &BrandPopularity,
    reference_year: i32,
) -> Vec<f32> {
    let mut v = vec![0.0f32; index.len()];

    let vehicle_age = car.vehicle_age(reference_year);

    // numeric
    v[index.year] = car.year as f32;
    v[index.mileage] = car.mileage as f32;
    v[index.engine_hp] = car.engine_hp as f32;
    v[index.owner_count] = car.owner_count as f32;
    v[index.vehicle_age] = vehicle_age as f32;
    v[index.mileage_per_year] = car.mileage_per_year(reference_year) as f32;
    v[index.condition_encoded] = f32::from(car.condition.encoded());

    v[index.brand_popularity] = brands.feature(&car.make) as f32;

    // one-hot groups
    v[index.make_slot(&car.make)] = 1.0;
    v[index.model_slot(&car.model)] = 1.0;
    if let Some(i) = index.fuel_slot(&car.fuel_type) {
        v[i] = 1.0;
    }

    v[index.transmission_manual] = 1.0;

    v
}

/// Pair each encoded value with its slot name.
pub fn named<'a>(index: &'a FeatureIndex, v: &'a [f32]) -> impl Iterator<Item = (&'a str, f32)> {
    index
        .names()
        .iter()
        .map(String::as_str)
        .zip(v.iter().copied())
}

/// Quick shape check of an encoded vector, for logs.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorSummary {
    pub dim: usize,
    pub nonzero: usize,
    pub mean: f32,
    pub std: f32,
    pub sample: Vec<(String, f32)>,
}

impl VectorSummary {
    pub fn new(index: &FeatureIndex, v: &[f32], sample_len: usize) -> Self {
        let nonzero = v.iter().filter(|x| **x != 0.0).count();
        let mean = if v.is_empty() {
            0.0
        } else {
            v.iter().sum::<f32>() / (v.len() as f32)
        };
        let std = if v.len() < 2 {
            0.0
        } else {
            (v.iter().map(|x| (x - mean) * (x - mean)).sum::<f32>() / (v.len() as f32)).sqrt()
        };
        let sample = named(index, v)
            .take(sample_len)
            .map(|(name, x)| (name.to_string(), x))
            .collect();

        Self {
            dim: v.len(),
            nonzero,
            mean,
            std,
            sample,
        }
    }
}

impl fmt::Display for VectorSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sample: Vec<String> = self
            .sample
            .iter()
            .map(|(name, x)| format!("{}={:.3}", name, x))
            .collect();
        write!(
            f,
            "in_dim={} nonzero={} mean={:.3} std={:.3} sample=[{}]",
            self.dim,
            self.nonzero,
            self.mean,
            self.std,
            sample.join(", ")
        )
    }
}
