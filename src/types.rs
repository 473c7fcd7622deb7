use serde::{Deserialize, Serialize};
use std::fmt;

use crate::catalog::FormBounds;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub enum Condition {
    Fair,
    Good,
    Excellent,
}

impl Condition {
    pub const ALL: [Condition; 3] = [Condition::Fair, Condition::Good, Condition::Excellent];

    /// Ordinal used at training time.
    pub fn encoded(self) -> u8 {
        match self {
            Condition::Fair => 1,
            Condition::Good => 2,
            Condition::Excellent => 3,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Condition::Fair => "Fair",
            Condition::Good => "Good",
            Condition::Excellent => "Excellent",
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One car as entered on the form.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct CarDescription {
    pub make: String,
    pub model: String,
    pub condition: Condition,
    pub fuel_type: String,   // "Gasoline", "Diesel", "Electric"
    pub year: i32,
    pub mileage: f64,        // km
    pub engine_hp: f64,
    pub owner_count: u32,    // 1..=5
}

impl CarDescription {
    /// Years since manufacture, never below 1.
    pub fn vehicle_age(&self, reference_year: i32) -> u32 {
        reference_year.saturating_sub(self.year).max(1) as u32
    }

    pub fn mileage_per_year(&self, reference_year: i32) -> f64 {
        self.mileage / f64::from(self.vehicle_age(reference_year))
    }

    /// Pull numeric fields into the ranges the form allows.
    pub fn clamped(mut self, bounds: &FormBounds) -> Self {
        self.year = self.year.clamp(bounds.year_min, bounds.year_max);
        self.mileage = if self.mileage.is_nan() {
            bounds.mileage_min
        } else {
            self.mileage.max(bounds.mileage_min)
        };
        self.engine_hp = if self.engine_hp.is_nan() {
            bounds.engine_hp_min
        } else {
            self.engine_hp.max(bounds.engine_hp_min)
        };
        self.owner_count = self.owner_count.clamp(bounds.owners_min, bounds.owners_max);
        self
    }
}

#[derive(Debug, Serialize, Clone)]
pub struct PredictionOut {
    pub t: i64,
    pub price: f32,
    pub display: String,
    pub vehicle_age: u32,
    pub mileage_per_year: f64,
}

/// Render a price the way the form shows it: `$12,345.67`.
///
/// Negative values keep the sign after the dollar sign (`$-1,234.50`).
pub fn format_price(price: f32) -> String {
    if !price.is_finite() {
        return format!("${}", price);
    }
    let fixed = format!("{:.2}", price.abs());
    let (whole, frac) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if price < 0.0 && fixed != "0.00" { "-" } else { "" };
    format!("${}{}.{}", sign, grouped, frac)
}
