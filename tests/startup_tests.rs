/// Integration tests for loading artifacts at startup
///
/// Run with: cargo test --test startup_tests -- --nocapture

use std::collections::HashMap;

use car_price_predictor::error::{ModelError, SchemaError};
use car_price_predictor::{AppConfig, AppState, CarDescription, Condition, Error};

fn fixture(name: &str) -> String {
    format!("{}/tests/fixtures/{}", env!("CARGO_MANIFEST_DIR"), name)
}

fn config(pairs: &[(&str, String)]) -> AppConfig {
    let env: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect();
    AppConfig::from_lookup(|k: &str| env.get(k).cloned()).unwrap()
}

fn base_pairs() -> Vec<(&'static str, String)> {
    vec![
        ("MODEL_PATH", fixture("price_model.json")),
        ("FEATURES_PATH", fixture("model_features.json")),
    ]
}

#[test]
fn test_fixture_artifacts_load_and_warm_up() {
    println!("\n=== Test: Startup With Fixture Artifacts ===");
    let state = AppState::from_config(&config(&base_pairs())).unwrap();

    assert_eq!(state.index.len(), 20);
    assert_eq!(state.catalog.makes.len(), 21);
    assert!(state.warmup().unwrap().is_finite());

    let out = state
        .predict(CarDescription {
            make: "Honda".to_string(),
            model: "Civic".to_string(),
            condition: Condition::Good,
            fuel_type: "Gasoline".to_string(),
            year: 2018,
            mileage: 50000.0,
            engine_hp: 120.0,
            owner_count: 2,
        })
        .unwrap();
    assert_eq!(out.display, "$19,500.00");
    println!("✓ {}", state.model.describe());
}

#[test]
fn test_model_feature_names_must_match_schema() {
    println!("\n=== Test: Feature Name Mismatch ===");
    let mut pairs = base_pairs();
    pairs[0].1 = fixture("mismatched_model.json");

    let err = AppState::from_config(&config(&pairs)).err().unwrap();
    assert!(
        matches!(err, Error::Model(ModelError::SchemaMismatch(_))),
        "Unexpected error: {}",
        err
    );
    assert!(err.to_string().contains("slot 8"), "{}", err);
    println!("✓ {}", err);
}

#[test]
fn test_missing_schema_file_is_fatal() {
    println!("\n=== Test: Missing Schema File ===");
    let mut pairs = base_pairs();
    pairs[1].1 = fixture("no_such_features.json");

    let err = AppState::from_config(&config(&pairs)).err().unwrap();
    assert!(
        matches!(err, Error::Schema(SchemaError::Read { .. })),
        "Unexpected error: {}",
        err
    );
    println!("✓ {}", err);
}

#[test]
fn test_missing_model_file_is_fatal() {
    println!("\n=== Test: Missing Model File ===");
    let mut pairs = base_pairs();
    pairs[0].1 = fixture("no_such_model.json");

    let err = AppState::from_config(&config(&pairs)).err().unwrap();
    assert!(
        matches!(err, Error::Model(ModelError::Read { .. })),
        "Unexpected error: {}",
        err
    );
    println!("✓ {}", err);
}

#[test]
fn test_overrides_flow_into_catalog() {
    println!("\n=== Test: Brand And Catalog Overrides ===");
    let mut pairs = base_pairs();
    pairs.push(("BRAND_POPULARITY_PATH", fixture("brand_popularity.json")));
    pairs.push(("CATALOG_PATH", fixture("models_by_make.json")));
    pairs.push(("REFERENCE_YEAR", "2024".to_string()));

    let state = AppState::from_config(&config(&pairs)).unwrap();

    assert_eq!(
        state.catalog.makes,
        vec!["Toyota", "Honda", "Ford", "Other"],
        "Makes keep the override file's order"
    );
    assert_eq!(state.catalog.models_for("Toyota"), vec!["Camry", "Corolla", "RAV4"]);
    assert_eq!(state.catalog.models_for("Volkswagen"), vec!["Other_Model"]);
    assert_eq!(state.catalog.bounds.year_max, 2024);
    assert_eq!(state.brands.frequency("Toyota"), 0.052);
    assert_eq!(state.brands.frequency("Kia"), 0.030);
    println!("✓ {} makes from override", state.catalog.makes.len());
}
