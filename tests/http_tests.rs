/// Integration tests for the HTTP surface
///
/// Run with: cargo test --test http_tests -- --nocapture

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use car_price_predictor::{
    create_router, model::XgbModel, AppState, BrandPopularity, FeatureIndex, FeatureSchema,
};

fn fixture(name: &str) -> String {
    format!("{}/tests/fixtures/{}", env!("CARGO_MANIFEST_DIR"), name)
}

fn state() -> AppState {
    let schema = FeatureSchema::load(fixture("model_features.json")).unwrap();
    let index = FeatureIndex::build(schema).unwrap();
    let model = XgbModel::load(fixture("price_model.json")).unwrap();
    AppState::new(index, BrandPopularity::default(), Arc::new(model), 2025)
}

fn app() -> Router {
    create_router(Arc::new(state()))
}

fn civic() -> Value {
    json!({
        "make": "Honda",
        "model": "Civic",
        "condition": "Good",
        "fuel_type": "Gasoline",
        "year": 2018,
        "mileage": 50000,
        "engine_hp": 120,
        "owner_count": 2
    })
}

async fn post_json(app: Router, uri: &str, body: &Value) -> (StatusCode, Value) {
    let req = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let res = app.oneshot(req).await.unwrap();
    let status = res.status();
    let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

async fn get(app: Router, uri: &str) -> axum::response::Response {
    let req = Request::builder().uri(uri).body(Body::empty()).unwrap();
    app.oneshot(req).await.unwrap()
}

#[tokio::test]
async fn test_predict_returns_formatted_price() {
    println!("\n=== Test: POST /api/predict ===");
    let (status, out) = post_json(app(), "/api/predict", &civic()).await;

    assert_eq!(status, StatusCode::OK);
    // base 20000, age 7 -> -2000, Honda -> +1500
    assert_eq!(out["price"], json!(19500.0));
    assert_eq!(out["display"], json!("$19,500.00"));
    assert_eq!(out["vehicle_age"], json!(7));
    let mpy = out["mileage_per_year"].as_f64().unwrap();
    assert!((mpy - 7142.857).abs() < 0.01);
    println!("✓ {}", out["display"]);
}

#[tokio::test]
async fn test_predict_clamps_out_of_range_input() {
    println!("\n=== Test: Input Clamping ===");
    let mut car = civic();
    car["year"] = json!(2031);
    car["mileage"] = json!(-500);
    car["engine_hp"] = json!(10);
    car["owner_count"] = json!(9);

    let (status, out) = post_json(app(), "/api/encode", &car).await;
    assert_eq!(status, StatusCode::OK);

    let features = out["features"].as_array().unwrap();
    let value = |name: &str| {
        features
            .iter()
            .find(|f| f["name"] == json!(name))
            .map(|f| f["value"].as_f64().unwrap())
            .unwrap()
    };
    assert_eq!(value("year"), 2025.0);
    assert_eq!(value("vehicle_age"), 1.0);
    assert_eq!(value("mileage"), 0.0);
    assert_eq!(value("engine_hp"), 50.0);
    assert_eq!(value("owner_count"), 5.0);
    assert_eq!(out["vector"].as_array().unwrap().len(), 20);
    println!("✓ year, mileage, horsepower and owners clamped");
}

#[tokio::test]
async fn test_unknown_make_still_predicts() {
    println!("\n=== Test: Unknown Make ===");
    let mut car = civic();
    car["make"] = json!("Lada");
    car["model"] = json!("Niva");

    let (status, out) = post_json(app(), "/api/predict", &car).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(out["price"], json!(18000.0));
    println!("✓ fallback slots used, {}", out["display"]);
}

#[tokio::test]
async fn test_bad_condition_is_rejected() {
    println!("\n=== Test: Malformed Body ===");
    let mut car = civic();
    car["condition"] = json!("Mint");
    let (status, _) = post_json(app(), "/api/predict", &car).await;
    assert!(status.is_client_error(), "got {}", status);
    println!("✓ {}", status);
}

#[tokio::test]
async fn test_catalog_lists_form_choices() {
    println!("\n=== Test: GET /api/catalog ===");
    let res = get(app(), "/api/catalog").await;
    assert_eq!(res.status(), StatusCode::OK);
    let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
    let catalog: Value = serde_json::from_slice(&bytes).unwrap();

    assert_eq!(catalog["makes"].as_array().unwrap().len(), 21);
    assert_eq!(
        catalog["models_by_make"]["Volkswagen"],
        json!(["Jetta", "Atlas", "Passat", "Tiguan"])
    );
    assert_eq!(catalog["conditions"], json!(["Fair", "Good", "Excellent"]));
    assert_eq!(catalog["fuel_types"], json!(["Gasoline", "Diesel", "Electric"]));
    assert_eq!(catalog["bounds"]["year_min"], json!(1995));
    assert_eq!(catalog["bounds"]["year_max"], json!(2025));
    assert_eq!(catalog["bounds"]["year_default"], json!(2018));
    println!("✓ catalog complete");
}

#[tokio::test]
async fn test_dashboard_redirects() {
    println!("\n=== Test: GET /dashboard ===");
    let state = state().with_dashboard_url("https://example.com/board");
    let res = get(create_router(Arc::new(state)), "/dashboard").await;

    assert_eq!(res.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(
        res.headers()[header::LOCATION].to_str().unwrap(),
        "https://example.com/board"
    );
    println!("✓ redirected");
}

#[tokio::test]
async fn test_index_and_health() {
    println!("\n=== Test: GET / and /health ===");
    let res = get(app(), "/").await;
    assert_eq!(res.status(), StatusCode::OK);
    let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
    let html = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(html.contains("Predict Price"));

    let res = get(app(), "/health").await;
    let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
    let health: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(health["status"], json!("ok"));
    assert_eq!(health["in_dim"], json!(20));
    println!("✓ page served, model: {}", health["model"]);
}
