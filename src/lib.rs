//! Used-car price prediction: encode a car into the training feature layout,
//! run the pre-trained regressor, serve the form over HTTP.

pub mod catalog;
pub mod config;
pub mod encoder;
pub mod error;
pub mod http;
pub mod model;
pub mod popularity;
pub mod schema;
pub mod types;

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

pub use catalog::{FormBounds, FormCatalog};
pub use config::AppConfig;
pub use encoder::{encode, VectorSummary};
pub use error::{Error, Result};
pub use model::Predictor;
pub use popularity::BrandPopularity;
pub use schema::{FeatureIndex, FeatureSchema};
pub use types::{format_price, CarDescription, Condition, PredictionOut};

use error::ModelError;

/// Everything loaded at startup. Read-only for the life of the process.
pub struct AppState {
    pub index: FeatureIndex,
    pub brands: BrandPopularity,
    pub catalog: FormCatalog,
    pub model: Arc<dyn Predictor>,
    pub reference_year: i32,
    pub dashboard_url: String,
    pub log_predictions: bool,
}

impl AppState {
    pub fn new(
        index: FeatureIndex,
        brands: BrandPopularity,
        model: Arc<dyn Predictor>,
        reference_year: i32,
    ) -> Self {
        let catalog = FormCatalog::new(&brands, reference_year);
        Self {
            index,
            brands,
            catalog,
            model,
            reference_year,
            dashboard_url: config::DEFAULT_DASHBOARD_URL.to_string(),
            log_predictions: false,
        }
    }

    /// Load the schema, brand table, catalog and model named by `cfg`.
    ///
    /// Any failure here means no prediction can be served.
    pub fn from_config(cfg: &AppConfig) -> Result<Self> {
        let schema = FeatureSchema::load(&cfg.features_path)?;
        let index = FeatureIndex::build(schema)?;
        tracing::info!("loaded feature schema; {} slots", index.len());

        let brands = match &cfg.brand_popularity_path {
            Some(path) => BrandPopularity::load(path)?,
            None => BrandPopularity::default(),
        };

        let model: Arc<dyn Predictor> = Arc::from(model::load(&cfg.model_path, index.len())?);
        check_feature_names(model.as_ref(), &index)?;
        tracing::info!("loaded model: {}", model.describe());

        let catalog = match &cfg.catalog_path {
            Some(path) => FormCatalog::with_models(
                &brands,
                cfg.reference_year,
                FormCatalog::load_models(path)?,
            ),
            None => FormCatalog::new(&brands, cfg.reference_year),
        };

        Ok(Self {
            index,
            brands,
            catalog,
            model,
            reference_year: cfg.reference_year,
            dashboard_url: cfg.dashboard_url.clone(),
            log_predictions: cfg.log_predictions,
        })
    }

    pub fn with_dashboard_url(mut self, url: impl Into<String>) -> Self {
        self.dashboard_url = url.into();
        self
    }

    /// Encode a car exactly as the training pipeline did.
    pub fn encode(&self, car: &CarDescription) -> Vec<f32> {
        encode(car, &self.index, &self.brands, self.reference_year)
    }

    /// Clamp, encode and predict one car.
    pub fn predict(&self, car: CarDescription) -> std::result::Result<PredictionOut, ModelError> {
        let car = car.clamped(&self.catalog.bounds);
        let vec = self.encode(&car);

        if self.log_predictions {
            let summary = VectorSummary::new(&self.index, &vec, 6);
            tracing::info!("recv make={} model={} {}", car.make, car.model, summary);
        }

        let price = self.model.predict(&vec)?;
        tracing::debug!("predicted {} for {} {}", price, car.make, car.model);

        Ok(PredictionOut {
            t: now_ms(),
            price,
            display: format_price(price),
            vehicle_age: car.vehicle_age(self.reference_year),
            mileage_per_year: car.mileage_per_year(self.reference_year),
        })
    }

    /// Run the model once on an all-zero vector.
    pub fn warmup(&self) -> std::result::Result<f32, ModelError> {
        self.model.predict(&vec![0.0; self.index.len()])
    }
}

fn check_feature_names(
    model: &dyn Predictor,
    index: &FeatureIndex,
) -> std::result::Result<(), ModelError> {
    let Some(names) = model.feature_names() else {
        return Ok(());
    };
    if names != index.names() {
        let first = names
            .iter()
            .zip(index.names())
            .position(|(a, b)| a != b)
            .unwrap_or_else(|| names.len().min(index.len()));
        return Err(ModelError::SchemaMismatch(format!(
            "model has {} names, schema has {}; first difference at slot {}",
            names.len(),
            index.len(),
            first
        )));
    }
    Ok(())
}

fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or_default()
}

/// Build the HTTP router over shared state.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(http::index_page))
        .route("/dashboard", get(http::dashboard))
        .route("/health", get(http::health))
        .route("/api/catalog", get(http::catalog))
        .route("/api/predict", post(http::predict))
        .route("/api/encode", post(http::encode))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
