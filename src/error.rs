use thiserror::Error;

/// Problems with the feature schema artifact.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("failed to read feature schema at {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse feature schema: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("feature schema is empty")]
    Empty,
    #[error("feature schema lists `{0}` more than once")]
    DuplicateSlot(String),
    #[error("feature schema is missing required slot `{0}`")]
    MissingSlot(&'static str),
}

/// Problems loading or running the regression model.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("failed to read model at {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse model: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("unsupported model: {0}")]
    Unsupported(String),
    #[error("malformed model: {0}")]
    Malformed(String),
    #[error("feature length mismatch: got {got}, expected {expected}")]
    FeatureLength { got: usize, expected: usize },
    #[error("model feature names do not match the schema: {0}")]
    SchemaMismatch(String),
    #[cfg(feature = "torch")]
    #[error("torch error: {0}")]
    Torch(#[from] tch::TchError),
}

/// Problems with the brand popularity override.
#[derive(Debug, Error)]
pub enum PopularityError {
    #[error("failed to read brand popularity table at {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse brand popularity table: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("brand popularity for `{0}` is not a number")]
    NotANumber(String),
    #[error("brand popularity table has no `Other` entry")]
    MissingFallback,
}

/// Problems with process configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} not set")]
    Missing(&'static str),
    #[error("invalid value for {name}: {value:?}")]
    Invalid { name: &'static str, value: String },
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Schema(#[from] SchemaError),
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error(transparent)]
    Popularity(#[from] PopularityError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

pub type Result<T> = std::result::Result<T, Error>;
