use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoaderError {
    #[error("unsupported catalog format for '{path}': expected .yaml, .yml, or .json")]
    UnsupportedFormat { path: String },

    #[error("failed to parse YAML catalog: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("failed to parse JSON catalog: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid collection schema: {message}")]
    InvalidSchema { message: String },
}
