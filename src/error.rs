use arrow_schema::ArrowError;

#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error("I/O Error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV Error: {0}")]
    Csv(#[from] csv::Error),
    #[error("JSON Error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Parquet Error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),
    #[error("Arrow Error: {0}")]
    Arrow(#[from] ArrowError),
    #[error("Load Error [{region}]: {reason}")]
    Load { region: String, reason: String },
    #[error("Insufficient Data [{region}]: {detail}")]
    InsufficientData { region: String, detail: String },
    #[error("Render Error: {0}")]
    Render(String),
    #[error("Batch finished with {failed} failed region(s): {regions}")]
    Batch { failed: usize, regions: String },
}

pub type Result<T> = std::result::Result<T, AnalysisError>;
