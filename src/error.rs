pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("parse error on line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("no diagram loaded; call load() before draw()")]
    NotLoaded,

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("PNG rendering failed: {0}")]
    Png(String),
}
