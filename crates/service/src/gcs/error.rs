#[derive(Debug, thiserror::Error)]
pub enum GcsClientError {
    #[error("invalid access token: {0}")]
    InvalidToken(#[from] reqwest::header::InvalidHeaderValue),
    #[error("failed to build http client: {0}")]
    Build(#[from] reqwest::Error),
}
