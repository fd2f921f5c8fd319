use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScraperError {
    #[error("network error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },

    #[error("bad selector '{0}'")]
    Selector(String),

    #[error("bad url: {0}")]
    Url(#[from] url::ParseError),

    /// Every page of the source failed; nothing usable was gathered.
    #[error("{source_name} unavailable: all {attempted} pages failed")]
    Unavailable {
        source_name: String,
        attempted: usize,
    },
}
