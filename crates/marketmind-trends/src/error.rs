use thiserror::Error;

#[derive(Debug, Error)]
pub enum TrendsError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("XML parse error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("invalid trends configuration: {0}")]
    Config(String),

    #[error("all {attempted} trend feeds failed")]
    AllFeedsFailed { attempted: usize },
}
