use thiserror::Error;

#[derive(Debug, Error)]
pub enum HostError {
    #[error("io error: {0}")]
    Io(String),
    #[error("front-matter error: {0}")]
    FrontMatter(String),
    #[error("document not found: {0}")]
    NotFound(String),
    #[error("not a markdown document: {0}")]
    NotMarkdown(String),
}

impl From<std::io::Error> for HostError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value.to_string())
    }
}

impl From<serde_yaml::Error> for HostError {
    fn from(value: serde_yaml::Error) -> Self {
        Self::FrontMatter(value.to_string())
    }
}
