use thiserror::Error;

#[derive(Debug, Error)]
pub enum LayoutError {
    #[error("failed to parse concept map payload: {0}")]
    Payload(#[from] serde_json::Error),

    #[error(
        "leveling stopped after {limit} expansions; disable multi-parent duplication or raise maxExpansions"
    )]
    ExpansionLimit { limit: usize },

    #[error("invalid layout configuration: {0}")]
    InvalidConfig(String),

    #[error("failed to write svg output")]
    Format(#[from] std::fmt::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, LayoutError>;
