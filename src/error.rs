use std::path::PathBuf;

/// Errors surfaced by the table loader and the map compositor.
///
/// Every variant carries the path it concerns so callers can show the message verbatim.
#[derive(Debug, thiserror::Error)]
pub enum MapError {
    #[error("failed to read city table {}: {source}", path.display())]
    TableRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("no viable encoding for {} (tried {tried})", path.display())]
    EncodingExhausted { path: PathBuf, tried: String },

    #[error("failed to parse template {template}: {reason}")]
    TemplateParse { template: String, reason: String },

    #[error("failed to write output {}: {source}", path.display())]
    OutputWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid settings file {}: {reason}", path.display())]
    Settings { path: PathBuf, reason: String },
}

impl MapError {
    pub(crate) fn template_parse(template: impl Into<String>, reason: impl ToString) -> Self {
        MapError::TemplateParse {
            template: template.into(),
            reason: reason.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, MapError>;
