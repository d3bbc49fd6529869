use thiserror::Error;

/// Failures surfaced by the export pipeline and the console's remote calls.
#[derive(Debug, Error)]
pub enum ConsoleError {
    /// The dataset could not be read or the subset could not be computed.
    #[error("filter compute failed: {0}")]
    FilterCompute(String),

    /// A sink destination was unwritable or a write was left partial.
    #[error("export to {path} failed: {source}")]
    ExportIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Database or HTTP transport failure.
    #[error("connection error: {0}")]
    Connection(String),

    /// A remote endpoint answered with a status outside its success contract.
    #[error("unexpected status {status}: {body}")]
    UnexpectedStatus { status: u16, body: String },

    /// A body that should have been JSON was not.
    #[error("parse error: {0}")]
    Parse(String),
}

impl ConsoleError {
    pub fn export_io(path: impl AsRef<std::path::Path>, source: std::io::Error) -> Self {
        Self::ExportIo {
            path: path.as_ref().display().to_string(),
            source,
        }
    }
}

impl From<reqwest::Error> for ConsoleError {
    fn from(e: reqwest::Error) -> Self {
        Self::Connection(e.to_string())
    }
}

impl From<mongodb::error::Error> for ConsoleError {
    fn from(e: mongodb::error::Error) -> Self {
        Self::Connection(e.to_string())
    }
}

impl From<sqlx::Error> for ConsoleError {
    fn from(e: sqlx::Error) -> Self {
        Self::Connection(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ConsoleError>;
