use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum GuestctlError {
    #[error("failed to load config from {path}")]
    ConfigLoad {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config from {path}: {message}")]
    ConfigParse { path: String, message: String },

    #[error("validation error: {message}")]
    Validation { message: String },

    #[error("{context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("transfer failed: HTTP {status} from {url}")]
    #[diagnostic(help("check the installer URL in guestctl.toml"))]
    TransferFailed { url: String, status: u16 },

    #[error("download failed: {message}")]
    Download {
        message: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("failed to start {program}")]
    #[diagnostic(help("is `{program}` installed and on your PATH?"))]
    SpawnFailed {
        program: String,
        #[source]
        source: std::io::Error,
    },
}
