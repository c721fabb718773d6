//! Error types for the kubetype-gen binaries.

use camino::Utf8PathBuf;
use thiserror::Error;

/// Errors that stop a generation run.
///
/// Problems with individual modules or candidates never surface here; the
/// core reports those as diagnostics and the run carries on.
#[derive(Debug, Error)]
pub enum CliError {
    /// Reading or writing a file failed.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// File or directory involved.
        path: Utf8PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Layered configuration could not be extracted.
    #[error("configuration error: {0}")]
    Config(Box<figment::Error>),

    /// An explicitly requested configuration file is missing.
    #[error("configuration file {0} does not exist")]
    ConfigNotFound(Utf8PathBuf),

    /// A protobuf payload could not be decoded.
    #[error("failed to decode {what} from {path}: {source}")]
    Decode {
        /// Message type being decoded.
        what: &'static str,
        /// Where the payload came from.
        path: Utf8PathBuf,
        /// Decoder error.
        #[source]
        source: prost::DecodeError,
    },

    /// A discovered path cannot be represented as UTF-8.
    #[error("path {0} is not valid UTF-8")]
    NonUtf8Path(String),

    /// Two units map to the same file with different text.
    #[error("{path} would be generated twice with different contents")]
    OutputConflict {
        /// Output path relative to the output directory.
        path: Utf8PathBuf,
    },

    /// `--verify-only` found files that differ from freshly generated text.
    #[error("{} generated file(s) are stale: {}", .0.len(), join_paths(.0))]
    Stale(Vec<Utf8PathBuf>),

    /// A `protoc` plugin parameter is not a `key=value` pair.
    #[error("invalid plugin parameter '{0}', expected key=value")]
    PluginParameter(String),
}

impl From<figment::Error> for CliError {
    fn from(err: figment::Error) -> Self {
        Self::Config(Box::new(err))
    }
}

impl CliError {
    /// Builds an [`CliError::Io`] for `path`.
    #[must_use]
    pub fn io(path: impl Into<Utf8PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

fn join_paths(paths: &[Utf8PathBuf]) -> String {
    paths
        .iter()
        .map(|path| path.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}
