//! Error types emitted by the boundary CLI.
//!
//! Keep this error type reasonably small, as many CLI helpers return
//! `Result<_, CliError>`.

use std::{net::SocketAddr, sync::Arc};

use boundary_core::{EntityIdError, QueryError, SqliteBoundaryStoreError, UnknownEntityKind};
use camino::Utf8PathBuf;
use thiserror::Error;

/// Errors emitted by the boundary CLI.
#[derive(Debug, Error)]
pub enum CliError {
    /// Provided arguments failed Clap validation.
    #[error(transparent)]
    ArgumentParsing(#[from] clap::Error),
    /// Configuration layering failed (files, env, CLI).
    #[error("failed to load configuration: {0}")]
    Configuration(#[from] Arc<ortho_config::OrthoError>),
    /// A required option is missing after configuration merging.
    #[error("missing {field} (set --{field} or {env})")]
    MissingArgument {
        field: &'static str,
        env: &'static str,
    },
    /// A referenced input path does not exist on disk.
    #[error("{field} path {path:?} does not exist")]
    MissingSourceFile {
        field: &'static str,
        path: Utf8PathBuf,
    },
    /// A referenced input path exists but is not a file.
    #[error("{field} path {path:?} exists but is not a file")]
    SourcePathNotFile {
        field: &'static str,
        path: Utf8PathBuf,
    },
    /// A referenced input path could not be inspected due to an IO error.
    #[error("failed to inspect {field} path {path:?}: {source}")]
    InspectSourcePath {
        field: &'static str,
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The bind address could not be parsed.
    #[error("invalid bind address {value:?}: {source}")]
    InvalidBindAddress {
        value: String,
        #[source]
        source: std::net::AddrParseError,
    },
    /// A configured CORS origin is not a valid header value.
    #[error("invalid CORS origin list {value:?}: {source}")]
    InvalidCorsOrigin {
        value: String,
        #[source]
        source: axum::http::header::InvalidHeaderValue,
    },
    /// The requested entity kind is neither states nor counties.
    #[error(transparent)]
    InvalidKind(#[from] UnknownEntityKind),
    /// The state filter is not a usable entity identifier.
    #[error("invalid state id {value:?}: {source}")]
    InvalidStateId {
        value: String,
        #[source]
        source: EntityIdError,
    },
    /// Opening the boundary database failed.
    #[error(transparent)]
    OpenStore(#[from] SqliteBoundaryStoreError),
    /// The boundary query failed.
    #[error("boundary query failed: {0}")]
    Query(#[from] QueryError),
    /// Serializing the feature collection failed.
    #[error("failed to serialize feature collection: {0}")]
    SerializeCollection(#[source] serde_json::Error),
    /// Writing the export output failed.
    #[error("failed to write export output: {0}")]
    WriteOutput(#[source] std::io::Error),
    /// Installing the global logger failed.
    #[error("failed to install logger: {0}")]
    InstallLogger(#[from] tracing_subscriber::util::TryInitError),
    /// Building the async runtime failed.
    #[error("failed to start async runtime: {0}")]
    Runtime(#[source] std::io::Error),
    /// Binding the HTTP listener failed.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },
    /// The HTTP server stopped with an error.
    #[error("HTTP server failed: {0}")]
    Serve(#[source] std::io::Error),
}
