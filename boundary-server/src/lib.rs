//! Command-line interface and HTTP API for the boundary engine.
//!
//! The `boundary` binary has two subcommands. `serve` exposes the state and
//! county query endpoints over HTTP, while `export` runs a single query and
//! prints the resulting `FeatureCollection` to stdout. Both read their
//! arguments from CLI flags, `BOUNDARY_*` environment variables and
//! configuration files.
#![forbid(unsafe_code)]

use camino::Utf8Path;
use clap::{Parser, Subcommand};

mod error;
mod export;
mod http;
mod logging;
mod serve;

pub use error::CliError;
pub use http::{
    ApiError, AppState, BoundaryParams, CorsOrigins, SharedStore, StatusMessage,
    normalise_api_prefix, router,
};
pub use logging::init_logging;

use export::{ExportArgs, run_export};
use serve::{ServeArgs, run_serve};

const ARG_DATABASE: &str = "database";
const ARG_BIND: &str = "bind";
const ARG_API_PREFIX: &str = "api-prefix";
const ARG_CORS_ORIGINS: &str = "cors-origins";
const ARG_KIND: &str = "kind";
const ARG_STATE_ID: &str = "state-id";
const ARG_TOLERANCE: &str = "tolerance";
const ARG_ZOOM_LEVEL: &str = "zoom-level";
const ARG_MIN_LON: &str = "min-lon";
const ARG_MIN_LAT: &str = "min-lat";
const ARG_MAX_LON: &str = "max-lon";
const ARG_MAX_LAT: &str = "max-lat";
const ARG_INCLUDE_GEOMETRY: &str = "include-geometry";
const ENV_SERVE_DATABASE: &str = "BOUNDARY_CMDS_SERVE_DATABASE";
const ENV_EXPORT_DATABASE: &str = "BOUNDARY_CMDS_EXPORT_DATABASE";
const ENV_EXPORT_KIND: &str = "BOUNDARY_CMDS_EXPORT_KIND";

/// Run the boundary CLI with the current process arguments and environment.
pub fn run() -> Result<(), CliError> {
    let cli = Cli::try_parse().map_err(CliError::ArgumentParsing)?;
    match cli.command {
        Command::Serve(args) => run_serve(args),
        Command::Export(args) => run_export(args),
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "boundary",
    about = "Serve US state and county boundaries as GeoJSON",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Serve the boundary query API over HTTP.
    Serve(ServeArgs),
    /// Write one query's features to stdout as a GeoJSON collection.
    Export(ExportArgs),
}

/// Check that a configured input path names an existing regular file.
fn require_existing(path: &Utf8Path, field: &'static str) -> Result<(), CliError> {
    let inspect = |source| CliError::InspectSourcePath {
        field,
        path: path.to_path_buf(),
        source,
    };
    if boundary_fs::file_is_file(path).map_err(inspect)? {
        return Ok(());
    }
    if boundary_fs::path_exists(path).map_err(inspect)? {
        Err(CliError::SourcePathNotFile {
            field,
            path: path.to_path_buf(),
        })
    } else {
        Err(CliError::MissingSourceFile {
            field,
            path: path.to_path_buf(),
        })
    }
}

#[cfg(test)]
mod tests;
