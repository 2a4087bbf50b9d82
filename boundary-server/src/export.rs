//! `export` command: run one boundary query and print the collection.

use std::io::Write;

use boundary_core::{
    BboxBounds, BoundaryStore, EntityId, EntityKind, FeatureCollection, GeoQueryService,
    RequestDescriptor, SqliteBoundaryStore,
};
use camino::Utf8PathBuf;
use clap::Parser;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};

use crate::{
    ARG_DATABASE, ARG_INCLUDE_GEOMETRY, ARG_KIND, ARG_MAX_LAT, ARG_MAX_LON, ARG_MIN_LAT,
    ARG_MIN_LON, ARG_STATE_ID, ARG_TOLERANCE, ARG_ZOOM_LEVEL, CliError, ENV_EXPORT_DATABASE,
    ENV_EXPORT_KIND, require_existing,
};

/// CLI arguments for the `export` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    name = "export",
    long_about = "Query the boundary database once and write the matching \
                 features to stdout as a pretty-printed GeoJSON \
                 FeatureCollection. Filters mirror the HTTP query string.",
    about = "Export boundaries as a GeoJSON FeatureCollection"
)]
#[ortho_config(prefix = "BOUNDARY")]
pub(crate) struct ExportArgs {
    /// Path to the SQLite boundary database.
    #[arg(long = ARG_DATABASE, value_name = "path")]
    #[serde(default)]
    pub(crate) database: Option<Utf8PathBuf>,
    /// Entity kind to export: `states` or `counties`.
    #[arg(long = ARG_KIND, value_name = "kind")]
    #[serde(default)]
    pub(crate) kind: Option<String>,
    /// Restrict counties to this parent state.
    #[arg(long = ARG_STATE_ID, value_name = "id")]
    #[serde(default)]
    pub(crate) state_id: Option<String>,
    /// Simplification tolerance in degrees; overrides the zoom level.
    #[arg(long = ARG_TOLERANCE, value_name = "degrees")]
    #[serde(default)]
    pub(crate) tolerance: Option<f64>,
    /// Map zoom level used to pick a tolerance.
    #[arg(long = ARG_ZOOM_LEVEL, value_name = "zoom")]
    #[serde(default)]
    pub(crate) zoom_level: Option<i32>,
    /// Western edge of the viewport.
    #[arg(long = ARG_MIN_LON, value_name = "lon", allow_negative_numbers = true)]
    #[serde(default)]
    pub(crate) min_lon: Option<f64>,
    /// Southern edge of the viewport.
    #[arg(long = ARG_MIN_LAT, value_name = "lat", allow_negative_numbers = true)]
    #[serde(default)]
    pub(crate) min_lat: Option<f64>,
    /// Eastern edge of the viewport.
    #[arg(long = ARG_MAX_LON, value_name = "lon", allow_negative_numbers = true)]
    #[serde(default)]
    pub(crate) max_lon: Option<f64>,
    /// Northern edge of the viewport.
    #[arg(long = ARG_MAX_LAT, value_name = "lat", allow_negative_numbers = true)]
    #[serde(default)]
    pub(crate) max_lat: Option<f64>,
    /// Emit real geometry (`true`, the default) or placeholders.
    #[arg(long = ARG_INCLUDE_GEOMETRY, value_name = "bool")]
    #[serde(default)]
    pub(crate) include_geometry: Option<bool>,
}

impl ExportArgs {
    pub(crate) fn into_config(self) -> Result<ExportConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        ExportConfig::try_from(merged)
    }
}

/// Resolved `export` command configuration.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ExportConfig {
    pub(crate) database: Utf8PathBuf,
    pub(crate) descriptor: RequestDescriptor,
}

impl ExportConfig {
    pub(crate) fn validate_sources(&self) -> Result<(), CliError> {
        require_existing(&self.database, ARG_DATABASE)
    }
}

impl TryFrom<ExportArgs> for ExportConfig {
    type Error = CliError;

    fn try_from(args: ExportArgs) -> Result<Self, Self::Error> {
        let database = args.database.ok_or(CliError::MissingArgument {
            field: ARG_DATABASE,
            env: ENV_EXPORT_DATABASE,
        })?;
        let kind: EntityKind = args
            .kind
            .ok_or(CliError::MissingArgument {
                field: ARG_KIND,
                env: ENV_EXPORT_KIND,
            })?
            .parse()?;

        let mut descriptor = RequestDescriptor::new(kind)
            .with_geometry(args.include_geometry.unwrap_or(true))
            .with_bbox(BboxBounds {
                min_lon: args.min_lon,
                min_lat: args.min_lat,
                max_lon: args.max_lon,
                max_lat: args.max_lat,
            });
        if let Some(tolerance) = args.tolerance {
            descriptor = descriptor.with_tolerance(tolerance);
        }
        if let Some(zoom_level) = args.zoom_level {
            descriptor = descriptor.with_zoom_level(zoom_level);
        }
        if let Some(value) = args.state_id {
            let state_id = EntityId::new(value.as_str())
                .map_err(|source| CliError::InvalidStateId { value, source })?;
            descriptor = descriptor.with_state_filter(state_id);
        }

        Ok(Self {
            database,
            descriptor,
        })
    }
}

pub(crate) fn run_export(args: ExportArgs) -> Result<(), CliError> {
    let mut stdout = std::io::stdout().lock();
    run_export_with(args, &mut stdout)
}

pub(crate) fn run_export_with(args: ExportArgs, writer: &mut dyn Write) -> Result<(), CliError> {
    let config = args.into_config()?;
    config.validate_sources()?;
    let store = SqliteBoundaryStore::open(config.database.as_std_path())?;
    export_collection(&GeoQueryService::new(store), &config.descriptor, writer)
}

/// Query `service` and write the collection to `writer`.
pub(crate) fn export_collection<S: BoundaryStore>(
    service: &GeoQueryService<S>,
    descriptor: &RequestDescriptor,
    writer: &mut dyn Write,
) -> Result<(), CliError> {
    let collection = service.query_collection(descriptor)?;
    write_collection(writer, &collection)
}

fn write_collection(writer: &mut dyn Write, collection: &FeatureCollection) -> Result<(), CliError> {
    serde_json::to_writer_pretty(&mut *writer, collection)
        .map_err(CliError::SerializeCollection)?;
    writeln!(writer).map_err(CliError::WriteOutput)?;
    writer.flush().map_err(CliError::WriteOutput)
}
