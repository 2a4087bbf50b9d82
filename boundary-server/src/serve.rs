//! `serve` command: run the HTTP API over a SQLite boundary database.

use std::{net::SocketAddr, sync::Arc};

use boundary_core::{EntityKind, QueryError, SqliteBoundaryStore};
use camino::Utf8PathBuf;
use clap::Parser;
use log::{info, warn};
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};

use crate::{
    ARG_API_PREFIX, ARG_BIND, ARG_CORS_ORIGINS, ARG_DATABASE, CliError, ENV_SERVE_DATABASE,
    http::{AppState, CorsOrigins, normalise_api_prefix, router},
    require_existing,
};

pub(crate) const DEFAULT_BIND: &str = "127.0.0.1:8000";
pub(crate) const DEFAULT_API_PREFIX: &str = "/api/v1";
pub(crate) const DEFAULT_CORS_ORIGINS: &str = "*";

/// CLI arguments for the `serve` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    name = "serve",
    long_about = "Serve state and county boundaries from a SQLite database \
                 built by the ingestion job. Options can come from CLI \
                 flags, configuration files, or environment variables.",
    about = "Serve the boundary query API over HTTP"
)]
#[ortho_config(prefix = "BOUNDARY")]
pub(crate) struct ServeArgs {
    /// Path to the SQLite boundary database.
    #[arg(long = ARG_DATABASE, value_name = "path")]
    #[serde(default)]
    pub(crate) database: Option<Utf8PathBuf>,
    /// Socket address to listen on.
    #[arg(long = ARG_BIND, value_name = "addr")]
    #[serde(default)]
    pub(crate) bind: Option<String>,
    /// Path prefix the geographic routes are mounted under.
    #[arg(long = ARG_API_PREFIX, value_name = "prefix")]
    #[serde(default)]
    pub(crate) api_prefix: Option<String>,
    /// Origins allowed to call the API from a browser: `*` or a
    /// comma-separated list.
    #[arg(long = ARG_CORS_ORIGINS, value_name = "origins")]
    #[serde(default)]
    pub(crate) cors_origins: Option<String>,
}

impl ServeArgs {
    pub(crate) fn into_config(self) -> Result<ServeConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        ServeConfig::try_from(merged)
    }
}

/// Resolved `serve` command configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ServeConfig {
    pub(crate) database: Utf8PathBuf,
    pub(crate) bind: SocketAddr,
    /// Normalised prefix; empty mounts the API at the root.
    pub(crate) api_prefix: String,
    pub(crate) cors_origins: CorsOrigins,
}

impl ServeConfig {
    pub(crate) fn validate_sources(&self) -> Result<(), CliError> {
        require_existing(&self.database, ARG_DATABASE)
    }
}

impl TryFrom<ServeArgs> for ServeConfig {
    type Error = CliError;

    fn try_from(args: ServeArgs) -> Result<Self, Self::Error> {
        let database = args.database.ok_or(CliError::MissingArgument {
            field: ARG_DATABASE,
            env: ENV_SERVE_DATABASE,
        })?;
        let bind_text = args.bind.unwrap_or_else(|| DEFAULT_BIND.to_owned());
        let bind: SocketAddr = bind_text
            .parse()
            .map_err(|source| CliError::InvalidBindAddress {
                value: bind_text.clone(),
                source,
            })?;
        let api_prefix = normalise_api_prefix(
            args.api_prefix.as_deref().unwrap_or(DEFAULT_API_PREFIX),
        );
        let cors_text = args
            .cors_origins
            .unwrap_or_else(|| DEFAULT_CORS_ORIGINS.to_owned());
        let cors_origins =
            CorsOrigins::parse(&cors_text).map_err(|source| CliError::InvalidCorsOrigin {
                value: cors_text.clone(),
                source,
            })?;
        Ok(Self {
            database,
            bind,
            api_prefix,
            cors_origins,
        })
    }
}

pub(crate) fn run_serve(args: ServeArgs) -> Result<(), CliError> {
    let config = args.into_config()?;
    config.validate_sources()?;

    let store = SqliteBoundaryStore::open(config.database.as_std_path())?;
    let states = store.len(EntityKind::State).map_err(QueryError::from)?;
    let counties = store.len(EntityKind::County).map_err(QueryError::from)?;
    info!(
        "opened {} with {states} states and {counties} counties",
        config.database
    );

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(CliError::Runtime)?;
    runtime.block_on(serve(&config, AppState::new(Arc::new(store))))
}

async fn serve(config: &ServeConfig, state: AppState) -> Result<(), CliError> {
    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .map_err(|source| CliError::Bind {
            addr: config.bind,
            source,
        })?;
    let mounted = if config.api_prefix.is_empty() {
        "/"
    } else {
        config.api_prefix.as_str()
    };
    info!("listening on http://{} (API under {mounted})", config.bind);
    let app = router(state, &config.api_prefix, &config.cors_origins);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(CliError::Serve)
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("shutdown requested"),
        Err(err) => {
            warn!("failed to listen for ctrl-c, serving until killed: {err}");
            std::future::pending::<()>().await;
        }
    }
}
