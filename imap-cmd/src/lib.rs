//! Command implementations for the inspection map CLI.
//!
//! Each subcommand drives a headless session, or the backend client
//! directly, against a live backend.

use clap::{Args, Subcommand};
use imap_api::config::DEFAULT_BASE_URL;
use imap_api::ClientConfig;
use imap_core::installation::{
    InspectionStatus, DEFAULT_CONSUMPTION_LIMIT, DEFAULT_SERVICE_NOTE_LIMIT,
};
use imap_core::Bounds;
use std::path::PathBuf;
use std::time::Duration;

pub mod area;
pub mod catalogue;
pub mod export;
pub mod headless;
pub mod installation;
pub mod results;

/// Backend connection flags shared by every subcommand.
#[derive(Args, Debug, Clone)]
pub struct ClientArgs {
    /// Backend API root
    #[arg(long, env = "IMAP_API_URL", default_value = DEFAULT_BASE_URL, global = true)]
    pub api_url: String,

    /// Per-request timeout in seconds
    #[arg(long, env = "IMAP_TIMEOUT_SECS", default_value_t = 10, global = true)]
    pub timeout_secs: u64,
}

impl ClientArgs {
    pub fn config(&self) -> ClientConfig {
        ClientConfig::new(self.api_url.clone()).with_timeout(Duration::from_secs(self.timeout_secs))
    }
}

/// Area given on the command line: a named region or a GeoJSON polygon file.
#[derive(Args, Debug, Clone)]
#[group(required = true, multiple = false)]
pub struct AreaArgs {
    /// Named region (municipality)
    #[arg(long)]
    pub region: Option<String>,

    /// GeoJSON file holding a Polygon geometry, Feature or FeatureCollection
    #[arg(long)]
    pub polygon: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// List main and auxiliary queries
    Queries,

    /// List named regions
    Regions,

    /// Fetch main query results
    Main {
        /// Main query id (repeatable)
        #[arg(short = 'q', long = "query", required = true)]
        queries: Vec<i64>,

        /// Restrict to minLng,minLat,maxLng,maxLat
        #[arg(long)]
        bounds: Option<Bounds>,

        /// Write one row per marker to this CSV
        #[arg(long)]
        csv: Option<PathBuf>,
    },

    /// Fetch auxiliary query results for an area
    Auxiliary {
        /// Auxiliary query id (repeatable)
        #[arg(short = 'q', long = "query", required = true)]
        queries: Vec<i64>,

        #[command(flatten)]
        area: AreaArgs,

        /// Write one row per marker or heatmap sample to this CSV
        #[arg(long)]
        csv: Option<PathBuf>,
    },

    /// Show an installation's details and history
    Installation {
        id: String,

        #[arg(long, default_value_t = DEFAULT_CONSUMPTION_LIMIT)]
        consumption_limit: u32,

        #[arg(long, default_value_t = DEFAULT_SERVICE_NOTE_LIMIT)]
        notes_limit: u32,

        /// Record a new status first (selecionado, nao_selecionado, verificar)
        #[arg(long, requires = "user")]
        set_status: Option<InspectionStatus>,

        /// Analyst recorded with the new status
        #[arg(long)]
        user: Option<String>,

        /// Notes recorded with the new status
        #[arg(long)]
        notes: Option<String>,
    },

    /// Show metrics for an area
    Metrics {
        #[command(flatten)]
        area: AreaArgs,
    },
}

pub async fn run(config: ClientConfig, command: Command) -> anyhow::Result<()> {
    match command {
        Command::Queries => catalogue::run_queries(&config).await,
        Command::Regions => catalogue::run_regions(&config).await,
        Command::Main {
            queries,
            bounds,
            csv,
        } => results::run_main(&config, &queries, bounds, csv.as_deref()).await,
        Command::Auxiliary { queries, area, csv } => {
            results::run_auxiliary(&config, &queries, &area, csv.as_deref()).await
        }
        Command::Installation {
            id,
            consumption_limit,
            notes_limit,
            set_status,
            user,
            notes,
        } => {
            let status_update = set_status.zip(user).map(|(status, user)| {
                imap_core::installation::StatusUpdate {
                    status,
                    user,
                    notes,
                }
            });
            installation::run_installation(
                &config,
                &id,
                consumption_limit,
                notes_limit,
                status_update,
            )
            .await
        }
        Command::Metrics { area } => installation::run_metrics(&config, &area).await,
    }
}
